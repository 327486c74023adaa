//! Node.js binding: `promiseXHR(resourceId, method?, headers?, responseType?, body?, async?)`.
//!
//! Arguments arrive untyped here, so this is where they are coerced: only
//! string methods/response types are considered, header objects contribute
//! their string-valued members, and `async` follows JS truthiness with
//! `undefined` meaning `true`.

use neon::prelude::*;
use neon::types::buffer::TypedArray;

use crate::coerce::Loose;
use crate::{RequestBody, RequestHeaders, ResponseBody, ResponseDescriptor};

fn classify<'a>(cx: &mut FunctionContext<'a>, value: Option<Handle<'a, JsValue>>) -> Loose {
    let Some(value) = value else {
        return Loose::Absent;
    };
    if value.is_a::<JsUndefined, _>(cx) {
        Loose::Undefined
    } else if value.is_a::<JsNull, _>(cx) {
        Loose::Null
    } else if let Ok(b) = value.downcast::<JsBoolean, _>(cx) {
        Loose::Bool(b.value(cx))
    } else if let Ok(n) = value.downcast::<JsNumber, _>(cx) {
        Loose::Number(n.value(cx))
    } else if let Ok(s) = value.downcast::<JsString, _>(cx) {
        Loose::Str(s.value(cx))
    } else if value.is_a::<JsArray, _>(cx) {
        Loose::Array
    } else if value.is_a::<JsFunction, _>(cx) {
        Loose::Function
    } else if value.is_a::<JsObject, _>(cx) {
        Loose::Object
    } else {
        Loose::Other
    }
}

fn headers_arg<'a>(
    cx: &mut FunctionContext<'a>,
    value: Option<Handle<'a, JsValue>>,
) -> NeonResult<Option<RequestHeaders>> {
    let Some(value) = value else {
        return Ok(None);
    };
    if !classify(cx, Some(value)).is_object() {
        return Ok(None);
    }
    let js_hdrs = value.downcast_or_throw::<JsObject, _>(cx)?;

    let mut headers = RequestHeaders::new();
    for key in js_hdrs.get_own_property_names(cx)?.to_vec(cx)? {
        let Ok(name) = key.downcast::<JsString, _>(cx) else {
            continue;
        };
        let name = name.value(cx);
        let value: Handle<JsValue> = js_hdrs.get_value(cx, name.as_str())?;
        match value.downcast::<JsString, _>(cx) {
            Ok(js_str) => headers.insert(name, js_str.value(cx)),
            Err(_) => headers.insert_non_string(name),
        };
    }
    Ok(Some(headers))
}

fn body_arg<'a>(
    cx: &mut FunctionContext<'a>,
    value: Option<Handle<'a, JsValue>>,
) -> NeonResult<Option<RequestBody>> {
    let Some(value) = value else {
        return Ok(None);
    };
    if value.is_a::<JsUndefined, _>(cx) || value.is_a::<JsNull, _>(cx) {
        return Ok(None);
    }
    if let Ok(js_str) = value.downcast::<JsString, _>(cx) {
        return Ok(Some(RequestBody::Text(js_str.value(cx))));
    }
    if let Ok(buf) = value.downcast::<JsBuffer, _>(cx) {
        return Ok(Some(RequestBody::Bytes(buf.as_slice(cx).to_vec())));
    }
    if let Ok(buf) = value.downcast::<JsArrayBuffer, _>(cx) {
        return Ok(Some(RequestBody::Bytes(buf.as_slice(cx).to_vec())));
    }
    // anything else is sent the way the host would stringify it
    let text = value.to_string(cx)?.value(cx);
    Ok(Some(RequestBody::Text(text)))
}

fn json_to_js<'a, C: Context<'a>>(cx: &mut C, value: serde_json::Value) -> JsResult<'a, JsValue> {
    use serde_json::Value;

    Ok(match value {
        Value::Null => cx.null().upcast(),
        Value::Bool(b) => cx.boolean(b).upcast(),
        Value::Number(n) => cx.number(n.as_f64().unwrap_or(f64::NAN)).upcast(),
        Value::String(s) => cx.string(s).upcast(),
        Value::Array(items) => {
            let js_arr = cx.empty_array();
            for (index, item) in items.into_iter().enumerate() {
                let js_item = json_to_js(cx, item)?;
                js_arr.set(cx, index as u32, js_item)?;
            }
            js_arr.upcast()
        }
        Value::Object(members) => {
            let js_obj = cx.empty_object();
            for (key, member) in members {
                let js_member = json_to_js(cx, member)?;
                js_obj.set(cx, key.as_str(), js_member)?;
            }
            js_obj.upcast()
        }
    })
}

fn descriptor_to_js<'a, C: Context<'a>>(
    cx: &mut C,
    descriptor: ResponseDescriptor,
) -> JsResult<'a, JsObject> {
    let js_obj = cx.empty_object();

    let js_status = cx.number(descriptor.status as f64);
    js_obj.set(cx, "status", js_status)?;

    let js_status_text = cx.string(descriptor.status_text);
    js_obj.set(cx, "statusText", js_status_text)?;

    let js_response: Handle<JsValue> = match descriptor.response {
        ResponseBody::Null => cx.null().upcast(),
        ResponseBody::Text(text) | ResponseBody::Document(text) => cx.string(text).upcast(),
        ResponseBody::ArrayBuffer(bytes) => JsArrayBuffer::external(cx, bytes).upcast(),
        ResponseBody::Blob { data, .. } => JsBuffer::external(cx, data).upcast(),
        ResponseBody::Json(value) => json_to_js(cx, value)?,
    };
    js_obj.set(cx, "response", js_response)?;

    if let Some(text) = descriptor.response_text {
        let js_text = cx.string(text);
        js_obj.set(cx, "responseText", js_text)?;
    }

    Ok(js_obj)
}

// JS: promiseXHR("https://...", "post", { "X-Test": "1" }, "json", body) -> Promise<descriptor>
fn promise_xhr(mut cx: FunctionContext) -> JsResult<JsPromise> {
    let resource_id = cx.argument::<JsValue>(0)?.to_string(&mut cx)?.value(&mut cx);

    let arg = cx.argument_opt(1);
    let method = classify(&mut cx, arg).into_string();
    let arg = cx.argument_opt(2);
    let headers = headers_arg(&mut cx, arg)?;
    let arg = cx.argument_opt(3);
    let response_type = classify(&mut cx, arg).into_string();
    let arg = cx.argument_opt(4);
    let body = body_arg(&mut cx, arg)?;
    let arg = cx.argument_opt(5);
    let asynchronous = classify(&mut cx, arg).to_boolean_or_true();

    let pending = crate::promise_xhr(
        &resource_id,
        method.as_deref(),
        headers.as_ref(),
        response_type.as_deref(),
        body,
        asynchronous,
    );

    let channel = cx.channel();
    let (deferred, promise) = cx.promise();
    crate::runtime().spawn(async move {
        let outcome = pending.await;
        deferred.settle_with(&channel, move |mut cx| match outcome {
            Ok(descriptor) => descriptor_to_js(&mut cx, descriptor),
            Err(failure) => {
                let js_obj = descriptor_to_js(&mut cx, failure.descriptor)?;
                cx.throw(js_obj)
            }
        });
    });

    Ok(promise)
}

#[neon::main]
fn main(mut cx: ModuleContext) -> NeonResult<()> {
    cx.export_function("promiseXHR", promise_xhr)?;
    Ok(())
}
