//! Opening requests and settling their deferred results.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::runtime::{Handle, RuntimeFlavor};
use tokio::task::JoinHandle;

use crate::descriptor::ResponseDescriptor;
use crate::error::{RequestFailure, TransportError};
use crate::headers::RequestHeaders;
use crate::tokens::{sanitize_method, sanitize_response_type, Method, ResponseType};
use crate::transport::{RawResponse, RequestBody, Transport, TransportRequest};

type Outcome = Result<ResponseDescriptor, RequestFailure>;

/// Issues requests on a [`Transport`], one transport operation per call.
pub struct XhrClient<T> {
    transport: T,
    handle: Handle,
}

impl<T: Transport> XhrClient<T> {
    /// Drives requests on the crate's shared runtime.
    pub fn new(transport: T) -> Self {
        Self::with_handle(transport, crate::runtime().handle().clone())
    }

    /// Drives asynchronous requests on the given runtime instead.
    ///
    /// Synchronous requests always run on the shared runtime, since the
    /// calling thread may be the one driving `handle`.
    pub fn with_handle(transport: T, handle: Handle) -> Self {
        Self { transport, handle }
    }

    /// See [`promise_xhr`](crate::promise_xhr).
    pub fn promise_xhr(
        &self,
        resource_id: &str,
        method: Option<&str>,
        headers: Option<&RequestHeaders>,
        response_type: Option<&str>,
        body: Option<RequestBody>,
        asynchronous: bool,
    ) -> Deferred {
        let method = sanitize_method(method);
        let response_type = sanitize_response_type(response_type);
        let headers = headers.map(RequestHeaders::validated).unwrap_or_default();

        // GET never carries a body
        let body = match method {
            Method::Get => None,
            Method::Post => body,
        };

        tracing::debug!(
            %method,
            resource_id,
            response_type = response_type.as_str(),
            asynchronous,
            "opening request"
        );

        let request = TransportRequest {
            method,
            url: resource_id.to_string(),
            headers,
            response_type,
            body,
            asynchronous,
        };
        let send = self.transport.send(request);
        let handle = if asynchronous {
            &self.handle
        } else {
            crate::runtime().handle()
        };
        let task = handle.spawn(async move { settle(send.await, response_type) });

        let deferred = Deferred {
            state: State::Pending {
                task,
                response_type,
            },
        };
        if asynchronous {
            deferred
        } else {
            Deferred::settled(wait(deferred))
        }
    }
}

// Blocks until a request spawned on the shared runtime settles. Worker
// threads of a multi-threaded runtime hand their other tasks off first.
fn wait(deferred: Deferred) -> Outcome {
    let on_multi_thread_worker = Handle::try_current()
        .map(|current| current.runtime_flavor() == RuntimeFlavor::MultiThread)
        .unwrap_or(false);
    if on_multi_thread_worker {
        tokio::task::block_in_place(|| futures::executor::block_on(deferred))
    } else {
        futures::executor::block_on(deferred)
    }
}

fn settle(result: Result<RawResponse, TransportError>, response_type: ResponseType) -> Outcome {
    match result {
        Ok(raw) => {
            let descriptor = ResponseDescriptor::from_raw(raw, response_type);
            tracing::debug!(status = descriptor.status, "request completed");
            Ok(descriptor)
        }
        Err(err) => {
            tracing::warn!(error = ?err, "request failed");
            Err(RequestFailure::new(response_type, err))
        }
    }
}

/// A request's result, settled exactly once.
///
/// Resolves to `Ok` whenever the transport delivered a response, including
/// 4xx and 5xx statuses. Dropping it ignores the settlement; the request
/// still runs to completion.
#[must_use = "a Deferred does nothing useful unless awaited"]
pub struct Deferred {
    state: State,
}

enum State {
    Pending {
        task: JoinHandle<Outcome>,
        response_type: ResponseType,
    },
    Settled(Option<Outcome>),
}

impl Deferred {
    fn settled(outcome: Outcome) -> Self {
        Self {
            state: State::Settled(Some(outcome)),
        }
    }

    /// Whether awaiting would complete without waiting on the transport.
    pub fn is_settled(&self) -> bool {
        match &self.state {
            State::Pending { task, .. } => task.is_finished(),
            State::Settled(_) => true,
        }
    }
}

impl Future for Deferred {
    type Output = Outcome;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Outcome> {
        match &mut self.state {
            State::Pending {
                task,
                response_type,
            } => match Pin::new(task).poll(cx) {
                Poll::Pending => Poll::Pending,
                Poll::Ready(Ok(outcome)) => Poll::Ready(outcome),
                Poll::Ready(Err(err)) => Poll::Ready(Err(RequestFailure::new(
                    *response_type,
                    TransportError::Task(err.to_string()),
                ))),
            },
            State::Settled(outcome) => {
                Poll::Ready(outcome.take().expect("Deferred polled after completion"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::ResponseBody;
    use futures::future::{BoxFuture, FutureExt};
    use serde_json::json;
    use smol_str::SmolStr;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    type Reply = Arc<dyn Fn(&TransportRequest) -> Result<RawResponse, TransportError> + Send + Sync>;

    #[derive(Clone)]
    struct MockTransport {
        reply: Reply,
        delay: Option<Duration>,
        seen: Arc<Mutex<Vec<TransportRequest>>>,
    }

    impl MockTransport {
        fn new(
            reply: impl Fn(&TransportRequest) -> Result<RawResponse, TransportError> + Send + Sync + 'static,
        ) -> Self {
            Self {
                reply: Arc::new(reply),
                delay: None,
                seen: Arc::default(),
            }
        }

        fn delayed(mut self, delay: Duration) -> Self {
            self.delay = Some(delay);
            self
        }

        fn seen(&self) -> Vec<TransportRequest> {
            self.seen.lock().unwrap().clone()
        }
    }

    impl Transport for MockTransport {
        fn send(&self, request: TransportRequest) -> BoxFuture<'static, Result<RawResponse, TransportError>> {
            self.seen.lock().unwrap().push(request.clone());
            let reply = self.reply.clone();
            let delay = self.delay;
            async move {
                if let Some(delay) = delay {
                    tokio::time::sleep(delay).await;
                }
                reply(&request)
            }
            .boxed()
        }
    }

    fn ok(status: u16, body: &str) -> Result<RawResponse, TransportError> {
        Ok(RawResponse {
            status,
            status_text: reqwest::StatusCode::from_u16(status)
                .ok()
                .and_then(|s| s.canonical_reason())
                .unwrap_or_default()
                .to_string(),
            content_type: None,
            body: body.as_bytes().to_vec(),
        })
    }

    #[tokio::test]
    async fn resolves_with_text_descriptor_by_default() {
        let client = XhrClient::new(MockTransport::new(|_| ok(200, "hello")));
        let descriptor = client
            .promise_xhr("http://host/a", None, None, None, None, true)
            .await
            .unwrap();
        assert_eq!(descriptor.status, 200);
        assert_eq!(descriptor.status_text, "OK");
        assert_eq!(descriptor.response, ResponseBody::Text("hello".into()));
        assert_eq!(descriptor.response_text.as_deref(), Some("hello"));
    }

    #[tokio::test]
    async fn json_descriptor_has_no_response_text() {
        let client = XhrClient::new(MockTransport::new(|_| ok(200, r#"{"a":1}"#)));
        let descriptor = client
            .promise_xhr("http://host/a", None, None, Some("JSON"), None, true)
            .await
            .unwrap();
        assert_eq!(descriptor.response, ResponseBody::Json(json!({ "a": 1 })));
        assert!(descriptor.response_text.is_none());
    }

    #[tokio::test]
    async fn http_error_statuses_resolve() {
        for status in [404, 500] {
            let client = XhrClient::new(MockTransport::new(move |_| ok(status, "nope")));
            let descriptor = client
                .promise_xhr("http://host/a", None, None, None, None, true)
                .await
                .expect("http errors resolve");
            assert_eq!(descriptor.status, status);
        }
    }

    #[tokio::test]
    async fn transport_error_rejects_with_descriptor_shape() {
        let client = XhrClient::new(MockTransport::new(|_| {
            Err(TransportError::Task("unreachable".into()))
        }));

        let failure = client
            .promise_xhr("http://host/a", None, None, Some("text"), None, true)
            .await
            .expect_err("transport errors reject");
        assert_eq!(failure.descriptor.status, 0);
        assert_eq!(failure.descriptor.status_text, "");
        assert_eq!(failure.descriptor.response, ResponseBody::Text(String::new()));
        assert_eq!(failure.descriptor.response_text.as_deref(), Some(""));
        assert!(matches!(failure.source, TransportError::Task(_)));

        let failure = client
            .promise_xhr("http://host/a", None, None, Some("blob"), None, true)
            .await
            .expect_err("transport errors reject");
        assert_eq!(failure.descriptor.response, ResponseBody::Null);
        assert!(failure.descriptor.response_text.is_none());
    }

    #[tokio::test]
    async fn request_is_opened_with_sanitized_inputs() {
        let transport = MockTransport::new(|_| ok(200, ""));
        let client = XhrClient::new(transport.clone());
        let headers = RequestHeaders::from_json(&json!({ "X-Test": "1", "bad": 42 }));

        client
            .promise_xhr(
                "not even a url",
                Some(" POST "),
                Some(&headers),
                Some("ArrayBuffer"),
                Some("a=1&b=2".into()),
                true,
            )
            .await
            .unwrap();

        let seen = transport.seen();
        assert_eq!(seen.len(), 1);
        let request = &seen[0];
        assert_eq!(request.method, Method::Post);
        assert_eq!(request.url, "not even a url");
        assert_eq!(
            request.headers,
            vec![(SmolStr::new("X-Test"), SmolStr::new("1"))]
        );
        assert_eq!(request.response_type, ResponseType::ArrayBuffer);
        assert_eq!(request.body, Some(RequestBody::Text("a=1&b=2".into())));
        assert!(request.asynchronous);
    }

    #[tokio::test]
    async fn get_drops_the_body() {
        let transport = MockTransport::new(|_| ok(200, ""));
        let client = XhrClient::new(transport.clone());

        client
            .promise_xhr(
                "http://host/a",
                Some("delete"),
                None,
                None,
                Some(vec![1u8, 2, 3].into()),
                true,
            )
            .await
            .unwrap();

        let request = &transport.seen()[0];
        assert_eq!(request.method, Method::Get);
        assert_eq!(request.body, None);
    }

    #[tokio::test]
    async fn async_call_returns_before_the_transport_finishes() {
        let client = XhrClient::new(
            MockTransport::new(|_| ok(200, "late")).delayed(Duration::from_millis(200)),
        );
        let deferred = client.promise_xhr("http://host/a", None, None, None, None, true);
        assert!(!deferred.is_settled());
        assert_eq!(deferred.await.unwrap().response_text.as_deref(), Some("late"));
    }

    #[tokio::test]
    async fn sync_call_is_settled_on_return() {
        let transport = MockTransport::new(|_| ok(201, "done")).delayed(Duration::from_millis(50));
        let client = XhrClient::new(transport.clone());
        let deferred = client.promise_xhr("http://host/a", Some("post"), None, None, None, false);
        assert!(deferred.is_settled());
        assert!(!transport.seen()[0].asynchronous);
        assert_eq!(deferred.await.unwrap().status, 201);
    }

    #[test]
    fn sync_call_does_not_wait_on_the_callers_runtime() {
        let (tx, rx) = std::sync::mpsc::channel();
        std::thread::spawn(move || {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap();
            let outcome = runtime.block_on(async {
                let client = XhrClient::with_handle(
                    MockTransport::new(|_| ok(200, "inline")),
                    Handle::current(),
                );
                client
                    .promise_xhr("http://host/a", None, None, None, None, false)
                    .await
            });
            let _ = tx.send(outcome.map(|descriptor| descriptor.status));
        });

        let status = rx
            .recv_timeout(Duration::from_secs(5))
            .expect("synchronous request returned")
            .unwrap();
        assert_eq!(status, 200);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn sync_call_from_a_single_worker_runtime_settles() {
        let client = XhrClient::with_handle(
            MockTransport::new(|_| ok(204, "")).delayed(Duration::from_millis(20)),
            Handle::current(),
        );
        let deferred = client.promise_xhr("http://host/a", None, None, None, None, false);
        assert!(deferred.is_settled());
        assert_eq!(deferred.await.unwrap().status, 204);
    }

    #[tokio::test]
    async fn panicking_transport_rejects_once() {
        struct Panics;
        impl Transport for Panics {
            fn send(&self, _: TransportRequest) -> BoxFuture<'static, Result<RawResponse, TransportError>> {
                futures::future::lazy(|_| -> Result<RawResponse, TransportError> {
                    panic!("transport blew up")
                })
                .boxed()
            }
        }

        let failure = XhrClient::new(Panics)
            .promise_xhr("http://host/a", None, None, Some("json"), None, true)
            .await
            .expect_err("panics reject");
        assert!(matches!(failure.source, TransportError::Task(_)));
        assert_eq!(failure.descriptor.response, ResponseBody::Null);
    }

    #[tokio::test]
    async fn concurrent_calls_do_not_share_results() {
        let client = XhrClient::new(
            MockTransport::new(|request| {
                if request.url.ends_with("/missing") {
                    ok(404, "missing body")
                } else {
                    ok(200, "found body")
                }
            })
            .delayed(Duration::from_millis(20)),
        );

        let (found, missing) = futures::join!(
            client.promise_xhr("http://host/found", None, None, None, None, true),
            client.promise_xhr("http://host/missing", None, None, None, None, true),
        );
        let (found, missing) = (found.unwrap(), missing.unwrap());
        assert_eq!((found.status, found.response_text.as_deref()), (200, Some("found body")));
        assert_eq!(
            (missing.status, missing.response_text.as_deref()),
            (404, Some("missing body"))
        );
    }
}
