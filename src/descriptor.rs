//! Response descriptors handed back on both settlement paths.

use crate::tokens::ResponseType;
use crate::transport::RawResponse;

/// The response body, shaped by the request's [`ResponseType`].
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    /// Nothing was received for a non-text response type.
    Null,
    Text(String),
    ArrayBuffer(Vec<u8>),
    Blob {
        content_type: Option<String>,
        data: Vec<u8>,
    },
    /// Markup is kept as text; no document tree is built.
    Document(String),
    /// Bodies that fail to parse become `Value::Null`.
    Json(serde_json::Value),
}

/// Outcome of one request.
///
/// The same shape is produced whether the request completed or failed at the
/// transport level; only the settlement branch tells them apart.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseDescriptor {
    pub status: u16,
    pub status_text: String,
    pub response: ResponseBody,
    /// Present only for the `""` and `text` response types.
    pub response_text: Option<String>,
}

impl ResponseDescriptor {
    /// Builds the descriptor for a response the transport delivered.
    pub fn from_raw(raw: RawResponse, response_type: ResponseType) -> Self {
        let RawResponse {
            status,
            status_text,
            content_type,
            body,
        } = raw;

        let (response, response_text) = match response_type {
            ResponseType::Empty | ResponseType::Text => {
                let text = String::from_utf8_lossy(&body).into_owned();
                (ResponseBody::Text(text.clone()), Some(text))
            }
            ResponseType::ArrayBuffer => (ResponseBody::ArrayBuffer(body), None),
            ResponseType::Blob => (
                ResponseBody::Blob {
                    content_type,
                    data: body,
                },
                None,
            ),
            ResponseType::Document => (
                ResponseBody::Document(String::from_utf8_lossy(&body).into_owned()),
                None,
            ),
            ResponseType::Json => {
                let value = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
                (ResponseBody::Json(value), None)
            }
        };

        Self {
            status,
            status_text,
            response,
            response_text,
        }
    }

    /// Builds the descriptor reported when the transport failed.
    pub fn transport_failure(response_type: ResponseType) -> Self {
        let (response, response_text) = if response_type.exposes_text() {
            (ResponseBody::Text(String::new()), Some(String::new()))
        } else {
            (ResponseBody::Null, None)
        };

        Self {
            status: 0,
            status_text: String::new(),
            response,
            response_text,
        }
    }
}
