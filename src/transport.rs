//! The HTTP primitive requests are executed on.

use futures::future::{BoxFuture, FutureExt};
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use smol_str::SmolStr;

use crate::config::ClientConfig;
use crate::error::TransportError;
use crate::tokens::{Method, ResponseType};

/// Request payload, passed to the transport unmodified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestBody {
    Text(String),
    Bytes(Vec<u8>),
}

impl From<String> for RequestBody {
    fn from(text: String) -> Self {
        RequestBody::Text(text)
    }
}

impl From<&str> for RequestBody {
    fn from(text: &str) -> Self {
        RequestBody::Text(text.to_string())
    }
}

impl From<Vec<u8>> for RequestBody {
    fn from(bytes: Vec<u8>) -> Self {
        RequestBody::Bytes(bytes)
    }
}

impl From<RequestBody> for reqwest::Body {
    fn from(body: RequestBody) -> Self {
        match body {
            RequestBody::Text(text) => text.into(),
            RequestBody::Bytes(bytes) => bytes.into(),
        }
    }
}

/// A request that has been opened and is ready to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportRequest {
    pub method: Method,
    pub url: String,
    /// Already validated; every pair is sent.
    pub headers: Vec<(SmolStr, SmolStr)>,
    pub response_type: ResponseType,
    pub body: Option<RequestBody>,
    pub asynchronous: bool,
}

/// What the transport received, before it is shaped into a descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub status_text: String,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

/// Executes one request.
///
/// The returned future is driven on the client's runtime and resolves once:
/// with the response for any HTTP status, or with an error when nothing
/// usable came back.
pub trait Transport: Send + Sync + 'static {
    fn send(&self, request: TransportRequest) -> BoxFuture<'static, Result<RawResponse, TransportError>>;
}

/// [`Transport`] backed by a `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(config: &ClientConfig) -> Result<Self, TransportError> {
        let client = config.build_client().map_err(TransportError::Client)?;
        Ok(Self { client })
    }

    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

impl Transport for ReqwestTransport {
    fn send(&self, request: TransportRequest) -> BoxFuture<'static, Result<RawResponse, TransportError>> {
        let client = self.client.clone();
        async move {
            let mut req = client.request(request.method.into(), &request.url);

            // apply headers
            for (k, v) in request.headers {
                req = req.header(k.as_str(), v.as_str());
            }

            // apply body if any
            if let Some(b) = request.body {
                req = req.body(b);
            }

            let resp = req.send().await.map_err(TransportError::from_send)?;

            // pull these out before consuming `resp`
            let status = resp.status().as_u16();
            let status_text = resp
                .status()
                .canonical_reason()
                .unwrap_or_default()
                .to_string();
            let content_type = resp
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);

            let body = resp.bytes().await.map_err(TransportError::Body)?.to_vec();

            Ok(RawResponse {
                status,
                status_text,
                content_type,
                body,
            })
        }
        .boxed()
    }
}
