//! Promise-style HTTP requests.
//!
//! [`promise_xhr`] opens one request on a shared transport and hands back a
//! [`Deferred`] that settles exactly once: `Ok` with a [`ResponseDescriptor`]
//! when the transport completed (whatever the HTTP status), `Err` with a
//! [`RequestFailure`] carrying a descriptor of the same shape when it did not.
//!
//! The method and response type are sanitized against fixed allowed sets
//! before anything is sent, see [`sanitize_method`] and
//! [`sanitize_response_type`].

use once_cell::sync::Lazy;
use reqwest::Client;
use tokio::runtime::Runtime;

#[cfg(any(feature = "node", test))]
mod coerce;
mod config;
mod descriptor;
mod error;
mod executor;
mod headers;
mod tokens;
mod transport;

#[cfg(feature = "node")]
mod node;

pub use config::ClientConfig;
pub use descriptor::{ResponseBody, ResponseDescriptor};
pub use error::{RequestFailure, TransportError};
pub use executor::{Deferred, XhrClient};
pub use headers::RequestHeaders;
pub use tokens::{sanitize_method, sanitize_response_type, Method, ResponseType};
pub use transport::{RawResponse, RequestBody, ReqwestTransport, Transport, TransportRequest};

// ─── Singletons ──────────────────────────────────────────────────────────────

// Multi-threaded Tokio runtime every request is driven on
static TOKIO_RT: Lazy<Runtime> = Lazy::new(|| {
    ClientConfig::default()
        .build_runtime()
        .expect("failed to build tokio runtime")
});

// Shared reqwest::Client (rustls + compression)
static HTTP_CLIENT: Lazy<Client> = Lazy::new(|| {
    ClientConfig::default()
        .build_client()
        .expect("failed to build reqwest client")
});

static DEFAULT_CLIENT: Lazy<XhrClient<ReqwestTransport>> =
    Lazy::new(|| XhrClient::new(ReqwestTransport::from_client(HTTP_CLIENT.clone())));

pub(crate) fn runtime() -> &'static Runtime {
    &TOKIO_RT
}

/// Opens a request against `resource_id` on the shared HTTP client.
///
/// `method` falls back to `GET` and `response_type` to `""` when they are
/// absent or not in their allowed sets. Header entries that are not plain
/// strings are skipped. `body` is sent as-is (and dropped for `GET`).
///
/// With `asynchronous` set the request is scheduled and a pending
/// [`Deferred`] is returned right away. Without it the request runs to
/// completion before this function returns.
///
/// ```no_run
/// # async fn run() {
/// let descriptor = promise_xhr::promise_xhr(
///     "https://example.com/data.json",
///     Some("get"),
///     None,
///     Some("json"),
///     None,
///     true,
/// )
/// .await
/// .unwrap();
/// assert!(descriptor.response_text.is_none());
/// # }
/// ```
pub fn promise_xhr(
    resource_id: &str,
    method: Option<&str>,
    headers: Option<&RequestHeaders>,
    response_type: Option<&str>,
    body: Option<RequestBody>,
    asynchronous: bool,
) -> Deferred {
    DEFAULT_CLIENT.promise_xhr(
        resource_id,
        method,
        headers,
        response_type,
        body,
        asynchronous,
    )
}
