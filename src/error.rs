use crate::descriptor::ResponseDescriptor;
use crate::tokens::ResponseType;

/// Ways the transport can fail to deliver a response.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("could not connect")]
    Connect(#[source] reqwest::Error),

    #[error("request failed")]
    Request(#[source] reqwest::Error),

    #[error("failed to read response body")]
    Body(#[source] reqwest::Error),

    #[error("failed to build http client")]
    Client(#[source] reqwest::Error),

    #[error("request task failed: {0}")]
    Task(String),
}

impl TransportError {
    /// Classifies an error returned while sending a request.
    pub(crate) fn from_send(err: reqwest::Error) -> Self {
        if err.is_connect() {
            TransportError::Connect(err)
        } else {
            TransportError::Request(err)
        }
    }
}

/// Rejection value of a [`Deferred`](crate::Deferred).
///
/// Carries the same descriptor shape a successful request resolves with.
#[derive(Debug, thiserror::Error)]
#[error("transport failure")]
pub struct RequestFailure {
    pub descriptor: ResponseDescriptor,
    #[source]
    pub source: TransportError,
}

impl RequestFailure {
    pub fn new(response_type: ResponseType, source: TransportError) -> Self {
        Self {
            descriptor: ResponseDescriptor::transport_failure(response_type),
            source,
        }
    }
}
