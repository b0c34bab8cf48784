//! HTTP transports the command client dispatches through.
//!
//! The client never talks to the network directly. It hands each
//! [`CommandRequest`] to a [`Transport`] and passes the response back
//! untouched, which keeps the client testable with a recording mock.

mod dry_run;
#[cfg(feature = "reqwest-transport")]
mod http;
#[cfg(test)]
pub(crate) mod mock;

use std::sync::Arc;

use async_trait::async_trait;

use crate::request::CommandRequest;
use crate::request::Headers;
use crate::request::Method;

pub use dry_run::DryRunTransport;
#[cfg(feature = "reqwest-transport")]
pub use http::ReqwestTransport;

/// Raw response from the vendor API. The body is never parsed here.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub headers: Headers,
    pub body: String,
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[cfg(feature = "reqwest-transport")]
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{method} {url} returned status {status}: {body}")]
    Status {
        method: Method,
        url: String,
        status: u16,
        body: String,
    },

    #[error("Invalid header {name}: {reason}")]
    InvalidHeader { name: String, reason: String },

    #[error("Failed to encode request body: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

/// Trait for sending a built request
///
/// Implementations own connection handling, TLS, timeouts and any retry
/// policy. Failures must be surfaced as errors so callers can propagate them.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: CommandRequest) -> Result<TransportResponse, TransportError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn send(&self, request: CommandRequest) -> Result<TransportResponse, TransportError> {
        (**self).send(request).await
    }
}
