use std::sync::Mutex;

use async_trait::async_trait;
use tracing::info;

use super::Transport;
use super::TransportError;
use super::TransportResponse;
use crate::request::CommandRequest;

/// Transport that records requests instead of sending them
///
/// Every request is encoded (so encoding errors still surface), logged and
/// answered with an empty 200 response.
#[derive(Debug, Default)]
pub struct DryRunTransport {
    requests: Mutex<Vec<CommandRequest>>,
}

impl DryRunTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drain the requests recorded so far
    pub fn take_requests(&self) -> Vec<CommandRequest> {
        std::mem::take(&mut *self.lock())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<CommandRequest>> {
        // A panic while holding the lock leaves the Vec intact
        self.requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl Transport for DryRunTransport {
    async fn send(&self, request: CommandRequest) -> Result<TransportResponse, TransportError> {
        let body = request.body.encode()?;
        info!("[dry-run] {} {} {}", request.method, request.url, body);

        self.lock().push(request);

        Ok(TransportResponse {
            status: 200,
            ..TransportResponse::default()
        })
    }
}
