use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;

use super::Transport;
use super::TransportError;
use super::TransportResponse;
use crate::request::CommandRequest;

/// Mock transport for testing
///
/// Records every request it receives and answers with a canned response.
/// Clones share the same record, so a test can keep one clone while the
/// client owns another.
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    inner: Arc<Mutex<MockState>>,
}

#[derive(Debug, Default)]
struct MockState {
    requests: Vec<CommandRequest>,
    response: TransportResponse,
    fail_on: Option<usize>,
}

impl MockTransport {
    /// Create a mock that answers every request with an empty 200
    pub fn new() -> Self {
        let mock = Self::default();
        mock.inner.lock().unwrap().response.status = 200;
        mock
    }

    /// Answer every request with the given body
    pub fn with_body(body: &str) -> Self {
        let mock = Self::new();
        mock.inner.lock().unwrap().response.body = body.to_string();
        mock
    }

    /// Fail the request at `index` (zero-based) with a transport error
    pub fn failing_on(index: usize) -> Self {
        let mock = Self::new();
        mock.inner.lock().unwrap().fail_on = Some(index);
        mock
    }

    /// Requests received so far, in order
    pub fn requests(&self) -> Vec<CommandRequest> {
        self.inner.lock().unwrap().requests.clone()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: CommandRequest) -> Result<TransportResponse, TransportError> {
        let mut state = self.inner.lock().unwrap();
        let index = state.requests.len();
        state.requests.push(request);

        if state.fail_on == Some(index) {
            return Err(TransportError::Other(format!(
                "injected failure on request {}",
                index
            )));
        }

        Ok(state.response.clone())
    }
}
