//! Scripted transport for tests.
//!
//! ```ignore
//! use std::sync::Arc;
//! use billing_api_client::testing::MockTransport;
//! use billing_api_client::{Client, ClientOptions, RequestExecutor};
//! use reqwest::StatusCode;
//!
//! # async fn example() -> Result<(), billing_api_client::BillingClientError> {
//! let transport = MockTransport::new();
//! transport.push_response(StatusCode::OK, r#"{"remaining":"10"}"#);
//!
//! let executor = RequestExecutor::new(
//!     "https://billing.example.com/",
//!     "X-StorageApi-Token",
//!     "token",
//!     ClientOptions::new().with_transport(Arc::new(transport.clone())),
//! )?;
//! let remaining = Client::new(executor).get_remaining_credits().await?;
//! assert!(remaining > 0.0);
//! assert_eq!(transport.requests().len(), 1);
//! # Ok(())
//! # }
//! ```

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use reqwest::StatusCode;

use crate::transport::{
    HttpRequest, HttpResponse, Transport, TransportError, TransportErrorKind,
};

#[derive(Debug, Default)]
struct MockState {
    queue: VecDeque<Result<HttpResponse, TransportError>>,
    history: Vec<HttpRequest>,
}

/// Replays queued responses in order and records every request it receives.
///
/// Clones share the same queue and history. Once the queue is empty every
/// request fails with a transport error.
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    /// Create a transport with nothing queued.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response with the given body.
    pub fn push_response(&self, status: StatusCode, body: impl Into<Vec<u8>>) {
        self.push(Ok(HttpResponse::new(status, body)));
    }

    /// Queue a response with an empty body.
    pub fn push_status(&self, status: StatusCode) {
        self.push_response(status, Vec::new());
    }

    /// Queue a response with a JSON body.
    pub fn push_json(&self, status: StatusCode, body: &serde_json::Value) {
        self.push_response(status, body.to_string());
    }

    /// Queue a transport failure.
    pub fn push_error(&self, kind: TransportErrorKind, message: impl Into<String>) {
        self.push(Err(TransportError::new(kind, message)));
    }

    /// Requests received so far, oldest first.
    #[must_use]
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.lock().history.clone()
    }

    fn push(&self, entry: Result<HttpResponse, TransportError>) {
        self.lock().queue.push_back(entry);
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let mut state = self.lock();
        state.history.push(request);
        state.queue.pop_front().unwrap_or_else(|| {
            Err(TransportError::new(
                TransportErrorKind::Other,
                "mock transport has no queued responses",
            ))
        })
    }
}
