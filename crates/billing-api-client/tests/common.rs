//! Common test utilities for billing client integration tests.

#![allow(dead_code)] // Some utilities are used by different test files

use std::sync::{Arc, Mutex};

use billing_api_client::{Backoff, ClientOptions, RequestLogger};
use wiremock::{MockServer, Request};

/// Options with retries that do not wait between attempts.
pub fn options() -> ClientOptions {
    init_tracing();
    ClientOptions::new().with_backoff(Backoff::none())
}

/// Install a test subscriber once so `tracing` output shows up with `--nocapture`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "billing_api_client=debug".into()),
        )
        .with_test_writer()
        .try_init();
}

/// Requests the mock server received, oldest first.
pub async fn received(server: &MockServer) -> Vec<Request> {
    server
        .received_requests()
        .await
        .expect("request recording is enabled")
}

/// Header value of a received request as a string.
pub fn header<'a>(request: &'a Request, name: &str) -> &'a str {
    request
        .headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

/// Request logger that keeps every line in memory.
#[derive(Debug, Default)]
pub struct CapturingLogger {
    lines: Mutex<Vec<String>>,
}

impl CapturingLogger {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }
}

impl RequestLogger for CapturingLogger {
    fn info(&self, line: &str) {
        self.lines.lock().unwrap().push(line.to_string());
    }
}
