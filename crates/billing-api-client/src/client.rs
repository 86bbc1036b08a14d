//! Credits API client, authenticated with a Storage API token.

use serde_json::{Map, Value};

use crate::error::BillingClientError;
use crate::executor::{Request, RequestExecutor};

/// Queries the prepaid credit balance of the token's project.
#[derive(Debug, Clone)]
pub struct Client {
    executor: RequestExecutor,
}

impl Client {
    /// Wrap a configured executor.
    #[must_use]
    pub fn new(executor: RequestExecutor) -> Self {
        Self { executor }
    }

    /// The underlying executor.
    #[must_use]
    pub fn executor(&self) -> &RequestExecutor {
        &self.executor
    }

    /// Remaining prepaid credits.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response has no numeric
    /// `remaining` value.
    pub async fn get_remaining_credits(&self) -> Result<f64, BillingClientError> {
        let data = self.executor.send_request(&Request::get("credits")).await?;
        remaining_credits(&data)
    }
}

/// Read `remaining`, which the service sends as a number or a numeric string.
fn remaining_credits(data: &Map<String, Value>) -> Result<f64, BillingClientError> {
    match data.get("remaining") {
        Some(Value::Number(number)) => number
            .as_f64()
            .ok_or_else(|| BillingClientError::unexpected_payload("remaining is out of range")),
        Some(Value::String(text)) => text.trim().parse::<f64>().map_err(|_| {
            BillingClientError::unexpected_payload(format!(
                "remaining \"{text}\" is not a number"
            ))
        }),
        Some(other) => Err(BillingClientError::unexpected_payload(format!(
            "remaining has unexpected value {other}"
        ))),
        None => Err(BillingClientError::unexpected_payload(
            "missing key \"remaining\"",
        )),
    }
}
