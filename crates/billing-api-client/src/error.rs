//! Client error types.

use std::fmt;

use billing_api_core::ModelError;

use crate::transport::TransportError;

/// Prefix of every [`BillingClientError::Decode`] raised for a malformed body.
pub const JSON_PARSE_ERROR_PREFIX: &str = "Unable to parse response body into JSON";

/// A single rejected construction parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// The offending value, as supplied.
    pub value: String,
    /// Why the value was rejected.
    pub message: &'static str,
}

impl Violation {
    pub(crate) fn new(value: impl Into<String>, message: &'static str) -> Self {
        Self {
            value: value.into(),
            message,
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Value \"{}\" is invalid: {}", self.value, self.message)
    }
}

/// Every violation found while validating client construction parameters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid parameters when creating client: {}", list_violations(.violations))]
pub struct ConfigurationError {
    violations: Vec<Violation>,
}

impl ConfigurationError {
    pub(crate) fn new(violations: Vec<Violation>) -> Self {
        Self { violations }
    }

    /// Violations in the order they were detected.
    #[must_use]
    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }
}

/// One `Value "..." is invalid: ...` line per violation.
fn list_violations(violations: &[Violation]) -> String {
    violations.iter().map(|v| format!("{v}\n")).collect()
}

/// Errors that can occur when using the billing client.
#[derive(Debug, thiserror::Error)]
pub enum BillingClientError {
    /// Invalid construction parameters; raised before any network activity.
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// Connection, timeout or other network failure after retries ran out.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The service answered with a 5xx status after retries ran out.
    #[error("{message}")]
    Server {
        /// HTTP status code of the last attempt.
        status: u16,
        /// Error message.
        message: String,
    },

    /// The service answered with a 4xx status. Never retried.
    #[error("{message}")]
    Client {
        /// HTTP status code.
        status: u16,
        /// Error message.
        message: String,
    },

    /// The response body was malformed or incomplete.
    #[error("{0}")]
    Decode(String),

    /// The request could not be built (bad path or unserializable body).
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// A request model was rejected.
    #[error(transparent)]
    Model(#[from] ModelError),

    /// The service directory has no entry for the requested service.
    #[error("Service \"{0}\" was not found in KBC services")]
    ServiceNotFound(String),

    /// The service directory lookup failed.
    #[error("service index lookup failed: {0}")]
    ServiceIndex(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl BillingClientError {
    /// HTTP status code associated with the error, or 0 if there is none.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Server { status, .. } | Self::Client { status, .. } => *status,
            Self::ServiceNotFound(_) => 500,
            _ => 0,
        }
    }

    /// Whether the error came from a response body that could not be decoded.
    #[must_use]
    pub const fn is_decode(&self) -> bool {
        matches!(self, Self::Decode(_))
    }

    pub(crate) fn json_parse(reason: impl fmt::Display) -> Self {
        Self::Decode(format!("{JSON_PARSE_ERROR_PREFIX}: {reason}"))
    }

    pub(crate) fn unexpected_payload(reason: impl fmt::Display) -> Self {
        Self::Decode(format!("Unexpected response payload: {reason}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configuration_error_lists_each_violation() {
        let err = ConfigurationError::new(vec![
            Violation::new("invalid url", "This value is not a valid URL."),
            Violation::new("", "This value should not be blank."),
        ]);

        assert_eq!(
            err.to_string(),
            "Invalid parameters when creating client: \
             Value \"invalid url\" is invalid: This value is not a valid URL.\n\
             Value \"\" is invalid: This value should not be blank.\n"
        );
    }

    #[test]
    fn status_code_defaults_to_zero() {
        assert_eq!(BillingClientError::json_parse("Syntax error").status_code(), 0);
        assert_eq!(
            BillingClientError::Client {
                status: 404,
                message: "not found".into()
            }
            .status_code(),
            404
        );
        assert_eq!(
            BillingClientError::ServiceNotFound("billing".into()).status_code(),
            500
        );
    }

    #[test]
    fn json_parse_message_has_stable_prefix() {
        let err = BillingClientError::json_parse("Syntax error");
        assert!(err.is_decode());
        assert_eq!(
            err.to_string(),
            "Unable to parse response body into JSON: Syntax error"
        );
    }
}
