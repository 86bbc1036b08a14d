//! Error types for billing API models.

/// Errors raised when constructing a request model from invalid input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    /// The vendor is not one of the accepted marketplace vendors.
    #[error("Invalid vendor \"{vendor}\". Possible values are: {allowed}")]
    InvalidVendor {
        /// The rejected vendor value.
        vendor: String,
        /// Quoted, comma separated list of accepted values.
        allowed: String,
    },

    /// A required string field was empty.
    #[error("Invalid {field}. The value must not be empty")]
    EmptyValue {
        /// Human readable field name, e.g. `subscription ID`.
        field: &'static str,
    },
}

impl ModelError {
    pub(crate) fn empty(field: &'static str) -> Self {
        Self::EmptyValue { field }
    }
}

/// Reject an empty string for the given field.
pub(crate) fn require_non_empty(value: String, field: &'static str) -> Result<String, ModelError> {
    if value.is_empty() {
        return Err(ModelError::empty(field));
    }
    Ok(value)
}
