//! Cloud marketplace subscription models.
//!
//! Marketplace subscriptions are issued by a cloud vendor (Azure, GCP) and
//! must be resolved and then confirmed against the billing service.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{require_non_empty, ModelError};
use crate::serde_helpers::object_or_empty;

/// Marketplace vendors accepted in requests.
///
/// Responses may still carry vendors outside this set (e.g. the legacy
/// `aws`), which is why [`ResolveTokenResult::vendor`] is a plain string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarketplaceVendor {
    /// Microsoft Azure Marketplace.
    Azure,
    /// Google Cloud Marketplace.
    Gcp,
}

impl MarketplaceVendor {
    /// All vendors accepted in requests.
    pub const ALL: [Self; 2] = [Self::Azure, Self::Gcp];

    /// Wire representation of the vendor.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Azure => "azure",
            Self::Gcp => "gcp",
        }
    }
}

impl fmt::Display for MarketplaceVendor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MarketplaceVendor {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|vendor| vendor.as_str() == s)
            .ok_or_else(|| ModelError::InvalidVendor {
                vendor: s.to_string(),
                allowed: Self::ALL
                    .iter()
                    .map(|v| format!("\"{v}\""))
                    .collect::<Vec<_>>()
                    .join(", "),
            })
    }
}

/// Body of a `marketplaces/resolve-token` request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolveTokenParameters {
    vendor: MarketplaceVendor,
    token: String,
}

impl ResolveTokenParameters {
    /// Create resolve parameters for a vendor-issued marketplace token.
    ///
    /// # Errors
    ///
    /// Returns an error if the token is empty.
    pub fn new(vendor: MarketplaceVendor, token: impl Into<String>) -> Result<Self, ModelError> {
        Ok(Self {
            vendor,
            token: require_non_empty(token.into(), "token")?,
        })
    }

    /// The marketplace vendor that issued the token.
    #[must_use]
    pub const fn vendor(&self) -> MarketplaceVendor {
        self.vendor
    }

    /// The marketplace token.
    #[must_use]
    pub fn token(&self) -> &str {
        &self.token
    }
}

/// Body of a `marketplaces/confirm-subscription` request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmSubscriptionParameters {
    subscription_id: String,
    organization_id: String,
    project_id: String,
}

impl ConfirmSubscriptionParameters {
    /// Create confirmation parameters binding a subscription to a project.
    ///
    /// # Errors
    ///
    /// Returns an error if any of the identifiers is empty.
    pub fn new(
        subscription_id: impl Into<String>,
        organization_id: impl Into<String>,
        project_id: impl Into<String>,
    ) -> Result<Self, ModelError> {
        Ok(Self {
            subscription_id: require_non_empty(subscription_id.into(), "subscription ID")?,
            organization_id: require_non_empty(organization_id.into(), "organization ID")?,
            project_id: require_non_empty(project_id.into(), "project ID")?,
        })
    }

    /// Marketplace subscription ID.
    #[must_use]
    pub fn subscription_id(&self) -> &str {
        &self.subscription_id
    }

    /// Organization the subscription is attached to.
    #[must_use]
    pub fn organization_id(&self) -> &str {
        &self.organization_id
    }

    /// Project the subscription is attached to.
    #[must_use]
    pub fn project_id(&self) -> &str {
        &self.project_id
    }
}

/// A marketplace subscription as returned by `marketplaces/resolve-token`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveTokenResult {
    /// Billing-side subscription ID.
    pub id: String,
    /// Vendor name as reported by the service; not limited to [`MarketplaceVendor`].
    pub vendor: String,
    /// Subscription ID on the vendor side.
    pub vendor_subscription_id: String,
    /// Marketplace product ID.
    pub product_id: String,
    /// Marketplace plan ID.
    pub plan_id: String,
    /// Lifecycle state, e.g. `inactive` or `active`.
    pub state: String,
    /// Organization the subscription is bound to, once confirmed.
    #[serde(default)]
    pub organization_id: Option<String>,
    /// Project the subscription is bound to, once confirmed.
    #[serde(default)]
    pub project_id: Option<String>,
    /// Creation time.
    pub date_created: DateTime<FixedOffset>,
    /// Last modification time.
    pub date_modified: DateTime<FixedOffset>,
    /// Opaque vendor specific payload.
    #[serde(default, deserialize_with = "object_or_empty")]
    pub vendor_data: Map<String, Value>,
}

impl ResolveTokenResult {
    /// Build the result from a decoded response object.
    ///
    /// # Errors
    ///
    /// Returns an error if a required key is missing or has the wrong type.
    pub fn from_response(data: Map<String, Value>) -> Result<Self, serde_json::Error> {
        serde_json::from_value(Value::Object(data))
    }
}
