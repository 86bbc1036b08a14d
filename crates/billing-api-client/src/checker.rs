//! Pay-as-you-go credit check.
//!
//! Projects only consume credits when the billing service is deployed in the
//! stack and the token owner has the `pay-as-you-go` feature. In every other
//! case work is always allowed and billing is never contacted.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::client::Client;
use crate::config::ClientOptions;
use crate::error::BillingClientError;
use crate::factory::ClientFactory;

/// Service directory ID of the billing service.
pub const BILLING_SERVICE_ID: &str = "billing";
/// Owner feature that enables credit checks.
pub const PAY_AS_YOU_GO_FEATURE: &str = "pay-as-you-go";

/// Boxed error returned by a [`ServiceIndex`] implementation.
pub type IndexError = Box<dyn std::error::Error + Send + Sync>;

/// An entry of the stack's service directory.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServiceEntry {
    /// Service ID, e.g. `billing`.
    pub id: String,
    /// Base URL of the service.
    pub url: String,
}

/// The account service the check consults before contacting billing.
#[async_trait]
pub trait ServiceIndex: Send + Sync {
    /// Services registered in the stack.
    async fn services(&self) -> Result<Vec<ServiceEntry>, IndexError>;

    /// Feature flags of the token owner.
    async fn owner_features(&self) -> Result<Vec<String>, IndexError>;

    /// The token billing requests are authenticated with.
    fn token(&self) -> &str;
}

#[async_trait]
impl<T: ServiceIndex + ?Sized> ServiceIndex for Arc<T> {
    async fn services(&self) -> Result<Vec<ServiceEntry>, IndexError> {
        (**self).services().await
    }

    async fn owner_features(&self) -> Result<Vec<String>, IndexError> {
        (**self).owner_features().await
    }

    fn token(&self) -> &str {
        (**self).token()
    }
}

/// Decides whether the token's project may run more work.
#[derive(Debug, Clone)]
pub struct CreditsChecker<I> {
    factory: ClientFactory,
    index: I,
}

impl<I: ServiceIndex> CreditsChecker<I> {
    /// Create a checker over the given service index.
    #[must_use]
    pub fn new(factory: ClientFactory, index: I) -> Self {
        Self { factory, index }
    }

    /// URL of the billing service, if the stack has one.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory lookup fails.
    pub async fn billing_url(&self) -> Result<Option<String>, BillingClientError> {
        let services = self
            .index
            .services()
            .await
            .map_err(BillingClientError::ServiceIndex)?;
        Ok(services
            .into_iter()
            .find(|service| service.id == BILLING_SERVICE_ID)
            .map(|service| service.url))
    }

    /// Credits client for the stack's billing service.
    ///
    /// # Errors
    ///
    /// Returns [`BillingClientError::ServiceNotFound`] if the stack has no
    /// billing service, or an error if the client cannot be built.
    pub async fn billing_client(
        &self,
        token: &str,
        options: ClientOptions,
    ) -> Result<Client, BillingClientError> {
        let url = self
            .billing_url()
            .await?
            .ok_or_else(|| BillingClientError::ServiceNotFound(BILLING_SERVICE_ID.to_string()))?;
        self.factory.create_client(&url, token, options)
    }

    /// Whether the project has credits left to run work.
    ///
    /// Always `true` without billing or without the pay-as-you-go feature;
    /// otherwise `true` only while the remaining balance is positive.
    ///
    /// # Errors
    ///
    /// Returns an error if a lookup or the credits request fails.
    #[instrument(skip(self, options))]
    pub async fn has_credits(&self, options: ClientOptions) -> Result<bool, BillingClientError> {
        let Some(url) = self.billing_url().await? else {
            debug!("Billing service not available, credits not checked");
            return Ok(true);
        };

        let features = self
            .index
            .owner_features()
            .await
            .map_err(BillingClientError::ServiceIndex)?;
        if !features.iter().any(|f| f == PAY_AS_YOU_GO_FEATURE) {
            debug!("Project is not pay-as-you-go, credits not checked");
            return Ok(true);
        }

        let client = self.factory.create_client(&url, self.index.token(), options)?;
        let remaining = client.get_remaining_credits().await?;
        debug!(remaining, "Remaining credits");
        Ok(remaining > 0.0)
    }
}
