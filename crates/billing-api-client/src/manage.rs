//! Management API client, authenticated with a Manage API token.

use billing_api_core::{
    ConfirmSubscriptionParameters, JobDurationParameters, JobDurationRecord, MarketplaceVendor,
    ResolveTokenParameters, ResolveTokenResult, SandboxDurationParameters,
};

use crate::error::BillingClientError;
use crate::executor::{Request, RequestExecutor};

/// Records usage and manages marketplace subscriptions.
#[derive(Debug, Clone)]
pub struct ManageClient {
    executor: RequestExecutor,
}

impl ManageClient {
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

    /// Record how long a job ran; returns the record as stored by the service.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the echoed record is incomplete.
    pub async fn record_job_duration(
        &self,
        params: &JobDurationParameters,
    ) -> Result<JobDurationRecord, BillingClientError> {
        let request = Request::put_json("duration/job", params)?;
        let data = self.executor.send_request(&request).await?;
        JobDurationRecord::from_response(data).map_err(BillingClientError::unexpected_payload)
    }

    /// Record how long a container sandbox ran.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn record_container_sandbox_duration(
        &self,
        params: &SandboxDurationParameters,
    ) -> Result<(), BillingClientError> {
        let request = Request::put_json("duration/container-sandbox", params)?;
        self.executor.send_request_without_response(&request).await
    }

    /// Look up the subscription behind a vendor-issued marketplace token.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or a required key is missing
    /// from the response.
    pub async fn resolve_marketplace_token(
        &self,
        params: &ResolveTokenParameters,
    ) -> Result<ResolveTokenResult, BillingClientError> {
        let request = Request::post_json("marketplaces/resolve-token", params)?;
        let data = self.executor.send_request(&request).await?;
        ResolveTokenResult::from_response(data).map_err(BillingClientError::unexpected_payload)
    }

    /// Resolve a marketplace token given the vendor name as text.
    ///
    /// # Errors
    ///
    /// Returns [`BillingClientError::Model`] without sending anything if the
    /// vendor is unknown or the token is empty, otherwise as
    /// [`Self::resolve_marketplace_token`].
    pub async fn resolve_vendor_token(
        &self,
        vendor: &str,
        token: &str,
    ) -> Result<ResolveTokenResult, BillingClientError> {
        let params = ResolveTokenParameters::new(vendor.parse::<MarketplaceVendor>()?, token)?;
        self.resolve_marketplace_token(&params).await
    }

    /// Activate a resolved subscription for an organization and project.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn confirm_marketplace_subscription(
        &self,
        params: &ConfirmSubscriptionParameters,
    ) -> Result<(), BillingClientError> {
        let request = Request::post_json("marketplaces/confirm-subscription", params)?;
        self.executor.send_request_without_response(&request).await
    }
}
