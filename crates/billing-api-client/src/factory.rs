//! Construction of the typed clients.

use crate::client::Client;
use crate::config::ClientOptions;
use crate::error::BillingClientError;
use crate::executor::RequestExecutor;
use crate::manage::ManageClient;

/// Header carrying a Storage API token.
pub const STORAGE_API_TOKEN_HEADER: &str = "X-StorageApi-Token";
/// Header carrying a Manage API token.
pub const MANAGE_API_TOKEN_HEADER: &str = "X-KBC-ManageApiToken";

/// Builds clients with the auth header each API expects.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClientFactory;

impl ClientFactory {
    /// Create a factory.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Credits client authenticated with a Storage API token.
    ///
    /// # Errors
    ///
    /// Returns an error if any parameter is invalid.
    pub fn create_client(
        &self,
        billing_url: &str,
        token: &str,
        options: ClientOptions,
    ) -> Result<Client, BillingClientError> {
        let executor = RequestExecutor::new(billing_url, STORAGE_API_TOKEN_HEADER, token, options)?;
        Ok(Client::new(executor))
    }

    /// Management client authenticated with a Manage API token.
    ///
    /// # Errors
    ///
    /// Returns an error if any parameter is invalid.
    pub fn create_manage_client(
        &self,
        billing_url: &str,
        token: &str,
        options: ClientOptions,
    ) -> Result<ManageClient, BillingClientError> {
        let executor = RequestExecutor::new(billing_url, MANAGE_API_TOKEN_HEADER, token, options)?;
        Ok(ManageClient::new(executor))
    }
}
