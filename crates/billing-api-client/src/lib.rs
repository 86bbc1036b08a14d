//! Billing Client SDK.
//!
//! This crate provides a client library for services to query prepaid
//! credits, record usage and manage marketplace subscriptions through the
//! billing API.
//!
//! # Example
//!
//! ```no_run
//! use billing_api_client::{ClientFactory, ClientOptions};
//!
//! # async fn example() -> Result<(), billing_api_client::BillingClientError> {
//! let client = ClientFactory::new().create_client(
//!     "https://billing.keboola.com/",
//!     "storage-api-token",
//!     ClientOptions::new().with_max_retries(3),
//! )?;
//!
//! let remaining = client.get_remaining_credits().await?;
//! println!("Remaining credits: {remaining}");
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod checker;
mod client;
mod config;
mod error;
mod executor;
mod factory;
mod log;
mod manage;
mod retry;
mod transport;

#[cfg(any(test, feature = "mock"))]
pub mod testing;

pub use billing_api_core::{
    ConfirmSubscriptionParameters, JobDurationParameters, JobDurationRecord, MarketplaceVendor,
    ModelError, ResolveTokenParameters, ResolveTokenResult, SandboxDurationParameters,
};
pub use checker::{
    CreditsChecker, IndexError, ServiceEntry, ServiceIndex, BILLING_SERVICE_ID,
    PAY_AS_YOU_GO_FEATURE,
};
pub use client::Client;
pub use config::{
    ClientConfig, ClientOptions, DEFAULT_CONNECT_TIMEOUT, DEFAULT_MAX_RETRIES, DEFAULT_TIMEOUT,
    DEFAULT_USER_AGENT, MAX_RETRIES_LIMIT,
};
pub use error::{BillingClientError, ConfigurationError, Violation, JSON_PARSE_ERROR_PREFIX};
pub use executor::{Request, RequestExecutor};
pub use factory::{ClientFactory, MANAGE_API_TOKEN_HEADER, STORAGE_API_TOKEN_HEADER};
pub use log::{RequestLogger, TracingRequestLogger};
pub use manage::ManageClient;
pub use retry::{should_retry, AttemptOutcome, Backoff};
pub use transport::{
    HttpRequest, HttpResponse, ReqwestTransport, Transport, TransportError, TransportErrorKind,
};
