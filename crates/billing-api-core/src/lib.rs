//! Core request and response models for the billing API.
//!
//! This crate provides the typed values exchanged with the billing service:
//!
//! - **Marketplace**: `MarketplaceVendor`, `ResolveTokenParameters`,
//!   `ConfirmSubscriptionParameters`, `ResolveTokenResult`
//! - **Usage**: `JobDurationParameters`, `JobDurationRecord`,
//!   `SandboxDurationParameters`
//!
//! Request models validate their inputs on construction. Response models are
//! built only from a decoded JSON object; a missing required key is a decode
//! error, optional keys default to absent.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod marketplace;
pub mod usage;

mod serde_helpers;

pub use error::ModelError;
pub use marketplace::{
    ConfirmSubscriptionParameters, MarketplaceVendor, ResolveTokenParameters, ResolveTokenResult,
};
pub use usage::{JobDurationParameters, JobDurationRecord, SandboxDurationParameters};
