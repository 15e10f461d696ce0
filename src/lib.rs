//! SendGrid provider
//!
//! Manages SendGrid account configuration as infrastructure: API keys,
//! teammates, subusers, templates, sender identities, domain and link
//! branding, webhooks and mail settings.
//!
//! The provider speaks the Hemmer provider protocol over gRPC. The binary
//! prints a handshake line to stdout and then serves until it receives
//! SIGTERM or SIGINT:
//!
//! ```text
//! HEMMER_PROVIDER|1|127.0.0.1:50051
//! ```
//!
//! # Layers
//!
//! - [`client`]: typed SendGrid v3 REST calls. A 429 surfaces as
//!   [`client::ApiError::RateLimited`] carrying the reset hint.
//! - [`retry`]: retries rate-limited calls, honoring the hint, until the
//!   attempt or time budget runs out or the provider is stopped.
//! - [`reconcile`]: folds SendGrid's eventually consistent answers back
//!   onto configured values so refreshes do not report phantom drift.
//! - [`resources`] and [`data_sources`]: one adapter per object kind.
//! - [`provider`]: [`SendgridProvider`], the [`ProviderService`] that ties
//!   the adapters to configuration, planning and validation.
//! - [`server`]: the gRPC surface.
//!
//! # Configuration
//!
//! ```text
//! provider "sendgrid" {
//!   api_key = "SG.xxxx"          # or SENDGRID_API_KEY
//!   subuser = "marketing"        # or SENDGRID_SUBUSER
//! }
//! ```
//!
//! See [`config::ProviderConfig`] for every attribute.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod client;
pub mod config;
pub mod data_sources;
pub mod error;
pub mod logging;
pub mod plan;
pub mod provider;
pub mod reconcile;
pub mod resources;
pub mod retry;
pub mod schema;
pub mod server;
pub mod testing;
pub mod types;
pub mod validation;

#[allow(missing_docs)]
#[allow(clippy::all)]
pub mod generated;

pub use client::{ApiError, SendgridClient};
pub use config::ProviderConfig;
pub use error::ProviderError;
pub use logging::{init_logging, init_logging_with_default};
pub use provider::SendgridProvider;
pub use retry::{retry_on_rate_limit, RetryError, RetryPolicy};
pub use schema::ProviderSchema;
pub use server::{
    serve, serve_on, serve_on_with_options, serve_with_options, ProviderService, ServeOptions,
};
pub use types::{
    AttributeChange, ImportedResource, PlanResult, ProviderMetadata, HANDSHAKE_PREFIX,
    PROTOCOL_VERSION,
};
