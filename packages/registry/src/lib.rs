//! HTTP client for the remote device registry.
//!
//! [`HttpRegistryClient`] implements [`sync_core::RegistryApi`] on top of
//! `reqwest`, classifying responses into the registry error taxonomy and
//! retrying transient failures according to a [`sync_core::RetryStrategy`].

mod client;
mod config;
mod retry;
mod wire;

pub use client::{ClientError, HttpRegistryClient, classify_status};
pub use config::{DEFAULT_PLATFORM, RegistryConfig};
pub use retry::with_retry;
