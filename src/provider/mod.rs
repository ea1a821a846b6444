//! # Provider System
//!
//! Providers are the secret stores `setsecrets` reads from. Every backend
//! implements the [`Provider`] trait, and the retrieval engine in
//! [`crate::loader`] only ever sees a `dyn Provider`, so adding a backend never
//! touches the engine.
//!
//! ## Available Providers
//!
//! - [`GcpProvider`]: Google Cloud Secret Manager, through the `gcloud` CLI
//! - [`DotEnvProvider`]: `.env` files
//! - [`EnvProvider`]: environment variables of the current process
//!
//! ## URI-Based Configuration
//!
//! ```text
//! gcp://
//! gcp://my-project
//! dotenv:/path/to/.env
//! env://
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use setsecrets::provider::Provider;
//! use std::convert::TryFrom;
//!
//! let provider = Box::<dyn Provider>::try_from("dotenv:.env.production")?;
//! let value = provider.get_secret(&CancellationToken::new(), "API_KEY").await?;
//! ```

use crate::{Result, SetSecretsError};
use async_trait::async_trait;
use std::convert::TryFrom;
use tokio_util::sync::CancellationToken;
use url::Url;

pub mod dotenv;
pub mod env;
pub mod gcp;
#[macro_use]
pub mod macros;


pub use dotenv::{DotEnvConfig, DotEnvProvider};
pub use env::{EnvConfig, EnvProvider};
pub use gcp::{GcpConfig, GcpProvider};

/// Information about a secret storage provider.
///
/// Contains metadata used for listing the available providers, including the
/// provider's name, description, and example URIs.
#[derive(Debug, Clone)]
pub struct ProviderInfo {
    /// The canonical name of the provider (e.g., "gcp", "dotenv").
    pub name: &'static str,
    /// A human-readable description of what the provider does.
    pub description: &'static str,
    /// Example URIs showing how to configure this provider.
    pub examples: &'static [&'static str],
}

impl ProviderInfo {
    /// Formats the provider information for display, including examples if available.
    ///
    /// - Without examples: "name: description"
    /// - With examples: "name: description (e.g., example1, example2)"
    pub fn display_with_examples(&self) -> String {
        if self.examples.is_empty() {
            format!("{}: {}", self.name, self.description)
        } else {
            format!(
                "{}: {} (e.g., {})",
                self.name,
                self.description,
                self.examples.join(", ")
            )
        }
    }
}

/// Macro support types
pub use macros::{PROVIDER_REGISTRY, ProviderRegistration};

/// Returns a list of all registered providers with their metadata.
pub fn providers() -> Vec<ProviderInfo> {
    PROVIDER_REGISTRY
        .iter()
        .map(|reg| reg.info.clone())
        .collect()
}

/// Trait defining the interface for secret stores.
///
/// # Thread Safety
///
/// Providers must be `Send + Sync`: the engine shares one provider between
/// all retrieval tasks. A provider whose [`concurrency`](Provider::concurrency)
/// is greater than 1 promises that [`get_secret`](Provider::get_secret) may be
/// called from several tasks at the same time.
///
/// # Cancellation
///
/// `get_secret` receives the cancellation token shared by every retrieval of
/// one load. Observing it is optional; a provider that does should return
/// [`SetSecretsError::Cancelled`] once it fires.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Suggested maximum number of concurrent `get_secret` calls.
    ///
    /// Values below 1 are treated as 1 by the engine.
    fn concurrency(&self) -> usize;

    /// Retrieves the secret identified by `key`.
    ///
    /// The key format is provider-specific. Fails when the key is unknown,
    /// access is denied, the backend call fails, or the key is malformed
    /// (e.g. empty).
    async fn get_secret(&self, cancel: &CancellationToken, key: &str) -> Result<String>;

    /// Returns the name of this provider.
    ///
    /// This should match the name registered with the provider macro.
    fn name(&self) -> &'static str;
}

impl TryFrom<String> for Box<dyn Provider> {
    type Error = SetSecretsError;

    fn try_from(s: String) -> Result<Self> {
        Self::try_from(&s as &str)
    }
}

impl TryFrom<&str> for Box<dyn Provider> {
    type Error = SetSecretsError;

    /// Creates a provider instance from a URI string.
    ///
    /// Accepts full URIs (`gcp://my-project`), bare names (`gcp`, `gcp:`) and
    /// path shorthands (`dotenv:/path/to/.env`, `dotenv:.env.production`).
    fn try_from(s: &str) -> Result<Self> {
        let (scheme, rest) = match s.find(':') {
            Some(pos) => (&s[..pos], &s[pos + 1..]),
            None => (s, ""),
        };

        let is_valid_scheme = PROVIDER_REGISTRY
            .iter()
            .any(|reg| reg.schemes.contains(&scheme));

        if !is_valid_scheme {
            return Err(SetSecretsError::ProviderNotFound(scheme.to_string()));
        }

        let url_string = match rest {
            // Just scheme name (e.g., "gcp")
            "" | ":" => format!("{}://", scheme),
            // Standard URI format (e.g., "gcp://my-project")
            s if s.starts_with("//") => format!("{}:{}", scheme, s),
            // Absolute path (e.g., "dotenv:/path/to/.env")
            s if s.starts_with('/') => format!("{}://{}", scheme, s),
            // Host or relative path (e.g., "gcp:my-project", "dotenv:.env.local")
            s => format!("{}://{}", scheme, s),
        };

        let proper_url = Url::parse(&url_string).map_err(|e| {
            SetSecretsError::ProviderInit(format!(
                "Invalid provider specification '{}': {}",
                s, e
            ))
        })?;

        Self::try_from(&proper_url)
    }
}

impl TryFrom<&Url> for Box<dyn Provider> {
    type Error = SetSecretsError;

    fn try_from(url: &Url) -> Result<Self> {
        let scheme = url.scheme();

        let registration = PROVIDER_REGISTRY
            .iter()
            .find(|reg| reg.schemes.contains(&scheme))
            .ok_or_else(|| SetSecretsError::ProviderNotFound(scheme.to_string()))?;

        (registration.factory)(url)
    }
}

/// Returns the host of a provider URL if it carries one.
///
/// Non-special schemes report `Some("")` for `scheme://`; that is folded into
/// `None`.
pub(crate) fn url_host(url: &Url) -> Option<&str> {
    url.host_str().filter(|h| !h.is_empty())
}
