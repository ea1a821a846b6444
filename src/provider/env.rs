use super::Provider;
use crate::{Result, SetSecretsError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::env;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Configuration for the environment variables provider.
///
/// The provider reads from the process environment and needs no settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnvConfig {}

impl TryFrom<&Url> for EnvConfig {
    type Error = SetSecretsError;

    fn try_from(url: &Url) -> std::result::Result<Self, Self::Error> {
        if url.scheme() != "env" {
            return Err(SetSecretsError::ProviderInit(format!(
                "Invalid scheme '{}' for env provider",
                url.scheme()
            )));
        }

        Ok(Self::default())
    }
}

/// A provider that treats the current process environment as a secret store.
///
/// The key is the name of the variable to read. Useful for renaming variables
/// handed down by a CI system, and for trying out mappings locally.
pub struct EnvProvider {
    #[allow(dead_code)]
    config: EnvConfig,
}

crate::register_provider! {
    struct: EnvProvider,
    config: EnvConfig,
    name: "env",
    description: "Environment variables of the current process",
    schemes: ["env"],
    examples: ["env://"],
}

impl EnvProvider {
    pub fn new(config: EnvConfig) -> Result<Self> {
        Ok(Self { config })
    }
}

#[async_trait]
impl Provider for EnvProvider {
    fn concurrency(&self) -> usize {
        16
    }

    async fn get_secret(&self, _cancel: &CancellationToken, key: &str) -> Result<String> {
        if key.is_empty() {
            return Err(SetSecretsError::EmptySecretKey);
        }

        match env::var(key) {
            Ok(value) => Ok(value),
            Err(env::VarError::NotPresent) => Err(SetSecretsError::SecretNotFound(key.to_string())),
            Err(env::VarError::NotUnicode(_)) => Err(SetSecretsError::ProviderOperationFailed(
                format!("Environment variable '{}' is not valid unicode", key),
            )),
        }
    }

    fn name(&self) -> &'static str {
        Self::PROVIDER_NAME
    }
}
