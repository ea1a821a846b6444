use super::{Provider, url_host};
use crate::{Result, SetSecretsError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Configuration for the dotenv provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DotEnvConfig {
    /// Path to the `.env` file, relative to the working directory unless absolute.
    pub path: PathBuf,
}

impl Default for DotEnvConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(".env"),
        }
    }
}

impl TryFrom<&Url> for DotEnvConfig {
    type Error = SetSecretsError;

    /// Creates a `DotEnvConfig` from a URL.
    ///
    /// - `dotenv://` uses `.env` in the working directory
    /// - `dotenv:///abs/path/.env` uses an absolute path
    /// - `dotenv://relative/path/.env` joins host and path into a relative path
    fn try_from(url: &Url) -> std::result::Result<Self, Self::Error> {
        if url.scheme() != "dotenv" {
            return Err(SetSecretsError::ProviderInit(format!(
                "Invalid scheme '{}' for dotenv provider",
                url.scheme()
            )));
        }

        let path = match url_host(url) {
            Some(host) => format!("{}{}", host, url.path()),
            None => url.path().to_string(),
        };

        if path.is_empty() {
            Ok(Self::default())
        } else {
            Ok(Self {
                path: PathBuf::from(path),
            })
        }
    }
}

/// Provider reading secrets from a dotenv file.
///
/// The file is parsed once when the provider is created; a missing or
/// malformed file is a provider initialization error. Keys are the variable
/// names in the file.
pub struct DotEnvProvider {
    config: DotEnvConfig,
    vars: HashMap<String, String>,
}

crate::register_provider! {
    struct: DotEnvProvider,
    config: DotEnvConfig,
    name: "dotenv",
    description: "Traditional .env files",
    schemes: ["dotenv"],
    examples: ["dotenv:.env", "dotenv:/path/to/.env"],
}

impl DotEnvProvider {
    pub fn new(config: DotEnvConfig) -> Result<Self> {
        let init_error = |e: dotenvy::Error| {
            SetSecretsError::ProviderInit(format!(
                "failed to read {}: {}",
                config.path.display(),
                e
            ))
        };

        let mut vars = HashMap::new();
        for item in dotenvy::from_path_iter(&config.path).map_err(init_error)? {
            let (key, value) = item.map_err(init_error)?;
            vars.insert(key, value);
        }

        tracing::debug!(path = %config.path.display(), count = vars.len(), "Loaded dotenv file");

        Ok(Self { config, vars })
    }

    pub fn path(&self) -> &std::path::Path {
        &self.config.path
    }
}

#[async_trait]
impl Provider for DotEnvProvider {
    fn concurrency(&self) -> usize {
        // Lookups hit an in-memory map
        16
    }

    async fn get_secret(&self, _cancel: &CancellationToken, key: &str) -> Result<String> {
        if key.is_empty() {
            return Err(SetSecretsError::EmptySecretKey);
        }

        self.vars
            .get(key)
            .cloned()
            .ok_or_else(|| SetSecretsError::SecretNotFound(key.to_string()))
    }

    fn name(&self) -> &'static str {
        Self::PROVIDER_NAME
    }
}
