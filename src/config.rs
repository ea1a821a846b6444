//! User configuration.
//!
//! The only setting is the provider used when none is given on the command
//! line or through `SETSECRETS_PROVIDER`:
//!
//! ```toml
//! [defaults]
//! provider = "gcp://my-project"
//! ```

use crate::{Result, SetSecretsError};
use serde::Deserialize;
use std::io;
use std::path::{Path, PathBuf};

/// Per-user configuration stored in the system's config directory.
#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
pub struct GlobalConfig {
    #[serde(default)]
    pub defaults: GlobalDefaults,
}

#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
pub struct GlobalDefaults {
    /// Provider URI used when none is specified
    pub provider: Option<String>,
}

impl GlobalConfig {
    /// Location of the configuration file, typically
    /// `~/.config/setsecrets/config.toml` on Linux.
    pub fn path() -> Result<PathBuf> {
        use directories::ProjectDirs;
        let dirs = ProjectDirs::from("", "", "setsecrets").ok_or_else(|| {
            SetSecretsError::ConfigRead(io::Error::new(
                io::ErrorKind::NotFound,
                "Could not find config directory",
            ))
        })?;
        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Loads the configuration file, or `None` when there is none.
    pub fn load() -> Result<Option<Self>> {
        Self::load_from(&Self::path()?)
    }

    pub fn load_from(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(path).map_err(SetSecretsError::ConfigRead)?;
        tracing::debug!(path = %path.display(), "Loaded configuration");
        Ok(Some(toml::from_str(&content)?))
    }
}

/// Picks the provider URI: an explicit value wins over the configured
/// default.
pub fn resolve_provider(explicit: Option<&str>, config: Option<&GlobalConfig>) -> Result<String> {
    explicit
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .or_else(|| config.and_then(|c| c.defaults.provider.clone()))
        .ok_or(SetSecretsError::NoProviderConfigured)
}
