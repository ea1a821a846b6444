use super::{Provider, url_host};
use crate::{Result, SetSecretsError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::num::NonZeroUsize;
use std::process::Stdio;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use url::Url;

const DEFAULT_PROGRAM: &str = "gcloud";

const INSTALL_HELP: &str = "Google Cloud CLI (gcloud) is not installed.\n\nTo install it:\n  - macOS: brew install --cask google-cloud-sdk\n  - Linux/Windows: Download from https://cloud.google.com/sdk/docs/install\n\nAfter installation, run 'gcloud auth login' or 'gcloud auth application-default login' to authenticate.";

/// Configuration for the Google Cloud Secret Manager provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GcpConfig {
    /// Project used for keys that are not fully qualified.
    ///
    /// Discovered from the environment or the gcloud configuration when unset.
    pub project: Option<String>,
    /// The gcloud executable.
    pub program: String,
}

impl Default for GcpConfig {
    fn default() -> Self {
        Self {
            project: None,
            program: DEFAULT_PROGRAM.to_string(),
        }
    }
}

impl GcpConfig {
    pub fn with_project(mut self, project: impl Into<String>) -> Self {
        self.project = Some(project.into());
        self
    }

    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }
}

impl TryFrom<&Url> for GcpConfig {
    type Error = SetSecretsError;

    /// Creates a `GcpConfig` from a URL.
    ///
    /// `gcp://` leaves the project to discovery, `gcp://my-project` pins it.
    fn try_from(url: &Url) -> std::result::Result<Self, Self::Error> {
        if url.scheme() != "gcp" {
            return Err(SetSecretsError::ProviderInit(format!(
                "Invalid scheme '{}' for gcp provider",
                url.scheme()
            )));
        }

        Ok(Self {
            project: url_host(url).map(str::to_string),
            ..Self::default()
        })
    }
}

#[derive(Debug, Deserialize)]
struct GcloudConfigOutput {
    #[serde(default)]
    core: HashMap<String, String>,
}

/// A fully qualified secret version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SecretVersion {
    pub project: String,
    pub secret: String,
    pub version: String,
}

/// Provider for Google Cloud Secret Manager.
///
/// Secrets are read with `gcloud secrets versions access`, so whatever
/// credentials the gcloud CLI is logged in with are used.
///
/// Keys take one of these shapes:
///
/// - `secrets/NAME` (latest version in the configured project)
/// - `secrets/NAME/versions/VERSION`
/// - `projects/PROJECT/secrets/NAME[/versions/VERSION]`
///
/// Each call spawns its own gcloud process, so concurrent calls are safe.
pub struct GcpProvider {
    project: String,
    program: String,
}

crate::register_provider! {
    struct: GcpProvider,
    config: GcpConfig,
    name: "gcp",
    description: "Google Cloud Secret Manager (via gcloud)",
    schemes: ["gcp"],
    examples: ["gcp://", "gcp://my-project"],
}

impl GcpProvider {
    pub fn new(config: GcpConfig) -> Result<Self> {
        let project = match config.project {
            Some(project) => project,
            None => discover_project(&config.program)?,
        };

        tracing::debug!(project = %project, "Using Google Cloud project");

        Ok(Self {
            project,
            program: config.program,
        })
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    pub(crate) fn resolve_key(&self, key: &str) -> Result<SecretVersion> {
        if key.is_empty() {
            return Err(SetSecretsError::EmptySecretKey);
        }

        let full = if key.starts_with("projects/") {
            key.to_string()
        } else {
            format!("projects/{}/{}", self.project, key)
        };

        let malformed = || {
            SetSecretsError::ProviderOperationFailed(format!(
                "Malformed secret key '{}': expected [projects/PROJECT/]secrets/NAME[/versions/VERSION]",
                key
            ))
        };

        let parts: Vec<&str> = full.split('/').collect();
        if parts.iter().any(|p| p.is_empty()) {
            return Err(malformed());
        }

        match parts.as_slice() {
            ["projects", project, "secrets", secret] => Ok(SecretVersion {
                project: project.to_string(),
                secret: secret.to_string(),
                version: "latest".to_string(),
            }),
            ["projects", project, "secrets", secret, "versions", version] => Ok(SecretVersion {
                project: project.to_string(),
                secret: secret.to_string(),
                version: version.to_string(),
            }),
            _ => Err(malformed()),
        }
    }
}

#[async_trait]
impl Provider for GcpProvider {
    fn concurrency(&self) -> usize {
        std::thread::available_parallelism()
            .map(NonZeroUsize::get)
            .unwrap_or(1)
            * 2
    }

    async fn get_secret(&self, cancel: &CancellationToken, key: &str) -> Result<String> {
        let version = self.resolve_key(key)?;

        let mut cmd = Command::new(&self.program);
        cmd.args(["-q", "secrets", "versions", "access"])
            .arg(&version.version)
            .arg("--secret")
            .arg(&version.secret)
            .arg("--project")
            .arg(&version.project)
            .stdin(Stdio::null())
            .kill_on_drop(true);

        tracing::debug!(
            project = %version.project,
            secret = %version.secret,
            version = %version.version,
            "Accessing secret version"
        );

        let output = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                return Err(SetSecretsError::Cancelled(key.to_string()));
            }
            output = cmd.output() => output,
        };

        let output = match output {
            Ok(output) => output,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(SetSecretsError::ProviderOperationFailed(
                    INSTALL_HELP.to_string(),
                ));
            }
            Err(e) => {
                return Err(SetSecretsError::ProviderOperationFailed(format!(
                    "failed to invoke gcloud command: {}",
                    e
                )));
            }
        };

        if !output.status.success() {
            let error_msg = String::from_utf8_lossy(&output.stderr);
            if error_msg.contains("NOT_FOUND") {
                return Err(SetSecretsError::SecretNotFound(key.to_string()));
            }
            return Err(SetSecretsError::ProviderOperationFailed(
                error_msg.trim().to_string(),
            ));
        }

        String::from_utf8(output.stdout)
            .map_err(|e| SetSecretsError::ProviderOperationFailed(e.to_string()))
    }

    fn name(&self) -> &'static str {
        Self::PROVIDER_NAME
    }
}

/// Finds the project to resolve short keys against.
///
/// Checks `GOOGLE_CLOUD_PROJECT` and `CLOUDSDK_CORE_PROJECT` first, then asks
/// gcloud for its configured `core/project`.
fn discover_project(program: &str) -> Result<String> {
    for var in ["GOOGLE_CLOUD_PROJECT", "CLOUDSDK_CORE_PROJECT"] {
        if let Ok(project) = env::var(var) {
            if !project.is_empty() {
                return Ok(project);
            }
        }
    }

    let output = std::process::Command::new(program)
        .args(["-q", "config", "list", "core/project", "--format=json"])
        .stdin(Stdio::null())
        .output()
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                SetSecretsError::ProviderInit(INSTALL_HELP.to_string())
            } else {
                SetSecretsError::ProviderInit(format!("failed to invoke gcloud command: {}", e))
            }
        })?;

    if !output.status.success() {
        return Err(SetSecretsError::ProviderInit(format!(
            "failed to invoke gcloud command: {}",
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }

    parse_project(&output.stdout)
}

fn parse_project(stdout: &[u8]) -> Result<String> {
    let out: GcloudConfigOutput = serde_json::from_slice(stdout).map_err(|e| {
        SetSecretsError::ProviderInit(format!("failed to parse gcloud command output: {}", e))
    })?;

    out.core
        .get("project")
        .filter(|p| !p.is_empty())
        .cloned()
        .ok_or_else(|| {
            SetSecretsError::ProviderInit(
                "No Google Cloud project configured. Use gcp://PROJECT, set GOOGLE_CLOUD_PROJECT, or run 'gcloud config set project PROJECT'".to_string(),
            )
        })
}
