//! Error types for setsecrets operations

use thiserror::Error;

/// The main error type for setsecrets operations
///
/// Every failure in the chain (argument parsing, provider construction,
/// secret retrieval, process replacement) is reported through this enum.
/// [`SetSecretsError::kind`] groups the variants into the broad classes the
/// command line reports on.
#[derive(Error, Debug)]
pub enum SetSecretsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Failed to read setsecrets config: {0}")]
    ConfigRead(#[source] std::io::Error),
    #[error("Invalid mapping '{0}': {1}")]
    InvalidMapping(String, &'static str),
    #[error("Environment variable '{0}' is mapped more than once")]
    DuplicateVariable(String),
    #[error("No command specified. Usage: setsecrets [NAME=SECRET_KEY]... [--] <command> [args...]")]
    NoCommand,
    #[error(
        "No provider backend configured.\n\nTo fix this, either:\n  1. Pass --provider (e.g., 'setsecrets --provider gcp FOO=secrets/foo -- env')\n  2. Set SETSECRETS_PROVIDER\n  3. Set defaults.provider in the setsecrets config file"
    )]
    NoProviderConfigured,
    #[error("Provider backend '{0}' not found")]
    ProviderNotFound(String),
    #[error("Failed to initialize provider: {0}")]
    ProviderInit(String),
    #[error("Secret '{0}' not found")]
    SecretNotFound(String),
    #[error("Empty secret key specified")]
    EmptySecretKey,
    #[error("Provider operation failed: {0}")]
    ProviderOperationFailed(String),
    #[error("Retrieval of secret '{0}' was cancelled")]
    Cancelled(String),
    #[error("Unexpectedly lost secret for key '{0}'")]
    LostSecret(String),
    #[error("Command '{0}' not found")]
    CommandNotFound(String),
}

/// Broad classification of [`SetSecretsError`] variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad arguments or settings, detected before any work starts.
    Configuration,
    /// The selected provider could not be constructed.
    StoreInit,
    /// Retrieval of a single secret failed.
    Fetch,
    /// A requested secret has no result although no retrieval failed.
    Consistency,
    /// The target command could not be started.
    Exec,
}

impl SetSecretsError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SetSecretsError::InvalidMapping(..)
            | SetSecretsError::DuplicateVariable(_)
            | SetSecretsError::NoCommand
            | SetSecretsError::NoProviderConfigured
            | SetSecretsError::ProviderNotFound(_)
            | SetSecretsError::ConfigRead(_)
            | SetSecretsError::Toml(_) => ErrorKind::Configuration,
            SetSecretsError::ProviderInit(_) => ErrorKind::StoreInit,
            SetSecretsError::SecretNotFound(_)
            | SetSecretsError::EmptySecretKey
            | SetSecretsError::ProviderOperationFailed(_)
            | SetSecretsError::Cancelled(_) => ErrorKind::Fetch,
            SetSecretsError::LostSecret(_) => ErrorKind::Consistency,
            SetSecretsError::CommandNotFound(_) | SetSecretsError::Io(_) => ErrorKind::Exec,
        }
    }
}

/// A type alias for `Result<T, SetSecretsError>`
pub type Result<T> = std::result::Result<T, SetSecretsError>;
