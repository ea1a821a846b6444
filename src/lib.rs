//! # setsecrets
//!
//! Fetches a batch of secrets from a pluggable [`Provider`](provider::Provider)
//! and starts a command with them exported as environment variables.
//!
//! ```no_run
//! use setsecrets::provider::Provider;
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn run() -> setsecrets::Result<()> {
//! let invocation = setsecrets::Invocation::parse(["DB_PASSWORD=db-password", "--", "env"])?;
//! let provider: Arc<dyn Provider> = Box::<dyn Provider>::try_from("gcp://my-project")?.into();
//!
//! let secrets = setsecrets::load(
//!     &CancellationToken::new(),
//!     provider,
//!     &invocation.mapping.keys(),
//! )
//! .await?;
//! let envs = setsecrets::apply(&secrets, &invocation.mapping)?;
//! setsecrets::exec::replace_process(&invocation.command, &envs)?;
//! # Ok(())
//! # }
//! ```

mod error;

pub mod config;
pub mod exec;
pub mod loader;
pub mod mapping;
pub mod provider;

#[cfg(feature = "cli")]
pub mod cli;

pub use config::{GlobalConfig, resolve_provider};
pub use error::{ErrorKind, Result, SetSecretsError};
pub use loader::{SecretMap, load};
pub use mapping::{EnvMapping, Invocation, apply};
