use crate::config::{GlobalConfig, resolve_provider};
use crate::provider::{Provider, providers};
use crate::{Invocation, apply, exec, load};
use clap::Parser;
use color_eyre::eyre::{Result, WrapErr};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Command line of the setsecrets binary.
///
/// Everything after the options is handed to [`Invocation::parse`], which
/// separates the `NAME=SECRET_KEY` mappings from the command to run.
#[derive(Parser, Debug)]
#[command(name = "setsecrets")]
#[command(
    about = "Run a command with secrets from a secret store exported as environment variables",
    long_about = None
)]
#[command(version)]
#[command(override_usage = "setsecrets [OPTIONS] [NAME=SECRET_KEY]... [--] <COMMAND> [ARGS]...")]
struct Cli {
    /// Provider backend to use (e.g., gcp://my-project, dotenv:.env)
    #[arg(short, long, env = "SETSECRETS_PROVIDER")]
    provider: Option<String>,
    /// List the available providers and exit
    #[arg(long)]
    list_providers: bool,
    /// Mappings followed by the command and its arguments
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, value_name = "ARGS")]
    args: Vec<String>,
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("SETSECRETS_LOG")
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

pub fn main() -> Result<()> {
    color_eyre::install()?;
    init_tracing();

    let cli = Cli::parse();

    if cli.list_providers {
        println!("Available providers:");
        for info in providers() {
            println!("  {}", info.display_with_examples());
        }
        return Ok(());
    }

    let invocation = Invocation::parse(cli.args)?;

    let config = match cli.provider {
        Some(_) => None,
        None => GlobalConfig::load().wrap_err("Failed to load setsecrets config")?,
    };
    let uri = resolve_provider(cli.provider.as_deref(), config.as_ref())?;
    let provider: Arc<dyn Provider> = Box::<dyn Provider>::try_from(uri.as_str())
        .wrap_err_with(|| format!("Failed to set up provider '{}'", uri))?
        .into();

    let keys = invocation.mapping.keys();
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .wrap_err("Failed to start async runtime")?;
    let secrets = runtime
        .block_on(load(&CancellationToken::new(), provider, &keys))
        .wrap_err("Failed to retrieve secrets")?;
    drop(runtime);

    let envs = apply(&secrets, &invocation.mapping)?;

    exec::replace_process(&invocation.command, &envs)
        .wrap_err_with(|| format!("Failed to execute '{}'", invocation.command[0]))?;
    Ok(())
}
