#![forbid(unsafe_code)]

use std::path::PathBuf;
use std::process::ExitCode as ProcessExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use gridfold_core::{parse_duration, ExitCode};
use gridfold_store::{LocalStore, ObjectStore, Path, RetryPolicy, RetryStore};
use gridfold_updater::{update, UpdateError, UpdateErrorCode, UpdateOptions};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "gridfold")]
#[command(about = "Fold per-build test results into dashboard grids")]
struct Cli {
    /// Location of the serialized config, e.g. gs://bucket/cfg/config.
    #[arg(long)]
    config: String,
    /// Object prefix for grids, relative to the config location.
    #[arg(long, default_value = "")]
    grid_path: String,
    /// Update only this group.
    #[arg(long)]
    group: Option<String>,
    #[arg(long, default_value_t = 4)]
    group_concurrency: usize,
    #[arg(long, default_value_t = 2)]
    build_concurrency: usize,
    #[arg(long, default_value = "10m")]
    group_timeout: String,
    #[arg(long, default_value = "2m")]
    build_timeout: String,
    /// Upload grids; without this the run is a dry run.
    #[arg(long, default_value_t = false)]
    confirm: bool,
    /// Loop forever, sleeping this long between passes.
    #[arg(long)]
    wait: Option<String>,
    /// Root directory backing the bucket namespace.
    #[arg(long, default_value = ".")]
    storage_root: PathBuf,
}

fn main() -> ProcessExitCode {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    match run(cli) {
        Ok(()) => ExitCode::Success.into(),
        Err((code, message)) => {
            tracing::error!("{message}");
            code.into()
        }
    }
}

type CliError = (ExitCode, String);

fn run(cli: Cli) -> Result<(), CliError> {
    let group_timeout = flag_duration("group-timeout", &cli.group_timeout)?;
    let build_timeout = flag_duration("build-timeout", &cli.build_timeout)?;
    let wait = cli
        .wait
        .as_deref()
        .map(|w| flag_duration("wait", w))
        .transpose()?;
    let config_path = Path::from_url(&cli.config)
        .map_err(|e| (ExitCode::Usage, format!("--config: {e}")))?;

    let store: Arc<dyn ObjectStore> = Arc::new(RetryStore::new(
        LocalStore::new(cli.storage_root.clone()),
        RetryPolicy::default(),
    ));
    let opts = UpdateOptions {
        config_path,
        grid_prefix: cli.grid_path.clone(),
        group: cli.group.clone(),
        group_concurrency: cli.group_concurrency,
        build_concurrency: cli.build_concurrency,
        confirm: cli.confirm,
        group_timeout,
        build_timeout,
    };

    let runtime = tokio::runtime::Runtime::new()
        .map_err(|e| (ExitCode::Internal, format!("start runtime: {e}")))?;
    runtime.block_on(async move {
        loop {
            update(Arc::clone(&store), opts.clone())
                .await
                .map_err(exit_for)?;
            let Some(pause) = wait else {
                return Ok(());
            };
            tracing::info!(seconds = pause.as_secs(), "sleeping before the next pass");
            tokio::time::sleep(pause).await;
        }
    })
}

fn flag_duration(flag: &str, value: &str) -> Result<Duration, CliError> {
    parse_duration(value).map_err(|e| (ExitCode::Usage, format!("--{flag}: {e}")))
}

fn exit_for(err: UpdateError) -> CliError {
    let code = match err.code {
        UpdateErrorCode::Config => ExitCode::Config,
        _ => ExitCode::Internal,
    };
    (code, err.to_string())
}
