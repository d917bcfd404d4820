use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tokio::net::TcpListener;
use tracing::info;

use sudoku_relay::banner::{BannerInfo, print_banner, print_goodbye};
use sudoku_relay::config::{CollaboratorConfig, InputLimits, RelayConfig};
use sudoku_relay::consts::{
    DEFAULT_EXTRACTOR_SCRIPT, DEFAULT_INTERPRETER, DEFAULT_LOG_FILTER, DEFAULT_MAX_INPUT_BYTES,
    DEFAULT_MAX_OUTPUT_BYTES, DEFAULT_SOLVER_SCRIPT, DEFAULT_TIMEOUT, PATH_IMAGE_PREFIX,
};
use sudoku_relay::{Relay, logging, server};

#[derive(Parser)]
#[command(
    name = "sudoku-relay",
    version,
    about = "Hands sudoku images and boards to external programs over HTTP."
)]
struct Cli {
    /// Address to listen on
    #[arg(short, long, default_value_t = RelayConfig::default().listen, env = "RELAY_LISTEN")]
    listen: SocketAddr,

    /// Executable that turns an image into a grid
    #[arg(long, default_value = DEFAULT_INTERPRETER, env = "RELAY_EXTRACTOR_PROGRAM")]
    extractor_program: String,

    /// Leading argument for the extractor (repeatable)
    #[arg(long = "extractor-arg", default_value = DEFAULT_EXTRACTOR_SCRIPT, allow_hyphen_values = true)]
    extractor_args: Vec<String>,

    /// Executable that solves a board
    #[arg(long, default_value = DEFAULT_INTERPRETER, env = "RELAY_SOLVER_PROGRAM")]
    solver_program: String,

    /// Leading argument for the solver (repeatable)
    #[arg(long = "solver-arg", default_value = DEFAULT_SOLVER_SCRIPT, allow_hyphen_values = true)]
    solver_args: Vec<String>,

    /// Working directory for both external programs
    #[arg(short, long, env = "RELAY_WORK_DIR")]
    work_dir: Option<PathBuf>,

    /// Per-call timeout in seconds
    #[arg(short, long, default_value_t = DEFAULT_TIMEOUT.as_secs(), env = "RELAY_TIMEOUT_SECS")]
    timeout: u64,

    /// Maximum stdout bytes accepted from an external program
    #[arg(long, default_value_t = DEFAULT_MAX_OUTPUT_BYTES, env = "RELAY_MAX_OUTPUT_BYTES")]
    max_output_bytes: usize,

    /// Maximum length of a path or board accepted from clients
    #[arg(long, default_value_t = DEFAULT_MAX_INPUT_BYTES, env = "RELAY_MAX_INPUT_BYTES")]
    max_input_bytes: usize,

    /// Emit logs as JSON lines
    #[arg(long, default_value_t = false, env = "RELAY_LOG_JSON")]
    log_json: bool,
}

impl Cli {
    fn into_config(self) -> RelayConfig {
        let timeout = Duration::from_secs(self.timeout);
        RelayConfig {
            listen: self.listen,
            extractor: CollaboratorConfig {
                program: self.extractor_program,
                args: self.extractor_args,
                argument_prefix: PATH_IMAGE_PREFIX.to_string(),
                working_dir: self.work_dir.clone(),
                timeout,
                max_output_bytes: self.max_output_bytes,
            },
            solver: CollaboratorConfig {
                program: self.solver_program,
                args: self.solver_args,
                argument_prefix: String::new(),
                working_dir: self.work_dir,
                timeout,
                max_output_bytes: self.max_output_bytes,
            },
            limits: InputLimits {
                max_path_bytes: self.max_input_bytes,
                max_board_bytes: self.max_input_bytes,
            },
        }
    }
}

/// Resolves on Ctrl+C, or SIGTERM on unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    info!("shutdown requested");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(DEFAULT_LOG_FILTER, cli.log_json);

    let config = cli.into_config();
    config.validate().context("invalid configuration")?;

    let extractor = config.extractor.command_line();
    let solver = config.solver.command_line();
    print_banner(&BannerInfo::from_config(&config, &extractor, &solver));

    let relay = Arc::new(Relay::from_config(&config));
    let listener = TcpListener::bind(config.listen)
        .await
        .with_context(|| format!("failed to bind {}", config.listen))?;

    server::serve(listener, relay, shutdown_signal()).await?;

    print_goodbye();
    Ok(())
}
