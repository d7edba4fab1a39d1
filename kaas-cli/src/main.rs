//! KaaS CLI
//!
//! Command-line interface for discovering Kontrol and Foundry proofs in a
//! workspace, running them on KaaS and tracking their jobs.

mod commands;
mod config;
mod reporter;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, handle_command};
use config::Config;
use kaas_runner::config::DEFAULT_BASE_URL;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "kaas")]
#[command(about = "Run Kontrol and Foundry proofs on KaaS", long_about = None)]
struct Cli {
    /// KaaS service URL
    #[arg(long, env = "KAAS_BASE_URL", default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// Personal access token
    #[arg(long, env = "KAAS_API_KEY", hide_env_values = true, default_value = "")]
    api_key: String,

    /// Delay between two status requests for a job, in milliseconds
    #[arg(long, env = "KAAS_POLL_INTERVAL_MS", default_value_t = 5000)]
    poll_interval_ms: u64,

    /// Give up on a job after this many consecutive network errors
    #[arg(long, env = "KAAS_MAX_TRANSIENT_FAILURES")]
    max_transient_failures: Option<u32>,

    /// Job-id state document (default: <workspace>/.kaas/test-state.json)
    #[arg(long, env = "KAAS_STATE_PATH")]
    state_path: Option<PathBuf>,

    /// Workspace folder; repeat for multi-folder workspaces, the first one owns the git checkout
    #[arg(long, short, default_value = ".")]
    workspace: Vec<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so command output stays pipeable
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "kaas_cli=info,kaas_runner=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let mut runner = kaas_runner::Config::new(cli.base_url, cli.api_key)
        .with_poll_interval(Duration::from_millis(cli.poll_interval_ms));
    runner.max_transient_failures = cli.max_transient_failures;
    runner.state_path = cli.state_path;

    let config = Config::new(runner, cli.workspace);

    handle_command(cli.command, &config).await
}
