//! pbd-admin - bulk project administration
//!
//! Applies one operation family to every project listed in a CSV work list:
//!
//! ```bash
//! pbd-admin change-lead        # needs `account_id`
//! pbd-admin assign-schemes     # uses the *_SCHEME_ID variables that are set
//! pbd-admin delete-projects
//! ```
//!
//! Connection settings (`email`, `api_token`, `base_url`) come from the environment,
//! or from a `.env` file in the working directory; exported variables win.
//! Exit status is 0 when the work list was fully processed, 1 on any fatal error.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use pbd_admin::{FlowKind, RunSettings};
use pbd_common::config::process_env;
use pbd_common::logging::init_logging;
use pbd_common::worklist::{DEFAULT_KEY_COLUMN, DEFAULT_WORK_LIST};
use tracing::{error, info};

/// Command-line arguments for pbd-admin
#[derive(Parser, Debug)]
#[command(name = "pbd-admin")]
#[command(about = "Bulk administration of ticket-tracking projects from a CSV work list")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// CSV work list with a header row
    #[arg(long, global = true, default_value = DEFAULT_WORK_LIST, env = "PBD_WORK_LIST")]
    work_list: PathBuf,

    /// Process log, appended to on every run
    #[arg(long, global = true, default_value = "process.log", env = "PBD_LOG_FILE")]
    log_file: PathBuf,

    /// Column holding the project key
    #[arg(long, global = true, default_value = DEFAULT_KEY_COLUMN)]
    key_column: String,

    /// Per-request timeout in seconds
    #[arg(long, global = true, default_value_t = 30, env = "PBD_REQUEST_TIMEOUT")]
    request_timeout: u64,
}

#[derive(Subcommand, Debug, Clone, Copy)]
enum Command {
    /// Set the project lead of every listed project to `account_id`
    ChangeLead,
    /// Assign the configured schemes to every listed project
    AssignSchemes,
    /// Delete every listed project
    DeleteProjects,
}

impl From<Command> for FlowKind {
    fn from(command: Command) -> Self {
        match command {
            Command::ChangeLead => FlowKind::ChangeLead,
            Command::AssignSchemes => FlowKind::AssignSchemes,
            Command::DeleteProjects => FlowKind::DeleteProjects,
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    // .env does not override variables already set
    let dotenv_path = dotenvy::dotenv().ok();
    let args = Args::parse();

    init_logging(&args.log_file).context("Failed to initialize process log")?;

    info!(
        "Starting pbd-admin v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    if let Some(path) = dotenv_path {
        info!("Loaded environment from {}", path.display());
    }

    let settings = RunSettings {
        work_list: args.work_list,
        key_column: args.key_column,
        request_timeout: Duration::from_secs(args.request_timeout),
    };

    match pbd_admin::execute(args.command.into(), &settings, process_env).await {
        Ok(_report) => Ok(ExitCode::SUCCESS),
        Err(e) => {
            error!("Run aborted: {}", e);
            Ok(ExitCode::FAILURE)
        }
    }
}
