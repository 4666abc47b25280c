mod auth;
mod cli;
mod config;
mod error;
mod git;
mod github;
mod output;
mod preflight;
mod profile;
mod reconcile;

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::{
    cli::Cli,
    error::AppError,
    git::GlobalGitConfig,
    github::GhCli,
    output::{print_error, print_success, print_warning},
    reconcile::Outcome,
};

// Main
fn main() -> ExitCode {
    init_logging();
    let _cli = Cli::parse();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            print_error(&err.to_string());
            ExitCode::FAILURE
        }
    }
}

/// Diagnostics go to stderr, filtered by `RUST_LOG` (default `warn`)
fn init_logging() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn run() -> Result<(), AppError> {
    preflight::check_required_tools()?;

    let mut gh = GhCli;
    auth::ensure_authenticated(&mut gh)?;

    let mut store = GlobalGitConfig::default();
    match reconcile::reconcile(&mut store, &gh)? {
        Outcome::AlreadyComplete => {}
        Outcome::Applied(summary) if summary.is_complete() => {
            print_success(&format!(
                "git identity configured ({} field(s) written)",
                summary.written.len()
            ));
        }
        Outcome::Applied(summary) => {
            print_warning(&format!(
                "git identity partially configured ({} field(s) written)",
                summary.written.len()
            ));
        }
    }

    Ok(())
}
