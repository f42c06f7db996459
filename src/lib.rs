pub mod commands;
pub mod config;
pub mod models;
pub mod pipeline;
pub mod pipeline_config; // Gene set, drug → gene table, phenotype rules

use std::process::ExitCode;

use tracing_subscriber::EnvFilter;

pub fn run() -> ExitCode {
    // Initialize tracing. Logs go to stderr so stdout carries only results.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let matches = commands::build_parser().get_matches();
    match commands::dispatch(&matches) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Command failed");
            ExitCode::FAILURE
        }
    }
}
