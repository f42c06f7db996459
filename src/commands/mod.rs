pub mod cli;
pub mod handlers;

use clap::{ArgMatches, Command};
use thiserror::Error;

use crate::config::{self, ConfigError};
use crate::pipeline::reasoning::ReasoningError;
use crate::pipeline::vcf::VariantFileError;

pub const BIN_NAME: &str = "pharmaguard";

#[derive(Error, Debug)]
pub enum CommandError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Variant file error: {0}")]
    VariantFile(#[from] VariantFileError),

    #[error("Reasoning service error: {0}")]
    Reasoning(#[from] ReasoningError),

    #[error("Output error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Missing argument: {0}")]
    MissingArgument(&'static str),

    #[error("Model {0} is not available on the reasoning backend")]
    ModelUnavailable(String),

    #[error("{failed} of {total} drug analyses failed")]
    AnalysesFailed { failed: usize, total: usize },
}

pub fn build_parser() -> Command {
    Command::new(BIN_NAME)
        .bin_name(BIN_NAME)
        .version(config::APP_VERSION)
        .about("Pharmacogenomic risk reports from annotated VCF files.")
        .subcommand_required(true)
        .subcommand(cli::create_analyze_cli())
        .subcommand(cli::create_classify_cli())
        .subcommand(cli::create_drugs_cli())
        .subcommand(cli::create_status_cli())
}

pub fn dispatch(matches: &ArgMatches) -> Result<(), CommandError> {
    match matches.subcommand() {
        Some((cli::ANALYZE_CMD, matches)) => handlers::run_analyze(matches),
        Some((cli::CLASSIFY_CMD, matches)) => handlers::run_classify(matches),
        Some((cli::DRUGS_CMD, matches)) => handlers::run_drugs(matches),
        Some((cli::STATUS_CMD, matches)) => handlers::run_status(matches),
        _ => unreachable!("Subcommand not found"),
    }
}
