use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::ArgMatches;
use serde::Serialize;

use super::CommandError;
use crate::config;
use crate::models::{Phenotype, VariantRecord};
use crate::pipeline::phenotype::{classify_with, RuleTable};
use crate::pipeline::processor::{
    analyze_drugs_concurrent, AnalysisPipeline, BatchSummary, DrugOutcome,
};
use crate::pipeline::reasoning::{Backend, ReasoningConfig};
use crate::pipeline::report::{new_patient_id, write_report, ReportAssembler};
use crate::pipeline::vcf::load_variants;
use crate::pipeline_config::PipelineConfig;

fn pipeline_config(matches: &ArgMatches) -> Result<PipelineConfig, CommandError> {
    let config = PipelineConfig::default();
    match matches.get_one::<String>("rules") {
        Some(path) => {
            let rules = RuleTable::from_json_file(Path::new(path))?;
            tracing::info!(path = %path, rules = rules.rules().len(), "Custom phenotype rules loaded");
            Ok(config.with_rules(rules))
        }
        None => Ok(config),
    }
}

/// Environment settings with `--backend` / `--model` applied on top.
fn reasoning_config(matches: &ArgMatches) -> Result<ReasoningConfig, CommandError> {
    let mut reasoning = ReasoningConfig::from_env()?;

    if let Some(raw) = matches.get_one::<String>("backend") {
        let backend: Backend = raw.parse()?;
        if backend != reasoning.backend {
            let mut switched = ReasoningConfig::for_backend(backend);
            switched.timeout_secs = reasoning.timeout_secs;
            switched.api_key = reasoning.api_key.take();
            reasoning = switched;
        }
    }
    if let Some(model) = matches.get_one::<String>("model") {
        reasoning.model = model.clone();
    }
    Ok(reasoning)
}

fn load(matches: &ArgMatches, config: &PipelineConfig) -> Result<Vec<VariantRecord>, CommandError> {
    let vcf = matches
        .get_one::<String>("vcf")
        .ok_or(CommandError::MissingArgument("vcf"))?;
    Ok(load_variants(
        Path::new(vcf),
        &config.target_genes,
        config.max_file_bytes,
    )?)
}

pub fn run_analyze(matches: &ArgMatches) -> Result<(), CommandError> {
    let config = pipeline_config(matches)?;
    let requested: Vec<&String> = matches
        .get_many::<String>("drug")
        .ok_or(CommandError::MissingArgument("drug"))?
        .collect();
    // One report file per canonical drug, so repeats would overwrite each other.
    let drugs = config.drug_genes.distinct_selection(&requested);
    if drugs.len() < requested.len() {
        tracing::debug!(requested = requested.len(), distinct = drugs.len(), "Repeated drugs ignored");
    }
    if drugs.is_empty() {
        return Err(CommandError::MissingArgument("drug"));
    }

    let variants = load(matches, &config)?;

    // Configuration problems surface before any analysis runs.
    let reasoning = reasoning_config(matches)?;
    let client = reasoning.build_client()?;
    tracing::info!(
        backend = reasoning.backend.as_str(),
        model = %reasoning.model,
        timeout_secs = reasoning.timeout_secs,
        "Reasoning backend configured"
    );

    let out_dir = match matches.get_one::<String>("out") {
        Some(dir) => PathBuf::from(dir),
        None => config::reports_dir()?,
    };
    let patient_id = matches
        .get_one::<String>("patient-id")
        .cloned()
        .unwrap_or_else(new_patient_id);

    let pipeline = AnalysisPipeline::new(config, ReportAssembler::new(client, &reasoning.model));

    let outcomes = if matches.get_flag("concurrent") {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()?;
        // The handler keeps the last reference so the blocking HTTP client is
        // dropped outside the runtime.
        let pipeline = Arc::new(pipeline);
        runtime.block_on(analyze_drugs_concurrent(
            Arc::clone(&pipeline),
            patient_id.clone(),
            drugs,
            variants.into(),
        ))
    } else {
        pipeline.analyze_drugs(&patient_id, &drugs, &variants)
    };

    let failed = write_outcomes(&out_dir, &outcomes);
    let summary = BatchSummary::from_outcomes(&outcomes);
    tracing::info!(
        patient_id = %patient_id,
        succeeded = summary.succeeded,
        failed = failed,
        out_dir = %out_dir.display(),
        "Analysis finished"
    );

    if failed > 0 {
        return Err(CommandError::AnalysesFailed {
            failed,
            total: outcomes.len(),
        });
    }
    Ok(())
}

/// Write each successful report and print its path. Returns the failure count,
/// including reports that could not be written.
fn write_outcomes(out_dir: &Path, outcomes: &[DrugOutcome]) -> usize {
    let mut failed = 0;
    for outcome in outcomes {
        match &outcome.result {
            Ok(report) => match write_report(out_dir, report) {
                Ok(path) => println!("{}", path.display()),
                Err(e) => {
                    tracing::error!(drug = %outcome.drug, error = %e, "Could not write report");
                    failed += 1;
                }
            },
            Err(e) => {
                tracing::error!(drug = %outcome.drug, error = %e, "Analysis failed");
                failed += 1;
            }
        }
    }
    failed
}

#[derive(Debug, Serialize)]
struct ClassificationOutput<'a> {
    gene: &'a str,
    diplotype: String,
    phenotype: Phenotype,
    detected_variants: Vec<&'a str>,
}

pub fn run_classify(matches: &ArgMatches) -> Result<(), CommandError> {
    let config = pipeline_config(matches)?;
    let gene = matches
        .get_one::<String>("gene")
        .ok_or(CommandError::MissingArgument("gene"))?
        .trim()
        .to_uppercase();
    let variants = load(matches, &config)?;

    let result = classify_with(&config.rules, &variants, &gene);
    let output = ClassificationOutput {
        gene: &gene,
        diplotype: result.diplotype,
        phenotype: result.phenotype,
        detected_variants: variants
            .iter()
            .filter(|v| v.gene == gene)
            .map(|v| v.rsid.as_str())
            .collect(),
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

pub fn run_drugs(_matches: &ArgMatches) -> Result<(), CommandError> {
    let config = PipelineConfig::default();
    for entry in config.drug_genes.entries() {
        println!("{}\t{}", entry.drug, entry.gene);
    }
    Ok(())
}

pub fn run_status(matches: &ArgMatches) -> Result<(), CommandError> {
    let reasoning = reasoning_config(matches)?;
    let client = reasoning.build_client()?;

    let available = client.is_model_available(&reasoning.model)?;
    println!(
        "{} {} at {}: {}",
        reasoning.backend.as_str(),
        reasoning.model,
        reasoning.base_url,
        if available { "available" } else { "not found" }
    );
    if !available {
        return Err(CommandError::ModelUnavailable(reasoning.model));
    }
    Ok(())
}
