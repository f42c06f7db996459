use chrono::{SecondsFormat, Utc};

use super::parser::parse_reasoning_response;
use super::prompt::{build_report_prompt, ReasoningRequest, REPORT_SYSTEM_PROMPT};
use super::validation::{validate_reasoning_fields, ValidatedFields};
use super::{AnalysisError, SchemaViolation};
use crate::models::{
    ClassificationResult, DetectedVariant, PharmacogenomicProfile, QualityMetrics, Report,
    VariantRecord,
};
use crate::pipeline::reasoning::LlmClient;

/// Inputs to one report assembly.
#[derive(Debug, Clone, Copy)]
pub struct AssemblyRequest<'a> {
    pub patient_id: &'a str,
    pub drug: &'a str,
    pub target_gene: &'a str,
    pub variants: &'a [VariantRecord],
    pub classification: &'a ClassificationResult,
}

/// Orchestrates report assembly:
/// prompt → reasoning call → parse → validate → merge with deterministic facts
pub struct ReportAssembler {
    llm: Box<dyn LlmClient + Send + Sync>,
    model_name: String,
}

impl ReportAssembler {
    pub fn new(llm: Box<dyn LlmClient + Send + Sync>, model_name: &str) -> Self {
        Self {
            llm,
            model_name: model_name.to_string(),
        }
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    pub fn llm(&self) -> &(dyn LlmClient + Send + Sync) {
        self.llm.as_ref()
    }

    /// Produce a validated report for one (patient, drug) pair.
    ///
    /// The collaborator is called once. Transport failures become
    /// `AnalysisFailed`; an unusable response becomes `SchemaViolation`.
    pub fn assemble(&self, request: &AssemblyRequest<'_>) -> Result<Report, AnalysisError> {
        let prompt = build_report_prompt(&ReasoningRequest {
            patient_id: request.patient_id,
            drug: request.drug,
            target_gene: request.target_gene,
            diplotype: &request.classification.diplotype,
            phenotype: request.classification.phenotype,
            raw_variants: request.variants,
        });

        let response = self
            .llm
            .generate(&self.model_name, &prompt, REPORT_SYSTEM_PROMPT)
            .map_err(|e| {
                tracing::warn!(
                    patient_id = %request.patient_id,
                    drug = %request.drug,
                    error = %e,
                    "Reasoning call failed"
                );
                AnalysisError::AnalysisFailed {
                    patient_id: request.patient_id.to_string(),
                    drug: request.drug.to_string(),
                    source: e,
                }
            })?;

        let fields = parse_and_validate(&response).map_err(|violation| {
            tracing::warn!(
                patient_id = %request.patient_id,
                drug = %request.drug,
                field = violation.field().unwrap_or("<root>"),
                error = %violation,
                "Reasoning response rejected"
            );
            AnalysisError::SchemaViolation {
                patient_id: request.patient_id.to_string(),
                drug: request.drug.to_string(),
                source: violation,
            }
        })?;

        Ok(build_report(request, fields, &utc_timestamp()))
    }
}

fn parse_and_validate(response: &str) -> Result<ValidatedFields, SchemaViolation> {
    let map = parse_reasoning_response(response)?;
    validate_reasoning_fields(&map)
}

/// Merge validated collaborator output with the deterministic facts.
pub fn build_report(
    request: &AssemblyRequest<'_>,
    fields: ValidatedFields,
    timestamp: &str,
) -> Report {
    let detected_variants = request
        .variants
        .iter()
        .filter(|v| v.gene == request.target_gene)
        .map(|v| DetectedVariant {
            rsid: v.rsid.clone(),
        })
        .collect();

    Report {
        patient_id: request.patient_id.to_string(),
        drug: request.drug.to_string(),
        timestamp: timestamp.to_string(),
        risk_assessment: fields.risk_assessment,
        pharmacogenomic_profile: PharmacogenomicProfile {
            primary_gene: request.target_gene.to_string(),
            diplotype: request.classification.diplotype.clone(),
            phenotype: request.classification.phenotype,
            detected_variants,
        },
        clinical_recommendation: fields.clinical_recommendation,
        llm_generated_explanation: fields.llm_generated_explanation,
        quality_metrics: QualityMetrics {
            vcf_parsing_success: true,
        },
    }
}

/// Current UTC time, RFC 3339 with a `Z` suffix.
pub fn utc_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}
