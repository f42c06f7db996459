//! Per-patient batch processing.
//!
//! Drives one analysis per selected drug:
//! drug lookup → classify → assemble report.
//!
//! Analyses share only the read-only variant list. One drug failing never
//! affects another, and outcomes come back in selection order.

use std::sync::Arc;

use futures_util::future::join_all;
use serde::Serialize;

use crate::models::{Report, VariantRecord};
use crate::pipeline::phenotype::classify_with;
use crate::pipeline::reasoning::ReasoningError;
use crate::pipeline::report::{AnalysisError, AssemblyRequest, ReportAssembler};
use crate::pipeline_config::PipelineConfig;

/// Result of one drug in a batch.
#[derive(Debug)]
pub struct DrugOutcome {
    /// The drug as requested.
    pub drug: String,
    pub result: Result<Report, AnalysisError>,
}

impl DrugOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Counts for logging and exit status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub succeeded: usize,
    pub failed: usize,
}

impl BatchSummary {
    pub fn from_outcomes(outcomes: &[DrugOutcome]) -> Self {
        let succeeded = outcomes.iter().filter(|o| o.is_success()).count();
        Self {
            succeeded,
            failed: outcomes.len() - succeeded,
        }
    }
}

pub struct AnalysisPipeline {
    config: PipelineConfig,
    assembler: ReportAssembler,
}

impl AnalysisPipeline {
    pub fn new(config: PipelineConfig, assembler: ReportAssembler) -> Self {
        Self { config, assembler }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Analyze one drug for one patient.
    pub fn analyze_drug(
        &self,
        patient_id: &str,
        drug: &str,
        variants: &[VariantRecord],
    ) -> Result<Report, AnalysisError> {
        let entry = self
            .config
            .drug_genes
            .lookup(drug)
            .ok_or_else(|| AnalysisError::UnsupportedDrug(drug.trim().to_string()))?;

        let span = tracing::info_span!(
            "analyze_drug",
            patient_id = %patient_id,
            drug = %entry.drug,
            gene = %entry.gene
        );
        let _guard = span.enter();

        let classification = classify_with(&self.config.rules, variants, &entry.gene);
        tracing::debug!(
            diplotype = %classification.diplotype,
            phenotype = %classification.phenotype,
            "Classified"
        );

        let report = self.assembler.assemble(&AssemblyRequest {
            patient_id,
            drug: &entry.drug,
            target_gene: &entry.gene,
            variants,
            classification: &classification,
        })?;

        tracing::info!(
            risk_label = %report.risk_assessment.risk_label,
            severity = %report.risk_assessment.severity,
            "Report assembled"
        );
        Ok(report)
    }

    /// Analyze each drug in turn.
    pub fn analyze_drugs(
        &self,
        patient_id: &str,
        drugs: &[String],
        variants: &[VariantRecord],
    ) -> Vec<DrugOutcome> {
        drugs
            .iter()
            .map(|drug| DrugOutcome {
                drug: drug.clone(),
                result: self.analyze_drug(patient_id, drug, variants),
            })
            .collect()
    }
}

/// Analyze every drug on the blocking pool at once.
///
/// Outcome order matches `drugs`. A task that panics or is cancelled yields
/// `AnalysisFailed` for its drug only.
pub async fn analyze_drugs_concurrent(
    pipeline: Arc<AnalysisPipeline>,
    patient_id: String,
    drugs: Vec<String>,
    variants: Arc<[VariantRecord]>,
) -> Vec<DrugOutcome> {
    let tasks = drugs.iter().map(|drug| {
        let pipeline = Arc::clone(&pipeline);
        let variants = Arc::clone(&variants);
        let patient_id = patient_id.clone();
        let drug = drug.clone();
        tokio::task::spawn_blocking(move || pipeline.analyze_drug(&patient_id, &drug, &variants))
    });

    join_all(tasks)
        .await
        .into_iter()
        .zip(drugs)
        .map(|(joined, drug)| {
            let result = joined.unwrap_or_else(|e| {
                tracing::error!(patient_id = %patient_id, drug = %drug, error = %e, "Analysis task aborted");
                Err(AnalysisError::AnalysisFailed {
                    patient_id: patient_id.clone(),
                    drug: drug.clone(),
                    source: ReasoningError::Interrupted(e.to_string()),
                })
            });
            DrugOutcome { drug, result }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Phenotype, RiskLabel};
    use crate::pipeline::phenotype::{AllelePredicate, PhenotypeRule, RuleTable};
    use crate::pipeline::reasoning::MockLlmClient;
    use serde_json::json;

    fn response(label: &str) -> String {
        json!({
            "risk_assessment": {
                "risk_label": label,
                "confidence_score": 0.9,
                "severity": "moderate"
            },
            "clinical_recommendation": {
                "action": "Follow CPIC guidance",
                "dosage_adjustment": "None",
                "alternative_drugs": []
            },
            "llm_generated_explanation": {
                "summary": "s",
                "biological_mechanism": "m",
                "variant_citation": "c"
            }
        })
        .to_string()
    }

    fn variants() -> Vec<VariantRecord> {
        vec![
            VariantRecord {
                gene: "CYP2D6".into(),
                star_allele: "*4".into(),
                rsid: "rs3892097".into(),
                chromosome: "chr22".into(),
                position: "42128945".into(),
            },
            VariantRecord {
                gene: "CYP2C19".into(),
                star_allele: "*2".into(),
                rsid: "rs4244285".into(),
                chromosome: "chr10".into(),
                position: "94781859".into(),
            },
        ]
    }

    /// Fails WARFARIN with a timeout, answers everything else.
    fn pipeline() -> AnalysisPipeline {
        let mock = MockLlmClient::with_responder(|prompt| {
            if prompt.contains("\"drug\": \"WARFARIN\"") {
                Err(ReasoningError::Timeout(120))
            } else if prompt.contains("\"drug\": \"SIMVASTATIN\"") {
                Ok(response("Unsafe"))
            } else {
                Ok(response("Adjust Dosage"))
            }
        });
        AnalysisPipeline::new(
            PipelineConfig::default(),
            ReportAssembler::new(Box::new(mock), "mock-model"),
        )
    }

    fn drugs(names: &[&str]) -> Vec<String> {
        names.iter().map(|d| d.to_string()).collect()
    }

    #[test]
    fn single_drug_uses_mapped_gene() {
        let report = pipeline()
            .analyze_drug("PATIENT_1", "clopidogrel", &variants())
            .unwrap();
        assert_eq!(report.drug, "CLOPIDOGREL");
        assert_eq!(report.pharmacogenomic_profile.primary_gene, "CYP2C19");
        assert_eq!(report.pharmacogenomic_profile.diplotype, "*1/*2");
        assert_eq!(report.pharmacogenomic_profile.phenotype, Phenotype::Poor);
        assert_eq!(report.risk_assessment.risk_label, RiskLabel::AdjustDosage);
    }

    #[test]
    fn unsupported_drug_rejected() {
        let err = pipeline()
            .analyze_drug("PATIENT_1", "ASPIRIN", &variants())
            .unwrap_err();
        assert!(matches!(err, AnalysisError::UnsupportedDrug(ref d) if d == "ASPIRIN"));
    }

    #[test]
    fn failures_are_isolated_per_drug() {
        let outcomes = pipeline().analyze_drugs(
            "PATIENT_1",
            &drugs(&["CODEINE", "WARFARIN", "SIMVASTATIN", "ASPIRIN", "CLOPIDOGREL"]),
            &variants(),
        );
        let order: Vec<_> = outcomes.iter().map(|o| o.drug.as_str()).collect();
        assert_eq!(
            order,
            vec!["CODEINE", "WARFARIN", "SIMVASTATIN", "ASPIRIN", "CLOPIDOGREL"]
        );

        assert!(outcomes[0].is_success());
        assert!(matches!(
            outcomes[1].result,
            Err(AnalysisError::AnalysisFailed { .. })
        ));
        assert!(matches!(
            outcomes[2].result,
            Err(AnalysisError::SchemaViolation { .. })
        ));
        assert!(matches!(
            outcomes[3].result,
            Err(AnalysisError::UnsupportedDrug(_))
        ));
        assert!(outcomes[4].is_success());

        assert_eq!(
            BatchSummary::from_outcomes(&outcomes),
            BatchSummary {
                succeeded: 2,
                failed: 3
            }
        );
    }

    #[test]
    fn injected_rules_are_used() {
        let rules = RuleTable::new(
            vec![PhenotypeRule {
                when: AllelePredicate::OneOf(vec!["*4".into()]),
                phenotype: Phenotype::Poor,
            }],
            Phenotype::Unknown,
        );
        let mock = MockLlmClient::new(&response("Toxic"));
        let pipeline = AnalysisPipeline::new(
            PipelineConfig::default().with_rules(rules),
            ReportAssembler::new(Box::new(mock), "m"),
        );
        let report = pipeline
            .analyze_drug("PATIENT_1", "CODEINE", &variants())
            .unwrap();
        assert_eq!(report.pharmacogenomic_profile.phenotype, Phenotype::Poor);
    }

    #[tokio::test]
    async fn concurrent_batch_preserves_order() {
        let pipeline = Arc::new(pipeline());
        let variants: Arc<[VariantRecord]> = variants().into();
        let selection = drugs(&[
            "FLUOROURACIL",
            "WARFARIN",
            "CODEINE",
            "AZATHIOPRINE",
            "SIMVASTATIN",
            "CLOPIDOGREL",
        ]);

        let outcomes = analyze_drugs_concurrent(
            Arc::clone(&pipeline),
            "PATIENT_2".into(),
            selection.clone(),
            variants,
        )
        .await;

        let order: Vec<_> = outcomes.iter().map(|o| o.drug.clone()).collect();
        assert_eq!(order, selection);
        let ok: Vec<_> = outcomes.iter().map(DrugOutcome::is_success).collect();
        assert_eq!(ok, vec![true, false, true, true, false, true]);

        let codeine = outcomes[2].result.as_ref().unwrap();
        assert_eq!(codeine.patient_id, "PATIENT_2");
        assert_eq!(codeine.pharmacogenomic_profile.diplotype, "*1/*4");
    }
}
