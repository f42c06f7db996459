use serde::{Deserialize, Serialize};

use super::enums::{Phenotype, RiskLabel, Severity};

/// Terminal artifact of one (patient, drug) analysis.
///
/// Key names are part of the export contract and must stay stable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub patient_id: String,
    pub drug: String,
    /// ISO-8601 UTC, set by the assembler.
    pub timestamp: String,
    pub risk_assessment: RiskAssessment,
    pub pharmacogenomic_profile: PharmacogenomicProfile,
    pub clinical_recommendation: ClinicalRecommendation,
    pub llm_generated_explanation: LlmExplanation,
    pub quality_metrics: QualityMetrics,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub risk_label: RiskLabel,
    /// Always within [0, 1].
    pub confidence_score: f64,
    pub severity: Severity,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PharmacogenomicProfile {
    pub primary_gene: String,
    pub diplotype: String,
    pub phenotype: Phenotype,
    pub detected_variants: Vec<DetectedVariant>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectedVariant {
    pub rsid: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClinicalRecommendation {
    pub action: String,
    pub dosage_adjustment: String,
    /// Distinct names, first-occurrence order.
    pub alternative_drugs: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LlmExplanation {
    pub summary: String,
    pub biological_mechanism: String,
    pub variant_citation: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityMetrics {
    pub vcf_parsing_success: bool,
}
