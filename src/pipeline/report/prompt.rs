use serde::Serialize;
use serde_json::{json, Value};

use crate::models::{Phenotype, RiskLabel, Severity, VariantRecord};

pub const REPORT_SYSTEM_PROMPT: &str = r#"
You are an expert pharmacogenomics assistant and clinical geneticist. Your role
is to explain how a patient's detected genotype affects one drug, following
CPIC guideline conventions.

RULES (ABSOLUTE, NO EXCEPTIONS):
1. The diplotype and phenotype you are given are final. Do not re-derive them.
2. Cite only the variants listed in the input.
3. Output MUST be a single JSON object and nothing else.
4. risk_label MUST be one of: Safe, Adjust Dosage, Toxic, Ineffective, Unknown.
5. severity MUST be one of: none, low, moderate, high, critical.
6. confidence_score MUST be a number between 0.0 and 1.0.
"#;

/// Response schema for backends that accept one (Gemini `responseSchema`).
///
/// OpenAPI subset: the three sections the validation gate requires, with the
/// enum vocabularies taken from the model types.
pub fn reasoning_response_schema() -> Value {
    fn text() -> Value {
        json!({ "type": "STRING" })
    }
    fn one_of(values: Vec<&'static str>) -> Value {
        json!({ "type": "STRING", "format": "enum", "enum": values })
    }

    json!({
        "type": "OBJECT",
        "properties": {
            "risk_assessment": {
                "type": "OBJECT",
                "properties": {
                    "risk_label": one_of(RiskLabel::ALL.iter().map(RiskLabel::as_str).collect()),
                    "confidence_score": { "type": "NUMBER" },
                    "severity": one_of(Severity::ALL.iter().map(Severity::as_str).collect())
                },
                "required": ["risk_label", "confidence_score", "severity"]
            },
            "clinical_recommendation": {
                "type": "OBJECT",
                "properties": {
                    "action": text(),
                    "dosage_adjustment": text(),
                    "alternative_drugs": { "type": "ARRAY", "items": text() }
                },
                "required": ["action", "dosage_adjustment", "alternative_drugs"]
            },
            "llm_generated_explanation": {
                "type": "OBJECT",
                "properties": {
                    "summary": text(),
                    "biological_mechanism": text(),
                    "variant_citation": text()
                },
                "required": ["summary", "biological_mechanism", "variant_citation"]
            }
        },
        "required": ["risk_assessment", "clinical_recommendation", "llm_generated_explanation"]
    })
}

/// Facts sent to the reasoning collaborator for one analysis.
#[derive(Debug, Clone, Serialize)]
pub struct ReasoningRequest<'a> {
    pub patient_id: &'a str,
    pub drug: &'a str,
    pub target_gene: &'a str,
    pub diplotype: &'a str,
    pub phenotype: Phenotype,
    pub raw_variants: &'a [VariantRecord],
}

/// Build the user prompt for one (patient, drug) analysis.
pub fn build_report_prompt(request: &ReasoningRequest<'_>) -> String {
    let facts = serde_json::to_string_pretty(request).unwrap_or_else(|_| "{}".to_string());

    format!(
        r#"<analysis>
{facts}
</analysis>

Generate a precise clinical risk assessment for {drug} given the {gene} result
above, actionable dosing recommendations, and a biological explanation that
cites the specific variants. Respond with this JSON structure:

{{
  "risk_assessment": {{
    "risk_label": "Safe | Adjust Dosage | Toxic | Ineffective | Unknown",
    "confidence_score": 0.0,
    "severity": "none | low | moderate | high | critical"
  }},
  "clinical_recommendation": {{
    "action": "what the prescriber should do",
    "dosage_adjustment": "specific dose change or 'None'",
    "alternative_drugs": ["drug name"]
  }},
  "llm_generated_explanation": {{
    "summary": "one-paragraph summary",
    "biological_mechanism": "how the gene product affects the drug",
    "variant_citation": "rsid and allele references"
  }}
}}"#,
        drug = request.drug,
        gene = request.target_gene,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn variants() -> Vec<VariantRecord> {
        vec![VariantRecord {
            gene: "CYP2C19".into(),
            star_allele: "*2".into(),
            rsid: "rs4244285".into(),
            chromosome: "chr10".into(),
            position: "94781859".into(),
        }]
    }

    #[test]
    fn prompt_embeds_all_facts() {
        let variants = variants();
        let request = ReasoningRequest {
            patient_id: "PATIENT_1234ABCD",
            drug: "CLOPIDOGREL",
            target_gene: "CYP2C19",
            diplotype: "*1/*2",
            phenotype: Phenotype::Poor,
            raw_variants: &variants,
        };
        let prompt = build_report_prompt(&request);
        assert!(prompt.contains("\"patient_id\": \"PATIENT_1234ABCD\""));
        assert!(prompt.contains("\"target_gene\": \"CYP2C19\""));
        assert!(prompt.contains("\"diplotype\": \"*1/*2\""));
        assert!(prompt.contains("Poor Metabolizer (PM)"));
        assert!(prompt.contains("rs4244285"));
        assert!(prompt.contains("CLOPIDOGREL"));
    }

    #[test]
    fn prompt_lists_schema_sections() {
        let request = ReasoningRequest {
            patient_id: "P",
            drug: "WARFARIN",
            target_gene: "CYP2C9",
            diplotype: "*1/*1",
            phenotype: Phenotype::Normal,
            raw_variants: &[],
        };
        let prompt = build_report_prompt(&request);
        for section in [
            "risk_assessment",
            "clinical_recommendation",
            "llm_generated_explanation",
        ] {
            assert!(prompt.contains(section));
        }
        assert!(prompt.contains("\"raw_variants\": []"));
    }

    #[test]
    fn system_prompt_names_enum_vocabulary() {
        for label in RiskLabel::ALL {
            assert!(REPORT_SYSTEM_PROMPT.contains(label.as_str()), "{label}");
        }
        for severity in Severity::ALL {
            assert!(REPORT_SYSTEM_PROMPT.contains(severity.as_str()), "{severity}");
        }
    }

    #[test]
    fn response_schema_enums_follow_model_types() {
        let schema = reasoning_response_schema();
        let risk = &schema["properties"]["risk_assessment"]["properties"];
        assert_eq!(
            risk["risk_label"]["enum"],
            json!(["Safe", "Adjust Dosage", "Toxic", "Ineffective", "Unknown"])
        );
        assert_eq!(
            risk["severity"]["enum"],
            json!(["none", "low", "moderate", "high", "critical"])
        );
        assert_eq!(risk["confidence_score"]["type"], "NUMBER");
        assert_eq!(
            schema["required"],
            json!(["risk_assessment", "clinical_recommendation", "llm_generated_explanation"])
        );
    }

    #[test]
    fn response_schema_accepts_what_validation_accepts() {
        let schema = reasoning_response_schema();
        let sections = schema["properties"].as_object().unwrap();
        assert!(!sections.contains_key("pharmacogenomic_profile"));
        assert_eq!(
            sections["clinical_recommendation"]["properties"]["alternative_drugs"]["items"]["type"],
            "STRING"
        );
    }
}
