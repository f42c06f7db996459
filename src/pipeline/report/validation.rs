// Validation gate for collaborator output. Nothing from the reasoning service
// reaches a Report without passing through validate_reasoning_fields().

use std::str::FromStr;

use serde_json::{Map, Value};

use super::parser::json_kind;
use super::SchemaViolation;
use crate::models::{
    ClinicalRecommendation, InvalidEnum, LlmExplanation, RiskAssessment, RiskLabel, Severity,
};

/// Scores above this are read as percentages.
const PERCENT_SCALE_THRESHOLD: f64 = 1.0;

/// The externally sourced parts of a report, after validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedFields {
    pub risk_assessment: RiskAssessment,
    pub clinical_recommendation: ClinicalRecommendation,
    pub llm_generated_explanation: LlmExplanation,
}

/// Check presence, type and enum membership of every collaborator field.
///
/// Unknown keys, including any attempt to supply deterministic fields such
/// as `pharmacogenomic_profile` or `timestamp`, are ignored.
pub fn validate_reasoning_fields(
    response: &Map<String, Value>,
) -> Result<ValidatedFields, SchemaViolation> {
    let risk = section(response, "risk_assessment")?;
    let risk_assessment = RiskAssessment {
        risk_label: required_enum::<RiskLabel>(risk, "risk_assessment", "risk_label")?,
        confidence_score: normalize_confidence(required_number(
            risk,
            "risk_assessment",
            "confidence_score",
        )?)
        .ok_or_else(|| SchemaViolation::InvalidNumber {
            field: "risk_assessment.confidence_score".into(),
            value: risk
                .get("confidence_score")
                .map(Value::to_string)
                .unwrap_or_default(),
        })?,
        severity: required_enum::<Severity>(risk, "risk_assessment", "severity")?,
    };

    let rec = section(response, "clinical_recommendation")?;
    let clinical_recommendation = ClinicalRecommendation {
        action: required_str(rec, "clinical_recommendation", "action")?,
        dosage_adjustment: required_str(rec, "clinical_recommendation", "dosage_adjustment")?,
        alternative_drugs: distinct(required_str_array(
            rec,
            "clinical_recommendation",
            "alternative_drugs",
        )?),
    };

    let expl = section(response, "llm_generated_explanation")?;
    let llm_generated_explanation = LlmExplanation {
        summary: required_str(expl, "llm_generated_explanation", "summary")?,
        biological_mechanism: required_str(
            expl,
            "llm_generated_explanation",
            "biological_mechanism",
        )?,
        variant_citation: required_str(expl, "llm_generated_explanation", "variant_citation")?,
    };

    Ok(ValidatedFields {
        risk_assessment,
        clinical_recommendation,
        llm_generated_explanation,
    })
}

/// Bring a raw confidence into [0, 1].
///
/// Values above 1.0 are treated as a 0–100 scale and divided by 100, then
/// clamped. Negative or non-finite input yields `None`.
pub fn normalize_confidence(raw: f64) -> Option<f64> {
    if !raw.is_finite() || raw < 0.0 {
        return None;
    }
    let scaled = if raw > PERCENT_SCALE_THRESHOLD {
        raw / 100.0
    } else {
        raw
    };
    Some(scaled.clamp(0.0, 1.0))
}

fn path(section: &str, key: &str) -> String {
    format!("{section}.{key}")
}

fn section<'a>(
    response: &'a Map<String, Value>,
    name: &str,
) -> Result<&'a Map<String, Value>, SchemaViolation> {
    match response.get(name) {
        None | Some(Value::Null) => Err(SchemaViolation::MissingField(name.to_string())),
        Some(Value::Object(map)) => Ok(map),
        Some(_) => Err(SchemaViolation::InvalidType {
            field: name.to_string(),
            expected: "an object",
        }),
    }
}

fn required<'a>(
    map: &'a Map<String, Value>,
    section: &str,
    key: &str,
) -> Result<&'a Value, SchemaViolation> {
    match map.get(key) {
        None | Some(Value::Null) => Err(SchemaViolation::MissingField(path(section, key))),
        Some(value) => Ok(value),
    }
}

fn required_str(
    map: &Map<String, Value>,
    section: &str,
    key: &str,
) -> Result<String, SchemaViolation> {
    match required(map, section, key)? {
        Value::String(s) => Ok(s.clone()),
        _ => Err(SchemaViolation::InvalidType {
            field: path(section, key),
            expected: "a string",
        }),
    }
}

fn required_enum<T>(map: &Map<String, Value>, section: &str, key: &str) -> Result<T, SchemaViolation>
where
    T: FromStr<Err = InvalidEnum>,
{
    let raw = required_str(map, section, key)?;
    T::from_str(raw.trim()).map_err(|_| SchemaViolation::InvalidEnum {
        field: path(section, key),
        value: raw,
    })
}

/// Numbers, or strings holding a number.
fn required_number(
    map: &Map<String, Value>,
    section: &str,
    key: &str,
) -> Result<f64, SchemaViolation> {
    let value = required(map, section, key)?;
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| SchemaViolation::InvalidNumber {
        field: path(section, key),
        value: value.to_string(),
    })
}

fn required_str_array(
    map: &Map<String, Value>,
    section: &str,
    key: &str,
) -> Result<Vec<String>, SchemaViolation> {
    let field = path(section, key);
    match required(map, section, key)? {
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => Ok(s.clone()),
                other => Err(SchemaViolation::InvalidType {
                    field: field.clone(),
                    expected: if matches!(other, Value::Array(_)) {
                        "an array of strings, not nested arrays"
                    } else {
                        "an array of strings"
                    },
                }),
            })
            .collect(),
        other => {
            tracing::debug!(field = %field, kind = json_kind(other), "Expected array");
            Err(SchemaViolation::InvalidType {
                field,
                expected: "an array of strings",
            })
        }
    }
}

/// Trim, drop blanks and duplicates, keep first-occurrence order.
fn distinct(items: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(items.len());
    for item in items {
        let item = item.trim().to_string();
        if !item.is_empty() && !out.contains(&item) {
            out.push(item);
        }
    }
    out
}
