pub mod assembler;
pub mod export;
pub mod parser;
pub mod prompt;
pub mod validation;

pub use assembler::*;
pub use export::*;
pub use parser::*;
pub use prompt::*;
pub use validation::*;

use thiserror::Error;

use crate::pipeline::reasoning::ReasoningError;

/// The collaborator's response does not satisfy the report schema.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchemaViolation {
    #[error("Response is not a JSON object: {0}")]
    MalformedJson(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Field {field} must be {expected}")]
    InvalidType { field: String, expected: &'static str },

    #[error("Field {field} has value '{value}' outside its allowed set")]
    InvalidEnum { field: String, value: String },

    #[error("Field {field} has unusable number {value}")]
    InvalidNumber { field: String, value: String },
}

impl SchemaViolation {
    /// Dotted path of the offending field, if the violation names one.
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::MalformedJson(_) => None,
            Self::MissingField(field)
            | Self::InvalidType { field, .. }
            | Self::InvalidEnum { field, .. }
            | Self::InvalidNumber { field, .. } => Some(field),
        }
    }
}

/// Failure of one (patient, drug) analysis. Sibling analyses are unaffected.
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Unsupported drug: {0}")]
    UnsupportedDrug(String),

    #[error("Schema violation for patient {patient_id}, drug {drug}: {source}")]
    SchemaViolation {
        patient_id: String,
        drug: String,
        #[source]
        source: SchemaViolation,
    },

    #[error("Analysis failed for patient {patient_id}, drug {drug}: {source}")]
    AnalysisFailed {
        patient_id: String,
        drug: String,
        #[source]
        source: ReasoningError,
    },
}

impl AnalysisError {
    pub fn drug(&self) -> &str {
        match self {
            Self::UnsupportedDrug(drug) => drug,
            Self::SchemaViolation { drug, .. } | Self::AnalysisFailed { drug, .. } => drug,
        }
    }
}
