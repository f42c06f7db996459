use std::io::Write;
use std::path::{Path, PathBuf};

use base64::Engine;
use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;
use thiserror::Error;
use uuid::Uuid;

use crate::models::Report;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Report serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Could not move report into place at {path}: {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// `PATIENT_` plus the first 8 hex digits of a v4 UUID, upper-cased.
pub fn new_patient_id() -> String {
    let simple = Uuid::new_v4().simple().to_string();
    format!("PATIENT_{}", simple[..8].to_uppercase())
}

/// Stable lookup key for one (patient, drug) report.
pub fn report_key(patient_id: &str, drug: &str) -> String {
    let digest = Sha256::digest(format!("{patient_id}:{drug}").as_bytes());
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(digest)
}

pub fn report_file_name(patient_id: &str, drug: &str) -> String {
    format!(
        "PharmaGuard_{}_{}.json",
        sanitize_component(patient_id),
        sanitize_component(drug)
    )
}

fn sanitize_component(raw: &str) -> String {
    raw.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Write `report` as pretty JSON into `dir`, replacing any previous file.
///
/// The file appears under its final name only once fully written.
pub fn write_report(dir: &Path, report: &Report) -> Result<PathBuf, ExportError> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(report_file_name(&report.patient_id, &report.drug));

    let json = serde_json::to_vec_pretty(report)?;
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(&json)?;
    tmp.as_file().sync_all()?;
    tmp.persist(&path).map_err(|e| ExportError::Persist {
        path: path.clone(),
        source: e.error,
    })?;

    tracing::info!(
        path = %path.display(),
        key = %report_key(&report.patient_id, &report.drug),
        "Report written"
    );
    Ok(path)
}
