//! Pipeline configuration: the gene allow-list, the drug → gene table and the
//! phenotype rule table.
//!
//! Every stage receives these explicitly, so alternate gene sets or rule
//! tables never touch shared state.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::pipeline::phenotype::RuleTable;
use crate::pipeline::vcf::MAX_VARIANT_FILE_BYTES;

// ═══════════════════════════════════════════════════════════
// Reference tables
// ═══════════════════════════════════════════════════════════

/// Pharmacogenes the extractor keeps.
pub const DEFAULT_TARGET_GENES: &[&str] = &["CYP2D6", "CYP2C19", "CYP2C9", "SLCO1B1", "TPMT", "DPYD"];

/// Supported drugs and the primary gene each is analyzed against.
pub const DEFAULT_DRUG_GENES: &[(&str, &str)] = &[
    ("CODEINE", "CYP2D6"),
    ("WARFARIN", "CYP2C9"),
    ("CLOPIDOGREL", "CYP2C19"),
    ("SIMVASTATIN", "SLCO1B1"),
    ("AZATHIOPRINE", "TPMT"),
    ("FLUOROURACIL", "DPYD"),
];

pub fn default_target_genes() -> BTreeSet<String> {
    DEFAULT_TARGET_GENES.iter().map(|g| g.to_string()).collect()
}

// ═══════════════════════════════════════════════════════════
// Types
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrugGene {
    pub drug: String,
    pub gene: String,
}

/// Ordered drug → primary gene table. Lookups ignore case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrugGeneMap {
    entries: Vec<DrugGene>,
}

impl DrugGeneMap {
    pub fn new(entries: Vec<DrugGene>) -> Self {
        Self { entries }
    }

    /// Entry for `drug`, matched case-insensitively.
    pub fn lookup(&self, drug: &str) -> Option<&DrugGene> {
        let wanted = drug.trim();
        self.entries
            .iter()
            .find(|e| e.drug.eq_ignore_ascii_case(wanted))
    }

    pub fn entries(&self) -> &[DrugGene] {
        &self.entries
    }

    /// Drop repeats from a drug selection, keeping the first occurrence.
    ///
    /// Supported drugs are compared by their canonical name, so `codeine` and
    /// `CODEINE` count once. Unsupported names are compared case-insensitively
    /// and kept so their analysis can fail on its own.
    pub fn distinct_selection<S: AsRef<str>>(&self, drugs: &[S]) -> Vec<String> {
        let mut seen: Vec<String> = Vec::with_capacity(drugs.len());
        let mut out = Vec::with_capacity(drugs.len());
        for drug in drugs {
            let drug = drug.as_ref().trim();
            if drug.is_empty() {
                continue;
            }
            let key = match self.lookup(drug) {
                Some(entry) => entry.drug.clone(),
                None => drug.to_uppercase(),
            };
            if !seen.contains(&key) {
                seen.push(key);
                out.push(drug.to_string());
            }
        }
        out
    }
}

impl Default for DrugGeneMap {
    fn default() -> Self {
        Self::new(
            DEFAULT_DRUG_GENES
                .iter()
                .map(|(drug, gene)| DrugGene {
                    drug: drug.to_string(),
                    gene: gene.to_string(),
                })
                .collect(),
        )
    }
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub target_genes: BTreeSet<String>,
    pub drug_genes: DrugGeneMap,
    pub rules: RuleTable,
    /// Decompressed size limit for one variant file.
    pub max_file_bytes: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            target_genes: default_target_genes(),
            drug_genes: DrugGeneMap::default(),
            rules: RuleTable::reference(),
            max_file_bytes: MAX_VARIANT_FILE_BYTES,
        }
    }
}

impl PipelineConfig {
    pub fn with_rules(mut self, rules: RuleTable) -> Self {
        self.rules = rules;
        self
    }
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════
