use serde::{Deserialize, Serialize};

use super::enums::Phenotype;

/// One annotated variant line that passed the gene allow-list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantRecord {
    /// Upper-cased gene symbol.
    pub gene: String,
    /// Allele token as written in the source line.
    pub star_allele: String,
    pub rsid: String,
    pub chromosome: String,
    pub position: String,
}

/// Diplotype and metabolizer status for one gene.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub diplotype: String,
    pub phenotype: Phenotype,
}
