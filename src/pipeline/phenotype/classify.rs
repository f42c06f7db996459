use std::sync::LazyLock;

use super::rules::RuleTable;
use crate::models::{ClassificationResult, Phenotype, VariantRecord};

/// Reference allele assumed on the other chromosome.
pub const REFERENCE_ALLELE: &str = "*1";

/// Diplotype reported when the gene has no detected variant.
pub const WILD_TYPE_DIPLOTYPE: &str = "*1/*1";

static REFERENCE_RULES: LazyLock<RuleTable> = LazyLock::new(RuleTable::reference);

/// Classify `primary_gene` with the reference rule table.
pub fn classify(variants: &[VariantRecord], primary_gene: &str) -> ClassificationResult {
    classify_with(&REFERENCE_RULES, variants, primary_gene)
}

/// Derive the diplotype and phenotype for `primary_gene`.
///
/// No variant for the gene means wild type (`*1/*1`, normal metabolizer).
/// Otherwise the earliest record's allele is paired with `*1` and run through
/// `rules`. Later records for the same gene are ignored.
pub fn classify_with(
    rules: &RuleTable,
    variants: &[VariantRecord],
    primary_gene: &str,
) -> ClassificationResult {
    match variants.iter().find(|v| v.gene == primary_gene) {
        None => ClassificationResult {
            diplotype: WILD_TYPE_DIPLOTYPE.to_string(),
            phenotype: Phenotype::Normal,
        },
        Some(first) => ClassificationResult {
            diplotype: format!("{REFERENCE_ALLELE}/{}", first.star_allele),
            phenotype: rules.evaluate(&first.star_allele),
        },
    }
}
