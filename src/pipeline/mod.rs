pub mod phenotype;
pub mod processor; // Per-patient batch: lookup → classify → assemble
pub mod reasoning;
pub mod report;
pub mod vcf;
