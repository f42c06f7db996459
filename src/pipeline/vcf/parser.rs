use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

use super::VariantFileError;
use crate::models::VariantRecord;

/// Minimum tab-separated fields for a data line (through INFO).
const MIN_FIELDS: usize = 8;

/// Zero-based index of the INFO column.
const INFO_COLUMN: usize = 7;

static GENE_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"GENE=([^;]+)").unwrap());
static STAR_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"STAR=([^;]+)").unwrap());
static RS_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"RS=([^;]+)").unwrap());

/// Line counts gathered during one extraction, logged at debug level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractionSummary {
    pub header_lines: usize,
    pub short_lines: usize,
    pub untagged_lines: usize,
    pub off_target_lines: usize,
    pub records: usize,
}

/// Extract pharmacogene variant records from raw variant-call text.
///
/// Header lines (`#`) and lines with fewer than eight tab-separated fields are
/// skipped. A record is produced only when the INFO column carries `GENE=`,
/// `STAR=` and `RS=` and the upper-cased gene is in `target_genes`. Source
/// line order is preserved and duplicates are kept.
///
/// Only a byte stream that is not UTF-8 fails.
pub fn extract(
    raw: &[u8],
    target_genes: &BTreeSet<String>,
) -> Result<Vec<VariantRecord>, VariantFileError> {
    let (records, summary) = extract_with_summary(raw, target_genes)?;
    tracing::debug!(
        records = summary.records,
        header_lines = summary.header_lines,
        short_lines = summary.short_lines,
        untagged_lines = summary.untagged_lines,
        off_target_lines = summary.off_target_lines,
        "Variant extraction complete"
    );
    Ok(records)
}

/// Same as [`extract`], also returning per-category line counts.
pub fn extract_with_summary(
    raw: &[u8],
    target_genes: &BTreeSet<String>,
) -> Result<(Vec<VariantRecord>, ExtractionSummary), VariantFileError> {
    let text = std::str::from_utf8(raw).map_err(|e| VariantFileError::Decoding {
        offset: e.valid_up_to(),
    })?;

    let mut summary = ExtractionSummary::default();
    let mut records = Vec::new();

    // `\n`, `\r\n` and lone `\r` all end a line; the empty piece between
    // `\r` and `\n` is skipped.
    for line in text.split(['\n', '\r']).filter(|l| !l.is_empty()) {
        if line.starts_with('#') {
            summary.header_lines += 1;
            continue;
        }

        let columns: Vec<&str> = line.split('\t').collect();
        if columns.len() < MIN_FIELDS {
            summary.short_lines += 1;
            continue;
        }

        match parse_info(columns[INFO_COLUMN]) {
            Some(tags) => {
                let gene = tags.gene.to_uppercase();
                if !target_genes.contains(&gene) {
                    summary.off_target_lines += 1;
                    continue;
                }
                records.push(VariantRecord {
                    gene,
                    star_allele: tags.star.to_string(),
                    rsid: tags.rsid.to_string(),
                    chromosome: columns[0].to_string(),
                    position: columns[1].to_string(),
                });
            }
            None => summary.untagged_lines += 1,
        }
    }

    summary.records = records.len();
    Ok((records, summary))
}

struct InfoTags<'a> {
    gene: &'a str,
    star: &'a str,
    rsid: &'a str,
}

/// Pull the three annotation tags out of an INFO field. All must be present.
fn parse_info(info: &str) -> Option<InfoTags<'_>> {
    Some(InfoTags {
        gene: first_capture(&GENE_TAG, info)?,
        star: first_capture(&STAR_TAG, info)?,
        rsid: first_capture(&RS_TAG, info)?,
    })
}

fn first_capture<'a>(re: &Regex, haystack: &'a str) -> Option<&'a str> {
    re.captures(haystack)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline_config::default_target_genes;

    fn line(chrom: &str, pos: &str, info: &str) -> String {
        format!("{chrom}\t{pos}\trs0\tA\tG\t.\tPASS\t{info}")
    }

    fn genes() -> BTreeSet<String> {
        default_target_genes()
    }

    #[test]
    fn extracts_tagged_target_gene_line() {
        let text = line("chr22", "42130692", "GENE=CYP2D6;STAR=*4;RS=rs3892097");
        let records = extract(text.as_bytes(), &genes()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(
            records[0],
            VariantRecord {
                gene: "CYP2D6".into(),
                star_allele: "*4".into(),
                rsid: "rs3892097".into(),
                chromosome: "chr22".into(),
                position: "42130692".into(),
            }
        );
    }

    #[test]
    fn empty_input_yields_no_records() {
        assert!(extract(b"", &genes()).unwrap().is_empty());
    }

    #[test]
    fn header_only_yields_no_records() {
        let text = "##fileformat=VCFv4.2\n##source=test\n#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\n";
        assert!(extract(text.as_bytes(), &genes()).unwrap().is_empty());
    }

    #[test]
    fn header_lines_skipped_even_with_tags() {
        let text = format!("#{}", line("chr22", "1", "GENE=CYP2D6;STAR=*4;RS=rs1"));
        assert!(extract(text.as_bytes(), &genes()).unwrap().is_empty());
    }

    #[test]
    fn short_lines_dropped_silently() {
        let text = format!(
            "chr22\t1\tGENE=CYP2D6;STAR=*4;RS=rs1\n{}\n",
            line("chr10", "2", "GENE=CYP2C19;STAR=*17;RS=rs12248560")
        );
        let (records, summary) = extract_with_summary(text.as_bytes(), &genes()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].gene, "CYP2C19");
        assert_eq!(summary.short_lines, 1);
    }

    #[test]
    fn missing_any_tag_drops_line() {
        let text = [
            line("chr22", "1", "STAR=*4;RS=rs1"),
            line("chr22", "2", "GENE=CYP2D6;RS=rs2"),
            line("chr22", "3", "GENE=CYP2D6;STAR=*4"),
        ]
        .join("\n");
        let (records, summary) = extract_with_summary(text.as_bytes(), &genes()).unwrap();
        assert!(records.is_empty());
        assert_eq!(summary.untagged_lines, 3);
    }

    #[test]
    fn off_target_gene_dropped() {
        let text = line("chr7", "1", "GENE=VKORC1;STAR=*2;RS=rs9923231");
        let (records, summary) = extract_with_summary(text.as_bytes(), &genes()).unwrap();
        assert!(records.is_empty());
        assert_eq!(summary.off_target_lines, 1);
    }

    #[test]
    fn gene_is_upper_cased_allele_is_not() {
        let text = line("chr22", "1", "GENE=cyp2d6;STAR=*4a;RS=rs1");
        let records = extract(text.as_bytes(), &genes()).unwrap();
        assert_eq!(records[0].gene, "CYP2D6");
        assert_eq!(records[0].star_allele, "*4a");
    }

    #[test]
    fn tags_in_any_order_and_end_of_field() {
        let text = line("chr1", "97450058", "DP=30;RS=rs3918290;STAR=*2A;GENE=DPYD");
        let records = extract(text.as_bytes(), &genes()).unwrap();
        assert_eq!(records[0].gene, "DPYD");
        assert_eq!(records[0].star_allele, "*2A");
        assert_eq!(records[0].rsid, "rs3918290");
    }

    #[test]
    fn order_preserved_and_duplicates_kept() {
        let text = [
            line("chr22", "1", "GENE=CYP2D6;STAR=*4;RS=rs1"),
            line("chr10", "2", "GENE=CYP2C9;STAR=*3;RS=rs1057910"),
            line("chr22", "3", "GENE=CYP2D6;STAR=*10;RS=rs1"),
        ]
        .join("\n");
        let records = extract(text.as_bytes(), &genes()).unwrap();
        let alleles: Vec<&str> = records.iter().map(|r| r.star_allele.as_str()).collect();
        assert_eq!(alleles, vec!["*4", "*3", "*10"]);
        assert_eq!(records[0].rsid, records[2].rsid);
    }

    #[test]
    fn crlf_line_endings_accepted() {
        let text = format!(
            "##fileformat=VCFv4.2\r\n{}\r\n",
            line("chr22", "1", "GENE=CYP2D6;STAR=*4;RS=rs1")
        );
        let records = extract(text.as_bytes(), &genes()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].rsid, "rs1");
    }

    #[test]
    fn lone_cr_line_endings_accepted() {
        let text = format!(
            "##fileformat=VCFv4.2\r{}\r{}\r",
            line("chr22", "1", "GENE=CYP2D6;STAR=*4;RS=rs1"),
            line("chr10", "2", "GENE=CYP2C19;STAR=*2;RS=rs2")
        );
        let (records, summary) = extract_with_summary(text.as_bytes(), &genes()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].position, "1");
        assert_eq!(records[1].rsid, "rs2");
        assert_eq!(summary.header_lines, 1);
        assert_eq!(summary.short_lines, 0);
    }

    #[test]
    fn crlf_does_not_add_short_lines() {
        let text = format!(
            "#CHROM\r\n{}\r\n",
            line("chr22", "1", "GENE=CYP2D6;STAR=*4;RS=rs1")
        );
        let (records, summary) = extract_with_summary(text.as_bytes(), &genes()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(summary.short_lines, 0);
    }

    #[test]
    fn invalid_utf8_is_decoding_error() {
        let mut bytes = b"##fileformat=VCFv4.2\n".to_vec();
        bytes.extend_from_slice(&[0xff, 0xfe, 0x00]);
        let err = extract(&bytes, &genes()).unwrap_err();
        assert!(matches!(err, VariantFileError::Decoding { offset: 21 }));
    }

    #[test]
    fn garbage_lines_never_fail() {
        let text = "\n\t\t\t\nnot a vcf line\n;;;;\t=\t\t\t\t\t\tGENE=\n";
        assert!(extract(text.as_bytes(), &genes()).unwrap().is_empty());
    }

    #[test]
    fn custom_gene_set_filters() {
        let custom: BTreeSet<String> = ["VKORC1".to_string()].into_iter().collect();
        let text = [
            line("chr16", "1", "GENE=VKORC1;STAR=*2;RS=rs9923231"),
            line("chr22", "2", "GENE=CYP2D6;STAR=*4;RS=rs1"),
        ]
        .join("\n");
        let records = extract(text.as_bytes(), &custom).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].gene, "VKORC1");
    }

    #[test]
    fn extraction_is_repeatable() {
        let text = [
            line("chr22", "1", "GENE=CYP2D6;STAR=*4;RS=rs1"),
            line("chr10", "2", "GENE=CYP2C19;STAR=*2;RS=rs2"),
        ]
        .join("\n");
        let a = extract(text.as_bytes(), &genes()).unwrap();
        let b = extract(text.as_bytes(), &genes()).unwrap();
        assert_eq!(a, b);
    }
}
