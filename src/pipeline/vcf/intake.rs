use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

use flate2::read::MultiGzDecoder;

use super::parser::extract;
use super::VariantFileError;
use crate::models::VariantRecord;

/// Upload limit for a single variant file (decompressed size).
pub const MAX_VARIANT_FILE_BYTES: u64 = 5 * 1024 * 1024; // 5MB

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

const GZIP_EXTENSIONS: &[&str] = &["gz", "bgz"];

/// True for `.gz` / `.bgz` paths, any case.
pub fn has_gzip_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| GZIP_EXTENSIONS.iter().any(|g| ext.eq_ignore_ascii_case(g)))
}

/// Read a variant file into memory, enforcing the size limit.
///
/// Gzip and BGZF input is detected from the `.gz`/`.bgz` extension or the
/// magic bytes and decompressed; the limit applies to the decompressed text.
pub fn read_variant_file(path: &Path, max_bytes: u64) -> Result<Vec<u8>, VariantFileError> {
    let mut file = File::open(path)?;
    let mut magic = [0u8; 2];
    let read = file.read(&mut magic)?;
    file.rewind()?;

    let gzip = (read == 2 && magic == GZIP_MAGIC) || has_gzip_extension(path);
    let reader: Box<dyn Read> = if gzip {
        tracing::debug!(path = %path.display(), "Gzip variant file detected");
        Box::new(MultiGzDecoder::new(BufReader::new(file)))
    } else {
        let size = file.metadata()?.len();
        if size > max_bytes {
            return Err(VariantFileError::FileTooLarge {
                size,
                max: max_bytes,
            });
        }
        Box::new(BufReader::new(file))
    };

    // One byte past the limit is enough to know the file is oversize.
    let mut buf = Vec::new();
    reader.take(max_bytes.saturating_add(1)).read_to_end(&mut buf)?;
    if buf.len() as u64 > max_bytes {
        return Err(VariantFileError::FileTooLarge {
            size: buf.len() as u64,
            max: max_bytes,
        });
    }
    Ok(buf)
}

/// Read and extract in one step.
pub fn load_variants(
    path: &Path,
    target_genes: &BTreeSet<String>,
    max_bytes: u64,
) -> Result<Vec<VariantRecord>, VariantFileError> {
    let raw = read_variant_file(path, max_bytes)?;
    let records = extract(&raw, target_genes)?;
    tracing::info!(
        path = %path.display(),
        bytes = raw.len(),
        records = records.len(),
        "Variant file loaded"
    );
    Ok(records)
}
