pub mod intake;
pub mod parser;

pub use intake::*;
pub use parser::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum VariantFileError {
    #[error("Variant file is not valid UTF-8 (first invalid byte at offset {offset})")]
    Decoding { offset: usize },

    #[error("Variant file too large: {size} bytes exceeds {max} byte limit")]
    FileTooLarge { size: u64, max: u64 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
