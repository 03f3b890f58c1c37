use thiserror::Error;

use crate::io::FormatError;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Format(#[from] FormatError),

    #[error("unsupported input passed to append: {0}")]
    UnsupportedInput(String),
}
