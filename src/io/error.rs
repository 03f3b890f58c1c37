use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FormatError {
    #[error("invalid offset at line {line}: {offset:?} is not a hex address")]
    InvalidOffset { line: usize, offset: String },

    #[error("invalid word at line {line}: {word:?} ({message})")]
    InvalidWord {
        line: usize,
        word: String,
        message: String,
    },

    #[error("data at line {line} before any @offset line")]
    NoOpenSegment { line: usize },

    #[error("no segment found")]
    NoSegment,

    #[error("address overflow: {0}")]
    AddressOverflow(String),

    #[error("word width must be at least one byte")]
    InvalidWordWidth,
}

impl FormatError {
    /// Attach a source line number to errors raised below the line parser.
    pub(crate) fn at_line(self, line: usize) -> Self {
        match self {
            FormatError::InvalidOffset { offset, .. } => FormatError::InvalidOffset { line, offset },
            FormatError::InvalidWord { word, message, .. } => FormatError::InvalidWord {
                line,
                word,
                message,
            },
            FormatError::NoOpenSegment { .. } => FormatError::NoOpenSegment { line },
            other => other,
        }
    }
}
