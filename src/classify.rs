//! Mapping of native failure codes onto the crate's error taxonomy

use crate::Error;

/// The closed set of conversion failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// Trailing bytes form an incomplete unit of the source encoding
    IncompleteSequence,
    /// The output buffer filled up before a unit could be written
    OutputBufferFull,
    /// Bytes do not form a valid unit of the source encoding
    InvalidSequence,
    /// Any other native code
    Unknown(i32),
}

impl FailureKind {
    /// Classify an errno value reported by a conversion engine
    pub fn from_errno(code: i32) -> Self {
        match code {
            libc::EINVAL => FailureKind::IncompleteSequence,
            libc::E2BIG => FailureKind::OutputBufferFull,
            libc::EILSEQ => FailureKind::InvalidSequence,
            other => FailureKind::Unknown(other),
        }
    }

    /// Build the terminal error for a failure at `offset` in the source stream
    pub fn into_error(self, offset: u64) -> Error {
        match self {
            FailureKind::IncompleteSequence => Error::IncompleteSequence { offset },
            FailureKind::OutputBufferFull => Error::OutputBufferFull { offset },
            FailureKind::InvalidSequence => Error::InvalidSequence { offset },
            FailureKind::Unknown(code) => Error::UnknownFailure { code, offset },
        }
    }
}
