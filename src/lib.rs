//! # StreamIconv - Streaming Character Set Conversion
//!
//! Converts a byte stream from one character set into another over bounded
//! buffers, so inputs of any length are processed in constant memory.
//!
//! ## Features
//!
//! - **Bounded memory**: fixed read and write buffers, sized by [`PumpConfig`]
//! - **Boundary-safe**: multi-byte units split across reads are carried over
//! - **Any iconv charset**: encoding names go to `iconv_open` verbatim
//! - **Pluggable engines** through the [`ConversionEngine`] trait
//! - **Classified errors** with the source offset of the failure
//!
//! ## Quick Start
//!
//! ```rust
//! use stream_iconv::{ConversionOption, Converter};
//!
//! let mut converter = Converter::open("UTF-16LE", "UTF-8", ConversionOption::None).unwrap();
//!
//! let mut source: &[u8] = "héllo".as_bytes();
//! let mut sink = Vec::new();
//! let summary = converter.execute(&mut sink, &mut source).unwrap();
//!
//! assert_eq!(summary.bytes_read, 6);
//! assert_eq!(sink.len(), 10);
//! ```

#![deny(missing_docs)]

use std::fmt;
use std::io;

use serde::{Deserialize, Serialize};
use tracing::warn;

mod buffer;
pub mod classify;
pub mod config;
pub mod engine;
mod handle;
pub mod iconv;
mod pump;

pub use classify::FailureKind;
pub use config::{OverflowPolicy, PumpConfig};
pub use engine::{ConversionEngine, Fault, Progress};
pub use handle::Converter;
pub use iconv::IconvEngine;
pub use pump::Summary;

/// Result type for conversion operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while opening or running a converter
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The engine rejected the encoding pair
    #[error("Unsupported conversion from {from} to {to}")]
    UnsupportedConversion {
        /// Source encoding name
        from: String,
        /// Target encoding name, including the option suffix
        to: String,
        /// Error reported by the engine
        source: io::Error,
    },
    /// The input ended inside a multi-byte unit
    #[error("Incomplete multibyte sequence at byte {offset}")]
    IncompleteSequence {
        /// Source offset of the first unconverted byte
        offset: u64,
    },
    /// A single engine call produced more than the write buffer holds
    #[error("Output buffer full at byte {offset}")]
    OutputBufferFull {
        /// Source offset of the first unconverted byte
        offset: u64,
    },
    /// The input is not valid in the source encoding
    #[error("Invalid multibyte sequence at byte {offset}")]
    InvalidSequence {
        /// Source offset of the invalid unit
        offset: u64,
    },
    /// The engine failed with a code outside the known set
    #[error("Unknown conversion failure (errno {code}) at byte {offset}")]
    UnknownFailure {
        /// Native failure code
        code: i32,
        /// Source offset of the first unconverted byte
        offset: u64,
    },
    /// Rejected pump configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    /// The converter's engine has already been released
    #[error("Converter is closed")]
    Closed,
    /// Reading the source or writing the sink failed
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl Error {
    /// The conversion failure behind this error, if it is one
    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            Error::IncompleteSequence { .. } => Some(FailureKind::IncompleteSequence),
            Error::OutputBufferFull { .. } => Some(FailureKind::OutputBufferFull),
            Error::InvalidSequence { .. } => Some(FailureKind::InvalidSequence),
            Error::UnknownFailure { code, .. } => Some(FailureKind::Unknown(*code)),
            _ => None,
        }
    }

    /// Source offset at which conversion stopped, if known
    pub fn offset(&self) -> Option<u64> {
        match self {
            Error::IncompleteSequence { offset }
            | Error::OutputBufferFull { offset }
            | Error::InvalidSequence { offset }
            | Error::UnknownFailure { offset, .. } => Some(*offset),
            _ => None,
        }
    }
}

/// How the engine treats characters the target cannot represent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConversionOption {
    /// Fail on unrepresentable characters
    #[default]
    None,
    /// Substitute look-alike characters (`//TRANSLIT`)
    Transliteration,
    /// Drop unrepresentable characters (`//IGNORE`)
    Ignore,
}

impl ConversionOption {
    const SUFFIXES: [&'static str; 3] = ["", "//TRANSLIT", "//IGNORE"];

    /// Suffix appended to the target encoding name
    pub fn suffix(self) -> &'static str {
        Self::SUFFIXES[self as usize]
    }

    /// Option for a numeric index; anything out of range means [`ConversionOption::None`]
    pub fn from_index(index: i64) -> Self {
        match index {
            1 => ConversionOption::Transliteration,
            2 => ConversionOption::Ignore,
            _ => ConversionOption::None,
        }
    }
}

impl From<&str> for ConversionOption {
    /// Parse an option word. Unrecognized words degrade to `None`.
    fn from(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "translit" | "transliteration" | "//translit" => ConversionOption::Transliteration,
            "ignore" | "//ignore" => ConversionOption::Ignore,
            "" | "none" => ConversionOption::None,
            other => {
                warn!(option = other, "unrecognized conversion option, using none");
                ConversionOption::None
            }
        }
    }
}

impl fmt::Display for ConversionOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConversionOption::None => "none",
            ConversionOption::Transliteration => "translit",
            ConversionOption::Ignore => "ignore",
        };
        f.write_str(name)
    }
}
