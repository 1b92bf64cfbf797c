//! Pump sizing and overflow behavior

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Default read chunk capacity in bytes
pub const DEFAULT_READ_CAPACITY: usize = 4096;

/// Default output scratch capacity in bytes
///
/// Twice the read capacity so expanding conversions rarely overflow.
pub const DEFAULT_WRITE_CAPACITY: usize = DEFAULT_READ_CAPACITY * 2;

/// Smallest accepted capacity for either buffer
///
/// Large enough for the longest unit of any common encoding.
pub const MIN_CAPACITY: usize = 16;

/// What to do when one engine call fills the output buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OverflowPolicy {
    /// Fail the whole run with [`Error::OutputBufferFull`]
    #[default]
    Abort,
    /// Write what was produced and convert the remaining input again
    FlushAndRetry,
}

/// Buffer configuration for [`crate::Converter::execute`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PumpConfig {
    /// Read buffer capacity in bytes
    pub read_capacity: usize,
    /// Write buffer capacity in bytes
    pub write_capacity: usize,
    /// Behavior on output overflow
    pub on_overflow: OverflowPolicy,
}

impl Default for PumpConfig {
    fn default() -> Self {
        Self {
            read_capacity: DEFAULT_READ_CAPACITY,
            write_capacity: DEFAULT_WRITE_CAPACITY,
            on_overflow: OverflowPolicy::Abort,
        }
    }
}

impl PumpConfig {
    /// Default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the read buffer capacity
    pub fn read_capacity(mut self, bytes: usize) -> Self {
        self.read_capacity = bytes;
        self
    }

    /// Set the write buffer capacity
    pub fn write_capacity(mut self, bytes: usize) -> Self {
        self.write_capacity = bytes;
        self
    }

    /// Set the overflow policy
    pub fn on_overflow(mut self, policy: OverflowPolicy) -> Self {
        self.on_overflow = policy;
        self
    }

    /// Check both capacities against [`MIN_CAPACITY`]
    pub fn validate(&self) -> Result<()> {
        if self.read_capacity < MIN_CAPACITY {
            return Err(Error::InvalidConfig(format!(
                "read capacity {} is below the minimum of {}",
                self.read_capacity, MIN_CAPACITY
            )));
        }
        if self.write_capacity < MIN_CAPACITY {
            return Err(Error::InvalidConfig(format!(
                "write capacity {} is below the minimum of {}",
                self.write_capacity, MIN_CAPACITY
            )));
        }
        Ok(())
    }
}
