//! The conversion engine contract
//!
//! An engine performs one incremental step of charset conversion. It owns the
//! encoding-pair state (shift state for stateful encodings) and nothing else;
//! the stream-level bookkeeping lives in [`crate::pump`].

/// Counts reported by a successful conversion step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Progress {
    /// Bytes taken from the front of the input
    pub consumed: usize,
    /// Bytes written to the front of the output
    pub produced: usize,
}

/// A failed conversion step
///
/// `code` is the native failure signal (an errno value for iconv). The engine
/// may still have made partial progress before failing, reported through
/// `consumed` and `produced`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fault {
    /// Native failure code
    pub code: i32,
    /// Bytes taken from the input before the failure
    pub consumed: usize,
    /// Bytes written to the output before the failure
    pub produced: usize,
}

impl Fault {
    /// A fault that made no progress
    pub fn new(code: i32) -> Self {
        Self {
            code,
            consumed: 0,
            produced: 0,
        }
    }

    /// Attach the progress made before the failure
    pub fn with_progress(mut self, progress: Progress) -> Self {
        self.consumed = progress.consumed;
        self.produced = progress.produced;
        self
    }

    /// Progress made before the failure
    pub fn progress(&self) -> Progress {
        Progress {
            consumed: self.consumed,
            produced: self.produced,
        }
    }
}

/// One directional charset conversion primitive
///
/// Implementations must never report more bytes consumed than `input.len()`
/// or produced than `output.len()`. The pump checks both and panics on
/// violation.
pub trait ConversionEngine {
    /// Convert as much of `input` into `output` as fits.
    ///
    /// An incomplete unit at the end of `input` is reported as a fault with
    /// the incomplete-sequence code; everything before it must be counted in
    /// the fault's progress.
    fn convert(&mut self, input: &[u8], output: &mut [u8]) -> Result<Progress, Fault>;

    /// Emit whatever the engine needs to return to its initial shift state.
    ///
    /// Called once after the last input byte. Returns the number of bytes
    /// written to `output`.
    fn finish(&mut self, _output: &mut [u8]) -> Result<usize, Fault> {
        Ok(0)
    }

    /// Drop any shift state left over from a previous stream
    fn reset(&mut self) {}
}

impl<E: ConversionEngine + ?Sized> ConversionEngine for Box<E> {
    fn convert(&mut self, input: &[u8], output: &mut [u8]) -> Result<Progress, Fault> {
        (**self).convert(input, output)
    }

    fn finish(&mut self, output: &mut [u8]) -> Result<usize, Fault> {
        (**self).finish(output)
    }

    fn reset(&mut self) {
        (**self).reset()
    }
}
