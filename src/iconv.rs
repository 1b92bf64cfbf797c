//! Conversion engine backed by the platform `iconv(3)`
//!
//! Encoding names are handed to `iconv_open` verbatim, including any
//! `//TRANSLIT` or `//IGNORE` suffix on the target.

use std::ffi::{CString, NulError};
use std::io;
use std::ptr;

use tracing::debug;

use crate::engine::{ConversionEngine, Fault, Progress};

/// `(size_t)-1`, returned by `iconv` on failure
const CONVERSION_FAILED: libc::size_t = libc::size_t::MAX;

/// An open iconv conversion descriptor
///
/// The descriptor is closed when the engine is dropped.
#[derive(Debug)]
pub struct IconvEngine {
    cd: libc::iconv_t,
    ignore: bool,
}

// SAFETY: an iconv descriptor is plain heap state with no thread affinity.
// It may move between threads; `&mut self` on every call keeps it unshared.
unsafe impl Send for IconvEngine {}

impl IconvEngine {
    /// Open a descriptor converting from `source` to `target`.
    ///
    /// Fails with the errno reported by `iconv_open` (usually `EINVAL`) when
    /// the pair is not supported, or with `InvalidInput` when a name contains
    /// a NUL byte.
    pub fn open(target: &str, source: &str) -> io::Result<Self> {
        let invalid = |e: NulError| io::Error::new(io::ErrorKind::InvalidInput, e);
        let to = CString::new(target).map_err(invalid)?;
        let from = CString::new(source).map_err(invalid)?;

        // SAFETY: both arguments are valid NUL-terminated strings that outlive the call.
        let cd = unsafe { libc::iconv_open(to.as_ptr(), from.as_ptr()) };
        // iconv_open signals failure with (iconv_t)-1
        if cd as isize == -1 {
            return Err(io::Error::last_os_error());
        }

        debug!(to = target, from = source, "opened iconv descriptor");
        Ok(Self {
            cd,
            ignore: skips_invalid(target),
        })
    }

    fn last_errno() -> i32 {
        io::Error::last_os_error().raw_os_error().unwrap_or(0)
    }
}

/// Whether the target carries an `IGNORE` flag, in any case and in either the
/// `//TRANSLIT//IGNORE` or the `//TRANSLIT,IGNORE` spelling
fn skips_invalid(target: &str) -> bool {
    target
        .split("//")
        .skip(1)
        .flat_map(|flags| flags.split(','))
        .any(|flag| flag.eq_ignore_ascii_case("IGNORE"))
}

impl ConversionEngine for IconvEngine {
    fn convert(&mut self, input: &[u8], output: &mut [u8]) -> Result<Progress, Fault> {
        let mut in_ptr = input.as_ptr() as *mut libc::c_char;
        let mut in_left = input.len();
        let mut out_ptr = output.as_mut_ptr() as *mut libc::c_char;
        let mut out_left = output.len();

        // SAFETY: iconv reads at most `in_left` bytes from `in_ptr` and writes at
        // most `out_left` bytes through `out_ptr`, both taken from live slices.
        // The input is never written despite the `*mut` in the signature.
        let ret = unsafe {
            libc::iconv(
                self.cd,
                &mut in_ptr,
                &mut in_left,
                &mut out_ptr,
                &mut out_left,
            )
        };

        let progress = Progress {
            consumed: input.len() - in_left,
            produced: output.len() - out_left,
        };
        if ret != CONVERSION_FAILED {
            return Ok(progress);
        }

        let code = Self::last_errno();
        // glibc reports EILSEQ after skipping invalid input under //IGNORE
        if self.ignore && code == libc::EILSEQ && progress.consumed > 0 {
            return Ok(progress);
        }
        Err(Fault::new(code).with_progress(progress))
    }

    fn finish(&mut self, output: &mut [u8]) -> Result<usize, Fault> {
        let mut out_ptr = output.as_mut_ptr() as *mut libc::c_char;
        let mut out_left = output.len();

        // SAFETY: a null input buffer asks iconv to write the reset sequence,
        // bounded by `out_left` bytes of the live output slice.
        let ret = unsafe {
            libc::iconv(
                self.cd,
                ptr::null_mut(),
                ptr::null_mut(),
                &mut out_ptr,
                &mut out_left,
            )
        };

        let produced = output.len() - out_left;
        if ret == CONVERSION_FAILED {
            return Err(Fault::new(Self::last_errno()).with_progress(Progress {
                consumed: 0,
                produced,
            }));
        }
        Ok(produced)
    }

    fn reset(&mut self) {
        // SAFETY: all-null buffers only reset the descriptor's shift state.
        unsafe {
            libc::iconv(
                self.cd,
                ptr::null_mut(),
                ptr::null_mut(),
                ptr::null_mut(),
                ptr::null_mut(),
            );
        }
    }
}

impl Drop for IconvEngine {
    fn drop(&mut self) {
        // SAFETY: `cd` came from a successful iconv_open and is closed only here.
        unsafe {
            libc::iconv_close(self.cd);
        }
        debug!("closed iconv descriptor");
    }
}
