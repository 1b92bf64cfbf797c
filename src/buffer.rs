//! Fixed-capacity scratch buffers used by the pump

use std::io::{self, Read, Write};

/// Input staging area
///
/// Holds a residual prefix the engine has not consumed yet, followed by
/// freshly read bytes. `len` never exceeds the capacity.
#[derive(Debug)]
pub(crate) struct ReadBuffer {
    buf: Box<[u8]>,
    len: usize,
}

impl ReadBuffer {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: vec![0u8; capacity].into_boxed_slice(),
            len: 0,
        }
    }

    /// Bytes currently held
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub(crate) fn is_full(&self) -> bool {
        self.len == self.buf.len()
    }

    pub(crate) fn filled(&self) -> &[u8] {
        &self.buf[..self.len]
    }

    /// Read once from `source` into the free tail.
    ///
    /// Returns the number of bytes added; zero means end of stream (or a full
    /// buffer). Interrupted reads are retried.
    pub(crate) fn fill_from<R: Read + ?Sized>(&mut self, source: &mut R) -> io::Result<usize> {
        if self.is_full() {
            return Ok(0);
        }
        loop {
            match source.read(&mut self.buf[self.len..]) {
                Ok(n) => {
                    self.len += n;
                    return Ok(n);
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }

    /// Drop `n` bytes from the front and move the rest down.
    ///
    /// Panics if `n` exceeds the held length.
    pub(crate) fn consume(&mut self, n: usize) {
        assert!(
            n <= self.len,
            "engine consumed {} bytes of a {} byte input",
            n,
            self.len
        );
        self.buf.copy_within(n..self.len, 0);
        self.len -= n;
    }
}

/// Output scratch area for a single engine call
#[derive(Debug)]
pub(crate) struct WriteBuffer {
    buf: Box<[u8]>,
}

impl WriteBuffer {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: vec![0u8; capacity].into_boxed_slice(),
        }
    }

    pub(crate) fn space(&mut self) -> &mut [u8] {
        &mut self.buf
    }

    /// Write the first `produced` bytes to `sink`.
    ///
    /// Panics if `produced` exceeds the capacity.
    pub(crate) fn drain_to<W: Write + ?Sized>(
        &self,
        sink: &mut W,
        produced: usize,
    ) -> io::Result<()> {
        assert!(
            produced <= self.buf.len(),
            "engine produced {} bytes into a {} byte buffer",
            produced,
            self.buf.len()
        );
        if produced > 0 {
            sink.write_all(&self.buf[..produced])?;
        }
        Ok(())
    }
}
