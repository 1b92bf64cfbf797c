//! The streaming conversion loop
//!
//! Each iteration reads one chunk into the tail of the read buffer, hands the
//! whole buffer to the engine, writes what it produced and moves whatever it
//! left unconsumed to the front. An incomplete multi-byte unit at the end of a
//! chunk therefore survives until the next read completes it.

use std::io::{Read, Write};

use serde::Serialize;
use tracing::{debug, trace};

use crate::buffer::{ReadBuffer, WriteBuffer};
use crate::classify::FailureKind;
use crate::config::{OverflowPolicy, PumpConfig};
use crate::engine::{ConversionEngine, Progress};
use crate::{Error, Result};

/// Statistics of a completed conversion
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    /// Bytes read from the source
    pub bytes_read: u64,
    /// Bytes written to the sink
    pub bytes_written: u64,
    /// Read/convert cycles performed
    pub iterations: u64,
}

pub(crate) struct Pump {
    read: ReadBuffer,
    write: WriteBuffer,
    policy: OverflowPolicy,
    /// Source offset of the first byte in the read buffer
    consumed: u64,
    summary: Summary,
}

impl Pump {
    pub(crate) fn new(config: &PumpConfig) -> Self {
        Self {
            read: ReadBuffer::with_capacity(config.read_capacity),
            write: WriteBuffer::with_capacity(config.write_capacity),
            policy: config.on_overflow,
            consumed: 0,
            summary: Summary::default(),
        }
    }

    /// Drive `engine` until `source` is exhausted and nothing is left over.
    pub(crate) fn run<E, W, R>(
        mut self,
        engine: &mut E,
        sink: &mut W,
        source: &mut R,
    ) -> Result<Summary>
    where
        E: ConversionEngine + ?Sized,
        W: Write + ?Sized,
        R: Read + ?Sized,
    {
        engine.reset();

        loop {
            let read = self.read.fill_from(source)?;
            self.summary.bytes_read += read as u64;

            let at_end = read == 0;
            if at_end && self.read.is_empty() {
                break;
            }

            self.summary.iterations += 1;
            self.convert_buffered(engine, sink, at_end)?;
            trace!(
                read,
                residual = self.read.len(),
                consumed = self.consumed,
                "pump iteration"
            );

            if at_end {
                if !self.read.is_empty() {
                    return Err(Error::IncompleteSequence {
                        offset: self.consumed,
                    });
                }
                break;
            }
            // A unit longer than the whole buffer can never complete
            if self.read.is_full() {
                return Err(Error::IncompleteSequence {
                    offset: self.consumed,
                });
            }
        }

        self.finish(engine, sink)?;
        sink.flush()?;

        debug!(
            bytes_read = self.summary.bytes_read,
            bytes_written = self.summary.bytes_written,
            iterations = self.summary.iterations,
            "conversion finished"
        );
        Ok(self.summary)
    }

    /// Convert what the read buffer holds.
    ///
    /// Stops when the buffer is drained, when the engine asks for more input,
    /// or with a terminal error.
    fn convert_buffered<E, W>(
        &mut self,
        engine: &mut E,
        sink: &mut W,
        at_end: bool,
    ) -> Result<()>
    where
        E: ConversionEngine + ?Sized,
        W: Write + ?Sized,
    {
        while !self.read.is_empty() {
            let step = engine.convert(self.read.filled(), self.write.space());
            let (progress, failure) = match step {
                Ok(progress) => (progress, None),
                Err(fault) => (fault.progress(), Some(FailureKind::from_errno(fault.code))),
            };

            match failure {
                None => {}
                Some(FailureKind::IncompleteSequence) if !at_end => {}
                Some(FailureKind::OutputBufferFull)
                    if self.policy == OverflowPolicy::FlushAndRetry && progress.consumed > 0 => {}
                Some(kind) => {
                    return Err(kind.into_error(self.consumed + progress.consumed as u64));
                }
            }

            self.commit(sink, progress)?;

            match failure {
                None if progress.consumed > 0 => continue,
                Some(FailureKind::OutputBufferFull) => continue,
                _ => return Ok(()),
            }
        }
        Ok(())
    }

    fn commit<W: Write + ?Sized>(&mut self, sink: &mut W, progress: Progress) -> Result<()> {
        self.write.drain_to(sink, progress.produced)?;
        self.read.consume(progress.consumed);
        self.consumed += progress.consumed as u64;
        self.summary.bytes_written += progress.produced as u64;
        Ok(())
    }

    /// Flush the engine's shift state after the last input byte
    fn finish<E, W>(&mut self, engine: &mut E, sink: &mut W) -> Result<()>
    where
        E: ConversionEngine + ?Sized,
        W: Write + ?Sized,
    {
        match engine.finish(self.write.space()) {
            Ok(produced) => self.commit(
                sink,
                Progress {
                    consumed: 0,
                    produced,
                },
            ),
            Err(fault) => Err(FailureKind::from_errno(fault.code).into_error(self.consumed)),
        }
    }
}
