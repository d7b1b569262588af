//! Re-chunking of an input stream into fixed-size parts.

use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::TRACING_TARGET_UPLOAD;
use crate::types::{Error, Result};

/// One part ready for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Part {
    /// 1-based part number.
    pub number: u32,
    /// Part contents; never longer than the configured part size.
    pub data: Bytes,
}

/// Accumulates reads from `source` into parts of exactly `part_size` bytes.
///
/// The source is read `read_increment` bytes at a time, and no read asks for
/// more than the part still has room for, so a part never exceeds
/// `part_size`. Only the last part may be shorter. An empty source yields a
/// single empty part.
#[derive(Debug)]
pub struct PartBuffer<R> {
    source: R,
    part_size: usize,
    read_increment: usize,
    max_parts: u32,
    parts_emitted: u32,
    total_read: u64,
    finished: bool,
}

impl<R> PartBuffer<R>
where
    R: AsyncRead + Unpin,
{
    /// Creates a buffer over `source`.
    ///
    /// `part_size` and `read_increment` must be non-zero.
    pub fn new(source: R, part_size: usize, read_increment: usize, max_parts: u32) -> Self {
        debug_assert!(part_size > 0 && read_increment > 0);
        Self {
            source,
            part_size,
            read_increment,
            max_parts,
            parts_emitted: 0,
            total_read: 0,
            finished: false,
        }
    }

    /// Bytes consumed from the source so far.
    #[inline]
    pub fn total_read(&self) -> u64 {
        self.total_read
    }

    /// Number of parts returned so far.
    #[inline]
    pub fn parts_emitted(&self) -> u32 {
        self.parts_emitted
    }

    /// Returns the next part, or `None` once the source is exhausted.
    ///
    /// Fails with [`Error::TooManyParts`] as soon as the source yields a byte
    /// that would need a part beyond the ceiling.
    pub async fn next_part(&mut self) -> Result<Option<Part>> {
        if self.finished {
            return Ok(None);
        }

        let number = self.parts_emitted + 1;
        let mut arena = BytesMut::with_capacity(self.part_size);

        while arena.len() < self.part_size {
            let want = self.read_increment.min(self.part_size - arena.len());
            let n = (&mut self.source)
                .take(want as u64)
                .read_buf(&mut arena)
                .await
                .map_err(|source| Error::ReadSource {
                    part_number: number,
                    source,
                })?;

            if n == 0 {
                self.finished = true;
                break;
            }

            self.total_read += n as u64;
            if number > self.max_parts {
                return Err(Error::TooManyParts {
                    max_parts: self.max_parts,
                    part_size: self.part_size as u64,
                });
            }
        }

        if self.finished && arena.is_empty() && self.parts_emitted > 0 {
            return Ok(None);
        }

        self.parts_emitted = number;
        tracing::trace!(
            target: TRACING_TARGET_UPLOAD,
            part_number = number,
            size = arena.len(),
            "buffered part"
        );

        Ok(Some(Part {
            number,
            data: arena.freeze(),
        }))
    }
}
