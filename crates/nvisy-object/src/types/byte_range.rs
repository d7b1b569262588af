//! Inclusive byte ranges used for ranged reads.

use std::ops::Range;

use derive_more::Display;

/// An inclusive byte interval `[start, end]` of a remote object.
///
/// Renders as an HTTP range specifier (`bytes=<start>-<end>`).
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash)]
#[display("bytes={start}-{end}")]
pub struct ByteRange {
    /// First byte offset (inclusive).
    pub start: u64,
    /// Last byte offset (inclusive).
    pub end: u64,
}

impl ByteRange {
    /// Creates a range covering `size` bytes starting at `start`.
    ///
    /// `size` must be non-zero.
    pub fn with_size(start: u64, size: u64) -> Self {
        debug_assert!(size > 0, "byte ranges are never empty");
        Self {
            start,
            end: start + size - 1,
        }
    }

    /// Number of bytes covered by this range.
    #[inline]
    pub fn size(&self) -> u64 {
        self.end - self.start + 1
    }

    /// Returns the equivalent half-open range `start..end + 1`.
    #[inline]
    pub fn as_range(&self) -> Range<u64> {
        self.start..self.end + 1
    }
}
