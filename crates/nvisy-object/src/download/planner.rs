//! Partitioning of an object into ranged reads.

use std::iter::FusedIterator;
use std::num::NonZeroU64;

use crate::types::ByteRange;

/// Ordered, non-overlapping ranges covering `[0, length)`.
///
/// Every range is `part_size` bytes long except the last one, which holds the
/// remainder. An empty object yields no ranges.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangePlan {
    length: u64,
    part_size: u64,
    offset: u64,
}

impl RangePlan {
    /// Plans the reads for an object of `length` bytes.
    pub fn new(length: u64, part_size: NonZeroU64) -> Self {
        Self {
            length,
            part_size: part_size.get(),
            offset: 0,
        }
    }

    /// Total object length covered by the plan.
    #[inline]
    pub fn length(&self) -> u64 {
        self.length
    }

    /// Number of ranges in the full plan (`ceil(length / part_size)`).
    pub fn range_count(&self) -> u64 {
        self.length.div_ceil(self.part_size)
    }
}

impl Iterator for RangePlan {
    type Item = ByteRange;

    fn next(&mut self) -> Option<ByteRange> {
        if self.offset >= self.length {
            return None;
        }
        let size = self.part_size.min(self.length - self.offset);
        let range = ByteRange::with_size(self.offset, size);
        self.offset += size;
        Some(range)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.length - self.offset).div_ceil(self.part_size);
        match usize::try_from(remaining) {
            Ok(n) => (n, Some(n)),
            Err(_) => (usize::MAX, None),
        }
    }
}

impl FusedIterator for RangePlan {}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan(length: u64, part_size: u64) -> Vec<ByteRange> {
        RangePlan::new(length, NonZeroU64::new(part_size).unwrap()).collect()
    }

    #[test]
    fn empty_object_has_no_ranges() {
        assert!(plan(0, 16).is_empty());
        assert_eq!(RangePlan::new(0, NonZeroU64::MIN).range_count(), 0);
    }

    #[test]
    fn exact_multiple_has_full_last_range() {
        let ranges = plan(48, 16);
        assert_eq!(ranges, vec![
            ByteRange { start: 0, end: 15 },
            ByteRange { start: 16, end: 31 },
            ByteRange { start: 32, end: 47 },
        ]);
    }

    #[test]
    fn remainder_goes_to_last_range() {
        let ranges = plan(50, 16);
        assert_eq!(ranges.len(), 4);
        assert_eq!(ranges[3], ByteRange { start: 48, end: 49 });
    }

    #[test]
    fn ranges_partition_the_object() {
        for length in [1u64, 2, 7, 15, 16, 17, 31, 32, 33, 100, 1000] {
            for part_size in [1u64, 3, 16, 64, 2000] {
                let ranges = plan(length, part_size);
                let expected = length.div_ceil(part_size);
                assert_eq!(ranges.len() as u64, expected, "L={length} P={part_size}");

                let mut next = 0;
                for range in &ranges {
                    assert_eq!(range.start, next);
                    assert!(range.size() <= part_size);
                    next = range.end + 1;
                }
                assert_eq!(next, length);

                let last = ranges.last().unwrap();
                assert_eq!(last.size(), length - part_size * (expected - 1));
            }
        }
    }

    #[test]
    fn planning_is_deterministic() {
        assert_eq!(plan(12345, 100), plan(12345, 100));
    }

    #[test]
    fn size_hint_tracks_progress() {
        let mut ranges = RangePlan::new(40, NonZeroU64::new(16).unwrap());
        assert_eq!(ranges.size_hint(), (3, Some(3)));
        ranges.next();
        assert_eq!(ranges.size_hint(), (2, Some(2)));
        ranges.by_ref().for_each(drop);
        assert_eq!(ranges.size_hint(), (0, Some(0)));
        assert_eq!(ranges.next(), None);
    }
}
