//! Dense indices, sentinels, and table ranges used by the compiled blob.
//!
//! Every cross-reference in a RuntimeBlob is a dense u32 index into one of
//! its flat tables. Optional slots use max-value sentinels instead of Option
//! so the tables stay flat and copyable.

use serde::{Deserialize, Serialize};

/// Sentinel meaning "no parameter bound" for optional parameter slots.
pub const NO_PARAM: u32 = u32::MAX;
/// Sentinel meaning "no state": the exit marker on transitions and the
/// default-state slot of an empty machine.
pub const NO_STATE: u32 = u32::MAX;
/// Sentinel meaning "no bone mask" on a compiled layer.
pub const NO_MASK: u32 = u32::MAX;
/// Sentinel meaning "no transition" (absent any-state-exit slot).
pub const NO_TRANSITION: u32 = u32::MAX;

/// Half-open range into one of the blob's flat tables.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct IndexRange {
    pub start: u32,
    pub count: u32,
}

impl IndexRange {
    pub const EMPTY: IndexRange = IndexRange { start: 0, count: 0 };

    pub fn new(start: usize, count: usize) -> Self {
        Self {
            start: start as u32,
            count: count as u32,
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.count as usize
    }

    #[inline]
    pub fn as_range(&self) -> core::ops::Range<usize> {
        let start = self.start as usize;
        start..start + self.count as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_basics() {
        let r = IndexRange::new(3, 2);
        assert_eq!(r.as_range(), 3..5);
        assert_eq!(r.len(), 2);
        assert!(!r.is_empty());
        assert!(IndexRange::EMPTY.is_empty());
    }
}
