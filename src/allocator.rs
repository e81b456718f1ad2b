use crate::protocol::{Range, SearchIndex};

/// Hands out consecutive, non-overlapping ranges from a single cursor.
///
/// Owned by the coordinator loop; every grant goes through `&mut self`, so
/// grants are totally ordered without a lock.
#[derive(Debug, Default)]
pub struct RangeAllocator {
    next_start: SearchIndex,
    grants_issued: u64,
}

impl RangeAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allocate(&mut self, requested_step: u64) -> Range {
        let range = Range::new(self.next_start, requested_step);
        self.next_start = self.next_start.saturating_add(requested_step);
        self.grants_issued += 1;
        range
    }

    /// Everything below this index has been granted.
    pub fn next_start(&self) -> SearchIndex {
        self.next_start
    }

    pub fn grants_issued(&self) -> u64 {
        self.grants_issued
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_grant_starts_at_zero() {
        let mut allocator = RangeAllocator::new();
        assert_eq!(allocator.allocate(10_000), Range::new(0, 10_000));
        assert_eq!(allocator.next_start(), 10_000);
        assert_eq!(allocator.grants_issued(), 1);
    }

    #[test]
    fn test_grants_are_disjoint_prefix() {
        let mut allocator = RangeAllocator::new();
        let steps = [7u64, 1, 40_000, 3, 10_000, 1, 1, 250];
        let mut grants = Vec::new();

        for step in steps {
            let grant = allocator.allocate(step);
            // Each grant starts exactly where the covered prefix ends.
            let covered: u64 = grants.iter().map(|g: &Range| g.length).sum();
            assert_eq!(grant.start, covered);
            grants.push(grant);
        }

        for (i, a) in grants.iter().enumerate() {
            for b in grants.iter().skip(i + 1) {
                assert!(!a.overlaps(b), "{:?} overlaps {:?}", a, b);
                assert!(a.start < b.start);
            }
        }

        assert_eq!(allocator.next_start(), steps.iter().sum::<u64>());
        assert_eq!(allocator.grants_issued(), steps.len() as u64);
    }

    #[test]
    fn test_cursor_saturates() {
        let mut allocator = RangeAllocator::new();
        allocator.allocate(u64::MAX - 5);
        let tail = allocator.allocate(100);
        assert_eq!(tail.start, u64::MAX - 5);
        assert_eq!(allocator.next_start(), u64::MAX);
    }
}
