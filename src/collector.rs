use std::collections::HashSet;

use crate::presenter::sort_solutions;
use crate::protocol::{SearchIndex, Solution};

/// Outcome of offering a solution to a [`SolutionSet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Accepted { rank: usize },
    /// The entry that filled the set. Returned once per set.
    Completed { rank: usize },
    Duplicate,
    Full,
}

impl Admission {
    pub fn rank(&self) -> Option<usize> {
        match *self {
            Admission::Accepted { rank } | Admission::Completed { rank } => Some(rank),
            Admission::Duplicate | Admission::Full => None,
        }
    }
}

/// Accumulates at most `capacity` solutions, deduplicated by index, in
/// arrival order.
#[derive(Debug)]
pub struct SolutionSet {
    capacity: usize,
    entries: Vec<Solution>,
    seen: HashSet<SearchIndex>,
}

impl SolutionSet {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            entries: Vec::with_capacity(capacity),
            seen: HashSet::with_capacity(capacity),
        }
    }

    pub fn offer(&mut self, solution: Solution) -> Admission {
        if self.is_full() {
            return Admission::Full;
        }
        if !self.seen.insert(solution.index) {
            return Admission::Duplicate;
        }

        self.entries.push(solution);
        let rank = self.entries.len();
        if self.is_full() {
            Admission::Completed { rank }
        } else {
            Admission::Accepted { rank }
        }
    }

    pub fn is_full(&self) -> bool {
        self.entries.len() >= self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn arrivals(&self) -> &[Solution] {
        &self.entries
    }

    pub fn into_sorted(self) -> Vec<Solution> {
        sort_solutions(self.entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solution(index: u64) -> Solution {
        Solution::new(index, format!("desafio{}", index))
    }

    #[test]
    fn test_completes_exactly_at_capacity() {
        let mut set = SolutionSet::with_capacity(3);
        assert_eq!(set.offer(solution(100)), Admission::Accepted { rank: 1 });
        assert_eq!(set.offer(solution(5)), Admission::Accepted { rank: 2 });
        assert!(!set.is_full());
        assert_eq!(set.offer(solution(42)), Admission::Completed { rank: 3 });
        assert!(set.is_full());

        // Late arrivals past the cap are ignored.
        assert_eq!(set.offer(solution(7)), Admission::Full);
        assert_eq!(set.offer(solution(8)), Admission::Full);
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn test_duplicates_do_not_count() {
        let mut set = SolutionSet::with_capacity(2);
        assert_eq!(set.offer(solution(9)), Admission::Accepted { rank: 1 });
        assert_eq!(set.offer(solution(9)), Admission::Duplicate);
        assert_eq!(set.len(), 1);
        assert_eq!(set.offer(solution(10)), Admission::Completed { rank: 2 });
    }

    #[test]
    fn test_only_admitted_entries_have_a_rank() {
        assert_eq!(Admission::Accepted { rank: 4 }.rank(), Some(4));
        assert_eq!(Admission::Completed { rank: 7 }.rank(), Some(7));
        assert_eq!(Admission::Duplicate.rank(), None);
        assert_eq!(Admission::Full.rank(), None);
    }

    #[test]
    fn test_zero_capacity_is_full() {
        let mut set = SolutionSet::with_capacity(0);
        assert!(set.is_full());
        assert!(set.is_empty());
        assert_eq!(set.offer(solution(1)), Admission::Full);
    }

    #[test]
    fn test_into_sorted_orders_by_index() {
        let mut set = SolutionSet::with_capacity(3);
        for index in [100, 5, 42] {
            set.offer(solution(index));
        }
        assert_eq!(set.arrivals()[0].index, 100);
        let sorted: Vec<u64> = set.into_sorted().iter().map(|s| s.index).collect();
        assert_eq!(sorted, vec![5, 42, 100]);
    }
}
