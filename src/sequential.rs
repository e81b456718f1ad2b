use indicatif::ProgressBar;
use std::time::{Duration, Instant};

use crate::config::SearchConfig;
use crate::oracle::{DigestOracle, candidate_text};
use crate::protocol::Solution;

#[derive(Debug, Clone)]
pub struct SequentialOutcome {
    /// In discovery order, which is ascending index order.
    pub solutions: Vec<Solution>,
    pub indices_checked: u64,
    pub elapsed: Duration,
}

/// Single-threaded baseline: tests indices 0, 1, 2, ... until
/// `total_solutions` hits are found.
pub fn search_sequential<O>(
    search: &SearchConfig,
    oracle: &O,
    progress_bar: Option<ProgressBar>,
) -> SequentialOutcome
where
    O: DigestOracle + ?Sized,
{
    let start_time = Instant::now();
    let mut solutions = Vec::with_capacity(search.total_solutions);
    let mut index = 0u64;
    let mut local_count = 0u64;

    while solutions.len() < search.total_solutions {
        let text = candidate_text(&search.prefix, index);
        if oracle.is_hit(&text, search.target_zero_bits) {
            log::debug!("found: {}", text);
            solutions.push(Solution::new(index, text));
            if let Some(ref pb) = progress_bar {
                pb.set_message(format!("{}/{} solutions", solutions.len(), search.total_solutions));
            }
        }

        index += 1;
        local_count += 1;

        if local_count % 10000 == 0 {
            if let Some(ref pb) = progress_bar {
                pb.inc(local_count);
            }
            local_count = 0;
        }
    }

    if let Some(ref pb) = progress_bar {
        pb.inc(local_count);
        pb.finish();
    }

    SequentialOutcome {
        solutions,
        indices_checked: index,
        elapsed: start_time.elapsed(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::{DIGEST_LEN, Digest, Sha256Oracle, has_leading_zero_bits};

    struct HitsAt(Vec<u64>);

    impl DigestOracle for HitsAt {
        fn digest(&self, input: &str) -> Digest {
            let hit = self.0.iter().any(|&i| candidate_text("desafio", i) == input);
            if hit { [0u8; DIGEST_LEN] } else { [0x80u8; DIGEST_LEN] }
        }
    }

    #[test]
    fn test_stub_oracle_scenario() {
        let outcome = search_sequential(&SearchConfig::new(3, 8), &HitsAt(vec![100, 5, 42]), None);
        assert_eq!(
            outcome.solutions,
            vec![
                Solution::new(5, "desafio5".to_string()),
                Solution::new(42, "desafio42".to_string()),
                Solution::new(100, "desafio100".to_string()),
            ]
        );
        assert_eq!(outcome.indices_checked, 101);
    }

    #[test]
    fn test_zero_solutions_checks_nothing() {
        let outcome = search_sequential(&SearchConfig::new(0, 8), &Sha256Oracle, None);
        assert!(outcome.solutions.is_empty());
        assert_eq!(outcome.indices_checked, 0);
    }

    #[test]
    fn test_real_digest_hits_are_valid() {
        let search = SearchConfig::new(4, 6);
        let outcome = search_sequential(&search, &Sha256Oracle, Some(ProgressBar::hidden()));
        assert_eq!(outcome.solutions.len(), 4);
        for pair in outcome.solutions.windows(2) {
            assert!(pair[0].index < pair[1].index);
        }
        for s in &outcome.solutions {
            assert!(has_leading_zero_bits(&Sha256Oracle.digest(&s.text), 6));
        }
    }
}
