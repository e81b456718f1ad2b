//! Message alphabet exchanged between the coordinator and its workers.
//!
//! Signals travel over channels in their raw [`ControlSignal`] form and are
//! decoded exactly once on arrival, into [`Inbound`] on the coordinator side and
//! into [`Directive`] on the worker side.

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type SearchIndex = u64;

/// Workers are numbered from 1; participant 0 is the coordinator.
pub type WorkerId = usize;

/// Half-open interval `[start, start + length)` of search indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Range {
    pub start: SearchIndex,
    pub length: u64,
}

impl Range {
    pub fn new(start: SearchIndex, length: u64) -> Self {
        Self { start, length }
    }

    /// Exclusive upper bound, clamped to the index space.
    pub fn end(&self) -> SearchIndex {
        self.start.saturating_add(self.length)
    }

    pub fn indices(&self) -> std::ops::Range<SearchIndex> {
        self.start..self.end()
    }

    pub fn overlaps(&self, other: &Range) -> bool {
        self.start < other.end() && other.start < self.end()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Solution {
    pub index: SearchIndex,
    pub text: String,
}

impl Solution {
    pub fn new(index: SearchIndex, text: String) -> Self {
        Self { index, text }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ControlSignal {
    RangeRequest { step: u64 },
    /// Length is implicit: it equals the step of the pending request.
    RangeGrant { start: SearchIndex },
    /// The index is carried as decimal text.
    SolutionReport { text: String, index: String },
    Stop,
}

impl ControlSignal {
    pub fn kind(&self) -> &'static str {
        match self {
            ControlSignal::RangeRequest { .. } => "RangeRequest",
            ControlSignal::RangeGrant { .. } => "RangeGrant",
            ControlSignal::SolutionReport { .. } => "SolutionReport",
            ControlSignal::Stop => "Stop",
        }
    }

    pub fn report(solution: Solution) -> Self {
        ControlSignal::SolutionReport {
            text: solution.text,
            index: solution.index.to_string(),
        }
    }
}

/// A signal tagged with the worker that sent it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub from: WorkerId,
    pub signal: ControlSignal,
}

impl Envelope {
    pub fn new(from: WorkerId, signal: ControlSignal) -> Self {
        Self { from, signal }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("unexpected {kind} signal from participant {from} on the {channel} channel")]
    UnexpectedSignal {
        from: WorkerId,
        kind: &'static str,
        channel: &'static str,
    },
    #[error("malformed solution index {text:?} from worker {from}")]
    MalformedIndex { from: WorkerId, text: String },
    #[error("signal from unknown worker {worker}")]
    UnknownWorker { worker: WorkerId },
}

/// Decoded worker-to-coordinator event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    Request { worker: WorkerId, step: u64 },
    Report { worker: WorkerId, solution: Solution },
}

impl Inbound {
    pub fn decode(envelope: Envelope) -> Result<Self, ProtocolError> {
        let Envelope { from, signal } = envelope;
        match signal {
            ControlSignal::RangeRequest { step } => Ok(Inbound::Request { worker: from, step }),
            ControlSignal::SolutionReport { text, index } => {
                let index = index
                    .trim()
                    .parse::<SearchIndex>()
                    .map_err(|_| ProtocolError::MalformedIndex { from, text: index.clone() })?;
                Ok(Inbound::Report {
                    worker: from,
                    solution: Solution::new(index, text),
                })
            }
            other => Err(ProtocolError::UnexpectedSignal {
                from,
                kind: other.kind(),
                channel: "coordinator inbound",
            }),
        }
    }
}

/// Decoded coordinator-to-worker instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive {
    Grant(Range),
    Stop,
}

impl Directive {
    /// `requested_step` is the step the worker asked for; grants carry only a start.
    pub fn decode(signal: ControlSignal, requested_step: u64) -> Result<Self, ProtocolError> {
        match signal {
            ControlSignal::RangeGrant { start } => Ok(Directive::Grant(Range::new(start, requested_step))),
            ControlSignal::Stop => Ok(Directive::Stop),
            other => Err(ProtocolError::UnexpectedSignal {
                from: 0,
                kind: other.kind(),
                channel: "worker inbound",
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_bounds() {
        let range = Range::new(10, 5);
        assert_eq!(range.end(), 15);
        assert_eq!(range.indices().count(), 5);
        assert_eq!(range.indices().next(), Some(10));

        let saturated = Range::new(u64::MAX - 1, 10);
        assert_eq!(saturated.end(), u64::MAX);
        assert_eq!(saturated.indices().count(), 1);
        assert_eq!(Range::new(3, 0).indices().count(), 0);
    }

    #[test]
    fn test_range_overlap() {
        let a = Range::new(0, 10);
        assert!(!a.overlaps(&Range::new(10, 10)));
        assert!(a.overlaps(&Range::new(9, 1)));
        assert!(Range::new(5, 1).overlaps(&a));
    }

    #[test]
    fn test_decode_report_parses_index_text() {
        let envelope = Envelope::new(
            2,
            ControlSignal::report(Solution::new(42, "desafio42".to_string())),
        );
        assert_eq!(
            Inbound::decode(envelope),
            Ok(Inbound::Report {
                worker: 2,
                solution: Solution::new(42, "desafio42".to_string()),
            })
        );
    }

    #[test]
    fn test_decode_rejects_malformed_index() {
        let envelope = Envelope::new(
            1,
            ControlSignal::SolutionReport {
                text: "desafio?".to_string(),
                index: "forty-two".to_string(),
            },
        );
        assert!(matches!(
            Inbound::decode(envelope),
            Err(ProtocolError::MalformedIndex { from: 1, .. })
        ));
    }

    #[test]
    fn test_decode_rejects_wrong_direction() {
        let envelope = Envelope::new(3, ControlSignal::Stop);
        assert!(matches!(
            Inbound::decode(envelope),
            Err(ProtocolError::UnexpectedSignal { from: 3, kind: "Stop", .. })
        ));

        let request = ControlSignal::RangeRequest { step: 10 };
        assert!(Directive::decode(request, 10).is_err());
    }

    #[test]
    fn test_grant_length_comes_from_request() {
        let directive = Directive::decode(ControlSignal::RangeGrant { start: 40_000 }, 40_000).unwrap();
        assert_eq!(directive, Directive::Grant(Range::new(40_000, 40_000)));
        assert_eq!(Directive::decode(ControlSignal::Stop, 1).unwrap(), Directive::Stop);
    }
}
