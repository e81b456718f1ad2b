//! Distributed search for indices whose `prefix + index` digest starts with a
//! given number of zero bits.
//!
//! A coordinator hands out disjoint ranges on demand to a fixed pool of
//! workers. Each worker scans its grant on a rayon pool and reports hits as it
//! finds them; the coordinator stops the pool once enough distinct solutions
//! are in.

pub mod allocator;
pub mod cli;
pub mod collector;
pub mod config;
pub mod coordinator;
pub mod oracle;
pub mod presenter;
pub mod protocol;
pub mod sequential;
pub mod worker;

pub use config::{ParallelConfig, SearchConfig};
pub use coordinator::{DistributedOutcome, run_distributed};
pub use oracle::{DigestOracle, Sha256Oracle};
pub use protocol::{Range, Solution};
pub use sequential::{SequentialOutcome, search_sequential};
