use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::time::Duration;

use crate::oracle::{DigestOracle, digest_hex};
use crate::protocol::{Solution, WorkerId};

/// Orders solutions by ascending index. Stable, so equal indices keep arrival order.
pub fn sort_solutions(mut solutions: Vec<Solution>) -> Vec<Solution> {
    solutions.sort_by_key(|s| s.index);
    solutions
}

/// Line printed by the coordinator as each solution is collected.
pub fn format_collected(rank: usize, worker: WorkerId, solution: &Solution) -> String {
    format!(
        "{:2}) \"{}\" (idx={}) from worker {}",
        rank, solution.text, solution.index, worker
    )
}

pub fn format_sorted(rank: usize, solution: &Solution) -> String {
    format!("{:2}) {}  (idx={})", rank, solution.text, solution.index)
}

/// Machine-readable `<workers>,<seconds>` line used for benchmarking runs.
pub fn format_benchmark_line(workers: usize, elapsed: Duration) -> String {
    format!("{},{:.6}", workers, elapsed.as_secs_f64())
}

pub fn print_sorted_solutions(solutions: &[Solution]) {
    for (i, solution) in solutions.iter().enumerate() {
        println!("{}", format_sorted(i + 1, solution));
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedSolution {
    pub rank: usize,
    pub index: u64,
    pub text: String,
    pub digest_hex: String,
}

/// Summary of a finished run, written as JSON with `--report`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchReport {
    pub mode: String,
    pub total_solutions: usize,
    pub target_zero_bits: u32,
    pub workers: usize,
    pub compute_lanes: usize,
    pub step: Option<u64>,
    pub grants_issued: Option<u64>,
    pub indices_covered: u64,
    pub elapsed_seconds: f64,
    pub solutions: Vec<RankedSolution>,
}

/// Attaches rank and digest to already sorted solutions.
pub fn rank_solutions(solutions: &[Solution], oracle: &dyn DigestOracle) -> Vec<RankedSolution> {
    solutions
        .iter()
        .enumerate()
        .map(|(i, s)| RankedSolution {
            rank: i + 1,
            index: s.index,
            text: s.text.clone(),
            digest_hex: digest_hex(&oracle.digest(&s.text)),
        })
        .collect()
}

pub fn save_report_to_file(report: &SearchReport, filename: &str) -> Result<()> {
    let json = serde_json::to_string_pretty(report)?;
    fs::write(filename, json)?;
    log::info!("Search report saved to: {}", filename);
    Ok(())
}
