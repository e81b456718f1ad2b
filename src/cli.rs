//! Command-line surface shared by the three binaries.

use anyhow::{Result, anyhow};
use clap::{Arg, ArgAction, ArgMatches, Command, value_parser};
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;

use crate::config::{ParallelConfig, SearchConfig};
use crate::coordinator::run_distributed;
use crate::oracle::{DEFAULT_PREFIX, DIGEST_LEN, Sha256Oracle};
use crate::presenter::{
    SearchReport, format_benchmark_line, format_collected, print_sorted_solutions, rank_solutions,
    save_report_to_file,
};
use crate::sequential::search_sequential;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variant {
    Sequential,
    Distributed,
    Tuned,
}

#[derive(Debug, Clone)]
pub struct CliOptions {
    pub search: SearchConfig,
    /// `None` for the sequential variant.
    pub parallel: Option<ParallelConfig>,
    pub report: Option<String>,
    pub progress: bool,
}

pub fn build_command(variant: Variant) -> Command {
    let (name, about) = match variant {
        Variant::Sequential => ("seq_search", "Sequential leading-zero-bits search"),
        Variant::Distributed => ("dist_search", "Coordinator/worker leading-zero-bits search"),
        Variant::Tuned => (
            "dist_search_tuned",
            "Coordinator/worker search with larger grants and lane correction",
        ),
    };

    let mut command = Command::new(name)
        .version(env!("CARGO_PKG_VERSION"))
        .about(about)
        .arg(
            Arg::new("total_solutions")
                .value_name("TOTAL_SOLUTIONS")
                .help("Number of solutions to find")
                .required(true)
                .value_parser(value_parser!(usize)),
        )
        .arg(
            Arg::new("target_zero_bits")
                .value_name("TARGET_ZERO_BITS")
                .help("Leading zero bits the digest must have")
                .required(true)
                .value_parser(value_parser!(u32).range(0..=(DIGEST_LEN as i64 * 8))),
        )
        .arg(
            Arg::new("prefix")
                .long("prefix")
                .value_name("TEXT")
                .help("Prefix of every candidate string")
                .default_value(DEFAULT_PREFIX),
        )
        .arg(
            Arg::new("report")
                .long("report")
                .value_name("FILE")
                .help("Write a JSON report of the run to FILE"),
        )
        .arg(
            Arg::new("progress")
                .long("progress")
                .help("Show a progress indicator on stderr")
                .action(ArgAction::SetTrue),
        );

    if variant == Variant::Sequential {
        return command;
    }

    command = command
        .arg(
            Arg::new("compute_lanes")
                .value_name("COMPUTE_LANES")
                .help("Threads each worker scans a grant with")
                .required(true)
                .value_parser(value_parser!(u64).range(1..)),
        )
        .arg(
            Arg::new("workers")
                .long("workers")
                .short('w')
                .value_name("NUM")
                .help("Number of workers in the pool (defaults to the CPU count)")
                .value_parser(value_parser!(u64).range(1..)),
        )
        .arg(
            Arg::new("step")
                .long("step")
                .value_name("SIZE")
                .help("Indices requested per grant (10000, or 40000 for the tuned variant)")
                .value_parser(value_parser!(u64).range(1..)),
        );

    if variant == Variant::Tuned {
        command = command.arg(
            Arg::new("no-lane-correction")
                .long("no-lane-correction")
                .help("Keep every requested lane even though workers share the coordinator's host")
                .action(ArgAction::SetTrue),
        );
    }

    command
}

fn required<T: Clone + Send + Sync + 'static>(matches: &ArgMatches, id: &str) -> Result<T> {
    matches
        .get_one::<T>(id)
        .cloned()
        .ok_or_else(|| anyhow!("missing required argument {}", id))
}

pub fn parse_options(variant: Variant, matches: &ArgMatches) -> Result<CliOptions> {
    let total_solutions: usize = required(matches, "total_solutions")?;
    let target_zero_bits: u32 = required(matches, "target_zero_bits")?;
    let prefix: String = required(matches, "prefix")?;
    let search = SearchConfig::new(total_solutions, target_zero_bits).with_prefix(prefix);

    let parallel = match variant {
        Variant::Sequential => None,
        Variant::Distributed | Variant::Tuned => {
            let lanes: u64 = required(matches, "compute_lanes")?;
            let base = if variant == Variant::Tuned {
                ParallelConfig::tuned()
                    .with_coordinator_lane_reserved(!matches.get_flag("no-lane-correction"))
            } else {
                ParallelConfig::default()
            };
            let mut config = base.with_compute_lanes(lanes as usize);
            if let Some(&step) = matches.get_one::<u64>("step") {
                config = config.with_step(step);
            }
            if let Some(&workers) = matches.get_one::<u64>("workers") {
                config = config.with_workers(workers as usize);
            }
            Some(config)
        }
    };

    Ok(CliOptions {
        search,
        parallel,
        report: matches.get_one::<String>("report").cloned(),
        progress: matches.get_flag("progress"),
    })
}

/// Parses the process arguments; usage errors print to stderr and exit non-zero.
pub fn parse_args(variant: Variant) -> Result<CliOptions> {
    let matches = build_command(variant).get_matches();
    parse_options(variant, &matches)
}

fn spinner() -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {pos} indices tested ({per_sec}) {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb
}

pub fn run_sequential(options: &CliOptions) -> Result<()> {
    let oracle = Sha256Oracle;
    let progress_bar = options.progress.then(spinner);
    let outcome = search_sequential(&options.search, &oracle, progress_bar);

    println!("Solutions found:");
    print_sorted_solutions(&outcome.solutions);
    println!("\nTotal time: {:.6} s", outcome.elapsed.as_secs_f64());

    if let Some(ref filename) = options.report {
        let report = SearchReport {
            mode: "sequential".to_string(),
            total_solutions: options.search.total_solutions,
            target_zero_bits: options.search.target_zero_bits,
            workers: 1,
            compute_lanes: 1,
            step: None,
            grants_issued: None,
            indices_covered: outcome.indices_checked,
            elapsed_seconds: outcome.elapsed.as_secs_f64(),
            solutions: rank_solutions(&outcome.solutions, &oracle),
        };
        save_report_to_file(&report, filename)?;
    }

    Ok(())
}

pub fn run_distributed_search(variant: Variant, options: &CliOptions) -> Result<()> {
    let parallel = options
        .parallel
        .clone()
        .ok_or_else(|| anyhow!("{:?} variant needs a parallel configuration", variant))?;
    let oracle = Arc::new(Sha256Oracle);

    let progress_bar = if options.progress {
        let pb = ProgressBar::new(options.search.total_solutions as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} solutions")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        pb
    } else {
        ProgressBar::hidden()
    };

    let outcome = run_distributed(&options.search, &parallel, Arc::clone(&oracle), |rank, worker, solution| {
        progress_bar.suspend(|| println!("{}", format_collected(rank, worker, solution)));
        progress_bar.inc(1);
    })?;
    progress_bar.finish_and_clear();

    println!("\nSorted solutions:");
    print_sorted_solutions(&outcome.solutions);
    println!("{}", format_benchmark_line(outcome.workers, outcome.elapsed));

    if let Some(ref filename) = options.report {
        let report = SearchReport {
            mode: match variant {
                Variant::Tuned => "distributed-tuned",
                _ => "distributed",
            }
            .to_string(),
            total_solutions: options.search.total_solutions,
            target_zero_bits: options.search.target_zero_bits,
            workers: outcome.workers,
            compute_lanes: outcome.lanes_per_worker,
            step: Some(outcome.step),
            grants_issued: Some(outcome.grants_issued),
            indices_covered: outcome.next_start,
            elapsed_seconds: outcome.elapsed.as_secs_f64(),
            solutions: rank_solutions(&outcome.solutions, oracle.as_ref()),
        };
        save_report_to_file(&report, filename)?;
    }

    Ok(())
}
