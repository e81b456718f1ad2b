//! Worker side of the distributed search: the range scan and the pull loop.

use anyhow::{Context, Result};
use crossbeam_channel::{Receiver, Sender, TryRecvError, select};
use log::{debug, info, trace};
use rayon::ThreadPool;
use rayon::prelude::*;

use crate::config::SearchConfig;
use crate::oracle::{DigestOracle, candidate_text};
use crate::protocol::{
    ControlSignal, Directive, Envelope, ProtocolError, Range, Solution, WorkerId,
};

/// Channel ends held by one worker.
pub struct WorkerEndpoints {
    pub requests: Sender<Envelope>,
    pub reports: Sender<Envelope>,
    pub grants: Receiver<ControlSignal>,
    pub stop: Receiver<ControlSignal>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkerSummary {
    pub worker: WorkerId,
    pub lanes: usize,
    pub ranges_scanned: u64,
    pub indices_scanned: u64,
    pub solutions_reported: u64,
}

/// Scans every index of `range` on the current rayon pool and hands each hit to
/// `report` as soon as it is found. Returns the number of hits.
pub fn search_range<O, F>(
    range: Range,
    target_zero_bits: u32,
    prefix: &str,
    oracle: &O,
    report: F,
) -> u64
where
    O: DigestOracle + ?Sized,
    F: Fn(Solution) + Sync,
{
    range
        .indices()
        .into_par_iter()
        .filter(|&index| {
            let text = candidate_text(prefix, index);
            if !oracle.is_hit(&text, target_zero_bits) {
                return false;
            }
            debug!(
                "lane {} found: {}",
                rayon::current_thread_index().unwrap_or(0),
                text
            );
            report(Solution::new(index, text));
            true
        })
        .count() as u64
}

pub fn build_lane_pool(worker: WorkerId, lanes: usize) -> Result<ThreadPool> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(lanes)
        .thread_name(move |lane| format!("worker-{}-lane-{}", worker, lane))
        .build()
        .with_context(|| format!("failed to start {} compute lanes for worker {}", lanes, worker))
}

/// Pull loop of a single worker.
///
/// Checks for a pending stop, requests a range, then waits on both the grant
/// and the stop channel. A received grant is always scanned to completion.
/// Returns when stopped or when the coordinator hangs up; the endpoints are
/// dropped on return.
pub fn run_worker<O>(
    worker: WorkerId,
    search: &SearchConfig,
    step: u64,
    oracle: &O,
    pool: &ThreadPool,
    endpoints: WorkerEndpoints,
) -> Result<WorkerSummary, ProtocolError>
where
    O: DigestOracle + ?Sized,
{
    let mut summary = WorkerSummary {
        worker,
        lanes: pool.current_num_threads(),
        ..WorkerSummary::default()
    };

    loop {
        match endpoints.stop.try_recv() {
            Ok(_) | Err(TryRecvError::Disconnected) => break,
            Err(TryRecvError::Empty) => {}
        }

        let request = Envelope::new(worker, ControlSignal::RangeRequest { step });
        if endpoints.requests.send(request).is_err() {
            break;
        }

        let signal = select! {
            recv(endpoints.grants) -> msg => msg,
            recv(endpoints.stop) -> msg => msg,
        };
        let Ok(signal) = signal else {
            break;
        };

        let range = match Directive::decode(signal, step)? {
            Directive::Stop => break,
            Directive::Grant(range) => range,
        };
        trace!("worker {} scanning [{}, {})", worker, range.start, range.end());

        let reports = &endpoints.reports;
        let hits = pool.install(|| {
            search_range(range, search.target_zero_bits, &search.prefix, oracle, |solution| {
                // The coordinator may already be done; late reports are dropped.
                let _ = reports.send(Envelope::new(worker, ControlSignal::report(solution)));
            })
        });

        summary.ranges_scanned += 1;
        summary.indices_scanned += range.end() - range.start;
        summary.solutions_reported += hits;
    }

    info!(
        "worker {} stopped: {} ranges, {} indices, {} solutions reported",
        worker, summary.ranges_scanned, summary.indices_scanned, summary.solutions_reported
    );
    Ok(summary)
}
