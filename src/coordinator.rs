//! Coordinator side of the distributed search.
//!
//! The coordinator owns the range cursor and the solution set. Both live inside
//! a single-threaded event loop that waits on the request channel and the report
//! channel at once, so neither kind of event can starve the other.

use anyhow::{Result, anyhow, bail};
use crossbeam_channel::{Receiver, Sender, bounded, select, unbounded};
use log::{error, info, trace, warn};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::{Duration, Instant};

use crate::allocator::RangeAllocator;
use crate::collector::{Admission, SolutionSet};
use crate::config::{ParallelConfig, SearchConfig};
use crate::oracle::DigestOracle;
use crate::protocol::{ControlSignal, Envelope, Inbound, ProtocolError, Solution, WorkerId};
use crate::worker::{WorkerEndpoints, WorkerSummary, build_lane_pool, run_worker};

/// Channel ends held by the coordinator.
pub struct CoordinatorChannels {
    pub requests: Receiver<Envelope>,
    pub reports: Receiver<Envelope>,
    /// Grant sender for worker `id` sits at `id - 1`.
    pub grants: Vec<Sender<ControlSignal>>,
    pub stops: Vec<Sender<ControlSignal>>,
}

/// Creates the channel mesh for a fixed pool of `workers`, numbered from 1.
pub fn create_channels(workers: usize) -> (CoordinatorChannels, Vec<WorkerEndpoints>) {
    let (request_tx, request_rx) = unbounded();
    let (report_tx, report_rx) = unbounded();

    let mut grants = Vec::with_capacity(workers);
    let mut stops = Vec::with_capacity(workers);
    let mut endpoints = Vec::with_capacity(workers);

    for _ in 0..workers {
        let (grant_tx, grant_rx) = unbounded();
        // Stop is sent at most once per worker.
        let (stop_tx, stop_rx) = bounded(1);
        grants.push(grant_tx);
        stops.push(stop_tx);
        endpoints.push(WorkerEndpoints {
            requests: request_tx.clone(),
            reports: report_tx.clone(),
            grants: grant_rx,
            stop: stop_rx,
        });
    }

    let coordinator = CoordinatorChannels {
        requests: request_rx,
        reports: report_rx,
        grants,
        stops,
    };

    (coordinator, endpoints)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Running,
    Stopped,
}

/// `Running -> Stopped`, fired at most once; firing broadcasts `Stop` to the
/// whole worker pool.
#[derive(Debug)]
pub struct Termination {
    phase: Phase,
}

impl Default for Termination {
    fn default() -> Self {
        Self::new()
    }
}

impl Termination {
    pub fn new() -> Self {
        Self { phase: Phase::Running }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Returns false if already stopped.
    pub fn stop(&mut self, stops: &[Sender<ControlSignal>]) -> bool {
        if self.phase == Phase::Stopped {
            return false;
        }
        for (i, tx) in stops.iter().enumerate() {
            if tx.send(ControlSignal::Stop).is_err() {
                trace!("worker {} already gone before stop", i + 1);
            }
        }
        self.phase = Phase::Stopped;
        true
    }
}

/// State handed back by the event loop once collection is over.
#[derive(Debug)]
pub struct Collection {
    pub solutions: SolutionSet,
    pub allocator: RangeAllocator,
    pub protocol_faults: u64,
}

fn admit<F>(
    solutions: &mut SolutionSet,
    worker: WorkerId,
    solution: Solution,
    on_collected: &mut F,
) where
    F: FnMut(usize, WorkerId, &Solution),
{
    let admission = solutions.offer(solution);
    if admission == Admission::Duplicate {
        warn!("duplicate solution report from worker {}", worker);
    }
    if let (Some(rank), Some(solution)) = (admission.rank(), solutions.arrivals().last()) {
        on_collected(rank, worker, solution);
    }
}

/// Serves range requests and collects reports until `total_solutions` distinct
/// solutions are held, then stops the pool.
///
/// `on_collected` sees each admitted solution with its arrival rank.
pub fn run_coordinator<F>(
    total_solutions: usize,
    channels: &CoordinatorChannels,
    termination: &mut Termination,
    mut on_collected: F,
) -> Result<Collection>
where
    F: FnMut(usize, WorkerId, &Solution),
{
    let mut allocator = RangeAllocator::new();
    let mut solutions = SolutionSet::with_capacity(total_solutions);
    let mut protocol_faults = 0u64;

    while !solutions.is_full() {
        let envelope = select! {
            recv(channels.requests) -> msg => msg,
            recv(channels.reports) -> msg => msg,
        };
        let Ok(envelope) = envelope else {
            // Reports queued before the last worker hung up still count.
            for envelope in channels.reports.try_iter() {
                match Inbound::decode(envelope) {
                    Ok(Inbound::Report { worker, solution }) => {
                        admit(&mut solutions, worker, solution, &mut on_collected)
                    }
                    Ok(Inbound::Request { .. }) => {}
                    Err(e) => {
                        error!("{}", e);
                        protocol_faults += 1;
                    }
                }
            }
            if solutions.is_full() {
                break;
            }
            termination.stop(&channels.stops);
            bail!(
                "every worker disconnected after {} of {} solutions",
                solutions.len(),
                total_solutions
            );
        };

        match Inbound::decode(envelope) {
            Ok(Inbound::Request { worker, step }) => {
                let Some(grant_tx) = worker.checked_sub(1).and_then(|i| channels.grants.get(i)) else {
                    error!("{}", ProtocolError::UnknownWorker { worker });
                    protocol_faults += 1;
                    continue;
                };
                let range = allocator.allocate(step);
                trace!("granting [{}, {}) to worker {}", range.start, range.end(), worker);
                if grant_tx.send(ControlSignal::RangeGrant { start: range.start }).is_err() {
                    warn!("worker {} left before receiving [{}, {})", worker, range.start, range.end());
                }
            }
            Ok(Inbound::Report { worker, solution }) => {
                admit(&mut solutions, worker, solution, &mut on_collected)
            }
            Err(e) => {
                error!("{}", e);
                protocol_faults += 1;
            }
        }
    }

    termination.stop(&channels.stops);
    info!(
        "collected {} solutions, {} grants issued up to index {}",
        solutions.len(),
        allocator.grants_issued(),
        allocator.next_start()
    );

    Ok(Collection {
        solutions,
        allocator,
        protocol_faults,
    })
}

/// Waits on the shared barrier when dropped, including during unwinding.
struct BarrierArrival(Arc<Barrier>);

impl Drop for BarrierArrival {
    fn drop(&mut self) {
        self.0.wait();
    }
}

#[derive(Debug, Clone)]
pub struct DistributedOutcome {
    /// Sorted by index.
    pub solutions: Vec<Solution>,
    /// Measured after every worker has passed the barrier.
    pub elapsed: Duration,
    pub workers: usize,
    pub lanes_per_worker: usize,
    pub step: u64,
    pub grants_issued: u64,
    pub next_start: u64,
    pub protocol_faults: u64,
    pub worker_summaries: Vec<WorkerSummary>,
}

/// Runs the coordinator on the calling thread against a fixed pool of worker
/// threads and returns once every worker has stopped.
pub fn run_distributed<O, F>(
    search: &SearchConfig,
    parallel: &ParallelConfig,
    oracle: Arc<O>,
    on_collected: F,
) -> Result<DistributedOutcome>
where
    O: DigestOracle + 'static,
    F: FnMut(usize, WorkerId, &Solution),
{
    let workers = parallel.workers.max(1);
    let lanes = parallel.lanes_per_worker();
    let step = parallel.step.max(1);

    // Every lane pool must exist before any work is handed out.
    let pools = (1..=workers)
        .map(|id| build_lane_pool(id, lanes))
        .collect::<Result<Vec<_>>>()?;

    info!(
        "starting {} workers x {} lanes, step {}, target {} solutions with {} zero bits",
        workers, lanes, step, search.total_solutions, search.target_zero_bits
    );

    let (channels, worker_endpoints) = create_channels(workers);
    let barrier = Arc::new(Barrier::new(workers + 1));
    let search_shared = Arc::new(search.clone());
    let start_time = Instant::now();

    let handles: Vec<_> = worker_endpoints
        .into_iter()
        .zip(pools)
        .enumerate()
        .map(|(i, (endpoints, pool))| {
            let worker = i + 1;
            let search = Arc::clone(&search_shared);
            let oracle = Arc::clone(&oracle);
            let barrier = Arc::clone(&barrier);

            thread::spawn(move || {
                // Arrives at the barrier even if the scan panics.
                let _arrival = BarrierArrival(barrier);
                run_worker(worker, &search, step, oracle.as_ref(), &pool, endpoints)
            })
        })
        .collect();

    let mut termination = Termination::new();
    let collection = run_coordinator(search.total_solutions, &channels, &mut termination, on_collected);

    barrier.wait();
    let elapsed = start_time.elapsed();

    let mut worker_summaries = Vec::with_capacity(workers);
    for handle in handles {
        match handle.join().map_err(|_| anyhow!("Worker thread panicked during search"))? {
            Ok(summary) => worker_summaries.push(summary),
            Err(e) => error!("worker aborted: {}", e),
        }
    }

    let collection = collection?;
    Ok(DistributedOutcome {
        grants_issued: collection.allocator.grants_issued(),
        next_start: collection.allocator.next_start(),
        protocol_faults: collection.protocol_faults,
        solutions: collection.solutions.into_sorted(),
        elapsed,
        workers,
        lanes_per_worker: lanes,
        step,
        worker_summaries,
    })
}
