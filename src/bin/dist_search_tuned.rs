use anyhow::Result;
use desafio_hunter::cli::{Variant, parse_args, run_distributed_search};

fn main() -> Result<()> {
    env_logger::init();

    let options = parse_args(Variant::Tuned)?;
    if let Some(ref parallel) = options.parallel {
        log::info!(
            "tuned run: step {}, {} of {} lanes per worker",
            parallel.step,
            parallel.lanes_per_worker(),
            parallel.compute_lanes
        );
    }
    run_distributed_search(Variant::Tuned, &options)
}
