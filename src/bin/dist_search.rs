use anyhow::Result;
use desafio_hunter::cli::{Variant, parse_args, run_distributed_search};

fn main() -> Result<()> {
    env_logger::init();

    let options = parse_args(Variant::Distributed)?;
    run_distributed_search(Variant::Distributed, &options)
}
