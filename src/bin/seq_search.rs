use anyhow::Result;
use desafio_hunter::cli::{Variant, parse_args, run_sequential};

fn main() -> Result<()> {
    env_logger::init();

    let options = parse_args(Variant::Sequential)?;
    run_sequential(&options)
}
