use std::fs::File;
use std::process;

use sim_lib::error::SimulatorResult;
use sim_lib::flags::CacheSim;
use sim_lib::run_wrapper;
use tracing_subscriber::{fmt, EnvFilter};

fn main() {
    let flags = CacheSim::from_env_or_exit();

    let default_level = if flags.verbose { "debug" } else { "info" };
    fmt::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .compact()
        .init();

    if let Err(e) = run_sim(&flags) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run_sim(flags: &CacheSim) -> SimulatorResult<()> {
    let config = flags.to_config();
    let stats = run_wrapper::run(&config, flags.trace.as_deref(), flags.check)?;

    print!("{}", stats);
    if let Some(csv_path) = &flags.csv {
        stats.write_csv(File::create(csv_path)?)?;
    }

    Ok(())
}
