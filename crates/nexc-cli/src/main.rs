mod cli;
mod error;
mod logging;
mod runtime;

use crate::cli::Cli;
use crate::error::Result;
use crate::runtime::Runtime;
use clap::Parser;
use nexc::workflows::{self, IntegrationConfig};
use std::time::Instant;
use tracing::info;

fn main() {
    if let Err(e) = run_app() {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run_app() -> Result<()> {
    let cli = Cli::parse();
    logging::setup_logging(cli.verbose, cli.quiet, &cli.log_file)?;

    let runtime = Runtime::init()?;
    let coordinating = runtime.rank() == 0;

    let config = IntegrationConfig {
        input: cli.input.clone(),
        model: cli.model.clone(),
        model_hash: cli.model_hash.clone(),
        grid_size: cli.grid_size,
        radial_quad: cli.radial_quad,
        pruning: cli.prune_scheme,
        lb_exec_space: cli.lb_exec_space,
        int_exec_space: cli.int_exec_space,
        batch_size: cli.batch_size,
        basis_tolerance: cli.basis_tol,
        rank: runtime.rank(),
        ranks: runtime.ranks(),
    };

    if coordinating {
        println!("Configuration");
        println!("-> Input file        : {}", config.input.display());
        println!("-> Model             : {}", config.model.display());
        println!("-> Grid              : {}", config.grid_size);
        println!("-> Radial quadrature : {}", config.radial_quad);
        println!("-> Pruning scheme    : {}", config.pruning);
        println!();
    }
    info!(rank = runtime.rank(), ranks = runtime.ranks(), "starting integration");

    runtime.barrier();
    let start = Instant::now();
    let mut summary = workflows::run(&config)?;
    runtime.barrier();
    let elapsed = start.elapsed().as_secs_f64();

    runtime.reduce(&mut summary);

    if coordinating {
        println!("EXC          = {:.12e} Eh", summary.exc);
        println!("|VXC(a+b)|_F = {:.12e}", summary.vxc_scalar_norm());
        println!("|VXC(a-b)|_F = {:.12e}", summary.vxc_z_norm());
        println!("Runtime XC   = {elapsed:.12e} s");
        println!();
    }

    Ok(())
}
