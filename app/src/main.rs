mod config;
mod pipeline;

use std::{io::Write, path::PathBuf, time::Instant};

use chrono::Local;
use clap::{Args, Parser, Subcommand};
use env_logger::Builder;
use log::LevelFilter;

use crate::{
    config::{EstimateArgs, EstimateConfig},
    pipeline::{run_estimate, run_identify_ids, AppError},
};

#[derive(Parser, Debug)]
#[command(
    name = "tank-height",
    about = "Estimates storage tank heights from lidar and bare-earth elevation",
    author = "MIERUNE Inc.",
    version = "0.0.1"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sample DEMs under each tank's lidar records and merge the heights into the annotations
    Estimate(EstimateArgs),
    /// List the tank IDs that have both a lidar file and a DEM file
    IdentifyIds(IdentifyArgs),
}

#[derive(Args, Debug)]
struct IdentifyArgs {
    #[arg(long, value_name = "DIR")]
    lidar_dir: PathBuf,

    #[arg(long, value_name = "DIR")]
    dem_dir: PathBuf,

    /// JSON file receiving the sorted ID array
    #[arg(short, long, value_name = "FILE")]
    output: PathBuf,
}

fn init_logger(verbose: bool) {
    Builder::new()
        .format(|buf, record| {
            writeln!(
                buf,
                "{} [{}] - {}",
                Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .filter(
            None,
            if verbose {
                LevelFilter::Debug
            } else {
                LevelFilter::Info
            },
        )
        .init();
}

fn run(command: Command) -> Result<(), AppError> {
    match command {
        Command::Estimate(args) => {
            let config = EstimateConfig::try_from(args)?;
            let summary = run_estimate(&config)?;
            log::info!(
                "{} tanks estimated, {} failed, {} without an annotation feature",
                summary.estimated,
                summary.failed,
                summary.merge.unmatched.len()
            );
        }
        Command::IdentifyIds(args) => {
            run_identify_ids(&args.lidar_dir, &args.dem_dir, &args.output)?;
        }
    }
    Ok(())
}

fn main() {
    let args = Cli::parse();
    init_logger(args.verbose);

    let start = Instant::now();
    log::info!("start processing...");
    if let Err(e) = run(args.command) {
        log::error!("{e}");
        std::process::exit(1);
    }
    log::info!("Elapsed: {:?}", start.elapsed());
    log::info!("Finish processing");
}
