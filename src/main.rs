/// Chithi - Main entry point
///
/// A command-line letter box: write letters to other users on this machine
use anyhow::Context;
use chithi::{cli, config::Config, services::Chithi};
use clap::Parser;
use log::debug;

#[derive(Parser)]
#[command(name = "chithi")]
#[command(about = "Chithi - Handwritten-style letters between local users")]
struct Args {
    #[command(flatten)]
    config: Config,

    #[command(subcommand)]
    command: cli::Command,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    env_logger::Builder::from_default_env()
        .filter_level(args.config.log_level())
        .format_timestamp_millis()
        .init();

    debug!("Starting Chithi");

    let app = Chithi::open(&args.config).context("Failed to open the letter store")?;
    let output = cli::run(&app, args.command)?;
    if !output.is_empty() {
        println!("{}", output);
    }

    Ok(())
}
