mod cli;
mod commands;
mod error;
mod model;
mod store;
mod util;

use anyhow::Result;
use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands};

fn main() {
    init_tracing();

    if let Err(err) = run() {
        error!(error = %err, "command failed");
        for cause in err.chain().skip(1) {
            error!(cause = %cause, "caused by");
        }
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let db_path = cli.db_path.as_path();

    match cli.command {
        Commands::Ingest(args) => commands::ingest::run(args, db_path),
        Commands::Vehicles(args) => commands::vehicles::run(args, db_path),
        Commands::Crops(command) => commands::crops::run(command, db_path),
        Commands::Field(command) => commands::field::run(command, db_path),
        Commands::Status => commands::status::run(db_path),
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
