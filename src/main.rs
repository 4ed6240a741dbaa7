mod cli;
mod pipeline;
mod schedule;
mod utils;

use clap::Parser;
use cli::{Cli, Commands};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("labsmoke=info")),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run(args) => pipeline::run_pipeline(&args.into_config()),
        Commands::Schedule(args) => schedule::install(&args.into_config()).map(|_| 0),
    };

    match result {
        Ok(0) => {}
        Ok(_failed) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
