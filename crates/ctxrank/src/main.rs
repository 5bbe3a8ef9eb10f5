use anyhow::Result;
use clap::Parser;

use ctxrank::cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Build(args) => ctxrank::cli::build::run(&args).await,
        Commands::Stats(args) => ctxrank::cli::stats::run(&args),
        Commands::Split(args) => ctxrank::cli::split::run(&args),
    }
}
