mod cli;
mod commands;
mod compare;
mod config;
mod document;
mod report;

use clap::Parser;
use config::{CliOverrides, ResolvedRunConfig};
use pagediff_engine::ComparisonStatus;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = cli::Cli::parse();

    let default_filter = if cli.verbose() {
        "pagediff=debug,pagediff_engine=debug"
    } else if cli.quiet() {
        "pagediff=error"
    } else {
        "pagediff=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        cli::Command::Init { force } => commands::init(force).map(|()| 0),
        cli::Command::Compare(args) => {
            let overrides = CliOverrides {
                render: args.render.clone(),
                diff: args.diff.clone(),
                run: args.run.clone(),
            };
            match ResolvedRunConfig::new(overrides) {
                Ok(config) => commands::compare(config, args).await,
                Err(e) => Err(e),
            }
        }
    };

    let code = match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("\x1b[31mError:\x1b[0m {e:#}");
            ComparisonStatus::Error.exit_code()
        }
    };
    std::process::exit(code);
}
