//! Hermod CLI: configuration checks and nickname administration.
//!
//! The bridge itself is embedded by linking `hermod-kernel` against a chat
//! transport and calling `HermodKernel::run`.

mod cli;
mod cmd;
mod ui;

use crate::cli::*;
use clap::Parser;

fn init_tracing_stderr() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing_stderr();

    let config = cli.config.as_deref();
    let result = match cli.command {
        Commands::Check => cmd::check::cmd_check(config),
        Commands::Nicks(sub) => cmd::nicks::cmd_nicks(config, sub),
    };

    if let Err(e) = result {
        ui::error(&e);
        std::process::exit(1);
    }
}
