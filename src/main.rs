//! kbsync CLI - Entry point
//!
//! Usage: kbsync <command> [options]

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use kbsync::cli::utils::Context;
use kbsync::cli::{Cli, Commands};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("kbsync=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("kbsync=warn"))
    };
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let ctx = Context::load(cli.config.as_deref(), cli.root)?;

    match cli.command {
        Commands::Refresh(args) => kbsync::cli::refresh::run(args, &ctx),
        Commands::AddUrl(args) => kbsync::cli::add_url::run(args, &ctx),
        Commands::List(args) => kbsync::cli::list::run(args, &ctx),
        Commands::Show(args) => kbsync::cli::show::run(args, &ctx),
    }
}
