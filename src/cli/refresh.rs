//! `kbsync refresh` command
//!
//! # Usage
//! ```bash
//! kbsync refresh platform               # replay every source of one KB
//! kbsync refresh platform --only web    # only the web source
//! kbsync refresh --all                  # every KB under the root
//! ```

use anyhow::{bail, Context as _, Result};
use clap::Args;
use colored::Colorize;

use super::utils::Context;
use crate::core::manifest::SourceKind;
use crate::core::sync::{RefreshMode, RefreshReport};

#[derive(Args, Debug)]
pub struct RefreshArgs {
    /// Knowledge base name
    #[arg(required_unless_present = "all", conflicts_with = "all")]
    pub kb: Option<String>,

    /// Refresh every knowledge base with a manifest
    #[arg(long)]
    pub all: bool,

    /// Only refresh one source type (confluence or web)
    #[arg(long, conflicts_with = "all")]
    pub only: Option<SourceKind>,
}

pub fn run(args: RefreshArgs, ctx: &Context) -> Result<()> {
    let engine = ctx.engine()?;

    if args.all {
        let batch = engine.refresh_all().context("Refresh aborted")?;

        println!(
            "{} {}/{} knowledge bases refreshed ({} pages)",
            "✓".green(),
            batch.succeeded,
            batch.attempted,
            batch.total_pages
        );
        for failure in &batch.failures {
            println!("  {} {}: {}", "✗".red(), failure.kb.bold(), failure.message);
        }

        if batch.failed > 0 {
            bail!("{} knowledge base(s) failed to refresh", batch.failed);
        }
        return Ok(());
    }

    let Some(kb) = args.kb else {
        bail!("Specify a knowledge base or --all");
    };

    let report = engine
        .refresh_scoped(&kb, args.only)
        .with_context(|| format!("Failed to refresh '{}'", kb))?;
    print_report(&report);
    Ok(())
}

fn print_report(report: &RefreshReport) {
    match report.mode {
        RefreshMode::NoSources => {
            println!(
                "{} No manifest for '{}' and no wiki label with that name",
                "!".yellow(),
                report.kb
            );
        }
        RefreshMode::LabelDiscovery | RefreshMode::ManifestAware => {
            let how = if report.mode == RefreshMode::LabelDiscovery {
                "created from label"
            } else {
                "refreshed"
            };
            println!("{} {} {}", "✓".green(), report.kb.bold(), how);
            println!("  Pages:     {}", report.pages);
            println!("  URLs:      {}", report.urls);
            println!(
                "  Summaries: {} generated, {} reused",
                report.summaries_generated, report.summaries_reused
            );
        }
    }
}
