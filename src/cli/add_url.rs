//! `kbsync add-url` command
//!
//! # Usage
//! ```bash
//! kbsync add-url platform https://kubernetes.io/docs/concepts/services-networking/ingress/
//! ```

use anyhow::{Context as _, Result};
use clap::Args;
use colored::Colorize;

use super::utils::Context;

#[derive(Args, Debug)]
pub struct AddUrlArgs {
    /// Knowledge base name
    pub kb: String,

    /// http(s) URL to fetch
    pub url: String,
}

pub fn run(args: AddUrlArgs, ctx: &Context) -> Result<()> {
    let engine = ctx.engine()?;
    let entry = engine
        .add_url(&args.kb, &args.url)
        .with_context(|| format!("Failed to add {}", args.url))?;

    println!(
        "{} Added to {}: {}",
        "✓".green(),
        args.kb.bold(),
        entry.title.as_deref().unwrap_or(&entry.url)
    );
    println!("  {}", entry.summary.dimmed());
    Ok(())
}
