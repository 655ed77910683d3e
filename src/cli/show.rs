//! `kbsync show` command
//!
//! Prints a knowledge base manifest: each source with its pages or URLs.
//!
//! # Usage
//! ```bash
//! kbsync show platform
//! kbsync show platform --json
//! ```

use anyhow::{bail, Result};
use clap::Args;
use colored::Colorize;

use super::utils::Context;
use crate::core::manifest::{validate_kb_name, Source};

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Knowledge base name
    pub kb: String,

    /// Print the raw manifest JSON
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: ShowArgs, ctx: &Context) -> Result<()> {
    validate_kb_name(&args.kb)?;
    let store = ctx.store();

    let Some(manifest) = store.read(&args.kb) else {
        bail!(
            "No readable manifest for '{}' in {}",
            args.kb,
            ctx.root.display()
        );
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&manifest)?);
        return Ok(());
    }

    println!("{} ({})", manifest.name.bold(), manifest.kb_type);
    for source in &manifest.sources {
        match source {
            Source::Confluence { label, pages } => {
                let label = label.as_deref().unwrap_or(&manifest.name);
                println!("\n{} label {}", "confluence".cyan(), label.bold());
                for page in pages {
                    let title = page.title.as_deref().unwrap_or("(untitled)");
                    println!("  {} {}", page.id.dimmed(), title);
                    println!("      {}", page.summary);
                }
            }
            Source::Web { urls } => {
                println!("\n{}", "web".cyan());
                for entry in urls {
                    println!("  {}", entry.title.as_deref().unwrap_or(&entry.url));
                    println!("      {}", entry.url.dimmed());
                    println!("      {}", entry.summary);
                }
            }
        }
    }
    Ok(())
}
