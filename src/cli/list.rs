//! `kbsync list` command - knowledge bases under the storage root

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use tabled::settings::Style;
use tabled::{Table, Tabled};

use super::utils::Context;
use crate::core::sync::KbSummary;

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Tabled)]
struct Row {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Type")]
    kb_type: String,
    #[tabled(rename = "Pages")]
    pages: usize,
    #[tabled(rename = "URLs")]
    urls: usize,
}

impl From<&KbSummary> for Row {
    fn from(kb: &KbSummary) -> Self {
        Self {
            name: kb.name.clone(),
            kb_type: kb.kb_type.to_string(),
            pages: kb.pages,
            urls: kb.urls,
        }
    }
}

pub fn run(args: ListArgs, ctx: &Context) -> Result<()> {
    let engine = ctx.engine()?;
    let kbs = engine.list()?;

    if args.json {
        let json: Vec<_> = kbs
            .iter()
            .map(|kb| {
                serde_json::json!({
                    "name": kb.name,
                    "type": kb.kb_type,
                    "pages": kb.pages,
                    "urls": kb.urls,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&json)?);
        return Ok(());
    }

    if kbs.is_empty() {
        println!("No knowledge bases in {}", ctx.root.display());
        return Ok(());
    }

    let rows: Vec<Row> = kbs.iter().map(Row::from).collect();
    println!("{}", Table::new(rows).with(Style::rounded()));
    println!("\n{} {}", "📁".dimmed(), ctx.root.display());
    Ok(())
}
