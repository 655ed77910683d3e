//! CLI module - Command definitions and handlers

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub mod add_url;
pub mod list;
pub mod refresh;
pub mod show;
pub mod utils;

/// kbsync - documentation sync for AI knowledge bases
///
/// Mirrors wiki labels and web pages into local Markdown knowledge bases.
#[derive(Parser, Debug)]
#[command(name = "kbsync")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file path
    #[arg(short, long, global = true, env = "KBSYNC_CONFIG")]
    pub config: Option<PathBuf>,

    /// Knowledge base root (overrides config)
    #[arg(long, global = true, env = "KBSYNC_ROOT")]
    pub root: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Refresh one knowledge base, or all of them
    Refresh(refresh::RefreshArgs),

    /// Fetch a web page into a knowledge base
    AddUrl(add_url::AddUrlArgs),

    /// List knowledge bases
    List(list::ListArgs),

    /// Show a knowledge base manifest
    Show(show::ShowArgs),
}
