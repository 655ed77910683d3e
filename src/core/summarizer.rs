//! Summarizer - best-effort LLM text generation
//!
//! The sync engine only needs `summarize(prompt) -> text`. Failures are
//! always degraded by the caller, never propagated.

use std::io::Write;
use std::process::{Command, Stdio};

use thiserror::Error;
use tracing::debug;

use crate::config::SummarizerConfig;

/// Summarizer could not produce text
#[derive(Debug, Error)]
pub enum SummarizerError {
    #[error("Summarizer unavailable: {0}")]
    Unavailable(String),
}

/// Capability to turn a prompt into a short piece of text
pub trait Summarizer {
    fn summarize(&self, prompt: &str) -> Result<String, SummarizerError>;
}

impl<T: Summarizer + ?Sized> Summarizer for &T {
    fn summarize(&self, prompt: &str) -> Result<String, SummarizerError> {
        (**self).summarize(prompt)
    }
}

impl<T: Summarizer + ?Sized> Summarizer for Box<T> {
    fn summarize(&self, prompt: &str) -> Result<String, SummarizerError> {
        (**self).summarize(prompt)
    }
}

/// Summarizer that always fails, so every caller takes its fallback path
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledSummarizer;

impl Summarizer for DisabledSummarizer {
    fn summarize(&self, _prompt: &str) -> Result<String, SummarizerError> {
        Err(SummarizerError::Unavailable("summarization disabled".to_string()))
    }
}

/// Runs an external LLM CLI with the prompt on stdin
///
/// With the default config this is `claude -p`.
#[derive(Debug, Clone)]
pub struct CommandSummarizer {
    program: String,
    args: Vec<String>,
}

impl CommandSummarizer {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }
}

impl Summarizer for CommandSummarizer {
    fn summarize(&self, prompt: &str) -> Result<String, SummarizerError> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| SummarizerError::Unavailable(format!("{}: {}", self.program, e)))?;

        // Prompt is written from its own thread while stdout/stderr drain.
        let stdin = child.stdin.take();
        let output = std::thread::scope(|scope| {
            let writer = stdin.map(|mut stdin| scope.spawn(move || stdin.write_all(prompt.as_bytes())));
            let output = child.wait_with_output();
            if let Some(Ok(Err(e))) = writer.map(|w| w.join()) {
                debug!(error = %e, program = %self.program, "Summarizer stopped reading its prompt");
            }
            output
        })
        .map_err(|e| SummarizerError::Unavailable(e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SummarizerError::Unavailable(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }

        let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if text.is_empty() {
            return Err(SummarizerError::Unavailable("empty response".to_string()));
        }
        debug!(program = %self.program, chars = text.len(), "Summarizer responded");
        Ok(text)
    }
}

/// Resolve the summarizer once at startup from config
pub fn from_config(config: &SummarizerConfig) -> Box<dyn Summarizer> {
    match config.command.as_deref().map(str::trim) {
        Some(program) if !program.is_empty() => {
            Box::new(CommandSummarizer::new(program, config.args.clone()))
        }
        _ => Box::new(DisabledSummarizer),
    }
}

/// Truncate to at most `max_chars` characters (not bytes)
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
