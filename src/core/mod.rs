//! Core module - Sync engine
//!
//! Manifests, content storage, checksums, summarization and the
//! orchestrator that ties them to the remote sources.

pub mod checksum;
pub mod content_store;
pub mod error;
pub mod manifest;
pub mod summarizer;
pub mod summary;
pub mod sync;
pub mod title;
pub mod transform;
