//! Remote sources module
//!
//! Blocking HTTP access to the wiki REST API and to arbitrary web pages.

pub mod confluence;
pub mod types;
pub mod web;

pub use confluence::{ConfluenceApi, ConfluenceClient, FetchedPage};
pub use web::{HttpFetcher, WebFetcher};
