//! Wikipedia / Wikidata integration
//!
//! This module provides:
//! - API response types for the action APIs (`types`)
//! - The [`WikiApi`] seam and its reqwest-backed client (`client`)
//! - Page URL construction and title extraction (`urls`)

pub mod client;
pub mod types;
pub mod urls;

pub use client::{ClientResult, WikiApi, WikiClient};
pub use urls::{article_title_from_url, base_url, build_page_url};
