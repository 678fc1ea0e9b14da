//! Rosette - side-by-side multilingual Wikipedia reading core
//!
//! Shows one topic in several Wikipedia language editions at once. A topic
//! is resolved to a Wikidata entity, the entity's sitelinks give the
//! article title in each display language, and one browser panel per
//! language is driven to that article.
//!
//! ## Flow
//! Search term / entity id / link click -> [`ArticleResolver`] ->
//! [`ResolvedArticleSet`] -> [`PanelController`] -> browser surfaces
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use rosette::{ArticleResolver, LanguageSet, WikiClient, config::HttpConfig};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let client = Arc::new(WikiClient::new(HttpConfig::default())?);
//! let resolver = ArticleResolver::new(client, LanguageSet::default());
//! let set = resolver.search("Rabbit").await?;
//! for article in &set.articles {
//!     println!("{}: {:?}", article.lang, article.target);
//! }
//! # Ok(())
//! # }
//! ```

// Core error handling
pub mod error;

// Configuration and language settings
pub mod config;
pub mod languages;
pub mod settings;

// Wikipedia / Wikidata API access
pub mod wiki;

// Resolution of topics to per-language articles
pub mod resolver;

// Panels, find-in-page and the driver tying them together
pub mod find;
pub mod panels;
pub mod reader;

// Random topics and search suggestions
pub mod random;
pub mod suggest;

// Scripted doubles for tests
pub mod testing;

// Public re-exports
pub use config::RosetteConfig;
pub use error::{ClientError, LanguageError, ResolveError, Result, RosetteError, SettingsError};
pub use find::FindCoordinator;
pub use languages::{ArticleCountRanking, LanguageRanking, LanguageSet};
pub use panels::{BrowserSurface, NavigationDecision, PanelController, SurfaceFactory};
pub use random::{RandomSampler, SampleOutcome};
pub use reader::{Reader, ReaderStatus};
pub use resolver::{is_disambiguation, ArticleResolver};
pub use settings::{store_for, JsonFileSettings, MemorySettings, SettingsStore};
pub use suggest::{SuggestionDebouncer, SuggestionService};
pub use wiki::{build_page_url, WikiApi, WikiClient};

pub use rosette_types::{ArticleTarget, Entity, PanelArticle, ResolvedArticleSet};
