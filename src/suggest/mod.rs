//! Search-as-you-type suggestions
//!
//! [`SuggestionService`] turns a partial term into suggestion rows through
//! the Wikidata entity search. [`SuggestionDebouncer`] sits in front of it:
//! only the last input after a quiet period triggers a query, and a newer
//! input aborts the query still running for an older one.

use std::sync::Arc;
use std::time::Duration;

use rosette_types::{site_key, EntitySearchHit, SearchSuggestion};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::languages::LanguageSet;
use crate::wiki::urls::thumbnail_url;
use crate::wiki::WikiApi;

/// Shorter inputs do not query
pub const MIN_SUGGEST_CHARS: usize = 2;

/// Label language of the entity search
const SEARCH_LANGUAGE: &str = "en";

pub struct SuggestionService {
    api: Arc<dyn WikiApi>,
    languages: LanguageSet,
}

impl SuggestionService {
    pub fn new(api: Arc<dyn WikiApi>, languages: LanguageSet) -> Self {
        Self { api, languages }
    }

    /// Suggestions for `term`; any failure yields an empty list
    pub async fn suggest(&self, term: &str) -> Vec<SearchSuggestion> {
        let term = term.trim();
        if term.chars().count() < MIN_SUGGEST_CHARS {
            return Vec::new();
        }

        let hits = match self.api.search_entities(term, SEARCH_LANGUAGE).await {
            Ok(hits) if !hits.is_empty() => hits,
            Ok(_) => return Vec::new(),
            Err(e) => {
                warn!(term, error = %e, "Entity search failed");
                return Vec::new();
            }
        };

        let ids: Vec<String> = hits.iter().map(|hit| hit.id.clone()).collect();
        let entities = match self.api.get_entities(&ids).await {
            Ok(entities) => entities,
            Err(e) => {
                warn!(term, error = %e, "Entity fetch for suggestions failed");
                return Vec::new();
            }
        };

        let suggestions: Vec<SearchSuggestion> = hits
            .into_iter()
            .filter_map(|hit| {
                let entity = entities.get(&hit.id)?;
                Some(SearchSuggestion {
                    thumbnail_url: entity.image_file().map(thumbnail_url),
                    has_article_in_any_language: self
                        .languages
                        .display()
                        .iter()
                        .any(|lang| entity.sitelink_title(&site_key(lang)).is_some()),
                    ..suggestion_row(hit)
                })
            })
            .collect();
        debug!(term, count = suggestions.len(), "Suggestions ready");
        suggestions
    }
}

fn suggestion_row(hit: EntitySearchHit) -> SearchSuggestion {
    SearchSuggestion {
        id: hit.id,
        label: hit.label,
        description: hit.description.unwrap_or_default(),
        thumbnail_url: None,
        has_article_in_any_language: false,
    }
}

/// Suggestions for one input
#[derive(Debug, Clone, PartialEq)]
pub struct SuggestionBatch {
    pub term: String,
    pub suggestions: Vec<SearchSuggestion>,
}

/// Aborts the wrapped task when dropped
struct AbortOnDrop(tokio::task::AbortHandle);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}

pub struct SuggestionDebouncer {
    service: Arc<SuggestionService>,
    quiet: Duration,
    pending: Option<AbortOnDrop>,
    batches: mpsc::UnboundedSender<SuggestionBatch>,
}

impl SuggestionDebouncer {
    /// Debouncer and the channel its batches arrive on.
    ///
    /// Must be driven from within a tokio runtime.
    pub fn new(
        service: Arc<SuggestionService>,
        quiet: Duration,
    ) -> (Self, mpsc::UnboundedReceiver<SuggestionBatch>) {
        let (batches, rx) = mpsc::unbounded_channel();
        (
            Self {
                service,
                quiet,
                pending: None,
                batches,
            },
            rx,
        )
    }

    /// New text in the search bar. Supersedes any pending query.
    ///
    /// Too-short input answers with an empty batch right away.
    pub fn input(&mut self, text: &str) {
        self.pending = None;

        let term = text.trim().to_string();
        if term.chars().count() < MIN_SUGGEST_CHARS {
            let _ = self.batches.send(SuggestionBatch {
                term,
                suggestions: Vec::new(),
            });
            return;
        }

        let service = self.service.clone();
        let batches = self.batches.clone();
        let quiet = self.quiet;
        let handle = tokio::spawn(async move {
            tokio::time::sleep(quiet).await;
            let suggestions = service.suggest(&term).await;
            let _ = batches.send(SuggestionBatch { term, suggestions });
        });
        self.pending = Some(AbortOnDrop(handle.abort_handle()));
    }

    /// Drop any pending query without answering it
    pub fn cancel(&mut self) {
        self.pending = None;
    }
}
