//! Cross-language article resolution
//!
//! Turns a search term, a Wikidata id or a clicked link into a
//! [`ResolvedArticleSet`]: one [`ArticleTarget`] per display language.
//!
//! Two modes:
//!
//! 1. **Entity known**: sitelinks are already at hand. Each display language
//!    maps to its `{lang}wiki` sitelink or to `Missing`. No network calls;
//!    a missing sitelink is a confirmed absence, not an unknown.
//! 2. **Fallback search**: walk the search-priority languages until one of
//!    them has an article for the term, then follow that article's
//!    language links.
//!
//! Transient API failures inside the fallback are treated as "no data" and
//! the walk continues.

pub mod disambiguation;

use std::collections::BTreeMap;
use std::sync::Arc;

use rosette_types::{site_key, ArticleTarget, Entity, PanelArticle, ResolvedArticleSet, SourceArticle};
use tracing::{debug, info, warn};

use crate::error::ResolveError;
use crate::languages::LanguageSet;
use crate::wiki::WikiApi;

pub use disambiguation::{is_disambiguation, DISAMBIGUATION_PAGE};

pub type ResolveResult = std::result::Result<ResolvedArticleSet, ResolveError>;

/// Label language used for status text and entity labels
const LABEL_LANGUAGE: &str = "en";

#[derive(Clone)]
pub struct ArticleResolver {
    api: Arc<dyn WikiApi>,
    languages: LanguageSet,
}

impl ArticleResolver {
    pub fn new(api: Arc<dyn WikiApi>, languages: LanguageSet) -> Self {
        Self { api, languages }
    }

    pub fn languages(&self) -> &LanguageSet {
        &self.languages
    }

    /// Resolve a term, optionally with an already-known entity.
    ///
    /// When `sitelinks` is given the result is computed locally
    /// (entity-known mode); otherwise the fallback search runs.
    pub async fn resolve(
        &self,
        term: &str,
        entity_id: Option<&str>,
        sitelinks: Option<&BTreeMap<String, String>>,
    ) -> ResolveResult {
        match sitelinks {
            Some(sitelinks) => Ok(self.from_sitelinks(term, entity_id, sitelinks)),
            None => self.search(term).await,
        }
    }

    /// Entity-known mode: one target per display language from sitelinks
    pub fn from_sitelinks(
        &self,
        label: &str,
        entity_id: Option<&str>,
        sitelinks: &BTreeMap<String, String>,
    ) -> ResolvedArticleSet {
        let articles = self
            .languages
            .display()
            .iter()
            .map(|lang| {
                let target = match sitelinks.get(&site_key(lang)) {
                    Some(title) => ArticleTarget::title(title.clone()),
                    None => ArticleTarget::Missing,
                };
                PanelArticle {
                    lang: lang.clone(),
                    target,
                }
            })
            .collect();

        ResolvedArticleSet {
            entity_id: entity_id.map(str::to_string),
            label: label.to_string(),
            source: None,
            articles,
        }
    }

    /// Entity-known mode straight from a fetched entity
    pub fn from_entity(&self, label: &str, entity: &Entity) -> ResolvedArticleSet {
        let sitelinks = entity.sitelink_titles().unwrap_or_default();
        self.from_sitelinks(label, Some(&entity.id), &sitelinks)
    }

    /// Fallback search mode for a free-text term
    pub async fn search(&self, term: &str) -> ResolveResult {
        let Some(source) = self.find_source(term).await else {
            info!(term, "No article found in any search-priority language");
            return Err(ResolveError::NotFound {
                term: term.to_string(),
            });
        };
        info!(term, lang = %source.lang, title = %source.title, "Found source article");

        let langlinks = match self.api.get_language_links(&source.lang, &source.title).await {
            Ok(links) => links,
            Err(e) => {
                warn!(lang = %source.lang, title = %source.title, error = %e, "Language links unavailable");
                BTreeMap::new()
            }
        };

        let articles = self
            .languages
            .display()
            .iter()
            .map(|lang| {
                let title = if *lang == source.lang {
                    Some(source.title.clone())
                } else {
                    langlinks.get(lang).cloned()
                };
                PanelArticle {
                    lang: lang.clone(),
                    target: title.map(ArticleTarget::title).unwrap_or(ArticleTarget::Missing),
                }
            })
            .collect();

        let entity_id = match self.api.get_wikidata_id(&source.lang, &source.title).await {
            Ok(id) => id,
            Err(e) => {
                debug!(error = %e, "Wikidata id lookup failed, search stays anonymous");
                None
            }
        };

        Ok(ResolvedArticleSet {
            entity_id,
            label: term.to_string(),
            source: Some(source),
            articles,
        })
    }

    /// First search-priority language with an article for `term`
    async fn find_source(&self, term: &str) -> Option<SourceArticle> {
        for lang in self.languages.search_priority() {
            match self.api.get_final_title(lang, term).await {
                Ok(Some(title)) => {
                    return Some(SourceArticle {
                        lang: lang.clone(),
                        title,
                    })
                }
                Ok(None) => debug!(term, %lang, "No article"),
                Err(e) => warn!(term, %lang, error = %e, "Title lookup failed, trying next language"),
            }
        }
        None
    }

    /// Resolve a Wikidata id: fetch the entity, then use its sitelinks.
    ///
    /// An entity without sitelinks falls back to a search on its label.
    pub async fn resolve_entity(&self, id: &str) -> ResolveResult {
        let entity = self
            .api
            .get_entity(id)
            .await
            .map_err(|source| ResolveError::Entity {
                id: id.to_string(),
                source,
            })?
            .ok_or_else(|| ResolveError::UnknownEntity { id: id.to_string() })?;

        let label = entity_label(&entity);
        if entity.has_sitelinks() {
            Ok(self.from_entity(&label, &entity))
        } else {
            debug!(id, "Entity has no sitelinks, searching by label");
            self.search(&label).await
        }
    }

    /// Resolve an article clicked inside a panel.
    ///
    /// Goes through the article's Wikidata item when there is one; any
    /// failure along that path degrades to a plain search on the title.
    pub async fn resolve_link(&self, lang: &str, title: &str) -> ResolveResult {
        match self.api.get_wikidata_id(lang, title).await {
            Ok(Some(id)) => match self.api.get_entity(&id).await {
                Ok(Some(entity)) if entity.has_sitelinks() => {
                    return Ok(self.from_entity(title, &entity));
                }
                Ok(_) => debug!(%id, "Entity without sitelinks"),
                Err(e) => warn!(%id, error = %e, "Entity fetch failed"),
            },
            Ok(None) => debug!(lang, title, "Article has no Wikidata item"),
            Err(e) => warn!(lang, title, error = %e, "Wikidata id lookup failed"),
        }
        self.search(title).await
    }
}

/// English label, else any label, else the id
pub fn entity_label(entity: &Entity) -> String {
    entity
        .label(LABEL_LANGUAGE)
        .or_else(|| entity.labels.values().next().map(|l| l.value.as_str()))
        .unwrap_or(&entity.id)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedWiki;

    fn languages(display: &[&str], search: &[&str]) -> LanguageSet {
        LanguageSet::new(display.iter().copied(), search.iter().copied()).unwrap()
    }

    fn sitelinks(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[tokio::test]
    async fn test_fallback_follows_langlinks() {
        let wiki = ScriptedWiki::new()
            .with_title("en", "Rabbit", "Rabbit")
            .with_langlinks("en", "Rabbit", &[("fr", "Lapin")]);
        let resolver = ArticleResolver::new(
            Arc::new(wiki.clone()),
            languages(&["en", "fr", "ja"], &["fr", "ja", "en"]),
        );

        let set = resolver.resolve("Rabbit", None, None).await.unwrap();

        assert_eq!(set.title("en"), Some("Rabbit"));
        assert_eq!(set.title("fr"), Some("Lapin"));
        assert_eq!(set.target("ja"), Some(&ArticleTarget::Missing));
        assert_eq!(
            set.source,
            Some(SourceArticle {
                lang: "en".to_string(),
                title: "Rabbit".to_string()
            })
        );
        // priority order was honoured
        assert_eq!(
            wiki.calls_named("get_final_title"),
            vec!["fr:Rabbit", "ja:Rabbit", "en:Rabbit"]
        );
    }

    #[tokio::test]
    async fn test_fallback_not_found() {
        let wiki = ScriptedWiki::new();
        let resolver = ArticleResolver::new(Arc::new(wiki), LanguageSet::default());

        let err = resolver.search("Xyzzy").await.unwrap_err();
        assert!(matches!(err, ResolveError::NotFound { ref term } if term == "Xyzzy"));
    }

    #[tokio::test]
    async fn test_failed_title_lookup_is_treated_as_no_title() {
        let wiki = ScriptedWiki::new()
            .failing_titles("en")
            .with_title("fr", "Lapin", "Lapin");
        let resolver = ArticleResolver::new(
            Arc::new(wiki),
            languages(&["en", "fr"], &["en", "fr"]),
        );

        let set = resolver.search("Lapin").await.unwrap();
        assert_eq!(set.source.as_ref().unwrap().lang, "fr");
        assert_eq!(set.title("fr"), Some("Lapin"));
        assert_eq!(set.target("en"), Some(&ArticleTarget::Missing));
    }

    #[tokio::test]
    async fn test_source_language_ignores_self_langlink_absence() {
        let wiki = ScriptedWiki::new()
            .with_title("ja", "ウサギ", "ウサギ")
            .with_langlinks("ja", "ウサギ", &[("en", "Rabbit")]);
        let resolver = ArticleResolver::new(
            Arc::new(wiki),
            languages(&["en", "ja"], &["ja"]),
        );

        let set = resolver.search("ウサギ").await.unwrap();
        assert_eq!(set.title("ja"), Some("ウサギ"));
        assert_eq!(set.title("en"), Some("Rabbit"));
    }

    #[tokio::test]
    async fn test_entity_known_mode_makes_no_calls() {
        let wiki = ScriptedWiki::new();
        let resolver = ArticleResolver::new(Arc::new(wiki.clone()), LanguageSet::default());
        let links = sitelinks(&[("enwiki", "Eiffel Tower"), ("frwiki", "Tour Eiffel")]);

        let set = resolver
            .resolve("Eiffel Tower", Some("Q243"), Some(&links))
            .await
            .unwrap();

        assert_eq!(set.entity_id.as_deref(), Some("Q243"));
        assert_eq!(set.title("fr"), Some("Tour Eiffel"));
        assert_eq!(set.target("ja"), Some(&ArticleTarget::Missing));
        assert!(wiki.calls().is_empty());
    }

    #[tokio::test]
    async fn test_fallback_records_wikidata_id() {
        let wiki = ScriptedWiki::new()
            .with_title("en", "Rabbit", "Rabbit")
            .with_wikidata_id("en", "Rabbit", "Q9394");
        let resolver = ArticleResolver::new(Arc::new(wiki), LanguageSet::default());

        let set = resolver.search("Rabbit").await.unwrap();
        assert_eq!(set.entity_id.as_deref(), Some("Q9394"));
    }

    #[tokio::test]
    async fn test_resolve_entity_uses_sitelinks() {
        let wiki = ScriptedWiki::new().with_entity(
            ScriptedWiki::entity("Q243", "Eiffel Tower", &[("enwiki", "Eiffel Tower"), ("jawiki", "エッフェル塔")]),
        );
        let resolver = ArticleResolver::new(Arc::new(wiki), LanguageSet::default());

        let set = resolver.resolve_entity("Q243").await.unwrap();
        assert_eq!(set.label, "Eiffel Tower");
        assert_eq!(set.title("ja"), Some("エッフェル塔"));
        assert!(set.target("fr").unwrap().is_missing());
    }

    #[tokio::test]
    async fn test_resolve_entity_unknown() {
        let resolver = ArticleResolver::new(Arc::new(ScriptedWiki::new()), LanguageSet::default());
        let err = resolver.resolve_entity("Q0").await.unwrap_err();
        assert!(matches!(err, ResolveError::UnknownEntity { .. }));
    }

    #[tokio::test]
    async fn test_resolve_link_without_item_searches_title() {
        let wiki = ScriptedWiki::new().with_title("en", "Hare", "Hare");
        let resolver = ArticleResolver::new(Arc::new(wiki), LanguageSet::default());

        let set = resolver.resolve_link("en", "Hare").await.unwrap();
        assert_eq!(set.title("en"), Some("Hare"));
        assert_eq!(set.label, "Hare");
    }

    #[tokio::test]
    async fn test_resolve_link_through_entity() {
        let wiki = ScriptedWiki::new()
            .with_wikidata_id("fr", "Lièvre", "Q46076")
            .with_entity(ScriptedWiki::entity(
                "Q46076",
                "Hare",
                &[("enwiki", "Hare"), ("frwiki", "Lièvre"), ("jawiki", "ノウサギ")],
            ));
        let resolver = ArticleResolver::new(Arc::new(wiki.clone()), LanguageSet::default());

        let set = resolver.resolve_link("fr", "Lièvre").await.unwrap();
        assert_eq!(set.entity_id.as_deref(), Some("Q46076"));
        assert!(set.is_complete());
        assert!(wiki.calls_named("get_final_title").is_empty());
    }

    #[test]
    fn test_entity_label_fallbacks() {
        let entity = ScriptedWiki::entity("Q1", "Universe", &[]);
        assert_eq!(entity_label(&entity), "Universe");

        let bare = Entity {
            id: "Q2".to_string(),
            ..Default::default()
        };
        assert_eq!(entity_label(&bare), "Q2");
    }
}
