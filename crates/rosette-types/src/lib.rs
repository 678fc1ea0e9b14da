//! Shared data model for Rosette
//!
//! Types in this crate cross the boundary between the Wikidata/Wikipedia
//! HTTP layer and the reading core:
//!
//! - [`Entity`]: a Wikidata item as returned by `wbgetentities`
//! - [`ResolvedArticleSet`]: the per-language outcome of one resolution
//! - [`SearchSuggestion`]: an entity hit decorated for the suggestion list
//!
//! Entities are immutable once fetched. Nothing in the core mutates them;
//! a fresh copy is fetched for every resolution.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Wikidata property "instance of"
pub const INSTANCE_OF: &str = "P31";

/// Wikidata property "image"
pub const IMAGE: &str = "P18";

/// Site key used by Wikidata sitelinks for a Wikipedia language edition.
///
/// `site_key("fr") == "frwiki"`
pub fn site_key(lang: &str) -> String {
    format!("{}wiki", lang)
}

// ============================================================================
// ENTITY
// ============================================================================

/// A Wikidata item (labels, sitelinks and statement claims)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: String,

    #[serde(default)]
    pub labels: BTreeMap<String, Label>,

    /// `None` when the API returned no sitelinks member at all
    #[serde(default)]
    pub sitelinks: Option<BTreeMap<String, Sitelink>>,

    #[serde(default)]
    pub claims: Option<BTreeMap<String, Vec<Claim>>>,

    /// Present (usually as an empty string) when the id does not exist
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub missing: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Label {
    #[serde(default)]
    pub language: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sitelink {
    #[serde(default)]
    pub site: String,
    pub title: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Claim {
    #[serde(default)]
    pub mainsnak: Snak,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snak {
    #[serde(default)]
    pub datavalue: Option<DataValue>,
}

/// Claim value. `value` is either a bare string or a structured object
/// (e.g. `{"entity-type": "item", "id": "Q5"}`) depending on the datatype.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataValue {
    #[serde(default)]
    pub value: Value,
    #[serde(rename = "type", default)]
    pub value_type: Option<String>,
}

impl Entity {
    /// Whether the API reported this id as non-existent
    pub fn is_missing(&self) -> bool {
        self.missing.is_some()
    }

    pub fn label(&self, lang: &str) -> Option<&str> {
        self.labels.get(lang).map(|l| l.value.as_str())
    }

    /// Article title for a site key such as `"enwiki"`
    pub fn sitelink_title(&self, site: &str) -> Option<&str> {
        self.sitelinks
            .as_ref()
            .and_then(|links| links.get(site))
            .map(|s| s.title.as_str())
    }

    /// True when the entity carries at least one sitelink
    pub fn has_sitelinks(&self) -> bool {
        self.sitelinks.as_ref().is_some_and(|links| !links.is_empty())
    }

    /// Flattened `site -> title` view of the sitelinks
    pub fn sitelink_titles(&self) -> Option<BTreeMap<String, String>> {
        self.sitelinks.as_ref().map(|links| {
            links
                .iter()
                .map(|(site, link)| (site.clone(), link.title.clone()))
                .collect()
        })
    }

    /// Whether every language in `langs` has a `{lang}wiki` sitelink
    pub fn has_sitelinks_for<S: AsRef<str>>(&self, langs: &[S]) -> bool {
        langs
            .iter()
            .all(|lang| self.sitelink_title(&site_key(lang.as_ref())).is_some())
    }

    /// Raw claim values for a property, skipping claims without a datavalue
    pub fn claim_values<'a>(&'a self, property: &str) -> impl Iterator<Item = &'a Value> + 'a {
        self.claims
            .as_ref()
            .and_then(|claims| claims.get(property))
            .into_iter()
            .flatten()
            .filter_map(|claim| claim.mainsnak.datavalue.as_ref())
            .map(|dv| &dv.value)
    }

    /// First string value of the `P18` image claim, if any
    pub fn image_file(&self) -> Option<&str> {
        self.claim_values(IMAGE).find_map(Value::as_str)
    }
}

// ============================================================================
// RESOLUTION OUTPUT
// ============================================================================

/// What a single panel should show
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ArticleTarget {
    /// Load the article with this title
    Title { title: String },
    /// Confirmed absence: render the "no article in this language" page
    Missing,
}

impl ArticleTarget {
    pub fn title(title: impl Into<String>) -> Self {
        Self::Title {
            title: title.into(),
        }
    }

    pub fn as_title(&self) -> Option<&str> {
        match self {
            Self::Title { title } => Some(title),
            Self::Missing => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }
}

/// One entry of a [`ResolvedArticleSet`], index-aligned with display order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PanelArticle {
    pub lang: String,
    pub target: ArticleTarget,
}

/// Article the fallback search found first
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceArticle {
    pub lang: String,
    pub title: String,
}

/// Per-language outcome of one resolution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedArticleSet {
    /// Originating Wikidata id, `None` for anonymous plain-text searches
    pub entity_id: Option<String>,
    /// Human-readable label (search term or entity label) for status text
    pub label: String,
    /// Set only when the fallback search located the topic
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<SourceArticle>,
    pub articles: Vec<PanelArticle>,
}

impl ResolvedArticleSet {
    pub fn target(&self, lang: &str) -> Option<&ArticleTarget> {
        self.articles
            .iter()
            .find(|a| a.lang == lang)
            .map(|a| &a.target)
    }

    pub fn title(&self, lang: &str) -> Option<&str> {
        self.target(lang).and_then(ArticleTarget::as_title)
    }

    pub fn missing_languages(&self) -> impl Iterator<Item = &str> {
        self.articles
            .iter()
            .filter(|a| a.target.is_missing())
            .map(|a| a.lang.as_str())
    }

    /// True when every display language has an article
    pub fn is_complete(&self) -> bool {
        self.articles.iter().all(|a| !a.target.is_missing())
    }
}

// ============================================================================
// SEARCH / RANDOM
// ============================================================================

/// A `wbsearchentities` hit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitySearchHit {
    pub id: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// A `list=random` entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RandomArticle {
    pub id: u64,
    pub title: String,
}

/// Suggestion-list row built from a search hit and its entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchSuggestion {
    pub id: String,
    pub label: String,
    pub description: String,
    pub thumbnail_url: Option<String>,
    pub has_article_in_any_language: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity_json() -> Value {
        serde_json::json!({
            "type": "item",
            "id": "Q42",
            "labels": {"en": {"language": "en", "value": "Douglas Adams"}},
            "sitelinks": {
                "enwiki": {"site": "enwiki", "title": "Douglas Adams", "badges": []},
                "frwiki": {"site": "frwiki", "title": "Douglas Adams", "badges": []}
            },
            "claims": {
                "P31": [{
                    "mainsnak": {
                        "snaktype": "value",
                        "property": "P31",
                        "datavalue": {
                            "value": {"entity-type": "item", "numeric-id": 5, "id": "Q5"},
                            "type": "wikibase-entityid"
                        }
                    },
                    "type": "statement"
                }],
                "P18": [{
                    "mainsnak": {
                        "datavalue": {"value": "Douglas adams portrait.jpg", "type": "string"}
                    }
                }]
            }
        })
    }

    #[test]
    fn test_site_key() {
        assert_eq!(site_key("ja"), "jawiki");
    }

    #[test]
    fn test_entity_deserialize() {
        let entity: Entity = serde_json::from_value(entity_json()).unwrap();
        assert_eq!(entity.id, "Q42");
        assert_eq!(entity.label("en"), Some("Douglas Adams"));
        assert_eq!(entity.sitelink_title("frwiki"), Some("Douglas Adams"));
        assert!(entity.sitelink_title("jawiki").is_none());
        assert!(entity.has_sitelinks_for(&["en", "fr"]));
        assert!(!entity.has_sitelinks_for(&["en", "fr", "ja"]));
        assert_eq!(entity.image_file(), Some("Douglas adams portrait.jpg"));
        assert!(!entity.is_missing());
    }

    #[test]
    fn test_missing_entity() {
        let entity: Entity =
            serde_json::from_value(serde_json::json!({"id": "Q0", "missing": ""})).unwrap();
        assert!(entity.is_missing());
        assert!(!entity.has_sitelinks());
        assert!(entity.sitelink_titles().is_none());
    }

    #[test]
    fn test_claim_values_skip_empty_snaks() {
        let entity: Entity = serde_json::from_value(serde_json::json!({
            "id": "Q1",
            "claims": {"P31": [{"mainsnak": {"snaktype": "novalue"}}]}
        }))
        .unwrap();
        assert_eq!(entity.claim_values(INSTANCE_OF).count(), 0);
    }

    #[test]
    fn test_resolved_article_set_accessors() {
        let set = ResolvedArticleSet {
            entity_id: Some("Q9".to_string()),
            label: "Rabbit".to_string(),
            source: None,
            articles: vec![
                PanelArticle {
                    lang: "en".to_string(),
                    target: ArticleTarget::title("Rabbit"),
                },
                PanelArticle {
                    lang: "ja".to_string(),
                    target: ArticleTarget::Missing,
                },
            ],
        };

        assert_eq!(set.title("en"), Some("Rabbit"));
        assert_eq!(set.title("ja"), None);
        assert!(set.target("de").is_none());
        assert_eq!(set.missing_languages().collect::<Vec<_>>(), vec!["ja"]);
        assert!(!set.is_complete());
    }

    #[test]
    fn test_article_target_tagged_json() {
        let json = serde_json::to_value(ArticleTarget::title("Lapin")).unwrap();
        assert_eq!(json, serde_json::json!({"type": "title", "title": "Lapin"}));
        let json = serde_json::to_value(ArticleTarget::Missing).unwrap();
        assert_eq!(json, serde_json::json!({"type": "missing"}));
    }
}
