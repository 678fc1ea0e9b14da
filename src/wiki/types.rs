//! MediaWiki / Wikibase API response types
//!
//! Only the members the reader consumes are mapped. Page queries are issued
//! with `formatversion=2`, so `pages` is an array and langlinks carry a
//! `title` member.
//!
//! Reference: https://www.mediawiki.org/wiki/API:Query

use std::collections::HashMap;

use rosette_types::{Entity, EntitySearchHit, RandomArticle};
use serde::Deserialize;

/// `{"error": {...}}` envelope the API returns with HTTP 200
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody {
    pub code: String,
    #[serde(default)]
    pub info: String,
}

/// `action=wbsearchentities`
#[derive(Debug, Clone, Deserialize)]
pub struct SearchEntitiesResponse {
    #[serde(default)]
    pub search: Vec<EntitySearchHit>,
    #[serde(default)]
    pub error: Option<ApiErrorBody>,
}

/// `action=wbgetentities`
#[derive(Debug, Clone, Deserialize)]
pub struct GetEntitiesResponse {
    #[serde(default)]
    pub entities: HashMap<String, Entity>,
    #[serde(default)]
    pub error: Option<ApiErrorBody>,
}

/// `action=query` with page properties
#[derive(Debug, Clone, Deserialize)]
pub struct QueryResponse {
    #[serde(default)]
    pub query: Option<QueryBody>,
    #[serde(default)]
    pub error: Option<ApiErrorBody>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct QueryBody {
    #[serde(default)]
    pub pages: Vec<QueryPage>,
    #[serde(default)]
    pub random: Vec<RandomArticle>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct QueryPage {
    #[serde(default)]
    pub pageid: Option<u64>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub missing: bool,
    #[serde(default)]
    pub invalid: bool,
    #[serde(default)]
    pub pageprops: Option<PageProps>,
    #[serde(default)]
    pub langlinks: Vec<LangLink>,
}

impl QueryPage {
    /// Title of a page that actually exists
    pub fn existing_title(&self) -> Option<&str> {
        if self.missing || self.invalid {
            return None;
        }
        self.title.as_deref()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageProps {
    #[serde(default)]
    pub wikibase_item: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LangLink {
    pub lang: String,
    pub title: String,
}

impl QueryResponse {
    pub fn pages(&self) -> &[QueryPage] {
        self.query.as_ref().map(|q| q.pages.as_slice()).unwrap_or(&[])
    }

    pub fn into_random(self) -> Vec<RandomArticle> {
        self.query.map(|q| q.random).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_article_info_with_redirect() {
        let body = r#"{
            "batchcomplete": true,
            "query": {
                "redirects": [{"from": "Bunny", "to": "Rabbit"}],
                "pages": [{"pageid": 25100, "ns": 0, "title": "Rabbit"}]
            }
        }"#;
        let parsed: QueryResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.pages()[0].existing_title(), Some("Rabbit"));
    }

    #[test]
    fn test_missing_page_has_no_title() {
        let body = r#"{"query": {"pages": [{"ns": 0, "title": "Xyzzy", "missing": true}]}}"#;
        let parsed: QueryResponse = serde_json::from_str(body).unwrap();
        assert!(parsed.pages()[0].existing_title().is_none());
    }

    #[test]
    fn test_parse_langlinks_and_pageprops() {
        let body = r#"{"query": {"pages": [{
            "pageid": 25100, "title": "Rabbit",
            "pageprops": {"wikibase_item": "Q9394"},
            "langlinks": [{"lang": "fr", "title": "Lapin"}, {"lang": "ja", "title": "ウサギ"}]
        }]}}"#;
        let parsed: QueryResponse = serde_json::from_str(body).unwrap();
        let page = &parsed.pages()[0];
        assert_eq!(
            page.pageprops.as_ref().and_then(|p| p.wikibase_item.as_deref()),
            Some("Q9394")
        );
        assert_eq!(page.langlinks.len(), 2);
        assert_eq!(page.langlinks[1].title, "ウサギ");
    }

    #[test]
    fn test_parse_random() {
        let body = r#"{"query": {"random": [
            {"id": 123, "ns": 0, "title": "Test Article"},
            {"id": 456, "ns": 0, "title": "Another"}
        ]}}"#;
        let parsed: QueryResponse = serde_json::from_str(body).unwrap();
        let random = parsed.into_random();
        assert_eq!(random.len(), 2);
        assert_eq!(random[0].title, "Test Article");
        assert_eq!(random[0].id, 123);
    }

    #[test]
    fn test_empty_query_is_handled() {
        let parsed: QueryResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.pages().is_empty());
        assert!(parsed.into_random().is_empty());
    }

    #[test]
    fn test_api_error_envelope() {
        let body = r#"{"error": {"code": "no-such-entity", "info": "Could not find an entity"}}"#;
        let parsed: GetEntitiesResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.error.unwrap().code, "no-such-entity");
    }
}
