//! Wikipedia / Wikidata API client
//!
//! Rate-limited HTTP client for the action APIs of Wikidata and the
//! Wikipedia language editions. [`WikiApi`] is the seam the resolver,
//! sampler and suggestion service depend on; [`WikiClient`] is the
//! reqwest-backed implementation.

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;
use std::time::Instant;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use rosette_types::{Entity, EntitySearchHit, RandomArticle};
use serde::de::DeserializeOwned;
use tokio::time::sleep;
use tracing::debug;

use super::types::{ApiErrorBody, GetEntitiesResponse, QueryResponse, SearchEntitiesResponse};
use super::urls::{api_url, WIKIDATA_API};
use crate::config::HttpConfig;
use crate::error::ClientError;

pub type ClientResult<T> = std::result::Result<T, ClientError>;

/// Maximum number of entity ids per `wbgetentities` call
const MAX_IDS_PER_REQUEST: usize = 50;

/// Query surface of the Wikidata / Wikipedia APIs used by the reader
///
/// # Implementation Notes
///
/// - "Nothing found" is `Ok(None)` / an empty collection, never an error
/// - HTTP 429 must surface as [`ClientError::RateLimited`]
#[async_trait]
pub trait WikiApi: Send + Sync {
    /// Entity search (`wbsearchentities`) in the given label language
    async fn search_entities(&self, term: &str, lang: &str) -> ClientResult<Vec<EntitySearchHit>>;

    /// Labels, sitelinks and claims for a batch of entity ids
    async fn get_entities(&self, ids: &[String]) -> ClientResult<HashMap<String, Entity>>;

    /// Canonical title of `title` on `lang` after redirects and normalization
    async fn get_final_title(&self, lang: &str, title: &str) -> ClientResult<Option<String>>;

    /// Language links of an article: target language → title
    async fn get_language_links(
        &self,
        lang: &str,
        title: &str,
    ) -> ClientResult<BTreeMap<String, String>>;

    /// Wikidata id attached to an article through its page props
    async fn get_wikidata_id(&self, lang: &str, title: &str) -> ClientResult<Option<String>>;

    /// One random main-namespace article from `lang`
    async fn get_random_articles(&self, lang: &str) -> ClientResult<Vec<RandomArticle>>;

    /// Single-entity convenience over [`WikiApi::get_entities`]; ids the API
    /// reports as missing come back as `None`
    async fn get_entity(&self, id: &str) -> ClientResult<Option<Entity>> {
        let mut entities = self.get_entities(&[id.to_string()]).await?;
        Ok(entities.remove(id).filter(|e| !e.is_missing()))
    }
}

pub struct WikiClient {
    http: Client,
    config: HttpConfig,
    last_request: Mutex<Instant>,
}

impl WikiClient {
    pub fn new(config: HttpConfig) -> ClientResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self {
            http,
            config,
            last_request: Mutex::new(Instant::now()),
        })
    }

    /// Enforce rate limiting between requests
    async fn rate_limit(&self) {
        let delay = self.config.rate_limit_delay();
        let elapsed = {
            let last = self.last_request.lock().unwrap();
            last.elapsed()
        };

        if elapsed < delay {
            sleep(delay - elapsed).await;
        }

        let mut last = self.last_request.lock().unwrap();
        *last = Instant::now();
    }

    /// GET an action API endpoint with `format=json` appended
    async fn get<T: DeserializeOwned>(&self, endpoint: &str, params: &[(&str, &str)]) -> ClientResult<T> {
        self.rate_limit().await;

        let response = self
            .http
            .get(endpoint)
            .query(params)
            .query(&[("format", "json")])
            .send()
            .await?;

        let status = response.status();
        let host = response.url().host_str().unwrap_or_default().to_string();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(ClientError::RateLimited { host });
        }
        if !status.is_success() {
            return Err(ClientError::Status { status, host });
        }

        let body = response.bytes().await?;
        debug!(endpoint, bytes = body.len(), "API response");
        Ok(serde_json::from_slice(&body)?)
    }

    async fn query_pages(&self, lang: &str, params: &[(&str, &str)]) -> ClientResult<QueryResponse> {
        let mut all = vec![("action", "query"), ("formatversion", "2")];
        all.extend_from_slice(params);
        let response: QueryResponse = self.get(&api_url(lang), &all).await?;
        check_api_error(response.error.as_ref())?;
        Ok(response)
    }
}

#[async_trait]
impl WikiApi for WikiClient {
    async fn search_entities(&self, term: &str, lang: &str) -> ClientResult<Vec<EntitySearchHit>> {
        let response: SearchEntitiesResponse = self
            .get(
                WIKIDATA_API,
                &[
                    ("action", "wbsearchentities"),
                    ("search", term),
                    ("language", lang),
                    ("uselang", lang),
                    ("type", "item"),
                    ("limit", "10"),
                ],
            )
            .await?;
        check_api_error(response.error.as_ref())?;
        Ok(response.search)
    }

    async fn get_entities(&self, ids: &[String]) -> ClientResult<HashMap<String, Entity>> {
        let mut entities = HashMap::with_capacity(ids.len());
        for chunk in ids.chunks(MAX_IDS_PER_REQUEST) {
            let joined = chunk.join("|");
            let response: GetEntitiesResponse = self
                .get(
                    WIKIDATA_API,
                    &[
                        ("action", "wbgetentities"),
                        ("ids", joined.as_str()),
                        ("props", "labels|sitelinks|claims"),
                    ],
                )
                .await?;
            check_api_error(response.error.as_ref())?;
            entities.extend(response.entities);
        }
        Ok(entities)
    }

    async fn get_final_title(&self, lang: &str, title: &str) -> ClientResult<Option<String>> {
        let formatted = title.replace(' ', "_");
        let response = self
            .query_pages(lang, &[("prop", "info"), ("redirects", "1"), ("titles", formatted.as_str())])
            .await?;
        Ok(response
            .pages()
            .iter()
            .find_map(|page| page.existing_title())
            .map(str::to_string))
    }

    async fn get_language_links(
        &self,
        lang: &str,
        title: &str,
    ) -> ClientResult<BTreeMap<String, String>> {
        let response = self
            .query_pages(
                lang,
                &[("prop", "langlinks"), ("lllimit", "max"), ("titles", title)],
            )
            .await?;
        Ok(response
            .pages()
            .first()
            .map(|page| {
                page.langlinks
                    .iter()
                    .map(|link| (link.lang.clone(), link.title.clone()))
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn get_wikidata_id(&self, lang: &str, title: &str) -> ClientResult<Option<String>> {
        let response = self
            .query_pages(
                lang,
                &[
                    ("prop", "pageprops"),
                    ("ppprop", "wikibase_item"),
                    ("redirects", "1"),
                    ("titles", title),
                ],
            )
            .await?;
        Ok(response
            .pages()
            .first()
            .and_then(|page| page.pageprops.as_ref())
            .and_then(|props| props.wikibase_item.clone()))
    }

    async fn get_random_articles(&self, lang: &str) -> ClientResult<Vec<RandomArticle>> {
        let response = self
            .query_pages(
                lang,
                &[("list", "random"), ("rnnamespace", "0"), ("rnlimit", "1")],
            )
            .await?;
        Ok(response.into_random())
    }
}

fn check_api_error(error: Option<&ApiErrorBody>) -> ClientResult<()> {
    match error {
        Some(err) => Err(ClientError::Api {
            code: err.code.clone(),
            info: err.info.clone(),
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_api_error() {
        assert!(check_api_error(None).is_ok());

        let body = ApiErrorBody {
            code: "maxlag".to_string(),
            info: "Waiting for a database server".to_string(),
        };
        let err = check_api_error(Some(&body)).unwrap_err();
        assert!(matches!(err, ClientError::Api { ref code, .. } if code == "maxlag"));
    }

    #[test]
    fn test_client_builds_with_defaults() {
        assert!(WikiClient::new(HttpConfig::default()).is_ok());
    }
}
