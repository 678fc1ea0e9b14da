//! Random-topic sampler
//!
//! Draws random articles language by language until one is found whose
//! entity is a real topic (not a disambiguation page) with an article in
//! every display language.

use std::sync::Arc;
use std::time::Duration;

use rosette_types::{Entity, RandomArticle, ResolvedArticleSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::RandomConfig;
use crate::languages::{ArticleCountRanking, LanguageRanking};
use crate::resolver::{is_disambiguation, ArticleResolver};
use crate::wiki::WikiApi;

#[derive(Debug, Clone, PartialEq)]
pub enum SampleOutcome {
    Found(ResolvedArticleSet),
    /// Every language exhausted its attempt budget
    NotFound,
    Cancelled,
}

/// Why a single draw did not produce a topic
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rejection {
    RateLimited,
    NoArticle,
    NoEntity,
    NoSitelinks,
    Disambiguation,
    IncompleteLanguages,
}

pub struct RandomSampler {
    api: Arc<dyn WikiApi>,
    resolver: ArticleResolver,
    ranking: Arc<dyn LanguageRanking>,
    config: RandomConfig,
}

impl RandomSampler {
    pub fn new(api: Arc<dyn WikiApi>, resolver: ArticleResolver, config: RandomConfig) -> Self {
        Self {
            api,
            resolver,
            ranking: Arc::new(ArticleCountRanking),
            config,
        }
    }

    /// Replace the language ordering
    pub fn with_ranking(mut self, ranking: Arc<dyn LanguageRanking>) -> Self {
        self.ranking = ranking;
        self
    }

    pub async fn sample(&self, cancel: &CancellationToken) -> SampleOutcome {
        let display = self.resolver.languages().display();
        let order = self.ranking.order(display);
        info!(order = ?order, "Sampling a random topic");

        for lang in &order {
            for attempt in 1..=self.config.attempts_per_language {
                if cancel.is_cancelled() {
                    return SampleOutcome::Cancelled;
                }
                debug!(%lang, attempt, max = self.config.attempts_per_language, "Random draw");

                let pause = match self.draw(lang).await {
                    Ok(set) => {
                        info!(%lang, label = %set.label, entity = ?set.entity_id, "Random topic found");
                        return SampleOutcome::Found(set);
                    }
                    Err(Rejection::RateLimited) => {
                        warn!(%lang, "Rate limited, cooling down");
                        self.config.rate_limit_cooldown()
                    }
                    Err(reason) => {
                        debug!(%lang, ?reason, "Candidate rejected");
                        self.config.attempt_delay()
                    }
                };

                if !pause_unless_cancelled(pause, cancel).await {
                    return SampleOutcome::Cancelled;
                }
            }
        }

        info!("No random topic found within the attempt budget");
        SampleOutcome::NotFound
    }

    async fn draw(&self, lang: &str) -> Result<ResolvedArticleSet, Rejection> {
        let article = self.random_article(lang).await?;

        let id = match self.api.get_wikidata_id(lang, &article.title).await {
            Ok(Some(id)) => id,
            Ok(None) => return Err(Rejection::NoEntity),
            Err(e) => {
                debug!(error = %e, "Wikidata id lookup failed");
                return Err(Rejection::NoEntity);
            }
        };

        let entity = match self.api.get_entity(&id).await {
            Ok(Some(entity)) => entity,
            Ok(None) => return Err(Rejection::NoEntity),
            Err(e) => {
                debug!(%id, error = %e, "Entity fetch failed");
                return Err(Rejection::NoEntity);
            }
        };

        self.check(&entity)?;

        let label = entity.label("en").unwrap_or(&article.title).to_string();
        Ok(self.resolver.from_entity(&label, &entity))
    }

    async fn random_article(&self, lang: &str) -> Result<RandomArticle, Rejection> {
        match self.api.get_random_articles(lang).await {
            Ok(articles) => articles.into_iter().next().ok_or(Rejection::NoArticle),
            Err(e) if e.is_rate_limited() => Err(Rejection::RateLimited),
            Err(e) => {
                warn!(%lang, error = %e, "Random article request failed");
                Err(Rejection::NoArticle)
            }
        }
    }

    fn check(&self, entity: &Entity) -> Result<(), Rejection> {
        if !entity.has_sitelinks() {
            return Err(Rejection::NoSitelinks);
        }
        if is_disambiguation(entity) {
            return Err(Rejection::Disambiguation);
        }
        if !entity.has_sitelinks_for(self.resolver.languages().display()) {
            return Err(Rejection::IncompleteLanguages);
        }
        Ok(())
    }
}

/// Sleep for `pause`; false when cancelled first
async fn pause_unless_cancelled(pause: Duration, cancel: &CancellationToken) -> bool {
    if pause.is_zero() {
        return !cancel.is_cancelled();
    }
    tokio::select! {
        _ = cancel.cancelled() => false,
        _ = tokio::time::sleep(pause) => true,
    }
}
