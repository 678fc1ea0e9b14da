//! Scripted test doubles
//!
//! [`ScriptedWiki`] answers [`WikiApi`] calls from in-memory tables and
//! records every call it receives, so tests can assert both on results and
//! on which requests were (or were not) made. [`RecordingFactory`] builds
//! browser surfaces that log every command. Used by the unit tests and by
//! the integration tests under `tests/`.

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rosette_types::{
    Claim, DataValue, Entity, EntitySearchHit, Label, RandomArticle, Sitelink, Snak, IMAGE,
    INSTANCE_OF,
};
use serde_json::json;

use crate::error::ClientError;
use crate::panels::{BrowserSurface, SurfaceFactory};
use crate::resolver::DISAMBIGUATION_PAGE;
use crate::wiki::{ClientResult, WikiApi};

/// One scripted answer of the random-article endpoint
#[derive(Debug, Clone)]
pub enum RandomDraw {
    Article(RandomArticle),
    Empty,
    RateLimited,
}

#[derive(Default)]
struct Script {
    titles: HashMap<(String, String), String>,
    failing_titles: HashSet<String>,
    langlinks: HashMap<(String, String), BTreeMap<String, String>>,
    wikidata_ids: HashMap<(String, String), String>,
    entities: HashMap<String, Entity>,
    searches: HashMap<String, Vec<EntitySearchHit>>,
    random: HashMap<String, VecDeque<RandomDraw>>,
    calls: Vec<String>,
}

/// In-memory [`WikiApi`]; clones share the same script and call log
#[derive(Clone, Default)]
pub struct ScriptedWiki {
    script: Arc<Mutex<Script>>,
}

impl ScriptedWiki {
    pub fn new() -> Self {
        Self::default()
    }

    fn edit(self, f: impl FnOnce(&mut Script)) -> Self {
        f(&mut self.script.lock().unwrap());
        self
    }

    /// `title` on `lang` exists and normalizes to `final_title`
    pub fn with_title(self, lang: &str, title: &str, final_title: &str) -> Self {
        self.edit(|s| {
            s.titles
                .insert((lang.to_string(), title.to_string()), final_title.to_string());
        })
    }

    /// Every title lookup on `lang` fails with a server error
    pub fn failing_titles(self, lang: &str) -> Self {
        self.edit(|s| {
            s.failing_titles.insert(lang.to_string());
        })
    }

    pub fn with_langlinks(self, lang: &str, title: &str, links: &[(&str, &str)]) -> Self {
        self.edit(|s| {
            s.langlinks.insert(
                (lang.to_string(), title.to_string()),
                links
                    .iter()
                    .map(|(l, t)| (l.to_string(), t.to_string()))
                    .collect(),
            );
        })
    }

    pub fn with_wikidata_id(self, lang: &str, title: &str, id: &str) -> Self {
        self.edit(|s| {
            s.wikidata_ids
                .insert((lang.to_string(), title.to_string()), id.to_string());
        })
    }

    pub fn with_entity(self, entity: Entity) -> Self {
        self.edit(|s| {
            s.entities.insert(entity.id.clone(), entity);
        })
    }

    pub fn with_search(self, term: &str, hits: Vec<EntitySearchHit>) -> Self {
        self.edit(|s| {
            s.searches.insert(term.to_string(), hits);
        })
    }

    /// Queue answers of the random endpoint for `lang`; an exhausted queue
    /// answers with no articles
    pub fn with_random(self, lang: &str, draws: Vec<RandomDraw>) -> Self {
        self.edit(|s| {
            s.random.entry(lang.to_string()).or_default().extend(draws);
        })
    }

    /// Entity with an English label and the given `(site, title)` sitelinks
    pub fn entity(id: &str, label: &str, sitelinks: &[(&str, &str)]) -> Entity {
        let mut labels = BTreeMap::new();
        labels.insert(
            "en".to_string(),
            Label {
                language: "en".to_string(),
                value: label.to_string(),
            },
        );
        let sitelinks = sitelinks
            .iter()
            .map(|(site, title)| {
                (
                    site.to_string(),
                    Sitelink {
                        site: site.to_string(),
                        title: title.to_string(),
                    },
                )
            })
            .collect();
        Entity {
            id: id.to_string(),
            labels,
            sitelinks: Some(sitelinks),
            claims: None,
            missing: None,
        }
    }

    /// Same as [`ScriptedWiki::entity`] but an instance of a disambiguation page
    pub fn disambiguation(id: &str, label: &str, sitelinks: &[(&str, &str)]) -> Entity {
        with_claim(
            Self::entity(id, label, sitelinks),
            INSTANCE_OF,
            json!({"entity-type": "item", "id": DISAMBIGUATION_PAGE}),
        )
    }

    /// Entity carrying an image (`P18`) claim
    pub fn illustrated(id: &str, label: &str, sitelinks: &[(&str, &str)], file: &str) -> Entity {
        with_claim(Self::entity(id, label, sitelinks), IMAGE, json!(file))
    }

    /// Every call so far, formatted `method:arg:arg`
    pub fn calls(&self) -> Vec<String> {
        self.script.lock().unwrap().calls.clone()
    }

    /// Arguments of the calls made to `method`
    pub fn calls_named(&self, method: &str) -> Vec<String> {
        let prefix = format!("{}:", method);
        self.calls()
            .into_iter()
            .filter_map(|call| call.strip_prefix(&prefix).map(str::to_string))
            .collect()
    }

    fn record(&self, call: String) {
        self.script.lock().unwrap().calls.push(call);
    }
}

fn with_claim(mut entity: Entity, property: &str, value: serde_json::Value) -> Entity {
    let claim = Claim {
        mainsnak: Snak {
            datavalue: Some(DataValue {
                value,
                value_type: None,
            }),
        },
    };
    entity
        .claims
        .get_or_insert_with(BTreeMap::new)
        .entry(property.to_string())
        .or_default()
        .push(claim);
    entity
}

fn key(lang: &str, title: &str) -> (String, String) {
    (lang.to_string(), title.to_string())
}

#[async_trait]
impl WikiApi for ScriptedWiki {
    async fn search_entities(&self, term: &str, lang: &str) -> ClientResult<Vec<EntitySearchHit>> {
        self.record(format!("search_entities:{}:{}", lang, term));
        let script = self.script.lock().unwrap();
        Ok(script.searches.get(term).cloned().unwrap_or_default())
    }

    async fn get_entities(&self, ids: &[String]) -> ClientResult<HashMap<String, Entity>> {
        self.record(format!("get_entities:{}", ids.join("|")));
        let script = self.script.lock().unwrap();
        Ok(ids
            .iter()
            .filter_map(|id| script.entities.get(id).map(|e| (id.clone(), e.clone())))
            .collect())
    }

    async fn get_final_title(&self, lang: &str, title: &str) -> ClientResult<Option<String>> {
        self.record(format!("get_final_title:{}:{}", lang, title));
        let script = self.script.lock().unwrap();
        if script.failing_titles.contains(lang) {
            return Err(ClientError::Api {
                code: "internal_api_error".to_string(),
                info: format!("scripted failure on {}", lang),
            });
        }
        Ok(script.titles.get(&key(lang, title)).cloned())
    }

    async fn get_language_links(
        &self,
        lang: &str,
        title: &str,
    ) -> ClientResult<BTreeMap<String, String>> {
        self.record(format!("get_language_links:{}:{}", lang, title));
        let script = self.script.lock().unwrap();
        Ok(script.langlinks.get(&key(lang, title)).cloned().unwrap_or_default())
    }

    async fn get_wikidata_id(&self, lang: &str, title: &str) -> ClientResult<Option<String>> {
        self.record(format!("get_wikidata_id:{}:{}", lang, title));
        let script = self.script.lock().unwrap();
        Ok(script.wikidata_ids.get(&key(lang, title)).cloned())
    }

    async fn get_random_articles(&self, lang: &str) -> ClientResult<Vec<RandomArticle>> {
        self.record(format!("get_random_articles:{}", lang));
        let draw = self
            .script
            .lock()
            .unwrap()
            .random
            .get_mut(lang)
            .and_then(VecDeque::pop_front)
            .unwrap_or(RandomDraw::Empty);
        match draw {
            RandomDraw::Article(article) => Ok(vec![article]),
            RandomDraw::Empty => Ok(Vec::new()),
            RandomDraw::RateLimited => Err(ClientError::RateLimited {
                host: format!("{}.wikipedia.org", lang),
            }),
        }
    }
}

// =============================================================================
// Recording browser surfaces
// =============================================================================

/// One command received by a [`RecordingSurface`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceCommand {
    LoadUrl(String),
    LoadStatic { html: String, base_url: String },
    Script(String),
    GoBack,
    Progress(bool),
    Content(bool),
}

#[derive(Debug, Default)]
struct SurfaceLog {
    lang: String,
    commands: Vec<SurfaceCommand>,
    can_go_back: bool,
}

/// [`BrowserSurface`] that records commands into a log shared with its
/// [`RecordingFactory`]
pub struct RecordingSurface {
    log: Arc<Mutex<SurfaceLog>>,
}

impl RecordingSurface {
    fn push(&self, command: SurfaceCommand) {
        self.log.lock().unwrap().commands.push(command);
    }
}

impl BrowserSurface for RecordingSurface {
    fn load_url(&mut self, url: &str) {
        self.push(SurfaceCommand::LoadUrl(url.to_string()));
    }

    fn load_static_content(&mut self, html: &str, base_url: &str) {
        self.push(SurfaceCommand::LoadStatic {
            html: html.to_string(),
            base_url: base_url.to_string(),
        });
    }

    fn evaluate_script(&mut self, script: &str) {
        self.push(SurfaceCommand::Script(script.to_string()));
    }

    fn can_go_back(&self) -> bool {
        self.log.lock().unwrap().can_go_back
    }

    fn go_back(&mut self) {
        self.push(SurfaceCommand::GoBack);
    }

    fn set_progress_visible(&mut self, visible: bool) {
        self.push(SurfaceCommand::Progress(visible));
    }

    fn set_content_visible(&mut self, visible: bool) {
        self.push(SurfaceCommand::Content(visible));
    }
}

/// Creates [`RecordingSurface`]s and keeps their logs, indexed by creation
/// order. Clones share the logs.
#[derive(Clone, Default)]
pub struct RecordingFactory {
    logs: Arc<Mutex<Vec<Arc<Mutex<SurfaceLog>>>>>,
}

impl SurfaceFactory for RecordingFactory {
    type Surface = RecordingSurface;

    fn create(&mut self, lang: &str) -> RecordingSurface {
        let log = Arc::new(Mutex::new(SurfaceLog {
            lang: lang.to_string(),
            ..Default::default()
        }));
        self.logs.lock().unwrap().push(log.clone());
        RecordingSurface { log }
    }
}

impl RecordingFactory {
    fn log(&self, index: usize) -> Option<Arc<Mutex<SurfaceLog>>> {
        self.logs.lock().unwrap().get(index).cloned()
    }

    /// Number of surfaces created so far
    pub fn created(&self) -> usize {
        self.logs.lock().unwrap().len()
    }

    /// Language of the surface created `index`-th
    pub fn lang(&self, index: usize) -> Option<String> {
        self.log(index).map(|log| log.lock().unwrap().lang.clone())
    }

    pub fn commands(&self, index: usize) -> Vec<SurfaceCommand> {
        self.log(index)
            .map(|log| log.lock().unwrap().commands.clone())
            .unwrap_or_default()
    }

    pub fn loaded_urls(&self, index: usize) -> Vec<String> {
        self.commands(index)
            .into_iter()
            .filter_map(|c| match c {
                SurfaceCommand::LoadUrl(url) => Some(url),
                _ => None,
            })
            .collect()
    }

    pub fn scripts(&self, index: usize) -> Vec<String> {
        self.commands(index)
            .into_iter()
            .filter_map(|c| match c {
                SurfaceCommand::Script(script) => Some(script),
                _ => None,
            })
            .collect()
    }

    /// Last progress visibility set on the surface, if any
    pub fn progress_visible(&self, index: usize) -> Option<bool> {
        self.commands(index).into_iter().rev().find_map(|c| match c {
            SurfaceCommand::Progress(v) => Some(v),
            _ => None,
        })
    }

    /// Last content visibility set on the surface, if any
    pub fn content_visible(&self, index: usize) -> Option<bool> {
        self.commands(index).into_iter().rev().find_map(|c| match c {
            SurfaceCommand::Content(v) => Some(v),
            _ => None,
        })
    }

    pub fn set_can_go_back(&self, index: usize, can_go_back: bool) {
        if let Some(log) = self.log(index) {
            log.lock().unwrap().can_go_back = can_go_back;
        }
    }

    pub fn clear(&self, index: usize) {
        if let Some(log) = self.log(index) {
            log.lock().unwrap().commands.clear();
        }
    }
}
