//! Reader driver
//!
//! [`Reader`] is the single owner of the panels, the find session and the
//! current topic. Network work runs as tokio tasks ("jobs"); their results
//! come back over a channel and are applied by [`Reader::pump`] or
//! [`Reader::wait_idle`] on the driver's side.
//!
//! Starting a job cancels the previous one. Results carry the sequence
//! number of the job that produced them and are dropped unless that job is
//! still the active one.
//!
//! Jobs are spawned with `tokio::spawn`, so the reader must be driven from
//! within a tokio runtime.

use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use rosette_types::ResolvedArticleSet;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::{RosetteConfig, DEFAULT_ENTITY_ID};
use crate::error::{ResolveError, Result};
use crate::find::{FindCoordinator, ScriptCommand};
use crate::languages::LanguageSet;
use crate::panels::{
    BackOutcome, BrowserSurface, ControllerState, Generation, NavigationDecision, PageOutcome,
    PanelController, SurfaceFactory,
};
use crate::random::{RandomSampler, SampleOutcome};
use crate::resolver::ArticleResolver;
use crate::settings::SettingsStore;
use crate::suggest::{SuggestionBatch, SuggestionDebouncer, SuggestionService};
use crate::wiki::WikiApi;

/// User-visible status line
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ReaderStatus {
    #[default]
    Hidden,
    Searching(String),
    SamplingRandom,
    Loading(String),
    /// Terminal: no article for the term in any search-priority language
    NotFound(String),
    /// Terminal: the random sampler ran out of attempts
    NoRandomTopic,
    /// Terminal: any other resolution failure
    Failed(String),
}

impl fmt::Display for ReaderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReaderStatus::Hidden => Ok(()),
            ReaderStatus::Searching(term) => write!(f, "Searching for \"{}\"...", term),
            ReaderStatus::SamplingRandom => write!(f, "Looking for a random article..."),
            ReaderStatus::Loading(label) => write!(f, "Loading \"{}\"...", label),
            ReaderStatus::NotFound(term) => write!(f, "Article \"{}\" not found", term),
            ReaderStatus::NoRandomTopic => {
                write!(f, "No random article found in all display languages")
            }
            ReaderStatus::Failed(message) => write!(f, "{}", message),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum JobKind {
    Startup,
    Search,
    Entity,
    Link,
    Random,
}

enum JobOutcome {
    Resolved(std::result::Result<ResolvedArticleSet, ResolveError>),
    Sampled(SampleOutcome),
}

struct JobResult {
    seq: u64,
    outcome: JobOutcome,
}

struct ActiveJob {
    seq: u64,
    kind: JobKind,
    /// Load session the result goes into; random jobs open theirs on success
    generation: Option<Generation>,
    cancel: CancellationToken,
}

pub struct Reader<F: SurfaceFactory> {
    api: Arc<dyn WikiApi>,
    config: RosetteConfig,
    settings: Arc<dyn SettingsStore>,
    languages: LanguageSet,
    resolver: ArticleResolver,
    sampler: Arc<RandomSampler>,
    factory: F,
    controller: PanelController<F::Surface>,
    find: FindCoordinator,
    current: watch::Sender<Option<Arc<ResolvedArticleSet>>>,
    status: watch::Sender<ReaderStatus>,
    job: Option<ActiveJob>,
    next_seq: u64,
    results_tx: mpsc::UnboundedSender<JobResult>,
    results_rx: mpsc::UnboundedReceiver<JobResult>,
}

impl<F: SurfaceFactory> Reader<F> {
    /// Build the reader and its panels from the stored language settings
    pub fn new(
        api: Arc<dyn WikiApi>,
        settings: Arc<dyn SettingsStore>,
        mut factory: F,
        config: RosetteConfig,
    ) -> Self {
        let languages = match settings.load() {
            Ok(stored) => stored.language_set(),
            Err(e) => {
                warn!(error = %e, "Settings unreadable, using default languages");
                LanguageSet::default()
            }
        };
        let controller = PanelController::new(&languages, &mut factory);
        let find = FindCoordinator::new(controller.len());
        let (resolver, sampler) = services(&api, &languages, &config);
        let (results_tx, results_rx) = mpsc::unbounded_channel();

        Self {
            api,
            config,
            settings,
            languages,
            resolver,
            sampler,
            factory,
            controller,
            find,
            current: watch::channel(None).0,
            status: watch::channel(ReaderStatus::Hidden).0,
            job: None,
            next_seq: 0,
            results_tx,
            results_rx,
        }
    }

    pub fn languages(&self) -> &LanguageSet {
        &self.languages
    }

    pub fn controller(&self) -> &PanelController<F::Surface> {
        &self.controller
    }

    pub fn find(&self) -> &FindCoordinator {
        &self.find
    }

    /// Snapshot of the topic currently shown
    pub fn current_topic(&self) -> Option<Arc<ResolvedArticleSet>> {
        self.current.borrow().clone()
    }

    pub fn subscribe_topic(&self) -> watch::Receiver<Option<Arc<ResolvedArticleSet>>> {
        self.current.subscribe()
    }

    pub fn status(&self) -> ReaderStatus {
        self.status.borrow().clone()
    }

    pub fn subscribe_status(&self) -> watch::Receiver<ReaderStatus> {
        self.status.subscribe()
    }

    /// Suggestion service bound to the current API and languages
    pub fn suggestions(&self) -> SuggestionService {
        SuggestionService::new(self.api.clone(), self.languages.clone())
    }

    /// Debounced suggestions using the configured quiet period
    pub fn suggestion_debouncer(
        &self,
    ) -> (SuggestionDebouncer, mpsc::UnboundedReceiver<SuggestionBatch>) {
        SuggestionDebouncer::new(Arc::new(self.suggestions()), self.config.suggest_debounce())
    }

    pub fn has_pending_job(&self) -> bool {
        self.job.is_some()
    }

    // =========================================================================
    // Operations
    // =========================================================================

    /// Open the last visited entity, or the default topic on first run
    pub fn start(&mut self) {
        let id = match self.settings.last_entity_id() {
            Ok(Some(id)) => id,
            Ok(None) => DEFAULT_ENTITY_ID.to_string(),
            Err(e) => {
                warn!(error = %e, "Last entity unavailable");
                DEFAULT_ENTITY_ID.to_string()
            }
        };
        info!(%id, "Starting reader");
        self.resolve_entity_job(JobKind::Startup, id);
    }

    /// Free-text search
    pub fn search(&mut self, term: &str) {
        let term = term.trim().to_string();
        if term.is_empty() {
            return;
        }
        self.set_status(ReaderStatus::Searching(term.clone()));
        let generation = self.controller.begin();
        let resolver = self.resolver.clone();
        self.spawn_job(JobKind::Search, Some(generation), move |_| async move {
            JobOutcome::Resolved(resolver.search(&term).await)
        });
    }

    /// Open a Wikidata entity, e.g. a picked suggestion
    pub fn open_entity(&mut self, id: &str) {
        self.resolve_entity_job(JobKind::Entity, id.to_string());
    }

    /// Open a topic whose sitelinks are already known; no network access
    pub fn open_known(
        &mut self,
        label: &str,
        entity_id: Option<&str>,
        sitelinks: &BTreeMap<String, String>,
    ) {
        self.cancel_job();
        let set = self.resolver.from_sitelinks(label, entity_id, sitelinks);
        let generation = self.controller.begin();
        self.show(generation, set);
    }

    /// Sample a random topic available in every display language
    pub fn random(&mut self) {
        self.set_status(ReaderStatus::SamplingRandom);
        let sampler = self.sampler.clone();
        self.spawn_job(JobKind::Random, None, move |cancel| async move {
            JobOutcome::Sampled(sampler.sample(&cancel).await)
        });
    }

    /// Landing page of every display language
    pub fn load_default_pages(&mut self) {
        self.cancel_job();
        self.controller_default_pages();
    }

    /// Rebuild the panels for a new layout and reload the current topic
    pub fn relayout(&mut self) {
        self.rebuild();
        match self.current_topic() {
            Some(set) => {
                let generation = self.controller.begin();
                self.show(generation, (*set).clone());
            }
            None => self.controller_default_pages(),
        }
    }

    /// Change the language configuration, persist it and reload the
    /// current topic in the new languages
    pub fn set_languages(&mut self, languages: LanguageSet) -> Result<()> {
        self.settings.save_languages(&languages)?;
        let (resolver, sampler) = services(&self.api, &languages, &self.config);
        self.languages = languages;
        self.resolver = resolver;
        self.sampler = sampler;
        self.rebuild();

        match self.current_topic() {
            Some(set) => match &set.entity_id {
                Some(id) => self.open_entity(id),
                None => self.search(&set.label),
            },
            None => self.controller_default_pages(),
        }
        Ok(())
    }

    // =========================================================================
    // Surface callbacks
    // =========================================================================

    pub fn page_started(&mut self, panel: usize) {
        self.controller.page_started(panel);
    }

    /// Returns the article title of a page the user browsed to
    pub fn page_finished(&mut self, panel: usize, url: Option<&str>) -> Option<String> {
        match self.controller.page_finished(panel, url) {
            PageOutcome::Settled => {
                self.set_status(ReaderStatus::Hidden);
                None
            }
            PageOutcome::Browsing { title } => title,
            PageOutcome::Loading | PageOutcome::Ignored => None,
        }
    }

    /// Navigation intercept. `Resolve` starts a new resolution; the host
    /// cancels the navigation for `Resolve` and `External`.
    pub fn navigation(&mut self, panel: usize, url: &str) -> NavigationDecision {
        let decision = self.controller.navigation(panel, url);
        if let NavigationDecision::Resolve { lang, title } = &decision {
            self.set_status(ReaderStatus::Searching(title.clone()));
            let generation = self.controller.begin();
            let resolver = self.resolver.clone();
            let (lang, title) = (lang.clone(), title.clone());
            self.spawn_job(JobKind::Link, Some(generation), move |_| async move {
                JobOutcome::Resolved(resolver.resolve_link(&lang, &title).await)
            });
        }
        decision
    }

    pub fn back(&mut self) -> BackOutcome {
        self.controller.back()
    }

    // =========================================================================
    // Find in page
    // =========================================================================

    /// New find text; returns the `"x/y"` display
    pub fn find_text(&mut self, text: &str) -> String {
        let commands = self.find.set_text(text);
        self.run_scripts(commands);
        self.find.display()
    }

    pub fn find_result(&mut self, panel: usize, match_count: usize, active_index: usize) -> String {
        self.find.on_result(panel, match_count, active_index);
        self.find.display()
    }

    pub fn find_next(&mut self) -> String {
        let command = self.find.next();
        self.run_scripts(command);
        self.find.display()
    }

    pub fn find_previous(&mut self) -> String {
        let command = self.find.previous();
        self.run_scripts(command);
        self.find.display()
    }

    pub fn close_find(&mut self) {
        let commands = self.find.clear();
        self.run_scripts(commands);
    }

    // =========================================================================
    // Job results
    // =========================================================================

    /// Apply every job result already delivered; returns how many there were
    pub fn pump(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(result) = self.results_rx.try_recv() {
            self.handle(result);
            applied += 1;
        }
        applied
    }

    /// Wait until the active job (if any) has delivered and been applied
    pub async fn wait_idle(&mut self) {
        while self.job.is_some() {
            match self.results_rx.recv().await {
                Some(result) => self.handle(result),
                None => break,
            }
        }
    }

    fn handle(&mut self, result: JobResult) {
        let is_active = self.job.as_ref().is_some_and(|job| job.seq == result.seq);
        if !is_active {
            debug!(seq = result.seq, "Dropping result of superseded job");
            return;
        }
        let Some(job) = self.job.take() else {
            return;
        };

        match (result.outcome, job.generation) {
            (JobOutcome::Resolved(Ok(set)), Some(generation)) => self.show(generation, set),
            (JobOutcome::Resolved(Err(e)), Some(generation)) => self.resolution_failed(job.kind, generation, e),
            (JobOutcome::Sampled(SampleOutcome::Found(set)), _) => {
                let generation = self.controller.begin();
                self.show(generation, set);
            }
            (JobOutcome::Sampled(SampleOutcome::NotFound), _) => {
                self.set_status(ReaderStatus::NoRandomTopic);
            }
            (JobOutcome::Sampled(SampleOutcome::Cancelled), _) => {}
            (JobOutcome::Resolved(_), None) => {
                warn!(kind = ?job.kind, "Resolution job without a load session");
            }
        }
    }

    fn show(&mut self, generation: Generation, set: ResolvedArticleSet) {
        if !self.controller.apply(generation, &set) {
            return;
        }
        self.rebuild_find();

        if let Some(id) = &set.entity_id {
            if let Err(e) = self.settings.save_last_entity_id(id) {
                warn!(%id, error = %e, "Could not save last entity");
            }
        }
        let label = set.label.clone();
        self.current.send_replace(Some(Arc::new(set)));

        if self.controller.state() == ControllerState::Settled {
            self.set_status(ReaderStatus::Hidden);
        } else {
            self.set_status(ReaderStatus::Loading(label));
        }
    }

    fn resolution_failed(&mut self, kind: JobKind, generation: Generation, error: ResolveError) {
        if kind == JobKind::Startup {
            warn!(error = %error, "Startup topic unavailable, loading landing pages");
            if self.controller.is_current(generation) {
                self.controller_default_pages();
            }
            return;
        }

        info!(error = %error, "Resolution failed");
        if !self.controller.fail(generation) {
            return;
        }
        self.current.send_replace(None);
        let status = match error {
            ResolveError::NotFound { term } => ReaderStatus::NotFound(term),
            other => ReaderStatus::Failed(other.to_string()),
        };
        self.set_status(status);
    }

    fn resolve_entity_job(&mut self, kind: JobKind, id: String) {
        self.set_status(ReaderStatus::Searching(id.clone()));
        let generation = self.controller.begin();
        let resolver = self.resolver.clone();
        self.spawn_job(kind, Some(generation), move |_| async move {
            JobOutcome::Resolved(resolver.resolve_entity(&id).await)
        });
    }

    fn spawn_job<W, Fut>(&mut self, kind: JobKind, generation: Option<Generation>, work: W)
    where
        W: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = JobOutcome> + Send + 'static,
    {
        self.cancel_job();

        self.next_seq += 1;
        let seq = self.next_seq;
        let cancel = CancellationToken::new();
        let future = work(cancel.clone());
        let token = cancel.clone();
        let results = self.results_tx.clone();

        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                outcome = future => {
                    let _ = results.send(JobResult { seq, outcome });
                }
            }
        });
        debug!(seq, ?kind, "Job started");
        self.job = Some(ActiveJob {
            seq,
            kind,
            generation,
            cancel,
        });
    }

    /// Cancel the active job. A load session it opened that nothing has
    /// replaced yet is settled with nothing loaded.
    fn cancel_job(&mut self) {
        if let Some(job) = self.job.take() {
            debug!(seq = job.seq, kind = ?job.kind, "Cancelling job");
            job.cancel.cancel();
            if let Some(generation) = job.generation {
                if self.controller.fail(generation) {
                    debug!(%generation, "Abandoned load session settled");
                }
            }
        }
    }

    fn rebuild(&mut self) {
        self.cancel_job();
        self.controller.rebuild(&self.languages, &mut self.factory);
        self.rebuild_find();
    }

    fn rebuild_find(&mut self) {
        self.find.reset(self.controller.len());
    }

    fn controller_default_pages(&mut self) {
        self.rebuild_find();
        self.controller.load_default_pages();
        self.set_status(ReaderStatus::Hidden);
    }

    fn run_scripts(&mut self, commands: impl IntoIterator<Item = ScriptCommand>) {
        for command in commands {
            if let Some(panel) = self.controller.panel_mut(command.panel) {
                panel.surface_mut().evaluate_script(&command.script);
            }
        }
    }

    fn set_status(&self, status: ReaderStatus) {
        self.status.send_replace(status);
    }
}

fn services(
    api: &Arc<dyn WikiApi>,
    languages: &LanguageSet,
    config: &RosetteConfig,
) -> (ArticleResolver, Arc<RandomSampler>) {
    let resolver = ArticleResolver::new(api.clone(), languages.clone());
    let sampler = RandomSampler::new(api.clone(), resolver.clone(), config.random.clone());
    (resolver, Arc::new(sampler))
}
