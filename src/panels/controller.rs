//! Panel synchronization controller
//!
//! Owns one [`Panel`] per display language and drives them through
//! `Idle -> Loading -> Settled` for every programmatic load. While a load
//! is in flight, navigation events are the controller's own doing and are
//! let through untouched; once settled, link clicks become new
//! resolutions.
//!
//! Every async continuation carries the [`Generation`] it was started
//! under. A continuation whose generation is no longer current is dropped.

use rosette_types::{ArticleTarget, ResolvedArticleSet};
use tracing::{debug, info};
use url::Url;

use super::session::{Generation, LoadSession};
use super::surface::{BrowserSurface, SurfaceFactory};
use crate::find::FIND_SCRIPT;
use crate::languages::LanguageSet;
use crate::wiki::urls::{is_content_url, language_of};
use crate::wiki::{article_title_from_url, base_url, build_page_url};

/// Base URL of the static "no article" document for a language
pub fn missing_article_base_url(lang: &str) -> String {
    format!("app://local/no_article/{}", lang)
}

/// Static document shown in a panel whose language has no article
pub fn missing_article_html(lang: &str) -> String {
    format!(
        "<html><body><div style=\"display:flex;justify-content:center;align-items:center;\
         height:100vh;text-align:center;font-family:sans-serif;color:#555;\">\
         <p>The {} edition is waiting for someone to write an article on that topic.</p>\
         </div></body></html>",
        lang
    )
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ControllerState {
    /// No load has been started since the panels were built
    #[default]
    Idle,
    /// Programmatic load in progress
    Loading,
    /// Every panel reported completion; user navigation is live
    Settled,
}

/// What the host should do with a navigation its surface is about to make
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationDecision {
    /// Let the surface navigate
    Proceed,
    /// Cancel the navigation and resolve this article across all panels
    Resolve { lang: String, title: String },
    /// Cancel the navigation and hand the URL to the external opener
    External(Url),
}

/// Result of a page-finished callback
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageOutcome {
    /// Counted toward the current load, others still pending
    Loading,
    /// This completion settled the load
    Settled,
    /// A page the user navigated to; carries its article title if any
    Browsing { title: Option<String> },
    /// Duplicate, stale, or unknown panel
    Ignored,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackOutcome {
    /// These panels went back
    Panels(Vec<usize>),
    /// Nothing to go back to
    Exit,
}

pub struct Panel<S> {
    lang: String,
    surface: S,
    user_navigated: bool,
}

impl<S: BrowserSurface> Panel<S> {
    pub fn lang(&self) -> &str {
        &self.lang
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn user_navigated(&self) -> bool {
        self.user_navigated
    }
}

pub struct PanelController<S: BrowserSurface> {
    panels: Vec<Panel<S>>,
    session: LoadSession,
    state: ControllerState,
}

impl<S: BrowserSurface> PanelController<S> {
    /// Build one panel per display language, in display order
    pub fn new<F>(languages: &LanguageSet, factory: &mut F) -> Self
    where
        F: SurfaceFactory<Surface = S>,
    {
        let panels = build_panels(languages, factory);
        let session = LoadSession::start(Generation::default(), panels.len());
        let mut controller = Self {
            panels,
            session,
            state: ControllerState::Idle,
        };
        controller.session.settle();
        controller
    }

    /// Tear every panel down and build a fresh set.
    ///
    /// Invalidates the current generation; the caller reloads content.
    pub fn rebuild<F>(&mut self, languages: &LanguageSet, factory: &mut F)
    where
        F: SurfaceFactory<Surface = S>,
    {
        info!(panels = languages.len(), "Rebuilding panels");
        self.panels = build_panels(languages, factory);
        let generation = self.session.generation().next();
        self.session = LoadSession::start(generation, self.panels.len());
        self.session.settle();
        self.state = ControllerState::Idle;
    }

    pub fn panels(&self) -> &[Panel<S>] {
        &self.panels
    }

    pub fn panel_mut(&mut self, index: usize) -> Option<&mut Panel<S>> {
        self.panels.get_mut(index)
    }

    pub fn len(&self) -> usize {
        self.panels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.panels.is_empty()
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    pub fn generation(&self) -> Generation {
        self.session.generation()
    }

    pub fn session(&self) -> &LoadSession {
        &self.session
    }

    pub fn is_programmatic(&self) -> bool {
        self.session.is_programmatic()
    }

    pub fn is_current(&self, generation: Generation) -> bool {
        self.session.generation() == generation
    }

    /// Enter `Loading`: reset counters, show progress, hide content.
    ///
    /// Returns the generation every continuation of this load must carry.
    pub fn begin(&mut self) -> Generation {
        let generation = self.session.generation().next();
        self.session = LoadSession::start(generation, self.panels.len());
        self.state = ControllerState::Loading;
        for panel in &mut self.panels {
            panel.user_navigated = false;
            panel.surface.set_progress_visible(true);
            panel.surface.set_content_visible(false);
        }
        debug!(%generation, "Programmatic load started");
        generation
    }

    /// Load a resolved article set into the panels.
    ///
    /// Returns false, touching nothing, when `generation` is stale.
    pub fn apply(&mut self, generation: Generation, set: &ResolvedArticleSet) -> bool {
        if !self.is_current(generation) {
            debug!(%generation, "Dropping stale article set");
            return false;
        }

        for (index, panel) in self.panels.iter_mut().enumerate() {
            match set.target(&panel.lang) {
                Some(ArticleTarget::Title { title }) => {
                    panel.surface.load_url(&build_page_url(&panel.lang, title));
                    self.session.expect_page(index);
                }
                Some(ArticleTarget::Missing) | None => {
                    panel.surface.load_static_content(
                        &missing_article_html(&panel.lang),
                        &missing_article_base_url(&panel.lang),
                    );
                    panel.surface.set_progress_visible(false);
                    panel.surface.set_content_visible(true);
                    self.session.expect_immediate(index);
                }
            }
        }
        info!(
            %generation,
            label = %set.label,
            pages = self.session.pages_to_load(),
            "Loading article set"
        );

        self.settle_if_loaded();
        true
    }

    /// Programmatic load of every panel's landing page
    pub fn load_default_pages(&mut self) -> Generation {
        let generation = self.begin();
        for (index, panel) in self.panels.iter_mut().enumerate() {
            panel.surface.load_url(&base_url(&panel.lang));
            self.session.expect_page(index);
        }
        self.settle_if_loaded();
        generation
    }

    /// Terminal failure of the load: nothing to load, settle immediately
    pub fn fail(&mut self, generation: Generation) -> bool {
        if !self.is_current(generation) {
            return false;
        }
        self.settle_if_loaded();
        true
    }

    pub fn page_started(&mut self, panel: usize) {
        let Some(p) = self.panels.get_mut(panel) else {
            return;
        };
        p.surface.set_progress_visible(true);
        p.surface.set_content_visible(false);
        if self.session.is_programmatic() {
            self.session.mark_started(panel);
        }
    }

    /// Page-finished callback from panel `panel`.
    ///
    /// Reinjects the find script, reveals the panel and counts the
    /// completion at most once per session.
    pub fn page_finished(&mut self, panel: usize, url: Option<&str>) -> PageOutcome {
        let Some(p) = self.panels.get_mut(panel) else {
            return PageOutcome::Ignored;
        };
        p.surface.evaluate_script(FIND_SCRIPT);
        p.surface.set_progress_visible(false);
        p.surface.set_content_visible(true);

        if !self.session.is_programmatic() {
            let title = url
                .and_then(|u| Url::parse(u).ok())
                .and_then(|u| article_title_from_url(&u));
            return PageOutcome::Browsing { title };
        }

        if !self.session.complete(panel) {
            return PageOutcome::Ignored;
        }
        debug!(
            panel,
            loaded = self.session.pages_loaded(),
            expected = self.session.pages_to_load(),
            "Panel finished loading"
        );
        if self.settle_if_loaded() {
            PageOutcome::Settled
        } else {
            PageOutcome::Loading
        }
    }

    /// Navigation-intercept hook for panel `panel`
    pub fn navigation(&mut self, panel: usize, url: &str) -> NavigationDecision {
        if self.session.is_programmatic() {
            return NavigationDecision::Proceed;
        }
        let Some(p) = self.panels.get_mut(panel) else {
            return NavigationDecision::Proceed;
        };
        let Ok(parsed) = Url::parse(url) else {
            return NavigationDecision::Proceed;
        };

        if !is_content_url(&parsed) {
            return NavigationDecision::External(parsed);
        }

        match article_title_from_url(&parsed) {
            Some(title) => {
                let lang = language_of(&parsed).unwrap_or(&p.lang).to_string();
                info!(%lang, %title, "Link intercepted");
                NavigationDecision::Resolve { lang, title }
            }
            None => {
                p.user_navigated = true;
                NavigationDecision::Proceed
            }
        }
    }

    /// Back navigation across panels.
    ///
    /// Panels the user navigated since the last programmatic load go back
    /// first; otherwise every panel with history goes back.
    pub fn back(&mut self) -> BackOutcome {
        let tracked: Vec<usize> = self
            .panels
            .iter()
            .enumerate()
            .filter(|(_, p)| p.user_navigated && p.surface.can_go_back())
            .map(|(i, _)| i)
            .collect();

        let targets = if tracked.is_empty() {
            self.panels
                .iter()
                .enumerate()
                .filter(|(_, p)| p.surface.can_go_back())
                .map(|(i, _)| i)
                .collect()
        } else {
            tracked
        };

        if targets.is_empty() {
            return BackOutcome::Exit;
        }
        for &index in &targets {
            let panel = &mut self.panels[index];
            panel.surface.go_back();
            panel.user_navigated = false;
        }
        BackOutcome::Panels(targets)
    }

    fn settle_if_loaded(&mut self) -> bool {
        if self.state != ControllerState::Loading || !self.session.all_loaded() {
            return false;
        }
        self.session.settle();
        self.state = ControllerState::Settled;
        for panel in &mut self.panels {
            panel.surface.set_progress_visible(false);
            panel.surface.set_content_visible(true);
        }
        info!(generation = %self.session.generation(), "All panels settled");
        true
    }
}

fn build_panels<F: SurfaceFactory>(languages: &LanguageSet, factory: &mut F) -> Vec<Panel<F::Surface>> {
    languages
        .display()
        .iter()
        .map(|lang| Panel {
            lang: lang.clone(),
            surface: factory.create(lang),
            user_navigated: false,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{RecordingFactory, SurfaceCommand};
    use rosette_types::PanelArticle;

    fn controller() -> (PanelController<crate::testing::RecordingSurface>, RecordingFactory) {
        let mut factory = RecordingFactory::default();
        let controller = PanelController::new(&LanguageSet::default(), &mut factory);
        (controller, factory)
    }

    fn article_set(targets: &[(&str, Option<&str>)]) -> ResolvedArticleSet {
        ResolvedArticleSet {
            entity_id: Some("Q9394".to_string()),
            label: "Rabbit".to_string(),
            source: None,
            articles: targets
                .iter()
                .map(|(lang, title)| PanelArticle {
                    lang: lang.to_string(),
                    target: title.map(ArticleTarget::title).unwrap_or(ArticleTarget::Missing),
                })
                .collect(),
        }
    }

    fn rabbit() -> ResolvedArticleSet {
        article_set(&[("en", Some("Rabbit")), ("fr", Some("Lapin")), ("ja", None)])
    }

    fn finish(controller: &mut PanelController<crate::testing::RecordingSurface>, panel: usize) -> PageOutcome {
        controller.page_started(panel);
        controller.page_finished(panel, None)
    }

    #[test]
    fn test_apply_loads_titles_and_missing_pages() {
        let (mut controller, factory) = controller();
        let generation = controller.begin();
        assert_eq!(controller.state(), ControllerState::Loading);
        assert!(controller.apply(generation, &rabbit()));

        assert!(factory
            .commands(0)
            .contains(&SurfaceCommand::LoadUrl("https://en.m.wikipedia.org/wiki/Rabbit".to_string())));
        assert!(factory
            .commands(1)
            .contains(&SurfaceCommand::LoadUrl("https://fr.m.wikipedia.org/wiki/Lapin".to_string())));
        assert!(factory.commands(2).contains(&SurfaceCommand::LoadStatic {
            html: missing_article_html("ja"),
            base_url: "app://local/no_article/ja".to_string(),
        }));

        // the missing page already counts
        assert_eq!(controller.session().pages_to_load(), 3);
        assert_eq!(controller.session().pages_loaded(), 1);
    }

    #[test]
    fn test_settles_after_every_panel() {
        let (mut controller, _) = controller();
        let generation = controller.begin();
        controller.apply(generation, &rabbit());

        assert_eq!(finish(&mut controller, 1), PageOutcome::Loading);
        assert!(controller.is_programmatic());
        assert_eq!(finish(&mut controller, 0), PageOutcome::Settled);
        assert!(!controller.is_programmatic());
        assert_eq!(controller.state(), ControllerState::Settled);
    }

    #[test]
    fn test_settles_on_finish_callbacks_alone() {
        let (mut controller, _) = controller();
        let generation = controller.begin();
        controller.apply(
            generation,
            &article_set(&[("en", Some("Rabbit")), ("fr", Some("Lapin")), ("ja", Some("ウサギ"))]),
        );

        assert_eq!(controller.page_finished(0, None), PageOutcome::Loading);
        assert_eq!(controller.page_finished(0, None), PageOutcome::Ignored);
        assert_eq!(controller.page_finished(1, None), PageOutcome::Loading);
        assert_eq!(controller.page_finished(2, None), PageOutcome::Settled);
        assert_eq!(controller.session().pages_loaded(), 3);
        assert!(!controller.is_programmatic());
    }

    #[test]
    fn test_duplicate_completion_does_not_settle_early() {
        let (mut controller, _) = controller();
        let generation = controller.begin();
        controller.apply(generation, &rabbit());

        assert_eq!(finish(&mut controller, 0), PageOutcome::Loading);
        assert_eq!(finish(&mut controller, 0), PageOutcome::Ignored);
        assert_eq!(controller.page_finished(0, None), PageOutcome::Ignored);
        assert_eq!(controller.session().pages_loaded(), 2);
        assert_eq!(controller.state(), ControllerState::Loading);

        assert_eq!(finish(&mut controller, 1), PageOutcome::Settled);
    }

    #[test]
    fn test_static_page_callbacks_are_not_counted() {
        let (mut controller, _) = controller();
        let generation = controller.begin();
        controller.apply(generation, &rabbit());

        assert_eq!(finish(&mut controller, 2), PageOutcome::Ignored);
        assert_eq!(controller.session().pages_loaded(), 1);
    }

    #[test]
    fn test_all_missing_settles_immediately() {
        let (mut controller, _) = controller();
        let generation = controller.begin();
        controller.apply(generation, &article_set(&[("en", None), ("fr", None), ("ja", None)]));
        assert_eq!(controller.state(), ControllerState::Settled);
    }

    #[test]
    fn test_stale_generation_is_dropped() {
        let (mut controller, factory) = controller();
        let first = controller.begin();
        let second = controller.begin();

        assert!(!controller.apply(first, &rabbit()));
        assert!(!controller.fail(first));
        assert!(factory.loaded_urls(0).is_empty());
        assert_eq!(controller.generation(), second);
        assert_eq!(controller.state(), ControllerState::Loading);
    }

    #[test]
    fn test_fail_settles_with_nothing_loaded() {
        let (mut controller, factory) = controller();
        let generation = controller.begin();
        assert!(controller.fail(generation));

        assert_eq!(controller.state(), ControllerState::Settled);
        assert_eq!(controller.session().pages_to_load(), 0);
        assert!(factory.loaded_urls(0).is_empty());
        assert_eq!(factory.progress_visible(0), Some(false));
        assert_eq!(factory.content_visible(0), Some(true));
    }

    #[test]
    fn test_begin_shows_progress_and_hides_content() {
        let (mut controller, factory) = controller();
        controller.begin();
        for panel in 0..3 {
            assert_eq!(factory.progress_visible(panel), Some(true));
            assert_eq!(factory.content_visible(panel), Some(false));
        }
    }

    #[test]
    fn test_navigation_during_programmatic_load_proceeds() {
        let (mut controller, _) = controller();
        let generation = controller.begin();
        controller.apply(generation, &rabbit());

        assert_eq!(
            controller.navigation(0, "https://en.m.wikipedia.org/wiki/Hare"),
            NavigationDecision::Proceed
        );
    }

    #[test]
    fn test_navigation_after_settle() {
        let (mut controller, _) = controller();
        let generation = controller.begin();
        controller.apply(generation, &rabbit());
        finish(&mut controller, 0);
        finish(&mut controller, 1);

        assert_eq!(
            controller.navigation(1, "https://fr.m.wikipedia.org/wiki/Li%C3%A8vre"),
            NavigationDecision::Resolve {
                lang: "fr".to_string(),
                title: "Lièvre".to_string()
            }
        );
        assert!(matches!(
            controller.navigation(0, "https://www.example.com/rabbits"),
            NavigationDecision::External(_)
        ));
        assert_eq!(
            controller.navigation(0, "https://en.m.wikipedia.org/"),
            NavigationDecision::Proceed
        );
        assert!(controller.panels()[0].user_navigated());
    }

    #[test]
    fn test_browsing_reports_title() {
        let (mut controller, _) = controller();
        let generation = controller.begin();
        controller.apply(generation, &article_set(&[("en", None), ("fr", None), ("ja", None)]));

        let outcome = controller.page_finished(0, Some("https://en.m.wikipedia.org/wiki/Grand_Canyon"));
        assert_eq!(
            outcome,
            PageOutcome::Browsing {
                title: Some("Grand Canyon".to_string())
            }
        );
    }

    #[test]
    fn test_page_finished_injects_find_script() {
        let (mut controller, factory) = controller();
        controller.page_finished(1, None);
        assert!(factory
            .commands(1)
            .contains(&SurfaceCommand::Script(FIND_SCRIPT.to_string())));
    }

    #[test]
    fn test_default_pages() {
        let (mut controller, factory) = controller();
        controller.load_default_pages();
        assert_eq!(factory.loaded_urls(2), vec!["https://ja.m.wikipedia.org".to_string()]);
        assert_eq!(controller.session().pages_to_load(), 3);
    }

    #[test]
    fn test_back_prefers_user_navigated_panels() {
        let (mut controller, factory) = controller();
        controller.load_default_pages();
        for panel in 0..3 {
            finish(&mut controller, panel);
        }
        factory.set_can_go_back(0, true);
        factory.set_can_go_back(2, true);

        controller.navigation(2, "https://ja.m.wikipedia.org/");
        assert_eq!(controller.back(), BackOutcome::Panels(vec![2]));
        assert_eq!(controller.back(), BackOutcome::Panels(vec![0, 2]));

        factory.set_can_go_back(0, false);
        factory.set_can_go_back(2, false);
        assert_eq!(controller.back(), BackOutcome::Exit);
    }

    #[test]
    fn test_rebuild_invalidates_generation() {
        let (mut controller, mut factory) = controller();
        let generation = controller.begin();
        let languages = LanguageSet::new(["de", "en"], Vec::<String>::new()).unwrap();
        controller.rebuild(&languages, &mut factory);

        assert_eq!(controller.len(), 2);
        assert_eq!(controller.panels()[0].lang(), "de");
        assert_eq!(controller.state(), ControllerState::Idle);
        assert!(!controller.apply(generation, &rabbit()));
    }
}
