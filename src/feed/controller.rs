//! The personalized feed view: load, narrow, filter, page.
use std::borrow::Cow;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use super::filter::FilterCriteria;
use super::pagination::{Page, Paginator};
use crate::catalog::ArticleCatalog;
use crate::gateway::{
    cancellable, Article, ArticleId, GatewayError, RemoteGateway, MAX_TRENDING_LIMIT,
};
use crate::preferences::{PreferenceError, PreferenceSet, PreferenceStore, SaveOutcome};
use crate::session::Session;

/// How a feed load ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Every source loaded.
    Complete,
    /// At least one source failed; the view shows what could be loaded and a
    /// status message says what is missing.
    Degraded,
    /// The controller was cancelled mid-load; nothing was applied.
    Cancelled,
}

/// Owner of one feed view.
///
/// The visible collection is always `filter(narrow(catalog, preferences))`,
/// re-derived whenever the catalog, the preferences or the criteria change.
/// Every re-derivation puts the view back on page 1.
///
/// All network calls are bound to the controller's cancellation token.
/// Cancelling (or dropping) the controller abandons in-flight calls and
/// their results are never applied.
pub struct FeedController {
    gateway: Arc<dyn RemoteGateway>,
    session: Session,
    preferences: PreferenceStore,
    catalog: ArticleCatalog,
    criteria: FilterCriteria,
    visible: Vec<Article>,
    paginator: Paginator,
    trending: Vec<Article>,
    status_message: Option<Cow<'static, str>>,
    cancel: CancellationToken,
}

impl FeedController {
    pub fn new(session: Session, gateway: Arc<dyn RemoteGateway>, page_size: usize) -> Self {
        Self {
            preferences: PreferenceStore::new(session.clone(), Arc::clone(&gateway)),
            catalog: ArticleCatalog::new(Arc::clone(&gateway)),
            gateway,
            session,
            criteria: FilterCriteria::default(),
            visible: Vec::new(),
            paginator: Paginator::new(page_size),
            trending: Vec::new(),
            status_message: None,
            cancel: CancellationToken::new(),
        }
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn preferences(&self) -> &PreferenceSet {
        self.preferences.current()
    }

    /// Sanitized categories, for preference selection.
    pub fn categories(&self) -> &[String] {
        self.catalog.categories()
    }

    /// The full catalog, before narrowing.
    pub fn catalog(&self) -> &[Article] {
        self.catalog.articles()
    }

    pub fn criteria(&self) -> &FilterCriteria {
        &self.criteria
    }

    /// Narrowed and filtered articles, across all pages.
    pub fn visible(&self) -> &[Article] {
        &self.visible
    }

    pub fn paginator(&self) -> &Paginator {
        &self.paginator
    }

    pub fn current_page(&self) -> Page<'_, Article> {
        self.paginator.page(&self.visible)
    }

    pub fn trending(&self) -> &[Article] {
        &self.trending
    }

    pub fn status_message(&self) -> Option<&str> {
        self.status_message.as_deref()
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    fn set_status(&mut self, msg: impl Into<Cow<'static, str>>) {
        self.status_message = Some(msg.into());
    }

    // ------------------------------------------------------------------
    // Loading
    // ------------------------------------------------------------------

    /// Initial load: reset the criteria, then fetch everything.
    pub async fn load(&mut self) -> LoadOutcome {
        self.criteria.clear();
        self.refresh().await
    }

    /// Re-fetch preferences, articles and categories, keeping the criteria.
    ///
    /// The three requests run concurrently; narrowing waits for all of them.
    /// A failed preference read shows the feed unfiltered, a failed article
    /// or category read keeps what was loaded before.
    pub async fn refresh(&mut self) -> LoadOutcome {
        let (prefs, articles, categories) = tokio::join!(
            cancellable(&self.cancel, self.preferences.fetch()),
            cancellable(&self.cancel, self.catalog.fetch_articles()),
            cancellable(&self.cancel, self.catalog.fetch_categories()),
        );

        let cancelled = [
            prefs.as_ref().err(),
            articles.as_ref().err(),
            categories.as_ref().err(),
        ]
        .into_iter()
        .flatten()
        .any(GatewayError::is_cancelled);
        if cancelled {
            tracing::debug!("Feed load cancelled, discarding results");
            return LoadOutcome::Cancelled;
        }

        let prefs_failed = prefs.is_err();
        self.preferences.apply_fetch(prefs);
        let articles_failed = self.catalog.apply_articles(articles).is_err();
        let categories_failed = self.catalog.apply_categories(categories).is_err();

        self.rederive();

        let mut missing = Vec::new();
        if articles_failed {
            missing.push("articles");
        }
        if prefs_failed {
            missing.push("preferences");
        }
        if categories_failed {
            missing.push("categories");
        }

        if missing.is_empty() {
            self.status_message = None;
            tracing::info!(
                user_id = %self.session.user_id,
                catalog = self.catalog.articles().len(),
                visible = self.visible.len(),
                "Feed loaded"
            );
            LoadOutcome::Complete
        } else {
            self.set_status(format!("Could not load {}", missing.join(", ")));
            LoadOutcome::Degraded
        }
    }

    /// Fetch up to `limit` trending articles (clamped to 1..=50). Does not
    /// touch the paged feed. On failure the previous trending list is kept.
    pub async fn load_trending(&mut self, limit: u32) -> Result<&[Article], GatewayError> {
        let limit = limit.clamp(1, MAX_TRENDING_LIMIT);
        match cancellable(&self.cancel, self.gateway.trending(limit)).await {
            Ok(articles) => {
                tracing::debug!(limit, count = articles.len(), "Loaded trending articles");
                self.trending = articles;
                Ok(self.trending.as_slice())
            }
            Err(e) => {
                if !e.is_cancelled() {
                    tracing::warn!(error = %e, "Failed to load trending articles");
                    self.set_status("Could not load trending articles");
                }
                Err(e)
            }
        }
    }

    /// Fetch one article by id.
    pub async fn article(&self, id: ArticleId) -> Result<Article, GatewayError> {
        cancellable(&self.cancel, self.gateway.get_article(id))
            .await
            .inspect_err(|e| {
                tracing::warn!(article_id = id, error = %e, "Failed to load article");
            })
    }

    // ------------------------------------------------------------------
    // Preferences
    // ------------------------------------------------------------------

    /// Persist a new preference set and re-narrow the feed with whatever the
    /// backend confirmed.
    pub async fn save_preferences(
        &mut self,
        set: PreferenceSet,
    ) -> Result<SaveOutcome, PreferenceError> {
        let result = cancellable(&self.cancel, self.preferences.save(set)).await;
        match result {
            Ok(outcome) => {
                self.rederive();
                match outcome {
                    SaveOutcome::Confirmed => self.set_status("Preferences saved"),
                    SaveOutcome::Unconfirmed => {
                        self.set_status("Preferences saved, but could not be re-read")
                    }
                }
                Ok(outcome)
            }
            Err(e) => {
                if !e.is_cancelled() {
                    self.set_status("Failed to save preferences");
                }
                Err(e)
            }
        }
    }

    // ------------------------------------------------------------------
    // Filtering and paging
    // ------------------------------------------------------------------

    /// Replace the criteria and go back to page 1.
    pub fn apply_filter(&mut self, criteria: FilterCriteria) {
        tracing::debug!(?criteria, "Applying feed filter");
        self.criteria = criteria;
        self.rederive();
    }

    pub fn clear_filter(&mut self) {
        self.apply_filter(FilterCriteria::default());
    }

    /// Jump to `target`; a page outside `1..=total_pages` is ignored.
    pub fn change_page(&mut self, target: usize) -> bool {
        self.paginator.change_page(target)
    }

    pub fn next_page(&mut self) -> bool {
        self.paginator.next()
    }

    pub fn previous_page(&mut self) -> bool {
        self.paginator.previous()
    }

    fn rederive(&mut self) {
        let narrowed = self.catalog.narrowed(self.preferences.current());
        self.visible = self.criteria.apply(&narrowed);
        self.paginator.reset(self.visible.len());
    }

    // ------------------------------------------------------------------
    // Teardown
    // ------------------------------------------------------------------

    /// Abandon every in-flight call. Later calls fail with
    /// [`GatewayError::Cancelled`] without reaching the network.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }
}

impl Drop for FeedController {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
