//! The session's article collection and category list.
//!
//! - [`ArticleCatalog`] - loads and owns both collections
//! - [`narrow_by_preferences`] - the preference filter, a pure function
//! - [`sanitize_categories`] - category label cleanup
//!
//! Loads keep the previous collection when the backend fails, so a flaky
//! network degrades to a stale feed instead of an empty one.

mod sanitize;

use std::sync::Arc;

use crate::gateway::{Article, GatewayError, RemoteGateway};
use crate::preferences::PreferenceSet;
use crate::util::normalize_label;

pub use sanitize::{is_valid_category, sanitize_categories, MAX_CATEGORY_LEN};

/// Restrict `articles` to the categories in `preferences`.
///
/// An empty preference set passes everything through. Otherwise an article
/// passes iff its normalized category equals the normalized form of some
/// preference. Both sides go through [`normalize_label`]; backend order is
/// preserved.
pub fn narrow_by_preferences(articles: &[Article], preferences: &PreferenceSet) -> Vec<Article> {
    if preferences.is_empty() {
        return articles.to_vec();
    }
    let keys = preferences.normalized_keys();
    articles
        .iter()
        .filter(|a| keys.contains(&normalize_label(&a.category)))
        .cloned()
        .collect()
}

/// Owner of the loaded articles and sanitized categories.
///
/// Both collections sit behind `Arc` so readers can hold a snapshot while a
/// reload swaps in a new one.
pub struct ArticleCatalog {
    gateway: Arc<dyn RemoteGateway>,
    articles: Arc<Vec<Article>>,
    categories: Arc<Vec<String>>,
    /// Bumped on every successful article load.
    generation: u64,
}

impl ArticleCatalog {
    pub fn new(gateway: Arc<dyn RemoteGateway>) -> Self {
        Self {
            gateway,
            articles: Arc::new(Vec::new()),
            categories: Arc::new(Vec::new()),
            generation: 0,
        }
    }

    /// Articles in backend order.
    pub fn articles(&self) -> &Arc<Vec<Article>> {
        &self.articles
    }

    /// Sanitized category labels for preference selection.
    pub fn categories(&self) -> &Arc<Vec<String>> {
        &self.categories
    }

    /// Identity of the current article collection; changes on every
    /// successful load, even if the content is identical.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub async fn fetch_articles(&self) -> Result<Vec<Article>, GatewayError> {
        self.gateway.list_articles().await
    }

    pub async fn fetch_categories(&self) -> Result<Vec<String>, GatewayError> {
        self.gateway.list_categories().await
    }

    /// Install an article fetch result. On error the previous collection
    /// stays in place and the error is handed back for status reporting.
    pub fn apply_articles(
        &mut self,
        result: Result<Vec<Article>, GatewayError>,
    ) -> Result<(), GatewayError> {
        match result {
            Ok(articles) => {
                tracing::info!(count = articles.len(), "Loaded article catalog");
                self.articles = Arc::new(articles);
                self.generation = self.generation.wrapping_add(1);
                Ok(())
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    kept = self.articles.len(),
                    "Failed to load articles, keeping previous catalog"
                );
                Err(e)
            }
        }
    }

    /// Install a category fetch result, sanitizing it. On error the previous
    /// list stays in place.
    pub fn apply_categories(
        &mut self,
        result: Result<Vec<String>, GatewayError>,
    ) -> Result<(), GatewayError> {
        match result {
            Ok(raw) => {
                let total = raw.len();
                let clean = sanitize_categories(raw);
                tracing::debug!(total, kept = clean.len(), "Loaded categories");
                self.categories = Arc::new(clean);
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load categories, keeping previous list");
                Err(e)
            }
        }
    }

    /// Load the article collection.
    pub async fn load(&mut self) -> Result<(), GatewayError> {
        let result = self.fetch_articles().await;
        self.apply_articles(result)
    }

    /// Load and sanitize the category list.
    pub async fn load_categories(&mut self) -> Result<(), GatewayError> {
        let result = self.fetch_categories().await;
        self.apply_categories(result)
    }

    /// Articles passing `preferences`; see [`narrow_by_preferences`].
    pub fn narrowed(&self, preferences: &PreferenceSet) -> Vec<Article> {
        narrow_by_preferences(&self.articles, preferences)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::fake::{article, FakeGateway};
    use proptest::prelude::*;

    fn ids(articles: &[Article]) -> Vec<i64> {
        articles.iter().map(|a| a.id).collect()
    }

    #[test]
    fn test_empty_preferences_pass_everything() {
        let articles = vec![article(1, "Tech"), article(2, ""), article(3, "Sports")];
        let narrowed = narrow_by_preferences(&articles, &PreferenceSet::new());
        assert_eq!(ids(&narrowed), vec![1, 2, 3]);
    }

    #[test]
    fn test_normalization_applies_to_both_sides() {
        let articles = vec![article(1, "Tech"), article(2, "Sports"), article(3, "tech ")];
        let prefs = PreferenceSet::from_labels(["Tech"]);
        assert_eq!(ids(&narrow_by_preferences(&articles, &prefs)), vec![1, 3]);

        let prefs = PreferenceSet::from_labels(["  TECH"]);
        assert_eq!(ids(&narrow_by_preferences(&articles, &prefs)), vec![1, 3]);
    }

    #[test]
    fn test_uncategorized_never_matches_preferences() {
        let articles = vec![article(1, ""), article(2, "General")];
        let prefs = PreferenceSet::from_labels(["General"]);
        // "General" is only a display fallback, not the stored category
        assert_eq!(ids(&narrow_by_preferences(&articles, &prefs)), vec![2]);
    }

    #[test]
    fn test_any_preference_matches() {
        let articles = vec![article(1, "Tech"), article(2, "Sports"), article(3, "World")];
        let prefs = PreferenceSet::from_labels(["world", "sports"]);
        assert_eq!(ids(&narrow_by_preferences(&articles, &prefs)), vec![2, 3]);
    }

    #[tokio::test]
    async fn test_load_keeps_backend_order() {
        let gw = FakeGateway::with(|s| {
            s.articles = vec![article(9, "A"), article(2, "B"), article(5, "C")];
        });
        let mut catalog = ArticleCatalog::new(gw);
        catalog.load().await.unwrap();
        assert_eq!(ids(catalog.articles()), vec![9, 2, 5]);
        assert_eq!(catalog.generation(), 1);
    }

    #[tokio::test]
    async fn test_failed_load_keeps_previous_collection() {
        let gw = FakeGateway::with(|s| s.articles = vec![article(1, "Tech")]);
        let mut catalog = ArticleCatalog::new(gw.clone());
        catalog.load().await.unwrap();

        gw.update(|s| s.fail_articles = true);
        assert!(catalog.load().await.is_err());
        assert_eq!(ids(catalog.articles()), vec![1]);
        assert_eq!(catalog.generation(), 1);
    }

    #[tokio::test]
    async fn test_categories_are_sanitized() {
        let gw = FakeGateway::with(|s| {
            s.categories = vec![
                "Technology".into(),
                "Breaking **News**".into(),
                "Article Summary of the Week".into(),
                "x".repeat(31),
            ];
        });
        let mut catalog = ArticleCatalog::new(gw);
        catalog.load_categories().await.unwrap();
        assert_eq!(catalog.categories().as_slice(), ["Technology".to_string()]);
    }

    #[tokio::test]
    async fn test_failed_category_load_keeps_previous() {
        let gw = FakeGateway::with(|s| s.categories = vec!["Tech".into()]);
        let mut catalog = ArticleCatalog::new(gw.clone());
        catalog.load_categories().await.unwrap();

        gw.update(|s| s.fail_categories = true);
        assert!(catalog.load_categories().await.is_err());
        assert_eq!(catalog.categories().len(), 1);
    }

    fn category_strategy() -> impl Strategy<Value = String> {
        prop::sample::select(vec![
            "Tech", "tech ", " TECH", "Sports", "sports", "World", "", "  ",
        ])
        .prop_map(str::to_string)
    }

    proptest! {
        #[test]
        fn prop_narrowing_membership(
            cats in prop::collection::vec(category_strategy(), 0..30),
            prefs in prop::collection::vec(category_strategy(), 0..4),
        ) {
            let articles: Vec<Article> = cats
                .iter()
                .enumerate()
                .map(|(i, c)| article(i as i64, c))
                .collect();
            let set = PreferenceSet::from_labels(&prefs);
            let narrowed = narrow_by_preferences(&articles, &set);
            let keys = set.normalized_keys();

            for a in &articles {
                let expected = set.is_empty() || keys.contains(&normalize_label(&a.category));
                let present = narrowed.iter().any(|n| n.id == a.id);
                prop_assert_eq!(expected, present);
            }
            // Relative order is preserved
            let narrowed_ids = ids(&narrowed);
            let mut sorted = narrowed_ids.clone();
            sorted.sort();
            prop_assert_eq!(narrowed_ids, sorted);
        }
    }
}
