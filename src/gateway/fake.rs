//! In-memory [`RemoteGateway`] for unit tests.
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::{Article, ArticleId, GatewayError, RemoteGateway, Sentiment};

#[derive(Default)]
pub(crate) struct FakeState {
    pub articles: Vec<Article>,
    pub categories: Vec<String>,
    pub preferences: Vec<String>,
    pub favorites: BTreeSet<ArticleId>,
    pub fail_articles: bool,
    pub fail_categories: bool,
    pub fail_get_preferences: bool,
    pub fail_save_preferences: bool,
    pub fail_favorites_list: bool,
    pub fail_favorite_writes: bool,
    /// When set, a save stores this instead of what was sent.
    pub save_rewrites_to: Option<Vec<String>>,
}

#[derive(Default)]
pub(crate) struct FakeGateway {
    pub state: Mutex<FakeState>,
    pub preference_reads: AtomicUsize,
    pub preference_writes: AtomicUsize,
    pub favorite_writes: AtomicUsize,
}

pub(crate) fn article(id: ArticleId, category: &str) -> Article {
    Article {
        id,
        title: Arc::from(format!("Article {id}")),
        summary: Arc::from(format!("Summary {id}")),
        content: Arc::from(format!("Content {id}")),
        category: Arc::from(category),
        sentiment: Sentiment::Neutral,
        source_url: Arc::from(format!("https://example.com/{id}")),
        published: None,
    }
}

pub(crate) fn article_with_sentiment(
    id: ArticleId,
    category: &str,
    sentiment: Sentiment,
) -> Article {
    Article {
        sentiment,
        ..article(id, category)
    }
}

impl FakeGateway {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with(f: impl FnOnce(&mut FakeState)) -> Arc<Self> {
        let gw = Self::default();
        f(&mut gw.state.lock().unwrap());
        Arc::new(gw)
    }

    pub fn update(&self, f: impl FnOnce(&mut FakeState)) {
        f(&mut self.state.lock().unwrap());
    }
}

#[async_trait]
impl RemoteGateway for FakeGateway {
    async fn list_articles(&self) -> Result<Vec<Article>, GatewayError> {
        let state = self.state.lock().unwrap();
        if state.fail_articles {
            return Err(GatewayError::HttpStatus(500));
        }
        Ok(state.articles.clone())
    }

    async fn get_article(&self, id: ArticleId) -> Result<Article, GatewayError> {
        let state = self.state.lock().unwrap();
        state
            .articles
            .iter()
            .find(|a| a.id == id)
            .cloned()
            .ok_or(GatewayError::HttpStatus(404))
    }

    async fn list_categories(&self) -> Result<Vec<String>, GatewayError> {
        let state = self.state.lock().unwrap();
        if state.fail_categories {
            return Err(GatewayError::Timeout);
        }
        Ok(state.categories.clone())
    }

    async fn trending(&self, limit: u32) -> Result<Vec<Article>, GatewayError> {
        let state = self.state.lock().unwrap();
        Ok(state.articles.iter().take(limit as usize).cloned().collect())
    }

    async fn get_preferences(&self) -> Result<Vec<String>, GatewayError> {
        self.preference_reads.fetch_add(1, Ordering::SeqCst);
        let state = self.state.lock().unwrap();
        if state.fail_get_preferences {
            return Err(GatewayError::HttpStatus(502));
        }
        Ok(state.preferences.clone())
    }

    async fn save_preferences(&self, categories: &[String]) -> Result<(), GatewayError> {
        self.preference_writes.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.lock().unwrap();
        if state.fail_save_preferences {
            return Err(GatewayError::HttpStatus(500));
        }
        state.preferences = match &state.save_rewrites_to {
            Some(rewritten) => rewritten.clone(),
            None => categories.to_vec(),
        };
        Ok(())
    }

    async fn list_favorites(&self) -> Result<Vec<Article>, GatewayError> {
        let state = self.state.lock().unwrap();
        if state.fail_favorites_list {
            return Err(GatewayError::HttpStatus(500));
        }
        Ok(state
            .articles
            .iter()
            .filter(|a| state.favorites.contains(&a.id))
            .cloned()
            .collect())
    }

    async fn add_favorite(&self, id: ArticleId) -> Result<(), GatewayError> {
        self.favorite_writes.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.lock().unwrap();
        if state.fail_favorite_writes {
            return Err(GatewayError::HttpStatus(500));
        }
        if !state.favorites.insert(id) {
            return Err(GatewayError::HttpStatus(400));
        }
        Ok(())
    }

    async fn remove_favorite(&self, id: ArticleId) -> Result<(), GatewayError> {
        self.favorite_writes.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.lock().unwrap();
        if state.fail_favorite_writes {
            return Err(GatewayError::HttpStatus(500));
        }
        if !state.favorites.remove(&id) {
            return Err(GatewayError::HttpStatus(404));
        }
        Ok(())
    }
}
