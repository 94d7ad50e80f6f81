//! Ad-hoc filtering on top of the preference-narrowed feed.
use crate::gateway::Article;
use crate::util::{is_blank, normalize_label};

/// User-chosen filter on the visible feed.
///
/// Every field is optional, and a blank value (empty or whitespace-only)
/// is treated as absent. An empty criteria value matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterCriteria {
    /// Case-insensitive exact match against the article's category.
    pub category: Option<String>,
    /// Case-insensitive exact match against the sentiment label.
    pub sentiment: Option<String>,
    /// Case-insensitive substring of title, summary or content.
    pub query: Option<String>,
}

impl FilterCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_sentiment(mut self, sentiment: impl Into<String>) -> Self {
        self.sentiment = Some(sentiment.into());
        self
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    /// True if no field constrains anything.
    pub fn is_empty(&self) -> bool {
        active(&self.category).is_none()
            && active(&self.sentiment).is_none()
            && active(&self.query).is_none()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Returns true if `article` satisfies every active field.
    pub fn matches(&self, article: &Article) -> bool {
        self.compile().matches(article)
    }

    /// Keep the articles matching every active field, in input order.
    pub fn apply(&self, articles: &[Article]) -> Vec<Article> {
        if self.is_empty() {
            return articles.to_vec();
        }
        let compiled = self.compile();
        articles
            .iter()
            .filter(|a| compiled.matches(a))
            .cloned()
            .collect()
    }

    /// Pre-normalize the active fields once per pass.
    fn compile(&self) -> CompiledCriteria {
        CompiledCriteria {
            category: active(&self.category).map(normalize_label),
            sentiment: active(&self.sentiment).map(normalize_label),
            query: active(&self.query).map(normalize_label),
        }
    }
}

fn active(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|v| !is_blank(v))
}

struct CompiledCriteria {
    category: Option<String>,
    sentiment: Option<String>,
    query: Option<String>,
}

impl CompiledCriteria {
    fn matches(&self, article: &Article) -> bool {
        if let Some(ref category) = self.category {
            if normalize_label(&article.category) != *category {
                return false;
            }
        }
        if let Some(ref sentiment) = self.sentiment {
            if article.sentiment.as_str().to_lowercase() != *sentiment {
                return false;
            }
        }
        if let Some(ref query) = self.query {
            let hit = [&article.title, &article.summary, &article.content]
                .iter()
                .any(|field| field.to_lowercase().contains(query.as_str()));
            if !hit {
                return false;
            }
        }
        true
    }
}
