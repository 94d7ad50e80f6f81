//! Boundary to the news backend.
//!
//! - [`RemoteGateway`] - the request/response contract every component talks to
//! - [`HttpGateway`] - the production implementation over `reqwest`
//! - [`types`] - the validated [`Article`] schema and wire payloads
//!
//! Payloads are decoded and defaulted here, so nothing past this module ever
//! sees a half-populated article.

#[cfg(test)]
pub(crate) mod fake;
mod http;
pub mod types;

use std::future::Future;

use async_trait::async_trait;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

pub use http::{HttpGateway, HttpGatewayOptions};
pub use types::{Article, ArticleId, Sentiment, DEFAULT_CATEGORY, SUMMARY_PREVIEW_CHARS};

/// Upper bound the backend accepts for `/api/articles/trending?limit=N`.
pub const MAX_TRENDING_LIMIT: u32 = 50;

/// Errors that can occur while talking to the backend.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Network-level error (DNS, connection, TLS, etc.)
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),
    /// HTTP response with non-2xx status code
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    /// Request exceeded the configured timeout
    #[error("Request timed out")]
    Timeout,
    /// Response body exceeded the size cap
    #[error("Response too large (exceeds {0} bytes)")]
    ResponseTooLarge(usize),
    /// Body was not the JSON shape the endpoint promises
    #[error("Malformed response body: {0}")]
    Decode(#[from] serde_json::Error),
    /// A request URL could not be built from the base URL
    #[error("Invalid request URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    /// The owning operation was cancelled before the response arrived
    #[error("Request cancelled")]
    Cancelled,
}

impl GatewayError {
    /// Returns true if this error is transient and the request should be retried.
    pub fn is_retryable(&self) -> bool {
        match self {
            GatewayError::Timeout | GatewayError::Network(_) => true,
            GatewayError::HttpStatus(status) => *status >= 500 || *status == 429,
            GatewayError::ResponseTooLarge(_)
            | GatewayError::Decode(_)
            | GatewayError::InvalidUrl(_)
            | GatewayError::Cancelled => false,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, GatewayError::Cancelled)
    }
}

/// Request/response contract of the backend (see the endpoint table in the
/// crate docs). Every call acts on behalf of the session the implementation
/// was built for.
#[async_trait]
pub trait RemoteGateway: Send + Sync {
    /// `GET /api/articles`, in backend order.
    async fn list_articles(&self) -> Result<Vec<Article>, GatewayError>;

    /// `GET /api/articles/{id}`
    async fn get_article(&self, id: ArticleId) -> Result<Article, GatewayError>;

    /// `GET /api/articles/categories`, raw and unsanitized.
    async fn list_categories(&self) -> Result<Vec<String>, GatewayError>;

    /// `GET /api/articles/trending?limit=N`
    async fn trending(&self, limit: u32) -> Result<Vec<Article>, GatewayError>;

    /// `GET /api/preferences/`, raw and unnormalized.
    async fn get_preferences(&self) -> Result<Vec<String>, GatewayError>;

    /// `POST /api/preferences/`
    async fn save_preferences(&self, categories: &[String]) -> Result<(), GatewayError>;

    /// `GET /api/articles/favorites`
    async fn list_favorites(&self) -> Result<Vec<Article>, GatewayError>;

    /// `POST /api/articles/{id}/favorite`
    async fn add_favorite(&self, id: ArticleId) -> Result<(), GatewayError>;

    /// `DELETE /api/articles/{id}/favorite`
    async fn remove_favorite(&self, id: ArticleId) -> Result<(), GatewayError>;
}

/// Run `fut` unless `token` fires first.
///
/// A cancelled call resolves to [`GatewayError::Cancelled`] (converted into
/// the caller's error type) and its eventual response is dropped, so callers
/// never apply results that arrive after the owning view went away.
pub async fn cancellable<T, E, F>(token: &CancellationToken, fut: F) -> Result<T, E>
where
    F: Future<Output = Result<T, E>>,
    E: From<GatewayError>,
{
    if token.is_cancelled() {
        return Err(GatewayError::Cancelled.into());
    }
    tokio::select! {
        biased;
        _ = token.cancelled() => Err(GatewayError::Cancelled.into()),
        result = fut => result,
    }
}
