use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::header::CONTENT_TYPE;
use reqwest::Method;
use serde::de::DeserializeOwned;
use url::Url;

use super::types::{ArticlePayload, SavePreferencesRequest};
use super::{Article, ArticleId, GatewayError, RemoteGateway, MAX_TRENDING_LIMIT};
use crate::session::Session;
use crate::util::validate_base_url;

const MAX_RESPONSE_SIZE: usize = 10 * 1024 * 1024; // 10MB
const USER_ID_HEADER: &str = "user-id";

/// Tuning knobs for [`HttpGateway`].
#[derive(Debug, Clone)]
pub struct HttpGatewayOptions {
    /// Per-attempt timeout.
    pub timeout: Duration,
    /// Retries after the first attempt for 429/5xx/timeouts. GETs only.
    pub max_retries: u32,
    /// First backoff delay; doubles on each retry.
    pub retry_base_delay: Duration,
}

impl Default for HttpGatewayOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            max_retries: 3,
            retry_base_delay: Duration::from_secs(1),
        }
    }
}

/// [`RemoteGateway`] over HTTP/JSON.
///
/// Holds one pooled `reqwest::Client` for the session and stamps the
/// session's `user-id` header on every request.
#[derive(Clone)]
pub struct HttpGateway {
    client: reqwest::Client,
    base_url: Url,
    session: Session,
    options: HttpGatewayOptions,
}

impl HttpGateway {
    pub fn new(
        base_url: &str,
        session: Session,
        options: HttpGatewayOptions,
    ) -> anyhow::Result<Self> {
        let base_url = validate_base_url(base_url)?;

        let client = reqwest::Client::builder()
            .pool_max_idle_per_host(4)
            .pool_idle_timeout(Duration::from_secs(30))
            .tcp_keepalive(Duration::from_secs(60))
            .timeout(options.timeout)
            .build()?;

        tracing::debug!(base_url = %base_url, user_id = %session.user_id, "HTTP gateway ready");

        Ok(Self {
            client,
            base_url,
            session,
            options,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, GatewayError> {
        Ok(self.base_url.join(path)?)
    }

    /// Issue one logical request, retrying transient failures of GETs.
    ///
    /// - 429 and 5xx: exponential backoff, up to `max_retries` retries
    /// - timeouts and connection errors: same backoff
    /// - other non-2xx: fail immediately with [`GatewayError::HttpStatus`]
    ///
    /// Writes are sent once: a timed-out POST or DELETE may already have been
    /// applied.
    async fn execute(
        &self,
        method: Method,
        url: Url,
        body: Option<Vec<u8>>,
    ) -> Result<Vec<u8>, GatewayError> {
        let max_retries = if method == Method::GET {
            self.options.max_retries
        } else {
            0
        };
        let mut retry_count = 0;

        loop {
            match self.attempt(method.clone(), url.clone(), body.clone()).await {
                Ok(bytes) => return Ok(bytes),
                Err(e) if e.is_retryable() && retry_count < max_retries => {
                    let delay = self.options.retry_base_delay * 2u32.pow(retry_count);
                    tracing::warn!(
                        method = %method,
                        url = %url,
                        error = %e,
                        retry = retry_count + 1,
                        delay_ms = delay.as_millis() as u64,
                        "Transient backend error, retrying after delay"
                    );
                    tokio::time::sleep(delay).await;
                    retry_count += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn attempt(
        &self,
        method: Method,
        url: Url,
        body: Option<Vec<u8>>,
    ) -> Result<Vec<u8>, GatewayError> {
        let mut request = self
            .client
            .request(method, url)
            .header(USER_ID_HEADER, self.session.user_id.as_str());

        if let Some(body) = body {
            request = request.header(CONTENT_TYPE, "application/json").body(body);
        }

        let response = tokio::time::timeout(self.options.timeout, request.send())
            .await
            .map_err(|_| GatewayError::Timeout)?
            .map_err(|e| {
                if e.is_timeout() {
                    GatewayError::Timeout
                } else {
                    GatewayError::Network(e)
                }
            })?;

        if !response.status().is_success() {
            return Err(GatewayError::HttpStatus(response.status().as_u16()));
        }

        read_limited_bytes(response, MAX_RESPONSE_SIZE).await
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, GatewayError> {
        let bytes = self.execute(Method::GET, url, None).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn get_articles(&self, url: Url) -> Result<Vec<Article>, GatewayError> {
        let raw: Vec<serde_json::Value> = self.get_json(url.clone()).await?;
        Ok(decode_articles(&url, raw))
    }
}

/// Decode each array element on its own so one malformed record does not
/// take the whole collection down with it.
fn decode_articles(url: &Url, raw: Vec<serde_json::Value>) -> Vec<Article> {
    let total = raw.len();
    let articles: Vec<Article> = raw
        .into_iter()
        .filter_map(|value| match serde_json::from_value::<ArticlePayload>(value) {
            Ok(payload) => Some(Article::from(payload)),
            Err(e) => {
                tracing::debug!(error = %e, "Skipping malformed article record");
                None
            }
        })
        .collect();

    let skipped = total - articles.len();
    if skipped > 0 {
        tracing::warn!(url = %url, skipped, total, "Dropped malformed article records");
    }
    articles
}

/// Keep string entries, drop nulls and anything else.
fn decode_strings(raw: Vec<serde_json::Value>) -> Vec<String> {
    raw.into_iter()
        .filter_map(|v| match v {
            serde_json::Value::String(s) => Some(s),
            _ => None,
        })
        .collect()
}

async fn read_limited_bytes(
    response: reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, GatewayError> {
    // Fast path: check Content-Length header
    if let Some(len) = response.content_length() {
        if len as usize > limit {
            return Err(GatewayError::ResponseTooLarge(limit));
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(GatewayError::Network)?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(GatewayError::ResponseTooLarge(limit));
        }
        bytes.extend_from_slice(&chunk);
    }

    Ok(bytes)
}

#[async_trait]
impl RemoteGateway for HttpGateway {
    async fn list_articles(&self) -> Result<Vec<Article>, GatewayError> {
        let url = self.endpoint("api/articles")?;
        self.get_articles(url).await
    }

    async fn get_article(&self, id: ArticleId) -> Result<Article, GatewayError> {
        let url = self.endpoint(&format!("api/articles/{id}"))?;
        let payload: ArticlePayload = self.get_json(url).await?;
        Ok(Article::from(payload))
    }

    async fn list_categories(&self) -> Result<Vec<String>, GatewayError> {
        let url = self.endpoint("api/articles/categories")?;
        let raw: Vec<serde_json::Value> = self.get_json(url).await?;
        Ok(decode_strings(raw))
    }

    async fn trending(&self, limit: u32) -> Result<Vec<Article>, GatewayError> {
        let limit = limit.clamp(1, MAX_TRENDING_LIMIT);
        let mut url = self.endpoint("api/articles/trending")?;
        url.query_pairs_mut().append_pair("limit", &limit.to_string());
        let mut articles = self.get_articles(url).await?;
        articles.truncate(limit as usize);
        Ok(articles)
    }

    async fn get_preferences(&self) -> Result<Vec<String>, GatewayError> {
        let url = self.endpoint("api/preferences/")?;
        let raw: Vec<serde_json::Value> = self.get_json(url).await?;
        Ok(decode_strings(raw))
    }

    async fn save_preferences(&self, categories: &[String]) -> Result<(), GatewayError> {
        let url = self.endpoint("api/preferences/")?;
        let body = serde_json::to_vec(&SavePreferencesRequest { categories })?;
        self.execute(Method::POST, url, Some(body)).await?;
        Ok(())
    }

    async fn list_favorites(&self) -> Result<Vec<Article>, GatewayError> {
        let url = self.endpoint("api/articles/favorites")?;
        self.get_articles(url).await
    }

    async fn add_favorite(&self, id: ArticleId) -> Result<(), GatewayError> {
        let url = self.endpoint(&format!("api/articles/{id}/favorite"))?;
        self.execute(Method::POST, url, None).await?;
        Ok(())
    }

    async fn remove_favorite(&self, id: ArticleId) -> Result<(), GatewayError> {
        let url = self.endpoint(&format!("api/articles/{id}/favorite"))?;
        self.execute(Method::DELETE, url, None).await?;
        Ok(())
    }
}
