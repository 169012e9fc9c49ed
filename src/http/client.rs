//! HTTP page provider
//!
//! One GET per page:
//! - rate limiting to prevent API throttling
//! - non-2xx statuses become `Error::HttpStatus`
//! - records are extracted from the JSON body
//! - the configured strategy derives the next request

use super::rate_limit::{RateLimiter, RateLimiterConfig};
use crate::decode::{JsonDecoder, RecordDecoder};
use crate::error::{Error, Result};
use crate::pagination::{PageRequest, PageResponse, PageStrategy, PaginationConfig};
use crate::provider::PageProvider;
use crate::types::{Page, StringMap};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Configuration for the HTTP page provider
#[derive(Debug, Clone)]
pub struct HttpProviderConfig {
    /// Request timeout
    pub timeout: Duration,
    /// Rate limiter configuration
    pub rate_limit: Option<RateLimiterConfig>,
    /// Headers sent with every request
    pub default_headers: StringMap,
    /// User agent string
    pub user_agent: String,
    /// Path to the records inside each response body
    pub record_path: Option<String>,
    /// How the next request is derived
    pub pagination: PaginationConfig,
}

impl Default for HttpProviderConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            rate_limit: None,
            default_headers: StringMap::new(),
            user_agent: format!("pagefeed/{}", env!("CARGO_PKG_VERSION")),
            record_path: None,
            pagination: PaginationConfig::None,
        }
    }
}

impl HttpProviderConfig {
    /// Create a new config builder
    pub fn builder() -> HttpProviderConfigBuilder {
        HttpProviderConfigBuilder::default()
    }
}

/// Builder for HTTP provider config
#[derive(Debug, Default)]
pub struct HttpProviderConfigBuilder {
    config: HttpProviderConfig,
}

impl HttpProviderConfigBuilder {
    /// Set the request timeout
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set rate limiter
    #[must_use]
    pub fn rate_limit(mut self, config: RateLimiterConfig) -> Self {
        self.config.rate_limit = Some(config);
        self
    }

    /// Add a default header
    #[must_use]
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.default_headers.insert(key.into(), value.into());
        self
    }

    /// Set user agent
    #[must_use]
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.config.user_agent = agent.into();
        self
    }

    /// Set the path to the records in each response
    #[must_use]
    pub fn record_path(mut self, path: impl Into<String>) -> Self {
        self.config.record_path = Some(path.into());
        self
    }

    /// Set the pagination strategy
    #[must_use]
    pub fn pagination(mut self, pagination: PaginationConfig) -> Self {
        self.config.pagination = pagination;
        self
    }

    /// Build the config
    pub fn build(self) -> HttpProviderConfig {
        self.config
    }
}

/// Page provider over a paginated JSON HTTP API
///
/// The parameter is a [`PageRequest`]; the elements are the JSON records of
/// each page.
pub struct HttpPageProvider {
    client: Client,
    config: HttpProviderConfig,
    decoder: JsonDecoder,
    strategy: Arc<dyn PageStrategy>,
    rate_limiter: Option<RateLimiter>,
}

impl HttpPageProvider {
    /// Create a provider with the given configuration
    pub fn new(config: HttpProviderConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()?;

        let rate_limiter = config.rate_limit.as_ref().map(RateLimiter::new);
        let decoder = config
            .record_path
            .as_ref()
            .map_or_else(JsonDecoder::new, JsonDecoder::with_path);
        let strategy = config.pagination.clone().into_strategy();

        Ok(Self {
            client,
            config,
            decoder,
            strategy,
            rate_limiter,
        })
    }

    /// Replace the strategy built from the configuration
    #[must_use]
    pub fn with_strategy(mut self, strategy: Arc<dyn PageStrategy>) -> Self {
        self.strategy = strategy;
        self
    }

    /// Provider configuration
    pub fn config(&self) -> &HttpProviderConfig {
        &self.config
    }

    /// Check if rate limiting is enabled
    pub fn has_rate_limiter(&self) -> bool {
        self.rate_limiter.is_some()
    }

    /// First request for `url`, decorated by the strategy
    pub fn first_request(&self, url: impl Into<String>) -> PageRequest {
        self.start(PageRequest::new(url))
    }

    /// Let the strategy decorate a hand-built first request
    pub fn start(&self, request: PageRequest) -> PageRequest {
        self.strategy.first_request(request)
    }

    /// Fetch and decode one page
    pub async fn fetch_page(&self, request: &PageRequest) -> Result<Page<PageRequest, Value>> {
        if let Some(ref limiter) = self.rate_limiter {
            limiter.wait().await;
        }

        let mut req = self.client.get(&request.url);
        for (key, value) in &self.config.default_headers {
            req = req.header(key.as_str(), value.as_str());
        }
        if !request.query.is_empty() {
            req = req.query(&request.query);
        }

        debug!(url = %request.url, page = request.page, "Requesting page");
        let response = req.send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(Error::http_status(status.as_u16(), text));
        }

        let body = self.decoder.parse(&text)?;
        let records = self.decoder.records(&body)?;
        let next = self.strategy.next_request(
            request,
            &PageResponse {
                body: &body,
                headers: &headers,
                records: records.len(),
            },
        );

        debug!(
            url = %request.url,
            records = records.len(),
            last = next.is_none(),
            "Page decoded"
        );
        Ok(Page::new(next, records))
    }
}

#[async_trait]
impl PageProvider<PageRequest, Value> for HttpPageProvider {
    type Error = Error;

    async fn fetch(&self, parameter: PageRequest) -> Result<Page<PageRequest, Value>> {
        self.fetch_page(&parameter).await
    }
}

impl std::fmt::Debug for HttpPageProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpPageProvider")
            .field("config", &self.config)
            .field("strategy", &self.strategy)
            .field("has_rate_limiter", &self.rate_limiter.is_some())
            .finish_non_exhaustive()
    }
}
