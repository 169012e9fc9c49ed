//! Configuration types for HTTP sources
//!
//! A source describes one paginated JSON endpoint: where it lives, how its
//! pages link together and how the engine driving it behaves. Sources are
//! loaded from YAML or JSON.

use crate::engine::EngineConfig;
use crate::error::{Error, Result, ResultExt};
use crate::http::{HttpPageProvider, HttpProviderConfig, RateLimiterConfig};
use crate::pagination::{PageRequest, PaginationConfig};
use crate::types::StringMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

// ============================================================================
// Source Config
// ============================================================================

/// A paginated HTTP source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Source name, used in logs
    pub name: String,

    /// URL of the first page
    pub url: String,

    /// Query parameters sent with the first request
    #[serde(default)]
    pub query: StringMap,

    /// Headers sent with every request
    #[serde(default)]
    pub headers: StringMap,

    /// Path to the records in each response body
    #[serde(default)]
    pub records_path: Option<String>,

    /// Pagination strategy
    #[serde(default)]
    pub pagination: PaginationConfig,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Optional rate limit
    #[serde(default)]
    pub rate_limit: Option<RateLimiterConfig>,

    /// Engine settings
    #[serde(default)]
    pub engine: EngineConfig,
}

fn default_timeout_secs() -> u64 {
    30
}

impl SourceConfig {
    /// Create a source with defaults for everything but name and URL
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            query: StringMap::new(),
            headers: StringMap::new(),
            records_path: None,
            pagination: PaginationConfig::None,
            timeout_secs: default_timeout_secs(),
            rate_limit: None,
            engine: EngineConfig::default(),
        }
    }

    /// Load and validate a source from a file
    ///
    /// `.json` files are parsed as JSON, everything else as YAML.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::FileNotFound {
                path: path.display().to_string(),
            });
        }

        let content =
            fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        if is_json {
            Self::from_json_str(&content)
        } else {
            Self::from_yaml_str(&content)
        }
    }

    /// Load and validate a source from a YAML string
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a source from a JSON string
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate a source
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::missing_field("name"));
        }

        if self.url.trim().is_empty() {
            return Err(Error::missing_field("url"));
        }
        url::Url::parse(&self.url)?;

        if self.timeout_secs == 0 {
            return Err(Error::invalid_value(
                "timeout_secs",
                "must be greater than zero",
            ));
        }

        match &self.pagination {
            PaginationConfig::Offset { limit: 0, .. } => {
                return Err(Error::invalid_value(
                    "pagination.limit",
                    "must be greater than zero",
                ));
            }
            PaginationConfig::PageNumber {
                page_size: Some(0), ..
            } => {
                return Err(Error::invalid_value(
                    "pagination.page_size",
                    "must be greater than zero",
                ));
            }
            PaginationConfig::PageNumber {
                page_size_param: None,
                page_size: Some(_),
                ..
            } => {
                return Err(Error::missing_field("pagination.page_size_param"));
            }
            PaginationConfig::PageNumber {
                page_size_param: Some(param),
                page_size: None,
                ..
            } => {
                return Err(Error::config(format!(
                    "pagination.page_size_param '{param}' is set without a page_size"
                )));
            }
            PaginationConfig::Cursor { cursor_param, .. } if cursor_param.is_empty() => {
                return Err(Error::missing_field("pagination.cursor_param"));
            }
            _ => {}
        }

        if let Some(limit) = &self.rate_limit {
            if limit.requests_per_second == 0 {
                return Err(Error::invalid_value(
                    "rate_limit.requests_per_second",
                    "must be greater than zero",
                ));
            }
        }

        Ok(())
    }

    /// Settings for the HTTP provider
    pub fn provider_config(&self) -> HttpProviderConfig {
        let mut builder = HttpProviderConfig::builder()
            .timeout(Duration::from_secs(self.timeout_secs))
            .pagination(self.pagination.clone());

        for (key, value) in &self.headers {
            builder = builder.header(key, value);
        }
        if let Some(path) = &self.records_path {
            builder = builder.record_path(path);
        }
        if let Some(limit) = &self.rate_limit {
            builder = builder.rate_limit(limit.clone());
        }

        builder.build()
    }

    /// Build the HTTP provider for this source
    pub fn into_provider(&self) -> Result<HttpPageProvider> {
        HttpPageProvider::new(self.provider_config())
    }

    /// First request of the sequence, as decorated by `provider`
    pub fn initial_request(&self, provider: &HttpPageProvider) -> PageRequest {
        provider.start(PageRequest::new(&self.url).with_queries(&self.query))
    }

    /// Engine settings, named after the source unless a name is set
    pub fn engine_config(&self) -> EngineConfig {
        match self.engine.name {
            Some(_) => self.engine.clone(),
            None => self.engine.clone().with_name(&self.name),
        }
    }
}
