//! Pagination types and traits
//!
//! Defines the page parameter used by the HTTP provider and the strategy
//! abstraction that derives one request from the previous response.

use super::strategies::{
    CursorStrategy, LinkHeaderStrategy, NextUrlStrategy, OffsetStrategy, PageNumberStrategy,
    SinglePage,
};
use crate::decode::{string_at_path, value_at_path};
use crate::types::StringMap;
use reqwest::header::HeaderMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::Debug;
use std::sync::Arc;

// ============================================================================
// Page Request
// ============================================================================

/// Parameter identifying one HTTP page
///
/// `page` is the zero-based index of this request in the sequence and
/// `fetched` the number of records received before it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PageRequest {
    /// Absolute URL to request
    pub url: String,
    /// Query parameters appended to the URL
    #[serde(default)]
    pub query: StringMap,
    /// Index of this page in the sequence
    #[serde(default)]
    pub page: u32,
    /// Record offset of this page
    #[serde(default)]
    pub offset: u64,
    /// Records fetched before this page
    #[serde(default)]
    pub fetched: u64,
}

impl PageRequest {
    /// Create a request for the first page at `url`
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            query: StringMap::new(),
            page: 0,
            offset: 0,
            fetched: 0,
        }
    }

    /// Add or replace a query parameter
    #[must_use]
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    /// Add or replace several query parameters
    #[must_use]
    pub fn with_queries(mut self, params: &StringMap) -> Self {
        self.query
            .extend(params.iter().map(|(k, v)| (k.clone(), v.clone())));
        self
    }

    /// Replace the URL; the new URL carries its own query string
    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self.query.clear();
        self
    }

    /// The request that follows this one after `records` were received
    #[must_use]
    pub fn following(&self, records: usize) -> Self {
        Self {
            page: self.page + 1,
            fetched: self.fetched + records as u64,
            ..self.clone()
        }
    }

    /// Whether this is the first request in the sequence
    pub fn is_first(&self) -> bool {
        self.page == 0
    }
}

/// A decoded response as seen by a strategy
#[derive(Debug, Clone, Copy)]
pub struct PageResponse<'a> {
    /// Parsed response body
    pub body: &'a Value,
    /// Response headers
    pub headers: &'a HeaderMap,
    /// Number of records extracted from the body
    pub records: usize,
}

// ============================================================================
// Strategy Trait
// ============================================================================

/// Rule deriving the next request from a response
pub trait PageStrategy: Send + Sync + Debug {
    /// Decorate the first request (e.g. add `offset=0&limit=100`)
    fn first_request(&self, request: PageRequest) -> PageRequest {
        request
    }

    /// Request for the page after `current`, or `None` when `current` was
    /// the last page
    fn next_request(&self, current: &PageRequest, response: &PageResponse<'_>)
        -> Option<PageRequest>;
}

// ============================================================================
// Configuration
// ============================================================================

/// Configuration for pagination behavior
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PaginationConfig {
    /// No pagination
    #[default]
    None,

    /// Cursor-based pagination (e.g., Stripe)
    Cursor {
        /// Query parameter name for cursor (e.g., "starting_after")
        cursor_param: String,
        /// Path to the cursor in the response
        cursor_path: String,
        /// Stop condition
        #[serde(default)]
        stop_condition: StopCondition,
    },

    /// Offset-based pagination
    Offset {
        /// Query parameter name for offset
        #[serde(default = "default_offset_param")]
        offset_param: String,
        /// Query parameter name for limit
        #[serde(default = "default_limit_param")]
        limit_param: String,
        /// Number of records per page
        limit: u32,
        /// Stop condition
        #[serde(default)]
        stop_condition: StopCondition,
    },

    /// Page number pagination
    PageNumber {
        /// Query parameter name for page number
        #[serde(default = "default_page_param")]
        page_param: String,
        /// First page number (usually 0 or 1)
        #[serde(default = "default_start_page")]
        start_page: u32,
        /// Optional page size parameter name
        #[serde(default)]
        page_size_param: Option<String>,
        /// Page size value
        #[serde(default)]
        page_size: Option<u32>,
        /// Stop condition
        #[serde(default)]
        stop_condition: StopCondition,
    },

    /// Link header pagination (RFC 5988)
    LinkHeader {
        /// Rel value to follow
        #[serde(default = "default_rel")]
        rel: String,
    },

    /// Next URL in response body
    NextUrl {
        /// Path to the next URL in the response
        path: String,
    },
}

fn default_offset_param() -> String {
    "offset".to_string()
}

fn default_limit_param() -> String {
    "limit".to_string()
}

fn default_page_param() -> String {
    "page".to_string()
}

fn default_start_page() -> u32 {
    1
}

fn default_rel() -> String {
    "next".to_string()
}

impl PaginationConfig {
    /// Create cursor pagination config
    pub fn cursor(
        cursor_param: impl Into<String>,
        cursor_path: impl Into<String>,
        stop_condition: StopCondition,
    ) -> Self {
        Self::Cursor {
            cursor_param: cursor_param.into(),
            cursor_path: cursor_path.into(),
            stop_condition,
        }
    }

    /// Create offset pagination config
    pub fn offset(
        offset_param: impl Into<String>,
        limit_param: impl Into<String>,
        limit: u32,
        stop_condition: StopCondition,
    ) -> Self {
        Self::Offset {
            offset_param: offset_param.into(),
            limit_param: limit_param.into(),
            limit,
            stop_condition,
        }
    }

    /// Create page number pagination config
    pub fn page_number(page_param: impl Into<String>, start_page: u32) -> Self {
        Self::PageNumber {
            page_param: page_param.into(),
            start_page,
            page_size_param: None,
            page_size: None,
            stop_condition: StopCondition::EmptyPage,
        }
    }

    /// Create link header pagination config
    pub fn link_header(rel: impl Into<String>) -> Self {
        Self::LinkHeader { rel: rel.into() }
    }

    /// Create next URL pagination config
    pub fn next_url(path: impl Into<String>) -> Self {
        Self::NextUrl { path: path.into() }
    }

    /// Short name used in logs and summaries
    pub fn kind(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Cursor { .. } => "cursor",
            Self::Offset { .. } => "offset",
            Self::PageNumber { .. } => "page_number",
            Self::LinkHeader { .. } => "link_header",
            Self::NextUrl { .. } => "next_url",
        }
    }

    /// Build the strategy described by this configuration
    pub fn into_strategy(self) -> Arc<dyn PageStrategy> {
        match self {
            Self::None => Arc::new(SinglePage),
            Self::Cursor {
                cursor_param,
                cursor_path,
                stop_condition,
            } => Arc::new(CursorStrategy::new(cursor_param, cursor_path, stop_condition)),
            Self::Offset {
                offset_param,
                limit_param,
                limit,
                stop_condition,
            } => Arc::new(OffsetStrategy::new(
                offset_param,
                limit_param,
                limit,
                stop_condition,
            )),
            Self::PageNumber {
                page_param,
                start_page,
                page_size_param,
                page_size,
                stop_condition,
            } => {
                let mut strategy = PageNumberStrategy::new(page_param, start_page)
                    .with_stop_condition(stop_condition);
                if let (Some(param), Some(size)) = (page_size_param, page_size) {
                    strategy = strategy.with_page_size(param, size);
                }
                Arc::new(strategy)
            }
            Self::LinkHeader { rel } => Arc::new(LinkHeaderStrategy::new(rel)),
            Self::NextUrl { path } => Arc::new(NextUrlStrategy::new(path)),
        }
    }
}

// ============================================================================
// Stop Conditions
// ============================================================================

/// Stop conditions for pagination
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StopCondition {
    /// Stop when page is empty (no records)
    #[default]
    EmptyPage,

    /// Stop when a field has a specific value
    Field {
        /// Path to the field
        path: String,
        /// Value that marks the last page
        value: Value,
    },

    /// Stop when the records fetched reach a total count
    TotalCount {
        /// Path to total count field
        path: String,
    },

    /// Stop when the pages fetched reach a total page count
    TotalPages {
        /// Path to total pages field
        path: String,
    },
}

impl StopCondition {
    /// Create a field-based stop condition
    pub fn field(path: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Field {
            path: path.into(),
            value: value.into(),
        }
    }

    /// Create a total count stop condition
    pub fn total_count(path: impl Into<String>) -> Self {
        Self::TotalCount { path: path.into() }
    }

    /// Create a total pages stop condition
    pub fn total_pages(path: impl Into<String>) -> Self {
        Self::TotalPages { path: path.into() }
    }
}

/// Result of checking a stop condition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopResult {
    /// Continue pagination
    Continue,
    /// Stop pagination
    Stop,
}

impl StopResult {
    /// Check if we should continue
    pub fn should_continue(&self) -> bool {
        matches!(self, Self::Continue)
    }

    /// Check if we should stop
    pub fn should_stop(&self) -> bool {
        matches!(self, Self::Stop)
    }
}

impl From<bool> for StopResult {
    fn from(stop: bool) -> Self {
        if stop {
            Self::Stop
        } else {
            Self::Continue
        }
    }
}

/// Check a stop condition against the response to `current`
///
/// A missing or unparseable field never stops pagination.
pub fn check_stop_condition(
    condition: &StopCondition,
    current: &PageRequest,
    response: &PageResponse<'_>,
) -> StopResult {
    match condition {
        StopCondition::EmptyPage => StopResult::from(response.records == 0),
        StopCondition::Field { path, value } => {
            StopResult::from(value_at_path(response.body, path).as_ref() == Some(value))
        }
        StopCondition::TotalCount { path } => {
            let fetched = current.fetched + response.records as u64;
            match string_at_path(response.body, path).and_then(|s| s.parse::<u64>().ok()) {
                Some(total) => StopResult::from(fetched >= total),
                None => StopResult::Continue,
            }
        }
        StopCondition::TotalPages { path } => {
            let pages = current.page + 1;
            match string_at_path(response.body, path).and_then(|s| s.parse::<u32>().ok()) {
                Some(total_pages) => StopResult::from(pages >= total_pages),
                None => StopResult::Continue,
            }
        }
    }
}
