//! Pagination strategy implementations
//!
//! Each strategy handles a specific pagination pattern.

use super::types::{check_stop_condition, PageRequest, PageResponse, PageStrategy, StopCondition};
use crate::decode::string_at_path;
use url::Url;

// ============================================================================
// Cursor Pagination
// ============================================================================

/// Cursor-based pagination (e.g., Stripe, Slack)
///
/// Uses a cursor value from the response to fetch the next page.
/// Common patterns:
/// - `?starting_after=obj_123`
/// - `?cursor=abc123`
#[derive(Debug, Clone)]
pub struct CursorStrategy {
    /// Query parameter name for cursor
    pub cursor_param: String,
    /// Path to the cursor in the response
    pub cursor_path: String,
    /// Stop condition
    pub stop_condition: StopCondition,
}

impl CursorStrategy {
    /// Create a new cursor strategy
    pub fn new(
        cursor_param: impl Into<String>,
        cursor_path: impl Into<String>,
        stop_condition: StopCondition,
    ) -> Self {
        Self {
            cursor_param: cursor_param.into(),
            cursor_path: cursor_path.into(),
            stop_condition,
        }
    }
}

impl PageStrategy for CursorStrategy {
    fn next_request(
        &self,
        current: &PageRequest,
        response: &PageResponse<'_>,
    ) -> Option<PageRequest> {
        if check_stop_condition(&self.stop_condition, current, response).should_stop() {
            return None;
        }

        // Missing or empty cursor means last page
        let cursor = string_at_path(response.body, &self.cursor_path)?;
        if cursor.is_empty() {
            return None;
        }

        Some(
            current
                .following(response.records)
                .with_query(&self.cursor_param, cursor),
        )
    }
}

// ============================================================================
// Offset Pagination
// ============================================================================

/// Offset-based pagination (e.g., SQL-style pagination)
///
/// Uses offset and limit parameters to paginate.
/// Common patterns:
/// - `?offset=100&limit=50`
/// - `?skip=100&take=50`
#[derive(Debug, Clone)]
pub struct OffsetStrategy {
    /// Query parameter name for offset
    pub offset_param: String,
    /// Query parameter name for limit
    pub limit_param: String,
    /// Number of records per page
    pub limit: u32,
    /// Stop condition
    pub stop_condition: StopCondition,
}

impl OffsetStrategy {
    /// Create a new offset strategy
    pub fn new(
        offset_param: impl Into<String>,
        limit_param: impl Into<String>,
        limit: u32,
        stop_condition: StopCondition,
    ) -> Self {
        Self {
            offset_param: offset_param.into(),
            limit_param: limit_param.into(),
            limit,
            stop_condition,
        }
    }

    fn at_offset(&self, request: PageRequest, offset: u64) -> PageRequest {
        let mut request = request
            .with_query(&self.offset_param, offset.to_string())
            .with_query(&self.limit_param, self.limit.to_string());
        request.offset = offset;
        request
    }
}

impl PageStrategy for OffsetStrategy {
    fn first_request(&self, request: PageRequest) -> PageRequest {
        let offset = request.offset;
        self.at_offset(request, offset)
    }

    fn next_request(
        &self,
        current: &PageRequest,
        response: &PageResponse<'_>,
    ) -> Option<PageRequest> {
        if check_stop_condition(&self.stop_condition, current, response).should_stop() {
            return None;
        }

        // A short page is the last one
        if response.records < self.limit as usize {
            return None;
        }

        let offset = current.offset + u64::from(self.limit);
        Some(self.at_offset(current.following(response.records), offset))
    }
}

// ============================================================================
// Page Number Pagination
// ============================================================================

/// Page number pagination (e.g., traditional web pagination)
///
/// Uses page number parameter to paginate.
/// Common patterns:
/// - `?page=2`
/// - `?page=2&per_page=50`
#[derive(Debug, Clone)]
pub struct PageNumberStrategy {
    /// Query parameter name for page number
    pub page_param: String,
    /// First page number (usually 0 or 1)
    pub start_page: u32,
    /// Optional page size parameter name
    pub page_size_param: Option<String>,
    /// Page size value
    pub page_size: Option<u32>,
    /// Stop condition
    pub stop_condition: StopCondition,
}

impl PageNumberStrategy {
    /// Create a new page number strategy
    pub fn new(page_param: impl Into<String>, start_page: u32) -> Self {
        Self {
            page_param: page_param.into(),
            start_page,
            page_size_param: None,
            page_size: None,
            stop_condition: StopCondition::EmptyPage,
        }
    }

    /// Set page size parameter
    #[must_use]
    pub fn with_page_size(mut self, param: impl Into<String>, size: u32) -> Self {
        self.page_size_param = Some(param.into());
        self.page_size = Some(size);
        self
    }

    /// Set stop condition
    #[must_use]
    pub fn with_stop_condition(mut self, condition: StopCondition) -> Self {
        self.stop_condition = condition;
        self
    }

    fn numbered(&self, request: PageRequest) -> PageRequest {
        let number = self.start_page + request.page;
        let mut request = request.with_query(&self.page_param, number.to_string());
        if let (Some(param), Some(size)) = (&self.page_size_param, self.page_size) {
            request = request.with_query(param, size.to_string());
        }
        request
    }
}

impl PageStrategy for PageNumberStrategy {
    fn first_request(&self, request: PageRequest) -> PageRequest {
        self.numbered(request)
    }

    fn next_request(
        &self,
        current: &PageRequest,
        response: &PageResponse<'_>,
    ) -> Option<PageRequest> {
        if check_stop_condition(&self.stop_condition, current, response).should_stop() {
            return None;
        }

        if let Some(size) = self.page_size {
            if response.records < size as usize {
                return None;
            }
        }

        Some(self.numbered(current.following(response.records)))
    }
}

// ============================================================================
// Link Header Pagination
// ============================================================================

/// Link header pagination (RFC 5988)
///
/// Extracts next page URL from the Link header.
/// Common in GitHub, GitLab APIs.
/// Format: `Link: <https://api.github.com/...?page=2>; rel="next", ...`
#[derive(Debug, Clone)]
pub struct LinkHeaderStrategy {
    /// Rel value to follow (default: "next")
    pub rel: String,
}

impl Default for LinkHeaderStrategy {
    fn default() -> Self {
        Self {
            rel: "next".to_string(),
        }
    }
}

impl LinkHeaderStrategy {
    /// Create a new link header strategy
    pub fn new(rel: impl Into<String>) -> Self {
        Self { rel: rel.into() }
    }
}

impl PageStrategy for LinkHeaderStrategy {
    fn next_request(
        &self,
        current: &PageRequest,
        response: &PageResponse<'_>,
    ) -> Option<PageRequest> {
        let header = response.headers.get("link")?.to_str().ok()?;
        let next = parse_link_header(header, &self.rel)?;
        let url = resolve_url(&current.url, &next);
        Some(current.following(response.records).with_url(url))
    }
}

/// Parse a Link header and extract the URL for the given rel
pub fn parse_link_header(header: &str, target_rel: &str) -> Option<String> {
    // <url>; rel="next", <url>; rel="prev"
    for part in header.split(',') {
        let mut url = None;
        let mut rel = None;

        for segment in part.trim().split(';') {
            let segment = segment.trim();
            if let Some(inner) = segment
                .strip_prefix('<')
                .and_then(|s| s.strip_suffix('>'))
            {
                url = Some(inner);
            } else if let Some(stripped) = segment.strip_prefix("rel=") {
                rel = Some(stripped.trim_matches('"').trim_matches('\''));
            }
        }

        if let (Some(u), Some(r)) = (url, rel) {
            // rel may hold several space-separated values
            if r.split_whitespace().any(|r| r == target_rel) {
                return Some(u.to_string());
            }
        }
    }

    None
}

// ============================================================================
// Next URL Pagination
// ============================================================================

/// Next URL pagination (URL in response body)
///
/// Extracts next page URL from a field in the response body.
/// Common patterns:
/// - `{ "next": "https://api.example.com/items?page=2" }`
/// - `{ "pagination": { "next_url": "..." } }`
#[derive(Debug, Clone)]
pub struct NextUrlStrategy {
    /// Path to the next URL in the response
    pub path: String,
}

impl NextUrlStrategy {
    /// Create a new next URL strategy
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

impl PageStrategy for NextUrlStrategy {
    fn next_request(
        &self,
        current: &PageRequest,
        response: &PageResponse<'_>,
    ) -> Option<PageRequest> {
        let next = string_at_path(response.body, &self.path)?;
        if next.is_empty() {
            return None;
        }
        let url = resolve_url(&current.url, &next);
        Some(current.following(response.records).with_url(url))
    }
}

/// Resolve a possibly relative link against the URL it came from
fn resolve_url(base: &str, link: &str) -> String {
    Url::parse(base)
        .and_then(|base| base.join(link))
        .map_or_else(|_| link.to_string(), String::from)
}

// ============================================================================
// No Pagination
// ============================================================================

/// No pagination - single request
#[derive(Debug, Clone, Copy, Default)]
pub struct SinglePage;

impl PageStrategy for SinglePage {
    fn next_request(
        &self,
        _current: &PageRequest,
        _response: &PageResponse<'_>,
    ) -> Option<PageRequest> {
        None
    }
}
