//! HTTP page provider module
//!
//! Implements the page provider contract over a JSON HTTP API.
//!
//! # Features
//!
//! - **Pagination Strategies**: the next request comes from a `PageStrategy`
//! - **Record Extraction**: records located by dot path or JSONPath
//! - **Rate Limiting**: Token bucket rate limiter using governor
//!
//! The provider makes exactly one request per page. Failed requests surface
//! as errors and are retried only if the caller advances again.

mod client;
mod rate_limit;

pub use client::{HttpPageProvider, HttpProviderConfig, HttpProviderConfigBuilder};
pub use rate_limit::{RateLimiter, RateLimiterConfig};
