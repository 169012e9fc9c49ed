// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # pagefeed
//!
//! Incremental pagination as a feedback loop: a pure state machine over
//! "advance" and "reset" intents, driven by an async loop that fetches one
//! page at a time and drops results that a reset has superseded.
//!
//! ## Features
//!
//! - **Pure Reducer**: `reduce(state, event)` holds every transition rule
//! - **Single-Flight Fetching**: advances while a page is loading are no-ops
//! - **Cancel on Supersede**: a reset aborts the in-flight fetch, and
//!   generation tags keep late results out of the new sequence
//! - **HTTP Provider**: cursor, offset, page number, link header and next URL
//!   pagination over JSON APIs
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pagefeed::{provider_fn, Page, PaginationEngine};
//!
//! # async fn demo() -> pagefeed::Result<()> {
//! let provider = provider_fn(|offset: u32| async move {
//!     let elements: Vec<u32> = (offset..offset + 10).collect();
//!     let next = (offset < 90).then_some(offset + 10);
//!     Ok::<_, std::io::Error>(Page::new(next, elements))
//! });
//!
//! let (handle, mut states) = PaginationEngine::new(0u32, provider).spawn::<u32>();
//! let first = states.next_loaded().await;
//! handle.advance().await?;
//! let second = states.next_loaded().await;
//! # let _ = (first, second);
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! ```text
//!   advance / reset intents
//!            │
//! ┌──────────▼───────────┐  fetch(P)   ┌───────────────┐
//! │    engine (loop)     ├────────────►│ PageProvider  │
//! │  generation, 1 task  │◄────────────┤ (HTTP, fn, ..)│
//! └──────────┬───────────┘  Page/Err   └───────────────┘
//!            │ reduce(state, event)
//! ┌──────────▼───────────┐
//! │ State: Loading |     │──► StateStream / watch
//! │        Loaded        │
//! └──────────────────────┘
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Common types and type aliases
pub mod types;

/// Pagination state machine
pub mod state;

/// Page provider contract
pub mod provider;

/// Pagination engine
pub mod engine;

/// HTTP pagination strategies
pub mod pagination;

/// Response decoders
pub mod decode;

/// HTTP page provider with rate limiting
pub mod http;

/// Source configuration
pub mod config;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

// Re-export commonly used types
pub use config::SourceConfig;
pub use engine::{
    pagination_system, EngineConfig, EngineStats, Intent, PaginationEngine, PaginationHandle,
    StateStream,
};
pub use http::HttpPageProvider;
pub use pagination::PageRequest;
pub use provider::{provider_fn, FnProvider, PageProvider};
pub use state::{reduce, Event, State};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
