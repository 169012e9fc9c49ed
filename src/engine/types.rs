//! Engine types
//!
//! Intents, configuration and counters for the pagination engine.

use serde::{Deserialize, Serialize};

/// An external request fed into the engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent<P> {
    /// Load the next page (e.g. "scrolled near the bottom")
    Advance,
    /// Drop everything and restart from this parameter (e.g. "query changed")
    Reset(P),
    /// Stop the engine, aborting any in-flight fetch
    Shutdown,
}

impl<P> Intent<P> {
    /// Short name for logging
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Advance => "advance",
            Self::Reset(_) => "reset",
            Self::Shutdown => "shutdown",
        }
    }
}

/// Configuration for a pagination engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Label attached to the engine's tracing span
    pub name: Option<String>,
    /// Capacity of the handle's intent channel
    pub intent_buffer: usize,
    /// Skip publishing reductions that leave the state unchanged
    pub deduplicate: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            name: None,
            intent_buffer: 32,
            deduplicate: true,
        }
    }
}

impl EngineConfig {
    /// Create a new engine config
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the span label
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the intent channel capacity (at least 1)
    #[must_use]
    pub fn with_intent_buffer(mut self, size: usize) -> Self {
        self.intent_buffer = size.max(1);
        self
    }

    /// Set whether unchanged states are published
    #[must_use]
    pub fn with_deduplicate(mut self, deduplicate: bool) -> Self {
        self.deduplicate = deduplicate;
        self
    }

    pub(crate) fn span_name(&self) -> &str {
        self.name.as_deref().unwrap_or("default")
    }
}

/// Counters maintained by a running engine
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EngineStats {
    /// Fetches handed to the provider
    pub fetches_started: usize,
    /// In-flight fetches aborted by a reset or shutdown
    pub fetches_cancelled: usize,
    /// Successful fetches applied to the state
    pub pages_loaded: usize,
    /// Failed fetches applied to the state
    pub fetch_errors: usize,
    /// Results dropped because their generation was superseded
    pub stale_results_discarded: usize,
    /// Advances that did not change the state
    pub advances_ignored: usize,
    /// Elements currently accumulated
    pub elements: usize,
}

impl EngineStats {
    /// Create new stats
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a started fetch
    pub fn add_fetch(&mut self) {
        self.fetches_started += 1;
    }

    /// Add a cancelled fetch
    pub fn add_cancelled(&mut self) {
        self.fetches_cancelled += 1;
    }

    /// Add a loaded page
    pub fn add_page(&mut self) {
        self.pages_loaded += 1;
    }

    /// Add a fetch error
    pub fn add_error(&mut self) {
        self.fetch_errors += 1;
    }

    /// Add a discarded stale result
    pub fn add_stale(&mut self) {
        self.stale_results_discarded += 1;
    }

    /// Add an ignored advance
    pub fn add_ignored_advance(&mut self) {
        self.advances_ignored += 1;
    }

    /// Set the accumulated element count
    pub fn set_elements(&mut self, count: usize) {
        self.elements = count;
    }
}
