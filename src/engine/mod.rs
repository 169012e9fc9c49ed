//! Pagination engine module
//!
//! The feedback loop that glues the pure reducer to a page provider.
//!
//! # Overview
//!
//! The engine module provides:
//! - `pagination_system` - Drive pagination from an advance stream and a reset stream
//! - `PaginationEngine` - Builder that spawns an engine controlled by a `PaginationHandle`
//! - `StateStream` - Ordered snapshots of the pagination state
//! - `EngineConfig` / `EngineStats` - Configuration and counters
//!
//! # Guarantees
//!
//! - At most one fetch is in flight.
//! - A reset aborts the in-flight fetch. Each fetch is tagged with a
//!   generation when it starts and its result is applied only while that
//!   generation is still the one in flight, so a slow page for an old
//!   parameter can never land on top of a newer one.
//! - Provider failures end up in `State::Loaded { error, .. }` and never
//!   stop the loop.
//!
//! All of these spawn tasks and must be called from within a tokio runtime.

mod driver;
mod handle;
mod types;

pub use handle::{PaginationHandle, StateStream};
pub use types::{EngineConfig, EngineStats, Intent};

use crate::provider::PageProvider;
use crate::state::State;
use driver::Driver;
use futures::{Stream, StreamExt};
use handle::Publisher;
use std::fmt::Debug;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::Instrument;

/// Paginate `provider` starting at `initial`
///
/// Every item of `advance` asks for the next page; every item of `reset`
/// restarts pagination from that parameter. The returned stream starts
/// with `Loading(initial, [])` and ends once both sources have ended and
/// the last fetch has settled. Dropping the returned stream stops the engine
/// and aborts any in-flight fetch.
pub fn pagination_system<P, T, Pr, A, R>(
    initial: P,
    advance: A,
    reset: R,
    provider: Pr,
) -> StateStream<P, T, Pr::Error>
where
    P: Clone + PartialEq + Debug + Send + Sync + 'static,
    T: Clone + Send + Sync + 'static,
    Pr: PageProvider<P, T>,
    Pr::Error: Debug,
    A: Stream<Item = ()> + Send + 'static,
    R: Stream<Item = P> + Send + 'static,
{
    let intents = futures::stream::select(
        advance.map(|()| Intent::Advance),
        reset.map(Intent::Reset),
    );
    PaginationEngine::new(initial, provider).run_with(intents)
}

/// Builder for a pagination engine
#[derive(Debug)]
pub struct PaginationEngine<P, Pr> {
    initial: P,
    provider: Arc<Pr>,
    config: EngineConfig,
}

impl<P, Pr> PaginationEngine<P, Pr> {
    /// Create an engine that starts by fetching `initial`
    pub fn new(initial: P, provider: Pr) -> Self {
        Self::with_shared_provider(initial, Arc::new(provider))
    }

    /// Create an engine over a provider that is shared with other engines
    pub fn with_shared_provider(initial: P, provider: Arc<Pr>) -> Self {
        Self {
            initial,
            provider,
            config: EngineConfig::default(),
        }
    }

    /// Set engine configuration
    #[must_use]
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Spawn the engine, returning a handle for intents and the state stream
    ///
    /// The engine keeps running while either the handle or the stream is
    /// alive. The stream buffers every snapshot until read, so a caller that
    /// only polls the handle should drop it.
    pub fn spawn<T>(self) -> (PaginationHandle<P, T, Pr::Error>, StateStream<P, T, Pr::Error>)
    where
        P: Clone + PartialEq + Debug + Send + Sync + 'static,
        T: Clone + Send + Sync + 'static,
        Pr: PageProvider<P, T>,
        Pr::Error: Debug,
    {
        let (tx, mut rx) = mpsc::channel(self.config.intent_buffer.max(1));
        let intents = futures::stream::poll_fn(move |cx| rx.poll_recv(cx));

        let subscribers = self.launch(intents);
        let handle = PaginationHandle::new(tx, subscribers.current, subscribers.stats);
        (handle, subscribers.updates)
    }

    /// Spawn the engine over an external intent stream
    pub fn run_with<T, I>(self, intents: I) -> StateStream<P, T, Pr::Error>
    where
        P: Clone + PartialEq + Debug + Send + Sync + 'static,
        T: Clone + Send + Sync + 'static,
        Pr: PageProvider<P, T>,
        Pr::Error: Debug,
        I: Stream<Item = Intent<P>> + Send + 'static,
    {
        self.launch(intents).updates
    }

    fn launch<T, I>(self, intents: I) -> handle::Subscribers<P, T, Pr::Error>
    where
        P: Clone + PartialEq + Debug + Send + Sync + 'static,
        T: Clone + Send + Sync + 'static,
        Pr: PageProvider<P, T>,
        Pr::Error: Debug,
        I: Stream<Item = Intent<P>> + Send + 'static,
    {
        let state = State::loading(self.initial);
        let (publisher, subscribers) = Publisher::new(&state);
        let span = tracing::info_span!("pagination", name = %self.config.span_name());
        let (driver, results) = Driver::new(state, self.provider, publisher, self.config);

        tokio::spawn(driver.run(results, intents).instrument(span));
        subscribers
    }
}

#[cfg(test)]
mod tests;
