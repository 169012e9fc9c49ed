//! Consumer-facing side of a running engine

use super::types::{EngineStats, Intent};
use crate::error::{Error, Result};
use crate::state::State;
use futures::Stream;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::{mpsc, watch};

/// Write side of the engine's outputs, owned by the loop
pub(crate) struct Publisher<P, T, E> {
    updates: mpsc::UnboundedSender<State<P, T, E>>,
    current: watch::Sender<State<P, T, E>>,
    stats: watch::Sender<EngineStats>,
}

/// Read sides matching a [`Publisher`]
pub(crate) struct Subscribers<P, T, E> {
    pub(crate) updates: StateStream<P, T, E>,
    pub(crate) current: watch::Receiver<State<P, T, E>>,
    pub(crate) stats: watch::Receiver<EngineStats>,
}

impl<P: Clone, T: Clone, E> Publisher<P, T, E> {
    pub(crate) fn new(initial: &State<P, T, E>) -> (Self, Subscribers<P, T, E>) {
        let (updates, updates_rx) = mpsc::unbounded_channel();
        let (current, current_rx) = watch::channel(initial.clone());
        let (stats, stats_rx) = watch::channel(EngineStats::default());

        let publisher = Self {
            updates,
            current,
            stats,
        };
        let subscribers = Subscribers {
            updates: StateStream { rx: updates_rx },
            current: current_rx,
            stats: stats_rx,
        };
        (publisher, subscribers)
    }

    pub(crate) fn publish(&self, state: &State<P, T, E>) {
        // Nobody may be listening on the stream; the watch still updates
        let _ = self.updates.send(state.clone());
        self.current.send_replace(state.clone());
    }

    /// Resolves once every reader is gone: the stream and all watch
    /// receivers, including those held by handles
    pub(crate) async fn unobserved(&self) {
        self.updates.closed().await;
        self.current.closed().await;
        self.stats.closed().await;
    }

    pub(crate) fn publish_stats(&self, stats: &EngineStats) {
        self.stats.send_if_modified(|current| {
            if current == stats {
                false
            } else {
                *current = stats.clone();
                true
            }
        });
    }
}

// ============================================================================
// State Stream
// ============================================================================

/// Ordered sequence of state snapshots published by an engine
///
/// Every published snapshot is delivered exactly once, in reduction order.
/// The stream ends when the engine stops.
///
/// Snapshots queue up without bound until read. Drain the stream, or drop
/// it if only [`PaginationHandle::current`] is of interest. An engine with
/// no stream and no handle left stops and aborts its in-flight fetch.
#[derive(Debug)]
pub struct StateStream<P, T, E> {
    rx: mpsc::UnboundedReceiver<State<P, T, E>>,
}

impl<P, T, E> StateStream<P, T, E> {
    /// Receive the next snapshot
    pub async fn recv(&mut self) -> Option<State<P, T, E>> {
        self.rx.recv().await
    }

    /// Skip snapshots until one matches `predicate`
    pub async fn wait_for<F>(&mut self, mut predicate: F) -> Option<State<P, T, E>>
    where
        F: FnMut(&State<P, T, E>) -> bool,
    {
        while let Some(state) = self.rx.recv().await {
            if predicate(&state) {
                return Some(state);
            }
        }
        None
    }

    /// Skip snapshots until the next `Loaded` one
    pub async fn next_loaded(&mut self) -> Option<State<P, T, E>> {
        self.wait_for(|state| !state.is_loading()).await
    }
}

impl<P, T, E> Stream for StateStream<P, T, E> {
    type Item = State<P, T, E>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().rx.poll_recv(cx)
    }
}

// ============================================================================
// Handle
// ============================================================================

/// Handle for emitting intents to a spawned engine and reading its state
pub struct PaginationHandle<P, T, E> {
    intents: mpsc::Sender<Intent<P>>,
    current: watch::Receiver<State<P, T, E>>,
    stats: watch::Receiver<EngineStats>,
}

impl<P, T, E> Clone for PaginationHandle<P, T, E> {
    fn clone(&self) -> Self {
        Self {
            intents: self.intents.clone(),
            current: self.current.clone(),
            stats: self.stats.clone(),
        }
    }
}

impl<P, T, E> std::fmt::Debug for PaginationHandle<P, T, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaginationHandle")
            .field("closed", &self.intents.is_closed())
            .finish_non_exhaustive()
    }
}

impl<P, T, E> PaginationHandle<P, T, E> {
    pub(crate) fn new(
        intents: mpsc::Sender<Intent<P>>,
        current: watch::Receiver<State<P, T, E>>,
        stats: watch::Receiver<EngineStats>,
    ) -> Self {
        Self {
            intents,
            current,
            stats,
        }
    }

    /// Ask for the next page. A no-op while a fetch is outstanding or once
    /// pages are exhausted.
    pub async fn advance(&self) -> Result<()> {
        self.send(Intent::Advance).await
    }

    /// Discard accumulated elements and restart from `parameter`,
    /// cancelling any in-flight fetch
    pub async fn reset(&self, parameter: P) -> Result<()> {
        self.send(Intent::Reset(parameter)).await
    }

    /// Stop the engine
    pub async fn shutdown(&self) -> Result<()> {
        self.send(Intent::Shutdown).await
    }

    /// Wait until the engine has stopped
    pub async fn closed(&self) {
        self.intents.closed().await;
    }

    /// Whether the engine has stopped
    pub fn is_closed(&self) -> bool {
        self.intents.is_closed()
    }

    /// Latest published snapshot
    pub fn current(&self) -> State<P, T, E>
    where
        P: Clone,
        T: Clone,
    {
        self.current.borrow().clone()
    }

    /// Receiver that always holds the latest snapshot
    pub fn watch(&self) -> watch::Receiver<State<P, T, E>> {
        self.current.clone()
    }

    /// Latest counters
    pub fn stats(&self) -> EngineStats {
        self.stats.borrow().clone()
    }

    /// Receiver for counter updates
    pub fn watch_stats(&self) -> watch::Receiver<EngineStats> {
        self.stats.clone()
    }

    async fn send(&self, intent: Intent<P>) -> Result<()> {
        self.intents
            .send(intent)
            .await
            .map_err(|_| Error::EngineClosed)
    }
}
