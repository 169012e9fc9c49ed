//! The orchestration loop
//!
//! One task owns the current state and the generation counter. Intents and
//! fetch completions are reduced here, in arrival order, and every
//! reduction is published before the next event is looked at.

use super::handle::Publisher;
use super::types::{EngineConfig, EngineStats, Intent};
use crate::provider::PageProvider;
use crate::state::{self, Event, State};
use crate::types::Page;
use futures::{Stream, StreamExt};
use std::fmt::Debug;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Result of a fetch task, tagged with the generation it was started under
pub(crate) struct Completion<P, T, E> {
    pub(crate) generation: u64,
    pub(crate) result: Result<Page<P, T>, E>,
}

struct InFlight {
    generation: u64,
    task: JoinHandle<()>,
}

pub(crate) type CompletionRx<P, T, E> = mpsc::UnboundedReceiver<Completion<P, T, E>>;

pub(crate) struct Driver<P, T, Pr>
where
    Pr: PageProvider<P, T>,
{
    provider: Arc<Pr>,
    pub(crate) state: State<P, T, Pr::Error>,
    generation: u64,
    in_flight: Option<InFlight>,
    results: mpsc::UnboundedSender<Completion<P, T, Pr::Error>>,
    publisher: Publisher<P, T, Pr::Error>,
    pub(crate) stats: EngineStats,
    config: EngineConfig,
}

impl<P, T, Pr> Driver<P, T, Pr>
where
    P: Clone + PartialEq + Debug + Send + Sync + 'static,
    T: Clone + Send + Sync + 'static,
    Pr: PageProvider<P, T>,
    Pr::Error: Debug,
{
    pub(crate) fn new(
        state: State<P, T, Pr::Error>,
        provider: Arc<Pr>,
        publisher: Publisher<P, T, Pr::Error>,
        config: EngineConfig,
    ) -> (Self, CompletionRx<P, T, Pr::Error>) {
        let (results, results_rx) = mpsc::unbounded_channel();
        let driver = Self {
            provider,
            state,
            generation: 0,
            in_flight: None,
            results,
            publisher,
            stats: EngineStats::new(),
            config,
        };
        (driver, results_rx)
    }

    /// Drive the state machine until shutdown, until every subscriber is
    /// gone, or until the intent source ends and nothing is left in flight
    pub(crate) async fn run<I>(mut self, mut results: CompletionRx<P, T, Pr::Error>, intents: I)
    where
        I: Stream<Item = Intent<P>>,
    {
        let mut intents = std::pin::pin!(intents);
        let mut intents_open = true;

        self.publish();
        self.start_fetch();
        self.publish_stats();

        loop {
            if !intents_open && self.in_flight.is_none() {
                break;
            }

            tokio::select! {
                biased;
                () = self.publisher.unobserved() => {
                    debug!("no subscribers left");
                    break;
                }
                Some(completion) = results.recv() => self.on_completion(completion),
                intent = intents.next(), if intents_open => match intent {
                    Some(Intent::Shutdown) => {
                        debug!("shutdown requested");
                        break;
                    }
                    Some(intent) => self.on_intent(intent),
                    None => {
                        debug!("intent source closed");
                        intents_open = false;
                    }
                },
                else => break,
            }

            self.publish_stats();
        }

        self.cancel_in_flight();
        self.publish_stats();
        info!(
            pages = self.stats.pages_loaded,
            errors = self.stats.fetch_errors,
            cancelled = self.stats.fetches_cancelled,
            stale = self.stats.stale_results_discarded,
            elements = self.stats.elements,
            "pagination engine stopped"
        );
    }

    pub(crate) fn on_intent(&mut self, intent: Intent<P>) {
        debug!(intent = intent.kind(), "intent received");
        match intent {
            Intent::Advance => {
                if self.apply(Event::UserAdvance) {
                    self.start_fetch();
                } else {
                    self.stats.add_ignored_advance();
                }
            }
            Intent::Reset(parameter) => {
                // Supersede first so a late result can never match
                self.cancel_in_flight();
                self.apply(Event::UserReset(parameter));
                self.start_fetch();
            }
            Intent::Shutdown => self.cancel_in_flight(),
        }
    }

    pub(crate) fn on_completion(&mut self, completion: Completion<P, T, Pr::Error>) {
        let current = self.in_flight.as_ref().map(|f| f.generation);
        if current != Some(completion.generation) {
            self.stats.add_stale();
            debug!(
                generation = completion.generation,
                current = ?current,
                "discarding stale fetch result"
            );
            return;
        }
        self.in_flight = None;

        match &completion.result {
            Ok(page) => {
                self.stats.add_page();
                debug!(
                    generation = completion.generation,
                    elements = page.len(),
                    last = page.is_last(),
                    "page loaded"
                );
            }
            Err(error) => {
                self.stats.add_error();
                warn!(generation = completion.generation, error = ?error, "page fetch failed");
            }
        }

        self.apply(Event::from_result(completion.result));
    }

    /// Reduce one event into the current state, publishing the result.
    /// Returns whether the state changed.
    fn apply(&mut self, event: Event<P, T, Pr::Error>) -> bool {
        let kind = event.kind();
        let current = std::mem::replace(
            &mut self.state,
            State::Loaded {
                parameter: None,
                elements: Vec::new(),
                error: None,
            },
        );

        let step = state::step(current, event);
        let changed = step.is_changed();
        self.state = step.into_state();
        self.stats.set_elements(self.state.elements().len());

        debug!(
            event = kind,
            changed,
            loading = self.state.is_loading(),
            elements = self.state.elements().len(),
            "reduced"
        );

        if changed || !self.config.deduplicate {
            self.publish();
        }
        changed
    }

    /// Start a fetch for the current state, if it asks for one
    fn start_fetch(&mut self) {
        let Some(parameter) = self.state.fetch_request().cloned() else {
            return;
        };

        // Only ever one fetch at a time
        self.cancel_in_flight();

        self.generation += 1;
        let generation = self.generation;
        debug!(generation, parameter = ?parameter, "starting fetch");

        let provider = Arc::clone(&self.provider);
        let results = self.results.clone();
        let task = tokio::spawn(async move {
            let result = provider.fetch(parameter).await;
            // The loop may have stopped in the meantime
            let _ = results.send(Completion { generation, result });
        });

        self.in_flight = Some(InFlight { generation, task });
        self.stats.add_fetch();
    }

    fn cancel_in_flight(&mut self) {
        if let Some(in_flight) = self.in_flight.take() {
            in_flight.task.abort();
            self.stats.add_cancelled();
            debug!(generation = in_flight.generation, "cancelled in-flight fetch");
        }
    }

    pub(crate) fn in_flight_generation(&self) -> Option<u64> {
        self.in_flight.as_ref().map(|f| f.generation)
    }

    /// Counters go out first so a subscriber woken by a snapshot sees
    /// stats at least as recent as it
    fn publish(&self) {
        self.publisher.publish_stats(&self.stats);
        self.publisher.publish(&self.state);
    }

    fn publish_stats(&self) {
        self.publisher.publish_stats(&self.stats);
    }
}
