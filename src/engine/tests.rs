//! Tests for engine module

use super::driver::{Completion, Driver};
use super::handle::Publisher;
use super::*;
use crate::provider::provider_fn;
use crate::types::Page;
use pretty_assertions::assert_eq;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use test_case::test_case;
use tokio::sync::Semaphore;

type S = State<u32, u32, &'static str>;
type Named = State<&'static str, &'static str, &'static str>;

fn loading(parameter: u32, elements: Vec<u32>) -> S {
    State::Loading {
        parameter,
        elements,
    }
}

fn loaded(parameter: Option<u32>, elements: Vec<u32>, error: Option<&'static str>) -> S {
    State::Loaded {
        parameter,
        elements,
        error: error.map(Arc::new),
    }
}

/// Pages of five counting up from the cursor; fails from cursor 70 on
fn counter_provider() -> impl PageProvider<u32, u32, Error = &'static str> {
    provider_fn(|cursor: u32| async move {
        if cursor >= 70 {
            return Err("OutOfBounds");
        }
        Ok(Page::more(cursor + 5, (cursor + 1..=cursor + 5).collect()))
    })
}

/// Never completes; results are fed to the driver by hand
fn pending_provider() -> impl PageProvider<u32, u32, Error = &'static str> {
    provider_fn(|_cursor: u32| std::future::pending::<Result<Page<u32, u32>, &'static str>>())
}

fn driver_at(
    state: S,
) -> Driver<u32, u32, impl PageProvider<u32, u32, Error = &'static str>> {
    let (publisher, _subscribers) = Publisher::new(&state);
    let (driver, _results) = Driver::new(
        state,
        Arc::new(pending_provider()),
        publisher,
        EngineConfig::default(),
    );
    driver
}

// ============================================================================
// EngineConfig Tests
// ============================================================================

#[test]
fn test_engine_config_default() {
    let config = EngineConfig::default();
    assert_eq!(config.name, None);
    assert_eq!(config.intent_buffer, 32);
    assert!(config.deduplicate);
    assert_eq!(config.span_name(), "default");
}

#[test]
fn test_engine_config_builder() {
    let config = EngineConfig::new()
        .with_name("github")
        .with_intent_buffer(0)
        .with_deduplicate(false);

    assert_eq!(config.span_name(), "github");
    assert_eq!(config.intent_buffer, 1);
    assert!(!config.deduplicate);
}

#[test]
fn test_engine_stats_mutations() {
    let mut stats = EngineStats::new();
    stats.add_fetch();
    stats.add_fetch();
    stats.add_cancelled();
    stats.add_page();
    stats.add_error();
    stats.add_stale();
    stats.add_ignored_advance();
    stats.set_elements(12);

    assert_eq!(stats.fetches_started, 2);
    assert_eq!(stats.fetches_cancelled, 1);
    assert_eq!(stats.pages_loaded, 1);
    assert_eq!(stats.fetch_errors, 1);
    assert_eq!(stats.stale_results_discarded, 1);
    assert_eq!(stats.advances_ignored, 1);
    assert_eq!(stats.elements, 12);
}

#[test]
fn test_intent_kind() {
    assert_eq!(Intent::<u32>::Advance.kind(), "advance");
    assert_eq!(Intent::Reset(1u32).kind(), "reset");
    assert_eq!(Intent::<u32>::Shutdown.kind(), "shutdown");
}

// ============================================================================
// Driver Tests
// ============================================================================

#[tokio::test]
async fn test_stale_generation_is_discarded() {
    let mut driver = driver_at(loaded(Some(1), vec![], None));

    driver.on_intent(Intent::Reset(10));
    let first = driver.in_flight_generation().unwrap();

    driver.on_intent(Intent::Reset(20));
    let second = driver.in_flight_generation().unwrap();
    assert!(second > first);

    // The superseded fetch for 10 reports back after 20 has started
    driver.on_completion(Completion {
        generation: first,
        result: Ok(Page::more(11, vec![100, 101])),
    });
    assert_eq!(driver.state, loading(20, vec![]));
    assert_eq!(driver.in_flight_generation(), Some(second));

    driver.on_completion(Completion {
        generation: second,
        result: Ok(Page::last(vec![7])),
    });
    assert_eq!(driver.state, loaded(None, vec![7], None));
    assert_eq!(driver.in_flight_generation(), None);

    assert_eq!(driver.stats.stale_results_discarded, 1);
    assert_eq!(driver.stats.fetches_cancelled, 1);
    assert_eq!(driver.stats.pages_loaded, 1);
}

#[tokio::test]
async fn test_result_after_completion_is_discarded() {
    let mut driver = driver_at(loaded(Some(1), vec![], None));
    driver.on_intent(Intent::Advance);
    let generation = driver.in_flight_generation().unwrap();

    driver.on_completion(Completion {
        generation,
        result: Ok(Page::more(2, vec![1])),
    });
    // Same generation delivered twice must not apply twice
    driver.on_completion(Completion {
        generation,
        result: Ok(Page::more(3, vec![1])),
    });

    assert_eq!(driver.state, loaded(Some(2), vec![1], None));
    assert_eq!(driver.stats.stale_results_discarded, 1);
}

#[tokio::test]
async fn test_duplicate_advance_starts_one_fetch() {
    let mut driver = driver_at(loaded(Some(5), vec![1, 2], None));

    driver.on_intent(Intent::Advance);
    driver.on_intent(Intent::Advance);

    assert_eq!(driver.state, loading(5, vec![1, 2]));
    assert_eq!(driver.stats.fetches_started, 1);
    assert_eq!(driver.stats.advances_ignored, 1);
    assert_eq!(driver.in_flight_generation(), Some(1));
}

#[tokio::test]
async fn test_advance_when_exhausted_starts_nothing() {
    let mut driver = driver_at(loaded(None, vec![1], None));
    driver.on_intent(Intent::Advance);

    assert_eq!(driver.state, loaded(None, vec![1], None));
    assert_eq!(driver.stats.fetches_started, 0);
    assert_eq!(driver.in_flight_generation(), None);
}

#[tokio::test]
async fn test_failure_keeps_parameter_for_retry() {
    let mut driver = driver_at(loaded(Some(3), vec![9], None));
    driver.on_intent(Intent::Advance);
    let generation = driver.in_flight_generation().unwrap();

    driver.on_completion(Completion {
        generation,
        result: Err("boom"),
    });
    assert_eq!(driver.state, loaded(Some(3), vec![9], Some("boom")));
    assert_eq!(driver.stats.fetch_errors, 1);

    driver.on_intent(Intent::Advance);
    assert_eq!(driver.state, loading(3, vec![9]));
    assert_eq!(driver.stats.fetches_started, 2);
}

#[tokio::test]
async fn test_shutdown_intent_cancels_in_flight() {
    let mut driver = driver_at(loaded(Some(3), vec![], None));
    driver.on_intent(Intent::Advance);
    driver.on_intent(Intent::Shutdown);

    assert_eq!(driver.in_flight_generation(), None);
    assert_eq!(driver.stats.fetches_cancelled, 1);
}

// ============================================================================
// Engine Scenario Tests
// ============================================================================

#[tokio::test]
async fn test_counter_scenario_until_out_of_bounds() {
    let (handle, mut states) = PaginationEngine::new(0u32, counter_provider()).spawn::<u32>();

    assert_eq!(states.recv().await.unwrap(), loading(0, vec![]));
    assert_eq!(
        states.recv().await.unwrap(),
        loaded(Some(5), (1..=5).collect(), None)
    );

    for cursor in (5..70).step_by(5) {
        handle.advance().await.unwrap();
        assert_eq!(
            states.recv().await.unwrap(),
            loading(cursor, (1..=cursor).collect())
        );
        assert_eq!(
            states.recv().await.unwrap(),
            loaded(Some(cursor + 5), (1..=cursor + 5).collect(), None)
        );
    }

    handle.advance().await.unwrap();
    assert_eq!(
        states.recv().await.unwrap(),
        loading(70, (1..=70).collect())
    );
    assert_eq!(
        states.recv().await.unwrap(),
        loaded(Some(70), (1..=70).collect(), Some("OutOfBounds"))
    );

    let stats = handle.stats();
    assert_eq!(stats.pages_loaded, 14);
    assert_eq!(stats.fetch_errors, 1);
    assert_eq!(stats.elements, 70);
}

#[tokio::test]
async fn test_reset_discards_accumulated_pages() {
    let data: Arc<HashMap<u32, Vec<u32>>> = Arc::new(
        [
            (1u32, (1..=5).collect::<Vec<u32>>()),
            (2, (6..=10).collect()),
        ]
            .into_iter()
            .collect(),
    );
    let provider = provider_fn(move |page: u32| {
        let data = Arc::clone(&data);
        async move {
            Ok::<_, &'static str>(Page::more(
                page + 1,
                data.get(&page).cloned().unwrap_or_default(),
            ))
        }
    });

    let (handle, mut states) = PaginationEngine::new(1u32, provider).spawn::<u32>();
    assert_eq!(
        states.next_loaded().await.unwrap(),
        loaded(Some(2), (1..=5).collect(), None)
    );

    handle.advance().await.unwrap();
    assert_eq!(
        states.next_loaded().await.unwrap(),
        loaded(Some(3), (1..=10).collect(), None)
    );

    handle.reset(1).await.unwrap();
    assert_eq!(states.recv().await.unwrap(), loading(1, vec![]));
    assert_eq!(
        states.recv().await.unwrap(),
        loaded(Some(2), (1..=5).collect(), None)
    );
}

fn named_loaded(
    parameter: Option<&'static str>,
    elements: Vec<&'static str>,
    error: Option<&'static str>,
) -> Named {
    State::Loaded {
        parameter,
        elements,
        error: error.map(Arc::new),
    }
}

/// Pages keyed by name, each pointing at the next
fn named_provider() -> impl PageProvider<&'static str, &'static str, Error = &'static str> {
    provider_fn(|page: &'static str| async move {
        match page {
            "page1" => Ok(Page::more("page2", vec!["a", "b"])),
            "page2" => Ok(Page::more("page3", vec!["c"])),
            "page3" => Ok(Page::more("page4", vec!["d", "e"])),
            _ => Err("NoSuchPage"),
        }
    })
}

#[test_case("page1", named_loaded(Some("page2"), vec!["a", "b"], None) ; "back to the first page")]
#[test_case("page2", named_loaded(Some("page3"), vec!["c"], None) ; "into the middle")]
#[test_case("page9", named_loaded(Some("page9"), vec![], Some("NoSuchPage")) ; "onto a missing page")]
#[tokio::test]
async fn test_reset_from_named_page(target: &'static str, expected: Named) {
    let (handle, mut states) =
        PaginationEngine::new("page1", named_provider()).spawn::<&'static str>();
    states.next_loaded().await.unwrap();

    handle.advance().await.unwrap();
    assert_eq!(
        states.next_loaded().await.unwrap(),
        named_loaded(Some("page3"), vec!["a", "b", "c"], None)
    );

    handle.reset(target).await.unwrap();
    assert_eq!(
        states.recv().await.unwrap(),
        State::Loading {
            parameter: target,
            elements: vec![],
        }
    );
    assert_eq!(states.recv().await.unwrap(), expected);
    handle.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_reset_supersedes_slow_fetch() {
    let provider = provider_fn(|page: u32| async move {
        if page == 1 {
            std::future::pending::<()>().await;
        }
        Ok::<_, &'static str>(Page::last(vec![page * 10]))
    });

    let (handle, mut states) = PaginationEngine::new(1u32, provider).spawn::<u32>();
    assert_eq!(states.recv().await.unwrap(), loading(1, vec![]));

    handle.reset(2).await.unwrap();
    assert_eq!(states.recv().await.unwrap(), loading(2, vec![]));
    assert_eq!(states.recv().await.unwrap(), loaded(None, vec![20], None));

    let stats = handle.stats();
    assert_eq!(stats.fetches_started, 2);
    assert_eq!(stats.fetches_cancelled, 1);
    assert_eq!(stats.pages_loaded, 1);
}

#[tokio::test]
async fn test_two_advances_invoke_provider_once() {
    let calls = Arc::new(AtomicUsize::new(0));
    let gate = Arc::new(Semaphore::new(0));

    let provider = {
        let calls = Arc::clone(&calls);
        let gate = Arc::clone(&gate);
        provider_fn(move |cursor: u32| {
            let calls = Arc::clone(&calls);
            let gate = Arc::clone(&gate);
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                if cursor > 0 {
                    let _permit = gate.acquire().await.map_err(|_| "gate closed")?;
                }
                Ok::<_, &'static str>(Page::more(cursor + 1, vec![cursor]))
            }
        })
    };

    let (handle, mut states) = PaginationEngine::new(0u32, provider).spawn::<u32>();
    states.next_loaded().await.unwrap();

    handle.advance().await.unwrap();
    handle.advance().await.unwrap();

    let mut stats = handle.watch_stats();
    stats
        .wait_for(|s| s.advances_ignored >= 1)
        .await
        .unwrap();

    gate.add_permits(1);
    assert_eq!(
        states.next_loaded().await.unwrap(),
        loaded(Some(2), vec![0, 1], None)
    );
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_terminal_page_ignores_advance() {
    let provider =
        provider_fn(|_page: u32| async move { Ok::<_, &'static str>(Page::last(vec![1, 2])) });

    let (handle, mut states) = PaginationEngine::new(0u32, provider).spawn::<u32>();
    assert_eq!(
        states.next_loaded().await.unwrap(),
        loaded(None, vec![1, 2], None)
    );

    handle.advance().await.unwrap();
    handle.advance().await.unwrap();

    let mut stats = handle.watch_stats();
    stats
        .wait_for(|s| s.advances_ignored >= 2)
        .await
        .unwrap();

    assert_eq!(handle.current(), loaded(None, vec![1, 2], None));
    assert_eq!(handle.stats().fetches_started, 1);
}

#[tokio::test]
async fn test_provider_failure_does_not_stop_engine() {
    let failed_once = Arc::new(AtomicBool::new(false));
    let provider = {
        let failed_once = Arc::clone(&failed_once);
        provider_fn(move |page: u32| {
            let first = !failed_once.swap(true, Ordering::SeqCst);
            async move {
                if first {
                    Err("connection reset")
                } else {
                    Ok(Page::more(page + 1, vec![page]))
                }
            }
        })
    };

    let (handle, mut states) = PaginationEngine::new(0u32, provider).spawn::<u32>();
    assert_eq!(
        states.next_loaded().await.unwrap(),
        loaded(Some(0), vec![], Some("connection reset"))
    );

    handle.advance().await.unwrap();
    assert_eq!(states.recv().await.unwrap(), loading(0, vec![]));
    assert_eq!(
        states.recv().await.unwrap(),
        loaded(Some(1), vec![0], None)
    );
}

#[tokio::test]
async fn test_publishes_unchanged_states_without_deduplication() {
    let config = EngineConfig::new().with_deduplicate(false);
    let (handle, mut states) = PaginationEngine::new(0u32, pending_provider())
        .with_config(config)
        .spawn::<u32>();

    assert_eq!(states.recv().await.unwrap(), loading(0, vec![]));
    handle.advance().await.unwrap();
    assert_eq!(states.recv().await.unwrap(), loading(0, vec![]));
}

#[tokio::test]
async fn test_shutdown_closes_handle_and_stream() {
    let (handle, mut states) = PaginationEngine::new(0u32, pending_provider()).spawn::<u32>();
    assert_eq!(states.recv().await.unwrap(), loading(0, vec![]));

    tokio_test::assert_ok!(handle.shutdown().await);
    handle.closed().await;

    assert!(handle.is_closed());
    assert!(matches!(
        handle.advance().await,
        Err(crate::Error::EngineClosed)
    ));
    assert!(states.recv().await.is_none());
    assert_eq!(handle.stats().fetches_cancelled, 1);
}

#[tokio::test]
async fn test_dropping_handle_stops_engine_once_idle() {
    let (handle, mut states) = PaginationEngine::new(0u32, counter_provider()).spawn::<u32>();
    drop(handle);

    assert_eq!(states.recv().await.unwrap(), loading(0, vec![]));
    assert_eq!(
        states.recv().await.unwrap(),
        loaded(Some(5), (1..=5).collect(), None)
    );
    assert!(states.recv().await.is_none());
}

// ============================================================================
// pagination_system Tests
// ============================================================================

#[tokio::test]
async fn test_pagination_system_with_streams() {
    let (advance_tx, advance_rx) = futures::channel::mpsc::unbounded::<()>();
    let (reset_tx, reset_rx) = futures::channel::mpsc::unbounded::<u32>();

    let mut states = pagination_system(0u32, advance_rx, reset_rx, counter_provider());

    assert_eq!(states.recv().await.unwrap(), loading(0, vec![]));
    assert_eq!(
        states.recv().await.unwrap(),
        loaded(Some(5), (1..=5).collect(), None)
    );

    advance_tx.unbounded_send(()).unwrap();
    assert_eq!(
        states.recv().await.unwrap(),
        loading(5, (1..=5).collect())
    );
    assert_eq!(
        states.recv().await.unwrap(),
        loaded(Some(10), (1..=10).collect(), None)
    );

    reset_tx.unbounded_send(0).unwrap();
    assert_eq!(states.recv().await.unwrap(), loading(0, vec![]));
    assert_eq!(
        states.recv().await.unwrap(),
        loaded(Some(5), (1..=5).collect(), None)
    );

    drop(advance_tx);
    drop(reset_tx);
    assert!(states.recv().await.is_none());
}

#[tokio::test]
async fn test_dropping_stream_stops_pagination_system() {
    let calls = Arc::new(AtomicUsize::new(0));
    let provider = {
        let calls = Arc::clone(&calls);
        provider_fn(move |cursor: u32| {
            calls.fetch_add(1, Ordering::SeqCst);
            async move { Ok::<_, &'static str>(Page::more(cursor + 1, vec![cursor])) }
        })
    };

    let (advance_tx, advance_rx) = futures::channel::mpsc::unbounded::<()>();
    let (_reset_tx, reset_rx) = futures::channel::mpsc::unbounded::<u32>();
    let mut states = pagination_system(0u32, advance_rx, reset_rx, provider);
    assert_eq!(
        states.next_loaded().await.unwrap(),
        loaded(Some(1), vec![0], None)
    );

    drop(states);
    for _ in 0..5 {
        // The engine may already be gone
        let _ = advance_tx.unbounded_send(());
    }

    // The loop drops its intent sources when it stops
    tokio::time::timeout(Duration::from_secs(5), async {
        while !advance_tx.is_closed() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_dropping_stream_keeps_spawned_engine_with_handle() {
    let (handle, states) = PaginationEngine::new(0u32, counter_provider()).spawn::<u32>();
    drop(states);

    let mut current = handle.watch();
    current.wait_for(|state| !state.is_loading()).await.unwrap();

    handle.advance().await.unwrap();
    current
        .wait_for(|state| state.elements().len() == 10)
        .await
        .unwrap();
    assert!(!handle.is_closed());
    assert_eq!(handle.stats().pages_loaded, 2);

    handle.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_state_stream_as_futures_stream() {
    use futures::StreamExt;

    let provider =
        provider_fn(|_page: u32| async move { Ok::<_, &'static str>(Page::last(vec![3])) });
    let states = pagination_system(
        0u32,
        futures::stream::empty::<()>(),
        futures::stream::empty::<u32>(),
        provider,
    );

    let all: Vec<S> = states.collect().await;
    assert_eq!(all, vec![loading(0, vec![]), loaded(None, vec![3], None)]);
}
