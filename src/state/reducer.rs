//! The pagination reducer
//!
//! Pure and total: no I/O, no clocks, same input always yields the same
//! output.

use super::types::{Event, State};
use std::sync::Arc;

/// Outcome of a single reduction
#[derive(Debug)]
pub(crate) enum Step<S> {
    /// The event moved the state machine
    Changed(S),
    /// The event was a no-op for this state
    Unchanged(S),
}

impl<S> Step<S> {
    pub(crate) fn is_changed(&self) -> bool {
        matches!(self, Self::Changed(_))
    }

    pub(crate) fn into_state(self) -> S {
        match self {
            Self::Changed(state) | Self::Unchanged(state) => state,
        }
    }
}

/// Apply an event to a state, producing the next state
///
/// | state   | event          | next                                   |
/// |---------|----------------|----------------------------------------|
/// | Loaded  | UserAdvance    | Loading(p, es) if p is set, else same   |
/// | any     | UserReset(np)  | Loading(np, [])                        |
/// | Loaded  | Fetch*         | same                                   |
/// | Loading | FetchSucceeded | Loaded(next, es ++ page, no error)     |
/// | Loading | FetchFailed    | Loaded(p, es, error)                   |
/// | Loading | UserAdvance    | same                                   |
pub fn reduce<P, T, E>(state: State<P, T, E>, event: Event<P, T, E>) -> State<P, T, E> {
    step(state, event).into_state()
}

pub(crate) fn step<P, T, E>(
    state: State<P, T, E>,
    event: Event<P, T, E>,
) -> Step<State<P, T, E>> {
    match (state, event) {
        // A reset supersedes whatever was going on
        (_, Event::UserReset(parameter)) => Step::Changed(State::loading(parameter)),

        (
            State::Loaded {
                parameter: Some(parameter),
                elements,
                ..
            },
            Event::UserAdvance,
        ) => Step::Changed(State::Loading {
            parameter,
            elements,
        }),

        // Exhausted, nothing to fetch
        (state @ State::Loaded { parameter: None, .. }, Event::UserAdvance) => {
            Step::Unchanged(state)
        }

        // No fetch is outstanding, so this result is not ours
        (state @ State::Loaded { .. }, Event::FetchSucceeded(_) | Event::FetchFailed(_)) => {
            Step::Unchanged(state)
        }

        (State::Loading { mut elements, .. }, Event::FetchSucceeded(page)) => {
            elements.extend(page.elements);
            Step::Changed(State::Loaded {
                parameter: page.next_parameter,
                elements,
                error: None,
            })
        }

        // Keep the parameter so an advance retries the same page
        (
            State::Loading {
                parameter,
                elements,
            },
            Event::FetchFailed(error),
        ) => Step::Changed(State::Loaded {
            parameter: Some(parameter),
            elements,
            error: Some(Arc::new(error)),
        }),

        (state @ State::Loading { .. }, Event::UserAdvance) => Step::Unchanged(state),
    }
}
