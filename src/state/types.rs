//! Pagination state and event types
//!
//! `State` is an immutable snapshot: the reducer consumes one and produces
//! the next. It is published to consumers after every reduction.

use crate::types::Page;
use std::sync::Arc;

/// Snapshot of pagination progress
///
/// `Loading` always carries the parameter being fetched. There is no way
/// to express "loading with nothing to fetch": a transition that would
/// produce it stays in (or lands in) `Loaded` instead.
#[derive(Debug, PartialEq)]
pub enum State<P, T, E> {
    /// A fetch for `parameter` is outstanding
    Loading {
        /// Parameter the outstanding fetch was started with
        parameter: P,
        /// Elements accumulated before this fetch
        elements: Vec<T>,
    },
    /// No fetch is outstanding
    Loaded {
        /// Parameter for the next page, `None` once pages are exhausted
        parameter: Option<P>,
        /// All elements accumulated so far
        elements: Vec<T>,
        /// Outcome of the most recent fetch, if it failed
        error: Option<Arc<E>>,
    },
}

impl<P, T, E> State<P, T, E> {
    /// Initial state for a run: loading the first page, nothing accumulated
    pub fn loading(parameter: P) -> Self {
        Self::Loading {
            parameter,
            elements: Vec::new(),
        }
    }

    /// Accumulated elements
    pub fn elements(&self) -> &[T] {
        match self {
            Self::Loading { elements, .. } | Self::Loaded { elements, .. } => elements,
        }
    }

    /// Take ownership of the accumulated elements
    pub fn into_elements(self) -> Vec<T> {
        match self {
            Self::Loading { elements, .. } | Self::Loaded { elements, .. } => elements,
        }
    }

    /// Whether a fetch is outstanding
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading { .. })
    }

    /// Error from the most recent fetch, only ever present on `Loaded`
    pub fn error(&self) -> Option<&E> {
        match self {
            Self::Loaded { error, .. } => error.as_deref(),
            Self::Loading { .. } => None,
        }
    }

    /// Shared handle to the most recent fetch error
    pub fn shared_error(&self) -> Option<Arc<E>> {
        match self {
            Self::Loaded { error, .. } => error.clone(),
            Self::Loading { .. } => None,
        }
    }

    /// Current parameter: the one being fetched, or the one to fetch next
    pub fn parameter(&self) -> Option<&P> {
        match self {
            Self::Loading { parameter, .. } => Some(parameter),
            Self::Loaded { parameter, .. } => parameter.as_ref(),
        }
    }

    /// The fetch this state asks for, if any
    pub fn fetch_request(&self) -> Option<&P> {
        match self {
            Self::Loading { parameter, .. } => Some(parameter),
            Self::Loaded { .. } => None,
        }
    }

    /// Whether another page can be requested
    pub fn has_more(&self) -> bool {
        self.parameter().is_some()
    }
}

impl<P: Clone, T: Clone, E> Clone for State<P, T, E> {
    fn clone(&self) -> Self {
        match self {
            Self::Loading {
                parameter,
                elements,
            } => Self::Loading {
                parameter: parameter.clone(),
                elements: elements.clone(),
            },
            Self::Loaded {
                parameter,
                elements,
                error,
            } => Self::Loaded {
                parameter: parameter.clone(),
                elements: elements.clone(),
                error: error.clone(),
            },
        }
    }
}

/// Input to the reducer
#[derive(Debug)]
pub enum Event<P, T, E> {
    /// Fetch the next page using the current parameter
    UserAdvance,
    /// Discard accumulated elements and restart from the given parameter
    UserReset(P),
    /// A started fetch completed with a page
    FetchSucceeded(Page<P, T>),
    /// A started fetch completed with an error
    FetchFailed(E),
}

impl<P, T, E> Event<P, T, E> {
    /// Build the completion event for a provider result
    pub fn from_result(result: Result<Page<P, T>, E>) -> Self {
        match result {
            Ok(page) => Self::FetchSucceeded(page),
            Err(err) => Self::FetchFailed(err),
        }
    }

    /// Short name for logging
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UserAdvance => "user_advance",
            Self::UserReset(_) => "user_reset",
            Self::FetchSucceeded(_) => "fetch_succeeded",
            Self::FetchFailed(_) => "fetch_failed",
        }
    }
}
