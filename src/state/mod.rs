//! Pagination state module
//!
//! Holds the state machine at the heart of the engine.
//!
//! # Overview
//!
//! The state module provides:
//! - `State` - Loading/Loaded snapshot with the accumulated elements
//! - `Event` - User intents and fetch outcomes fed to the reducer
//! - `reduce` - Pure transition function

mod reducer;
mod types;

pub use reducer::reduce;
pub(crate) use reducer::{step, Step};
pub use types::{Event, State};
