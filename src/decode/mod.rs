//! Response decoder module
//!
//! Extracts records from JSON response bodies for the HTTP page provider.
//!
//! # Overview
//!
//! Records are located with a dot path (`data.items`, `results[0]`) or,
//! for wildcard patterns, a full JSONPath expression. The same path
//! helpers are used by pagination strategies to read cursors and totals.

mod decoders;
mod types;

pub use decoders::{string_at_path, value_at_path, JsonDecoder};
pub use types::RecordDecoder;
