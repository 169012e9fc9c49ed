//! Pagination module
//!
//! Supports: Cursor, Offset, Page Number, Link Header, Next URL, Single Page
//!
//! # Overview
//!
//! The HTTP provider's parameter is a [`PageRequest`]. After each response a
//! [`PageStrategy`] decides which request comes next, or that the response
//! was the last page. Strategies are pure: all per-sequence bookkeeping
//! (page index, offset, records fetched) travels inside the request.

mod strategies;
mod types;

pub use strategies::{
    parse_link_header, CursorStrategy, LinkHeaderStrategy, NextUrlStrategy, OffsetStrategy,
    PageNumberStrategy, SinglePage,
};
pub use types::{
    check_stop_condition, PageRequest, PageResponse, PageStrategy, PaginationConfig,
    StopCondition, StopResult,
};
