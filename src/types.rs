//! Common types used throughout pagefeed
//!
//! This module contains the page value type produced by page providers,
//! plus shared type aliases used across multiple modules.

use std::collections::BTreeMap;

// ============================================================================
// Type Aliases
// ============================================================================

/// JSON value type (re-exported from serde_json)
pub type JsonValue = serde_json::Value;

/// Ordered key-value map with string keys and values.
///
/// Ordered so that values containing it stay `Eq + Hash` and compare
/// independently of insertion order.
pub type StringMap = BTreeMap<String, String>;

// ============================================================================
// Page
// ============================================================================

/// One fetched batch of elements plus the parameter for the next batch.
///
/// A `next_parameter` of `None` means no further pages exist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<P, T> {
    /// Parameter to pass to the provider for the following page
    pub next_parameter: Option<P>,
    /// Elements of this page, in order
    pub elements: Vec<T>,
}

impl<P, T> Page<P, T> {
    /// Create a page
    pub fn new(next_parameter: Option<P>, elements: Vec<T>) -> Self {
        Self {
            next_parameter,
            elements,
        }
    }

    /// Create a page that continues with `next`
    pub fn more(next: P, elements: Vec<T>) -> Self {
        Self::new(Some(next), elements)
    }

    /// Create the final page
    pub fn last(elements: Vec<T>) -> Self {
        Self::new(None, elements)
    }

    /// Check if this is the final page
    pub fn is_last(&self) -> bool {
        self.next_parameter.is_none()
    }

    /// Number of elements in the page
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Check if the page has no elements
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_constructors() {
        let page: Page<u32, &str> = Page::more(2, vec!["a", "b"]);
        assert!(!page.is_last());
        assert_eq!(page.len(), 2);
        assert_eq!(page.next_parameter, Some(2));

        let page: Page<u32, &str> = Page::last(vec![]);
        assert!(page.is_last());
        assert!(page.is_empty());
    }
}
