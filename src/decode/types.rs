//! Decoder traits

use crate::error::Result;
use serde_json::Value;

/// Trait for turning a response body into records
pub trait RecordDecoder: Send + Sync + std::fmt::Debug {
    /// Parse a raw body into a JSON value
    fn parse(&self, body: &str) -> Result<Value>;

    /// Extract records from a parsed body
    fn records(&self, body: &Value) -> Result<Vec<Value>>;

    /// Parse and extract in one go
    fn decode(&self, body: &str) -> Result<Vec<Value>> {
        let value = self.parse(body)?;
        self.records(&value)
    }
}
