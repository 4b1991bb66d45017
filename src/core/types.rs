use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Internal monotonic document identifier. Never reassigned within the
/// lifetime of an `Engine`; `remove`/`discard` leave holes rather than
/// reusing ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ShortId(pub u32);

impl ShortId {
    pub fn value(&self) -> u32 {
        self.0
    }
}

impl From<u32> for ShortId {
    fn from(id: u32) -> Self {
        ShortId(id)
    }
}

/// Small dense index assigned to a declared field by construction order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FieldId(pub u16);

impl FieldId {
    pub fn value(&self) -> u16 {
        self.0
    }
}

/// The raw value extracted from a host document field, before tokenization.
/// Non-text values are coerced to their string form when indexed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldValue {
    Text(String),
    Number(f64),
    Boolean(bool),
}

impl FieldValue {
    /// Coerce to the text form the tokenizer operates on.
    pub fn as_text(&self) -> String {
        match self {
            FieldValue::Text(s) => s.clone(),
            FieldValue::Number(n) => n.to_string(),
            FieldValue::Boolean(b) => b.to_string(),
        }
    }
}

/// The subset of a document the caller designated as retrievable with
/// search hits. Mirrors the shape of the host document but holds only the
/// fields named in `store_fields`.
pub type StoredFields = HashMap<String, FieldValue>;

/// Result of running a token through the host's `process_term` hook.
pub enum ProcessedTerm {
    One(String),
    Many(Vec<String>),
    Drop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

/// A single scored search result, as seen by `filter`/`boost_document` and
/// as returned to the caller.
#[derive(Debug, Clone)]
pub struct Hit<ID> {
    pub id: ID,
    pub score: f32,
    pub stored_fields: StoredFields,
    /// Matched dictionary term -> sorted field names the term appeared in.
    pub match_info: HashMap<String, Vec<String>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_value_coerces_non_text_to_string() {
        assert_eq!(FieldValue::Number(3.5).as_text(), "3.5");
        assert_eq!(FieldValue::Boolean(true).as_text(), "true");
        assert_eq!(FieldValue::Text("hi".into()).as_text(), "hi");
    }
}
