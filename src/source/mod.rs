//! Library sources.
//!
//! A source hands out raw records in the shape of the reference manager's
//! web API (`{"key": ..., "data": {...}}`). Conversion into typed items
//! happens in [`crate::model`]; sources only move JSON around.

mod json;
#[cfg(feature = "remote")]
mod local_api;

pub use json::JsonSource;
#[cfg(feature = "remote")]
pub use local_api::LocalApiSource;

use crate::error::Result;
use serde_json::Value;

/// Read access to a reference library.
pub trait LibrarySource {
    /// All items except attachments. Child notes may be included; callers
    /// skip records with a `parentItem`.
    fn list_items(&self) -> Result<Vec<Value>>;

    /// All collections, in any order.
    fn list_collections(&self) -> Result<Vec<Value>>;

    /// Child notes and attachments of an item.
    fn list_children(&self, item_id: &str) -> Result<Vec<Value>>;

    /// Top-level items filed directly in a collection.
    fn collection_items(&self, collection_id: &str) -> Result<Vec<Value>>;
}

/// Returns the `data.itemType` of a raw record.
pub(crate) fn item_type(record: &Value) -> &str {
    record
        .get("data")
        .and_then(|d| d.get("itemType"))
        .or_else(|| record.get("itemType"))
        .and_then(Value::as_str)
        .unwrap_or_default()
}

/// Returns the `data.parentItem` of a raw record, if set.
pub(crate) fn parent_item(record: &Value) -> Option<&str> {
    record
        .get("data")
        .and_then(|d| d.get("parentItem"))
        .or_else(|| record.get("parentItem"))
        .and_then(Value::as_str)
        .filter(|p| !p.is_empty())
}

/// Returns the record key.
pub(crate) fn record_key(record: &Value) -> &str {
    record
        .get("key")
        .or_else(|| record.get("data").and_then(|d| d.get("key")))
        .and_then(Value::as_str)
        .unwrap_or_default()
}
