//! Library snapshot stored as a JSON file.

use super::{item_type, parent_item, record_key, LibrarySource};
use crate::error::{Error, Result};
use serde::Deserialize;
use serde_json::Value;
use std::path::Path;

/// An offline library: `{"items": [...], "collections": [...]}`.
///
/// `items` holds every record, attachments and child notes included. Children
/// point at their parent with `data.parentItem`; collection membership is
/// the `data.collections` key list of each item.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JsonSource {
    #[serde(default)]
    items: Vec<Value>,
    #[serde(default)]
    collections: Vec<Value>,
}

impl JsonSource {
    /// Creates a source from in-memory records.
    pub fn new(items: Vec<Value>, collections: Vec<Value>) -> Self {
        Self { items, collections }
    }

    /// Loads a snapshot file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::Source(format!("cannot read {}: {}", path.display(), e)))?;
        Self::from_json_str(&text)
    }

    /// Parses a snapshot from JSON text.
    pub fn from_json_str(text: &str) -> Result<Self> {
        let source: JsonSource = serde_json::from_str(text)?;
        log::debug!(
            "loaded snapshot: {} records, {} collections",
            source.items.len(),
            source.collections.len()
        );
        Ok(source)
    }
}

impl LibrarySource for JsonSource {
    fn list_items(&self) -> Result<Vec<Value>> {
        Ok(self
            .items
            .iter()
            .filter(|r| item_type(r) != "attachment")
            .cloned()
            .collect())
    }

    fn list_collections(&self) -> Result<Vec<Value>> {
        Ok(self.collections.clone())
    }

    fn list_children(&self, item_id: &str) -> Result<Vec<Value>> {
        Ok(self
            .items
            .iter()
            .filter(|r| parent_item(r) == Some(item_id))
            .cloned()
            .collect())
    }

    fn collection_items(&self, collection_id: &str) -> Result<Vec<Value>> {
        Ok(self
            .items
            .iter()
            .filter(|r| parent_item(r).is_none() && item_type(r) != "attachment")
            .filter(|r| in_collection(r, collection_id))
            .cloned()
            .collect())
    }
}

fn in_collection(record: &Value, collection_id: &str) -> bool {
    record
        .get("data")
        .unwrap_or(record)
        .get("collections")
        .and_then(Value::as_array)
        .map(|keys| keys.iter().any(|k| k.as_str() == Some(collection_id)))
        .unwrap_or(false)
}
