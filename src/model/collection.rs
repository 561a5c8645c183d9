//! Collections and the path-keyed item buckets built from them.

use super::item::{record_data, str_field};
use super::BibliographicItem;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;

/// Name of the bucket holding items filed in no collection.
pub const UNFILED_ITEMS: &str = "Unfiled Items";

/// A collection record with its optional parent reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CollectionRecord {
    pub key: String,
    pub name: String,
    pub parent: Option<String>,
}

impl CollectionRecord {
    /// Builds a collection from a raw record. `parentCollection` may be
    /// `false`, null or absent for roots.
    pub fn from_record(raw: &Value) -> Self {
        let data = record_data(raw);
        let key = match str_field(raw, "key") {
            k if k.is_empty() => str_field(data, "key"),
            k => k,
        };
        let parent = match data.get("parentCollection") {
            Some(Value::String(p)) if !p.is_empty() => Some(p.clone()),
            _ => None,
        };
        Self {
            key,
            name: str_field(data, "name"),
            parent,
        }
    }
}

/// Collection names from root to leaf. Orders lexicographically, element by
/// element, so a parent sorts directly before its children.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct CollectionPath(pub Vec<String>);

impl CollectionPath {
    /// The reserved `("Unfiled Items",)` path.
    pub fn unfiled() -> Self {
        Self(vec![UNFILED_ITEMS.to_string()])
    }

    /// Returns a new path with `name` appended.
    pub fn child(&self, name: impl Into<String>) -> Self {
        let mut segments = self.0.clone();
        segments.push(name.into());
        Self(segments)
    }

    /// Number of segments.
    pub fn depth(&self) -> usize {
        self.0.len()
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Returns true for the reserved unfiled bucket.
    pub fn is_unfiled(&self) -> bool {
        self.0.len() == 1 && self.0[0] == UNFILED_ITEMS
    }
}

impl fmt::Display for CollectionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join(" / "))
    }
}

impl<S: Into<String>> FromIterator<S> for CollectionPath {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// Items bucketed by collection path, in insertion order.
#[derive(Debug, Clone, Default)]
pub struct CollectionTree {
    buckets: Vec<(CollectionPath, Vec<BibliographicItem>)>,
    index: HashMap<CollectionPath, usize>,
}

impl CollectionTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the bucket for `path`, creating an empty one if needed.
    pub fn bucket_mut(&mut self, path: &CollectionPath) -> &mut Vec<BibliographicItem> {
        let idx = match self.index.get(path) {
            Some(&idx) => idx,
            None => {
                self.buckets.push((path.clone(), Vec::new()));
                self.index.insert(path.clone(), self.buckets.len() - 1);
                self.buckets.len() - 1
            }
        };
        &mut self.buckets[idx].1
    }

    /// Items filed directly under `path`.
    pub fn items(&self, path: &CollectionPath) -> Option<&[BibliographicItem]> {
        self.index.get(path).map(|&idx| self.buckets[idx].1.as_slice())
    }

    /// Returns true if a bucket exists for `path`.
    pub fn contains(&self, path: &CollectionPath) -> bool {
        self.index.contains_key(path)
    }

    /// Paths in insertion order.
    pub fn paths(&self) -> impl Iterator<Item = &CollectionPath> {
        self.buckets.iter().map(|(path, _)| path)
    }

    /// Paths in display order.
    pub fn sorted_paths(&self) -> Vec<&CollectionPath> {
        let mut paths: Vec<_> = self.paths().collect();
        paths.sort();
        paths
    }

    /// Buckets in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&CollectionPath, &[BibliographicItem])> {
        self.buckets.iter().map(|(path, items)| (path, items.as_slice()))
    }

    /// Number of buckets.
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Total number of item placements across all buckets.
    pub fn item_count(&self) -> usize {
        self.buckets.iter().map(|(_, items)| items.len()).sum()
    }
}
