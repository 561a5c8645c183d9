//! Collection tree construction.
//!
//! Items are bucketed under the full path of every collection they are filed
//! in. Items filed nowhere land in the reserved "Unfiled Items" bucket.

use crate::attachment::{is_html_file, is_image_file, is_image_url, resolve_attachment_path};
use crate::config::ExportConfig;
use crate::error::Result;
use crate::model::{
    is_note_empty, Attachment, BibliographicItem, CollectionPath, CollectionRecord,
    CollectionTree,
};
use crate::source::{self, LibrarySource};
use serde_json::Value;
use std::collections::{HashMap, HashSet};

/// Buckets `items` by collection path.
///
/// `members` returns the ids of the items filed directly in a collection. A
/// failing lookup is logged and leaves that collection's bucket empty; its
/// subcollections are still walked.
pub fn build_tree<F>(
    items: &[BibliographicItem],
    collections: &[CollectionRecord],
    mut members: F,
) -> CollectionTree
where
    F: FnMut(&str) -> Result<Vec<String>>,
{
    let by_id: HashMap<&str, &BibliographicItem> =
        items.iter().map(|item| (item.id.as_str(), item)).collect();

    let mut children: HashMap<&str, Vec<&CollectionRecord>> = HashMap::new();
    let mut roots = Vec::new();
    for record in collections {
        match record.parent.as_deref() {
            Some(parent) => children.entry(parent).or_default().push(record),
            None => roots.push(record),
        }
    }

    let mut walk = TreeWalk {
        by_id: &by_id,
        children: &children,
        tree: CollectionTree::new(),
        filed: HashSet::new(),
    };
    for root in roots {
        walk.visit(root, &CollectionPath::default(), &mut members);
    }

    let TreeWalk {
        mut tree, filed, ..
    } = walk;

    let unfiled: Vec<_> = items
        .iter()
        .filter(|item| !filed.contains(item.id.as_str()))
        .cloned()
        .collect();
    if !unfiled.is_empty() {
        tree.bucket_mut(&CollectionPath::unfiled()).extend(unfiled);
    }

    log::debug!(
        "collection tree: {} buckets, {} placements",
        tree.len(),
        tree.item_count()
    );
    tree
}

struct TreeWalk<'a> {
    by_id: &'a HashMap<&'a str, &'a BibliographicItem>,
    children: &'a HashMap<&'a str, Vec<&'a CollectionRecord>>,
    tree: CollectionTree,
    filed: HashSet<String>,
}

impl TreeWalk<'_> {
    fn visit<F>(&mut self, record: &CollectionRecord, parent: &CollectionPath, members: &mut F)
    where
        F: FnMut(&str) -> Result<Vec<String>>,
    {
        if record.name.is_empty() {
            return;
        }
        let path = parent.child(&record.name);
        self.tree.bucket_mut(&path);

        match members(&record.key) {
            Ok(ids) => {
                for id in ids {
                    match self.by_id.get(id.as_str()) {
                        Some(item) => {
                            self.tree.bucket_mut(&path).push((*item).clone());
                            self.filed.insert(id);
                        }
                        None => log::warn!(
                            "item {} in collection '{}' not found, skipping",
                            id,
                            record.name
                        ),
                    }
                }
            }
            Err(e) => log::warn!(
                "cannot list items of collection {} ('{}'): {}",
                record.key,
                record.name,
                e
            ),
        }

        let subcollections = self.children.get(record.key.as_str()).cloned().unwrap_or_default();
        for child in subcollections {
            self.visit(child, &path, members);
        }
    }
}

/// Fetches items and collections from `source`, attaches child notes,
/// snapshots and image attachments, and buckets the result.
///
/// Failing to list items or collections is fatal. Failing to list one item's
/// children or one collection's members is logged and skipped.
pub fn build_library(source: &dyn LibrarySource, config: &ExportConfig) -> Result<CollectionTree> {
    let records = source.list_items()?;
    let mut items: Vec<BibliographicItem> = records
        .iter()
        .filter(|r| is_top_level(r))
        .map(BibliographicItem::from_record)
        .collect();
    log::info!("fetched {} items", items.len());

    for item in items.iter_mut().filter(|item| !item.is_note()) {
        match source.list_children(&item.id) {
            Ok(children) => populate_children(item, &children, config),
            Err(e) => log::warn!(
                "cannot fetch children of item {} ('{}'): {}",
                item.id,
                item.title,
                e
            ),
        }
    }

    let collections: Vec<CollectionRecord> = source
        .list_collections()?
        .iter()
        .map(CollectionRecord::from_record)
        .filter(|c| !c.key.is_empty())
        .collect();
    log::info!("fetched {} collections", collections.len());

    Ok(build_tree(&items, &collections, |key| {
        let records = source.collection_items(key)?;
        Ok(records
            .iter()
            .map(|r| source::record_key(r).to_string())
            .filter(|k| !k.is_empty())
            .collect())
    }))
}

fn is_top_level(record: &Value) -> bool {
    match source::item_type(record) {
        "attachment" => false,
        "note" => source::parent_item(record).is_none(),
        _ => true,
    }
}

/// Sorts child records into notes, HTML snapshots and image attachments.
fn populate_children(item: &mut BibliographicItem, children: &[Value], config: &ExportConfig) {
    for child in children {
        match source::item_type(child) {
            "note" => {
                let note = child
                    .get("data")
                    .and_then(|d| d.get("note"))
                    .and_then(Value::as_str)
                    .unwrap_or_default();
                if !is_note_empty(Some(note)) {
                    item.child_notes.push(note.to_string());
                }
            }
            "attachment" => {
                let attachment = Attachment::from_record(child);
                let path = resolve_attachment_path(&config.storage_dir, &attachment);
                let image_url = attachment.url.as_deref().is_some_and(is_image_url);

                // A saved page behind an image URL is an image attachment and
                // resolves through the attachment chain, not the snapshot list
                match path {
                    Some(ref p) if is_image_file(p) => {
                        log::debug!("image attachment {} on {}", attachment.key, item.id);
                        item.attachments.push(attachment);
                    }
                    Some(ref p) if is_html_file(p) && !image_url => {
                        item.snapshots.push(p.clone());
                    }
                    _ if image_url => {
                        log::debug!("image URL attachment {} on {}", attachment.key, item.id);
                        item.attachments.push(attachment);
                    }
                    _ => {}
                }
            }
            _ => {}
        }
    }
}
