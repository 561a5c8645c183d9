//! Bibliographic items and their attachments.
//!
//! Records arrive as loosely typed JSON in the shape the library API uses
//! (`{"key": ..., "data": {...}}`). Conversion never fails: absent or
//! mistyped fields fall back to empty values.

use crate::html;
use serde::Serialize;
use serde_json::Value;
use std::path::PathBuf;

/// Title used for a standalone note with no text at all.
pub const UNTITLED_NOTE: &str = "(Untitled Note)";

/// Title used for a regular item without a title.
pub const UNTITLED_ITEM: &str = "(Untitled Item)";

/// Derived note titles longer than this are truncated.
const MAX_NOTE_TITLE_CHARS: usize = 70;

/// A bibliographic record or standalone note.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BibliographicItem {
    pub id: String,
    pub item_type: String,
    pub title: String,
    pub creators: Vec<Creator>,
    pub date: String,
    pub date_added: String,
    /// Source URL of the item, if any
    pub url: Option<String>,
    pub tags: Vec<String>,
    pub child_notes: Vec<String>,
    pub standalone_note_content: Option<String>,
    pub snapshots: Vec<PathBuf>,
    pub attachments: Vec<Attachment>,
}

impl BibliographicItem {
    /// Builds an item from a raw record.
    pub fn from_record(raw: &Value) -> Self {
        let data = record_data(raw);
        let id = first_non_empty(&[str_field(raw, "key"), str_field(data, "key")]);
        let item_type = str_field(data, "itemType");
        let is_note = item_type == "note";

        let standalone_note_content = is_note.then(|| str_field(data, "note"));

        let mut title = str_field(data, "title");
        if title.is_empty() {
            title = match &standalone_note_content {
                Some(note) => derive_note_title(note),
                None => UNTITLED_ITEM.to_string(),
            };
        }

        let creators = data
            .get("creators")
            .and_then(Value::as_array)
            .map(|list| list.iter().filter(|c| c.is_object()).map(Creator::from_value).collect())
            .unwrap_or_default();

        let tags = data
            .get("tags")
            .and_then(Value::as_array)
            .map(|list| list.iter().filter_map(tag_name).collect())
            .unwrap_or_default();

        let url = Some(str_field(data, "url")).filter(|u| !u.is_empty());

        Self {
            id,
            item_type,
            title,
            creators,
            date: str_field(data, "date"),
            date_added: str_field(data, "dateAdded"),
            url,
            tags,
            child_notes: Vec::new(),
            standalone_note_content,
            snapshots: Vec::new(),
            attachments: Vec::new(),
        }
    }

    /// Returns true for standalone notes.
    pub fn is_note(&self) -> bool {
        self.item_type == "note"
    }

    /// Note bodies worth rendering: the note's own body for a standalone
    /// note, otherwise the non-empty child notes in order.
    pub fn displayable_notes(&self) -> Vec<&str> {
        if self.is_note() {
            return self
                .standalone_note_content
                .as_deref()
                .filter(|html| !is_note_empty(Some(html)))
                .into_iter()
                .collect();
        }
        self.child_notes
            .iter()
            .map(String::as_str)
            .filter(|html| !is_note_empty(Some(html)))
            .collect()
    }

    /// Returns true if at least one note would be rendered.
    pub fn has_displayable_notes(&self) -> bool {
        !self.displayable_notes().is_empty()
    }
}

/// Returns true if the note is absent, empty, or holds no text once tags are
/// stripped.
pub fn is_note_empty(html: Option<&str>) -> bool {
    match html {
        None => true,
        Some(html) if html.trim().is_empty() => true,
        Some(html) => html::text_lines(html).is_empty(),
    }
}

/// Derives a title from a note body: the highest-ranked heading with text,
/// else the first text line, truncated.
fn derive_note_title(note_html: &str) -> String {
    let text = html::first_heading_text(note_html)
        .or_else(|| html::text_lines(note_html).into_iter().next())
        .unwrap_or_default();

    if text.chars().count() > MAX_NOTE_TITLE_CHARS {
        let truncated: String = text.chars().take(MAX_NOTE_TITLE_CHARS).collect();
        format!("{}...", truncated)
    } else if text.is_empty() {
        UNTITLED_NOTE.to_string()
    } else {
        text
    }
}

/// An author, editor or other contributor.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Creator {
    pub first_name: String,
    pub last_name: String,
    /// Single-field name (institutions)
    pub name: String,
    pub role: String,
}

impl Creator {
    fn from_value(value: &Value) -> Self {
        Self {
            first_name: str_field(value, "firstName"),
            last_name: str_field(value, "lastName"),
            name: str_field(value, "name"),
            role: str_field(value, "creatorType"),
        }
    }

    /// Display form: `First Last (role)`.
    pub fn display(&self) -> String {
        let person = format!("{} {}", self.first_name, self.last_name);
        let person = if person.trim().is_empty() {
            self.name.clone()
        } else {
            person
        };
        format!("{} ({})", person, self.role).trim().to_string()
    }
}

/// How an attachment's file is stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum LinkMode {
    ImportedFile,
    ImportedUrl,
    LinkedFile,
    LinkedUrl,
    Embedded,
    Unknown(String),
}

impl LinkMode {
    fn from_value(value: Option<&Value>) -> Self {
        match value {
            // Legacy numeric modes
            Some(Value::Number(n)) => match n.as_u64() {
                Some(0) => LinkMode::ImportedFile,
                Some(1) => LinkMode::ImportedUrl,
                Some(2) => LinkMode::LinkedFile,
                Some(3) => LinkMode::LinkedUrl,
                _ => LinkMode::Unknown(n.to_string()),
            },
            Some(Value::String(s)) => match s.as_str() {
                "imported_file" => LinkMode::ImportedFile,
                "imported_url" => LinkMode::ImportedUrl,
                "linked_file" => LinkMode::LinkedFile,
                "linked_url" => LinkMode::LinkedUrl,
                "embedded_image" => LinkMode::Embedded,
                other => LinkMode::Unknown(other.to_string()),
            },
            _ => LinkMode::Unknown(String::new()),
        }
    }

    /// Returns true if the file lives in the storage directory.
    pub fn is_imported(&self) -> bool {
        matches!(
            self,
            LinkMode::ImportedFile | LinkMode::ImportedUrl | LinkMode::Embedded
        )
    }
}

/// A file associated with an item.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Attachment {
    pub key: String,
    pub filename: String,
    pub link_mode: LinkMode,
    pub url: Option<String>,
    /// Raw path for linked files (`storage:name` or absolute)
    pub path: Option<String>,
    pub content_type: Option<String>,
}

impl Attachment {
    /// Builds an attachment from a raw child record.
    pub fn from_record(raw: &Value) -> Self {
        let data = record_data(raw);
        let optional = |key: &str| Some(str_field(data, key)).filter(|s| !s.is_empty());
        Self {
            key: first_non_empty(&[str_field(data, "key"), str_field(raw, "key")]),
            filename: str_field(data, "filename"),
            link_mode: LinkMode::from_value(data.get("linkMode")),
            url: optional("url"),
            path: optional("path"),
            content_type: optional("contentType"),
        }
    }
}

/// Returns the `data` object of a record, or the record itself when flat.
pub(crate) fn record_data(raw: &Value) -> &Value {
    match raw.get("data") {
        Some(data) if data.is_object() => data,
        _ => raw,
    }
}

/// Reads a field as a display string; non-strings are stringified, null is empty.
pub(crate) fn str_field(value: &Value, key: &str) -> String {
    match value.get(key) {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn first_non_empty(candidates: &[String]) -> String {
    candidates
        .iter()
        .find(|s| !s.is_empty())
        .cloned()
        .unwrap_or_default()
}

fn tag_name(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Object(_) => match value.get("tag") {
            Some(Value::Null) | None => None,
            Some(_) => Some(str_field(value, "tag")),
        },
        _ => None,
    }
}
