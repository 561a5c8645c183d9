//! Document structure and metadata.

use super::{ImageRef, ListStyle, Paragraph};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

/// A complete export document, built front to back.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Document {
    /// Document metadata
    pub metadata: Metadata,
    /// Content blocks in output order
    pub blocks: Vec<Block>,
    /// Binary resources (images) keyed by ID
    pub resources: BTreeMap<String, Resource>,
}

impl Document {
    /// Creates a new empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a block.
    pub fn push(&mut self, block: Block) {
        self.blocks.push(block);
    }

    /// Appends a paragraph block.
    pub fn push_paragraph(&mut self, paragraph: Paragraph) {
        self.blocks.push(Block::Paragraph(paragraph));
    }

    /// Registers a resource and returns its ID.
    pub fn add_resource(&mut self, resource: Resource) -> String {
        let id = resource.content_id();
        self.resources.entry(id.clone()).or_insert(resource);
        id
    }

    /// Returns the number of paragraph-like blocks in the document.
    pub fn paragraph_count(&self) -> usize {
        self.blocks.iter().filter(|b| b.paragraph().is_some()).count()
    }

    /// Returns the number of images, whether block-level or inline.
    pub fn image_count(&self) -> usize {
        self.blocks.iter().map(Block::image_count).sum()
    }

    /// Returns the plain text content of the entire document.
    pub fn plain_text(&self) -> String {
        self.blocks
            .iter()
            .filter_map(Block::plain_text)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Returns the full document structure as pretty-printed JSON.
    pub fn raw_content(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| "{}".to_string())
    }
}

/// Document metadata.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Metadata {
    /// Document title
    pub title: Option<String>,
    /// Application that created the document
    pub creator_app: Option<String>,
}

/// A block-level content element.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Block {
    /// Document title (largest style, not part of the outline)
    Title(String),
    /// A heading
    Heading { level: u8, text: String },
    /// A paragraph
    Paragraph(Paragraph),
    /// A list item; `level` is the nesting depth, starting at 1
    ListItem {
        style: ListStyle,
        level: u8,
        /// First item of its list; ordered numbering restarts here
        starts_list: bool,
        paragraph: Paragraph,
    },
    /// Preformatted code, whitespace preserved
    CodeBlock { text: String },
    /// A quote-styled paragraph
    Quote(Paragraph),
    /// Full-width horizontal divider
    Rule,
    /// A block-level image
    Image(ImageRef),
    /// Named bookmark target
    Anchor { name: String },
    /// Clickable table-of-contents line pointing at an anchor
    TocEntry {
        anchor: String,
        text: String,
        level: u8,
    },
    /// Page break
    PageBreak,
}

impl Block {
    /// Returns the paragraph of a container block.
    pub fn paragraph(&self) -> Option<&Paragraph> {
        match self {
            Block::Paragraph(p) | Block::Quote(p) => Some(p),
            Block::ListItem { paragraph, .. } => Some(paragraph),
            _ => None,
        }
    }

    /// Returns the paragraph of a container block, mutably.
    pub fn paragraph_mut(&mut self) -> Option<&mut Paragraph> {
        match self {
            Block::Paragraph(p) | Block::Quote(p) => Some(p),
            Block::ListItem { paragraph, .. } => Some(paragraph),
            _ => None,
        }
    }

    /// Returns the text of this block, if it carries any.
    pub fn plain_text(&self) -> Option<String> {
        match self {
            Block::Title(text) | Block::Heading { text, .. } | Block::CodeBlock { text } => {
                Some(text.clone())
            }
            Block::TocEntry { text, .. } => Some(text.clone()),
            _ => self.paragraph().map(Paragraph::plain_text),
        }
    }

    fn image_count(&self) -> usize {
        match self {
            Block::Image(_) => 1,
            _ => self
                .paragraph()
                .map(|p| {
                    p.content
                        .iter()
                        .filter(|c| matches!(c, super::InlineContent::Image(_)))
                        .count()
                })
                .unwrap_or(0),
        }
    }
}

/// A binary image resource.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Resource {
    /// MIME type (if known)
    pub mime_type: Option<String>,
    /// Binary data
    #[serde(skip_serializing)]
    pub data: Vec<u8>,
    /// Size in bytes
    pub size: usize,
}

impl Resource {
    /// Creates an image resource.
    pub fn image(data: Vec<u8>, mime_type: impl Into<String>) -> Self {
        let size = data.len();
        Self {
            mime_type: Some(mime_type.into()),
            data,
            size,
        }
    }

    /// Returns the file extension based on MIME type.
    pub fn extension(&self) -> &str {
        match self.mime_type.as_deref() {
            Some("image/png") => "png",
            Some("image/jpeg") | Some("image/jpg") => "jpg",
            Some("image/gif") => "gif",
            Some("image/bmp") => "bmp",
            Some("image/webp") => "webp",
            Some("image/tiff") => "tiff",
            Some("image/svg+xml") => "svg",
            _ => "bin",
        }
    }

    /// Stable identifier derived from the content: equal bytes share one ID.
    pub fn content_id(&self) -> String {
        let digest = Sha256::digest(&self.data);
        format!("image-{}.{}", hex::encode(&digest[..8]), self.extension())
    }
}
