//! Paragraph and text run definitions.

use super::{ParagraphStyle, TextStyle};
use serde::Serialize;
use std::path::PathBuf;

/// A text run with uniform formatting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextRun {
    /// The text content
    pub text: String,
    /// Text style applied to this run
    pub style: TextStyle,
    /// Link target when this run is a clickable hyperlink
    pub hyperlink: Option<String>,
}

impl TextRun {
    /// Creates a new text run with default style.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            style: TextStyle::default(),
            hyperlink: None,
        }
    }

    /// Creates a new text run with the specified style.
    pub fn with_style(text: impl Into<String>, style: TextStyle) -> Self {
        Self {
            text: text.into(),
            style,
            hyperlink: None,
        }
    }

    /// Creates a hyperlink run.
    pub fn link(text: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            style: TextStyle::default(),
            hyperlink: Some(url.into()),
        }
    }

    /// Returns true if this run is empty.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// Content that can appear within a paragraph.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum InlineContent {
    /// Plain, formatted or linked text
    Text(TextRun),
    /// Hard line break within paragraph
    LineBreak,
    /// Inline image
    Image(ImageRef),
}

/// A paragraph containing inline content.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Paragraph {
    /// Paragraph style
    pub style: ParagraphStyle,
    /// Content elements within this paragraph
    pub content: Vec<InlineContent>,
}

impl Paragraph {
    /// Creates a new empty paragraph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a paragraph with the specified style.
    pub fn with_style(style: ParagraphStyle) -> Self {
        Self {
            style,
            content: Vec::new(),
        }
    }

    /// Creates a simple paragraph with plain text.
    pub fn text(text: impl Into<String>) -> Self {
        Self::from_run(TextRun::new(text))
    }

    /// Creates a paragraph holding a single run.
    pub fn from_run(run: TextRun) -> Self {
        Self {
            style: ParagraphStyle::default(),
            content: vec![InlineContent::Text(run)],
        }
    }

    /// Adds a text run to this paragraph.
    pub fn push_text(&mut self, run: TextRun) {
        self.content.push(InlineContent::Text(run));
    }

    /// Adds a line break to this paragraph.
    pub fn push_line_break(&mut self) {
        self.content.push(InlineContent::LineBreak);
    }

    /// Adds an inline image to this paragraph.
    pub fn push_image(&mut self, image: ImageRef) {
        self.content.push(InlineContent::Image(image));
    }

    /// Iterates over the text runs of this paragraph.
    pub fn runs(&self) -> impl Iterator<Item = &TextRun> {
        self.content.iter().filter_map(|c| match c {
            InlineContent::Text(run) => Some(run),
            _ => None,
        })
    }

    /// Returns the plain text content of this paragraph.
    pub fn plain_text(&self) -> String {
        let mut result = String::new();
        for item in &self.content {
            match item {
                InlineContent::Text(run) => result.push_str(&run.text),
                InlineContent::LineBreak => result.push('\n'),
                InlineContent::Image(_) => {}
            }
        }
        result
    }

    /// Returns true if this paragraph is empty.
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
            || self.content.iter().all(|c| match c {
                InlineContent::Text(run) => run.is_empty(),
                _ => false,
            })
    }
}

/// Where the bytes of an image come from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ImageSource {
    /// Bytes stored in `Document::resources` under this id
    Embedded(String),
    /// An image file on disk
    File(PathBuf),
}

/// Reference to an image placed in the document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageRef {
    /// Image bytes location
    pub source: ImageSource,
    /// Alternative text for accessibility
    pub alt_text: Option<String>,
    /// Display width in inches
    pub width_in: f32,
}

impl ImageRef {
    /// Creates a reference to an embedded resource.
    pub fn embedded(id: impl Into<String>, width_in: f32) -> Self {
        Self {
            source: ImageSource::Embedded(id.into()),
            alt_text: None,
            width_in,
        }
    }

    /// Creates a reference to an image file.
    pub fn file(path: impl Into<PathBuf>, width_in: f32) -> Self {
        Self {
            source: ImageSource::File(path.into()),
            alt_text: None,
            width_in,
        }
    }

    /// Sets the alternative text.
    pub fn with_alt(mut self, alt: impl Into<String>) -> Self {
        self.alt_text = Some(alt.into());
        self
    }
}
