//! Style definitions for text and paragraphs.

use serde::Serialize;

/// Text formatting style.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TextStyle {
    /// Bold text
    pub bold: bool,
    /// Italic text
    pub italic: bool,
    /// Underline
    pub underline: bool,
    /// Monospace (inline code)
    pub monospace: bool,
    /// Font size in points, when it differs from the body size
    pub font_size: Option<f32>,
}

impl TextStyle {
    /// Creates a new empty text style.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a bold style.
    pub fn bold() -> Self {
        Self {
            bold: true,
            ..Default::default()
        }
    }

    /// Creates an italic style.
    pub fn italic() -> Self {
        Self {
            italic: true,
            ..Default::default()
        }
    }

    /// Creates an underlined style.
    pub fn underline() -> Self {
        Self {
            underline: true,
            ..Default::default()
        }
    }

    /// Creates a monospace style.
    pub fn monospace() -> Self {
        Self {
            monospace: true,
            ..Default::default()
        }
    }

    /// Small italic text used for metadata and source links.
    pub fn small_italic(size: f32) -> Self {
        Self {
            italic: true,
            font_size: Some(size),
            ..Default::default()
        }
    }

    /// Returns true if this style has any formatting.
    pub fn has_formatting(&self) -> bool {
        self.bold || self.italic || self.underline || self.monospace
    }
}

/// Paragraph-level style.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ParagraphStyle {
    /// Extra left indentation, in list-nesting steps
    pub indent_level: u8,
    /// Whether the paragraph is a code block (shaded, monospace)
    pub shaded: bool,
}

impl ParagraphStyle {
    /// Creates a new default paragraph style.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a style indented by the given number of steps.
    pub fn indented(level: u8) -> Self {
        Self {
            indent_level: level,
            ..Default::default()
        }
    }
}

/// List style types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ListStyle {
    /// Unordered list with bullet
    Bullet,
    /// Ordered list (1, 2, 3, ...)
    Numbered,
    /// Plain continuation line, used for a list item outside any list
    Continuation,
}

impl ListStyle {
    /// Returns the style name a word processor uses for this list kind.
    pub fn style_name(&self) -> &'static str {
        match self {
            ListStyle::Bullet => "List Bullet",
            ListStyle::Numbered => "List Number",
            ListStyle::Continuation => "List Continue",
        }
    }
}
