//! Markdown output settings.

use std::path::PathBuf;

/// Settings for [`MarkdownRenderer`](super::MarkdownRenderer).
///
/// With no `image_dir`, embedded images are inlined as base64 data URIs;
/// otherwise the caller writes them to that directory and links use
/// `image_path_prefix`.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub image_dir: Option<PathBuf>,
    pub image_path_prefix: String,
    /// Deeper headings are clamped to this level
    pub max_heading_level: u8,
    /// Title, generator and image count as YAML frontmatter
    pub include_frontmatter: bool,
    /// Render line breaks as hard breaks instead of spaces
    pub preserve_line_breaks: bool,
    pub include_empty_paragraphs: bool,
    /// Bullet list marker
    pub list_marker: char,
    /// Blank line between blocks
    pub paragraph_spacing: bool,
    pub escape_special_chars: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            image_dir: None,
            image_path_prefix: "assets/".to_string(),
            max_heading_level: 6,
            include_frontmatter: false,
            preserve_line_breaks: true,
            include_empty_paragraphs: false,
            list_marker: '-',
            paragraph_spacing: true,
            escape_special_chars: false,
        }
    }
}

impl RenderOptions {
    /// Writes images to `dir` instead of inlining them.
    pub fn with_image_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.image_dir = Some(dir.into());
        self
    }

    pub fn with_image_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.image_path_prefix = prefix.into();
        self
    }

    pub fn with_frontmatter(mut self) -> Self {
        self.include_frontmatter = true;
        self
    }

    /// Separates blocks with a single newline.
    pub fn without_paragraph_spacing(mut self) -> Self {
        self.paragraph_spacing = false;
        self
    }

    /// Escapes Markdown control characters in run text.
    pub fn with_escaping(mut self) -> Self {
        self.escape_special_chars = true;
        self
    }
}
