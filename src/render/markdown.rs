//! Markdown renderer implementation.

use super::{ListNumbering, RenderOptions};
use crate::error::Result;
use crate::model::{
    Block, Document, ImageRef, ImageSource, InlineContent, ListStyle, Paragraph, TextRun,
};
use base64::Engine as _;

/// Markdown renderer.
#[derive(Debug)]
pub struct MarkdownRenderer {
    options: RenderOptions,
}

impl MarkdownRenderer {
    /// Creates a new renderer with the given options.
    pub fn new(options: RenderOptions) -> Self {
        Self { options }
    }

    /// Renders a document to Markdown string.
    pub fn render(&self, document: &Document) -> Result<String> {
        let mut output = String::new();

        if self.options.include_frontmatter {
            self.render_frontmatter(document, &mut output);
        }

        let mut numbering = ListNumbering::default();
        for block in &document.blocks {
            let number = numbering.next(block);
            self.render_block(document, block, number, &mut output);
        }

        // Trailing blank lines
        while output.ends_with("\n\n") {
            output.pop();
        }

        Ok(output)
    }

    /// Renders YAML frontmatter.
    fn render_frontmatter(&self, document: &Document, output: &mut String) {
        output.push_str("---\n");

        if let Some(ref title) = document.metadata.title {
            output.push_str(&format!("title: \"{}\"\n", escape_yaml(title)));
        }
        if let Some(ref app) = document.metadata.creator_app {
            output.push_str(&format!("generator: \"{}\"\n", escape_yaml(app)));
        }
        output.push_str(&format!("images: {}\n", document.image_count()));

        output.push_str("---\n\n");
    }

    fn render_block(
        &self,
        document: &Document,
        block: &Block,
        number: Option<u32>,
        output: &mut String,
    ) {
        match block {
            Block::Title(text) => {
                output.push_str("# ");
                output.push_str(text);
                output.push_str("\n\n");
            }
            Block::Heading { level, text } => {
                let level = (*level).clamp(1, self.options.max_heading_level.max(1));
                output.push_str(&"#".repeat(level as usize));
                output.push(' ');
                output.push_str(text);
                output.push_str("\n\n");
            }
            Block::Paragraph(para) => {
                if para.is_empty() && !self.options.include_empty_paragraphs {
                    return;
                }
                let indent = "  ".repeat(para.style.indent_level as usize);
                output.push_str(&indent);
                self.render_paragraph(document, para, output);
                self.end_paragraph(output);
            }
            Block::ListItem {
                style,
                level,
                paragraph,
                ..
            } => {
                let indent = "  ".repeat(level.saturating_sub(1) as usize);
                output.push_str(&indent);
                match style {
                    ListStyle::Bullet => {
                        output.push(self.options.list_marker);
                        output.push(' ');
                    }
                    ListStyle::Numbered => {
                        output.push_str(&format!("{}. ", number.unwrap_or(1)));
                    }
                    ListStyle::Continuation => {}
                }
                self.render_paragraph(document, paragraph, output);
                output.push('\n');
            }
            Block::CodeBlock { text } => {
                let fence = if text.contains("```") { "~~~" } else { "```" };
                output.push_str(fence);
                output.push('\n');
                output.push_str(text.trim_end_matches('\n'));
                output.push('\n');
                output.push_str(fence);
                output.push_str("\n\n");
            }
            Block::Quote(para) => {
                let mut inner = String::new();
                self.render_paragraph(document, para, &mut inner);
                for line in inner.lines() {
                    output.push_str("> ");
                    output.push_str(line);
                    output.push('\n');
                }
                output.push('\n');
            }
            Block::Rule => output.push_str("---\n\n"),
            Block::Image(img) => {
                self.render_image(document, img, output);
                output.push_str("\n\n");
            }
            Block::Anchor { name } => {
                output.push_str(&format!("<a id=\"{}\"></a>\n\n", name));
            }
            Block::TocEntry {
                anchor,
                text,
                level,
            } => {
                output.push_str(&"  ".repeat(level.saturating_sub(1) as usize));
                output.push_str(&format!("- [{}](#{})\n", self.escape(text), anchor));
            }
            Block::PageBreak => {
                if !output.is_empty() && !output.ends_with("\n\n") {
                    output.push('\n');
                }
            }
        }
    }

    fn end_paragraph(&self, output: &mut String) {
        output.push('\n');
        if self.options.paragraph_spacing {
            output.push('\n');
        }
    }

    /// Renders the inline content of a paragraph.
    fn render_paragraph(&self, document: &Document, para: &Paragraph, output: &mut String) {
        for item in &para.content {
            self.render_inline(document, item, output);
        }
    }

    /// Renders inline content.
    fn render_inline(&self, document: &Document, item: &InlineContent, output: &mut String) {
        match item {
            InlineContent::Text(run) => {
                self.render_text_run(run, output);
            }
            InlineContent::LineBreak => {
                if self.options.preserve_line_breaks {
                    output.push_str("  \n"); // Two spaces + newline for Markdown line break
                } else {
                    output.push(' ');
                }
            }
            InlineContent::Image(img) => self.render_image(document, img, output),
        }
    }

    fn render_image(&self, document: &Document, img: &ImageRef, output: &mut String) {
        let alt = img.alt_text.as_deref().unwrap_or("image");
        let target = match &img.source {
            ImageSource::Embedded(id) => match (&self.options.image_dir, document.resources.get(id)) {
                (None, Some(resource)) => format!(
                    "data:{};base64,{}",
                    resource.mime_type.as_deref().unwrap_or("application/octet-stream"),
                    base64::engine::general_purpose::STANDARD.encode(&resource.data)
                ),
                _ => format!("{}{}", self.options.image_path_prefix, id),
            },
            ImageSource::File(path) => path.display().to_string().replace(' ', "%20"),
        };
        output.push_str(&format!("![{}]({})", alt, target));
    }

    /// Renders a text run with formatting.
    fn render_text_run(&self, run: &TextRun, output: &mut String) {
        if run.text.is_empty() {
            return;
        }
        let style = &run.style;

        // Whitespace around markers would break emphasis
        let body = run.text.trim();
        let lead = &run.text[..run.text.len() - run.text.trim_start().len()];
        let trail = &run.text[run.text.trim_end().len()..];
        if body.is_empty() {
            output.push_str(&run.text);
            return;
        }

        let mut text = if style.monospace {
            format!("`{}`", body)
        } else {
            self.escape(body)
        };

        if let Some(ref url) = run.hyperlink {
            text = format!("[{}]({})", text, url);
        }

        let mut prefix = String::new();
        let mut suffix = String::new();

        if style.bold {
            prefix.push_str("**");
            suffix.insert_str(0, "**");
        }
        if style.italic {
            prefix.push('*');
            suffix.insert(0, '*');
        }
        if style.underline {
            prefix.push_str("<u>");
            suffix.insert_str(0, "</u>");
        }

        output.push_str(lead);
        output.push_str(&prefix);
        output.push_str(&text);
        output.push_str(&suffix);
        output.push_str(trail);
    }

    fn escape(&self, text: &str) -> String {
        if self.options.escape_special_chars {
            escape_markdown(text)
        } else {
            text.to_string()
        }
    }
}

/// Escapes special Markdown characters.
fn escape_markdown(text: &str) -> String {
    let mut result = String::with_capacity(text.len());

    for ch in text.chars() {
        match ch {
            '\\' | '`' | '*' | '_' | '{' | '}' | '[' | ']' | '(' | ')' | '#' | '+' | '-' | '.'
            | '!' | '|' => {
                result.push('\\');
                result.push(ch);
            }
            _ => result.push(ch),
        }
    }

    result
}

/// Escapes special characters for YAML strings.
fn escape_yaml(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}
