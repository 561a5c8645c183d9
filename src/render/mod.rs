//! Document serialization: DOCX, Markdown and raw JSON.

mod docx;
mod markdown;
mod options;

pub use docx::DocxWriter;
pub use markdown::MarkdownRenderer;
pub use options::RenderOptions;

use crate::config::Styling;
use crate::error::{Error, Result};
use crate::model::{Block, Document, ListStyle};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Output file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Word document (Office Open XML)
    Docx,
    /// Markdown with images in a sibling `<stem>_assets/` directory
    Markdown,
    /// The document structure as JSON
    Json,
}

impl OutputFormat {
    /// Infers the format from a path's extension.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| {
                Error::UnsupportedFormat(format!("no extension on {}", path.display()))
            })?;
        ext.parse()
    }

    /// Canonical file extension.
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Docx => "docx",
            OutputFormat::Markdown => "md",
            OutputFormat::Json => "json",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "docx" => Ok(OutputFormat::Docx),
            "md" | "markdown" => Ok(OutputFormat::Markdown),
            "json" => Ok(OutputFormat::Json),
            other => Err(Error::UnsupportedFormat(other.to_string())),
        }
    }
}

/// Renders a document to Markdown.
pub fn render_markdown(document: &Document, options: &RenderOptions) -> Result<String> {
    let renderer = MarkdownRenderer::new(options.clone());
    renderer.render(document)
}

/// Renders the document structure as pretty-printed JSON.
pub fn render_json(document: &Document) -> Result<String> {
    Ok(serde_json::to_string_pretty(document)?)
}

/// Renders a document to DOCX bytes.
pub fn render_docx(document: &Document, styling: &Styling) -> Result<Vec<u8>> {
    DocxWriter::new(styling).write(document)
}

/// Writes a document to `path` in the given format.
///
/// Markdown output stores embedded images next to the file, in
/// `<stem>_assets/`.
pub fn write_document(
    document: &Document,
    path: impl AsRef<Path>,
    format: OutputFormat,
    styling: &Styling,
) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    match format {
        OutputFormat::Docx => {
            let bytes = render_docx(document, styling)?;
            std::fs::write(path, bytes)?;
        }
        OutputFormat::Markdown => {
            let mut options = RenderOptions::default();
            if !document.resources.is_empty() {
                let dir_name = format!("{}_assets", file_stem(path));
                let dir = path.with_file_name(&dir_name);
                std::fs::create_dir_all(&dir)?;
                for (id, resource) in &document.resources {
                    std::fs::write(dir.join(id), &resource.data)?;
                }
                options = options
                    .with_image_dir(dir)
                    .with_image_prefix(format!("{}/", dir_name));
            }
            std::fs::write(path, render_markdown(document, &options)?)?;
        }
        OutputFormat::Json => {
            std::fs::write(path, render_json(document)?)?;
        }
    }

    log::info!("wrote {}", path.display());
    Ok(())
}

/// Result of [`save_with_fallback`].
#[derive(Debug)]
pub enum SaveOutcome {
    /// The document was written to the requested path.
    Saved(PathBuf),
    /// The requested path failed; the document went to `path` instead.
    Fallback {
        /// Where the document was written
        path: PathBuf,
        /// Why the primary write failed
        error: Error,
    },
}

impl SaveOutcome {
    /// Returns the path the document ended up at.
    pub fn path(&self) -> &Path {
        match self {
            SaveOutcome::Saved(path) | SaveOutcome::Fallback { path, .. } => path,
        }
    }

    /// Returns true if the primary write succeeded.
    pub fn is_saved(&self) -> bool {
        matches!(self, SaveOutcome::Saved(_))
    }
}

/// Writes the document, retrying once at [`fallback_path`] on failure.
///
/// Returns `Err` only when both writes fail; the error is the one from the
/// fallback attempt.
pub fn save_with_fallback(
    document: &Document,
    path: impl AsRef<Path>,
    format: OutputFormat,
    styling: &Styling,
) -> Result<SaveOutcome> {
    let path = path.as_ref();
    match write_document(document, path, format, styling) {
        Ok(()) => Ok(SaveOutcome::Saved(path.to_path_buf())),
        Err(error) => {
            let fallback = fallback_path(path, format);
            log::error!(
                "failed to save {}: {}; trying {}",
                path.display(),
                error,
                fallback.display()
            );
            write_document(document, &fallback, format, styling)?;
            Ok(SaveOutcome::Fallback {
                path: fallback,
                error,
            })
        }
    }
}

/// Distinct path used when the primary write fails: `<stem>.error.<ext>`.
pub fn fallback_path(path: &Path, format: OutputFormat) -> PathBuf {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_else(|| format.extension());
    path.with_file_name(format!("{}.error.{}", file_stem(path), ext))
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "export".to_string())
}

/// Running numbers for ordered list items.
///
/// Consecutive numbered items at one level count up; the first item of a
/// list restarts its level, a shallower item resets deeper counters and any
/// non-list block resets all of them.
#[derive(Debug, Default)]
pub(crate) struct ListNumbering {
    counts: Vec<u32>,
}

impl ListNumbering {
    /// Advances past `block`, returning its number if it is a numbered item.
    pub(crate) fn next(&mut self, block: &Block) -> Option<u32> {
        let Block::ListItem {
            style,
            level,
            starts_list,
            ..
        } = block
        else {
            self.counts.clear();
            return None;
        };
        let depth = (*level).max(1) as usize;
        self.counts.truncate(depth);
        self.counts.resize(depth, 0);
        let slot = &mut self.counts[depth - 1];
        if *starts_list {
            *slot = 0;
        }
        if *style == ListStyle::Numbered {
            *slot += 1;
            Some(*slot)
        } else {
            *slot = 0;
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Paragraph, Resource};

    fn item(style: ListStyle, level: u8) -> Block {
        Block::ListItem {
            style,
            level,
            starts_list: false,
            paragraph: Paragraph::text("x"),
        }
    }

    fn first_item(style: ListStyle, level: u8) -> Block {
        Block::ListItem {
            style,
            level,
            starts_list: true,
            paragraph: Paragraph::text("x"),
        }
    }

    fn sample() -> Document {
        let mut doc = Document::new();
        doc.push(Block::Title("Export".into()));
        doc.push_paragraph(Paragraph::text("body"));
        doc
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(OutputFormat::from_path("a/b.docx").unwrap(), OutputFormat::Docx);
        assert_eq!(OutputFormat::from_path("notes.MD").unwrap(), OutputFormat::Markdown);
        assert_eq!(OutputFormat::from_path("x.json").unwrap(), OutputFormat::Json);
        assert!(matches!(
            OutputFormat::from_path("x.pdf"),
            Err(Error::UnsupportedFormat(_))
        ));
        assert!(OutputFormat::from_path("noext").is_err());
    }

    #[test]
    fn test_fallback_path() {
        assert_eq!(
            fallback_path(Path::new("/tmp/out/export.docx"), OutputFormat::Docx),
            PathBuf::from("/tmp/out/export.error.docx")
        );
        assert_eq!(
            fallback_path(Path::new("export"), OutputFormat::Markdown),
            PathBuf::from("export.error.md")
        );
    }

    #[test]
    fn test_list_numbering() {
        let mut numbering = ListNumbering::default();
        assert_eq!(numbering.next(&item(ListStyle::Numbered, 1)), Some(1));
        assert_eq!(numbering.next(&item(ListStyle::Numbered, 2)), Some(1));
        assert_eq!(numbering.next(&item(ListStyle::Numbered, 2)), Some(2));
        assert_eq!(numbering.next(&item(ListStyle::Numbered, 1)), Some(2));
        assert_eq!(numbering.next(&item(ListStyle::Numbered, 2)), Some(1));
        assert_eq!(numbering.next(&item(ListStyle::Bullet, 1)), None);
        assert_eq!(numbering.next(&item(ListStyle::Numbered, 1)), Some(1));
        assert_eq!(numbering.next(&Block::Rule), None);
        assert_eq!(numbering.next(&item(ListStyle::Numbered, 1)), Some(1));
    }

    #[test]
    fn test_list_numbering_restarts_for_adjacent_lists() {
        let mut numbering = ListNumbering::default();
        assert_eq!(numbering.next(&first_item(ListStyle::Numbered, 1)), Some(1));
        assert_eq!(numbering.next(&item(ListStyle::Numbered, 1)), Some(2));
        assert_eq!(numbering.next(&first_item(ListStyle::Numbered, 1)), Some(1));
        // A nested list starting mid-way leaves the outer count alone
        assert_eq!(numbering.next(&first_item(ListStyle::Numbered, 2)), Some(1));
        assert_eq!(numbering.next(&item(ListStyle::Numbered, 1)), Some(2));
    }

    #[test]
    fn test_write_markdown_with_assets() {
        let dir = tempfile::tempdir().unwrap();
        let mut doc = sample();
        let id = doc.add_resource(Resource::image(vec![7; 8], "image/png"));
        doc.push(Block::Image(crate::model::ImageRef::embedded(id.clone(), 6.0)));

        let path = dir.path().join("library.md");
        write_document(&doc, &path, OutputFormat::Markdown, &Styling::default()).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains(&format!("](library_assets/{})", id)));
        assert_eq!(
            std::fs::read(dir.path().join("library_assets").join(&id)).unwrap(),
            vec![7; 8]
        );
    }

    #[test]
    fn test_write_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("doc.json");
        write_document(&sample(), &path, OutputFormat::Json, &Styling::default()).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["blocks"][0]["Title"], "Export");
    }

    #[test]
    fn test_save_with_fallback_uses_error_path() {
        let dir = tempfile::tempdir().unwrap();
        // A directory in the way of the primary path makes the write fail
        let path = dir.path().join("export.json");
        std::fs::create_dir(&path).unwrap();

        let outcome =
            save_with_fallback(&sample(), &path, OutputFormat::Json, &Styling::default()).unwrap();
        assert!(!outcome.is_saved());
        assert_eq!(outcome.path(), dir.path().join("export.error.json"));
        assert!(outcome.path().is_file());
    }

    #[test]
    fn test_save_with_fallback_both_fail() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("export.json");
        std::fs::create_dir(&path).unwrap();
        std::fs::create_dir(dir.path().join("export.error.json")).unwrap();

        let result = save_with_fallback(&sample(), &path, OutputFormat::Json, &Styling::default());
        assert!(matches!(result, Err(Error::Io(_))));
    }

    #[test]
    fn test_save_primary() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("export.docx");
        let outcome =
            save_with_fallback(&sample(), &path, OutputFormat::Docx, &Styling::default()).unwrap();
        assert!(outcome.is_saved());
        assert_eq!(&std::fs::read(&path).unwrap()[..2], b"PK");
    }
}
