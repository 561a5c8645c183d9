//! # unzotero
//!
//! Exports a Zotero reference library (items, notes, attachments and the
//! collection hierarchy) into a single structured document.
//!
//! ## Pipeline
//!
//! 1. A [`LibrarySource`] hands out raw item and collection records, either
//!    from the local HTTP API or from a JSON snapshot.
//! 2. [`tree::build_library`] converts them into typed items bucketed by
//!    collection path.
//! 3. [`DocumentAssembler`] lays out a table of contents and one section per
//!    collection, rendering note HTML through the [`HtmlRenderer`].
//! 4. [`render`] serializes the result as DOCX, Markdown or JSON.
//!
//! ## Quick Start
//!
//! ```no_run
//! use unzotero::{ExportConfig, JsonSource, Unzotero};
//!
//! fn main() -> unzotero::Result<()> {
//!     let source = JsonSource::open("library.json")?;
//!     let config = ExportConfig::default().with_storage_dir("./storage");
//!
//!     let export = Unzotero::with_config(config).export(&source)?;
//!     println!("{} warnings", export.warnings().len());
//!     export.save("library.docx")?;
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - `remote` (default): local API client and remote image downloads

pub mod assemble;
pub mod attachment;
pub mod config;
pub mod error;
pub mod html;
pub mod media;
pub mod model;
pub mod render;
pub mod source;
pub mod tree;

// Re-exports
pub use assemble::DocumentAssembler;
pub use config::{ExportConfig, Styling};
pub use error::{Error, Result};
pub use html::HtmlRenderer;
pub use media::MediaCache;
pub use model::{CollectionTree, Document};
pub use render::{OutputFormat, RenderOptions, SaveOutcome};
#[cfg(feature = "remote")]
pub use source::LocalApiSource;
pub use source::{JsonSource, LibrarySource};

use std::path::Path;

/// Exports a library with the given configuration.
///
/// Setup problems (missing storage directory, unreachable source) are
/// returned as errors before any document work. Everything after that is
/// best effort: per-item problems end up in [`Export::warnings`].
///
/// # Example
///
/// ```no_run
/// use unzotero::{export_library, ExportConfig, JsonSource};
///
/// let source = JsonSource::open("library.json")?;
/// let export = export_library(&source, &ExportConfig::default())?;
/// println!("{} collections", export.tree().len());
/// # Ok::<(), unzotero::Error>(())
/// ```
pub fn export_library(source: &dyn LibrarySource, config: &ExportConfig) -> Result<Export> {
    Unzotero::with_config(config.clone()).export(source)
}

/// Renders a single HTML note into a standalone document.
///
/// Remote images are left as placeholders; use the full export to download
/// them.
pub fn render_note_html(html: &str, config: &ExportConfig) -> (Document, Vec<String>) {
    let fragment = HtmlRenderer::new(config).render_note(html);
    let warnings = fragment.warnings.clone();
    (fragment.into_document(), warnings)
}

/// Builder for exporting libraries.
///
/// Provides a fluent API over [`ExportConfig`].
///
/// # Example
///
/// ```no_run
/// use unzotero::{JsonSource, Unzotero};
///
/// let source = JsonSource::open("library.json")?;
/// let export = Unzotero::new()
///     .with_storage_dir("./storage")
///     .with_images(false)
///     .export(&source)?;
/// let markdown = export.to_markdown()?;
/// # Ok::<(), unzotero::Error>(())
/// ```
pub struct Unzotero {
    config: ExportConfig,
    media: Option<MediaCache>,
}

impl Default for Unzotero {
    fn default() -> Self {
        Self::new()
    }
}

impl Unzotero {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::with_config(ExportConfig::default())
    }

    /// Creates a builder from an existing configuration.
    pub fn with_config(config: ExportConfig) -> Self {
        Self {
            config,
            media: None,
        }
    }

    /// Sets the attachment storage directory.
    pub fn with_storage_dir(mut self, dir: impl Into<std::path::PathBuf>) -> Self {
        self.config = self.config.with_storage_dir(dir);
        self
    }

    /// Enables or disables images (attachments and note images).
    pub fn with_images(mut self, enabled: bool) -> Self {
        self.config = self.config.with_images(enabled);
        self
    }

    /// Enables or disables HTML snapshot screenshots.
    pub fn with_webpages(mut self, enabled: bool) -> Self {
        self.config = self.config.with_webpages(enabled);
        self
    }

    /// Disables the metadata line under item titles.
    pub fn without_metadata(mut self) -> Self {
        self.config = self.config.without_metadata();
        self
    }

    /// Uses a specific media cache (downloads and screenshots).
    pub fn with_media(mut self, media: MediaCache) -> Self {
        self.media = Some(media);
        self
    }

    /// Returns the configuration in use.
    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    /// Reads the library and assembles the export document.
    pub fn export(self, source: &dyn LibrarySource) -> Result<Export> {
        self.config.validate()?;

        let tree = tree::build_library(source, &self.config)?;
        log::info!(
            "library: {} collection buckets, {} item placements",
            tree.len(),
            tree.item_count()
        );

        let media = self
            .media
            .unwrap_or_else(|| MediaCache::new(&self.config));
        let mut assembler = DocumentAssembler::with_media(&self.config, media);
        let document = assembler.assemble(&tree);
        let warnings = assembler.warnings().to_vec();

        Ok(Export {
            document,
            warnings,
            tree,
            config: self.config,
        })
    }
}

/// An assembled export ready for writing.
pub struct Export {
    document: Document,
    warnings: Vec<String>,
    tree: CollectionTree,
    config: ExportConfig,
}

impl Export {
    /// Returns a reference to the assembled document.
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Non-fatal problems met during assembly.
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// The collection tree the document was built from.
    pub fn tree(&self) -> &CollectionTree {
        &self.tree
    }

    /// Renders the document to Markdown with data-URI images.
    pub fn to_markdown(&self) -> Result<String> {
        render::render_markdown(&self.document, &RenderOptions::default())
    }

    /// Renders the document structure as JSON.
    pub fn to_json(&self) -> Result<String> {
        render::render_json(&self.document)
    }

    /// Renders the document to DOCX bytes using the configured styling.
    pub fn to_docx(&self) -> Result<Vec<u8>> {
        render::render_docx(&self.document, &self.config.styling)
    }

    /// Writes the document, inferring the format from the extension and
    /// falling back to `<stem>.error.<ext>` if the first write fails.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<SaveOutcome> {
        let path = path.as_ref();
        let format = OutputFormat::from_path(path)?;
        render::save_with_fallback(&self.document, path, format, &self.config.styling)
    }

    /// Consumes self and returns the underlying document.
    pub fn into_document(self) -> Document {
        self.document
    }
}
