//! Document assembly.
//!
//! Turns a [`CollectionTree`] into one linear [`Document`]: a table of
//! contents, then one section per collection with a heading, metadata,
//! rendered notes, snapshot screenshots and image attachments per item.

use crate::attachment::{is_html_file, is_image_file, is_image_url, resolve_attachment_path};
use crate::config::ExportConfig;
use crate::error::{Error, Result};
use crate::html::{Fragment, HtmlRenderer};
use crate::media::MediaCache;
use crate::model::{
    Attachment, BibliographicItem, Block, CollectionPath, CollectionTree, Document, ImageRef,
    Paragraph, Resource, TextRun, TextStyle,
};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Title of the table of contents page.
pub const TOC_TITLE: &str = "Table of Contents";

/// Title of the export body.
pub const EXPORT_TITLE: &str = "Zotero Library Export";

/// Heading used for items whose title is somehow blank.
const NO_TITLE: &str = "(No Title)";

/// Builds the export document.
pub struct DocumentAssembler<'a> {
    config: &'a ExportConfig,
    renderer: HtmlRenderer,
    media: MediaCache,
    doc: Document,
    warnings: Vec<String>,
}

impl<'a> DocumentAssembler<'a> {
    /// Creates an assembler with the default media cache for `config`.
    pub fn new(config: &'a ExportConfig) -> Self {
        Self::with_media(config, MediaCache::new(config))
    }

    /// Creates an assembler with an explicit media cache.
    pub fn with_media(config: &'a ExportConfig, media: MediaCache) -> Self {
        Self {
            config,
            renderer: HtmlRenderer::new(config),
            media,
            doc: Document::new(),
            warnings: Vec::new(),
        }
    }

    /// Warnings collected so far.
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Assembles the whole document.
    pub fn assemble(&mut self, tree: &CollectionTree) -> Document {
        self.doc = Document::new();
        self.doc.metadata.title = Some(EXPORT_TITLE.to_string());
        self.doc.metadata.creator_app =
            Some(format!("unzotero {}", env!("CARGO_PKG_VERSION")));

        let paths: Vec<&CollectionPath> = tree
            .sorted_paths()
            .into_iter()
            .filter(|p| tree.items(p).is_some_and(|items| !items.is_empty()))
            .collect();

        self.push_toc(&paths);
        self.doc.push(Block::Title(EXPORT_TITLE.to_string()));

        for (idx, path) in paths.iter().enumerate() {
            let items = tree.items(path).unwrap_or_default();
            log::debug!("collection '{}': {} items", path, items.len());
            self.push_collection(&anchor_name(idx), path, items);
        }

        log::info!(
            "assembled {} blocks, {} images, {} warnings",
            self.doc.blocks.len(),
            self.doc.image_count(),
            self.warnings.len()
        );
        std::mem::take(&mut self.doc)
    }

    fn push_toc(&mut self, paths: &[&CollectionPath]) {
        self.doc.push(Block::Title(TOC_TITLE.to_string()));
        for (idx, (path, label)) in paths.iter().zip(toc_labels(paths)).enumerate() {
            self.doc.push(Block::TocEntry {
                anchor: anchor_name(idx),
                text: label,
                level: u8::try_from(path.depth()).unwrap_or(u8::MAX),
            });
        }
        self.doc.push(Block::PageBreak);
    }

    fn push_collection(&mut self, anchor: &str, path: &CollectionPath, items: &[BibliographicItem]) {
        self.doc.push(Block::Anchor {
            name: anchor.to_string(),
        });
        self.doc.push_paragraph(bold_line(&path.to_string()));

        for item in order_items(items) {
            self.push_item(item, path.depth());
        }
        self.doc.push(Block::Rule);
    }

    fn push_item(&mut self, item: &BibliographicItem, depth: usize) {
        self.doc.push(Block::Rule);

        let level = (depth + 1).min(usize::from(self.config.max_heading_depth)).max(1);
        let title = if item.title.trim().is_empty() {
            NO_TITLE.to_string()
        } else {
            item.title.clone()
        };
        self.doc.push(Block::Heading {
            level: level as u8,
            text: title,
        });

        if self.config.embed_metadata {
            if let Some(para) = metadata_paragraph(item, self.config.styling.small_text_size) {
                self.doc.push_paragraph(para);
            }
        }

        let notes = item.displayable_notes();
        if !notes.is_empty() {
            self.doc.push_paragraph(bold_line("Notes:"));
            for html in notes {
                let fragment = self.renderer.render_note(html);
                self.push_fragment(fragment);
            }
            self.doc.push_paragraph(Paragraph::new());
        }

        if self.config.enable_webpages && !item.snapshots.is_empty() {
            self.doc.push_paragraph(bold_line("Snapshots:"));
            for snapshot in &item.snapshots {
                let key = snapshot_key(snapshot);
                let width = self.config.max_image_width;
                match self
                    .media
                    .snapshot(&key, snapshot)
                    .and_then(|png| self.embed_file(&png, width))
                {
                    Ok(image) => {
                        self.doc.push(Block::Image(image));
                        self.doc.push_paragraph(Paragraph::new());
                    }
                    Err(e) => self.warn(format!(
                        "skipped snapshot {} of '{}': {}",
                        snapshot.display(),
                        item.title,
                        e
                    )),
                }
            }
            self.doc.push_paragraph(Paragraph::new());
        }

        if self.config.enable_images {
            for attachment in &item.attachments {
                self.push_attachment_image(item, attachment);
            }
        }
    }

    /// Appends a rendered note, placing downloaded remote images right after
    /// the block that holds their placeholder.
    fn push_fragment(&mut self, fragment: Fragment) {
        let Fragment {
            blocks,
            resources,
            pending_images,
            warnings,
        } = fragment;

        self.warnings.extend(warnings);
        for (id, resource) in resources {
            self.doc.resources.entry(id).or_insert(resource);
        }

        for (idx, block) in blocks.into_iter().enumerate() {
            self.doc.push(block);
            for pending in pending_images.iter().filter(|p| p.block == idx) {
                let width = self.config.inline_image_width();
                match self
                    .media
                    .remote_image(&pending.url)
                    .and_then(|path| self.embed_file(&path, width))
                {
                    Ok(image) => self.doc.push(Block::Image(image.with_alt(&pending.alt))),
                    Err(e) => self.warn(format!("skipped note image {}: {}", pending.url, e)),
                }
            }
        }
    }

    fn push_attachment_image(&mut self, item: &BibliographicItem, attachment: &Attachment) {
        match self.attachment_image(attachment) {
            Ok(Some((path, source))) => {
                match self.embed_file(&path, self.config.max_image_width) {
                    Ok(image) => {
                        self.doc.push(Block::Image(image));
                        self.doc
                            .push_paragraph(source_line(&source, self.config.styling.small_text_size));
                    }
                    Err(e) => self.warn(format!(
                        "skipped image {} of '{}': {}",
                        path.display(),
                        item.title,
                        e
                    )),
                }
            }
            Ok(None) => log::debug!("attachment {} has no usable image", attachment.key),
            Err(e) => self.warn(format!(
                "skipped attachment {} of '{}': {}",
                attachment.key, item.title, e
            )),
        }
    }

    /// Finds the image file for an attachment: a local image, a screenshot of
    /// a local HTML page, or a downloaded remote image, in that order.
    fn attachment_image(&self, attachment: &Attachment) -> Result<Option<(PathBuf, String)>> {
        let local = resolve_attachment_path(&self.config.storage_dir, attachment);

        if let Some(path) = local.as_deref().filter(|p| is_image_file(p)) {
            let source = attachment
                .url
                .clone()
                .unwrap_or_else(|| path.display().to_string());
            return Ok(Some((path.to_path_buf(), source)));
        }

        let page = local
            .as_deref()
            .filter(|p| self.config.enable_webpages && is_html_file(p));
        if let Some(path) = page {
            match self.media.snapshot(&attachment.key, path) {
                Ok(png) => {
                    let source = attachment
                        .url
                        .clone()
                        .unwrap_or_else(|| path.display().to_string());
                    return Ok(Some((png, source)));
                }
                Err(e) => log::warn!("snapshot of {} failed: {}", path.display(), e),
            }
        }

        match attachment.url.as_deref() {
            Some(url) if is_image_url(url) => {
                let path = self.media.remote_image(url)?;
                Ok(Some((path, url.to_string())))
            }
            _ => Ok(None),
        }
    }

    /// Reads an image file into the document's resources.
    fn embed_file(&mut self, path: &Path, width_in: f32) -> Result<ImageRef> {
        let bytes = std::fs::read(path)?;
        let format = image::guess_format(&bytes).map_err(|e| {
            Error::ImageDecode(format!("{} is not a supported image: {}", path.display(), e))
        })?;
        let id = self
            .doc
            .add_resource(Resource::image(bytes, format.to_mime_type()));
        Ok(ImageRef::embedded(id, width_in))
    }

    fn warn(&mut self, message: String) {
        log::warn!("{}", message);
        self.warnings.push(message);
    }
}

/// Bookmark name for the n-th collection (0-based).
fn anchor_name(idx: usize) -> String {
    format!("toc_{}", idx + 1)
}

/// Table of contents labels for sorted paths.
///
/// Top-level paths show their name. Deeper paths show `parent / leaf`, except
/// the first deep path under each top-level branch, which shows in full.
pub fn toc_labels(paths: &[&CollectionPath]) -> Vec<String> {
    let mut expanded: HashSet<&str> = HashSet::new();
    paths
        .iter()
        .copied()
        .map(|path| {
            let segments = path.segments();
            match segments {
                [] => String::new(),
                [only] => only.clone(),
                [root, .., parent, leaf] => {
                    if expanded.insert(root.as_str()) {
                        path.to_string()
                    } else {
                        format!("{} / {}", parent, leaf)
                    }
                }
                [root, leaf] => {
                    expanded.insert(root.as_str());
                    format!("{} / {}", root, leaf)
                }
            }
        })
        .collect()
}

/// Items with displayable notes first, each group by date added.
fn order_items(items: &[BibliographicItem]) -> Vec<&BibliographicItem> {
    let (mut with_notes, mut without): (Vec<_>, Vec<_>) =
        items.iter().partition(|item| item.has_displayable_notes());
    with_notes.sort_by(|a, b| a.date_added.cmp(&b.date_added));
    without.sort_by(|a, b| a.date_added.cmp(&b.date_added));
    with_notes.extend(without);
    with_notes
}

/// Metadata fields shown under an item title.
pub fn metadata_fields(item: &BibliographicItem) -> Vec<String> {
    let mut fields = Vec::new();
    if !item.is_note() {
        let authors: Vec<String> = item
            .creators
            .iter()
            .map(|c| c.display())
            .filter(|d| !d.is_empty() && d != "()")
            .collect();
        if !authors.is_empty() {
            fields.push(format!("Author(s): {}", authors.join("; ")));
        }
        if !item.date.is_empty() {
            fields.push(format!("Date: {}", item.date));
        }
    }
    if !item.date_added.is_empty() {
        let added = item.date_added.replace('T', " ").replace('Z', "");
        fields.push(format!("Added to Zotero: {}", added));
    }
    if !item.tags.is_empty() {
        fields.push(format!("Tags: {}", item.tags.join(", ")));
    }
    fields
}

fn metadata_paragraph(item: &BibliographicItem, size: f32) -> Option<Paragraph> {
    let fields = metadata_fields(item);
    if fields.is_empty() && item.url.is_none() {
        return None;
    }

    let style = TextStyle::small_italic(size);
    let mut para = Paragraph::new();
    if !fields.is_empty() {
        para.push_text(TextRun::with_style(fields.join("; "), style.clone()));
    }
    if let Some(url) = &item.url {
        if !fields.is_empty() {
            para.push_line_break();
        }
        para.push_text(TextRun::with_style(format!("Source: {}", url), style));
    }
    Some(para)
}

fn bold_line(text: &str) -> Paragraph {
    Paragraph::from_run(TextRun::with_style(text, TextStyle::bold()))
}

fn source_line(source: &str, size: f32) -> Paragraph {
    let mut run = TextRun::with_style(source, TextStyle::small_italic(size));
    if source.starts_with("http://") || source.starts_with("https://") {
        run.hyperlink = Some(source.to_string());
    }
    Paragraph::from_run(run)
}

/// Screenshot cache key for a snapshot: the storage folder name, which is
/// the attachment key.
fn snapshot_key(path: &Path) -> String {
    path.parent()
        .and_then(Path::file_name)
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
