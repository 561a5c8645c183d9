//! DOCX (Office Open XML) writer.
//!
//! The package is assembled in memory: `word/document.xml` is streamed
//! through a quick-xml [`Writer`] while relationships and media parts are
//! collected, then every part is written into a deflated ZIP.

use super::ListNumbering;
use crate::config::Styling;
use crate::error::Result;
use crate::model::{
    Block, Document, ImageRef, ImageSource, InlineContent, ListStyle, Paragraph, Resource,
    TextRun, TextStyle,
};
use image::GenericImageView;
use quick_xml::escape::escape;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::collections::{BTreeSet, HashMap};
use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

/// English Metric Units per inch.
const EMU_PER_INCH: f32 = 914_400.0;

/// Indentation step for list nesting, in twentieths of a point.
const INDENT_STEP: u32 = 360;

const NS_W: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
const NS_R: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const NS_WP: &str = "http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing";
const NS_A: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
const NS_PIC: &str = "http://schemas.openxmlformats.org/drawingml/2006/picture";
const REL_HYPERLINK: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/hyperlink";
const REL_IMAGE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";
const REL_STYLES: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles";

/// Writes documents as `.docx` packages.
#[derive(Debug)]
pub struct DocxWriter<'a> {
    styling: &'a Styling,
}

impl<'a> DocxWriter<'a> {
    /// Creates a writer using the given fonts and sizes.
    pub fn new(styling: &'a Styling) -> Self {
        Self { styling }
    }

    /// Serializes a document into DOCX bytes.
    pub fn write(&self, document: &Document) -> Result<Vec<u8>> {
        let mut body = BodyWriter::new(self.styling, document);
        body.write_body()?;
        let BodyWriter {
            xml, rels, media, ..
        } = body;
        let document_xml = xml.into_inner().into_inner();

        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options =
            SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

        zip.start_file("[Content_Types].xml", options)?;
        zip.write_all(content_types_xml(&media).as_bytes())?;

        zip.start_file("_rels/.rels", options)?;
        zip.write_all(ROOT_RELS.as_bytes())?;

        zip.start_file("docProps/core.xml", options)?;
        zip.write_all(core_xml(document).as_bytes())?;

        zip.start_file("word/document.xml", options)?;
        zip.write_all(&document_xml)?;

        zip.start_file("word/_rels/document.xml.rels", options)?;
        zip.write_all(document_rels_xml(&rels).as_bytes())?;

        zip.start_file("word/styles.xml", options)?;
        zip.write_all(styles_xml(self.styling).as_bytes())?;

        for part in &media {
            zip.start_file(format!("word/media/{}", part.name), options)?;
            zip.write_all(&part.data)?;
        }

        let cursor = zip.finish()?;
        log::debug!(
            "docx: {} blocks, {} relationships, {} media parts",
            document.blocks.len(),
            rels.len(),
            media.len()
        );
        Ok(cursor.into_inner())
    }
}

#[derive(Debug)]
struct Relationship {
    id: String,
    kind: &'static str,
    target: String,
    external: bool,
}

#[derive(Debug)]
struct MediaPart {
    name: String,
    extension: String,
    data: Vec<u8>,
}

/// A media part placed in the package, with its pixel size.
#[derive(Debug, Clone)]
struct PlacedImage {
    rel_id: String,
    width: u32,
    height: u32,
}

/// Paragraph properties written into `w:pPr`.
#[derive(Debug, Default)]
struct ParaProps<'s> {
    style: Option<&'s str>,
    bottom_border: bool,
    shaded: bool,
    indent: u32,
}

struct BodyWriter<'a> {
    styling: &'a Styling,
    doc: &'a Document,
    xml: Writer<Cursor<Vec<u8>>>,
    rels: Vec<Relationship>,
    links: HashMap<String, String>,
    media: Vec<MediaPart>,
    images: HashMap<String, Option<PlacedImage>>,
    /// Bookmarks waiting for the next paragraph
    bookmarks: Vec<String>,
    next_bookmark: u32,
    next_drawing: u32,
}

impl<'a> BodyWriter<'a> {
    fn new(styling: &'a Styling, doc: &'a Document) -> Self {
        Self {
            styling,
            doc,
            xml: Writer::new(Cursor::new(Vec::new())),
            rels: vec![Relationship {
                id: "rId1".to_string(),
                kind: REL_STYLES,
                target: "styles.xml".to_string(),
                external: false,
            }],
            links: HashMap::new(),
            media: Vec::new(),
            images: HashMap::new(),
            bookmarks: Vec::new(),
            next_bookmark: 0,
            next_drawing: 1,
        }
    }

    fn write_body(&mut self) -> Result<()> {
        self.xml
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))?;
        self.start(
            "w:document",
            &[
                ("xmlns:w", NS_W),
                ("xmlns:r", NS_R),
                ("xmlns:wp", NS_WP),
                ("xmlns:a", NS_A),
                ("xmlns:pic", NS_PIC),
            ],
        )?;
        self.start("w:body", &[])?;

        let mut numbering = ListNumbering::default();
        let doc = self.doc;
        for block in &doc.blocks {
            let number = numbering.next(block);
            self.write_block(block, number)?;
        }
        if !self.bookmarks.is_empty() {
            self.open_paragraph(&ParaProps::default())?;
            self.end("w:p")?;
        }

        self.start("w:sectPr", &[])?;
        self.empty("w:pgSz", &[("w:w", "12240"), ("w:h", "15840")])?;
        self.empty(
            "w:pgMar",
            &[
                ("w:top", "1440"),
                ("w:right", "1440"),
                ("w:bottom", "1440"),
                ("w:left", "1440"),
                ("w:header", "708"),
                ("w:footer", "708"),
                ("w:gutter", "0"),
            ],
        )?;
        self.end("w:sectPr")?;

        self.end("w:body")?;
        self.end("w:document")
    }

    fn write_block(&mut self, block: &Block, number: Option<u32>) -> Result<()> {
        match block {
            Block::Title(text) => {
                self.open_paragraph(&ParaProps {
                    style: Some("Title"),
                    ..Default::default()
                })?;
                self.run(text, &TextStyle::default(), None)?;
                self.end("w:p")
            }
            Block::Heading { level, text } => {
                let style = format!("Heading{}", (*level).clamp(1, 6));
                self.open_paragraph(&ParaProps {
                    style: Some(&style),
                    ..Default::default()
                })?;
                self.run(text, &TextStyle::default(), None)?;
                self.end("w:p")
            }
            Block::Paragraph(para) => {
                let props = ParaProps {
                    shaded: para.style.shaded,
                    indent: para.style.indent_level as u32 * INDENT_STEP * 2,
                    ..Default::default()
                };
                self.open_paragraph(&props)?;
                self.inline_content(para)?;
                self.end("w:p")
            }
            Block::ListItem {
                style,
                level,
                paragraph,
                ..
            } => {
                self.open_paragraph(&ParaProps {
                    style: Some("ListParagraph"),
                    indent: (*level).max(1) as u32 * INDENT_STEP,
                    ..Default::default()
                })?;
                let prefix = match style {
                    ListStyle::Bullet => Some("\u{2022} ".to_string()),
                    ListStyle::Numbered => Some(format!("{}. ", number.unwrap_or(1))),
                    ListStyle::Continuation => None,
                };
                if let Some(prefix) = prefix {
                    self.run(&prefix, &TextStyle::default(), None)?;
                }
                self.inline_content(paragraph)?;
                self.end("w:p")
            }
            Block::CodeBlock { text } => {
                self.open_paragraph(&ParaProps {
                    shaded: true,
                    ..Default::default()
                })?;
                self.run(text, &TextStyle::monospace(), None)?;
                self.end("w:p")
            }
            Block::Quote(para) => {
                self.open_paragraph(&ParaProps {
                    style: Some("Quote"),
                    ..Default::default()
                })?;
                self.inline_content(para)?;
                self.end("w:p")
            }
            Block::Rule => {
                self.open_paragraph(&ParaProps {
                    bottom_border: true,
                    ..Default::default()
                })?;
                self.end("w:p")
            }
            Block::Image(img) => {
                self.open_paragraph(&ParaProps::default())?;
                self.image(img)?;
                self.end("w:p")
            }
            Block::Anchor { name } => {
                self.bookmarks.push(name.clone());
                Ok(())
            }
            Block::TocEntry {
                anchor,
                text,
                level,
            } => {
                self.open_paragraph(&ParaProps {
                    indent: level.saturating_sub(1) as u32 * INDENT_STEP,
                    ..Default::default()
                })?;
                self.start(
                    "w:hyperlink",
                    &[("w:anchor", anchor.as_str()), ("w:history", "1")],
                )?;
                self.run(text, &TextStyle::default(), Some("Hyperlink"))?;
                self.end("w:hyperlink")?;
                self.end("w:p")
            }
            Block::PageBreak => {
                self.open_paragraph(&ParaProps::default())?;
                self.start("w:r", &[])?;
                self.empty("w:br", &[("w:type", "page")])?;
                self.end("w:r")?;
                self.end("w:p")
            }
        }
    }

    /// Opens `w:p`, writes its properties and any pending bookmarks.
    fn open_paragraph(&mut self, props: &ParaProps<'_>) -> Result<()> {
        self.start("w:p", &[])?;

        let has_props =
            props.style.is_some() || props.bottom_border || props.shaded || props.indent > 0;
        if has_props {
            self.start("w:pPr", &[])?;
            if let Some(style) = props.style {
                self.empty("w:pStyle", &[("w:val", style)])?;
            }
            if props.bottom_border {
                let size = ((self.styling.divider_size * 8.0).round() as u32).max(2);
                self.start("w:pBdr", &[])?;
                self.empty(
                    "w:bottom",
                    &[
                        ("w:val", "single"),
                        ("w:sz", size.to_string().as_str()),
                        ("w:space", "1"),
                        ("w:color", "auto"),
                    ],
                )?;
                self.end("w:pBdr")?;
            }
            if props.shaded {
                let fill = self.styling.code_background.clone();
                self.empty(
                    "w:shd",
                    &[("w:val", "clear"), ("w:color", "auto"), ("w:fill", fill.as_str())],
                )?;
            }
            if props.indent > 0 {
                self.empty("w:ind", &[("w:left", props.indent.to_string().as_str())])?;
            }
            self.end("w:pPr")?;
        }

        for name in std::mem::take(&mut self.bookmarks) {
            let id = self.next_bookmark.to_string();
            self.next_bookmark += 1;
            self.empty("w:bookmarkStart", &[("w:id", id.as_str()), ("w:name", name.as_str())])?;
            self.empty("w:bookmarkEnd", &[("w:id", id.as_str())])?;
        }
        Ok(())
    }

    fn inline_content(&mut self, para: &Paragraph) -> Result<()> {
        for item in &para.content {
            match item {
                InlineContent::Text(run) => self.text_run(run)?,
                InlineContent::LineBreak => {
                    self.start("w:r", &[])?;
                    self.empty("w:br", &[])?;
                    self.end("w:r")?;
                }
                InlineContent::Image(img) => self.image(img)?,
            }
        }
        Ok(())
    }

    fn text_run(&mut self, run: &TextRun) -> Result<()> {
        let Some(url) = run.hyperlink.as_deref() else {
            return self.run(&run.text, &run.style, None);
        };

        if let Some(anchor) = url.strip_prefix('#') {
            self.start("w:hyperlink", &[("w:anchor", anchor), ("w:history", "1")])?;
        } else {
            let rel_id = self.hyperlink_rel(url);
            self.start("w:hyperlink", &[("r:id", rel_id.as_str()), ("w:history", "1")])?;
        }
        self.run(&run.text, &run.style, Some("Hyperlink"))?;
        self.end("w:hyperlink")
    }

    /// Writes one `w:r`; newlines in `text` become `w:br`.
    fn run(&mut self, text: &str, style: &TextStyle, char_style: Option<&str>) -> Result<()> {
        if text.is_empty() {
            return Ok(());
        }
        self.start("w:r", &[])?;

        let size = style.font_size.or(if style.monospace {
            Some(self.styling.code_font_size)
        } else {
            None
        });
        if char_style.is_some() || style.has_formatting() || size.is_some() {
            self.start("w:rPr", &[])?;
            if let Some(name) = char_style {
                self.empty("w:rStyle", &[("w:val", name)])?;
            }
            if style.monospace {
                let font = self.styling.code_font_name.clone();
                self.empty("w:rFonts", &[("w:ascii", font.as_str()), ("w:hAnsi", font.as_str())])?;
            }
            if style.bold {
                self.empty("w:b", &[])?;
            }
            if style.italic {
                self.empty("w:i", &[])?;
            }
            if let Some(size) = size {
                self.empty("w:sz", &[("w:val", half_points(size).as_str())])?;
            }
            if style.underline {
                self.empty("w:u", &[("w:val", "single")])?;
            }
            self.end("w:rPr")?;
        }

        for (i, line) in text.split('\n').enumerate() {
            if i > 0 {
                self.empty("w:br", &[])?;
            }
            if !line.is_empty() {
                self.start("w:t", &[("xml:space", "preserve")])?;
                self.xml.write_event(Event::Text(BytesText::new(line)))?;
                self.end("w:t")?;
            }
        }

        self.end("w:r")
    }

    fn image(&mut self, img: &ImageRef) -> Result<()> {
        let Some(placed) = self.place_image(&img.source) else {
            let alt = format!("[{}]", img.alt_text.as_deref().unwrap_or("image"));
            return self.run(&alt, &TextStyle::italic(), None);
        };

        let cx = (img.width_in * EMU_PER_INCH).round() as u64;
        let cy = cx * placed.height as u64 / placed.width.max(1) as u64;
        let (cx, cy) = (cx.to_string(), cy.to_string());
        let id = self.next_drawing.to_string();
        self.next_drawing += 1;
        let name = format!("Picture {}", id);
        let descr = img.alt_text.clone().unwrap_or_default();

        self.start("w:r", &[])?;
        self.start("w:drawing", &[])?;
        self.start(
            "wp:inline",
            &[("distT", "0"), ("distB", "0"), ("distL", "0"), ("distR", "0")],
        )?;
        self.empty("wp:extent", &[("cx", cx.as_str()), ("cy", cy.as_str())])?;
        self.empty("wp:docPr", &[("id", id.as_str()), ("name", name.as_str()), ("descr", descr.as_str())])?;
        self.start("a:graphic", &[])?;
        self.start("a:graphicData", &[("uri", NS_PIC)])?;
        self.start("pic:pic", &[])?;

        self.start("pic:nvPicPr", &[])?;
        self.empty("pic:cNvPr", &[("id", id.as_str()), ("name", name.as_str())])?;
        self.empty("pic:cNvPicPr", &[])?;
        self.end("pic:nvPicPr")?;

        self.start("pic:blipFill", &[])?;
        self.empty("a:blip", &[("r:embed", placed.rel_id.as_str())])?;
        self.start("a:stretch", &[])?;
        self.empty("a:fillRect", &[])?;
        self.end("a:stretch")?;
        self.end("pic:blipFill")?;

        self.start("pic:spPr", &[])?;
        self.start("a:xfrm", &[])?;
        self.empty("a:off", &[("x", "0"), ("y", "0")])?;
        self.empty("a:ext", &[("cx", cx.as_str()), ("cy", cy.as_str())])?;
        self.end("a:xfrm")?;
        self.start("a:prstGeom", &[("prst", "rect")])?;
        self.empty("a:avLst", &[])?;
        self.end("a:prstGeom")?;
        self.end("pic:spPr")?;

        self.end("pic:pic")?;
        self.end("a:graphicData")?;
        self.end("a:graphic")?;
        self.end("wp:inline")?;
        self.end("w:drawing")?;
        self.end("w:r")
    }

    /// Adds the image bytes as a media part once per source. `None` when the
    /// bytes are missing or not a decodable image.
    fn place_image(&mut self, source: &ImageSource) -> Option<PlacedImage> {
        let key = match source {
            ImageSource::Embedded(id) => id.clone(),
            ImageSource::File(path) => path.display().to_string(),
        };
        if let Some(placed) = self.images.get(&key) {
            return placed.clone();
        }

        let placed = match load_image(self.doc, source) {
            Ok(resource) => match image::load_from_memory(&resource.data) {
                Ok(decoded) => {
                    let (width, height) = decoded.dimensions();
                    let rel_id = self.next_rel_id();
                    let name = resource.content_id();
                    self.rels.push(Relationship {
                        id: rel_id.clone(),
                        kind: REL_IMAGE,
                        target: format!("media/{}", name),
                        external: false,
                    });
                    self.media.push(MediaPart {
                        extension: resource.extension().to_string(),
                        name,
                        data: resource.data,
                    });
                    Some(PlacedImage {
                        rel_id,
                        width,
                        height,
                    })
                }
                Err(e) => {
                    log::warn!("cannot decode image {}: {}", key, e);
                    None
                }
            },
            Err(e) => {
                log::warn!("cannot load image {}: {}", key, e);
                None
            }
        };

        self.images.insert(key, placed.clone());
        placed
    }

    fn hyperlink_rel(&mut self, url: &str) -> String {
        if let Some(id) = self.links.get(url) {
            return id.clone();
        }
        let id = self.next_rel_id();
        self.rels.push(Relationship {
            id: id.clone(),
            kind: REL_HYPERLINK,
            target: url.to_string(),
            external: true,
        });
        self.links.insert(url.to_string(), id.clone());
        id
    }

    fn next_rel_id(&self) -> String {
        format!("rId{}", self.rels.len() + 1)
    }

    fn start(&mut self, name: &str, attrs: &[(&str, &str)]) -> Result<()> {
        let elem = BytesStart::new(name).with_attributes(attrs.iter().copied());
        self.xml.write_event(Event::Start(elem))?;
        Ok(())
    }

    fn empty(&mut self, name: &str, attrs: &[(&str, &str)]) -> Result<()> {
        let elem = BytesStart::new(name).with_attributes(attrs.iter().copied());
        self.xml.write_event(Event::Empty(elem))?;
        Ok(())
    }

    fn end(&mut self, name: &str) -> Result<()> {
        self.xml.write_event(Event::End(BytesEnd::new(name)))?;
        Ok(())
    }
}

fn load_image(doc: &Document, source: &ImageSource) -> Result<Resource> {
    match source {
        ImageSource::Embedded(id) => doc
            .resources
            .get(id)
            .cloned()
            .ok_or_else(|| crate::error::Error::ResourceNotFound(id.clone())),
        ImageSource::File(path) => {
            let data = std::fs::read(path)?;
            let format = image::guess_format(&data)
                .map_err(|e| crate::error::Error::ImageDecode(e.to_string()))?;
            Ok(Resource::image(data, format.to_mime_type()))
        }
    }
}

fn half_points(size: f32) -> String {
    ((size * 2.0).round() as u32).to_string()
}

fn mime_for_extension(ext: &str) -> &'static str {
    match ext {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "tiff" => "image/tiff",
        "webp" => "image/webp",
        _ => "application/octet-stream",
    }
}

const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/>
  <Relationship Id="rId2" Type="http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties" Target="docProps/core.xml"/>
</Relationships>"#;

fn content_types_xml(media: &[MediaPart]) -> String {
    let extensions: BTreeSet<&str> = media.iter().map(|m| m.extension.as_str()).collect();
    let defaults: String = extensions
        .into_iter()
        .map(|ext| {
            format!(
                "\n  <Default Extension=\"{}\" ContentType=\"{}\"/>",
                ext,
                mime_for_extension(ext)
            )
        })
        .collect();

    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
  <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
  <Default Extension="xml" ContentType="application/xml"/>{defaults}
  <Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>
  <Override PartName="/word/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml"/>
  <Override PartName="/docProps/core.xml" ContentType="application/vnd.openxmlformats-package.core-properties+xml"/>
</Types>"#
    )
}

fn document_rels_xml(rels: &[Relationship]) -> String {
    let mut out = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    );
    for rel in rels {
        out.push_str(&format!(
            "\n  <Relationship Id=\"{}\" Type=\"{}\" Target=\"{}\"{}/>",
            rel.id,
            rel.kind,
            escape(rel.target.as_str()),
            if rel.external {
                " TargetMode=\"External\""
            } else {
                ""
            }
        ));
    }
    out.push_str("\n</Relationships>");
    out
}

fn core_xml(document: &Document) -> String {
    let title = document.metadata.title.as_deref().unwrap_or_default();
    let creator = document.metadata.creator_app.as_deref().unwrap_or_default();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dc="http://purl.org/dc/elements/1.1/">
  <dc:title>{}</dc:title>
  <dc:creator>{}</dc:creator>
</cp:coreProperties>"#,
        escape(title),
        escape(creator)
    )
}

fn styles_xml(styling: &Styling) -> String {
    let font = escape(styling.font_name.as_str());
    let mut styles = String::new();

    let title_size = styling.heading(1).size * 1.6;
    styles.push_str(&format!(
        r#"
  <w:style w:type="paragraph" w:styleId="Title">
    <w:name w:val="Title"/><w:basedOn w:val="Normal"/><w:next w:val="Normal"/><w:qFormat/>
    <w:pPr><w:spacing w:after="240"/></w:pPr>
    <w:rPr><w:b/><w:sz w:val="{}"/></w:rPr>
  </w:style>"#,
        half_points(title_size)
    ));

    for level in 1..=6u8 {
        let format = styling.heading(level);
        styles.push_str(&format!(
            r#"
  <w:style w:type="paragraph" w:styleId="Heading{level}">
    <w:name w:val="heading {level}"/><w:basedOn w:val="Normal"/><w:next w:val="Normal"/><w:qFormat/>
    <w:pPr><w:keepNext/><w:spacing w:before="240" w:after="80"/><w:outlineLvl w:val="{outline}"/></w:pPr>
    <w:rPr>{bold}{italic}<w:sz w:val="{size}"/></w:rPr>
  </w:style>"#,
            level = level,
            outline = level - 1,
            bold = if format.bold { "<w:b/>" } else { "" },
            italic = if format.italic { "<w:i/>" } else { "" },
            size = half_points(format.size),
        ));
    }

    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:styles xmlns:w="{ns}">
  <w:docDefaults>
    <w:rPrDefault><w:rPr><w:rFonts w:ascii="{font}" w:hAnsi="{font}" w:cs="{font}"/><w:color w:val="{color}"/><w:sz w:val="{size}"/></w:rPr></w:rPrDefault>
    <w:pPrDefault><w:pPr><w:spacing w:after="120"/></w:pPr></w:pPrDefault>
  </w:docDefaults>
  <w:style w:type="paragraph" w:default="1" w:styleId="Normal">
    <w:name w:val="Normal"/><w:qFormat/>
  </w:style>{styles}
  <w:style w:type="paragraph" w:styleId="Quote">
    <w:name w:val="Quote"/><w:basedOn w:val="Normal"/><w:qFormat/>
    <w:pPr><w:ind w:left="720" w:right="720"/></w:pPr>
    <w:rPr><w:i/></w:rPr>
  </w:style>
  <w:style w:type="paragraph" w:styleId="ListParagraph">
    <w:name w:val="List Paragraph"/><w:basedOn w:val="Normal"/><w:qFormat/>
    <w:pPr><w:spacing w:after="0"/></w:pPr>
  </w:style>
  <w:style w:type="character" w:styleId="Hyperlink">
    <w:name w:val="Hyperlink"/>
    <w:rPr><w:color w:val="{link}"/><w:u w:val="single"/></w:rPr>
  </w:style>
</w:styles>"#,
        ns = NS_W,
        font = font,
        color = escape(styling.text_color.as_str()),
        size = half_points(styling.normal_text_size),
        styles = styles,
        link = escape(styling.hyperlink_color.as_str()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::html::img::tests::PNG_1X1;
    use base64::Engine as _;
    use std::io::Read;

    fn write(doc: &Document) -> Vec<u8> {
        DocxWriter::new(&Styling::default()).write(doc).unwrap()
    }

    fn part(bytes: &[u8], name: &str) -> String {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut file = archive.by_name(name).unwrap();
        let mut text = String::new();
        file.read_to_string(&mut text).unwrap();
        text
    }

    fn png() -> Resource {
        let data = base64::engine::general_purpose::STANDARD
            .decode(PNG_1X1)
            .unwrap();
        Resource::image(data, "image/png")
    }

    #[test]
    fn test_package_parts() {
        let bytes = write(&Document::new());
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes.as_slice())).unwrap();
        for name in [
            "[Content_Types].xml",
            "_rels/.rels",
            "docProps/core.xml",
            "word/document.xml",
            "word/_rels/document.xml.rels",
            "word/styles.xml",
        ] {
            assert!(archive.by_name(name).is_ok(), "missing {}", name);
        }
    }

    #[test]
    fn test_headings_and_formatting() {
        let mut doc = Document::new();
        doc.push(Block::Title("Export".into()));
        doc.push(Block::Heading {
            level: 2,
            text: "Paper".into(),
        });
        let mut para = Paragraph::new();
        para.push_text(TextRun::with_style("bold", TextStyle::bold()));
        para.push_text(TextRun::with_style("meta", TextStyle::small_italic(8.0)));
        para.push_line_break();
        para.push_text(TextRun::new("a < b & c"));
        doc.push_paragraph(para);

        let xml = part(&write(&doc), "word/document.xml");
        assert!(xml.contains(r#"<w:pStyle w:val="Title"/>"#));
        assert!(xml.contains(r#"<w:pStyle w:val="Heading2"/>"#));
        assert!(xml.contains("<w:b/>"));
        assert!(xml.contains(r#"<w:i/><w:sz w:val="16"/>"#));
        assert!(xml.contains("<w:br/>"));
        assert!(xml.contains("a &lt; b &amp; c"));
    }

    #[test]
    fn test_hyperlinks_and_bookmarks() {
        let mut doc = Document::new();
        doc.push(Block::TocEntry {
            anchor: "toc_1".into(),
            text: "Papers".into(),
            level: 1,
        });
        doc.push(Block::Anchor {
            name: "toc_1".into(),
        });
        doc.push_paragraph(Paragraph::text("Papers"));
        let mut para = Paragraph::from_run(TextRun::link("one", "https://example.com/?a=1&b=2"));
        para.push_text(TextRun::link("two", "https://example.com/?a=1&b=2"));
        doc.push_paragraph(para);

        let bytes = write(&doc);
        let xml = part(&bytes, "word/document.xml");
        assert!(xml.contains(r#"<w:hyperlink w:anchor="toc_1" w:history="1">"#));
        assert!(xml.contains(r#"<w:bookmarkStart w:id="0" w:name="toc_1"/><w:bookmarkEnd w:id="0"/>"#));
        assert_eq!(xml.matches(r#"<w:hyperlink r:id="rId2""#).count(), 2);

        let rels = part(&bytes, "word/_rels/document.xml.rels");
        assert!(rels.contains(r#"Target="https://example.com/?a=1&amp;b=2" TargetMode="External""#));
        assert_eq!(rels.matches("hyperlink").count(), 1);
    }

    #[test]
    fn test_trailing_anchor_gets_paragraph() {
        let mut doc = Document::new();
        doc.push(Block::Anchor { name: "end".into() });
        let xml = part(&write(&doc), "word/document.xml");
        assert!(xml.contains(r#"<w:p><w:bookmarkStart w:id="0" w:name="end"/>"#));
    }

    #[test]
    fn test_lists_code_rule_and_break() {
        let mut doc = Document::new();
        for text in ["first", "second"] {
            doc.push(Block::ListItem {
                style: ListStyle::Numbered,
                level: 1,
                starts_list: false,
                paragraph: Paragraph::text(text),
            });
        }
        doc.push(Block::ListItem {
            style: ListStyle::Bullet,
            level: 2,
            starts_list: false,
            paragraph: Paragraph::text("inner"),
        });
        doc.push(Block::CodeBlock {
            text: "fn main() {}\n}".into(),
        });
        doc.push(Block::Rule);
        doc.push(Block::PageBreak);

        let xml = part(&write(&doc), "word/document.xml");
        assert!(xml.contains(">1. <"));
        assert!(xml.contains(">2. <"));
        assert!(xml.contains("\u{2022} "));
        assert!(xml.contains(r#"<w:ind w:left="720"/>"#));
        assert!(xml.contains(r#"w:fill="F0F0F0""#));
        assert!(xml.contains(r#"w:ascii="Courier New""#));
        assert!(xml.contains(r#"<w:bottom w:val="single" w:sz="16" w:space="1" w:color="auto"/>"#));
        assert!(xml.contains(r#"<w:br w:type="page"/>"#));
    }

    #[test]
    fn test_images_are_packaged_once() {
        let mut doc = Document::new();
        let id = doc.add_resource(png());
        doc.push(Block::Image(ImageRef::embedded(id.clone(), 6.0).with_alt("fig")));
        let mut para = Paragraph::text("inline ");
        para.push_image(ImageRef::embedded(id.clone(), 3.0));
        doc.push_paragraph(para);

        let bytes = write(&doc);
        let xml = part(&bytes, "word/document.xml");
        assert_eq!(xml.matches("<w:drawing>").count(), 2);
        assert!(xml.contains(r#"<wp:extent cx="5486400" cy="5486400"/>"#));
        assert!(xml.contains(r#"<wp:extent cx="2743200" cy="2743200"/>"#));
        assert!(xml.contains(r#"descr="fig""#));

        let rels = part(&bytes, "word/_rels/document.xml.rels");
        assert_eq!(rels.matches(&format!("media/{}", id)).count(), 1);
        assert!(part(&bytes, "[Content_Types].xml").contains(r#"Extension="png""#));

        let mut archive = zip::ZipArchive::new(Cursor::new(bytes.as_slice())).unwrap();
        assert!(archive.by_name(&format!("word/media/{}", id)).is_ok());
    }

    #[test]
    fn test_file_image_and_missing_image() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shot.png");
        std::fs::write(&path, png().data).unwrap();

        let mut doc = Document::new();
        doc.push(Block::Image(ImageRef::file(&path, 6.0)));
        doc.push(Block::Image(
            ImageRef::embedded("image-missing.png", 6.0).with_alt("lost"),
        ));

        let xml = part(&write(&doc), "word/document.xml");
        assert_eq!(xml.matches("<w:drawing>").count(), 1);
        assert!(xml.contains("[lost]"));
    }

    #[test]
    fn test_styles_follow_styling() {
        let mut styling = Styling::default();
        styling.font_name = "Georgia".into();
        let styles = styles_xml(&styling);
        assert!(styles.contains(r#"w:ascii="Georgia""#));
        assert!(styles.contains(r#"<w:sz w:val="22"/>"#));
        assert!(styles.contains(r#"w:styleId="Heading6""#));
        assert!(styles.contains(r#"<w:color w:val="0563C1"/>"#));
    }
}
