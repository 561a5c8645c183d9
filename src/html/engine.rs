//! HTML to document block renderer.
//!
//! The renderer walks the parsed DOM recursively. Two pieces of state travel
//! down the recursion explicitly:
//!
//! - the *container*: index of the open paragraph-like block that inline
//!   content is appended to, or `None` when the next content must open a new
//!   block;
//! - the *list context*: active list style and nesting depth.
//!
//! Each child node is handled inside its own error boundary, so a failure in
//! one subtree is recorded as a warning and its siblings still render.

use super::img::{classify_src, decode_data_url, ImageSrc};
use super::tag::{InlineStyle, Tag};
use super::{attribute, body, element_name, flatten_text, normalize_note_html, parse};
use crate::config::ExportConfig;
use crate::error::{Error, Result};
use crate::model::{
    Block, Document, ImageRef, ListStyle, Paragraph, ParagraphStyle, Resource, TextRun,
    TextStyle,
};
use markup5ever_rcdom::{Handle, NodeData};
use std::collections::BTreeMap;

/// Deepest element nesting the renderer descends into.
const MAX_NESTING: usize = 256;

/// Alt text used when an `<img>` has none.
const DEFAULT_ALT: &str = "image";

/// Index of the open container block in the fragment output.
type Container = Option<usize>;

/// Output of rendering one HTML fragment.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fragment {
    /// Blocks in document order
    pub blocks: Vec<Block>,
    /// Images decoded from data URLs, keyed by content ID
    pub resources: BTreeMap<String, Resource>,
    /// Remote images waiting to be downloaded by the caller
    pub pending_images: Vec<PendingImage>,
    /// Non-fatal problems met while rendering
    pub warnings: Vec<String>,
}

impl Fragment {
    /// Returns true if nothing was rendered.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Wraps the fragment in a standalone document.
    pub fn into_document(self) -> Document {
        let mut doc = Document::new();
        doc.blocks = self.blocks;
        doc.resources = self.resources;
        doc
    }
}

/// A remote `<img>` the renderer could not fetch itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingImage {
    pub url: String,
    pub alt: String,
    /// Index of the block holding the placeholder text
    pub block: usize,
}

/// Active list style and nesting depth.
#[derive(Debug, Clone, Copy, Default)]
struct ListContext {
    style: Option<ListStyle>,
    depth: u8,
    first_item: bool,
}

impl ListContext {
    fn nested(self, style: ListStyle) -> Result<Self> {
        let depth = self
            .depth
            .checked_add(1)
            .ok_or_else(|| Error::InvalidData("list nesting too deep".into()))?;
        Ok(Self {
            style: Some(style),
            depth,
            first_item: true,
        })
    }
}

/// Converts HTML note bodies into document blocks.
#[derive(Debug, Clone)]
pub struct HtmlRenderer {
    inline_image_width: f32,
    download_remote_images: bool,
}

impl HtmlRenderer {
    /// Creates a renderer configured from the export settings.
    pub fn new(config: &ExportConfig) -> Self {
        Self {
            inline_image_width: config.inline_image_width(),
            download_remote_images: config.enable_images && config.download_note_images,
        }
    }

    /// Renders a note body: normalizes whitespace, then renders.
    pub fn render_note(&self, html: &str) -> Fragment {
        self.render(&normalize_note_html(html))
    }

    /// Renders an HTML fragment. Accepts any input; malformed markup degrades
    /// to best-effort text.
    pub fn render(&self, html: &str) -> Fragment {
        let dom = parse(html);
        let mut walker = Walker {
            renderer: self,
            out: Fragment::default(),
            nesting: 0,
        };
        walker.walk_children(&body(&dom), None, ListContext::default());
        walker.out
    }
}

/// `Some(true)` for block elements, `Some(false)` for text and inline
/// elements, `None` for nodes without content.
fn node_kind(node: &Handle) -> Option<bool> {
    match node.data {
        NodeData::Text { .. } => Some(false),
        NodeData::Element { ref name, .. } => Some(Tag::from_name(&name.local).is_block()),
        _ => None,
    }
}

/// Per-call traversal state.
struct Walker<'a> {
    renderer: &'a HtmlRenderer,
    out: Fragment,
    nesting: usize,
}

impl Walker<'_> {
    /// Walks every child of `node`, isolating failures per child.
    ///
    /// A block-level child closes the open container; inline content after
    /// it goes into a fresh paragraph so output stays in document order.
    fn walk_children(&mut self, node: &Handle, container: Container, list: ListContext) {
        let children = node.children.borrow();
        let mut current = container;
        for child in children.iter() {
            let kind = node_kind(child);
            if container.is_some() && current.is_none() && kind == Some(false) {
                current = Some(self.open(Block::Paragraph(Paragraph::new())));
            }
            self.walk_guarded(child, current, list);
            if kind == Some(true) {
                current = None;
            }
        }
    }

    fn walk_guarded(&mut self, node: &Handle, container: Container, list: ListContext) {
        if let Err(e) = self.walk(node, container, list) {
            let what = element_name(node).unwrap_or_else(|| "#text".to_string());
            self.warn(format!("skipped <{}>: {}", what, e));
        }
    }

    fn walk(&mut self, node: &Handle, container: Container, list: ListContext) -> Result<()> {
        if self.nesting >= MAX_NESTING {
            return Err(Error::InvalidData(format!(
                "markup nested deeper than {} levels",
                MAX_NESTING
            )));
        }
        self.nesting += 1;
        let result = self.dispatch(node, container, list);
        self.nesting -= 1;
        result
    }

    fn dispatch(&mut self, node: &Handle, container: Container, list: ListContext) -> Result<()> {
        let name = match node.data {
            NodeData::Text { ref contents } => {
                let text = contents.borrow().to_string();
                self.text(&text, container);
                return Ok(());
            }
            NodeData::Element { ref name, .. } => name.local.to_string(),
            // Comments, doctypes and processing instructions carry no content
            _ => return Ok(()),
        };

        match Tag::from_name(&name) {
            Tag::Paragraph => {
                let para = self.open(Block::Paragraph(Paragraph::new()));
                self.walk_children(node, Some(para), list);
            }
            Tag::Heading(level) => {
                let text = flatten_text(node).trim().to_string();
                self.out.blocks.push(Block::Heading { level, text });
            }
            Tag::UnorderedList => self.list(node, list.nested(ListStyle::Bullet)?),
            Tag::OrderedList => self.list(node, list.nested(ListStyle::Numbered)?),
            Tag::ListItem => {
                let style = list.style.unwrap_or(ListStyle::Continuation);
                let indent = list.depth.saturating_sub(1);
                let item = self.open(Block::ListItem {
                    style,
                    level: list.depth,
                    starts_list: list.first_item,
                    paragraph: Paragraph::with_style(ParagraphStyle::indented(indent)),
                });
                self.walk_children(node, Some(item), list);
            }
            Tag::Preformatted => {
                self.out.blocks.push(Block::CodeBlock {
                    text: flatten_text(node),
                });
            }
            Tag::Rule => self.out.blocks.push(Block::Rule),
            Tag::Blockquote => {
                let quote = self.open(Block::Quote(Paragraph::new()));
                self.walk_children(node, Some(quote), list);
            }
            Tag::Image => self.image(node, container)?,
            Tag::LineBreak => {
                if let Some(idx) = container {
                    self.paragraph(idx)?.push_line_break();
                }
            }
            Tag::Inline(style) => {
                if let Some(idx) = container {
                    let text = flatten_text(node);
                    if !text.is_empty() {
                        self.paragraph(idx)?
                            .push_text(TextRun::with_style(text, inline_style(style)));
                    }
                }
            }
            Tag::Link => {
                if let Some(idx) = container {
                    let href = attribute(node, "href").unwrap_or_default();
                    if !href.is_empty() {
                        let text = flatten_text(node).trim().to_string();
                        let text = if text.is_empty() { href.clone() } else { text };
                        self.paragraph(idx)?.push_text(TextRun::link(text, href));
                    }
                }
            }
            Tag::Unknown => {
                let target = match container {
                    Some(idx) => idx,
                    None => self.open(Block::Paragraph(Paragraph::new())),
                };
                self.walk_children(node, Some(target), list);
            }
        }
        Ok(())
    }

    /// Renders the direct `li` children of a list; nested lists are reached
    /// through their own item's children.
    fn list(&mut self, node: &Handle, mut list: ListContext) {
        let children = node.children.borrow();
        for child in children.iter() {
            if element_name(child).as_deref() == Some("li") {
                self.walk_guarded(child, None, list);
                list.first_item = false;
            }
        }
    }

    fn text(&mut self, text: &str, container: Container) {
        if text.is_empty() {
            return;
        }
        match container.and_then(|idx| self.out.blocks.get_mut(idx)?.paragraph_mut()) {
            Some(para) => para.push_text(TextRun::new(text)),
            None => self.out.blocks.push(Block::Paragraph(Paragraph::text(text))),
        }
    }

    fn image(&mut self, node: &Handle, container: Container) -> Result<()> {
        let src = attribute(node, "src").unwrap_or_default();
        let alt = attribute(node, "alt").unwrap_or_else(|| DEFAULT_ALT.to_string());

        match classify_src(&src) {
            ImageSrc::DataUrl(data) => match decode_data_url(data) {
                Ok(resource) => {
                    let id = resource.content_id();
                    self.out.resources.entry(id.clone()).or_insert(resource);
                    let image =
                        ImageRef::embedded(id, self.renderer.inline_image_width).with_alt(&alt);
                    match container {
                        Some(idx) => self.paragraph(idx)?.push_image(image),
                        None => self.out.blocks.push(Block::Image(image)),
                    }
                    return Ok(());
                }
                Err(e) => {
                    self.warn(format!("could not embed base64 image '{}': {}", alt, e));
                    if container.is_none() {
                        self.placeholder(format!("[Image: {}]", alt), None)?;
                    }
                }
            },
            ImageSrc::Remote(url) => {
                if self.renderer.download_remote_images {
                    let text = format!("[Image: {} at {}]", alt, url);
                    let block = self.placeholder(text, container)?;
                    self.out.pending_images.push(PendingImage {
                        url: url.to_string(),
                        alt,
                        block,
                    });
                    return Ok(());
                }
                self.placeholder(format!("[Image link: {}] ({})", url, alt), container)?;
            }
            ImageSrc::Local(path) => {
                self.placeholder(format!("[Image src: {}] ({})", path, alt), container)?;
            }
            ImageSrc::Empty => {}
        }

        if let Some(idx) = container {
            self.paragraph(idx)?
                .push_text(TextRun::new(format!(" [Image: {}] ", alt)));
        }
        Ok(())
    }

    /// Emits placeholder text into the open container, or as its own
    /// paragraph. Returns the index of the block that received it.
    fn placeholder(&mut self, text: String, container: Container) -> Result<usize> {
        match container {
            Some(idx) => {
                self.paragraph(idx)?.push_text(TextRun::new(text));
                Ok(idx)
            }
            None => Ok(self.open(Block::Paragraph(Paragraph::text(text)))),
        }
    }

    /// Pushes a container block and returns its index.
    fn open(&mut self, block: Block) -> usize {
        self.out.blocks.push(block);
        self.out.blocks.len() - 1
    }

    fn paragraph(&mut self, idx: usize) -> Result<&mut Paragraph> {
        self.out
            .blocks
            .get_mut(idx)
            .and_then(Block::paragraph_mut)
            .ok_or_else(|| Error::InvalidData(format!("block {} is not a container", idx)))
    }

    fn warn(&mut self, message: String) {
        log::warn!("{}", message);
        self.out.warnings.push(message);
    }
}

fn inline_style(style: InlineStyle) -> TextStyle {
    match style {
        InlineStyle::Bold => TextStyle::bold(),
        InlineStyle::Italic => TextStyle::italic(),
        InlineStyle::Underline => TextStyle::underline(),
        InlineStyle::Code => TextStyle::monospace(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::html::img::tests::PNG_1X1;
    use crate::model::{ImageSource, InlineContent};

    fn renderer() -> HtmlRenderer {
        HtmlRenderer::new(&ExportConfig::default())
    }

    fn runs(block: &Block) -> Vec<&TextRun> {
        block.paragraph().expect("container block").runs().collect()
    }

    fn count_images(fragment: &Fragment) -> usize {
        fragment
            .blocks
            .iter()
            .map(|b| match b {
                Block::Image(_) => 1,
                other => other
                    .paragraph()
                    .map(|p| {
                        p.content
                            .iter()
                            .filter(|c| matches!(c, InlineContent::Image(_)))
                            .count()
                    })
                    .unwrap_or(0),
            })
            .sum()
    }

    #[test]
    fn test_one_block_per_top_level_tag() {
        let fragment = renderer().render("<p>one</p><div>two</div><h1>three</h1><h6>four</h6>");
        assert_eq!(fragment.blocks.len(), 4);
        assert_eq!(fragment.blocks[0], Block::Paragraph(Paragraph::text("one")));
        assert_eq!(fragment.blocks[1], Block::Paragraph(Paragraph::text("two")));
        assert_eq!(
            fragment.blocks[2],
            Block::Heading {
                level: 1,
                text: "three".into()
            }
        );
        assert_eq!(
            fragment.blocks[3],
            Block::Heading {
                level: 6,
                text: "four".into()
            }
        );
        assert!(fragment.warnings.is_empty());
    }

    #[test]
    fn test_heading_closes_open_paragraph() {
        let fragment = renderer().render("<div>before<h2>Sec</h2>after <b>bold</b></div>");
        assert_eq!(fragment.blocks.len(), 3);
        assert_eq!(fragment.blocks[0].plain_text().as_deref(), Some("before"));
        assert_eq!(
            fragment.blocks[1],
            Block::Heading {
                level: 2,
                text: "Sec".into()
            }
        );
        // Inline content after the heading is kept, in a new paragraph
        assert_eq!(fragment.blocks[2].plain_text().as_deref(), Some("after bold"));
    }

    #[test]
    fn test_rule_and_pre_close_open_paragraph() {
        let fragment = renderer().render("<div>one<hr>two</div>");
        assert_eq!(fragment.blocks.len(), 3);
        assert_eq!(fragment.blocks[0].plain_text().as_deref(), Some("one"));
        assert_eq!(fragment.blocks[1], Block::Rule);
        assert_eq!(fragment.blocks[2].plain_text().as_deref(), Some("two"));

        let fragment = renderer().render("<div>x<pre>code</pre>y</div>");
        let texts: Vec<_> = fragment.blocks.iter().map(|b| b.plain_text()).collect();
        assert_eq!(
            texts,
            vec![Some("x".to_string()), Some("code".to_string()), Some("y".to_string())]
        );
    }

    #[test]
    fn test_heading_text_is_flattened() {
        let fragment = renderer().render("<h2> A <b>bold</b> <i>move</i> </h2>");
        assert_eq!(
            fragment.blocks,
            vec![Block::Heading {
                level: 2,
                text: "A bold move".into()
            }]
        );
    }

    #[test]
    fn test_nested_lists() {
        let fragment = renderer().render("<ul><li>a<ul><li>b</li></ul></li></ul>");
        assert_eq!(fragment.blocks.len(), 2);

        let (a_level, a_indent) = match &fragment.blocks[0] {
            Block::ListItem {
                style,
                level,
                paragraph,
                ..
            } => {
                assert_eq!(*style, ListStyle::Bullet);
                assert_eq!(paragraph.plain_text(), "a");
                (*level, paragraph.style.indent_level)
            }
            other => panic!("expected list item, got {:?}", other),
        };
        let (b_level, b_indent) = match &fragment.blocks[1] {
            Block::ListItem {
                level, paragraph, ..
            } => {
                assert_eq!(paragraph.plain_text(), "b");
                (*level, paragraph.style.indent_level)
            }
            other => panic!("expected list item, got {:?}", other),
        };

        assert_eq!(a_level, 1);
        assert_eq!(b_level, 2);
        assert!(b_indent > a_indent);
    }

    #[test]
    fn test_ordered_list_items() {
        let fragment = renderer().render("<ol><li>x</li><li>y</li></ol>");
        assert_eq!(fragment.blocks.len(), 2);
        for block in &fragment.blocks {
            assert!(matches!(
                block,
                Block::ListItem {
                    style: ListStyle::Numbered,
                    level: 1,
                    ..
                }
            ));
        }
    }

    #[test]
    fn test_adjacent_lists_mark_their_first_items() {
        let fragment = renderer().render("<ol><li>a</li><li>b</li></ol><ol><li>c</li></ol>");
        let starts: Vec<_> = fragment
            .blocks
            .iter()
            .map(|b| matches!(b, Block::ListItem { starts_list: true, .. }))
            .collect();
        assert_eq!(starts, vec![true, false, true]);
    }

    #[test]
    fn test_bare_list_item_falls_back_to_continuation() {
        let fragment = renderer().render("<li>loose</li>");
        assert_eq!(fragment.blocks.len(), 1);
        match &fragment.blocks[0] {
            Block::ListItem {
                style, paragraph, ..
            } => {
                assert_eq!(*style, ListStyle::Continuation);
                assert_eq!(paragraph.plain_text(), "loose");
            }
            other => panic!("expected list item, got {:?}", other),
        }
    }

    #[test]
    fn test_inline_formatting_runs() {
        let fragment = renderer().render("<p>Hello <b>World</b><i>it</i><u>un</u><code>c</code></p>");
        assert_eq!(fragment.blocks.len(), 1);
        let runs = runs(&fragment.blocks[0]);
        assert_eq!(runs.len(), 5);
        assert_eq!(runs[0].text, "Hello ");
        assert!(!runs[0].style.has_formatting());
        assert!(runs[1].style.bold && runs[1].text == "World");
        assert!(runs[2].style.italic);
        assert!(runs[3].style.underline);
        assert!(runs[4].style.monospace);
    }

    #[test]
    fn test_inline_without_container_is_dropped() {
        // A bare <b> at top level opens nothing; only the text node renders
        let fragment = renderer().render("<b>lost</b>after");
        assert_eq!(fragment.blocks, vec![Block::Paragraph(Paragraph::text("after"))]);
    }

    #[test]
    fn test_links() {
        let fragment = renderer().render(
            r#"<p><a href="https://a.example">site</a><a href="https://b.example"> </a><a>no href</a></p>"#,
        );
        let runs = runs(&fragment.blocks[0]);
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].text, "site");
        assert_eq!(runs[0].hyperlink.as_deref(), Some("https://a.example"));
        // Empty link text falls back to the href
        assert_eq!(runs[1].text, "https://b.example");
    }

    #[test]
    fn test_line_breaks() {
        let fragment = renderer().render("<p>a<br>b</p><br>");
        assert_eq!(fragment.blocks.len(), 1);
        let para = fragment.blocks[0].paragraph().unwrap();
        assert_eq!(para.content[1], InlineContent::LineBreak);
        assert_eq!(para.plain_text(), "a\nb");
    }

    #[test]
    fn test_pre_preserves_whitespace() {
        let fragment = renderer().render("<pre>fn main() {\n    run();\n}</pre>");
        assert_eq!(
            fragment.blocks,
            vec![Block::CodeBlock {
                text: "fn main() {\n    run();\n}".into()
            }]
        );
    }

    #[test]
    fn test_rule_and_quote() {
        let fragment = renderer().render("<hr><blockquote>wise <em>words</em></blockquote>");
        assert_eq!(fragment.blocks[0], Block::Rule);
        match &fragment.blocks[1] {
            Block::Quote(p) => assert_eq!(p.plain_text(), "wise words"),
            other => panic!("expected quote, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_tags_are_transparent() {
        let fragment = renderer().render("<section><span>in</span> <mark>side</mark></section>");
        assert_eq!(fragment.blocks.len(), 1);
        assert_eq!(fragment.blocks[0].plain_text().as_deref(), Some("in side"));

        // Inside an open container the unknown tag adds no block of its own
        let fragment = renderer().render("<p>a <span>b</span></p>");
        assert_eq!(fragment.blocks.len(), 1);
        assert_eq!(fragment.blocks[0].plain_text().as_deref(), Some("a b"));
    }

    #[test]
    fn test_base64_image_embeds() {
        let html = format!(r#"<img src="data:image/png;base64,{}" alt="dot">"#, PNG_1X1);
        let fragment = renderer().render(&html);

        assert_eq!(count_images(&fragment), 1);
        assert_eq!(fragment.resources.len(), 1);
        assert!(fragment.warnings.is_empty());
        // No textual placeholder anywhere
        assert!(fragment.blocks.iter().all(|b| b.paragraph().is_none()));
        match &fragment.blocks[0] {
            Block::Image(image) => {
                assert!(matches!(image.source, ImageSource::Embedded(_)));
                assert_eq!(image.width_in, 3.0);
                assert_eq!(image.alt_text.as_deref(), Some("dot"));
            }
            other => panic!("expected image, got {:?}", other),
        }
    }

    #[test]
    fn test_base64_image_inside_paragraph_is_inline() {
        let html = format!(r#"<p>see <img src="data:image/png;base64,{}"></p>"#, PNG_1X1);
        let fragment = renderer().render(&html);
        assert_eq!(fragment.blocks.len(), 1);
        assert_eq!(count_images(&fragment), 1);
        assert_eq!(runs(&fragment.blocks[0]).len(), 1);
    }

    #[test]
    fn test_corrupt_base64_image_becomes_placeholder() {
        let fragment = renderer().render(r#"<p><img src="data:image/png;base64,@@@@" alt="fig"></p>"#);
        assert_eq!(count_images(&fragment), 0);
        assert!(fragment.resources.is_empty());
        assert_eq!(fragment.warnings.len(), 1);

        let runs = runs(&fragment.blocks[0]);
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].text, " [Image: fig] ");

        // Without a container the placeholder gets its own paragraph
        let fragment = renderer().render(r#"<img src="data:image/png;base64,@@@@" alt="fig">"#);
        assert_eq!(count_images(&fragment), 0);
        assert_eq!(fragment.blocks, vec![Block::Paragraph(Paragraph::text("[Image: fig]"))]);
    }

    #[test]
    fn test_remote_image_placeholder() {
        let fragment = renderer().render(r#"<p><img src="https://x.example/a.png" alt="chart"></p>"#);
        let texts: Vec<_> = runs(&fragment.blocks[0]).iter().map(|r| r.text.clone()).collect();
        assert_eq!(
            texts,
            vec!["[Image link: https://x.example/a.png] (chart)", " [Image: chart] "]
        );
        assert!(fragment.pending_images.is_empty());
    }

    #[test]
    fn test_remote_image_pending_download() {
        let config = ExportConfig::default().with_note_image_downloads(true);
        let fragment = HtmlRenderer::new(&config).render(r#"<img src="https://x.example/a.png">"#);
        assert_eq!(
            fragment.blocks,
            vec![Block::Paragraph(Paragraph::text(
                "[Image: image at https://x.example/a.png]"
            ))]
        );
        assert_eq!(
            fragment.pending_images,
            vec![PendingImage {
                url: "https://x.example/a.png".into(),
                alt: "image".into(),
                block: 0,
            }]
        );
    }

    #[test]
    fn test_local_image_placeholder() {
        let fragment = renderer().render(r#"<img src="figures/f1.png" alt="f1">"#);
        assert_eq!(
            fragment.blocks,
            vec![Block::Paragraph(Paragraph::text("[Image src: figures/f1.png] (f1)"))]
        );
    }

    #[test]
    fn test_whitespace_text_still_renders() {
        let fragment = renderer().render("<p>a</p> <p>b</p>");
        assert_eq!(fragment.blocks.len(), 3);
        assert_eq!(fragment.blocks[1], Block::Paragraph(Paragraph::text(" ")));
    }

    #[test]
    fn test_malformed_markup_does_not_panic() {
        let inputs = [
            "",
            "<",
            "<p><b>unclosed",
            "</div></p>stray closers",
            "<ul><li>one<li>two</ul></li>",
            "<img>",
            "<a href=>x</a>",
            "<<<>>>",
            "<table><tr><td>cell</td></tr></table>",
        ];
        for input in inputs {
            let _ = renderer().render(input);
        }
    }

    #[test]
    fn test_deep_nesting_is_cut_off_with_warning() {
        let html = format!("{}deep{}", "<span>".repeat(400), "</span>".repeat(400));
        let fragment = renderer().render(&html);
        assert!(!fragment.warnings.is_empty());
    }

    #[test]
    fn test_render_is_idempotent() {
        let html = format!(
            r#"<h1>T</h1><p>x <b>y</b><img src="data:image/png;base64,{}"></p><ol><li>z</li></ol>"#,
            PNG_1X1
        );
        let r = renderer();
        assert_eq!(r.render(&html), r.render(&html));
    }

    #[test]
    fn test_render_note_normalizes() {
        let fragment = renderer().render_note("<p>a\n\n   b<br><br><br>c</p>");
        let para = fragment.blocks[0].paragraph().unwrap();
        assert_eq!(para.plain_text(), "a b\nc");
    }

    #[test]
    fn test_paragraph_inside_list_item_keeps_list_context() {
        let fragment = renderer().render("<ul><li><p>para</p><ol><li>inner</li></ol></li></ul>");
        assert_eq!(fragment.blocks.len(), 3);
        assert!(matches!(fragment.blocks[1], Block::Paragraph(_)));
        assert!(matches!(
            fragment.blocks[2],
            Block::ListItem {
                style: ListStyle::Numbered,
                level: 2,
                ..
            }
        ));
    }
}
