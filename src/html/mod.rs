//! HTML note rendering.
//!
//! Note bodies are parsed with html5ever into an `RcDom` and walked by the
//! [`HtmlRenderer`], which turns them into document blocks. The helpers in
//! this module do plain-text extraction over the same DOM for title
//! derivation and emptiness checks.

mod engine;
pub(crate) mod img;
mod tag;

pub use engine::{Fragment, HtmlRenderer, PendingImage};
pub use img::{classify_src, decode_data_url, ImageSrc};
pub use tag::{InlineStyle, Tag};

use html5ever::driver::ParseOpts;
use html5ever::parse_document;
use html5ever::tendril::TendrilSink;
use html5ever::tree_builder::TreeBuilderOpts;
use markup5ever_rcdom::{Handle, NodeData, RcDom};
use regex::Regex;
use std::sync::LazyLock;

static RE_BR_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<br\s*/?>(?:\s*<br\s*/?>)+").unwrap());

/// Normalizes a note body before rendering: whitespace runs collapse to a
/// single space and consecutive `<br>` tags collapse into one.
pub fn normalize_note_html(html: &str) -> String {
    let collapsed = html.split_whitespace().collect::<Vec<_>>().join(" ");
    RE_BR_RUN.replace_all(&collapsed, "<br>").into_owned()
}

/// Parses an HTML fragment. Never fails: html5ever recovers from any input.
pub(crate) fn parse(html: &str) -> RcDom {
    let opts = ParseOpts {
        tree_builder: TreeBuilderOpts {
            drop_doctype: true,
            ..Default::default()
        },
        ..Default::default()
    };
    parse_document(RcDom::default(), opts).one(html)
}

/// Returns the `<body>` element the parser wraps fragment content in, or the
/// document node if there is none.
pub(crate) fn body(dom: &RcDom) -> Handle {
    find_element(&dom.document, "body").unwrap_or_else(|| dom.document.clone())
}

fn find_element(node: &Handle, tag: &str) -> Option<Handle> {
    if element_name(node).as_deref() == Some(tag) {
        return Some(node.clone());
    }
    node.children
        .borrow()
        .iter()
        .find_map(|child| find_element(child, tag))
}

/// Lowercase local name of an element node.
pub(crate) fn element_name(node: &Handle) -> Option<String> {
    match node.data {
        NodeData::Element { ref name, .. } => Some(name.local.to_ascii_lowercase().to_string()),
        _ => None,
    }
}

/// Value of an attribute on an element node.
pub(crate) fn attribute(node: &Handle, attr: &str) -> Option<String> {
    match node.data {
        NodeData::Element { ref attrs, .. } => attrs
            .borrow()
            .iter()
            .find(|a| a.name.local.as_ref().eq_ignore_ascii_case(attr))
            .map(|a| a.value.to_string()),
        _ => None,
    }
}

/// Concatenated text of all descendant text nodes, whitespace untouched.
pub(crate) fn flatten_text(node: &Handle) -> String {
    let mut out = String::new();
    collect_text(node, &mut out);
    out
}

fn collect_text(node: &Handle, out: &mut String) {
    match node.data {
        NodeData::Text { ref contents } => out.push_str(&contents.borrow()),
        NodeData::Comment { .. } | NodeData::ProcessingInstruction { .. } => {}
        _ => {
            for child in node.children.borrow().iter() {
                collect_text(child, out);
            }
        }
    }
}

/// Non-empty trimmed text lines of a fragment, in document order.
pub fn text_lines(html: &str) -> Vec<String> {
    let dom = parse(html);
    let mut lines = Vec::new();
    collect_lines(&body(&dom), &mut lines);
    lines
}

fn collect_lines(node: &Handle, lines: &mut Vec<String>) {
    match node.data {
        NodeData::Text { ref contents } => {
            let text = contents.borrow();
            lines.extend(
                text.lines()
                    .map(str::trim)
                    .filter(|line| !line.is_empty())
                    .map(String::from),
            );
        }
        NodeData::Comment { .. } | NodeData::ProcessingInstruction { .. } => {}
        _ => {
            for child in node.children.borrow().iter() {
                collect_lines(child, lines);
            }
        }
    }
}

/// Title text from the highest-ranked heading: every `h1` is tried before
/// any `h2`, and so on down to `h6`. Headings with empty trimmed text are
/// skipped.
pub fn first_heading_text(html: &str) -> Option<String> {
    let dom = parse(html);
    let root = body(&dom);
    (1..=6).find_map(|level| first_heading(&root, level))
}

fn first_heading(node: &Handle, level: u8) -> Option<String> {
    if element_name(node).map(|name| Tag::from_name(&name)) == Some(Tag::Heading(level)) {
        let text = flatten_text(node).trim().to_string();
        if !text.is_empty() {
            return Some(text);
        }
        return None;
    }
    node.children
        .borrow()
        .iter()
        .find_map(|child| first_heading(child, level))
}
