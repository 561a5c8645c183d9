//! Closed set of tags the renderer understands.

/// Inline formatting applied to an element's flattened text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InlineStyle {
    Bold,
    Italic,
    Underline,
    Code,
}

/// An HTML element kind. Anything not listed maps to [`Tag::Unknown`],
/// which the renderer treats as transparent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
    /// `p` and `div`
    Paragraph,
    /// `h1`..`h6`
    Heading(u8),
    UnorderedList,
    OrderedList,
    ListItem,
    Preformatted,
    Rule,
    Blockquote,
    Image,
    LineBreak,
    Inline(InlineStyle),
    Link,
    Unknown,
}

impl Tag {
    /// Maps an element name (any case) to its tag kind.
    pub fn from_name(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "p" | "div" => Tag::Paragraph,
            "h1" => Tag::Heading(1),
            "h2" => Tag::Heading(2),
            "h3" => Tag::Heading(3),
            "h4" => Tag::Heading(4),
            "h5" => Tag::Heading(5),
            "h6" => Tag::Heading(6),
            "ul" => Tag::UnorderedList,
            "ol" => Tag::OrderedList,
            "li" => Tag::ListItem,
            "pre" => Tag::Preformatted,
            "hr" => Tag::Rule,
            "blockquote" => Tag::Blockquote,
            "img" => Tag::Image,
            "br" => Tag::LineBreak,
            "strong" | "b" => Tag::Inline(InlineStyle::Bold),
            "em" | "i" => Tag::Inline(InlineStyle::Italic),
            "u" => Tag::Inline(InlineStyle::Underline),
            "code" => Tag::Inline(InlineStyle::Code),
            "a" => Tag::Link,
            _ => Tag::Unknown,
        }
    }

    /// Tags that emit blocks of their own. Inline content following one of
    /// them must not land in a container opened before it.
    pub fn is_block(self) -> bool {
        matches!(
            self,
            Tag::Paragraph
                | Tag::Heading(_)
                | Tag::UnorderedList
                | Tag::OrderedList
                | Tag::ListItem
                | Tag::Preformatted
                | Tag::Rule
                | Tag::Blockquote
        )
    }
}
