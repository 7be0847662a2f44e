//! Rich-text post content.
//!
//! Post bodies are HTML fragments produced by a browser-side editor. This module
//! only reads them (plain text for search and terminal display) and exposes a
//! narrow editor interface; it does not implement an editing surface.

use std::fmt;

use scraper::{Html, Node};

/// Elements that separate words when flattened to text.
const BLOCK_TAGS: &[&str] = &[
    "p", "div", "br", "li", "ul", "ol", "h1", "h2", "h3", "h4", "h5", "h6", "blockquote",
];

/// Inline formatting commands supported by the editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InlineStyle {
    Bold,
    Italic,
    Underline,
}

impl InlineStyle {
    fn tag(self) -> &'static str {
        match self {
            InlineStyle::Bold => "b",
            InlineStyle::Italic => "i",
            InlineStyle::Underline => "u",
        }
    }
}

impl fmt::Display for InlineStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            InlineStyle::Bold => "bold",
            InlineStyle::Italic => "italic",
            InlineStyle::Underline => "underline",
        };
        f.write_str(name)
    }
}

/// A text-editing widget that stores its value as markup.
pub trait TextEditor {
    fn html(&self) -> &str;
    fn set_html(&mut self, html: String);
    fn apply(&mut self, style: InlineStyle);
}

/// Editor without a selection model: styles apply to the whole buffer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MarkupBuffer {
    html: String,
}

impl MarkupBuffer {
    pub fn new(html: impl Into<String>) -> Self {
        Self { html: html.into() }
    }

    pub fn into_html(self) -> String {
        self.html
    }
}

impl TextEditor for MarkupBuffer {
    fn html(&self) -> &str {
        &self.html
    }

    fn set_html(&mut self, html: String) {
        self.html = html;
    }

    /// Wraps the buffer in the style's tag, or unwraps it if already wrapped.
    fn apply(&mut self, style: InlineStyle) {
        let tag = style.tag();
        let open = format!("<{tag}>");
        let close = format!("</{tag}>");
        if let Some(inner) = self
            .html
            .strip_prefix(&open)
            .and_then(|rest| rest.strip_suffix(&close))
        {
            self.html = inner.to_string();
        } else {
            self.html = format!("{open}{}{close}", self.html);
        }
    }
}

/// Text content of a markup fragment with entities decoded and whitespace
/// collapsed to single spaces.
pub fn plain_text(markup: &str) -> String {
    if !markup.contains('<') && !markup.contains('&') {
        return collapse_whitespace(markup);
    }
    let fragment = Html::parse_fragment(markup);
    let mut raw = String::with_capacity(markup.len());
    for node in fragment.root_element().descendants() {
        match node.value() {
            Node::Text(text) => raw.push_str(text),
            Node::Element(element) if BLOCK_TAGS.contains(&element.name()) => raw.push(' '),
            _ => {}
        }
    }
    collapse_whitespace(&raw)
}

/// True when the markup has no visible text.
pub fn is_blank(markup: &str) -> bool {
    plain_text(markup).is_empty()
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_strips_tags_and_decodes_entities() {
        assert_eq!(
            plain_text("<p>Fish &amp; <b>chips</b></p><p>tonight</p>"),
            "Fish & chips tonight"
        );
    }

    #[test]
    fn test_plain_text_keeps_inline_words_together() {
        assert_eq!(plain_text("hel<b>lo</b> world"), "hello world");
    }

    #[test]
    fn test_plain_text_passthrough() {
        assert_eq!(plain_text("  just\ntext  "), "just text");
    }

    #[test]
    fn test_is_blank_on_empty_markup() {
        assert!(is_blank("<p><br></p>"));
        assert!(is_blank(""));
        assert!(!is_blank("<p>x</p>"));
    }

    #[test]
    fn test_apply_toggles_style() {
        let mut buffer = MarkupBuffer::new("hello");
        buffer.apply(InlineStyle::Bold);
        assert_eq!(buffer.html(), "<b>hello</b>");
        buffer.apply(InlineStyle::Italic);
        assert_eq!(buffer.html(), "<i><b>hello</b></i>");
        buffer.apply(InlineStyle::Italic);
        assert_eq!(buffer.html(), "<b>hello</b>");
    }

    #[test]
    fn test_set_html_replaces_content() {
        let mut buffer = MarkupBuffer::default();
        buffer.set_html("<u>x</u>".to_string());
        assert_eq!(plain_text(buffer.html()), "x");
        assert_eq!(buffer.into_html(), "<u>x</u>");
    }
}
