//! Recognition of primitive inline content.
//!
//! A node is primitive inline content when it is one of a closed set of
//! shapes (text, bare formatting, links, abbreviations, whitelisted spans,
//! line breaks, localized images) and every child is too. Anything else is
//! reported and left out of the output.

use book_logging::book_trace;
use scraper::node::Node;

use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::dom::{self, DomNode};
use crate::exceptions;
use crate::images::is_local_source;
use crate::model::PostRef;

/// Formatting elements accepted with zero attributes.
pub const FORMATTING_TAGS: &[&str] = &["em", "strong", "small", "big", "i", "b"];

/// Exact `style` values accepted on a `<span>`.
pub const SPAN_STYLES: &[&str] = &[
    "text-decoration: underline;",
    "text-decoration: line-through;",
    "text-decoration-line: line-through;",
];

const LINK_ATTRS: &[&str] = &["href", "target", "rel"];
const ABBR_ATTRS: &[&str] = &["title"];
const IMAGE_ATTRS: &[&str] = &["src", "alt", "title"];

/// Upper bound on markup quoted in a warning.
const QUOTE_LIMIT: usize = 160;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InlineShape {
    Text,
    Formatting,
    LineBreak,
    Link,
    Abbreviation,
    StyledSpan,
    LocalImage,
    /// Known word-processor residue, accepted as empty content.
    Debris,
}

impl InlineShape {
    /// Shapes whose children are not inspected.
    pub fn is_leaf(self) -> bool {
        matches!(
            self,
            InlineShape::Text | InlineShape::LineBreak | InlineShape::LocalImage | InlineShape::Debris
        )
    }
}

/// Classifies `node` itself, without looking at its children.
pub fn inline_shape(node: DomNode<'_>) -> Option<InlineShape> {
    let el = match node.value() {
        Node::Text(_) => return Some(InlineShape::Text),
        Node::Element(el) => el,
        _ => return None,
    };
    if exceptions::is_known_debris(&dom::outer_html(node)) {
        return Some(InlineShape::Debris);
    }
    let name = el.name();
    if FORMATTING_TAGS.contains(&name) {
        return dom::has_no_attrs(node).then_some(InlineShape::Formatting);
    }
    match name {
        "br" => (dom::has_no_attrs(node) && !node.has_children()).then_some(InlineShape::LineBreak),
        "a" => dom::attrs_within(node, LINK_ATTRS).then_some(InlineShape::Link),
        "abbr" => dom::attrs_within(node, ABBR_ATTRS).then_some(InlineShape::Abbreviation),
        "span" => is_valid_span(node).then_some(InlineShape::StyledSpan),
        "img" => {
            let local = el.attr("src").is_some_and(|src| is_local_source(src.trim()));
            (local && dom::attrs_within(node, IMAGE_ATTRS)).then_some(InlineShape::LocalImage)
        }
        _ => None,
    }
}

fn is_valid_span(node: DomNode<'_>) -> bool {
    let Some(el) = dom::element(node) else {
        return false;
    };
    let attrs: Vec<(&str, &str)> = el.attrs().collect();
    match attrs.as_slice() {
        [] => true,
        [("style", style)] => SPAN_STYLES.contains(style),
        _ => false,
    }
}

/// True when `node` and its whole subtree are primitive inline content.
/// Comments are ignored wherever they appear below the node.
pub fn is_primitive_inline(node: DomNode<'_>) -> bool {
    match inline_shape(node) {
        Some(shape) if shape.is_leaf() => true,
        Some(_) => node
            .children()
            .filter(|child| !matches!(child.value(), Node::Comment(_)))
            .all(is_primitive_inline),
        None => false,
    }
}

/// Every child of `node` is primitive inline content.
pub fn has_primitive_content(node: DomNode<'_>) -> bool {
    node.children()
        .filter(|child| !matches!(child.value(), Node::Comment(_)))
        .all(is_primitive_inline)
}

pub(crate) fn quote(markup: &str) -> String {
    if markup.chars().count() <= QUOTE_LIMIT {
        return markup.to_string();
    }
    let mut cut: String = markup.chars().take(QUOTE_LIMIT).collect();
    cut.push_str("...");
    cut
}

/// Serializes inline content, keeping only recognized shapes.
///
/// Nodes that fail classification are reported as
/// [`DiagnosticKind::UnrecognizedShape`] and skipped along with their
/// subtree, so the written markup is always within the whitelist.
pub struct InlineWriter<'d> {
    post: PostRef,
    diagnostics: &'d mut Diagnostics,
}

impl<'d> InlineWriter<'d> {
    pub fn new(post: PostRef, diagnostics: &'d mut Diagnostics) -> Self {
        Self { post, diagnostics }
    }

    pub fn post(&self) -> PostRef {
        self.post
    }

    /// Writes the children of `node`, not the node itself.
    pub fn write_children(&mut self, node: DomNode<'_>, out: &mut String) {
        for child in node.children() {
            self.write_node(child, out);
        }
    }

    pub fn write_node(&mut self, node: DomNode<'_>, out: &mut String) {
        let el = match node.value() {
            Node::Text(text) => {
                out.push_str(&dom::escape_text(text));
                return;
            }
            Node::Element(el) => el,
            _ => return,
        };
        match inline_shape(node) {
            Some(InlineShape::Debris) => {
                book_trace!("Known debris in {}: {}", self.post, dom::outer_html(node));
                out.push_str(&dom::escape_text(&dom::text_content(node)));
            }
            Some(InlineShape::LineBreak) => out.push_str("<br/>"),
            Some(InlineShape::LocalImage) => {
                let attrs: Vec<(String, String)> = dom::sorted_attrs(el)
                    .into_iter()
                    .map(|(name, value)| {
                        let value = if name == "src" { value.trim().to_string() } else { value };
                        (name, value)
                    })
                    .collect();
                dom::write_open_tag(out, "img", &attrs);
            }
            Some(_) => {
                dom::write_open_tag(out, el.name(), &dom::sorted_attrs(el));
                self.write_children(node, out);
                dom::write_close_tag(out, el.name());
            }
            None => {
                self.diagnostics.report(
                    DiagnosticKind::UnrecognizedShape,
                    Some(self.post),
                    format!("not primitive inline content: '{}'", quote(&dom::outer_html(node))),
                );
            }
        }
    }

    /// Serialized children of `node` as a string.
    pub fn children_markup(&mut self, node: DomNode<'_>) -> String {
        let mut out = String::new();
        self.write_children(node, &mut out);
        out
    }

    /// Records a finding against the current post.
    pub fn report(&mut self, kind: DiagnosticKind, detail: impl Into<String>) {
        self.diagnostics.report(kind, Some(self.post), detail);
    }
}
