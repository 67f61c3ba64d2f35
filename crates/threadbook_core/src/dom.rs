//! Thin helpers over the `scraper` DOM plus a small XHTML-friendly serializer.

use ego_tree::NodeRef;
use scraper::node::{Element, Node};
use scraper::Html;

pub type DomNode<'a> = NodeRef<'a, Node>;

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// Parses a post body as an HTML fragment. Line endings are removed first,
/// matching how the corpus authors' editors wrapped their markup.
pub fn parse_content(html: &str) -> Html {
    let flattened: String = html.chars().filter(|c| *c != '\r' && *c != '\n').collect();
    Html::parse_fragment(&flattened)
}

pub fn element(node: DomNode<'_>) -> Option<&Element> {
    match node.value() {
        Node::Element(el) => Some(el),
        _ => None,
    }
}

/// Tag name if the node is an element.
pub fn tag(node: DomNode<'_>) -> Option<&str> {
    element(node).map(Element::name)
}

pub fn is_tag(node: DomNode<'_>, name: &str) -> bool {
    tag(node) == Some(name)
}

pub fn text(node: DomNode<'_>) -> Option<&str> {
    match node.value() {
        Node::Text(t) => Some(&**t),
        _ => None,
    }
}

pub fn is_blank_text(node: DomNode<'_>) -> bool {
    text(node).is_some_and(|t| t.trim().is_empty())
}

pub fn attr_count(node: DomNode<'_>) -> usize {
    element(node).map_or(0, |el| el.attrs().count())
}

pub fn has_no_attrs(node: DomNode<'_>) -> bool {
    attr_count(node) == 0
}

/// Attribute names are all drawn from `allowed`.
pub fn attrs_within(node: DomNode<'_>, allowed: &[&str]) -> bool {
    element(node).is_some_and(|el| el.attrs().all(|(name, _)| allowed.contains(&name)))
}

/// Children that carry content: whitespace-only text and comments are skipped.
pub fn significant_children(node: DomNode<'_>) -> Vec<DomNode<'_>> {
    node.children()
        .filter(|child| !is_blank_text(*child) && !matches!(child.value(), Node::Comment(_)))
        .collect()
}

/// De-entitized text of the node and all its descendants.
pub fn text_content(node: DomNode<'_>) -> String {
    node.descendants().filter_map(text).collect()
}

pub fn is_blank(node: DomNode<'_>) -> bool {
    text_content(node).trim().is_empty()
}

pub fn escape_text(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\u{a0}' => out.push_str("&#160;"),
            c => out.push(c),
        }
    }
    out
}

pub fn escape_attr(input: &str) -> String {
    escape_text(input).replace('"', "&quot;")
}

/// Attributes sorted by name so serialization is independent of parser order.
pub fn sorted_attrs(el: &Element) -> Vec<(String, String)> {
    let mut attrs: Vec<(String, String)> = el
        .attrs()
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect();
    attrs.sort();
    attrs
}

pub fn is_void(name: &str) -> bool {
    VOID_ELEMENTS.contains(&name)
}

/// Writes `<name a="b">` (or `<name a="b"/>` for void elements).
pub fn write_open_tag(out: &mut String, name: &str, attrs: &[(String, String)]) {
    out.push('<');
    out.push_str(name);
    for (key, value) in attrs {
        out.push(' ');
        out.push_str(key);
        out.push_str("=\"");
        out.push_str(&escape_attr(value));
        out.push('"');
    }
    if is_void(name) {
        out.push('/');
    }
    out.push('>');
}

pub fn write_close_tag(out: &mut String, name: &str) {
    if !is_void(name) {
        out.push_str("</");
        out.push_str(name);
        out.push('>');
    }
}

/// Serializes `node` and its subtree. `rewrite` may replace an element's
/// attribute list; returning `None` keeps the original attributes.
pub fn write_node<F>(node: DomNode<'_>, out: &mut String, rewrite: &mut F)
where
    F: FnMut(&Element) -> Option<Vec<(String, String)>>,
{
    match node.value() {
        Node::Text(t) => out.push_str(&escape_text(t)),
        Node::Element(el) => {
            let attrs = rewrite(el).unwrap_or_else(|| sorted_attrs(el));
            write_open_tag(out, el.name(), &attrs);
            for child in node.children() {
                write_node(child, out, rewrite);
            }
            write_close_tag(out, el.name());
        }
        Node::Document | Node::Fragment => {
            for child in node.children() {
                write_node(child, out, rewrite);
            }
        }
        // Comments, doctypes and processing instructions never reach output.
        _ => {}
    }
}

pub fn outer_html(node: DomNode<'_>) -> String {
    let mut out = String::new();
    write_node(node, &mut out, &mut |_| None);
    out
}

pub fn inner_html(node: DomNode<'_>) -> String {
    let mut out = String::new();
    for child in node.children() {
        write_node(child, &mut out, &mut |_| None);
    }
    out
}
