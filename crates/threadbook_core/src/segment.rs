//! Splits a post body into classified paragraphs.
//!
//! Each direct child of the body is offered to [`RULES`] in order and the
//! first matching rule produces its paragraphs. A child that no rule accepts
//! is reported and dropped; adding support for a new corpus pattern means
//! adding a rule, never loosening an existing one.

use book_logging::book_debug;
use scraper::node::Node;

use crate::classify::{self, InlineShape, InlineWriter};
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::dom::{self, DomNode};
use crate::exceptions;
use crate::model::{Paragraph, ParagraphKind, PostRef};

/// Exact `style` values accepted on a `<table>`.
pub const TABLE_STYLES: &[&str] = &[
    "width: auto;",
    "max-width: 30em;",
    "max-width: 30em",
    "max-width:30em",
    "max-width:30em;",
    "max-width: 20em;",
    "max-width: 20em",
    "max-width:20em",
    "max-width:20em;",
];

const TABLE_PARTS: &[&str] = &["thead", "tbody", "tfoot", "tr", "colgroup", "col", "caption", "th", "td"];
const TABLE_CELLS: &[&str] = &["th", "td", "caption"];
const CELL_ATTRS: &[&str] = &["colspan", "rowspan"];
const DETAILS_SUMMARY_FALLBACK: &str = "Details";

/// Per-post state threaded through the rules.
pub struct SegmentContext<'d> {
    inline: InlineWriter<'d>,
}

impl<'d> SegmentContext<'d> {
    pub fn new(post: PostRef, diagnostics: &'d mut Diagnostics) -> Self {
        Self {
            inline: InlineWriter::new(post, diagnostics),
        }
    }

    fn post(&self) -> PostRef {
        self.inline.post()
    }

    fn report(&mut self, kind: DiagnosticKind, detail: impl Into<String>) {
        self.inline.report(kind, detail);
    }

    fn inline(&mut self, node: DomNode<'_>) -> String {
        self.inline.children_markup(node)
    }

    fn inline_node(&mut self, node: DomNode<'_>) -> String {
        let mut out = String::new();
        self.inline.write_node(node, &mut out);
        out
    }
}

/// A shape predicate paired with the handler that turns a matching node into
/// paragraphs.
pub struct Rule {
    pub name: &'static str,
    pub matches: fn(DomNode<'_>) -> bool,
    pub apply: fn(DomNode<'_>, &mut SegmentContext<'_>, &mut Vec<Paragraph>),
}

pub static RULES: &[Rule] = &[
    Rule {
        name: "paragraph",
        matches: is_plain_paragraph,
        apply: apply_plain_paragraph,
    },
    Rule {
        name: "rule",
        matches: is_rule,
        apply: apply_rule,
    },
    Rule {
        name: "blockquote-details",
        matches: is_blockquote_details,
        apply: apply_blockquote_details,
    },
    Rule {
        name: "details",
        matches: is_details,
        apply: apply_details,
    },
    Rule {
        name: "blockquote-text",
        matches: is_blockquote_text,
        apply: apply_blockquote_text,
    },
    Rule {
        name: "blockquote-multi",
        matches: is_blockquote_multi,
        apply: apply_blockquote_multi,
    },
    Rule {
        name: "blockquote-pre",
        matches: is_blockquote_pre,
        apply: apply_blockquote_pre,
    },
    Rule {
        name: "blockquote-table",
        matches: is_blockquote_table,
        apply: apply_blockquote_table,
    },
    Rule {
        name: "table",
        matches: is_table,
        apply: apply_table,
    },
    Rule {
        name: "root-text",
        matches: is_root_text,
        apply: apply_root_text,
    },
    Rule {
        name: "blank-text",
        matches: dom::is_blank_text,
        apply: apply_blank_text,
    },
    Rule {
        name: "code",
        matches: is_code,
        apply: apply_code,
    },
    Rule {
        name: "manual",
        matches: is_manual,
        apply: apply_manual,
    },
];

/// Parses and segments a post body.
pub fn segment_html(html: &str, post: PostRef, diagnostics: &mut Diagnostics) -> Vec<Paragraph> {
    let doc = dom::parse_content(html);
    segment(*doc.root_element(), post, diagnostics)
}

/// Segments the direct children of `root`.
pub fn segment(root: DomNode<'_>, post: PostRef, diagnostics: &mut Diagnostics) -> Vec<Paragraph> {
    let mut ctx = SegmentContext::new(post, diagnostics);
    let mut paragraphs = Vec::new();
    for child in root.children() {
        match RULES.iter().find(|rule| (rule.matches)(child)) {
            Some(rule) => (rule.apply)(child, &mut ctx, &mut paragraphs),
            None => {
                let markup = match child.value() {
                    Node::Comment(comment) => format!("<!--{}-->", &**comment),
                    _ => dom::outer_html(child),
                };
                ctx.report(
                    DiagnosticKind::UnrecognizedShape,
                    format!("invalid node, skipping: '{}'", classify::quote(&markup)),
                );
            }
        }
    }
    paragraphs
}

/// Name of the first rule accepting `node`.
pub fn matching_rule(node: DomNode<'_>) -> Option<&'static str> {
    RULES.iter().find(|rule| (rule.matches)(node)).map(|rule| rule.name)
}

fn is_bare(node: DomNode<'_>, name: &str) -> bool {
    dom::is_tag(node, name) && dom::has_no_attrs(node)
}

/// Blank text, ignoring images which carry no text but are still content.
fn is_blank_content(node: DomNode<'_>) -> bool {
    dom::is_blank(node) && !node.descendants().any(|d| dom::is_tag(d, "img"))
}

// 1
fn is_plain_paragraph(node: DomNode<'_>) -> bool {
    is_bare(node, "p")
}

fn apply_plain_paragraph(node: DomNode<'_>, ctx: &mut SegmentContext<'_>, out: &mut Vec<Paragraph>) {
    let inner = ctx.inline(node);
    out.push(Paragraph::new(
        ParagraphKind::Plain,
        format!("<p>{inner}</p>"),
        is_blank_content(node),
    ));
}

// 2
fn is_rule(node: DomNode<'_>) -> bool {
    is_bare(node, "hr") && !node.has_children()
}

fn apply_rule(_: DomNode<'_>, _: &mut SegmentContext<'_>, out: &mut Vec<Paragraph>) {
    out.push(Paragraph::new(ParagraphKind::Rule, "<hr/>", false));
}

// 3
fn is_details(node: DomNode<'_>) -> bool {
    dom::is_tag(node, "details") && dom::attrs_within(node, &["open"])
}

fn apply_details(node: DomNode<'_>, ctx: &mut SegmentContext<'_>, out: &mut Vec<Paragraph>) {
    out.extend(details_paragraphs(node, ctx));
}

fn details_paragraphs(node: DomNode<'_>, ctx: &mut SegmentContext<'_>) -> Vec<Paragraph> {
    let mut children = dom::significant_children(node);
    let mut paragraphs = Vec::with_capacity(children.len() + 1);

    let summary = match children.first() {
        Some(first) if dom::is_tag(*first, "summary") => {
            let markup = ctx.inline(*first);
            children.remove(0);
            markup
        }
        _ => DETAILS_SUMMARY_FALLBACK.to_string(),
    };
    paragraphs.push(Paragraph::new(
        ParagraphKind::DetailsSummary,
        format!("<p><b>{summary}</b></p>"),
        false,
    ));

    for child in children {
        if let Some(text) = dom::text(child) {
            paragraphs.push(Paragraph::new(
                ParagraphKind::DetailsText,
                format!("<p>{}</p>", dom::escape_text(text)),
                false,
            ));
        } else if is_bare(child, "p") {
            let inner = ctx.inline(child);
            paragraphs.push(Paragraph::new(
                ParagraphKind::DetailsText,
                format!("<p>{inner}</p>"),
                is_blank_content(child),
            ));
        } else if is_bare(child, "em") {
            let inner = ctx.inline(child);
            paragraphs.push(Paragraph::new(
                ParagraphKind::DetailsEmphasis,
                format!("<p><em>{inner}</em></p>"),
                is_blank_content(child),
            ));
        } else if is_bare(child, "ul") {
            paragraphs.push(Paragraph::new(ParagraphKind::DetailsList, list_markup(child, ctx), false));
        } else if is_bare(child, "br") && !child.has_children() {
            paragraphs.push(Paragraph::new(ParagraphKind::DetailsBreak, "<br/>", true));
        } else if is_bare(child, "blockquote") && is_block_of(child, &["p", "pre"]) {
            let body = block_children_markup(child, ctx);
            paragraphs.push(Paragraph::new(
                ParagraphKind::DetailsBlockquote,
                format!("<blockquote>{body}</blockquote>"),
                false,
            ));
        } else if classify::inline_shape(child) == Some(InlineShape::LocalImage) {
            let img = ctx.inline_node(child);
            paragraphs.push(Paragraph::new(ParagraphKind::DetailsImage, format!("<p>{img}</p>"), false));
        } else {
            ctx.report(
                DiagnosticKind::UnrecognizedShape,
                format!(
                    "invalid sub-detail tag, skipping: '{}'",
                    classify::quote(&dom::outer_html(child))
                ),
            );
        }
    }
    paragraphs
}

fn list_markup(list: DomNode<'_>, ctx: &mut SegmentContext<'_>) -> String {
    let mut markup = String::from("<ul>");
    for item in dom::significant_children(list) {
        if is_bare(item, "li") {
            markup.push_str("<li>");
            let inner = ctx.inline(item);
            markup.push_str(&inner);
            markup.push_str("</li>");
        } else {
            ctx.report(
                DiagnosticKind::UnrecognizedShape,
                format!("invalid list item, skipping: '{}'", classify::quote(&dom::outer_html(item))),
            );
        }
    }
    markup.push_str("</ul>");
    markup
}

// 3b
fn is_blockquote_details(node: DomNode<'_>) -> bool {
    if !is_bare(node, "blockquote") {
        return false;
    }
    match dom::significant_children(node).as_slice() {
        [details] => {
            is_details(*details)
                && dom::significant_children(*details)
                    .first()
                    .is_some_and(|first| dom::is_tag(*first, "summary"))
        }
        _ => false,
    }
}

fn apply_blockquote_details(node: DomNode<'_>, ctx: &mut SegmentContext<'_>, out: &mut Vec<Paragraph>) {
    let Some(details) = dom::significant_children(node).into_iter().next() else {
        return;
    };
    let body: String = details_paragraphs(details, ctx)
        .iter()
        .map(Paragraph::markup)
        .collect();
    out.push(Paragraph::new(
        ParagraphKind::BlockquoteDetails,
        format!("<blockquote>{body}</blockquote>"),
        false,
    ));
}

// 4
fn is_blockquote_text(node: DomNode<'_>) -> bool {
    if !is_bare(node, "blockquote") {
        return false;
    }
    let mut children = node.children();
    match (children.next(), children.next()) {
        (Some(only), None) => dom::text(only).is_some_and(|t| !t.trim().is_empty()),
        _ => false,
    }
}

fn apply_blockquote_text(node: DomNode<'_>, _: &mut SegmentContext<'_>, out: &mut Vec<Paragraph>) {
    let text = dom::text_content(node);
    out.push(Paragraph::new(
        ParagraphKind::BlockquoteText,
        format!("<blockquote><p>{}</p></blockquote>", dom::escape_text(text.trim())),
        false,
    ));
}

fn is_block_of(node: DomNode<'_>, allowed: &[&str]) -> bool {
    let children = dom::significant_children(node);
    !children.is_empty()
        && children.iter().all(|child| match dom::tag(*child) {
            Some(name) => allowed.contains(&name) && dom::has_no_attrs(*child),
            None => allowed.contains(&"#text") && dom::text(*child).is_some(),
        })
}

/// Renders the block children of a blockquote, one paragraph per child.
fn block_children_markup(node: DomNode<'_>, ctx: &mut SegmentContext<'_>) -> String {
    let mut body = String::new();
    for child in dom::significant_children(node) {
        if let Some(text) = dom::text(child) {
            body.push_str(&format!("<p>{}</p>", dom::escape_text(text.trim())));
            continue;
        }
        let inner = ctx.inline(child);
        match dom::tag(child) {
            Some("pre") => body.push_str(&format!("<pre>{inner}</pre>")),
            Some("em") => body.push_str(&format!("<p><em>{inner}</em></p>")),
            _ => body.push_str(&format!("<p>{inner}</p>")),
        }
    }
    body
}

fn single_significant_child(node: DomNode<'_>) -> Option<DomNode<'_>> {
    match dom::significant_children(node).as_slice() {
        [only] => Some(*only),
        _ => None,
    }
}

// 5
fn is_blockquote_multi(node: DomNode<'_>) -> bool {
    is_bare(node, "blockquote")
        && is_block_of(node, &["p", "pre", "em", "#text"])
        && !single_significant_child(node).is_some_and(|only| dom::is_tag(only, "pre"))
}

fn apply_blockquote_multi(node: DomNode<'_>, ctx: &mut SegmentContext<'_>, out: &mut Vec<Paragraph>) {
    let body = block_children_markup(node, ctx);
    out.push(Paragraph::new(
        ParagraphKind::BlockquoteMulti,
        format!("<blockquote>{body}</blockquote>"),
        false,
    ));
}

// 6
fn is_blockquote_pre(node: DomNode<'_>) -> bool {
    is_bare(node, "blockquote") && single_significant_child(node).is_some_and(|only| is_bare(only, "pre"))
}

fn apply_blockquote_pre(node: DomNode<'_>, ctx: &mut SegmentContext<'_>, out: &mut Vec<Paragraph>) {
    let Some(pre) = single_significant_child(node) else {
        return;
    };
    let inner = ctx.inline(pre);
    out.push(Paragraph::new(
        ParagraphKind::BlockquotePre,
        format!("<blockquote><pre>{inner}</pre></blockquote>"),
        false,
    ));
}

// 7
fn is_blockquote_table(node: DomNode<'_>) -> bool {
    is_bare(node, "blockquote") && single_significant_child(node).is_some_and(is_table)
}

fn apply_blockquote_table(node: DomNode<'_>, ctx: &mut SegmentContext<'_>, out: &mut Vec<Paragraph>) {
    let Some(table) = single_significant_child(node) else {
        return;
    };
    let markup = table_markup(table, ctx);
    out.push(Paragraph::new(
        ParagraphKind::BlockquoteTable,
        format!("<blockquote>{markup}</blockquote>"),
        false,
    ));
}

// 8
fn is_table(node: DomNode<'_>) -> bool {
    let Some(el) = dom::element(node) else {
        return false;
    };
    if el.name() != "table" {
        return false;
    }
    let attrs: Vec<(&str, &str)> = el.attrs().collect();
    match attrs.as_slice() {
        [] => true,
        [("style", style)] => TABLE_STYLES.contains(style),
        _ => false,
    }
}

fn apply_table(node: DomNode<'_>, ctx: &mut SegmentContext<'_>, out: &mut Vec<Paragraph>) {
    let markup = table_markup(node, ctx);
    out.push(Paragraph::new(ParagraphKind::Table, markup, false));
}

fn table_markup(table: DomNode<'_>, ctx: &mut SegmentContext<'_>) -> String {
    let mut out = String::new();
    let attrs = dom::element(table).map(dom::sorted_attrs).unwrap_or_default();
    dom::write_open_tag(&mut out, "table", &attrs);
    write_table_parts(table, ctx, &mut out);
    dom::write_close_tag(&mut out, "table");
    out
}

fn write_table_parts(node: DomNode<'_>, ctx: &mut SegmentContext<'_>, out: &mut String) {
    for child in dom::significant_children(node) {
        let Some(el) = dom::element(child) else {
            ctx.report(
                DiagnosticKind::UnrecognizedShape,
                format!("stray text in table: '{}'", classify::quote(&dom::text_content(child))),
            );
            continue;
        };
        let name = el.name();
        if !TABLE_PARTS.contains(&name) || !dom::attrs_within(child, CELL_ATTRS) {
            ctx.report(
                DiagnosticKind::UnrecognizedShape,
                format!("invalid table part, skipping: '{}'", classify::quote(&dom::outer_html(child))),
            );
            continue;
        }
        dom::write_open_tag(out, name, &dom::sorted_attrs(el));
        if TABLE_CELLS.contains(&name) {
            write_cell(child, ctx, out);
        } else {
            write_table_parts(child, ctx, out);
        }
        dom::write_close_tag(out, name);
    }
}

fn write_cell(cell: DomNode<'_>, ctx: &mut SegmentContext<'_>, out: &mut String) {
    for child in cell.children() {
        if is_bare(child, "p") {
            let inner = ctx.inline(child);
            out.push_str(&format!("<p>{inner}</p>"));
        } else {
            out.push_str(&ctx.inline_node(child));
        }
    }
}

// 9
fn is_root_text(node: DomNode<'_>) -> bool {
    dom::text(node).is_some_and(|t| !t.trim().is_empty())
}

fn apply_root_text(node: DomNode<'_>, ctx: &mut SegmentContext<'_>, out: &mut Vec<Paragraph>) {
    let text = dom::text(node).unwrap_or_default();
    ctx.report(
        DiagnosticKind::UnusualShape,
        format!("raw text at top level: '{}'", classify::quote(text.trim())),
    );
    out.push(Paragraph::new(
        ParagraphKind::Plain,
        format!("<p>{}</p>", dom::escape_text(text.trim())),
        false,
    ));
}

// 10
fn apply_blank_text(_: DomNode<'_>, ctx: &mut SegmentContext<'_>, _: &mut Vec<Paragraph>) {
    book_debug!("Skipping whitespace between blocks in {}", ctx.post());
}

// 11
fn is_code(node: DomNode<'_>) -> bool {
    is_bare(node, "pre")
        && node.children().all(|child| dom::text(child).is_some())
        && {
            let text = dom::text_content(node);
            dom::escape_text(&text) == text
        }
}

fn apply_code(node: DomNode<'_>, _: &mut SegmentContext<'_>, out: &mut Vec<Paragraph>) {
    out.push(Paragraph::new(
        ParagraphKind::Code,
        format!("<pre>{}</pre>", dom::text_content(node)),
        false,
    ));
}

// 12
fn is_manual(node: DomNode<'_>) -> bool {
    dom::element(node).is_some() && exceptions::is_manual_fragment(&dom::outer_html(node))
}

fn apply_manual(node: DomNode<'_>, ctx: &mut SegmentContext<'_>, out: &mut Vec<Paragraph>) {
    book_debug!("Manual override for legacy fragment in {}", ctx.post());
    let text = dom::text_content(node);
    out.push(Paragraph::new(
        ParagraphKind::Manual,
        format!("<p>{}</p>", dom::escape_text(text.trim())),
        false,
    ));
}
