//! Turns a post's normalized paragraphs into its final markup.

use std::collections::{BTreeMap, HashMap};
use std::sync::LazyLock;

use regex::Regex;

use crate::dom::{escape_attr, escape_text};
use crate::error::BookError;
use crate::model::{Attribution, Paragraph, ParagraphKind, Post};
use crate::normalize::ParagraphCache;
use crate::options::RenderOptions;

/// Package folder holding avatar images, relative to the chapter files.
pub const AVATAR_PREFIX: &str = "../Avatars/";
/// Icon keyword that carries no information.
const PLACEHOLDER_KEYWORD: &str = "image";
const MAX_SUB_LINES: usize = 3;

static BARE_BREAK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<br\s*>|</br>").unwrap());
static OPEN_IMAGE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<img([^>]*[^/>])\s*>").unwrap());
static OPEN_RULE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<hr\s*>").unwrap());
static NAMED_NBSP: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"&nbsp;").unwrap());

/// Lookup of avatar files by icon id.
pub trait AvatarStore: Send + Sync {
    /// File name inside the avatar folder, if the icon has one.
    fn avatar_file(&self, icon_id: u64) -> Option<String>;
}

/// Used when avatars are disabled or unavailable.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAvatars;

impl AvatarStore for NoAvatars {
    fn avatar_file(&self, _icon_id: u64) -> Option<String> {
        None
    }
}

impl AvatarStore for HashMap<u64, String> {
    fn avatar_file(&self, icon_id: u64) -> Option<String> {
        self.get(&icon_id).cloned()
    }
}

impl AvatarStore for BTreeMap<u64, String> {
    fn avatar_file(&self, icon_id: u64) -> Option<String> {
        self.get(&icon_id).cloned()
    }
}

/// Resolved attribution text for one post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributionHeader {
    /// Bold name, italicized as well when no character is attached.
    pub name_markup: String,
    pub sub_lines: Vec<String>,
}

impl AttributionHeader {
    /// Resolves the header or fails when the post names nobody.
    pub fn resolve(post: &Post, options: &RenderOptions) -> Result<Self, BookError> {
        let attribution = &post.attribution;
        let character = non_empty(&attribution.character_name);
        let alias = non_empty(&attribution.alt_name);
        let user = non_empty(&attribution.user_name);

        let (name, user_only) = match (alias, character, user) {
            (Some(alias), _, _) => (alias, false),
            (None, Some(character), _) => (character, false),
            (None, None, Some(user)) => (user, true),
            (None, None, None) => return Err(BookError::UnresolvableAttribution(post.post_ref())),
        };

        let mut name_markup = if user_only {
            format!("<b><i>{}</i></b>", escape_text(name))
        } else {
            format!("<b>{}</b>", escape_text(name))
        };
        if options.include_alias {
            if let (Some(alias), Some(character)) = (alias, character) {
                if alias.to_lowercase() != character.to_lowercase() {
                    name_markup.push_str(&format!(" ({})", escape_text(character)));
                }
            }
        }

        let sub_lines = sub_lines(attribution, name, options);
        // Unreachable with the current annotation set; guards future additions.
        if sub_lines.len() > MAX_SUB_LINES {
            return Err(BookError::AttributionOverflow {
                post: post.post_ref(),
                lines: sub_lines.len(),
            });
        }
        Ok(Self { name_markup, sub_lines })
    }

    /// Name plus annotations on one line, for splicing into a paragraph.
    fn inline_markup(&self) -> String {
        let mut out = format!(r#"<span class="attribution">{}"#, self.name_markup);
        for line in &self.sub_lines {
            out.push_str(&format!(" <small>[{}]</small>", escape_text(line)));
        }
        out.push_str("</span>: ");
        out
    }

    /// Name and annotations stacked in their own block.
    fn block_markup(&self) -> String {
        let mut out = format!(r#"<div class="attribution">{}"#, self.name_markup);
        for line in &self.sub_lines {
            out.push_str(&format!("<br/><small>{}</small>", escape_text(line)));
        }
        out.push_str("</div>");
        out
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn sub_lines(attribution: &Attribution, resolved_name: &str, options: &RenderOptions) -> Vec<String> {
    let character = non_empty(&attribution.character_name);
    let mut lines = Vec::new();
    if options.include_icon_keywords {
        if let Some(keyword) = non_empty(&attribution.icon_keyword) {
            if Some(keyword) != character && keyword != PLACEHOLDER_KEYWORD {
                lines.push(keyword.to_string());
            }
        }
    }
    if options.include_screen_name {
        if let Some(screen) = non_empty(&attribution.screen_name) {
            lines.push(screen.to_string());
        }
    }
    if options.include_author_name {
        if let Some(user) = non_empty(&attribution.user_name) {
            if user != resolved_name {
                lines.push(user.to_string());
            }
        }
    }
    lines
}

/// Markup of one post and the avatar it references.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPost {
    pub markup: String,
    pub avatar: Option<String>,
}

pub struct PostRenderer<'a> {
    options: &'a RenderOptions,
    avatars: &'a dyn AvatarStore,
}

impl<'a> PostRenderer<'a> {
    pub fn new(options: &'a RenderOptions, avatars: &'a dyn AvatarStore) -> Self {
        Self { options, avatars }
    }

    /// Renders `post` from its cached paragraphs. Fails if the post has not
    /// been normalized into `cache` or its attribution cannot be resolved.
    pub fn render(&self, post: &Post, cache: &ParagraphCache) -> Result<RenderedPost, BookError> {
        let paragraphs = cache.paragraphs(post)?;
        self.render_paragraphs(post, paragraphs)
    }

    pub fn render_paragraphs(&self, post: &Post, paragraphs: &[Paragraph]) -> Result<RenderedPost, BookError> {
        let header = AttributionHeader::resolve(post, self.options)?;
        let paragraphs = trim_empty(paragraphs, self.options);
        let avatar = self.avatar_for(post);

        let mut body = String::new();
        let mut rest = paragraphs;
        match &avatar {
            Some(file) => {
                body.push_str(&format!(
                    r#"<div class="post-header"><img class="avatar" src="{}" alt=""/>{}</div>"#,
                    escape_attr(&format!("{AVATAR_PREFIX}{file}")),
                    header.block_markup()
                ));
            }
            None => match paragraphs.split_first() {
                Some((first, tail)) if self.options.inline_attribution && can_splice(first) => {
                    let opening = first.markup().strip_prefix("<p>").unwrap_or_default();
                    body.push_str("<p>");
                    body.push_str(&header.inline_markup());
                    body.push_str(opening);
                    rest = tail;
                }
                _ => {
                    body.push_str(&header.block_markup());
                    body.push_str("<br/>");
                }
            },
        }
        for paragraph in rest {
            body.push_str(paragraph.markup());
        }

        let markup = format!(
            r#"<div class="post" id="{}">{}</div>"#,
            post.key.anchor(),
            fix_markup(&body)
        );
        Ok(RenderedPost { markup, avatar })
    }

    fn avatar_for(&self, post: &Post) -> Option<String> {
        if !self.options.include_avatars {
            return None;
        }
        post.attribution
            .icon_id
            .and_then(|icon| self.avatars.avatar_file(icon))
    }
}

fn can_splice(paragraph: &Paragraph) -> bool {
    paragraph.kind() == ParagraphKind::Plain && paragraph.markup().starts_with("<p>")
}

/// Drops runs of empty paragraphs from either end, as configured.
pub fn trim_empty<'p>(paragraphs: &'p [Paragraph], options: &RenderOptions) -> &'p [Paragraph] {
    let mut slice = paragraphs;
    if options.trim_leading_empty {
        let skip = slice.iter().take_while(|p| p.is_empty()).count();
        slice = &slice[skip..];
    }
    if options.trim_trailing_empty {
        let keep = slice.len() - slice.iter().rev().take_while(|p| p.is_empty()).count();
        slice = &slice[..keep];
    }
    slice
}

/// Textual safety net for tags that must be self-closing in XHTML.
pub fn fix_markup(markup: &str) -> String {
    let fixed = BARE_BREAK.replace_all(markup, "<br/>");
    let fixed = OPEN_RULE.replace_all(&fixed, "<hr/>");
    let fixed = OPEN_IMAGE.replace_all(&fixed, "<img$1/>");
    NAMED_NBSP.replace_all(&fixed, "&#160;").into_owned()
}
