//! Retargets links between corpus posts at the generated chapter files.

use std::collections::HashMap;
use std::sync::LazyLock;

use book_logging::book_trace;
use regex::{Captures, Regex};
use url::Url;

use crate::chapter::ChapterFile;
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::model::{PostKey, ReplyId, ThreadId};

/// Hosts whose `/posts` and `/replies` paths point into the corpus.
pub const INTERNAL_DOMAINS: &[&str] = &["glowfic.com", "www.glowfic.com"];

/// External sites linked from the corpus often enough to be expected.
pub const KNOWN_EXTERNAL_DOMAINS: &[&str] = &[
    "wikipedia.org",
    "wiktionary.org",
    "youtube.com",
    "youtu.be",
    "projectlawful.com",
    "aonprd.com",
    "d20pfsrd.com",
    "pathfinderwiki.com",
    "lesswrong.com",
    "archiveofourown.org",
    "tvtropes.org",
    "imgur.com",
    "twitter.com",
    "reddit.com",
    "github.com",
];

const INTERNAL_BASE: &str = "https://glowfic.com/";

static ANCHOR_HREF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(<a\b[^>]*?\bhref=")([^"]*)(")"#).unwrap());

/// Where a corpus link points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkTarget {
    Reply(ReplyId),
    Thread(ThreadId),
    /// A page on the forum that is not a post, like a character sheet.
    OtherInternal,
    KnownExternal,
    UnknownExternal,
    /// Fragment-only, relative or non-web links.
    Local,
}

/// Classifies an `href` value as written in the markup.
pub fn classify_href(href: &str) -> LinkTarget {
    let href = href.trim().replace("&amp;", "&");
    if href.is_empty() || href.starts_with('#') || href.starts_with("../") {
        return LinkTarget::Local;
    }
    let url = if href.starts_with('/') {
        Url::parse(INTERNAL_BASE).and_then(|base| base.join(&href))
    } else {
        Url::parse(&href)
    };
    let Ok(url) = url else {
        return LinkTarget::Local;
    };
    if !matches!(url.scheme(), "http" | "https") {
        return LinkTarget::Local;
    }
    let Some(host) = url.host_str().map(str::to_ascii_lowercase) else {
        return LinkTarget::Local;
    };
    if INTERNAL_DOMAINS.contains(&host.as_str()) {
        return internal_target(&url);
    }
    let known = KNOWN_EXTERNAL_DOMAINS
        .iter()
        .any(|domain| host == *domain || host.ends_with(&format!(".{domain}")));
    if known {
        LinkTarget::KnownExternal
    } else {
        LinkTarget::UnknownExternal
    }
}

fn internal_target(url: &Url) -> LinkTarget {
    let segments: Vec<&str> = url
        .path_segments()
        .map(|segments| segments.filter(|s| !s.is_empty()).collect())
        .unwrap_or_default();
    let reply_fragment = url
        .fragment()
        .and_then(|fragment| fragment.strip_prefix("reply-"))
        .and_then(|id| id.parse::<ReplyId>().ok());
    match segments.as_slice() {
        ["replies", id] => id.parse().map_or(LinkTarget::OtherInternal, LinkTarget::Reply),
        ["posts", thread] => match (reply_fragment, thread.parse()) {
            (Some(reply), _) => LinkTarget::Reply(reply),
            (None, Ok(thread)) => LinkTarget::Thread(thread),
            (None, Err(_)) => LinkTarget::OtherInternal,
        },
        _ => LinkTarget::OtherInternal,
    }
}

/// Which file holds each post, built once all files are final.
#[derive(Debug, Clone, Default)]
pub struct LinkIndex {
    replies: HashMap<ReplyId, String>,
    threads: HashMap<ThreadId, String>,
}

impl LinkIndex {
    pub fn new(files: &[ChapterFile]) -> Self {
        let mut index = Self::default();
        for file in files {
            for post in &file.posts {
                if let PostKey::Reply(id) = post.key {
                    index.replies.entry(id).or_insert_with(|| file.file_name.clone());
                }
                index
                    .threads
                    .entry(post.thread)
                    .or_insert_with(|| file.file_name.clone());
            }
        }
        index
    }

    pub fn reply_href(&self, id: ReplyId) -> Option<String> {
        self.replies
            .get(&id)
            .map(|file| format!("{file}#{}", PostKey::Reply(id).anchor()))
    }

    pub fn thread_href(&self, thread: ThreadId) -> Option<String> {
        self.threads.get(&thread).cloned()
    }
}

pub struct LinkPatcher<'a> {
    index: &'a LinkIndex,
}

impl<'a> LinkPatcher<'a> {
    pub fn new(index: &'a LinkIndex) -> Self {
        Self { index }
    }

    /// Rewrites internal links in `file`'s body. Links that cannot be
    /// resolved and unknown external links are reported and kept as written.
    pub fn patch(&self, file: &ChapterFile, diagnostics: &mut Diagnostics) -> String {
        ANCHOR_HREF
            .replace_all(&file.body, |caps: &Captures<'_>| {
                let href = &caps[2];
                let patched = self.resolve(href, file, diagnostics);
                format!("{}{}{}", &caps[1], patched.as_deref().unwrap_or(href), &caps[3])
            })
            .into_owned()
    }

    fn resolve(&self, href: &str, file: &ChapterFile, diagnostics: &mut Diagnostics) -> Option<String> {
        let (resolved, what) = match classify_href(href) {
            LinkTarget::Reply(id) => (self.index.reply_href(id), "reply"),
            LinkTarget::Thread(thread) => (self.index.thread_href(thread), "thread"),
            LinkTarget::UnknownExternal | LinkTarget::OtherInternal => {
                diagnostics.report(
                    DiagnosticKind::UnknownLink,
                    None,
                    format!("{href} in {}", file.file_name),
                );
                return None;
            }
            LinkTarget::KnownExternal | LinkTarget::Local => return None,
        };
        match resolved {
            Some(target) => {
                book_trace!("Patched {} link {} -> {}", what, href, target);
                Some(target)
            }
            None => {
                diagnostics.report(
                    DiagnosticKind::UnresolvedLink,
                    None,
                    format!("{what} link {href} in {} points outside the book", file.file_name),
                );
                None
            }
        }
    }
}
