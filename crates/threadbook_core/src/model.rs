//! Corpus data model: threads, posts and classified paragraphs.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};

use crate::BookError;

pub type ThreadId = u64;
pub type ReplyId = u64;

/// Identity of a post inside the corpus.
///
/// The opening post of a thread has no reply id of its own, so it is keyed by
/// the thread it opens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PostKey {
    First(ThreadId),
    Reply(ReplyId),
}

impl PostKey {
    /// Fragment identifier used for the post inside a chapter file.
    pub fn anchor(&self) -> String {
        match self {
            PostKey::First(thread) => format!("post-{thread}"),
            PostKey::Reply(id) => format!("reply-{id}"),
        }
    }

    pub fn reply_id(&self) -> Option<ReplyId> {
        match self {
            PostKey::First(_) => None,
            PostKey::Reply(id) => Some(*id),
        }
    }
}

impl fmt::Display for PostKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PostKey::First(thread) => write!(f, "{thread}::first"),
            PostKey::Reply(id) => write!(f, "{id}"),
        }
    }
}

/// Thread plus post identity, used to locate diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PostRef {
    pub thread: ThreadId,
    pub key: PostKey,
}

impl fmt::Display for PostRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.thread, self.key)
    }
}

/// Who wrote a post, and as which character.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Attribution {
    pub character_id: Option<u64>,
    pub character_name: Option<String>,
    /// Per-post alias, present only when it differs from `character_name`.
    pub alt_name: Option<String>,
    pub screen_name: Option<String>,
    pub icon_id: Option<u64>,
    pub icon_keyword: Option<String>,
    pub icon_url: Option<String>,
    pub user_id: Option<u64>,
    pub user_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Post {
    pub thread: ThreadId,
    pub key: PostKey,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub attribution: Attribution,
    content: String,
}

impl Post {
    pub fn new(
        thread: ThreadId,
        key: PostKey,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
        attribution: Attribution,
        content: impl Into<String>,
    ) -> Self {
        Self {
            thread,
            key,
            created_at,
            updated_at,
            attribution,
            content: content.into(),
        }
    }

    /// Raw HTML exactly as loaded from the corpus.
    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn post_ref(&self) -> PostRef {
        PostRef {
            thread: self.thread,
            key: self.key,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Thread {
    pub id: ThreadId,
    pub subject: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    first: Post,
    replies: Vec<Post>,
}

impl Thread {
    pub fn new(
        id: ThreadId,
        subject: impl Into<String>,
        description: impl Into<String>,
        created_at: DateTime<Utc>,
        first: Post,
        replies: Vec<Post>,
    ) -> Self {
        Self {
            id,
            subject: subject.into(),
            description: description.into(),
            created_at,
            first,
            replies,
        }
    }

    pub fn first_post(&self) -> &Post {
        &self.first
    }

    pub fn replies(&self) -> &[Post] {
        &self.replies
    }

    /// All posts in source order, opening post first.
    pub fn posts(&self) -> impl Iterator<Item = &Post> {
        std::iter::once(&self.first).chain(self.replies.iter())
    }

    pub fn post_count(&self) -> usize {
        1 + self.replies.len()
    }
}

/// The loaded, read-only archive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Corpus {
    threads: BTreeMap<ThreadId, Thread>,
}

impl Corpus {
    pub fn new(threads: impl IntoIterator<Item = Thread>) -> Self {
        Self {
            threads: threads.into_iter().map(|t| (t.id, t)).collect(),
        }
    }

    pub fn thread(&self, id: ThreadId) -> Result<&Thread, BookError> {
        self.threads.get(&id).ok_or(BookError::UnknownThread(id))
    }

    /// Threads in ascending id order.
    pub fn threads(&self) -> impl Iterator<Item = &Thread> {
        self.threads.values()
    }

    pub fn posts(&self) -> impl Iterator<Item = &Post> {
        self.threads.values().flat_map(Thread::posts)
    }

    pub fn len(&self) -> usize {
        self.threads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.threads.is_empty()
    }
}

/// Structural category of one classified block of a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParagraphKind {
    Plain,
    Rule,
    DetailsSummary,
    DetailsText,
    DetailsEmphasis,
    DetailsList,
    DetailsBreak,
    DetailsBlockquote,
    DetailsImage,
    BlockquoteText,
    BlockquoteMulti,
    BlockquotePre,
    BlockquoteTable,
    BlockquoteDetails,
    Table,
    Code,
    Manual,
}

impl ParagraphKind {
    pub fn is_details(&self) -> bool {
        matches!(
            self,
            ParagraphKind::DetailsSummary
                | ParagraphKind::DetailsText
                | ParagraphKind::DetailsEmphasis
                | ParagraphKind::DetailsList
                | ParagraphKind::DetailsBreak
                | ParagraphKind::DetailsBlockquote
                | ParagraphKind::DetailsImage
        )
    }

    pub fn is_blockquote(&self) -> bool {
        matches!(
            self,
            ParagraphKind::BlockquoteText
                | ParagraphKind::BlockquoteMulti
                | ParagraphKind::BlockquotePre
                | ParagraphKind::BlockquoteTable
                | ParagraphKind::BlockquoteDetails
        )
    }
}

/// One normalized block: its kind, whitelisted markup and emptiness flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paragraph {
    kind: ParagraphKind,
    markup: String,
    empty: bool,
}

impl Paragraph {
    pub fn new(kind: ParagraphKind, markup: impl Into<String>, empty: bool) -> Self {
        Self {
            kind,
            markup: markup.into(),
            empty,
        }
    }

    pub fn kind(&self) -> ParagraphKind {
        self.kind
    }

    pub fn markup(&self) -> &str {
        &self.markup
    }

    pub fn is_empty(&self) -> bool {
        self.empty
    }
}
