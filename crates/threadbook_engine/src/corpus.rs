//! Loads the per-thread JSON archive into a [`Corpus`].
//!
//! Layout: `<root>/posts/<thread id>/post.json` and `replies.json`, both
//! wrapping their payload in `{"Ok": ...}`.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use book_logging::{book_debug, book_info};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;
use threadbook_core::{Attribution, Corpus, Post, PostKey, Thread, ThreadId};

pub const POSTS_DIR: &str = "posts";
pub const POST_FILE: &str = "post.json";
pub const REPLIES_FILE: &str = "replies.json";

#[derive(Debug, Error)]
pub enum CorpusError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("unexpected corpus layout: {0}")]
    Layout(String),
    #[error("reply {reply} appears in thread {first} and thread {second}")]
    DuplicateReply { reply: u64, first: ThreadId, second: ThreadId },
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    #[serde(rename = "Ok")]
    ok: T,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawCharacter {
    id: Option<u64>,
    name: Option<String>,
    screenname: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawIcon {
    id: Option<u64>,
    keyword: Option<String>,
    url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawUser {
    id: Option<u64>,
    username: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawThread {
    id: ThreadId,
    subject: String,
    #[serde(default)]
    description: Option<String>,
    created_at: DateTime<Utc>,
    content: String,
    #[serde(default)]
    character: Option<RawCharacter>,
    #[serde(default)]
    icon: Option<RawIcon>,
    #[serde(default)]
    user: Option<RawUser>,
}

#[derive(Debug, Deserialize)]
struct RawReply {
    id: u64,
    content: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    #[serde(default)]
    character: Option<RawCharacter>,
    #[serde(default)]
    character_name: Option<String>,
    #[serde(default)]
    icon: Option<RawIcon>,
    #[serde(default)]
    user: Option<RawUser>,
}

fn attribution(
    character: Option<RawCharacter>,
    character_name: Option<String>,
    icon: Option<RawIcon>,
    user: Option<RawUser>,
) -> Attribution {
    let character = character.unwrap_or_default();
    let icon = icon.unwrap_or_default();
    let user = user.unwrap_or_default();
    // The per-post name only counts as an alias when it differs.
    let alt_name = character_name.filter(|name| Some(name) != character.name.as_ref());
    Attribution {
        character_id: character.id,
        character_name: character.name,
        alt_name,
        screen_name: character.screenname,
        icon_id: icon.id,
        icon_keyword: icon.keyword,
        icon_url: icon.url,
        user_id: user.id,
        user_name: user.username,
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, CorpusError> {
    let text = fs::read_to_string(path).map_err(|source| CorpusError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let envelope: Envelope<T> = serde_json::from_str(&text).map_err(|source| CorpusError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(envelope.ok)
}

/// Reads one thread directory.
pub fn load_thread(dir: &Path) -> Result<Thread, CorpusError> {
    let raw: RawThread = read_json(&dir.join(POST_FILE))?;
    let replies: Vec<RawReply> = read_json(&dir.join(REPLIES_FILE))?;

    let first = Post::new(
        raw.id,
        PostKey::First(raw.id),
        raw.created_at,
        raw.created_at,
        attribution(raw.character, None, raw.icon, raw.user),
        raw.content,
    );
    let replies = replies
        .into_iter()
        .map(|reply| {
            Post::new(
                raw.id,
                PostKey::Reply(reply.id),
                reply.created_at,
                reply.updated_at,
                attribution(reply.character, reply.character_name, reply.icon, reply.user),
                reply.content,
            )
        })
        .collect();

    Ok(Thread::new(
        raw.id,
        raw.subject,
        raw.description.unwrap_or_default(),
        raw.created_at,
        first,
        replies,
    ))
}

/// Loads every thread below `<root>/posts`.
pub fn load_corpus(root: &Path) -> Result<Corpus, CorpusError> {
    let posts_dir = root.join(POSTS_DIR);
    if !posts_dir.is_dir() {
        return Err(CorpusError::Layout(format!("{} is not a directory", posts_dir.display())));
    }
    let entries = fs::read_dir(&posts_dir).map_err(|source| CorpusError::Io {
        path: posts_dir.clone(),
        source,
    })?;

    let mut dirs = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| CorpusError::Io {
            path: posts_dir.clone(),
            source,
        })?;
        let path = entry.path();
        if path.is_dir() {
            dirs.push(path);
        } else {
            book_debug!("Skipping stray corpus entry {}", path.display());
        }
    }
    dirs.sort();

    let mut threads: Vec<Thread> = Vec::with_capacity(dirs.len());
    for dir in &dirs {
        let thread = load_thread(dir)?;
        book_info!(
            "Loaded thread {} '{}' ({} posts)",
            thread.id,
            thread.subject,
            thread.post_count()
        );
        threads.push(thread);
    }

    check_unique_replies(&threads)?;
    if threads.iter().map(|t| t.id).collect::<HashSet<_>>().len() != threads.len() {
        return Err(CorpusError::Layout("two directories hold the same thread".into()));
    }
    Ok(Corpus::new(threads))
}

fn check_unique_replies(threads: &[Thread]) -> Result<(), CorpusError> {
    let mut seen = HashMap::new();
    for thread in threads {
        for post in thread.replies() {
            if let PostKey::Reply(id) = post.key {
                if let Some(first) = seen.insert(id, thread.id) {
                    return Err(CorpusError::DuplicateReply {
                        reply: id,
                        first,
                        second: thread.id,
                    });
                }
            }
        }
    }
    Ok(())
}
