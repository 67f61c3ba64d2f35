use thiserror::Error;

use crate::model::{PostKey, PostRef, ReplyId, ThreadId};

/// Structural failures that abort the current build profile.
///
/// Everything recoverable (unknown markup, missing images, dangling links) is
/// reported through [`crate::Diagnostics`] instead.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BookError {
    #[error("thread {0} is not part of the corpus")]
    UnknownThread(ThreadId),
    #[error("marker post {marker} not found in thread {thread}")]
    MarkerNotFound { thread: ThreadId, marker: ReplyId },
    #[error("post {0} has no alias, character name or user name")]
    UnresolvableAttribution(PostRef),
    #[error("post {post} would stack {lines} attribution lines")]
    AttributionOverflow { post: PostRef, lines: usize },
    #[error("post {0} was rendered before its paragraphs were normalized")]
    NotNormalized(PostRef),
    #[error(
        "chapter cross-check failed: {} unused, {} duplicated, {} unknown posts",
        .unused.len(),
        .duplicated.len(),
        .unknown.len()
    )]
    Verification {
        unused: Vec<PostKey>,
        duplicated: Vec<PostKey>,
        unknown: Vec<PostKey>,
    },
}
