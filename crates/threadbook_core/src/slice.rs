use serde::{Deserialize, Serialize};

use crate::error::BookError;
use crate::model::{Post, ReplyId, Thread};

/// Which contiguous run of a thread's posts a chapter takes.
///
/// `All` and `Until` start at the opening post; `After` and `Between` only
/// look at replies. A marker that does not occur in the thread is an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ChapterSlice {
    #[default]
    All,
    Until {
        marker: ReplyId,
        inclusive: bool,
    },
    After {
        marker: ReplyId,
        inclusive: bool,
    },
    Between {
        start: ReplyId,
        end: ReplyId,
        inclusive_start: bool,
        inclusive_end: bool,
    },
}

impl ChapterSlice {
    pub fn take<'t>(&self, thread: &'t Thread) -> Result<Vec<&'t Post>, BookError> {
        let missing = |marker| BookError::MarkerNotFound {
            thread: thread.id,
            marker,
        };
        let replies = thread.replies();
        match *self {
            ChapterSlice::All => Ok(thread.posts().collect()),
            ChapterSlice::Until { marker, inclusive } => {
                let at = position(replies, marker).ok_or_else(|| missing(marker))?;
                let end = if inclusive { at + 1 } else { at };
                Ok(std::iter::once(thread.first_post())
                    .chain(replies[..end].iter())
                    .collect())
            }
            ChapterSlice::After { marker, inclusive } => {
                let at = position(replies, marker).ok_or_else(|| missing(marker))?;
                let begin = if inclusive { at } else { at + 1 };
                Ok(replies[begin..].iter().collect())
            }
            ChapterSlice::Between {
                start,
                end,
                inclusive_start,
                inclusive_end,
            } => {
                let from = position(replies, start).ok_or_else(|| missing(start))?;
                let to = replies[from + 1..]
                    .iter()
                    .position(|post| post.key.reply_id() == Some(end))
                    .map(|offset| from + 1 + offset)
                    .ok_or_else(|| missing(end))?;
                let begin = if inclusive_start { from } else { from + 1 };
                let stop = if inclusive_end { to + 1 } else { to };
                Ok(replies[begin..stop].iter().collect())
            }
        }
    }
}

fn position(replies: &[Post], marker: ReplyId) -> Option<usize> {
    replies.iter().position(|post| post.key.reply_id() == Some(marker))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Attribution, PostKey};
    use chrono::{TimeZone, Utc};

    fn thread() -> Thread {
        let at = Utc.with_ymd_and_hms(2021, 6, 1, 0, 0, 0).unwrap();
        let post = |key| Post::new(9, key, at, at, Attribution::default(), "<p>x</p>");
        Thread::new(
            9,
            "subject",
            "",
            at,
            post(PostKey::First(9)),
            (1..=5).map(|id| post(PostKey::Reply(id))).collect(),
        )
    }

    fn keys(posts: &[&Post]) -> Vec<PostKey> {
        posts.iter().map(|p| p.key).collect()
    }

    #[test]
    fn until_starts_with_the_opening_post() {
        let t = thread();
        let exclusive = ChapterSlice::Until { marker: 3, inclusive: false }.take(&t).unwrap();
        assert_eq!(
            keys(&exclusive),
            vec![PostKey::First(9), PostKey::Reply(1), PostKey::Reply(2)]
        );
        let inclusive = ChapterSlice::Until { marker: 3, inclusive: true }.take(&t).unwrap();
        assert_eq!(inclusive.len(), 4);
    }

    #[test]
    fn after_uses_replies_only() {
        let t = thread();
        let posts = ChapterSlice::After { marker: 3, inclusive: false }.take(&t).unwrap();
        assert_eq!(keys(&posts), vec![PostKey::Reply(4), PostKey::Reply(5)]);
    }

    #[test]
    fn between_exclusive_start_inclusive_end() {
        let t = thread();
        let slice = ChapterSlice::Between {
            start: 1,
            end: 4,
            inclusive_start: false,
            inclusive_end: true,
        };
        let posts = slice.take(&t).unwrap();
        assert_eq!(
            keys(&posts),
            vec![PostKey::Reply(2), PostKey::Reply(3), PostKey::Reply(4)]
        );
    }

    #[test]
    fn missing_marker_is_fatal() {
        let t = thread();
        let err = ChapterSlice::After { marker: 42, inclusive: true }.take(&t).unwrap_err();
        assert_eq!(err, BookError::MarkerNotFound { thread: 9, marker: 42 });

        let slice = ChapterSlice::Between {
            start: 2,
            end: 42,
            inclusive_start: true,
            inclusive_end: true,
        };
        assert_eq!(
            slice.take(&t).unwrap_err(),
            BookError::MarkerNotFound { thread: 9, marker: 42 }
        );
    }
}
