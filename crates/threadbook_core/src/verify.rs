//! Cross-check between the corpus and the resolved chapters.

use std::collections::{BTreeMap, BTreeSet};

use book_logging::{book_error, book_info};

use crate::chapter::Chapter;
use crate::error::BookError;
use crate::model::{Corpus, PostKey};
use crate::options::RenderOptions;
use crate::plan::{Exclusion, ExclusionTarget};

/// Every post of the corpus that is not excluded must be in exactly one
/// chapter, and chapters may only contain such posts.
pub fn verify(
    corpus: &Corpus,
    chapters: &[Chapter<'_>],
    exclusions: &[Exclusion],
    options: &RenderOptions,
) -> Result<(), BookError> {
    let active: Vec<&Exclusion> = exclusions.iter().filter(|e| e.applies(options)).collect();
    let is_excluded = |thread, key: PostKey| {
        active.iter().any(|exclusion| match exclusion.target {
            ExclusionTarget::Thread(id) => id == thread,
            ExclusionTarget::Post(id) => key.reply_id() == Some(id),
        })
    };

    let expected: BTreeSet<PostKey> = corpus
        .posts()
        .filter(|post| !is_excluded(post.thread, post.key))
        .map(|post| post.key)
        .collect();

    let mut seen: BTreeMap<PostKey, usize> = BTreeMap::new();
    for chapter in chapters {
        for post in &chapter.posts {
            *seen.entry(post.key).or_default() += 1;
        }
    }

    let unused: Vec<PostKey> = expected.iter().filter(|key| !seen.contains_key(key)).copied().collect();
    let duplicated: Vec<PostKey> = seen
        .iter()
        .filter(|(_, count)| **count > 1)
        .map(|(key, _)| *key)
        .collect();
    let unknown: Vec<PostKey> = seen.keys().filter(|key| !expected.contains(key)).copied().collect();

    for key in &unused {
        book_error!("[!] Post {} is in no chapter", key);
    }
    for key in &duplicated {
        book_error!("[!] Post {} is in {} chapters", key, seen[key]);
    }
    for key in &unknown {
        book_error!("[!] Post {} is in a chapter but excluded or not in the corpus", key);
    }

    if unused.is_empty() && duplicated.is_empty() && unknown.is_empty() {
        book_info!("Cross-check passed: {} posts in {} chapters", expected.len(), chapters.len());
        Ok(())
    } else {
        Err(BookError::Verification {
            unused,
            duplicated,
            unknown,
        })
    }
}
