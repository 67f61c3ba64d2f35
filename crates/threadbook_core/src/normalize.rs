//! Image rewriting plus segmentation, run once per post and cached.

use std::collections::{BTreeSet, HashMap};

use book_logging::book_info;
use rayon::prelude::*;

use crate::diagnostics::Diagnostics;
use crate::error::BookError;
use crate::images::{AssetStore, ImageRewriter};
use crate::model::{Paragraph, Post, PostKey, Thread};
use crate::segment;

/// Output of normalizing one post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedPost {
    pub paragraphs: Vec<Paragraph>,
    /// Cached image files the post now references.
    pub images: Vec<String>,
}

/// Paragraphs per post for one build.
///
/// A cache belongs to exactly one build profile; a new profile starts from
/// an empty cache instead of clearing a shared one.
#[derive(Debug, Clone, Default)]
pub struct ParagraphCache {
    posts: HashMap<PostKey, NormalizedPost>,
    diagnostics: Diagnostics,
}

impl ParagraphCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: PostKey, normalized: NormalizedPost) {
        self.posts.insert(key, normalized);
    }

    pub fn get(&self, post: &Post) -> Result<&NormalizedPost, BookError> {
        self.posts
            .get(&post.key)
            .ok_or_else(|| BookError::NotNormalized(post.post_ref()))
    }

    pub fn paragraphs(&self, post: &Post) -> Result<&[Paragraph], BookError> {
        self.get(post).map(|normalized| normalized.paragraphs.as_slice())
    }

    pub fn contains(&self, key: &PostKey) -> bool {
        self.posts.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn take_diagnostics(&mut self) -> Diagnostics {
        std::mem::take(&mut self.diagnostics)
    }

    /// Every image referenced by a cached post.
    pub fn images(&self) -> BTreeSet<String> {
        self.posts
            .values()
            .flat_map(|normalized| normalized.images.iter().cloned())
            .collect()
    }
}

pub struct Normalizer<'a> {
    assets: &'a dyn AssetStore,
}

impl<'a> Normalizer<'a> {
    pub fn new(assets: &'a dyn AssetStore) -> Self {
        Self { assets }
    }

    pub fn normalize_post(&self, post: &Post, diagnostics: &mut Diagnostics) -> NormalizedPost {
        let rewritten = ImageRewriter::new(self.assets).rewrite(post.content(), post.post_ref(), diagnostics);
        let paragraphs = segment::segment_html(&rewritten.html, post.post_ref(), diagnostics);
        NormalizedPost {
            paragraphs,
            images: rewritten.assets,
        }
    }

    /// Normalizes every post of `threads`, one worker per thread. Diagnostics
    /// are merged back in thread order so logs stay comparable between runs.
    pub fn normalize_threads(&self, threads: &[&Thread]) -> ParagraphCache {
        let results: Vec<(Vec<(PostKey, NormalizedPost)>, Diagnostics)> = threads
            .par_iter()
            .map(|thread| {
                let mut diagnostics = Diagnostics::new();
                let posts = thread
                    .posts()
                    .map(|post| (post.key, self.normalize_post(post, &mut diagnostics)))
                    .collect();
                (posts, diagnostics)
            })
            .collect();

        let mut cache = ParagraphCache::new();
        for (posts, diagnostics) in results {
            for (key, normalized) in posts {
                cache.insert(key, normalized);
            }
            cache.diagnostics.merge(diagnostics);
        }
        book_info!(
            "Normalized {} posts from {} threads ({} warnings)",
            cache.len(),
            threads.len(),
            cache.diagnostics.len()
        );
        cache
    }
}
