//! Runs the whole pipeline for one build profile.

use std::collections::BTreeSet;

use book_logging::book_info;

use crate::chapter::{Chapter, ChapterAssembler, ChapterFile};
use crate::diagnostics::Diagnostics;
use crate::error::BookError;
use crate::images::AssetStore;
use crate::links::{LinkIndex, LinkPatcher};
use crate::model::{Corpus, Thread, ThreadId};
use crate::normalize::Normalizer;
use crate::options::RenderOptions;
use crate::plan::BookPlan;
use crate::render::AvatarStore;
use crate::verify::verify;

/// Everything the package writer needs for one profile.
#[derive(Debug, Clone)]
pub struct BuiltBook<'c> {
    pub chapters: Vec<Chapter<'c>>,
    pub files: Vec<ChapterFile>,
    pub diagnostics: Diagnostics,
}

impl BuiltBook<'_> {
    pub fn images(&self) -> BTreeSet<String> {
        self.files.iter().flat_map(|f| f.images.iter().cloned()).collect()
    }

    pub fn avatars(&self) -> BTreeSet<String> {
        self.files.iter().flat_map(|f| f.avatars.iter().cloned()).collect()
    }

    /// File holding the start of the chapter with the given order.
    pub fn first_file(&self, order: usize) -> Option<&ChapterFile> {
        self.files.iter().find(|f| f.order == order && f.split == 0)
    }
}

pub struct BookBuilder<'c> {
    corpus: &'c Corpus,
    plan: &'c BookPlan,
    options: &'c RenderOptions,
}

impl<'c> BookBuilder<'c> {
    pub fn new(corpus: &'c Corpus, plan: &'c BookPlan, options: &'c RenderOptions) -> Self {
        Self { corpus, plan, options }
    }

    /// Resolves chapters, cross-checks them, normalizes the threads they use,
    /// assembles the chapter files and patches their links.
    ///
    /// Structural problems abort with an error; everything else ends up in
    /// [`BuiltBook::diagnostics`].
    pub fn build(&self, assets: &dyn AssetStore, avatars: &dyn AvatarStore) -> Result<BuiltBook<'c>, BookError> {
        let chapters = self.plan.chapters_for(self.corpus, self.options)?;
        verify(self.corpus, &chapters, &self.plan.exclusions, self.options)?;

        let threads = self.threads_in(&chapters)?;
        let mut cache = Normalizer::new(assets).normalize_threads(&threads);
        let mut diagnostics = cache.take_diagnostics();

        let assembler = ChapterAssembler::new(self.options, avatars, &self.plan.metadata.language);
        let mut files = Vec::new();
        for chapter in &chapters {
            files.extend(assembler.assemble(chapter, &cache)?);
        }

        let index = LinkIndex::new(&files);
        let patcher = LinkPatcher::new(&index);
        let patched: Vec<String> = files.iter().map(|file| patcher.patch(file, &mut diagnostics)).collect();
        for (file, body) in files.iter_mut().zip(patched) {
            file.body = body;
        }

        book_info!(
            "Built {} chapters into {} files ({} warnings)",
            chapters.len(),
            files.len(),
            diagnostics.len()
        );
        Ok(BuiltBook {
            chapters,
            files,
            diagnostics,
        })
    }

    fn threads_in(&self, chapters: &[Chapter<'_>]) -> Result<Vec<&'c Thread>, BookError> {
        let mut seen: BTreeSet<ThreadId> = BTreeSet::new();
        let mut threads = Vec::new();
        for post in chapters.iter().flat_map(|c| c.posts.iter()) {
            if seen.insert(post.thread) {
                threads.push(self.corpus.thread(post.thread)?);
            }
        }
        Ok(threads)
    }
}
