//! The editorial book plan: which posts go into which chapter, under which
//! build profile.

use book_logging::{book_debug, book_info};
use serde::{Deserialize, Serialize};

use crate::chapter::Chapter;
use crate::dom;
use crate::error::BookError;
use crate::exceptions;
use crate::model::{Corpus, ReplyId, ThreadId};
use crate::options::RenderOptions;
use crate::slice::ChapterSlice;

/// Placeholder replaced by the formatted thread subject in chapter titles.
pub const SUBJECT_PLACEHOLDER: &str = "{subject}";

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BookMetadata {
    pub title: String,
    pub authors: Vec<String>,
    pub language: String,
    /// Stable book identifier, usually a `urn:uuid:`.
    pub identifier: String,
    pub description: String,
    pub source: String,
    pub published: String,
}

/// Restricts a chapter or exclusion to some build profiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Condition {
    Sfw,
    NotSfw,
    MainStory,
    FullStory,
}

impl Condition {
    pub fn holds(self, options: &RenderOptions) -> bool {
        match self {
            Condition::Sfw => options.use_sfw_chapters,
            Condition::NotSfw => !options.use_sfw_chapters,
            Condition::MainStory => options.only_main_story,
            Condition::FullStory => !options.only_main_story,
        }
    }
}

fn all_hold(conditions: &[Condition], options: &RenderOptions) -> bool {
    conditions.iter().all(|condition| condition.holds(options))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChapterSpec {
    pub key: String,
    pub thread: ThreadId,
    #[serde(default)]
    pub slice: ChapterSlice,
    /// Title template; `{subject}` expands to the thread subject.
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default)]
    pub when: Vec<Condition>,
}

fn default_title() -> String {
    SUBJECT_PLACEHOLDER.to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExclusionTarget {
    Thread(ThreadId),
    Post(ReplyId),
}

/// Corpus content deliberately left out of the book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exclusion {
    pub target: ExclusionTarget,
    #[serde(default)]
    pub when: Vec<Condition>,
    #[serde(default)]
    pub note: String,
}

impl Exclusion {
    pub fn applies(&self, options: &RenderOptions) -> bool {
        all_hold(&self.when, options)
    }
}

/// A named output variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildProfile {
    pub name: String,
    /// Output path relative to the output directory.
    pub output: String,
    #[serde(default = "default_archive")]
    pub archive: bool,
    #[serde(default)]
    pub options: RenderOptions,
}

fn default_archive() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BookPlan {
    pub metadata: BookMetadata,
    pub chapters: Vec<ChapterSpec>,
    pub exclusions: Vec<Exclusion>,
    pub profiles: Vec<BuildProfile>,
}

impl BookPlan {
    pub fn profile(&self, name: &str) -> Option<&BuildProfile> {
        self.profiles.iter().find(|profile| profile.name == name)
    }

    /// Resolves the chapters active under `options`, numbered from 1.
    pub fn chapters_for<'c>(&self, corpus: &'c Corpus, options: &RenderOptions) -> Result<Vec<Chapter<'c>>, BookError> {
        let mut chapters = Vec::new();
        for spec in &self.chapters {
            if !all_hold(&spec.when, options) {
                book_debug!("Chapter {} inactive for this profile", spec.key);
                continue;
            }
            let thread = corpus.thread(spec.thread)?;
            let posts = spec.slice.take(thread)?;
            let title = spec.title.replace(SUBJECT_PLACEHOLDER, &format_subject(&thread.subject));
            chapters.push(Chapter {
                order: chapters.len() + 1,
                key: spec.key.clone(),
                title,
                posts,
            });
        }
        book_info!(
            "Resolved {} chapters ({} posts)",
            chapters.len(),
            chapters.iter().map(|c| c.posts.len()).sum::<usize>()
        );
        Ok(chapters)
    }
}

/// Cleans a thread subject for use as a chapter title.
pub fn format_subject(raw: &str) -> String {
    const DECORATION: &[char] = &['-', ':', '_', '#'];
    let doc = dom::parse_content(raw);
    let text = dom::text_content(*doc.root_element())
        .replace('\u{a0}', " ")
        .replace('\u{2013}', "-");

    let trimmed = text.trim().trim_matches(DECORATION).trim();
    let trimmed = exceptions::strip_subject_prefix(trimmed);
    let trimmed = trimmed.trim().trim_matches(DECORATION).trim();

    let mut chars = trimmed.chars();
    match chars.next() {
        Some(first) if trimmed.chars().count() >= 2 => first.to_uppercase().chain(chars).collect(),
        _ => trimmed.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subject_is_cleaned_and_capitalized() {
        assert_eq!(format_subject("  mad investor chaos  "), "Mad investor chaos");
        assert_eq!(format_subject("# lawful &amp; evil -"), "Lawful & evil");
        assert_eq!(format_subject("tde: in which someone arrives"), "In which someone arrives");
        assert_eq!(format_subject("x"), "x");
    }

    #[test]
    fn conditions_follow_options() {
        let sfw = RenderOptions {
            use_sfw_chapters: true,
            ..RenderOptions::default()
        };
        assert!(Condition::Sfw.holds(&sfw));
        assert!(!Condition::NotSfw.holds(&sfw));
        assert!(Condition::FullStory.holds(&sfw));
        assert!(!Condition::MainStory.holds(&sfw));
    }
}
