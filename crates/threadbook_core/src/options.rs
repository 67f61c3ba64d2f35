use serde::{Deserialize, Serialize};

/// Rendering policy for one build profile.
///
/// Passed by reference through every pipeline stage; a profile never mutates
/// it and never shares normalization state with another profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    /// Posts per output file before a chapter is split. Zero disables splitting.
    pub max_posts_per_file: usize,
    /// Splice the attribution into the opening of the first plain paragraph.
    pub inline_attribution: bool,
    pub include_avatars: bool,
    /// Show the character name in parentheses when an alias took its place.
    pub include_alias: bool,
    pub include_screen_name: bool,
    pub include_author_name: bool,
    pub include_icon_keywords: bool,
    pub trim_leading_empty: bool,
    pub trim_trailing_empty: bool,
    /// Use the safe-for-work substitute chapters.
    pub use_sfw_chapters: bool,
    /// Leave out side stories and sandbox threads.
    pub only_main_story: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            max_posts_per_file: 250,
            inline_attribution: true,
            include_avatars: false,
            include_alias: true,
            include_screen_name: false,
            include_author_name: false,
            include_icon_keywords: false,
            trim_leading_empty: true,
            trim_trailing_empty: true,
            use_sfw_chapters: false,
            only_main_story: false,
        }
    }
}

impl RenderOptions {
    /// Number of posts per split file, `None` when chapters are never split.
    pub fn split_size(&self) -> Option<usize> {
        (self.max_posts_per_file > 0).then_some(self.max_posts_per_file)
    }
}
