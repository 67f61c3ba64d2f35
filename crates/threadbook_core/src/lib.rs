//! Threadbook core: turns archived forum threads into normalized e-book
//! chapters. Pure code; all IO lives in `threadbook_engine`.
pub mod book;
pub mod chapter;
pub mod classify;
pub mod diagnostics;
pub mod dom;
mod error;
pub mod exceptions;
pub mod filename;
pub mod images;
pub mod links;
pub mod model;
pub mod normalize;
pub mod options;
pub mod plan;
pub mod render;
pub mod segment;
pub mod slice;
pub mod verify;

pub use book::{BookBuilder, BuiltBook};
pub use chapter::{xhtml_document, Chapter, ChapterAssembler, ChapterFile};
pub use classify::{is_primitive_inline, InlineShape};
pub use diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
pub use error::BookError;
pub use images::{collect_image_sources, image_file_name, AssetStore, ImageRewriter, LOCAL_IMAGE_PREFIX};
pub use links::{LinkIndex, LinkPatcher};
pub use model::{
    Attribution, Corpus, Paragraph, ParagraphKind, Post, PostKey, PostRef, ReplyId, Thread, ThreadId,
};
pub use normalize::{NormalizedPost, Normalizer, ParagraphCache};
pub use options::RenderOptions;
pub use plan::{
    format_subject, BookMetadata, BookPlan, BuildProfile, ChapterSpec, Condition, Exclusion, ExclusionTarget,
};
pub use render::{AvatarStore, NoAvatars, PostRenderer, RenderedPost, AVATAR_PREFIX};
pub use segment::segment_html;
pub use slice::ChapterSlice;
pub use verify::verify;
