//! Chapters and their split output files.

use std::collections::BTreeSet;

use book_logging::book_debug;

use crate::dom::{escape_attr, escape_text};
use crate::error::BookError;
use crate::filename::slugify;
use crate::model::{Post, PostRef};
use crate::normalize::ParagraphCache;
use crate::options::RenderOptions;
use crate::render::{AvatarStore, PostRenderer};

/// An ordered run of posts forming one section of the book.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chapter<'c> {
    /// Position in the book, starting at 1.
    pub order: usize,
    /// Editorial label, e.g. `"1"` or `"sandbox-3"`.
    pub key: String,
    pub title: String,
    pub posts: Vec<&'c Post>,
}

impl<'c> Chapter<'c> {
    /// Number of output files, never less than one.
    pub fn split_count(&self, options: &RenderOptions) -> usize {
        match options.split_size() {
            Some(size) => self.posts.len().div_ceil(size).max(1),
            None => 1,
        }
    }

    /// Posts per output file, in order.
    pub fn splits(&self, options: &RenderOptions) -> Vec<&[&'c Post]> {
        match options.split_size() {
            Some(size) if !self.posts.is_empty() => self.posts.chunks(size).collect(),
            _ => vec![self.posts.as_slice()],
        }
    }

    pub fn file_name(&self, split: usize) -> String {
        format!("{:03}_{:02}_{}.xhtml", self.order, split, slugify(&self.title))
    }

    pub fn id(&self, split: usize) -> String {
        format!("chap_{:03}_{:02}", self.order, split)
    }

    /// Table-of-contents label.
    pub fn label(&self) -> String {
        format!("{} - {}", self.key, self.title)
    }
}

/// One assembled XHTML document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterFile {
    pub order: usize,
    pub split: usize,
    pub file_name: String,
    pub id: String,
    pub posts: Vec<PostRef>,
    pub images: BTreeSet<String>,
    pub avatars: BTreeSet<String>,
    pub body: String,
}

pub struct ChapterAssembler<'a> {
    options: &'a RenderOptions,
    renderer: PostRenderer<'a>,
    language: &'a str,
}

impl<'a> ChapterAssembler<'a> {
    pub fn new(options: &'a RenderOptions, avatars: &'a dyn AvatarStore, language: &'a str) -> Self {
        Self {
            options,
            renderer: PostRenderer::new(options, avatars),
            language,
        }
    }

    /// Renders every post of `chapter` into `split_count` documents. Only
    /// the first document carries the chapter heading.
    pub fn assemble(&self, chapter: &Chapter<'_>, cache: &ParagraphCache) -> Result<Vec<ChapterFile>, BookError> {
        let mut files = Vec::with_capacity(chapter.split_count(self.options));
        for (split, posts) in chapter.splits(self.options).into_iter().enumerate() {
            let mut content = String::new();
            if split == 0 {
                content.push_str(&format!(
                    r#"<h1 class="chapter-title">{}</h1>"#,
                    escape_text(&chapter.title)
                ));
            }
            let mut images = BTreeSet::new();
            let mut avatars = BTreeSet::new();
            for post in posts {
                let rendered = self.renderer.render(post, cache)?;
                content.push_str(&rendered.markup);
                images.extend(cache.get(post)?.images.iter().cloned());
                avatars.extend(rendered.avatar);
            }
            let file_name = chapter.file_name(split);
            book_debug!("Assembled {} with {} posts", file_name, posts.len());
            files.push(ChapterFile {
                order: chapter.order,
                split,
                file_name,
                id: chapter.id(split),
                posts: posts.iter().map(|post| post.post_ref()).collect(),
                images,
                avatars,
                body: xhtml_document(&chapter.title, self.language, &content),
            });
        }
        Ok(files)
    }
}

/// Wraps body content in a standalone XHTML 1.1 document.
pub fn xhtml_document(title: &str, language: &str, content: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<!DOCTYPE html PUBLIC "-//W3C//DTD XHTML 1.1//EN" "http://www.w3.org/TR/xhtml11/DTD/xhtml11.dtd">
<html xmlns="http://www.w3.org/1999/xhtml" xml:lang="{lang}">
<head>
<meta http-equiv="Content-Type" content="text/html; charset=UTF-8"/>
<title>{title}</title>
<link rel="stylesheet" type="text/css" href="../stylesheet.css"/>
</head>
<body>
{content}
</body>
</html>
"#,
        lang = escape_attr(language),
        title = escape_text(title),
    )
}
