//! Maps external image references onto the content-addressed local cache.

use std::collections::{BTreeSet, HashSet};

use book_logging::book_debug;
use url::Url;

use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::dom;
use crate::exceptions;
use crate::filename::content_key;
use crate::model::PostRef;

/// Package folder holding content images, relative to the chapter files.
pub const LOCAL_IMAGE_PREFIX: &str = "../Images/";
pub const FALLBACK_EXTENSION: &str = "png";
const KNOWN_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp", "svg", "bmp"];

/// Read access to the local image cache.
pub trait AssetStore: Send + Sync {
    fn has_asset(&self, file_name: &str) -> bool;
}

impl AssetStore for HashSet<String> {
    fn has_asset(&self, file_name: &str) -> bool {
        self.contains(file_name)
    }
}

impl AssetStore for BTreeSet<String> {
    fn has_asset(&self, file_name: &str) -> bool {
        self.contains(file_name)
    }
}

/// Cache file name for an image source: `<content key>.<extension>`.
pub fn image_file_name(source: &str) -> String {
    format!("{}.{}", content_key(source), image_extension(source))
}

/// Extension from the override table, else from the URL path, else the fallback.
pub fn image_extension(source: &str) -> String {
    if let Some(ext) = exceptions::image_extension_override(source) {
        return ext.to_string();
    }
    let path = match Url::parse(source) {
        Ok(url) => url.path().to_string(),
        Err(_) => source.split(['?', '#']).next().unwrap_or_default().to_string(),
    };
    path.rsplit('/')
        .next()
        .and_then(|segment| segment.rsplit_once('.'))
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .filter(|ext| KNOWN_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or_else(|| FALLBACK_EXTENSION.to_string())
}

pub fn is_local_source(source: &str) -> bool {
    source.starts_with(LOCAL_IMAGE_PREFIX)
}

fn is_fetchable(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}

/// External image sources referenced by a post body, in document order.
pub fn collect_image_sources(html: &str) -> Vec<String> {
    let doc = dom::parse_content(html);
    doc.root_element()
        .descendants()
        .filter(|node| dom::is_tag(*node, "img"))
        .filter_map(|node| dom::element(node).and_then(|el| el.attr("src")))
        .map(str::trim)
        .filter(|src| is_fetchable(src))
        .map(str::to_string)
        .collect()
}

/// Result of rewriting one post body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewrittenContent {
    pub html: String,
    /// Cache file names now referenced by the body.
    pub assets: Vec<String>,
}

pub struct ImageRewriter<'a> {
    store: &'a dyn AssetStore,
}

impl<'a> ImageRewriter<'a> {
    pub fn new(store: &'a dyn AssetStore) -> Self {
        Self { store }
    }

    /// Points every cached `<img>` at the local folder and drops its sizing
    /// attributes. Uncached images are reported and left untouched.
    pub fn rewrite(&self, html: &str, post: PostRef, diagnostics: &mut Diagnostics) -> RewrittenContent {
        let doc = dom::parse_content(html);
        let mut assets = Vec::new();
        let mut out = String::with_capacity(html.len());
        let mut rewrite = |el: &scraper::node::Element| {
            if el.name() != "img" {
                return None;
            }
            let source = el.attr("src")?.trim();
            if is_local_source(source) || !is_fetchable(source) {
                return None;
            }
            let file_name = image_file_name(source);
            if !self.store.has_asset(&file_name) {
                diagnostics.report(
                    DiagnosticKind::MissingAsset,
                    Some(post),
                    format!("{source} (expected {file_name})"),
                );
                return None;
            }
            book_debug!("Rewriting image {} -> {} in {}", source, file_name, post);
            let mut attrs: Vec<(String, String)> = dom::sorted_attrs(el)
                .into_iter()
                .filter(|(name, _)| !matches!(name.as_str(), "src" | "width" | "height"))
                .collect();
            attrs.push(("src".to_string(), format!("{LOCAL_IMAGE_PREFIX}{file_name}")));
            attrs.sort();
            assets.push(file_name);
            Some(attrs)
        };
        for child in doc.root_element().children() {
            dom::write_node(child, &mut out, &mut rewrite);
        }
        RewrittenContent { html: out, assets }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PostKey;

    fn post() -> PostRef {
        PostRef {
            thread: 1,
            key: PostKey::Reply(2),
        }
    }

    #[test]
    fn extension_comes_from_path_and_ignores_query() {
        assert_eq!(image_extension("https://x.org/a/b/pic.JPG?size=large"), "jpg");
        assert_eq!(image_extension("https://x.org/a/b/pic.gif#frag"), "gif");
    }

    #[test]
    fn extension_falls_back_when_unknown() {
        assert_eq!(image_extension("https://x.org/image"), FALLBACK_EXTENSION);
        assert_eq!(image_extension("https://x.org/page.php"), FALLBACK_EXTENSION);
    }

    #[test]
    fn extension_override_table_wins() {
        assert_eq!(image_extension("https://glowfic.com/image?id=7551"), "gif");
    }

    #[test]
    fn same_url_gives_same_file_name() {
        let a = image_file_name("https://x.org/a.png");
        assert_eq!(a, image_file_name("https://x.org/a.png"));
        assert!(a.ends_with(".png"));
    }

    #[test]
    fn cached_image_is_rewritten_and_sized_attributes_dropped() {
        let src = "https://x.org/a.png";
        let name = image_file_name(src);
        let store: HashSet<String> = [name.clone()].into_iter().collect();
        let mut diagnostics = Diagnostics::new();
        let html = format!(r#"<p><img src="{src}" width="300" height="200" alt="map"></p>"#);

        let out = ImageRewriter::new(&store).rewrite(&html, post(), &mut diagnostics);

        assert_eq!(out.html, format!(r#"<p><img alt="map" src="../Images/{name}"/></p>"#));
        assert_eq!(out.assets, vec![name]);
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn missing_image_is_reported_and_left_alone() {
        let store: HashSet<String> = HashSet::new();
        let mut diagnostics = Diagnostics::new();
        let html = r#"<p><img src="https://x.org/a.png" width="3"></p>"#;

        let out = ImageRewriter::new(&store).rewrite(html, post(), &mut diagnostics);

        assert_eq!(out.html, r#"<p><img src="https://x.org/a.png" width="3"/></p>"#);
        assert!(out.assets.is_empty());
        assert_eq!(diagnostics.count(DiagnosticKind::MissingAsset), 1);
    }

    #[test]
    fn collects_only_remote_sources() {
        let html = r#"<p><img src="https://x.org/a.png"><img src="../Images/b.png"><img src="data:image/png;base64,AA"></p>"#;
        assert_eq!(collect_image_sources(html), vec!["https://x.org/a.png".to_string()]);
    }
}
