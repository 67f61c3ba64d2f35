//! Package documents: container, OPF manifest, NCX table of contents,
//! title page and stylesheet.

use book_logging::book_warn;
use threadbook_core::dom::{escape_attr, escape_text};
use threadbook_core::{BookMetadata, BuiltBook};

pub const MIMETYPE: &str = "application/epub+zip";
pub const TITLE_PAGE: &str = "000_titlepage.xhtml";
pub const COVER_FILE: &str = "cover.png";
pub const DEFAULT_LANGUAGE: &str = "en";

pub const CONTAINER_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
  <rootfiles>
    <rootfile full-path="OEBPS/content.opf" media-type="application/oebps-package+xml"/>
  </rootfiles>
</container>
"#;

pub const STYLESHEET: &str = r#"blockquote {
  margin-right: 1em;
  background-color: rgba(255,255,255,0.3);
  padding: 0 1em;
  margin-block: 0;
  margin-inline: 0;
  margin-left: 1.5em;
}

details {
  margin: 0.5em 0;
}

summary {
  font-weight: bold;
}

.chapter-title {
  text-align: center;
  margin: 2em 0;
}

.post {
  margin-bottom: 1em;
}

.attribution {
  font-weight: bold;
}

.attribution small {
  font-weight: normal;
}

.post-header {
  height: 5em;
  overflow: hidden;
  margin-bottom: 0.5em;
}

.post-header .avatar {
  float: left;
  height: 5em;
  width: 5em;
  margin-right: 0.5em;
}

table {
  border-collapse: collapse;
}

td, th {
  border: 1px solid #888;
  padding: 0.2em 0.4em;
}

pre {
  white-space: pre-wrap;
}
"#;

/// Media type by file extension, `None` for unknown extensions.
pub fn media_type(file_name: &str) -> Option<&'static str> {
    let ext = file_name.rsplit_once('.')?.1.to_ascii_lowercase();
    match ext.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "svg" => Some("image/svg+xml"),
        "bmp" => Some("image/bmp"),
        "xhtml" => Some("application/xhtml+xml"),
        "css" => Some("text/css"),
        "ncx" => Some("application/x-dtbncx+xml"),
        _ => None,
    }
}

fn manifest_id(prefix: &str, file_name: &str) -> String {
    let cleaned: String = file_name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    format!("{prefix}_{cleaned}")
}

fn language(metadata: &BookMetadata) -> &str {
    if metadata.language.is_empty() {
        DEFAULT_LANGUAGE
    } else {
        &metadata.language
    }
}

fn push_resource(opf: &mut String, id: &str, href: &str, file_name: &str) {
    let media = media_type(file_name).unwrap_or_else(|| {
        book_warn!("Unknown media type for {}", href);
        "application/octet-stream"
    });
    opf.push_str(&format!(
        "    <item id=\"{}\" href=\"{}\" media-type=\"{}\"/>\n",
        escape_attr(id),
        escape_attr(href),
        media
    ));
}

pub fn content_opf(book: &BuiltBook<'_>, metadata: &BookMetadata, modified: &str, has_cover: bool) -> String {
    let mut opf = String::new();
    opf.push_str(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
    opf.push('\n');
    opf.push_str(r#"<package xmlns="http://www.idpf.org/2007/opf" unique-identifier="BookId" version="2.0">"#);
    opf.push('\n');
    opf.push_str(
        r#"  <metadata xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:opf="http://www.idpf.org/2007/opf">"#,
    );
    opf.push('\n');
    opf.push_str(&format!("    <dc:title>{}</dc:title>\n", escape_text(&metadata.title)));
    for author in &metadata.authors {
        opf.push_str(&format!(
            "    <dc:creator opf:role=\"aut\">{}</dc:creator>\n",
            escape_text(author)
        ));
    }
    if !metadata.description.is_empty() {
        opf.push_str(&format!(
            "    <dc:description>{}</dc:description>\n",
            escape_text(&metadata.description)
        ));
    }
    if !metadata.source.is_empty() {
        opf.push_str(&format!("    <dc:source>{}</dc:source>\n", escape_text(&metadata.source)));
    }
    opf.push_str(&format!(
        "    <dc:identifier id=\"BookId\" opf:scheme=\"UUID\">{}</dc:identifier>\n",
        escape_text(&metadata.identifier)
    ));
    if !metadata.published.is_empty() {
        opf.push_str(&format!(
            "    <dc:date opf:event=\"publication\">{}</dc:date>\n",
            escape_text(&metadata.published)
        ));
    }
    opf.push_str(&format!(
        "    <dc:date opf:event=\"modification\">{}</dc:date>\n",
        escape_text(modified)
    ));
    opf.push_str(&format!("    <dc:language>{}</dc:language>\n", escape_text(language(metadata))));
    if has_cover {
        opf.push_str("    <meta name=\"cover\" content=\"cover\"/>\n");
    }
    opf.push_str("  </metadata>\n");

    opf.push_str("  <manifest>\n");
    push_resource(&mut opf, "titlepage", &format!("Text/{TITLE_PAGE}"), TITLE_PAGE);
    for file in &book.files {
        push_resource(&mut opf, &file.id, &format!("Text/{}", file.file_name), &file.file_name);
    }
    push_resource(&mut opf, "css", "stylesheet.css", "stylesheet.css");
    for image in book.images() {
        push_resource(&mut opf, &manifest_id("img", &image), &format!("Images/{image}"), &image);
    }
    for avatar in book.avatars() {
        push_resource(&mut opf, &manifest_id("ava", &avatar), &format!("Avatars/{avatar}"), &avatar);
    }
    push_resource(&mut opf, "ncx", "toc.ncx", "toc.ncx");
    if has_cover {
        push_resource(&mut opf, "cover", COVER_FILE, COVER_FILE);
    }
    opf.push_str("  </manifest>\n");

    opf.push_str("  <spine toc=\"ncx\">\n");
    opf.push_str("    <itemref idref=\"titlepage\"/>\n");
    for file in &book.files {
        opf.push_str(&format!("    <itemref idref=\"{}\"/>\n", escape_attr(&file.id)));
    }
    opf.push_str("  </spine>\n");
    opf.push_str("  <guide/>\n");
    opf.push_str("</package>\n");
    opf
}

/// One navigation point per chapter, pointing at its first file.
pub fn toc_ncx(book: &BuiltBook<'_>, metadata: &BookMetadata) -> String {
    let mut ncx = String::new();
    ncx.push_str(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
    ncx.push('\n');
    ncx.push_str(
        r#"<!DOCTYPE ncx PUBLIC "-//NISO//DTD ncx 2005-1//EN" "http://www.daisy.org/z3986/2005/ncx-2005-1.dtd">"#,
    );
    ncx.push('\n');
    ncx.push_str(r#"<ncx xmlns="http://www.daisy.org/z3986/2005/ncx/" version="2005-1">"#);
    ncx.push_str("\n  <head>\n");
    ncx.push_str(&format!(
        "    <meta name=\"dtb:uid\" content=\"{}\"/>\n",
        escape_attr(&metadata.identifier)
    ));
    ncx.push_str("    <meta name=\"dtb:depth\" content=\"1\"/>\n");
    ncx.push_str("    <meta name=\"dtb:totalPageCount\" content=\"0\"/>\n");
    ncx.push_str("    <meta name=\"dtb:maxPageNumber\" content=\"0\"/>\n");
    ncx.push_str("  </head>\n");
    ncx.push_str(&format!(
        "  <docTitle><text>{}</text></docTitle>\n",
        escape_text(&metadata.title)
    ));
    ncx.push_str("  <navMap>\n");
    for chapter in &book.chapters {
        let Some(file) = book.first_file(chapter.order) else {
            continue;
        };
        ncx.push_str(&format!(
            "    <navPoint id=\"navPoint-{order}\" playOrder=\"{order}\">\n",
            order = chapter.order
        ));
        ncx.push_str(&format!(
            "      <navLabel><text>{}</text></navLabel>\n",
            escape_text(&chapter.label())
        ));
        ncx.push_str(&format!(
            "      <content src=\"Text/{}\"/>\n",
            escape_attr(&file.file_name)
        ));
        ncx.push_str("    </navPoint>\n");
    }
    ncx.push_str("  </navMap>\n");
    ncx.push_str("</ncx>\n");
    ncx
}

pub fn title_page(metadata: &BookMetadata, has_cover: bool) -> String {
    let mut body = String::new();
    body.push_str(&format!(
        "<h1 class=\"book-title\">{}</h1>\n",
        escape_text(&metadata.title)
    ));
    if has_cover {
        body.push_str(concat!(
            r#"<svg version="1.1" xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink" "#,
            r#"width="80%" viewBox="0 0 100 100" preserveAspectRatio="xMidYMid meet">"#,
            r#"<image width="100" height="100" xlink:href="../cover.png"/></svg>"#,
            "\n"
        ));
    }
    body.push_str("<div class=\"book-authors\">\n");
    for author in &metadata.authors {
        body.push_str(&format!("<p><i>{}</i></p>\n", escape_text(author)));
    }
    if !metadata.source.is_empty() {
        body.push_str(&format!(
            "<p>( <a href=\"{}\">{}</a> )</p>\n",
            escape_attr(&metadata.source),
            escape_text(&metadata.source)
        ));
    }
    body.push_str("</div>");
    threadbook_core::xhtml_document(&metadata.title, language(metadata), &body)
}
