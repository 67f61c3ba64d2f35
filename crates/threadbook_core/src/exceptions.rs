//! Corpus anomalies that are handled by exact match rather than by a rule.
//!
//! Every entry here was added for one concrete piece of markup found in the
//! archive. Keys are compared against the serialized form produced by
//! [`crate::dom::outer_html`] (attributes sorted, `&#160;` for nbsp).

/// Word-processor debris accepted as empty inline content.
pub const KNOWN_DEBRIS: &[&str] = &[
    r#"<a name="_GoBack"></a>"#,
    r#"<span class="Apple-converted-space">&#160;</span>"#,
    r#"<span class="Apple-converted-space"> </span>"#,
    r#"<span style="font-weight: 400;"></span>"#,
    r#"<o:p></o:p>"#,
];

/// Malformed paragraphs rendered as their plain text.
pub const MANUAL_FRAGMENTS: &[&str] = &[
    concat!(
        r#"<p dir="ltr" style="line-height: 1.38; margin-top: 0pt; margin-bottom: 0pt;">"#,
        r#"<span style="font-size: 11pt; font-family: Arial; vertical-align: baseline;">"#,
        r#"(The sky over Cheliax is very blue today.)</span></p>"#,
    ),
    r#"<div class="MsoNormal"><b><i>[end of excerpt]</i></b></div>"#,
];

/// Image URLs whose path does not reveal the real file type.
pub const IMAGE_EXTENSION_OVERRIDES: &[(&str, &str)] = &[
    ("https://i.imgur.com/7bFaLYz", "png"),
    ("https://pbs.twimg.com/media/FK2hJvSXIAM8YzR?format=jpg&name=large", "jpg"),
    ("https://cdn.discordapp.com/attachments/958143925536579634/1002690617457668167/unknown", "png"),
    ("https://glowfic.com/image?id=7551", "gif"),
];

pub fn is_known_debris(markup: &str) -> bool {
    KNOWN_DEBRIS.contains(&markup)
}

pub fn is_manual_fragment(markup: &str) -> bool {
    MANUAL_FRAGMENTS.contains(&markup)
}

pub fn image_extension_override(url: &str) -> Option<&'static str> {
    IMAGE_EXTENSION_OVERRIDES
        .iter()
        .find(|(source, _)| *source == url)
        .map(|(_, ext)| *ext)
}

/// Series tags some thread subjects open with, stripped from chapter titles.
pub const SUBJECT_PREFIXES: &[&str] = &["tde"];

pub fn strip_subject_prefix(subject: &str) -> &str {
    SUBJECT_PREFIXES
        .iter()
        .find_map(|prefix| {
            subject
                .get(..prefix.len())
                .filter(|head| head.eq_ignore_ascii_case(prefix))
                .map(|_| &subject[prefix.len()..])
        })
        .unwrap_or(subject)
}
