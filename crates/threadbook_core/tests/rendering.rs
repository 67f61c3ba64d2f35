mod common;

use std::collections::HashMap;

use pretty_assertions::assert_eq;
use threadbook_core::{
    Attribution, AvatarStore, BookError, NoAvatars, Paragraph, ParagraphCache, ParagraphKind, Post, PostKey,
    PostRenderer, RenderOptions,
};

fn paragraph(markup: &str) -> Paragraph {
    Paragraph::new(ParagraphKind::Plain, markup, false)
}

fn empty() -> Paragraph {
    Paragraph::new(ParagraphKind::Plain, "<p> </p>", true)
}

fn post_with(attribution: Attribution) -> Post {
    Post::new(7, PostKey::Reply(70), common::at(), common::at(), attribution, "")
}

#[test]
fn attribution_is_spliced_into_first_paragraph() {
    let options = RenderOptions::default();
    let renderer = PostRenderer::new(&options, &NoAvatars);
    let post = post_with(common::character("Keltham"));

    let rendered = renderer
        .render_paragraphs(&post, &[paragraph("<p>Hello.</p>"), paragraph("<p>Bye.</p>")])
        .unwrap();

    assert_eq!(
        rendered.markup,
        concat!(
            r#"<div class="post" id="reply-70">"#,
            r#"<p><span class="attribution"><b>Keltham</b></span>: Hello.</p><p>Bye.</p></div>"#
        )
    );
    assert_eq!(rendered.avatar, None);
}

#[test]
fn block_attribution_when_first_paragraph_is_not_plain() {
    let options = RenderOptions::default();
    let renderer = PostRenderer::new(&options, &NoAvatars);
    let post = post_with(common::character("Keltham"));

    let rendered = renderer
        .render_paragraphs(&post, &[Paragraph::new(ParagraphKind::Rule, "<hr/>", false)])
        .unwrap();

    assert_eq!(
        rendered.markup,
        r#"<div class="post" id="reply-70"><div class="attribution"><b>Keltham</b></div><br/><hr/></div>"#
    );
}

#[test]
fn avatars_use_the_header_block() {
    let options = RenderOptions {
        include_avatars: true,
        ..RenderOptions::default()
    };
    let avatars: HashMap<u64, String> = [(5, "5.png".to_string())].into_iter().collect();
    let renderer = PostRenderer::new(&options, &avatars);
    let post = post_with(Attribution {
        icon_id: Some(5),
        ..common::character("Keltham")
    });

    let rendered = renderer.render_paragraphs(&post, &[paragraph("<p>Hi.</p>")]).unwrap();

    assert!(rendered
        .markup
        .contains(r#"<div class="post-header"><img class="avatar" src="../Avatars/5.png" alt=""/>"#));
    assert!(rendered.markup.ends_with("</div><p>Hi.</p></div>"));
    assert_eq!(rendered.avatar.as_deref(), Some("5.png"));
    assert_eq!(avatars.avatar_file(6), None);
}

#[test]
fn empty_paragraphs_are_trimmed_per_side() {
    let options = RenderOptions {
        trim_leading_empty: true,
        trim_trailing_empty: false,
        inline_attribution: false,
        ..RenderOptions::default()
    };
    let renderer = PostRenderer::new(&options, &NoAvatars);
    let post = post_with(common::character("Keltham"));

    let rendered = renderer
        .render_paragraphs(&post, &[empty(), paragraph("<p>x</p>"), empty()])
        .unwrap();

    assert!(rendered.markup.ends_with("<br/><p>x</p><p> </p></div>"));
}

#[test]
fn sub_lines_are_stacked_under_the_name() {
    let options = RenderOptions {
        inline_attribution: false,
        include_icon_keywords: true,
        include_screen_name: true,
        include_author_name: true,
        ..RenderOptions::default()
    };
    let renderer = PostRenderer::new(&options, &NoAvatars);
    let post = post_with(Attribution {
        icon_keyword: Some("smug".into()),
        screen_name: Some("dath_ilani".into()),
        ..common::character("Keltham")
    });

    let rendered = renderer.render_paragraphs(&post, &[paragraph("<p>x</p>")]).unwrap();

    assert!(rendered.markup.contains(
        r#"<div class="attribution"><b>Keltham</b><br/><small>smug</small><br/><small>dath_ilani</small><br/><small>author</small></div>"#
    ));
}

#[test]
fn rendering_an_unnormalized_post_fails() {
    let options = RenderOptions::default();
    let renderer = PostRenderer::new(&options, &NoAvatars);
    let post = post_with(common::character("Keltham"));

    let err = renderer.render(&post, &ParagraphCache::new()).unwrap_err();

    assert_eq!(err, BookError::NotNormalized(post.post_ref()));
}
