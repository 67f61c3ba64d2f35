mod common;

use std::collections::HashSet;

use pretty_assertions::assert_eq;
use threadbook_core::{
    verify, BookBuilder, BookError, BookPlan, Chapter, ChapterAssembler, Corpus, DiagnosticKind, NoAvatars, Normalizer,
    Post, PostKey, RenderOptions, Thread,
};

const PLAN: &str = r#"(
    metadata: (
        title: "Test Book",
        authors: ["A. Writer"],
        language: "en",
        identifier: "urn:uuid:00000000-0000-0000-0000-000000000001",
    ),
    chapters: [
        (key: "1", thread: 1, slice: Until(marker: 12, inclusive: true)),
        (key: "2", thread: 1, slice: After(marker: 12, inclusive: false), title: "Part two of {subject}"),
        (key: "S1", thread: 2, when: [FullStory]),
    ],
    exclusions: [
        (target: Thread(3), note: "scratch thread"),
        (target: Thread(2), when: [MainStory]),
    ],
    profiles: [
        (name: "full", output: "book.epub", options: (max_posts_per_file: 2)),
        (name: "main", output: "main.epub", options: (only_main_story: true)),
    ],
)"#;

fn corpus() -> Corpus {
    let first = common::thread(1, "mad investor chaos", 0..0);
    let replies: Vec<Post> = vec![
        common::reply(1, 10, "<p>Ten.</p>"),
        common::reply(1, 11, "<p>Eleven.</p>"),
        common::reply(1, 12, "<p>Twelve.</p>"),
        common::reply(
            1,
            13,
            concat!(
                r#"<p>See <a href="https://glowfic.com/replies/11">this</a>, "#,
                r#"<a href="https://glowfic.com/posts/2">that</a> and "#,
                r#"<a href="https://glowfic.com/replies/999">gone</a>.</p>"#
            ),
        ),
        common::reply(1, 14, r#"<p>More at <a href="https://example.net/x">a blog</a>.</p>"#),
    ];
    let thread_one = Thread::new(
        1,
        "mad investor chaos",
        "",
        common::at(),
        first.first_post().clone(),
        replies,
    );
    Corpus::new([thread_one, common::thread(2, "sandbox", [20, 21, 22]), common::thread(3, "scratch", [30])])
}

fn plan() -> BookPlan {
    ron::from_str(PLAN).unwrap()
}

fn no_assets() -> HashSet<String> {
    HashSet::new()
}

#[test]
fn plan_is_read_from_ron() {
    let plan = plan();
    assert_eq!(plan.chapters.len(), 3);
    assert_eq!(plan.chapters[0].title, "{subject}");
    assert_eq!(plan.profile("full").unwrap().options.max_posts_per_file, 2);
    assert!(plan.profile("full").unwrap().archive);
    assert!(plan.profile("missing").is_none());
}

#[test]
fn full_profile_builds_every_chapter_with_splits() {
    book_logging::initialize_for_tests();
    let corpus = corpus();
    let plan = plan();
    let options = plan.profile("full").unwrap().options.clone();

    let book = BookBuilder::new(&corpus, &plan, &options)
        .build(&no_assets(), &NoAvatars)
        .unwrap();

    let titles: Vec<&str> = book.chapters.iter().map(|c| c.title.as_str()).collect();
    assert_eq!(titles, vec!["Mad investor chaos", "Part two of Mad investor chaos", "Sandbox"]);

    let names: Vec<&str> = book.files.iter().map(|f| f.file_name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "001_00_Mad_investor_chaos.xhtml",
            "001_01_Mad_investor_chaos.xhtml",
            "002_00_Part_two_of_Mad_investor_chaos.xhtml",
            "003_00_Sandbox.xhtml",
            "003_01_Sandbox.xhtml",
        ]
    );
    assert!(book.files[0].body.contains(r#"<h1 class="chapter-title">Mad investor chaos</h1>"#));
    assert!(!book.files[1].body.contains("<h1"));
}

#[test]
fn internal_links_are_patched_and_unknown_ones_reported() {
    book_logging::initialize_for_tests();
    let corpus = corpus();
    let plan = plan();
    let options = plan.profile("full").unwrap().options.clone();

    let book = BookBuilder::new(&corpus, &plan, &options)
        .build(&no_assets(), &NoAvatars)
        .unwrap();

    let body = &book.files[2].body;
    assert!(body.contains(r#"<a href="001_01_Mad_investor_chaos.xhtml#reply-11">this</a>"#));
    assert!(body.contains(r#"<a href="003_00_Sandbox.xhtml">that</a>"#));
    assert!(body.contains(r#"<a href="https://glowfic.com/replies/999">gone</a>"#));
    assert!(body.contains(r#"<a href="https://example.net/x">a blog</a>"#));
    assert_eq!(book.diagnostics.count(DiagnosticKind::UnresolvedLink), 1);
    assert_eq!(book.diagnostics.count(DiagnosticKind::UnknownLink), 1);
}

#[test]
fn main_story_profile_drops_side_thread() {
    let corpus = corpus();
    let plan = plan();
    let options = plan.profile("main").unwrap().options.clone();

    let book = BookBuilder::new(&corpus, &plan, &options)
        .build(&no_assets(), &NoAvatars)
        .unwrap();

    assert_eq!(book.chapters.len(), 2);
    // No splitting limit below the chapter sizes here.
    assert_eq!(book.files.len(), 2);
}

#[test]
fn missing_chapter_fails_the_cross_check() {
    book_logging::initialize_for_tests();
    let corpus = corpus();
    let mut plan = plan();
    plan.chapters.remove(1);
    plan.chapters.push(plan.chapters[0].clone());
    let options = RenderOptions::default();

    let err = BookBuilder::new(&corpus, &plan, &options)
        .build(&no_assets(), &NoAvatars)
        .unwrap_err();

    match err {
        BookError::Verification {
            unused,
            duplicated,
            unknown,
        } => {
            assert_eq!(unused, vec![PostKey::Reply(13), PostKey::Reply(14)]);
            assert_eq!(
                duplicated,
                vec![
                    PostKey::First(1),
                    PostKey::Reply(10),
                    PostKey::Reply(11),
                    PostKey::Reply(12)
                ]
            );
            assert!(unknown.is_empty());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn excluded_post_inside_a_chapter_is_unknown() {
    let corpus = corpus();
    let mut plan = plan();
    plan.exclusions.retain(|e| e.note != "scratch thread");
    plan.chapters.push(threadbook_core::ChapterSpec {
        key: "X".into(),
        thread: 3,
        slice: Default::default(),
        title: "{subject}".into(),
        when: vec![],
    });
    plan.exclusions.push(threadbook_core::Exclusion {
        target: threadbook_core::ExclusionTarget::Post(30),
        when: vec![],
        note: String::new(),
    });
    let options = RenderOptions::default();

    let err = BookBuilder::new(&corpus, &plan, &options)
        .build(&no_assets(), &NoAvatars)
        .unwrap_err();

    assert!(matches!(err, BookError::Verification { ref unknown, .. } if unknown == &vec![PostKey::Reply(30)]));
}

#[test]
fn unknown_marker_aborts_the_build() {
    let corpus = corpus();
    let plan: BookPlan = ron::from_str(
        r#"(chapters: [(key: "1", thread: 1, slice: Between(start: 10, end: 77, inclusive_start: false, inclusive_end: true))])"#,
    )
    .unwrap();
    let options = RenderOptions::default();

    let err = BookBuilder::new(&corpus, &plan, &options)
        .build(&no_assets(), &NoAvatars)
        .unwrap_err();

    assert_eq!(err, BookError::MarkerNotFound { thread: 1, marker: 77 });
}

#[test]
fn split_files_cover_the_chapter_in_order() {
    let thread = common::thread(5, "long", 1..=23);
    let corpus = Corpus::new([thread]);
    let posts: Vec<&Post> = corpus.posts().collect();
    let chapter = Chapter {
        order: 4,
        key: "4".into(),
        title: "Long".into(),
        posts: posts.clone(),
    };
    let threads: Vec<&Thread> = corpus.threads().collect();
    let assets = no_assets();
    let cache = Normalizer::new(&assets).normalize_threads(&threads);

    for max in [1, 5, 7, 24, 100] {
        let options = RenderOptions {
            max_posts_per_file: max,
            ..RenderOptions::default()
        };
        let files = ChapterAssembler::new(&options, &NoAvatars, "en")
            .assemble(&chapter, &cache)
            .unwrap();

        assert_eq!(files.len(), posts.len().div_ceil(max));
        let concatenated: Vec<PostKey> = files.iter().flat_map(|f| f.posts.iter().map(|p| p.key)).collect();
        let original: Vec<PostKey> = posts.iter().map(|p| p.key).collect();
        assert_eq!(concatenated, original);
    }
}

#[test]
fn empty_chapter_still_gets_one_file() {
    let corpus = Corpus::new([common::thread(6, "empty", 0..0)]);
    let chapter = Chapter {
        order: 1,
        key: "1".into(),
        title: "Nothing".into(),
        posts: Vec::new(),
    };
    let options = RenderOptions::default();
    let files = ChapterAssembler::new(&options, &NoAvatars, "en")
        .assemble(&chapter, &Normalizer::new(&no_assets()).normalize_threads(&[]))
        .unwrap();
    assert_eq!(files.len(), 1);
    assert!(files[0].posts.is_empty());
    assert!(!corpus.is_empty());
}

const SAMPLE_PLAN: &str = include_str!("../../../config/book.ron");

/// Every thread the sample plan names, with replies around its slice markers.
fn sample_corpus() -> Corpus {
    let with_replies = |id, replies: &[u64]| common::thread(id, &format!("thread {id}"), replies.iter().copied());
    Corpus::new([
        with_replies(4582, &[1721800, 1721818, 1721830]),
        with_replies(5310, &[1730000]),
        with_replies(5504, &[1740000]),
        with_replies(5506, &[1750000]),
        with_replies(5508, &[1756300, 1756345, 1756400, 1760768, 1760800]),
        with_replies(5610, &[1757000]),
        with_replies(5638, &[1761000]),
        with_replies(5775, &[1790000]),
        with_replies(5778, &[1791000]),
        with_replies(5403, &[1722000]),
        with_replies(5521, &[1745000]),
        with_replies(5618, &[1758000]),
        with_replies(5671, &[1762000]),
    ])
}

#[test]
fn sample_plan_covers_every_post_under_each_profile() {
    let plan: BookPlan = ron::from_str(SAMPLE_PLAN).unwrap();
    let corpus = sample_corpus();
    assert_eq!(plan.profiles.len(), 4);

    for profile in &plan.profiles {
        let chapters = plan.chapters_for(&corpus, &profile.options).unwrap();
        let result = verify(&corpus, &chapters, &plan.exclusions, &profile.options);
        assert!(result.is_ok(), "profile {}: {:?}", profile.name, result);
    }
}
