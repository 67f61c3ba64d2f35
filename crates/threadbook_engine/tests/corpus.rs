use std::fs;
use std::path::Path;

use pretty_assertions::assert_eq;
use tempfile::TempDir;
use threadbook_core::{AvatarStore, PostKey, Thread};
use threadbook_engine::{load_corpus, AvatarDirectory, CorpusError};

const POST: &str = r#"{"Ok": {
    "id": 4582,
    "subject": "mad investor chaos and the woman of asmodeus",
    "description": "",
    "created_at": "2021-06-24T22:11:04.521Z",
    "num_replies": "2",
    "content": "<p>Opening.</p>",
    "character": {"id": 1, "name": "Keltham", "screenname": "dath_ilani"},
    "icon": {"id": 31, "keyword": "smug", "url": "https://icons.example/31.png"},
    "user": {"id": 2, "username": "Iarwain"}
}}"#;

const REPLIES: &str = r#"{"Ok": [
    {
        "id": 1721818,
        "content": "<p>First reply.</p>",
        "created_at": "2021-06-24T22:30:00Z",
        "updated_at": "2021-06-25T08:00:00Z",
        "character": {"id": 7, "name": "Carissa Sevar", "screenname": "sevar"},
        "character_name": "Carissa",
        "icon": {"id": 40, "keyword": "image"},
        "user": {"id": 3, "username": "lintamande"}
    },
    {
        "id": 1721819,
        "content": "<p>Second.</p>",
        "created_at": "2021-06-24T22:31:00Z",
        "updated_at": "2021-06-24T22:31:00Z",
        "character": {},
        "character_name": null,
        "icon": {},
        "user": {"id": 2, "username": "Iarwain"}
    }
]}"#;

fn write_thread(root: &Path, id: u64, post: &str, replies: &str) {
    let dir = root.join("posts").join(id.to_string());
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("post.json"), post).unwrap();
    fs::write(dir.join("replies.json"), replies).unwrap();
}

fn only_thread(root: &Path) -> Thread {
    let corpus = load_corpus(root).unwrap();
    assert_eq!(corpus.len(), 1);
    let thread = corpus.threads().next().unwrap().clone();
    thread
}

#[test]
fn loads_thread_with_first_post_and_replies() {
    book_logging::initialize_for_tests();
    let temp = TempDir::new().unwrap();
    write_thread(temp.path(), 4582, POST, REPLIES);

    let thread = only_thread(temp.path());

    assert_eq!(thread.id, 4582);
    assert_eq!(thread.subject, "mad investor chaos and the woman of asmodeus");
    assert_eq!(thread.post_count(), 3);
    let keys: Vec<PostKey> = thread.posts().map(|p| p.key).collect();
    assert_eq!(
        keys,
        vec![PostKey::First(4582), PostKey::Reply(1721818), PostKey::Reply(1721819)]
    );

    let first = thread.first_post();
    assert_eq!(first.content(), "<p>Opening.</p>");
    assert_eq!(first.attribution.character_name.as_deref(), Some("Keltham"));
    assert_eq!(first.attribution.screen_name.as_deref(), Some("dath_ilani"));
    assert_eq!(first.attribution.icon_id, Some(31));
    assert_eq!(first.attribution.user_name.as_deref(), Some("Iarwain"));
}

#[test]
fn differing_character_name_becomes_the_alias() {
    let temp = TempDir::new().unwrap();
    write_thread(temp.path(), 4582, POST, REPLIES);

    let thread = only_thread(temp.path());
    let reply = &thread.replies()[0];

    assert_eq!(reply.attribution.character_name.as_deref(), Some("Carissa Sevar"));
    assert_eq!(reply.attribution.alt_name.as_deref(), Some("Carissa"));
    assert_eq!(reply.attribution.icon_keyword.as_deref(), Some("image"));
    assert_ne!(reply.created_at, reply.updated_at);
}

#[test]
fn empty_objects_mean_no_character_or_icon() {
    let temp = TempDir::new().unwrap();
    write_thread(temp.path(), 4582, POST, REPLIES);

    let thread = only_thread(temp.path());
    let reply = &thread.replies()[1];

    assert_eq!(reply.attribution.character_name, None);
    assert_eq!(reply.attribution.alt_name, None);
    assert_eq!(reply.attribution.icon_id, None);
    assert_eq!(reply.attribution.user_id, Some(2));
}

#[test]
fn duplicate_reply_ids_are_rejected() {
    let temp = TempDir::new().unwrap();
    write_thread(temp.path(), 4582, POST, REPLIES);
    write_thread(temp.path(), 4583, &POST.replace("4582", "4583"), REPLIES);

    let err = load_corpus(temp.path()).unwrap_err();

    assert!(matches!(
        err,
        CorpusError::DuplicateReply {
            reply: 1721818,
            first: 4582,
            second: 4583
        }
    ));
}

#[test]
fn malformed_json_names_the_file() {
    let temp = TempDir::new().unwrap();
    write_thread(temp.path(), 9, POST, "{\"Ok\": [");

    let err = load_corpus(temp.path()).unwrap_err();

    match err {
        CorpusError::Json { path, .. } => assert!(path.ends_with("replies.json")),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn missing_posts_directory_is_a_layout_error() {
    let temp = TempDir::new().unwrap();
    assert!(matches!(load_corpus(temp.path()), Err(CorpusError::Layout(_))));
}

#[test]
fn avatar_directory_indexes_icon_files() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("31.png"), b"a").unwrap();
    fs::write(temp.path().join("40.jpg"), b"b").unwrap();
    fs::write(temp.path().join("notes.txt"), b"c").unwrap();

    let avatars = AvatarDirectory::scan(temp.path()).unwrap();

    assert_eq!(avatars.len(), 2);
    assert_eq!(avatars.avatar_file(31).as_deref(), Some("31.png"));
    assert_eq!(avatars.avatar_file(40).as_deref(), Some("40.jpg"));
    assert_eq!(avatars.avatar_file(1), None);
    assert!(AvatarDirectory::scan(temp.path().join("missing")).unwrap().is_empty());
}
