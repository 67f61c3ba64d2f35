#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use threadbook_core::{Attribution, Post, PostKey, Thread, ThreadId};

pub fn at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2022, 3, 14, 12, 0, 0).unwrap()
}

pub fn character(name: &str) -> Attribution {
    Attribution {
        character_id: Some(1),
        character_name: Some(name.to_string()),
        user_id: Some(100),
        user_name: Some("author".to_string()),
        ..Attribution::default()
    }
}

pub fn reply(thread: ThreadId, id: u64, content: &str) -> Post {
    Post::new(thread, PostKey::Reply(id), at(), at(), character("Keltham"), content)
}

pub fn thread(id: ThreadId, subject: &str, reply_ids: impl IntoIterator<Item = u64>) -> Thread {
    let first = Post::new(id, PostKey::First(id), at(), at(), character("Carissa"), "<p>Opening.</p>");
    let replies = reply_ids
        .into_iter()
        .map(|reply_id| reply(id, reply_id, &format!("<p>Reply {reply_id}.</p>")))
        .collect();
    Thread::new(id, subject, "", at(), first, replies)
}
