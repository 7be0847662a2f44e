//! JSON builders shared by the integration tests.

#![allow(dead_code)]

use serde_json::{Value, json};

/// Smallest byte sequence `infer` recognises as a PNG.
pub const PNG_BYTES: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44, 0x52,
];

pub fn user_json(id: u64, username: &str) -> Value {
    json!({
        "id": id,
        "username": username,
        "email": format!("{username}@example.com"),
        "first_name": "",
        "last_name": "",
    })
}

pub fn profile_json(id: u64, username: &str) -> Value {
    json!({
        "user": user_json(id, username),
        "bio": "",
        "location": "Porto",
        "birth_date": null,
        "avatar": null,
        "cover_photo": null,
    })
}

pub fn post_json(id: u64, likes: u64, comments: u64, shares: u64) -> Value {
    json!({
        "id": id,
        "author": user_json(1, "ann"),
        "content": format!("<p>post {id}</p>"),
        "image": null,
        "post_type": "text",
        "created_at": format!("2024-01-{:02}T10:00:00Z", id.min(28)),
        "likes_count": likes,
        "comments_count": comments,
        "shares_count": shares,
        "comments": [],
        "is_liked": false,
        "is_shared": false,
    })
}

pub fn comment_json(id: u64, content: &str) -> Value {
    json!({
        "id": id,
        "user": user_json(2, "bob"),
        "content": content,
        "created_at": "2024-02-01T09:00:00Z",
    })
}
