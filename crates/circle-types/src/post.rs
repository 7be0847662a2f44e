use serde::{Deserialize, Serialize};

use crate::User;
use crate::null_as_default;

/// Kind of post as stored by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PostKind {
    #[default]
    Text,
    Image,
    Mixed,
}

impl PostKind {
    /// Kind sent on creation: `mixed` with an attachment, `text` otherwise.
    pub fn for_submission(has_image: bool) -> Self {
        if has_image { Self::Mixed } else { Self::Text }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PostKind::Text => "text",
            PostKind::Image => "image",
            PostKind::Mixed => "mixed",
        }
    }
}

/// A feed item with engagement counters and its comment thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: u64,
    pub author: User,
    /// Rich-text markup as authored in the editor.
    #[serde(default, deserialize_with = "null_as_default")]
    pub content: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub post_type: PostKind,
    /// Raw timestamp as sent by the server; may be malformed.
    #[serde(default, deserialize_with = "null_as_default")]
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub likes_count: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub comments_count: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub shares_count: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub comments: Vec<Comment>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_liked: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_shared: bool,
}

impl Post {
    /// Likes + comments + shares.
    pub fn engagement(&self) -> u64 {
        self.likes_count
            .saturating_add(self.comments_count)
            .saturating_add(self.shares_count)
    }
}

/// A reply attached to a post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: u64,
    pub user: User,
    pub content: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

/// Server answer to a like toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LikeToggle {
    pub liked: bool,
    pub likes_count: u64,
}

/// Server answer to a share toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareToggle {
    pub shared: bool,
    pub shares_count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_post_decodes_with_missing_optional_fields() {
        let json = r#"{
            "id": 7,
            "author": {"id": 1, "username": "ann"},
            "content": "<p>hi</p>",
            "image": null,
            "created_at": "2024-01-01T10:00:00Z",
            "likes_count": 2
        }"#;
        let post: Post = serde_json::from_str(json).unwrap();
        assert_eq!(post.id, 7);
        assert_eq!(post.post_type, PostKind::Text);
        assert_eq!(post.likes_count, 2);
        assert_eq!(post.comments_count, 0);
        assert!(post.comments.is_empty());
        assert!(!post.is_liked);
        assert!(post.image.is_none());
    }

    #[test]
    fn test_post_kind_for_submission() {
        assert_eq!(PostKind::for_submission(true).as_str(), "mixed");
        assert_eq!(PostKind::for_submission(false).as_str(), "text");
    }

    #[test]
    fn test_engagement_sums_counters() {
        let json = r#"{"id": 1, "author": {"id": 1, "username": "a"},
            "likes_count": 2, "comments_count": 3, "shares_count": 3}"#;
        let post: Post = serde_json::from_str(json).unwrap();
        assert_eq!(post.engagement(), 8);
    }
}
