//! Feed filtering and ordering.
//!
//! The displayed feed is always a pure function of the source posts and the
//! page's [`FeedFilter`]. Nothing here keeps state between calls, so applying
//! the same filter twice yields the same sequence.

use std::cmp::Reverse;
use std::fmt;
use std::str::FromStr;
use std::sync::Once;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::rich_text;
use crate::types::Post;

/// Named ordering strategy for the feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortMode {
    /// Newest first
    #[default]
    Recent,
    /// Most liked first
    Popular,
    /// Highest likes + comments + shares first
    Trending,
    /// Server order. Followed-author filtering is not available from the API.
    Following,
}

impl SortMode {
    pub fn all() -> &'static [SortMode] {
        &[
            SortMode::Recent,
            SortMode::Popular,
            SortMode::Trending,
            SortMode::Following,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SortMode::Recent => "recent",
            SortMode::Popular => "popular",
            SortMode::Trending => "trending",
            SortMode::Following => "following",
        }
    }

    /// Short description shown next to the mode in listings.
    pub fn description(self) -> &'static str {
        match self {
            SortMode::Recent => "Latest posts",
            SortMode::Popular => "Most liked posts",
            SortMode::Trending => "Most engagement",
            SortMode::Following => "Posts in server order (not filtered by follows)",
        }
    }

    /// True when the mode leaves the source order untouched.
    pub fn is_identity(self) -> bool {
        matches!(self, SortMode::Following)
    }
}

impl fmt::Display for SortMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortMode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "recent" => Ok(Self::Recent),
            "popular" => Ok(Self::Popular),
            "trending" => Ok(Self::Trending),
            "following" => Ok(Self::Following),
            other => Err(format!(
                "Unknown sort mode: {other} (expected recent, popular, trending, or following)"
            )),
        }
    }
}

/// Per-page filter state: search text plus ordering.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedFilter {
    pub query: String,
    pub mode: SortMode,
}

impl FeedFilter {
    pub fn new(query: impl Into<String>, mode: SortMode) -> Self {
        Self {
            query: query.into(),
            mode,
        }
    }

    /// Lower-cased query, or None when it is blank.
    ///
    /// Surrounding whitespace only decides blankness; a non-blank query is
    /// matched as typed.
    fn needle(&self) -> Option<String> {
        if self.query.trim().is_empty() {
            None
        } else {
            Some(self.query.to_lowercase())
        }
    }
}

/// Derives the display list from `posts`.
///
/// A non-blank query keeps posts whose plain-text content, author first name,
/// last name, or username contains it (case-insensitive substring). The result
/// is then stably sorted by the filter's mode.
pub fn apply(posts: &[Post], filter: &FeedFilter) -> Vec<Post> {
    let mut out: Vec<Post> = match filter.needle() {
        Some(needle) => posts
            .iter()
            .filter(|post| matches_query(post, &needle))
            .cloned()
            .collect(),
        None => posts.to_vec(),
    };

    sort_posts(&mut out, filter.mode);
    out
}

/// Whether `post` contains the already lower-cased `needle`.
pub fn matches_query(post: &Post, needle: &str) -> bool {
    let author = &post.author;
    [
        author.first_name.as_str(),
        author.last_name.as_str(),
        author.username.as_str(),
    ]
    .iter()
    .any(|field| field.to_lowercase().contains(needle))
        || rich_text::plain_text(&post.content)
            .to_lowercase()
            .contains(needle)
}

/// Stable in-place sort by `mode`.
pub fn sort_posts(posts: &mut [Post], mode: SortMode) {
    match mode {
        SortMode::Recent => posts.sort_by_key(|p| Reverse(created_at_key(&p.created_at))),
        SortMode::Popular => posts.sort_by_key(|p| Reverse(p.likes_count)),
        SortMode::Trending => posts.sort_by_key(|p| Reverse(p.engagement())),
        SortMode::Following => {
            static FLAGGED: Once = Once::new();
            FLAGGED.call_once(|| {
                tracing::debug!(
                    "following mode keeps server order; followed-author filtering is not implemented"
                );
            });
        }
    }
}

/// Sort key for a raw timestamp.
///
/// Accepts RFC 3339 or a bare `YYYY-MM-DD` (midnight UTC). Anything else is
/// `None`, which orders below every real timestamp.
pub fn created_at_key(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
