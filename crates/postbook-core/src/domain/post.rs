use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier of a post. Persisted as a bare JSON number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PostId(pub u64);

impl fmt::Display for PostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for PostId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(PostId)
    }
}

/// Trim surrounding whitespace from user text, including the byte order mark.
pub fn trim_text(raw: &str) -> &str {
    raw.trim_matches(|c: char| c.is_whitespace() || c == '\u{feff}')
}

/// Post entity - one blog entry.
///
/// Field names follow the persisted record layout (`createdAt`, `updatedAt`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: PostId,
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Post {
    /// Create a new post. Both timestamps are set to `now`.
    pub fn new(
        id: PostId,
        title: String,
        content: String,
        published: bool,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            title,
            content,
            published,
            created_at: now,
            updated_at: now,
        }
    }

    /// Refresh `updated_at`. It never moves backwards, even if the clock does.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now.max(self.updated_at).max(self.created_at);
    }

    /// Case-insensitive substring match on title or content.
    ///
    /// `needle` must already be lower-cased.
    pub fn matches(&self, needle: &str) -> bool {
        needle.is_empty()
            || self.title.to_lowercase().contains(needle)
            || self.content.to_lowercase().contains(needle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn test_serializes_with_persisted_field_names() {
        let post = Post::new(PostId(42), "Hello".into(), "World".into(), true, at(1_700_000_000));
        let value = serde_json::to_value(&post).unwrap();

        assert_eq!(value["id"], 42);
        assert_eq!(value["published"], true);
        assert_eq!(value["createdAt"], "2023-11-14T22:13:20Z");
        assert_eq!(value["updatedAt"], "2023-11-14T22:13:20Z");
    }

    #[test]
    fn test_reads_browser_iso_timestamps() {
        let raw = r#"{
            "id": 1700000000123,
            "title": "Hello",
            "content": "",
            "published": false,
            "createdAt": "2023-11-14T22:13:20.123Z",
            "updatedAt": "2023-11-14T22:15:00.000Z"
        }"#;
        let post: Post = serde_json::from_str(raw).unwrap();

        assert_eq!(post.id, PostId(1_700_000_000_123));
        assert_eq!(post.created_at.timestamp_millis(), 1_700_000_000_123);
        assert!(post.updated_at > post.created_at);
    }

    #[test]
    fn test_touch_never_precedes_creation() {
        let mut post = Post::new(PostId(1), "t".into(), String::new(), false, at(100));
        post.touch(at(50));
        assert_eq!(post.updated_at, at(100));

        post.touch(at(200));
        assert_eq!(post.updated_at, at(200));

        post.touch(at(150));
        assert_eq!(post.updated_at, at(200));
    }

    #[test]
    fn test_matches_title_or_content() {
        let post = Post::new(PostId(1), "Rust Notes".into(), "Borrow checker".into(), false, at(0));

        assert!(post.matches(""));
        assert!(post.matches("rust"));
        assert!(post.matches("checker"));
        assert!(!post.matches("python"));
    }

    #[test]
    fn test_trim_text_strips_byte_order_marks() {
        assert_eq!(trim_text("\u{feff} Title \u{feff}\n"), "Title");
        assert_eq!(trim_text("\u{feff}"), "");
        assert_eq!(trim_text("a \u{feff} b"), "a \u{feff} b");
    }

    #[test]
    fn test_post_id_parses_from_text() {
        assert_eq!(" 17 ".parse::<PostId>().unwrap(), PostId(17));
        assert!("abc".parse::<PostId>().is_err());
    }
}
