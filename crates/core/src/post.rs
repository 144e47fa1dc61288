//! The `Post` entity.

use core::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::DomainError;

/// Storage-assigned identifier of a post.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PostId(i64);

impl PostId {
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    pub fn get(&self) -> i64 {
        self.0
    }
}

impl core::fmt::Display for PostId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl From<i64> for PostId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl From<PostId> for i64 {
    fn from(value: PostId) -> Self {
        value.0
    }
}

impl FromStr for PostId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<i64>()
            .map(Self)
            .map_err(|e| DomainError::invalid_id(format!("{s:?}: {e}")))
    }
}

/// A persisted blog post.
///
/// `id`, `created_at` and `updated_at` are always assigned by storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: PostId,
    pub title: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Client-supplied content of a post, used for both create and update.
///
/// Absent fields deserialize as empty strings so that a payload like
/// `{"body":"x"}` decodes and is then rejected by validation rather than by
/// the JSON decoder.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct NewPost {
    #[serde(default)]
    #[validate(length(min = 1))]
    pub title: String,

    #[serde(default)]
    #[validate(length(min = 1))]
    pub body: String,
}

impl NewPost {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn post_id_parses_integers_only() {
        assert_eq!("42".parse::<PostId>().unwrap(), PostId::new(42));
        assert_eq!(" 7 ".parse::<PostId>().unwrap(), PostId::new(7));
        assert!(matches!(
            "abc".parse::<PostId>(),
            Err(DomainError::InvalidId(_))
        ));
        assert!("".parse::<PostId>().is_err());
    }

    #[test]
    fn post_serializes_with_flat_integer_id() {
        let now = Utc::now();
        let post = Post {
            id: PostId::new(9),
            title: "New Post".to_string(),
            body: "New Content".to_string(),
            created_at: now,
            updated_at: now,
        };

        let json = serde_json::to_value(&post).unwrap();
        assert_eq!(json["id"], 9);
        assert_eq!(json["title"], "New Post");
        assert_eq!(json["body"], "New Content");
        assert!(json["created_at"].is_string());
        assert!(json["updated_at"].is_string());
    }

    #[test]
    fn missing_fields_decode_as_empty() {
        let draft: NewPost = serde_json::from_str(r#"{"body":"a post"}"#).unwrap();
        assert_eq!(draft.title, "");
        assert_eq!(draft.body, "a post");

        let draft: NewPost = serde_json::from_str(r#"{"some":1}"#).unwrap();
        assert_eq!(draft, NewPost::default());
    }
}
