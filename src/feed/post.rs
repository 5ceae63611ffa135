//! The core data types shared by every feed backend.
//!
//! A [`Post`] is immutable once created.  Lists never hand out bare posts:
//! every row is a [`PostWithAuthor`], joined against the user directory so
//! the UI can show `@username` without a second lookup.
//!
//! ## Ordering
//!
//! `Post` implements [`Ord`] for **reverse-chronological** ordering: newer
//! posts sort first, and posts created at the same instant fall back to
//! descending id.  Ids are v7 UUIDs (time-ordered), so the tie-break agrees
//! with creation order and the ordering is total.

use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{FeedError, Result};

/// Maximum post length, counted in characters.
pub const MAX_POST_CHARS: usize = 280;

/// Opaque post identifier, also used as the pagination cursor.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PostId(pub String);

/// Identity-provider user id.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl PostId {
    /// A fresh time-ordered id.
    pub fn generate() -> Self {
        PostId(uuid::Uuid::now_v7().to_string())
    }
}

impl fmt::Display for PostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        UserId(s.to_string())
    }
}

impl From<&str> for PostId {
    fn from(s: &str) -> Self {
        PostId(s.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: PostId,
    pub author_id: UserId,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// The public face of a user, as attached to posts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Author {
    pub id: UserId,
    pub username: String,
    #[serde(default)]
    pub profile_image_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostWithAuthor {
    pub post: Post,
    pub author: Author,
}

// ---------------------------------------------------------------------------
// Ordering: reverse chronological (newest first), id as tie-break
// ---------------------------------------------------------------------------

impl Ord for Post {
    fn cmp(&self, other: &Self) -> Ordering {
        // `other` first so newer posts (and larger ids) sort before older ones.
        other
            .created_at
            .cmp(&self.created_at)
            .then_with(|| other.id.cmp(&self.id))
    }
}

impl PartialOrd for Post {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Check the 1..=280 character constraint on post bodies.
pub fn validate_content(content: &str) -> Result<()> {
    let chars = content.chars().count();
    if chars == 0 {
        return Err(FeedError::Validation("Post must not be empty".into()));
    }
    if chars > MAX_POST_CHARS {
        return Err(FeedError::Validation(format!(
            "Post is {chars} characters, the limit is {MAX_POST_CHARS}"
        )));
    }
    Ok(())
}

/// Compact "time since" label for post headers.
pub fn relative_time(created_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let secs = (now - created_at).num_seconds();
    match secs {
        s if s < 5 => "now".to_string(),
        s if s < 60 => format!("{s}s"),
        s if s < 3_600 => format!("{}m", s / 60),
        s if s < 86_400 => format!("{}h", s / 3_600),
        s if s < 7 * 86_400 => format!("{}d", s / 86_400),
        _ => created_at.format("%b %e").to_string(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
