//! Feed query service abstraction layer.
//!
//! This module defines the [`FeedService`] trait, the [`Page`] returned by
//! every list operation, and the [`FeedQuery`] selecting which feed to list.
//! Concrete backends live in sub-modules: [`memory`] (in-process store) and
//! [`remote`] (tRPC over HTTP).
//!
//! ## Pagination contract
//!
//! A cursor is the id of the first post the requested page starts with,
//! i.e. the previous page's `next_cursor`.  A backend fetches `limit + 1`
//! rows; if the extra row exists it is dropped from the page and its id
//! becomes `next_cursor`.  A page that exactly fills `limit` with nothing
//! after it therefore carries no cursor, and callers must derive "has more"
//! from the cursor alone, never from the page being full.

pub mod memory;
pub mod post;
pub mod remote;

pub use memory::MemoryFeed;
pub use post::{Author, Post, PostId, PostWithAuthor, UserId};
pub use remote::RemoteFeed;

use crate::error::Result;

/// One page of a feed, newest first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Page {
    pub items: Vec<PostWithAuthor>,
    /// Id of the first post not included, or `None` on the last page.
    pub next_cursor: Option<PostId>,
}

impl Page {
    /// Split `limit + 1` sorted rows into a page and its continuation cursor.
    pub fn from_overfetch(mut rows: Vec<PostWithAuthor>, limit: usize) -> Page {
        let next_cursor = if rows.len() > limit {
            rows.truncate(limit + 1);
            rows.pop().map(|extra| extra.post.id)
        } else {
            None
        };
        Page {
            items: rows,
            next_cursor,
        }
    }
}

/// Which feed a list request is for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedQuery {
    /// Every post.
    All,
    /// Posts by one author.
    ByAuthor { id: UserId, username: String },
    /// Posts whose content contains the needle.
    ByContent(String),
}

impl FeedQuery {
    /// Title shown above the list.
    pub fn title(&self) -> String {
        match self {
            FeedQuery::All => "Home".to_string(),
            FeedQuery::ByAuthor { username, .. } => format!("@{username}"),
            FeedQuery::ByContent(needle) => format!("Search: {needle}"),
        }
    }
}

/// The operations the app consumes from a feed backend.
///
/// Calls are blocking; the app runs them on tokio's blocking pool, so
/// implementations must be [`Send`] + [`Sync`].
pub trait FeedService: Send + Sync {
    /// Human-readable backend label for the status bar.
    fn name(&self) -> &str;

    /// List one page of `query`, starting at `cursor` (or the newest post).
    fn list_posts(
        &self,
        query: &FeedQuery,
        cursor: Option<&PostId>,
        limit: usize,
    ) -> Result<Page>;

    /// Number of posts whose author is not `user`.
    fn count_posts_not_by(&self, user: &UserId) -> Result<u64>;

    /// Publish a post for `author`.
    fn create_post(&self, author: &UserId, content: &str) -> Result<Post>;

    /// Resolve a profile by username.
    fn user_by_username(&self, username: &str) -> Result<Author>;

    /// Set the username of a user who signed up without one.
    fn update_username(&self, user: &UserId, username: &str) -> Result<Author>;

    fn list_all(&self, cursor: Option<&PostId>, limit: usize) -> Result<Page> {
        self.list_posts(&FeedQuery::All, cursor, limit)
    }

    fn list_by_author(
        &self,
        author: &Author,
        cursor: Option<&PostId>,
        limit: usize,
    ) -> Result<Page> {
        let query = FeedQuery::ByAuthor {
            id: author.id.clone(),
            username: author.username.clone(),
        };
        self.list_posts(&query, cursor, limit)
    }

    fn list_by_content(&self, needle: &str, cursor: Option<&PostId>, limit: usize) -> Result<Page> {
        self.list_posts(&FeedQuery::ByContent(needle.to_string()), cursor, limit)
    }
}
