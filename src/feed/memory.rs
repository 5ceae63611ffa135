//! In-process feed backend.
//!
//! Holds posts in memory together with a [`UserDirectory`] and a
//! [`SlidingWindow`] limiter, and implements the full [`FeedService`]
//! contract.  It is the default backend and the one the demo data and the
//! tests run against.

use std::sync::RwLock;
use std::time::Instant;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use super::post::validate_content;
use super::{Author, FeedQuery, FeedService, Page, Post, PostId, PostWithAuthor, UserId};
use crate::error::{FeedError, Result};
use crate::identity::{User, UserDirectory};
use crate::ratelimit::SlidingWindow;

pub struct MemoryFeed {
    posts: RwLock<Vec<Post>>,
    users: UserDirectory,
    limiter: SlidingWindow,
}

impl MemoryFeed {
    pub fn new() -> Self {
        Self {
            posts: RwLock::new(Vec::new()),
            users: UserDirectory::new(),
            limiter: SlidingWindow::default(),
        }
    }

    #[cfg(test)]
    pub fn with_limiter(limiter: SlidingWindow) -> Self {
        Self {
            limiter,
            ..Self::new()
        }
    }

    /// Register a user unless one with the same id exists.
    pub fn ensure_user(&self, user: User) {
        if self.users.get(&user.id).is_none() {
            self.users.insert(user);
        }
    }

    /// Store a post with an explicit timestamp, bypassing validation and
    /// rate limiting.  Used for seeding.
    pub fn insert_post(&self, author: &UserId, content: &str, created_at: DateTime<Utc>) -> Post {
        let post = Post {
            id: PostId::generate(),
            author_id: author.clone(),
            content: content.to_string(),
            created_at,
        };
        let mut posts = self.posts.write().unwrap_or_else(|p| p.into_inner());
        posts.push(post.clone());
        post
    }

    pub fn len(&self) -> usize {
        self.posts.read().unwrap_or_else(|p| p.into_inner()).len()
    }

    fn enrich(&self, posts: Vec<Post>) -> Result<Vec<PostWithAuthor>> {
        posts
            .into_iter()
            .map(|post| {
                let author = self
                    .users
                    .get(&post.author_id)
                    .and_then(|u| u.to_author())
                    .ok_or_else(|| {
                        warn!(post = %post.id, author = %post.author_id, "author not resolvable");
                        FeedError::AuthorNotFound(post.id.to_string())
                    })?;
                Ok(PostWithAuthor { post, author })
            })
            .collect()
    }

    fn matches(&self, query: &FeedQuery, post: &Post) -> bool {
        match query {
            FeedQuery::All => true,
            FeedQuery::ByAuthor { id, .. } => &post.author_id == id,
            FeedQuery::ByContent(needle) => post
                .content
                .to_lowercase()
                .contains(&needle.to_lowercase()),
        }
    }
}

impl Default for MemoryFeed {
    fn default() -> Self {
        Self::new()
    }
}

impl FeedService for MemoryFeed {
    fn name(&self) -> &str {
        "local"
    }

    fn list_posts(
        &self,
        query: &FeedQuery,
        cursor: Option<&PostId>,
        limit: usize,
    ) -> Result<Page> {
        let mut selected: Vec<Post> = {
            let posts = self.posts.read().unwrap_or_else(|p| p.into_inner());
            posts
                .iter()
                .filter(|p| self.matches(query, p))
                .cloned()
                .collect()
        };
        selected.sort();

        let start = match cursor {
            None => 0,
            Some(id) => selected
                .iter()
                .position(|p| &p.id == id)
                .ok_or_else(|| FeedError::NotFound(format!("cursor {id}")))?,
        };

        let window: Vec<Post> = selected.into_iter().skip(start).take(limit + 1).collect();
        let page = Page::from_overfetch(self.enrich(window)?, limit);
        debug!(
            query = ?query,
            items = page.items.len(),
            more = page.next_cursor.is_some(),
            "listed posts"
        );
        Ok(page)
    }

    fn count_posts_not_by(&self, user: &UserId) -> Result<u64> {
        let posts = self.posts.read().unwrap_or_else(|p| p.into_inner());
        Ok(posts.iter().filter(|p| &p.author_id != user).count() as u64)
    }

    fn create_post(&self, author: &UserId, content: &str) -> Result<Post> {
        validate_content(content)?;
        if !self.limiter.check(&author.0, Instant::now()) {
            warn!(author = %author, "post rejected by rate limiter");
            return Err(FeedError::RateLimitExceeded);
        }
        let post = self.insert_post(author, content, Utc::now());
        info!(post = %post.id, author = %author, "post created");
        Ok(post)
    }

    fn user_by_username(&self, username: &str) -> Result<Author> {
        self.users
            .find_by_username(username)
            .and_then(|u| u.to_author())
            .ok_or_else(|| FeedError::NotFound(format!("user @{username}")))
    }

    fn update_username(&self, user: &UserId, username: &str) -> Result<Author> {
        let updated = self.users.update_username(user, username)?;
        info!(user = %user, username, "username set");
        updated
            .to_author()
            .ok_or_else(|| FeedError::NotFound(format!("user {user}")))
    }
}
