//! User directory standing in for the identity provider.
//!
//! Users can exist without a username right after sign-up.  Such users can
//! read feeds but must pick a username before posting, and their posts (if
//! any slipped through) fail enrichment with `AuthorNotFound`.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::error::{FeedError, Result};
use crate::feed::{Author, UserId};

const MAX_USERNAME_CHARS: usize = 32;

/// A directory entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub username: Option<String>,
    pub profile_image_url: String,
}

impl User {
    pub fn new(id: impl Into<String>, username: Option<&str>) -> Self {
        let id = id.into();
        Self {
            profile_image_url: format!("https://img.example.com/avatar/{id}.png"),
            id: UserId(id),
            username: username.map(str::to_string),
        }
    }

    /// The client-facing author record; `None` while the username is unset.
    pub fn to_author(&self) -> Option<Author> {
        self.username.as_ref().map(|username| Author {
            id: self.id.clone(),
            username: username.clone(),
            profile_image_url: self.profile_image_url.clone(),
        })
    }
}

/// The signed-in user as the app sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: UserId,
    pub username: Option<String>,
}

impl CurrentUser {
    pub fn needs_username(&self) -> bool {
        self.username.is_none()
    }
}

pub fn validate_username(username: &str) -> Result<()> {
    let len = username.chars().count();
    if len == 0 || len > MAX_USERNAME_CHARS {
        return Err(FeedError::Validation(format!(
            "Username must be 1 to {MAX_USERNAME_CHARS} characters"
        )));
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Err(FeedError::Validation(
            "Username may only contain letters, digits and '_'".into(),
        ));
    }
    Ok(())
}

#[derive(Default)]
pub struct UserDirectory {
    users: RwLock<HashMap<UserId, User>>,
}

impl UserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a user.
    pub fn insert(&self, user: User) {
        let mut users = self.users.write().unwrap_or_else(|p| p.into_inner());
        users.insert(user.id.clone(), user);
    }

    pub fn get(&self, id: &UserId) -> Option<User> {
        let users = self.users.read().unwrap_or_else(|p| p.into_inner());
        users.get(id).cloned()
    }

    /// Case-insensitive username lookup.
    pub fn find_by_username(&self, username: &str) -> Option<User> {
        let users = self.users.read().unwrap_or_else(|p| p.into_inner());
        users
            .values()
            .find(|u| {
                u.username
                    .as_deref()
                    .is_some_and(|n| n.eq_ignore_ascii_case(username))
            })
            .cloned()
    }

    pub fn update_username(&self, id: &UserId, username: &str) -> Result<User> {
        validate_username(username)?;
        let mut users = self.users.write().unwrap_or_else(|p| p.into_inner());
        let taken = users.values().any(|u| {
            &u.id != id
                && u.username
                    .as_deref()
                    .is_some_and(|n| n.eq_ignore_ascii_case(username))
        });
        if taken {
            return Err(FeedError::Validation(format!(
                "Username {username} is already taken"
            )));
        }
        let user = users
            .get_mut(id)
            .ok_or_else(|| FeedError::NotFound(format!("user {id}")))?;
        user.username = Some(username.to_string());
        Ok(user.clone())
    }
}
