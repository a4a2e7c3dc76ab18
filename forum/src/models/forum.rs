use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::{CommentId, PostId, UserId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// The login endpoint calls it `user_id`, everything else `id`.
    #[serde(alias = "user_id")]
    pub id: UserId,
    pub username: String,
    #[serde(default)]
    pub is_moderator: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: PostId,
    pub author: UserId,
    pub author_username: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    /// Filled in by the server after the post is classified, so fresh posts
    /// usually have none.
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub is_misleading: bool,
    #[serde(default)]
    pub like_count: u64,
    #[serde(default)]
    pub comment_count: u64,
}

impl Post {
    pub fn category(&self) -> Option<&str> {
        self.category.as_deref().filter(|c| !c.trim().is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: CommentId,
    pub author: UserId,
    pub author_username: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    #[serde(flatten)]
    pub user: User,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewPost {
    pub content: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewComment {
    pub post: PostId,
    pub content: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct FlagChangeset {
    pub is_misleading: bool,
}

impl FlagChangeset {
    pub fn misleading() -> Self {
        Self {
            is_misleading: true,
        }
    }
}
