#![allow(dead_code)]

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use ::forum::api::ForumApi;
use ::forum::error::ApiError;
use ::forum::models::*;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Login(String),
    ListPosts(String),
    SearchPosts { term: String, category: String },
    CreatePost(String),
    GetPost(u64),
    LikePost(u64),
    FlagPost(u64),
    ListComments(u64),
    CreateComment { post: u64, content: String },
}

/// In-memory forum server that records every request.
#[derive(Default)]
pub struct MockApi {
    calls: Mutex<Vec<Call>>,
    feeds: Mutex<HashMap<String, Vec<Post>>>,
    searches: Mutex<HashMap<String, Vec<Post>>>,
    delays: Mutex<HashMap<String, Duration>>,
    posts: Mutex<HashMap<u64, Post>>,
    comments: Mutex<HashMap<u64, Vec<Comment>>>,
    failing: Mutex<HashSet<&'static str>>,
    viewer: Mutex<Option<User>>,
}

impl MockApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_feed(self, category: &str, posts: Vec<Post>) -> Self {
        self.feeds.lock().unwrap().insert(category.to_string(), posts);
        self
    }

    pub fn with_search(self, term: &str, posts: Vec<Post>) -> Self {
        self.searches.lock().unwrap().insert(term.to_string(), posts);
        self
    }

    /// Delays responses for `feed:<category>` or `search:<term>`.
    pub fn with_delay(self, key: &str, delay: Duration) -> Self {
        self.delays.lock().unwrap().insert(key.to_string(), delay);
        self
    }

    pub fn with_post(self, post: Post) -> Self {
        self.posts.lock().unwrap().insert(post.id.get(), post);
        self
    }

    pub fn with_comments(self, post_id: u64, comments: Vec<Comment>) -> Self {
        self.comments.lock().unwrap().insert(post_id, comments);
        self
    }

    pub fn with_viewer(self, user: User) -> Self {
        *self.viewer.lock().unwrap() = Some(user);
        self
    }

    pub fn fail(&self, operation: &'static str) {
        self.failing.lock().unwrap().insert(operation);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn check(&self, operation: &'static str) -> Result<()> {
        if self.failing.lock().unwrap().contains(operation) {
            return Err(ApiError::Rejected {
                status: 500,
                message: format!("{} is down", operation),
            }
            .into());
        }
        Ok(())
    }

    async fn pause(&self, key: String) {
        let delay = self.delays.lock().unwrap().get(&key).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }

    fn stored_post(&self, post_id: PostId) -> Result<Post> {
        self.posts
            .lock()
            .unwrap()
            .get(&post_id.get())
            .cloned()
            .ok_or_else(|| anyhow!("post {} not found", post_id))
    }
}

#[async_trait]
impl ForumApi for MockApi {
    async fn login(&self, credentials: &Credentials) -> Result<LoginResponse> {
        self.record(Call::Login(credentials.username.clone()));
        self.check("login")?;
        let user = self
            .viewer
            .lock()
            .unwrap()
            .clone()
            .ok_or(ApiError::Unauthorized)?;
        Ok(LoginResponse {
            token: "token".to_string(),
            user,
        })
    }

    async fn list_posts(&self, category: &Category) -> Result<Vec<Post>> {
        self.record(Call::ListPosts(category.to_string()));
        self.pause(format!("feed:{}", category)).await;
        self.check("list_posts")?;
        Ok(self
            .feeds
            .lock()
            .unwrap()
            .get(&category.to_string())
            .cloned()
            .unwrap_or_default())
    }

    async fn search_posts(&self, term: &str, category: &Category) -> Result<Vec<Post>> {
        self.record(Call::SearchPosts {
            term: term.to_string(),
            category: category.to_string(),
        });
        self.pause(format!("search:{}", term)).await;
        self.check("search_posts")?;
        Ok(self
            .searches
            .lock()
            .unwrap()
            .get(term)
            .cloned()
            .unwrap_or_default())
    }

    async fn create_post(&self, post: &NewPost) -> Result<Post> {
        self.record(Call::CreatePost(post.content.clone()));
        self.check("create_post")?;
        let author = self
            .viewer
            .lock()
            .unwrap()
            .clone()
            .map(|user| user.id.get())
            .unwrap_or(1);
        let created = post_by(1000, author, &post.content);
        self.posts
            .lock()
            .unwrap()
            .insert(created.id.get(), created.clone());
        Ok(created)
    }

    async fn get_post(&self, post_id: PostId) -> Result<Post> {
        self.record(Call::GetPost(post_id.get()));
        self.check("get_post")?;
        self.stored_post(post_id)
    }

    async fn like_post(&self, post_id: PostId) -> Result<()> {
        self.record(Call::LikePost(post_id.get()));
        self.check("like_post")?;
        let mut posts = self.posts.lock().unwrap();
        let post = posts
            .get_mut(&post_id.get())
            .ok_or_else(|| anyhow!("post {} not found", post_id))?;
        post.like_count += 1;
        Ok(())
    }

    async fn flag_post(&self, post_id: PostId, changeset: &FlagChangeset) -> Result<Post> {
        self.record(Call::FlagPost(post_id.get()));
        self.check("flag_post")?;
        let mut posts = self.posts.lock().unwrap();
        let post = posts
            .get_mut(&post_id.get())
            .ok_or_else(|| anyhow!("post {} not found", post_id))?;
        post.is_misleading = changeset.is_misleading;
        Ok(post.clone())
    }

    async fn list_comments(&self, post_id: PostId) -> Result<Vec<Comment>> {
        self.record(Call::ListComments(post_id.get()));
        self.check("list_comments")?;
        Ok(self
            .comments
            .lock()
            .unwrap()
            .get(&post_id.get())
            .cloned()
            .unwrap_or_default())
    }

    async fn create_comment(&self, comment: &NewComment) -> Result<Comment> {
        self.record(Call::CreateComment {
            post: comment.post.get(),
            content: comment.content.clone(),
        });
        self.check("create_comment")?;
        let viewer = self.viewer.lock().unwrap().clone();
        let (author, username) = viewer
            .map(|user| (user.id, user.username))
            .unwrap_or((UserId::new(1), "someone".to_string()));
        Ok(Comment {
            id: CommentId::new(500),
            author,
            author_username: username,
            content: comment.content.clone(),
            created_at: Utc.with_ymd_and_hms(2026, 5, 2, 9, 0, 0).unwrap(),
        })
    }
}

pub fn post_by(id: u64, author: u64, content: &str) -> Post {
    Post {
        id: PostId::new(id),
        author: UserId::new(author),
        author_username: format!("user{}", author),
        content: content.to_string(),
        created_at: Utc.with_ymd_and_hms(2026, 5, 1, 12, 0, 0).unwrap(),
        category: None,
        is_misleading: false,
        like_count: 0,
        comment_count: 0,
    }
}

pub fn post(id: u64, content: &str) -> Post {
    post_by(id, 1, content)
}

pub fn user(id: u64, is_moderator: bool) -> User {
    User {
        id: UserId::new(id),
        username: format!("user{}", id),
        is_moderator,
    }
}

pub fn comment(id: u64, author: u64, content: &str) -> Comment {
    Comment {
        id: CommentId::new(id),
        author: UserId::new(author),
        author_username: format!("user{}", author),
        content: content.to_string(),
        created_at: Utc.with_ymd_and_hms(2026, 5, 1, 13, 0, 0).unwrap(),
    }
}
