use anyhow::{Context, Result};
use log::{error, info, warn};

use crate::api::ForumApi;
use crate::error::ActionError;
use crate::models::{Comment, FlagChangeset, NewComment, Post, User};

/// Rebuilds the card list for a fresh post list. Cards for posts that are
/// still listed keep their comments, expansion and draft.
pub fn sync_cards(mut cards: Vec<PostCard>, posts: &[Post]) -> Vec<PostCard> {
    posts
        .iter()
        .map(|post| match cards.iter().position(|card| card.post.id == post.id) {
            Some(index) => {
                let mut card = cards.swap_remove(index);
                card.sync(post.clone());
                card
            }
            None => PostCard::new(post.clone()),
        })
        .collect()
}

/// Which interactive controls a viewer gets on a card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Controls {
    pub like: bool,
    pub flag: bool,
}

/// One rendered post and its local state.
///
/// The post is a snapshot owned by the card and patched after actions; the
/// feed replaces it through [`PostCard::sync`] when it has fresher data.
#[derive(Debug, Clone)]
pub struct PostCard {
    post: Post,
    comments: Option<Vec<Comment>>,
    expanded: bool,
    draft: String,
}

impl PostCard {
    pub fn new(post: Post) -> Self {
        Self {
            post,
            comments: None,
            expanded: false,
            draft: String::new(),
        }
    }

    pub fn post(&self) -> &Post {
        &self.post
    }

    pub fn comments(&self) -> &[Comment] {
        self.comments.as_deref().unwrap_or_default()
    }

    pub fn is_expanded(&self) -> bool {
        self.expanded
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn set_draft(&mut self, draft: impl Into<String>) {
        self.draft = draft.into();
    }

    pub fn sync(&mut self, post: Post) {
        if post.id != self.post.id {
            self.comments = None;
            self.expanded = false;
        }
        self.post = post;
    }

    pub fn is_own_post(&self, viewer: Option<&User>) -> bool {
        viewer.is_some_and(|user| user.id == self.post.author)
    }

    pub fn controls(&self, viewer: Option<&User>) -> Controls {
        Controls {
            like: !self.is_own_post(viewer),
            flag: viewer.is_some_and(|user| user.is_moderator) && !self.post.is_misleading,
        }
    }

    /// Expands or collapses the comment list, loading it on first expansion.
    /// Returns whether the list is now expanded.
    pub async fn toggle_comments(&mut self, api: &dyn ForumApi) -> bool {
        if !self.expanded && self.comments.is_none() {
            match api.list_comments(self.post.id).await {
                Ok(comments) => self.comments = Some(comments),
                Err(e) => error!("failed to load comments for post {}: {:#}", self.post.id, e),
            }
        }
        self.expanded = !self.expanded;
        self.expanded
    }

    /// Posts the current draft. On failure the draft is kept.
    pub async fn add_comment(&mut self, api: &dyn ForumApi) -> Result<()> {
        if self.draft.trim().is_empty() {
            return Err(ActionError::EmptyComment.into());
        }

        let new_comment = NewComment {
            post: self.post.id,
            content: self.draft.clone(),
        };
        let comment = api
            .create_comment(&new_comment)
            .await
            .with_context(|| format!("Failed to add comment to post {}", self.post.id))?;

        // An unloaded list is fetched whole on first expansion, new comment included.
        if let Some(comments) = self.comments.as_mut() {
            comments.push(comment);
        }
        self.post.comment_count += 1;
        self.draft.clear();
        Ok(())
    }

    /// Likes the post and re-reads it for the authoritative count.
    pub async fn like(&mut self, api: &dyn ForumApi, viewer: Option<&User>) -> Result<()> {
        if !self.controls(viewer).like {
            warn!("refusing to like own post {}", self.post.id);
            return Err(ActionError::OwnPost.into());
        }

        api.like_post(self.post.id)
            .await
            .with_context(|| format!("Failed to like post {}", self.post.id))?;
        self.post = api
            .get_post(self.post.id)
            .await
            .with_context(|| format!("Failed to refresh post {}", self.post.id))?;
        Ok(())
    }

    pub async fn flag(&mut self, api: &dyn ForumApi, viewer: Option<&User>) -> Result<()> {
        if !viewer.is_some_and(|user| user.is_moderator) {
            warn!("refusing to flag post {}, viewer is not a moderator", self.post.id);
            return Err(ActionError::NotModerator.into());
        }
        if self.post.is_misleading {
            return Err(ActionError::AlreadyFlagged.into());
        }

        self.post = api
            .flag_post(self.post.id, &FlagChangeset::misleading())
            .await
            .with_context(|| format!("Failed to flag post {}", self.post.id))?;
        info!("post {} flagged as misleading", self.post.id);
        Ok(())
    }

    pub fn render(&self, viewer: Option<&User>) -> String {
        let post = &self.post;
        let controls = self.controls(viewer);
        let mut lines = Vec::new();

        if post.is_misleading {
            lines.push("!! MISLEADING OR FALSE INFORMATION".to_string());
        }

        let category = post
            .category()
            .map(|category| format!(" [{}]", category.to_uppercase()))
            .unwrap_or_default();
        lines.push(format!(
            "#{} @{}{}  {}",
            post.id,
            post.author_username,
            category,
            post.created_at.format("%Y-%m-%d")
        ));
        lines.push(post.content.clone());

        let likes = if controls.like {
            format!("[like] {}", post.like_count)
        } else {
            format!("likes {}", post.like_count)
        };
        let flag = if controls.flag { "  [flag misleading]" } else { "" };
        lines.push(format!("{}  comments {}{}", likes, post.comment_count, flag));

        if self.expanded {
            if self.comments().is_empty() {
                lines.push("    No comments yet.".to_string());
            }
            lines.extend(
                self.comments()
                    .iter()
                    .map(|comment| format!("    @{}: {}", comment.author_username, comment.content)),
            );
        }

        lines.push(String::new());
        lines.join("\n")
    }
}
