use crate::error::ApiError;
use crate::models::*;
use anyhow::{Context, Result};
use async_trait::async_trait;
use log::debug;
use reqwest::{header, Client, RequestBuilder};
use serde::de::DeserializeOwned;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/api";

#[async_trait]
pub trait ForumApi: Send + Sync {
    async fn login(&self, credentials: &Credentials) -> Result<LoginResponse>;
    async fn list_posts(&self, category: &Category) -> Result<Vec<Post>>;
    async fn search_posts(&self, term: &str, category: &Category) -> Result<Vec<Post>>;
    async fn create_post(&self, post: &NewPost) -> Result<Post>;
    async fn get_post(&self, post_id: PostId) -> Result<Post>;
    /// Only reports success, the new like count has to be re-read.
    async fn like_post(&self, post_id: PostId) -> Result<()>;
    async fn flag_post(&self, post_id: PostId, changeset: &FlagChangeset) -> Result<Post>;
    async fn list_comments(&self, post_id: PostId) -> Result<Vec<Comment>>;
    async fn create_comment(&self, comment: &NewComment) -> Result<Comment>;
}

pub struct ForumClient {
    client: Client,
    base_url: String,
}

impl ForumClient {
    pub fn new(base_url: &str, token: Option<&str>) -> Result<Self> {
        let mut headers = header::HeaderMap::new();
        if let Some(token) = token {
            headers.insert(
                header::AUTHORIZATION,
                header::HeaderValue::from_str(&format!("Token {}", token))
                    .context("session token is not a valid header value")?,
            );
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .default_headers(headers)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        join_url(&self.base_url, path)
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let body = self.send(request).await?;
        let value = serde_json::from_str(&body).map_err(ApiError::from)?;
        Ok(value)
    }

    async fn send(&self, request: RequestBuilder) -> Result<String> {
        let response = request.send().await.map_err(ApiError::from)?;
        debug!("{} {}", response.status(), response.url());

        let status = response.status();
        let body = response.text().await.map_err(ApiError::from)?;

        if !status.is_success() {
            return Err(ApiError::from_response(status, &body).into());
        }

        Ok(body)
    }
}

pub fn join_url(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Query string for the plain feed; unfiltered feeds send none at all.
pub fn feed_query(category: &Category) -> Vec<(&'static str, String)> {
    match category.name() {
        Some(name) => vec![("category", name.to_string())],
        None => vec![],
    }
}

/// Search always names the category, `All` meaning unfiltered.
pub fn search_query(term: &str, category: &Category) -> Vec<(&'static str, String)> {
    vec![("q", term.to_string()), ("category", category.to_string())]
}

#[async_trait]
impl ForumApi for ForumClient {
    async fn login(&self, credentials: &Credentials) -> Result<LoginResponse> {
        let url = self.endpoint("login/");
        let result: Result<LoginResponse> = self
            .send_json(self.client.post(&url).json(credentials))
            .await;

        match result {
            Err(e) => match e.downcast_ref::<ApiError>() {
                // The token endpoint answers bad credentials with a plain 400
                Some(ApiError::Rejected { status, .. }) if (400..500).contains(status) => {
                    Err(ApiError::Unauthorized.into())
                }
                _ => Err(e),
            },
            ok => ok,
        }
    }

    async fn list_posts(&self, category: &Category) -> Result<Vec<Post>> {
        let url = self.endpoint("posts/");
        self.send_json(self.client.get(&url).query(&feed_query(category)))
            .await
    }

    async fn search_posts(&self, term: &str, category: &Category) -> Result<Vec<Post>> {
        let url = self.endpoint("posts/search/");
        self.send_json(
            self.client
                .get(&url)
                .query(&search_query(term, category)),
        )
        .await
    }

    async fn create_post(&self, post: &NewPost) -> Result<Post> {
        let url = self.endpoint("posts/");
        self.send_json(self.client.post(&url).json(post)).await
    }

    async fn get_post(&self, post_id: PostId) -> Result<Post> {
        let url = self.endpoint(&format!("posts/{}/", post_id));
        self.send_json(self.client.get(&url)).await
    }

    async fn like_post(&self, post_id: PostId) -> Result<()> {
        let url = self.endpoint(&format!("posts/{}/like/", post_id));
        self.send(self.client.post(&url)).await?;
        Ok(())
    }

    async fn flag_post(&self, post_id: PostId, changeset: &FlagChangeset) -> Result<Post> {
        let url = self.endpoint(&format!("posts/{}/flag/", post_id));
        self.send_json(self.client.patch(&url).json(changeset))
            .await
    }

    async fn list_comments(&self, post_id: PostId) -> Result<Vec<Comment>> {
        let url = self.endpoint("comments/");
        self.send_json(
            self.client
                .get(&url)
                .query(&[("post", post_id.to_string())]),
        )
        .await
    }

    async fn create_comment(&self, comment: &NewComment) -> Result<Comment> {
        let url = self.endpoint("comments/");
        self.send_json(self.client.post(&url).json(comment)).await
    }
}
