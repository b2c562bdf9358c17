use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response};
use serde::Deserialize;

use crate::models::{CommentWithUser, Id, LikeRequest, Paginated, PostWithUser};

/// Fallback messages when the server does not supply one.
pub const POSTS_LOAD_FAILED: &str = "게시물을 불러오는 중 오류가 발생했습니다.";
pub const LIKE_TOGGLE_FAILED: &str = "좋아요 처리 중 오류가 발생했습니다.";
pub const COMMENTS_LOAD_FAILED: &str = "댓글을 불러오는 중 오류가 발생했습니다.";

#[derive(thiserror::Error, Debug)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("{message}")]
    Status { status: u16, message: String },
}

impl ClientError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Status { status, .. } => Some(*status),
            ClientError::Transport(e) => e.status().map(|s| s.as_u16()),
        }
    }
}

#[async_trait]
pub trait FeedApi: Send + Sync {
    async fn fetch_posts(&self, page: i64, limit: i64, user_id: Option<Id>) -> Result<Paginated<PostWithUser>, ClientError>;
    async fn fetch_comments(&self, post_id: Id, limit: i64) -> Result<Vec<CommentWithUser>, ClientError>;
    async fn add_like(&self, post_id: Id) -> Result<(), ClientError>;
    async fn remove_like(&self, post_id: Id) -> Result<(), ClientError>;
}

#[derive(Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

/// `FeedApi` over HTTP. The bearer token is the auth provider's session token.
#[derive(Clone)]
pub struct HttpFeedApi {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl HttpFeedApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let rb = self.client.request(method, format!("{}{}", self.base_url, path));
        match &self.token {
            Some(t) => rb.bearer_auth(t),
            None => rb,
        }
    }

    /// Passes 2xx responses through; otherwise surfaces the server's `error` field.
    async fn check(resp: Response, fallback: &str) -> Result<Response, ClientError> {
        if resp.status().is_success() {
            return Ok(resp);
        }
        let status = resp.status().as_u16();
        let message = resp.json::<ErrorBody>().await.ok()
            .and_then(|b| b.error)
            .unwrap_or_else(|| fallback.to_string());
        Err(ClientError::Status { status, message })
    }

    async fn send_like(&self, method: Method, post_id: Id) -> Result<(), ClientError> {
        let resp = self.request(method, "/api/likes").json(&LikeRequest { post_id }).send().await?;
        Self::check(resp, LIKE_TOGGLE_FAILED).await?;
        Ok(())
    }
}

#[async_trait]
impl FeedApi for HttpFeedApi {
    async fn fetch_posts(&self, page: i64, limit: i64, user_id: Option<Id>) -> Result<Paginated<PostWithUser>, ClientError> {
        let mut query = vec![("page", page.to_string()), ("limit", limit.to_string())];
        if let Some(uid) = user_id {
            query.push(("userId", uid.to_string()));
        }
        let resp = self.request(Method::GET, "/api/posts").query(&query).send().await?;
        // the feed shows one generic message regardless of the server's text
        let resp = Self::check(resp, POSTS_LOAD_FAILED).await.map_err(|e| match e {
            ClientError::Status { status, .. } => ClientError::Status { status, message: POSTS_LOAD_FAILED.into() },
            other => other,
        })?;
        Ok(resp.json().await?)
    }

    async fn fetch_comments(&self, post_id: Id, limit: i64) -> Result<Vec<CommentWithUser>, ClientError> {
        let query = [("postId", post_id.to_string()), ("limit", limit.to_string())];
        let resp = self.request(Method::GET, "/api/comments").query(&query).send().await?;
        let resp = Self::check(resp, COMMENTS_LOAD_FAILED).await?;
        Ok(resp.json().await?)
    }

    async fn add_like(&self, post_id: Id) -> Result<(), ClientError> {
        self.send_like(Method::POST, post_id).await
    }

    async fn remove_like(&self, post_id: Id) -> Result<(), ClientError> {
        self.send_like(Method::DELETE, post_id).await
    }
}
