use std::sync::Arc;
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use tracing::{debug, error};
use utoipa::IntoParams;

use crate::auth::Caller;
use crate::error::{messages, ApiError};
use crate::feed::{self, FeedRequest, DEFAULT_COMMENT_LIMIT, MAX_PAGE_LIMIT};
use crate::models::*;
use crate::repo::{Repo, RepoError};

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .service(web::resource("/posts").route(web::get().to(list_posts)))
            .service(web::resource("/comments").route(web::get().to(list_comments)))
            .service(
                web::resource("/likes")
                    .route(web::post().to(add_like))
                    .route(web::delete().to(remove_like)),
            ),
    );
}

#[derive(Clone)]
pub struct AppState { pub repo: Arc<dyn Repo> }

// numeric params stay strings so a bad value falls back to its default instead of a 400
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct FeedQuery {
    /// 1-based page number (default 1)
    page: Option<String>,
    /// Page size (default 10)
    limit: Option<String>,
    /// Restrict to posts owned by this user (profile feed)
    #[serde(rename = "userId")]
    user_id: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CommentsQuery {
    /// Post whose comments are listed (required)
    #[serde(rename = "postId")]
    post_id: Option<String>,
    /// Number of comments (default 2, for previews)
    limit: Option<String>,
    offset: Option<String>,
}

#[utoipa::path(
    get,
    path = "/api/posts",
    tag = "posts",
    params(FeedQuery),
    responses(
        (status = 200, description = "Newest-first page of posts", body = PaginatedPosts),
        (status = 500, description = "Database failure")
    )
)]
pub async fn list_posts(
    caller: Option<Caller>,
    data: web::Data<AppState>,
    query: web::Query<FeedQuery>,
) -> Result<HttpResponse, ApiError> {
    let req = FeedRequest::parse(query.page.as_deref(), query.limit.as_deref(), query.user_id.as_deref());
    let repo = data.repo.as_ref();
    let viewer = feed::resolve_viewer(repo, caller.as_ref().map(|c| c.clerk_id.as_str()))
        .await
        .map_err(|e| {
            error!("resolving feed viewer failed: {e}");
            ApiError::Internal(messages::POSTS_FAILED)
        })?;
    let page = feed::load_feed(repo, req, viewer).await.map_err(|e| {
        error!("loading feed page failed: {e}");
        ApiError::Internal(messages::POSTS_FAILED)
    })?;
    Ok(HttpResponse::Ok().json(page))
}

#[utoipa::path(
    get,
    path = "/api/comments",
    tag = "comments",
    params(CommentsQuery),
    responses(
        (status = 200, description = "Newest-first comments of a post", body = [CommentWithUser]),
        (status = 400, description = "postId missing"),
        (status = 500, description = "Database failure")
    )
)]
pub async fn list_comments(data: web::Data<AppState>, query: web::Query<CommentsQuery>) -> Result<HttpResponse, ApiError> {
    let raw_post_id = query.post_id.as_deref().map(str::trim).filter(|v| !v.is_empty())
        .ok_or(ApiError::BadRequest(messages::POST_ID_PARAM_REQUIRED))?;
    let Ok(post_id) = raw_post_id.parse::<Id>() else {
        // cannot match any post
        return Ok(HttpResponse::Ok().json(Vec::<CommentWithUser>::new()));
    };
    let limit = feed::parse_number(query.limit.as_deref(), DEFAULT_COMMENT_LIMIT).clamp(1, MAX_PAGE_LIMIT);
    let offset = feed::parse_number(query.offset.as_deref(), 0).max(0);
    let comments = data.repo.list_comments(post_id, limit, offset).await.map_err(|e| {
        error!("listing comments for {post_id} failed: {e}");
        ApiError::Internal(messages::COMMENTS_FAILED)
    })?;
    Ok(HttpResponse::Ok().json(comments))
}

/// Extracts `postId` from a like request body; anything but a uuid string is a 400.
fn parse_like_body(body: &[u8]) -> Result<Id, ApiError> {
    let value: serde_json::Value = serde_json::from_slice(body)
        .map_err(|_| ApiError::BadRequest(messages::POST_ID_REQUIRED))?;
    value.get("postId")
        .and_then(serde_json::Value::as_str)
        .and_then(|s| s.trim().parse::<Id>().ok())
        .ok_or(ApiError::BadRequest(messages::POST_ID_REQUIRED))
}

async fn resolve_caller(repo: &dyn Repo, caller: &Caller) -> Result<User, ApiError> {
    repo.find_user_by_clerk_id(&caller.clerk_id).await.map_err(|e| match e {
        RepoError::NotFound => ApiError::NotFound(messages::USER_NOT_FOUND),
        other => {
            error!("looking up user {} failed: {other}", caller.clerk_id);
            ApiError::Internal(messages::SERVER_ERROR)
        }
    })
}

#[utoipa::path(
    post,
    path = "/api/likes",
    tag = "likes",
    request_body = LikeRequest,
    responses(
        (status = 200, description = "Like added", body = SuccessResponse),
        (status = 400, description = "postId missing or invalid"),
        (status = 401, description = "Unauthenticated"),
        (status = 404, description = "Caller not synced or post not found"),
        (status = 409, description = "Already liked"),
        (status = 500, description = "Database failure")
    )
)]
pub async fn add_like(caller: Option<Caller>, data: web::Data<AppState>, body: web::Bytes) -> Result<HttpResponse, ApiError> {
    let caller = caller.ok_or(ApiError::Unauthorized)?;
    let post_id = parse_like_body(&body)?;
    let user = resolve_caller(data.repo.as_ref(), &caller).await?;
    match data.repo.add_like(post_id, user.id).await {
        Ok(_) => Ok(HttpResponse::Ok().json(SuccessResponse { success: true })),
        Err(RepoError::Conflict) => Err(ApiError::Conflict(messages::ALREADY_LIKED)),
        Err(RepoError::NotFound) => Err(ApiError::NotFound(messages::POST_NOT_FOUND)),
        Err(RepoError::Internal(e)) => {
            error!("inserting like ({post_id}, {}) failed: {e}", user.id);
            Err(ApiError::Internal(messages::LIKE_ADD_FAILED))
        }
    }
}

#[utoipa::path(
    delete,
    path = "/api/likes",
    tag = "likes",
    request_body = LikeRequest,
    responses(
        (status = 200, description = "Like removed (or was absent)", body = SuccessResponse),
        (status = 400, description = "postId missing or invalid"),
        (status = 401, description = "Unauthenticated"),
        (status = 404, description = "Caller not synced"),
        (status = 500, description = "Database failure")
    )
)]
pub async fn remove_like(caller: Option<Caller>, data: web::Data<AppState>, body: web::Bytes) -> Result<HttpResponse, ApiError> {
    let caller = caller.ok_or(ApiError::Unauthorized)?;
    let post_id = parse_like_body(&body)?;
    let user = resolve_caller(data.repo.as_ref(), &caller).await?;
    let removed = data.repo.remove_like(post_id, user.id).await.map_err(|e| {
        error!("deleting like ({post_id}, {}) failed: {e}", user.id);
        ApiError::Internal(messages::LIKE_REMOVE_FAILED)
    })?;
    debug!(%post_id, removed, "like removal");
    Ok(HttpResponse::Ok().json(SuccessResponse { success: true }))
}
