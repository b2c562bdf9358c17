use actix_web::{HttpResponse, ResponseError};
use serde::Serialize;

use crate::repo::RepoError;

/// User-facing (Korean) messages carried in `{"error": ...}` bodies.
pub mod messages {
    pub const AUTH_REQUIRED: &str = "인증이 필요합니다.";
    pub const POST_ID_REQUIRED: &str = "postId가 필요합니다.";
    pub const POST_ID_PARAM_REQUIRED: &str = "postId 파라미터가 필요합니다.";
    pub const USER_NOT_FOUND: &str = "사용자 정보를 찾을 수 없습니다.";
    pub const POST_NOT_FOUND: &str = "게시물을 찾을 수 없습니다.";
    pub const ALREADY_LIKED: &str = "이미 좋아요를 누른 게시물입니다.";
    pub const POSTS_FAILED: &str = "게시물을 불러오는 중 오류가 발생했습니다.";
    pub const COMMENTS_FAILED: &str = "댓글을 불러오는 중 오류가 발생했습니다.";
    pub const LIKE_ADD_FAILED: &str = "좋아요 추가 중 오류가 발생했습니다.";
    pub const LIKE_REMOVE_FAILED: &str = "좋아요 제거 중 오류가 발생했습니다.";
    pub const SERVER_ERROR: &str = "서버 오류가 발생했습니다.";
}

#[derive(Debug, Serialize)]
pub struct ApiErrorBody {
    pub error: String,
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ApiError {
    #[error("{0}")] BadRequest(&'static str),
    #[error("{}", messages::AUTH_REQUIRED)] Unauthorized,
    #[error("{0}")] NotFound(&'static str),
    #[error("{0}")] Conflict(&'static str),
    #[error("{0}")] Internal(&'static str),
}

impl From<RepoError> for ApiError {
    fn from(e: RepoError) -> Self {
        match e {
            RepoError::NotFound => ApiError::NotFound(messages::POST_NOT_FOUND),
            RepoError::Conflict => ApiError::Conflict(messages::ALREADY_LIKED),
            RepoError::Internal(_) => ApiError::Internal(messages::SERVER_ERROR),
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> actix_web::http::StatusCode {
        use actix_web::http::StatusCode;
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ApiErrorBody { error: self.to_string() })
    }
}
