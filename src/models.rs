use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

pub type Id = Uuid;

/// Upper bound enforced on post captions (mirrors the `posts.caption` CHECK).
pub const CAPTION_MAX_CHARS: usize = 2200;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct User {
    pub id: Id,
    pub clerk_id: String, // external auth identifier, unique
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NewUser {
    pub clerk_id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct Post {
    pub id: Id,
    pub user_id: Id,
    pub image_url: String,
    pub caption: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NewPost {
    pub user_id: Id,
    pub image_url: String,
    pub caption: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct Like {
    pub id: Id,
    pub post_id: Id,
    pub user_id: Id,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct Comment {
    pub id: Id,
    pub post_id: Id,
    pub user_id: Id,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NewComment {
    pub post_id: Id,
    pub user_id: Id,
    pub content: String,
}

/// Row of the `post_stats` aggregation view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct PostStats {
    pub post_id: Id,
    pub likes_count: i64,
    pub comments_count: i64,
}

/// A post joined with its owner, as returned by the listing query.
#[derive(Debug, Clone, PartialEq)]
pub struct OwnedPost {
    pub post: Post,
    pub user: User,
}

/// One page of posts plus the exact row count matching the filter.
#[derive(Debug, Clone, Default)]
pub struct PostPage {
    pub rows: Vec<OwnedPost>,
    pub total: i64,
}

#[derive(Debug, Clone, Default)]
pub struct PostFilter {
    pub user_id: Option<Id>,
    pub offset: i64,
    pub limit: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PostWithUser {
    pub id: Id,
    pub user_id: Id,
    pub image_url: String,
    pub caption: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub user: User,
    pub likes_count: i64,
    pub comments_count: i64,
    pub is_liked: bool, // whether the calling user liked this post
}

impl PostWithUser {
    pub fn from_parts(owned: OwnedPost, stats: Option<PostStats>, is_liked: bool) -> Self {
        let OwnedPost { post, user } = owned;
        let stats = stats.unwrap_or_default();
        Self {
            id: post.id,
            user_id: post.user_id,
            image_url: post.image_url,
            caption: post.caption,
            created_at: post.created_at,
            updated_at: post.updated_at,
            user,
            likes_count: stats.likes_count,
            comments_count: stats.comments_count,
            is_liked,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CommentWithUser {
    pub id: Id,
    pub post_id: Id,
    pub user_id: Id,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub user: User,
}

impl CommentWithUser {
    pub fn from_parts(comment: Comment, user: User) -> Self {
        Self {
            id: comment.id,
            post_id: comment.post_id,
            user_id: comment.user_id,
            content: comment.content,
            created_at: comment.created_at,
            updated_at: comment.updated_at,
            user,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PaginationMeta {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub has_more: bool,
}

impl PaginationMeta {
    pub fn new(page: i64, limit: i64, total: i64) -> Self {
        // page comes from the query string; saturate instead of overflowing
        let offset = (page - 1).saturating_mul(limit);
        Self { page, limit, total, has_more: offset.saturating_add(limit) < total }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[aliases(PaginatedPosts = Paginated<PostWithUser>)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub meta: PaginationMeta,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LikeRequest {
    #[serde(rename = "postId")]
    pub post_id: Id,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SuccessResponse {
    pub success: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn has_more_follows_offset_plus_limit() {
        assert!(!PaginationMeta::new(1, 10, 0).has_more);
        assert!(!PaginationMeta::new(1, 10, 10).has_more);
        assert!(PaginationMeta::new(1, 10, 11).has_more);
        assert!(PaginationMeta::new(2, 2, 5).has_more);
        assert!(!PaginationMeta::new(3, 2, 5).has_more);
        assert!(!PaginationMeta::new(i64::MAX, 50, 5).has_more);
    }

    #[test]
    fn post_dto_defaults_missing_stats_to_zero() {
        let now = Utc::now();
        let user = User { id: Uuid::new_v4(), clerk_id: "user_1".into(), name: "kim".into(), created_at: now };
        let post = Post { id: Uuid::new_v4(), user_id: user.id, image_url: "https://img/1.jpg".into(), caption: None, created_at: now, updated_at: now };
        let dto = PostWithUser::from_parts(OwnedPost { post, user }, None, false);
        assert_eq!(dto.likes_count, 0);
        assert_eq!(dto.comments_count, 0);
        let json = serde_json::to_value(&dto).unwrap();
        assert_eq!(json["user"]["name"], "kim");
        assert!(json["caption"].is_null());
    }
}
