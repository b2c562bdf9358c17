use async_trait::async_trait;

use crate::models::*;

#[derive(thiserror::Error, Debug)]
pub enum RepoError {
    #[error("not found")] NotFound,
    #[error("conflict")] Conflict,
    #[error("internal: {0}")] Internal(String),
}

pub type RepoResult<T> = Result<T, RepoError>;

#[async_trait]
pub trait UserRepo: Send + Sync {
    /// Resolve an external (auth provider) identity to the synced user row.
    async fn find_user_by_clerk_id(&self, clerk_id: &str) -> RepoResult<User>;
    async fn create_user(&self, new: NewUser) -> RepoResult<User>;
}

#[async_trait]
pub trait PostRepo: Send + Sync {
    /// Newest-first page of posts joined with their owners, plus the total
    /// number of posts matching the filter.
    async fn list_posts(&self, filter: PostFilter) -> RepoResult<PostPage>;
    async fn post_stats(&self, post_ids: &[Id]) -> RepoResult<Vec<PostStats>>;
    async fn create_post(&self, new: NewPost) -> RepoResult<Post>;
}

#[async_trait]
pub trait LikeRepo: Send + Sync {
    /// Fails with `Conflict` when the (post, user) pair already exists.
    async fn add_like(&self, post_id: Id, user_id: Id) -> RepoResult<Like>;
    /// Returns whether a row was removed.
    async fn remove_like(&self, post_id: Id, user_id: Id) -> RepoResult<bool>;
    /// Subset of `post_ids` liked by `user_id`.
    async fn liked_post_ids(&self, user_id: Id, post_ids: &[Id]) -> RepoResult<Vec<Id>>;
}

#[async_trait]
pub trait CommentRepo: Send + Sync {
    async fn list_comments(&self, post_id: Id, limit: i64, offset: i64) -> RepoResult<Vec<CommentWithUser>>;
    async fn create_comment(&self, new: NewComment) -> RepoResult<Comment>;
}

pub trait Repo: UserRepo + PostRepo + LikeRepo + CommentRepo {}

impl<T> Repo for T where T: UserRepo + PostRepo + LikeRepo + CommentRepo {}

#[cfg(feature = "inmem-store")]
pub mod inmem {
    use super::*;
    use chrono::Utc;
    use std::collections::{HashMap, HashSet};
    use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
    use uuid::Uuid;

    #[derive(Default)]
    struct State {
        users: HashMap<Id, User>,
        // insertion order is kept so equal timestamps still list newest-inserted first
        posts: Vec<Post>,
        likes: Vec<Like>,
        comments: Vec<Comment>,
    }

    impl State {
        fn post_exists(&self, id: Id) -> bool {
            self.posts.iter().any(|p| p.id == id)
        }
    }

    /// Process-local store with the same constraint behavior as the Postgres schema.
    #[derive(Clone, Default)]
    pub struct InMemRepo {
        state: Arc<RwLock<State>>,
    }

    impl InMemRepo {
        pub fn new() -> Self {
            Self::default()
        }

        fn read(&self) -> RepoResult<RwLockReadGuard<'_, State>> {
            self.state.read().map_err(|_| RepoError::Internal("state lock poisoned".into()))
        }

        fn write(&self) -> RepoResult<RwLockWriteGuard<'_, State>> {
            self.state.write().map_err(|_| RepoError::Internal("state lock poisoned".into()))
        }
    }

    #[async_trait]
    impl UserRepo for InMemRepo {
        async fn find_user_by_clerk_id(&self, clerk_id: &str) -> RepoResult<User> {
            let s = self.read()?;
            s.users.values().find(|u| u.clerk_id == clerk_id).cloned().ok_or(RepoError::NotFound)
        }

        async fn create_user(&self, new: NewUser) -> RepoResult<User> {
            let mut s = self.write()?;
            if s.users.values().any(|u| u.clerk_id == new.clerk_id) {
                return Err(RepoError::Conflict);
            }
            let user = User { id: Uuid::new_v4(), clerk_id: new.clerk_id, name: new.name, created_at: Utc::now() };
            s.users.insert(user.id, user.clone());
            Ok(user)
        }
    }

    #[async_trait]
    impl PostRepo for InMemRepo {
        async fn list_posts(&self, filter: PostFilter) -> RepoResult<PostPage> {
            let s = self.read()?;
            let mut matching: Vec<&Post> = s.posts.iter()
                .rev()
                .filter(|p| filter.user_id.map_or(true, |uid| p.user_id == uid))
                .collect();
            matching.sort_by(|a, b| b.created_at.cmp(&a.created_at)); // stable: ties stay newest-inserted first
            let total = matching.len() as i64;
            let rows = matching.into_iter()
                .skip(filter.offset.max(0) as usize)
                .take(filter.limit.max(0) as usize)
                .filter_map(|p| {
                    // inner join: posts whose owner vanished are dropped like the SQL join would
                    s.users.get(&p.user_id).map(|u| OwnedPost { post: p.clone(), user: u.clone() })
                })
                .collect();
            Ok(PostPage { rows, total })
        }

        async fn post_stats(&self, post_ids: &[Id]) -> RepoResult<Vec<PostStats>> {
            let s = self.read()?;
            let wanted: HashSet<&Id> = post_ids.iter().collect();
            let stats = s.posts.iter()
                .filter(|p| wanted.contains(&p.id))
                .map(|p| PostStats {
                    post_id: p.id,
                    likes_count: s.likes.iter().filter(|l| l.post_id == p.id).count() as i64,
                    comments_count: s.comments.iter().filter(|c| c.post_id == p.id).count() as i64,
                })
                .collect();
            Ok(stats)
        }

        async fn create_post(&self, new: NewPost) -> RepoResult<Post> {
            let mut s = self.write()?;
            if !s.users.contains_key(&new.user_id) { return Err(RepoError::NotFound); }
            if new.caption.as_ref().is_some_and(|c| c.chars().count() > CAPTION_MAX_CHARS) {
                return Err(RepoError::Internal("caption exceeds maximum length".into()));
            }
            let now = Utc::now();
            let post = Post {
                id: Uuid::new_v4(),
                user_id: new.user_id,
                image_url: new.image_url,
                caption: new.caption,
                created_at: now,
                updated_at: now,
            };
            s.posts.push(post.clone());
            Ok(post)
        }
    }

    #[async_trait]
    impl LikeRepo for InMemRepo {
        async fn add_like(&self, post_id: Id, user_id: Id) -> RepoResult<Like> {
            let mut s = self.write()?;
            if !s.post_exists(post_id) || !s.users.contains_key(&user_id) {
                return Err(RepoError::NotFound);
            }
            if s.likes.iter().any(|l| l.post_id == post_id && l.user_id == user_id) {
                return Err(RepoError::Conflict);
            }
            let like = Like { id: Uuid::new_v4(), post_id, user_id, created_at: Utc::now() };
            s.likes.push(like.clone());
            Ok(like)
        }

        async fn remove_like(&self, post_id: Id, user_id: Id) -> RepoResult<bool> {
            let mut s = self.write()?;
            let before = s.likes.len();
            s.likes.retain(|l| !(l.post_id == post_id && l.user_id == user_id));
            Ok(s.likes.len() != before)
        }

        async fn liked_post_ids(&self, user_id: Id, post_ids: &[Id]) -> RepoResult<Vec<Id>> {
            let s = self.read()?;
            Ok(s.likes.iter()
                .filter(|l| l.user_id == user_id && post_ids.contains(&l.post_id))
                .map(|l| l.post_id)
                .collect())
        }
    }

    #[async_trait]
    impl CommentRepo for InMemRepo {
        async fn list_comments(&self, post_id: Id, limit: i64, offset: i64) -> RepoResult<Vec<CommentWithUser>> {
            let s = self.read()?;
            let mut v: Vec<&Comment> = s.comments.iter().rev().filter(|c| c.post_id == post_id).collect();
            v.sort_by(|a, b| b.created_at.cmp(&a.created_at)); // newest first
            Ok(v.into_iter()
                .skip(offset.max(0) as usize)
                .take(limit.max(0) as usize)
                .filter_map(|c| s.users.get(&c.user_id).map(|u| CommentWithUser::from_parts(c.clone(), u.clone())))
                .collect())
        }

        async fn create_comment(&self, new: NewComment) -> RepoResult<Comment> {
            let mut s = self.write()?;
            if !s.post_exists(new.post_id) || !s.users.contains_key(&new.user_id) {
                return Err(RepoError::NotFound);
            }
            let now = Utc::now();
            let comment = Comment {
                id: Uuid::new_v4(),
                post_id: new.post_id,
                user_id: new.user_id,
                content: new.content,
                created_at: now,
                updated_at: now,
            };
            s.comments.push(comment.clone());
            Ok(comment)
        }
    }
}

// Postgres implementation (feature = "postgres-store")
#[cfg(feature = "postgres-store")]
pub mod pg {
    use super::*;
    use chrono::{DateTime, Utc};
    use sqlx::{Pool, Postgres};

    #[derive(Clone)]
    pub struct PgRepo { pool: Pool<Postgres> }

    impl PgRepo {
        pub fn new(pool: Pool<Postgres>) -> Self { Self { pool } }
    }

    /// Maps driver errors onto the repository taxonomy; constraint
    /// violations are the only ones callers branch on.
    fn classify(e: sqlx::Error) -> RepoError {
        match e {
            sqlx::Error::RowNotFound => RepoError::NotFound,
            sqlx::Error::Database(db) if db.is_unique_violation() => RepoError::Conflict,
            sqlx::Error::Database(db) if db.is_foreign_key_violation() => RepoError::NotFound,
            other => RepoError::Internal(other.to_string()),
        }
    }

    // owner columns are aliased so the join flattens into one row
    #[derive(sqlx::FromRow)]
    struct PostRow {
        id: Id,
        user_id: Id,
        image_url: String,
        caption: Option<String>,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
        owner_id: Id,
        owner_clerk_id: String,
        owner_name: String,
        owner_created_at: DateTime<Utc>,
    }

    impl From<PostRow> for OwnedPost {
        fn from(r: PostRow) -> Self {
            OwnedPost {
                post: Post { id: r.id, user_id: r.user_id, image_url: r.image_url, caption: r.caption, created_at: r.created_at, updated_at: r.updated_at },
                user: User { id: r.owner_id, clerk_id: r.owner_clerk_id, name: r.owner_name, created_at: r.owner_created_at },
            }
        }
    }

    #[derive(sqlx::FromRow)]
    struct CommentRow {
        id: Id,
        post_id: Id,
        user_id: Id,
        content: String,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
        author_id: Id,
        author_clerk_id: String,
        author_name: String,
        author_created_at: DateTime<Utc>,
    }

    impl From<CommentRow> for CommentWithUser {
        fn from(r: CommentRow) -> Self {
            CommentWithUser {
                id: r.id,
                post_id: r.post_id,
                user_id: r.user_id,
                content: r.content,
                created_at: r.created_at,
                updated_at: r.updated_at,
                user: User { id: r.author_id, clerk_id: r.author_clerk_id, name: r.author_name, created_at: r.author_created_at },
            }
        }
    }

    #[async_trait]
    impl UserRepo for PgRepo {
        async fn find_user_by_clerk_id(&self, clerk_id: &str) -> RepoResult<User> {
            sqlx::query_as::<_, User>("SELECT id, clerk_id, name, created_at FROM users WHERE clerk_id = $1")
                .bind(clerk_id)
                .fetch_one(&self.pool).await.map_err(classify)
        }

        async fn create_user(&self, new: NewUser) -> RepoResult<User> {
            sqlx::query_as::<_, User>("INSERT INTO users (clerk_id, name) VALUES ($1,$2) RETURNING id, clerk_id, name, created_at")
                .bind(&new.clerk_id).bind(&new.name)
                .fetch_one(&self.pool).await.map_err(classify)
        }
    }

    #[async_trait]
    impl PostRepo for PgRepo {
        async fn list_posts(&self, filter: PostFilter) -> RepoResult<PostPage> {
            let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM posts WHERE ($1::uuid IS NULL OR user_id = $1)")
                .bind(filter.user_id)
                .fetch_one(&self.pool).await.map_err(classify)?;
            let rows = sqlx::query_as::<_, PostRow>(r#"
                SELECT p.id, p.user_id, p.image_url, p.caption, p.created_at, p.updated_at,
                       u.id AS owner_id, u.clerk_id AS owner_clerk_id,
                       u.name AS owner_name, u.created_at AS owner_created_at
                FROM posts p
                JOIN users u ON u.id = p.user_id
                WHERE ($1::uuid IS NULL OR p.user_id = $1)
                ORDER BY p.created_at DESC, p.id DESC
                LIMIT $2 OFFSET $3
            "#)
                .bind(filter.user_id)
                .bind(filter.limit)
                .bind(filter.offset)
                .fetch_all(&self.pool).await.map_err(classify)?;
            Ok(PostPage { rows: rows.into_iter().map(OwnedPost::from).collect(), total })
        }

        async fn post_stats(&self, post_ids: &[Id]) -> RepoResult<Vec<PostStats>> {
            sqlx::query_as::<_, PostStats>(
                "SELECT post_id, likes_count, comments_count FROM post_stats WHERE post_id = ANY($1)"
            )
                .bind(post_ids)
                .fetch_all(&self.pool).await.map_err(classify)
        }

        async fn create_post(&self, new: NewPost) -> RepoResult<Post> {
            sqlx::query_as::<_, Post>(
                "INSERT INTO posts (user_id, image_url, caption) VALUES ($1,$2,$3) RETURNING id, user_id, image_url, caption, created_at, updated_at"
            )
                .bind(new.user_id).bind(&new.image_url).bind(new.caption.as_ref())
                .fetch_one(&self.pool).await.map_err(classify)
        }
    }

    #[async_trait]
    impl LikeRepo for PgRepo {
        async fn add_like(&self, post_id: Id, user_id: Id) -> RepoResult<Like> {
            sqlx::query_as::<_, Like>(
                "INSERT INTO likes (post_id, user_id) VALUES ($1,$2) RETURNING id, post_id, user_id, created_at"
            )
                .bind(post_id).bind(user_id)
                .fetch_one(&self.pool).await.map_err(classify)
        }

        async fn remove_like(&self, post_id: Id, user_id: Id) -> RepoResult<bool> {
            let res = sqlx::query("DELETE FROM likes WHERE post_id = $1 AND user_id = $2")
                .bind(post_id).bind(user_id)
                .execute(&self.pool).await.map_err(classify)?;
            Ok(res.rows_affected() > 0)
        }

        async fn liked_post_ids(&self, user_id: Id, post_ids: &[Id]) -> RepoResult<Vec<Id>> {
            sqlx::query_scalar::<_, Id>("SELECT post_id FROM likes WHERE user_id = $1 AND post_id = ANY($2)")
                .bind(user_id).bind(post_ids)
                .fetch_all(&self.pool).await.map_err(classify)
        }
    }

    #[async_trait]
    impl CommentRepo for PgRepo {
        async fn list_comments(&self, post_id: Id, limit: i64, offset: i64) -> RepoResult<Vec<CommentWithUser>> {
            let rows = sqlx::query_as::<_, CommentRow>(r#"
                SELECT c.id, c.post_id, c.user_id, c.content, c.created_at, c.updated_at,
                       u.id AS author_id, u.clerk_id AS author_clerk_id,
                       u.name AS author_name, u.created_at AS author_created_at
                FROM comments c
                JOIN users u ON u.id = c.user_id
                WHERE c.post_id = $1
                ORDER BY c.created_at DESC, c.id DESC
                LIMIT $2 OFFSET $3
            "#)
                .bind(post_id).bind(limit).bind(offset)
                .fetch_all(&self.pool).await.map_err(classify)?;
            Ok(rows.into_iter().map(CommentWithUser::from).collect())
        }

        async fn create_comment(&self, new: NewComment) -> RepoResult<Comment> {
            sqlx::query_as::<_, Comment>(
                "INSERT INTO comments (post_id, user_id, content) VALUES ($1,$2,$3) RETURNING id, post_id, user_id, content, created_at, updated_at"
            )
                .bind(new.post_id).bind(new.user_id).bind(&new.content)
                .fetch_one(&self.pool).await.map_err(classify)
        }
    }
}
