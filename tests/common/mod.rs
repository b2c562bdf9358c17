#![allow(dead_code)]

use actix_web::web;
use async_trait::async_trait;
use jsonwebtoken::{encode, EncodingKey, Header};

use instafeed::auth::{Claims, TokenVerifier};
use instafeed::config::TokenKey;
use instafeed::models::*;
use instafeed::repo::inmem::InMemRepo;
use instafeed::repo::{CommentRepo, LikeRepo, PostRepo, RepoError, RepoResult, UserRepo};

pub const SECRET: &str = "test-secret-must-be-32-bytes-long!!";

pub fn verifier() -> web::Data<TokenVerifier> {
    web::Data::new(TokenVerifier::new(&TokenKey::Secret(SECRET.into()), None).unwrap())
}

pub fn token_for(clerk_id: &str) -> String {
    let exp = (chrono::Utc::now().timestamp() + 3600) as usize;
    let claims = Claims { sub: clerk_id.into(), exp, iss: None };
    encode(&Header::default(), &claims, &EncodingKey::from_secret(SECRET.as_bytes())).unwrap()
}

pub fn bearer(clerk_id: &str) -> (&'static str, String) {
    ("Authorization", format!("Bearer {}", token_for(clerk_id)))
}

pub async fn seed_user(repo: &InMemRepo, clerk_id: &str, name: &str) -> User {
    repo.create_user(NewUser { clerk_id: clerk_id.into(), name: name.into() }).await.unwrap()
}

pub async fn seed_post(repo: &InMemRepo, owner: &User, caption: &str) -> Post {
    repo.create_post(NewPost {
        user_id: owner.id,
        image_url: format!("https://images.example.com/{caption}.jpg"),
        caption: Some(caption.into()),
    })
    .await
    .unwrap()
}

pub async fn seed_comment(repo: &InMemRepo, post: &Post, author: &User, content: &str) -> Comment {
    repo.create_comment(NewComment { post_id: post.id, user_id: author.id, content: content.into() })
        .await
        .unwrap()
}

/// Builds the service under test around a repository `Arc`.
macro_rules! test_app {
    ($repo:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data(actix_web::web::Data::new(instafeed::AppState { repo: $repo }))
                .app_data(common::verifier())
                .configure(instafeed::config),
        )
        .await
    };
}

/// Every query fails, as if the database were unreachable.
pub struct FailingRepo;

fn down<T>() -> RepoResult<T> {
    Err(RepoError::Internal("connection refused".into()))
}

#[async_trait]
impl UserRepo for FailingRepo {
    async fn find_user_by_clerk_id(&self, _clerk_id: &str) -> RepoResult<User> { down() }
    async fn create_user(&self, _new: NewUser) -> RepoResult<User> { down() }
}

#[async_trait]
impl PostRepo for FailingRepo {
    async fn list_posts(&self, _filter: PostFilter) -> RepoResult<PostPage> { down() }
    async fn post_stats(&self, _post_ids: &[Id]) -> RepoResult<Vec<PostStats>> { down() }
    async fn create_post(&self, _new: NewPost) -> RepoResult<Post> { down() }
}

#[async_trait]
impl LikeRepo for FailingRepo {
    async fn add_like(&self, _post_id: Id, _user_id: Id) -> RepoResult<Like> { down() }
    async fn remove_like(&self, _post_id: Id, _user_id: Id) -> RepoResult<bool> { down() }
    async fn liked_post_ids(&self, _user_id: Id, _post_ids: &[Id]) -> RepoResult<Vec<Id>> { down() }
}

#[async_trait]
impl CommentRepo for FailingRepo {
    async fn list_comments(&self, _post_id: Id, _limit: i64, _offset: i64) -> RepoResult<Vec<CommentWithUser>> { down() }
    async fn create_comment(&self, _new: NewComment) -> RepoResult<Comment> { down() }
}
