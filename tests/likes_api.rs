#![cfg(feature = "inmem-store")]

#[macro_use]
mod common;

use actix_web::test;
use instafeed::error::messages;
use instafeed::repo::inmem::InMemRepo;
use instafeed::repo::PostRepo;
use serde_json::{json, Value};
use std::sync::Arc;

use common::{bearer, seed_post, seed_user, FailingRepo};

async fn likes_count(repo: &InMemRepo, post_id: uuid::Uuid) -> i64 {
    repo.post_stats(&[post_id]).await.unwrap()[0].likes_count
}

#[actix_web::test]
async fn unauthenticated_like_is_rejected_without_insert() {
    let repo = InMemRepo::new();
    let owner = seed_user(&repo, "user_owner", "owner").await;
    let post = seed_post(&repo, &owner, "p").await;
    let app = test_app!(Arc::new(repo.clone()));

    let req = test::TestRequest::post().uri("/api/likes").set_json(json!({"postId": post.id})).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);
    let v: Value = serde_json::from_slice(&test::read_body(resp).await).unwrap();
    assert_eq!(v["error"], messages::AUTH_REQUIRED);

    // a forged token is no better than none
    let req = test::TestRequest::delete()
        .uri("/api/likes")
        .insert_header(("Authorization", "Bearer forged.token.value"))
        .set_json(json!({"postId": post.id}))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 401);

    assert_eq!(likes_count(&repo, post.id).await, 0);
}

#[actix_web::test]
async fn double_like_conflicts_and_counts_once() {
    let repo = InMemRepo::new();
    let owner = seed_user(&repo, "user_owner", "owner").await;
    seed_user(&repo, "user_fan", "fan").await;
    let post = seed_post(&repo, &owner, "p").await;
    let app = test_app!(Arc::new(repo.clone()));

    let req = test::TestRequest::post().uri("/api/likes").insert_header(bearer("user_fan"))
        .set_json(json!({"postId": post.id})).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    let v: Value = serde_json::from_slice(&test::read_body(resp).await).unwrap();
    assert_eq!(v, json!({"success": true}));

    let req = test::TestRequest::post().uri("/api/likes").insert_header(bearer("user_fan"))
        .set_json(json!({"postId": post.id})).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 409);
    let v: Value = serde_json::from_slice(&test::read_body(resp).await).unwrap();
    assert_eq!(v["error"], messages::ALREADY_LIKED);

    assert_eq!(likes_count(&repo, post.id).await, 1);
}

#[actix_web::test]
async fn unlike_is_idempotent() {
    let repo = InMemRepo::new();
    let owner = seed_user(&repo, "user_owner", "owner").await;
    seed_user(&repo, "user_fan", "fan").await;
    let post = seed_post(&repo, &owner, "p").await;
    let app = test_app!(Arc::new(repo.clone()));

    let like = test::TestRequest::post().uri("/api/likes").insert_header(bearer("user_fan"))
        .set_json(json!({"postId": post.id})).to_request();
    assert_eq!(test::call_service(&app, like).await.status(), 200);
    assert_eq!(likes_count(&repo, post.id).await, 1);

    for _ in 0..2 {
        let req = test::TestRequest::delete().uri("/api/likes").insert_header(bearer("user_fan"))
            .set_json(json!({"postId": post.id})).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 200);
        assert_eq!(likes_count(&repo, post.id).await, 0);
    }
}

#[actix_web::test]
async fn body_and_identity_errors() {
    let repo = InMemRepo::new();
    let owner = seed_user(&repo, "user_owner", "owner").await;
    let post = seed_post(&repo, &owner, "p").await;
    let app = test_app!(Arc::new(repo.clone()));

    for body in [json!({}), json!({"postId": 12}), json!({"postId": "not-a-uuid"})] {
        let req = test::TestRequest::post().uri("/api/likes").insert_header(bearer("user_owner"))
            .set_json(body).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400);
        let v: Value = serde_json::from_slice(&test::read_body(resp).await).unwrap();
        assert_eq!(v["error"], messages::POST_ID_REQUIRED);
    }

    let req = test::TestRequest::post().uri("/api/likes").insert_header(bearer("user_owner"))
        .insert_header(("Content-Type", "application/json"))
        .set_payload("{not json").to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 400);

    // caller authenticated with the provider but never synced
    let req = test::TestRequest::post().uri("/api/likes").insert_header(bearer("user_unsynced"))
        .set_json(json!({"postId": post.id})).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 404);
    let v: Value = serde_json::from_slice(&test::read_body(resp).await).unwrap();
    assert_eq!(v["error"], messages::USER_NOT_FOUND);

    let req = test::TestRequest::delete().uri("/api/likes").insert_header(bearer("user_unsynced"))
        .set_json(json!({"postId": post.id})).to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 404);

    // liking a post that does not exist
    let req = test::TestRequest::post().uri("/api/likes").insert_header(bearer("user_owner"))
        .set_json(json!({"postId": uuid::Uuid::new_v4()})).to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 404);
}

#[actix_web::test]
async fn database_failure_is_a_500() {
    let app = test_app!(Arc::new(FailingRepo));
    let req = test::TestRequest::post().uri("/api/likes").insert_header(bearer("user_owner"))
        .set_json(json!({"postId": uuid::Uuid::new_v4()})).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 500);
    let v: Value = serde_json::from_slice(&test::read_body(resp).await).unwrap();
    assert_eq!(v["error"], messages::SERVER_ERROR);
}
