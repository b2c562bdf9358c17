#![cfg(feature = "inmem-store")]

use instafeed::{
    models::{NewComment, NewPost, NewUser, PostFilter, CAPTION_MAX_CHARS},
    repo::{inmem::InMemRepo, RepoError},
};
// Bring trait method namespaces into scope so calls on InMemRepo resolve.
use instafeed::repo::{CommentRepo, LikeRepo, PostRepo, UserRepo};

async fn user(r: &InMemRepo, clerk_id: &str) -> instafeed::models::User {
    r.create_user(NewUser { clerk_id: clerk_id.into(), name: clerk_id.into() })
        .await
        .unwrap()
}

async fn post(r: &InMemRepo, owner: uuid::Uuid, caption: &str) -> instafeed::models::Post {
    r.create_post(NewPost {
        user_id: owner,
        image_url: "https://images.example.com/p.jpg".into(),
        caption: Some(caption.into()),
    })
    .await
    .unwrap()
}

#[tokio::test]
async fn user_sync_and_conflict() {
    let r = InMemRepo::new();
    assert!(matches!(r.find_user_by_clerk_id("user_a").await, Err(RepoError::NotFound)));

    let a = user(&r, "user_a").await;
    assert_eq!(r.find_user_by_clerk_id("user_a").await.unwrap().id, a.id);

    // duplicate external id → conflict
    let err = r
        .create_user(NewUser { clerk_id: "user_a".into(), name: "again".into() })
        .await
        .unwrap_err();
    assert!(matches!(err, RepoError::Conflict));
}

#[tokio::test]
async fn posts_list_newest_first_with_filter_and_window() {
    let r = InMemRepo::new();
    let a = user(&r, "user_a").await;
    let b = user(&r, "user_b").await;
    post(&r, a.id, "a1").await;
    post(&r, b.id, "b1").await;
    post(&r, a.id, "a2").await;

    let all = r.list_posts(PostFilter { user_id: None, offset: 0, limit: 10 }).await.unwrap();
    assert_eq!(all.total, 3);
    let captions: Vec<_> = all.rows.iter().map(|o| o.post.caption.clone().unwrap()).collect();
    assert_eq!(captions, ["a2", "b1", "a1"]);
    assert_eq!(all.rows[1].user.id, b.id);

    let window = r.list_posts(PostFilter { user_id: None, offset: 1, limit: 1 }).await.unwrap();
    assert_eq!(window.total, 3);
    assert_eq!(window.rows.len(), 1);
    assert_eq!(window.rows[0].post.caption.as_deref(), Some("b1"));

    let mine = r.list_posts(PostFilter { user_id: Some(a.id), offset: 0, limit: 10 }).await.unwrap();
    assert_eq!(mine.total, 2);
    assert!(mine.rows.iter().all(|o| o.post.user_id == a.id));

    let past_end = r.list_posts(PostFilter { user_id: None, offset: 50, limit: 10 }).await.unwrap();
    assert_eq!(past_end.total, 3);
    assert!(past_end.rows.is_empty());
}

#[tokio::test]
async fn post_constraints() {
    let r = InMemRepo::new();
    let err = r
        .create_post(NewPost { user_id: uuid::Uuid::new_v4(), image_url: "x".into(), caption: None })
        .await
        .unwrap_err();
    assert!(matches!(err, RepoError::NotFound));

    let a = user(&r, "user_a").await;
    let at_limit = "x".repeat(CAPTION_MAX_CHARS);
    post(&r, a.id, &at_limit).await;
    let err = r
        .create_post(NewPost { user_id: a.id, image_url: "x".into(), caption: Some(format!("{at_limit}x")) })
        .await
        .unwrap_err();
    assert!(matches!(err, RepoError::Internal(_)));
}

#[tokio::test]
async fn like_lifecycle_and_stats() {
    let r = InMemRepo::new();
    let a = user(&r, "user_a").await;
    let b = user(&r, "user_b").await;
    let p1 = post(&r, a.id, "one").await;
    let p2 = post(&r, a.id, "two").await;

    r.add_like(p1.id, a.id).await.unwrap();
    r.add_like(p1.id, b.id).await.unwrap();
    assert!(matches!(r.add_like(p1.id, b.id).await, Err(RepoError::Conflict)));
    assert!(matches!(r.add_like(uuid::Uuid::new_v4(), b.id).await, Err(RepoError::NotFound)));

    r.create_comment(NewComment { post_id: p2.id, user_id: b.id, content: "nice".into() })
        .await
        .unwrap();

    let mut stats = r.post_stats(&[p1.id, p2.id]).await.unwrap();
    stats.sort_by_key(|s| if s.post_id == p1.id { 0 } else { 1 });
    assert_eq!((stats[0].likes_count, stats[0].comments_count), (2, 0));
    assert_eq!((stats[1].likes_count, stats[1].comments_count), (0, 1));

    assert_eq!(r.liked_post_ids(b.id, &[p1.id, p2.id]).await.unwrap(), vec![p1.id]);
    assert!(r.liked_post_ids(b.id, &[p2.id]).await.unwrap().is_empty());

    assert!(r.remove_like(p1.id, b.id).await.unwrap());
    assert!(!r.remove_like(p1.id, b.id).await.unwrap());
    assert_eq!(r.post_stats(&[p1.id]).await.unwrap()[0].likes_count, 1);
}

#[tokio::test]
async fn comments_newest_first_with_author() {
    let r = InMemRepo::new();
    let a = user(&r, "user_a").await;
    let p = post(&r, a.id, "p").await;
    for i in 0..4 {
        r.create_comment(NewComment { post_id: p.id, user_id: a.id, content: format!("c{i}") })
            .await
            .unwrap();
    }
    let page = r.list_comments(p.id, 2, 1).await.unwrap();
    let contents: Vec<_> = page.iter().map(|c| c.content.as_str()).collect();
    assert_eq!(contents, ["c2", "c1"]);
    assert!(page.iter().all(|c| c.user.clerk_id == "user_a"));

    let err = r
        .create_comment(NewComment { post_id: uuid::Uuid::new_v4(), user_id: a.id, content: "x".into() })
        .await
        .unwrap_err();
    assert!(matches!(err, RepoError::NotFound));
}
