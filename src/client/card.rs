use std::borrow::Cow;
use std::time::Instant;

use chrono::{DateTime, Utc};

use super::api::{ClientError, FeedApi};
use super::like_button::{LikeButton, LikeToggled};
use crate::models::{CommentWithUser, PostWithUser};

pub const CAPTION_PREVIEW_CHARS: usize = 100;
/// Latest comments shown under a card.
pub const COMMENT_PREVIEW_COUNT: i64 = 2;

pub fn caption_needs_truncation(caption: &str) -> bool {
    caption.chars().count() > CAPTION_PREVIEW_CHARS
}

/// Caption as shown on the card: the first 100 characters plus `...` until expanded.
pub fn caption_preview(caption: &str, expanded: bool) -> Cow<'_, str> {
    if expanded || !caption_needs_truncation(caption) {
        return Cow::Borrowed(caption);
    }
    let cut = caption.char_indices().nth(CAPTION_PREVIEW_CHARS).map_or(caption.len(), |(i, _)| i);
    Cow::Owned(format!("{}...", &caption[..cut]))
}

/// Korean relative timestamp ("방금 전", "3시간 전", ...); months are 30 days.
pub fn relative_time(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let seconds = (now - then).num_seconds();
    if seconds < 60 {
        return "방금 전".to_string();
    }
    let minutes = seconds / 60;
    if minutes < 60 {
        return format!("{minutes}분 전");
    }
    let hours = minutes / 60;
    if hours < 24 {
        return format!("{hours}시간 전");
    }
    let days = hours / 24;
    if days < 30 {
        return format!("{days}일 전");
    }
    let months = days / 30;
    if months < 12 {
        return format!("{months}개월 전");
    }
    format!("{}년 전", months / 12)
}

fn group_thousands(n: i64) -> String {
    let digits = n.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if n < 0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

pub fn likes_label(count: i64) -> Option<String> {
    (count > 0).then(|| format!("좋아요 {}개", group_thousands(count)))
}

pub fn comments_label(count: i64) -> Option<String> {
    (count > 0).then(|| format!("댓글 {count}개 모두 보기"))
}

/// One post in the feed with its like toggle and comment preview.
#[derive(Debug, Clone)]
pub struct PostCard {
    post: PostWithUser,
    like: LikeButton,
    caption_expanded: bool,
    comments: Vec<CommentWithUser>,
}

impl PostCard {
    pub fn new(post: PostWithUser) -> Self {
        let like = LikeButton::new(post.id, post.is_liked, post.likes_count);
        Self { post, like, caption_expanded: false, comments: Vec::new() }
    }

    pub fn post(&self) -> &PostWithUser { &self.post }
    pub fn like_button(&self) -> &LikeButton { &self.like }
    pub fn comment_preview(&self) -> &[CommentWithUser] { &self.comments }

    /// Replace the post with a fresher copy from the feed.
    pub fn refresh(&mut self, post: PostWithUser) {
        self.like.reseed(post.is_liked, post.likes_count);
        self.post = post;
    }

    pub fn expand_caption(&mut self) {
        self.caption_expanded = true;
    }

    pub fn caption(&self) -> Option<Cow<'_, str>> {
        self.post.caption.as_deref().map(|c| caption_preview(c, self.caption_expanded))
    }

    /// "더 보기" is offered only for a truncated, unexpanded caption.
    pub fn shows_more_button(&self) -> bool {
        !self.caption_expanded && self.post.caption.as_deref().is_some_and(caption_needs_truncation)
    }

    pub fn timestamp(&self, now: DateTime<Utc>) -> String {
        relative_time(self.post.created_at, now)
    }

    pub fn likes_label(&self) -> Option<String> {
        likes_label(self.like.likes_count())
    }

    pub fn comments_label(&self) -> Option<String> {
        comments_label(self.post.comments_count)
    }

    pub async fn toggle_like(&mut self, api: &dyn FeedApi) -> Result<Option<LikeToggled>, ClientError> {
        self.like.click(api).await
    }

    pub async fn double_tap(&mut self, api: &dyn FeedApi, now: Instant) -> Result<Option<LikeToggled>, ClientError> {
        self.like.double_tap_like(api, now).await
    }

    /// Fetch the latest comments; skipped when the post has none.
    pub async fn load_comment_preview(&mut self, api: &dyn FeedApi) -> Result<(), ClientError> {
        if self.post.comments_count == 0 {
            self.comments.clear();
            return Ok(());
        }
        self.comments = api.fetch_comments(self.post.id, COMMENT_PREVIEW_COUNT).await?;
        Ok(())
    }
}
