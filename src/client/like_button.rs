use std::time::{Duration, Instant};

use tracing::warn;

use super::api::{ClientError, FeedApi};
use crate::models::Id;

/// How long the double-tap heart stays on screen.
pub const DOUBLE_TAP_HEART: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeAction {
    Add,
    Remove,
}

/// A dispatched toggle: the optimistic state already applied plus what to
/// restore if the request fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LikeIntent {
    pub post_id: Id,
    pub action: LikeAction,
    pub liked: bool,
    pub likes_count: i64,
    prev_liked: bool,
    prev_count: i64,
}

/// Reported to the owning feed once the server confirmed a toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LikeToggled {
    pub post_id: Id,
    pub liked: bool,
    pub likes_count: i64,
}

/// Optimistic like toggle for one post: {unliked, liked} x {idle, pending}.
#[derive(Debug, Clone)]
pub struct LikeButton {
    post_id: Id,
    liked: bool,
    likes_count: i64,
    pending: bool,
    heart_until: Option<Instant>,
}

impl LikeButton {
    pub fn new(post_id: Id, liked: bool, likes_count: i64) -> Self {
        Self { post_id, liked, likes_count, pending: false, heart_until: None }
    }

    /// Adopt fresh server values (e.g. after the feed reloaded the post).
    pub fn reseed(&mut self, liked: bool, likes_count: i64) {
        self.liked = liked;
        self.likes_count = likes_count;
    }

    pub fn post_id(&self) -> Id { self.post_id }
    pub fn is_liked(&self) -> bool { self.liked }
    pub fn likes_count(&self) -> i64 { self.likes_count }
    pub fn is_pending(&self) -> bool { self.pending }

    pub fn heart_visible(&self, now: Instant) -> bool {
        self.heart_until.is_some_and(|until| now < until)
    }

    /// Button press. Flips state immediately; `None` while a request is in flight.
    pub fn activate(&mut self) -> Option<LikeIntent> {
        if self.pending {
            return None;
        }
        let liked = !self.liked;
        let likes_count = if liked { self.likes_count + 1 } else { (self.likes_count - 1).max(0) };
        let intent = LikeIntent {
            post_id: self.post_id,
            action: if liked { LikeAction::Add } else { LikeAction::Remove },
            liked,
            likes_count,
            prev_liked: self.liked,
            prev_count: self.likes_count,
        };
        self.liked = liked;
        self.likes_count = likes_count;
        self.pending = true;
        Some(intent)
    }

    /// Double tap on the image: only ever adds, and shows the heart.
    pub fn double_tap(&mut self, now: Instant) -> Option<LikeIntent> {
        if self.liked || self.pending {
            return None;
        }
        let intent = self.activate()?;
        self.heart_until = Some(now + DOUBLE_TAP_HEART);
        Some(intent)
    }

    /// Completes an intent. Failure restores the pre-action state.
    pub fn settle<E>(&mut self, intent: LikeIntent, outcome: Result<(), E>) -> Option<LikeToggled> {
        self.pending = false;
        match outcome {
            Ok(()) => Some(LikeToggled { post_id: intent.post_id, liked: intent.liked, likes_count: intent.likes_count }),
            Err(_) => {
                self.liked = intent.prev_liked;
                self.likes_count = intent.prev_count;
                self.heart_until = None;
                None
            }
        }
    }

    /// Press, dispatch and settle in one go.
    pub async fn click(&mut self, api: &dyn FeedApi) -> Result<Option<LikeToggled>, ClientError> {
        match self.activate() {
            Some(intent) => self.dispatch(api, intent).await,
            None => Ok(None),
        }
    }

    pub async fn double_tap_like(&mut self, api: &dyn FeedApi, now: Instant) -> Result<Option<LikeToggled>, ClientError> {
        match self.double_tap(now) {
            Some(intent) => self.dispatch(api, intent).await,
            None => Ok(None),
        }
    }

    async fn dispatch(&mut self, api: &dyn FeedApi, intent: LikeIntent) -> Result<Option<LikeToggled>, ClientError> {
        let result = match intent.action {
            LikeAction::Add => api.add_like(intent.post_id).await,
            LikeAction::Remove => api.remove_like(intent.post_id).await,
        };
        match result {
            Ok(()) => Ok(self.settle(intent, Ok::<(), ClientError>(()))),
            Err(e) => {
                warn!(post_id = %intent.post_id, "like toggle failed, rolling back: {e}");
                self.settle(intent, Err(()));
                Err(e)
            }
        }
    }
}
