//! Client-side state for the feed UI, independent of any rendering layer:
//! the HTTP API wrapper, the optimistic like toggle, the infinite-scroll
//! feed and post card presentation helpers.

pub mod api;
pub mod card;
pub mod feed;
pub mod like_button;

pub use api::{ClientError, FeedApi, HttpFeedApi};
pub use card::PostCard;
pub use feed::{FeedState, FeedView, PageRequest};
pub use like_button::{LikeButton, LikeIntent, LikeToggled};
