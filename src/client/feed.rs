use tracing::{debug, warn};

use super::api::{ClientError, FeedApi};
use super::like_button::LikeToggled;
use crate::models::{Id, Paginated, PostWithUser};

pub const FEED_PAGE_SIZE: i64 = 10;
/// Skeleton cards rendered while a page is loading.
pub const SKELETON_COUNT: usize = 3;

/// A page fetch the feed asked for; hand it back to [`FeedState::apply`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub append: bool,
}

#[derive(Debug, PartialEq)]
pub enum FeedView<'a> {
    /// Nothing loaded and the last fetch failed; a retry is offered.
    Error { message: &'a str },
    Empty,
    Posts {
        posts: &'a [PostWithUser],
        skeletons: usize,
        /// Render the viewport sentinel that triggers the next page.
        sentinel: bool,
        /// Every post has been loaded.
        exhausted: bool,
    },
}

/// Accumulating infinite-scroll feed.
#[derive(Debug, Clone)]
pub struct FeedState {
    owner: Option<Id>,
    posts: Vec<PostWithUser>,
    page: i64,
    has_more: bool,
    loading: bool,
    error: Option<String>,
}

impl FeedState {
    /// `owner` restricts the feed to one user's posts (profile page).
    pub fn new(owner: Option<Id>) -> Self {
        Self { owner, posts: Vec::new(), page: 1, has_more: true, loading: true, error: None }
    }

    pub fn posts(&self) -> &[PostWithUser] { &self.posts }
    pub fn page(&self) -> i64 { self.page }
    pub fn has_more(&self) -> bool { self.has_more }
    pub fn is_loading(&self) -> bool { self.loading }
    pub fn error(&self) -> Option<&str> { self.error.as_deref() }
    pub fn owner(&self) -> Option<Id> { self.owner }

    fn begin(&mut self, req: PageRequest) -> PageRequest {
        self.loading = true;
        self.error = None;
        req
    }

    /// Initial load: always page 1, replacing whatever is shown.
    pub fn mount(&mut self) -> PageRequest {
        self.page = 1;
        self.begin(PageRequest { page: 1, append: false })
    }

    /// The sentinel scrolled into view.
    pub fn on_intersect(&mut self) -> Option<PageRequest> {
        if !self.has_more || self.loading {
            return None;
        }
        Some(self.begin(PageRequest { page: self.page + 1, append: true }))
    }

    /// Manual retry, only offered when nothing could be loaded.
    pub fn retry(&mut self) -> Option<PageRequest> {
        if self.error.is_none() || !self.posts.is_empty() {
            return None;
        }
        Some(self.mount())
    }

    pub fn apply(&mut self, req: PageRequest, result: Result<Paginated<PostWithUser>, String>) {
        self.loading = false;
        match result {
            Ok(page) => {
                if req.append {
                    self.posts.extend(page.data);
                } else {
                    self.posts = page.data;
                }
                // committed only on success so a failed page is re-requested next time
                self.page = req.page;
                self.has_more = page.meta.has_more;
            }
            Err(message) => {
                warn!(page = req.page, "feed page failed: {message}");
                self.error = Some(message);
            }
        }
    }

    /// Mirror a confirmed like toggle into the cached post.
    pub fn apply_like(&mut self, toggled: LikeToggled) {
        if let Some(post) = self.posts.iter_mut().find(|p| p.id == toggled.post_id) {
            post.is_liked = toggled.liked;
            post.likes_count = toggled.likes_count;
        }
    }

    pub fn view(&self) -> FeedView<'_> {
        if let (Some(message), true) = (self.error.as_deref(), self.posts.is_empty()) {
            return FeedView::Error { message };
        }
        if !self.loading && self.posts.is_empty() {
            return FeedView::Empty;
        }
        FeedView::Posts {
            posts: &self.posts,
            skeletons: if self.loading { SKELETON_COUNT } else { 0 },
            sentinel: self.has_more && !self.loading,
            exhausted: !self.has_more && !self.posts.is_empty(),
        }
    }

    pub async fn load(&mut self, api: &dyn FeedApi, req: PageRequest) {
        debug!(page = req.page, append = req.append, "loading feed page");
        let result = api.fetch_posts(req.page, FEED_PAGE_SIZE, self.owner).await
            .map_err(|e: ClientError| e.to_string());
        self.apply(req, result);
    }

    /// Mount and fetch the first page.
    pub async fn load_initial(&mut self, api: &dyn FeedApi) {
        let req = self.mount();
        self.load(api, req).await;
    }

    /// Fetch the next page if the sentinel may trigger; returns whether a fetch ran.
    pub async fn load_more(&mut self, api: &dyn FeedApi) -> bool {
        match self.on_intersect() {
            Some(req) => {
                self.load(api, req).await;
                true
            }
            None => false,
        }
    }
}
