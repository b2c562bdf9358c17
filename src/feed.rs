//! Feed assembly: one page of posts, merged with the stats view and the
//! viewer's likes.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::models::*;
use crate::repo::{Repo, RepoError, RepoResult};

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_PAGE_LIMIT: i64 = 10;
pub const MAX_PAGE_LIMIT: i64 = 50;
pub const DEFAULT_COMMENT_LIMIT: i64 = 2;

/// Lenient numeric parameter: absent or unparsable values fall back to `default`.
pub fn parse_number(raw: Option<&str>, default: i64) -> i64 {
    raw.and_then(|v| v.trim().parse().ok()).unwrap_or(default)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OwnerFilter {
    All,
    User(Id),
    /// A filter value that cannot match any row (not a valid id).
    Nothing,
}

impl OwnerFilter {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim).filter(|v| !v.is_empty()) {
            None => OwnerFilter::All,
            Some(v) => v.parse().map(OwnerFilter::User).unwrap_or(OwnerFilter::Nothing),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedRequest {
    pub page: i64,
    pub limit: i64,
    pub owner: OwnerFilter,
}

impl FeedRequest {
    pub fn parse(page: Option<&str>, limit: Option<&str>, user_id: Option<&str>) -> Self {
        Self {
            page: parse_number(page, DEFAULT_PAGE).max(1),
            limit: parse_number(limit, DEFAULT_PAGE_LIMIT).clamp(1, MAX_PAGE_LIMIT),
            owner: OwnerFilter::parse(user_id),
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

/// Maps the caller's external identity to an internal user id. A caller the
/// sync process has not created yet is treated as anonymous.
pub async fn resolve_viewer(repo: &dyn Repo, clerk_id: Option<&str>) -> RepoResult<Option<Id>> {
    let Some(clerk_id) = clerk_id else { return Ok(None) };
    match repo.find_user_by_clerk_id(clerk_id).await {
        Ok(user) => Ok(Some(user.id)),
        Err(RepoError::NotFound) => {
            debug!(clerk_id, "caller has no synced user row; listing anonymously");
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

pub async fn load_feed(repo: &dyn Repo, req: FeedRequest, viewer: Option<Id>) -> RepoResult<Paginated<PostWithUser>> {
    let user_id = match req.owner {
        OwnerFilter::All => None,
        OwnerFilter::User(id) => Some(id),
        OwnerFilter::Nothing => return Ok(empty_page(req)),
    };
    let page = repo.list_posts(PostFilter { user_id, offset: req.offset(), limit: req.limit }).await?;
    if page.rows.is_empty() {
        return Ok(Paginated { data: Vec::new(), meta: PaginationMeta::new(req.page, req.limit, page.total) });
    }

    let post_ids: Vec<Id> = page.rows.iter().map(|r| r.post.id).collect();
    let stats: HashMap<Id, PostStats> = repo.post_stats(&post_ids).await?
        .into_iter()
        .map(|s| (s.post_id, s))
        .collect();
    let liked: HashSet<Id> = match viewer {
        Some(uid) => repo.liked_post_ids(uid, &post_ids).await?.into_iter().collect(),
        None => HashSet::new(),
    };

    let data = page.rows.into_iter()
        .map(|row| {
            let id = row.post.id;
            PostWithUser::from_parts(row, stats.get(&id).copied(), liked.contains(&id))
        })
        .collect();
    Ok(Paginated { data, meta: PaginationMeta::new(req.page, req.limit, page.total) })
}

fn empty_page(req: FeedRequest) -> Paginated<PostWithUser> {
    Paginated { data: Vec::new(), meta: PaginationMeta::new(req.page, req.limit, 0) }
}
