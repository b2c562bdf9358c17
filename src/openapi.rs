use crate::models::{CommentWithUser, LikeRequest, PaginatedPosts, PaginationMeta, PostWithUser, SuccessResponse, User};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::list_posts,
        crate::routes::list_comments,
        crate::routes::add_like,
        crate::routes::remove_like,
    ),
    components(schemas(
        User, PostWithUser, CommentWithUser, PaginationMeta, PaginatedPosts,
        LikeRequest, SuccessResponse
    )),
    tags(
        (name = "posts", description = "Feed listing"),
        (name = "comments", description = "Comment previews"),
        (name = "likes", description = "Like toggling"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_operation_is_grouped_under_its_tag() {
        let doc = ApiDoc::openapi();
        let expected = [("/api/posts", "posts"), ("/api/comments", "comments"), ("/api/likes", "likes")];
        for (path, tag) in expected {
            let item = doc.paths.paths.get(path).unwrap();
            assert!(!item.operations.is_empty(), "{path}");
            for op in item.operations.values() {
                assert_eq!(op.tags.as_deref(), Some(&[tag.to_string()][..]), "{path}");
            }
        }
    }
}
