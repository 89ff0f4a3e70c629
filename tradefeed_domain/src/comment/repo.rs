use super::CommentId;
use crate::account::AccountId;
use crate::enrich::Authored;
use crate::error::FeedResult;
use crate::post::PostId;

use entrait::entrait_export as entrait;
use time::OffsetDateTime;

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Comment {
    pub comment_id: CommentId,
    pub post_id: PostId,
    pub account_id: AccountId,
    pub body: String,
    pub created_at: OffsetDateTime,
}

impl Authored for Comment {
    fn author_id(&self) -> AccountId {
        self.account_id
    }
}

#[entrait(CommentRepoImpl, delegate_by = DelegateCommentRepo, mock_api=CommentRepoMock)]
pub trait CommentRepo {
    /// Oldest first. A missing post is `PostNotFound`.
    async fn select_comments(&self, post_id: PostId) -> FeedResult<Vec<Comment>>;

    /// Also bumps the post's `comments_count`.
    async fn insert_comment(
        &self,
        account_id: AccountId,
        post_id: PostId,
        body: &str,
    ) -> FeedResult<Comment>;
}
