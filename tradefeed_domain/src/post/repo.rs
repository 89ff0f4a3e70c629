use super::PostId;
use crate::account::AccountId;
use crate::enrich::Authored;
use crate::error::FeedResult;

use entrait::entrait_export as entrait;
use time::OffsetDateTime;

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Post {
    pub post_id: PostId,
    pub account_id: AccountId,
    pub body: String,
    pub images: Vec<String>,
    pub videos: Vec<String>,
    pub likes_count: i64,
    pub comments_count: i64,
    pub tags: Vec<String>,
    pub created_at: OffsetDateTime,
}

impl Authored for Post {
    fn author_id(&self) -> AccountId {
        self.account_id
    }
}

/// Selection of posts. Limit and offset are already resolved and bounded.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Filter {
    pub account_id: Option<AccountId>,
    pub post_id: Option<PostId>,
    pub limit: i64,
    pub offset: i64,
}

impl Filter {
    pub fn single(post_id: PostId) -> Self {
        Self {
            account_id: None,
            post_id: Some(post_id),
            limit: 1,
            offset: 0,
        }
    }
}

pub struct NewPost<'a> {
    pub account_id: AccountId,
    pub body: &'a str,
    pub images: &'a [String],
    pub videos: &'a [String],
    pub tags: &'a [String],
}

#[entrait(PostRepoImpl, delegate_by = DelegatePostRepo, mock_api=PostRepoMock)]
pub trait PostRepo {
    /// Newest first, ties broken by descending id.
    async fn select_posts(&self, filter: Filter) -> FeedResult<Vec<Post>>;

    async fn insert_post(&self, new_post: NewPost<'_>) -> FeedResult<Post>;

    /// Deletes the post only if `account_id` wrote it.
    async fn delete_post_by_author(&self, account_id: AccountId, post_id: PostId) -> FeedResult<()>;

    /// Idempotent. Keeps `likes_count` in step with the like rows.
    async fn insert_like(&self, account_id: AccountId, post_id: PostId) -> FeedResult<()>;

    async fn delete_like(&self, account_id: AccountId, post_id: PostId) -> FeedResult<()>;

    /// The subset of `post_ids` liked by `account_id`.
    async fn select_liked_post_ids(
        &self,
        account_id: AccountId,
        post_ids: &[PostId],
    ) -> FeedResult<Vec<PostId>>;
}
