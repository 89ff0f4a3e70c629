use crate::account::AccountId;
use crate::error::FeedResult;

use entrait::entrait_export as entrait;

/// Directed follow edges. `follower` follows `followed`.
#[entrait(FollowRepoImpl, delegate_by = DelegateFollowRepo, mock_api=FollowRepoMock)]
pub trait FollowRepo {
    /// Inserting an existing edge is a no-op.
    async fn insert_follow(&self, follower: AccountId, followed: AccountId) -> FeedResult<()>;

    /// Deleting a missing edge is a no-op.
    async fn delete_follow(&self, follower: AccountId, followed: AccountId) -> FeedResult<()>;

    async fn count_followers(&self, account_id: AccountId) -> FeedResult<i64>;

    async fn count_following(&self, account_id: AccountId) -> FeedResult<i64>;

    async fn follow_exists(&self, follower: AccountId, followed: AccountId) -> FeedResult<bool>;
}
