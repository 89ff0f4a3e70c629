use crate::account::auth::{Authenticate, Token};
use crate::account::repo::{Account, AccountRepo};
use crate::account::{AccountId, Role};
use crate::error::{FeedError, FeedResult};
use crate::follow::FollowGraph;

use entrait::entrait_export as entrait;
use time::OffsetDateTime;

#[derive(serde::Serialize, serde::Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: AccountId,
    pub handle: String,
    pub display_name: String,
    pub avatar: Option<String>,
    pub bio: Option<String>,
    pub role: Role,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub followers_count: i64,
    pub following_count: i64,
    /// Whether the viewer follows this account. Always false for anonymous viewers.
    pub following: bool,
}

#[entrait(pub ProfileApi, mock_api=ProfileApiMock)]
pub mod api {
    use super::*;

    pub async fn fetch_profile(
        deps: &(impl Authenticate + AccountRepo + FollowGraph),
        token: Option<Token>,
        handle: &str,
    ) -> FeedResult<Profile> {
        let viewer = deps.opt_authenticate(token)?;
        let account = find_by_handle(deps, handle).await?;
        profile_view(deps, viewer, account).await
    }

    pub async fn follow_profile(
        deps: &(impl Authenticate + AccountRepo + FollowGraph),
        token: Token,
        handle: &str,
    ) -> FeedResult<Profile> {
        let viewer = deps.authenticate(token)?;
        let account = find_by_handle(deps, handle).await?;
        deps.follow(viewer, account.account_id).await?;
        profile_view(deps, Some(viewer), account).await
    }

    pub async fn unfollow_profile(
        deps: &(impl Authenticate + AccountRepo + FollowGraph),
        token: Token,
        handle: &str,
    ) -> FeedResult<Profile> {
        let viewer = deps.authenticate(token)?;
        let account = find_by_handle(deps, handle).await?;
        deps.unfollow(viewer, account.account_id).await?;
        profile_view(deps, Some(viewer), account).await
    }

    async fn find_by_handle(deps: &impl AccountRepo, handle: &str) -> FeedResult<Account> {
        deps.find_account_by_handle(handle)
            .await?
            .ok_or(FeedError::ProfileNotFound)
    }

    async fn profile_view(
        deps: &impl FollowGraph,
        viewer: Option<AccountId>,
        account: Account,
    ) -> FeedResult<Profile> {
        let following = match viewer {
            Some(viewer) => deps.is_following(viewer, account.account_id).await?,
            None => false,
        };

        Ok(Profile {
            followers_count: deps.follower_count(account.account_id).await?,
            following_count: deps.following_count(account.account_id).await?,
            following,
            id: account.account_id,
            handle: account.handle,
            display_name: account.display_name,
            avatar: account.avatar,
            bio: account.bio,
            role: account.role,
            created_at: account.created_at,
        })
    }
}
