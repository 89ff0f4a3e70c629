pub mod repo;

use crate::account::AccountId;
use crate::error::{FeedError, FeedResult};
use repo::FollowRepo;

use entrait::entrait_export as entrait;

/// Follow bookkeeping between two accounts that are already resolved.
///
/// Counts are computed live from the edges, so they can never drift from
/// the follow graph itself.
#[entrait(pub FollowGraph, mock_api=FollowGraphMock)]
pub mod graph {
    use super::*;

    pub async fn follow(
        deps: &impl FollowRepo,
        follower: AccountId,
        followed: AccountId,
    ) -> FeedResult<()> {
        if follower == followed {
            return Err(FeedError::CannotFollowSelf);
        }
        deps.insert_follow(follower, followed).await
    }

    pub async fn unfollow(
        deps: &impl FollowRepo,
        follower: AccountId,
        followed: AccountId,
    ) -> FeedResult<()> {
        deps.delete_follow(follower, followed).await
    }

    pub async fn follower_count(deps: &impl FollowRepo, account_id: AccountId) -> FeedResult<i64> {
        deps.count_followers(account_id).await
    }

    pub async fn following_count(deps: &impl FollowRepo, account_id: AccountId) -> FeedResult<i64> {
        deps.count_following(account_id).await
    }

    pub async fn is_following(
        deps: &impl FollowRepo,
        follower: AccountId,
        followed: AccountId,
    ) -> FeedResult<bool> {
        if follower == followed {
            return Ok(false);
        }
        deps.follow_exists(follower, followed).await
    }
}

#[cfg(test)]
mod tests {
    use super::repo::FollowRepoMock;
    use super::*;

    use assert_matches::*;
    use unimock::*;
    use uuid::Uuid;

    #[tokio::test]
    async fn following_oneself_is_rejected_without_touching_the_store() {
        let deps = Unimock::new(());
        let me = AccountId(Uuid::new_v4());

        assert_matches!(graph::follow(&deps, me, me).await, Err(FeedError::CannotFollowSelf));
        assert_matches!(graph::is_following(&deps, me, me).await, Ok(false));
    }

    #[tokio::test]
    async fn follow_and_unfollow_go_to_the_edge_store() {
        let bob = AccountId(Uuid::new_v4());
        let alice = AccountId(Uuid::new_v4());

        let deps = Unimock::new((
            FollowRepoMock::insert_follow
                .next_call(matching!(_, _))
                .returns(Ok(())),
            FollowRepoMock::count_followers
                .next_call(matching!(_))
                .returns(Ok(1)),
            FollowRepoMock::delete_follow
                .next_call(matching!(_, _))
                .returns(Ok(())),
            FollowRepoMock::count_followers
                .next_call(matching!(_))
                .returns(Ok(0)),
        ));

        graph::follow(&deps, bob, alice).await.unwrap();
        assert_eq!(1, graph::follower_count(&deps, alice).await.unwrap());
        graph::unfollow(&deps, bob, alice).await.unwrap();
        assert_eq!(0, graph::follower_count(&deps, alice).await.unwrap());
    }
}
