use crate::DbResultExt;
use crate::GetDb;

use tradefeed_domain::account::AccountId;
use tradefeed_domain::error::{FeedError, FeedResult};

use entrait::*;

pub struct PgFollowRepo;

#[entrait]
impl tradefeed_domain::follow::repo::FollowRepoImpl for PgFollowRepo {
    pub async fn insert_follow(
        deps: &impl GetDb,
        AccountId(follower): AccountId,
        AccountId(followed): AccountId,
    ) -> FeedResult<()> {
        sqlx::query(
            // an existing edge is left alone
            "INSERT INTO app.follow (follower_id, followed_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(follower)
        .bind(followed)
        .execute(&deps.get_db().pg_pool)
        .await
        .on_constraint("follow_not_self", || FeedError::CannotFollowSelf)
        .on_constraint("follow_followed_fk", || FeedError::ProfileNotFound)
        .on_constraint("follow_follower_fk", || FeedError::AccountNotFound)?;

        Ok(())
    }

    pub async fn delete_follow(
        deps: &impl GetDb,
        AccountId(follower): AccountId,
        AccountId(followed): AccountId,
    ) -> FeedResult<()> {
        sqlx::query("DELETE FROM app.follow WHERE follower_id = $1 AND followed_id = $2")
            .bind(follower)
            .bind(followed)
            .execute(&deps.get_db().pg_pool)
            .await
            .to_feed_err()?;

        Ok(())
    }

    pub async fn count_followers(
        deps: &impl GetDb,
        AccountId(account_id): AccountId,
    ) -> FeedResult<i64> {
        sqlx::query_scalar("SELECT count(*) FROM app.follow WHERE followed_id = $1")
            .bind(account_id)
            .fetch_one(&deps.get_db().pg_pool)
            .await
            .to_feed_err()
    }

    pub async fn count_following(
        deps: &impl GetDb,
        AccountId(account_id): AccountId,
    ) -> FeedResult<i64> {
        sqlx::query_scalar("SELECT count(*) FROM app.follow WHERE follower_id = $1")
            .bind(account_id)
            .fetch_one(&deps.get_db().pg_pool)
            .await
            .to_feed_err()
    }

    pub async fn follow_exists(
        deps: &impl GetDb,
        AccountId(follower): AccountId,
        AccountId(followed): AccountId,
    ) -> FeedResult<bool> {
        sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM app.follow WHERE follower_id = $1 AND followed_id = $2)",
        )
        .bind(follower)
        .bind(followed)
        .fetch_one(&deps.get_db().pg_pool)
        .await
        .to_feed_err()
    }
}

#[cfg(test)]
mod tests {
    use crate::account::tests::insert_test_account;
    use crate::create_test_db;

    use assert_matches::*;
    use tradefeed_domain::account::AccountId;
    use tradefeed_domain::error::FeedError;
    use tradefeed_domain::follow::repo::FollowRepo;
    use uuid::Uuid;

    #[tokio::test]
    #[ignore = "needs a PostgreSQL server at DATABASE_URL"]
    async fn follow_is_idempotent_and_counted_live() {
        let db = create_test_db().await;
        let alice = insert_test_account(&db, "alice").await.unwrap().account_id;
        let bob = insert_test_account(&db, "bob").await.unwrap().account_id;

        assert!(!db.follow_exists(bob, alice).await.unwrap());

        db.insert_follow(bob, alice).await.unwrap();
        db.insert_follow(bob, alice).await.unwrap();

        assert!(db.follow_exists(bob, alice).await.unwrap());
        assert_eq!(1, db.count_followers(alice).await.unwrap());
        assert_eq!(1, db.count_following(bob).await.unwrap());
        assert_eq!(0, db.count_followers(bob).await.unwrap());

        db.delete_follow(bob, alice).await.unwrap();
        db.delete_follow(bob, alice).await.unwrap();

        assert_eq!(0, db.count_followers(alice).await.unwrap());
    }

    #[tokio::test]
    #[ignore = "needs a PostgreSQL server at DATABASE_URL"]
    async fn store_rejects_self_follow_and_missing_target() {
        let db = create_test_db().await;
        let alice = insert_test_account(&db, "alice").await.unwrap().account_id;

        assert_matches!(
            db.insert_follow(alice, alice).await,
            Err(FeedError::CannotFollowSelf)
        );
        assert_matches!(
            db.insert_follow(alice, AccountId(Uuid::new_v4())).await,
            Err(FeedError::ProfileNotFound)
        );
    }
}
