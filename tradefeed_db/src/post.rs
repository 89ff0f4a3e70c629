use crate::DbResultExt;
use crate::GetDb;

use tradefeed_domain::account::AccountId;
use tradefeed_domain::error::{FeedError, FeedResult};
use tradefeed_domain::post::repo::*;
use tradefeed_domain::post::PostId;

use entrait::*;
use futures::TryStreamExt;
use time::OffsetDateTime;
use uuid::Uuid;

pub struct PgPostRepo;

const POST_COLUMNS: &str =
    "post_id, account_id, body, images, videos, likes_count, comments_count, tags, created_at";

#[derive(sqlx::FromRow)]
struct PostRow {
    post_id: Uuid,
    account_id: Uuid,
    body: String,
    images: Vec<String>,
    videos: Vec<String>,
    likes_count: i64,
    comments_count: i64,
    tags: Vec<String>,
    created_at: OffsetDateTime,
}

impl From<PostRow> for Post {
    fn from(row: PostRow) -> Self {
        Self {
            post_id: PostId(row.post_id),
            account_id: AccountId(row.account_id),
            body: row.body,
            images: row.images,
            videos: row.videos,
            likes_count: row.likes_count,
            comments_count: row.comments_count,
            tags: row.tags,
            created_at: row.created_at,
        }
    }
}

#[entrait]
impl tradefeed_domain::post::repo::PostRepoImpl for PgPostRepo {
    pub async fn select_posts(deps: &impl GetDb, filter: Filter) -> FeedResult<Vec<Post>> {
        let rows: Vec<PostRow> = sqlx::query_as::<_, PostRow>(&format!(
            // language=PostgreSQL
            r#"
            SELECT {POST_COLUMNS}
            FROM app.post
            WHERE (
                $1::uuid IS NULL OR account_id = $1
            ) AND (
                $2::uuid IS NULL OR post_id = $2
            )
            ORDER BY created_at DESC, post_id DESC
            LIMIT $3
            OFFSET $4
            "#
        ))
        .bind(filter.account_id.map(|id| id.0))
        .bind(filter.post_id.map(|id| id.0))
        .bind(filter.limit)
        .bind(filter.offset)
        .fetch(&deps.get_db().pg_pool)
        .try_collect()
        .await
        .to_feed_err()?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    pub async fn insert_post(deps: &impl GetDb, new_post: NewPost<'_>) -> FeedResult<Post> {
        let row = sqlx::query_as::<_, PostRow>(&format!(
            r#"
            INSERT INTO app.post (account_id, body, images, videos, tags)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {POST_COLUMNS}
            "#
        ))
        .bind(new_post.account_id.0)
        .bind(new_post.body)
        .bind(new_post.images)
        .bind(new_post.videos)
        .bind(new_post.tags)
        .fetch_one(&deps.get_db().pg_pool)
        .await
        .on_constraint("post_account_fk", || FeedError::AccountNotFound)?;

        Ok(row.into())
    }

    pub async fn delete_post_by_author(
        deps: &impl GetDb,
        AccountId(account_id): AccountId,
        PostId(post_id): PostId,
    ) -> FeedResult<()> {
        let (existed, deleted): (bool, bool) = sqlx::query_as(
            // language=PostgreSQL
            r#"
            WITH deleted_post AS (
                DELETE FROM app.post
                WHERE post_id = $1 AND account_id = $2
                RETURNING 1
            )
            SELECT
                -- `true` if the post existed before we deleted it.
                EXISTS(SELECT 1 FROM app.post WHERE post_id = $1),
                -- only `true` if we actually deleted it.
                EXISTS(SELECT 1 FROM deleted_post)
            "#,
        )
        .bind(post_id)
        .bind(account_id)
        .fetch_one(&deps.get_db().pg_pool)
        .await
        .to_feed_err()?;

        if deleted {
            Ok(())
        } else if existed {
            Err(FeedError::Forbidden)
        } else {
            Err(FeedError::PostNotFound)
        }
    }

    pub async fn insert_like(
        deps: &impl GetDb,
        AccountId(account_id): AccountId,
        PostId(post_id): PostId,
    ) -> FeedResult<()> {
        let mut tx = deps.get_db().pg_pool.begin().await.to_feed_err()?;

        let inserted = sqlx::query(
            "INSERT INTO app.post_like (post_id, account_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(post_id)
        .bind(account_id)
        .execute(&mut *tx)
        .await
        .on_constraint("post_like_post_fk", || FeedError::PostNotFound)
        .on_constraint("post_like_account_fk", || FeedError::AccountNotFound)?
        .rows_affected();

        if inserted > 0 {
            sqlx::query("UPDATE app.post SET likes_count = likes_count + 1 WHERE post_id = $1")
                .bind(post_id)
                .execute(&mut *tx)
                .await
                .to_feed_err()?;
        }

        tx.commit().await.to_feed_err()?;

        Ok(())
    }

    pub async fn delete_like(
        deps: &impl GetDb,
        AccountId(account_id): AccountId,
        PostId(post_id): PostId,
    ) -> FeedResult<()> {
        let mut tx = deps.get_db().pg_pool.begin().await.to_feed_err()?;

        let deleted = sqlx::query("DELETE FROM app.post_like WHERE post_id = $1 AND account_id = $2")
            .bind(post_id)
            .bind(account_id)
            .execute(&mut *tx)
            .await
            .to_feed_err()?
            .rows_affected();

        if deleted > 0 {
            sqlx::query("UPDATE app.post SET likes_count = likes_count - 1 WHERE post_id = $1")
                .bind(post_id)
                .execute(&mut *tx)
                .await
                .to_feed_err()?;
        }

        tx.commit().await.to_feed_err()?;

        Ok(())
    }

    pub async fn select_liked_post_ids(
        deps: &impl GetDb,
        AccountId(account_id): AccountId,
        post_ids: &[PostId],
    ) -> FeedResult<Vec<PostId>> {
        let post_ids: Vec<Uuid> = post_ids.iter().map(|post_id| post_id.0).collect();

        let liked = sqlx::query_scalar::<_, Uuid>(
            "SELECT post_id FROM app.post_like WHERE account_id = $1 AND post_id = ANY($2)",
        )
        .bind(account_id)
        .bind(post_ids)
        .fetch_all(&deps.get_db().pg_pool)
        .await
        .to_feed_err()?;

        Ok(liked.into_iter().map(PostId).collect())
    }
}
