use crate::DbResultExt;
use crate::GetDb;

use tradefeed_domain::account::AccountId;
use tradefeed_domain::comment::repo::*;
use tradefeed_domain::comment::CommentId;
use tradefeed_domain::error::{FeedError, FeedResult};
use tradefeed_domain::post::PostId;

use entrait::*;
use futures::TryStreamExt;
use time::OffsetDateTime;
use uuid::Uuid;

pub struct PgCommentRepo;

#[derive(sqlx::FromRow)]
struct CommentRow {
    comment_id: Uuid,
    post_id: Uuid,
    account_id: Uuid,
    body: String,
    created_at: OffsetDateTime,
}

impl From<CommentRow> for Comment {
    fn from(row: CommentRow) -> Self {
        Self {
            comment_id: CommentId(row.comment_id),
            post_id: PostId(row.post_id),
            account_id: AccountId(row.account_id),
            body: row.body,
            created_at: row.created_at,
        }
    }
}

#[entrait]
impl tradefeed_domain::comment::repo::CommentRepoImpl for PgCommentRepo {
    pub async fn select_comments(
        deps: &impl GetDb,
        PostId(post_id): PostId,
    ) -> FeedResult<Vec<Comment>> {
        let pg_pool = &deps.get_db().pg_pool;

        let post_exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM app.post WHERE post_id = $1)")
                .bind(post_id)
                .fetch_one(pg_pool)
                .await
                .to_feed_err()?;
        if !post_exists {
            return Err(FeedError::PostNotFound);
        }

        let rows: Vec<CommentRow> = sqlx::query_as(
            // language=PostgreSQL
            r#"
            SELECT comment_id, post_id, account_id, body, created_at
            FROM app.comment
            WHERE post_id = $1
            ORDER BY created_at, comment_id
            "#,
        )
        .bind(post_id)
        .fetch(pg_pool)
        .try_collect()
        .await
        .to_feed_err()?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    pub async fn insert_comment(
        deps: &impl GetDb,
        AccountId(account_id): AccountId,
        PostId(post_id): PostId,
        body: &str,
    ) -> FeedResult<Comment> {
        let mut tx = deps.get_db().pg_pool.begin().await.to_feed_err()?;

        let row: CommentRow = sqlx::query_as(
            r#"
            INSERT INTO app.comment (post_id, account_id, body)
            VALUES ($1, $2, $3)
            RETURNING comment_id, post_id, account_id, body, created_at
            "#,
        )
        .bind(post_id)
        .bind(account_id)
        .bind(body)
        .fetch_one(&mut *tx)
        .await
        .on_constraint("comment_post_fk", || FeedError::PostNotFound)
        .on_constraint("comment_account_fk", || FeedError::AccountNotFound)?;

        sqlx::query("UPDATE app.post SET comments_count = comments_count + 1 WHERE post_id = $1")
            .bind(post_id)
            .execute(&mut *tx)
            .await
            .to_feed_err()?;

        tx.commit().await.to_feed_err()?;

        Ok(row.into())
    }
}
