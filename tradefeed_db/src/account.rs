use crate::DbResultExt;
use crate::GetDb;

use tradefeed_domain::account::handle::Email;
use tradefeed_domain::account::repo::*;
use tradefeed_domain::account::AccountId;
use tradefeed_domain::error::{FeedError, FeedResult};

use entrait::*;
use time::OffsetDateTime;
use uuid::Uuid;

pub struct PgAccountRepo;

const ACCOUNT_COLUMNS: &str =
    "account_id, handle, email, display_name, avatar, bio, role, password_hash, created_at";

#[derive(sqlx::FromRow)]
struct AccountRow {
    account_id: Uuid,
    handle: String,
    email: String,
    display_name: String,
    avatar: Option<String>,
    bio: Option<String>,
    role: String,
    password_hash: String,
    created_at: OffsetDateTime,
}

impl AccountRow {
    fn into_account(self) -> FeedResult<Account> {
        self.into_parts().map(|(account, _)| account)
    }

    fn into_parts(self) -> FeedResult<(Account, Credentials)> {
        Ok((
            Account {
                account_id: AccountId(self.account_id),
                handle: self.handle,
                display_name: self.display_name,
                avatar: self.avatar,
                bio: self.bio,
                role: self.role.parse()?,
                created_at: self.created_at,
            },
            Credentials {
                email: Email::valid(self.email),
                password_hash: self.password_hash.into(),
            },
        ))
    }
}

#[entrait]
impl tradefeed_domain::account::repo::AccountRepoImpl for PgAccountRepo {
    pub async fn insert_account(
        deps: &impl GetDb,
        new_account: NewAccount<'_>,
    ) -> FeedResult<(Account, Credentials)> {
        let row = sqlx::query_as::<_, AccountRow>(&format!(
            r#"
            INSERT INTO app.account (handle, email, display_name, avatar, bio, password_hash)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {ACCOUNT_COLUMNS}
            "#
        ))
        .bind(new_account.handle)
        .bind(new_account.email.as_ref())
        .bind(new_account.display_name)
        .bind(new_account.avatar)
        .bind(new_account.bio)
        .bind(new_account.password_hash.0)
        .fetch_one(&deps.get_db().pg_pool)
        .await
        .on_constraint("account_handle_key", || FeedError::HandleTaken)
        .on_constraint("account_email_key", || FeedError::EmailTaken)?;

        row.into_parts()
    }

    pub async fn find_account_credentials_by_id(
        deps: &impl GetDb,
        AccountId(account_id): AccountId,
    ) -> FeedResult<Option<(Account, Credentials)>> {
        sqlx::query_as::<_, AccountRow>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM app.account WHERE account_id = $1"
        ))
        .bind(account_id)
        .fetch_optional(&deps.get_db().pg_pool)
        .await
        .to_feed_err()?
        .map(AccountRow::into_parts)
        .transpose()
    }

    pub async fn find_account_credentials_by_email(
        deps: &impl GetDb,
        email: &Email,
    ) -> FeedResult<Option<(Account, Credentials)>> {
        sqlx::query_as::<_, AccountRow>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM app.account WHERE email = $1"
        ))
        .bind(email.as_ref())
        .fetch_optional(&deps.get_db().pg_pool)
        .await
        .to_feed_err()?
        .map(AccountRow::into_parts)
        .transpose()
    }

    pub async fn find_account_by_id(
        deps: &impl GetDb,
        AccountId(account_id): AccountId,
    ) -> FeedResult<Option<Account>> {
        sqlx::query_as::<_, AccountRow>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM app.account WHERE account_id = $1"
        ))
        .bind(account_id)
        .fetch_optional(&deps.get_db().pg_pool)
        .await
        .to_feed_err()?
        .map(AccountRow::into_account)
        .transpose()
    }

    pub async fn find_account_by_handle(
        deps: &impl GetDb,
        handle: &str,
    ) -> FeedResult<Option<Account>> {
        sqlx::query_as::<_, AccountRow>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM app.account WHERE handle = $1"
        ))
        .bind(handle)
        .fetch_optional(&deps.get_db().pg_pool)
        .await
        .to_feed_err()?
        .map(AccountRow::into_account)
        .transpose()
    }

    pub async fn find_accounts_by_ids(
        deps: &impl GetDb,
        account_ids: &[AccountId],
    ) -> FeedResult<Vec<Account>> {
        let ids: Vec<Uuid> = account_ids.iter().map(|id| id.0).collect();

        sqlx::query_as::<_, AccountRow>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM app.account WHERE account_id = ANY($1)"
        ))
        .bind(ids)
        .fetch_all(&deps.get_db().pg_pool)
        .await
        .to_feed_err()?
        .into_iter()
        .map(AccountRow::into_account)
        .collect()
    }

    pub async fn update_account(
        deps: &impl GetDb,
        AccountId(account_id): AccountId,
        update: AccountUpdate<'_>,
    ) -> FeedResult<(Account, Credentials)> {
        sqlx::query_as::<_, AccountRow>(&format!(
            r#"
            UPDATE app.account
            SET
                display_name = COALESCE($2, display_name),
                avatar = COALESCE($3, avatar),
                bio = COALESCE($4, bio)
            WHERE account_id = $1
            RETURNING {ACCOUNT_COLUMNS}
            "#
        ))
        .bind(account_id)
        .bind(update.display_name)
        .bind(update.avatar)
        .bind(update.bio)
        .fetch_optional(&deps.get_db().pg_pool)
        .await
        .to_feed_err()?
        .ok_or(FeedError::AccountNotFound)?
        .into_parts()
    }
}
