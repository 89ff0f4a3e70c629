use entrait::entrait_export as entrait;
use time::OffsetDateTime;

use super::handle::Email;
use super::password::PasswordHash;
use super::{AccountId, Role};
use crate::error::FeedResult;

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Account {
    pub account_id: AccountId,
    pub handle: String,
    pub display_name: String,
    pub avatar: Option<String>,
    pub bio: Option<String>,
    pub role: Role,
    pub created_at: OffsetDateTime,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Credentials {
    pub email: Email,
    pub password_hash: PasswordHash,
}

pub struct NewAccount<'a> {
    pub handle: &'a str,
    pub email: &'a Email,
    pub display_name: &'a str,
    pub avatar: Option<&'a str>,
    pub bio: Option<&'a str>,
    pub password_hash: PasswordHash,
}

#[derive(Clone, Default)]
pub struct AccountUpdate<'a> {
    pub display_name: Option<&'a str>,
    pub avatar: Option<&'a str>,
    pub bio: Option<&'a str>,
}

#[entrait(AccountRepoImpl, delegate_by = DelegateAccountRepo, mock_api=AccountRepoMock)]
pub trait AccountRepo {
    async fn insert_account(&self, new_account: NewAccount<'_>) -> FeedResult<(Account, Credentials)>;

    async fn find_account_credentials_by_id(
        &self,
        account_id: AccountId,
    ) -> FeedResult<Option<(Account, Credentials)>>;

    async fn find_account_credentials_by_email(
        &self,
        email: &Email,
    ) -> FeedResult<Option<(Account, Credentials)>>;

    async fn find_account_by_id(&self, account_id: AccountId) -> FeedResult<Option<Account>>;

    async fn find_account_by_handle(&self, handle: &str) -> FeedResult<Option<Account>>;

    /// Batch lookup. Unknown ids are simply absent from the result.
    async fn find_accounts_by_ids(&self, account_ids: &[AccountId]) -> FeedResult<Vec<Account>>;

    async fn update_account(
        &self,
        account_id: AccountId,
        update: AccountUpdate<'_>,
    ) -> FeedResult<(Account, Credentials)>;
}
