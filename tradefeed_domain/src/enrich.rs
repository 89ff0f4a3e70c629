//! Attaching author profiles to authored records.
//!
//! Every post and comment leaves the domain layer carrying its author's
//! public fields. The authors of a whole page are fetched in one batch
//! lookup and joined in memory. Records whose author no longer resolves get
//! [`Author::placeholder`] instead of failing the page.

use crate::account::repo::AccountRepo;
use crate::account::{AccountId, Author};
use crate::error::{FeedError, FeedResult};

use itertools::Itertools;
use std::collections::HashMap;

/// A record with an owning account.
pub trait Authored {
    fn author_id(&self) -> AccountId;
}

pub async fn enrich<T, R>(
    deps: &impl AccountRepo,
    records: Vec<T>,
    join: impl Fn(T, Author) -> R,
) -> FeedResult<Vec<R>>
where
    T: Authored,
{
    if records.is_empty() {
        return Ok(vec![]);
    }

    let author_ids: Vec<AccountId> = records.iter().map(Authored::author_id).unique().collect();
    let accounts = deps.find_accounts_by_ids(&author_ids).await?;

    let mut authors: HashMap<AccountId, Author> = HashMap::with_capacity(accounts.len());
    for account in accounts {
        if !author_ids.contains(&account.account_id) {
            return Err(FeedError::DataIntegrity(format!(
                "batch lookup returned unrequested account {}",
                account.account_id
            )));
        }
        if authors.insert(account.account_id, account.into()).is_some() {
            return Err(FeedError::DataIntegrity(
                "batch lookup returned the same account twice".to_string(),
            ));
        }
    }

    Ok(records
        .into_iter()
        .map(|record| {
            let author_id = record.author_id();
            let author = match authors.get(&author_id) {
                Some(author) => author.clone(),
                None => {
                    tracing::warn!(%author_id, "author not found, using placeholder");
                    Author::placeholder(author_id)
                }
            };
            join(record, author)
        })
        .collect())
}
