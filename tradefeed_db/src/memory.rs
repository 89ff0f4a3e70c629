//! In-process implementation of the repository traits.
//!
//! Behaves like the PostgreSQL repositories (ordering, idempotent edges,
//! counters, constraint errors) so the feed can be exercised end to end
//! without a database server. Also counts batch author lookups.

use tradefeed_domain::account::handle::Email;
use tradefeed_domain::account::repo::*;
use tradefeed_domain::account::{AccountId, Role};
use tradefeed_domain::comment::repo::{Comment, CommentRepoImpl, DelegateCommentRepo};
use tradefeed_domain::comment::CommentId;
use tradefeed_domain::error::{FeedError, FeedResult};
use tradefeed_domain::follow::repo::{DelegateFollowRepo, FollowRepoImpl};
use tradefeed_domain::post::repo::{DelegatePostRepo, Filter, NewPost, Post, PostRepoImpl};
use tradefeed_domain::post::PostId;

use entrait::*;
use std::collections::{BTreeSet, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Clone)]
pub struct MemStore {
    state: Arc<Mutex<State>>,
}

struct State {
    epoch: OffsetDateTime,
    clock: i64,
    accounts: Vec<(Account, Credentials)>,
    posts: Vec<Post>,
    follows: BTreeSet<(AccountId, AccountId)>,
    likes: HashSet<(PostId, AccountId)>,
    comments: Vec<Comment>,
    batch_lookups: usize,
}

impl State {
    /// Strictly increasing creation timestamps.
    fn tick(&mut self) -> OffsetDateTime {
        self.clock += 1;
        self.epoch + time::Duration::milliseconds(self.clock)
    }

    fn account(&self, account_id: AccountId) -> Option<&(Account, Credentials)> {
        self.accounts
            .iter()
            .find(|(account, _)| account.account_id == account_id)
    }

    fn post_mut(&mut self, post_id: PostId) -> FeedResult<&mut Post> {
        self.posts
            .iter_mut()
            .find(|post| post.post_id == post_id)
            .ok_or(FeedError::PostNotFound)
    }
}

impl Default for MemStore {
    fn default() -> Self {
        Self {
            state: Arc::new(Mutex::new(State {
                epoch: OffsetDateTime::now_utc(),
                clock: 0,
                accounts: vec![],
                posts: vec![],
                follows: BTreeSet::new(),
                likes: HashSet::new(),
                comments: vec![],
                batch_lookups: 0,
            })),
        }
    }
}

impl MemStore {
    fn lock(&self) -> FeedResult<MutexGuard<'_, State>> {
        self.state
            .lock()
            .map_err(|_| FeedError::Anyhow(anyhow::anyhow!("memory store poisoned")))
    }

    /// Number of `find_accounts_by_ids` calls so far.
    pub fn batch_lookups(&self) -> usize {
        self.lock().map(|state| state.batch_lookups).unwrap_or_default()
    }

    /// Drop an account row while leaving its posts and comments behind.
    pub fn remove_account(&self, account_id: AccountId) -> FeedResult<()> {
        self.lock()?
            .accounts
            .retain(|(account, _)| account.account_id != account_id);
        Ok(())
    }
}

pub trait GetMemStore {
    fn get_mem_store(&self) -> &MemStore;
}

impl GetMemStore for MemStore {
    fn get_mem_store(&self) -> &MemStore {
        self
    }
}

impl<T: GetMemStore> GetMemStore for entrait::Impl<T> {
    fn get_mem_store(&self) -> &MemStore {
        (**self).get_mem_store()
    }
}

impl DelegateAccountRepo<Self> for MemStore {
    type Target = MemAccountRepo;
}

impl DelegatePostRepo<Self> for MemStore {
    type Target = MemPostRepo;
}

impl DelegateFollowRepo<Self> for MemStore {
    type Target = MemFollowRepo;
}

impl DelegateCommentRepo<Self> for MemStore {
    type Target = MemCommentRepo;
}

pub struct MemAccountRepo;

#[entrait]
impl AccountRepoImpl for MemAccountRepo {
    pub async fn insert_account(
        deps: &impl GetMemStore,
        new_account: NewAccount<'_>,
    ) -> FeedResult<(Account, Credentials)> {
        let mut state = deps.get_mem_store().lock()?;
        if state
            .accounts
            .iter()
            .any(|(account, _)| account.handle == new_account.handle)
        {
            return Err(FeedError::HandleTaken);
        }
        if state
            .accounts
            .iter()
            .any(|(_, credentials)| credentials.email == *new_account.email)
        {
            return Err(FeedError::EmailTaken);
        }

        let created_at = state.tick();
        let entry = (
            Account {
                account_id: AccountId(Uuid::new_v4()),
                handle: new_account.handle.to_string(),
                display_name: new_account.display_name.to_string(),
                avatar: new_account.avatar.map(str::to_string),
                bio: new_account.bio.map(str::to_string),
                role: Role::Member,
                created_at,
            },
            Credentials {
                email: new_account.email.clone(),
                password_hash: new_account.password_hash,
            },
        );
        state.accounts.push(entry.clone());

        Ok(entry)
    }

    pub async fn find_account_credentials_by_id(
        deps: &impl GetMemStore,
        account_id: AccountId,
    ) -> FeedResult<Option<(Account, Credentials)>> {
        Ok(deps.get_mem_store().lock()?.account(account_id).cloned())
    }

    pub async fn find_account_credentials_by_email(
        deps: &impl GetMemStore,
        email: &Email,
    ) -> FeedResult<Option<(Account, Credentials)>> {
        Ok(deps
            .get_mem_store()
            .lock()?
            .accounts
            .iter()
            .find(|(_, credentials)| credentials.email == *email)
            .cloned())
    }

    pub async fn find_account_by_id(
        deps: &impl GetMemStore,
        account_id: AccountId,
    ) -> FeedResult<Option<Account>> {
        Ok(deps
            .get_mem_store()
            .lock()?
            .account(account_id)
            .map(|(account, _)| account.clone()))
    }

    pub async fn find_account_by_handle(
        deps: &impl GetMemStore,
        handle: &str,
    ) -> FeedResult<Option<Account>> {
        Ok(deps
            .get_mem_store()
            .lock()?
            .accounts
            .iter()
            .find(|(account, _)| account.handle == handle)
            .map(|(account, _)| account.clone()))
    }

    pub async fn find_accounts_by_ids(
        deps: &impl GetMemStore,
        account_ids: &[AccountId],
    ) -> FeedResult<Vec<Account>> {
        let mut state = deps.get_mem_store().lock()?;
        state.batch_lookups += 1;

        Ok(state
            .accounts
            .iter()
            .filter(|(account, _)| account_ids.contains(&account.account_id))
            .map(|(account, _)| account.clone())
            .collect())
    }

    pub async fn update_account(
        deps: &impl GetMemStore,
        account_id: AccountId,
        update: AccountUpdate<'_>,
    ) -> FeedResult<(Account, Credentials)> {
        let mut state = deps.get_mem_store().lock()?;
        let (account, credentials) = state
            .accounts
            .iter_mut()
            .find(|(account, _)| account.account_id == account_id)
            .ok_or(FeedError::AccountNotFound)?;

        if let Some(display_name) = update.display_name {
            account.display_name = display_name.to_string();
        }
        if let Some(avatar) = update.avatar {
            account.avatar = Some(avatar.to_string());
        }
        if let Some(bio) = update.bio {
            account.bio = Some(bio.to_string());
        }

        Ok((account.clone(), credentials.clone()))
    }
}

pub struct MemPostRepo;

#[entrait]
impl PostRepoImpl for MemPostRepo {
    pub async fn select_posts(deps: &impl GetMemStore, filter: Filter) -> FeedResult<Vec<Post>> {
        let state = deps.get_mem_store().lock()?;
        let mut posts: Vec<Post> = state
            .posts
            .iter()
            .filter(|post| filter.account_id.map_or(true, |id| post.account_id == id))
            .filter(|post| filter.post_id.map_or(true, |id| post.post_id == id))
            .cloned()
            .collect();

        posts.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.post_id.0.cmp(&a.post_id.0))
        });

        Ok(posts
            .into_iter()
            .skip(filter.offset.max(0) as usize)
            .take(filter.limit.max(0) as usize)
            .collect())
    }

    pub async fn insert_post(deps: &impl GetMemStore, new_post: NewPost<'_>) -> FeedResult<Post> {
        let mut state = deps.get_mem_store().lock()?;
        if state.account(new_post.account_id).is_none() {
            return Err(FeedError::AccountNotFound);
        }

        let post = Post {
            post_id: PostId(Uuid::new_v4()),
            account_id: new_post.account_id,
            body: new_post.body.to_string(),
            images: new_post.images.to_vec(),
            videos: new_post.videos.to_vec(),
            likes_count: 0,
            comments_count: 0,
            tags: new_post.tags.to_vec(),
            created_at: state.tick(),
        };
        state.posts.push(post.clone());

        Ok(post)
    }

    pub async fn delete_post_by_author(
        deps: &impl GetMemStore,
        account_id: AccountId,
        post_id: PostId,
    ) -> FeedResult<()> {
        let mut state = deps.get_mem_store().lock()?;
        if state.post_mut(post_id)?.account_id != account_id {
            return Err(FeedError::Forbidden);
        }

        state.posts.retain(|post| post.post_id != post_id);
        state.likes.retain(|(liked, _)| *liked != post_id);
        state.comments.retain(|comment| comment.post_id != post_id);

        Ok(())
    }

    pub async fn insert_like(
        deps: &impl GetMemStore,
        account_id: AccountId,
        post_id: PostId,
    ) -> FeedResult<()> {
        let mut state = deps.get_mem_store().lock()?;
        state.post_mut(post_id)?;
        if state.account(account_id).is_none() {
            return Err(FeedError::AccountNotFound);
        }

        if state.likes.insert((post_id, account_id)) {
            state.post_mut(post_id)?.likes_count += 1;
        }

        Ok(())
    }

    pub async fn delete_like(
        deps: &impl GetMemStore,
        account_id: AccountId,
        post_id: PostId,
    ) -> FeedResult<()> {
        let mut state = deps.get_mem_store().lock()?;
        if state.likes.remove(&(post_id, account_id)) {
            state.post_mut(post_id)?.likes_count -= 1;
        }

        Ok(())
    }

    pub async fn select_liked_post_ids(
        deps: &impl GetMemStore,
        account_id: AccountId,
        post_ids: &[PostId],
    ) -> FeedResult<Vec<PostId>> {
        let state = deps.get_mem_store().lock()?;
        Ok(post_ids
            .iter()
            .copied()
            .filter(|post_id| state.likes.contains(&(*post_id, account_id)))
            .collect())
    }
}

pub struct MemFollowRepo;

#[entrait]
impl FollowRepoImpl for MemFollowRepo {
    pub async fn insert_follow(
        deps: &impl GetMemStore,
        follower: AccountId,
        followed: AccountId,
    ) -> FeedResult<()> {
        let mut state = deps.get_mem_store().lock()?;
        if follower == followed {
            return Err(FeedError::CannotFollowSelf);
        }
        if state.account(followed).is_none() {
            return Err(FeedError::ProfileNotFound);
        }
        if state.account(follower).is_none() {
            return Err(FeedError::AccountNotFound);
        }

        state.follows.insert((follower, followed));

        Ok(())
    }

    pub async fn delete_follow(
        deps: &impl GetMemStore,
        follower: AccountId,
        followed: AccountId,
    ) -> FeedResult<()> {
        deps.get_mem_store()
            .lock()?
            .follows
            .remove(&(follower, followed));

        Ok(())
    }

    pub async fn count_followers(deps: &impl GetMemStore, account_id: AccountId) -> FeedResult<i64> {
        let state = deps.get_mem_store().lock()?;
        Ok(state
            .follows
            .iter()
            .filter(|(_, followed)| *followed == account_id)
            .count() as i64)
    }

    pub async fn count_following(deps: &impl GetMemStore, account_id: AccountId) -> FeedResult<i64> {
        let state = deps.get_mem_store().lock()?;
        Ok(state
            .follows
            .iter()
            .filter(|(follower, _)| *follower == account_id)
            .count() as i64)
    }

    pub async fn follow_exists(
        deps: &impl GetMemStore,
        follower: AccountId,
        followed: AccountId,
    ) -> FeedResult<bool> {
        Ok(deps
            .get_mem_store()
            .lock()?
            .follows
            .contains(&(follower, followed)))
    }
}

pub struct MemCommentRepo;

#[entrait]
impl CommentRepoImpl for MemCommentRepo {
    pub async fn select_comments(
        deps: &impl GetMemStore,
        post_id: PostId,
    ) -> FeedResult<Vec<Comment>> {
        let mut state = deps.get_mem_store().lock()?;
        state.post_mut(post_id)?;

        // Insertion order is creation order.
        Ok(state
            .comments
            .iter()
            .filter(|comment| comment.post_id == post_id)
            .cloned()
            .collect())
    }

    pub async fn insert_comment(
        deps: &impl GetMemStore,
        account_id: AccountId,
        post_id: PostId,
        body: &str,
    ) -> FeedResult<Comment> {
        let mut state = deps.get_mem_store().lock()?;
        state.post_mut(post_id)?;
        if state.account(account_id).is_none() {
            return Err(FeedError::AccountNotFound);
        }

        let comment = Comment {
            comment_id: CommentId(Uuid::new_v4()),
            post_id,
            account_id,
            body: body.to_string(),
            created_at: state.tick(),
        };
        state.comments.push(comment.clone());
        state.post_mut(post_id)?.comments_count += 1;

        Ok(comment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tradefeed_domain::account::password::PasswordHash;
    use tradefeed_domain::follow::repo::FollowRepo;
    use tradefeed_domain::post::repo::PostRepo;

    async fn insert(store: &entrait::Impl<MemStore>, handle: &str) -> AccountId {
        let email = Email::valid(format!("{handle}@example.com"));
        store
            .insert_account(NewAccount {
                handle,
                email: &email,
                display_name: handle,
                avatar: None,
                bio: None,
                password_hash: PasswordHash("h4sh".to_string()),
            })
            .await
            .unwrap()
            .0
            .account_id
    }

    #[tokio::test]
    async fn memory_store_orders_posts_newest_first() {
        let store = entrait::Impl::new(MemStore::default());
        let sarah = insert(&store, "sarah").await;

        for body in ["one", "two", "three"] {
            store
                .insert_post(NewPost {
                    account_id: sarah,
                    body,
                    images: &[],
                    videos: &[],
                    tags: &[],
                })
                .await
                .unwrap();
        }

        let posts = store
            .select_posts(Filter {
                account_id: Some(sarah),
                post_id: None,
                limit: 2,
                offset: 0,
            })
            .await
            .unwrap();

        assert_eq!(
            vec!["three", "two"],
            posts.iter().map(|post| post.body.as_str()).collect::<Vec<_>>()
        );
    }

    #[tokio::test]
    async fn memory_store_follow_edges_are_unique() {
        let store = entrait::Impl::new(MemStore::default());
        let alice = insert(&store, "alice").await;
        let bob = insert(&store, "bob").await;

        store.insert_follow(bob, alice).await.unwrap();
        store.insert_follow(bob, alice).await.unwrap();

        assert_eq!(1, store.count_followers(alice).await.unwrap());
    }
}
