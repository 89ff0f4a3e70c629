pub mod hashtag;
pub mod repo;

use crate::account::auth::{Authenticate, Token};
use crate::account::repo::AccountRepo;
use crate::account::{AccountId, Author};
use crate::enrich::enrich;
use crate::error::{FeedError, FeedResult};
use crate::iter_util::Single;
use crate::{FeedSettings, GetConfig};
use repo::PostRepo;

use entrait::entrait_export as entrait;
use std::fmt;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct PostId(pub Uuid);

impl fmt::Display for PostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A post as it leaves the domain: always carrying its author.
#[derive(serde::Serialize, serde::Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedPost {
    pub id: PostId,
    pub account_id: AccountId,
    pub body: String,
    pub images: Vec<String>,
    pub videos: Vec<String>,
    pub likes_count: i64,
    pub comments_count: i64,
    pub tags: Vec<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub author: Author,
    /// Whether the authenticated viewer likes this post. Always false for anonymous viewers.
    #[serde(default)]
    pub has_liked: bool,
}

impl EnrichedPost {
    pub fn new(post: repo::Post, author: Author) -> Self {
        Self {
            id: post.post_id,
            account_id: post.account_id,
            body: post.body,
            images: post.images,
            videos: post.videos,
            likes_count: post.likes_count,
            comments_count: post.comments_count,
            tags: post.tags,
            created_at: post.created_at,
            author,
            has_liked: false,
        }
    }
}

#[derive(serde::Deserialize, serde::Serialize, Default, Debug, Eq, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct PostQuery {
    pub account_id: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(serde::Deserialize, serde::Serialize, Default, Debug)]
#[serde(default, rename_all = "camelCase")]
pub struct PostCreate {
    pub account_id: Option<String>,
    pub body: Option<String>,
    /// `null` and absent both mean no images.
    pub images: Option<Vec<String>>,
    pub videos: Option<Vec<String>>,
    /// When present, stored as given instead of the tags found in `body`.
    pub tags: Option<Vec<String>>,
}

pub fn resolve_filter(settings: FeedSettings, query: &PostQuery) -> FeedResult<repo::Filter> {
    let account_id = query.account_id.as_deref().map(AccountId::parse).transpose()?;

    let limit = match query.limit {
        None => settings.default_page_size,
        Some(limit) if limit < 0 => {
            return Err(FeedError::validation("limit must not be negative"));
        }
        Some(limit) if limit > settings.max_page_size => {
            return Err(FeedError::validation(format!(
                "limit must not exceed {}",
                settings.max_page_size
            )));
        }
        Some(limit) => limit,
    };

    let offset = match query.offset {
        None => 0,
        Some(offset) if offset < 0 => {
            return Err(FeedError::validation("offset must not be negative"));
        }
        Some(offset) => offset,
    };

    Ok(repo::Filter {
        account_id,
        post_id: None,
        limit,
        offset,
    })
}

pub fn resolve_tags(body: &str, explicit: Option<Vec<String>>, dedup: bool) -> Vec<String> {
    match explicit {
        Some(tags) => tags,
        None if dedup => hashtag::dedup_tags(hashtag::extract_hashtags(body)),
        None => hashtag::extract_hashtags(body),
    }
}

#[entrait(pub PostApi, mock_api=PostApiMock)]
pub mod api {
    use super::*;

    pub async fn get_posts_with_user(
        deps: &(impl Authenticate + GetConfig + PostRepo + AccountRepo),
        token: Option<Token>,
        query: PostQuery,
    ) -> FeedResult<Vec<EnrichedPost>> {
        let viewer = token.map(|token| deps.authenticate(token)).transpose()?;
        let filter = resolve_filter(deps.get_feed_settings(), &query)?;
        let posts = deps.select_posts(filter).await?;

        let mut posts = enrich(deps, posts, EnrichedPost::new).await?;
        if let Some(viewer) = viewer {
            mark_liked(deps, viewer, &mut posts).await?;
        }

        Ok(posts)
    }

    pub async fn create_post(
        deps: &(impl Authenticate + GetConfig + PostRepo + AccountRepo),
        token: Token,
        post: PostCreate,
    ) -> FeedResult<EnrichedPost> {
        let current_account_id = deps.authenticate(token)?;

        let account_id = AccountId::parse(
            post.account_id
                .as_deref()
                .ok_or_else(|| FeedError::validation("accountId is required"))?,
        )?;
        if account_id != current_account_id {
            return Err(FeedError::Forbidden);
        }

        let body = post.body.unwrap_or_default();
        let images = post.images.unwrap_or_default();
        let videos = post.videos.unwrap_or_default();
        if body.trim().is_empty() && images.is_empty() && videos.is_empty() {
            return Err(FeedError::validation(
                "a post needs a body, images or videos",
            ));
        }

        let tags = resolve_tags(&body, post.tags, deps.get_feed_settings().dedup_hashtags);

        let author = deps
            .find_account_by_id(account_id)
            .await?
            .ok_or(FeedError::AccountNotFound)?;

        let post = deps
            .insert_post(repo::NewPost {
                account_id,
                body: &body,
                images: &images,
                videos: &videos,
                tags: &tags,
            })
            .await?;

        tracing::debug!(post_id = %post.post_id, %account_id, "created post");

        Ok(EnrichedPost::new(post, author.into()))
    }

    pub async fn delete_post(
        deps: &(impl Authenticate + PostRepo),
        token: Token,
        post_id: PostId,
    ) -> FeedResult<()> {
        let current_account_id = deps.authenticate(token)?;
        let post = deps
            .select_posts(repo::Filter::single(post_id))
            .await?
            .into_iter()
            .single_or_none()?
            .ok_or(FeedError::PostNotFound)?;

        if post.account_id != current_account_id {
            return Err(FeedError::Forbidden);
        }

        deps.delete_post_by_author(current_account_id, post_id).await
    }

    pub async fn like_post(
        deps: &(impl Authenticate + PostRepo + AccountRepo),
        token: Token,
        post_id: PostId,
        value: bool,
    ) -> FeedResult<EnrichedPost> {
        let current_account_id = deps.authenticate(token)?;
        if value {
            deps.insert_like(current_account_id, post_id).await?;
        } else {
            deps.delete_like(current_account_id, post_id).await?;
        }

        let post = deps
            .select_posts(repo::Filter::single(post_id))
            .await?
            .into_iter()
            .single_or_none()?
            .ok_or(FeedError::PostNotFound)?;

        let mut post = enrich(deps, vec![post], EnrichedPost::new)
            .await?
            .into_iter()
            .single()?;
        post.has_liked = value;

        Ok(post)
    }

    async fn mark_liked(
        deps: &impl PostRepo,
        viewer: AccountId,
        posts: &mut [EnrichedPost],
    ) -> FeedResult<()> {
        if posts.is_empty() {
            return Ok(());
        }

        let post_ids: Vec<PostId> = posts.iter().map(|post| post.id).collect();
        let liked = deps.select_liked_post_ids(viewer, &post_ids).await?;
        for post in posts.iter_mut() {
            post.has_liked = liked.contains(&post.id);
        }

        Ok(())
    }
}
