pub mod repo;

use crate::account::auth::{Authenticate, Token};
use crate::account::repo::AccountRepo;
use crate::account::{AccountId, Author};
use crate::enrich::enrich;
use crate::error::{FeedError, FeedResult};
use crate::iter_util::Single;
use crate::post::PostId;
use repo::CommentRepo;

use entrait::entrait_export as entrait;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct CommentId(pub Uuid);

#[derive(serde::Serialize, serde::Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedComment {
    pub id: CommentId,
    pub post_id: PostId,
    pub account_id: AccountId,
    pub body: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub author: Author,
}

impl EnrichedComment {
    pub fn new(comment: repo::Comment, author: Author) -> Self {
        Self {
            id: comment.comment_id,
            post_id: comment.post_id,
            account_id: comment.account_id,
            body: comment.body,
            created_at: comment.created_at,
            author,
        }
    }
}

#[entrait(pub CommentApi, mock_api=CommentApiMock)]
pub mod api {
    use super::*;

    pub async fn list_comments(
        deps: &(impl CommentRepo + AccountRepo),
        post_id: PostId,
    ) -> FeedResult<Vec<EnrichedComment>> {
        let comments = deps.select_comments(post_id).await?;
        enrich(deps, comments, EnrichedComment::new).await
    }

    pub async fn add_comment(
        deps: &(impl Authenticate + CommentRepo + AccountRepo),
        token: Token,
        post_id: PostId,
        body: &str,
    ) -> FeedResult<EnrichedComment> {
        let account_id = deps.authenticate(token)?;
        let body = body.trim();
        if body.is_empty() {
            return Err(FeedError::validation("comment body must not be blank"));
        }

        let comment = deps.insert_comment(account_id, post_id, body).await?;

        enrich(deps, vec![comment], EnrichedComment::new)
            .await?
            .into_iter()
            .single()
    }
}

#[cfg(test)]
mod tests {
    use super::repo::CommentRepoMock;
    use super::*;
    use crate::account::auth::authenticate::AuthenticateMock;
    use crate::account::repo::AccountRepoMock;
    use crate::account::tests::{test_account, test_account_id};

    use assert_matches::*;
    use unimock::*;

    fn test_comment(account_id: AccountId, post_id: PostId, body: &str) -> repo::Comment {
        repo::Comment {
            comment_id: CommentId(Uuid::new_v4()),
            post_id,
            account_id,
            body: body.to_string(),
            created_at: OffsetDateTime::from_unix_timestamp(1_700_000_000).unwrap(),
        }
    }

    #[tokio::test]
    async fn comments_are_enriched_like_posts() {
        let post_id = PostId(Uuid::new_v4());
        let sarah = test_account("sarah");
        let orphan = AccountId(Uuid::new_v4());

        let deps = Unimock::new((
            CommentRepoMock::select_comments
                .next_call(matching!(_))
                .returns(Ok(vec![
                    test_comment(sarah.account_id, post_id, "nice entry"),
                    test_comment(orphan, post_id, "stop loss?"),
                ])),
            AccountRepoMock::find_accounts_by_ids
                .next_call(matching!(_))
                .returns(Ok(vec![sarah])),
        ));

        let comments = api::list_comments(&deps, post_id).await.unwrap();

        assert_eq!("sarah", comments[0].author.handle);
        assert_eq!(Author::placeholder(orphan), comments[1].author);
    }

    #[tokio::test]
    async fn blank_comment_is_rejected() {
        let deps = Unimock::new(
            AuthenticateMock::authenticate
                .next_call(matching!(_))
                .returns(Ok(test_account_id())),
        );

        assert_matches!(
            api::add_comment(&deps, Token::from_token("token"), PostId(Uuid::new_v4()), " \n").await,
            Err(FeedError::Validation(_))
        );
    }

    #[tokio::test]
    async fn comment_on_missing_post_is_not_found() {
        let deps = Unimock::new((
            AuthenticateMock::authenticate
                .next_call(matching!(_))
                .returns(Ok(test_account_id())),
            CommentRepoMock::insert_comment
                .next_call(matching!(_, _, _))
                .returns(Err(FeedError::PostNotFound)),
        ));

        assert_matches!(
            api::add_comment(&deps, Token::from_token("token"), PostId(Uuid::new_v4()), "gm").await,
            Err(FeedError::PostNotFound)
        );
    }
}
