use tradefeed_domain::account::auth::Token;
use tradefeed_domain::comment::{CommentApi, EnrichedComment};
use tradefeed_domain::error::{FeedError, FeedResult};
use tradefeed_domain::post::{EnrichedPost, PostApi, PostId, PostQuery};

use axum::extract::{Extension, Path, Query};
use axum::routing::{delete, get, post};
use axum::Json;
use axum_extra::extract::WithRejection;

#[derive(serde::Deserialize, serde::Serialize, Debug)]
struct PostBody {
    post: EnrichedPost,
}

#[derive(serde::Deserialize, serde::Serialize)]
struct MultiplePostsBody {
    posts: Vec<EnrichedPost>,
}

#[derive(serde::Deserialize, serde::Serialize)]
struct CommentBody<T = EnrichedComment> {
    comment: T,
}

#[derive(serde::Deserialize, serde::Serialize)]
struct MultipleCommentsBody {
    comments: Vec<EnrichedComment>,
}

#[derive(serde::Deserialize, serde::Serialize)]
struct AddComment {
    body: String,
}

pub struct PostRoutes<D>(std::marker::PhantomData<D>);

impl<D: Sized + Clone + Send + Sync + 'static> PostRoutes<D>
where
    D: PostApi + CommentApi,
{
    pub fn router() -> axum::Router {
        axum::Router::new().nest(
            "/posts",
            axum::Router::new()
                .route("/", get(Self::list_posts))
                .route("/:post_id", delete(Self::delete_post))
                .route(
                    "/:post_id/like",
                    post(Self::like_post).delete(Self::unlike_post),
                )
                .route(
                    "/:post_id/comments",
                    get(Self::list_comments).post(Self::add_comment),
                ),
        )
    }

    async fn list_posts(
        Extension(deps): Extension<D>,
        token: Option<Token>,
        WithRejection(Query(query), _): WithRejection<Query<PostQuery>, FeedError>,
    ) -> FeedResult<Json<MultiplePostsBody>> {
        Ok(Json(MultiplePostsBody {
            posts: deps.get_posts_with_user(token, query).await?,
        }))
    }

    async fn delete_post(
        Extension(deps): Extension<D>,
        token: Token,
        WithRejection(Path(post_id), _): WithRejection<Path<PostId>, FeedError>,
    ) -> FeedResult<()> {
        deps.delete_post(token, post_id).await?;
        Ok(())
    }

    async fn like_post(
        Extension(deps): Extension<D>,
        token: Token,
        WithRejection(Path(post_id), _): WithRejection<Path<PostId>, FeedError>,
    ) -> FeedResult<Json<PostBody>> {
        Ok(Json(PostBody {
            post: deps.like_post(token, post_id, true).await?,
        }))
    }

    async fn unlike_post(
        Extension(deps): Extension<D>,
        token: Token,
        WithRejection(Path(post_id), _): WithRejection<Path<PostId>, FeedError>,
    ) -> FeedResult<Json<PostBody>> {
        Ok(Json(PostBody {
            post: deps.like_post(token, post_id, false).await?,
        }))
    }

    async fn list_comments(
        Extension(deps): Extension<D>,
        WithRejection(Path(post_id), _): WithRejection<Path<PostId>, FeedError>,
    ) -> FeedResult<Json<MultipleCommentsBody>> {
        Ok(Json(MultipleCommentsBody {
            comments: deps.list_comments(post_id).await?,
        }))
    }

    async fn add_comment(
        Extension(deps): Extension<D>,
        token: Token,
        WithRejection(Path(post_id), _): WithRejection<Path<PostId>, FeedError>,
        WithRejection(Json(CommentBody { comment }), _): WithRejection<
            Json<CommentBody<AddComment>>,
            FeedError,
        >,
    ) -> FeedResult<Json<CommentBody>> {
        Ok(Json(CommentBody {
            comment: deps.add_comment(token, post_id, &comment.body).await?,
        }))
    }
}
