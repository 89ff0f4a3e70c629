//! The two aggregation endpoints, served under `/functions/v1`.

use tradefeed_domain::account::auth::Token;
use tradefeed_domain::error::{FeedError, FeedResult};
use tradefeed_domain::post::{EnrichedPost, PostApi, PostCreate, PostQuery};

use axum::body::Bytes;
use axum::extract::Extension;
use axum::http::StatusCode;
use axum::routing::post;
use axum::Json;
use axum_extra::extract::WithRejection;

pub struct FunctionRoutes<D>(std::marker::PhantomData<D>);

impl<D: Sized + Clone + Send + Sync + 'static> FunctionRoutes<D>
where
    D: PostApi,
{
    pub fn router() -> axum::Router {
        axum::Router::new()
            .route("/create_post", post(Self::create_post))
            .route("/get_posts_with_user", post(Self::get_posts_with_user))
    }

    async fn create_post(
        Extension(deps): Extension<D>,
        token: Token,
        WithRejection(Json(body), _): WithRejection<Json<PostCreate>, FeedError>,
    ) -> FeedResult<(StatusCode, Json<EnrichedPost>)> {
        Ok((StatusCode::CREATED, Json(deps.create_post(token, body).await?)))
    }

    /// An empty body lists every post with default paging.
    async fn get_posts_with_user(
        Extension(deps): Extension<D>,
        token: Option<Token>,
        body: Bytes,
    ) -> FeedResult<Json<Vec<EnrichedPost>>> {
        let query = if body.iter().all(u8::is_ascii_whitespace) {
            PostQuery::default()
        } else {
            serde_json::from_slice(&body)
                .map_err(|e| FeedError::validation(format!("malformed request body: {e}")))?
        };

        Ok(Json(deps.get_posts_with_user(token, query).await?))
    }
}
