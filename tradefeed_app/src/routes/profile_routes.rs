use tradefeed_domain::account::auth::Token;
use tradefeed_domain::error::FeedResult;
use tradefeed_domain::profile::{Profile, ProfileApi};

use axum::extract::{Extension, Path};
use axum::routing::{get, post};
use axum::Json;

#[derive(serde::Serialize, serde::Deserialize)]
struct ProfileBody {
    profile: Profile,
}

pub struct ProfileRoutes<D>(std::marker::PhantomData<D>);

impl<D: Sized + Clone + Send + Sync + 'static> ProfileRoutes<D>
where
    D: ProfileApi,
{
    pub fn router() -> axum::Router {
        axum::Router::new()
            .route("/profiles/:handle", get(Self::get_profile))
            .route(
                "/profiles/:handle/follow",
                post(Self::follow_profile).delete(Self::unfollow_profile),
            )
    }

    async fn get_profile(
        Extension(deps): Extension<D>,
        token: Option<Token>,
        Path(handle): Path<String>,
    ) -> FeedResult<Json<ProfileBody>> {
        Ok(Json(ProfileBody {
            profile: deps.fetch_profile(token, &handle).await?,
        }))
    }

    async fn follow_profile(
        Extension(deps): Extension<D>,
        token: Token,
        Path(handle): Path<String>,
    ) -> FeedResult<Json<ProfileBody>> {
        Ok(Json(ProfileBody {
            profile: deps.follow_profile(token, &handle).await?,
        }))
    }

    async fn unfollow_profile(
        Extension(deps): Extension<D>,
        token: Token,
        Path(handle): Path<String>,
    ) -> FeedResult<Json<ProfileBody>> {
        Ok(Json(ProfileBody {
            profile: deps.unfollow_profile(token, &handle).await?,
        }))
    }
}
