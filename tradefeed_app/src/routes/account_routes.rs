use tradefeed_domain::account::auth::Token;
use tradefeed_domain::account::{AccountApi, LoginAccount, ProfileEdit, Registration, SignedAccount};
use tradefeed_domain::error::{FeedError, FeedResult};

use axum::extract::Extension;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::Json;
use axum_extra::extract::WithRejection;

#[derive(serde::Serialize, serde::Deserialize)]
struct AccountBody<T = SignedAccount> {
    account: T,
}

pub struct AccountRoutes<D>(std::marker::PhantomData<D>);

impl<D: Sized + Clone + Send + Sync + 'static> AccountRoutes<D>
where
    D: AccountApi,
{
    pub fn router() -> axum::Router {
        axum::Router::new()
            .route("/accounts", post(Self::register))
            .route("/accounts/login", post(Self::login))
            .route("/account", get(Self::current_account).put(Self::edit_profile))
    }

    async fn register(
        Extension(deps): Extension<D>,
        WithRejection(Json(body), _): WithRejection<Json<AccountBody<Registration>>, FeedError>,
    ) -> FeedResult<(StatusCode, Json<AccountBody>)> {
        Ok((
            StatusCode::CREATED,
            Json(AccountBody {
                account: deps.register(body.account).await?,
            }),
        ))
    }

    async fn login(
        Extension(deps): Extension<D>,
        WithRejection(Json(body), _): WithRejection<Json<AccountBody<LoginAccount>>, FeedError>,
    ) -> FeedResult<Json<AccountBody>> {
        Ok(Json(AccountBody {
            account: deps.login(body.account).await?,
        }))
    }

    async fn current_account(
        Extension(deps): Extension<D>,
        token: Token,
    ) -> FeedResult<Json<AccountBody>> {
        Ok(Json(AccountBody {
            account: deps.fetch_current_account(token).await?,
        }))
    }

    async fn edit_profile(
        Extension(deps): Extension<D>,
        token: Token,
        WithRejection(Json(body), _): WithRejection<Json<AccountBody<ProfileEdit>>, FeedError>,
    ) -> FeedResult<Json<AccountBody>> {
        Ok(Json(AccountBody {
            account: deps.edit_profile(token, body.account).await?,
        }))
    }
}
