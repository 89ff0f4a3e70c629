mod account_routes;
mod function_routes;
mod post_routes;
mod profile_routes;

use tradefeed_domain::account::AccountApi;
use tradefeed_domain::comment::CommentApi;
use tradefeed_domain::post::PostApi;
use tradefeed_domain::profile::ProfileApi;

use axum::routing::Router;

/// Axum router for every endpoint, generic over the dependency container.
pub fn api_router<D>() -> axum::Router
where
    D: PostApi + CommentApi + ProfileApi + AccountApi + Sized + Clone + Send + Sync + 'static,
{
    Router::new()
        .nest(
            "/functions/v1",
            function_routes::FunctionRoutes::<D>::router(),
        )
        .nest(
            "/api",
            Router::new()
                .merge(post_routes::PostRoutes::<D>::router())
                .merge(profile_routes::ProfileRoutes::<D>::router())
                .merge(account_routes::AccountRoutes::<D>::router()),
        )
}
