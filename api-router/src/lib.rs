use api_state::ApiState;
use axum::{
    extract::{DefaultBodyLimit, FromRef},
    routing::{get, post},
    Router,
};
use routes::{index::index_site, liveness::live, query::query_site, readiness::ready};

pub mod api_state;
pub mod error;
mod routes;

const REQUEST_BODY_LIMIT: usize = 64 * 1024;

/// Router for the indexing and question answering endpoints
pub fn api_routes<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
    ApiState: FromRef<S>,
{
    // Health checks
    let public = Router::new()
        .route("/ready", get(ready))
        .route("/live", get(live));

    let core = Router::new()
        .route("/index", post(index_site))
        .route("/query", post(query_site))
        .layer(DefaultBodyLimit::max(REQUEST_BODY_LIMIT));

    public.merge(core)
}
