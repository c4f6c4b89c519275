use axum::{routing::get, Router};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::handlers::*;
use super::AppState;
use crate::fetch::JsonFetch;

pub fn create_router<F: JsonFetch>(state: AppState<F>) -> Router {
    Router::new()
        .route("/api/prayer", get(get_prayer_times::<F>))
        .route("/api/location", get(get_location::<F>))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
