pub mod family;
pub mod health;
pub mod metrics;

use axum::{
    http::{header, Method},
    routing::get,
    Router,
};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::AppState;

pub fn router(state: AppState) -> Router {
    // Browsers may only call us from the configured client origin.
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
        .allow_origin(AllowOrigin::list([state.config.cors_origin.clone()]));

    Router::new()
        .route("/health", get(health::health_check))
        .route("/metrics", get(metrics::metrics_handler))
        .route("/api/family/roots", get(family::roots))
        .route("/api/family/children", get(family::children))
        .route("/api/family/family", get(family::family))
        .route("/api/family/search", get(family::search))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
