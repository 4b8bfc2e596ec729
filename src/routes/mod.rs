use axum::Router;
use tower_http::cors::CorsLayer;

use crate::{Config, SharedPredictor};

mod health;
mod info;
mod predict;

// ---

pub fn router(predictor: SharedPredictor, config: Config) -> Router {
    // ---
    Router::new()
        .merge(predict::router())
        .merge(info::router())
        .merge(health::router())
        .layer(CorsLayer::permissive())
        .with_state((predictor, config))
}
