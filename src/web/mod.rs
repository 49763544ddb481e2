pub mod responses;
pub mod survey;
pub mod trends;

use crate::state::SharedState;
use axum::{routing::get, Router};

async fn health() -> &'static str {
    "OK"
}

pub fn routes(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/members", survey::router(state.clone()))
        .nest("/runs", responses::router(state.clone()))
        .nest("/trends", trends::router(state))
}
