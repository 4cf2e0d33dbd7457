//! API route definitions
//!
//! Sensor service:
//! - GET /random_input - one generated row
//! - GET /random_predict - batch of generated rows with predictions
//! - GET /ws - WebSocket dataset replay
//!
//! Prediction service:
//! - POST /predict - single-row prediction
//!
//! Both: GET /health, GET /metrics

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{self, ServiceState};

pub fn sensor_routes(state: ServiceState) -> Router {
    Router::new()
        .route("/random_input", get(handlers::random_input))
        .route("/random_predict", get(handlers::random_predict))
        .route("/ws", get(handlers::stream_ws))
        .with_state(state)
}

pub fn predict_routes(state: ServiceState) -> Router {
    Router::new()
        .route("/predict", post(handlers::predict))
        .with_state(state)
}

pub fn status_routes(state: ServiceState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/metrics", get(handlers::get_metrics))
        .with_state(state)
}
