//! REST API module using Axum
//!
//! Two routers, one per listener:
//! - sensor service: random inputs, batch predictions, WebSocket replay
//! - prediction service: single-row `/predict`
//!
//! Both carry `/health`, `/metrics`, request tracing and CORS.

pub mod envelope;
pub mod handlers;
mod routes;

pub use handlers::{ClientEvent, ServerEvent, ServiceCounters, ServiceState};

use axum::http::{header, Method, Uri};
use axum::response::Response;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use envelope::ApiErrorResponse;

/// Environment variable restricting CORS to a comma-separated origin list.
pub const CORS_ORIGINS_ENV: &str = "MOTOR_CORS_ORIGINS";

async fn not_found(uri: Uri) -> Response {
    ApiErrorResponse::not_found(format!("No route for {}", uri.path()))
}

/// Build the CORS layer.
///
/// The dashboard is served from another origin, so any origin is allowed
/// unless `MOTOR_CORS_ORIGINS` lists specific ones.
fn build_cors_layer() -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    match std::env::var(CORS_ORIGINS_ENV) {
        Ok(origins) => {
            let allowed: Vec<_> = origins
                .split(',')
                .filter_map(|o| o.trim().parse().ok())
                .collect();
            tracing::info!(origins = %origins, "CORS: allowing configured origins");
            base.allow_origin(allowed)
        }
        Err(_) => base.allow_origin(Any),
    }
}

/// Router for the sensor service listener.
pub fn create_sensor_app(state: ServiceState) -> Router {
    Router::new()
        .merge(routes::sensor_routes(state.clone()))
        .merge(routes::status_routes(state))
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .layer(build_cors_layer())
}

/// Router for the prediction service listener.
pub fn create_predict_app(state: ServiceState) -> Router {
    Router::new()
        .merge(routes::predict_routes(state.clone()))
        .merge(routes::status_routes(state))
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .layer(build_cors_layer())
}
