//! Health and Prometheus counters, served by both listeners

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;

use super::ServiceState;

// ============================================================================
// Health Endpoint
// ============================================================================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: String,
    pub uptime_seconds: u64,
    /// Classes the loaded model can emit
    pub model_classes: Vec<u8>,
    /// Dataset rows available to the stream
    pub replay_rows: usize,
}

/// GET /health
pub async fn health_check(State(state): State<ServiceState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.counters.uptime_secs(),
        model_classes: state.model.classes().to_vec(),
        replay_rows: state.replay_rows.len(),
    })
}

// ============================================================================
// Prometheus Metrics Endpoint
// ============================================================================

/// GET /metrics
///
/// Runtime counters in Prometheus text format (version 0.0.4):
/// - `motor_predictions_total`: predictions served on any route
/// - `motor_faults_predicted_total`: predictions equal to 1
/// - `motor_stream_events_total`: rows pushed over `/ws`
/// - `motor_uptime_seconds`
pub async fn get_metrics(State(state): State<ServiceState>) -> impl IntoResponse {
    let counters = &state.counters;
    let mut body = String::with_capacity(512);

    let mut metric = |name: &str, kind: &str, help: &str, value: u64| {
        body.push_str(&format!("# HELP {name} {help}\n"));
        body.push_str(&format!("# TYPE {name} {kind}\n"));
        body.push_str(&format!("{name} {value}\n"));
    };
    metric(
        "motor_predictions_total",
        "counter",
        "Predictions served",
        counters.predictions(),
    );
    metric(
        "motor_faults_predicted_total",
        "counter",
        "Predictions classified as machine failure",
        counters.faults(),
    );
    metric(
        "motor_stream_events_total",
        "counter",
        "Sensor events pushed to stream clients",
        counters.stream_events(),
    );
    metric(
        "motor_uptime_seconds",
        "gauge",
        "Process uptime in seconds",
        counters.uptime_secs(),
    );

    (
        axum::http::StatusCode::OK,
        [(axum::http::header::CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
        body,
    )
}

#[cfg(test)]
mod tests {
    use super::super::tests::create_test_state;
    use super::*;
    use crate::types::FeatureRow;

    #[tokio::test]
    async fn test_health_check() {
        let Json(response) = health_check(State(create_test_state())).await;
        assert_eq!(response.status, "ok");
        assert_eq!(response.model_classes, vec![0, 1]);
        assert_eq!(response.replay_rows, 3);
    }

    #[tokio::test]
    async fn test_metrics_reflect_counters() {
        let state = create_test_state();
        state.predict(&FeatureRow::new(310.0, 1500.0, 58.0, 10.0));

        let resp = get_metrics(State(state)).await.into_response();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(text.contains("motor_predictions_total 1\n"));
        assert!(text.contains("motor_faults_predicted_total 1\n"));
        assert!(text.contains("motor_stream_events_total 0\n"));
        assert!(text.contains("# TYPE motor_uptime_seconds gauge"));
    }
}
