//! Random inputs for manual testing and the driver

use axum::extract::State;
use axum::Json;

use super::ServiceState;
use crate::types::{FeatureRow, PredictionResult};

/// GET /random_input
///
/// One freshly generated row, no prediction.
pub async fn random_input(State(state): State<ServiceState>) -> Json<FeatureRow> {
    Json(state.generator.generate(&mut rand::thread_rng()))
}

/// GET /random_predict
///
/// A batch of generated rows, each paired with the model's prediction.
pub async fn random_predict(State(state): State<ServiceState>) -> Json<Vec<PredictionResult>> {
    let rows = state
        .generator
        .generate_batch(&mut rand::thread_rng(), state.batch_size);
    let results = rows
        .into_iter()
        .map(|input| PredictionResult {
            prediction: state.predict(&input),
            input,
        })
        .collect();
    Json(results)
}

#[cfg(test)]
mod tests {
    use super::super::tests::create_test_state;
    use super::*;

    #[tokio::test]
    async fn test_random_predict_batch_size() {
        let state = create_test_state();
        let Json(results) = random_predict(State(state.clone())).await;
        assert_eq!(results.len(), 10);
        assert!(results.iter().all(|r| r.prediction <= 1));
        assert_eq!(state.counters.predictions(), 10);
    }

    #[tokio::test]
    async fn test_random_input_in_range() {
        let Json(row) = random_input(State(create_test_state())).await;
        assert!((305.0..=315.0).contains(&row.process_temperature));
        assert!((0.0..250.0).contains(&row.tool_wear));
    }
}
