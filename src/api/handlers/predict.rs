//! Single-row prediction

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::Json;

use super::ServiceState;
use crate::api::envelope::ApiErrorResponse;
use crate::types::{FeatureRow, PredictResponse};

/// POST /predict
///
/// Body is one feature row keyed by column name; replies
/// `{"prediction": 0|1}`. Malformed bodies get a 400 envelope.
pub async fn predict(
    State(state): State<ServiceState>,
    payload: Result<Json<FeatureRow>, JsonRejection>,
) -> Response {
    let row = match payload {
        Ok(Json(row)) => row,
        Err(JsonRejection::MissingJsonContentType(e)) => {
            return ApiErrorResponse::unsupported_media_type(e.body_text());
        }
        Err(e) => {
            tracing::debug!(error = %e.body_text(), "Rejected prediction request");
            return ApiErrorResponse::bad_request(e.body_text());
        }
    };

    let prediction = state.predict(&row);
    tracing::debug!(?row, prediction, "Prediction served");
    Json(PredictResponse { prediction }).into_response()
}
