//! HTTP handlers for the prediction and dataset endpoints

use axum::{
    extract::{rejection::JsonRejection, Json, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::warn;

use crate::currency::format_amount;
use crate::error::ServiceError;
use crate::server::ServerState;
use crate::types::{coerce_f64, coerce_i64, NewObservation, Observation};

/// Message returned by predict while the model is untrained
pub const NO_DATA_MESSAGE: &str = "No Data! Please train me.";

/// Predict response
#[derive(Debug, Serialize)]
pub struct PredictResponse {
    pub yearly: String,
    pub monthly: String,
    pub raw: f64,
}

/// Status response
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: String,
    pub version: String,
    pub trained: bool,
    pub data_points: usize,
}

/// Map a service error onto a response; `context` prefixes generic failures
fn error_response(err: ServiceError, context: &str) -> Response {
    match err {
        ServiceError::Validation(_) => {
            (StatusCode::BAD_REQUEST, Json(json!({ "error": err.to_string() }))).into_response()
        }
        ServiceError::NotFound(_) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "Data not found." })),
        )
            .into_response(),
        ServiceError::ModelNotTrained => (
            StatusCode::OK,
            Json(json!({ "salary": NO_DATA_MESSAGE, "trained": false })),
        )
            .into_response(),
        ServiceError::Storage(_) | ServiceError::Internal(_) => {
            warn!("{}: {}", context, err);
            (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": format!("{}: {}", context, err) })),
            )
                .into_response()
        }
    }
}

/// Unwrap a JSON body, reporting malformed bodies as validation errors
fn json_body(payload: Result<Json<Value>, JsonRejection>) -> Result<Value, Response> {
    match payload {
        Ok(Json(Value::Object(map))) => Ok(Value::Object(map)),
        Ok(Json(_)) => Err(error_response(
            ServiceError::Validation("request body must be a JSON object".to_string()),
            "",
        )),
        Err(rejection) => Err(error_response(
            ServiceError::Validation(rejection.body_text()),
            "",
        )),
    }
}

/// POST /api/predict/
pub async fn predict_handler(
    State(state): State<ServerState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Response {
    // Untrained is reported before the inputs are looked at.
    if !state.service.model_state().await.is_trained() {
        return error_response(ServiceError::ModelNotTrained, "");
    }

    let body = match json_body(payload) {
        Ok(body) => body,
        Err(resp) => return resp,
    };

    let inputs = coerce_f64("years", body.get("years"))
        .and_then(|years| coerce_i64("level", body.get("level")).map(|level| (years, level)));
    let (years, level) = match inputs {
        Ok(inputs) => inputs,
        Err(e) => return error_response(e, "Invalid input"),
    };

    match state.service.predict(years, level).await {
        Ok(prediction) => {
            let symbol = &state.display.currency_symbol;
            let response = PredictResponse {
                yearly: format_amount(symbol, prediction.yearly),
                monthly: format_amount(symbol, prediction.monthly),
                raw: prediction.yearly,
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => error_response(e, "An unexpected error occurred"),
    }
}

/// POST /api/train/ - add one observation
pub async fn add_observation_handler(
    State(state): State<ServerState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Response {
    let body = match json_body(payload) {
        Ok(body) => body,
        Err(resp) => return resp,
    };

    let obs = match NewObservation::from_fields(
        body.get("years"),
        body.get("level"),
        body.get("salary"),
    ) {
        Ok(obs) => obs,
        Err(e) => return error_response(e, "Could not add data"),
    };

    match state.service.add_observation(obs).await {
        Ok(created) => (
            StatusCode::OK,
            Json(json!({ "message": "Success", "id": created.id })),
        )
            .into_response(),
        Err(e) => error_response(e, "Could not add data"),
    }
}

/// POST /api/delete/
pub async fn delete_observation_handler(
    State(state): State<ServerState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Response {
    let body = match json_body(payload) {
        Ok(body) => body,
        Err(resp) => return resp,
    };

    let id = match coerce_i64("id", body.get("id")) {
        Ok(id) => id,
        Err(e) => return error_response(e, "An unexpected error occurred"),
    };

    match state.service.delete_observation(id).await {
        Ok(()) => (StatusCode::OK, Json(json!({ "message": "Deleted" }))).into_response(),
        Err(e) => error_response(e, "An unexpected error occurred"),
    }
}

/// POST /api/reset/
pub async fn reset_handler(State(state): State<ServerState>) -> Response {
    match state.service.reset().await {
        Ok(()) => (StatusCode::OK, Json(json!({ "message": "Defaults Loaded" }))).into_response(),
        Err(e) => error_response(e, "An error occurred while resetting data"),
    }
}

/// POST /api/delete-all/
pub async fn delete_all_handler(State(state): State<ServerState>) -> Response {
    match state.service.delete_all().await {
        Ok(count) => (
            StatusCode::OK,
            Json(json!({
                "message": format!("Deleted all {} data points", count),
                "count": count,
            })),
        )
            .into_response(),
        Err(e) => error_response(e, "An error occurred while deleting data"),
    }
}

/// GET /api/training-stats/
pub async fn training_stats_handler(State(state): State<ServerState>) -> Response {
    match state.service.stats().await {
        Ok(stats) => (StatusCode::OK, Json(stats)).into_response(),
        Err(e) => error_response(e, "An error occurred while fetching stats"),
    }
}

/// GET /api/observations/ - dataset ordered by years
pub async fn observations_handler(State(state): State<ServerState>) -> Response {
    match state.service.observations().await {
        Ok(rows) => (StatusCode::OK, Json::<Vec<Observation>>(rows)).into_response(),
        Err(e) => error_response(e, "An error occurred while listing data"),
    }
}

/// GET /api/status/
pub async fn status_handler(State(state): State<ServerState>) -> Response {
    let data_points = match state.service.stats().await {
        Ok(stats) => stats.data_points,
        Err(e) => return error_response(e, "An error occurred while fetching status"),
    };

    let response = StatusResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        trained: state.service.model_state().await.is_trained(),
        data_points,
    };

    (StatusCode::OK, Json(response)).into_response()
}
