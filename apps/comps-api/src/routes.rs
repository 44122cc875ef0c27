use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::state::AppState;
use comps_engine::{ComparablesResponse, Error as EngineError};

pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(health))
		.route("/v1/comparables", post(comparables))
		.with_state(state)
}

async fn health() -> StatusCode {
	StatusCode::OK
}

#[derive(Debug, Deserialize)]
struct ComparablesRequest {
	reference: String,
	target_count: Option<usize>,
}

async fn comparables(
	State(state): State<AppState>,
	Json(payload): Json<ComparablesRequest>,
) -> Result<Json<ComparablesResponse>, ApiError> {
	let Some(subject) = state.engine.catalog.get(&payload.reference).cloned() else {
		return Err(json_error(
			StatusCode::NOT_FOUND,
			"unknown_reference",
			format!("No listing with reference {}.", payload.reference),
		));
	};
	let response = state.engine.find_comparables(&subject, payload.target_count).await?;

	Ok(Json(response))
}

#[derive(Debug, Serialize)]
struct ErrorBody {
	error_code: String,
	message: String,
}

#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	error_code: String,
	message: String,
}

fn json_error(status: StatusCode, code: &str, message: impl Into<String>) -> ApiError {
	ApiError { status, error_code: code.to_string(), message: message.into() }
}

impl From<EngineError> for ApiError {
	fn from(err: EngineError) -> Self {
		match &err {
			EngineError::InvalidRequest { .. } =>
				json_error(StatusCode::BAD_REQUEST, "invalid_request", err.to_string()),
			EngineError::Provider { .. } =>
				json_error(StatusCode::BAD_GATEWAY, "provider_error", err.to_string()),
			EngineError::Storage { .. } =>
				json_error(StatusCode::INTERNAL_SERVER_ERROR, "storage_error", err.to_string()),
			EngineError::CatalogUnavailable { .. } =>
				json_error(StatusCode::SERVICE_UNAVAILABLE, "catalog_unavailable", err.to_string()),
		}
	}
}

impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let body = ErrorBody { error_code: self.error_code, message: self.message };

		(self.status, Json(body)).into_response()
	}
}
