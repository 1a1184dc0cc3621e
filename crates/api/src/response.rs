//! Success envelopes.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::ApiError;

/// Result type for handlers.
pub type ApiResult<T = Response> = Result<T, ApiError>;

/// Success body: `{"success": true, "data": ...}`.
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    /// Always `true`.
    pub success: bool,
    /// Payload.
    pub data: T,
}

/// 200 with `data`.
pub fn ok<T: Serialize>(data: T) -> ApiResult {
    Ok(respond(StatusCode::OK, data))
}

/// 201 with the created resource.
pub fn created<T: Serialize>(data: T) -> ApiResult {
    Ok(respond(StatusCode::CREATED, data))
}

/// 200 with `"data": null`, used for deletes.
pub fn deleted() -> ApiResult {
    Ok(respond(StatusCode::OK, ()))
}

fn respond<T: Serialize>(status: StatusCode, data: T) -> Response {
    (status, Json(Envelope { success: true, data })).into_response()
}
