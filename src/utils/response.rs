use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::Value;

/// Envelope for every successful reply from the station API.
#[derive(Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    pub message: String,
}

#[derive(Serialize)]
pub struct ApiErrorBody {
    pub code: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

#[derive(Serialize)]
pub struct ApiErrorResponse {
    pub success: bool,
    pub error: ApiErrorBody,
}

fn reply<T: Serialize>(data: Option<T>, message: String) -> Response {
    let body = ApiResponse {
        success: true,
        data,
        message,
    };
    (StatusCode::OK, Json(body)).into_response()
}

pub fn success<T: Serialize>(data: T, message: impl Into<String>) -> Response {
    reply(Some(data), message.into())
}

pub fn empty_success(message: impl Into<String>) -> Response {
    reply(None::<()>, message.into())
}

pub fn error(
    code: &'static str,
    message: String,
    details: Option<Value>,
    status: StatusCode,
) -> Response {
    let body = ApiErrorResponse {
        success: false,
        error: ApiErrorBody {
            code,
            message,
            details,
        },
    };

    (status, Json(body)).into_response()
}
