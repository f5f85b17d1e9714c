use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use postbox_core::AppError;
use serde::Serialize;
use ts_rs::TS;

/// API error payload.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../web/src/lib/api/generated/error-response.ts"
)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

/// HTTP API error wrapper around core application errors.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(value: AppError) -> Self {
        Self(value)
    }
}

/// Status code for an application error, shared between the generic error
/// responder and the contact pipeline's dispatch mapping.
pub fn status_code(error: &AppError) -> StatusCode {
    match error {
        AppError::Validation(_) | AppError::Envelope(_) => StatusCode::BAD_REQUEST,
        AppError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
        AppError::ProviderAuth(_)
        | AppError::Dispatch(_)
        | AppError::Configuration(_)
        | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_code(&self.0);

        let payload = Json(ErrorResponse {
            success: false,
            error: self.0.to_string(),
        });

        (status, payload).into_response()
    }
}

/// Standard API result type.
pub type ApiResult<T> = Result<T, ApiError>;
