//! Contact submission pipeline: identifier resolution, rate limiting,
//! validation, dispatch, and response mapping.

use std::net::SocketAddr;

use axum::Json;
use axum::body::to_bytes;
use axum::extract::connect_info::ConnectInfo;
use axum::extract::{Request, State};
use axum::http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode, header};
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use postbox_application::{DispatchReceipt, RateLimitDecision};
use postbox_core::AppError;
use postbox_domain::{ContactSubmission, RawContactRequest, ValidationErrors};
use tracing::{info, warn};

use crate::dto::{ContactFailureResponse, ContactSuccessResponse};
use crate::error::{ApiResult, status_code};
use crate::state::AppState;

const MAX_BODY_BYTES: usize = 64 * 1024;

const HEADER_RATE_LIMIT: HeaderName = HeaderName::from_static("x-ratelimit-limit");
const HEADER_RATE_REMAINING: HeaderName = HeaderName::from_static("x-ratelimit-remaining");
const HEADER_RATE_RESET: HeaderName = HeaderName::from_static("x-ratelimit-reset");

/// `POST /api/contact`. One outbound email is attempted per validated,
/// rate-permitted request; dispatch failures are not retried.
pub async fn submit_contact_handler(
    State(state): State<AppState>,
    request: Request,
) -> ApiResult<Response> {
    let identifier = client_identifier(
        request.headers(),
        request.extensions().get::<ConnectInfo<SocketAddr>>(),
    );

    let decision = state.rate_limit_service.check(&identifier).await?;
    let limit = state.rate_limit_service.rule().max_requests;

    if !decision.allowed {
        info!(%identifier, "contact submission rate limited");
        return Ok(rate_limited_response(limit, &decision));
    }

    let submission = match parse_submission(request).await {
        Ok(submission) => submission,
        Err(errors) => return Ok(validation_failure_response(limit, &decision, errors)),
    };

    match state.contact_mailer.send_contact_email(&submission).await {
        Ok(receipt) => {
            info!(message_id = %receipt.message_id, "contact email relayed");
            Ok(success_response(limit, &decision, &receipt))
        }
        Err(error) => {
            warn!(%error, "contact email dispatch failed");
            Ok(dispatch_failure_response(&state, limit, &decision, &error))
        }
    }
}

/// Fallback for every non-POST method on `/api/contact`.
pub async fn method_not_allowed_handler(method: Method) -> Response {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        [(header::ALLOW, HeaderValue::from_static("POST"))],
        Json(ContactFailureResponse::message_only(format!(
            "Method {method} Not Allowed"
        ))),
    )
        .into_response()
}

/// Rate-limit identifier: trusted proxy header first, then the peer
/// address, then a shared bucket for clients with neither.
fn client_identifier(headers: &HeaderMap, peer: Option<&ConnectInfo<SocketAddr>>) -> String {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|value| !value.is_empty());

    if let Some(address) = forwarded {
        return address.to_owned();
    }

    peer.map_or_else(|| "unknown".to_owned(), |info| info.0.ip().to_string())
}

/// Reads and validates the request body into a typed submission. Nothing
/// untyped passes this boundary; an unreadable or non-object body becomes
/// a single general validation error.
async fn parse_submission(request: Request) -> Result<ContactSubmission, ValidationErrors> {
    let bytes = to_bytes(request.into_body(), MAX_BODY_BYTES)
        .await
        .map_err(|_| ValidationErrors::general("Invalid form data"))?;

    let raw: RawContactRequest = serde_json::from_slice(&bytes)
        .map_err(|_| ValidationErrors::general("Invalid form data"))?;

    ContactSubmission::validate(&raw)
}

fn success_response(
    limit: u32,
    decision: &RateLimitDecision,
    receipt: &DispatchReceipt,
) -> Response {
    let response = (
        StatusCode::OK,
        Json(ContactSuccessResponse {
            success: true,
            message: "Email sent successfully".to_owned(),
            message_id: receipt.message_id.clone(),
            timestamp: Utc::now().to_rfc3339(),
        }),
    )
        .into_response();

    with_rate_limit_headers(response, limit, decision)
}

fn validation_failure_response(
    limit: u32,
    decision: &RateLimitDecision,
    errors: ValidationErrors,
) -> Response {
    let response = (
        StatusCode::BAD_REQUEST,
        Json(ContactFailureResponse {
            success: false,
            error: "Validation failed".to_owned(),
            errors: Some(errors.into_map()),
            reset: None,
            detail: None,
        }),
    )
        .into_response();

    with_rate_limit_headers(response, limit, decision)
}

fn rate_limited_response(limit: u32, decision: &RateLimitDecision) -> Response {
    let response = (
        StatusCode::TOO_MANY_REQUESTS,
        Json(ContactFailureResponse {
            success: false,
            error: "Too many requests, please try again later".to_owned(),
            errors: None,
            reset: Some(decision.reset_at.to_rfc3339()),
            detail: None,
        }),
    )
        .into_response();

    with_rate_limit_headers(response, limit, decision)
}

fn dispatch_failure_response(
    state: &AppState,
    limit: u32,
    decision: &RateLimitDecision,
    error: &AppError,
) -> Response {
    let message = match error {
        AppError::ProviderAuth(_) => "Email authentication failed. Check your credentials.",
        AppError::Envelope(_) => "Invalid email address provided.",
        _ => "Failed to send email",
    };

    let detail = state
        .expose_error_detail
        .then(|| error.to_string());

    let response = (
        status_code(error),
        Json(ContactFailureResponse {
            success: false,
            error: message.to_owned(),
            errors: None,
            reset: None,
            detail,
        }),
    )
        .into_response();

    with_rate_limit_headers(response, limit, decision)
}

fn with_rate_limit_headers(
    mut response: Response,
    limit: u32,
    decision: &RateLimitDecision,
) -> Response {
    let headers = response.headers_mut();

    if let Ok(value) = HeaderValue::from_str(&limit.to_string()) {
        headers.insert(HEADER_RATE_LIMIT, value);
    }
    if let Ok(value) = HeaderValue::from_str(&decision.remaining.to_string()) {
        headers.insert(HEADER_RATE_REMAINING, value);
    }
    if let Ok(value) = HeaderValue::from_str(&decision.reset_at.to_rfc3339()) {
        headers.insert(HEADER_RATE_RESET, value);
    }

    response
}
