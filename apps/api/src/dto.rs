use std::collections::BTreeMap;

use serde::Serialize;
use ts_rs::TS;

/// Health response payload.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../web/src/lib/api/generated/health-response.ts"
)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Successful contact submission response.
#[derive(Debug, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../web/src/lib/api/generated/contact-success-response.ts"
)]
pub struct ContactSuccessResponse {
    pub success: bool,
    pub message: String,
    pub message_id: String,
    /// RFC 3339 timestamp of when the submission was relayed.
    pub timestamp: String,
}

/// Failed contact submission response. Which optional fields are present
/// depends on the failure: `errors` for validation, `reset` for rate
/// limiting, `detail` for dispatch failures outside production.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../web/src/lib/api/generated/contact-failure-response.ts"
)]
pub struct ContactFailureResponse {
    pub success: bool,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reset: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ContactFailureResponse {
    /// A failure body with only the `error` message set.
    #[must_use]
    pub fn message_only(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
            errors: None,
            reset: None,
            detail: None,
        }
    }
}
