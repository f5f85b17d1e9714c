use std::sync::Arc;

use postbox_application::{ContactMailer, RateLimitService};

use crate::middleware::CorsPolicy;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub rate_limit_service: RateLimitService,
    pub contact_mailer: ContactMailer,
    pub cors: Arc<CorsPolicy>,
    pub expose_error_detail: bool,
}
