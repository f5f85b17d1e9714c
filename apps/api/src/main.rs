//! Postbox API composition root.

#![forbid(unsafe_code)]

mod api_config;
mod dto;
mod error;
mod handlers;
mod middleware;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post};
use postbox_application::{ContactMailer, MailTransport, RateLimitRule, RateLimitService};
use postbox_core::AppError;
use postbox_infrastructure::{
    ConsoleMailTransport, InMemoryRateLimitStore, SmtpMailConfig, SmtpMailTransport,
};
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

use crate::api_config::{ApiConfig, MailProviderConfig};
use crate::middleware::CorsPolicy;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    api_config::init_tracing();

    let config = ApiConfig::load()?;

    let rate_limit_store = Arc::new(InMemoryRateLimitStore::new());
    let rate_limit_service = RateLimitService::new(
        rate_limit_store,
        RateLimitRule::new(
            config.rate_limit_max_requests,
            config.rate_limit_window_seconds,
        ),
    );

    let mail_transport: Arc<dyn MailTransport> = match &config.mail_provider {
        MailProviderConfig::Console => Arc::new(ConsoleMailTransport::new()),
        MailProviderConfig::Smtp(smtp) => Arc::new(SmtpMailTransport::new(SmtpMailConfig {
            host: smtp.host.clone(),
            port: smtp.port,
            username: smtp.username.clone(),
            password: smtp.password.clone(),
        })),
    };
    let contact_mailer = ContactMailer::new(
        mail_transport,
        config.from_address.clone(),
        config.to_address.clone(),
    );

    let cors = Arc::new(CorsPolicy::new(
        config.allowed_origins.clone(),
        config.preview_origin_suffix.clone(),
        config.canonical_origin.clone(),
    ));

    let app_state = AppState {
        rate_limit_service: rate_limit_service.clone(),
        contact_mailer,
        cors,
        expose_error_detail: config.expose_error_detail,
    };

    spawn_rate_limit_sweeper(rate_limit_service, config.rate_limit_window_seconds);

    let app = Router::new()
        .route("/health", get(handlers::health::health_handler))
        .route(
            "/api/contact",
            post(handlers::contact::submit_contact_handler)
                .fallback(handlers::contact::method_not_allowed_handler),
        )
        .layer(from_fn_with_state(app_state.clone(), middleware::cors))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state);

    let address = config.socket_address()?;
    let listener = tokio::net::TcpListener::bind(address)
        .await
        .map_err(|error| AppError::Internal(format!("failed to bind listener: {error}")))?;

    info!(%address, "postbox-api listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .map_err(|error| AppError::Internal(format!("api server error: {error}")))
}

/// Periodically evicts expired rate limit records so the in-memory store
/// does not grow with every identifier ever seen.
fn spawn_rate_limit_sweeper(service: RateLimitService, window_seconds: i64) {
    let period = Duration::from_secs(u64::try_from(window_seconds).unwrap_or(900).max(60));

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        // The first tick completes immediately; skip it.
        ticker.tick().await;

        loop {
            ticker.tick().await;
            match service.sweep().await {
                Ok(0) => {}
                Ok(removed) => debug!(removed, "removed expired rate limit records"),
                Err(error) => warn!(%error, "rate limit sweep failed"),
            }
        }
    });
}
