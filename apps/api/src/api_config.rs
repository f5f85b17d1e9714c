use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use postbox_core::AppError;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone)]
pub struct SmtpRuntimeConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub enum MailProviderConfig {
    Console,
    Smtp(SmtpRuntimeConfig),
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub api_host: String,
    pub api_port: u16,
    pub mail_provider: MailProviderConfig,
    pub from_address: String,
    pub to_address: String,
    pub allowed_origins: Vec<String>,
    pub preview_origin_suffix: Option<String>,
    pub canonical_origin: String,
    pub rate_limit_max_requests: u32,
    pub rate_limit_window_seconds: i64,
    pub expose_error_detail: bool,
}

impl ApiConfig {
    pub fn load() -> Result<Self, AppError> {
        let api_host = env::var("API_HOST").unwrap_or_else(|_| "127.0.0.1".to_owned());
        let api_port = env::var("API_PORT")
            .ok()
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(3001);

        let mail_provider = match env::var("MAIL_PROVIDER")
            .unwrap_or_else(|_| "console".to_owned())
            .as_str()
        {
            "console" => MailProviderConfig::Console,
            "smtp" => {
                let port = required_non_empty_env("SMTP_PORT")?
                    .parse::<u16>()
                    .map_err(|error| {
                        AppError::Configuration(format!("invalid SMTP_PORT: {error}"))
                    })?;
                MailProviderConfig::Smtp(SmtpRuntimeConfig {
                    host: required_non_empty_env("SMTP_HOST")?,
                    port,
                    username: required_non_empty_env("SMTP_USERNAME")?,
                    password: required_non_empty_env("SMTP_PASSWORD")?,
                })
            }
            other => {
                return Err(AppError::Configuration(format!(
                    "MAIL_PROVIDER must be either 'console' or 'smtp', got '{other}'"
                )));
            }
        };

        let from_address = required_non_empty_env("MAIL_FROM_ADDRESS")?;
        let to_address = required_non_empty_env("MAIL_TO_ADDRESS")?;

        let allowed_origins: Vec<String> = env::var("ALLOWED_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:3000".to_owned())
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(ToOwned::to_owned)
            .collect();
        if allowed_origins.is_empty() {
            return Err(AppError::Configuration(
                "ALLOWED_ORIGINS must name at least one origin".to_owned(),
            ));
        }

        let preview_origin_suffix = env::var("PREVIEW_ORIGIN_SUFFIX")
            .ok()
            .filter(|value| !value.trim().is_empty());

        let canonical_origin =
            env::var("CANONICAL_ORIGIN").unwrap_or_else(|_| allowed_origins[0].clone());

        let rate_limit_max_requests = env::var("RATE_LIMIT_MAX_REQUESTS")
            .ok()
            .and_then(|value| value.parse::<u32>().ok())
            .unwrap_or(5);
        let rate_limit_window_seconds = env::var("RATE_LIMIT_WINDOW_SECONDS")
            .ok()
            .and_then(|value| value.parse::<i64>().ok())
            .unwrap_or(15 * 60);

        let expose_error_detail = !env::var("APP_ENV")
            .unwrap_or_else(|_| "development".to_owned())
            .eq_ignore_ascii_case("production");

        Ok(Self {
            api_host,
            api_port,
            mail_provider,
            from_address,
            to_address,
            allowed_origins,
            preview_origin_suffix,
            canonical_origin,
            rate_limit_max_requests,
            rate_limit_window_seconds,
            expose_error_detail,
        })
    }

    pub fn socket_address(&self) -> Result<SocketAddr, AppError> {
        let host = IpAddr::from_str(&self.api_host).map_err(|error| {
            AppError::Configuration(format!("invalid API_HOST '{}': {error}", self.api_host))
        })?;
        Ok(SocketAddr::from((host, self.api_port)))
    }
}

pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn required_env(name: &str) -> Result<String, AppError> {
    env::var(name).map_err(|_| AppError::Configuration(format!("{name} is required")))
}

fn required_non_empty_env(name: &str) -> Result<String, AppError> {
    let value = required_env(name)?;
    if value.trim().is_empty() {
        return Err(AppError::Configuration(format!("{name} must not be empty")));
    }

    Ok(value)
}
