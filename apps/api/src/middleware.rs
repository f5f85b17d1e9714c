use axum::extract::{Request, State};
use axum::http::{HeaderValue, Method, StatusCode, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::state::AppState;

/// Origin allow-list for browser clients.
///
/// An origin on the list, or one matching the preview-deployment suffix,
/// is echoed back in `Access-Control-Allow-Origin`. Everything else falls
/// back to the canonical origin rather than leaving the header off, so a
/// misconfigured client fails loudly in the browser instead of silently.
#[derive(Debug, Clone)]
pub struct CorsPolicy {
    allowed_origins: Vec<String>,
    preview_origin_suffix: Option<String>,
    canonical_origin: String,
}

impl CorsPolicy {
    pub fn new(
        allowed_origins: Vec<String>,
        preview_origin_suffix: Option<String>,
        canonical_origin: String,
    ) -> Self {
        Self {
            allowed_origins,
            preview_origin_suffix,
            canonical_origin,
        }
    }

    /// The origin value to answer with for a request from `origin`.
    pub fn resolve_origin<'a>(&'a self, origin: &'a str) -> &'a str {
        if self.allowed_origins.iter().any(|allowed| allowed == origin) {
            return origin;
        }

        let preview_match = self.preview_origin_suffix.as_deref().is_some_and(|suffix| {
            origin.starts_with("https://") && origin.ends_with(suffix)
        });
        if preview_match {
            return origin;
        }

        &self.canonical_origin
    }
}

pub async fn cors(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let origin = request
        .headers()
        .get(header::ORIGIN)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_owned();
    let allow_origin = state.cors.resolve_origin(&origin).to_owned();

    let mut response = if request.method() == Method::OPTIONS {
        // Preflight is answered here with no body.
        StatusCode::OK.into_response()
    } else {
        next.run(request).await
    };

    let headers = response.headers_mut();
    if let Ok(value) = HeaderValue::from_str(&allow_origin) {
        headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, value);
    }
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("POST, OPTIONS, GET"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Content-Type, Authorization, X-CSRF-Token"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_CREDENTIALS,
        HeaderValue::from_static("true"),
    );
    headers.insert(
        header::ACCESS_CONTROL_MAX_AGE,
        HeaderValue::from_static("86400"),
    );

    response
}

#[cfg(test)]
mod tests {
    use super::CorsPolicy;

    fn policy() -> CorsPolicy {
        CorsPolicy::new(
            vec![
                "http://localhost:3000".to_owned(),
                "https://portfolio.example".to_owned(),
            ],
            Some("-preview.portfolio.example".to_owned()),
            "https://portfolio.example".to_owned(),
        )
    }

    #[test]
    fn listed_origins_are_echoed_back() {
        let policy = policy();
        assert_eq!(
            policy.resolve_origin("http://localhost:3000"),
            "http://localhost:3000"
        );
    }

    #[test]
    fn preview_origins_match_by_suffix_over_https_only() {
        let policy = policy();
        assert_eq!(
            policy.resolve_origin("https://pr-42-preview.portfolio.example"),
            "https://pr-42-preview.portfolio.example"
        );
        assert_eq!(
            policy.resolve_origin("http://pr-42-preview.portfolio.example"),
            "https://portfolio.example"
        );
    }

    #[test]
    fn unknown_origins_fall_back_to_the_canonical_origin() {
        let policy = policy();
        assert_eq!(
            policy.resolve_origin("https://evil.example"),
            "https://portfolio.example"
        );
        assert_eq!(policy.resolve_origin(""), "https://portfolio.example");
    }
}
