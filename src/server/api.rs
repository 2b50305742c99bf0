//! API route definitions

use std::sync::Arc;
use axum::{
    http::{request::Parts, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use super::error::ServerError;
use super::{handlers, state::AppState, CorsOrigins, ServerConfig};

async fn handle_404() -> ServerError {
    ServerError::NotFound("Not found. Available endpoints: POST /predict, GET /health".to_string())
}

async fn handle_405() -> ServerError {
    ServerError::MethodNotAllowed("Method not allowed for this endpoint".to_string())
}

/// Create the application router
pub fn create_router(state: Arc<AppState>, config: &ServerConfig) -> Router {
    Router::new()
        .route("/predict", post(handlers::predict))
        .route("/health", get(handlers::health_check))
        .fallback(handle_404)
        .method_not_allowed_fallback(handle_405)
        .with_state(state)
        .layer(cors_layer(&config.cors_origins))
        .layer(TraceLayer::new_for_http())
}

fn cors_layer(origins: &CorsOrigins) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    match origins {
        CorsOrigins::Any => layer.allow_origin(Any),
        CorsOrigins::List(patterns) => {
            let patterns = patterns.clone();
            layer.allow_origin(AllowOrigin::predicate(
                move |origin: &HeaderValue, _parts: &Parts| {
                    origin
                        .to_str()
                        .map(|o| patterns.iter().any(|p| origin_matches(p, o)))
                        .unwrap_or(false)
                },
            ))
        }
    }
}

/// Match an origin against an exact origin or a pattern with one `*`.
///
/// The wildcard stands for one or more host characters and never spans a
/// `/`, so `https://*.vercel.app` matches `https://app.vercel.app` but not
/// `https://vercel.app` or `http://app.vercel.app`.
pub fn origin_matches(pattern: &str, origin: &str) -> bool {
    match pattern.split_once('*') {
        None => pattern == origin,
        Some((prefix, suffix)) => {
            if suffix.contains('*') || origin.len() <= prefix.len() + suffix.len() {
                return false;
            }
            if !origin.starts_with(prefix) || !origin.ends_with(suffix) {
                return false;
            }
            let middle = &origin[prefix.len()..origin.len() - suffix.len()];
            !middle.contains('/')
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_origin() {
        assert!(origin_matches("http://localhost:3000", "http://localhost:3000"));
        assert!(!origin_matches("http://localhost:3000", "http://localhost:3001"));
    }

    #[test]
    fn test_wildcard_origin() {
        let pattern = "https://*.vercel.app";
        assert!(origin_matches(pattern, "https://agri-aid.vercel.app"));
        assert!(origin_matches(pattern, "https://a.b.vercel.app"));
        assert!(!origin_matches(pattern, "https://vercel.app"));
        assert!(!origin_matches(pattern, "https://.vercel.app"));
        assert!(!origin_matches(pattern, "http://agri-aid.vercel.app"));
        assert!(!origin_matches(pattern, "https://evil.com/x.vercel.app"));
        assert!(!origin_matches(pattern, "https://agri-aid.vercel.app.evil.com"));
    }
}
