//! CORS policy for the organization portals.
//!
//! `*` in the origin or header list opens that dimension completely. Entries
//! that are not valid header values are skipped with a warning, so one bad
//! entry does not lock every portal out.

use crate::domain::config::CorsConfig;
use axum::http::{HeaderName, HeaderValue, Method};
use std::str::FromStr;
use std::time::Duration;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tracing::warn;

const WILDCARD: &str = "*";

/// Build the CORS layer for a gateway.
pub fn create_cors_layer(config: &CorsConfig) -> CorsLayer {
    if !config.enabled {
        return CorsLayer::very_permissive();
    }
    CorsLayer::new()
        .allow_origin(origins(&config.allowed_origins))
        .allow_methods(AllowMethods::list(parse_entries::<Method>(
            "method",
            &config.allowed_methods,
        )))
        .allow_headers(headers(&config.allowed_headers))
        .max_age(Duration::from_secs(config.max_age))
}

fn origins(entries: &[String]) -> AllowOrigin {
    if entries.iter().any(|o| o == WILDCARD) {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(parse_entries::<HeaderValue>("origin", entries))
    }
}

fn headers(entries: &[String]) -> AllowHeaders {
    if entries.iter().any(|h| h == WILDCARD) {
        AllowHeaders::any()
    } else {
        AllowHeaders::list(parse_entries::<HeaderName>("header", entries))
    }
}

fn parse_entries<T: FromStr>(kind: &'static str, entries: &[String]) -> Vec<T> {
    entries
        .iter()
        .filter_map(|entry| {
            let parsed = entry.parse().ok();
            if parsed.is_none() {
                warn!(kind, entry = %entry, "ignoring unparsable CORS entry");
            }
            parsed
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use axum::routing::post;
    use axum::Router;
    use tower::ServiceExt;

    fn preflight(origin: &str) -> Request<Body> {
        Request::builder()
            .method(Method::OPTIONS)
            .uri("/api/create")
            .header(header::ORIGIN, origin)
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .body(Body::empty())
            .unwrap()
    }

    fn app(config: &CorsConfig) -> Router {
        Router::new()
            .route("/api/create", post(|| async { "ok" }))
            .layer(create_cors_layer(config))
    }

    #[tokio::test]
    async fn test_wildcard_origin() {
        let response = app(&CorsConfig::default())
            .oneshot(preflight("https://portal.example.org"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "*"
        );
        assert_eq!(response.headers()[header::ACCESS_CONTROL_MAX_AGE], "3600");
    }

    #[tokio::test]
    async fn test_specific_origins() {
        let config = CorsConfig {
            allowed_origins: vec!["https://pc.example.org".to_string()],
            ..CorsConfig::default()
        };

        let allowed = app(&config)
            .oneshot(preflight("https://pc.example.org"))
            .await
            .unwrap();
        assert_eq!(
            allowed.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "https://pc.example.org"
        );

        let refused = app(&config)
            .oneshot(preflight("https://elsewhere.example.org"))
            .await
            .unwrap();
        assert!(refused
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .is_none());
    }

    #[tokio::test]
    async fn test_unparsable_origin_is_skipped() {
        let config = CorsConfig {
            allowed_origins: vec![
                "https://bad\norigin".to_string(),
                "https://saaq.example.org".to_string(),
            ],
            ..CorsConfig::default()
        };
        let response = app(&config)
            .oneshot(preflight("https://saaq.example.org"))
            .await
            .unwrap();
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "https://saaq.example.org"
        );
    }

    #[test]
    fn test_parse_entries_keeps_valid_ones() {
        let methods: Vec<Method> =
            parse_entries("method", &["POST".to_string(), "BAD METHOD".to_string()]);
        assert_eq!(methods, vec![Method::POST]);
    }

    #[tokio::test]
    async fn test_disabled_cors_is_permissive() {
        let config = CorsConfig {
            enabled: false,
            allowed_origins: Vec::new(),
            ..CorsConfig::default()
        };
        let response = app(&config)
            .oneshot(preflight("https://anyone.example.org"))
            .await
            .unwrap();
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "https://anyone.example.org"
        );
    }
}
