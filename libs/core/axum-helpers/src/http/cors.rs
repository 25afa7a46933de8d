use axum::http::{HeaderName, HeaderValue, Method, header};
use core_config::{ConfigError, env_required};
use std::time::Duration;
use tower_http::cors::{AllowOrigin, CorsLayer};

/// Request header carrying the caller's preferred IANA time zone
pub const TIME_ZONE_HEADER: &str = "x-time-zone";

/// Creates a CORS layer for bearer-token API services.
///
/// - Allowed origins as given
/// - GET, POST, PATCH, DELETE, OPTIONS
/// - Content-Type, Authorization, Accept and X-Time-Zone request headers
/// - Content-Language exposed to scripts
/// - No credentials; tokens travel in the Authorization header
/// - 1 hour max age
pub fn create_cors_layer(allowed_origins: Vec<HeaderValue>) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed_origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT,
            HeaderName::from_static(TIME_ZONE_HEADER),
        ])
        .expose_headers([header::CONTENT_LANGUAGE])
        .max_age(Duration::from_secs(3600))
}

/// Build the CORS layer from `CORS_ALLOWED_ORIGIN` (comma-separated, required)
pub fn cors_layer_from_env() -> Result<CorsLayer, ConfigError> {
    let raw = env_required("CORS_ALLOWED_ORIGIN")?;
    let origins = parse_origins(&raw)?;
    tracing::info!(origins = %raw, "CORS configured");
    Ok(create_cors_layer(origins))
}

fn parse_origins(raw: &str) -> Result<Vec<HeaderValue>, ConfigError> {
    let origins = raw
        .split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(|origin| {
            HeaderValue::from_str(origin).map_err(|e| ConfigError::ParseError {
                key: "CORS_ALLOWED_ORIGIN".to_string(),
                details: format!("{}: {}", origin, e),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    if origins.is_empty() {
        return Err(ConfigError::ParseError {
            key: "CORS_ALLOWED_ORIGIN".to_string(),
            details: "at least one origin is required".to_string(),
        });
    }
    Ok(origins)
}
