//! CORS policy.
//!
//! Preflight `OPTIONS` requests are answered by the layer for every
//! registered path; actual requests get the allow/expose headers appended.

use std::time::Duration;

use axum::http::{HeaderName, HeaderValue, Method};
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::config::CorsConfig;
use crate::http::server::ServerError;

pub fn cors_layer(config: &CorsConfig) -> Result<CorsLayer, ServerError> {
    let origin = if config.allow_origins.iter().any(|o| o == "*") {
        AllowOrigin::any()
    } else {
        let origins = config
            .allow_origins
            .iter()
            .map(|o| {
                HeaderValue::from_str(o).map_err(|_| ServerError::Cors(format!("origin '{o}'")))
            })
            .collect::<Result<Vec<_>, _>>()?;
        AllowOrigin::list(origins)
    };

    let methods = config
        .allow_methods
        .iter()
        .map(|m| {
            Method::from_bytes(m.trim().to_ascii_uppercase().as_bytes())
                .map_err(|_| ServerError::Cors(format!("method '{m}'")))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods(methods)
        .allow_headers(header_names(&config.allow_headers)?)
        .expose_headers(header_names(&config.expose_headers)?)
        .max_age(Duration::from_secs(config.max_age_secs)))
}

fn header_names(names: &[String]) -> Result<Vec<HeaderName>, ServerError> {
    names
        .iter()
        .map(|h| {
            HeaderName::from_bytes(h.trim().as_bytes())
                .map_err(|_| ServerError::Cors(format!("header '{h}'")))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy_builds() {
        assert!(cors_layer(&CorsConfig::default()).is_ok());
    }

    #[test]
    fn test_origin_list() {
        let config = CorsConfig {
            allow_origins: vec!["https://example.com".into()],
            ..CorsConfig::default()
        };
        assert!(cors_layer(&config).is_ok());
    }

    #[test]
    fn test_invalid_header_rejected() {
        let config = CorsConfig {
            allow_headers: vec!["bad header".into()],
            ..CorsConfig::default()
        };
        assert!(matches!(cors_layer(&config), Err(ServerError::Cors(_))));
    }
}
