/// Cross-origin access to model files
///
/// Only `GET /files/<id>` is ever exposed cross-origin. The policy comes from
/// `--allow-cors`: a comma-separated list of origins (bare hosts are taken
/// as `https://`), or `*` for any origin. An allowed origin is echoed back
/// in `access-control-allow-origin`.
use axum::http::HeaderValue;
use tower_http::cors::{AllowOrigin, CorsLayer};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CorsPolicy {
    #[default]
    Disabled,
    AnyOrigin,
    Origins(Vec<String>),
}

impl CorsPolicy {
    pub fn parse(raw: Option<&str>) -> Self {
        let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
            return CorsPolicy::Disabled;
        };
        if raw == "*" {
            return CorsPolicy::AnyOrigin;
        }

        let origins = raw
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(full_origin)
            .collect();
        CorsPolicy::Origins(origins)
    }

    pub fn allows(&self, origin: &str) -> bool {
        match self {
            CorsPolicy::Disabled => false,
            CorsPolicy::AnyOrigin => true,
            CorsPolicy::Origins(origins) => origins.iter().any(|o| o == origin),
        }
    }

    /// Layer for the file route; `None` when cross-origin access is off
    pub fn layer(&self) -> Option<CorsLayer> {
        if *self == CorsPolicy::Disabled {
            return None;
        }
        let policy = self.clone();
        let allow = AllowOrigin::predicate(move |origin: &HeaderValue, _| {
            origin.to_str().map(|o| policy.allows(o)).unwrap_or(false)
        });
        Some(CorsLayer::new().allow_origin(allow))
    }
}

fn full_origin(origin: &str) -> String {
    if origin.starts_with("http") {
        origin.to_string()
    } else {
        format!("https://{}", origin)
    }
}
