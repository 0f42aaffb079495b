use actix_cors::Cors;
use actix_web::{http, middleware::DefaultHeaders};

const CONTENT_SECURITY_POLICY: &str = "default-src 'self';base-uri 'self';font-src 'self' https: data:;\
form-action 'self';frame-ancestors 'self';img-src 'self' data:;object-src 'none';\
script-src 'self';script-src-attr 'none';style-src 'self' https: 'unsafe-inline';\
upgrade-insecure-requests";

/// Allows any origin. The API has no credentials to protect.
pub fn cors() -> Cors {
    Cors::default()
        .allow_any_origin()
        .send_wildcard()
        .allowed_methods(["GET", "HEAD", "PUT", "PATCH", "POST", "DELETE"])
        .allow_any_header()
}

/// Hardening headers added to every response that does not set them itself.
pub fn security_headers() -> DefaultHeaders {
    DefaultHeaders::new()
        .add((http::header::CONTENT_SECURITY_POLICY, CONTENT_SECURITY_POLICY))
        .add(("Cross-Origin-Opener-Policy", "same-origin"))
        .add(("Cross-Origin-Resource-Policy", "same-origin"))
        .add(("Origin-Agent-Cluster", "?1"))
        .add((http::header::REFERRER_POLICY, "no-referrer"))
        .add((
            http::header::STRICT_TRANSPORT_SECURITY,
            "max-age=31536000; includeSubDomains",
        ))
        .add((http::header::X_CONTENT_TYPE_OPTIONS, "nosniff"))
        .add((http::header::X_DNS_PREFETCH_CONTROL, "off"))
        .add(("X-Download-Options", "noopen"))
        .add((http::header::X_FRAME_OPTIONS, "SAMEORIGIN"))
        .add(("X-Permitted-Cross-Domain-Policies", "none"))
        .add((http::header::X_XSS_PROTECTION, "0"))
}
