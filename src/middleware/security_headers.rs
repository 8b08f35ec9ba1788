//! HTTP security headers middleware

use axum::{extract::Request, http::HeaderValue, middleware::Next, response::Response};

/// Injects security headers into every response.
///
/// Framing is limited to the same origin so previews can still be embedded
/// by the library's own front end.
pub async fn security_headers(req: Request, next: Next) -> Response {
    let mut response = next.run(req).await;
    let headers = response.headers_mut();

    headers.insert("x-frame-options", HeaderValue::from_static("SAMEORIGIN"));
    headers.insert("x-content-type-options", HeaderValue::from_static("nosniff"));
    headers.insert(
        "referrer-policy",
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );
    headers.insert(
        "content-security-policy",
        HeaderValue::from_static("default-src 'self'; frame-ancestors 'self'"),
    );

    response
}
