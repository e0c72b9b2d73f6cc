use axum::{extract::Request, http::HeaderValue, middleware::Next, response::Response};

/// The dashboard and Swagger UI are served from this origin with inline
/// scripts and styles; nothing else is loaded.
const CONTENT_SECURITY_POLICY: &str = "default-src 'self'; script-src 'self' 'unsafe-inline'; \
     style-src 'self' 'unsafe-inline'; img-src 'self' data:; connect-src 'self'; \
     frame-ancestors 'none'";

pub async fn security_headers_middleware(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    headers.insert("x-content-type-options", HeaderValue::from_static("nosniff"));
    headers.insert("x-frame-options", HeaderValue::from_static("DENY"));
    headers.insert("content-security-policy", HeaderValue::from_static(CONTENT_SECURITY_POLICY));
    headers.insert("referrer-policy", HeaderValue::from_static("strict-origin-when-cross-origin"));
    // Quotes and predictions go stale quickly
    headers.insert("cache-control", HeaderValue::from_static("no-store"));

    response
}
