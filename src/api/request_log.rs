use crate::api::api_error::APIError;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;
use hyper::Body;

const REDACTED_HEADERS: [&str; 2] = ["authorization", "x-api-key"];

/// Debug mode request dump. Logs the method, URI, headers and body, then passes the request
/// on with the same body.
pub(super) async fn log_request(
    request: Request<Body>,
    next: Next<Body>,
) -> Result<Response, APIError> {
    let (parts, body) = request.into_parts();
    let bytes = hyper::body::to_bytes(body).await?;

    let headers: Vec<String> = parts
        .headers
        .iter()
        .map(|(name, value)| {
            if REDACTED_HEADERS.contains(&name.as_str()) {
                format!("{name}: ***")
            } else {
                format!("{name}: {}", value.to_str().unwrap_or("<binary>"))
            }
        })
        .collect();
    tracing::debug!(
        "{} {} headers=[{}] body={:?}",
        parts.method,
        parts.uri,
        headers.join(", "),
        String::from_utf8_lossy(&bytes)
    );

    Ok(next.run(Request::from_parts(parts, Body::from(bytes))).await)
}
