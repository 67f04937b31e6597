//! Middleware for logging requests and responses.

use axum::{
    body::{Body, Bytes},
    extract::Request,
    http::header::CONTENT_TYPE,
    middleware::Next,
    response::Response,
};

const LOG_BODY_LENGTH_LIMIT: usize = 64;

/// Log the request and response for each request.
///
/// Both the request and response are logged at the `info` level, with bodies
/// truncated to [LOG_BODY_LENGTH_LIMIT] bytes. Binary bodies (receipt uploads,
/// the Excel download) pass through untouched; only the logged preview is
/// lossily decoded. Passwords in JSON bodies are redacted.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let (parts, body) = request.into_parts();
    let body_bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .unwrap_or_default();

    let is_json = parts.headers.get(CONTENT_TYPE).is_some_and(|content_type| {
        content_type
            .to_str()
            .is_ok_and(|value| value.starts_with("application/json"))
    });
    let preview = body_preview(&body_bytes);
    let preview = if is_json {
        redact_password(&preview, "password")
    } else {
        preview
    };
    tracing::info!(
        "Received request: {} {} body: {preview}",
        parts.method,
        parts.uri
    );

    let request = Request::from_parts(parts, Body::from(body_bytes));
    let response = next.run(request).await;

    let (parts, body) = response.into_parts();
    let body_bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .unwrap_or_default();

    tracing::info!(
        "Sending response: {} body: {}",
        parts.status,
        body_preview(&body_bytes)
    );

    Response::from_parts(parts, Body::from(body_bytes))
}

fn body_preview(body: &Bytes) -> String {
    if body.len() > LOG_BODY_LENGTH_LIMIT {
        format!(
            "{}... ({} bytes)",
            String::from_utf8_lossy(&body[..LOG_BODY_LENGTH_LIMIT]),
            body.len()
        )
    } else {
        String::from_utf8_lossy(body).to_string()
    }
}

fn redact_password(body_text: &str, field_name: &str) -> String {
    let needle = format!("\"{field_name}\"");

    let Some(field_start) = body_text.find(&needle) else {
        return body_text.to_string();
    };

    // Replace everything after the field name up to the next comma or closing
    // brace. Good enough for log output, passwords containing those
    // characters just get truncated further.
    let value_start = field_start + needle.len();
    let value_end = body_text[value_start..]
        .find([',', '}'])
        .map(|offset| value_start + offset)
        .unwrap_or(body_text.len());

    format!(
        "{}: \"********\"{}",
        &body_text[..field_start + needle.len()],
        &body_text[value_end..]
    )
}
