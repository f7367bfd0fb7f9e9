//! Middleware for logging requests and responses.

use axum::{
    body::Body,
    extract::Request,
    http::{HeaderMap, HeaderValue, StatusCode, header::AUTHORIZATION},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::Value;

/// Bodies longer than this many characters are truncated in `info` logs.
pub const LOG_BODY_LENGTH_LIMIT: usize = 64;

const REDACTED: &str = "********";

/// Log the request and response for each request.
///
/// Both the request and response are logged at the `info` level.
/// If the body is longer than [LOG_BODY_LENGTH_LIMIT] characters, it is
/// truncated and the full body is logged at the `debug` level.
///
/// Bearer tokens are never logged: the `Authorization` header and any
/// top-level `"token"` field in a JSON body are redacted.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let (parts, body) = request.into_parts();
    let body_text = match read_body_text(body).await {
        Ok(text) => text,
        Err(error) => {
            tracing::warn!("Could not read request body: {error}");
            return StatusCode::BAD_REQUEST.into_response();
        }
    };

    tracing::info!(
        "Received request: {} {} {:?}\nheaders: {:#?}\nbody: {}",
        parts.method,
        parts.uri,
        parts.version,
        redact_headers(&parts.headers),
        truncate(&redact_token(&body_text))
    );
    log_full_body("request", &body_text);

    let request = Request::from_parts(parts, body_text.into());
    let response = next.run(request).await;

    let (parts, body) = response.into_parts();
    let body_text = match read_body_text(body).await {
        Ok(text) => text,
        Err(error) => {
            tracing::error!("Could not read response body: {error}");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    tracing::info!(
        "Sending response: {}\nheaders: {:#?}\nbody: {}",
        parts.status,
        redact_headers(&parts.headers),
        truncate(&redact_token(&body_text))
    );
    log_full_body("response", &body_text);

    Response::from_parts(parts, body_text.into())
}

async fn read_body_text(body: Body) -> Result<String, axum::Error> {
    let body_bytes = axum::body::to_bytes(body, usize::MAX).await?;

    Ok(String::from_utf8_lossy(&body_bytes).to_string())
}

fn log_full_body(kind: &str, body: &str) {
    if body.chars().count() > LOG_BODY_LENGTH_LIMIT {
        tracing::debug!("Full {kind} body: {:?}", redact_token(body));
    }
}

fn redact_headers(headers: &HeaderMap) -> HeaderMap {
    let mut headers = headers.clone();

    if headers.contains_key(AUTHORIZATION) {
        headers.insert(AUTHORIZATION, HeaderValue::from_static(REDACTED));
    }

    headers
}

fn redact_token(body: &str) -> String {
    let mut json = match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(object)) if object.contains_key("token") => object,
        _ => return body.to_owned(),
    };

    json.insert("token".to_owned(), Value::String(REDACTED.to_owned()));

    Value::Object(json).to_string()
}

fn truncate(body: &str) -> String {
    match body.char_indices().nth(LOG_BODY_LENGTH_LIMIT) {
        Some((end, _)) => format!("{:?}...", &body[..end]),
        None => format!("{body:?}"),
    }
}

#[cfg(test)]
mod logging_tests {
    use axum::http::{HeaderMap, HeaderValue, header::AUTHORIZATION};

    use crate::logging::{LOG_BODY_LENGTH_LIMIT, redact_headers, redact_token, truncate};

    #[test]
    fn redacts_authorization_header() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc123"));
        headers.insert("x-other", HeaderValue::from_static("visible"));

        let redacted = redact_headers(&headers);

        assert_eq!(redacted.get(AUTHORIZATION).unwrap(), "********");
        assert_eq!(redacted.get("x-other").unwrap(), "visible");
    }

    #[test]
    fn redacts_token_field() {
        let body = r#"{"id":1,"name":"Attila","token":"abc123"}"#;

        let redacted = redact_token(body);

        assert!(!redacted.contains("abc123"));
        assert!(redacted.contains(r#""token":"********""#));
        assert!(redacted.contains(r#""name":"Attila""#));
    }

    #[test]
    fn leaves_other_bodies_alone() {
        assert_eq!(redact_token("not json"), "not json");
        assert_eq!(redact_token(r#"{"amount":1.5}"#), r#"{"amount":1.5}"#);
        assert_eq!(redact_token(r#"["token"]"#), r#"["token"]"#);
    }

    #[test]
    fn truncates_long_bodies_on_char_boundaries() {
        let body = "£".repeat(LOG_BODY_LENGTH_LIMIT + 10);

        let truncated = truncate(&body);

        assert_eq!(
            truncated,
            format!("{:?}...", "£".repeat(LOG_BODY_LENGTH_LIMIT))
        );
        assert_eq!(truncate("short"), r#""short""#);
    }
}
