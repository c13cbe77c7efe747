use axum::{
    extract::Request,
    http::{HeaderMap, HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use std::time::Instant;
use tracing::Instrument;

pub const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

/// Longest caller-supplied id that is echoed back; longer ones are replaced.
const MAX_REQUEST_ID_LEN: usize = 128;

/// The caller's request id, if it is short printable ASCII.
fn supplied_request_id(headers: &HeaderMap) -> Option<String> {
    let id = headers.get(&REQUEST_ID_HEADER)?.to_str().ok()?.trim();
    let printable = id.bytes().all(|b| b.is_ascii_graphic());
    (!id.is_empty() && id.len() <= MAX_REQUEST_ID_LEN && printable).then(|| id.to_string())
}

/// Run every request inside an `http` span keyed by its request id, log its status and
/// latency, and echo the id on the response.
pub async fn ensure_request_id(mut request: Request, next: Next) -> Response {
    let request_id = supplied_request_id(request.headers())
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    let header = HeaderValue::from_str(&request_id).ok();
    if let Some(value) = &header {
        request.headers_mut().insert(REQUEST_ID_HEADER, value.clone());
    }

    let span = tracing::info_span!(
        "http",
        request_id = %request_id,
        method = %request.method(),
        path = %request.uri().path()
    );
    let started = Instant::now();
    let mut response = next.run(request).instrument(span.clone()).await;
    span.in_scope(|| {
        tracing::info!(
            status = response.status().as_u16(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "request finished"
        );
    });

    if let Some(value) = header {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers_with(id: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(REQUEST_ID_HEADER, HeaderValue::from_str(id).unwrap());
        headers
    }

    #[test]
    fn keeps_short_printable_ids() {
        assert_eq!(
            supplied_request_id(&headers_with("  plan-7 ")),
            Some("plan-7".to_string())
        );
    }

    #[test]
    fn replaces_blank_spaced_or_oversized_ids() {
        assert_eq!(supplied_request_id(&HeaderMap::new()), None);
        assert_eq!(supplied_request_id(&headers_with("   ")), None);
        assert_eq!(supplied_request_id(&headers_with("two words")), None);
        let long = "x".repeat(MAX_REQUEST_ID_LEN + 1);
        assert_eq!(supplied_request_id(&headers_with(&long)), None);
    }
}
