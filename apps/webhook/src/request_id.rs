use axum::{
    body::Body,
    http::{HeaderValue, Request, header::HeaderName},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

pub const REQUEST_ID_HEADER: &str = "x-request-id";
const MAX_REQUEST_ID_LEN: usize = 128;

/// Per-request identifier, available to handlers as an extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestId(pub String);

/// Accepts a caller-supplied id only if it is short and made of token characters.
fn inbound_request_id(req: &Request<Body>) -> Option<String> {
    let raw = req.headers().get(REQUEST_ID_HEADER)?.to_str().ok()?.trim();
    let valid = !raw.is_empty()
        && raw.len() <= MAX_REQUEST_ID_LEN
        && raw
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.' | b':'));
    valid.then(|| raw.to_string())
}

/// Propagates the caller's `x-request-id` (from a proxy or load balancer) or mints a UUID v4,
/// and echoes it on the response.
pub async fn with_request_id(mut req: Request<Body>, next: Next) -> Response {
    let rid = inbound_request_id(&req).unwrap_or_else(|| Uuid::new_v4().to_string());
    req.extensions_mut().insert(RequestId(rid.clone()));

    let mut res = next.run(req).await;
    if let Ok(value) = HeaderValue::from_str(&rid) {
        res.headers_mut()
            .insert(HeaderName::from_static(REQUEST_ID_HEADER), value);
    }
    res
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request_with(value: &str) -> Request<Body> {
        Request::builder()
            .header(REQUEST_ID_HEADER, value)
            .body(Body::empty())
            .unwrap()
    }

    #[test]
    fn keeps_well_formed_ids() {
        assert_eq!(
            inbound_request_id(&request_with(" edge-7f3a:01 ")).as_deref(),
            Some("edge-7f3a:01")
        );
    }

    #[test]
    fn rejects_empty_long_or_odd_ids() {
        assert_eq!(inbound_request_id(&request_with("")), None);
        assert_eq!(inbound_request_id(&request_with("a b")), None);
        assert_eq!(inbound_request_id(&request_with("<script>")), None);
        assert_eq!(inbound_request_id(&request_with(&"x".repeat(129))), None);
        let bare = Request::builder().body(Body::empty()).unwrap();
        assert_eq!(inbound_request_id(&bare), None);
    }
}
