use axum::http::HeaderValue;
use axum::{extract::Request, middleware::Next, response::Response};
use uuid::Uuid;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

const MAX_FORWARDED_ID_LEN: usize = 128;

/// Attach a request id to the request and echo it on the response.
/// An incoming `x-request-id` is kept so ids stay correlated across
/// service hops; otherwise a fresh UUID is minted.
pub async fn request_id_middleware(mut req: Request, next: Next) -> Response {
    let request_id = forwarded_request_id(&req).unwrap_or_else(mint_request_id);

    req.headers_mut()
        .insert(REQUEST_ID_HEADER, request_id.clone());

    let mut response = next.run(req).await;
    response.headers_mut().insert(REQUEST_ID_HEADER, request_id);
    response
}

/// Accept a forwarded id only if it is printable and of sane length;
/// anything else gets replaced rather than propagated into logs.
fn forwarded_request_id(req: &Request) -> Option<HeaderValue> {
    let value = req.headers().get(REQUEST_ID_HEADER)?;
    let id = value.to_str().ok()?;
    if id.is_empty() || id.len() > MAX_FORWARDED_ID_LEN {
        return None;
    }
    Some(value.clone())
}

fn mint_request_id() -> HeaderValue {
    let id = Uuid::new_v4().to_string();
    // A UUID in string form is always a valid header value.
    HeaderValue::from_str(&id).unwrap_or_else(|_| HeaderValue::from_static("unknown"))
}
