use axum::http::HeaderValue;
use axum::{extract::Request, middleware::Next, response::Response};
use uuid::Uuid;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Ensure every request carries an `x-request-id` and echo it back on the
/// response. A client-supplied id is kept; otherwise one is minted.
pub async fn request_id_middleware(mut req: Request, next: Next) -> Response {
    let request_id = match req.headers().get(REQUEST_ID_HEADER) {
        Some(value) => value.clone(),
        None => {
            let minted = Uuid::new_v4().to_string();
            // A freshly formatted UUID is always a valid header value.
            let value = HeaderValue::from_str(&minted)
                .unwrap_or_else(|_| HeaderValue::from_static("invalid"));
            req.headers_mut().insert(REQUEST_ID_HEADER, value.clone());
            value
        }
    };

    let mut response = next.run(req).await;
    response.headers_mut().insert(REQUEST_ID_HEADER, request_id);
    response
}
