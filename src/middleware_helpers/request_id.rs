use crate::tracing::{scope_request_id, RequestId};
use axum::{
    extract::Request,
    http::{header::HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};

pub use crate::tracing::REQUEST_ID_HEADER;

/// Tags the request with a [`RequestId`] and echoes it on the response.
///
/// A caller-supplied `x-request-id` is kept; otherwise a UUID is generated.
/// The id is stored as a request extension and scoped for the handler so
/// error bodies and response metadata can quote it.
pub async fn request_id_middleware(mut request: Request, next: Next) -> Response {
    let request_id = RequestId::from_headers(request.headers()).unwrap_or_default();
    let header = HeaderName::from_static(REQUEST_ID_HEADER);
    let value = HeaderValue::from_str(request_id.as_str()).ok();

    if let Some(value) = &value {
        request.headers_mut().insert(header.clone(), value.clone());
    }
    request.extensions_mut().insert(request_id.clone());

    let mut response = scope_request_id(request_id, next.run(request)).await;

    if let Some(value) = value {
        response.headers_mut().insert(header, value);
    }
    response
}
