//! Request-scoped context extracted from HTTP requests.

use std::convert::Infallible;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::{HeaderMap, HeaderValue, Request};
use evently_id::RequestId;
use tower_http::request_id::{self, MakeRequestId};

use crate::events::Identity;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Request id and, on authenticated routes, the verified caller.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub request_id: String,
    pub identity: Option<Identity>,
}

impl RequestContext {
    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }
}

/// Reads the request id set by [`MakeRequestUlid`], minting one if the
/// request bypassed that layer.
pub fn request_id_of(headers: &HeaderMap) -> String {
    headers
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| RequestId::new().to_string())
}

impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self {
            request_id: request_id_of(&parts.headers),
            identity: parts.extensions.get::<Identity>().cloned(),
        })
    }
}

/// Stamps `x-request-id` with a `req_…` id when the client sent none.
#[derive(Debug, Clone, Copy, Default)]
pub struct MakeRequestUlid;

impl MakeRequestId for MakeRequestUlid {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<request_id::RequestId> {
        HeaderValue::from_str(&RequestId::new().to_string())
            .ok()
            .map(request_id::RequestId::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_id_from_header() {
        let mut headers = HeaderMap::new();
        headers.insert(REQUEST_ID_HEADER, HeaderValue::from_static("req_abc"));
        assert_eq!(request_id_of(&headers), "req_abc");
    }

    #[test]
    fn test_request_id_minted_when_absent() {
        let id = request_id_of(&HeaderMap::new());
        assert!(RequestId::parse(&id).is_ok());
    }

    #[test]
    fn test_make_request_ulid() {
        let request = Request::new(());
        let id = MakeRequestUlid.make_request_id(&request).unwrap();
        let value = id.header_value().to_str().unwrap();
        assert!(value.starts_with("req_"));
    }
}
