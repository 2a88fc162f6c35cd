//! Authentication middleware for routes that require a caller.
//!
//! The verified [`Identity`](crate::events::Identity) is attached to request
//! extensions, where [`RequestContext`](super::request_context::RequestContext)
//! picks it up. Requests without a valid token never reach the handler.

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::CookieJar;

use crate::api::error::ApiError;
use crate::api::request_context::request_id_of;
use crate::api::tokens::TokenError;
use crate::state::AppState;

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().strip_prefix("Bearer "))
        .map(|t| t.trim().to_string())
}

/// Rejects the request with 401 unless it carries a valid access token.
///
/// The token cookie is preferred; `Authorization: Bearer` is the fallback.
pub async fn require_auth(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let request_id = request_id_of(req.headers());
    let verifier = state.verifier();

    let token = jar
        .get(verifier.cookie_name())
        .map(|cookie| cookie.value().to_string())
        .or_else(|| bearer_token(req.headers()));

    let identity = token
        .ok_or(TokenError::Missing)
        .and_then(|token| verifier.verify(&token))
        .map_err(|e| {
            tracing::debug!(
                request_id = %request_id,
                reason = e.code(),
                path = %req.uri().path(),
                "Rejected unauthenticated request"
            );
            ApiError::from_token(&e, &request_id)
        })?;

    req.extensions_mut().insert(identity);
    Ok(next.run(req).await)
}
