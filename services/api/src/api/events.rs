//! Event API endpoints.
//!
//! Reads are public. Mutations sit behind [`require_auth`], and each
//! operation still checks for a caller itself.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::Serialize;

use crate::api::auth::require_auth;
use crate::api::error::ApiError;
use crate::api::request_context::RequestContext;
use crate::events::EventFields;
use crate::state::AppState;

/// Create event routes.
pub fn routes(state: AppState) -> Router<AppState> {
    let public = Router::new()
        .route("/getAll", get(list_events))
        .route("/getevent/{id}", get(get_event));

    let authenticated = Router::new()
        .route("/create-event", post(create_event))
        .route("/update-event/{id}", put(update_event))
        .route("/delete-event/{id}", delete(delete_event))
        .route("/event/{id}/register", post(register_for_event))
        .route_layer(middleware::from_fn_with_state(state, require_auth));

    public.merge(authenticated)
}

/// Confirmation returned by delete.
#[derive(Debug, Serialize)]
#[cfg_attr(test, derive(serde::Deserialize))]
pub struct MessageResponse {
    pub message: String,
}

fn body_or_reject(
    body: Result<Json<EventFields>, JsonRejection>,
    ctx: &RequestContext,
) -> Result<EventFields, ApiError> {
    body.map(|Json(fields)| fields).map_err(|rejection| {
        ApiError::bad_request("invalid_body", rejection.body_text())
            .with_request_id(ctx.request_id.clone())
    })
}

/// POST /api/create-event
async fn create_event(
    State(state): State<AppState>,
    ctx: RequestContext,
    body: Result<Json<EventFields>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let fields = body_or_reject(body, &ctx)?;

    let event = state
        .events()
        .create(fields, ctx.identity())
        .await
        .map_err(|e| ApiError::from_event(e, &ctx.request_id, "Error creating event"))?;

    Ok((StatusCode::CREATED, Json(event)))
}

/// GET /api/getAll
async fn list_events(
    State(state): State<AppState>,
    ctx: RequestContext,
) -> Result<impl IntoResponse, ApiError> {
    let events = state
        .events()
        .list()
        .await
        .map_err(|e| ApiError::from_event(e, &ctx.request_id, "Error fetching events"))?;

    Ok(Json(events))
}

/// GET /api/getevent/{id}
async fn get_event(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let event = state
        .events()
        .get(&id)
        .await
        .map_err(|e| ApiError::from_event(e, &ctx.request_id, "Error fetching event"))?;

    Ok(Json(event))
}

/// PUT /api/update-event/{id}
async fn update_event(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<String>,
    body: Result<Json<EventFields>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let fields = body_or_reject(body, &ctx)?;

    let event = state
        .events()
        .update(&id, fields, ctx.identity())
        .await
        .map_err(|e| ApiError::from_event(e, &ctx.request_id, "Error updating event"))?;

    Ok(Json(event))
}

/// DELETE /api/delete-event/{id}
async fn delete_event(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .events()
        .delete(&id, ctx.identity())
        .await
        .map_err(|e| ApiError::from_event(e, &ctx.request_id, "Error deleting event"))?;

    Ok(Json(MessageResponse {
        message: "Event deleted".to_string(),
    }))
}

/// POST /api/event/{id}/register
async fn register_for_event(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let event = state
        .events()
        .register(&id, ctx.identity())
        .await
        .map_err(|e| ApiError::from_event(e, &ctx.request_id, "Error registering for event"))?;

    Ok(Json(event))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_response_serialization() {
        let json = serde_json::to_value(MessageResponse {
            message: "Event deleted".to_string(),
        })
        .unwrap();
        assert_eq!(json, serde_json::json!({"message": "Event deleted"}));
    }
}
