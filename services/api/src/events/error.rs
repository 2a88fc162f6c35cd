//! Event operation errors.

use serde::Serialize;
use thiserror::Error;

use crate::store::StoreError;

/// One rejected input field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldViolation {
    pub field: String,
    pub message: String,
}

impl FieldViolation {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Failure of an event operation.
///
/// Everything except `Store` is detected before any store mutation.
#[derive(Debug, Error)]
pub enum EventError {
    /// Malformed or missing input.
    #[error("{message}")]
    Validation {
        message: String,
        violations: Vec<FieldViolation>,
    },

    /// No verified identity on the request.
    #[error("User not authenticated")]
    Unauthenticated,

    /// Authenticated, but not the organizer.
    #[error("Only the organizer can modify this event")]
    Forbidden,

    #[error("Event not found")]
    NotFound,

    /// Conflict: the identity is already an attendee.
    #[error("Already registered")]
    AlreadyRegistered,

    #[error("store operation failed: {0}")]
    Store(#[from] StoreError),
}

impl EventError {
    pub fn validation(message: impl Into<String>, violations: Vec<FieldViolation>) -> Self {
        Self::Validation {
            message: message.into(),
            violations,
        }
    }

    /// Machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            EventError::Validation { .. } => "validation_error",
            EventError::Unauthenticated => "unauthenticated",
            EventError::Forbidden => "forbidden",
            EventError::NotFound => "event_not_found",
            EventError::AlreadyRegistered => "already_registered",
            EventError::Store(_) => "internal_error",
        }
    }
}
