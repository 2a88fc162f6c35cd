//! Event persistence.
//!
//! [`EventStore`] is the seam between the event operations and the backing
//! database. Two implementations ship:
//! - [`crate::db::PgEventStore`] over Postgres
//! - [`MemoryEventStore`] for tests and local development
//!
//! Saves replace the whole record. There is no concurrency token, so two
//! racing writers resolve last-write-wins.

mod memory;

use std::collections::HashMap;

use async_trait::async_trait;
use evently_id::EventId;
use thiserror::Error;

use crate::db::DbError;
use crate::events::Event;

pub use memory::MemoryEventStore;

/// Store operation errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Db(#[from] DbError),

    /// A persisted row could not be mapped back to an event.
    #[error("corrupt event record {id}: {reason}")]
    Corrupt { id: String, reason: String },
}

#[async_trait]
pub trait EventStore: Send + Sync {
    /// Inserts a new event.
    async fn insert(&self, event: &Event) -> Result<(), StoreError>;

    async fn find(&self, id: &EventId) -> Result<Option<Event>, StoreError>;

    /// All events, oldest first.
    async fn list(&self) -> Result<Vec<Event>, StoreError>;

    /// Replaces a stored event. Returns false if it no longer exists.
    async fn save(&self, event: &Event) -> Result<bool, StoreError>;

    /// Removes an event. Returns false if it did not exist.
    async fn delete(&self, id: &EventId) -> Result<bool, StoreError>;

    /// Looks up display names for the given user ids. Unknown ids are absent
    /// from the result.
    async fn usernames(&self, user_ids: &[String]) -> Result<HashMap<String, String>, StoreError>;

    async fn health_check(&self) -> Result<(), StoreError>;
}
