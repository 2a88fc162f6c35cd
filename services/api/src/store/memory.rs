//! In-process event store.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use evently_id::EventId;
use tokio::sync::RwLock;

use super::{EventStore, StoreError};
use crate::events::Event;

#[derive(Default)]
struct Inner {
    // EventId is a ULID, so key order is creation order.
    events: BTreeMap<EventId, Event>,
    users: HashMap<String, String>,
}

/// Event store held in memory. Contents are lost on shutdown.
#[derive(Default)]
pub struct MemoryEventStore {
    inner: RwLock<Inner>,
}

impl MemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a display name for a user id.
    pub async fn insert_user(&self, user_id: impl Into<String>, username: impl Into<String>) {
        self.inner
            .write()
            .await
            .users
            .insert(user_id.into(), username.into());
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.events.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl EventStore for MemoryEventStore {
    async fn insert(&self, event: &Event) -> Result<(), StoreError> {
        self.inner
            .write()
            .await
            .events
            .insert(event.id, event.clone());
        Ok(())
    }

    async fn find(&self, id: &EventId) -> Result<Option<Event>, StoreError> {
        Ok(self.inner.read().await.events.get(id).cloned())
    }

    async fn list(&self) -> Result<Vec<Event>, StoreError> {
        Ok(self.inner.read().await.events.values().cloned().collect())
    }

    async fn save(&self, event: &Event) -> Result<bool, StoreError> {
        let mut inner = self.inner.write().await;
        match inner.events.get_mut(&event.id) {
            Some(stored) => {
                *stored = event.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: &EventId) -> Result<bool, StoreError> {
        Ok(self.inner.write().await.events.remove(id).is_some())
    }

    async fn usernames(&self, user_ids: &[String]) -> Result<HashMap<String, String>, StoreError> {
        let inner = self.inner.read().await;
        Ok(user_ids
            .iter()
            .filter_map(|id| inner.users.get(id).map(|name| (id.clone(), name.clone())))
            .collect())
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
