//! Event operations.
//!
//! Each operation takes the requester and the target id as explicit
//! arguments and checks them itself before touching the store. Input and
//! authorization failures leave the store untouched.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use evently_id::EventId;
use tracing::{debug, info};

use super::authz::{is_attendee, require_identity, require_organizer};
use super::error::{EventError, FieldViolation};
use super::model::{Event, EventFields, EventView, Identity, UserRef, UserSummary};
use crate::store::EventStore;

/// Create/read/update/delete/register over an injected store.
#[derive(Clone)]
pub struct EventService {
    store: Arc<dyn EventStore>,
}

impl EventService {
    pub fn new(store: Arc<dyn EventStore>) -> Self {
        Self { store }
    }

    /// Checks that the backing store is reachable.
    pub async fn health_check(&self) -> Result<(), EventError> {
        self.store.health_check().await?;
        Ok(())
    }

    /// Creates an event organized by the requester.
    pub async fn create(
        &self,
        fields: EventFields,
        requester: Option<&Identity>,
    ) -> Result<Event, EventError> {
        let requester = require_identity(requester)?;
        let fields = fields.into_new_event()?;

        let event = Event::create(fields, requester, Utc::now());
        self.store.insert(&event).await?;

        info!(event_id = %event.id, organizer = %event.organizer, "Event created");
        Ok(event)
    }

    /// All events with the organizer resolved for display.
    pub async fn list(&self) -> Result<Vec<EventView>, EventError> {
        let events = self.store.list().await?;

        let mut organizers: Vec<String> = events.iter().map(|e| e.organizer.clone()).collect();
        organizers.sort();
        organizers.dedup();
        let names = self.store.usernames(&organizers).await?;

        Ok(events
            .into_iter()
            .map(|event| {
                let organizer = resolve(&names, &event.organizer);
                let attendees = event.attendees.iter().cloned().map(UserRef::Id).collect();
                EventView::new(event, organizer, attendees)
            })
            .collect())
    }

    /// One event with organizer and attendees resolved for display.
    pub async fn get(&self, id: &str) -> Result<EventView, EventError> {
        let event = self.load(id).await?;

        let user_ids: Vec<String> = event.referenced_users().map(str::to_string).collect();
        let names = self.store.usernames(&user_ids).await?;

        let organizer = resolve(&names, &event.organizer);
        let attendees = event
            .attendees
            .iter()
            .map(|attendee| resolve(&names, attendee))
            .collect();
        Ok(EventView::new(event, organizer, attendees))
    }

    /// Merges the supplied fields into an event the requester organizes.
    pub async fn update(
        &self,
        id: &str,
        fields: EventFields,
        requester: Option<&Identity>,
    ) -> Result<Event, EventError> {
        let mut event = self.load(id).await?;
        require_organizer(&event, requester)?;
        fields.check_patch()?;

        event.apply(fields, Utc::now());
        self.persist(&event).await?;

        info!(event_id = %event.id, "Event updated");
        Ok(event)
    }

    /// Deletes an event the requester organizes.
    pub async fn delete(&self, id: &str, requester: Option<&Identity>) -> Result<(), EventError> {
        if id.trim().is_empty() {
            return Err(EventError::validation(
                "Event ID is required",
                vec![FieldViolation::new("id", "is required")],
            ));
        }

        let event = self.load(id).await?;
        if event.organizer.trim().is_empty() {
            return Err(EventError::validation(
                "Event has no organizer assigned",
                vec![FieldViolation::new("organizer", "is missing")],
            ));
        }
        require_organizer(&event, requester)?;

        if !self.store.delete(&event.id).await? {
            return Err(EventError::NotFound);
        }

        info!(event_id = %event.id, "Event deleted");
        Ok(())
    }

    /// Adds the requester to the attendee list. Any authenticated identity
    /// may register, the organizer included.
    pub async fn register(
        &self,
        id: &str,
        requester: Option<&Identity>,
    ) -> Result<Event, EventError> {
        let mut event = self.load(id).await?;
        let requester = require_identity(requester)?;

        if is_attendee(&event, &requester.user_id) {
            return Err(EventError::AlreadyRegistered);
        }

        event.attendees.push(requester.user_id.clone());
        event.updated_at = Utc::now();
        self.persist(&event).await?;

        info!(event_id = %event.id, attendee = %requester.user_id, "Attendee registered");
        Ok(event)
    }

    async fn load(&self, id: &str) -> Result<Event, EventError> {
        // A malformed id cannot name a stored event.
        let Ok(event_id) = EventId::parse(id.trim()) else {
            debug!(id = %id, "Unparseable event id");
            return Err(EventError::NotFound);
        };

        self.store
            .find(&event_id)
            .await?
            .ok_or(EventError::NotFound)
    }

    async fn persist(&self, event: &Event) -> Result<(), EventError> {
        // Deleted between load and save.
        if self.store.save(event).await? {
            Ok(())
        } else {
            Err(EventError::NotFound)
        }
    }
}

fn resolve(names: &HashMap<String, String>, user_id: &str) -> UserRef {
    UserRef::Profile(UserSummary {
        id: user_id.to_string(),
        username: names.get(user_id).cloned(),
    })
}
