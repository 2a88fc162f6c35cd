//! Event records, request payloads, and their display forms.

use chrono::{DateTime, Utc};
use evently_id::EventId;
use serde::{Deserialize, Serialize};

use super::error::{EventError, FieldViolation};

/// An authenticated caller, as resolved from a verified credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: String,
    pub username: Option<String>,
}

impl Identity {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            username: None,
        }
    }
}

/// A stored event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub title: String,
    pub description: String,
    pub date: String,
    pub time: String,
    pub location: String,
    /// User id of the creator. Never changes after insert.
    pub organizer: String,
    pub attendees: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Descriptive fields supplied by a caller on create or update.
///
/// Ownership fields are deliberately absent: a body carrying `organizer` or
/// `attendees` deserializes with those keys dropped.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventFields {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
}

/// Fields validated for creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEvent {
    pub title: String,
    pub description: String,
    pub date: String,
    pub time: String,
    pub location: String,
}

fn is_blank(value: Option<&str>) -> bool {
    value.is_none_or(|v| v.trim().is_empty())
}

impl EventFields {
    fn named(&self) -> [(&'static str, Option<&str>); 5] {
        [
            ("title", self.title.as_deref()),
            ("description", self.description.as_deref()),
            ("date", self.date.as_deref()),
            ("time", self.time.as_deref()),
            ("location", self.location.as_deref()),
        ]
    }

    /// Requires all five fields to be present and non-blank.
    pub fn into_new_event(self) -> Result<NewEvent, EventError> {
        let violations: Vec<FieldViolation> = self
            .named()
            .into_iter()
            .filter(|(_, value)| is_blank(*value))
            .map(|(field, _)| FieldViolation::new(field, "is required"))
            .collect();

        if !violations.is_empty() {
            return Err(EventError::validation("All fields are required", violations));
        }

        Ok(NewEvent {
            title: self.title.unwrap_or_default(),
            description: self.description.unwrap_or_default(),
            date: self.date.unwrap_or_default(),
            time: self.time.unwrap_or_default(),
            location: self.location.unwrap_or_default(),
        })
    }

    /// Rejects supplied fields that are blank. Absent fields are fine.
    pub fn check_patch(&self) -> Result<(), EventError> {
        let violations: Vec<FieldViolation> = self
            .named()
            .into_iter()
            .filter(|(_, value)| value.is_some() && is_blank(*value))
            .map(|(field, _)| FieldViolation::new(field, "cannot be empty"))
            .collect();

        if violations.is_empty() {
            Ok(())
        } else {
            Err(EventError::validation("Fields cannot be empty", violations))
        }
    }
}

impl Event {
    pub fn create(fields: NewEvent, organizer: &Identity, now: DateTime<Utc>) -> Self {
        Self {
            id: EventId::new(),
            title: fields.title,
            description: fields.description,
            date: fields.date,
            time: fields.time,
            location: fields.location,
            organizer: organizer.user_id.clone(),
            attendees: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Overwrites the supplied descriptive fields. `organizer` and
    /// `attendees` are not reachable from here.
    pub fn apply(&mut self, fields: EventFields, now: DateTime<Utc>) {
        let EventFields {
            title,
            description,
            date,
            time,
            location,
        } = fields;

        if let Some(title) = title {
            self.title = title;
        }
        if let Some(description) = description {
            self.description = description;
        }
        if let Some(date) = date {
            self.date = date;
        }
        if let Some(time) = time {
            self.time = time;
        }
        if let Some(location) = location {
            self.location = location;
        }
        self.updated_at = now;
    }

    /// All user ids referenced by this event, organizer first.
    pub fn referenced_users(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.organizer.as_str()).chain(self.attendees.iter().map(String::as_str))
    }
}

/// Display form of a user reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: String,
    pub username: Option<String>,
}

/// A user reference that may or may not have been resolved for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UserRef {
    Id(String),
    Profile(UserSummary),
}

/// An event as returned by the read endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventView {
    pub id: EventId,
    pub title: String,
    pub description: String,
    pub date: String,
    pub time: String,
    pub location: String,
    pub organizer: UserRef,
    pub attendees: Vec<UserRef>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl EventView {
    pub fn new(event: Event, organizer: UserRef, attendees: Vec<UserRef>) -> Self {
        Self {
            id: event.id,
            title: event.title,
            description: event.description,
            date: event.date,
            time: event.time,
            location: event.location,
            organizer,
            attendees,
            created_at: event.created_at,
            updated_at: event.updated_at,
        }
    }
}
