//! Ownership checks for event mutation.
//!
//! User ids are opaque. Stored references and token claims are compared as
//! plain strings after trimming surrounding whitespace, always through
//! [`same_identity`].

use super::error::EventError;
use super::model::{Event, Identity};

/// User-id equality: exact after trimming. Letter case is significant.
pub fn same_identity(a: &str, b: &str) -> bool {
    a.trim() == b.trim()
}

/// Returns the requester if present, or `Unauthenticated`.
pub fn require_identity(requester: Option<&Identity>) -> Result<&Identity, EventError> {
    match requester {
        Some(identity) if !identity.user_id.trim().is_empty() => Ok(identity),
        _ => Err(EventError::Unauthenticated),
    }
}

/// Allows the mutation iff the requester organizes the event.
pub fn require_organizer(event: &Event, requester: Option<&Identity>) -> Result<(), EventError> {
    let requester = require_identity(requester)?;
    if same_identity(&event.organizer, &requester.user_id) {
        Ok(())
    } else {
        Err(EventError::Forbidden)
    }
}

/// True if `user_id` is already among the attendees.
pub fn is_attendee(event: &Event, user_id: &str) -> bool {
    event
        .attendees
        .iter()
        .any(|attendee| same_identity(attendee, user_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::model::NewEvent;
    use chrono::Utc;
    use rstest::rstest;

    fn event_by(organizer: &str) -> Event {
        let fields = NewEvent {
            title: "t".into(),
            description: "d".into(),
            date: "2025-01-01".into(),
            time: "18:00".into(),
            location: "l".into(),
        };
        Event::create(fields, &Identity::new(organizer), Utc::now())
    }

    #[rstest]
    #[case("65a1f0c2e4b0a1b2c3d4e5f6", "65a1f0c2e4b0a1b2c3d4e5f6", true)]
    #[case("65A1F0C2E4B0A1B2C3D4E5F6", "65a1f0c2e4b0a1b2c3d4e5f6", false)]
    #[case("ALICE", "alice", false)]
    #[case(" u1 ", "u1", true)]
    #[case("u1", "u2", false)]
    #[case("u1", "", false)]
    fn test_same_identity(#[case] a: &str, #[case] b: &str, #[case] expected: bool) {
        assert_eq!(same_identity(a, b), expected);
        assert_eq!(same_identity(b, a), expected);
    }

    #[test]
    fn test_organizer_is_authorized() {
        let event = event_by("u1");
        assert!(require_organizer(&event, Some(&Identity::new("u1"))).is_ok());
    }

    #[test]
    fn test_other_user_is_forbidden() {
        let event = event_by("u1");
        assert!(matches!(
            require_organizer(&event, Some(&Identity::new("u2"))),
            Err(EventError::Forbidden)
        ));
    }

    #[test]
    fn test_missing_identity_is_unauthenticated() {
        let event = event_by("u1");
        assert!(matches!(
            require_organizer(&event, None),
            Err(EventError::Unauthenticated)
        ));
        assert!(matches!(
            require_organizer(&event, Some(&Identity::new("  "))),
            Err(EventError::Unauthenticated)
        ));
    }

    #[test]
    fn test_organizer_check_is_case_sensitive() {
        let event = event_by("alice");
        assert!(matches!(
            require_organizer(&event, Some(&Identity::new("ALICE"))),
            Err(EventError::Forbidden)
        ));
    }

    #[test]
    fn test_is_attendee_is_case_sensitive() {
        let mut event = event_by("u1");
        event.attendees.push("Bob".into());
        assert!(is_attendee(&event, "Bob"));
        assert!(is_attendee(&event, " Bob "));
        assert!(!is_attendee(&event, "bob"));
    }
}
