//! Events: the record model, the ownership gate, and the operations that
//! tie them to a store.

pub mod authz;
mod error;
mod model;
mod service;

pub use error::{EventError, FieldViolation};
pub use model::{Event, EventFields, EventView, Identity, NewEvent, UserRef, UserSummary};
pub use service::EventService;
