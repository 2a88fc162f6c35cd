//! Application state shared across request handlers.

use std::sync::Arc;

use crate::api::tokens::CredentialVerifier;
use crate::events::EventService;
use crate::store::EventStore;

/// Shared application state.
///
/// This is passed to all request handlers via Axum's state extractor.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    events: EventService,
    verifier: CredentialVerifier,
}

impl AppState {
    /// Create a new application state over an already-connected store.
    pub fn new(store: Arc<dyn EventStore>, verifier: CredentialVerifier) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                events: EventService::new(store),
                verifier,
            }),
        }
    }

    pub fn events(&self) -> &EventService {
        &self.inner.events
    }

    pub fn verifier(&self) -> &CredentialVerifier {
        &self.inner.verifier
    }
}
