//! Identity session state machine.
//!
//! Resolves a stable client identity before any data access:
//! `Unresolved -> Resolving -> {Resolved, Failed}`. Credential-based
//! resolution falls back once to anonymous; `Failed` leaves the client idle
//! rather than crashing. State transitions are broadcast on the event bus,
//! which is what unblocks the collection view.

use crate::error::{ClientError, Result};
use crate::notify::{ClientEvent, EventBus};
use crate::remote::IdentityProvider;
use crate::types::{CredentialToken, Identity, SessionState};
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, warn};

/// Per-client identity session. Exactly one per client instance.
pub struct Session {
    provider: Arc<dyn IdentityProvider>,

    /// Credential for token-based resolution, if one was supplied.
    credential: Option<CredentialToken>,

    state: RwLock<SessionState>,

    events: Arc<EventBus>,
}

impl Session {
    pub fn new(
        provider: Arc<dyn IdentityProvider>,
        credential: Option<CredentialToken>,
        events: Arc<EventBus>,
    ) -> Self {
        Self {
            provider,
            credential,
            state: RwLock::new(SessionState::Unresolved),
            events,
        }
    }

    /// Current session state.
    pub fn state(&self) -> SessionState {
        self.state.read().clone()
    }

    /// The resolved identity, if any.
    pub fn identity(&self) -> Option<Identity> {
        match &*self.state.read() {
            SessionState::Resolved { identity } => Some(identity.clone()),
            _ => None,
        }
    }

    /// Resolve the session identity.
    ///
    /// If the provider already reports an active identity it is adopted
    /// directly. Otherwise credential-based resolution is attempted when a
    /// credential is configured, with a single anonymous fallback on
    /// failure; anonymous resolution is used directly when it is not.
    ///
    /// Idempotent while resolved: re-resolution only happens after the
    /// provider stops reporting an active identity.
    pub fn resolve(&self) -> Result<Identity> {
        if let Some(identity) = self.provider.current_identity() {
            self.adopt(identity.clone());
            return Ok(identity);
        }

        self.set_state(SessionState::Resolving);

        let attempt = match &self.credential {
            Some(token) => match self.provider.resolve_with_credential(token) {
                Ok(identity) => Ok(identity),
                Err(err) => {
                    warn!(error = %err, "credential resolution failed, falling back to anonymous");
                    self.provider.resolve_anonymous()
                }
            },
            None => self.provider.resolve_anonymous(),
        };

        match attempt {
            Ok(identity) => {
                debug!(identity = %identity, "session resolved");
                self.set_state(SessionState::Resolved {
                    identity: identity.clone(),
                });
                Ok(identity)
            }
            Err(err) => {
                warn!(error = %err, "identity resolution failed");
                self.set_state(SessionState::Failed);
                Err(ClientError::IdentityResolution(err.to_string()))
            }
        }
    }

    /// Adopt an identity the provider already reports active, without a
    /// resolution round-trip.
    pub(crate) fn adopt(&self, identity: Identity) {
        self.set_state(SessionState::Resolved { identity });
    }

    /// Transition to a new state and broadcast it. No-op when unchanged.
    fn set_state(&self, next: SessionState) {
        {
            let mut state = self.state.write();
            if *state == next {
                return;
            }
            *state = next.clone();
        }
        self.events.broadcast(ClientEvent::Session { state: next });
    }
}
