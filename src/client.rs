//! Client facade tying session, view, and mutations together.

use crate::error::Result;
use crate::mutations::MutationGateway;
use crate::notify::{EventBus, EventHandle, EventsConfig};
use crate::remote::{DocumentStore, IdentityObserver, IdentityProvider, SubscriptionGuard};
use crate::session::Session;
use crate::types::{CredentialToken, Identity, Record, RecordId, SessionState};
use crate::view::CollectionView;
use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use tracing::debug;

/// Client configuration.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// App namespace scoping every collection path.
    pub namespace: String,

    /// Credential for token-based identity resolution, if one was supplied.
    pub credential: Option<CredentialToken>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            namespace: "default-app".to_string(),
            credential: None,
        }
    }
}

/// The synchronized collection client.
///
/// Composes the identity session, the live collection view, and the
/// mutation gateway over a consumed identity provider and document store:
///
/// - [`connect`](Self::connect) resolves the identity and opens the
///   identity-scoped subscription.
/// - The subscription callback is the sole writer of the cached records;
///   [`create`](Self::create)/[`delete`](Self::delete) round-trip through
///   the store and surface back through the subscription.
/// - Provider-driven identity changes tear down and replace the view's
///   subscription; records never mix across identities.
pub struct Client {
    provider: Arc<dyn IdentityProvider>,
    events: Arc<EventBus>,
    session: Arc<Session>,
    view: Arc<CollectionView>,
    gateway: MutationGateway,
    identity_watch: Mutex<Option<SubscriptionGuard>>,
}

impl Client {
    pub fn new(
        config: ClientConfig,
        provider: Arc<dyn IdentityProvider>,
        store: Arc<dyn DocumentStore>,
    ) -> Self {
        let events = Arc::new(EventBus::new());
        let session = Arc::new(Session::new(
            Arc::clone(&provider),
            config.credential.clone(),
            Arc::clone(&events),
        ));
        let view = Arc::new(CollectionView::new(
            Arc::clone(&store),
            config.namespace.clone(),
            Arc::clone(&events),
        ));
        let gateway = MutationGateway::new(store, Arc::clone(&session), config.namespace);

        Self {
            provider,
            events,
            session,
            view,
            gateway,
            identity_watch: Mutex::new(None),
        }
    }

    /// Resolve the session identity and open the live view for it.
    ///
    /// On resolution failure the client stays idle: no subscription is
    /// opened and no data operations are possible until a later `connect`
    /// succeeds.
    pub fn connect(&self) -> Result<Identity> {
        let identity = self.session.resolve()?;
        self.view.open(&identity)?;

        let mut watch = self.identity_watch.lock();
        if watch.is_none() {
            *watch = Some(self.provider.watch_identity(Arc::new(IdentityChangeHandler {
                session: Arc::downgrade(&self.session),
                view: Arc::downgrade(&self.view),
            })));
        }

        Ok(identity)
    }

    /// Release the identity watch and the view's subscription.
    pub fn close(&self) {
        self.identity_watch.lock().take();
        self.view.close();
        debug!("client closed");
    }

    /// Create a record with the given payload text.
    pub fn create(&self, text: &str) -> Result<RecordId> {
        self.gateway.create(text)
    }

    /// Delete the record with the given id.
    pub fn delete(&self, id: &RecordId) -> Result<()> {
        self.gateway.delete(id)
    }

    /// The cached records, ordered newest first.
    pub fn current_records(&self) -> Vec<Record> {
        self.view.current_records()
    }

    /// The resolved identity, if any.
    pub fn current_identity(&self) -> Option<Identity> {
        self.session.identity()
    }

    /// Current session state.
    pub fn session_state(&self) -> SessionState {
        self.session.state()
    }

    /// True while resolving, or while the open view awaits its first
    /// delivery. A failed session is idle, not loading.
    pub fn is_loading(&self) -> bool {
        match self.session.state() {
            SessionState::Resolving => true,
            SessionState::Resolved { .. } => self.view.is_open() && !self.view.is_synced(),
            SessionState::Unresolved | SessionState::Failed => false,
        }
    }

    /// Whether the view has received a delivery since it was opened.
    pub fn is_synced(&self) -> bool {
        self.view.is_synced()
    }

    /// Subscribe to client events.
    pub fn events(&self, config: EventsConfig) -> EventHandle {
        self.events.subscribe(config)
    }
}

impl Drop for Client {
    fn drop(&mut self) {
        self.close();
    }
}

/// Reacts to provider-driven identity changes: a new identity replaces the
/// session identity and re-targets the view; sign-out re-runs resolution,
/// closing the view only if that fails.
struct IdentityChangeHandler {
    session: Weak<Session>,
    view: Weak<CollectionView>,
}

impl IdentityObserver for IdentityChangeHandler {
    fn on_identity_change(&self, identity: Option<Identity>) {
        let (Some(session), Some(view)) = (self.session.upgrade(), self.view.upgrade()) else {
            return;
        };

        match identity {
            Some(identity) => {
                debug!(%identity, "provider reported identity change");
                session.adopt(identity.clone());
                // Failures surface on the event bus.
                let _ = view.open(&identity);
            }
            None => {
                debug!("provider reported sign-out, re-resolving");
                match session.resolve() {
                    Ok(identity) => {
                        let _ = view.open(&identity);
                    }
                    Err(_) => view.close(),
                }
            }
        }
    }
}
