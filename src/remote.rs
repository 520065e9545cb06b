//! Interfaces to the consumed backends: identity provider and document store.
//!
//! Both are specified at the trait boundary only. The store delivers the full
//! current collection state to every subscriber on every change; this crate
//! never owns a wire protocol or persistence format. [`SubscriptionGuard`]
//! is the owned-handle-with-guaranteed-release half of the subscription
//! lifecycle: dropping it (or calling [`SubscriptionGuard::release`])
//! unsubscribes, on every exit path.

use crate::error::RemoteError;
use crate::types::{CollectionPath, CredentialToken, Document, Identity, NewDocument, RecordId};
use std::sync::Arc;

/// Receives live deliveries for one subscription.
///
/// `on_snapshot` always carries the complete current state of the collection;
/// deliveries are authoritative, not incremental.
pub trait CollectionObserver: Send + Sync {
    fn on_snapshot(&self, documents: Vec<Document>);

    /// A delivery error. The subscription itself stays open; the backend
    /// handles its own reconnection.
    fn on_error(&self, error: RemoteError);
}

/// Receives identity changes from the provider.
///
/// Fires with `Some` when an identity becomes active and `None` on sign-out.
pub trait IdentityObserver: Send + Sync {
    fn on_identity_change(&self, identity: Option<Identity>);
}

/// Issues opaque client identities.
pub trait IdentityProvider: Send + Sync {
    /// The identity the provider currently reports active, if any.
    fn current_identity(&self) -> Option<Identity>;

    /// Allocate an anonymous identity.
    fn resolve_anonymous(&self) -> Result<Identity, RemoteError>;

    /// Resolve an identity from a pre-supplied credential.
    fn resolve_with_credential(&self, token: &CredentialToken) -> Result<Identity, RemoteError>;

    /// Watch identity changes. The observer is invoked with the current
    /// state on registration, then on every change until the guard is
    /// released.
    fn watch_identity(&self, observer: Arc<dyn IdentityObserver>) -> SubscriptionGuard;
}

/// Collection-oriented store keyed by identity-scoped paths.
pub trait DocumentStore: Send + Sync {
    /// Open a live subscription. The observer receives an initial delivery
    /// of the current state, then one delivery per change.
    fn subscribe(
        &self,
        path: &CollectionPath,
        observer: Arc<dyn CollectionObserver>,
    ) -> Result<SubscriptionGuard, RemoteError>;

    /// Add a document. The store assigns the id and, for the server-time
    /// sentinel, the `created_at` timestamp (monotonic per store).
    fn add(&self, path: &CollectionPath, document: NewDocument) -> Result<RecordId, RemoteError>;

    /// Delete a document by id. Reports `NotFound` for an unknown id.
    fn delete(&self, path: &CollectionPath, id: &RecordId) -> Result<(), RemoteError>;
}

/// Owned handle to an active subscription or watch.
///
/// Releasing the guard unregisters the observer; `Drop` is the backstop so
/// a handle can never outlive its owner.
pub struct SubscriptionGuard {
    release: Option<Box<dyn FnOnce() + Send>>,
}

impl SubscriptionGuard {
    pub fn new(release: impl FnOnce() + Send + 'static) -> Self {
        Self {
            release: Some(Box::new(release)),
        }
    }

    /// Guard that holds nothing. Useful for backends with no registration
    /// to undo.
    pub fn noop() -> Self {
        Self { release: None }
    }

    /// Explicitly release the subscription.
    pub fn release(mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl Drop for SubscriptionGuard {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl std::fmt::Debug for SubscriptionGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriptionGuard")
            .field("released", &self.release.is_none())
            .finish()
    }
}
