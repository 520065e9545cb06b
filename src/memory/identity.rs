//! In-memory identity provider.

use crate::error::RemoteError;
use crate::remote::{IdentityObserver, IdentityProvider, SubscriptionGuard};
use crate::types::{CredentialToken, Identity};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

struct ProviderState {
    current: Option<Identity>,
    /// Credential token -> uid.
    tokens: HashMap<String, String>,
    next_anon: u64,
    anonymous_enabled: bool,
}

/// Identity provider holding its accounts in memory.
///
/// Anonymous identities are allocated as `anon-{n}`. Credentialed
/// identities are registered up front with [`with_token`](Self::with_token).
/// `set_identity`/`sign_out` simulate provider-driven identity changes.
pub struct MemoryIdentityProvider {
    state: Mutex<ProviderState>,
    watchers: Arc<Mutex<HashMap<u64, Arc<dyn IdentityObserver>>>>,
    next_watch: AtomicU64,
}

impl MemoryIdentityProvider {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(ProviderState {
                current: None,
                tokens: HashMap::new(),
                next_anon: 1,
                anonymous_enabled: true,
            }),
            watchers: Arc::new(Mutex::new(HashMap::new())),
            next_watch: AtomicU64::new(1),
        }
    }

    /// Register a credential token resolving to `uid`.
    pub fn with_token(self, token: impl Into<String>, uid: impl Into<String>) -> Self {
        self.state.lock().tokens.insert(token.into(), uid.into());
        self
    }

    /// Refuse anonymous allocation. Makes the fallback path fail too.
    pub fn without_anonymous(self) -> Self {
        self.state.lock().anonymous_enabled = false;
        self
    }

    /// Invalidate a previously registered credential token.
    pub fn revoke_token(&self, token: &str) {
        self.state.lock().tokens.remove(token);
    }

    /// Report `uid` as the active identity and notify watchers.
    pub fn set_identity(&self, uid: &str) {
        let identity = Identity::from(uid);
        self.state.lock().current = Some(identity.clone());
        self.notify(Some(identity));
    }

    /// Clear the active identity and notify watchers.
    pub fn sign_out(&self) {
        self.state.lock().current = None;
        self.notify(None);
    }

    /// Number of live identity watchers.
    pub fn watcher_count(&self) -> usize {
        self.watchers.lock().len()
    }

    /// Invoke watchers outside the registry lock.
    fn notify(&self, identity: Option<Identity>) {
        let watchers: Vec<_> = self.watchers.lock().values().cloned().collect();
        for watcher in watchers {
            watcher.on_identity_change(identity.clone());
        }
    }
}

impl Default for MemoryIdentityProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl IdentityProvider for MemoryIdentityProvider {
    fn current_identity(&self) -> Option<Identity> {
        self.state.lock().current.clone()
    }

    fn resolve_anonymous(&self) -> Result<Identity, RemoteError> {
        let identity = {
            let mut state = self.state.lock();
            if !state.anonymous_enabled {
                return Err(RemoteError::unavailable("anonymous sign-in disabled"));
            }
            let identity = Identity(format!("anon-{}", state.next_anon));
            state.next_anon += 1;
            state.current = Some(identity.clone());
            identity
        };
        debug!(%identity, "allocated anonymous identity");
        self.notify(Some(identity.clone()));
        Ok(identity)
    }

    fn resolve_with_credential(&self, token: &CredentialToken) -> Result<Identity, RemoteError> {
        let identity = {
            let mut state = self.state.lock();
            let uid = state
                .tokens
                .get(&token.0)
                .cloned()
                .ok_or_else(|| RemoteError::permission_denied("unknown credential"))?;
            let identity = Identity(uid);
            state.current = Some(identity.clone());
            identity
        };
        debug!(%identity, "resolved credentialed identity");
        self.notify(Some(identity.clone()));
        Ok(identity)
    }

    fn watch_identity(&self, observer: Arc<dyn IdentityObserver>) -> SubscriptionGuard {
        let id = self.next_watch.fetch_add(1, Ordering::SeqCst);
        let current = self.state.lock().current.clone();
        self.watchers.lock().insert(id, Arc::clone(&observer));

        // Watchers learn the current state on registration.
        observer.on_identity_change(current);

        let watchers = Arc::clone(&self.watchers);
        SubscriptionGuard::new(move || {
            watchers.lock().remove(&id);
        })
    }
}
