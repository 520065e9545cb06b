//! Mutation gateway: create/delete requests against the scoped collection.
//!
//! Fire-and-confirm: both operations go to the store and return once the
//! request is accepted or refused. Neither touches the cached view — the
//! subscription delivery is the only cache writer, so confirmation arrives
//! the same way every other change does.

use crate::error::{ClientError, RemoteErrorKind, Result};
use crate::remote::DocumentStore;
use crate::session::Session;
use crate::types::{CollectionPath, MutationKind, NewDocument, RecordId};
use std::sync::Arc;
use tracing::debug;

/// Issues create/delete requests for the session's scoped collection.
pub struct MutationGateway {
    store: Arc<dyn DocumentStore>,
    session: Arc<Session>,
    namespace: String,
}

impl MutationGateway {
    pub fn new(store: Arc<dyn DocumentStore>, session: Arc<Session>, namespace: impl Into<String>) -> Self {
        Self {
            store,
            session,
            namespace: namespace.into(),
        }
    }

    /// Create a record with the given payload text.
    ///
    /// Rejected synchronously when the trimmed text is empty or no identity
    /// is resolved; no request is issued in either case. The store assigns
    /// `created_at` via the server-time sentinel. Failures are reported,
    /// never retried.
    pub fn create(&self, text: &str) -> Result<RecordId> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ClientError::InvalidInput("empty payload text".to_string()));
        }
        let path = self.scoped_path()?;

        let id = self
            .store
            .add(&path, NewDocument::text(text))
            .map_err(|err| ClientError::mutation(MutationKind::Create, err))?;
        debug!(%id, %path, "create request accepted");
        Ok(id)
    }

    /// Delete the record with the given id.
    ///
    /// Rejected synchronously when no identity is resolved. Deleting an id
    /// the store no longer knows is a no-op success.
    pub fn delete(&self, id: &RecordId) -> Result<()> {
        let path = self.scoped_path()?;

        match self.store.delete(&path, id) {
            Ok(()) => {
                debug!(%id, %path, "delete request accepted");
                Ok(())
            }
            Err(err) if err.kind == RemoteErrorKind::NotFound => {
                debug!(%id, %path, "delete of unknown id, treating as no-op");
                Ok(())
            }
            Err(err) => Err(ClientError::mutation(MutationKind::Delete, err)),
        }
    }

    /// The collection path for the resolved identity.
    fn scoped_path(&self) -> Result<CollectionPath> {
        let identity = self.session.identity().ok_or(ClientError::NoIdentity)?;
        Ok(CollectionPath::records(&self.namespace, &identity))
    }
}
