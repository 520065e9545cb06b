//! Core types for the collection client.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque client identity issued by the identity provider.
///
/// Immutable once resolved; a session never rewrites an identity in place,
/// it replaces the whole session state.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identity(pub String);

impl Identity {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Identity({})", self.0)
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Identity {
    fn from(s: &str) -> Self {
        Identity(s.to_string())
    }
}

/// Pre-supplied credential for token-based identity resolution.
#[derive(Clone, PartialEq, Eq)]
pub struct CredentialToken(pub String);

impl fmt::Debug for CredentialToken {
    // Token contents never reach logs.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CredentialToken(***)")
    }
}

impl From<&str> for CredentialToken {
    fn from(s: &str) -> Self {
        CredentialToken(s.to_string())
    }
}

/// Identity session lifecycle.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SessionState {
    /// No resolution attempted yet.
    Unresolved,
    /// Resolution in flight.
    Resolving,
    /// Identity established; terminal while the provider reports it active.
    Resolved { identity: Identity },
    /// Resolution failed after the anonymous fallback; client is idle.
    Failed,
}

/// Store-assigned document identifier. Never reused after deletion
/// within a session.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordId(pub String);

impl RecordId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RecordId({})", self.0)
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for RecordId {
    fn from(s: &str) -> Self {
        RecordId(s.to_string())
    }
}

/// Seconds since Unix epoch, assigned by the store on commit.
/// Monotonic per store.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ServerTimestamp(pub i64);

impl fmt::Debug for ServerTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ServerTimestamp({})", self.0)
    }
}

impl fmt::Display for ServerTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Creation time of a record as seen by the view.
///
/// `Pending` is the transient value between local submission and the store's
/// timestamp assignment. Variant order matters: the derived `Ord` puts
/// `Pending` above every `Assigned` value, which is the view's sort invariant
/// (newest/unsynced first).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CreatedAt {
    Assigned(ServerTimestamp),
    Pending,
}

impl CreatedAt {
    pub fn is_pending(&self) -> bool {
        matches!(self, CreatedAt::Pending)
    }

    pub fn timestamp(&self) -> Option<ServerTimestamp> {
        match self {
            CreatedAt::Assigned(ts) => Some(*ts),
            CreatedAt::Pending => None,
        }
    }
}

/// A record as cached and presented by the collection view.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub id: RecordId,
    /// Opaque payload text.
    pub text: String,
    pub created_at: CreatedAt,
}

/// Raw delivery unit from the document store.
///
/// `created_at` is `None` until the server has committed the write; the view
/// maps that to [`CreatedAt::Pending`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: RecordId,
    pub text: String,
    pub created_at: Option<ServerTimestamp>,
}

impl From<Document> for Record {
    fn from(doc: Document) -> Self {
        Record {
            id: doc.id,
            text: doc.text,
            created_at: match doc.created_at {
                Some(ts) => CreatedAt::Assigned(ts),
                None => CreatedAt::Pending,
            },
        }
    }
}

/// Value written into the `created_at` field of a new document.
///
/// Only the server-time sentinel exists: creation times are always assigned
/// by the store's clock, never a client clock.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CreatedAtField {
    ServerTime,
}

/// Write request for a new record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewDocument {
    pub text: String,
    pub created_at: CreatedAtField,
}

impl NewDocument {
    /// New document with the server-time sentinel.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            created_at: CreatedAtField::ServerTime,
        }
    }
}

/// Identity-scoped collection path: `apps/{namespace}/users/{uid}/records`.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CollectionPath(String);

impl CollectionPath {
    /// The records collection for one identity under an app namespace.
    pub fn records(namespace: &str, identity: &Identity) -> Self {
        CollectionPath(format!("apps/{}/users/{}/records", namespace, identity))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for CollectionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CollectionPath({})", self.0)
    }
}

impl fmt::Display for CollectionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which mutation a gateway error belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MutationKind {
    Create,
    Delete,
}

impl fmt::Display for MutationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MutationKind::Create => write!(f, "create"),
            MutationKind::Delete => write!(f, "delete"),
        }
    }
}
