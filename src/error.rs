//! Error types for the collection client.

use crate::types::MutationKind;
use std::fmt;
use thiserror::Error;

/// Failure category reported by an identity provider or document store.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RemoteErrorKind {
    /// Backend unreachable or refusing service.
    Unavailable,
    /// Caller is not allowed to perform the operation.
    PermissionDenied,
    /// Target document or credential does not exist.
    NotFound,
    /// Anything else the backend reports.
    Internal,
}

impl fmt::Display for RemoteErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RemoteErrorKind::Unavailable => write!(f, "unavailable"),
            RemoteErrorKind::PermissionDenied => write!(f, "permission denied"),
            RemoteErrorKind::NotFound => write!(f, "not found"),
            RemoteErrorKind::Internal => write!(f, "internal"),
        }
    }
}

/// Error reported by a consumed backend (identity provider or store).
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("{kind}: {message}")]
pub struct RemoteError {
    pub kind: RemoteErrorKind,
    pub message: String,
}

impl RemoteError {
    pub fn new(kind: RemoteErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(RemoteErrorKind::Unavailable, message)
    }

    pub fn permission_denied(message: impl Into<String>) -> Self {
        Self::new(RemoteErrorKind::PermissionDenied, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(RemoteErrorKind::NotFound, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(RemoteErrorKind::Internal, message)
    }
}

/// Main error type for client operations.
#[derive(Clone, Debug, Error)]
pub enum ClientError {
    #[error("identity resolution failed: {0}")]
    IdentityResolution(String),

    #[error("subscription failed: {0}")]
    Subscription(String),

    #[error("{kind} failed: {message}")]
    Mutation {
        kind: MutationKind,
        message: String,
    },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("no resolved identity")]
    NoIdentity,
}

impl ClientError {
    /// Wrap a backend error as a mutation failure of the given kind.
    pub(crate) fn mutation(kind: MutationKind, err: RemoteError) -> Self {
        ClientError::Mutation {
            kind,
            message: err.to_string(),
        }
    }
}

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, ClientError>;
