//! # Notewire
//!
//! A real-time synchronized collection client: resolve a client identity,
//! open a live subscription to that identity's remote collection, and keep
//! an ordered local view consistent as deliveries arrive.
//!
//! ## Core Concepts
//!
//! - **Session**: resolves an opaque identity (credential with anonymous
//!   fallback, or anonymous directly) before any data access
//! - **View**: locally cached snapshot of the identity-scoped collection,
//!   sorted newest first; rebuilt wholesale on every delivery
//! - **Mutations**: create/delete requests that round-trip through the
//!   store — the subscription callback is the only writer of the cache
//! - **Backends**: identity provider and document store are consumed
//!   behind traits; in-memory implementations ship in [`memory`]
//!
//! ## Example
//!
//! ```ignore
//! use notewire::{Client, ClientConfig, MemoryIdentityProvider, MemoryStore};
//! use std::sync::Arc;
//!
//! let client = Client::new(
//!     ClientConfig { namespace: "pad".into(), credential: None },
//!     Arc::new(MemoryIdentityProvider::new()),
//!     Arc::new(MemoryStore::new()),
//! );
//!
//! client.connect()?;
//! client.create("Buy milk")?;
//!
//! for record in client.current_records() {
//!     println!("{}: {}", record.id, record.text);
//! }
//! ```

pub mod client;
pub mod error;
pub mod memory;
pub mod mutations;
pub mod notify;
pub mod remote;
pub mod session;
pub mod types;
pub mod view;

// Re-exports
pub use client::{Client, ClientConfig};
pub use error::{ClientError, RemoteError, RemoteErrorKind, Result};
pub use memory::{MemoryIdentityProvider, MemoryStore};
pub use mutations::MutationGateway;
pub use notify::{
    ClientEvent, DropReason, EventBus, EventFilter, EventHandle, EventSubscriptionId, EventsConfig,
};
pub use remote::{
    CollectionObserver, DocumentStore, IdentityObserver, IdentityProvider, SubscriptionGuard,
};
pub use session::Session;
pub use types::*;
pub use view::CollectionView;
