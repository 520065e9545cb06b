//! In-memory backends implementing the consumed interfaces.
//!
//! [`MemoryIdentityProvider`] and [`MemoryStore`] back tests, benches, and
//! embeddings that need the full client lifecycle without a network
//! backend. The store honors the real contract: monotonic server-assigned
//! timestamps, never-reused document ids, and full-state delivery to every
//! path subscriber on every change.

mod identity;
mod store;

pub use identity::MemoryIdentityProvider;
pub use store::MemoryStore;
