//! Tjänster för Youthroll
//!
//! Lokal lagring, synk mot servern och härledda värden.

pub mod dirty;
pub mod events;
pub mod points;
pub mod registry;
pub mod remote;
pub mod session;
pub mod stats;
pub mod store;
pub mod sync;

pub use dirty::DirtyTracker;
pub use events::{EventBus, StoreEvent};
pub use registry::{Registry, Saved};
pub use remote::{HttpRemoteStore, InMemoryRemoteStore, RemoteStore};
pub use session::Session;
pub use store::LocalStore;
pub use sync::{PullFailure, PullOutcome, SyncEngine};
