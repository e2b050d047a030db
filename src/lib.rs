//! Youthroll - närvaroregister för ungdomsgrupper
//!
//! Lokal-först: allt skrivs till SQLite direkt och synkas sedan som ett
//! enda JSON-dokument mot servern.

pub mod db;
pub mod models;
pub mod services;
pub mod utils;

// Re-exports
pub use db::Database;
pub use models::*;
pub use services::{EventBus, LocalStore, Registry, StoreEvent, SyncEngine};
