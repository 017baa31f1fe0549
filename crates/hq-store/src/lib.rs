//! # hq-store
//!
//! Persistent per-symbol bar archive over a single file-backed SQLite
//! database: idempotent upserts with the stale-today repair, tail range
//! queries, and per-symbol sync-state metadata.
//!
//! The schema is two tables (`bars`, `sync_log`) plus one descending index;
//! migrations are embedded and applied on open. Blocking diesel work runs
//! on the blocking pool so callers stay async.

pub mod connection;
pub mod error;
pub mod models;
pub mod schema;
pub mod store;

pub use connection::{establish_pool, establish_pool_with_size, SqlitePool, MIGRATIONS};
pub use error::{StoreError, StoreResult};
pub use models::{BarRow, NewBarRow, SyncLogRow};
pub use store::LocalStore;
