use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Per-symbol synchronization metadata maintained by the local store.
///
/// `full_history_completed` is a one-way latch: once the backfill walks past
/// the earliest bar the provider has, no further history is expected and the
/// flag never reverts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncState {
  pub symbol: String,
  pub last_sync_at: NaiveDateTime,
  pub first_bar_date: Option<NaiveDate>,
  pub last_bar_date: Option<NaiveDate>,
  pub bar_count: i64,
  pub full_history_completed: bool,
}

/// Aggregate archive statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreStats {
  pub symbols: i64,
  pub total_rows: i64,
  pub size_bytes: u64,
}
