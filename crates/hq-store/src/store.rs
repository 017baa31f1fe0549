/*
 *
 *
 *
 *
 * MIT License
 * Copyright (c) 2025. Dwight J. Browne
 * dwight[-at-]dwightjbrowne[-dot-]com
 *
 *
 * Permission is hereby granted, free of charge, to any person obtaining a copy
 * of this software and associated documentation files (the "Software"), to deal
 * in the Software without restriction, including without limitation the rights
 * to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
 * copies of the Software, and to permit persons to whom the Software is
 * furnished to do so, subject to the following conditions:
 *
 * The above copyright notice and this permission notice shall be included in all
 * copies or substantial portions of the Software.
 *
 * THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
 * IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
 * FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
 * AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
 * LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
 * OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
 * SOFTWARE.
 */

//! The per-symbol bar archive.
//!
//! Upserts are idempotent outside the today-overwrite path and run inside a
//! single transaction: a crash mid-upsert leaves the archive in its
//! pre-upsert state. Readers never observe a partial batch.

use crate::connection::{establish_pool, SqlitePool};
use crate::error::{StoreError, StoreResult};
use crate::models::{BarRow, NewBarRow, SyncLogRow};
use crate::schema::{bars, sync_log};
use chrono::{NaiveDate, NaiveDateTime};
use diesel::dsl::{count_star, max, min};
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use hq_core::calendar::market_close;
use hq_models::{normalize_bars, Bar, StoreStats, SyncState};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::info;

const INSERT_CHUNK: usize = 500;

#[derive(Clone)]
pub struct LocalStore {
  pool: SqlitePool,
  db_path: PathBuf,
}

impl LocalStore {
  /// Open (or create) the archive at `db_path`, creating parent
  /// directories and applying pending migrations.
  pub fn open(db_path: impl AsRef<Path>) -> StoreResult<Self> {
    let db_path = db_path.as_ref().to_path_buf();
    if let Some(parent) = db_path.parent() {
      if !parent.as_os_str().is_empty() {
        std::fs::create_dir_all(parent)?;
      }
    }
    let pool = establish_pool(&db_path.to_string_lossy())?;
    info!("bar archive ready at {}", db_path.display());
    Ok(Self { pool, db_path })
  }

  /// In-memory archive for tests.
  pub fn open_in_memory() -> StoreResult<Self> {
    let pool = establish_pool(":memory:")?;
    Ok(Self { pool, db_path: PathBuf::from(":memory:") })
  }

  async fn with_conn<T, F>(&self, f: F) -> StoreResult<T>
  where
    F: FnOnce(&mut SqliteConnection) -> StoreResult<T> + Send + 'static,
    T: Send + 'static,
  {
    let pool = self.pool.clone();
    tokio::task::spawn_blocking(move || {
      let mut conn = pool.get().map_err(|e| StoreError::Pool(e.to_string()))?;
      f(&mut conn)
    })
    .await
    .map_err(|e| StoreError::Runtime(e.to_string()))?
  }

  /// True when at least `min_days` bars are held for the symbol.
  pub async fn has(&self, symbol: &str, min_days: usize) -> StoreResult<bool> {
    let symbol = symbol.to_string();
    self
      .with_conn(move |conn| {
        let count: i64 = bars::table
          .filter(bars::symbol.eq(&symbol))
          .select(count_star())
          .first(conn)
          .map_err(StoreError::from)?;
        Ok(count >= min_days as i64)
      })
      .await
  }

  /// The most recent `last_n` bars (all of them when `None`), ordered by
  /// date ascending.
  pub async fn bars(&self, symbol: &str, last_n: Option<usize>) -> StoreResult<Vec<Bar>> {
    let symbol = symbol.to_string();
    self
      .with_conn(move |conn| {
        let query = bars::table
          .filter(bars::symbol.eq(&symbol))
          .order(bars::date.desc())
          .select(BarRow::as_select());
        let rows: Vec<BarRow> = match last_n {
          Some(n) => query.limit(n as i64).load(conn)?,
          None => query.load(conn)?,
        };
        let mut out: Vec<Bar> = rows.into_iter().map(Bar::from).collect();
        out.reverse();
        Ok(out)
      })
      .await
  }

  /// Idempotent batch insert with the stale-today repair.
  ///
  /// Inside one transaction: dedup input by date, drop dates already held,
  /// delete a today-row written before 15:00 when the input carries a
  /// replacement, insert what remains, refresh the sync log. Returns the
  /// number of newly inserted rows.
  pub async fn upsert(
    &self,
    symbol: &str,
    incoming: Vec<Bar>,
    now: NaiveDateTime,
  ) -> StoreResult<usize> {
    if incoming.is_empty() {
      return Ok(0);
    }
    let symbol = symbol.to_string();
    self
      .with_conn(move |conn| {
        let incoming = normalize_bars(incoming);
        let inserted = conn.transaction::<usize, diesel::result::Error, _>(|conn| {
          let existing: Vec<NaiveDate> =
            bars::table.filter(bars::symbol.eq(&symbol)).select(bars::date).load(conn)?;
          let mut existing: HashSet<NaiveDate> = existing.into_iter().collect();

          let today = now.date();
          if existing.contains(&today) && incoming.iter().any(|b| b.date == today) {
            let prior_sync: Option<NaiveDateTime> = sync_log::table
              .filter(sync_log::symbol.eq(&symbol))
              .select(sync_log::last_sync_at)
              .first(conn)
              .optional()?;

            if prior_sync.map(|t| t < market_close(today)).unwrap_or(false) {
              diesel::delete(
                bars::table.filter(bars::symbol.eq(&symbol)).filter(bars::date.eq(today)),
              )
              .execute(conn)?;
              existing.remove(&today);
              info!("{}: replacing today's pre-close bar", symbol);
            }
          }

          let new_rows: Vec<NewBarRow> = incoming
            .iter()
            .filter(|b| !existing.contains(&b.date))
            .map(|b| {
              let mut row = NewBarRow::from(b);
              row.symbol = symbol.clone();
              row
            })
            .collect();

          for chunk in new_rows.chunks(INSERT_CHUNK) {
            diesel::insert_into(bars::table).values(chunk).execute(conn)?;
          }

          let bar_count: i64 =
            bars::table.filter(bars::symbol.eq(&symbol)).select(count_star()).first(conn)?;
          let first: Option<NaiveDate> =
            bars::table.filter(bars::symbol.eq(&symbol)).select(min(bars::date)).first(conn)?;
          let last: Option<NaiveDate> =
            bars::table.filter(bars::symbol.eq(&symbol)).select(max(bars::date)).first(conn)?;
          let full: bool = sync_log::table
            .filter(sync_log::symbol.eq(&symbol))
            .select(sync_log::full_history_completed)
            .first(conn)
            .optional()?
            .unwrap_or(false);

          diesel::replace_into(sync_log::table)
            .values(SyncLogRow {
              symbol: symbol.clone(),
              last_sync_at: now,
              first_bar_date: first,
              last_bar_date: last,
              bar_count,
              full_history_completed: full,
            })
            .execute(conn)?;

          Ok(new_rows.len())
        })?;

        if inserted > 0 {
          info!("{}: {} new rows", symbol, inserted);
        }
        Ok(inserted)
      })
      .await
  }

  pub async fn last_date(&self, symbol: &str) -> StoreResult<Option<NaiveDate>> {
    let symbol = symbol.to_string();
    self
      .with_conn(move |conn| {
        bars::table
          .filter(bars::symbol.eq(&symbol))
          .select(max(bars::date))
          .first(conn)
          .map_err(StoreError::from)
      })
      .await
  }

  pub async fn first_date(&self, symbol: &str) -> StoreResult<Option<NaiveDate>> {
    let symbol = symbol.to_string();
    self
      .with_conn(move |conn| {
        bars::table
          .filter(bars::symbol.eq(&symbol))
          .select(min(bars::date))
          .first(conn)
          .map_err(StoreError::from)
      })
      .await
  }

  /// Latch the full-history flag for a symbol. One-way: nothing public
  /// resets it.
  pub async fn mark_full_history(&self, symbol: &str) -> StoreResult<()> {
    let symbol = symbol.to_string();
    self
      .with_conn(move |conn| {
        diesel::update(sync_log::table.filter(sync_log::symbol.eq(&symbol)))
          .set(sync_log::full_history_completed.eq(true))
          .execute(conn)
          .map_err(StoreError::from)?;
        Ok(())
      })
      .await
  }

  pub async fn is_full_history(&self, symbol: &str) -> StoreResult<bool> {
    let symbol = symbol.to_string();
    self
      .with_conn(move |conn| {
        let full: Option<bool> = sync_log::table
          .filter(sync_log::symbol.eq(&symbol))
          .select(sync_log::full_history_completed)
          .first(conn)
          .optional()?;
        Ok(full.unwrap_or(false))
      })
      .await
  }

  pub async fn sync_state(&self, symbol: &str) -> StoreResult<Option<SyncState>> {
    let symbol = symbol.to_string();
    self
      .with_conn(move |conn| {
        let row: Option<SyncLogRow> = sync_log::table
          .filter(sync_log::symbol.eq(&symbol))
          .select(SyncLogRow::as_select())
          .first(conn)
          .optional()?;
        Ok(row.map(SyncState::from))
      })
      .await
  }

  /// Every tracked symbol's sync state, most recently synced first.
  pub async fn all_synced(&self) -> StoreResult<Vec<SyncState>> {
    self
      .with_conn(move |conn| {
        let rows: Vec<SyncLogRow> = sync_log::table
          .order(sync_log::last_sync_at.desc())
          .select(SyncLogRow::as_select())
          .load(conn)?;
        Ok(rows.into_iter().map(SyncState::from).collect())
      })
      .await
  }

  pub async fn stats(&self) -> StoreResult<StoreStats> {
    let db_path = self.db_path.clone();
    self
      .with_conn(move |conn| {
        let symbols: i64 =
          bars::table.select(diesel::dsl::count_distinct(bars::symbol)).first(conn)?;
        let total_rows: i64 = bars::table.select(count_star()).first(conn)?;
        let size_bytes = std::fs::metadata(&db_path).map(|m| m.len()).unwrap_or(0);
        Ok(StoreStats { symbols, total_rows, size_bytes })
      })
      .await
  }
}

impl std::fmt::Debug for LocalStore {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("LocalStore").field("db_path", &self.db_path).finish()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::NaiveDate;
  use pretty_assertions::assert_eq;

  fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
  }

  fn at(d: NaiveDate, h: u32, min: u32) -> NaiveDateTime {
    d.and_hms_opt(h, min, 0).unwrap()
  }

  fn bar(day: NaiveDate, close: f64) -> Bar {
    Bar::new("600519", day, close - 1.0, close + 1.0, close - 2.0, close, 1000.0)
  }

  fn week_of_bars() -> Vec<Bar> {
    (16..=20).map(|d| bar(date(2025, 6, d), 100.0 + d as f64)).collect()
  }

  #[tokio::test]
  async fn test_upsert_and_read_back_ascending() {
    let store = LocalStore::open_in_memory().unwrap();
    let now = at(date(2025, 6, 20), 16, 0);
    let inserted = store.upsert("600519", week_of_bars(), now).await.unwrap();
    assert_eq!(inserted, 5);

    let bars = store.bars("600519", None).await.unwrap();
    assert_eq!(bars.len(), 5);
    assert!(bars.windows(2).all(|w| w[0].date < w[1].date));
  }

  #[tokio::test]
  async fn test_last_n_returns_tail() {
    let store = LocalStore::open_in_memory().unwrap();
    let now = at(date(2025, 6, 20), 16, 0);
    store.upsert("600519", week_of_bars(), now).await.unwrap();

    let tail = store.bars("600519", Some(2)).await.unwrap();
    assert_eq!(tail.len(), 2);
    assert_eq!(tail[0].date, date(2025, 6, 19));
    assert_eq!(tail[1].date, date(2025, 6, 20));
  }

  #[tokio::test]
  async fn test_upsert_is_idempotent() {
    let store = LocalStore::open_in_memory().unwrap();
    let now = at(date(2025, 6, 20), 16, 0);
    store.upsert("600519", week_of_bars(), now).await.unwrap();
    let second = store.upsert("600519", week_of_bars(), now).await.unwrap();
    assert_eq!(second, 0);
    assert_eq!(store.bars("600519", None).await.unwrap().len(), 5);
  }

  #[tokio::test]
  async fn test_upsert_dedupes_input() {
    let store = LocalStore::open_in_memory().unwrap();
    let now = at(date(2025, 6, 20), 16, 0);
    let mut input = week_of_bars();
    input.push(bar(date(2025, 6, 18), 999.0));
    let inserted = store.upsert("600519", input, now).await.unwrap();
    assert_eq!(inserted, 5);
  }

  #[tokio::test]
  async fn test_today_bar_replaced_when_prior_write_was_pre_close() {
    let store = LocalStore::open_in_memory().unwrap();
    let today = date(2025, 6, 20);

    // Intraday write at 10:03.
    store.upsert("600519", vec![bar(today, 100.0)], at(today, 10, 3)).await.unwrap();

    // Refetch after close carries the settled bar.
    store.upsert("600519", vec![bar(today, 105.0)], at(today, 15, 30)).await.unwrap();

    let bars = store.bars("600519", None).await.unwrap();
    assert_eq!(bars.len(), 1);
    assert_eq!(bars[0].close, 105.0);
  }

  #[tokio::test]
  async fn test_today_bar_kept_when_prior_write_was_post_close() {
    let store = LocalStore::open_in_memory().unwrap();
    let today = date(2025, 6, 20);

    store.upsert("600519", vec![bar(today, 105.0)], at(today, 15, 30)).await.unwrap();
    store.upsert("600519", vec![bar(today, 999.0)], at(today, 16, 0)).await.unwrap();

    let bars = store.bars("600519", None).await.unwrap();
    assert_eq!(bars.len(), 1);
    assert_eq!(bars[0].close, 105.0);
  }

  #[tokio::test]
  async fn test_sync_state_tracks_counts_and_bounds() {
    let store = LocalStore::open_in_memory().unwrap();
    let now = at(date(2025, 6, 20), 16, 0);
    store.upsert("600519", week_of_bars(), now).await.unwrap();

    let state = store.sync_state("600519").await.unwrap().unwrap();
    assert_eq!(state.bar_count, 5);
    assert_eq!(state.first_bar_date, Some(date(2025, 6, 16)));
    assert_eq!(state.last_bar_date, Some(date(2025, 6, 20)));
    assert_eq!(state.last_sync_at, now);
    assert!(!state.full_history_completed);

    assert_eq!(store.first_date("600519").await.unwrap(), Some(date(2025, 6, 16)));
    assert_eq!(store.last_date("600519").await.unwrap(), Some(date(2025, 6, 20)));
  }

  #[tokio::test]
  async fn test_full_history_latch_survives_upserts() {
    let store = LocalStore::open_in_memory().unwrap();
    let now = at(date(2025, 6, 20), 16, 0);
    store.upsert("600519", week_of_bars(), now).await.unwrap();

    assert!(!store.is_full_history("600519").await.unwrap());
    store.mark_full_history("600519").await.unwrap();
    assert!(store.is_full_history("600519").await.unwrap());

    // A later upsert must not reset the latch.
    store
      .upsert("600519", vec![bar(date(2025, 6, 23), 130.0)], at(date(2025, 6, 23), 16, 0))
      .await
      .unwrap();
    assert!(store.is_full_history("600519").await.unwrap());
  }

  #[tokio::test]
  async fn test_has_threshold() {
    let store = LocalStore::open_in_memory().unwrap();
    let now = at(date(2025, 6, 20), 16, 0);
    store.upsert("600519", week_of_bars(), now).await.unwrap();

    assert!(store.has("600519", 5).await.unwrap());
    assert!(!store.has("600519", 6).await.unwrap());
    assert!(!store.has("000001", 1).await.unwrap());
  }

  #[tokio::test]
  async fn test_stats_and_all_synced() {
    let store = LocalStore::open_in_memory().unwrap();
    let now = at(date(2025, 6, 20), 16, 0);
    store.upsert("600519", week_of_bars(), now).await.unwrap();
    store.upsert("000001", vec![bar(date(2025, 6, 20), 12.0)], now).await.unwrap();

    let stats = store.stats().await.unwrap();
    assert_eq!(stats.symbols, 2);
    assert_eq!(stats.total_rows, 6);

    let synced = store.all_synced().await.unwrap();
    assert_eq!(synced.len(), 2);
  }

  #[tokio::test]
  async fn test_empty_upsert_is_noop() {
    let store = LocalStore::open_in_memory().unwrap();
    let now = at(date(2025, 6, 20), 16, 0);
    assert_eq!(store.upsert("600519", vec![], now).await.unwrap(), 0);
    assert!(store.sync_state("600519").await.unwrap().is_none());
  }
}
