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

//! Read-mostly code→name snapshot, refreshed from one upstream listing at
//! most once per day.
//!
//! Serves the freshest snapshot even when stale, triggers a background
//! refresh past the max age, and consults a disk-persisted copy on first
//! load so a cold start does not hit upstream.

use crate::error::EngineResult;
use chrono::Duration as ChronoDuration;
use hq_core::Clock;
use hq_models::{DirectoryCacheFile, SymbolInfo};
use hq_providers::SymbolListSource;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{info, warn};

pub const MAX_SEARCH_RESULTS: usize = 50;
const MAX_AGE_HOURS: i64 = 24;

#[derive(Default)]
struct Snapshot {
  entries: Vec<SymbolInfo>,
  updated_at: Option<chrono::NaiveDateTime>,
}

pub struct SymbolDirectory {
  source: Arc<dyn SymbolListSource>,
  cache_path: PathBuf,
  clock: Arc<dyn Clock>,
  state: Mutex<Snapshot>,
  refreshing: AtomicBool,
}

impl SymbolDirectory {
  pub fn new(
    source: Arc<dyn SymbolListSource>,
    cache_path: impl Into<PathBuf>,
    clock: Arc<dyn Clock>,
  ) -> Arc<Self> {
    Arc::new(Self {
      source,
      cache_path: cache_path.into(),
      clock,
      state: Mutex::new(Snapshot::default()),
      refreshing: AtomicBool::new(false),
    })
  }

  fn lock(&self) -> MutexGuard<'_, Snapshot> {
    self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
  }

  fn is_stale(&self) -> bool {
    let state = self.lock();
    match state.updated_at {
      Some(at) => self.clock.now() - at > ChronoDuration::hours(MAX_AGE_HOURS),
      None => true,
    }
  }

  /// Make sure a snapshot is in memory: disk first, upstream only when
  /// neither memory nor disk has anything. A loaded-but-stale snapshot
  /// keeps serving while a background refresh runs.
  pub async fn ensure_loaded(self: &Arc<Self>) {
    if self.lock().entries.is_empty() {
      if let Some(file) = self.load_disk() {
        info!("symbol directory loaded {} entries from disk cache", file.codes.len());
        let mut state = self.lock();
        state.entries = file.codes;
        state.updated_at = file.updated_at;
      }
    }

    if self.lock().entries.is_empty() {
      if let Err(e) = self.refresh().await {
        warn!("symbol directory initial load failed: {}", e);
      }
      return;
    }

    if self.is_stale() {
      self.spawn_refresh();
    }
  }

  /// Pull the listing, swap the snapshot, persist to disk.
  pub async fn refresh(&self) -> EngineResult<()> {
    let entries = self.source.fetch_symbol_list().await?;
    if entries.is_empty() {
      warn!("symbol directory refresh returned an empty listing, keeping the old snapshot");
      return Ok(());
    }
    let updated_at = self.clock.now();

    {
      let mut state = self.lock();
      state.entries = entries.clone();
      state.updated_at = Some(updated_at);
    }

    let file = DirectoryCacheFile { codes: entries, updated_at: Some(updated_at) };
    if let Err(e) = self.save_disk(&file) {
      warn!("symbol directory could not persist the disk cache: {}", e);
    }
    info!("symbol directory refreshed with {} entries", file.codes.len());
    Ok(())
  }

  fn spawn_refresh(self: &Arc<Self>) {
    if self.refreshing.swap(true, Ordering::SeqCst) {
      return;
    }
    let directory = self.clone();
    tokio::spawn(async move {
      if let Err(e) = directory.refresh().await {
        warn!("symbol directory background refresh failed: {}", e);
      }
      directory.refreshing.store(false, Ordering::SeqCst);
    });
  }

  fn load_disk(&self) -> Option<DirectoryCacheFile> {
    let raw = std::fs::read_to_string(&self.cache_path).ok()?;
    match serde_json::from_str(&raw) {
      Ok(file) => Some(file),
      Err(e) => {
        warn!("symbol directory disk cache is unreadable: {}", e);
        None
      }
    }
  }

  fn save_disk(&self, file: &DirectoryCacheFile) -> EngineResult<()> {
    if let Some(parent) = self.cache_path.parent() {
      if !parent.as_os_str().is_empty() {
        std::fs::create_dir_all(parent)?;
      }
    }
    let tmp = self.cache_path.with_extension("tmp");
    std::fs::write(&tmp, serde_json::to_string(file)?)?;
    std::fs::rename(&tmp, &self.cache_path)?;
    Ok(())
  }

  /// Case-insensitive substring match on code or name, capped at
  /// [`MAX_SEARCH_RESULTS`].
  pub fn search(&self, query: &str, limit: usize) -> Vec<SymbolInfo> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
      return Vec::new();
    }
    let limit = limit.clamp(1, MAX_SEARCH_RESULTS);

    self
      .lock()
      .entries
      .iter()
      .filter(|e| e.code.to_lowercase().contains(&query) || e.name.to_lowercase().contains(&query))
      .take(limit)
      .cloned()
      .collect()
  }

  pub fn name_of(&self, code: &str) -> Option<String> {
    self.lock().entries.iter().find(|e| e.code == code).map(|e| e.name.clone())
  }

  pub fn codes(&self) -> Vec<String> {
    self.lock().entries.iter().map(|e| e.code.clone()).collect()
  }

  pub fn len(&self) -> usize {
    self.lock().entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }
}

impl std::fmt::Debug for SymbolDirectory {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("SymbolDirectory")
      .field("cache_path", &self.cache_path)
      .field("entries", &self.len())
      .finish()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use async_trait::async_trait;
  use chrono::NaiveDate;
  use hq_core::FixedClock;
  use std::sync::atomic::AtomicU32;

  struct MockListing {
    entries: Vec<SymbolInfo>,
    calls: AtomicU32,
  }

  impl MockListing {
    fn new(entries: Vec<SymbolInfo>) -> Arc<Self> {
      Arc::new(Self { entries, calls: AtomicU32::new(0) })
    }
  }

  #[async_trait]
  impl SymbolListSource for MockListing {
    async fn fetch_symbol_list(&self) -> hq_core::Result<Vec<SymbolInfo>> {
      self.calls.fetch_add(1, Ordering::SeqCst);
      Ok(self.entries.clone())
    }
  }

  fn entry(code: &str, name: &str) -> SymbolInfo {
    SymbolInfo { code: code.to_string(), name: name.to_string() }
  }

  fn clock() -> Arc<FixedClock> {
    Arc::new(FixedClock(
      NaiveDate::from_ymd_opt(2025, 6, 16).unwrap().and_hms_opt(10, 0, 0).unwrap(),
    ))
  }

  fn listing() -> Vec<SymbolInfo> {
    vec![entry("600519", "贵州茅台"), entry("000001", "平安银行"), entry("300750", "宁德时代")]
  }

  #[tokio::test]
  async fn test_cold_start_fetches_and_persists() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("symbol_directory_cache.json");
    let source = MockListing::new(listing());
    let directory = SymbolDirectory::new(source.clone(), &path, clock());

    directory.ensure_loaded().await;
    assert_eq!(directory.len(), 3);
    assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    assert!(path.exists());
  }

  #[tokio::test]
  async fn test_fresh_disk_cache_avoids_upstream() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("symbol_directory_cache.json");
    let file = DirectoryCacheFile {
      codes: listing(),
      updated_at: Some(clock().0 - ChronoDuration::hours(1)),
    };
    std::fs::write(&path, serde_json::to_string(&file).unwrap()).unwrap();

    let source = MockListing::new(listing());
    let directory = SymbolDirectory::new(source.clone(), &path, clock());
    directory.ensure_loaded().await;

    assert_eq!(directory.len(), 3);
    assert_eq!(source.calls.load(Ordering::SeqCst), 0);
  }

  #[tokio::test]
  async fn test_stale_disk_cache_serves_then_refreshes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("symbol_directory_cache.json");
    let file = DirectoryCacheFile {
      codes: vec![entry("600519", "贵州茅台")],
      updated_at: Some(clock().0 - ChronoDuration::hours(48)),
    };
    std::fs::write(&path, serde_json::to_string(&file).unwrap()).unwrap();

    let source = MockListing::new(listing());
    let directory = SymbolDirectory::new(source.clone(), &path, clock());
    directory.ensure_loaded().await;

    // The stale snapshot serves immediately.
    assert!(directory.len() >= 1);

    // And the background refresh lands shortly after.
    for _ in 0..50 {
      if directory.len() == 3 {
        break;
      }
      tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    assert_eq!(directory.len(), 3);
    assert_eq!(source.calls.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn test_search_matches_code_and_name() {
    let directory = SymbolDirectory::new(
      MockListing::new(listing()),
      tempfile::tempdir().unwrap().path().join("cache.json"),
      clock(),
    );
    directory.refresh().await.unwrap();

    assert_eq!(directory.search("600519", 10), vec![entry("600519", "贵州茅台")]);
    assert_eq!(directory.search("平安", 10), vec![entry("000001", "平安银行")]);
    assert_eq!(directory.search("guizhou-no-match", 10), Vec::<SymbolInfo>::new());
    assert_eq!(directory.search("", 10), Vec::<SymbolInfo>::new());
  }

  #[tokio::test]
  async fn test_search_limit_applied() {
    let directory = SymbolDirectory::new(
      MockListing::new(listing()),
      tempfile::tempdir().unwrap().path().join("cache.json"),
      clock(),
    );
    directory.refresh().await.unwrap();
    assert_eq!(directory.search("0", 1).len(), 1);
  }

  #[tokio::test]
  async fn test_name_lookup() {
    let directory = SymbolDirectory::new(
      MockListing::new(listing()),
      tempfile::tempdir().unwrap().path().join("cache.json"),
      clock(),
    );
    directory.refresh().await.unwrap();
    assert_eq!(directory.name_of("600519").as_deref(), Some("贵州茅台"));
    assert_eq!(directory.name_of("999999"), None);
  }
}
