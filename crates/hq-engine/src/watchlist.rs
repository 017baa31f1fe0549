//! User watchlist: three named lists persisted as one JSON file.

use crate::error::{EngineError, EngineResult};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Mutex;

pub const GROUPS: [&str; 3] = ["favorites", "holdings", "watching"];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchlistData {
  pub favorites: Vec<String>,
  pub holdings: Vec<String>,
  pub watching: Vec<String>,
}

impl WatchlistData {
  fn group_mut(&mut self, group: &str) -> Option<&mut Vec<String>> {
    match group {
      "favorites" => Some(&mut self.favorites),
      "holdings" => Some(&mut self.holdings),
      "watching" => Some(&mut self.watching),
      _ => None,
    }
  }
}

pub struct Watchlist {
  path: PathBuf,
  // Serializes read-modify-write cycles on the backing file.
  write_lock: Mutex<()>,
}

impl Watchlist {
  /// Open the watchlist file, creating an empty one when missing.
  pub fn open(path: impl Into<PathBuf>) -> EngineResult<Self> {
    let path = path.into();
    if let Some(parent) = path.parent() {
      if !parent.as_os_str().is_empty() {
        std::fs::create_dir_all(parent)?;
      }
    }
    let list = Self { path, write_lock: Mutex::new(()) };
    if !list.path.exists() {
      list.save(&WatchlistData::default())?;
    }
    Ok(list)
  }

  pub fn groups(&self) -> EngineResult<WatchlistData> {
    let raw = std::fs::read_to_string(&self.path)?;
    Ok(serde_json::from_str(&raw)?)
  }

  /// Add a code to a group; `Ok(false)` when it is already present.
  pub fn add(&self, group: &str, code: &str) -> EngineResult<bool> {
    let _guard = self.lock();
    let mut data = self.groups()?;
    let list = data
      .group_mut(group)
      .ok_or_else(|| EngineError::InvalidInput(format!("unknown watchlist group: {}", group)))?;
    if list.iter().any(|c| c == code) {
      return Ok(false);
    }
    list.push(code.to_string());
    self.save(&data)?;
    Ok(true)
  }

  /// Remove a code from a group; `Ok(false)` when it was not present.
  pub fn remove(&self, group: &str, code: &str) -> EngineResult<bool> {
    let _guard = self.lock();
    let mut data = self.groups()?;
    let list = data
      .group_mut(group)
      .ok_or_else(|| EngineError::InvalidInput(format!("unknown watchlist group: {}", group)))?;
    let before = list.len();
    list.retain(|c| c != code);
    if list.len() == before {
      return Ok(false);
    }
    self.save(&data)?;
    Ok(true)
  }

  fn lock(&self) -> std::sync::MutexGuard<'_, ()> {
    self.write_lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
  }

  fn save(&self, data: &WatchlistData) -> EngineResult<()> {
    let tmp = self.path.with_extension("tmp");
    std::fs::write(&tmp, serde_json::to_string_pretty(data)?)?;
    std::fs::rename(&tmp, &self.path)?;
    Ok(())
  }
}

impl std::fmt::Debug for Watchlist {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Watchlist").field("path", &self.path).finish()
  }
}
