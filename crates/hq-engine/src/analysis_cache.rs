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

//! Bounded LRU with per-entry TTL over analyzer outputs, keyed by symbol.
//! Everything runs under one mutex; entries expire on read and the oldest
//! entry is evicted on overflow.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

pub const DEFAULT_CAPACITY: usize = 50;
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

struct Entry<V> {
  value: V,
  stored_at: Instant,
}

struct Inner<V> {
  map: HashMap<String, Entry<V>>,
  /// Recency order, oldest first.
  order: Vec<String>,
}

pub struct AnalysisCache<V> {
  inner: Mutex<Inner<V>>,
  capacity: usize,
  ttl: Duration,
}

impl<V: Clone> AnalysisCache<V> {
  pub fn new(capacity: usize, ttl: Duration) -> Self {
    Self {
      inner: Mutex::new(Inner { map: HashMap::new(), order: Vec::new() }),
      capacity: capacity.max(1),
      ttl,
    }
  }

  pub fn with_defaults() -> Self {
    Self::new(DEFAULT_CAPACITY, DEFAULT_TTL)
  }

  fn lock(&self) -> MutexGuard<'_, Inner<V>> {
    self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
  }

  /// Fresh value or miss; an expired entry is evicted on the spot.
  pub fn get(&self, key: &str) -> Option<V> {
    let mut inner = self.lock();

    let fresh = match inner.map.get(key) {
      Some(entry) => entry.stored_at.elapsed() <= self.ttl,
      None => return None,
    };

    if !fresh {
      inner.map.remove(key);
      inner.order.retain(|k| k != key);
      return None;
    }

    // Touch for recency.
    inner.order.retain(|k| k != key);
    inner.order.push(key.to_string());
    inner.map.get(key).map(|e| e.value.clone())
  }

  /// Store a value, evicting the least recently used entry on overflow.
  pub fn set(&self, key: impl Into<String>, value: V) {
    let key = key.into();
    let mut inner = self.lock();

    inner.order.retain(|k| k != &key);
    inner.map.insert(key.clone(), Entry { value, stored_at: Instant::now() });
    inner.order.push(key);

    while inner.map.len() > self.capacity {
      let Some(oldest) = inner.order.first().cloned() else { break };
      inner.order.remove(0);
      inner.map.remove(&oldest);
    }
  }

  pub fn len(&self) -> usize {
    self.lock().map.len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  pub fn clear(&self) {
    let mut inner = self.lock();
    inner.map.clear();
    inner.order.clear();
  }
}

impl<V> std::fmt::Debug for AnalysisCache<V> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("AnalysisCache")
      .field("capacity", &self.capacity)
      .field("ttl", &self.ttl)
      .finish()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_hit_and_miss() {
    let cache = AnalysisCache::new(10, Duration::from_secs(60));
    cache.set("600519", 42);
    assert_eq!(cache.get("600519"), Some(42));
    assert_eq!(cache.get("000001"), None);
  }

  #[test]
  fn test_expiry_evicts() {
    let cache = AnalysisCache::new(10, Duration::from_millis(0));
    cache.set("600519", 42);
    std::thread::sleep(Duration::from_millis(5));
    assert_eq!(cache.get("600519"), None);
    assert!(cache.is_empty());
  }

  #[test]
  fn test_overflow_evicts_oldest() {
    let cache = AnalysisCache::new(2, Duration::from_secs(60));
    cache.set("a", 1);
    cache.set("b", 2);
    cache.set("c", 3);
    assert_eq!(cache.len(), 2);
    assert_eq!(cache.get("a"), None);
    assert_eq!(cache.get("b"), Some(2));
    assert_eq!(cache.get("c"), Some(3));
  }

  #[test]
  fn test_get_refreshes_recency() {
    let cache = AnalysisCache::new(2, Duration::from_secs(60));
    cache.set("a", 1);
    cache.set("b", 2);
    // Touch "a" so "b" becomes the eviction candidate.
    cache.get("a");
    cache.set("c", 3);
    assert_eq!(cache.get("a"), Some(1));
    assert_eq!(cache.get("b"), None);
  }

  #[test]
  fn test_set_replaces_existing() {
    let cache = AnalysisCache::new(2, Duration::from_secs(60));
    cache.set("a", 1);
    cache.set("a", 9);
    assert_eq!(cache.len(), 1);
    assert_eq!(cache.get("a"), Some(9));
  }

  #[test]
  fn test_clear() {
    let cache = AnalysisCache::new(2, Duration::from_secs(60));
    cache.set("a", 1);
    cache.clear();
    assert!(cache.is_empty());
  }
}
