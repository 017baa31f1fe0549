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

//! Short-TTL in-memory cache of live quotes with a provider fallback chain.
//!
//! Last-writer-wins; market-snapshot results share the cache keyed by the
//! snapshot size. Quotes older than the TTL are refetched through the
//! configured provider order.

use crate::error::{EngineError, EngineResult};
use hq_core::Symbol;
use hq_models::Quote;
use hq_providers::{FallbackExecutor, MarketDataSource};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tracing::debug;

/// Public batch surface caps at this many symbols per call.
pub const MAX_QUOTE_BATCH: usize = 50;

struct Caches {
  quotes: HashMap<String, (Quote, Instant)>,
  snapshots: HashMap<usize, (Vec<Quote>, Instant)>,
}

pub struct RealtimeQuoteService {
  chain: Vec<Arc<dyn MarketDataSource>>,
  ttl: Duration,
  caches: Mutex<Caches>,
}

impl RealtimeQuoteService {
  pub fn new(chain: Vec<Arc<dyn MarketDataSource>>, ttl: Duration) -> Self {
    Self {
      chain,
      ttl,
      caches: Mutex::new(Caches { quotes: HashMap::new(), snapshots: HashMap::new() }),
    }
  }

  fn lock(&self) -> MutexGuard<'_, Caches> {
    self.caches.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
  }

  pub fn provider_names(&self) -> Vec<&'static str> {
    self.chain.iter().map(|s| s.name()).collect()
  }

  fn cached(&self, code: &str) -> Option<Quote> {
    let caches = self.lock();
    caches
      .quotes
      .get(code)
      .filter(|(_, stored_at)| stored_at.elapsed() <= self.ttl)
      .map(|(quote, _)| quote.clone())
  }

  /// Run the fallback chain for a set of symbols and cache whatever comes
  /// back.
  async fn fetch_batch(&self, symbols: &[Symbol]) -> Option<HashMap<String, Quote>> {
    if symbols.is_empty() {
      return Some(HashMap::new());
    }
    let context = if symbols.len() == 1 {
      format!("[{}]", symbols[0].code())
    } else {
      format!("[{} symbols]", symbols.len())
    };

    let mut executor = FallbackExecutor::new(context);
    for source in &self.chain {
      let src = source.clone();
      let batch = symbols.to_vec();
      executor = executor.attempt(src.name(), async move { src.fetch_quotes(&batch).await });
    }

    let map = executor.execute().await?;

    let now = Instant::now();
    let mut caches = self.lock();
    for (code, quote) in &map {
      caches.quotes.insert(code.clone(), (quote.clone(), now));
    }
    Some(map)
  }

  /// One live quote, cache-first.
  pub async fn quote(&self, symbol: &Symbol) -> Option<Quote> {
    if let Some(quote) = self.cached(symbol.code()) {
      debug!("{}: quote served from cache", symbol.code());
      return Some(quote);
    }
    let map = self.fetch_batch(std::slice::from_ref(symbol)).await?;
    map.get(symbol.code()).cloned()
  }

  /// Batch quotes in request order; symbols no provider carries are
  /// omitted. Capped at [`MAX_QUOTE_BATCH`].
  pub async fn quotes(&self, symbols: &[Symbol]) -> EngineResult<Vec<Quote>> {
    if symbols.len() > MAX_QUOTE_BATCH {
      return Err(EngineError::InvalidInput(format!(
        "at most {} symbols per batch, got {}",
        MAX_QUOTE_BATCH,
        symbols.len()
      )));
    }

    let mut found: HashMap<String, Quote> = HashMap::new();
    let mut missing: Vec<Symbol> = Vec::new();
    for symbol in symbols {
      match self.cached(symbol.code()) {
        Some(quote) => {
          found.insert(symbol.code().to_string(), quote);
        }
        None => missing.push(symbol.clone()),
      }
    }

    if !missing.is_empty() {
      if let Some(map) = self.fetch_batch(&missing).await {
        found.extend(map);
      }
    }

    Ok(symbols.iter().filter_map(|s| found.get(s.code()).cloned()).collect())
  }

  /// Top-`limit` market snapshot over the given code universe, cached under
  /// the snapshot size.
  pub async fn market_snapshot(&self, universe: &[Symbol], limit: usize) -> Vec<Quote> {
    let take = if limit == 0 { universe.len() } else { limit.min(universe.len()) };

    {
      let caches = self.lock();
      if let Some((snapshot, stored_at)) = caches.snapshots.get(&take) {
        if stored_at.elapsed() <= self.ttl {
          return snapshot.clone();
        }
      }
    }

    let subset = &universe[..take];
    let map = self.fetch_batch(subset).await.unwrap_or_default();
    let snapshot: Vec<Quote> = subset.iter().filter_map(|s| map.get(s.code()).cloned()).collect();

    self.lock().snapshots.insert(take, (snapshot.clone(), Instant::now()));
    snapshot
  }
}

impl std::fmt::Debug for RealtimeQuoteService {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("RealtimeQuoteService")
      .field("providers", &self.provider_names())
      .field("ttl", &self.ttl)
      .finish()
  }
}
