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

//! Smart bar fetching.
//!
//! The warm path serves straight from the local archive and only schedules
//! background work; the cold path fetches synchronously through the
//! provider fallback chain, persists, and schedules backfill. During a live
//! session a synthetic bar for today is fused onto the series from the
//! realtime quote cache.

use crate::error::{EngineError, EngineResult};
use crate::quote_cache::RealtimeQuoteService;
use crate::work_queue::{TaskPriority, WorkQueue};
use chrono::{Duration as ChronoDuration, NaiveDate};
use hq_core::calendar::{is_trading_day, is_trading_session, last_trading_day, market_close, Clock};
use hq_core::{Symbol, BACKFILL_MAX_ITERATIONS, DATA_COMPLETENESS_RATIO, MAX_PAGE_ITERATIONS};
use hq_models::{normalize_bars, Bar, StoreStats, SyncState};
use hq_providers::{FallbackExecutor, MarketDataSource};
use hq_store::LocalStore;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// The bar-capable provider ordering material. `fast` is preferred for
/// windows it can serve in one page, `deep` for anything larger, and
/// `last_resort` is always appended as the final attempt.
pub struct BarProviderSet {
  pub fast: Arc<dyn MarketDataSource>,
  pub deep: Arc<dyn MarketDataSource>,
  pub last_resort: Option<Arc<dyn MarketDataSource>>,
}

#[derive(Debug, Clone)]
pub struct BarServiceConfig {
  /// Locally-held share of the requested window that counts as sufficient.
  pub sufficiency_ratio: f64,
  /// Delay between paged upstream calls.
  pub rate_limit_delay: Duration,
  /// Pages fetched per backfill task run.
  pub backfill_max_iterations: usize,
  /// Safety cap on page iterations for one request.
  pub max_page_iterations: usize,
}

impl Default for BarServiceConfig {
  fn default() -> Self {
    Self {
      sufficiency_ratio: DATA_COMPLETENESS_RATIO,
      rate_limit_delay: Duration::from_millis(hq_core::DEFAULT_RATE_LIMIT_DELAY_MS),
      backfill_max_iterations: BACKFILL_MAX_ITERATIONS,
      max_page_iterations: MAX_PAGE_ITERATIONS,
    }
  }
}

pub struct BarService {
  store: LocalStore,
  providers: BarProviderSet,
  quotes: Arc<RealtimeQuoteService>,
  queue: Arc<WorkQueue>,
  clock: Arc<dyn Clock>,
  config: BarServiceConfig,
}

impl BarService {
  pub fn new(
    store: LocalStore,
    providers: BarProviderSet,
    quotes: Arc<RealtimeQuoteService>,
    queue: Arc<WorkQueue>,
    clock: Arc<dyn Clock>,
    config: BarServiceConfig,
  ) -> Arc<Self> {
    Arc::new(Self { store, providers, quotes, queue, clock, config })
  }

  pub fn store(&self) -> &LocalStore {
    &self.store
  }

  /// The last N days of bars for a symbol, optionally fused with today's
  /// live tick. `None` means no source could produce data.
  pub async fn bars(
    self: &Arc<Self>,
    symbol: &Symbol,
    days: usize,
    with_live: bool,
  ) -> EngineResult<Option<Vec<Bar>>> {
    if days == 0 {
      return Err(EngineError::InvalidInput("days must be at least 1".to_string()));
    }
    let code = symbol.code();

    // Storage errors degrade to a cache miss; the warm read never fails on
    // them.
    let local = match self.store.bars(code, Some(days)).await {
      Ok(bars) => bars,
      Err(e) => {
        error!("{}: local read failed, treating as miss: {}", code, e);
        Vec::new()
      }
    };

    let needed = (days as f64 * self.config.sufficiency_ratio).ceil() as usize;
    if local.len() >= needed {
      debug!("{}: serving {} bars from the local archive", code, local.len());
      self.schedule_maintenance(symbol).await;
      let bars = self.maybe_fuse_live(symbol, local, with_live).await;
      return Ok(Some(bars));
    }

    info!("{}: local data insufficient ({}/{}), fetching upstream", code, local.len(), needed);
    let Some(fetched) = self.fetch_with_fallback(symbol, days, false).await else {
      error!("{}: every bar source failed or returned nothing", code);
      return Ok(None);
    };

    if let Err(e) = self.store.upsert(code, fetched.clone(), self.clock.now()).await {
      error!("{}: failed to persist fetched bars: {}", code, e);
    }
    self.schedule_backfill(symbol);

    let mut bars = fetched;
    if bars.len() > days {
      bars.drain(..bars.len() - days);
    }
    let bars = self.maybe_fuse_live(symbol, bars, with_live).await;
    Ok(Some(bars))
  }

  /// Warm-path bookkeeping: an incremental update when the archive lags the
  /// last trading day (or today's bar went stale), a backfill while history
  /// is incomplete.
  async fn schedule_maintenance(self: &Arc<Self>, symbol: &Symbol) {
    let code = symbol.code();

    let last = match self.store.last_date(code).await {
      Ok(last) => last,
      Err(e) => {
        warn!("{}: could not read sync metadata: {}", code, e);
        return;
      }
    };

    let needs_incremental =
      last.map(|d| d < last_trading_day(self.clock.now())).unwrap_or(true);
    if needs_incremental || self.is_stale(code).await {
      let service = self.clone();
      let sym = symbol.clone();
      self.queue.submit(TaskPriority::High, format!("incr-{}", code), async move {
        service.incremental_update(&sym).await
      });
    }

    if !self.store.is_full_history(code).await.unwrap_or(false) {
      self.schedule_backfill(symbol);
    }
  }

  fn schedule_backfill(self: &Arc<Self>, symbol: &Symbol) {
    let service = self.clone();
    let sym = symbol.clone();
    self.queue.submit(TaskPriority::Low, format!("backfill-{}", symbol.code()), async move {
      service.backfill(&sym).await
    });
  }

  /// A pre-close write of today's bar that survived past the 15:00 close
  /// must be replaced with the settled bar.
  async fn is_stale(&self, code: &str) -> bool {
    let now = self.clock.now();
    let today = now.date();
    if !is_trading_day(today) || now <= market_close(today) {
      return false;
    }
    match self.store.sync_state(code).await {
      Ok(Some(state)) => {
        state.last_bar_date == Some(today) && state.last_sync_at < market_close(today)
      }
      Ok(None) => false,
      Err(e) => {
        warn!("{}: stale check failed: {}", code, e);
        false
      }
    }
  }

  /// Ordered bar providers for a request of `days`; the last resort is
  /// always appended.
  fn providers_for(&self, days: usize, deep_first: bool) -> Vec<Arc<dyn MarketDataSource>> {
    let fast_page = self.providers.fast.max_bars_per_call();
    let mut ordered = if deep_first || days > fast_page {
      vec![self.providers.deep.clone(), self.providers.fast.clone()]
    } else {
      vec![self.providers.fast.clone(), self.providers.deep.clone()]
    };
    if let Some(last_resort) = &self.providers.last_resort {
      ordered.push(last_resort.clone());
    }
    ordered
  }

  async fn fetch_with_fallback(
    &self,
    symbol: &Symbol,
    days: usize,
    deep_first: bool,
  ) -> Option<Vec<Bar>> {
    let mut executor = FallbackExecutor::new(format!("[{}]", symbol.code()));
    for source in self.providers_for(days, deep_first) {
      let sym = symbol.clone();
      executor =
        executor.attempt(source.name(), async move { self.fetch_paged(source, sym, days).await });
    }
    executor.execute().await
  }

  /// Drive pagination over one source with descending end dates, stopping
  /// when the span is met, a short page signals the earliest data, or the
  /// iteration cap is hit. Sources without paging get a single shot.
  async fn fetch_paged(
    &self,
    source: Arc<dyn MarketDataSource>,
    symbol: Symbol,
    days: usize,
  ) -> hq_core::Result<Vec<Bar>> {
    let per_call = source.max_bars_per_call();
    if per_call == 0 {
      return source.fetch_bars(&symbol, days, None).await;
    }

    let mut collected: Vec<Bar> = Vec::new();
    let mut remaining = days;
    let mut end_date: Option<NaiveDate> = None;
    let mut pages = 0;

    while remaining > 0 && pages < self.config.max_page_iterations {
      pages += 1;
      let ask = remaining.min(per_call);
      let page = source.fetch_bars(&symbol, ask, end_date).await?;
      if page.is_empty() {
        break;
      }

      let short_page = page.len() < ask;
      let earliest = page.first().map(|b| b.date);
      remaining = remaining.saturating_sub(page.len());
      collected.extend(page);

      if short_page || remaining == 0 {
        break;
      }
      end_date = earliest.map(|d| d - ChronoDuration::days(1));
      tokio::time::sleep(self.config.rate_limit_delay).await;
    }

    if pages > 1 {
      info!("[{}] {} assembled {} bars over {} pages", source.name(), symbol.code(), collected.len(), pages);
    }
    Ok(normalize_bars(collected))
  }

  async fn maybe_fuse_live(
    &self,
    symbol: &Symbol,
    bars: Vec<Bar>,
    with_live: bool,
  ) -> Vec<Bar> {
    if !with_live || !is_trading_session(self.clock.now()) {
      return bars;
    }
    self.fuse_live(symbol, bars).await
  }

  /// Append a synthetic bar for today built from the live quote. A series
  /// that already carries today's bar is returned unchanged; the archive is
  /// authoritative once a committed bar exists.
  async fn fuse_live(&self, symbol: &Symbol, mut bars: Vec<Bar>) -> Vec<Bar> {
    let today = self.clock.now().date();
    if bars.last().map(|b| b.date >= today).unwrap_or(false) {
      return bars;
    }
    let Some(quote) = self.quotes.quote(symbol).await else {
      return bars;
    };
    let volume = if quote.volume > 0.0 { quote.volume } else { quote.turnover };
    bars.push(Bar::new(symbol.code(), today, quote.open, quote.high, quote.low, quote.now, volume));
    debug!("{}: fused live quote onto the bar series", symbol.code());
    bars
  }

  /// Background task: pull the span between the stored last date and today.
  /// A stale today-bar widens the window by one day so the settled bar
  /// replaces the intraday write, preferring the high-capacity source.
  async fn incremental_update(self: &Arc<Self>, symbol: &Symbol) -> EngineResult<()> {
    let code = symbol.code();
    info!("[task] {}: incremental update", code);

    let Some(last) = self.store.last_date(code).await? else {
      return Ok(());
    };
    let stale = self.is_stale(code).await;
    let fetch_from = if stale { last - ChronoDuration::days(1) } else { last };

    let today = self.clock.now().date();
    let span = (today - fetch_from).num_days();
    if span <= 0 {
      return Ok(());
    }

    let days = span as usize + 10;
    let Some(bars) = self.fetch_with_fallback(symbol, days, stale).await else {
      return Err(EngineError::Task(format!("{}: no source returned incremental data", code)));
    };

    let fresh: Vec<Bar> = bars.into_iter().filter(|b| b.date > fetch_from).collect();
    if fresh.is_empty() {
      return Ok(());
    }
    let stored = self.store.upsert(code, fresh, self.clock.now()).await?;
    info!("[task] {}: incremental update stored {} rows", code, stored);
    Ok(())
  }

  /// Background task: walk history backwards one fast-provider page at a
  /// time. An empty page latches `full_history_completed`.
  async fn backfill(self: &Arc<Self>, symbol: &Symbol) -> EngineResult<()> {
    let code = symbol.code();
    if self.store.is_full_history(code).await? {
      return Ok(());
    }
    info!("[task] {}: backfill starting", code);

    for iteration in 0..self.config.backfill_max_iterations {
      let Some(first) = self.store.first_date(code).await? else {
        return Ok(());
      };
      let end = first - ChronoDuration::days(1);

      let source = &self.providers.fast;
      let page = source.fetch_bars(symbol, source.max_bars_per_call(), Some(end)).await?;
      let older: Vec<Bar> = page.into_iter().filter(|b| b.date < first).collect();

      if older.is_empty() {
        self.store.mark_full_history(code).await?;
        info!("[task] {}: reached the earliest available history", code);
        return Ok(());
      }

      let stored = self.store.upsert(code, older, self.clock.now()).await?;
      info!("[task] {}: backfill page {} stored {} rows", code, iteration + 1, stored);
      tokio::time::sleep(self.config.rate_limit_delay).await;
    }
    Ok(())
  }

  /// Close-of-day batch refresh of every tracked symbol (CLI surface).
  /// Failures are logged and skipped; returns how many symbols stored new
  /// data.
  pub async fn update_all_cached(&self, batch_size: usize, delay: Duration) -> EngineResult<usize> {
    let states = self.store.all_synced().await?;
    let last_trading = last_trading_day(self.clock.now());
    let mut updated = 0;

    for (i, state) in states.iter().enumerate() {
      let needs = state.last_bar_date.map(|d| d < last_trading).unwrap_or(true);
      if !needs {
        continue;
      }
      let Ok(symbol) = Symbol::parse(&state.symbol) else {
        warn!("skipping unparseable archived symbol {}", state.symbol);
        continue;
      };

      match self.update_one_inline(&symbol, state).await {
        Ok(true) => updated += 1,
        Ok(false) => {}
        Err(e) => error!("{}: batch update failed: {}", state.symbol, e),
      }

      if batch_size > 0 && (i + 1) % batch_size == 0 {
        debug!("batch update pausing after {} symbols", i + 1);
        tokio::time::sleep(delay).await;
      }
    }
    Ok(updated)
  }

  async fn update_one_inline(&self, symbol: &Symbol, state: &SyncState) -> EngineResult<bool> {
    let Some(last) = state.last_bar_date else { return Ok(false) };
    let today = self.clock.now().date();
    let span = (today - last).num_days();
    if span <= 0 {
      return Ok(false);
    }
    let Some(bars) = self.fetch_with_fallback(symbol, span as usize + 10, false).await else {
      return Err(EngineError::Task(format!("{}: no source returned data", symbol.code())));
    };
    let fresh: Vec<Bar> = bars.into_iter().filter(|b| b.date > last).collect();
    if fresh.is_empty() {
      return Ok(false);
    }
    let stored = self.store.upsert(symbol.code(), fresh, self.clock.now()).await?;
    Ok(stored > 0)
  }

  pub async fn sync_stats(&self) -> EngineResult<StoreStats> {
    Ok(self.store.stats().await?)
  }
}

impl std::fmt::Debug for BarService {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("BarService")
      .field("fast", &self.providers.fast.name())
      .field("deep", &self.providers.deep.name())
      .finish()
  }
}
