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

//! # hq-engine
//!
//! The orchestration layer of the hq market-data engine:
//!
//! - [`BarService`] - smart fetch: local archive first, synchronous
//!   provider fallback on a cold start, live fusion during the session,
//!   background incremental updates and historical backfill
//! - [`WorkQueue`] - priority + deduplicating background task runner
//! - [`RealtimeQuoteService`] - short-TTL live quote cache with a provider
//!   fallback chain
//! - [`IntradayService`] - the minute tape joined with the quote header
//! - [`AnalysisCache`] / [`StockAnalyzer`] - indicator evaluation with a
//!   bounded LRU over the results
//! - [`SymbolDirectory`] - daily-refreshed code→name map with
//!   stale-but-serve
//! - [`Watchlist`] - the user's three named symbol lists
//! - [`Engine`] - one-stop wiring of the above against the real providers

pub mod analysis_cache;
pub mod analyzer;
pub mod bar_service;
pub mod engine;
pub mod error;
pub mod indicators;
pub mod intraday;
pub mod market;
pub mod quote_cache;
pub mod symbol_directory;
pub mod watchlist;
pub mod work_queue;

pub use analysis_cache::AnalysisCache;
pub use analyzer::{compute_report, AnalysisReport, Signals, StockAnalyzer};
pub use bar_service::{BarProviderSet, BarService, BarServiceConfig};
pub use engine::Engine;
pub use error::{EngineError, EngineResult};
pub use intraday::IntradayService;
pub use market::MarketIndexService;
pub use quote_cache::{RealtimeQuoteService, MAX_QUOTE_BATCH};
pub use symbol_directory::{SymbolDirectory, MAX_SEARCH_RESULTS};
pub use watchlist::{Watchlist, WatchlistData};
pub use work_queue::{TaskPriority, WorkQueue, WorkQueueStats};
