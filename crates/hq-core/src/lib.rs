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

//! # hq-core
//!
//! Core types, configuration, and error handling for the hq market-data
//! engine.
//!
//! This crate provides the foundational components shared across all hq
//! crates:
//!
//! - [`Config`] - engine configuration (storage paths, timeouts, workers)
//! - [`Error`] and [`Result`] - unified error handling
//! - [`Symbol`] / [`Market`] - code validation and exchange routing
//! - [`calendar`] - trading-day and trading-session predicates with an
//!   injectable clock
//!
//! ## Example
//!
//! ```
//! use hq_core::{Symbol, Market};
//!
//! let symbol = Symbol::parse("600519").unwrap();
//! assert_eq!(symbol.market(), Market::Sh);
//! assert_eq!(symbol.prefixed(), "sh600519");
//! ```

pub mod calendar;
pub mod config;
pub mod error;
pub mod symbol;

pub use calendar::{Clock, FixedClock, SystemClock};
pub use config::Config;
pub use error::{Error, Result};
pub use symbol::{Market, Symbol};

/// Default upstream request timeout.
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// Default bounded retry count for upstream requests.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default background worker pool size.
pub const DEFAULT_WORKERS: usize = 2;

/// Default realtime quote cache TTL.
pub const DEFAULT_QUOTE_TTL_SECS: u64 = 3;

/// Default inter-page delay used between paged upstream calls.
pub const DEFAULT_RATE_LIMIT_DELAY_MS: u64 = 1000;

/// Default quote provider ordering.
pub const DEFAULT_QUOTE_PROVIDERS: &str = "sina,tencent,eastmoney";

/// Locally-held coverage of at least this share of a requested window is
/// served without a synchronous upstream fetch.
pub const DATA_COMPLETENESS_RATIO: f64 = 0.8;

/// Indicator evaluation refuses series shorter than this.
pub const MIN_DATA_DAYS: usize = 60;

/// Hard cap on page iterations when a bar request spans multiple provider
/// pages.
pub const MAX_PAGE_ITERATIONS: usize = 50;

/// Hard cap on pages fetched by a single backfill task run.
pub const BACKFILL_MAX_ITERATIONS: usize = 10;
