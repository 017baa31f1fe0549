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

//! # hq-models
//!
//! The normalized record shapes every upstream source is parsed into, and
//! the shapes the store and engine hand back out: daily [`Bar`]s, live
//! [`Quote`]s, [`IntradayPoint`] tapes, the symbol directory entries and the
//! per-symbol [`SyncState`].

pub mod bar;
pub mod directory;
pub mod intraday;
pub mod quote;
pub mod sync;

pub use bar::{normalize_bars, Bar};
pub use directory::{DirectoryCacheFile, SymbolInfo};
pub use intraday::{fill_running_average, IntradayPoint, IntradaySeries, IntradayTape};
pub use quote::{IndexQuote, Quote};
pub use sync::{StoreStats, SyncState};
