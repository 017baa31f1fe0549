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

//! The uniform capability set every upstream source is normalized behind.
//!
//! Variants differ in which subset they support; unsupported capabilities
//! return [`Error::Unsupported`] from the default methods. Adapters are
//! stateless apart from a reusable HTTP session and a self-reported
//! availability flag.

use async_trait::async_trait;
use chrono::NaiveDate;
use hq_core::{Error, Result, Symbol};
use hq_models::{Bar, IndexQuote, IntradayTape, Quote, SymbolInfo};
use std::collections::HashMap;

#[async_trait]
pub trait MarketDataSource: Send + Sync {
  /// Source name for logging and provider-order configuration.
  fn name(&self) -> &'static str;

  /// Upper bound on bars returned by one `fetch_bars` call; `0` when the
  /// source cannot serve paged history. The Bar Service, not the adapter,
  /// drives pagination across calls.
  fn max_bars_per_call(&self) -> usize {
    0
  }

  /// Self-reported health, flipped off after a catastrophic parse failure
  /// and rechecked on the next call.
  fn is_available(&self) -> bool {
    true
  }

  /// Fetch up to `count` daily bars ending at `end_date` (latest data when
  /// absent), oldest first.
  async fn fetch_bars(
    &self,
    _symbol: &Symbol,
    _count: usize,
    _end_date: Option<NaiveDate>,
  ) -> Result<Vec<Bar>> {
    Err(Error::Unsupported(format!("{}: bar history", self.name())))
  }

  /// Fetch live quotes, keyed by bare code. Symbols the source does not
  /// carry are simply absent from the map.
  async fn fetch_quotes(&self, _symbols: &[Symbol]) -> Result<HashMap<String, Quote>> {
    Err(Error::Unsupported(format!("{}: realtime quotes", self.name())))
  }

  /// Fetch the current day's minute tape.
  async fn fetch_intraday(&self, _symbol: &Symbol) -> Result<IntradayTape> {
    Err(Error::Unsupported(format!("{}: intraday tape", self.name())))
  }

  /// Fetch a market index snapshot by its display symbol (e.g. `^HSI`,
  /// `^DJI`).
  async fn fetch_index(&self, _symbol: &str) -> Result<IndexQuote> {
    Err(Error::Unsupported(format!("{}: index quotes", self.name())))
  }
}

/// The one upstream listing feed the symbol directory refreshes from.
#[async_trait]
pub trait SymbolListSource: Send + Sync {
  async fn fetch_symbol_list(&self) -> Result<Vec<SymbolInfo>>;
}

#[cfg(test)]
mod tests {
  use super::*;

  struct Stub;

  #[async_trait]
  impl MarketDataSource for Stub {
    fn name(&self) -> &'static str {
      "Stub"
    }
  }

  #[tokio::test]
  async fn test_default_capabilities_are_unsupported() {
    let stub = Stub;
    let symbol = Symbol::parse("600519").unwrap();
    assert_eq!(stub.max_bars_per_call(), 0);
    assert!(stub.is_available());
    assert!(matches!(stub.fetch_bars(&symbol, 10, None).await, Err(Error::Unsupported(_))));
    assert!(matches!(stub.fetch_quotes(&[symbol.clone()]).await, Err(Error::Unsupported(_))));
    assert!(matches!(stub.fetch_intraday(&symbol).await, Err(Error::Unsupported(_))));
    assert!(matches!(stub.fetch_index("^DJI").await, Err(Error::Unsupported(_))));
  }
}
