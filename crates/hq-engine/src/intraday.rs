//! Intraday tape assembly: the quote header from the realtime cache plus
//! the first intraday-capable provider's minute points.

use crate::quote_cache::RealtimeQuoteService;
use hq_core::Symbol;
use hq_models::{IntradaySeries, IntradayTape, Quote};
use hq_providers::{FallbackExecutor, MarketDataSource};
use std::sync::Arc;

pub struct IntradayService {
  chain: Vec<Arc<dyn MarketDataSource>>,
  quotes: Arc<RealtimeQuoteService>,
}

impl IntradayService {
  pub fn new(chain: Vec<Arc<dyn MarketDataSource>>, quotes: Arc<RealtimeQuoteService>) -> Self {
    Self { chain, quotes }
  }

  /// The current day's minute series for one symbol, or `None` when no
  /// quote is obtainable. A quote without tape points still yields a
  /// header-only series.
  pub async fn series(&self, symbol: &Symbol) -> Option<IntradaySeries> {
    let quote = self.quotes.quote(symbol).await?;

    let mut executor = FallbackExecutor::new(format!("[{}]", symbol.code()));
    for source in &self.chain {
      let src = source.clone();
      let sym = symbol.clone();
      executor = executor.attempt(src.name(), async move { src.fetch_intraday(&sym).await });
    }
    let tape = executor.execute().await.unwrap_or_default();

    Some(build_series(symbol, quote, tape))
  }
}

fn build_series(symbol: &Symbol, quote: Quote, tape: IntradayTape) -> IntradaySeries {
  let date =
    tape.date.clone().unwrap_or_else(|| quote.as_of.date().format("%Y-%m-%d").to_string());
  IntradaySeries {
    code: symbol.code().to_string(),
    name: quote.name.clone(),
    now: quote.now,
    open: quote.open,
    prev_close: tape.prev_close.unwrap_or(quote.prev_close),
    high: quote.high,
    low: quote.low,
    change_pct: quote.change_pct(),
    volume: quote.volume,
    turnover: quote.turnover,
    date,
    points: tape.points,
  }
}

impl std::fmt::Debug for IntradayService {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("IntradayService")
      .field("providers", &self.chain.iter().map(|s| s.name()).collect::<Vec<_>>())
      .finish()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use async_trait::async_trait;
  use chrono::NaiveDate;
  use hq_models::IntradayPoint;
  use std::collections::HashMap;

  fn quote(code: &str) -> Quote {
    Quote {
      symbol: code.to_string(),
      name: "测试".to_string(),
      now: 11.0,
      open: 10.0,
      prev_close: 10.0,
      high: 11.5,
      low: 9.8,
      volume: 100.0,
      turnover: 1000.0,
      bid1: 10.99,
      ask1: 11.01,
      as_of: NaiveDate::from_ymd_opt(2025, 6, 16).unwrap().and_hms_opt(10, 0, 0).unwrap(),
    }
  }

  struct MockIntradaySource {
    points: Vec<IntradayPoint>,
  }

  #[async_trait]
  impl MarketDataSource for MockIntradaySource {
    fn name(&self) -> &'static str {
      "Mock"
    }

    async fn fetch_quotes(
      &self,
      symbols: &[Symbol],
    ) -> hq_core::Result<HashMap<String, Quote>> {
      Ok(symbols.iter().map(|s| (s.code().to_string(), quote(s.code()))).collect())
    }

    async fn fetch_intraday(&self, _symbol: &Symbol) -> hq_core::Result<IntradayTape> {
      Ok(IntradayTape {
        date: Some("2025-06-16".to_string()),
        prev_close: Some(10.2),
        points: self.points.clone(),
      })
    }
  }

  #[tokio::test]
  async fn test_series_combines_header_and_tape() {
    let source = Arc::new(MockIntradaySource {
      points: vec![IntradayPoint { time: "09:30".to_string(), price: 10.5, avg: 10.5, volume: 50.0 }],
    });
    let quotes = Arc::new(RealtimeQuoteService::new(
      vec![source.clone()],
      std::time::Duration::from_secs(60),
    ));
    let service = IntradayService::new(vec![source], quotes);

    let series = service.series(&Symbol::parse("600519").unwrap()).await.unwrap();
    assert_eq!(series.code, "600519");
    assert_eq!(series.date, "2025-06-16");
    assert_eq!(series.prev_close, 10.2);
    assert_eq!(series.points.len(), 1);
    assert!((series.change_pct - 10.0).abs() < 1e-9);
  }

  #[tokio::test]
  async fn test_empty_tape_still_returns_header() {
    let source = Arc::new(MockIntradaySource { points: Vec::new() });
    let quotes = Arc::new(RealtimeQuoteService::new(
      vec![source.clone()],
      std::time::Duration::from_secs(60),
    ));
    let service = IntradayService::new(vec![source], quotes);

    let series = service.series(&Symbol::parse("600519").unwrap()).await.unwrap();
    assert!(series.points.is_empty());
    assert_eq!(series.now, 11.0);
  }
}
