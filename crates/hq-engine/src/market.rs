//! Market index snapshots: domestic indices through the wire quote path,
//! HK/US indices through the ordered index-capable providers.

use crate::quote_cache::RealtimeQuoteService;
use hq_core::Symbol;
use hq_models::{IndexQuote, Quote};
use hq_providers::{FallbackExecutor, MarketDataSource};
use std::sync::Arc;

/// Domestic index codes served through the equity quote endpoints.
const CN_INDICES: [(&str, &str); 3] =
  [("sh000001", "上证指数"), ("sz399001", "深证成指"), ("sz399006", "创业板指")];

pub struct MarketIndexService {
  chain: Vec<Arc<dyn MarketDataSource>>,
  quotes: Arc<RealtimeQuoteService>,
}

impl MarketIndexService {
  pub fn new(chain: Vec<Arc<dyn MarketDataSource>>, quotes: Arc<RealtimeQuoteService>) -> Self {
    Self { chain, quotes }
  }

  /// An international index snapshot (`^HSI`, `^DJI`, ...) through the
  /// first provider that carries it.
  pub async fn index(&self, symbol: &str) -> Option<IndexQuote> {
    let mut executor = FallbackExecutor::new(format!("[{}]", symbol));
    for source in &self.chain {
      let src = source.clone();
      let sym = symbol.to_string();
      executor = executor.attempt(src.name(), async move { src.fetch_index(&sym).await });
    }
    executor.execute().await
  }

  /// The three domestic benchmark indices, through the realtime quote
  /// cache.
  pub async fn cn_indices(&self) -> Vec<IndexQuote> {
    let mut out = Vec::with_capacity(CN_INDICES.len());
    for (code, fallback_name) in CN_INDICES {
      let Ok(symbol) = Symbol::parse(code) else { continue };
      if let Some(quote) = self.quotes.quote(&symbol).await {
        out.push(to_index(code, fallback_name, &quote));
      }
    }
    out
  }
}

fn to_index(code: &str, fallback_name: &str, quote: &Quote) -> IndexQuote {
  IndexQuote {
    symbol: code.to_string(),
    name: if quote.name.is_empty() { fallback_name.to_string() } else { quote.name.clone() },
    price: quote.now,
    change: quote.change(),
    change_pct: quote.change_pct(),
    time: quote.as_of.format("%Y-%m-%d %H:%M:%S").to_string(),
  }
}

impl std::fmt::Debug for MarketIndexService {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("MarketIndexService")
      .field("providers", &self.chain.iter().map(|s| s.name()).collect::<Vec<_>>())
      .finish()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use async_trait::async_trait;
  use std::collections::HashMap;
  use std::time::Duration;

  struct MockIndexSource {
    supports: bool,
  }

  #[async_trait]
  impl MarketDataSource for MockIndexSource {
    fn name(&self) -> &'static str {
      "Mock"
    }

    async fn fetch_index(&self, symbol: &str) -> hq_core::Result<IndexQuote> {
      if !self.supports {
        return Err(hq_core::Error::Unsupported("index".to_string()));
      }
      Ok(IndexQuote {
        symbol: symbol.to_string(),
        name: "恒生指数".to_string(),
        price: 24000.0,
        change: 120.0,
        change_pct: 0.5,
        time: "2025-06-16 16:08:11".to_string(),
      })
    }

    async fn fetch_quotes(
      &self,
      _symbols: &[Symbol],
    ) -> hq_core::Result<HashMap<String, Quote>> {
      Ok(HashMap::new())
    }
  }

  fn bench_quote(code: &str) -> Quote {
    Quote {
      symbol: code.to_string(),
      name: "指数".to_string(),
      now: 3400.0,
      open: 3395.0,
      prev_close: 3390.0,
      high: 3410.0,
      low: 3380.0,
      volume: 123_456_789.0,
      turnover: 9_876_543_210.0,
      bid1: 0.0,
      ask1: 0.0,
      as_of: chrono::NaiveDate::from_ymd_opt(2025, 6, 16)
        .unwrap()
        .and_hms_opt(10, 0, 0)
        .unwrap(),
    }
  }

  /// Serves equity-path quotes keyed by the bare code, as every adapter
  /// does for indices too.
  struct MockBenchmarkSource;

  #[async_trait]
  impl MarketDataSource for MockBenchmarkSource {
    fn name(&self) -> &'static str {
      "MockBench"
    }

    async fn fetch_quotes(
      &self,
      symbols: &[Symbol],
    ) -> hq_core::Result<HashMap<String, Quote>> {
      Ok(symbols.iter().map(|s| (s.code().to_string(), bench_quote(s.code()))).collect())
    }
  }

  fn service(sources: Vec<Arc<dyn MarketDataSource>>) -> MarketIndexService {
    let quotes = Arc::new(RealtimeQuoteService::new(sources.clone(), Duration::from_secs(3)));
    MarketIndexService::new(sources, quotes)
  }

  #[tokio::test]
  async fn test_index_falls_through_unsupported_provider() {
    let svc = service(vec![
      Arc::new(MockIndexSource { supports: false }),
      Arc::new(MockIndexSource { supports: true }),
    ]);
    let idx = svc.index("^HSI").await.unwrap();
    assert_eq!(idx.price, 24000.0);
    assert_eq!(idx.name, "恒生指数");
  }

  #[tokio::test]
  async fn test_index_none_when_nobody_carries_it() {
    let svc = service(vec![Arc::new(MockIndexSource { supports: false })]);
    assert!(svc.index("^UNKNOWN").await.is_none());
  }

  #[tokio::test]
  async fn test_cn_indices_resolve_through_bare_code_keys() {
    let svc = service(vec![Arc::new(MockBenchmarkSource)]);

    let indices = svc.cn_indices().await;
    assert_eq!(indices.len(), 3);

    let symbols: Vec<&str> = indices.iter().map(|i| i.symbol.as_str()).collect();
    assert_eq!(symbols, vec!["sh000001", "sz399001", "sz399006"]);
    for idx in &indices {
      assert_eq!(idx.name, "指数");
      assert_eq!(idx.price, 3400.0);
      assert!((idx.change - 10.0).abs() < 1e-9);
    }
  }
}
