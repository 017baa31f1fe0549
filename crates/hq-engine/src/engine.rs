//! Wiring: every component instantiated once at program start and shared by
//! reference. Tests inject alternates by building the pieces directly.

use crate::analyzer::StockAnalyzer;
use crate::bar_service::{BarProviderSet, BarService, BarServiceConfig};
use crate::error::{EngineError, EngineResult};
use crate::intraday::IntradayService;
use crate::market::MarketIndexService;
use crate::quote_cache::RealtimeQuoteService;
use crate::symbol_directory::SymbolDirectory;
use crate::watchlist::Watchlist;
use crate::work_queue::WorkQueue;
use hq_core::{Clock, Config, SystemClock};
use hq_providers::{
  EastmoneySource, MarketDataSource, SinaSource, SymbolListSource, TencentSource, YahooSource,
};
use hq_store::LocalStore;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

pub struct Engine {
  pub config: Config,
  pub store: LocalStore,
  pub queue: Arc<WorkQueue>,
  pub quotes: Arc<RealtimeQuoteService>,
  pub intraday: IntradayService,
  pub indices: MarketIndexService,
  pub bars: Arc<BarService>,
  pub directory: Arc<SymbolDirectory>,
  pub analyzer: StockAnalyzer,
  pub watchlist: Watchlist,
}

impl Engine {
  /// Build the full component graph against the real upstream sources.
  /// Must run inside a tokio runtime (the work queue spawns its workers).
  pub fn bootstrap(config: Config) -> EngineResult<Self> {
    Self::with_clock(config, Arc::new(SystemClock))
  }

  pub fn with_clock(config: Config, clock: Arc<dyn Clock>) -> EngineResult<Self> {
    let timeout = config.timeout_secs;
    let retries = config.max_retries;

    let tencent = Arc::new(TencentSource::new(timeout, retries)?);
    let eastmoney = Arc::new(EastmoneySource::new(timeout, retries)?);
    let sina = Arc::new(SinaSource::new(timeout, retries)?);
    let yahoo = Arc::new(YahooSource::new(timeout, retries)?);

    let quote_chain = build_quote_chain(
      &config.quote_providers,
      sina.clone(),
      tencent.clone(),
      eastmoney.clone(),
    )?;

    let store = LocalStore::open(&config.db_path)?;
    let queue = WorkQueue::start(config.workers);
    let quotes = Arc::new(RealtimeQuoteService::new(
      quote_chain,
      Duration::from_secs(config.quote_ttl_secs),
    ));

    let intraday = IntradayService::new(
      vec![
        sina.clone() as Arc<dyn MarketDataSource>,
        eastmoney.clone(),
        tencent.clone(),
      ],
      quotes.clone(),
    );

    let indices = MarketIndexService::new(
      vec![
        sina.clone() as Arc<dyn MarketDataSource>,
        tencent.clone(),
        yahoo.clone(),
      ],
      quotes.clone(),
    );

    let bar_config = BarServiceConfig {
      rate_limit_delay: Duration::from_millis(config.rate_limit_delay_ms),
      ..BarServiceConfig::default()
    };
    let bars = BarService::new(
      store.clone(),
      BarProviderSet { fast: tencent, deep: eastmoney.clone(), last_resort: Some(yahoo) },
      quotes.clone(),
      queue.clone(),
      clock.clone(),
      bar_config,
    );

    let data_dir = Path::new(&config.data_dir);
    let directory = SymbolDirectory::new(
      eastmoney as Arc<dyn SymbolListSource>,
      data_dir.join("symbol_directory_cache.json"),
      clock,
    );
    let watchlist = Watchlist::open(data_dir.join("watchlist.json"))?;
    let analyzer = StockAnalyzer::new(bars.clone());

    Ok(Self {
      config,
      store,
      queue,
      quotes,
      intraday,
      indices,
      bars,
      directory,
      analyzer,
      watchlist,
    })
  }

  /// Cooperative shutdown: drain the queue, stop the workers.
  pub async fn shutdown(&self) {
    self.queue.shutdown(Duration::from_secs(10)).await;
  }
}

fn build_quote_chain(
  order: &[String],
  sina: Arc<SinaSource>,
  tencent: Arc<TencentSource>,
  eastmoney: Arc<EastmoneySource>,
) -> EngineResult<Vec<Arc<dyn MarketDataSource>>> {
  let mut chain: Vec<Arc<dyn MarketDataSource>> = Vec::with_capacity(order.len());
  for name in order {
    match name.as_str() {
      "sina" => chain.push(sina.clone()),
      "tencent" => chain.push(tencent.clone()),
      "eastmoney" => chain.push(eastmoney.clone()),
      other => {
        return Err(EngineError::InvalidInput(format!("unknown quote provider: {}", other)))
      }
    }
  }
  if chain.is_empty() {
    return Err(EngineError::InvalidInput("quote provider order is empty".to_string()));
  }
  Ok(chain)
}

impl std::fmt::Debug for Engine {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Engine").field("db_path", &self.config.db_path).finish()
  }
}
