//! # hq-providers
//!
//! Upstream provider adapters for the hq market-data engine.
//!
//! Each adapter normalizes one upstream source into the common record
//! shapes from `hq-models` behind the [`MarketDataSource`] capability set:
//!
//! - [`TencentSource`] - fast forward-adjusted A-share/HK klines (640 per
//!   page), batch wire quotes, minute tape, HK/US indices
//! - [`EastmoneySource`] - high-capacity klines (3000 per page), browser-API
//!   quotes, intraday trends, and the exchange listing feed
//! - [`SinaSource`] - batch wire quotes, minute tape, US/HK indices
//! - [`YahooSource`] - single-shot chart history as the last-ditch fallback
//!
//! Cross-source orchestration lives in [`FallbackExecutor`]; everything
//! upstream-facing is expressed as an ordered list of named attempts.

pub mod eastmoney;
pub mod fallback;
pub mod sina;
pub mod source;
pub mod tencent;
pub mod transport;
pub mod yahoo;

pub use eastmoney::EastmoneySource;
pub use fallback::{FallbackExecutor, FallbackValue};
pub use sina::SinaSource;
pub use source::{MarketDataSource, SymbolListSource};
pub use tencent::TencentSource;
pub use transport::Transport;
pub use yahoo::YahooSource;
