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

//! Per-symbol technical analysis over the smart-fetched bar series, cached
//! for five minutes.

use crate::analysis_cache::AnalysisCache;
use crate::bar_service::BarService;
use crate::error::EngineResult;
use crate::indicators;
use chrono::NaiveDate;
use hq_core::{Symbol, MIN_DATA_DAYS};
use hq_models::Bar;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

const ANALYSIS_WINDOW_DAYS: usize = 365;

/// Crossover and position signals at the latest bar.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signals {
  pub kdj_golden: bool,
  pub kdj_death: bool,
  pub macd_golden: bool,
  pub macd_death: bool,
  pub above_bbi: bool,
  pub trend_break_up: bool,
  pub trend_break_down: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
  pub symbol: String,
  pub as_of: NaiveDate,
  pub latest_price: f64,
  /// 0-100 composite, 50 is neutral
  pub score: u8,
  pub kdj_k: f64,
  pub kdj_d: f64,
  pub kdj_j: f64,
  pub macd: f64,
  pub macd_signal: f64,
  pub macd_hist: f64,
  pub bbi: f64,
  pub trend_line: f64,
  pub multi_line: f64,
  pub signals: Signals,
}

/// Evaluate the indicator set over a bar series. Series shorter than
/// [`MIN_DATA_DAYS`] rows carry too much warm-up noise and yield `None`.
pub fn compute_report(symbol: &str, bars: &[Bar]) -> Option<AnalysisReport> {
  if bars.len() < MIN_DATA_DAYS {
    return None;
  }

  let close: Vec<f64> = bars.iter().map(|b| b.close).collect();
  let high: Vec<f64> = bars.iter().map(|b| b.high).collect();
  let low: Vec<f64> = bars.iter().map(|b| b.low).collect();

  let (k, d, j) = indicators::kdj(&high, &low, &close, 9, 3, 3);
  let (macd_line, macd_sig, macd_hist) = indicators::macd(&close, 12, 26, 9);
  let bbi = indicators::bbi(&close);
  let trend = indicators::trend_line(&close);
  let multi = indicators::multi_line(&close);

  let last = bars.len() - 1;
  let latest_price = close[last];

  let signals = Signals {
    kdj_golden: indicators::crossed_up(&k, &d),
    kdj_death: indicators::crossed_down(&k, &d),
    macd_golden: indicators::crossed_up(&macd_line, &macd_sig),
    macd_death: indicators::crossed_down(&macd_line, &macd_sig),
    above_bbi: !bbi[last].is_nan() && latest_price > bbi[last],
    trend_break_up: indicators::crossed_up(&close, &trend),
    trend_break_down: indicators::crossed_down(&close, &trend),
  };

  Some(AnalysisReport {
    symbol: symbol.to_string(),
    as_of: bars[last].date,
    latest_price,
    score: score_signals(&signals),
    kdj_k: k[last],
    kdj_d: d[last],
    kdj_j: j[last],
    macd: macd_line[last],
    macd_signal: macd_sig[last],
    macd_hist: macd_hist[last],
    bbi: bbi[last],
    trend_line: trend[last],
    multi_line: multi[last],
    signals,
  })
}

/// Weighted composite starting from a neutral 50, clamped to 0..=100.
fn score_signals(signals: &Signals) -> u8 {
  let mut score: i32 = 50;
  if signals.kdj_golden {
    score += 18;
  }
  if signals.kdj_death {
    score -= 18;
  }
  if signals.macd_golden {
    score += 20;
  }
  if signals.macd_death {
    score -= 20;
  }
  if signals.above_bbi {
    score += 22;
  } else {
    score -= 22;
  }
  if signals.trend_break_up {
    score += 25;
  }
  if signals.trend_break_down {
    score -= 25;
  }
  score.clamp(0, 100) as u8
}

pub struct StockAnalyzer {
  bars: Arc<BarService>,
  cache: AnalysisCache<AnalysisReport>,
}

impl StockAnalyzer {
  pub fn new(bars: Arc<BarService>) -> Self {
    Self { bars, cache: AnalysisCache::with_defaults() }
  }

  /// Analyze one symbol: cache lookup, smart fetch with live fusion,
  /// indicator evaluation, cache store. `None` when no data or too little
  /// history exists.
  pub async fn analyze(&self, symbol: &Symbol) -> EngineResult<Option<AnalysisReport>> {
    if let Some(report) = self.cache.get(symbol.code()) {
      debug!("{}: analysis served from cache", symbol.code());
      return Ok(Some(report));
    }

    let Some(bars) = self.bars.bars(symbol, ANALYSIS_WINDOW_DAYS, true).await? else {
      return Ok(None);
    };
    let Some(report) = compute_report(symbol.code(), &bars) else {
      return Ok(None);
    };

    self.cache.set(symbol.code(), report.clone());
    Ok(Some(report))
  }
}

impl std::fmt::Debug for StockAnalyzer {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("StockAnalyzer").finish()
  }
}
