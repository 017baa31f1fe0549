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

//! Last-resort bar source via the international chart API. Serves whole
//! ranges in a single call (no `end_date` paging) and US index snapshots;
//! slow but reachable when the domestic endpoints are not.

use crate::source::MarketDataSource;
use crate::transport::Transport;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate};
use hq_core::{Error, Result, Symbol};
use hq_models::{normalize_bars, Bar, IndexQuote};
use serde::Deserialize;
use tracing::debug;

const CHART_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart/";

/// Smallest published range covering the requested day span.
fn range_for_days(days: usize) -> &'static str {
  match days {
    0..=7 => "5d",
    8..=30 => "1mo",
    31..=90 => "3mo",
    91..=180 => "6mo",
    181..=365 => "1y",
    366..=730 => "2y",
    731..=1825 => "5y",
    1826..=3650 => "10y",
    _ => "max",
  }
}

#[derive(Debug, Deserialize)]
struct ChartResponse {
  chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
  result: Option<Vec<ChartResult>>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
  #[serde(default)]
  timestamp: Vec<i64>,
  indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
  quote: Vec<QuoteBlock>,
  #[serde(default)]
  adjclose: Vec<AdjCloseBlock>,
}

#[derive(Debug, Deserialize, Default)]
struct QuoteBlock {
  #[serde(default)]
  open: Vec<Option<f64>>,
  #[serde(default)]
  high: Vec<Option<f64>>,
  #[serde(default)]
  low: Vec<Option<f64>>,
  #[serde(default)]
  close: Vec<Option<f64>>,
  #[serde(default)]
  volume: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize, Default)]
struct AdjCloseBlock {
  #[serde(default)]
  adjclose: Vec<Option<f64>>,
}

fn parse_chart(response: ChartResponse, bare_code: &str) -> Result<Vec<Bar>> {
  let result = response
    .chart
    .result
    .and_then(|mut r| if r.is_empty() { None } else { Some(r.remove(0)) })
    .ok_or_else(|| Error::NotFound(format!("no chart data for {}", bare_code)))?;

  let quote = result
    .indicators
    .quote
    .into_iter()
    .next()
    .ok_or_else(|| Error::Parse(format!("chart for {} lacks a quote block", bare_code)))?;
  let adjclose =
    result.indicators.adjclose.into_iter().next().map(|b| b.adjclose).unwrap_or_default();

  let mut bars = Vec::with_capacity(result.timestamp.len());
  for (i, ts) in result.timestamp.iter().enumerate() {
    let Some(date) = DateTime::from_timestamp(*ts, 0).map(|dt| dt.date_naive()) else { continue };
    let close = adjclose
      .get(i)
      .copied()
      .flatten()
      .or_else(|| quote.close.get(i).copied().flatten());
    let (Some(open), Some(high), Some(low), Some(close)) = (
      quote.open.get(i).copied().flatten(),
      quote.high.get(i).copied().flatten(),
      quote.low.get(i).copied().flatten(),
      close,
    ) else {
      continue;
    };
    let volume = quote.volume.get(i).copied().flatten().unwrap_or(0.0);
    bars.push(Bar::new(bare_code, date, open, high, low, close, volume));
  }

  Ok(normalize_bars(bars))
}

pub struct YahooSource {
  transport: Transport,
}

impl YahooSource {
  pub fn new(timeout_secs: u64, max_retries: u32) -> Result<Self> {
    let transport = Transport::new(
      timeout_secs,
      max_retries,
      vec![("User-Agent", "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36")],
    )?;
    Ok(Self { transport })
  }
}

#[async_trait]
impl MarketDataSource for YahooSource {
  fn name(&self) -> &'static str {
    "Yahoo"
  }

  async fn fetch_bars(
    &self,
    symbol: &Symbol,
    count: usize,
    end_date: Option<NaiveDate>,
  ) -> Result<Vec<Bar>> {
    if end_date.is_some() {
      // The chart API serves ranges anchored at now; it cannot page
      // backwards from an arbitrary end date.
      return Err(Error::Unsupported("Yahoo: paged bar history".to_string()));
    }

    let url = format!(
      "{}{}?interval=1d&range={}&events=div%2Csplit",
      CHART_URL,
      symbol.suffixed(),
      range_for_days(count)
    );
    let response: ChartResponse = self.transport.get_json(&url).await?;
    let mut bars = parse_chart(response, symbol.code())?;
    if bars.len() > count {
      bars.drain(..bars.len() - count);
    }
    debug!("[Yahoo] {} fetched {} bars", symbol.code(), bars.len());
    Ok(bars)
  }

  async fn fetch_index(&self, symbol: &str) -> Result<IndexQuote> {
    let url = format!("{}{}?interval=1d&range=5d", CHART_URL, symbol);
    let response: ChartResponse = self.transport.get_json(&url).await?;
    let bars = parse_chart(response, symbol)?;

    let last = bars.last().ok_or_else(|| Error::NotFound(format!("no bars for {}", symbol)))?;
    let prev_close = bars.len().checked_sub(2).map(|i| bars[i].close).unwrap_or(last.close);
    let change = last.close - prev_close;
    let change_pct = if prev_close > 0.0 { change / prev_close * 100.0 } else { 0.0 };

    Ok(IndexQuote {
      symbol: symbol.to_string(),
      name: symbol.to_string(),
      price: last.close,
      change,
      change_pct,
      time: last.date.format("%Y-%m-%d").to_string(),
    })
  }
}

impl std::fmt::Debug for YahooSource {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("YahooSource").finish()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn sample_chart() -> ChartResponse {
    serde_json::from_value(serde_json::json!({
      "chart": {
        "result": [{
          "timestamp": [1749772800_i64, 1750032000_i64],
          "indicators": {
            "quote": [{
              "open": [1820.0, 1826.0],
              "high": [1830.0, 1845.0],
              "low": [1815.0, 1824.0],
              "close": [1825.0, 1840.0],
              "volume": [23456.0, 34567.0]
            }],
            "adjclose": [{ "adjclose": [1824.5, 1839.5] }]
          }
        }]
      }
    }))
    .unwrap()
  }

  #[test]
  fn test_parse_chart_uses_adjusted_close() {
    let bars = parse_chart(sample_chart(), "600519").unwrap();
    assert_eq!(bars.len(), 2);
    assert_eq!(bars[0].close, 1824.5);
    assert_eq!(bars[0].open, 1820.0);
    assert_eq!(bars[1].close, 1839.5);
  }

  #[test]
  fn test_parse_chart_no_result_is_not_found() {
    let response: ChartResponse =
      serde_json::from_value(serde_json::json!({ "chart": { "result": null } })).unwrap();
    assert!(matches!(parse_chart(response, "600519"), Err(Error::NotFound(_))));
  }

  #[test]
  fn test_parse_chart_skips_null_rows() {
    let response: ChartResponse = serde_json::from_value(serde_json::json!({
      "chart": {
        "result": [{
          "timestamp": [1749772800_i64, 1750032000_i64],
          "indicators": {
            "quote": [{
              "open": [null, 1826.0],
              "high": [null, 1845.0],
              "low": [null, 1824.0],
              "close": [null, 1840.0],
              "volume": [null, 34567.0]
            }]
          }
        }]
      }
    }))
    .unwrap();
    let bars = parse_chart(response, "600519").unwrap();
    assert_eq!(bars.len(), 1);
    assert_eq!(bars[0].close, 1840.0);
  }

  #[test]
  fn test_range_for_days() {
    assert_eq!(range_for_days(5), "5d");
    assert_eq!(range_for_days(90), "3mo");
    assert_eq!(range_for_days(365), "1y");
    assert_eq!(range_for_days(9999), "max");
  }

  #[tokio::test]
  async fn test_paged_fetch_is_unsupported() {
    let source = YahooSource::new(5, 1).unwrap();
    let symbol = Symbol::parse("600519").unwrap();
    let end = NaiveDate::from_ymd_opt(2023, 1, 3);
    assert!(matches!(
      source.fetch_bars(&symbol, 640, end).await,
      Err(Error::Unsupported(_))
    ));
  }
}
