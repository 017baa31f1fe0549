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

//! High-capacity bar source behind a browser JSON API: daily klines up to
//! 3000 per page, single-symbol quotes with `/100` price scaling, the
//! intraday trend feed, and the exchange listing used by the symbol
//! directory.

use crate::source::{MarketDataSource, SymbolListSource};
use crate::transport::Transport;
use async_trait::async_trait;
use chrono::NaiveDate;
use hq_core::{Error, Result, Symbol};
use hq_models::{
  fill_running_average, normalize_bars, Bar, IntradayPoint, IntradayTape, Quote, SymbolInfo,
};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, warn};

const KLINE_URL: &str = "https://push2his.eastmoney.com/api/qt/stock/kline/get";
const QUOTE_URL: &str = "https://push2.eastmoney.com/api/qt/stock/get";
const TRENDS_URL: &str = "https://push2his.eastmoney.com/api/qt/stock/trends2/get";
const LIST_URL: &str = "https://push2.eastmoney.com/api/qt/clist/get";

pub const MAX_BARS: usize = 3000;

pub struct EastmoneySource {
  transport: Transport,
  available: AtomicBool,
}

impl EastmoneySource {
  pub fn new(timeout_secs: u64, max_retries: u32) -> Result<Self> {
    let transport = Transport::new(
      timeout_secs,
      max_retries,
      vec![
        ("User-Agent", "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36"),
        ("Referer", "https://quote.eastmoney.com/"),
      ],
    )?;
    Ok(Self { transport, available: AtomicBool::new(true) })
  }
}

/// Parse the kline payload: `data.klines` rows of
/// `"date,open,close,high,low,volume,..."`.
fn parse_kline_payload(payload: &Value, bare_code: &str) -> Result<Vec<Bar>> {
  let klines = payload
    .get("data")
    .and_then(|d| d.get("klines"))
    .and_then(|k| k.as_array())
    .ok_or_else(|| Error::Parse(format!("kline payload missing klines for {}", bare_code)))?;

  let mut bars = Vec::with_capacity(klines.len());
  for line in klines {
    let Some(line) = line.as_str() else { continue };
    let parts: Vec<&str> = line.split(',').collect();
    if parts.len() < 6 {
      continue;
    }
    let Ok(date) = NaiveDate::parse_from_str(parts[0], "%Y-%m-%d") else { continue };
    let (Ok(open), Ok(close), Ok(high), Ok(low), Ok(volume)) = (
      parts[1].parse::<f64>(),
      parts[2].parse::<f64>(),
      parts[3].parse::<f64>(),
      parts[4].parse::<f64>(),
      parts[5].parse::<f64>(),
    ) else {
      continue;
    };
    bars.push(Bar::new(bare_code, date, open, high, low, close, volume));
  }

  Ok(normalize_bars(bars))
}

fn scaled(data: &Value, field: &str) -> f64 {
  data.get(field).and_then(|v| v.as_f64()).unwrap_or(0.0) / 100.0
}

fn raw(data: &Value, field: &str) -> f64 {
  data.get(field).and_then(|v| v.as_f64()).unwrap_or(0.0)
}

/// Parse a single-symbol quote payload. Prices come scaled by 100.
fn parse_quote_payload(
  payload: &Value,
  symbol: &Symbol,
  as_of: chrono::NaiveDateTime,
) -> Result<Quote> {
  let data = payload
    .get("data")
    .filter(|d| !d.is_null())
    .ok_or_else(|| Error::NotFound(format!("no quote data for {}", symbol.code())))?;

  Ok(Quote {
    symbol: symbol.code().to_string(),
    name: data.get("f58").and_then(|v| v.as_str()).unwrap_or_default().to_string(),
    now: scaled(data, "f43"),
    high: scaled(data, "f44"),
    low: scaled(data, "f45"),
    open: scaled(data, "f46"),
    prev_close: scaled(data, "f60"),
    volume: raw(data, "f47"),
    turnover: raw(data, "f48"),
    bid1: scaled(data, "f19"),
    ask1: scaled(data, "f39"),
    as_of,
  })
}

/// Parse the trends payload into a minute tape. Rows are
/// `"YYYY-MM-DD HH:MM,open,price,high,low,volume,amount,avg"`.
fn parse_trends_payload(payload: &Value) -> Result<IntradayTape> {
  let data = payload
    .get("data")
    .filter(|d| !d.is_null())
    .ok_or_else(|| Error::Parse("trends payload missing data".to_string()))?;

  let trends = data
    .get("trends")
    .and_then(|t| t.as_array())
    .ok_or_else(|| Error::Parse("trends payload missing rows".to_string()))?;

  let mut tape = IntradayTape {
    date: None,
    prev_close: data.get("preClose").and_then(|v| v.as_f64()).map(|v| v / 100.0),
    points: Vec::new(),
  };

  for row in trends {
    let Some(row) = row.as_str() else { continue };
    let parts: Vec<&str> = row.split(',').collect();
    if parts.len() < 6 {
      continue;
    }
    let mut stamp = parts[0].split_whitespace();
    let (date, time) = (stamp.next(), stamp.next());
    if tape.date.is_none() {
      tape.date = date.map(|d| d.to_string());
    }
    let Some(time) = time else { continue };
    let Ok(price) = parts[2].parse::<f64>() else { continue };
    tape.points.push(IntradayPoint {
      time: time.chars().take(5).collect(),
      price: price / 100.0,
      avg: parts.get(7).and_then(|s| s.parse::<f64>().ok()).map(|v| v / 100.0).unwrap_or(0.0),
      volume: parts[5].parse().unwrap_or(0.0),
    });
  }

  if tape.points.iter().all(|p| p.avg == 0.0) {
    fill_running_average(&mut tape.points);
  }
  Ok(tape)
}

fn parse_listing_payload(payload: &Value) -> Result<Vec<SymbolInfo>> {
  let diff = payload
    .get("data")
    .and_then(|d| d.get("diff"))
    .and_then(|d| d.as_array())
    .ok_or_else(|| Error::Parse("listing payload missing diff".to_string()))?;

  let mut out = Vec::with_capacity(diff.len());
  for item in diff {
    let (Some(code), Some(name)) = (
      item.get("f12").and_then(|v| v.as_str()),
      item.get("f14").and_then(|v| v.as_str()),
    ) else {
      continue;
    };
    out.push(SymbolInfo { code: code.to_string(), name: name.to_string() });
  }
  Ok(out)
}

#[async_trait]
impl MarketDataSource for EastmoneySource {
  fn name(&self) -> &'static str {
    "Eastmoney"
  }

  fn max_bars_per_call(&self) -> usize {
    MAX_BARS
  }

  fn is_available(&self) -> bool {
    self.available.load(Ordering::Relaxed)
  }

  async fn fetch_bars(
    &self,
    symbol: &Symbol,
    count: usize,
    end_date: Option<NaiveDate>,
  ) -> Result<Vec<Bar>> {
    let count = count.clamp(1, MAX_BARS);
    let end = end_date
      .map(|d| d.format("%Y%m%d").to_string())
      .unwrap_or_else(|| "20500101".to_string());
    let url = format!(
      "{}?secid={}&fields1=f1,f2,f3,f4,f5,f6&fields2=f51,f52,f53,f54,f55,f56,f57,f58,f59,f60,f61&klt=101&fqt=1&end={}&lmt={}",
      KLINE_URL,
      symbol.secid(),
      end,
      count
    );

    let payload = self.transport.get_json::<Value>(&url).await?;
    let result = parse_kline_payload(&payload, symbol.code());
    match &result {
      Ok(bars) => {
        self.available.store(true, Ordering::Relaxed);
        debug!("[Eastmoney] {} fetched {} bars", symbol.code(), bars.len());
      }
      Err(_) => self.available.store(false, Ordering::Relaxed),
    }
    result
  }

  async fn fetch_quotes(&self, symbols: &[Symbol]) -> Result<HashMap<String, Quote>> {
    let as_of = chrono::Local::now().naive_local();
    let mut quotes = HashMap::new();

    // The quote endpoint is single-symbol; small batches only.
    for symbol in symbols {
      let url = format!(
        "{}?secid={}&fields=f19,f39,f43,f44,f45,f46,f47,f48,f57,f58,f60,f170,f171",
        QUOTE_URL,
        symbol.secid()
      );
      match self.transport.get_json::<Value>(&url).await {
        Ok(payload) => match parse_quote_payload(&payload, symbol, as_of) {
          Ok(quote) => {
            quotes.insert(symbol.code().to_string(), quote);
          }
          Err(e) => debug!("[Eastmoney] {} quote unavailable: {}", symbol.code(), e),
        },
        Err(e) => warn!("[Eastmoney] {} quote request failed: {}", symbol.code(), e),
      }
    }

    Ok(quotes)
  }

  async fn fetch_intraday(&self, symbol: &Symbol) -> Result<IntradayTape> {
    let url = format!(
      "{}?secid={}&fields1=f1,f2,f3,f4,f5,f6,f7,f8,f9,f10,f11,f12,f13&fields2=f51,f52,f53,f54,f55,f56,f57,f58&iscr=0&iscca=0&ndays=1",
      TRENDS_URL,
      symbol.secid()
    );
    let payload = self.transport.get_json::<Value>(&url).await?;
    let tape = parse_trends_payload(&payload)?;
    if !tape.points.is_empty() {
      info!("[Eastmoney] {} trend tape with {} points", symbol.code(), tape.points.len());
    }
    Ok(tape)
  }
}

#[async_trait]
impl SymbolListSource for EastmoneySource {
  async fn fetch_symbol_list(&self) -> Result<Vec<SymbolInfo>> {
    let url = format!(
      "{}?pn=1&pz=10000&po=1&np=1&fltt=2&fid=f12&fields=f12,f14&fs=m:0+t:6,m:0+t:80,m:1+t:2,m:1+t:23,m:0+t:81+s:2048",
      LIST_URL
    );
    let payload = self.transport.get_json::<Value>(&url).await?;
    let listing = parse_listing_payload(&payload)?;
    info!("[Eastmoney] listing feed returned {} symbols", listing.len());
    Ok(listing)
  }
}

impl std::fmt::Debug for EastmoneySource {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("EastmoneySource").field("available", &self.is_available()).finish()
  }
}
