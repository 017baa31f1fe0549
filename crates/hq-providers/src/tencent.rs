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

//! Fast A-share bar source: forward-adjusted daily klines (640 per page),
//! `~`-delimited wire quotes in batches of 60, the minute tape, Hong Kong
//! klines and HK/US index snapshots.

use crate::source::MarketDataSource;
use crate::transport::Transport;
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use hq_core::{Error, Result, Symbol};
use hq_models::{normalize_bars, Bar, IndexQuote, IntradayPoint, IntradayTape, Quote};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, warn};

const KLINE_URL: &str = "http://web.ifzq.gtimg.cn/appstock/app/fqkline/get";
const HK_KLINE_URL: &str = "http://web.ifzq.gtimg.cn/appstock/app/hkfqkline/get";
const QUOTE_URL: &str = "http://qt.gtimg.cn/q=";
const MINUTE_URL: &str = "http://data.gtimg.cn/flashdata/hushen/minute/";

const QUOTE_BATCH: usize = 60;
pub const MAX_BARS: usize = 640;

/// Index symbols served through the same wire endpoint.
fn index_code(symbol: &str) -> Option<&'static str> {
  match symbol.to_uppercase().as_str() {
    "^HSI" | "HSI" => Some("r_hkHSI"),
    "HSTECH.HK" | "HSTECH" => Some("r_hkHSTECH"),
    "^DJI" | "DJI" => Some("usDJI"),
    "^IXIC" | "IXIC" => Some("usIXIC"),
    "^GSPC" | "GSPC" => Some("usINX"),
    "^NDX" | "NDX" => Some("usNDX"),
    "QQQ" => Some("usQQQ"),
    _ => None,
  }
}

pub struct TencentSource {
  transport: Transport,
  available: AtomicBool,
}

impl TencentSource {
  pub fn new(timeout_secs: u64, max_retries: u32) -> Result<Self> {
    let transport = Transport::new(
      timeout_secs,
      max_retries,
      vec![
        ("User-Agent", "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36"),
        ("Referer", "http://gu.qq.com/"),
      ],
    )?;
    Ok(Self { transport, available: AtomicBool::new(true) })
  }

  fn record_parse_outcome<T>(&self, result: Result<T>) -> Result<T> {
    match &result {
      Ok(_) => self.available.store(true, Ordering::Relaxed),
      Err(Error::Parse(_)) => self.available.store(false, Ordering::Relaxed),
      Err(_) => {}
    }
    result
  }
}

fn value_to_f64(v: &Value) -> Option<f64> {
  match v {
    Value::Number(n) => n.as_f64(),
    Value::String(s) => s.parse().ok(),
    _ => None,
  }
}

/// Parse a kline payload: `data.<wire_code>.qfqday` (or `day`) rows of
/// `[date, open, close, high, low, volume, ...]`.
fn parse_kline_payload(payload: &Value, wire_code: &str, bare_code: &str) -> Result<Vec<Bar>> {
  let series = payload
    .get("data")
    .and_then(|d| d.get(wire_code))
    .and_then(|s| s.get("qfqday").or_else(|| s.get("day")))
    .and_then(|k| k.as_array())
    .ok_or_else(|| Error::Parse(format!("kline payload missing day series for {}", wire_code)))?;

  let mut bars = Vec::with_capacity(series.len());
  for row in series {
    let Some(cols) = row.as_array() else { continue };
    if cols.len() < 6 {
      continue;
    }
    let Some(date) = cols[0].as_str().and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
    else {
      continue;
    };
    let (Some(open), Some(close), Some(high), Some(low), Some(volume)) = (
      value_to_f64(&cols[1]),
      value_to_f64(&cols[2]),
      value_to_f64(&cols[3]),
      value_to_f64(&cols[4]),
      value_to_f64(&cols[5]),
    ) else {
      continue;
    };
    bars.push(Bar::new(bare_code, date, open, high, low, close, volume));
  }

  Ok(normalize_bars(bars))
}

fn safe_field(parts: &[&str], idx: usize) -> f64 {
  parts.get(idx).and_then(|s| s.parse().ok()).unwrap_or(0.0)
}

/// Parse the `~`-delimited wire quote text into quotes keyed by bare code.
fn parse_quote_payload(text: &str, as_of: NaiveDateTime) -> HashMap<String, Quote> {
  let mut quotes = HashMap::new();

  for segment in text.split(';') {
    let Some((lhs, rhs)) = segment.split_once("=\"") else { continue };
    let body = rhs.trim_end_matches(|c| c == '"' || c == '\n' || c == '\r');
    let parts: Vec<&str> = body.split('~').collect();
    if parts.len() < 45 {
      continue;
    }

    // lhs looks like `v_sh600519`; the bare code is also carried in field 2.
    let bare = parts[2].to_string();
    if bare.is_empty() || !lhs.contains(&bare) {
      continue;
    }

    quotes.insert(
      bare.clone(),
      Quote {
        symbol: bare,
        name: parts[1].to_string(),
        now: safe_field(&parts, 3),
        prev_close: safe_field(&parts, 4),
        open: safe_field(&parts, 5),
        // Lot counts on the wire; convert to shares.
        volume: safe_field(&parts, 6) * 100.0,
        bid1: safe_field(&parts, 9),
        ask1: safe_field(&parts, 19),
        high: safe_field(&parts, 33),
        low: safe_field(&parts, 34),
        turnover: safe_field(&parts, 37),
        as_of,
      },
    );
  }

  quotes
}

/// Parse the minute-tape text. Lines are `HHMM price volume` after a
/// `date:YYMMDD` header.
fn parse_minute_payload(text: &str) -> IntradayTape {
  let mut tape = IntradayTape::default();

  for raw_line in text.split("\\n\\").flat_map(|chunk| chunk.lines()) {
    let line = raw_line.trim().trim_end_matches('\\');
    if let Some(d) = line.strip_prefix("date:") {
      let d = d.trim().trim_matches('"');
      if d.len() == 6 {
        tape.date = Some(format!("20{}-{}-{}", &d[0..2], &d[2..4], &d[4..6]));
      }
      continue;
    }
    if line.contains(':') {
      continue;
    }
    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.len() < 2 || parts[0].len() != 4 {
      continue;
    }
    let Ok(price) = parts[1].parse::<f64>() else { continue };
    let volume = parts.get(2).and_then(|s| s.parse().ok()).unwrap_or(0.0);
    tape.points.push(IntradayPoint {
      time: format!("{}:{}", &parts[0][0..2], &parts[0][2..4]),
      price,
      avg: 0.0,
      volume,
    });
  }

  hq_models::fill_running_average(&mut tape.points);
  tape
}

fn parse_index_payload(text: &str, symbol: &str) -> Result<IndexQuote> {
  let body = text
    .split_once("=\"")
    .map(|(_, rhs)| rhs.trim_end_matches(|c| c == '"' || c == ';' || c == '\n' || c == '\r'))
    .ok_or_else(|| Error::Parse(format!("index payload for {}", symbol)))?;

  let parts: Vec<&str> = body.split('~').collect();
  if parts.len() <= 32 {
    return Err(Error::Parse(format!("short index payload for {}", symbol)));
  }

  let price = safe_field(&parts, 3);
  if price <= 0.0 {
    return Err(Error::NotFound(format!("no index price for {}", symbol)));
  }

  Ok(IndexQuote {
    symbol: symbol.to_string(),
    name: parts[1].to_string(),
    price,
    change: safe_field(&parts, 31),
    change_pct: safe_field(&parts, 32),
    time: parts.get(30).unwrap_or(&"").to_string(),
  })
}

#[async_trait]
impl MarketDataSource for TencentSource {
  fn name(&self) -> &'static str {
    "Tencent"
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
    let end = end_date.map(|d| d.format("%Y-%m-%d").to_string()).unwrap_or_default();
    let wire = symbol.prefixed();

    let payload = if symbol.is_hk() {
      let url = format!(
        "{}?_var=kline_dayqfq&param={},day,,{},{},qfq",
        HK_KLINE_URL, wire, end, count
      );
      let text = self.transport.get_text(&url).await?;
      let json = text
        .split_once('=')
        .map(|(_, rhs)| rhs)
        .ok_or_else(|| Error::Parse(format!("unexpected HK kline envelope for {}", wire)))?;
      serde_json::from_str::<Value>(json)
        .map_err(|e| Error::Parse(format!("HK kline JSON for {}: {}", wire, e)))?
    } else {
      let url = format!("{}?param={},day,,{},{},qfq", KLINE_URL, wire, end, count);
      self.transport.get_json::<Value>(&url).await?
    };

    let result = parse_kline_payload(&payload, &wire, symbol.code());
    let bars = self.record_parse_outcome(result)?;
    debug!("[Tencent] {} fetched {} bars", symbol.code(), bars.len());
    Ok(bars)
  }

  async fn fetch_quotes(&self, symbols: &[Symbol]) -> Result<HashMap<String, Quote>> {
    let as_of = chrono::Local::now().naive_local();
    let mut quotes = HashMap::new();

    for chunk in symbols.chunks(QUOTE_BATCH) {
      let list: Vec<String> = chunk.iter().map(|s| s.prefixed()).collect();
      let url = format!("{}{}", QUOTE_URL, list.join(","));
      match self.transport.get_text_with_charset(&url, "gbk").await {
        Ok(text) => quotes.extend(parse_quote_payload(&text, as_of)),
        Err(e) => warn!("[Tencent] quote batch failed: {}", e),
      }
    }

    if quotes.is_empty() && !symbols.is_empty() {
      return Err(Error::Parse("no quotes parsed from wire payload".to_string()));
    }
    self.available.store(true, Ordering::Relaxed);
    Ok(quotes)
  }

  async fn fetch_intraday(&self, symbol: &Symbol) -> Result<IntradayTape> {
    let url = format!("{}{}.js", MINUTE_URL, symbol.prefixed());
    let text = self.transport.get_text_with_charset(&url, "gbk").await?;
    let tape = parse_minute_payload(&text);
    if !tape.points.is_empty() {
      info!("[Tencent] {} minute tape with {} points", symbol.code(), tape.points.len());
    }
    Ok(tape)
  }

  async fn fetch_index(&self, symbol: &str) -> Result<IndexQuote> {
    let code = index_code(symbol)
      .ok_or_else(|| Error::Unsupported(format!("Tencent: index {}", symbol)))?;
    let url = format!("{}{}", QUOTE_URL, code);
    let text = self.transport.get_text_with_charset(&url, "gbk").await?;
    parse_index_payload(&text, symbol)
  }
}

impl std::fmt::Debug for TencentSource {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("TencentSource").field("available", &self.is_available()).finish()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn sample_kline() -> Value {
    serde_json::json!({
      "code": 0,
      "msg": "",
      "data": {
        "sh600519": {
          "qfqday": [
            ["2025-06-13", "1820.00", "1825.00", "1830.00", "1815.00", "23456.00"],
            ["2025-06-16", "1826.00", "1840.00", "1845.00", "1824.00", "34567.00"]
          ]
        }
      }
    })
  }

  #[test]
  fn test_parse_kline_payload() {
    let bars = parse_kline_payload(&sample_kline(), "sh600519", "600519").unwrap();
    assert_eq!(bars.len(), 2);
    assert_eq!(bars[0].date, NaiveDate::from_ymd_opt(2025, 6, 13).unwrap());
    assert_eq!(bars[0].open, 1820.0);
    assert_eq!(bars[0].close, 1825.0);
    assert_eq!(bars[0].high, 1830.0);
    assert_eq!(bars[0].low, 1815.0);
    assert_eq!(bars[1].symbol, "600519");
  }

  #[test]
  fn test_parse_kline_short_rows_skipped() {
    let payload = serde_json::json!({
      "data": { "sh600519": { "day": [["2025-06-13", "1.0"]] } }
    });
    let bars = parse_kline_payload(&payload, "sh600519", "600519").unwrap();
    assert!(bars.is_empty());
  }

  #[test]
  fn test_parse_kline_missing_series_is_error() {
    let payload = serde_json::json!({ "data": {} });
    assert!(parse_kline_payload(&payload, "sh600519", "600519").is_err());
  }

  #[test]
  fn test_parse_quote_payload() {
    let mut fields = vec!["51", "贵州茅台", "600519", "1825.00", "1820.00", "1826.00", "12345"];
    fields.resize(50, "0");
    fields[9] = "1824.99";
    fields[19] = "1825.01";
    fields[33] = "1830.00";
    fields[34] = "1815.00";
    fields[37] = "2251234";
    let text = format!("v_sh600519=\"{}\";", fields.join("~"));

    let as_of = NaiveDate::from_ymd_opt(2025, 6, 16).unwrap().and_hms_opt(10, 0, 0).unwrap();
    let quotes = parse_quote_payload(&text, as_of);
    let q = quotes.get("600519").unwrap();
    assert_eq!(q.name, "贵州茅台");
    assert_eq!(q.now, 1825.0);
    assert_eq!(q.prev_close, 1820.0);
    assert_eq!(q.open, 1826.0);
    assert_eq!(q.volume, 1_234_500.0);
    assert_eq!(q.bid1, 1824.99);
    assert_eq!(q.ask1, 1825.01);
    assert_eq!(q.high, 1830.0);
    assert_eq!(q.low, 1815.0);
  }

  #[test]
  fn test_parse_quote_payload_short_segment_skipped() {
    let quotes = parse_quote_payload(
      "v_sh600519=\"51~x~600519~1.0\";",
      NaiveDate::from_ymd_opt(2025, 6, 16).unwrap().and_hms_opt(10, 0, 0).unwrap(),
    );
    assert!(quotes.is_empty());
  }

  #[test]
  fn test_parse_minute_payload() {
    let text = "min_data=\"\\n\\\ndate:250616\\n\\\n0930 1824.00 100\\n\\\n0931 1826.00 150\\n\\\n\";";
    let tape = parse_minute_payload(text);
    assert_eq!(tape.date.as_deref(), Some("2025-06-16"));
    assert_eq!(tape.points.len(), 2);
    assert_eq!(tape.points[0].time, "09:30");
    assert_eq!(tape.points[0].price, 1824.0);
    assert!(tape.points[1].avg > 1824.0 && tape.points[1].avg < 1826.0);
  }

  #[test]
  fn test_parse_index_payload() {
    let mut fields = vec!["100", "恒生指数", "HSI", "24000.50"];
    fields.resize(40, "0");
    fields[30] = "2025/06/16 16:08:11";
    fields[31] = "120.50";
    fields[32] = "0.51";
    let text = format!("v_r_hkHSI=\"{}\";", fields.join("~"));
    let idx = parse_index_payload(&text, "^HSI").unwrap();
    assert_eq!(idx.name, "恒生指数");
    assert_eq!(idx.price, 24000.5);
    assert_eq!(idx.change_pct, 0.51);
  }

  #[test]
  fn test_index_code_mapping() {
    assert_eq!(index_code("^HSI"), Some("r_hkHSI"));
    assert_eq!(index_code("gspc"), Some("usINX"));
    assert_eq!(index_code("000300"), None);
  }
}
