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

//! Wire-format quote source: comma-delimited realtime quotes in batches of
//! 800, the per-minute tape, and US/HK index snapshots. No bar history.

use crate::source::MarketDataSource;
use crate::transport::Transport;
use async_trait::async_trait;
use chrono::NaiveDateTime;
use hq_core::{Error, Result, Symbol};
use hq_models::{fill_running_average, IndexQuote, IntradayPoint, IntradayTape, Quote};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{info, warn};

const QUOTE_URL: &str = "http://hq.sinajs.cn/list=";
const INTRADAY_URL: &str =
  "http://money.finance.sina.com.cn/quotes_service/api/json_v2.php/CN_MarketData.getKLineData";

const QUOTE_BATCH: usize = 800;

fn index_code(symbol: &str) -> Option<&'static str> {
  match symbol.to_uppercase().as_str() {
    "^DJI" | "DJI" => Some("gb_dji"),
    "^IXIC" | "IXIC" => Some("gb_ixic"),
    "^GSPC" | "GSPC" => Some("gb_inx"),
    "^NDX" | "NDX" => Some("gb_ndx"),
    "QQQ" => Some("gb_qqq"),
    "^HSI" | "HSI" => Some("rt_hkHSI"),
    "HSTECH.HK" | "HSTECH" => Some("rt_hkHSTECH"),
    _ => None,
  }
}

pub struct SinaSource {
  transport: Transport,
  available: AtomicBool,
}

impl SinaSource {
  pub fn new(timeout_secs: u64, max_retries: u32) -> Result<Self> {
    let transport = Transport::new(
      timeout_secs,
      max_retries,
      vec![
        (
          "User-Agent",
          "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/54.0.2840.100 Safari/537.36",
        ),
        ("Referer", "http://finance.sina.com.cn/"),
      ],
    )?;
    Ok(Self { transport, available: AtomicBool::new(true) })
  }
}

fn safe_field(parts: &[&str], idx: usize) -> f64 {
  parts.get(idx).and_then(|s| s.parse().ok()).unwrap_or(0.0)
}

/// Parse one `hq_str_` response body into quotes keyed by bare code,
/// domestic indices included.
///
/// Stock lines carry `name,open,prev_close,now,high,low,bid1,ask1,volume,
/// amount,...,date,time`; index lines reorder the leading fields and carry
/// no book levels.
fn parse_quote_payload(text: &str, as_of: NaiveDateTime) -> HashMap<String, Quote> {
  let mut quotes = HashMap::new();

  for line in text.lines() {
    let Some((lhs, rhs)) = line.split_once("=\"") else { continue };
    let body = rhs.trim_end_matches(|c| c == '"' || c == ';' || c == '\r');
    if body.is_empty() {
      continue;
    }
    let Some(full_code) = lhs.split("hq_str_").nth(1) else { continue };
    // Global index payloads (gb_/rt_hk) do not parse as symbols; they flow
    // through parse_index_payload instead.
    let Ok(symbol) = Symbol::parse(full_code) else { continue };

    let parts: Vec<&str> = body.split(',').collect();
    if parts.len() < 30 {
      continue;
    }

    let bare = symbol.code().to_string();
    let quote = if symbol.is_index() {
      Quote {
        symbol: bare.clone(),
        name: parts[0].to_string(),
        now: safe_field(&parts, 1),
        prev_close: safe_field(&parts, 2),
        open: safe_field(&parts, 3),
        high: safe_field(&parts, 4),
        low: safe_field(&parts, 5),
        bid1: 0.0,
        ask1: 0.0,
        volume: safe_field(&parts, 8),
        turnover: safe_field(&parts, 9),
        as_of,
      }
    } else {
      Quote {
        symbol: bare.clone(),
        name: parts[0].to_string(),
        open: safe_field(&parts, 1),
        prev_close: safe_field(&parts, 2),
        now: safe_field(&parts, 3),
        high: safe_field(&parts, 4),
        low: safe_field(&parts, 5),
        bid1: safe_field(&parts, 6),
        ask1: safe_field(&parts, 7),
        volume: safe_field(&parts, 8),
        turnover: safe_field(&parts, 9),
        as_of,
      }
    };

    quotes.insert(bare, quote);
  }

  quotes
}

#[derive(Debug, Deserialize)]
struct MinuteRow {
  day: String,
  #[serde(default)]
  close: String,
  #[serde(default)]
  volume: String,
}

/// Keep only the most recent day of the returned minute rows and compute
/// the running average column.
fn parse_intraday_rows(rows: Vec<MinuteRow>) -> IntradayTape {
  let latest_date = rows
    .iter()
    .filter_map(|r| r.day.split_whitespace().next())
    .max()
    .map(|d| d.to_string());

  let mut tape = IntradayTape { date: latest_date.clone(), prev_close: None, points: Vec::new() };
  let Some(latest_date) = latest_date else { return tape };

  for row in rows {
    let mut it = row.day.split_whitespace();
    let (Some(date), Some(time)) = (it.next(), it.next()) else { continue };
    if date != latest_date {
      continue;
    }
    let Ok(price) = row.close.parse::<f64>() else { continue };
    let volume = row.volume.parse().unwrap_or(0.0);
    tape.points.push(IntradayPoint {
      time: time.chars().take(5).collect(),
      price,
      avg: 0.0,
      volume,
    });
  }

  fill_running_average(&mut tape.points);
  tape
}

fn parse_index_payload(text: &str, sina_code: &str, symbol: &str) -> Result<IndexQuote> {
  let body = text
    .split_once("=\"")
    .map(|(_, rhs)| rhs.trim_end_matches(|c| c == '"' || c == ';' || c == '\n' || c == '\r'))
    .ok_or_else(|| Error::Parse(format!("index payload for {}", symbol)))?;
  if body.is_empty() {
    return Err(Error::NotFound(format!("empty index payload for {}", symbol)));
  }

  let parts: Vec<&str> = body.split(',').collect();
  let (name, price, change, change_pct) = if sina_code.starts_with("rt_hk") {
    if parts.len() <= 8 {
      return Err(Error::Parse(format!("short HK index payload for {}", symbol)));
    }
    (parts[1].to_string(), safe_field(&parts, 6), safe_field(&parts, 7), safe_field(&parts, 8))
  } else {
    if parts.len() <= 4 {
      return Err(Error::Parse(format!("short US index payload for {}", symbol)));
    }
    (parts[0].to_string(), safe_field(&parts, 1), safe_field(&parts, 4), safe_field(&parts, 2))
  };

  if price <= 0.0 {
    return Err(Error::NotFound(format!("no index price for {}", symbol)));
  }

  Ok(IndexQuote {
    symbol: symbol.to_string(),
    name,
    price,
    change,
    change_pct,
    time: chrono::Local::now().naive_local().format("%Y-%m-%d %H:%M:%S").to_string(),
  })
}

#[async_trait]
impl MarketDataSource for SinaSource {
  fn name(&self) -> &'static str {
    "Sina"
  }

  fn is_available(&self) -> bool {
    self.available.load(Ordering::Relaxed)
  }

  async fn fetch_quotes(&self, symbols: &[Symbol]) -> Result<HashMap<String, Quote>> {
    let as_of = chrono::Local::now().naive_local();
    let mut quotes = HashMap::new();

    for chunk in symbols.chunks(QUOTE_BATCH) {
      let list: Vec<String> = chunk.iter().map(|s| s.prefixed()).collect();
      let url = format!("{}{}", QUOTE_URL, list.join(","));
      match self.transport.get_text_with_charset(&url, "gbk").await {
        Ok(text) => quotes.extend(parse_quote_payload(&text, as_of)),
        Err(e) => warn!("[Sina] quote batch failed: {}", e),
      }
    }

    if quotes.is_empty() && !symbols.is_empty() {
      self.available.store(false, Ordering::Relaxed);
      return Err(Error::Parse("no quotes parsed from wire payload".to_string()));
    }
    self.available.store(true, Ordering::Relaxed);
    Ok(quotes)
  }

  async fn fetch_intraday(&self, symbol: &Symbol) -> Result<IntradayTape> {
    let url = format!(
      "{}?symbol={}&scale=1&ma=no&datalen=480",
      INTRADAY_URL,
      symbol.prefixed()
    );
    let rows: Vec<MinuteRow> = self.transport.get_json(&url).await?;
    let tape = parse_intraday_rows(rows);
    if !tape.points.is_empty() {
      info!("[Sina] {} minute tape with {} points", symbol.code(), tape.points.len());
    }
    Ok(tape)
  }

  async fn fetch_index(&self, symbol: &str) -> Result<IndexQuote> {
    let code =
      index_code(symbol).ok_or_else(|| Error::Unsupported(format!("Sina: index {}", symbol)))?;
    let url = format!("{}{}", QUOTE_URL, code);
    let text = self.transport.get_text_with_charset(&url, "gbk").await?;
    parse_index_payload(&text, code, symbol)
  }
}

impl std::fmt::Debug for SinaSource {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("SinaSource").field("available", &self.is_available()).finish()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::NaiveDate;

  fn as_of() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 6, 16).unwrap().and_hms_opt(10, 0, 0).unwrap()
  }

  #[test]
  fn test_parse_stock_quote() {
    let mut fields =
      vec!["贵州茅台", "1826.000", "1820.000", "1825.000", "1830.000", "1815.000", "1824.990", "1825.010", "1234567", "2251234567.000"];
    fields.resize(32, "0");
    fields[30] = "2025-06-16";
    fields[31] = "10:00:00";
    let text = format!("var hq_str_sh600519=\"{}\";\n", fields.join(","));

    let quotes = parse_quote_payload(&text, as_of());
    let q = quotes.get("600519").unwrap();
    assert_eq!(q.name, "贵州茅台");
    assert_eq!(q.open, 1826.0);
    assert_eq!(q.prev_close, 1820.0);
    assert_eq!(q.now, 1825.0);
    assert_eq!(q.bid1, 1824.99);
    assert_eq!(q.ask1, 1825.01);
    assert_eq!(q.volume, 1_234_567.0);
  }

  #[test]
  fn test_parse_index_quote_keyed_by_bare_code() {
    let mut fields = vec!["上证指数", "3400.00", "3390.00", "3395.00", "3410.00", "3380.00"];
    fields.resize(32, "0");
    fields[8] = "123456789";
    let text = format!("var hq_str_sh000001=\"{}\";\n", fields.join(","));

    let quotes = parse_quote_payload(&text, as_of());
    // Indices share the bare-code keying every consumer looks up by.
    assert!(!quotes.contains_key("sh000001"));
    let q = quotes.get("000001").unwrap();
    assert_eq!(q.symbol, "000001");
    assert_eq!(q.name, "上证指数");
    assert_eq!(q.now, 3400.0);
    assert_eq!(q.prev_close, 3390.0);
    assert_eq!(q.open, 3395.0);
    assert_eq!(q.bid1, 0.0);
  }

  #[test]
  fn test_empty_body_skipped() {
    let quotes = parse_quote_payload("var hq_str_sz999999=\"\";\n", as_of());
    assert!(quotes.is_empty());
  }

  #[test]
  fn test_parse_intraday_rows_latest_day_only() {
    let rows = vec![
      MinuteRow { day: "2025-06-13 14:59:00".into(), close: "10.0".into(), volume: "100".into() },
      MinuteRow { day: "2025-06-16 09:30:00".into(), close: "11.0".into(), volume: "200".into() },
      MinuteRow { day: "2025-06-16 09:31:00".into(), close: "12.0".into(), volume: "200".into() },
    ];
    let tape = parse_intraday_rows(rows);
    assert_eq!(tape.date.as_deref(), Some("2025-06-16"));
    assert_eq!(tape.points.len(), 2);
    assert_eq!(tape.points[0].time, "09:30");
    assert!((tape.points[1].avg - 11.5).abs() < 1e-9);
  }

  #[test]
  fn test_parse_us_index_payload() {
    let text = "var hq_str_gb_dji=\"道琼斯,42000.25,0.35,2025-06-16 16:00:00,147.50,\";";
    let idx = parse_index_payload(text, "gb_dji", "^DJI").unwrap();
    assert_eq!(idx.price, 42000.25);
    assert_eq!(idx.change, 147.5);
    assert_eq!(idx.change_pct, 0.35);
  }

  #[test]
  fn test_parse_hk_index_payload() {
    let text = "var hq_str_rt_hkHSI=\"HSI,恒生指数,24000.00,23900.00,24100.00,23800.00,24050.00,150.00,0.63,0,0\";";
    let idx = parse_index_payload(text, "rt_hkHSI", "^HSI").unwrap();
    assert_eq!(idx.name, "恒生指数");
    assert_eq!(idx.price, 24050.0);
    assert_eq!(idx.change, 150.0);
  }

  #[test]
  fn test_empty_index_payload_is_not_found() {
    let text = "var hq_str_gb_dji=\"\";";
    assert!(matches!(parse_index_payload(text, "gb_dji", "^DJI"), Err(Error::NotFound(_))));
  }
}
