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

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One trading day for one symbol. Prices are forward-adjusted as delivered
/// by the upstream providers; `(symbol, date)` is the unique key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
  pub symbol: String,
  pub date: NaiveDate,
  pub open: f64,
  pub high: f64,
  pub low: f64,
  pub close: f64,
  pub volume: f64,
}

impl Bar {
  pub fn new(
    symbol: impl Into<String>,
    date: NaiveDate,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
  ) -> Self {
    Self { symbol: symbol.into(), date, open, high, low, close, volume }
  }
}

/// Sort ascending by date and drop duplicate dates, keeping the last
/// occurrence. Provider pages overlap at the seams, so this runs after every
/// merge.
pub fn normalize_bars(mut bars: Vec<Bar>) -> Vec<Bar> {
  bars.sort_by_key(|b| b.date);
  let mut out: Vec<Bar> = Vec::with_capacity(bars.len());
  for bar in bars {
    match out.last_mut() {
      Some(last) if last.date == bar.date => *last = bar,
      _ => out.push(bar),
    }
  }
  out
}

#[cfg(test)]
mod tests {
  use super::*;

  fn bar(day: u32, close: f64) -> Bar {
    Bar::new("600519", NaiveDate::from_ymd_opt(2025, 1, day).unwrap(), 1.0, 2.0, 0.5, close, 100.0)
  }

  #[test]
  fn test_normalize_sorts_ascending() {
    let out = normalize_bars(vec![bar(3, 1.0), bar(1, 1.0), bar(2, 1.0)]);
    let days: Vec<u32> = out.iter().map(|b| b.date.format("%d").to_string().parse().unwrap()).collect();
    assert_eq!(days, vec![1, 2, 3]);
  }

  #[test]
  fn test_normalize_dedupes_keeping_last() {
    let out = normalize_bars(vec![bar(1, 1.0), bar(1, 2.0)]);
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].close, 2.0);
  }

  #[test]
  fn test_bar_serde_round_trip() {
    let b = bar(2, 42.0);
    let json = serde_json::to_string(&b).unwrap();
    let parsed: Bar = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, b);
  }
}
