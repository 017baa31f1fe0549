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

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Live snapshot of one symbol. Ephemeral; never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
  pub symbol: String,
  pub name: String,
  /// Last traded price
  pub now: f64,
  pub open: f64,
  pub prev_close: f64,
  pub high: f64,
  pub low: f64,
  /// Shares traded today
  pub volume: f64,
  /// Money traded today
  pub turnover: f64,
  pub bid1: f64,
  pub ask1: f64,
  pub as_of: NaiveDateTime,
}

impl Quote {
  pub fn change(&self) -> f64 {
    self.now - self.prev_close
  }

  /// Percentage change against the previous close; zero when the previous
  /// close is missing.
  pub fn change_pct(&self) -> f64 {
    if self.prev_close > 0.0 { (self.now - self.prev_close) / self.prev_close * 100.0 } else { 0.0 }
  }
}

/// Snapshot of a market index (domestic or international).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexQuote {
  pub symbol: String,
  pub name: String,
  pub price: f64,
  pub change: f64,
  pub change_pct: f64,
  pub time: String,
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::NaiveDate;

  fn quote(now: f64, prev: f64) -> Quote {
    Quote {
      symbol: "600519".to_string(),
      name: "贵州茅台".to_string(),
      now,
      open: prev,
      prev_close: prev,
      high: now,
      low: prev,
      volume: 1000.0,
      turnover: 100_000.0,
      bid1: now - 0.01,
      ask1: now + 0.01,
      as_of: NaiveDate::from_ymd_opt(2025, 6, 16).unwrap().and_hms_opt(10, 0, 0).unwrap(),
    }
  }

  #[test]
  fn test_change_pct() {
    let q = quote(110.0, 100.0);
    assert!((q.change() - 10.0).abs() < 1e-9);
    assert!((q.change_pct() - 10.0).abs() < 1e-9);
  }

  #[test]
  fn test_change_pct_zero_prev_close() {
    let q = quote(110.0, 0.0);
    assert_eq!(q.change_pct(), 0.0);
  }
}
