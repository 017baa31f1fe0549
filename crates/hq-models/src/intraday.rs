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

use serde::{Deserialize, Serialize};

/// One minute of the intraday tape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntradayPoint {
  /// `HH:MM`
  pub time: String,
  pub price: f64,
  /// Running volume-weighted average price
  pub avg: f64,
  pub volume: f64,
}

/// Raw intraday points as returned by a single provider, before the quote
/// header is attached.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IntradayTape {
  /// `YYYY-MM-DD` of the tape, when the provider reports it
  pub date: Option<String>,
  pub prev_close: Option<f64>,
  pub points: Vec<IntradayPoint>,
}

/// Full intraday response: header from the live quote plus the tape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntradaySeries {
  pub code: String,
  pub name: String,
  pub now: f64,
  pub open: f64,
  pub prev_close: f64,
  pub high: f64,
  pub low: f64,
  pub change_pct: f64,
  pub volume: f64,
  pub turnover: f64,
  pub date: String,
  pub points: Vec<IntradayPoint>,
}

/// Recompute the running VWAP column from price and volume. Providers that
/// ship their own average keep it; the rest get it from here.
pub fn fill_running_average(points: &mut [IntradayPoint]) {
  let mut total_volume = 0.0_f64;
  let mut total_amount = 0.0_f64;
  for p in points.iter_mut() {
    total_volume += p.volume;
    total_amount += p.price * p.volume;
    p.avg = if total_volume > 0.0 { total_amount / total_volume } else { p.price };
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_fill_running_average() {
    let mut points = vec![
      IntradayPoint { time: "09:30".to_string(), price: 10.0, avg: 0.0, volume: 100.0 },
      IntradayPoint { time: "09:31".to_string(), price: 20.0, avg: 0.0, volume: 100.0 },
    ];
    fill_running_average(&mut points);
    assert!((points[0].avg - 10.0).abs() < 1e-9);
    assert!((points[1].avg - 15.0).abs() < 1e-9);
  }

  #[test]
  fn test_fill_running_average_zero_volume() {
    let mut points =
      vec![IntradayPoint { time: "09:30".to_string(), price: 10.0, avg: 0.0, volume: 0.0 }];
    fill_running_average(&mut points);
    assert_eq!(points[0].avg, 10.0);
  }
}
