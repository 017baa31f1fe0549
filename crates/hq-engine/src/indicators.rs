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

//! Technical indicator math over a daily bar series.
//!
//! Pure functions, column-in column-out; warm-up positions are `NaN`.
//! Consumers gate on series length before calling (see
//! [`hq_core::MIN_DATA_DAYS`]).

/// Simple moving average; `NaN` until the window fills.
pub fn sma(values: &[f64], window: usize) -> Vec<f64> {
  let mut out = vec![f64::NAN; values.len()];
  if window == 0 || values.len() < window {
    return out;
  }
  let mut sum: f64 = values[..window - 1].iter().sum();
  for i in window - 1..values.len() {
    sum += values[i];
    out[i] = sum / window as f64;
    sum -= values[i + 1 - window];
  }
  out
}

/// Exponential moving average with `alpha = 2 / (span + 1)`, seeded at the
/// first value.
pub fn ema(values: &[f64], span: usize) -> Vec<f64> {
  ewm(values, 2.0 / (span as f64 + 1.0))
}

/// Recursive exponential smoothing with an explicit alpha.
pub fn ewm(values: &[f64], alpha: f64) -> Vec<f64> {
  let mut out = Vec::with_capacity(values.len());
  let mut prev: Option<f64> = None;
  for &v in values {
    let next = match prev {
      Some(p) if !v.is_nan() => alpha * v + (1.0 - alpha) * p,
      Some(p) => p,
      None => v,
    };
    out.push(next);
    if !next.is_nan() {
      prev = Some(next);
    }
  }
  out
}

fn rolling_min(values: &[f64], window: usize) -> Vec<f64> {
  let mut out = vec![f64::NAN; values.len()];
  for i in window.saturating_sub(1)..values.len() {
    out[i] = values[i + 1 - window..=i].iter().copied().fold(f64::INFINITY, f64::min);
  }
  out
}

fn rolling_max(values: &[f64], window: usize) -> Vec<f64> {
  let mut out = vec![f64::NAN; values.len()];
  for i in window.saturating_sub(1)..values.len() {
    out[i] = values[i + 1 - window..=i].iter().copied().fold(f64::NEG_INFINITY, f64::max);
  }
  out
}

/// KDJ stochastic oscillator, the A-share staple: RSV over `n` days,
/// smoothed twice with `1/m` weights, `J = 3K - 2D`.
pub fn kdj(
  high: &[f64],
  low: &[f64],
  close: &[f64],
  n: usize,
  m1: usize,
  m2: usize,
) -> (Vec<f64>, Vec<f64>, Vec<f64>) {
  let lowest = rolling_min(low, n);
  let highest = rolling_max(high, n);

  let rsv: Vec<f64> = close
    .iter()
    .zip(lowest.iter().zip(highest.iter()))
    .map(|(&c, (&ll, &hh))| {
      if ll.is_nan() || hh.is_nan() {
        f64::NAN
      } else {
        (c - ll) / (hh - ll + 1e-10) * 100.0
      }
    })
    .collect();

  let k = ewm(&rsv, 1.0 / m1 as f64);
  let d = ewm(&k, 1.0 / m2 as f64);
  let j: Vec<f64> = k.iter().zip(d.iter()).map(|(&k, &d)| 3.0 * k - 2.0 * d).collect();
  (k, d, j)
}

/// MACD: fast/slow EMA difference, signal EMA, histogram.
pub fn macd(close: &[f64], fast: usize, slow: usize, signal: usize) -> (Vec<f64>, Vec<f64>, Vec<f64>) {
  let ema_fast = ema(close, fast);
  let ema_slow = ema(close, slow);
  let line: Vec<f64> = ema_fast.iter().zip(ema_slow.iter()).map(|(&f, &s)| f - s).collect();
  let sig = ema(&line, signal);
  let hist: Vec<f64> = line.iter().zip(sig.iter()).map(|(&l, &s)| l - s).collect();
  (line, sig, hist)
}

/// BBI bull-and-bear index: mean of the 3/6/12/24-day moving averages.
pub fn bbi(close: &[f64]) -> Vec<f64> {
  let mas = [sma(close, 3), sma(close, 6), sma(close, 12), sma(close, 24)];
  (0..close.len())
    .map(|i| {
      let mut sum = 0.0;
      for ma in &mas {
        sum += ma[i];
      }
      sum / mas.len() as f64
    })
    .collect()
}

/// RSI over simple rolling mean gains/losses.
pub fn rsi(close: &[f64], window: usize) -> Vec<f64> {
  let mut gains = vec![f64::NAN; close.len()];
  let mut losses = vec![f64::NAN; close.len()];
  for i in 1..close.len() {
    let delta = close[i] - close[i - 1];
    gains[i] = delta.max(0.0);
    losses[i] = (-delta).max(0.0);
  }
  let avg_gain = sma(&gains[1..], window);
  let avg_loss = sma(&losses[1..], window);

  let mut out = vec![f64::NAN; close.len()];
  for i in 0..avg_gain.len() {
    let (g, l) = (avg_gain[i], avg_loss[i]);
    if g.is_nan() || l.is_nan() {
      continue;
    }
    let rs = g / (l + 1e-10);
    out[i + 1] = 100.0 - 100.0 / (1.0 + rs);
  }
  out
}

/// Short-horizon trend line: `EMA(EMA(close, 10), 10)`.
pub fn trend_line(close: &[f64]) -> Vec<f64> {
  ema(&ema(close, 10), 10)
}

/// Long-horizon bull/bear line: mean of the 14/28/57/114-day averages.
pub fn multi_line(close: &[f64]) -> Vec<f64> {
  let mas = [sma(close, 14), sma(close, 28), sma(close, 57), sma(close, 114)];
  (0..close.len())
    .map(|i| {
      let mut sum = 0.0;
      for ma in &mas {
        sum += ma[i];
      }
      sum / mas.len() as f64
    })
    .collect()
}

/// True when `a` crossed above `b` at the last position.
pub fn crossed_up(a: &[f64], b: &[f64]) -> bool {
  let n = a.len().min(b.len());
  if n < 2 {
    return false;
  }
  let (cur, prev) = (a[n - 1] - b[n - 1], a[n - 2] - b[n - 2]);
  !cur.is_nan() && !prev.is_nan() && cur > 0.0 && prev <= 0.0
}

/// True when `a` crossed below `b` at the last position.
pub fn crossed_down(a: &[f64], b: &[f64]) -> bool {
  let n = a.len().min(b.len());
  if n < 2 {
    return false;
  }
  let (cur, prev) = (a[n - 1] - b[n - 1], a[n - 2] - b[n - 2]);
  !cur.is_nan() && !prev.is_nan() && cur < 0.0 && prev >= 0.0
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_sma_basic() {
    let out = sma(&[1.0, 2.0, 3.0, 4.0], 2);
    assert!(out[0].is_nan());
    assert_eq!(out[1], 1.5);
    assert_eq!(out[2], 2.5);
    assert_eq!(out[3], 3.5);
  }

  #[test]
  fn test_sma_window_larger_than_series() {
    let out = sma(&[1.0, 2.0], 5);
    assert!(out.iter().all(|v| v.is_nan()));
  }

  #[test]
  fn test_ema_seeds_at_first_value() {
    let out = ema(&[10.0, 10.0, 10.0], 5);
    assert!(out.iter().all(|&v| (v - 10.0).abs() < 1e-9));
  }

  #[test]
  fn test_ema_moves_toward_latest() {
    let out = ema(&[10.0, 20.0], 3);
    // alpha = 0.5 -> 15.0
    assert!((out[1] - 15.0).abs() < 1e-9);
  }

  #[test]
  fn test_kdj_bounds_on_flat_rising_series() {
    let close: Vec<f64> = (1..=30).map(|v| v as f64).collect();
    let high: Vec<f64> = close.iter().map(|v| v + 0.5).collect();
    let low: Vec<f64> = close.iter().map(|v| v - 0.5).collect();
    let (k, d, j) = kdj(&high, &low, &close, 9, 3, 3);

    let last_k = *k.last().unwrap();
    let last_d = *d.last().unwrap();
    assert!(last_k > 50.0 && last_k <= 100.0);
    assert!(last_d > 50.0 && last_d <= 100.0);
    assert!((j.last().unwrap() - (3.0 * last_k - 2.0 * last_d)).abs() < 1e-9);
  }

  #[test]
  fn test_macd_flat_series_is_zero() {
    let close = vec![10.0; 60];
    let (line, signal, hist) = macd(&close, 12, 26, 9);
    assert!(line.last().unwrap().abs() < 1e-9);
    assert!(signal.last().unwrap().abs() < 1e-9);
    assert!(hist.last().unwrap().abs() < 1e-9);
  }

  #[test]
  fn test_bbi_equals_mean_of_mas_on_flat_series() {
    let close = vec![7.0; 40];
    let out = bbi(&close);
    assert!((out.last().unwrap() - 7.0).abs() < 1e-9);
  }

  #[test]
  fn test_rsi_all_gains_saturates() {
    let close: Vec<f64> = (1..=30).map(|v| v as f64).collect();
    let out = rsi(&close, 14);
    assert!(*out.last().unwrap() > 99.0);
  }

  #[test]
  fn test_crossed_up_and_down() {
    assert!(crossed_up(&[1.0, 3.0], &[2.0, 2.0]));
    assert!(!crossed_up(&[3.0, 4.0], &[2.0, 2.0]));
    assert!(crossed_down(&[3.0, 1.0], &[2.0, 2.0]));
    assert!(!crossed_down(&[1.0, 0.5], &[2.0, 2.0]));
  }

  #[test]
  fn test_crossed_ignores_nan_warmup() {
    assert!(!crossed_up(&[f64::NAN, 3.0], &[2.0, 2.0]));
  }
}
