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

//! Trading-day and trading-session predicates.
//!
//! All times are exchange-local civil time (no DST on the mainland; Hong
//! Kong matches). Anything time-dependent takes the instant explicitly or a
//! [`Clock`], so tests can pin the wall clock.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Weekday};

/// Wall-clock injector. Production code uses [`SystemClock`]; tests use
/// [`FixedClock`].
pub trait Clock: Send + Sync {
  /// Current exchange-local civil time.
  fn now(&self) -> NaiveDateTime;
}

/// Clock backed by the host's local time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
  fn now(&self) -> NaiveDateTime {
    chrono::Local::now().naive_local()
  }
}

/// Clock pinned to a single instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
  fn now(&self) -> NaiveDateTime {
    self.0
  }
}

fn morning_open() -> NaiveTime {
  NaiveTime::from_hms_opt(9, 30, 0).unwrap_or_default()
}

fn morning_close() -> NaiveTime {
  NaiveTime::from_hms_opt(11, 30, 0).unwrap_or_default()
}

fn afternoon_open() -> NaiveTime {
  NaiveTime::from_hms_opt(13, 0, 0).unwrap_or_default()
}

fn afternoon_close() -> NaiveTime {
  NaiveTime::from_hms_opt(15, 0, 0).unwrap_or_default()
}

/// 15:00 on the given date.
pub fn market_close(date: NaiveDate) -> NaiveDateTime {
  date.and_time(afternoon_close())
}

/// Weekdays only; exchange holidays are out of scope.
pub fn is_trading_day(date: NaiveDate) -> bool {
  !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// True during the morning or afternoon session of a trading day,
/// boundaries inclusive.
pub fn is_trading_session(at: NaiveDateTime) -> bool {
  if !is_trading_day(at.date()) {
    return false;
  }
  let t = at.time();
  (t >= morning_open() && t <= morning_close()) || (t >= afternoon_open() && t <= afternoon_close())
}

/// Most recent weekday whose 15:00 close has passed, seen from `at`.
pub fn last_trading_day(at: NaiveDateTime) -> NaiveDate {
  let mut target =
    if at.time() >= afternoon_close() { at.date() } else { at.date() - Duration::days(1) };

  // Bounded walk; weekends never span more than a few days.
  for _ in 0..10 {
    if is_trading_day(target) {
      return target;
    }
    target -= Duration::days(1);
  }
  target
}

/// Strictly-previous trading day.
pub fn previous_trading_day(date: NaiveDate) -> NaiveDate {
  let mut target = date - Duration::days(1);
  for _ in 0..10 {
    if is_trading_day(target) {
      return target;
    }
    target -= Duration::days(1);
  }
  target
}

#[cfg(test)]
mod tests {
  use super::*;

  fn dt(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(h, min, 0).unwrap()
  }

  fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
  }

  #[test]
  fn test_weekend_is_not_trading_day() {
    // 2025-06-14 is a Saturday
    assert!(!is_trading_day(date(2025, 6, 14)));
    assert!(!is_trading_day(date(2025, 6, 15)));
    assert!(is_trading_day(date(2025, 6, 16)));
  }

  #[test]
  fn test_session_boundaries_inclusive() {
    assert!(is_trading_session(dt(2025, 6, 16, 9, 30)));
    assert!(is_trading_session(dt(2025, 6, 16, 11, 30)));
    assert!(is_trading_session(dt(2025, 6, 16, 13, 0)));
    assert!(is_trading_session(dt(2025, 6, 16, 15, 0)));
  }

  #[test]
  fn test_outside_session() {
    assert!(!is_trading_session(dt(2025, 6, 16, 9, 29)));
    assert!(!is_trading_session(dt(2025, 6, 16, 12, 0)));
    assert!(!is_trading_session(dt(2025, 6, 16, 15, 1)));
    // Saturday mid-morning
    assert!(!is_trading_session(dt(2025, 6, 14, 10, 0)));
  }

  #[test]
  fn test_last_trading_day_before_close() {
    // Monday 11:00 -> previous Friday
    assert_eq!(last_trading_day(dt(2025, 6, 16, 11, 0)), date(2025, 6, 13));
  }

  #[test]
  fn test_last_trading_day_after_close() {
    assert_eq!(last_trading_day(dt(2025, 6, 16, 15, 30)), date(2025, 6, 16));
  }

  #[test]
  fn test_last_trading_day_weekend() {
    // Saturday 10:00 -> Friday
    assert_eq!(last_trading_day(dt(2025, 6, 14, 10, 0)), date(2025, 6, 13));
  }

  #[test]
  fn test_previous_trading_day_monday() {
    assert_eq!(previous_trading_day(date(2025, 6, 16)), date(2025, 6, 13));
  }

  #[test]
  fn test_fixed_clock() {
    let clock = FixedClock(dt(2025, 6, 16, 10, 0));
    assert_eq!(clock.now(), dt(2025, 6, 16, 10, 0));
  }
}
