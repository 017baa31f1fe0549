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

//! Symbol codes and market routing.
//!
//! A-share symbols are 6 ASCII digits routed to an exchange by prefix;
//! Hong Kong symbols are 1-5 digits, padded to 5. Provider-specific
//! prefixing (`sh600519`, `1.600519`, `600519.SS`) is derived here so the
//! adapters never re-implement the routing table.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Exchange a code trades on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Market {
  /// Shanghai
  Sh,
  /// Shenzhen
  Sz,
  /// Beijing
  Bj,
  /// Hong Kong
  Hk,
}

impl Market {
  pub fn as_str(&self) -> &'static str {
    match self {
      Market::Sh => "sh",
      Market::Sz => "sz",
      Market::Bj => "bj",
      Market::Hk => "hk",
    }
  }
}

impl fmt::Display for Market {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

/// Code prefixes listed before the Shanghai set because `92` would otherwise
/// match the Shanghai `9` rule.
const BJ_PREFIXES: [&str; 6] = ["43", "83", "87", "92", "4", "8"];
const SH_PREFIXES: [&str; 9] = ["110", "113", "118", "132", "204", "5", "6", "7", "9"];

fn market_of(code: &str) -> Market {
  if BJ_PREFIXES.iter().any(|p| code.starts_with(p)) {
    return Market::Bj;
  }
  if SH_PREFIXES.iter().any(|p| code.starts_with(p)) {
    return Market::Sh;
  }
  Market::Sz
}

/// A validated, exchange-routed security identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Symbol {
  market: Market,
  code: String,
}

impl Symbol {
  /// Parse any accepted input form: `600519`, `sh600519`, `SZ000001`,
  /// `hk00700`, `hk700`.
  pub fn parse(input: &str) -> Result<Self> {
    let input = input.trim();
    if input.is_empty() {
      return Err(Error::InvalidSymbol("empty code".to_string()));
    }

    let lower = input.to_lowercase();
    if let Some(rest) = lower.strip_prefix("hk") {
      return Self::hong_kong(rest);
    }
    for market in [Market::Sh, Market::Sz, Market::Bj] {
      if let Some(rest) = lower.strip_prefix(market.as_str()) {
        if rest.len() == 6 && rest.bytes().all(|b| b.is_ascii_digit()) {
          return Ok(Symbol { market, code: rest.to_string() });
        }
        return Err(Error::InvalidSymbol(input.to_string()));
      }
    }

    if lower.bytes().all(|b| b.is_ascii_digit()) {
      return Self::a_share(&lower);
    }
    Err(Error::InvalidSymbol(input.to_string()))
  }

  /// An A-share code of up to 6 digits, zero-padded and routed by prefix.
  pub fn a_share(code: &str) -> Result<Self> {
    if code.is_empty() || code.len() > 6 || !code.bytes().all(|b| b.is_ascii_digit()) {
      return Err(Error::InvalidSymbol(code.to_string()));
    }
    let code = format!("{:0>6}", code);
    Ok(Symbol { market: market_of(&code), code })
  }

  /// A Hong Kong code of 1-5 digits, zero-padded to 5. Longer inputs are
  /// rejected rather than truncated.
  pub fn hong_kong(code: &str) -> Result<Self> {
    if code.is_empty() || code.len() > 5 || !code.bytes().all(|b| b.is_ascii_digit()) {
      return Err(Error::InvalidSymbol(format!("hk{}", code)));
    }
    Ok(Symbol { market: Market::Hk, code: format!("{:0>5}", code) })
  }

  /// Bare zero-padded digit code, the canonical wire representation.
  pub fn code(&self) -> &str {
    &self.code
  }

  pub fn market(&self) -> Market {
    self.market
  }

  pub fn is_hk(&self) -> bool {
    self.market == Market::Hk
  }

  /// Exchange-prefixed form used by wire-format quote endpoints
  /// (`sh600519`, `hk00700`).
  pub fn prefixed(&self) -> String {
    format!("{}{}", self.market.as_str(), self.code)
  }

  /// `secid` form used by the browser-API provider: `1.` for Shanghai,
  /// `0.` for Shenzhen and Beijing, `116.` for Hong Kong.
  pub fn secid(&self) -> String {
    let head = match self.market {
      Market::Sh => "1",
      Market::Sz | Market::Bj => "0",
      Market::Hk => "116",
    };
    format!("{}.{}", head, self.code)
  }

  /// International suffix form (`600519.SS`, `000001.SZ`, `0700.HK`) used by
  /// the last-resort chart provider.
  pub fn suffixed(&self) -> String {
    match self.market {
      Market::Sh => format!("{}.SS", self.code),
      Market::Sz | Market::Bj => format!("{}.SZ", self.code),
      // Chart endpoints use 4-digit HK tickers
      Market::Hk => format!("{}.HK", &self.code[self.code.len().saturating_sub(4)..]),
    }
  }

  /// Index codes are served by the quote endpoints but are not equities.
  pub fn is_index(&self) -> bool {
    (self.market == Market::Sh && self.code.starts_with("000"))
      || (self.market == Market::Sz && self.code.starts_with("399"))
  }
}

impl fmt::Display for Symbol {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.code)
  }
}

impl std::str::FromStr for Symbol {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    Symbol::parse(s)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_shanghai_routing() {
    assert_eq!(Symbol::parse("600519").unwrap().market(), Market::Sh);
    assert_eq!(Symbol::parse("510300").unwrap().market(), Market::Sh);
    assert_eq!(Symbol::parse("900901").unwrap().market(), Market::Sh);
    assert_eq!(Symbol::parse("110038").unwrap().market(), Market::Sh);
  }

  #[test]
  fn test_shenzhen_routing() {
    assert_eq!(Symbol::parse("000001").unwrap().market(), Market::Sz);
    assert_eq!(Symbol::parse("300750").unwrap().market(), Market::Sz);
    assert_eq!(Symbol::parse("002594").unwrap().market(), Market::Sz);
  }

  #[test]
  fn test_beijing_routing() {
    assert_eq!(Symbol::parse("430047").unwrap().market(), Market::Bj);
    assert_eq!(Symbol::parse("830799").unwrap().market(), Market::Bj);
    assert_eq!(Symbol::parse("870436").unwrap().market(), Market::Bj);
    assert_eq!(Symbol::parse("920002").unwrap().market(), Market::Bj);
  }

  #[test]
  fn test_prefixed_input_wins_over_routing() {
    let s = Symbol::parse("sz600001").unwrap();
    assert_eq!(s.market(), Market::Sz);
    assert_eq!(s.code(), "600001");
  }

  #[test]
  fn test_zero_padding() {
    let s = Symbol::parse("1").unwrap();
    assert_eq!(s.code(), "000001");
    assert_eq!(s.market(), Market::Sz);
  }

  #[test]
  fn test_hong_kong_padding() {
    let s = Symbol::parse("hk700").unwrap();
    assert_eq!(s.code(), "00700");
    assert_eq!(s.prefixed(), "hk00700");
  }

  #[test]
  fn test_hong_kong_too_long_rejected() {
    assert!(Symbol::parse("hk123456").is_err());
  }

  #[test]
  fn test_invalid_inputs() {
    assert!(Symbol::parse("").is_err());
    assert!(Symbol::parse("ABC").is_err());
    assert!(Symbol::parse("1234567").is_err());
    assert!(Symbol::parse("sh12345").is_err());
  }

  #[test]
  fn test_wire_forms() {
    let s = Symbol::parse("600519").unwrap();
    assert_eq!(s.prefixed(), "sh600519");
    assert_eq!(s.secid(), "1.600519");
    assert_eq!(s.suffixed(), "600519.SS");

    let s = Symbol::parse("000001").unwrap();
    assert_eq!(s.prefixed(), "sz000001");
    assert_eq!(s.secid(), "0.000001");
    assert_eq!(s.suffixed(), "000001.SZ");

    let s = Symbol::parse("hk00700").unwrap();
    assert_eq!(s.secid(), "116.00700");
    assert_eq!(s.suffixed(), "0700.HK");
  }

  #[test]
  fn test_index_detection() {
    assert!(Symbol::parse("sh000001").unwrap().is_index());
    assert!(Symbol::parse("sz399001").unwrap().is_index());
    assert!(!Symbol::parse("600519").unwrap().is_index());
  }
}
