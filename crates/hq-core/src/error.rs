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

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
  #[error("Environment variable error: {0}")]
  EnvVar(#[from] std::env::VarError),

  #[error("Configuration error: {0}")]
  Config(String),

  #[error("Serialization error")]
  Serde(#[from] serde_json::Error),

  #[error("Date parsing error")]
  ParseDate(#[from] chrono::ParseError),

  #[error("Invalid symbol: {0}")]
  InvalidSymbol(String),

  #[error("Rate limit exceeded: {0}")]
  RateLimit(String),

  #[error("Not found: {0}")]
  NotFound(String),

  #[error("Unsupported operation: {0}")]
  Unsupported(String),

  #[error("HTTP error: {0}")]
  Http(String),

  #[error("Parse error: {0}")]
  Parse(String),

  #[error("Storage error: {0}")]
  Storage(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
  /// Transient failures are worth retrying or falling through to the next
  /// provider; terminal ones are not.
  pub fn is_transient(&self) -> bool {
    matches!(self, Error::Http(_) | Error::RateLimit(_) | Error::Parse(_) | Error::Storage(_))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_error_display_config() {
    let err = Error::Config("invalid timeout".to_string());
    assert_eq!(err.to_string(), "Configuration error: invalid timeout");
  }

  #[test]
  fn test_error_display_invalid_symbol() {
    let err = Error::InvalidSymbol("abc".to_string());
    assert_eq!(err.to_string(), "Invalid symbol: abc");
  }

  #[test]
  fn test_error_display_rate_limit() {
    let err = Error::RateLimit("ip throttled".to_string());
    assert_eq!(err.to_string(), "Rate limit exceeded: ip throttled");
  }

  #[test]
  fn test_error_display_http() {
    let err = Error::Http("connection refused".to_string());
    assert_eq!(err.to_string(), "HTTP error: connection refused");
  }

  #[test]
  fn test_error_display_unsupported() {
    let err = Error::Unsupported("kline".to_string());
    assert_eq!(err.to_string(), "Unsupported operation: kline");
  }

  #[test]
  fn test_error_from_serde_json() {
    let json_err = serde_json::from_str::<String>("invalid").unwrap_err();
    let err = Error::from(json_err);
    assert!(matches!(err, Error::Serde(_)));
    assert_eq!(err.to_string(), "Serialization error");
  }

  #[test]
  fn test_error_from_chrono_parse() {
    let parse_err = chrono::NaiveDate::parse_from_str("invalid", "%Y-%m-%d").unwrap_err();
    let err = Error::from(parse_err);
    assert!(matches!(err, Error::ParseDate(_)));
  }

  #[test]
  fn test_transient_classification() {
    assert!(Error::Http("timeout".to_string()).is_transient());
    assert!(Error::RateLimit("slow down".to_string()).is_transient());
    assert!(!Error::NotFound("600519".to_string()).is_transient());
    assert!(!Error::InvalidSymbol("xx".to_string()).is_transient());
  }

  #[test]
  fn test_result_type_alias() {
    fn returns_ok() -> Result<i32> {
      Ok(42)
    }
    assert_eq!(returns_ok().unwrap(), 42);
  }
}
