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

use crate::error::{Error, Result};
use dotenvy::dotenv;
use serde::{Deserialize, Serialize};
use std::env;

/// Main configuration struct for the market-data engine
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
  /// Path of the SQLite archive file
  pub db_path: String,

  /// Directory holding JSON side files (watchlist, symbol directory cache)
  pub data_dir: String,

  /// Request timeout in seconds
  pub timeout_secs: u64,

  /// Maximum retries for failed upstream requests
  pub max_retries: u32,

  /// Background worker count
  pub workers: usize,

  /// Realtime quote cache TTL in seconds
  pub quote_ttl_secs: u64,

  /// Delay between paged upstream calls, in milliseconds
  pub rate_limit_delay_ms: u64,

  /// Ordered quote provider names (first is preferred)
  pub quote_providers: Vec<String>,
}

impl Config {
  /// Load configuration from environment variables
  pub fn from_env() -> Result<Self> {
    dotenv().ok();

    let db_path = env::var("HQ_DB_PATH").unwrap_or_else(|_| "data/hq.db".to_string());
    let data_dir = env::var("HQ_DATA_DIR").unwrap_or_else(|_| "data".to_string());

    let timeout_secs = env::var("HQ_TIMEOUT_SECS")
      .unwrap_or_else(|_| crate::DEFAULT_TIMEOUT_SECS.to_string())
      .parse()
      .map_err(|_| Error::Config("Invalid HQ_TIMEOUT_SECS".to_string()))?;

    let max_retries = env::var("HQ_MAX_RETRIES")
      .unwrap_or_else(|_| crate::DEFAULT_MAX_RETRIES.to_string())
      .parse()
      .map_err(|_| Error::Config("Invalid HQ_MAX_RETRIES".to_string()))?;

    let workers = env::var("HQ_WORKERS")
      .unwrap_or_else(|_| crate::DEFAULT_WORKERS.to_string())
      .parse()
      .map_err(|_| Error::Config("Invalid HQ_WORKERS".to_string()))?;

    let quote_ttl_secs = env::var("HQ_QUOTE_TTL_SECS")
      .unwrap_or_else(|_| crate::DEFAULT_QUOTE_TTL_SECS.to_string())
      .parse()
      .map_err(|_| Error::Config("Invalid HQ_QUOTE_TTL_SECS".to_string()))?;

    let rate_limit_delay_ms = env::var("HQ_RATE_LIMIT_DELAY_MS")
      .unwrap_or_else(|_| crate::DEFAULT_RATE_LIMIT_DELAY_MS.to_string())
      .parse()
      .map_err(|_| Error::Config("Invalid HQ_RATE_LIMIT_DELAY_MS".to_string()))?;

    let quote_providers = env::var("HQ_QUOTE_PROVIDERS")
      .unwrap_or_else(|_| crate::DEFAULT_QUOTE_PROVIDERS.to_string())
      .split(',')
      .map(|s| s.trim().to_lowercase())
      .filter(|s| !s.is_empty())
      .collect::<Vec<_>>();

    if quote_providers.is_empty() {
      return Err(Error::Config("HQ_QUOTE_PROVIDERS must name at least one provider".to_string()));
    }

    Ok(Config {
      db_path,
      data_dir,
      timeout_secs,
      max_retries,
      workers,
      quote_ttl_secs,
      rate_limit_delay_ms,
      quote_providers,
    })
  }

  /// Create a config with default values (for testing)
  pub fn default_for_tests(data_dir: impl Into<String>) -> Self {
    let data_dir = data_dir.into();
    Config {
      db_path: format!("{}/hq.db", data_dir),
      data_dir,
      timeout_secs: crate::DEFAULT_TIMEOUT_SECS,
      max_retries: crate::DEFAULT_MAX_RETRIES,
      workers: crate::DEFAULT_WORKERS,
      quote_ttl_secs: crate::DEFAULT_QUOTE_TTL_SECS,
      rate_limit_delay_ms: crate::DEFAULT_RATE_LIMIT_DELAY_MS,
      quote_providers: crate::DEFAULT_QUOTE_PROVIDERS
        .split(',')
        .map(|s| s.to_string())
        .collect(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  // One test body: parallel test threads share the process environment.
  #[test]
  fn test_config_from_env() {
    env::remove_var("HQ_TIMEOUT_SECS");
    env::remove_var("HQ_QUOTE_PROVIDERS");
    let config = Config::from_env().unwrap();
    assert_eq!(config.timeout_secs, 15);
    assert_eq!(config.workers, 2);
    assert_eq!(config.quote_providers, vec!["sina", "tencent", "eastmoney"]);

    env::set_var("HQ_QUOTE_PROVIDERS", "tencent, sina");
    let config = Config::from_env().unwrap();
    assert_eq!(config.quote_providers, vec!["tencent", "sina"]);
    env::remove_var("HQ_QUOTE_PROVIDERS");
  }
}
