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

//! First-success-wins execution over an ordered list of upstream attempts.
//!
//! Every upstream-facing call in the engine has the same shape: try the
//! preferred source, log, move to the next on failure.

use futures::future::BoxFuture;
use hq_core::Result;
use hq_models::{IndexQuote, IntradayTape, Quote};
use std::collections::HashMap;
use tracing::{debug, error, info, warn};

/// Decides whether a successful response actually carries data. An empty
/// map or series counts as a failure and the executor moves on.
pub trait FallbackValue {
  fn is_usable(&self) -> bool;
}

impl<T> FallbackValue for Vec<T> {
  fn is_usable(&self) -> bool {
    !self.is_empty()
  }
}

impl<K, V, S> FallbackValue for HashMap<K, V, S> {
  fn is_usable(&self) -> bool {
    !self.is_empty()
  }
}

impl FallbackValue for Quote {
  fn is_usable(&self) -> bool {
    true
  }
}

impl FallbackValue for IndexQuote {
  fn is_usable(&self) -> bool {
    true
  }
}

impl FallbackValue for IntradayTape {
  fn is_usable(&self) -> bool {
    !self.points.is_empty()
  }
}

/// Ordered list of named attempts; `execute` returns the first non-empty,
/// non-failing result and `None` when every attempt is exhausted. It never
/// propagates an error.
pub struct FallbackExecutor<'a, T> {
  context: String,
  attempts: Vec<(String, BoxFuture<'a, Result<T>>)>,
}

impl<'a, T: FallbackValue> FallbackExecutor<'a, T> {
  pub fn new(context: impl Into<String>) -> Self {
    Self { context: context.into(), attempts: Vec::new() }
  }

  /// Append an attempt. The future is not polled until `execute` reaches
  /// it, so queuing attempts is free.
  pub fn attempt<F>(mut self, name: impl Into<String>, fut: F) -> Self
  where
    F: std::future::Future<Output = Result<T>> + Send + 'a,
  {
    self.attempts.push((name.into(), Box::pin(fut)));
    self
  }

  pub fn len(&self) -> usize {
    self.attempts.len()
  }

  pub fn is_empty(&self) -> bool {
    self.attempts.is_empty()
  }

  pub async fn execute(self) -> Option<T> {
    let context = self.context;
    let total = self.attempts.len();

    for (i, (name, fut)) in self.attempts.into_iter().enumerate() {
      match fut.await {
        Ok(value) if value.is_usable() => {
          if i > 0 {
            info!("[{}] succeeded after fallback {}", name, context);
          }
          return Some(value);
        }
        Ok(_) => {
          debug!("[{}] returned empty data {}", name, context);
        }
        Err(e) => {
          warn!("[{}] failed {}: {}", name, context, e);
          if i + 1 < total {
            info!("switching to next source {}", context);
          }
        }
      }
    }

    error!("all sources failed {}", context);
    None
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use hq_core::Error;

  #[tokio::test]
  async fn test_first_source_success() {
    let result = FallbackExecutor::new("[test]")
      .attempt("one", async { Ok(vec![1]) })
      .attempt("two", async { Ok(vec![2]) })
      .execute()
      .await;
    assert_eq!(result, Some(vec![1]));
  }

  #[tokio::test]
  async fn test_fallback_to_second() {
    let result = FallbackExecutor::new("[test]")
      .attempt("one", async { Err::<Vec<i32>, _>(Error::Http("boom".to_string())) })
      .attempt("two", async { Ok(vec![2]) })
      .execute()
      .await;
    assert_eq!(result, Some(vec![2]));
  }

  #[tokio::test]
  async fn test_all_sources_fail() {
    let result = FallbackExecutor::new("[test]")
      .attempt("one", async { Err::<Vec<i32>, _>(Error::Http("boom".to_string())) })
      .attempt("two", async { Err::<Vec<i32>, _>(Error::Parse("bad".to_string())) })
      .execute()
      .await;
    assert_eq!(result, None);
  }

  #[tokio::test]
  async fn test_empty_result_skipped() {
    let result = FallbackExecutor::new("[test]")
      .attempt("one", async { Ok(Vec::<i32>::new()) })
      .attempt("two", async { Ok(vec![2]) })
      .execute()
      .await;
    assert_eq!(result, Some(vec![2]));
  }

  #[tokio::test]
  async fn test_later_attempt_not_polled_after_success() {
    // The second future would panic if polled.
    let result = FallbackExecutor::new("[test]")
      .attempt("one", async { Ok(vec![1]) })
      .attempt("two", async { panic!("must not be polled") })
      .execute()
      .await;
    assert_eq!(result, Some(vec![1]));
  }
}
