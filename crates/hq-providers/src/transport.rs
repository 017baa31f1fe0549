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

use hq_core::{Error, Result};
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};

/// HTTP transport shared by the provider adapters.
///
/// Handles the low-level HTTP communication with the upstream quote and
/// kline endpoints, including request construction, charset handling and
/// bounded retries. Each adapter owns one transport and therefore one pooled
/// connection set.
pub struct Transport {
  client: Client,
  max_retries: u32,
  headers: Vec<(&'static str, &'static str)>,
}

impl Transport {
  /// Create a new transport instance.
  ///
  /// # Arguments
  ///
  /// * `timeout_secs` - per-request timeout
  /// * `max_retries` - bounded retry count for transient failures
  /// * `headers` - static headers sent with every request (user agent,
  ///   referer where the endpoint requires one)
  pub fn new(
    timeout_secs: u64,
    max_retries: u32,
    headers: Vec<(&'static str, &'static str)>,
  ) -> Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(timeout_secs))
      .build()
      .map_err(|e| Error::Http(format!("Failed to create HTTP client: {}", e)))?;

    Ok(Self { client, max_retries, headers })
  }

  /// Execute a GET request and return the body decoded with the given
  /// charset. Retries transient failures with exponential backoff
  /// (`2s * 2^k`), capped at `max_retries` attempts.
  pub async fn get_text_with_charset(&self, url: &str, charset: &str) -> Result<String> {
    let mut last_error = None;

    for attempt in 1..=self.max_retries {
      match self.execute_request(url).await {
        Ok(response) => {
          return response
            .text_with_charset(charset)
            .await
            .map_err(|e| Error::Http(format!("Failed to read response body: {}", e)));
        }
        Err(e) => {
          warn!("Request attempt {} failed for {}: {}", attempt, url, e);
          last_error = Some(e);

          if attempt < self.max_retries {
            let delay = Duration::from_secs(2 * 2_u64.pow(attempt - 1));
            tokio::time::sleep(delay).await;
          }
        }
      }
    }

    Err(last_error.unwrap_or_else(|| Error::Http("Max retries exceeded".to_string())))
  }

  /// Execute a GET request and return the body as UTF-8 text.
  pub async fn get_text(&self, url: &str) -> Result<String> {
    self.get_text_with_charset(url, "utf-8").await
  }

  /// Execute a GET request and deserialize the JSON body.
  pub async fn get_json<T>(&self, url: &str) -> Result<T>
  where
    T: DeserializeOwned,
  {
    let text = self.get_text(url).await?;
    serde_json::from_str(&text)
      .map_err(|e| Error::Parse(format!("Failed to deserialize response from {}: {}", url, e)))
  }

  async fn execute_request(&self, url: &str) -> Result<reqwest::Response> {
    debug!("Making request to: {}", url);

    let mut request = self.client.get(url);
    for (name, value) in &self.headers {
      request = request.header(*name, *value);
    }

    let response =
      request.send().await.map_err(|e| Error::Http(format!("Request failed: {}", e)))?;

    let status = response.status();
    if status.as_u16() == 429 {
      return Err(Error::RateLimit(format!("HTTP 429 from {}", url)));
    }
    if !status.is_success() {
      return Err(Error::Http(format!("HTTP error: {}", status)));
    }

    Ok(response)
  }
}

impl std::fmt::Debug for Transport {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Transport").field("max_retries", &self.max_retries).finish()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use wiremock::matchers::{method, path};
  use wiremock::{Mock, MockServer, ResponseTemplate};

  fn transport() -> Transport {
    Transport::new(5, 1, vec![("User-Agent", "hq-test/1.0")]).unwrap()
  }

  #[tokio::test]
  async fn test_get_text_success() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/quote"))
      .respond_with(ResponseTemplate::new(200).set_body_string("v_sh600519=\"data\";"))
      .mount(&server)
      .await;

    let body = transport().get_text(&format!("{}/quote", server.uri())).await.unwrap();
    assert!(body.contains("sh600519"));
  }

  #[tokio::test]
  async fn test_get_json_parse_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/kline"))
      .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
      .mount(&server)
      .await;

    let result: Result<serde_json::Value> =
      transport().get_json(&format!("{}/kline", server.uri())).await;
    assert!(matches!(result, Err(Error::Parse(_))));
  }

  #[tokio::test]
  async fn test_http_error_is_returned() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/down"))
      .respond_with(ResponseTemplate::new(500))
      .mount(&server)
      .await;

    let result = transport().get_text(&format!("{}/down", server.uri())).await;
    assert!(matches!(result, Err(Error::Http(_))));
  }

  #[tokio::test]
  async fn test_rate_limit_maps_to_rate_limit_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/busy"))
      .respond_with(ResponseTemplate::new(429))
      .mount(&server)
      .await;

    let result = transport().get_text(&format!("{}/busy", server.uri())).await;
    assert!(matches!(result, Err(Error::RateLimit(_))));
  }
}
