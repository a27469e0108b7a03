/*
 *
 *
 *
 *
 * MIT License
 * Copyright (c) 2025. Visser Developers
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

//! HTTP transport layer shared by every upstream provider

use governor::{
  clock::DefaultClock,
  middleware::NoOpMiddleware,
  state::{InMemoryState, NotKeyed},
  Quota, RateLimiter,
};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, instrument, warn};
use url::Url;
use visser_core::{Error, Result, TransportSettings};

pub type DirectRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock, NoOpMiddleware>;

/// Longest pause between two attempts
const MAX_BACKOFF: Duration = Duration::from_secs(60);

/// Outcome of a single request attempt
enum Attempt {
  Done(String),
  Retry(Error),
  Fail(Error),
}

/// HTTP transport for one upstream base URL
///
/// Every request waits on the transport's rate limiter first. Network errors
/// and 5xx responses are retried with exponential backoff; a 429 is surfaced
/// as [`Error::RateLimit`] straight away so callers can rotate credentials.
pub struct Transport {
  client: Client,
  base_url: String,
  max_retries: u32,
  retry_base_delay: Duration,
  rate_limiter: Arc<DirectRateLimiter>,
}

/// Build a header map from `(name, value)` pairs
pub fn header_map(pairs: &[(&str, &str)]) -> Result<HeaderMap> {
  let mut headers = HeaderMap::new();
  for (name, value) in pairs {
    let name = HeaderName::from_bytes(name.to_lowercase().as_bytes())
      .map_err(|e| Error::Config(format!("Invalid header name {}: {}", name, e)))?;
    let mut value =
      HeaderValue::from_str(value).map_err(|e| Error::Config(format!("Invalid header value for {}: {}", name, e)))?;
    value.set_sensitive(true);
    headers.insert(name, value);
  }
  Ok(headers)
}

/// `Authorization: Bearer <token>` header map
pub fn bearer_header(token: &str) -> Result<HeaderMap> {
  let mut headers = HeaderMap::new();
  let mut value = HeaderValue::from_str(&format!("Bearer {}", token))
    .map_err(|e| Error::ApiKey(format!("Invalid bearer token: {}", e)))?;
  value.set_sensitive(true);
  headers.insert(AUTHORIZATION, value);
  Ok(headers)
}

impl Transport {
  /// Create a new transport instance
  pub fn new(base_url: &str, settings: &TransportSettings) -> Result<Self> {
    Self::with_headers(base_url, settings, HeaderMap::new())
  }

  /// Create a transport that sends `headers` with every request
  pub fn with_headers(base_url: &str, settings: &TransportSettings, headers: HeaderMap) -> Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(settings.timeout_secs))
      .user_agent(concat!("visser/", env!("CARGO_PKG_VERSION")))
      .default_headers(headers)
      .build()
      .map_err(|e| Error::Http(format!("Failed to create HTTP client: {}", e)))?;

    let rate_limit = NonZeroU32::new(settings.rate_limit)
      .or_else(|| NonZeroU32::new(visser_core::DEFAULT_RATE_LIMIT))
      .ok_or_else(|| Error::Config("rate limit must be non-zero".to_string()))?;

    Ok(Self {
      client,
      base_url: base_url.trim_end_matches('/').to_string(),
      max_retries: settings.max_retries,
      retry_base_delay: Duration::from_millis(1000),
      rate_limiter: Arc::new(RateLimiter::direct(Quota::per_minute(rate_limit))),
    })
  }

  /// Override the backoff unit, `2^attempt * delay`
  pub fn with_retry_delay(mut self, delay: Duration) -> Self {
    self.retry_base_delay = delay;
    self
  }

  /// Get the base URL being used
  pub fn base_url(&self) -> &str {
    &self.base_url
  }

  /// Build the full URL for a request
  pub fn build_url(&self, path: &str, params: &[(&str, String)]) -> Result<Url> {
    let mut url = Url::parse(&format!("{}{}", self.base_url, path))
      .map_err(|e| Error::Http(format!("Invalid URL {}{}: {}", self.base_url, path, e)))?;

    if !params.is_empty() {
      let mut query_pairs = url.query_pairs_mut();
      for (key, value) in params {
        query_pairs.append_pair(key, value);
      }
    }

    Ok(url)
  }

  /// Build a URL from raw path segments, percent-encoding each one
  pub fn build_url_segments(&self, segments: &[&str]) -> Result<Url> {
    let mut url =
      Url::parse(&self.base_url).map_err(|e| Error::Http(format!("Invalid base URL {}: {}", self.base_url, e)))?;
    url
      .path_segments_mut()
      .map_err(|_| Error::Http(format!("Base URL {} cannot take a path", self.base_url)))?
      .pop_if_empty()
      .extend(segments);
    Ok(url)
  }

  /// GET a path and return the body as text
  #[instrument(skip(self, params), fields(base = %self.base_url))]
  pub async fn get_text(&self, path: &str, params: &[(&str, String)]) -> Result<String> {
    let url = self.build_url(path, params)?;
    self.get_url(url).await
  }

  /// GET a fully built URL and return the body as text
  pub async fn get_url(&self, url: Url) -> Result<String> {
    self.send_with_retry(|| self.client.get(url.clone())).await
  }

  /// GET a path and deserialize the JSON body
  pub async fn get_json<T>(&self, path: &str, params: &[(&str, String)]) -> Result<T>
  where
    T: DeserializeOwned,
  {
    let text = self.get_text(path, params).await?;
    parse_json(&text)
  }

  /// POST raw bytes, used for object uploads
  #[instrument(skip(self, params, body), fields(base = %self.base_url, bytes = body.len()))]
  pub async fn post_bytes(
    &self,
    path: &str,
    params: &[(&str, String)],
    content_type: &str,
    body: Vec<u8>,
  ) -> Result<String> {
    let url = self.build_url(path, params)?;
    let content_type = content_type.to_string();
    self
      .send_with_retry(|| {
        self.client.post(url.clone()).header(CONTENT_TYPE, content_type.clone()).body(body.clone())
      })
      .await
  }

  async fn send_with_retry<F>(&self, build: F) -> Result<String>
  where
    F: Fn() -> RequestBuilder,
  {
    let mut attempt = 0;

    loop {
      if attempt > 0 {
        let delay = backoff_delay(self.retry_base_delay, attempt);
        warn!("Retrying request in {}ms (attempt {})", delay.as_millis(), attempt + 1);
        tokio::time::sleep(delay).await;
      }

      self.rate_limiter.until_ready().await;

      match self.attempt(build()).await {
        Attempt::Done(body) => return Ok(body),
        Attempt::Retry(e) if attempt < self.max_retries => {
          warn!("Request failed (attempt {}): {}", attempt + 1, e);
          attempt += 1;
        }
        Attempt::Retry(e) | Attempt::Fail(e) => return Err(e),
      }
    }
  }

  async fn attempt(&self, request: RequestBuilder) -> Attempt {
    let response = match request.send().await {
      Ok(response) => response,
      Err(e) => return Attempt::Retry(Error::Http(format!("Request failed: {}", e))),
    };

    let status = response.status();
    let url = response.url().path().to_string();
    let body = match response.text().await {
      Ok(body) => body,
      Err(e) => return Attempt::Retry(Error::Http(format!("Failed to read response body: {}", e))),
    };

    if status.is_success() {
      debug!("{} returned {} bytes", url, body.len());
      return Attempt::Done(body);
    }

    error!("Request to {} failed with status: {}", url, status);
    match status {
      StatusCode::TOO_MANY_REQUESTS => Attempt::Fail(Error::RateLimit(format!("{} returned 429", url))),
      StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
        Attempt::Fail(Error::ApiKey(format!("{} rejected the credentials ({})", url, status)))
      }
      StatusCode::NOT_FOUND => Attempt::Fail(Error::NotFound(url)),
      s if s.is_server_error() => Attempt::Retry(Error::Http(format!("HTTP error: {}", s))),
      s => Attempt::Fail(Error::Http(format!("HTTP error: {}: {}", s, snippet(&body, 200)))),
    }
  }
}

/// Deserialize a JSON body, keeping the head of the payload in the error
pub fn parse_json<T: DeserializeOwned>(text: &str) -> Result<T> {
  serde_json::from_str::<T>(text).map_err(|e| {
    error!("Failed to parse JSON response: {}", e);
    Error::Parse(format!("Failed to parse response: {}. Response: {}", e, snippet(text, 200)))
  })
}

/// `base * 2^attempt`, capped at [`MAX_BACKOFF`]
fn backoff_delay(base: Duration, attempt: u32) -> Duration {
  2_u32.checked_pow(attempt).and_then(|factor| base.checked_mul(factor)).unwrap_or(MAX_BACKOFF).min(MAX_BACKOFF)
}

fn snippet(text: &str, max: usize) -> &str {
  match text.char_indices().nth(max) {
    Some((idx, _)) => &text[..idx],
    None => text,
  }
}
