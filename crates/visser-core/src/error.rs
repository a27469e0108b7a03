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

use thiserror::Error;

/// The main error type for visser-* crates
#[derive(Error, Debug)]
pub enum Error {
  /// Environment variable error
  #[error("Environment variable error: {0}")]
  EnvVar(#[from] std::env::VarError),

  /// Configuration error
  #[error("Configuration error: {0}")]
  Config(String),

  /// API key error
  #[error("Missing or rejected API key: {0}")]
  ApiKey(String),

  /// Serialization/Deserialization error
  #[error("Serialization error: {0}")]
  Serde(#[from] serde_json::Error),

  /// Date/Time parsing error
  #[error("Date parsing error: {0}")]
  ParseDate(#[from] chrono::ParseError),

  /// Missing required field in response
  #[error("Missing required field: {0}")]
  MissingField(String),

  /// Upstream rate limit hit
  #[error("Rate limit exceeded: {0}")]
  RateLimit(String),

  /// Resource does not exist upstream
  #[error("Not found: {0}")]
  NotFound(String),

  /// Invalid response from an upstream API
  #[error("Invalid API response: {0}")]
  InvalidResponse(String),

  /// Caller supplied a value the service cannot use
  #[error("Invalid parameter: {0}")]
  InvalidParameter(String),

  /// HTTP transport error
  #[error("HTTP error: {0}")]
  Http(String),

  /// Error message returned by an upstream API
  #[error("API error: {0}")]
  Api(String),

  /// Parse error for data processing
  #[error("Parse error: {0}")]
  Parse(String),
}

impl Error {
  /// True when the upstream asked us to slow down
  pub fn is_rate_limit(&self) -> bool {
    matches!(self, Error::RateLimit(_))
  }
}

/// Result type alias for visser-* crates
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_error_display() {
    assert_eq!(
      Error::RateLimit("API call frequency limit hit.".to_string()).to_string(),
      "Rate limit exceeded: API call frequency limit hit."
    );
    assert_eq!(Error::NotFound("/stock/candle".to_string()).to_string(), "Not found: /stock/candle");
  }

  #[test]
  fn test_is_rate_limit() {
    assert!(Error::RateLimit("429".to_string()).is_rate_limit());
    assert!(!Error::Http("500".to_string()).is_rate_limit());
  }

  #[test]
  fn test_from_serde_error() {
    let err: Error = serde_json::from_str::<u32>("nope").unwrap_err().into();
    assert!(matches!(err, Error::Serde(_)));
  }
}
