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

#[derive(Error, Debug, Clone)]
pub enum LoaderError {
  #[error("API error: {0}")]
  ApiError(String),

  #[error("CSV parsing error: {0}")]
  CsvError(String),

  #[error("IO error: {0}")]
  IoError(String),

  #[error("Serialization error: {0}")]
  SerializationError(String),

  #[error("Rate limit exceeded: {0}")]
  RateLimitExceeded(String),

  #[error("Not found: {0}")]
  NotFound(String),

  #[error("Invalid data: {0}")]
  InvalidData(String),

  #[error("Too many requests failed, logged {failures} failed requests. Last error: {last_error}")]
  ExcessiveFailures { failures: usize, last_error: String },

  #[error("Batch processing error: {0}")]
  BatchProcessingError(String),

  #[error("Configuration error: {0}")]
  ConfigurationError(String),
}

impl From<csv::Error> for LoaderError {
  fn from(err: csv::Error) -> Self {
    LoaderError::CsvError(err.to_string())
  }
}

impl From<std::io::Error> for LoaderError {
  fn from(err: std::io::Error) -> Self {
    LoaderError::IoError(err.to_string())
  }
}

impl From<serde_json::Error> for LoaderError {
  fn from(err: serde_json::Error) -> Self {
    LoaderError::SerializationError(err.to_string())
  }
}

impl From<visser_core::Error> for LoaderError {
  fn from(err: visser_core::Error) -> Self {
    use visser_core::Error;

    match err {
      Error::RateLimit(msg) => LoaderError::RateLimitExceeded(msg),
      Error::NotFound(msg) => LoaderError::NotFound(msg),
      Error::InvalidParameter(msg) => LoaderError::InvalidData(msg),
      Error::Config(_) | Error::ApiKey(_) | Error::EnvVar(_) => LoaderError::ConfigurationError(err.to_string()),
      other => LoaderError::ApiError(other.to_string()),
    }
  }
}

pub type LoaderResult<T> = Result<T, LoaderError>;

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_loader_error_display() {
    assert_eq!(LoaderError::ApiError("connection failed".to_string()).to_string(), "API error: connection failed");
    assert_eq!(LoaderError::InvalidData("missing title".to_string()).to_string(), "Invalid data: missing title");
    let err = LoaderError::ExcessiveFailures { failures: 35, last_error: "timeout".to_string() };
    assert_eq!(err.to_string(), "Too many requests failed, logged 35 failed requests. Last error: timeout");
  }

  #[test]
  fn test_loader_error_from_core_error() {
    let err = LoaderError::from(visser_core::Error::RateLimit("API call frequency limit hit.".to_string()));
    assert!(matches!(err, LoaderError::RateLimitExceeded(_)));

    let err = LoaderError::from(visser_core::Error::NotFound("/v1/ohlcv".to_string()));
    assert!(matches!(err, LoaderError::NotFound(_)));

    let err = LoaderError::from(visser_core::Error::ApiKey("COIN_API_KEY not set".to_string()));
    assert!(matches!(err, LoaderError::ConfigurationError(msg) if msg.contains("COIN_API_KEY")));

    let err = LoaderError::from(visser_core::Error::Http("reset".to_string()));
    assert!(matches!(err, LoaderError::ApiError(_)));
  }

  #[test]
  fn test_loader_error_from_io_error() {
    let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
    let err = LoaderError::from(io_err);
    assert!(matches!(err, LoaderError::IoError(_)));
    assert!(err.to_string().contains("file missing"));
  }

  #[test]
  fn test_loader_error_clone() {
    let err = LoaderError::NotFound("Apple_Inc.".to_string());
    assert_eq!(err.to_string(), err.clone().to_string());
  }
}
