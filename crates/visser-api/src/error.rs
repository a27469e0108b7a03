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

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;
use visser_loaders::LoaderError;
use visser_storage::StorageError;

/// Errors surfaced to API callers
///
/// The body is `{"detail": message}`.
#[derive(Error, Debug)]
pub enum ApiError {
  #[error("{0}")]
  BadRequest(String),

  #[error("{0}")]
  Unauthorized(String),

  #[error("{0}")]
  NotFound(String),

  #[error("{0}")]
  TooManyRequests(String),

  #[error("Upstream request failed: {0}")]
  Upstream(String),

  #[error("Storage error: {0}")]
  Storage(String),

  #[error("Internal error: {0}")]
  Internal(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ResponseError for ApiError {
  fn status_code(&self) -> StatusCode {
    match self {
      ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
      ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
      ApiError::NotFound(_) => StatusCode::NOT_FOUND,
      ApiError::TooManyRequests(_) => StatusCode::TOO_MANY_REQUESTS,
      ApiError::Upstream(_) => StatusCode::BAD_GATEWAY,
      ApiError::Storage(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }

  fn error_response(&self) -> HttpResponse {
    let mut response = HttpResponse::build(self.status_code());
    if let ApiError::Unauthorized(_) = self {
      response.insert_header(("WWW-Authenticate", "Bearer"));
    }
    response.json(json!({ "detail": self.to_string() }))
  }
}

impl From<LoaderError> for ApiError {
  fn from(err: LoaderError) -> Self {
    match err {
      LoaderError::InvalidData(msg) => ApiError::BadRequest(msg),
      LoaderError::NotFound(msg) => ApiError::NotFound(msg),
      LoaderError::RateLimitExceeded(msg) => ApiError::TooManyRequests(msg),
      LoaderError::ConfigurationError(msg) => ApiError::Internal(msg),
      other => ApiError::Upstream(other.to_string()),
    }
  }
}

impl From<visser_core::Error> for ApiError {
  fn from(err: visser_core::Error) -> Self {
    LoaderError::from(err).into()
  }
}

impl From<StorageError> for ApiError {
  fn from(err: StorageError) -> Self {
    match err {
      StorageError::WriteTypeNotAllowed(msg) => ApiError::BadRequest(msg),
      other => ApiError::Storage(other.to_string()),
    }
  }
}
