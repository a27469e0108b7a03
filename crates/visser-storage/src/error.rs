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

use crate::repository::RepositoryError;
use thiserror::Error;

/// Errors raised while persisting extracted rows
#[derive(Error, Debug)]
pub enum StorageError {
  #[error("Write type {0} is not allowed in this environment")]
  WriteTypeNotAllowed(String),

  #[error("Storage configuration error: {0}")]
  Config(String),

  #[error("Serialization error: {0}")]
  Serialization(String),

  #[error("IO error: {0}")]
  Io(#[from] std::io::Error),

  #[error("Upload failed: {0}")]
  Upload(String),

  #[error(transparent)]
  Repository(#[from] RepositoryError),
}

impl From<csv::Error> for StorageError {
  fn from(err: csv::Error) -> Self {
    StorageError::Serialization(err.to_string())
  }
}

impl From<serde_json::Error> for StorageError {
  fn from(err: serde_json::Error) -> Self {
    StorageError::Serialization(err.to_string())
  }
}

impl From<visser_core::Error> for StorageError {
  fn from(err: visser_core::Error) -> Self {
    match err {
      visser_core::Error::Config(msg) => StorageError::Config(msg),
      visser_core::Error::InvalidParameter(msg) => StorageError::WriteTypeNotAllowed(msg),
      other => StorageError::Upload(other.to_string()),
    }
  }
}

pub type StorageResult<T> = Result<T, StorageError>;

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_core_error_conversion() {
    let err: StorageError = visser_core::Error::Http("HTTP error: 500".to_string()).into();
    assert!(matches!(err, StorageError::Upload(_)));

    let err: StorageError = visser_core::Error::Config("GOOGLE_BUCKET_NAME not set".to_string()).into();
    assert_eq!(err.to_string(), "Storage configuration error: GOOGLE_BUCKET_NAME not set");
  }
}
