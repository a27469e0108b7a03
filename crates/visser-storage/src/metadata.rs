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

//! Job bookkeeping and user sessions

use crate::repository::DocumentStore;
use crate::urls::trading_metadata_storage_url;
use chrono::Local;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, error};
use uuid::Uuid;
use visser_core::WriteType;
use visser_models::jobs::{HistoricalDataParams, HistoricalTradingMetadata, JobMetadata};

pub const TRANSACTIONS_COLLECTION: &str = "usertransactions";
pub const HISTORICAL_METADATA_COLLECTION: &str = "historical_trading_metadata";
pub const SESSIONS_COLLECTION: &str = "user_sessions";
pub const USERS_COLLECTION: &str = "users";

const SESSION_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Records every completed job
///
/// Bookkeeping never fails a request: errors are logged and reported as `false`.
#[derive(Clone)]
pub struct MetadataLogger {
  store: Arc<dyn DocumentStore>,
}

impl MetadataLogger {
  pub fn new(store: Arc<dyn DocumentStore>) -> Self {
    Self { store }
  }

  /// Build the job record and insert it into `usertransactions`
  pub async fn log_job(
    &self,
    user: &str,
    endpoint: &str,
    write_type: WriteType,
    job_description: Value,
    time_elapsed_seconds: u64,
    write_path: &str,
  ) -> (JobMetadata, bool) {
    let metadata = JobMetadata::new(user, endpoint, write_type, job_description, time_elapsed_seconds, write_path);
    let logged = self.insert(TRANSACTIONS_COLLECTION, &metadata).await;
    (metadata, logged)
  }

  /// Record where a historical trading pull was written
  pub async fn record_historical(&self, params: &HistoricalDataParams, write_path: &str) -> bool {
    let record = HistoricalTradingMetadata {
      id: Uuid::new_v4().to_string(),
      ticker: params.ticker.clone(),
      from_date: params.from_date.clone(),
      to_date: params.resolved_to_date(),
      resolution: params.resolution.to_string(),
      instrument: params.instrument.to_string(),
      write_path: if write_path.is_empty() { trading_metadata_storage_url(params) } else { write_path.to_string() },
    };
    self.insert(HISTORICAL_METADATA_COLLECTION, &record).await
  }

  async fn insert<T: serde::Serialize>(&self, collection: &str, record: &T) -> bool {
    let document = match serde_json::to_value(record) {
      Ok(document) => document,
      Err(e) => {
        error!("Could not serialize {} record: {}", collection, e);
        return false;
      }
    };

    match self.store.insert_one(collection, document).await {
      Ok(id) => {
        debug!("Logged {} record {}", collection, id);
        true
      }
      Err(e) => {
        error!("Could not log {} record: {}", collection, e);
        false
      }
    }
  }
}

/// Per-user session counters in `user_sessions`
#[derive(Clone)]
pub struct SessionTracker {
  store: Arc<dyn DocumentStore>,
}

impl SessionTracker {
  pub fn new(store: Arc<dyn DocumentStore>) -> Self {
    Self { store }
  }

  /// Open a session when a user obtains a token
  pub async fn instantiate(&self, user: &str) -> bool {
    let session = json!({
      "user": user,
      "session_start": Local::now().format(SESSION_TIME_FORMAT).to_string(),
      "session_last_call": Value::Null,
      "queries": 0,
    });

    match self.store.insert_one(SESSIONS_COLLECTION, session).await {
      Ok(_) => true,
      Err(e) => {
        error!("Could not open session for {}: {}", user, e);
        false
      }
    }
  }

  /// Stamp the last call and count it against the user's session
  pub async fn ping(&self, user: &str) -> bool {
    let now = Local::now().format(SESSION_TIME_FORMAT).to_string();
    let updated = self
      .store
      .update_one(SESSIONS_COLLECTION, json!({"user": user}), json!({"session_last_call": now}), json!({"queries": 1}))
      .await;

    match updated {
      Ok(found) => found,
      Err(e) => {
        error!("Could not update session for {}: {}", user, e);
        false
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::repository::{all_documents, MemoryDocumentStore, RepositoryError, RepositoryResult};
  use async_trait::async_trait;
  use pretty_assertions::assert_eq;

  struct BrokenStore;

  #[async_trait]
  impl DocumentStore for BrokenStore {
    async fn insert_one(&self, _: &str, _: Value) -> RepositoryResult<String> {
      Err(RepositoryError::PoolError("down".to_string()))
    }
    async fn insert_many(&self, _: &str, _: Vec<Value>) -> RepositoryResult<usize> {
      Err(RepositoryError::PoolError("down".to_string()))
    }
    async fn find_one(&self, _: &str, _: Value) -> RepositoryResult<Option<Value>> {
      Err(RepositoryError::PoolError("down".to_string()))
    }
    async fn update_one(&self, _: &str, _: Value, _: Value, _: Value) -> RepositoryResult<bool> {
      Err(RepositoryError::PoolError("down".to_string()))
    }
    async fn count(&self, _: &str, _: Value) -> RepositoryResult<usize> {
      Err(RepositoryError::PoolError("down".to_string()))
    }
  }

  #[tokio::test]
  async fn test_log_job() {
    let store = Arc::new(MemoryDocumentStore::new());
    let logger = MetadataLogger::new(store.clone());

    let (metadata, logged) = logger
      .log_job("james201", "agriculture_ethanolprod", WriteType::LocalStorage, json!({}), 3, "resources/x")
      .await;
    assert!(logged);
    assert_eq!(metadata.end_point, "agriculture/ethanolprod");

    let stored = store.find_one(TRANSACTIONS_COLLECTION, json!({"job_id": metadata.job_id})).await.unwrap().unwrap();
    assert_eq!(stored["user"], "james201");
    assert_eq!(stored["time_elapsed_seconds"], 3);
  }

  #[tokio::test]
  async fn test_record_historical() {
    let store = Arc::new(MemoryDocumentStore::new());
    let logger = MetadataLogger::new(store.clone());
    let params = HistoricalDataParams { to_date: Some("2021-02-01".to_string()), ..Default::default() };

    assert!(logger.record_historical(&params, "").await);
    let stored = store.find_one(HISTORICAL_METADATA_COLLECTION, json!({"ticker": "NFLX"})).await.unwrap().unwrap();
    assert_eq!(stored["write_path"], "trading/historical/stock/NFLX/1M/2021-01-01/2021-02-01/");
    assert_eq!(stored["resolution"], "1M");
    assert!(stored["_id"].is_string());
  }

  #[tokio::test]
  async fn test_failures_are_swallowed() {
    let logger = MetadataLogger::new(Arc::new(BrokenStore));
    let (_, logged) = logger.log_job("u", "wiki_pageviews", WriteType::Return, json!({}), 0, "").await;
    assert!(!logged);
    assert!(!logger.record_historical(&HistoricalDataParams::default(), "").await);

    let sessions = SessionTracker::new(Arc::new(BrokenStore));
    assert!(!sessions.instantiate("u").await);
    assert!(!sessions.ping("u").await);
  }

  #[tokio::test]
  async fn test_session_ping_counts_queries() {
    let store = Arc::new(MemoryDocumentStore::new());
    let sessions = SessionTracker::new(store.clone());

    assert!(!sessions.ping("james201").await);
    assert!(sessions.instantiate("james201").await);
    assert!(sessions.ping("james201").await);
    assert!(sessions.ping("james201").await);

    let session = store.find_one(SESSIONS_COLLECTION, json!({"user": "james201"})).await.unwrap().unwrap();
    assert_eq!(session["queries"], 2);
    assert!(session["session_last_call"].is_string());
    assert_eq!(store.count(SESSIONS_COLLECTION, all_documents()).await.unwrap(), 1);
  }
}
