//! Process tracking for extraction jobs
//!
//! In-memory record of when each job started and how it ended. The API reads
//! the elapsed time of a job from here when it logs job metadata.

use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Finished jobs kept for inspection
const MAX_HISTORY: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessState {
  Running,
  Success,
  Failed,
  CompletedWithErrors,
}

#[derive(Debug, Clone)]
pub struct ProcessInfo {
  pub id: u64,
  pub process_name: String,
  pub start_time: DateTime<Utc>,
  pub end_time: Option<DateTime<Utc>>,
  pub state: ProcessState,
  pub records_processed: Option<usize>,
}

impl ProcessInfo {
  /// Whole seconds from start to end, or to now while running
  pub fn elapsed_seconds(&self) -> u64 {
    let end = self.end_time.unwrap_or_else(Utc::now);
    u64::try_from((end - self.start_time).num_seconds()).unwrap_or(0)
  }
}

/// In-memory process tracker, cheap to clone and share between requests
#[derive(Clone, Default)]
pub struct ProcessTracker {
  next_id: Arc<AtomicU64>,
  processes: Arc<Mutex<Vec<ProcessInfo>>>,
}

impl ProcessTracker {
  pub fn new() -> Self {
    Self::default()
  }

  /// Register a running job and return its id
  pub async fn start(&self, process_name: &str) -> u64 {
    let id = self.next_id.fetch_add(1, Ordering::Relaxed);
    let mut processes = self.processes.lock().await;

    if processes.len() >= MAX_HISTORY {
      if let Some(pos) = processes.iter().position(|p| p.state != ProcessState::Running) {
        processes.remove(pos);
      }
    }

    processes.push(ProcessInfo {
      id,
      process_name: process_name.to_string(),
      start_time: Utc::now(),
      end_time: None,
      state: ProcessState::Running,
      records_processed: None,
    });
    id
  }

  /// Close job `id`, returning its final record
  pub async fn complete(&self, id: u64, state: ProcessState, records_processed: usize) -> Option<ProcessInfo> {
    let mut processes = self.processes.lock().await;
    let process = processes.iter_mut().find(|p| p.id == id)?;
    process.state = state;
    process.end_time = Some(Utc::now());
    process.records_processed = Some(records_processed);
    Some(process.clone())
  }

  pub async fn get(&self, id: u64) -> Option<ProcessInfo> {
    self.processes.lock().await.iter().find(|p| p.id == id).cloned()
  }

  pub async fn get_all(&self) -> Vec<ProcessInfo> {
    self.processes.lock().await.clone()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn test_start_and_complete() {
    let tracker = ProcessTracker::new();
    let first = tracker.start("twitter_followers").await;
    let second = tracker.start("wiki_pageviews").await;
    assert_ne!(first, second);

    let done = tracker.complete(first, ProcessState::Success, 42).await.unwrap();
    assert_eq!(done.state, ProcessState::Success);
    assert_eq!(done.records_processed, Some(42));
    assert!(done.end_time.is_some());

    let running = tracker.get(second).await.unwrap();
    assert_eq!(running.state, ProcessState::Running);
    assert!(tracker.complete(999, ProcessState::Failed, 0).await.is_none());
  }

  #[test]
  fn test_elapsed_seconds() {
    let start = Utc::now();
    let info = ProcessInfo {
      id: 0,
      process_name: "agriculture_ethanolprod".to_string(),
      start_time: start,
      end_time: Some(start + chrono::Duration::seconds(7)),
      state: ProcessState::Success,
      records_processed: None,
    };
    assert_eq!(info.elapsed_seconds(), 7);
  }

  #[tokio::test]
  async fn test_history_is_bounded() {
    let tracker = ProcessTracker::new();
    for _ in 0..MAX_HISTORY + 5 {
      let id = tracker.start("job").await;
      tracker.complete(id, ProcessState::Success, 0).await;
    }
    assert_eq!(tracker.get_all().await.len(), MAX_HISTORY);
  }
}
