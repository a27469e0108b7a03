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

//! Batch processing utilities for bounded concurrent requests

use futures::future::BoxFuture;
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use crate::{LoaderError, LoaderResult};

/// Configuration for batch processing
#[derive(Debug, Clone)]
pub struct BatchConfig {
  /// Items sent per batch
  pub batch_size: usize,

  /// Requests in flight at once
  pub max_concurrent: usize,

  /// Abort once this many items have failed. `None` tolerates any number.
  pub max_failures: Option<usize>,

  /// Pause between batches in milliseconds
  pub batch_delay_ms: Option<u64>,
}

impl Default for BatchConfig {
  fn default() -> Self {
    Self { batch_size: 100, max_concurrent: 100, max_failures: None, batch_delay_ms: Some(1000) }
  }
}

/// Result of batch processing
#[derive(Debug, Clone)]
pub struct BatchResult<T> {
  /// Successfully processed items
  pub success: Vec<T>,

  /// Index of each failed item with its error
  pub failures: Vec<(usize, LoaderError)>,

  /// Total items processed
  pub total_processed: usize,
}

impl<T> Default for BatchResult<T> {
  fn default() -> Self {
    Self { success: Vec::new(), failures: Vec::new(), total_processed: 0 }
  }
}

impl<T> BatchResult<T> {
  pub fn success_count(&self) -> usize {
    self.success.len()
  }

  pub fn failure_count(&self) -> usize {
    self.failures.len()
  }

  pub fn success_rate(&self) -> f64 {
    if self.total_processed == 0 {
      0.0
    } else {
      self.success_count() as f64 / self.total_processed as f64
    }
  }
}

/// Sends items through an async processor in batches, with a semaphore
/// bounding the requests in flight
#[derive(Debug, Clone)]
pub struct BatchProcessor {
  config: BatchConfig,
  semaphore: Arc<Semaphore>,
}

impl BatchProcessor {
  pub fn new(config: BatchConfig) -> Self {
    let semaphore = Arc::new(Semaphore::new(config.max_concurrent.max(1)));
    Self { config, semaphore }
  }

  pub fn config(&self) -> &BatchConfig {
    &self.config
  }

  /// Process `items` batch by batch
  ///
  /// Failures are collected until `max_failures` is reached, which aborts
  /// the run with [`LoaderError::ExcessiveFailures`].
  pub async fn process_batches<T, F, O>(&self, items: Vec<T>, processor: F) -> LoaderResult<BatchResult<O>>
  where
    T: Send + 'static,
    F: Fn(T) -> BoxFuture<'static, LoaderResult<O>> + Send + Sync + Clone + 'static,
    O: Send + 'static,
  {
    let total = items.len();
    let batch_size = self.config.batch_size.max(1);
    let batches = create_batches(items.into_iter(), batch_size);
    let batch_count = batches.len();

    debug!("Processing {} items in {} batches of {}", total, batch_count, batch_size);

    let mut result = BatchResult { total_processed: total, ..BatchResult::default() };

    for (batch_no, batch) in batches.into_iter().enumerate() {
      let offset = batch_no * batch_size;
      let outcomes = self.process_single_batch(batch, processor.clone()).await;

      for (idx, outcome) in outcomes {
        match outcome {
          Ok(output) => result.success.push(output),
          Err(e) => {
            let failures = result.failures.len() + 1;
            if self.config.max_failures.is_some_and(|max| failures >= max) {
              return Err(LoaderError::ExcessiveFailures { failures, last_error: e.to_string() });
            }
            warn!("Item {} failed ({} failures so far): {}", offset + idx, failures, e);
            result.failures.push((offset + idx, e));
          }
        }
      }

      info!("Batch {}/{} extracted", batch_no + 1, batch_count);

      if let Some(delay_ms) = self.config.batch_delay_ms {
        if batch_no + 1 < batch_count {
          tokio::time::sleep(Duration::from_millis(delay_ms)).await;
        }
      }
    }

    debug!("Batch processing complete: {} successes, {} failures", result.success_count(), result.failure_count());
    Ok(result)
  }

  /// Run one batch concurrently; outcomes carry the item's position in the batch
  async fn process_single_batch<T, F, O>(&self, batch: Vec<T>, processor: F) -> Vec<(usize, LoaderResult<O>)>
  where
    T: Send + 'static,
    F: Fn(T) -> BoxFuture<'static, LoaderResult<O>> + Send + Sync + Clone,
    O: Send + 'static,
  {
    let semaphore = self.semaphore.clone();

    stream::iter(batch.into_iter().enumerate())
      .map(move |(idx, item)| {
        let processor = processor.clone();
        let semaphore = semaphore.clone();

        async move {
          let Ok(_permit) = semaphore.acquire().await else {
            return (idx, Err(LoaderError::BatchProcessingError("Semaphore closed unexpectedly".to_string())));
          };
          (idx, processor(item).await)
        }
      })
      .buffer_unordered(self.config.max_concurrent.max(1))
      .collect::<Vec<_>>()
      .await
  }
}

/// Split an iterator into vectors of `batch_size`
pub fn create_batches<T>(items: impl Iterator<Item = T>, batch_size: usize) -> Vec<Vec<T>> {
  let batch_size = batch_size.max(1);
  let mut batches = Vec::new();
  let mut current = Vec::with_capacity(batch_size);

  for item in items {
    current.push(item);
    if current.len() >= batch_size {
      batches.push(std::mem::replace(&mut current, Vec::with_capacity(batch_size)));
    }
  }

  if !current.is_empty() {
    batches.push(current);
  }

  batches
}

#[cfg(test)]
mod tests {
  use super::*;
  use pretty_assertions::assert_eq;

  fn config(batch_size: usize, max_failures: Option<usize>) -> BatchConfig {
    BatchConfig { batch_size, max_concurrent: 4, max_failures, batch_delay_ms: None }
  }

  #[test]
  fn test_create_batches_with_remainder() {
    let batches = create_batches(1..=7, 3);
    assert_eq!(batches, vec![vec![1, 2, 3], vec![4, 5, 6], vec![7]]);
    assert!(create_batches(std::iter::empty::<u8>(), 3).is_empty());
  }

  #[test]
  fn test_batch_result_success_rate() {
    let result = BatchResult {
      success: vec![1, 2, 3],
      failures: vec![(3, LoaderError::InvalidData("bad".to_string()))],
      total_processed: 4,
    };
    assert_eq!(result.success_rate(), 0.75);
    assert_eq!(BatchResult::<u8>::default().success_rate(), 0.0);
  }

  #[tokio::test]
  async fn test_process_all_success() {
    let processor = BatchProcessor::new(config(2, None));
    let result = processor.process_batches(vec![1, 2, 3, 4, 5], |x| Box::pin(async move { Ok(x * 2) })).await.unwrap();

    assert_eq!(result.total_processed, 5);
    let mut doubled = result.success.clone();
    doubled.sort();
    assert_eq!(doubled, vec![2, 4, 6, 8, 10]);
  }

  #[tokio::test]
  async fn test_failures_are_skipped() {
    let processor = BatchProcessor::new(config(2, Some(35)));
    let result = processor
      .process_batches(vec![1, 2, 3, 4, 5], |x| {
        Box::pin(async move { if x == 3 { Err(LoaderError::NotFound("three".to_string())) } else { Ok(x) } })
      })
      .await
      .unwrap();

    assert_eq!(result.success_count(), 4);
    assert_eq!(result.failures.len(), 1);
    assert_eq!(result.failures[0].0, 2);
  }

  #[tokio::test]
  async fn test_excessive_failures_abort() {
    let processor = BatchProcessor::new(config(10, Some(3)));
    let result = processor
      .process_batches((0..20).collect(), |_: i32| {
        Box::pin(async move { Err::<i32, _>(LoaderError::ApiError("down".to_string())) })
      })
      .await;

    match result {
      Err(LoaderError::ExcessiveFailures { failures, .. }) => assert_eq!(failures, 3),
      other => panic!("expected excessive failures, got {:?}", other.map(|r| r.total_processed)),
    }
  }

  #[tokio::test(start_paused = true)]
  async fn test_delay_between_batches() {
    let processor = BatchProcessor::new(BatchConfig { batch_delay_ms: Some(1000), ..config(2, None) });
    let started = tokio::time::Instant::now();
    processor.process_batches(vec![1, 2, 3, 4, 5], |x| Box::pin(async move { Ok(x) })).await.unwrap();
    assert_eq!(started.elapsed().as_secs(), 2);
  }
}
