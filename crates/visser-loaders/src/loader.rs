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

//! Base traits and types for data loaders

use crate::batch_processor::BatchConfig;
use crate::LoaderResult;
use async_trait::async_trait;
use std::sync::Arc;
use visser_client::VisserClient;

/// Configuration for data loaders
#[derive(Debug, Clone)]
pub struct LoaderConfig {
  /// Maximum concurrent requests
  pub max_concurrent_requests: usize,

  /// Requests per batch for batched sources
  pub batch_size: usize,

  /// Pause between batches in milliseconds
  pub batch_delay_ms: u64,

  /// Failed requests tolerated before a job is aborted
  pub max_failures: usize,
}

impl Default for LoaderConfig {
  fn default() -> Self {
    Self { max_concurrent_requests: 100, batch_size: 100, batch_delay_ms: 1000, max_failures: 35 }
  }
}

impl LoaderConfig {
  pub fn batch_config(&self) -> BatchConfig {
    BatchConfig {
      batch_size: self.batch_size,
      max_concurrent: self.max_concurrent_requests,
      max_failures: Some(self.max_failures),
      batch_delay_ms: Some(self.batch_delay_ms),
    }
  }
}

/// Shared context for all loaders
#[derive(Clone)]
pub struct LoaderContext {
  pub client: Arc<VisserClient>,
  pub config: LoaderConfig,
}

impl LoaderContext {
  pub fn new(client: Arc<VisserClient>, config: LoaderConfig) -> Self {
    Self { client, config }
  }
}

/// Base trait for all data loaders
#[async_trait]
pub trait DataLoader: Send + Sync {
  /// The type of data this loader processes
  type Input: Send;

  /// The result type after loading
  type Output;

  /// Load data from the given input
  async fn load(&self, context: &LoaderContext, input: Self::Input) -> LoaderResult<Self::Output>;

  /// Validate input before loading
  async fn validate_input(&self, _input: &Self::Input) -> LoaderResult<()> {
    Ok(())
  }

  /// Get loader name for logging/tracking
  fn name(&self) -> &'static str;
}
