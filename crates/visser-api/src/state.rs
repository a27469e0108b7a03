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

use governor::clock::{Clock, DefaultClock};
use governor::middleware::NoOpMiddleware;
use governor::state::keyed::DefaultKeyedStateStore;
use governor::{Quota, RateLimiter};
use std::num::NonZeroU32;
use std::sync::Arc;
use tracing::warn;
use visser_client::VisserClient;
use visser_core::{Config, Environment, WriteType};
use visser_loaders::{
  AgricultureLoader, LoaderConfig, LoaderContext, ProcessTracker, TradingLoader, TwitterCrawler, WikipediaLoader,
};
use visser_storage::{DocumentStore, MetadataLogger, SessionTracker, StorageUtility};

use crate::auth::TokenSigner;
use crate::error::{ApiError, ApiResult};

/// `/token` requests allowed per client address and minute
pub const TOKEN_REQUESTS_PER_MINUTE: u32 = 5;

type KeyedLimiter<C> = RateLimiter<String, DefaultKeyedStateStore<String>, C, NoOpMiddleware<<C as Clock>::Instant>>;

/// Per client budget of `/token` requests
///
/// Addresses whose budget is full again are dropped on every call, so the
/// map only holds clients seen within the last minute.
pub struct TokenLimiter<C: Clock = DefaultClock> {
  limiter: KeyedLimiter<C>,
}

impl TokenLimiter {
  pub fn per_minute(requests: u32) -> ApiResult<Self> {
    Ok(Self { limiter: RateLimiter::keyed(token_quota(requests)?) })
  }
}

impl<C: Clock> TokenLimiter<C> {
  pub fn with_clock(requests: u32, clock: C) -> ApiResult<Self> {
    Ok(Self { limiter: RateLimiter::new(token_quota(requests)?, DefaultKeyedStateStore::default(), clock) })
  }

  /// Spend one request of `client`, false once its budget is used up
  pub fn check(&self, client: &str) -> bool {
    self.limiter.retain_recent();
    self.limiter.check_key(&client.to_string()).is_ok()
  }

  /// Clients currently holding a partly used budget
  pub fn tracked_clients(&self) -> usize {
    self.limiter.len()
  }
}

fn token_quota(requests: u32) -> ApiResult<Quota> {
  NonZeroU32::new(requests)
    .map(Quota::per_minute)
    .ok_or_else(|| ApiError::Internal("Token rate limit must be positive".to_string()))
}

/// Everything the handlers share
pub struct AppState {
  pub config: Config,
  pub signer: TokenSigner,
  pub context: LoaderContext,
  pub trading: TradingLoader,
  pub agriculture: AgricultureLoader,
  pub wikipedia: WikipediaLoader,
  crawler: Option<Arc<TwitterCrawler>>,
  pub storage: StorageUtility,
  pub metadata: MetadataLogger,
  pub sessions: SessionTracker,
  pub documents: Arc<dyn DocumentStore>,
  pub token_limiter: TokenLimiter,
  pub process_tracker: ProcessTracker,
}

impl AppState {
  pub fn new(config: Config, client: Arc<VisserClient>, documents: Arc<dyn DocumentStore>) -> ApiResult<Self> {
    let storage = StorageUtility::new(&config, documents.clone())?;

    let crawler = match TwitterCrawler::from_client(&client) {
      Ok(crawler) => Some(Arc::new(crawler)),
      Err(e) => {
        warn!("Twitter routes disabled: {}", e);
        None
      }
    };

    let context = LoaderContext::new(client, LoaderConfig::default());

    Ok(Self {
      signer: TokenSigner::new(&config.master_secret_key, config.access_key_lifetime_hours),
      config,
      context,
      trading: TradingLoader::new(),
      agriculture: AgricultureLoader::new(),
      wikipedia: WikipediaLoader::new(),
      crawler,
      storage,
      metadata: MetadataLogger::new(documents.clone()),
      sessions: SessionTracker::new(documents.clone()),
      documents,
      token_limiter: TokenLimiter::per_minute(TOKEN_REQUESTS_PER_MINUTE)?,
      process_tracker: ProcessTracker::new(),
    })
  }

  /// Replace the storage utility, e.g. one pointed at a test bucket
  pub fn with_storage(mut self, storage: StorageUtility) -> Self {
    self.storage = storage;
    self
  }

  pub fn with_crawler(mut self, crawler: TwitterCrawler) -> Self {
    self.crawler = Some(Arc::new(crawler));
    self
  }

  pub fn environment(&self) -> Environment {
    self.config.environment
  }

  pub fn crawler(&self) -> ApiResult<Arc<TwitterCrawler>> {
    self
      .crawler
      .clone()
      .ok_or_else(|| ApiError::Internal("No twitter applications configured, set TWITTER_BEARER_TOKEN_1".to_string()))
  }

  /// The request body's write type, else the query's, else `default`
  ///
  /// Fails when the environment does not allow the result.
  pub fn resolve_write_type(
    &self,
    body: Option<WriteType>,
    query: Option<WriteType>,
    default: WriteType,
  ) -> ApiResult<WriteType> {
    let write_type = body.or(query).unwrap_or(default);
    write_type.ensure_allowed(self.environment())?;
    Ok(write_type)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use governor::clock::FakeRelativeClock;
  use std::time::Duration;
  use visser_core::TransportSettings;
  use visser_storage::MemoryDocumentStore;

  fn state(environment: Environment) -> AppState {
    let mut config = Config::default_with_secret("secret".to_string());
    config.environment = environment;
    let client = Arc::new(VisserClient::keyless(&TransportSettings::default()).unwrap());
    AppState::new(config, client, Arc::new(MemoryDocumentStore::new())).unwrap()
  }

  #[test]
  fn test_write_type_precedence() {
    let state = state(Environment::Dev);
    let resolve = |body, query| state.resolve_write_type(body, query, WriteType::CloudStorage).unwrap();

    assert_eq!(resolve(Some(WriteType::Return), Some(WriteType::LocalStorage)), WriteType::Return);
    assert_eq!(resolve(None, Some(WriteType::LocalStorage)), WriteType::LocalStorage);
    assert_eq!(resolve(None, None), WriteType::CloudStorage);
  }

  #[test]
  fn test_prod_refuses_local_storage() {
    let state = state(Environment::Prod);
    let result = state.resolve_write_type(Some(WriteType::LocalStorage), None, WriteType::CloudStorage);
    assert!(matches!(result, Err(ApiError::BadRequest(_))));
  }

  #[test]
  fn test_token_limiter_allows_five_per_minute() {
    let state = state(Environment::Dev);
    for _ in 0..TOKEN_REQUESTS_PER_MINUTE {
      assert!(state.token_limiter.check("127.0.0.1"));
    }
    assert!(!state.token_limiter.check("127.0.0.1"));
    assert!(state.token_limiter.check("10.0.0.2"));
  }

  #[test]
  fn test_token_limiter_forgets_idle_clients() {
    let clock = FakeRelativeClock::default();
    let limiter = TokenLimiter::with_clock(TOKEN_REQUESTS_PER_MINUTE, clock.clone()).unwrap();

    for i in 0..50 {
      assert!(limiter.check(&format!("10.0.0.{}", i)));
    }
    assert_eq!(limiter.tracked_clients(), 50);

    for _ in 0..TOKEN_REQUESTS_PER_MINUTE {
      assert!(limiter.check("10.0.1.1"));
    }
    assert!(!limiter.check("10.0.1.1"));
    assert_eq!(limiter.tracked_clients(), 51);

    clock.advance(Duration::from_secs(121));
    assert!(limiter.check("10.0.2.2"));
    assert_eq!(limiter.tracked_clients(), 1);
    assert!(limiter.check("10.0.1.1"));
  }

  #[test]
  fn test_crawler_needs_applications() {
    assert!(matches!(state(Environment::Dev).crawler(), Err(ApiError::Internal(_))));
  }
}
