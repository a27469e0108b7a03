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

use chrono::Utc;
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};
use visser_client::endpoints::twitter::LOOKUP_BATCH_SIZE;
use visser_client::{TwitterApi, VisserClient};
use visser_core::RelationshipType;
use visser_models::twitter::{FollowEdge, FollowIdsPage, UserInfo, UserRef};

use super::rotator::CredentialRotator;
use crate::batch_processor::create_batches;
use crate::{LoaderError, LoaderResult};

/// Wait used when the rate limit window itself cannot be read
const FALLBACK_WAIT_SECS: u64 = 15 * 60;

/// Seconds to sleep until `reset`, with a two second margin
pub fn seconds_until_reset(reset: i64, now: i64) -> u64 {
  u64::try_from(reset - now + 2).unwrap_or(0)
}

/// Split rows into chunks of `chunk_size`; `None` keeps them together
pub fn chunk_rows<T>(rows: Vec<T>, chunk_size: Option<usize>) -> Vec<Vec<T>> {
  match chunk_size {
    Some(size) => create_batches(rows.into_iter(), size),
    None => vec![rows],
  }
}

/// Distinct requested accounts that produced at least one edge
pub fn distinct_requested(relationship: RelationshipType, edges: &[FollowEdge]) -> usize {
  let requested: HashSet<&str> = edges
    .iter()
    .map(|edge| match relationship {
      RelationshipType::Followers => edge.twitter_followee_id.as_str(),
      RelationshipType::Followings => edge.twitter_follower_id.as_str(),
    })
    .collect();
  requested.len()
}

/// Follow graph crawler over a pool of twitter applications
///
/// Each application has its own rate limit window. When the one in use is
/// throttled the crawler rotates to the next; once every application has been
/// throttled on the same page it sleeps until the current window resets.
pub struct TwitterCrawler {
  rotator: Mutex<CredentialRotator>,
  pool_size: usize,
}

impl TwitterCrawler {
  pub fn new(clients: Vec<Arc<dyn TwitterApi>>) -> LoaderResult<Self> {
    let rotator = CredentialRotator::new(clients)?;
    let pool_size = rotator.len();
    info!("Twitter crawler ready with {} applications", pool_size);
    Ok(Self { rotator: Mutex::new(rotator), pool_size })
  }

  /// Crawler over every bearer token configured on `client`
  pub fn from_client(client: &VisserClient) -> LoaderResult<Self> {
    Self::new(client.twitter_pool()?)
  }

  pub fn pool_size(&self) -> usize {
    self.pool_size
  }

  /// Number of the application currently in use
  pub async fn current_application(&self) -> usize {
    self.rotator.lock().await.current().0
  }

  /// Every id related to `user`, walking the cursor pages
  ///
  /// Extraction stops once `upper_limit` ids are collected. Errors other than
  /// throttling end the user's extraction and keep the ids gathered so far.
  pub async fn relation_ids(&self, relationship: RelationshipType, user: &UserRef, upper_limit: Option<usize>) -> Vec<u64> {
    info!("Twitter {}: Starting extraction for {}", relationship, user);

    let mut ids = Vec::new();
    let mut cursor = -1;
    let mut page_no = 1;

    while cursor != 0 {
      match self.fetch_page(relationship, user, cursor, page_no).await {
        Ok(page) => {
          ids.extend(page.ids);
          cursor = page.next_cursor;
          if upper_limit.is_some_and(|limit| ids.len() >= limit) {
            info!("Twitter {}: Stopping extraction for {} at {} ids", relationship, user, ids.len());
            cursor = 0;
          }
        }
        Err(e) => {
          error!("Twitter {}: Skipping rest of extraction for {}, unexpected error: {}", relationship, user, e);
          break;
        }
      }
      page_no += 1;
    }

    info!("Twitter {}: Completed extraction for {}. {} ids extracted", relationship, user, ids.len());
    ids
  }

  /// One cursor page, rotating through the pool while throttled
  async fn fetch_page(
    &self,
    relationship: RelationshipType,
    user: &UserRef,
    cursor: i64,
    page_no: usize,
  ) -> visser_core::Result<FollowIdsPage> {
    loop {
      for attempt in 1..=self.pool_size + 1 {
        let (index, client) = self.rotator.lock().await.current();
        debug!("Twitter {}: Application {}, {} page {}, cursor {}", relationship, index, user, page_no, cursor);

        match client.relation_ids(relationship, user, cursor).await {
          Ok(page) => return Ok(page),
          Err(e) if e.is_rate_limit() => {
            if attempt <= self.pool_size {
              let next = self.rotator.lock().await.rotate();
              info!("Twitter {}: Rate limit reached for application {}, switching to application {}", relationship, index, next);
            } else {
              self.wait_for_reset(client.as_ref(), relationship).await;
            }
          }
          Err(e) => return Err(e),
        }
      }
      debug!("Twitter {}: Still throttled after waiting, retrying cursor {}", relationship, cursor);
    }
  }

  async fn wait_for_reset(&self, client: &dyn TwitterApi, relationship: RelationshipType) {
    let wait = match client.rate_limit_status(relationship).await {
      Ok(window) => seconds_until_reset(window.reset, Utc::now().timestamp()),
      Err(e) => {
        warn!("Twitter {}: Could not read rate limit status ({}), waiting a full window", relationship, e);
        FALLBACK_WAIT_SECS
      }
    };

    info!("Twitter {}: Rate limit reached for all applications, sleeping for {}s while limits recover", relationship, wait);
    tokio::time::sleep(Duration::from_secs(wait)).await;
  }

  /// Follow edges of every user, in request order, grouped into chunks
  ///
  /// A follower edge points from the returned id to the user; a following
  /// edge points from the user to the returned id.
  pub async fn follows(
    &self,
    relationship: RelationshipType,
    users: &[UserRef],
    chunk_size: Option<usize>,
    upper_limit: Option<usize>,
  ) -> Vec<Vec<FollowEdge>> {
    let total = users.len();
    info!("Twitter {}: Start extraction for {} users", relationship, total);

    let mut edges = Vec::new();
    for (user_no, user) in users.iter().enumerate() {
      let user_key = user.to_string();
      let ids = self.relation_ids(relationship, user, upper_limit).await;

      edges.extend(ids.into_iter().map(|id| match relationship {
        RelationshipType::Followers => {
          FollowEdge { twitter_followee_id: user_key.clone(), twitter_follower_id: id.to_string() }
        }
        RelationshipType::Followings => {
          FollowEdge { twitter_follower_id: user_key.clone(), twitter_followee_id: id.to_string() }
        }
      }));

      info!("Twitter {}: {}/{} users extracted", relationship, user_no + 1, total);
    }

    info!("Twitter {}: Completed extraction for {} users", relationship, total);
    chunk_rows(edges, chunk_size.or(relationship.default_chunk_size()))
  }

  /// Profiles of `users`, looked up in batches of 100 spread over the pool
  ///
  /// Each round hands one queued batch to every application and runs the
  /// lookups concurrently. A failed batch is logged and skipped.
  pub async fn user_info(&self, users: &[UserRef], chunk_size: Option<usize>) -> LoaderResult<Vec<Vec<UserInfo>>> {
    let mut queue: VecDeque<Vec<UserRef>> = create_batches(users.iter().cloned(), LOOKUP_BATCH_SIZE).into();
    let total_batches = queue.len();
    info!(
      "Twitter User Details: Getting user details for {} users in {} batches of {}",
      users.len(),
      total_batches,
      LOOKUP_BATCH_SIZE
    );

    let applications = self.rotator.lock().await.applications();
    let mut infos = Vec::with_capacity(users.len());

    while !queue.is_empty() {
      let mut lookups = JoinSet::new();

      for (index, client) in &applications {
        let Some(batch) = queue.pop_front() else {
          break;
        };
        let batch_no = total_batches - queue.len();
        info!(
          "Twitter User Details: Sent {} users, {}/{} total batches, using application {}",
          batch.len(),
          batch_no,
          total_batches,
          index
        );

        let client = client.clone();
        let index = *index;
        lookups.spawn(async move { (index, client.lookup_users(&batch).await) });
      }

      while let Some(joined) = lookups.join_next().await {
        let (index, outcome) = joined.map_err(|e| LoaderError::BatchProcessingError(e.to_string()))?;
        match outcome {
          Ok(raw) => infos.extend(raw.into_iter().map(UserInfo::from)),
          Err(e) => error!("Twitter User Details: Lookup on application {} failed: {}", index, e),
        }
      }
    }

    info!("Twitter User Details: Fetched {} profiles", infos.len());
    Ok(chunk_rows(infos, chunk_size))
  }
}
