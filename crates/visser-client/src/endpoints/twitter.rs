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

//! Twitter v1.1 follow graph and user lookup endpoints

use super::impl_endpoint_base;
use crate::transport::{bearer_header, Transport};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::instrument;
use visser_core::{Error, RelationshipType, Result, TransportSettings, TWITTER_BASE_URL};
use visser_models::twitter::{FollowIdsPage, RateLimitStatus, RateLimitWindow, RawUser, UserRef};

/// Ids returned per cursor page
pub const IDS_PAGE_SIZE: u32 = 5000;

/// Users accepted by one `users/lookup` call
pub const LOOKUP_BATCH_SIZE: usize = 100;

/// One authenticated twitter application
///
/// The crawler holds a pool of these and rotates through them whenever one
/// reports [`Error::RateLimit`].
#[async_trait]
pub trait TwitterApi: Send + Sync {
  /// One page of the ids following `user`
  async fn follower_ids(&self, user: &UserRef, cursor: i64) -> Result<FollowIdsPage>;

  /// One page of the ids `user` follows
  async fn friend_ids(&self, user: &UserRef, cursor: i64) -> Result<FollowIdsPage>;

  /// Profiles of up to [`LOOKUP_BATCH_SIZE`] users
  async fn lookup_users(&self, users: &[UserRef]) -> Result<Vec<RawUser>>;

  /// Current window of the ids endpoint behind `relationship`
  async fn rate_limit_status(&self, relationship: RelationshipType) -> Result<RateLimitWindow>;

  /// Page of either relationship
  async fn relation_ids(&self, relationship: RelationshipType, user: &UserRef, cursor: i64) -> Result<FollowIdsPage> {
    match relationship {
      RelationshipType::Followers => self.follower_ids(user, cursor).await,
      RelationshipType::Followings => self.friend_ids(user, cursor).await,
    }
  }
}

/// [`TwitterApi`] over HTTP with an app-only bearer token
pub struct TwitterHttpClient {
  transport: Arc<Transport>,
}

impl_endpoint_base!(TwitterHttpClient);

impl TwitterHttpClient {
  pub fn new(bearer_token: &str, settings: &TransportSettings) -> Result<Self> {
    Self::with_base_url(TWITTER_BASE_URL, bearer_token, settings)
  }

  pub fn with_base_url(base_url: &str, bearer_token: &str, settings: &TransportSettings) -> Result<Self> {
    let headers = bearer_header(bearer_token)?;
    Ok(Self { transport: Arc::new(Transport::with_headers(base_url, settings, headers)?) })
  }

  async fn ids_page(&self, path: &str, user: &UserRef, cursor: i64) -> Result<FollowIdsPage> {
    let (key, value) = user.query_pair();
    self
      .transport
      .get_json(path, &[(key, value), ("cursor", cursor.to_string()), ("count", IDS_PAGE_SIZE.to_string())])
      .await
  }

  async fn lookup(&self, key: &str, values: Vec<String>) -> Result<Vec<RawUser>> {
    if values.is_empty() {
      return Ok(Vec::new());
    }
    self.transport.get_json("/1.1/users/lookup.json", &[(key, values.join(","))]).await
  }
}

#[async_trait]
impl TwitterApi for TwitterHttpClient {
  #[instrument(skip(self))]
  async fn follower_ids(&self, user: &UserRef, cursor: i64) -> Result<FollowIdsPage> {
    self.ids_page("/1.1/followers/ids.json", user, cursor).await
  }

  #[instrument(skip(self))]
  async fn friend_ids(&self, user: &UserRef, cursor: i64) -> Result<FollowIdsPage> {
    self.ids_page("/1.1/friends/ids.json", user, cursor).await
  }

  #[instrument(skip(self, users), fields(count = users.len()))]
  async fn lookup_users(&self, users: &[UserRef]) -> Result<Vec<RawUser>> {
    let (ids, names): (Vec<&UserRef>, Vec<&UserRef>) = users.iter().partition(|u| u.is_id());

    let mut found = self.lookup("user_id", ids.iter().map(|u| u.to_string()).collect()).await?;
    found.extend(self.lookup("screen_name", names.iter().map(|u| u.to_string()).collect()).await?);
    Ok(found)
  }

  async fn rate_limit_status(&self, relationship: RelationshipType) -> Result<RateLimitWindow> {
    let status: RateLimitStatus = self
      .transport
      .get_json("/1.1/application/rate_limit_status.json", &[("resources", "followers,friends".to_string())])
      .await?;

    let (family, endpoint) = match relationship {
      RelationshipType::Followers => ("followers", "/followers/ids"),
      RelationshipType::Followings => ("friends", "/friends/ids"),
    };
    status.window(family, endpoint).ok_or_else(|| Error::MissingField(format!("resources.{}.{}", family, endpoint)))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use pretty_assertions::assert_eq;
  use wiremock::matchers::{header, path, query_param};
  use wiremock::{Mock, MockServer, ResponseTemplate};

  fn client(server: &MockServer) -> TwitterHttpClient {
    let settings = TransportSettings { rate_limit: 600, timeout_secs: 5, max_retries: 0 };
    TwitterHttpClient::with_base_url(&server.uri(), "bearer-1", &settings).unwrap()
  }

  #[tokio::test]
  async fn test_follower_ids_page() {
    let server = MockServer::start().await;
    Mock::given(path("/1.1/followers/ids.json"))
      .and(header("authorization", "Bearer bearer-1"))
      .and(query_param("screen_name", "jack"))
      .and(query_param("cursor", "-1"))
      .and(query_param("count", "5000"))
      .respond_with(
        ResponseTemplate::new(200)
          .set_body_string(r#"{"ids":[11,12,13],"next_cursor":1374004777531007833,"previous_cursor":0}"#),
      )
      .expect(1)
      .mount(&server)
      .await;

    let page = client(&server).follower_ids(&UserRef::ScreenName("jack".into()), -1).await.unwrap();
    assert_eq!(page.ids, vec![11, 12, 13]);
    assert_eq!(page.next_cursor, 1374004777531007833);
  }

  #[tokio::test]
  async fn test_relation_ids_routes_followings() {
    let server = MockServer::start().await;
    Mock::given(path("/1.1/friends/ids.json"))
      .and(query_param("user_id", "12"))
      .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"ids":[5],"next_cursor":0}"#))
      .expect(1)
      .mount(&server)
      .await;

    let page = client(&server).relation_ids(RelationshipType::Followings, &UserRef::Id(12), -1).await.unwrap();
    assert_eq!(page.ids, vec![5]);
    assert_eq!(page.next_cursor, 0);
  }

  #[tokio::test]
  async fn test_rate_limited_page() {
    let server = MockServer::start().await;
    Mock::given(path("/1.1/followers/ids.json")).respond_with(ResponseTemplate::new(429)).mount(&server).await;

    let result = client(&server).follower_ids(&UserRef::Id(1), -1).await;
    assert!(matches!(result, Err(Error::RateLimit(_))));
  }

  #[tokio::test]
  async fn test_lookup_users_splits_ids_and_names() {
    let server = MockServer::start().await;
    Mock::given(path("/1.1/users/lookup.json"))
      .and(query_param("user_id", "12,13"))
      .respond_with(ResponseTemplate::new(200).set_body_string(
        r#"[{"id":12,"screen_name":"jack","followers_count":1,"friends_count":2,"created_at":"x"}]"#,
      ))
      .expect(1)
      .mount(&server)
      .await;
    Mock::given(path("/1.1/users/lookup.json"))
      .and(query_param("screen_name", "biz"))
      .respond_with(ResponseTemplate::new(200).set_body_string(r#"[{"id":13,"screen_name":"biz"}]"#))
      .expect(1)
      .mount(&server)
      .await;

    let users = vec![UserRef::Id(12), UserRef::ScreenName("biz".into()), UserRef::Id(13)];
    let found = client(&server).lookup_users(&users).await.unwrap();
    assert_eq!(found.iter().map(|u| u.id).collect::<Vec<_>>(), vec![12, 13]);
  }

  #[tokio::test]
  async fn test_rate_limit_status() {
    let server = MockServer::start().await;
    Mock::given(path("/1.1/application/rate_limit_status.json"))
      .and(query_param("resources", "followers,friends"))
      .respond_with(ResponseTemplate::new(200).set_body_string(
        r#"{"resources":{"followers":{"/followers/ids":{"limit":15,"remaining":0,"reset":1635351540}},"friends":{"/friends/ids":{"limit":15,"remaining":3,"reset":1635351000}}}}"#,
      ))
      .mount(&server)
      .await;

    let client = client(&server);
    let followers = client.rate_limit_status(RelationshipType::Followers).await.unwrap();
    let friends = client.rate_limit_status(RelationshipType::Followings).await.unwrap();
    assert_eq!(followers.reset, 1635351540);
    assert_eq!(friends.remaining, 3);
  }
}
