//! Twitter v1.1 payloads and the rows produced from them

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// A twitter account addressed by numeric id or by screen name
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UserRef {
  Id(u64),
  ScreenName(String),
}

impl UserRef {
  /// Query parameter naming this user
  pub fn query_pair(&self) -> (&'static str, String) {
    match self {
      UserRef::Id(id) => ("user_id", id.to_string()),
      UserRef::ScreenName(name) => ("screen_name", name.clone()),
    }
  }

  pub fn is_id(&self) -> bool {
    matches!(self, UserRef::Id(_))
  }
}

impl fmt::Display for UserRef {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      UserRef::Id(id) => write!(f, "{}", id),
      UserRef::ScreenName(name) => f.write_str(name),
    }
  }
}

/// One cursor page of `followers/ids` or `friends/ids`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FollowIdsPage {
  #[serde(default)]
  pub ids: Vec<u64>,
  /// Zero once the last page is reached
  pub next_cursor: i64,
  #[serde(default)]
  pub previous_cursor: i64,
}

/// User object as returned by `users/lookup`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawUser {
  pub id: u64,
  pub screen_name: String,
  #[serde(default)]
  pub followers_count: u64,
  #[serde(default)]
  pub friends_count: u64,
  #[serde(default)]
  pub created_at: String,
  #[serde(default)]
  pub description: Option<String>,
  #[serde(default)]
  pub url: Option<String>,
  #[serde(default)]
  pub location: Option<String>,
}

/// Profile row stored for a looked up user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserInfo {
  pub user_id: u64,
  pub user_name: String,
  pub followers_count: u64,
  pub followings_count: u64,
  pub user_created_at: String,
  pub user_description: Option<String>,
  pub user_link: Option<String>,
  pub user_location: Option<String>,
}

impl From<RawUser> for UserInfo {
  fn from(raw: RawUser) -> Self {
    UserInfo {
      user_id: raw.id,
      user_name: raw.screen_name,
      followers_count: raw.followers_count,
      followings_count: raw.friends_count,
      user_created_at: raw.created_at,
      user_description: raw.description,
      user_link: raw.url,
      user_location: raw.location,
    }
  }
}

/// Directed follow relationship, the follower follows the followee
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FollowEdge {
  pub twitter_followee_id: String,
  pub twitter_follower_id: String,
}

/// Rate limit window of one endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitWindow {
  pub limit: u32,
  pub remaining: u32,
  /// Unix time the window resets at
  pub reset: i64,
}

/// `application/rate_limit_status` response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateLimitStatus {
  pub resources: HashMap<String, HashMap<String, RateLimitWindow>>,
}

impl RateLimitStatus {
  pub fn window(&self, family: &str, endpoint: &str) -> Option<RateLimitWindow> {
    self.resources.get(family)?.get(endpoint).copied()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_user_ref_untagged() {
    let refs: Vec<UserRef> = serde_json::from_str(r#"[320524842, "jack"]"#).unwrap();
    assert_eq!(refs[0], UserRef::Id(320524842));
    assert_eq!(refs[1], UserRef::ScreenName("jack".to_string()));
    assert_eq!(refs[0].query_pair(), ("user_id", "320524842".to_string()));
    assert_eq!(refs[1].query_pair(), ("screen_name", "jack".to_string()));
  }

  #[test]
  fn test_raw_user_renamed() {
    let raw: RawUser = serde_json::from_str(
      r#"{"id":12,"screen_name":"jack","followers_count":10,"friends_count":3,"created_at":"Tue Mar 21 20:50:14 +0000 2006","description":"just setting up","url":null,"location":"SF"}"#,
    )
    .unwrap();
    let info = UserInfo::from(raw);
    assert_eq!(info.user_id, 12);
    assert_eq!(info.user_name, "jack");
    assert_eq!(info.followings_count, 3);
    assert_eq!(info.user_link, None);
    assert_eq!(info.user_location.as_deref(), Some("SF"));
  }

  #[test]
  fn test_rate_limit_status_window() {
    let status: RateLimitStatus = serde_json::from_str(
      r#"{"resources":{"followers":{"/followers/ids":{"limit":15,"remaining":0,"reset":1635351540}}}}"#,
    )
    .unwrap();
    let window = status.window("followers", "/followers/ids").unwrap();
    assert_eq!(window.reset, 1635351540);
    assert!(status.window("friends", "/friends/ids").is_none());
  }
}
