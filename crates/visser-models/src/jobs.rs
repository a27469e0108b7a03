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

//! Request parameters and job metadata of the REST facade

use chrono::Local;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use visser_core::{Error, Instrument, Resolution, Result, WriteType};

use crate::twitter::UserRef;

/// Record of one completed extraction job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobMetadata {
  pub user: String,
  /// Endpoint path, e.g. `twitter/followers`
  pub end_point: String,
  /// `%Y-%m-%d %H:%M`
  pub date_extracted: String,
  pub job_id: String,
  pub write_type: String,
  pub job_description: serde_json::Value,
  pub time_elapsed_seconds: u64,
  pub write_path: String,
}

impl JobMetadata {
  /// `endpoint` is the storage name, `twitter_followers` becomes `twitter/followers`.
  pub fn new(
    user: &str,
    endpoint: &str,
    write_type: WriteType,
    job_description: serde_json::Value,
    time_elapsed_seconds: u64,
    write_path: &str,
  ) -> Self {
    JobMetadata {
      user: user.to_string(),
      end_point: endpoint.replace('_', "/"),
      date_extracted: Local::now().format("%Y-%m-%d %H:%M").to_string(),
      job_id: Uuid::new_v4().to_string(),
      write_type: write_type.to_string(),
      job_description,
      time_elapsed_seconds,
      write_path: write_path.to_string(),
    }
  }
}

/// Job metadata plus the rows when the caller asked for them back
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobResponse<T> {
  #[serde(flatten)]
  pub metadata: JobMetadata,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub data: Option<Vec<T>>,
}

/// `historical_trading_metadata` document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalTradingMetadata {
  #[serde(rename = "_id")]
  pub id: String,
  pub ticker: String,
  pub from_date: String,
  pub to_date: String,
  pub resolution: String,
  pub instrument: String,
  pub write_path: String,
}

/// A user id sent either as a JSON number or as a numeric string
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FlexibleId {
  Number(u64),
  Text(String),
}

impl FlexibleId {
  pub fn as_u64(&self) -> Result<u64> {
    match self {
      FlexibleId::Number(id) => Ok(*id),
      FlexibleId::Text(text) => text
        .trim()
        .parse()
        .map_err(|_| Error::InvalidParameter(format!("'{}' is not a numeric user id", text))),
    }
  }
}

fn user_refs(user_ids: &Option<Vec<FlexibleId>>, screen_names: &Option<Vec<String>>) -> Result<Option<Vec<UserRef>>> {
  match (user_ids, screen_names) {
    (Some(ids), _) if !ids.is_empty() => {
      ids.iter().map(|id| id.as_u64().map(UserRef::Id)).collect::<Result<Vec<_>>>().map(Some)
    }
    (_, Some(names)) if !names.is_empty() => {
      Ok(Some(names.iter().map(|name| UserRef::ScreenName(name.trim().to_string())).collect()))
    }
    _ => Ok(None),
  }
}

fn count(list: &Option<Vec<impl Sized>>) -> usize {
  list.as_ref().map(Vec::len).unwrap_or(0)
}

/// Body of `/api/twitter/followers` and `/api/twitter/followings`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FollowsParams {
  #[serde(default)]
  pub user_ids: Option<Vec<FlexibleId>>,
  #[serde(default)]
  pub screen_names: Option<Vec<String>>,
  #[serde(default)]
  pub chunk_size: Option<usize>,
  /// Stop a user's extraction once this many ids are collected
  #[serde(default)]
  pub upper_limit: Option<usize>,
  #[serde(default)]
  pub write_type: Option<WriteType>,
}

impl FollowsParams {
  /// Users to crawl, ids taking precedence. `None` when neither list is given.
  pub fn user_refs(&self) -> Result<Option<Vec<UserRef>>> {
    user_refs(&self.user_ids, &self.screen_names)
  }

  pub fn users_requested(&self) -> usize {
    count(&self.user_ids) + count(&self.screen_names)
  }
}

/// Body of `/api/twitter/users`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UsersParams {
  #[serde(default)]
  pub user_ids: Option<Vec<FlexibleId>>,
  #[serde(default)]
  pub screen_names: Option<Vec<String>>,
  #[serde(default)]
  pub chunk_size: Option<usize>,
  #[serde(default)]
  pub write_type: Option<WriteType>,
}

impl UsersParams {
  pub fn user_refs(&self) -> Result<Option<Vec<UserRef>>> {
    user_refs(&self.user_ids, &self.screen_names)
  }

  pub fn users_requested(&self) -> usize {
    count(&self.user_ids) + count(&self.screen_names)
  }
}

fn default_ticker() -> String {
  "NFLX".to_string()
}

fn default_from_date() -> String {
  "2021-01-01".to_string()
}

fn default_resolution() -> Resolution {
  Resolution::Month
}

/// Body of `/api/trading/historical`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalDataParams {
  #[serde(default = "default_ticker")]
  pub ticker: String,
  /// `%Y-%m-%d`
  #[serde(default = "default_from_date")]
  pub from_date: String,
  /// `%Y-%m-%d`, today when absent
  #[serde(default)]
  pub to_date: Option<String>,
  #[serde(default = "default_resolution")]
  pub resolution: Resolution,
  #[serde(default)]
  pub instrument: Instrument,
  #[serde(default)]
  pub write_type: Option<WriteType>,
}

impl Default for HistoricalDataParams {
  fn default() -> Self {
    HistoricalDataParams {
      ticker: default_ticker(),
      from_date: default_from_date(),
      to_date: None,
      resolution: default_resolution(),
      instrument: Instrument::default(),
      write_type: None,
    }
  }
}

impl HistoricalDataParams {
  /// Upper bound of the request, defaulting to today
  pub fn resolved_to_date(&self) -> String {
    self.to_date.clone().unwrap_or_else(|| Local::now().format("%Y-%m-%d").to_string())
  }
}

fn default_past_days() -> i64 {
  30
}

fn default_agent() -> String {
  "user".to_string()
}

/// Body of `/api/wiki/pageviews`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageviewParams {
  pub titles: Vec<String>,
  #[serde(default = "default_past_days")]
  pub past_days: i64,
  /// all-agents, user, spider or automated
  #[serde(default = "default_agent")]
  pub agent: String,
  #[serde(default)]
  pub write_type: Option<WriteType>,
}

/// Query of `/api/agriculture/esr/exports`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportsQuery {
  /// Commodity name (`Corn`) or numeric code (`401`)
  pub commodity: String,
  #[serde(default)]
  pub market_year: Option<i32>,
  #[serde(default)]
  pub country_code: Option<i64>,
  #[serde(default)]
  pub write_type: Option<WriteType>,
}

/// Query carrying only a write type
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WriteTypeQuery {
  #[serde(default)]
  pub write_type: Option<WriteType>,
}

/// Query of `/api/trading/crypto/symbols`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CryptoSymbolsQuery {
  #[serde(default)]
  pub exchange: Option<String>,
  #[serde(default)]
  pub write_type: Option<WriteType>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenResponse {
  pub access_token: String,
  pub token_type: String,
}

impl TokenResponse {
  pub fn bearer(access_token: String) -> Self {
    TokenResponse { access_token, token_type: "bearer".to_string() }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use pretty_assertions::assert_eq;

  #[test]
  fn test_job_metadata_endpoint_path() {
    let meta = JobMetadata::new(
      "james201",
      "twitter_followers",
      WriteType::LocalStorage,
      serde_json::json!({"users_requested": 2}),
      4,
      "resources/documents/twitter/output/followers/20220102",
    );
    assert_eq!(meta.end_point, "twitter/followers");
    assert_eq!(meta.write_type, "localstorage");
    assert_eq!(meta.date_extracted.len(), "2022-01-02 05:05".len());
    assert!(Uuid::parse_str(&meta.job_id).is_ok());
  }

  #[test]
  fn test_job_response_flattens_metadata() {
    let meta = JobMetadata::new("u", "agriculture_ethanolprod", WriteType::Return, serde_json::json!({}), 0, "");
    let response = JobResponse { metadata: meta, data: Some(vec![1, 2]) };
    let value = serde_json::to_value(&response).unwrap();
    assert_eq!(value["end_point"], "agriculture/ethanolprod");
    assert_eq!(value["data"], serde_json::json!([1, 2]));

    let without: JobResponse<u8> = JobResponse { metadata: response.metadata, data: None };
    assert!(serde_json::to_value(&without).unwrap().get("data").is_none());
  }

  #[test]
  fn test_follows_params_precedence() {
    let params: FollowsParams =
      serde_json::from_str(r#"{"user_ids":["320524842", 985839765693059072],"screen_names":["jack"]}"#).unwrap();
    let refs = params.user_refs().unwrap().unwrap();
    assert_eq!(refs, vec![UserRef::Id(320524842), UserRef::Id(985839765693059072)]);
    assert_eq!(params.users_requested(), 3);
  }

  #[test]
  fn test_follows_params_undefined() {
    let params: FollowsParams = serde_json::from_str(r#"{"user_ids":[],"screen_names":null}"#).unwrap();
    assert_eq!(params.user_refs().unwrap(), None);

    let names: FollowsParams = serde_json::from_str(r#"{"screen_names":[" jack "]}"#).unwrap();
    assert_eq!(names.user_refs().unwrap(), Some(vec![UserRef::ScreenName("jack".to_string())]));
  }

  #[test]
  fn test_follows_params_bad_id() {
    let params: FollowsParams = serde_json::from_str(r#"{"user_ids":["abc"]}"#).unwrap();
    assert!(params.user_refs().is_err());
  }

  #[test]
  fn test_historical_params_defaults() {
    let params: HistoricalDataParams = serde_json::from_str("{}").unwrap();
    assert_eq!(params.ticker, "NFLX");
    assert_eq!(params.from_date, "2021-01-01");
    assert_eq!(params.resolution, Resolution::Month);
    assert_eq!(params.instrument, Instrument::Stock);
    assert_eq!(params.resolved_to_date().len(), 10);
  }

  #[test]
  fn test_historical_params_rejects_bad_resolution() {
    assert!(serde_json::from_str::<HistoricalDataParams>(r#"{"resolution":"5D"}"#).is_err());
  }

  #[test]
  fn test_pageview_params_defaults() {
    let params: PageviewParams = serde_json::from_str(r#"{"titles":["Apple_Inc."]}"#).unwrap();
    assert_eq!(params.past_days, 30);
    assert_eq!(params.agent, "user");
  }
}
