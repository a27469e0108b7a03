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

//! AlphaVantage intraday history with a rotating key ring

use super::impl_endpoint_base;
use crate::transport::Transport;
use chrono::{Datelike, Months, NaiveDate};
use std::sync::{Arc, Mutex};
use tracing::{debug, instrument, warn};
use visser_core::{Error, Resolution, Result, TransportSettings, ALPHA_VANTAGE_BASE_URL};
use visser_models::trading::{Candle, IntradayCsvRow};

/// Most months fetched for one request, counted back from the end date
pub const MAX_INTRADAY_MONTHS: usize = 24;

/// Keys are handed out round-robin; a rate limited key moves the ring on.
#[derive(Debug)]
struct KeyRing {
  keys: Vec<String>,
  position: usize,
}

impl KeyRing {
  fn current(&self) -> String {
    self.keys[self.position % self.keys.len()].clone()
  }

  fn rotate(&mut self) {
    self.position = (self.position + 1) % self.keys.len();
  }
}

/// Outcome of one keyed request
enum Body {
  Rows(Vec<Candle>),
  Throttled(String),
}

/// AlphaVantage `TIME_SERIES_INTRADAY` in CSV form
pub struct AlphaVantageEndpoints {
  transport: Arc<Transport>,
  keys: Mutex<KeyRing>,
}

impl_endpoint_base!(AlphaVantageEndpoints);

impl AlphaVantageEndpoints {
  pub fn new(keys: Vec<String>, settings: &TransportSettings) -> Result<Self> {
    Self::with_base_url(ALPHA_VANTAGE_BASE_URL, keys, settings)
  }

  pub fn with_base_url(base_url: &str, keys: Vec<String>, settings: &TransportSettings) -> Result<Self> {
    let keys: Vec<String> = keys.into_iter().filter(|k| !k.trim().is_empty()).collect();
    if keys.is_empty() {
      return Err(Error::ApiKey("ALPHA_VANTAGE_API_KEY not set".to_string()));
    }

    Ok(Self { transport: Arc::new(Transport::new(base_url, settings)?), keys: Mutex::new(KeyRing { keys, position: 0 }) })
  }

  pub fn key_count(&self) -> usize {
    self.keys.lock().map(|ring| ring.keys.len()).unwrap_or(1)
  }

  fn current_key(&self) -> Result<String> {
    self.keys.lock().map(|ring| ring.current()).map_err(|_| Error::Config("AlphaVantage key ring poisoned".to_string()))
  }

  fn rotate_key(&self) {
    if let Ok(mut ring) = self.keys.lock() {
      ring.rotate();
    }
  }

  /// One month of intraday bars, newest first as returned upstream
  ///
  /// Each key of the ring is tried once; when all of them are throttled the
  /// call fails with [`Error::RateLimit`].
  #[instrument(skip(self))]
  pub async fn intraday_month(&self, symbol: &str, interval: &str, month: &str) -> Result<Vec<Candle>> {
    for attempt in 0..self.key_count() {
      let key = self.current_key()?;
      let result = self
        .transport
        .get_text(
          "/query",
          &[
            ("function", "TIME_SERIES_INTRADAY".to_string()),
            ("symbol", symbol.to_string()),
            ("interval", interval.to_string()),
            ("month", month.to_string()),
            ("outputsize", "full".to_string()),
            ("datatype", "csv".to_string()),
            ("apikey", key),
          ],
        )
        .await;

      let reason = match result {
        Ok(text) => match parse_intraday_csv(&text, symbol)? {
          Body::Rows(rows) => return Ok(rows),
          Body::Throttled(reason) => reason,
        },
        Err(Error::RateLimit(reason)) => reason,
        Err(e) => return Err(e),
      };

      warn!("AlphaVantage key {} throttled ({}), rotating", attempt + 1, reason);
      self.rotate_key();
    }

    Err(Error::RateLimit("API call frequency limit hit.".to_string()))
  }

  /// Intraday bars between two dates, oldest first
  #[instrument(skip(self), fields(resolution = %resolution))]
  pub async fn historical(
    &self,
    symbol: &str,
    resolution: Resolution,
    from: NaiveDate,
    to: NaiveDate,
  ) -> Result<Vec<Candle>> {
    let interval = resolution.alphavantage_interval().ok_or_else(|| {
      Error::InvalidParameter(format!("Resolution {} is not served by AlphaVantage", resolution))
    })?;

    let mut candles = Vec::new();
    for month in month_range(from, to) {
      debug!("Fetching {} {} for {}", symbol, interval, month);
      candles.extend(self.intraday_month(symbol, &interval, &month).await?);
    }

    let (lower, upper) = (from.format("%Y-%m-%d").to_string(), to.format("%Y-%m-%d").to_string());
    candles.retain(|c| {
      let day = c.date.get(..10).unwrap_or(&c.date);
      day >= lower.as_str() && day <= upper.as_str()
    });
    candles.sort_by(|a, b| a.date.cmp(&b.date));
    Ok(candles)
  }
}

/// `YYYY-MM` of every month touched by the range, at most [`MAX_INTRADAY_MONTHS`]
pub fn month_range(from: NaiveDate, to: NaiveDate) -> Vec<String> {
  let mut months = Vec::new();
  let Some(mut cursor) = NaiveDate::from_ymd_opt(from.year(), from.month(), 1) else {
    return months;
  };

  while cursor <= to {
    months.push(cursor.format("%Y-%m").to_string());
    match cursor.checked_add_months(Months::new(1)) {
      Some(next) => cursor = next,
      None => break,
    }
  }

  let skip = months.len().saturating_sub(MAX_INTRADAY_MONTHS);
  months.split_off(skip)
}

/// Error payloads come back as JSON even when CSV was requested.
fn parse_intraday_csv(text: &str, symbol: &str) -> Result<Body> {
  let trimmed = text.trim_start();
  if trimmed.is_empty() {
    return Ok(Body::Throttled("empty response".to_string()));
  }

  if trimmed.starts_with('{') {
    let payload: serde_json::Value = serde_json::from_str(trimmed)?;
    if let Some(message) = payload.get("Error Message").and_then(|m| m.as_str()) {
      return Err(Error::Api(message.to_string()));
    }
    let reason = ["Note", "Information"]
      .iter()
      .find_map(|field| payload.get(*field).and_then(|m| m.as_str()))
      .unwrap_or("unexpected JSON payload");
    return Ok(Body::Throttled(reason.to_string()));
  }

  let mut reader = csv::Reader::from_reader(trimmed.as_bytes());
  let rows = reader
    .deserialize::<IntradayCsvRow>()
    .map(|row| row.map(|r| r.into_candle(symbol)))
    .collect::<std::result::Result<Vec<_>, _>>()
    .map_err(|e| Error::Parse(format!("Invalid intraday CSV: {}", e)))?;

  Ok(Body::Rows(rows))
}

#[cfg(test)]
mod tests {
  use super::*;
  use pretty_assertions::assert_eq;
  use wiremock::matchers::{path, query_param};
  use wiremock::{Mock, MockServer, ResponseTemplate};

  const CSV: &str = "timestamp,open,high,low,close,volume\n\
    2021-02-02 10:00:00,540.1,541.0,539.5,540.7,1200\n\
    2021-02-01 09:30:00,532.0,533.2,531.1,532.9,3400\n";

  const NOTE: &str = r#"{"Note": "Thank you for using Alpha Vantage! Our standard API call frequency is 5 calls per minute"}"#;

  fn settings() -> TransportSettings {
    TransportSettings { rate_limit: 600, timeout_secs: 5, max_retries: 0 }
  }

  fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
  }

  #[test]
  fn test_requires_a_key() {
    assert!(matches!(AlphaVantageEndpoints::new(vec![" ".to_string()], &settings()), Err(Error::ApiKey(_))));
  }

  #[test]
  fn test_month_range() {
    assert_eq!(month_range(date(2021, 11, 15), date(2022, 2, 1)), vec!["2021-11", "2021-12", "2022-01", "2022-02"]);
    assert!(month_range(date(2022, 3, 1), date(2022, 2, 1)).is_empty());

    let long = month_range(date(2015, 1, 1), date(2022, 6, 30));
    assert_eq!(long.len(), MAX_INTRADAY_MONTHS);
    assert_eq!(long.last().map(String::as_str), Some("2022-06"));
  }

  #[test]
  fn test_parse_error_message() {
    let err = parse_intraday_csv(r#"{"Error Message": "Invalid API call."}"#, "X").err().unwrap();
    assert!(matches!(err, Error::Api(_)));
  }

  #[test]
  fn test_parse_header_only_is_empty() {
    match parse_intraday_csv("timestamp,open,high,low,close,volume\n", "X").unwrap() {
      Body::Rows(rows) => assert!(rows.is_empty()),
      Body::Throttled(_) => panic!("header only CSV is not a throttle"),
    }
  }

  #[tokio::test]
  async fn test_rotates_key_on_note() {
    let server = MockServer::start().await;
    Mock::given(path("/query"))
      .and(query_param("apikey", "first"))
      .respond_with(ResponseTemplate::new(200).set_body_string(NOTE))
      .expect(1)
      .mount(&server)
      .await;
    Mock::given(path("/query"))
      .and(query_param("apikey", "second"))
      .and(query_param("function", "TIME_SERIES_INTRADAY"))
      .and(query_param("month", "2021-02"))
      .and(query_param("datatype", "csv"))
      .respond_with(ResponseTemplate::new(200).set_body_string(CSV))
      .expect(1)
      .mount(&server)
      .await;

    let av = AlphaVantageEndpoints::with_base_url(&server.uri(), vec!["first".into(), "second".into()], &settings())
      .unwrap();
    let candles = av.historical("NFLX", Resolution::Minute(5), date(2021, 2, 1), date(2021, 2, 28)).await.unwrap();

    assert_eq!(candles.len(), 2);
    assert_eq!(candles[0].date, "2021-02-01 09:30:00");
    assert_eq!(candles[1].symbol, "NFLX");
  }

  #[tokio::test]
  async fn test_all_keys_throttled() {
    let server = MockServer::start().await;
    Mock::given(path("/query")).respond_with(ResponseTemplate::new(429)).expect(3).mount(&server).await;

    let keys = vec!["a".to_string(), "b".to_string(), "c".to_string()];
    let av = AlphaVantageEndpoints::with_base_url(&server.uri(), keys, &settings()).unwrap();
    let result = av.intraday_month("NFLX", "60min", "2021-02").await;
    assert!(matches!(result, Err(Error::RateLimit(_))));
  }

  #[tokio::test]
  async fn test_filters_to_requested_days() {
    let server = MockServer::start().await;
    Mock::given(path("/query")).respond_with(ResponseTemplate::new(200).set_body_string(CSV)).mount(&server).await;

    let av = AlphaVantageEndpoints::with_base_url(&server.uri(), vec!["k".into()], &settings()).unwrap();
    let candles = av.historical("NFLX", Resolution::Hour, date(2021, 2, 2), date(2021, 2, 2)).await.unwrap();
    assert_eq!(candles.len(), 1);
    assert_eq!(candles[0].close, 540.7);
  }

  #[tokio::test]
  async fn test_rejects_daily_resolution() {
    let av = AlphaVantageEndpoints::new(vec!["k".into()], &settings()).unwrap();
    let result = av.historical("NFLX", Resolution::Day, date(2021, 2, 2), date(2021, 2, 2)).await;
    assert!(matches!(result, Err(Error::InvalidParameter(_))));
  }
}
