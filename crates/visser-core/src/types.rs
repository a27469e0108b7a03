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

//! Shared domain types: deployment environment, write targets, market
//! resolutions and instruments, and twitter relationship kinds.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Deployment environment, read from `ENVIRONMENT`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
  #[default]
  Dev,
  Prod,
}

impl fmt::Display for Environment {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Environment::Dev => write!(f, "dev"),
      Environment::Prod => write!(f, "prod"),
    }
  }
}

impl FromStr for Environment {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    match s.trim().to_lowercase().as_str() {
      "dev" | "development" => Ok(Environment::Dev),
      "prod" | "production" => Ok(Environment::Prod),
      other => Err(Error::Config(format!("Unknown ENVIRONMENT '{}', expected dev or prod", other))),
    }
  }
}

/// Where the output of a job goes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum WriteType {
  /// Hand the rows back in the response body
  Return,
  /// Tab separated files under the local storage root
  LocalStorage,
  /// Objects in the configured cloud bucket
  CloudStorage,
  /// Documents in the document store
  DatabaseStorage,
}

impl WriteType {
  pub fn as_str(&self) -> &'static str {
    match self {
      WriteType::Return => "return",
      WriteType::LocalStorage => "localstorage",
      WriteType::CloudStorage => "cloudstorage",
      WriteType::DatabaseStorage => "databasestorage",
    }
  }

  /// Write type used when a request does not name one
  pub fn default_for(environment: Environment) -> Self {
    match environment {
      Environment::Dev => WriteType::LocalStorage,
      Environment::Prod => WriteType::CloudStorage,
    }
  }

  /// Local writes are refused in production
  pub fn ensure_allowed(&self, environment: Environment) -> Result<()> {
    match (environment, self) {
      (Environment::Prod, WriteType::LocalStorage) => Err(Error::InvalidParameter(
        "Ensure write type is either databasestorage or cloudstorage".to_string(),
      )),
      _ => Ok(()),
    }
  }
}

impl fmt::Display for WriteType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for WriteType {
  type Err = Error;

  /// Punctuation, whitespace and case are ignored, so `Local-Storage` parses.
  fn from_str(s: &str) -> Result<Self> {
    let normalised: String = s
      .chars()
      .filter(|c| !c.is_ascii_punctuation() && !c.is_whitespace())
      .collect::<String>()
      .to_lowercase();

    match normalised.as_str() {
      "return" => Ok(WriteType::Return),
      "localstorage" => Ok(WriteType::LocalStorage),
      "cloudstorage" => Ok(WriteType::CloudStorage),
      "databasestorage" => Ok(WriteType::DatabaseStorage),
      _ => Err(Error::InvalidParameter(format!(
        "Write type '{}' is invalid, write type should be either return, localstorage, databasestorage or cloudstorage",
        s
      ))),
    }
  }
}

impl TryFrom<String> for WriteType {
  type Error = Error;

  fn try_from(value: String) -> Result<Self> {
    value.parse()
  }
}

impl From<WriteType> for String {
  fn from(value: WriteType) -> Self {
    value.as_str().to_string()
  }
}

/// Financial instrument class of a ticker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(try_from = "String", into = "String")]
pub enum Instrument {
  #[default]
  Stock,
  Forex,
  Crypto,
}

impl Instrument {
  pub fn as_str(&self) -> &'static str {
    match self {
      Instrument::Stock => "stock",
      Instrument::Forex => "forex",
      Instrument::Crypto => "crypto",
    }
  }
}

impl fmt::Display for Instrument {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for Instrument {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    match s.trim().to_lowercase().as_str() {
      "stock" | "stocks" | "equity" => Ok(Instrument::Stock),
      "forex" | "fx" => Ok(Instrument::Forex),
      "crypto" | "cryptocurrency" => Ok(Instrument::Crypto),
      other => Err(Error::InvalidParameter(format!(
        "Instrument '{}' is not supported, expected stock, forex or crypto",
        other
      ))),
    }
  }
}

impl TryFrom<String> for Instrument {
  type Error = Error;

  fn try_from(value: String) -> Result<Self> {
    value.parse()
  }
}

impl From<Instrument> for String {
  fn from(value: Instrument) -> Self {
    value.as_str().to_string()
  }
}

/// Upstream market data provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Provider {
  AlphaVantage,
  Finnhub,
  CoinApi,
}

impl fmt::Display for Provider {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Provider::AlphaVantage => write!(f, "alphavantage"),
      Provider::Finnhub => write!(f, "finnhub"),
      Provider::CoinApi => write!(f, "coinapi"),
    }
  }
}

/// Bar size of historical price data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Resolution {
  /// Intraday bars of 1, 5, 15 or 30 minutes
  Minute(u32),
  Hour,
  Day,
  Week,
  Month,
}

pub const SUPPORTED_RESOLUTIONS: &str = "1MIN, 5MIN, 15MIN, 30MIN, 1H, D, W, M";

impl Resolution {
  /// Intraday bars come from AlphaVantage, daily and longer from Finnhub.
  pub fn provider(&self) -> Provider {
    match self {
      Resolution::Minute(_) | Resolution::Hour => Provider::AlphaVantage,
      Resolution::Day | Resolution::Week | Resolution::Month => Provider::Finnhub,
    }
  }

  pub fn is_intraday(&self) -> bool {
    self.provider() == Provider::AlphaVantage
  }

  /// AlphaVantage `interval` parameter, intraday only
  pub fn alphavantage_interval(&self) -> Option<String> {
    match self {
      Resolution::Minute(m) => Some(format!("{}min", m)),
      Resolution::Hour => Some("60min".to_string()),
      _ => None,
    }
  }

  /// Finnhub `resolution` parameter
  pub fn finnhub_code(&self) -> String {
    match self {
      Resolution::Minute(m) => m.to_string(),
      Resolution::Hour => "60".to_string(),
      Resolution::Day => "D".to_string(),
      Resolution::Week => "W".to_string(),
      Resolution::Month => "M".to_string(),
    }
  }

  /// CoinAPI `period_id` parameter
  pub fn coinapi_period(&self) -> String {
    match self {
      Resolution::Minute(m) => format!("{}MIN", m),
      Resolution::Hour => "1HRS".to_string(),
      Resolution::Day => "1DAY".to_string(),
      Resolution::Week => "7DAY".to_string(),
      Resolution::Month => "1MTH".to_string(),
    }
  }
}

impl fmt::Display for Resolution {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Resolution::Minute(m) => write!(f, "{}MIN", m),
      Resolution::Hour => write!(f, "1H"),
      Resolution::Day => write!(f, "1D"),
      Resolution::Week => write!(f, "1W"),
      Resolution::Month => write!(f, "1M"),
    }
  }
}

impl FromStr for Resolution {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    match s.trim().to_uppercase().as_str() {
      "1MIN" => Ok(Resolution::Minute(1)),
      "5MIN" => Ok(Resolution::Minute(5)),
      "15MIN" => Ok(Resolution::Minute(15)),
      "30MIN" => Ok(Resolution::Minute(30)),
      "1H" | "60MIN" => Ok(Resolution::Hour),
      "D" | "1D" => Ok(Resolution::Day),
      "W" | "1W" => Ok(Resolution::Week),
      "M" | "1M" => Ok(Resolution::Month),
      _ => Err(Error::InvalidParameter(format!(
        "Resolution '{}' is not supported. Supported resolutions are {}",
        s, SUPPORTED_RESOLUTIONS
      ))),
    }
  }
}

impl TryFrom<String> for Resolution {
  type Error = Error;

  fn try_from(value: String) -> Result<Self> {
    value.parse()
  }
}

impl From<Resolution> for String {
  fn from(value: Resolution) -> Self {
    value.to_string()
  }
}

/// Direction of a twitter follow relationship
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationshipType {
  /// Accounts following the user
  Followers,
  /// Accounts the user follows
  Followings,
}

impl RelationshipType {
  pub fn as_str(&self) -> &'static str {
    match self {
      RelationshipType::Followers => "followers",
      RelationshipType::Followings => "followings",
    }
  }

  /// Storage endpoint name, `twitter_followers` or `twitter_followings`
  pub fn endpoint(&self) -> &'static str {
    match self {
      RelationshipType::Followers => "twitter_followers",
      RelationshipType::Followings => "twitter_followings",
    }
  }

  /// Default chunk size of the produced edge list
  pub fn default_chunk_size(&self) -> Option<usize> {
    match self {
      RelationshipType::Followers => None,
      RelationshipType::Followings => Some(10_000),
    }
  }
}

impl fmt::Display for RelationshipType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use pretty_assertions::assert_eq;

  #[test]
  fn test_write_type_lenient_parse() {
    assert_eq!("Local-Storage".parse::<WriteType>().unwrap(), WriteType::LocalStorage);
    assert_eq!(" cloud_storage ".parse::<WriteType>().unwrap(), WriteType::CloudStorage);
    assert_eq!("DATABASESTORAGE".parse::<WriteType>().unwrap(), WriteType::DatabaseStorage);
    assert_eq!("return".parse::<WriteType>().unwrap(), WriteType::Return);
    assert!("mongodb".parse::<WriteType>().is_err());
  }

  #[test]
  fn test_write_type_environment_rules() {
    assert!(WriteType::LocalStorage.ensure_allowed(Environment::Dev).is_ok());
    assert!(WriteType::LocalStorage.ensure_allowed(Environment::Prod).is_err());
    assert!(WriteType::CloudStorage.ensure_allowed(Environment::Prod).is_ok());
    assert!(WriteType::DatabaseStorage.ensure_allowed(Environment::Prod).is_ok());
    assert!(WriteType::Return.ensure_allowed(Environment::Prod).is_ok());
  }

  #[test]
  fn test_write_type_serde() {
    let wt: WriteType = serde_json::from_str("\"Cloud Storage\"").unwrap();
    assert_eq!(wt, WriteType::CloudStorage);
    assert_eq!(serde_json::to_string(&wt).unwrap(), "\"cloudstorage\"");
  }

  #[test]
  fn test_default_write_type() {
    assert_eq!(WriteType::default_for(Environment::Dev), WriteType::LocalStorage);
    assert_eq!(WriteType::default_for(Environment::Prod), WriteType::CloudStorage);
  }

  #[test]
  fn test_resolution_parse_and_route() {
    assert_eq!("5min".parse::<Resolution>().unwrap(), Resolution::Minute(5));
    assert_eq!(" 1h ".parse::<Resolution>().unwrap(), Resolution::Hour);
    assert_eq!("D".parse::<Resolution>().unwrap(), Resolution::Day);
    assert_eq!("1M".parse::<Resolution>().unwrap(), Resolution::Month);
    assert_eq!(Resolution::Minute(15).provider(), Provider::AlphaVantage);
    assert_eq!(Resolution::Hour.provider(), Provider::AlphaVantage);
    assert_eq!(Resolution::Week.provider(), Provider::Finnhub);
  }

  #[test]
  fn test_resolution_rejects_unsupported() {
    let err = "5D".parse::<Resolution>().unwrap_err();
    assert!(err.to_string().contains("1MIN, 5MIN"));
    assert!("2MIN".parse::<Resolution>().is_err());
  }

  #[test]
  fn test_resolution_codes() {
    assert_eq!(Resolution::Minute(30).alphavantage_interval().as_deref(), Some("30min"));
    assert_eq!(Resolution::Hour.alphavantage_interval().as_deref(), Some("60min"));
    assert_eq!(Resolution::Day.alphavantage_interval(), None);
    assert_eq!(Resolution::Day.finnhub_code(), "D");
    assert_eq!(Resolution::Minute(5).coinapi_period(), "5MIN");
    assert_eq!(Resolution::Month.coinapi_period(), "1MTH");
    assert_eq!(Resolution::Minute(1).to_string(), "1MIN");
  }

  #[test]
  fn test_instrument_parse() {
    assert_eq!(" Crypto".parse::<Instrument>().unwrap(), Instrument::Crypto);
    assert_eq!("FOREX".parse::<Instrument>().unwrap(), Instrument::Forex);
    assert!("options".parse::<Instrument>().is_err());
  }

  #[test]
  fn test_relationship_endpoint() {
    assert_eq!(RelationshipType::Followers.endpoint(), "twitter_followers");
    assert_eq!(RelationshipType::Followings.default_chunk_size(), Some(10_000));
    assert_eq!(RelationshipType::Followers.default_chunk_size(), None);
  }

  #[test]
  fn test_environment_parse() {
    assert_eq!("PROD".parse::<Environment>().unwrap(), Environment::Prod);
    assert!("staging".parse::<Environment>().is_err());
  }
}
