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

//! Configuration management for the Visser service

use crate::error::{Error, Result};
use crate::types::Environment;
use dotenvy::dotenv;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

/// Outbound HTTP behaviour shared by every provider client
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TransportSettings {
  /// Requests per minute allowed per provider
  pub rate_limit: u32,

  /// Request timeout in seconds
  pub timeout_secs: u64,

  /// Maximum retries for failed requests
  pub max_retries: u32,
}

impl Default for TransportSettings {
  fn default() -> Self {
    Self { rate_limit: crate::DEFAULT_RATE_LIMIT, timeout_secs: 30, max_retries: 3 }
  }
}

/// Credentials for the upstream data providers
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ProviderKeys {
  pub finnhub: Option<String>,

  /// Key ring rotated on every AlphaVantage rate limit
  pub alpha_vantage: Vec<String>,

  pub coin_api: Option<String>,

  pub usda_fas: Option<String>,

  /// One bearer token per twitter application in the crawler pool
  pub twitter_bearer_tokens: Vec<String>,
}

/// Storage backends
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
  /// Root directory of local writes
  pub local_root: PathBuf,

  pub google_bucket: Option<String>,

  /// OAuth access token used for object uploads
  pub google_access_token: Option<String>,

  /// Postgres URL of the document store; in-memory store when absent
  pub database_url: Option<String>,
}

impl Default for StorageConfig {
  fn default() -> Self {
    Self {
      local_root: PathBuf::from(crate::DEFAULT_LOCAL_ROOT),
      google_bucket: None,
      google_access_token: None,
      database_url: None,
    }
  }
}

/// Main configuration struct
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
  pub environment: Environment,

  pub host: String,

  pub port: u16,

  /// Secret used to sign access tokens
  pub master_secret_key: String,

  /// Access token lifetime in hours
  pub access_key_lifetime_hours: i64,

  pub transport: TransportSettings,

  pub providers: ProviderKeys,

  pub storage: StorageConfig,
}

fn parsed_var<T: std::str::FromStr>(name: &str, default: &str) -> Result<T> {
  env::var(name)
    .unwrap_or_else(|_| default.to_string())
    .parse()
    .map_err(|_| Error::Config(format!("Invalid {}", name)))
}

fn optional_var(name: &str) -> Option<String> {
  env::var(name).ok().filter(|v| !v.trim().is_empty())
}

impl Config {
  /// Load configuration from environment variables
  pub fn from_env() -> Result<Self> {
    dotenv().ok();

    let environment: Environment = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string()).parse()?;

    let master_secret_key = optional_var("MASTER_SECRET_KEY")
      .ok_or_else(|| Error::ApiKey("MASTER_SECRET_KEY not set".to_string()))?;

    let access_key_lifetime_hours = parsed_var("ACCESS_KEY_LIFETIME", "24")?;
    let host = env::var("VISSER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port = parsed_var("VISSER_PORT", "1236")?;

    let transport = TransportSettings {
      rate_limit: parsed_var("VISSER_RATE_LIMIT", &crate::DEFAULT_RATE_LIMIT.to_string())?,
      timeout_secs: parsed_var("VISSER_TIMEOUT_SECS", "30")?,
      max_retries: parsed_var("VISSER_MAX_RETRIES", "3")?,
    };
    if transport.max_retries > crate::MAX_RETRIES {
      return Err(Error::Config(format!("VISSER_MAX_RETRIES must be at most {}", crate::MAX_RETRIES)));
    }

    let storage = StorageConfig {
      local_root: PathBuf::from(
        env::var("VISSER_LOCAL_ROOT").unwrap_or_else(|_| crate::DEFAULT_LOCAL_ROOT.to_string()),
      ),
      google_bucket: optional_var("GOOGLE_BUCKET_NAME"),
      google_access_token: optional_var("GOOGLE_ACCESS_TOKEN"),
      database_url: optional_var("DATABASE_URL"),
    };

    Ok(Config {
      environment,
      host,
      port,
      master_secret_key,
      access_key_lifetime_hours,
      transport,
      providers: Self::provider_keys_from_env()?,
      storage,
    })
  }

  fn provider_keys_from_env() -> Result<ProviderKeys> {
    let mut alpha_vantage: Vec<String> =
      (0..crate::MAX_ROTATING_KEYS).filter_map(|i| optional_var(&format!("ALPHA_VANTAGE_API_KEY_{}", i))).collect();
    if let Some(single) = optional_var("ALPHA_VANTAGE_API_KEY") {
      alpha_vantage.push(single);
    }

    let twitter_keys: usize = parsed_var("TWITTER_API_KEYS", &crate::DEFAULT_TWITTER_KEYS.to_string())?;
    let twitter_bearer_tokens =
      (1..=twitter_keys).filter_map(|i| optional_var(&format!("TWITTER_BEARER_TOKEN_{}", i))).collect();

    Ok(ProviderKeys {
      finnhub: optional_var("FINNHUB_API_KEY"),
      alpha_vantage,
      coin_api: optional_var("COIN_API_KEY"),
      usda_fas: optional_var("USDA_FAS_API_KEY"),
      twitter_bearer_tokens,
    })
  }

  /// Create a config with default values (for testing)
  pub fn default_with_secret(master_secret_key: String) -> Self {
    Config {
      environment: Environment::Dev,
      host: "127.0.0.1".to_string(),
      port: 1236,
      master_secret_key,
      access_key_lifetime_hours: 24,
      transport: TransportSettings::default(),
      providers: ProviderKeys::default(),
      storage: StorageConfig::default(),
    }
  }

  /// `host:port` the server binds to
  pub fn bind_address(&self) -> String {
    format!("{}:{}", self.host, self.port)
  }
}
