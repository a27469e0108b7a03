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

use crate::endpoints::{
  alphavantage::AlphaVantageEndpoints,
  coinapi::CoinApiEndpoints,
  eia::EiaEndpoints,
  finnhub::FinnhubEndpoints,
  twitter::{TwitterApi, TwitterHttpClient},
  usda::EsrEndpoints,
  wikipedia::WikipediaEndpoints,
};
use std::sync::Arc;
use tracing::info;
use visser_core::{Config, Error, Result, TransportSettings};

/// Handle on every upstream source the service reads from
///
/// Keyed providers are only built when their key is configured; asking for
/// one that is missing returns [`Error::ApiKey`]. Building the client makes
/// no network calls.
///
/// # Examples
///
/// ```ignore
/// use visser_client::VisserClient;
/// use visser_core::Config;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = Config::from_env()?;
///     let client = VisserClient::new(&config)?;
///
///     let symbols = client.finnhub()?.symbols().await?;
///     println!("{} symbols", symbols.len());
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct VisserClient {
  finnhub: Option<Arc<FinnhubEndpoints>>,
  alpha_vantage: Option<Arc<AlphaVantageEndpoints>>,
  coin_api: Option<Arc<CoinApiEndpoints>>,
  esr: Option<Arc<EsrEndpoints>>,
  eia: Arc<EiaEndpoints>,
  wikipedia: Arc<WikipediaEndpoints>,
  twitter: Vec<Arc<dyn TwitterApi>>,
}

impl VisserClient {
  /// Create a client for every source configured in `config`
  pub fn new(config: &Config) -> Result<Self> {
    let settings = &config.transport;
    let keys = &config.providers;

    let mut client = Self::keyless(settings)?;

    if let Some(key) = &keys.finnhub {
      client.finnhub = Some(Arc::new(FinnhubEndpoints::new(key, settings)?));
    }
    if !keys.alpha_vantage.is_empty() {
      client.alpha_vantage = Some(Arc::new(AlphaVantageEndpoints::new(keys.alpha_vantage.clone(), settings)?));
    }
    if let Some(key) = &keys.coin_api {
      client.coin_api = Some(Arc::new(CoinApiEndpoints::new(key, settings)?));
    }
    if let Some(key) = &keys.usda_fas {
      client.esr = Some(Arc::new(EsrEndpoints::new(key, settings)?));
    }
    for token in &keys.twitter_bearer_tokens {
      client.twitter.push(Arc::new(TwitterHttpClient::new(token, settings)?));
    }

    info!(
      "Upstream clients ready: finnhub={} alphavantage_keys={} coinapi={} esr={} twitter_apps={}",
      client.finnhub.is_some(),
      keys.alpha_vantage.len(),
      client.coin_api.is_some(),
      client.esr.is_some(),
      client.twitter.len()
    );

    Ok(client)
  }

  /// Client with only the sources that need no key
  pub fn keyless(settings: &TransportSettings) -> Result<Self> {
    Ok(Self {
      finnhub: None,
      alpha_vantage: None,
      coin_api: None,
      esr: None,
      eia: Arc::new(EiaEndpoints::new(settings)?),
      wikipedia: Arc::new(WikipediaEndpoints::new(settings)?),
      twitter: Vec::new(),
    })
  }

  pub fn finnhub(&self) -> Result<Arc<FinnhubEndpoints>> {
    self.finnhub.clone().ok_or_else(|| Error::ApiKey("FINNHUB_API_KEY not set".to_string()))
  }

  pub fn alpha_vantage(&self) -> Result<Arc<AlphaVantageEndpoints>> {
    self.alpha_vantage.clone().ok_or_else(|| Error::ApiKey("ALPHA_VANTAGE_API_KEY not set".to_string()))
  }

  pub fn coin_api(&self) -> Result<Arc<CoinApiEndpoints>> {
    self.coin_api.clone().ok_or_else(|| Error::ApiKey("COIN_API_KEY not set".to_string()))
  }

  pub fn esr(&self) -> Result<Arc<EsrEndpoints>> {
    self.esr.clone().ok_or_else(|| Error::ApiKey("USDA_FAS_API_KEY not set".to_string()))
  }

  pub fn eia(&self) -> Arc<EiaEndpoints> {
    self.eia.clone()
  }

  pub fn wikipedia(&self) -> Arc<WikipediaEndpoints> {
    self.wikipedia.clone()
  }

  /// Twitter application pool, one entry per bearer token
  pub fn twitter_pool(&self) -> Result<Vec<Arc<dyn TwitterApi>>> {
    if self.twitter.is_empty() {
      return Err(Error::Config("No twitter bearer tokens configured".to_string()));
    }
    Ok(self.twitter.clone())
  }

  pub fn with_finnhub(mut self, endpoints: FinnhubEndpoints) -> Self {
    self.finnhub = Some(Arc::new(endpoints));
    self
  }

  pub fn with_alpha_vantage(mut self, endpoints: AlphaVantageEndpoints) -> Self {
    self.alpha_vantage = Some(Arc::new(endpoints));
    self
  }

  pub fn with_coin_api(mut self, endpoints: CoinApiEndpoints) -> Self {
    self.coin_api = Some(Arc::new(endpoints));
    self
  }

  pub fn with_esr(mut self, endpoints: EsrEndpoints) -> Self {
    self.esr = Some(Arc::new(endpoints));
    self
  }

  pub fn with_eia(mut self, endpoints: EiaEndpoints) -> Self {
    self.eia = Arc::new(endpoints);
    self
  }

  pub fn with_wikipedia(mut self, endpoints: WikipediaEndpoints) -> Self {
    self.wikipedia = Arc::new(endpoints);
    self
  }

  /// Replace the twitter pool, e.g. with scripted clients
  pub fn with_twitter_pool(mut self, pool: Vec<Arc<dyn TwitterApi>>) -> Self {
    self.twitter = pool;
    self
  }
}
