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

//! Finnhub candles and symbol listings

use super::impl_endpoint_base;
use crate::transport::Transport;
use chrono::{Days, NaiveDate};
use std::sync::Arc;
use tracing::{info, instrument};
use visser_core::{Resolution, Result, TransportSettings, FINNHUB_BASE_URL};
use visser_models::trading::{Candle, CandleResponse, SymbolInfo};

/// Exchange listed by `stock_symbols`
pub const STOCK_EXCHANGE: &str = "US";

/// Broker listed by `forex_symbols`
pub const FOREX_EXCHANGE: &str = "oanda";

/// Finnhub REST endpoints, authenticated with the `token` query parameter
pub struct FinnhubEndpoints {
  transport: Arc<Transport>,
  api_key: String,
}

impl_endpoint_base!(FinnhubEndpoints);

fn unix_start(date: NaiveDate) -> i64 {
  date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc().timestamp()).unwrap_or_default()
}

impl FinnhubEndpoints {
  pub fn new(api_key: &str, settings: &TransportSettings) -> Result<Self> {
    Self::with_base_url(FINNHUB_BASE_URL, api_key, settings)
  }

  pub fn with_base_url(base_url: &str, api_key: &str, settings: &TransportSettings) -> Result<Self> {
    Ok(Self { transport: Arc::new(Transport::new(base_url, settings)?), api_key: api_key.to_string() })
  }

  /// Daily, weekly or monthly candles between two dates, both inclusive
  #[instrument(skip(self), fields(resolution = %resolution))]
  pub async fn candles(
    &self,
    symbol: &str,
    resolution: Resolution,
    from: NaiveDate,
    to: NaiveDate,
  ) -> Result<Vec<Candle>> {
    // The upper bound is exclusive upstream
    let end = to.checked_add_days(Days::new(1)).unwrap_or(to);

    let response: CandleResponse = self
      .transport
      .get_json(
        "/stock/candle",
        &[
          ("symbol", symbol.to_string()),
          ("resolution", resolution.finnhub_code()),
          ("from", unix_start(from).to_string()),
          ("to", unix_start(end).to_string()),
          ("token", self.api_key.clone()),
        ],
      )
      .await?;

    if !response.has_data() {
      info!("No candles for {} between {} and {}", symbol, from, to);
    }
    Ok(response.into_candles(symbol))
  }

  /// Stock symbols of an exchange
  #[instrument(skip(self))]
  pub async fn stock_symbols(&self, exchange: &str) -> Result<Vec<SymbolInfo>> {
    self
      .transport
      .get_json("/stock/symbol", &[("exchange", exchange.to_string()), ("token", self.api_key.clone())])
      .await
  }

  /// Forex pairs of a broker, typed as `Forex`
  #[instrument(skip(self))]
  pub async fn forex_symbols(&self, exchange: &str) -> Result<Vec<SymbolInfo>> {
    let mut symbols: Vec<SymbolInfo> = self
      .transport
      .get_json("/forex/symbol", &[("exchange", exchange.to_string()), ("token", self.api_key.clone())])
      .await?;

    for symbol in &mut symbols {
      symbol.symbol_type = "Forex".to_string();
    }
    Ok(symbols)
  }

  /// US stocks followed by OANDA forex pairs
  pub async fn symbols(&self) -> Result<Vec<SymbolInfo>> {
    let mut symbols = self.stock_symbols(STOCK_EXCHANGE).await?;
    symbols.extend(self.forex_symbols(FOREX_EXCHANGE).await?);
    Ok(symbols)
  }
}
