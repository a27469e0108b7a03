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

use super::impl_endpoint_base;
use crate::transport::{header_map, Transport};
use chrono::NaiveDate;
use std::sync::Arc;
use tracing::instrument;
use visser_core::{Result, TransportSettings, COINAPI_BASE_URL};
use visser_models::trading::{Candle, ExchangeSymbol, OhlcvRecord};

/// Exchange queried when the caller names none
pub const DEFAULT_EXCHANGE: &str = "OKEX";

/// Most bars returned by one history request
pub const HISTORY_LIMIT: u32 = 100_000;

/// CoinAPI market data, authenticated with the `X-CoinAPI-Key` header
pub struct CoinApiEndpoints {
  transport: Arc<Transport>,
}

impl_endpoint_base!(CoinApiEndpoints);

impl CoinApiEndpoints {
  pub fn new(api_key: &str, settings: &TransportSettings) -> Result<Self> {
    Self::with_base_url(COINAPI_BASE_URL, api_key, settings)
  }

  pub fn with_base_url(base_url: &str, api_key: &str, settings: &TransportSettings) -> Result<Self> {
    let headers = header_map(&[("X-CoinAPI-Key", api_key)])?;
    Ok(Self { transport: Arc::new(Transport::with_headers(base_url, settings, headers)?) })
  }

  /// Every symbol listed on an exchange
  #[instrument(skip(self))]
  pub async fn exchange_symbols(&self, exchange: &str) -> Result<Vec<ExchangeSymbol>> {
    self.transport.get_json("/v1/symbols", &[("filter_exchange_id", exchange.to_uppercase())]).await
  }

  /// Spot pairs quoted in USDT
  pub async fn usdt_spot_symbols(&self, exchange: &str) -> Result<Vec<ExchangeSymbol>> {
    let mut symbols = self.exchange_symbols(exchange).await?;
    symbols.retain(ExchangeSymbol::is_usdt_spot);
    Ok(symbols)
  }

  /// OHLCV history of `{EXCHANGE}_SPOT_{BASE}_USDT` starting at `from`
  #[instrument(skip(self))]
  pub async fn ohlcv_history(&self, exchange: &str, base_asset: &str, period: &str, from: NaiveDate) -> Result<Vec<Candle>> {
    let base_asset = base_asset.to_uppercase();
    let symbol_id = format!("{}_SPOT_{}_USDT", exchange.to_uppercase(), base_asset);

    let records: Vec<OhlcvRecord> = self
      .transport
      .get_json(
        &format!("/v1/ohlcv/{}/history", symbol_id),
        &[
          ("period_id", period.to_string()),
          ("time_start", format!("{}T00:00:00", from.format("%Y-%m-%d"))),
          ("limit", HISTORY_LIMIT.to_string()),
        ],
      )
      .await?;

    Ok(records.into_iter().map(|r| r.into_candle(&base_asset)).collect())
  }
}
