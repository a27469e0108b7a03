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

//! Historical prices and symbol lists

use async_trait::async_trait;
use chrono::NaiveDate;
use tracing::{debug, info};
use visser_client::endpoints::coinapi::DEFAULT_EXCHANGE;
use visser_core::{Instrument, Provider};
use visser_models::jobs::HistoricalDataParams;
use visser_models::trading::{Candle, ExchangeSymbol, SymbolInfo};

use crate::{DataLoader, LoaderContext, LoaderError, LoaderResult};

pub fn parse_date(value: &str) -> LoaderResult<NaiveDate> {
  NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
    .map_err(|_| LoaderError::InvalidData(format!("Date '{}' should be formatted as YYYY-MM-DD", value)))
}

/// Candles for stocks, forex pairs and crypto assets
///
/// Crypto always comes from CoinAPI. Stocks and forex follow the resolution:
/// intraday bars from AlphaVantage, daily and longer from Finnhub.
#[derive(Debug, Default, Clone)]
pub struct TradingLoader;

impl TradingLoader {
  pub fn new() -> Self {
    Self
  }

  pub async fn historical(&self, context: &LoaderContext, params: &HistoricalDataParams) -> LoaderResult<Vec<Candle>> {
    let from = parse_date(&params.from_date)?;
    let to = parse_date(&params.resolved_to_date())?;
    let client = &context.client;

    let provider = match params.instrument {
      Instrument::Crypto => Provider::CoinApi,
      Instrument::Stock | Instrument::Forex => params.resolution.provider(),
    };
    debug!("{} {} {} from {}", params.instrument, params.ticker, params.resolution, provider);

    let candles = match provider {
      Provider::CoinApi => {
        let mut candles = client
          .coin_api()?
          .ohlcv_history(DEFAULT_EXCHANGE, &params.ticker, &params.resolution.coinapi_period(), from)
          .await?;
        let upper = to.format("%Y-%m-%d").to_string();
        candles.retain(|c| c.date.get(..10).is_some_and(|day| day <= upper.as_str()));
        candles
      }
      Provider::AlphaVantage => client.alpha_vantage()?.historical(&params.ticker, params.resolution, from, to).await?,
      Provider::Finnhub => client.finnhub()?.candles(&params.ticker, params.resolution, from, to).await?,
    };

    info!("{} candles for {} between {} and {}", candles.len(), params.ticker, from, to);
    Ok(candles)
  }

  /// US stock and oanda forex symbols
  pub async fn symbols(&self, context: &LoaderContext) -> LoaderResult<Vec<SymbolInfo>> {
    Ok(context.client.finnhub()?.symbols().await?)
  }

  /// USDT spot pairs of a crypto exchange, OKEX unless named
  pub async fn crypto_symbols(&self, context: &LoaderContext, exchange: Option<&str>) -> LoaderResult<Vec<ExchangeSymbol>> {
    let exchange = exchange.map(str::trim).filter(|e| !e.is_empty()).unwrap_or(DEFAULT_EXCHANGE);
    Ok(context.client.coin_api()?.usdt_spot_symbols(exchange).await?)
  }
}

#[async_trait]
impl DataLoader for TradingLoader {
  type Input = HistoricalDataParams;
  type Output = Vec<Candle>;

  async fn load(&self, context: &LoaderContext, input: Self::Input) -> LoaderResult<Self::Output> {
    self.validate_input(&input).await?;
    self.historical(context, &input).await
  }

  async fn validate_input(&self, input: &Self::Input) -> LoaderResult<()> {
    if input.ticker.trim().is_empty() {
      return Err(LoaderError::InvalidData("ticker must not be empty".to_string()));
    }
    let (from, to) = (parse_date(&input.from_date)?, parse_date(&input.resolved_to_date())?);
    if from > to {
      return Err(LoaderError::InvalidData(format!("from_date {} is after to_date {}", from, to)));
    }
    Ok(())
  }

  fn name(&self) -> &'static str {
    "trading_historical"
  }
}
