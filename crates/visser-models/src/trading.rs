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

//! Market data models for Finnhub, AlphaVantage and CoinAPI

use chrono::DateTime;
use serde::{Deserialize, Serialize};

use crate::ROW_TIMESTAMP_FORMAT;

/// One OHLCV bar, the common row shape of every price source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
  /// Bar time, `YYYY-MM-DD HH:MM:SS` in UTC
  pub date: String,
  pub open: f64,
  pub high: f64,
  pub low: f64,
  pub close: f64,
  pub volume: f64,
  pub symbol: String,
  /// Trade count, only reported by CoinAPI
  pub trades: Option<u64>,
}

/// Finnhub `/stock/candle` response, one array per column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandleResponse {
  #[serde(rename = "c", default)]
  pub close: Vec<f64>,
  #[serde(rename = "h", default)]
  pub high: Vec<f64>,
  #[serde(rename = "l", default)]
  pub low: Vec<f64>,
  #[serde(rename = "o", default)]
  pub open: Vec<f64>,
  /// `ok` or `no_data`
  #[serde(rename = "s")]
  pub status: String,
  #[serde(rename = "t", default)]
  pub timestamps: Vec<i64>,
  #[serde(rename = "v", default)]
  pub volume: Vec<f64>,
}

impl CandleResponse {
  pub fn has_data(&self) -> bool {
    self.status == "ok"
  }

  /// Zip the columns into rows. A `no_data` response yields no rows.
  pub fn into_candles(self, symbol: &str) -> Vec<Candle> {
    if !self.has_data() {
      return Vec::new();
    }

    let rows = [
      self.close.len(),
      self.high.len(),
      self.low.len(),
      self.open.len(),
      self.timestamps.len(),
      self.volume.len(),
    ]
    .into_iter()
    .min()
    .unwrap_or(0);

    (0..rows)
      .filter_map(|i| {
        let date = DateTime::from_timestamp(self.timestamps[i], 0)?;
        Some(Candle {
          date: date.format(ROW_TIMESTAMP_FORMAT).to_string(),
          open: self.open[i],
          high: self.high[i],
          low: self.low[i],
          close: self.close[i],
          volume: self.volume[i],
          symbol: symbol.to_string(),
          trades: None,
        })
      })
      .collect()
  }
}

/// Finnhub stock or forex symbol listing entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolInfo {
  pub symbol: String,
  #[serde(rename = "displaySymbol", default)]
  pub display_symbol: String,
  #[serde(default)]
  pub description: String,
  /// Security type, `Forex` for currency pairs
  #[serde(rename = "type", default)]
  pub symbol_type: String,
  #[serde(default)]
  pub currency: Option<String>,
  #[serde(default)]
  pub figi: Option<String>,
  #[serde(default)]
  pub mic: Option<String>,
}

/// One row of the AlphaVantage intraday CSV
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct IntradayCsvRow {
  pub timestamp: String,
  pub open: f64,
  pub high: f64,
  pub low: f64,
  pub close: f64,
  pub volume: f64,
}

impl IntradayCsvRow {
  pub fn into_candle(self, symbol: &str) -> Candle {
    Candle {
      date: self.timestamp,
      open: self.open,
      high: self.high,
      low: self.low,
      close: self.close,
      volume: self.volume,
      symbol: symbol.to_string(),
      trades: None,
    }
  }
}

/// CoinAPI OHLCV history entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OhlcvRecord {
  pub time_period_start: String,
  pub time_period_end: String,
  #[serde(default)]
  pub time_open: Option<String>,
  #[serde(default)]
  pub time_close: Option<String>,
  pub price_open: f64,
  pub price_high: f64,
  pub price_low: f64,
  pub price_close: f64,
  pub volume_traded: f64,
  pub trades_count: u64,
}

impl OhlcvRecord {
  /// Bars are stamped with the end of their period.
  pub fn into_candle(self, symbol: &str) -> Candle {
    let date = self.time_period_end.get(..19).unwrap_or(&self.time_period_end).replace('T', " ");

    Candle {
      date,
      open: self.price_open,
      high: self.price_high,
      low: self.price_low,
      close: self.price_close,
      volume: self.volume_traded,
      symbol: symbol.to_string(),
      trades: Some(self.trades_count),
    }
  }
}

/// CoinAPI exchange symbol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExchangeSymbol {
  pub symbol_id: String,
  pub exchange_id: String,
  pub symbol_type: String,
  #[serde(default)]
  pub asset_id_base: Option<String>,
  #[serde(default)]
  pub asset_id_quote: Option<String>,
  #[serde(default)]
  pub data_start: Option<String>,
  #[serde(default)]
  pub data_end: Option<String>,
  #[serde(default)]
  pub volume_1day_usd: Option<f64>,
  #[serde(default)]
  pub price: Option<f64>,
}

impl ExchangeSymbol {
  /// Spot markets quoted in USDT, the pairs the OHLCV history endpoint is queried with
  pub fn is_usdt_spot(&self) -> bool {
    self.symbol_type == "SPOT" && self.asset_id_quote.as_deref() == Some("USDT")
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use pretty_assertions::assert_eq;

  #[test]
  fn test_candle_response_into_candles() {
    let json = r#"{"c":[217.68,221.03],"h":[222.49,221.5],"l":[217.19,217.1402],"o":[221.03,218.55],"s":"ok","t":[1569297600,1569384000],"v":[33463820,24018876]}"#;
    let response: CandleResponse = serde_json::from_str(json).unwrap();
    let candles = response.into_candles("AAPL");

    assert_eq!(candles.len(), 2);
    assert_eq!(candles[0].date, "2019-09-24 04:00:00");
    assert_eq!(candles[0].open, 221.03);
    assert_eq!(candles[1].close, 221.03);
    assert_eq!(candles[1].symbol, "AAPL");
    assert_eq!(candles[1].trades, None);
  }

  #[test]
  fn test_candle_response_no_data() {
    let response: CandleResponse = serde_json::from_str(r#"{"s":"no_data"}"#).unwrap();
    assert!(!response.has_data());
    assert!(response.into_candles("AAPL").is_empty());
  }

  #[test]
  fn test_ohlcv_record_into_candle() {
    let json = r#"{
      "time_period_start": "2021-09-01T00:00:00.0000000Z",
      "time_period_end": "2021-09-01T00:30:00.0000000Z",
      "time_open": "2021-09-01T00:00:00.4590000Z",
      "time_close": "2021-09-01T00:29:59.9520000Z",
      "price_open": 47130.4,
      "price_high": 47283.1,
      "price_low": 46999.9,
      "price_close": 47021.2,
      "volume_traded": 312.5,
      "trades_count": 4126
    }"#;
    let record: OhlcvRecord = serde_json::from_str(json).unwrap();
    let candle = record.into_candle("BTC");
    assert_eq!(candle.date, "2021-09-01 00:30:00");
    assert_eq!(candle.close, 47021.2);
    assert_eq!(candle.trades, Some(4126));
  }

  #[test]
  fn test_exchange_symbol_filter() {
    let spot: ExchangeSymbol = serde_json::from_str(
      r#"{"symbol_id":"OKEX_SPOT_BTC_USDT","exchange_id":"OKEX","symbol_type":"SPOT","asset_id_base":"BTC","asset_id_quote":"USDT"}"#,
    )
    .unwrap();
    let perp: ExchangeSymbol = serde_json::from_str(
      r#"{"symbol_id":"OKEX_PERP_BTC_USD","exchange_id":"OKEX","symbol_type":"PERPETUAL","asset_id_base":"BTC","asset_id_quote":"USD"}"#,
    )
    .unwrap();
    assert!(spot.is_usdt_spot());
    assert!(!perp.is_usdt_spot());
  }

  #[test]
  fn test_symbol_info_forex_defaults() {
    let info: SymbolInfo = serde_json::from_str(
      r#"{"description":"Oanda EUR/USD","displaySymbol":"EUR/USD","symbol":"OANDA:EUR_USD"}"#,
    )
    .unwrap();
    assert_eq!(info.symbol_type, "");
    assert_eq!(info.currency, None);
  }
}
