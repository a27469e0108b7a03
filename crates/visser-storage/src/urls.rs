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

//! Logical storage identifiers recorded in job metadata

use chrono::{Local, NaiveDate};
use visser_models::jobs::HistoricalDataParams;

fn today() -> NaiveDate {
  Local::now().date_naive()
}

/// `trading/historical/{instrument}/{ticker}/{resolution}/{from}/{to}/`
pub fn trading_metadata_storage_url(params: &HistoricalDataParams) -> String {
  format!(
    "trading/historical/{}/{}/{}/{}/{}/",
    params.instrument,
    params.ticker,
    params.resolution,
    params.from_date,
    params.resolved_to_date()
  )
}

pub fn twitter_followers_storage_url(num_users: usize) -> String {
  twitter_followers_storage_url_on(today(), num_users)
}

pub fn twitter_followings_storage_url(num_users: usize) -> String {
  twitter_followings_storage_url_on(today(), num_users)
}

pub fn ethanol_prod_storage_url() -> String {
  ethanol_prod_storage_url_on(today())
}

pub fn ethanol_stock_storage_url() -> String {
  ethanol_stock_storage_url_on(today())
}

pub fn twitter_followers_storage_url_on(date: NaiveDate, num_users: usize) -> String {
  format!("twitter/followers/{}/{}/", date.format("%Y-%m-%d"), num_users)
}

pub fn twitter_followings_storage_url_on(date: NaiveDate, num_users: usize) -> String {
  format!("twitter/followings/{}/{}/", date.format("%Y-%m-%d"), num_users)
}

pub fn ethanol_prod_storage_url_on(date: NaiveDate) -> String {
  format!("agriculture/ethanolprod/{}/", date.format("%Y-%m-%d"))
}

pub fn ethanol_stock_storage_url_on(date: NaiveDate) -> String {
  format!("agriculture/ethanolstock/{}/", date.format("%Y-%m-%d"))
}

#[cfg(test)]
mod tests {
  use super::*;
  use visser_core::{Instrument, Resolution};

  #[test]
  fn test_trading_metadata_storage_url() {
    let params = HistoricalDataParams {
      ticker: "AAPL".to_string(),
      from_date: "2021-01-01".to_string(),
      to_date: Some("2021-06-30".to_string()),
      resolution: Resolution::Day,
      instrument: Instrument::Stock,
      write_type: None,
    };
    assert_eq!(trading_metadata_storage_url(&params), "trading/historical/stock/AAPL/1D/2021-01-01/2021-06-30/");
  }

  #[test]
  fn test_dated_urls() {
    let day = NaiveDate::from_ymd_opt(2022, 1, 2).unwrap();
    assert_eq!(twitter_followers_storage_url_on(day, 4), "twitter/followers/2022-01-02/4/");
    assert_eq!(twitter_followings_storage_url_on(day, 1), "twitter/followings/2022-01-02/1/");
    assert_eq!(ethanol_prod_storage_url_on(day), "agriculture/ethanolprod/2022-01-02/");
    assert_eq!(ethanol_stock_storage_url_on(day), "agriculture/ethanolstock/2022-01-02/");
  }

  #[test]
  fn test_today_urls_carry_a_date() {
    assert!(twitter_followers_storage_url(3).starts_with("twitter/followers/20"));
    assert!(ethanol_stock_storage_url().ends_with('/'));
  }
}
