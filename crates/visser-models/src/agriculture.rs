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

//! USDA export sales (ESR) and EIA weekly ethanol models

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// ESR commodity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Commodity {
  pub commodity_code: i64,
  pub commodity_name: String,
  #[serde(default)]
  pub unit_id: Option<i64>,
}

/// ESR destination country
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Country {
  pub country_code: i64,
  pub country_name: String,
  pub country_description: String,
  #[serde(default)]
  pub region_id: Option<i64>,
  #[serde(default)]
  pub genc_code: Option<String>,
}

/// Raw weekly export record from `/api/esr/exports`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRecord {
  pub commodity_code: i64,
  pub country_code: i64,
  pub weekly_exports: f64,
  pub accumulated_exports: f64,
  pub outstanding_sales: f64,
  pub gross_new_sales: f64,
  #[serde(rename = "currentMYNetSales")]
  pub current_my_net_sales: f64,
  #[serde(rename = "currentMYTotalCommitment")]
  pub current_my_total_commitment: f64,
  #[serde(rename = "nextMYOutstandingSales")]
  pub next_my_outstanding_sales: f64,
  #[serde(rename = "nextMYNetSales")]
  pub next_my_net_sales: f64,
  pub unit_id: i64,
  /// e.g. `2019-09-05T00:00:00`
  pub week_ending_date: String,
}

/// Export record with commodity and country names resolved
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportRow {
  pub date: String,
  pub commodity: String,
  pub commodity_code: i64,
  pub country: String,
  pub country_code: i64,
  pub weekly_exports: f64,
  pub accumulated_exports: f64,
  pub outstanding_sales: f64,
  pub gross_new_sales: f64,
  pub current_my_net_sales: f64,
  pub current_my_total_commitment: f64,
  pub next_my_outstanding_sales: f64,
  pub next_my_net_sales: f64,
  pub unit_id: i64,
}

impl ExportRecord {
  /// Week ending date as `YYYY-MM-DD`
  pub fn week_ending(&self) -> Option<NaiveDate> {
    let day = self.week_ending_date.get(..10)?;
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
  }

  /// Country descriptions arrive padded with spaces; they are trimmed here.
  pub fn into_row(self, commodity: &str, country: &str) -> Option<ExportRow> {
    let date = self.week_ending()?.format("%Y-%m-%d").to_string();

    Some(ExportRow {
      date,
      commodity: commodity.to_string(),
      commodity_code: self.commodity_code,
      country: country.trim().to_string(),
      country_code: self.country_code,
      weekly_exports: self.weekly_exports,
      accumulated_exports: self.accumulated_exports,
      outstanding_sales: self.outstanding_sales,
      gross_new_sales: self.gross_new_sales,
      current_my_net_sales: self.current_my_net_sales,
      current_my_total_commitment: self.current_my_total_commitment,
      next_my_outstanding_sales: self.next_my_outstanding_sales,
      next_my_net_sales: self.next_my_net_sales,
      unit_id: self.unit_id,
    })
  }
}

/// One weekly value of an EIA series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyObservation {
  /// Week ending date, `YYYY-MM-DD`
  pub date: String,
  pub value: f64,
}

#[cfg(test)]
mod tests {
  use super::*;

  const RECORD: &str = r#"{
    "commodityCode": 401,
    "countryCode": 1220,
    "weeklyExports": 5599,
    "accumulatedExports": 5599,
    "outstandingSales": 84173,
    "grossNewSales": 36095,
    "currentMYNetSales": -7244,
    "currentMYTotalCommitment": 89772,
    "nextMYOutstandingSales": 0,
    "nextMYNetSales": 0,
    "unitId": 1,
    "weekEndingDate": "2019-09-05T00:00:00"
  }"#;

  #[test]
  fn test_export_record_into_row() {
    let record: ExportRecord = serde_json::from_str(RECORD).unwrap();
    let row = record.into_row("Corn", "CANADA      ").unwrap();
    assert_eq!(row.date, "2019-09-05");
    assert_eq!(row.country, "CANADA");
    assert_eq!(row.commodity, "Corn");
    assert_eq!(row.current_my_net_sales, -7244.0);
  }

  #[test]
  fn test_export_record_bad_date() {
    let mut record: ExportRecord = serde_json::from_str(RECORD).unwrap();
    record.week_ending_date = "soon".to_string();
    assert!(record.into_row("Corn", "CANADA").is_none());
  }

  #[test]
  fn test_country_null_genc() {
    let country: Country = serde_json::from_str(
      r#"{"countryCode":1,"countryName":"EUROPEAN","countryDescription":"EUROPEAN UNION - 27","regionId":1,"gencCode":null}"#,
    )
    .unwrap();
    assert_eq!(country.genc_code, None);
  }
}
