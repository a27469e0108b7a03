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

//! EIA ethanol series and USDA export sales

use chrono::{Datelike, Local};
use std::collections::HashMap;
use tracing::{debug, info};
use visser_models::agriculture::{Commodity, ExportRow, WeeklyObservation};

use crate::{LoaderContext, LoaderError, LoaderResult};

/// Find a commodity by numeric code (`401`) or by name (`corn`), case-insensitively
pub fn resolve_commodity<'a>(commodities: &'a [Commodity], query: &str) -> LoaderResult<&'a Commodity> {
  let query = query.trim();
  let found = match query.parse::<i64>() {
    Ok(code) => commodities.iter().find(|c| c.commodity_code == code),
    Err(_) => commodities.iter().find(|c| c.commodity_name.trim().eq_ignore_ascii_case(query)),
  };

  found.ok_or_else(|| {
    let available: Vec<&str> = commodities.iter().map(|c| c.commodity_name.trim()).collect();
    LoaderError::NotFound(format!("Commodity '{}' not found. Available: {}", query, available.join(" | ")))
  })
}

#[derive(Debug, Default, Clone)]
pub struct AgricultureLoader;

impl AgricultureLoader {
  pub fn new() -> Self {
    Self
  }

  /// Weekly US fuel ethanol production
  pub async fn ethanol_production(&self, context: &LoaderContext) -> LoaderResult<Vec<WeeklyObservation>> {
    Ok(context.client.eia().weekly_ethanol_production().await?)
  }

  /// Weekly US fuel ethanol ending stocks
  pub async fn ethanol_stocks(&self, context: &LoaderContext) -> LoaderResult<Vec<WeeklyObservation>> {
    Ok(context.client.eia().weekly_ethanol_ending_stocks().await?)
  }

  pub async fn esr_commodities(&self, context: &LoaderContext) -> LoaderResult<Vec<Commodity>> {
    Ok(context.client.esr()?.commodities().await?)
  }

  /// Weekly export sales of a commodity for a marketing year
  ///
  /// All destinations unless `country_code` is given. The marketing year
  /// defaults to the current year.
  pub async fn esr_exports(
    &self,
    context: &LoaderContext,
    commodity: &str,
    market_year: Option<i32>,
    country_code: Option<i64>,
  ) -> LoaderResult<Vec<ExportRow>> {
    let esr = context.client.esr()?;
    let market_year = market_year.unwrap_or_else(|| Local::now().year());

    let commodities = esr.commodities().await?;
    let commodity = resolve_commodity(&commodities, commodity)?;
    let name = commodity.commodity_name.trim();

    let countries: HashMap<i64, String> =
      esr.countries().await?.into_iter().map(|c| (c.country_code, c.country_description)).collect();

    if let Some(code) = country_code {
      if !countries.contains_key(&code) {
        return Err(LoaderError::NotFound(format!("Country code {} not found", code)));
      }
    }

    let records = match country_code {
      Some(code) => esr.exports_for_country(commodity.commodity_code, code, market_year).await?,
      None => esr.exports_all_countries(commodity.commodity_code, market_year).await?,
    };
    let total = records.len();

    let rows: Vec<ExportRow> = records
      .into_iter()
      .filter_map(|record| {
        let country = countries.get(&record.country_code).cloned().unwrap_or_else(|| record.country_code.to_string());
        record.into_row(name, &country)
      })
      .collect();

    if rows.len() < total {
      debug!("Dropped {} export records without a week ending date", total - rows.len());
    }
    info!("{} export records of {} for marketing year {}", rows.len(), name, market_year);
    Ok(rows)
  }
}
