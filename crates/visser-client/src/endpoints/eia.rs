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

//! EIA weekly ethanol history pages

use super::impl_endpoint_base;
use crate::transport::Transport;
use regex::Regex;
use std::sync::Arc;
use tracing::{debug, instrument};
use visser_core::{Error, Result, TransportSettings, EIA_BASE_URL};
use visser_models::agriculture::WeeklyObservation;

const LEAF_HANDLER: &str = "/dnav/pet/hist/LeafHandler.ashx";

/// Weekly fuel ethanol series published by the EIA
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EthanolSeries {
  /// Production, thousand barrels per day
  Production,
  /// Ending stocks, thousand barrels
  EndingStocks,
}

impl EthanolSeries {
  fn query(&self) -> [(&'static str, String); 3] {
    match self {
      EthanolSeries::Production => {
        [("n", "pet".to_string()), ("s", "w_epooxe_yop_nus_mbbld".to_string()), ("f", "w".to_string())]
      }
      EthanolSeries::EndingStocks => {
        [("n", "PET".to_string()), ("s", "W_EPOOXE_SAE_NUS_MBBL".to_string()), ("f", "W".to_string())]
      }
    }
  }
}

struct TablePatterns {
  body: Regex,
  row: Regex,
  cell: Regex,
  tag: Regex,
}

impl TablePatterns {
  fn compile() -> Result<Self> {
    let regex = |pattern: &str| Regex::new(pattern).map_err(|e| Error::Parse(format!("Invalid pattern: {}", e)));
    Ok(Self {
      body: regex(r"(?is)<tbody[^>]*>(.*?)</tbody>")?,
      row: regex(r"(?is)<tr[^>]*>(.*?)</tr>")?,
      cell: regex(r"(?is)<td[^>]*>(.*?)</td>")?,
      tag: regex(r"(?s)<[^>]+>")?,
    })
  }

  fn cell_text(&self, raw: &str) -> String {
    self.tag.replace_all(raw, "").replace("&nbsp;", " ").trim().to_string()
  }
}

/// EIA history pages, scraped from HTML
pub struct EiaEndpoints {
  transport: Arc<Transport>,
}

impl_endpoint_base!(EiaEndpoints);

impl EiaEndpoints {
  pub fn new(settings: &TransportSettings) -> Result<Self> {
    Self::with_base_url(EIA_BASE_URL, settings)
  }

  pub fn with_base_url(base_url: &str, settings: &TransportSettings) -> Result<Self> {
    Ok(Self { transport: Arc::new(Transport::new(base_url, settings)?) })
  }

  /// Every published week of a series, oldest first
  #[instrument(skip(self))]
  pub async fn weekly_series(&self, series: EthanolSeries) -> Result<Vec<WeeklyObservation>> {
    let html = self.transport.get_text(LEAF_HANDLER, &series.query()).await?;
    let observations = parse_weekly_history(&html)?;
    debug!("{:?}: {} weekly observations", series, observations.len());
    Ok(observations)
  }

  /// Weekly fuel ethanol production
  pub async fn weekly_ethanol_production(&self) -> Result<Vec<WeeklyObservation>> {
    self.weekly_series(EthanolSeries::Production).await
  }

  /// Weekly fuel ethanol ending stocks
  pub async fn weekly_ethanol_ending_stocks(&self) -> Result<Vec<WeeklyObservation>> {
    self.weekly_series(EthanolSeries::EndingStocks).await
  }
}

/// Parse the first table body of a weekly history page
///
/// Rows start with a `YYYY-Mon` cell followed by up to five
/// `(MM/DD, value)` pairs. Empty cells are dropped and values that do not
/// parse as numbers are skipped.
pub fn parse_weekly_history(html: &str) -> Result<Vec<WeeklyObservation>> {
  let patterns = TablePatterns::compile()?;
  let body = patterns
    .body
    .captures(html)
    .and_then(|c| c.get(1))
    .ok_or_else(|| Error::InvalidResponse("EIA page has no data table".to_string()))?
    .as_str();

  let mut observations = Vec::new();
  for row in patterns.row.captures_iter(body) {
    let cells: Vec<String> = patterns
      .cell
      .captures_iter(&row[1])
      .map(|c| patterns.cell_text(&c[1]))
      .filter(|text| !text.is_empty())
      .collect();

    let Some((year_month, weeks)) = cells.split_first() else {
      continue;
    };
    let Some(year) = year_month.split('-').next().filter(|y| y.len() == 4 && y.chars().all(|c| c.is_ascii_digit()))
    else {
      continue;
    };

    for pair in weeks.chunks_exact(2) {
      let Ok(value) = pair[1].replace(',', "").parse::<f64>() else {
        continue;
      };
      observations.push(WeeklyObservation { date: format!("{}-{}", year, pair[0].replace('/', "-")), value });
    }
  }

  observations.sort_by(|a, b| a.date.cmp(&b.date));
  Ok(observations)
}

#[cfg(test)]
mod tests {
  use super::*;
  use pretty_assertions::assert_eq;
  use wiremock::matchers::{path, query_param};
  use wiremock::{Mock, MockServer, ResponseTemplate};

  const PAGE: &str = r##"<html><body><table class="FloatTitle">
    <tbody>
    <tr><th>Year-Month</th><th>Week 1</th></tr>
    <tr>
      <td class="B6">&nbsp;&nbsp;2010-Jul</td>
      <td class="B5">07/02&nbsp;&nbsp;</td><td class="B3">19,921&nbsp;&nbsp;</td>
      <td class="B5">07/09</td><td class="B3">20,168</td>
      <td class="B5"></td><td class="B3"></td>
    </tr>
    <tr>
      <td class="B6">2010-Jun</td>
      <td class="B5">06/25</td><td class="B3"><a href="#">19,499</a></td>
    </tr>
    </tbody></table></body></html>"##;

  #[test]
  fn test_parse_weekly_history() {
    let observations = parse_weekly_history(PAGE).unwrap();
    assert_eq!(
      observations,
      vec![
        WeeklyObservation { date: "2010-06-25".to_string(), value: 19499.0 },
        WeeklyObservation { date: "2010-07-02".to_string(), value: 19921.0 },
        WeeklyObservation { date: "2010-07-09".to_string(), value: 20168.0 },
      ]
    );
  }

  #[test]
  fn test_parse_without_table() {
    assert!(matches!(parse_weekly_history("<html></html>"), Err(Error::InvalidResponse(_))));
  }

  #[tokio::test]
  async fn test_weekly_series_query() {
    let server = MockServer::start().await;
    Mock::given(path("/dnav/pet/hist/LeafHandler.ashx"))
      .and(query_param("s", "W_EPOOXE_SAE_NUS_MBBL"))
      .and(query_param("f", "W"))
      .respond_with(ResponseTemplate::new(200).set_body_string(PAGE))
      .expect(1)
      .mount(&server)
      .await;

    let settings = TransportSettings { rate_limit: 600, timeout_secs: 5, max_retries: 0 };
    let eia = EiaEndpoints::with_base_url(&server.uri(), &settings).unwrap();
    let observations = eia.weekly_ethanol_ending_stocks().await.unwrap();
    assert_eq!(observations.len(), 3);
  }
}
