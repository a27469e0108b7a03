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

//! USDA FAS export sales reporting (ESR) endpoints

use super::impl_endpoint_base;
use crate::transport::{header_map, Transport};
use std::sync::Arc;
use tracing::instrument;
use visser_core::{Result, TransportSettings, USDA_FAS_BASE_URL};
use visser_models::agriculture::{Commodity, Country, ExportRecord};

/// ESR OpenData API, authenticated with the `API_KEY` header
pub struct EsrEndpoints {
  transport: Arc<Transport>,
}

impl_endpoint_base!(EsrEndpoints);

impl EsrEndpoints {
  pub fn new(api_key: &str, settings: &TransportSettings) -> Result<Self> {
    Self::with_base_url(USDA_FAS_BASE_URL, api_key, settings)
  }

  pub fn with_base_url(base_url: &str, api_key: &str, settings: &TransportSettings) -> Result<Self> {
    let headers = header_map(&[("API_KEY", api_key)])?;
    Ok(Self { transport: Arc::new(Transport::with_headers(base_url, settings, headers)?) })
  }

  #[instrument(skip(self))]
  pub async fn commodities(&self) -> Result<Vec<Commodity>> {
    self.transport.get_json("/api/esr/commodities", &[]).await
  }

  #[instrument(skip(self))]
  pub async fn countries(&self) -> Result<Vec<Country>> {
    self.transport.get_json("/api/esr/countries", &[]).await
  }

  /// Weekly exports of a commodity to every destination in a marketing year
  #[instrument(skip(self))]
  pub async fn exports_all_countries(&self, commodity_code: i64, market_year: i32) -> Result<Vec<ExportRecord>> {
    let path =
      format!("/api/esr/exports/commodityCode/{}/allCountries/marketYear/{}", commodity_code, market_year);
    self.transport.get_json(&path, &[]).await
  }

  /// Weekly exports of a commodity to one destination in a marketing year
  #[instrument(skip(self))]
  pub async fn exports_for_country(
    &self,
    commodity_code: i64,
    country_code: i64,
    market_year: i32,
  ) -> Result<Vec<ExportRecord>> {
    let path = format!(
      "/api/esr/exports/commodityCode/{}/countryCode/{}/marketYear/{}",
      commodity_code, country_code, market_year
    );
    self.transport.get_json(&path, &[]).await
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use wiremock::matchers::{header, path};
  use wiremock::{Mock, MockServer, ResponseTemplate};

  fn endpoints(server: &MockServer) -> EsrEndpoints {
    let settings = TransportSettings { rate_limit: 600, timeout_secs: 5, max_retries: 0 };
    EsrEndpoints::with_base_url(&server.uri(), "usda-key", &settings).unwrap()
  }

  #[tokio::test]
  async fn test_commodities_sends_key() {
    let server = MockServer::start().await;
    Mock::given(path("/api/esr/commodities"))
      .and(header("api_key", "usda-key"))
      .respond_with(
        ResponseTemplate::new(200).set_body_string(r#"[{"commodityCode":401,"commodityName":"Corn","unitId":1}]"#),
      )
      .expect(1)
      .mount(&server)
      .await;

    let commodities = endpoints(&server).commodities().await.unwrap();
    assert_eq!(commodities[0].commodity_name, "Corn");
  }

  #[tokio::test]
  async fn test_exports_paths() {
    let server = MockServer::start().await;
    Mock::given(path("/api/esr/exports/commodityCode/401/allCountries/marketYear/2022"))
      .respond_with(ResponseTemplate::new(200).set_body_string("[]"))
      .expect(1)
      .mount(&server)
      .await;
    Mock::given(path("/api/esr/exports/commodityCode/401/countryCode/1220/marketYear/2022"))
      .respond_with(ResponseTemplate::new(200).set_body_string("[]"))
      .expect(1)
      .mount(&server)
      .await;

    let esr = endpoints(&server);
    assert!(esr.exports_all_countries(401, 2022).await.unwrap().is_empty());
    assert!(esr.exports_for_country(401, 1220, 2022).await.unwrap().is_empty());
  }
}
