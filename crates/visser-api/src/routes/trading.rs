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

use actix_web::{get, post, web, HttpResponse};
use serde_json::json;
use tracing::warn;
use visser_core::WriteType;
use visser_loaders::DataLoader;
use visser_models::jobs::{CryptoSymbolsQuery, HistoricalDataParams, WriteTypeQuery};

use crate::auth::HasAccess;
use crate::error::ApiResult;
use crate::routes::run_job;
use crate::state::AppState;

/// Candles of a stock, forex pair or crypto asset
///
/// Every successful pull is also recorded in the historical trading metadata.
#[post("/trading/historical")]
pub async fn historical(
  state: web::Data<AppState>,
  access: HasAccess,
  params: web::Json<HistoricalDataParams>,
  query: web::Query<WriteTypeQuery>,
) -> ApiResult<HttpResponse> {
  let params = params.into_inner();
  let write_type =
    state.resolve_write_type(params.write_type, query.write_type, WriteType::default_for(state.environment()))?;

  let response = run_job(&state, access.user(), "trading_historical", write_type, async {
    let rows = state.trading.load(&state.context, params.clone()).await?;
    let description = json!({
      "ticker": params.ticker,
      "from_date": params.from_date,
      "to_date": params.resolved_to_date(),
      "resolution": params.resolution,
      "instrument": params.instrument,
      "candles": rows.len(),
    });
    Ok((rows, description))
  })
  .await?;

  if !state.metadata.record_historical(&params, &response.metadata.write_path).await {
    warn!("Historical metadata for {} was not recorded", params.ticker);
  }

  Ok(HttpResponse::Ok().json(response))
}

/// US stock and forex symbols
#[get("/trading/symbols")]
pub async fn symbols(
  state: web::Data<AppState>,
  access: HasAccess,
  query: web::Query<WriteTypeQuery>,
) -> ApiResult<HttpResponse> {
  let write_type = state.resolve_write_type(None, query.write_type, WriteType::default_for(state.environment()))?;

  let response = run_job(&state, access.user(), "trading_symbols", write_type, async {
    let rows = state.trading.symbols(&state.context).await?;
    let description = json!({ "symbols": rows.len() });
    Ok((rows, description))
  })
  .await?;

  Ok(HttpResponse::Ok().json(response))
}

/// USDT spot pairs listed on a crypto exchange
#[get("/trading/crypto/symbols")]
pub async fn crypto_symbols(
  state: web::Data<AppState>,
  access: HasAccess,
  query: web::Query<CryptoSymbolsQuery>,
) -> ApiResult<HttpResponse> {
  let query = query.into_inner();
  let write_type = state.resolve_write_type(None, query.write_type, WriteType::default_for(state.environment()))?;

  let response = run_job(&state, access.user(), "trading_cryptosymbols", write_type, async {
    let rows = state.trading.crypto_symbols(&state.context, query.exchange.as_deref()).await?;
    let description = json!({ "exchange": query.exchange, "symbols": rows.len() });
    Ok((rows, description))
  })
  .await?;

  Ok(HttpResponse::Ok().json(response))
}

#[cfg(test)]
mod tests {
  use crate::routes::configure;
  use crate::routes::test_support::*;
  use actix_web::{test, App};
  use pretty_assertions::assert_eq;
  use serde_json::{json, Value};
  use std::sync::Arc;
  use visser_client::{FinnhubEndpoints, VisserClient};
  use visser_storage::metadata::HISTORICAL_METADATA_COLLECTION;
  use visser_storage::MemoryDocumentStore;
  use wiremock::matchers::{path, query_param};
  use wiremock::{Mock, MockServer, ResponseTemplate};

  async fn finnhub_client() -> (MockServer, VisserClient) {
    let server = MockServer::start().await;
    Mock::given(path("/stock/candle"))
      .and(query_param("symbol", "NFLX"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({
        "c": [500.0, 505.0], "h": [510.0, 512.0], "l": [495.0, 499.0], "o": [498.0, 501.0],
        "s": "ok", "t": [1609459200, 1609545600], "v": [1000.0, 1200.0]
      })))
      .mount(&server)
      .await;
    let client = VisserClient::keyless(&settings())
      .unwrap()
      .with_finnhub(FinnhubEndpoints::with_base_url(&server.uri(), "fh", &settings()).unwrap());
    (server, client)
  }

  #[actix_web::test]
  async fn test_historical_records_metadata() {
    let (_server, client) = finnhub_client().await;
    let store = Arc::new(MemoryDocumentStore::new());
    let state = state_with(client, store.clone()).await;
    let app = test::init_service(App::new().app_data(state.clone()).configure(configure)).await;

    let request = test::TestRequest::post()
      .uri("/api/trading/historical?write_type=return")
      .insert_header(("token", token(&state)))
      .set_json(json!({
        "ticker": "NFLX", "from_date": "2021-01-01", "to_date": "2021-01-02",
        "resolution": "D", "instrument": "stock"
      }))
      .to_request();
    let body: Value = test::call_and_read_body_json(&app, request).await;

    assert_eq!(body["write_type"], "return");
    assert_eq!(body["data"].as_array().map(Vec::len), Some(2));
    assert_eq!(body["job_description"]["candles"], 2);

    let recorded = store.all(HISTORICAL_METADATA_COLLECTION).await;
    assert_eq!(recorded.len(), 1);
    assert_eq!(recorded[0]["write_path"], "trading/historical/stock/NFLX/1D/2021-01-01/2021-01-02/");
  }

  #[actix_web::test]
  async fn test_historical_rejects_bad_dates() {
    let (_server, client) = finnhub_client().await;
    let state = state_with(client, Arc::new(MemoryDocumentStore::new())).await;
    let app = test::init_service(App::new().app_data(state.clone()).configure(configure)).await;

    let request = test::TestRequest::post()
      .uri("/api/trading/historical")
      .insert_header(("token", token(&state)))
      .set_json(json!({"ticker": "NFLX", "from_date": "2021-02-01", "to_date": "2021-01-01", "write_type": "return"}))
      .to_request();
    assert_eq!(test::call_service(&app, request).await.status(), 400);
  }

  #[actix_web::test]
  async fn test_missing_provider_key_is_a_server_error() {
    let state = keyless_state(Arc::new(MemoryDocumentStore::new())).await;
    let app = test::init_service(App::new().app_data(state.clone()).configure(configure)).await;

    let request = test::TestRequest::get()
      .uri("/api/trading/crypto/symbols?exchange=BINANCE&write_type=return")
      .insert_header(("token", token(&state)))
      .to_request();
    assert_eq!(test::call_service(&app, request).await.status(), 500);
  }
}
