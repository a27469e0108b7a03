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

use actix_web::{get, web, HttpResponse};
use serde_json::json;
use visser_core::WriteType;
use visser_models::jobs::{ExportsQuery, WriteTypeQuery};
use visser_storage::urls::{ethanol_prod_storage_url, ethanol_stock_storage_url};

use crate::auth::HasAccess;
use crate::error::ApiResult;
use crate::routes::run_job;
use crate::state::AppState;

/// Ethanol series are kept in the bucket unless the caller says otherwise
const ETHANOL_DEFAULT_WRITE_TYPE: WriteType = WriteType::CloudStorage;

/// Weekly US fuel ethanol production, thousand barrels per day
#[get("/agriculture/ethanolprod")]
pub async fn ethanol_production(
  state: web::Data<AppState>,
  access: HasAccess,
  query: web::Query<WriteTypeQuery>,
) -> ApiResult<HttpResponse> {
  let write_type = state.resolve_write_type(None, query.write_type, ETHANOL_DEFAULT_WRITE_TYPE)?;

  let response = run_job(&state, access.user(), "agriculture_ethanolprod", write_type, async {
    let rows = state.agriculture.ethanol_production(&state.context).await?;
    let description = json!({ "series": "weekly fuel ethanol production", "storage_url": ethanol_prod_storage_url() });
    Ok((rows, description))
  })
  .await?;

  Ok(HttpResponse::Ok().json(response))
}

/// Weekly US fuel ethanol ending stocks, thousand barrels
#[get("/agriculture/ethanolstock")]
pub async fn ethanol_stocks(
  state: web::Data<AppState>,
  access: HasAccess,
  query: web::Query<WriteTypeQuery>,
) -> ApiResult<HttpResponse> {
  let write_type = state.resolve_write_type(None, query.write_type, ETHANOL_DEFAULT_WRITE_TYPE)?;

  let response = run_job(&state, access.user(), "agriculture_ethanolstock", write_type, async {
    let rows = state.agriculture.ethanol_stocks(&state.context).await?;
    let description = json!({ "series": "weekly fuel ethanol ending stocks", "storage_url": ethanol_stock_storage_url() });
    Ok((rows, description))
  })
  .await?;

  Ok(HttpResponse::Ok().json(response))
}

/// Commodities known to the export sales reporting API
#[get("/agriculture/esr/commodities")]
pub async fn esr_commodities(
  state: web::Data<AppState>,
  access: HasAccess,
  query: web::Query<WriteTypeQuery>,
) -> ApiResult<HttpResponse> {
  let write_type = state.resolve_write_type(None, query.write_type, WriteType::default_for(state.environment()))?;

  let response = run_job(&state, access.user(), "agriculture_esrcommodities", write_type, async {
    let rows = state.agriculture.esr_commodities(&state.context).await?;
    let description = json!({ "commodities": rows.len() });
    Ok((rows, description))
  })
  .await?;

  Ok(HttpResponse::Ok().json(response))
}

/// Weekly export sales of one commodity for a marketing year
#[get("/agriculture/esr/exports")]
pub async fn esr_exports(
  state: web::Data<AppState>,
  access: HasAccess,
  query: web::Query<ExportsQuery>,
) -> ApiResult<HttpResponse> {
  let query = query.into_inner();
  let write_type = state.resolve_write_type(None, query.write_type, WriteType::default_for(state.environment()))?;

  let response = run_job(&state, access.user(), "agriculture_esrexports", write_type, async {
    let rows = state
      .agriculture
      .esr_exports(&state.context, &query.commodity, query.market_year, query.country_code)
      .await?;
    let description = json!({
      "commodity": query.commodity,
      "market_year": query.market_year,
      "country_code": query.country_code,
      "records": rows.len(),
    });
    Ok((rows, description))
  })
  .await?;

  Ok(HttpResponse::Ok().json(response))
}
