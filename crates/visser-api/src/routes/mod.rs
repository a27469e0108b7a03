//! HTTP handlers

pub mod agriculture;
pub mod token;
pub mod trading;
pub mod twitter;
pub mod wiki;

use actix_web::{get, web, HttpResponse, Responder};
use serde::Serialize;
use serde_json::{json, Value};
use std::future::Future;
use std::time::Instant;
use tracing::info;
use visser_core::WriteType;
use visser_loaders::ProcessState;
use visser_models::jobs::JobResponse;

use crate::error::ApiResult;
use crate::state::AppState;

/// Register every route
pub fn configure(cfg: &mut web::ServiceConfig) {
  cfg.service(index).service(token::token).service(
    web::scope("/api")
      .service(twitter::followers)
      .service(twitter::followings)
      .service(twitter::users)
      .service(agriculture::ethanol_production)
      .service(agriculture::ethanol_stocks)
      .service(agriculture::esr_commodities)
      .service(agriculture::esr_exports)
      .service(trading::historical)
      .service(trading::symbols)
      .service(trading::crypto_symbols)
      .service(wiki::pageviews),
  );
}

#[get("/")]
async fn index() -> impl Responder {
  HttpResponse::Ok().json(json!({
    "name": "visser",
    "version": env!("CARGO_PKG_VERSION"),
    "description": "Extraction endpoints for trading, agriculture, twitter and wikipedia data",
    "authentication": "POST /token with username and password, then send the access token in the `token` header",
    "write_types": ["return", "localstorage", "cloudstorage", "databasestorage"],
  }))
}

/// Run an extraction, persist its rows and log the job
///
/// `extract` yields the rows and the job description. The rows come back in
/// the response only for [`WriteType::Return`].
pub async fn run_job<T, F>(
  state: &AppState,
  user: &str,
  endpoint: &str,
  write_type: WriteType,
  extract: F,
) -> ApiResult<JobResponse<T>>
where
  T: Serialize + Sync,
  F: Future<Output = ApiResult<(Vec<T>, Value)>>,
{
  let tracker = &state.process_tracker;
  let process_id = tracker.start(endpoint).await;
  let started = Instant::now();

  let (rows, description) = match extract.await {
    Ok(extracted) => extracted,
    Err(e) => {
      tracker.complete(process_id, ProcessState::Failed, 0).await;
      return Err(e);
    }
  };

  let write_path = match state.storage.store_items(&rows, user, write_type, endpoint).await {
    Ok(path) => path,
    Err(e) => {
      tracker.complete(process_id, ProcessState::Failed, rows.len()).await;
      return Err(e.into());
    }
  };

  let elapsed = started.elapsed().as_secs();
  tracker.complete(process_id, ProcessState::Success, rows.len()).await;
  info!("{} for {}: {} rows in {}s, written to '{}'", endpoint, user, rows.len(), elapsed, write_path);

  let (metadata, _) = state.metadata.log_job(user, endpoint, write_type, description, elapsed, &write_path).await;
  let data = (write_type == WriteType::Return).then_some(rows);
  Ok(JobResponse { metadata, data })
}


#[cfg(test)]
mod tests {
  use super::test_support::*;
  use super::*;
  use actix_web::{test, App};
  use pretty_assertions::assert_eq;
  use std::sync::Arc;
  use visser_storage::metadata::TRANSACTIONS_COLLECTION;
  use visser_storage::MemoryDocumentStore;

  #[actix_web::test]
  async fn test_index() {
    let app = test::init_service(App::new().configure(configure)).await;
    let body: Value = test::call_and_read_body_json(&app, test::TestRequest::get().uri("/").to_request()).await;
    assert_eq!(body["name"], "visser");
  }

  #[actix_web::test]
  async fn test_api_requires_token() {
    let state = keyless_state(Arc::new(MemoryDocumentStore::new())).await;
    let app = test::init_service(App::new().app_data(state).configure(configure)).await;

    let response = test::call_service(&app, test::TestRequest::get().uri("/api/trading/symbols").to_request()).await;
    assert_eq!(response.status(), 401);

    let request = test::TestRequest::get().uri("/api/trading/symbols").insert_header(("token", "forged.token.value")).to_request();
    assert_eq!(test::call_service(&app, request).await.status(), 401);
  }

  #[actix_web::test]
  async fn test_run_job_logs_and_returns_rows() {
    let store = Arc::new(MemoryDocumentStore::new());
    let state = keyless_state(store.clone()).await;

    let response = run_job(&state, USER, "trading_symbols", WriteType::Return, async {
      Ok((vec![json!({"symbol": "AAPL"})], json!({"source": "test"})))
    })
    .await
    .unwrap();

    assert_eq!(response.data.as_ref().map(Vec::len), Some(1));
    assert_eq!(response.metadata.end_point, "trading/symbols");
    assert_eq!(response.metadata.write_path, "");

    let logged = store.all(TRANSACTIONS_COLLECTION).await;
    assert_eq!(logged.len(), 1);
    assert_eq!(logged[0]["job_description"]["source"], "test");

    let processes = state.process_tracker.get_all().await;
    assert_eq!(processes[0].state, ProcessState::Success);
  }

  #[actix_web::test]
  async fn test_run_job_marks_failures() {
    let state = keyless_state(Arc::new(MemoryDocumentStore::new())).await;
    let result: ApiResult<JobResponse<Value>> = run_job(&state, USER, "wiki_pageviews", WriteType::Return, async {
      Err(crate::error::ApiError::Upstream("down".into()))
    })
    .await;

    assert!(result.is_err());
    assert_eq!(state.process_tracker.get_all().await[0].state, ProcessState::Failed);
  }
}
