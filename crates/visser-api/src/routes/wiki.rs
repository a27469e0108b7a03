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

use actix_web::{post, web, HttpResponse};
use serde_json::json;
use visser_core::WriteType;
use visser_loaders::DataLoader;
use visser_models::jobs::{PageviewParams, WriteTypeQuery};

use crate::auth::HasAccess;
use crate::error::ApiResult;
use crate::routes::run_job;
use crate::state::AppState;

/// Daily pageviews of the given article titles
#[post("/wiki/pageviews")]
pub async fn pageviews(
  state: web::Data<AppState>,
  access: HasAccess,
  params: web::Json<PageviewParams>,
  query: web::Query<WriteTypeQuery>,
) -> ApiResult<HttpResponse> {
  let params = params.into_inner();
  let write_type =
    state.resolve_write_type(params.write_type, query.write_type, WriteType::default_for(state.environment()))?;
  let titles = params.titles.len();
  let (past_days, agent) = (params.past_days, params.agent.clone());

  let response = run_job(&state, access.user(), "wiki_pageviews", write_type, async {
    let rows = state.wikipedia.load(&state.context, params).await?;
    let description = json!({ "titles": titles, "past_days": past_days, "agent": agent, "views": rows.len() });
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
  use visser_client::{VisserClient, WikipediaEndpoints};
  use visser_storage::MemoryDocumentStore;
  use wiremock::matchers::path_regex;
  use wiremock::{Mock, MockServer, ResponseTemplate};

  #[actix_web::test]
  async fn test_pageviews() {
    let server = MockServer::start().await;
    Mock::given(path_regex("/per-article/en.wikipedia/all-access/user/Apple_Inc/daily/"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({"items": [
        {"project": "en.wikipedia", "article": "Apple_Inc", "granularity": "daily",
         "timestamp": "2022010100", "access": "all-access", "agent": "user", "views": 321}
      ]})))
      .mount(&server)
      .await;

    let client = VisserClient::keyless(&settings())
      .unwrap()
      .with_wikipedia(WikipediaEndpoints::with_base_url(&server.uri(), &settings()).unwrap());
    let state = state_with(client, Arc::new(MemoryDocumentStore::new())).await;
    let app = test::init_service(App::new().app_data(state.clone()).configure(configure)).await;

    let request = test::TestRequest::post()
      .uri("/api/wiki/pageviews")
      .insert_header(("token", token(&state)))
      .set_json(json!({"titles": ["Apple Inc"], "past_days": 3, "write_type": "return"}))
      .to_request();
    let body: Value = test::call_and_read_body_json(&app, request).await;

    assert_eq!(body["end_point"], "wiki/pageviews");
    assert_eq!(body["data"][0]["views"], 321);
    assert_eq!(body["job_description"]["titles"], 1);
  }

  #[actix_web::test]
  async fn test_unknown_agent_is_bad_request() {
    let state = keyless_state(Arc::new(MemoryDocumentStore::new())).await;
    let app = test::init_service(App::new().app_data(state.clone()).configure(configure)).await;

    let request = test::TestRequest::post()
      .uri("/api/wiki/pageviews?write_type=return")
      .insert_header(("Authorization", format!("Bearer {}", token(&state))))
      .set_json(json!({"titles": ["Apple Inc"], "agent": "robot"}))
      .to_request();
    assert_eq!(test::call_service(&app, request).await.status(), 400);
  }

  #[actix_web::test]
  async fn test_out_of_range_past_days_is_bad_request() {
    let state = keyless_state(Arc::new(MemoryDocumentStore::new())).await;
    let app = test::init_service(App::new().app_data(state.clone()).configure(configure)).await;

    let request = test::TestRequest::post()
      .uri("/api/wiki/pageviews?write_type=return")
      .insert_header(("token", token(&state)))
      .set_json(json!({"titles": ["Apple Inc"], "past_days": 200_000_000_i64}))
      .to_request();
    assert_eq!(test::call_service(&app, request).await.status(), 400);
  }
}
