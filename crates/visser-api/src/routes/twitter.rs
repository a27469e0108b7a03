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
use visser_core::{RelationshipType, WriteType};
use visser_loaders::twitter::distinct_requested;
use visser_loaders::clean_rows;
use visser_models::jobs::{FollowsParams, UsersParams, WriteTypeQuery};
use visser_storage::urls::{twitter_followers_storage_url, twitter_followings_storage_url};

use crate::auth::HasAccess;
use crate::error::{ApiError, ApiResult};
use crate::routes::run_job;
use crate::state::AppState;

fn missing_users() -> ApiError {
  ApiError::NotFound("Please supply either user_ids or screen_names".to_string())
}

async fn follows(
  state: &AppState,
  user: &str,
  relationship: RelationshipType,
  params: FollowsParams,
  query: WriteTypeQuery,
) -> ApiResult<HttpResponse> {
  let write_type =
    state.resolve_write_type(params.write_type, query.write_type, WriteType::default_for(state.environment()))?;
  let refs = params.user_refs()?.ok_or_else(missing_users)?;
  let crawler = state.crawler()?;
  let requested = params.users_requested();

  let storage_url = match relationship {
    RelationshipType::Followers => twitter_followers_storage_url(requested),
    RelationshipType::Followings => twitter_followings_storage_url(requested),
  };

  let response = run_job(state, user, relationship.endpoint(), write_type, async {
    let chunks = crawler.follows(relationship, &refs, params.chunk_size, params.upper_limit).await;
    let rows = clean_rows(chunks.into_iter().flatten().collect());
    let description = json!({
      "users_requested": requested,
      "users_requested_extracted": distinct_requested(relationship, &rows),
      "storage_url": storage_url,
    });
    Ok((rows, description))
  })
  .await?;

  Ok(HttpResponse::Ok().json(response))
}

/// Follower edges of the requested users
#[post("/twitter/followers")]
pub async fn followers(
  state: web::Data<AppState>,
  access: HasAccess,
  params: web::Json<FollowsParams>,
  query: web::Query<WriteTypeQuery>,
) -> ApiResult<HttpResponse> {
  follows(&state, access.user(), RelationshipType::Followers, params.into_inner(), query.into_inner()).await
}

/// Following edges of the requested users
#[post("/twitter/followings")]
pub async fn followings(
  state: web::Data<AppState>,
  access: HasAccess,
  params: web::Json<FollowsParams>,
  query: web::Query<WriteTypeQuery>,
) -> ApiResult<HttpResponse> {
  follows(&state, access.user(), RelationshipType::Followings, params.into_inner(), query.into_inner()).await
}

/// Profiles of the requested users
#[post("/twitter/users")]
pub async fn users(
  state: web::Data<AppState>,
  access: HasAccess,
  params: web::Json<UsersParams>,
  query: web::Query<WriteTypeQuery>,
) -> ApiResult<HttpResponse> {
  let params = params.into_inner();
  let write_type =
    state.resolve_write_type(params.write_type, query.write_type, WriteType::default_for(state.environment()))?;
  let refs = params.user_refs()?.ok_or_else(missing_users)?;
  let crawler = state.crawler()?;

  let response = run_job(&state, access.user(), "twitter_users", write_type, async {
    let chunks = crawler.user_info(&refs, params.chunk_size).await?;
    let rows = clean_rows(chunks.into_iter().flatten().collect());
    let description = json!({ "users_requested": params.users_requested(), "users_extracted": rows.len() });
    Ok((rows, description))
  })
  .await?;

  Ok(HttpResponse::Ok().json(response))
}
