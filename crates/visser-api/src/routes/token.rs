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

use actix_web::{post, web, HttpRequest, HttpResponse};
use serde::Deserialize;
use tracing::{info, warn};
use visser_models::jobs::TokenResponse;

use crate::auth::{verify_credentials, INVALID_CREDENTIALS};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct TokenForm {
  pub username: Option<String>,
  pub password: Option<String>,
}

/// Exchange a username and password for an access token
///
/// Limited per socket peer address, forwarding headers are ignored. A token
/// also opens a new session for the user.
#[post("/token")]
pub async fn token(state: web::Data<AppState>, req: HttpRequest, form: web::Form<TokenForm>) -> ApiResult<HttpResponse> {
  let client = req.peer_addr().map(|addr| addr.ip().to_string()).unwrap_or_else(|| "unknown".to_string());
  if !state.token_limiter.check(&client) {
    warn!("Token rate limit hit by {}", client);
    return Err(ApiError::TooManyRequests("Too many token requests, try again in a minute".to_string()));
  }

  let form = form.into_inner();
  let (Some(username), Some(password)) = (form.username, form.password) else {
    return Err(ApiError::NotFound("Invalid Payload Headers Supplied...".to_string()));
  };

  if !verify_credentials(state.documents.as_ref(), &username, &password).await {
    warn!("Rejected credentials for {} from {}", username, client);
    return Err(ApiError::Unauthorized(INVALID_CREDENTIALS.to_string()));
  }

  let access_token = state.signer.generate_token(&username)?;
  state.sessions.instantiate(&username).await;
  info!("Issued token to {}", username);

  Ok(HttpResponse::Ok().json(TokenResponse::bearer(access_token)))
}
