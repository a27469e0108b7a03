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

//! Access tokens, password hashes and the request guard of `/api/*`

use actix_web::dev::Payload;
use actix_web::http::header::AUTHORIZATION;
use actix_web::{web, FromRequest, HttpRequest};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::{Duration, Utc};
use futures::future::LocalBoxFuture;
use hmac::{Hmac, Mac};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use tracing::{debug, warn};
use visser_storage::{DocumentStore, USERS_COLLECTION};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

type HmacSha256 = Hmac<Sha256>;

pub const ALGORITHM: &str = "HS256";
pub const INVALID_CREDENTIALS: &str = "Could not validate credentials";

/// Header carrying the access token
pub const TOKEN_HEADER: &str = "token";

fn unauthorized() -> ApiError {
  ApiError::Unauthorized(INVALID_CREDENTIALS.to_string())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
  /// Expiry, seconds since the epoch
  pub exp: i64,
  pub user: String,
}

/// Signs and checks HS256 access tokens
#[derive(Clone)]
pub struct TokenSigner {
  secret: Vec<u8>,
  lifetime: Duration,
}

impl TokenSigner {
  pub fn new(secret: &str, lifetime_hours: i64) -> Self {
    Self { secret: secret.as_bytes().to_vec(), lifetime: Duration::hours(lifetime_hours) }
  }

  fn mac(&self) -> ApiResult<HmacSha256> {
    HmacSha256::new_from_slice(&self.secret).map_err(|e| ApiError::Internal(format!("Invalid signing key: {}", e)))
  }

  /// Token for `user`, valid for the configured lifetime
  pub fn generate_token(&self, user: &str) -> ApiResult<String> {
    let exp = (Utc::now() + self.lifetime).timestamp();
    self.sign(&Claims { exp, user: user.to_string() })
  }

  pub fn sign(&self, claims: &Claims) -> ApiResult<String> {
    let header = json!({ "alg": ALGORITHM, "typ": "JWT" });
    let encode = |value: &Value| -> ApiResult<String> {
      let bytes = serde_json::to_vec(value).map_err(|e| ApiError::Internal(e.to_string()))?;
      Ok(URL_SAFE_NO_PAD.encode(bytes))
    };
    let claims = serde_json::to_value(claims).map_err(|e| ApiError::Internal(e.to_string()))?;
    let signing_input = format!("{}.{}", encode(&header)?, encode(&claims)?);

    let mut mac = self.mac()?;
    mac.update(signing_input.as_bytes());
    let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

    Ok(format!("{}.{}", signing_input, signature))
  }

  /// User named by a valid, unexpired token
  pub fn verify_token(&self, token: &str) -> ApiResult<String> {
    let mut parts = token.trim().split('.');
    let (Some(header), Some(payload), Some(signature), None) = (parts.next(), parts.next(), parts.next(), parts.next())
    else {
      return Err(unauthorized());
    };

    let decode = |segment: &str| URL_SAFE_NO_PAD.decode(segment).map_err(|_| unauthorized());

    let header_json: Value = serde_json::from_slice(&decode(header)?).map_err(|_| unauthorized())?;
    if header_json.get("alg").and_then(Value::as_str) != Some(ALGORITHM) {
      return Err(unauthorized());
    }

    let mut mac = self.mac()?;
    mac.update(format!("{}.{}", header, payload).as_bytes());
    mac.verify_slice(&decode(signature)?).map_err(|_| unauthorized())?;

    let claims: Claims = serde_json::from_slice(&decode(payload)?).map_err(|_| unauthorized())?;
    if claims.exp <= Utc::now().timestamp() || claims.user.trim().is_empty() {
      return Err(unauthorized());
    }

    Ok(claims.user)
  }
}

/// Hex SHA-256 of the salt followed by the password
pub fn hash_password(password: &str, salt: &str) -> String {
  let mut hasher = Sha256::new();
  hasher.update(salt.as_bytes());
  hasher.update(password.as_bytes());
  hex::encode(hasher.finalize())
}

pub fn generate_salt() -> String {
  let mut bytes = [0u8; 16];
  rand::thread_rng().fill_bytes(&mut bytes);
  hex::encode(bytes)
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
  a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Check a username and password against the `users` collection
///
/// Unknown users, malformed records and store failures all count as a mismatch.
pub async fn verify_credentials(store: &dyn DocumentStore, username: &str, password: &str) -> bool {
  let record = match store.find_one(USERS_COLLECTION, json!({ "username": username })).await {
    Ok(Some(record)) => record,
    Ok(None) => {
      debug!("Unknown user {}", username);
      return false;
    }
    Err(e) => {
      warn!("Could not look up user {}: {}", username, e);
      return false;
    }
  };

  let (Some(salt), Some(expected)) =
    (record.get("salt").and_then(Value::as_str), record.get("password_hash").and_then(Value::as_str))
  else {
    warn!("User record of {} has no password hash", username);
    return false;
  };

  constant_time_eq(hash_password(password, salt).as_bytes(), expected.as_bytes())
}

/// Store a new user with a salted password hash
pub async fn add_user(store: &dyn DocumentStore, username: &str, password: &str) -> ApiResult<String> {
  let username = username.trim();
  if username.is_empty() || password.is_empty() {
    return Err(ApiError::BadRequest("Username and password must not be empty".to_string()));
  }

  let existing = store
    .count(USERS_COLLECTION, json!({ "username": username }))
    .await
    .map_err(|e| ApiError::Storage(e.to_string()))?;
  if existing > 0 {
    return Err(ApiError::BadRequest(format!("User {} already exists", username)));
  }

  let salt = generate_salt();
  let document = json!({
    "username": username,
    "salt": salt,
    "password_hash": hash_password(password, &salt),
    "created_at": Utc::now().to_rfc3339(),
  });
  store.insert_one(USERS_COLLECTION, document).await.map_err(|e| ApiError::Storage(e.to_string()))
}

/// Token from the `token` header, or from `Authorization: Bearer`
fn request_token(req: &HttpRequest) -> Option<String> {
  let headers = req.headers();
  if let Some(token) = headers.get(TOKEN_HEADER).and_then(|v| v.to_str().ok()) {
    return Some(token.trim().to_string());
  }
  headers
    .get(AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .and_then(|v| v.strip_prefix("Bearer ").or_else(|| v.strip_prefix("bearer ")))
    .map(|token| token.trim().to_string())
}

/// Authenticated caller, holding the username from the token
///
/// Each successful extraction counts a query against the user's session.
#[derive(Debug, Clone, PartialEq)]
pub struct HasAccess(pub String);

impl HasAccess {
  pub fn user(&self) -> &str {
    &self.0
  }
}

impl FromRequest for HasAccess {
  type Error = ApiError;
  type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
    let state = req.app_data::<web::Data<AppState>>().cloned();
    let token = request_token(req);

    Box::pin(async move {
      let state = state.ok_or_else(|| ApiError::Internal("Application state is not configured".to_string()))?;
      let token = token.ok_or_else(unauthorized)?;
      let user = state.signer.verify_token(&token)?;
      if !state.sessions.ping(&user).await {
        debug!("No open session for {}", user);
      }
      Ok(HasAccess(user))
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use pretty_assertions::assert_eq;
  use visser_storage::MemoryDocumentStore;

  fn signer() -> TokenSigner {
    TokenSigner::new("test-secret", 24)
  }

  #[test]
  fn test_token_round_trip() {
    let token = signer().generate_token("alice").unwrap();
    assert_eq!(token.split('.').count(), 3);
    assert_eq!(signer().verify_token(&token).unwrap(), "alice");
  }

  #[test]
  fn test_rejects_expired_token() {
    let claims = Claims { exp: Utc::now().timestamp() - 10, user: "alice".into() };
    let token = signer().sign(&claims).unwrap();
    assert!(matches!(signer().verify_token(&token), Err(ApiError::Unauthorized(msg)) if msg == INVALID_CREDENTIALS));
  }

  #[test]
  fn test_rejects_other_secret_and_tampering() {
    let token = TokenSigner::new("other-secret", 24).generate_token("alice").unwrap();
    assert!(signer().verify_token(&token).is_err());

    let token = signer().generate_token("alice").unwrap();
    let parts: Vec<&str> = token.split('.').collect();
    let forged = URL_SAFE_NO_PAD.encode(br#"{"exp":9999999999,"user":"mallory"}"#);
    assert!(signer().verify_token(&format!("{}.{}.{}", parts[0], forged, parts[2])).is_err());
    assert!(signer().verify_token("not-a-token").is_err());
  }

  #[test]
  fn test_rejects_other_algorithm() {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none","typ":"JWT"}"#);
    let token = signer().generate_token("alice").unwrap();
    let parts: Vec<&str> = token.split('.').collect();
    assert!(signer().verify_token(&format!("{}.{}.{}", header, parts[1], parts[2])).is_err());
  }

  #[test]
  fn test_hash_password() {
    assert_eq!(hash_password("secret", "salt"), hash_password("secret", "salt"));
    assert_ne!(hash_password("secret", "salt"), hash_password("secret", "pepper"));
    assert_eq!(hash_password("secret", "salt").len(), 64);
    assert_eq!(generate_salt().len(), 32);
  }

  #[tokio::test]
  async fn test_verify_credentials() {
    let store = MemoryDocumentStore::new();
    add_user(&store, "alice", "wonderland").await.unwrap();

    assert!(verify_credentials(&store, "alice", "wonderland").await);
    assert!(!verify_credentials(&store, "alice", "looking-glass").await);
    assert!(!verify_credentials(&store, "bob", "wonderland").await);
    assert!(add_user(&store, "alice", "again").await.is_err());
  }
}
