//! # visser-api
//!
//! actix-web facade over the Visser loaders.
//!
//! `POST /token` trades a username and password for an HS256 access token.
//! Every route under `/api` requires that token, runs one extraction, writes
//! the rows with the requested write type and answers with the job metadata.

pub mod auth;
pub mod error;
pub mod routes;
pub mod state;

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use std::sync::Arc;
use tracing::info;
use visser_client::VisserClient;
use visser_core::Config;
use visser_storage::open_document_store;

pub use auth::{HasAccess, TokenSigner};
pub use error::{ApiError, ApiResult};
pub use state::AppState;

/// Browser access from local front ends only
pub fn cors() -> Cors {
  Cors::default()
    .allowed_origin_fn(|origin, _req| {
      origin.to_str().is_ok_and(|o| o.starts_with("http://localhost") || o.starts_with("https://localhost"))
    })
    .allow_any_method()
    .allow_any_header()
    .supports_credentials()
}

/// Shared state from the environment: upstream clients, document store and storage
pub async fn build_state(config: Config) -> ApiResult<AppState> {
  let client = Arc::new(VisserClient::new(&config)?);
  let documents = open_document_store(config.storage.database_url.as_deref())
    .await
    .map_err(|e| ApiError::Storage(e.to_string()))?;
  AppState::new(config, client, documents)
}

/// Serve the API until shutdown
pub async fn run(state: AppState) -> std::io::Result<()> {
  let bind = state.config.bind_address();
  let state = web::Data::new(state);
  info!("Visser listening on {}", bind);

  HttpServer::new(move || {
    App::new()
      .wrap(Logger::default())
      .wrap(cors())
      .app_data(state.clone())
      .configure(routes::configure)
  })
  .bind(bind)?
  .run()
  .await
}

#[cfg(test)]
mod tests {
  use super::*;
  use actix_web::http::header;
  use actix_web::test;

  #[actix_web::test]
  async fn test_cors_allows_localhost() {
    let app = test::init_service(App::new().wrap(cors()).configure(routes::configure)).await;

    let request = test::TestRequest::get().uri("/").insert_header((header::ORIGIN, "http://localhost:3000")).to_request();
    let response = test::call_service(&app, request).await;
    assert_eq!(
      response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).and_then(|v| v.to_str().ok()),
      Some("http://localhost:3000")
    );
    assert_eq!(
      response.headers().get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS).and_then(|v| v.to_str().ok()),
      Some("true")
    );
  }
}
