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

//! Document store abstraction
//!
//! Jobs, sessions, users and database writes are schemaless JSON documents
//! grouped into named collections. Production keeps them in a single Postgres
//! `documents` table with a `jsonb` body; development and tests use the
//! in-memory store.

use async_trait::async_trait;
use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool, PooledConnection};
use diesel::result::Error as DieselError;
use log::{error, info};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

pub type DbPool = Pool<ConnectionManager<PgConnection>>;
pub type DbConnection = PooledConnection<ConnectionManager<PgConnection>>;

const MAX_POOL_SIZE: u32 = 10;
const MIN_POOL_IDLE: u32 = 1;
/// Connection timeout in seconds, the pool fails instead of retrying forever
const CONNECTION_TIMEOUT_SECS: u64 = 30;

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS documents (
    id TEXT NOT NULL,
    collection TEXT NOT NULL,
    body JSONB NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    PRIMARY KEY (collection, id)
  );
  CREATE INDEX IF NOT EXISTS documents_body_idx ON documents USING GIN (body);";

/// Document store errors
#[derive(Error, Debug)]
pub enum RepositoryError {
  #[error("Connection pool error: {0}")]
  PoolError(String),

  #[error("Database query error: {0}")]
  QueryError(String),

  #[error("Serialization error: {0}")]
  SerializationError(String),

  #[error("Constraint violation: {0}")]
  ConstraintViolation(String),
}

impl From<DieselError> for RepositoryError {
  fn from(err: DieselError) -> Self {
    match err {
      DieselError::DatabaseError(kind, info) => match kind {
        diesel::result::DatabaseErrorKind::UniqueViolation => {
          RepositoryError::ConstraintViolation(info.message().to_string())
        }
        _ => RepositoryError::QueryError(info.message().to_string()),
      },
      _ => RepositoryError::QueryError(err.to_string()),
    }
  }
}

impl From<diesel::r2d2::PoolError> for RepositoryError {
  fn from(err: diesel::r2d2::PoolError) -> Self {
    RepositoryError::PoolError(err.to_string())
  }
}

impl From<serde_json::Error> for RepositoryError {
  fn from(err: serde_json::Error) -> Self {
    RepositoryError::SerializationError(err.to_string())
  }
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Collections of JSON documents
///
/// Filters match by containment: a document matches when every field of the
/// filter is present in it with an equal value.
#[async_trait]
pub trait DocumentStore: Send + Sync {
  /// Insert a document, returning its `_id`. A fresh UUID is assigned when absent.
  async fn insert_one(&self, collection: &str, document: Value) -> RepositoryResult<String>;

  /// Insert many documents, returning how many were written
  async fn insert_many(&self, collection: &str, documents: Vec<Value>) -> RepositoryResult<usize>;

  /// First document matching `filter`, oldest first
  async fn find_one(&self, collection: &str, filter: Value) -> RepositoryResult<Option<Value>>;

  /// Set the fields of `set` and add the numbers of `inc` on the first match
  ///
  /// Returns false when nothing matched.
  async fn update_one(&self, collection: &str, filter: Value, set: Value, inc: Value) -> RepositoryResult<bool>;

  /// Number of documents matching `filter`
  async fn count(&self, collection: &str, filter: Value) -> RepositoryResult<usize>;
}

/// Give a document an `_id` unless it carries one
pub fn with_id(document: Value) -> RepositoryResult<(String, Value)> {
  let Value::Object(mut fields) = document else {
    return Err(RepositoryError::SerializationError("documents must be JSON objects".to_string()));
  };

  let id = match fields.get("_id") {
    Some(Value::String(id)) => id.clone(),
    Some(other) => other.to_string(),
    None => {
      let id = Uuid::new_v4().to_string();
      fields.insert("_id".to_string(), Value::String(id.clone()));
      id
    }
  };

  Ok((id, Value::Object(fields)))
}

/// JSON containment, the semantics of the Postgres `@>` operator
pub fn contains(document: &Value, filter: &Value) -> bool {
  match (document, filter) {
    (Value::Object(doc), Value::Object(wanted)) => {
      wanted.iter().all(|(key, value)| doc.get(key).is_some_and(|field| contains(field, value)))
    }
    (Value::Array(doc), Value::Array(wanted)) => wanted.iter().all(|w| doc.iter().any(|d| contains(d, w))),
    (doc, wanted) => doc == wanted,
  }
}

fn add_numbers(current: Option<&Value>, delta: &Value) -> Value {
  let current = current.cloned().unwrap_or(Value::from(0));
  match (current.as_i64(), delta.as_i64()) {
    (Some(a), Some(b)) => Value::from(a + b),
    _ => Value::from(current.as_f64().unwrap_or(0.0) + delta.as_f64().unwrap_or(0.0)),
  }
}

/// Apply `$set`/`$inc` style changes to a document
pub fn apply_update(document: &mut Value, set: &Value, inc: &Value) {
  let Value::Object(fields) = document else {
    return;
  };

  if let Value::Object(set) = set {
    for (key, value) in set {
      fields.insert(key.clone(), value.clone());
    }
  }

  if let Value::Object(inc) = inc {
    for (key, delta) in inc {
      let next = add_numbers(fields.get(key), delta);
      fields.insert(key.clone(), next);
    }
  }
}

/// Postgres document store over a diesel r2d2 pool
#[derive(Clone)]
pub struct PgDocumentStore {
  pool: Arc<DbPool>,
}

#[derive(QueryableByName)]
struct DocumentRow {
  #[diesel(sql_type = diesel::sql_types::Text)]
  id: String,
  #[diesel(sql_type = diesel::sql_types::Jsonb)]
  body: Value,
}

#[derive(QueryableByName)]
struct CountRow {
  #[diesel(sql_type = diesel::sql_types::BigInt)]
  count: i64,
}

impl PgDocumentStore {
  /// Create a store with connection pooling
  ///
  /// Fails fast if the database is unavailable by testing the connection first.
  pub fn new(database_url: &str) -> RepositoryResult<Self> {
    PgConnection::establish(database_url)
      .map_err(|e| RepositoryError::PoolError(format!("Failed to connect to database: {}", e)))?;

    let manager = ConnectionManager::<PgConnection>::new(database_url);
    let pool = Pool::builder()
      .max_size(MAX_POOL_SIZE)
      .min_idle(Some(MIN_POOL_IDLE))
      .connection_timeout(Duration::from_secs(CONNECTION_TIMEOUT_SECS))
      .build(manager)
      .map_err(|e| RepositoryError::PoolError(e.to_string()))?;

    Ok(Self { pool: Arc::new(pool) })
  }

  /// Create the `documents` table when it does not exist yet
  pub async fn ensure_schema(&self) -> RepositoryResult<()> {
    self
      .run(|conn| {
        conn.batch_execute(SCHEMA)?;
        Ok(())
      })
      .await
  }

  /// Execute a blocking database operation asynchronously
  pub async fn run<F, R>(&self, f: F) -> RepositoryResult<R>
  where
    F: FnOnce(&mut DbConnection) -> RepositoryResult<R> + Send + 'static,
    R: Send + 'static,
  {
    let pool = Arc::clone(&self.pool);
    tokio::task::spawn_blocking(move || {
      let mut conn = pool.get()?;
      f(&mut conn)
    })
    .await
    .map_err(|e| RepositoryError::QueryError(format!("Task join error: {}", e)))?
  }
}

fn insert_document(conn: &mut PgConnection, collection: &str, id: &str, body: &Value) -> RepositoryResult<()> {
  use diesel::sql_types::{Jsonb, Text};

  diesel::sql_query("INSERT INTO documents (id, collection, body) VALUES ($1, $2, $3)")
    .bind::<Text, _>(id)
    .bind::<Text, _>(collection)
    .bind::<Jsonb, _>(body)
    .execute(conn)?;
  Ok(())
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
  async fn insert_one(&self, collection: &str, document: Value) -> RepositoryResult<String> {
    let collection = collection.to_string();
    let (id, body) = with_id(document)?;

    self
      .run(move |conn| {
        insert_document(conn, &collection, &id, &body)?;
        Ok(id)
      })
      .await
  }

  async fn insert_many(&self, collection: &str, documents: Vec<Value>) -> RepositoryResult<usize> {
    let collection = collection.to_string();
    let documents = documents.into_iter().map(with_id).collect::<RepositoryResult<Vec<_>>>()?;

    self
      .run(move |conn| {
        conn.transaction::<_, RepositoryError, _>(|conn| {
          for (id, body) in &documents {
            insert_document(conn, &collection, id, body)?;
          }
          Ok(documents.len())
        })
      })
      .await
  }

  async fn find_one(&self, collection: &str, filter: Value) -> RepositoryResult<Option<Value>> {
    let collection = collection.to_string();

    self
      .run(move |conn| {
        use diesel::sql_types::{Jsonb, Text};

        let row: Option<DocumentRow> = diesel::sql_query(
          "SELECT id, body FROM documents WHERE collection = $1 AND body @> $2 ORDER BY created_at LIMIT 1",
        )
        .bind::<Text, _>(&collection)
        .bind::<Jsonb, _>(&filter)
        .get_result(conn)
        .optional()?;

        Ok(row.map(|r| r.body))
      })
      .await
  }

  async fn update_one(&self, collection: &str, filter: Value, set: Value, inc: Value) -> RepositoryResult<bool> {
    let collection = collection.to_string();

    self
      .run(move |conn| {
        use diesel::sql_types::{Jsonb, Text};

        conn.transaction::<_, RepositoryError, _>(|conn| {
          let row: Option<DocumentRow> = diesel::sql_query(
            "SELECT id, body FROM documents WHERE collection = $1 AND body @> $2
             ORDER BY created_at LIMIT 1 FOR UPDATE",
          )
          .bind::<Text, _>(&collection)
          .bind::<Jsonb, _>(&filter)
          .get_result(conn)
          .optional()?;

          let Some(DocumentRow { id, mut body }) = row else {
            return Ok(false);
          };
          apply_update(&mut body, &set, &inc);

          diesel::sql_query("UPDATE documents SET body = $3 WHERE collection = $1 AND id = $2")
            .bind::<Text, _>(&collection)
            .bind::<Text, _>(&id)
            .bind::<Jsonb, _>(&body)
            .execute(conn)?;
          Ok(true)
        })
      })
      .await
  }

  async fn count(&self, collection: &str, filter: Value) -> RepositoryResult<usize> {
    let collection = collection.to_string();

    self
      .run(move |conn| {
        use diesel::sql_types::{Jsonb, Text};

        let row: CountRow =
          diesel::sql_query("SELECT COUNT(*) AS count FROM documents WHERE collection = $1 AND body @> $2")
            .bind::<Text, _>(&collection)
            .bind::<Jsonb, _>(&filter)
            .get_result(conn)?;

        Ok(usize::try_from(row.count).unwrap_or_default())
      })
      .await
  }
}

/// Document store kept in process memory
#[derive(Default)]
pub struct MemoryDocumentStore {
  collections: RwLock<HashMap<String, Vec<Value>>>,
}

impl MemoryDocumentStore {
  pub fn new() -> Self {
    Self::default()
  }

  /// Every document of a collection, in insertion order
  pub async fn all(&self, collection: &str) -> Vec<Value> {
    self.collections.read().await.get(collection).cloned().unwrap_or_default()
  }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
  async fn insert_one(&self, collection: &str, document: Value) -> RepositoryResult<String> {
    let (id, body) = with_id(document)?;
    self.collections.write().await.entry(collection.to_string()).or_default().push(body);
    Ok(id)
  }

  async fn insert_many(&self, collection: &str, documents: Vec<Value>) -> RepositoryResult<usize> {
    let bodies = documents.into_iter().map(|d| with_id(d).map(|(_, body)| body)).collect::<RepositoryResult<Vec<_>>>()?;
    let written = bodies.len();
    self.collections.write().await.entry(collection.to_string()).or_default().extend(bodies);
    Ok(written)
  }

  async fn find_one(&self, collection: &str, filter: Value) -> RepositoryResult<Option<Value>> {
    let collections = self.collections.read().await;
    Ok(collections.get(collection).and_then(|docs| docs.iter().find(|d| contains(d, &filter)).cloned()))
  }

  async fn update_one(&self, collection: &str, filter: Value, set: Value, inc: Value) -> RepositoryResult<bool> {
    let mut collections = self.collections.write().await;
    let Some(document) = collections.get_mut(collection).and_then(|docs| docs.iter_mut().find(|d| contains(d, &filter)))
    else {
      return Ok(false);
    };

    apply_update(document, &set, &inc);
    Ok(true)
  }

  async fn count(&self, collection: &str, filter: Value) -> RepositoryResult<usize> {
    let collections = self.collections.read().await;
    Ok(collections.get(collection).map(|docs| docs.iter().filter(|d| contains(d, &filter)).count()).unwrap_or(0))
  }
}

/// Postgres store when a database URL is configured, memory store otherwise
pub async fn open_document_store(database_url: Option<&str>) -> RepositoryResult<Arc<dyn DocumentStore>> {
  match database_url {
    Some(url) => {
      let store = PgDocumentStore::new(url).inspect_err(|e| error!("Document store unavailable: {}", e))?;
      store.ensure_schema().await?;
      info!("Using postgres document store");
      Ok(Arc::new(store))
    }
    None => {
      info!("DATABASE_URL not set, using in-memory document store");
      Ok(Arc::new(MemoryDocumentStore::new()))
    }
  }
}

/// Empty object, the filter matching every document
pub fn all_documents() -> Value {
  Value::Object(Map::new())
}
