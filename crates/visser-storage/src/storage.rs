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

//! Chunked writers behind every extraction endpoint

use crate::error::{StorageError, StorageResult};
use crate::repository::DocumentStore;
use chrono::{Datelike, Local, NaiveDateTime};
use rayon::prelude::*;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, instrument};
use visser_client::transport::{bearer_header, Transport};
use visser_core::{Config, Environment, WriteType, GCS_UPLOAD_BASE_URL, MAX_CHUNK_ROWS};

/// Upload target for `cloudstorage` writes
struct CloudWriter {
  bucket: String,
  transport: Transport,
}

/// Persists extracted rows according to the requested write type
///
/// Large results are split into balanced chunks of at most
/// [`MAX_CHUNK_ROWS`] rows; each chunk becomes one file, object or batch of
/// documents. The returned string is the location recorded in job metadata.
pub struct StorageUtility {
  environment: Environment,
  local_root: PathBuf,
  cloud: Option<CloudWriter>,
  documents: Arc<dyn DocumentStore>,
}

/// Split `rows` into the fewest chunks of at most `max_rows`, sizes differing by at most one
pub fn split_balanced<T>(rows: &[T], max_rows: usize) -> Vec<&[T]> {
  let max_rows = max_rows.max(1);
  if rows.len() <= max_rows {
    return vec![rows];
  }

  let chunks = rows.len().div_ceil(max_rows);
  let (base, extra) = (rows.len() / chunks, rows.len() % chunks);

  let mut out = Vec::with_capacity(chunks);
  let mut start = 0;
  for i in 0..chunks {
    let len = base + usize::from(i < extra);
    out.push(&rows[start..start + len]);
    start += len;
  }
  out
}

/// Tab separated rows with a header line
pub fn to_tsv<T: Serialize>(rows: &[T]) -> StorageResult<Vec<u8>> {
  let mut writer = csv::WriterBuilder::new().delimiter(b'\t').from_writer(Vec::new());
  for row in rows {
    writer.serialize(row)?;
  }
  writer.into_inner().map_err(|e| StorageError::Serialization(e.to_string()))
}

impl StorageUtility {
  /// Storage for the configured environment, bucket and local root
  pub fn new(config: &Config, documents: Arc<dyn DocumentStore>) -> StorageResult<Self> {
    let storage = &config.storage;
    let cloud = match (&storage.google_bucket, &storage.google_access_token) {
      (Some(bucket), Some(token)) => Some(CloudWriter {
        bucket: bucket.clone(),
        transport: Transport::with_headers(GCS_UPLOAD_BASE_URL, &config.transport, bearer_header(token)?)?,
      }),
      _ => None,
    };

    Ok(Self { environment: config.environment, local_root: storage.local_root.clone(), cloud, documents })
  }

  /// Send cloud writes to `base_url` instead of the public upload API
  pub fn with_cloud_base_url(mut self, base_url: &str, config: &Config) -> StorageResult<Self> {
    let bucket = config.storage.google_bucket.clone().ok_or_else(|| StorageError::Config("GOOGLE_BUCKET_NAME not set".to_string()))?;
    let token = config.storage.google_access_token.as_deref().unwrap_or_default();
    self.cloud = Some(CloudWriter { bucket, transport: Transport::with_headers(base_url, &config.transport, bearer_header(token)?)? });
    Ok(self)
  }

  pub fn environment(&self) -> Environment {
    self.environment
  }

  /// Persist `rows` for `user` under the storage name `endpoint`, e.g. `twitter_followers`
  pub async fn store_items<T>(&self, rows: &[T], user: &str, write_type: WriteType, endpoint: &str) -> StorageResult<String>
  where
    T: Serialize + Sync,
  {
    self.store_items_at(rows, user, write_type, endpoint, Local::now().naive_local()).await
  }

  /// [`Self::store_items`] with an explicit clock reading
  #[instrument(skip(self, rows), fields(rows = rows.len(), write_type = %write_type))]
  pub async fn store_items_at<T>(
    &self,
    rows: &[T],
    user: &str,
    write_type: WriteType,
    endpoint: &str,
    now: NaiveDateTime,
  ) -> StorageResult<String>
  where
    T: Serialize + Sync,
  {
    write_type.ensure_allowed(self.environment)?;

    let chunks = split_balanced(rows, MAX_CHUNK_ROWS);
    debug!("{} rows in {} chunks", rows.len(), chunks.len());

    let path = match write_type {
      WriteType::Return => String::new(),
      WriteType::LocalStorage => self.write_local(&chunks, endpoint, now).await?,
      WriteType::CloudStorage => self.write_cloud(&chunks, user, endpoint, now).await?,
      WriteType::DatabaseStorage => self.write_database(&chunks, endpoint).await?,
    };

    info!("Stored {} rows for {} via {} at '{}'", rows.len(), endpoint, write_type, path);
    Ok(path)
  }

  async fn write_local<T>(&self, chunks: &[&[T]], endpoint: &str, now: NaiveDateTime) -> StorageResult<String>
  where
    T: Serialize + Sync,
  {
    let payloads = chunks.par_iter().map(|chunk| to_tsv(chunk)).collect::<StorageResult<Vec<_>>>()?;

    // twitter_followings -> twitter/output/followings
    let (platform, name) = endpoint.split_once('_').unwrap_or((endpoint, "data"));
    let dir = self.local_root.join(platform).join("output").join(name).join(now.format("%Y%m%d").to_string());
    tokio::fs::create_dir_all(&dir).await?;

    let stamp = now.format("%Y%m%d%H%M");
    for (chunk_no, bytes) in payloads.into_iter().enumerate() {
      tokio::fs::write(dir.join(format!("{}_chunk_{}.tsv", stamp, chunk_no)), bytes).await?;
    }

    Ok(dir.to_string_lossy().into_owned())
  }

  async fn write_cloud<T>(&self, chunks: &[&[T]], user: &str, endpoint: &str, now: NaiveDateTime) -> StorageResult<String>
  where
    T: Serialize + Sync,
  {
    let cloud = self.cloud.as_ref().ok_or_else(|| {
      StorageError::Config("GOOGLE_BUCKET_NAME and GOOGLE_ACCESS_TOKEN must be set for cloudstorage".to_string())
    })?;

    let payloads = chunks.par_iter().map(|chunk| to_tsv(chunk)).collect::<StorageResult<Vec<_>>>()?;

    let stamp = now.format("%Y%m%d%H%M").to_string();
    let prefix = format!("data/{}/{}/{}_{}/", endpoint.replace('_', "/"), now.year(), user, stamp);
    let upload_path = format!("/upload/storage/v1/b/{}/o", cloud.bucket);

    for (chunk_no, bytes) in payloads.into_iter().enumerate() {
      let name = format!("{}{}_chunk_{}.csv", prefix, stamp, chunk_no);
      cloud
        .transport
        .post_bytes(&upload_path, &[("uploadType", "media".to_string()), ("name", name)], "text/csv", bytes)
        .await?;
    }

    Ok(format!("gs://{}/{}", cloud.bucket, prefix))
  }

  async fn write_database<T>(&self, chunks: &[&[T]], endpoint: &str) -> StorageResult<String>
  where
    T: Serialize + Sync,
  {
    for chunk in chunks {
      let documents = chunk.iter().map(serde_json::to_value).collect::<Result<Vec<_>, _>>()?;
      self.documents.insert_many(endpoint, documents).await?;
    }
    Ok(format!("database://{}", endpoint))
  }
}
