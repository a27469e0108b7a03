//! # visser-storage
//!
//! Where extracted rows and service bookkeeping end up:
//!
//! - [`storage::StorageUtility`] writes rows as local TSV chunks, cloud
//!   objects or documents, depending on the request's write type
//! - [`repository`] holds the document store (Postgres `jsonb` or memory)
//! - [`metadata`] records jobs, historical trading pulls and user sessions
//! - [`urls`] builds the logical storage identifiers

pub mod error;
pub mod metadata;
pub mod repository;
pub mod storage;
pub mod urls;

pub use error::{StorageError, StorageResult};
pub use metadata::{MetadataLogger, SessionTracker, USERS_COLLECTION};
pub use repository::{
  open_document_store, DocumentStore, MemoryDocumentStore, PgDocumentStore, RepositoryError, RepositoryResult,
};
pub use storage::StorageUtility;
