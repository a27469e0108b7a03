//! Twitter follow graph and profile extraction

pub mod crawler;
pub mod rotator;

pub use crawler::{chunk_rows, distinct_requested, seconds_until_reset, TwitterCrawler};
pub use rotator::CredentialRotator;
