//! # visser-loaders
//!
//! Extraction jobs behind the Visser API.
//!
//! This crate provides loaders for:
//! - Historical candles and symbol lists (Finnhub, AlphaVantage, CoinAPI)
//! - EIA ethanol series and USDA export sales
//! - Wikipedia daily pageviews
//! - The twitter follow graph and user profiles, crawled across a pool of
//!   applications

pub mod agriculture;
pub mod batch_processor;
pub mod cleaning;
pub mod error;
pub mod loader;
pub mod process_tracker;
pub mod trading;
pub mod twitter;
pub mod wikipedia;

// Re-export commonly used types
pub use batch_processor::{BatchConfig, BatchProcessor, BatchResult};
pub use error::{LoaderError, LoaderResult};
pub use loader::{DataLoader, LoaderConfig, LoaderContext};
pub use process_tracker::{ProcessInfo, ProcessState, ProcessTracker};

// Re-export loaders
pub use agriculture::AgricultureLoader;
pub use cleaning::{clean_rows, clean_text, Clean};
pub use trading::TradingLoader;
pub use twitter::{CredentialRotator, TwitterCrawler};
pub use wikipedia::{read_titles, WikipediaLoader, TITLE_COLUMN};

// Prelude for convenient imports
pub mod prelude {
  pub use crate::{
    BatchConfig, BatchProcessor, DataLoader, LoaderConfig, LoaderContext, LoaderError, LoaderResult, ProcessState,
    ProcessTracker,
  };
}
