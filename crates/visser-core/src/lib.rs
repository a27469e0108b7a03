pub mod config;
pub mod error;
pub mod types;

pub use config::{Config, ProviderKeys, StorageConfig, TransportSettings};
pub use error::{Error, Result};
pub use types::{Environment, Instrument, Provider, RelationshipType, Resolution, WriteType};

/// Upstream base URLs
pub const FINNHUB_BASE_URL: &str = "https://finnhub.io/api/v1";
pub const ALPHA_VANTAGE_BASE_URL: &str = "https://www.alphavantage.co";
pub const COINAPI_BASE_URL: &str = "https://rest.coinapi.io";
pub const USDA_FAS_BASE_URL: &str = "https://apps.fas.usda.gov/OpenData";
pub const EIA_BASE_URL: &str = "https://www.eia.gov";
pub const WIKIMEDIA_BASE_URL: &str = "https://wikimedia.org";
pub const TWITTER_BASE_URL: &str = "https://api.twitter.com";
pub const GCS_UPLOAD_BASE_URL: &str = "https://storage.googleapis.com";

/// Requests per minute per provider
pub const DEFAULT_RATE_LIMIT: u32 = 60;

/// Highest AlphaVantage key index probed in the environment
pub const MAX_ROTATING_KEYS: usize = 64;

/// Twitter applications in the default crawler pool
pub const DEFAULT_TWITTER_KEYS: usize = 11;

pub const DEFAULT_LOCAL_ROOT: &str = "resources/documents/";

/// Rows per stored chunk
pub const MAX_CHUNK_ROWS: usize = 250_000;

/// Upper bound for `VISSER_MAX_RETRIES`
pub const MAX_RETRIES: u32 = 10;
