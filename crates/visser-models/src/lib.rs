//! # visser-models
//!
//! Typed payloads for the upstream providers (Finnhub, AlphaVantage,
//! CoinAPI, USDA FAS, EIA, Wikimedia, Twitter) and the request and
//! response bodies of the Visser REST facade.
//!
//! Provider payloads keep the upstream field names through serde renames.
//! The row types produced from them (`Candle`, `ExportRow`, `PageView`,
//! `UserInfo`, `FollowEdge`) are flat so they serialize cleanly to both
//! JSON documents and tab separated files.

pub mod agriculture;
pub mod jobs;
pub mod trading;
pub mod twitter;
pub mod wikipedia;

pub use agriculture::{Commodity, Country, ExportRecord, ExportRow, WeeklyObservation};
pub use jobs::{
  CryptoSymbolsQuery, ExportsQuery, FlexibleId, FollowsParams, HistoricalDataParams,
  HistoricalTradingMetadata, JobMetadata, JobResponse, PageviewParams, TokenResponse, UsersParams,
  WriteTypeQuery,
};
pub use trading::{Candle, CandleResponse, ExchangeSymbol, IntradayCsvRow, OhlcvRecord, SymbolInfo};
pub use twitter::{
  FollowEdge, FollowIdsPage, RateLimitStatus, RateLimitWindow, RawUser, UserInfo, UserRef,
};
pub use wikipedia::{PageView, PageviewItem, PageviewsResponse};

/// Timestamp format of every stored price row
pub const ROW_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
