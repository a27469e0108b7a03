//! # visser-client
//!
//! Async HTTP clients for the upstream sources Visser extracts from:
//!
//! - Finnhub: daily, weekly and monthly candles plus stock and forex symbols
//! - AlphaVantage: intraday candles, with a key ring rotated on throttling
//! - CoinAPI: exchange symbols and OHLCV history
//! - USDA FAS: export sales reporting
//! - EIA: weekly ethanol production and stocks, scraped from HTML
//! - Wikimedia: daily article pageviews
//! - Twitter v1.1: follower and following ids, user lookup
//!
//! Every provider sits on a [`transport::Transport`] with its own governor
//! rate limiter and exponential backoff for transient failures.
//!
//! ## Error Handling
//!
//! All methods return `Result<T, visser_core::Error>`. Upstream throttling is
//! always surfaced as [`Error::RateLimit`] so callers can rotate credentials.

pub mod client;
pub mod endpoints;
pub mod transport;

pub use client::VisserClient;
pub use visser_core::{Config, Error, Result};

pub use endpoints::{
  alphavantage::AlphaVantageEndpoints,
  coinapi::CoinApiEndpoints,
  eia::{EiaEndpoints, EthanolSeries},
  finnhub::FinnhubEndpoints,
  twitter::{TwitterApi, TwitterHttpClient},
  usda::EsrEndpoints,
  wikipedia::WikipediaEndpoints,
  EndpointBase,
};
