use serde::{Deserialize, Serialize};

/// Wikimedia per-article pageviews response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageviewsResponse {
  #[serde(default)]
  pub items: Vec<PageviewItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageviewItem {
  #[serde(default)]
  pub project: String,
  pub article: String,
  #[serde(default)]
  pub granularity: String,
  /// `YYYYMMDDHH`
  pub timestamp: String,
  pub access: String,
  pub agent: String,
  pub views: u64,
}

/// Daily views of one article
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageView {
  pub article: String,
  pub timestamp: String,
  pub views: u64,
  pub agent: String,
  pub access: String,
}

impl From<PageviewItem> for PageView {
  fn from(item: PageviewItem) -> Self {
    PageView {
      article: item.article,
      timestamp: item.timestamp,
      views: item.views,
      agent: item.agent,
      access: item.access,
    }
  }
}
