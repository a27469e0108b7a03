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

use super::impl_endpoint_base;
use crate::transport::{parse_json, Transport};
use chrono::NaiveDate;
use std::sync::Arc;
use tracing::instrument;
use visser_core::{Result, TransportSettings, WIKIMEDIA_BASE_URL};
use visser_models::wikipedia::{PageView, PageviewsResponse};

/// Wikimedia REST pageview metrics for English Wikipedia
pub struct WikipediaEndpoints {
  transport: Arc<Transport>,
}

impl_endpoint_base!(WikipediaEndpoints);

impl WikipediaEndpoints {
  pub fn new(settings: &TransportSettings) -> Result<Self> {
    Self::with_base_url(WIKIMEDIA_BASE_URL, settings)
  }

  pub fn with_base_url(base_url: &str, settings: &TransportSettings) -> Result<Self> {
    Ok(Self { transport: Arc::new(Transport::new(base_url, settings)?) })
  }

  /// Daily views of one article, all access methods, both dates inclusive
  ///
  /// Spaces in the title are sent as underscores.
  #[instrument(skip(self))]
  pub async fn daily_pageviews(&self, title: &str, agent: &str, start: NaiveDate, end: NaiveDate) -> Result<Vec<PageView>> {
    let article = title.trim().replace(' ', "_");
    let (start, end) = (start.format("%Y%m%d").to_string(), end.format("%Y%m%d").to_string());
    let url = self.transport.build_url_segments(&[
      "api",
      "rest_v1",
      "metrics",
      "pageviews",
      "per-article",
      "en.wikipedia",
      "all-access",
      agent,
      &article,
      "daily",
      &start,
      &end,
    ])?;

    let response: PageviewsResponse = parse_json(&self.transport.get_url(url).await?)?;
    Ok(response.items.into_iter().map(PageView::from).collect())
  }
}
