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

//! Daily Wikipedia pageviews for a list of article titles

use async_trait::async_trait;
use chrono::{Duration, Local, NaiveDate};
use futures::FutureExt;
use std::collections::HashSet;
use std::path::Path;
use tracing::{info, warn};
use visser_models::jobs::PageviewParams;
use visser_models::wikipedia::PageView;

use crate::batch_processor::BatchProcessor;
use crate::{DataLoader, LoaderContext, LoaderError, LoaderResult};

pub const AGENTS: [&str; 4] = ["all-agents", "user", "spider", "automated"];

/// Column holding article titles in company list files
pub const TITLE_COLUMN: &str = "companies";

/// Read article titles from one column of a CSV file with a header row
pub fn read_titles<P: AsRef<Path>>(path: P, column: &str) -> LoaderResult<Vec<String>> {
  let mut reader = csv::Reader::from_path(path.as_ref())?;
  let index = reader
    .headers()?
    .iter()
    .position(|h| h.trim() == column)
    .ok_or_else(|| LoaderError::InvalidData(format!("No '{}' column in {}", column, path.as_ref().display())))?;

  let mut titles = Vec::new();
  for record in reader.records() {
    let record = record?;
    if let Some(title) = record.get(index).map(str::trim).filter(|t| !t.is_empty()) {
      titles.push(title.to_string());
    }
  }
  Ok(titles)
}

/// Drop blanks and repeats, keeping first-seen order
fn unique_titles(titles: &[String]) -> Vec<String> {
  let mut seen = HashSet::new();
  titles
    .iter()
    .map(|t| t.trim())
    .filter(|t| !t.is_empty() && seen.insert(t.to_string()))
    .map(str::to_string)
    .collect()
}

/// First day of the `past_days` window ending on `end`
fn window_start(end: NaiveDate, past_days: i64) -> LoaderResult<NaiveDate> {
  Duration::try_days(past_days)
    .and_then(|span| end.checked_sub_signed(span))
    .ok_or_else(|| LoaderError::InvalidData(format!("past_days {} is out of range", past_days)))
}

#[derive(Debug, Default, Clone)]
pub struct WikipediaLoader;

impl WikipediaLoader {
  pub fn new() -> Self {
    Self
  }

  /// Views over the last `past_days` days, today included
  pub async fn pageviews(
    &self,
    context: &LoaderContext,
    titles: &[String],
    past_days: i64,
    agent: &str,
  ) -> LoaderResult<Vec<PageView>> {
    let end = Local::now().date_naive();
    let start = window_start(end, past_days)?;
    self.pageviews_between(context, titles, agent, start, end).await
  }

  /// Views between two dates, both inclusive
  ///
  /// Titles are requested in batches. A failed title is logged and skipped
  /// until the configured failure budget runs out, which aborts the job.
  pub async fn pageviews_between(
    &self,
    context: &LoaderContext,
    titles: &[String],
    agent: &str,
    start: NaiveDate,
    end: NaiveDate,
  ) -> LoaderResult<Vec<PageView>> {
    let titles = unique_titles(titles);
    let wikipedia = context.client.wikipedia();
    let agent = agent.to_string();

    let processor = BatchProcessor::new(context.config.batch_config());
    let result = processor
      .process_batches(titles, move |title: String| {
        let wikipedia = wikipedia.clone();
        let agent = agent.clone();
        async move {
          wikipedia
            .daily_pageviews(&title, &agent, start, end)
            .await
            .map_err(|e| LoaderError::ApiError(format!("Request to {} failed: {}", title, e)))
        }
        .boxed()
      })
      .await?;

    if result.failure_count() > 0 {
      warn!("{} of {} titles failed", result.failure_count(), result.total_processed);
    }

    let views: Vec<PageView> = result.success.into_iter().flatten().collect();
    info!("{} daily pageviews between {} and {}", views.len(), start, end);
    Ok(views)
  }
}

#[async_trait]
impl DataLoader for WikipediaLoader {
  type Input = PageviewParams;
  type Output = Vec<PageView>;

  async fn load(&self, context: &LoaderContext, input: Self::Input) -> LoaderResult<Self::Output> {
    self.validate_input(&input).await?;
    self.pageviews(context, &input.titles, input.past_days, &input.agent).await
  }

  async fn validate_input(&self, input: &Self::Input) -> LoaderResult<()> {
    if input.past_days < 0 {
      return Err(LoaderError::InvalidData(format!("past_days must not be negative, got {}", input.past_days)));
    }
    window_start(Local::now().date_naive(), input.past_days)?;
    if !AGENTS.contains(&input.agent.as_str()) {
      return Err(LoaderError::InvalidData(format!(
        "Unknown agent '{}', expected one of {}",
        input.agent,
        AGENTS.join(", ")
      )));
    }
    Ok(())
  }

  fn name(&self) -> &'static str {
    "wikipedia_pageviews"
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::LoaderConfig;
  use pretty_assertions::assert_eq;
  use std::io::Write;
  use std::sync::Arc;
  use tempfile::NamedTempFile;
  use visser_client::{VisserClient, WikipediaEndpoints};
  use visser_core::TransportSettings;
  use wiremock::matchers::path_regex;
  use wiremock::{Mock, MockServer, ResponseTemplate};

  fn context(server: &MockServer, max_failures: usize) -> LoaderContext {
    let settings = TransportSettings { rate_limit: 600, timeout_secs: 5, max_retries: 0 };
    let client = VisserClient::keyless(&settings)
      .unwrap()
      .with_wikipedia(WikipediaEndpoints::with_base_url(&server.uri(), &settings).unwrap());
    let config = LoaderConfig { batch_size: 2, batch_delay_ms: 0, max_failures, ..LoaderConfig::default() };
    LoaderContext::new(Arc::new(client), config)
  }

  fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2022, 1, d).unwrap()
  }

  async fn mount_article(server: &MockServer, article: &str, views: u64) {
    let body = serde_json::json!({"items": [{
      "project": "en.wikipedia", "article": article, "granularity": "daily",
      "timestamp": "2022010100", "access": "all-access", "agent": "user", "views": views
    }]});
    Mock::given(path_regex(format!("/per-article/en.wikipedia/all-access/user/{}/daily/", regex_escape(article))))
      .respond_with(ResponseTemplate::new(200).set_body_json(body))
      .mount(server)
      .await;
  }

  fn regex_escape(value: &str) -> String {
    value.replace('.', "\\.")
  }

  #[test]
  fn test_read_titles() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "ticker,companies").unwrap();
    writeln!(file, "AAPL,Apple Inc.").unwrap();
    writeln!(file, "XXX,").unwrap();
    writeln!(file, "MSFT, Microsoft ").unwrap();

    let titles = read_titles(file.path(), TITLE_COLUMN).unwrap();
    assert_eq!(titles, vec!["Apple Inc.".to_string(), "Microsoft".to_string()]);

    let err = read_titles(file.path(), "names").unwrap_err();
    assert!(matches!(err, LoaderError::InvalidData(_)));
  }

  #[test]
  fn test_unique_titles_keeps_order() {
    let titles: Vec<String> = ["Tesla", " ", "Apple", "Tesla"].iter().map(|s| s.to_string()).collect();
    assert_eq!(unique_titles(&titles), vec!["Tesla".to_string(), "Apple".to_string()]);
  }

  #[tokio::test]
  async fn test_validate_input() {
    let loader = WikipediaLoader::new();
    let mut params = PageviewParams { titles: vec!["Apple".into()], past_days: 30, agent: "user".into(), write_type: None };
    assert!(loader.validate_input(&params).await.is_ok());

    params.agent = "robot".into();
    assert!(loader.validate_input(&params).await.is_err());

    params.agent = "spider".into();
    params.past_days = -1;
    assert!(loader.validate_input(&params).await.is_err());
  }

  #[test]
  fn test_window_start() {
    assert_eq!(window_start(day(31), 30).unwrap(), day(1));
    assert_eq!(window_start(day(5), 0).unwrap(), day(5));
    assert!(matches!(window_start(day(5), 200_000_000), Err(LoaderError::InvalidData(_))));
    assert!(matches!(window_start(day(5), i64::MAX), Err(LoaderError::InvalidData(_))));
  }

  #[tokio::test]
  async fn test_huge_past_days_is_invalid_data() {
    let server = MockServer::start().await;
    let params =
      PageviewParams { titles: vec!["Apple".into()], past_days: 200_000_000, agent: "user".into(), write_type: None };

    let err = WikipediaLoader::new().load(&context(&server, 35), params).await.unwrap_err();
    assert!(matches!(err, LoaderError::InvalidData(_)));

    let err = WikipediaLoader::new().pageviews(&context(&server, 35), &["Apple".to_string()], i64::MAX, "user").await;
    assert!(matches!(err, Err(LoaderError::InvalidData(_))));
  }

  #[tokio::test]
  async fn test_failed_titles_are_skipped() {
    let server = MockServer::start().await;
    mount_article(&server, "Apple_Inc.", 10).await;
    mount_article(&server, "Tesla", 20).await;

    let titles: Vec<String> = ["Apple Inc.", "Missing", "Tesla", "Apple Inc."].iter().map(|s| s.to_string()).collect();
    let views = WikipediaLoader::new().pageviews_between(&context(&server, 35), &titles, "user", day(1), day(2)).await.unwrap();

    let mut counts: Vec<u64> = views.iter().map(|v| v.views).collect();
    counts.sort();
    assert_eq!(counts, vec![10, 20]);
  }

  #[tokio::test]
  async fn test_failure_budget_aborts() {
    let server = MockServer::start().await;
    let titles: Vec<String> = ["One", "Two", "Three"].iter().map(|s| s.to_string()).collect();

    let err = WikipediaLoader::new().pageviews_between(&context(&server, 2), &titles, "user", day(1), day(2)).await.unwrap_err();
    match err {
      LoaderError::ExcessiveFailures { failures, last_error } => {
        assert_eq!(failures, 2);
        assert!(last_error.contains("Request to "));
      }
      other => panic!("unexpected error {other:?}"),
    }
  }
}
