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

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use serde_json::json;
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;
use visser_api::{auth, build_state, run};
use visser_core::{Config, WriteType};
use visser_loaders::{read_titles, DataLoader, TITLE_COLUMN};
use visser_models::jobs::PageviewParams;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(name = "visser")]
#[command(propagate_version = true)]
struct Cli {
  #[command(subcommand)]
  command: Option<Commands>,

  /// Verbose output
  #[arg(short, long, global = true)]
  verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
  /// Run the REST API (default)
  Serve,

  /// Register a user allowed to request tokens
  AddUser {
    #[arg(long)]
    username: String,

    #[arg(long, env = "VISSER_NEW_USER_PASSWORD")]
    password: String,
  },

  /// Extract daily pageviews for the titles listed in a CSV file
  Pageviews {
    /// CSV file with a header row
    #[arg(short, long)]
    file: PathBuf,

    /// Column holding the article titles
    #[arg(long, default_value = TITLE_COLUMN)]
    column: String,

    #[arg(long, default_value_t = 30)]
    past_days: i64,

    /// all-agents, user, spider or automated
    #[arg(long, default_value = "user")]
    agent: String,

    /// return, localstorage, cloudstorage or databasestorage
    #[arg(long)]
    write_type: Option<WriteType>,
  },
}

#[actix_web::main]
async fn main() -> Result<()> {
  // Load environment variables
  dotenv().ok();

  let cli = Cli::parse();

  let log_level = if cli.verbose { "debug" } else { "info" };
  tracing_subscriber::fmt().with_env_filter(log_level).init();

  let config = Config::from_env()?;

  match cli.command.unwrap_or(Commands::Serve) {
    Commands::Serve => {
      let state = build_state(config).await?;
      run(state).await.context("Server stopped with an error")?;
    }
    Commands::AddUser { username, password } => {
      let state = build_state(config).await?;
      let id = auth::add_user(state.documents.as_ref(), &username, &password).await?;
      info!("Added user {} ({})", username, id);
    }
    Commands::Pageviews { file, column, past_days, agent, write_type } => {
      let titles = read_titles(&file, &column).with_context(|| format!("Could not read titles from {}", file.display()))?;
      let state = build_state(config).await?;
      let write_type = write_type.unwrap_or(WriteType::default_for(state.environment()));
      write_type.ensure_allowed(state.environment())?;

      let started = Instant::now();
      let params = PageviewParams { titles: titles.clone(), past_days, agent: agent.clone(), write_type: Some(write_type) };
      let views = state.wikipedia.load(&state.context, params).await?;
      let write_path = state.storage.store_items(&views, "cli", write_type, "wiki_pageviews").await?;
      let elapsed = started.elapsed().as_secs();

      let description = json!({ "titles": titles.len(), "past_days": past_days, "agent": agent, "views": views.len() });
      state.metadata.log_job("cli", "wiki_pageviews", write_type, description, elapsed, &write_path).await;
      info!("{} pageviews for {} titles written to '{}' in {}s", views.len(), titles.len(), write_path, elapsed);
    }
  }

  Ok(())
}
