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

//! Text cleanup applied to rows before they are written as TSV

use rayon::prelude::*;
use visser_models::twitter::{FollowEdge, UserInfo};

/// `\n` becomes ` // `, tabs and carriage returns are dropped
pub fn clean_text(text: &str) -> String {
  text.replace('\n', " // ").replace(['\t', '\r'], "")
}

fn clean_opt(text: Option<String>) -> Option<String> {
  text.map(|t| clean_text(&t))
}

/// Rows whose free text fields need cleaning
pub trait Clean {
  fn clean(self) -> Self;
}

impl Clean for FollowEdge {
  fn clean(self) -> Self {
    FollowEdge {
      twitter_followee_id: clean_text(&self.twitter_followee_id),
      twitter_follower_id: clean_text(&self.twitter_follower_id),
    }
  }
}

impl Clean for UserInfo {
  fn clean(self) -> Self {
    UserInfo {
      user_name: clean_text(&self.user_name),
      user_created_at: clean_text(&self.user_created_at),
      user_description: clean_opt(self.user_description),
      user_link: clean_opt(self.user_link),
      user_location: clean_opt(self.user_location),
      ..self
    }
  }
}

pub fn clean_rows<T: Clean + Send>(rows: Vec<T>) -> Vec<T> {
  rows.into_par_iter().map(Clean::clean).collect()
}

#[cfg(test)]
mod tests {
  use super::*;
  use pretty_assertions::assert_eq;

  #[test]
  fn test_clean_text() {
    assert_eq!(clean_text("line one\nline two\r\n\tend"), "line one // line two // end");
    assert_eq!(clean_text("plain"), "plain");
  }

  #[test]
  fn test_clean_user_info() {
    let info = UserInfo {
      user_id: 12,
      user_name: "jack".to_string(),
      followers_count: 1,
      followings_count: 2,
      user_created_at: "Tue Mar 21 20:50:14 +0000 2006".to_string(),
      user_description: Some("building\tthings\nsince 2006".to_string()),
      user_link: None,
      user_location: Some("SF\r".to_string()),
    };

    let cleaned = clean_rows(vec![info]).remove(0);
    assert_eq!(cleaned.user_description.as_deref(), Some("buildingthings // since 2006"));
    assert_eq!(cleaned.user_location.as_deref(), Some("SF"));
    assert_eq!(cleaned.user_link, None);
    assert_eq!(cleaned.user_id, 12);
  }
}
