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

use std::collections::VecDeque;
use std::sync::Arc;
use visser_client::TwitterApi;

use crate::{LoaderError, LoaderResult};

/// Round-robin queue of twitter applications, numbered from 1
///
/// The front of the queue is the application in use.
pub struct CredentialRotator {
  clients: VecDeque<(usize, Arc<dyn TwitterApi>)>,
}

impl CredentialRotator {
  pub fn new(clients: Vec<Arc<dyn TwitterApi>>) -> LoaderResult<Self> {
    if clients.is_empty() {
      return Err(LoaderError::ConfigurationError("Twitter crawler needs at least one application".to_string()));
    }
    Ok(Self { clients: clients.into_iter().enumerate().map(|(i, c)| (i + 1, c)).collect() })
  }

  pub fn current(&self) -> (usize, Arc<dyn TwitterApi>) {
    let (index, client) = &self.clients[0];
    (*index, client.clone())
  }

  /// Move the current application to the back, returning the new front's number
  pub fn rotate(&mut self) -> usize {
    self.clients.rotate_left(1);
    self.clients[0].0
  }

  /// Every application in rotation order, starting with the current one
  pub fn applications(&self) -> Vec<(usize, Arc<dyn TwitterApi>)> {
    self.clients.iter().map(|(index, client)| (*index, client.clone())).collect()
  }

  pub fn len(&self) -> usize {
    self.clients.len()
  }

  pub fn is_empty(&self) -> bool {
    self.clients.is_empty()
  }
}
