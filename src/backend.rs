// Copyright 2026 Abode Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use async_trait::async_trait;

use crate::error::Result;
use crate::error::SearchError;
use crate::model::Query;
use crate::model::SearchResponse;

/// The remote search service.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    async fn search(&self, model: &str, query: &Query) -> Result<SearchResponse>;
}

/// `POST {server}/search/{model}` with the query as the JSON body.
pub struct HttpBackend {
    client: reqwest::Client,
    server: String,
}

impl HttpBackend {
    pub fn new(client: reqwest::Client, server: &str) -> Self {
        Self {
            client,
            server: server.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl SearchBackend for HttpBackend {
    async fn search(&self, model: &str, query: &Query) -> Result<SearchResponse> {
        let url = format!("{}/search/{model}", self.server);
        let response = self.client.post(&url).json(query).send().await?;
        let status = response.status();
        let body = response.bytes().await?;

        // A failed status only counts as an answer when it carries an `error` member.
        match serde_json::from_slice::<SearchResponse>(&body) {
            Ok(parsed) if status.is_success() || parsed.error.is_some() => Ok(parsed),
            Ok(_) => Err(SearchError::Transport(format!("{url} returned {status}"))),
            Err(err) if status.is_success() => Err(SearchError::Transport(format!(
                "decode response from {url}: {err}"
            ))),
            Err(_) => Err(SearchError::Transport(format!("{url} returned {status}"))),
        }
    }
}
