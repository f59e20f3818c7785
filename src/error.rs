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

use thiserror::Error;

use crate::templates::TemplateState;

pub type Result<T> = std::result::Result<T, SearchError>;

/// Failures observable while running one search.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SearchError {
    /// The backend answered with an `error` member; the message is kept verbatim.
    #[error("{0}")]
    Backend(String),

    /// A render needed a template whose fetch has not completed.
    #[error("template for {model} is not ready ({state})")]
    TemplateNotReady { model: String, state: TemplateState },

    /// The request itself failed or the reply could not be decoded.
    #[error("request failed: {0}")]
    Transport(String),

    /// The template engine rejected a template or its input.
    #[error("render failed: {0}")]
    Render(String),
}

impl SearchError {
    pub fn code(&self) -> &'static str {
        match self {
            SearchError::Backend(_) => "backend",
            SearchError::TemplateNotReady { .. } => "template_not_ready",
            SearchError::Transport(_) => "transport",
            SearchError::Render(_) => "render",
        }
    }
}

impl From<reqwest::Error> for SearchError {
    fn from(err: reqwest::Error) -> Self {
        SearchError::Transport(err.to_string())
    }
}

impl From<minijinja::Error> for SearchError {
    fn from(err: minijinja::Error) -> Self {
        SearchError::Render(err.to_string())
    }
}
