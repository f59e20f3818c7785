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

use anyhow::Result;
use serde::Serialize;

use crate::error::SearchError;
use crate::model::Query;

/// The page regions a search writes into.
pub trait OutputSink {
    /// Replaces the output region wholesale and hides any error.
    fn show_results(&mut self, html: &str);

    /// Empties the output region.
    fn clear(&mut self);

    fn show_error(&mut self, err: &SearchError);

    /// Hides the error region.
    fn hide_error(&mut self);

    /// Informational line that is not part of the result page.
    fn notice(&mut self, _message: &str) {}
}

/// In-memory output and error regions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Regions {
    pub output: String,
    pub error: Option<SearchError>,
    pub notices: Vec<String>,
}

impl OutputSink for Regions {
    fn show_results(&mut self, html: &str) {
        self.error = None;
        self.output = html.to_string();
    }

    fn clear(&mut self) {
        self.output.clear();
    }

    fn show_error(&mut self, err: &SearchError) {
        self.error = Some(err.clone());
    }

    fn hide_error(&mut self) {
        self.error = None;
    }

    fn notice(&mut self, message: &str) {
        self.notices.push(message.to_string());
    }
}

/// Writes straight to the terminal: results to stdout, errors to stderr.
#[derive(Debug, Default)]
pub struct TerminalSink;

impl OutputSink for TerminalSink {
    fn show_results(&mut self, html: &str) {
        println!("{html}");
    }

    fn clear(&mut self) {}

    fn show_error(&mut self, err: &SearchError) {
        eprintln!("error: {err}");
    }

    fn hide_error(&mut self) {}

    fn notice(&mut self, message: &str) {
        println!("{message}");
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct QueryOut {
    pub model: String,
    #[serde(flatten)]
    pub body: Query,
}

#[derive(Debug, Clone, Serialize)]
pub struct TemplateOut {
    pub name: String,
    pub state: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorOut {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Default)]
pub struct JsonResponse {
    pub ok: bool,
    pub schema_version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<QueryOut>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rows: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub templates: Option<Vec<TemplateOut>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorOut>,
}

impl JsonResponse {
    pub fn ok() -> Self {
        Self {
            ok: true,
            schema_version: "1".to_string(),
            ..Default::default()
        }
    }

    pub fn error(code: &str, message: &str) -> Self {
        Self {
            ok: false,
            schema_version: "1".to_string(),
            error: Some(ErrorOut {
                code: code.to_string(),
                message: message.to_string(),
            }),
            ..Default::default()
        }
    }

    pub fn from_search_error(err: &SearchError) -> Self {
        Self::error(err.code(), &err.to_string())
    }

    pub fn with_query(mut self, model: &str, query: &Query) -> Self {
        self.query = Some(QueryOut {
            model: model.to_string(),
            body: query.clone(),
        });
        self
    }

    pub fn with_state(mut self, state: &str) -> Self {
        self.state = Some(state.to_string());
        self
    }

    pub fn with_page(mut self, rows: usize, html: String) -> Self {
        self.rows = Some(rows);
        self.html = Some(html);
        self
    }

    pub fn with_templates(mut self, templates: Vec<TemplateOut>) -> Self {
        self.templates = Some(templates);
        self
    }
}

pub fn print_json(resp: &JsonResponse) -> Result<()> {
    let text = serde_json::to_string_pretty(resp)?;
    println!("{text}");
    Ok(())
}
