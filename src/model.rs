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

//! Shared domain types used across the request, assembly, and rendering stages.

use std::fmt;

use clap::ValueEnum;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderDir {
    Asc,
    Desc,
}

impl OrderDir {
    pub fn as_label(self) -> &'static str {
        match self {
            OrderDir::Asc => "ASC",
            OrderDir::Desc => "DESC",
        }
    }
}

impl fmt::Display for OrderDir {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}

/// Request body for `POST /search/{model}`. Built once per commit and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Query {
    pub query: String,
    pub limit: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_dir: Option<OrderDir>,
}

/// Static request parameters that do not come from user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryDefaults {
    pub limit: usize,
    pub order_by: Option<String>,
    pub order_dir: Option<OrderDir>,
}

impl QueryDefaults {
    pub fn build(&self, text: &str) -> Query {
        Query {
            query: text.to_string(),
            limit: self.limit,
            order_by: self.order_by.clone(),
            order_dir: self.order_dir,
        }
    }
}

/// Snapshot of the UI state at the moment a search is committed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub model: String,
    pub text: String,
}

impl Selection {
    pub fn new(model: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            text: text.into(),
        }
    }
}

/// The `results` member of a search response.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Results {
    /// Single-model shorthand: every element is already a renderable row.
    Flat(Vec<Value>),
    /// Parallel arrays keyed by model name.
    ByModel(Map<String, Value>),
}

impl Results {
    /// Rows for `model` in a multi-model response. Non-array entries count as no rows.
    pub fn rows_for(&self, model: &str) -> &[Value] {
        match self {
            Results::Flat(rows) => rows,
            Results::ByModel(map) => match map.get(model) {
                Some(Value::Array(rows)) => rows,
                _ => &[],
            },
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct SearchResponse {
    pub results: Option<Results>,
    pub fields: Option<Vec<String>>,
    pub error: Option<String>,
}

/// A per-index joined view over one or more models' rows.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct CompositeRow(Value);

impl CompositeRow {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    pub fn from_map(map: Map<String, Value>) -> Self {
        Self(Value::Object(map))
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    #[cfg(test)]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn query_omits_absent_ordering() {
        let defaults = QueryDefaults {
            limit: 50,
            order_by: None,
            order_dir: None,
        };
        let body = serde_json::to_value(defaults.build("from:ann")).expect("serialize");
        assert_eq!(body, json!({"query": "from:ann", "limit": 50}));
    }

    #[test]
    fn query_serializes_uppercase_direction() {
        let defaults = QueryDefaults {
            limit: 1000,
            order_by: Some("id".to_string()),
            order_dir: Some(OrderDir::Desc),
        };
        let body = serde_json::to_value(defaults.build("hi")).expect("serialize");
        assert_eq!(
            body,
            json!({"query": "hi", "limit": 1000, "order_by": "id", "order_dir": "DESC"})
        );
    }

    #[test]
    fn response_parses_both_result_shapes() {
        let flat: SearchResponse =
            serde_json::from_value(json!({"results": [{"id": 1}]})).expect("flat");
        assert_eq!(flat.results, Some(Results::Flat(vec![json!({"id": 1})])));

        let multi: SearchResponse = serde_json::from_value(json!({
            "results": {"message": [{"id": 1}], "user": []},
            "fields": ["id"]
        }))
        .expect("multi");
        let results = multi.results.expect("results");
        assert_eq!(results.rows_for("message").len(), 1);
        assert!(results.rows_for("user").is_empty());
        assert!(results.rows_for("guild").is_empty());
        assert_eq!(multi.fields, Some(vec!["id".to_string()]));
    }

    #[test]
    fn response_parses_error_and_null_results() {
        let resp: SearchResponse =
            serde_json::from_value(json!({"error": "bad query", "results": null}))
                .expect("error");
        assert_eq!(resp.error.as_deref(), Some("bad query"));
        assert!(resp.results.is_none());
    }
}
