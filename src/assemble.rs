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

use serde_json::Map;
use serde_json::Value;

use crate::model::CompositeRow;
use crate::model::Results;

/// Whether `results` has nothing to render for `primary`.
pub fn is_empty_for(results: &Results, primary: &str) -> bool {
    results.rows_for(primary).is_empty()
}

/// Rebuilds per-index joined rows from a search response.
///
/// Flat results are emitted as-is. For parallel arrays, row `i` of `primary` is copied and
/// every other model's row `i` is attached under that model's name, `null` when the other
/// array is shorter. Index order is preserved and the response is never mutated.
pub fn assemble(results: &Results, primary: &str) -> Vec<CompositeRow> {
    match results {
        Results::Flat(rows) => rows.iter().cloned().map(CompositeRow::new).collect(),
        Results::ByModel(by_model) => {
            let primary_rows = results.rows_for(primary);
            let others: Vec<(&String, &Value)> = by_model
                .iter()
                .filter(|(name, _)| name.as_str() != primary)
                .collect();

            primary_rows
                .iter()
                .enumerate()
                .map(|(idx, row)| {
                    let mut composite = match row {
                        Value::Object(fields) => fields.clone(),
                        other => {
                            tracing::debug!(model = primary, idx, ?other, "non-object primary row");
                            Map::new()
                        }
                    };
                    for (name, rows) in &others {
                        let joined = rows.get(idx).cloned().unwrap_or(Value::Null);
                        composite.insert((*name).clone(), joined);
                    }
                    CompositeRow::from_map(composite)
                })
                .collect()
        }
    }
}
