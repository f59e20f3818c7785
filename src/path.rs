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

//! Dotted field path lookup against composite rows.

use serde_json::Value;

/// Splits a dotted path into its lookup segments.
pub fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('.')
}

/// Resolves `path` against `row`, one segment at a time.
///
/// A missing key, a `null`, or a scalar met before the last segment yields `None`.
/// Array elements are addressed by numeric segments (`"embeds.0.title"`).
pub fn resolve<'a>(row: &'a Value, path: &str) -> Option<&'a Value> {
    segments(path).try_fold(row, |base, segment| match base {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|idx| items.get(idx)),
        _ => None,
    })
}

/// Like [`resolve`], but treats an explicit `null` leaf as absent too.
pub fn resolve_present<'a>(row: &'a Value, path: &str) -> Option<&'a Value> {
    resolve(row, path).filter(|value| !value.is_null())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn single_segment_reads_top_level_key() {
        let row = json!({"a": 1});
        assert_eq!(resolve(&row, "a"), Some(&json!(1)));
    }

    #[test]
    fn nested_segments_follow_objects() {
        let row = json!({"author": {"profile": {"name": "ann"}}});
        assert_eq!(resolve(&row, "author.profile.name"), Some(&json!("ann")));
    }

    #[test]
    fn missing_intermediate_short_circuits() {
        let row = json!({"a": 1});
        assert_eq!(resolve(&row, "user.name"), None);
        assert_eq!(resolve(&row, "user.name.first.initial"), None);
    }

    #[test]
    fn null_intermediate_short_circuits() {
        let row = json!({"user": null});
        assert_eq!(resolve(&row, "user.name"), None);
    }

    #[test]
    fn scalar_intermediate_short_circuits() {
        let row = json!({"user": "ann"});
        assert_eq!(resolve(&row, "user.name"), None);
    }

    #[test]
    fn null_leaf_is_returned_but_not_present() {
        let row = json!({"user": {"avatar": null}});
        assert_eq!(resolve(&row, "user.avatar"), Some(&Value::Null));
        assert_eq!(resolve_present(&row, "user.avatar"), None);
    }

    #[test]
    fn numeric_segment_indexes_arrays() {
        let row = json!({"embeds": [{"title": "first"}, {"title": "second"}]});
        assert_eq!(resolve(&row, "embeds.1.title"), Some(&json!("second")));
        assert_eq!(resolve(&row, "embeds.7.title"), None);
        assert_eq!(resolve(&row, "embeds.x"), None);
    }

    #[test]
    fn empty_segment_is_a_plain_key() {
        let row = json!({"a": {"": 3}});
        assert_eq!(resolve(&row, "a."), Some(&json!(3)));
        assert_eq!(resolve(&row, ""), None);
    }
}
