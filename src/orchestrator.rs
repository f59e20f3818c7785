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

//! Query lifecycle: build, dispatch, interpret, render.

use std::sync::Arc;

use serde::Deserialize;
use serde::Serialize;

use crate::assemble;
use crate::backend::SearchBackend;
use crate::error::Result;
use crate::error::SearchError;
use crate::model::Query;
use crate::model::QueryDefaults;
use crate::model::SearchResponse;
use crate::model::Selection;
use crate::output::OutputSink;
use crate::render::RowRenderer;

#[derive(Debug, Clone, PartialEq)]
pub enum SearchState {
    Idle,
    Querying { token: u64 },
    Rendered { rows: usize },
    Empty,
    Error(SearchError),
}

impl SearchState {
    pub fn as_label(&self) -> &'static str {
        match self {
            SearchState::Idle => "idle",
            SearchState::Querying { .. } => "querying",
            SearchState::Rendered { .. } => "rendered",
            SearchState::Empty => "empty",
            SearchState::Error(_) => "error",
        }
    }
}

/// What to do with a response that arrives after a newer one was already applied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StalePolicy {
    #[default]
    Discard,
    /// Apply in arrival order, letting an old response overwrite newer output.
    Apply,
}

/// A request that has been issued but not yet answered.
#[derive(Debug, Clone)]
pub struct PendingSearch {
    pub token: u64,
    pub model: String,
    pub query: Query,
}

#[derive(Debug)]
pub struct Completed {
    pub token: u64,
    pub model: String,
    pub query: Query,
    pub outcome: Result<SearchResponse>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Applied,
    Stale,
}

/// Sends one request. Free of orchestrator state so it can run on its own task.
pub async fn dispatch(backend: Arc<dyn SearchBackend>, pending: PendingSearch) -> Completed {
    tracing::debug!(token = pending.token, model = %pending.model, "dispatching search");
    let outcome = backend.search(&pending.model, &pending.query).await;
    Completed {
        token: pending.token,
        model: pending.model,
        query: pending.query,
        outcome,
    }
}

pub struct Orchestrator {
    backend: Arc<dyn SearchBackend>,
    renderer: RowRenderer,
    defaults: QueryDefaults,
    wrapper: Option<String>,
    stale: StalePolicy,
    next_token: u64,
    newest_applied: Option<u64>,
    state: SearchState,
}

impl Orchestrator {
    pub fn new(
        backend: Arc<dyn SearchBackend>,
        renderer: RowRenderer,
        defaults: QueryDefaults,
    ) -> Self {
        Self {
            backend,
            renderer,
            defaults,
            wrapper: None,
            stale: StalePolicy::default(),
            next_token: 0,
            newest_applied: None,
            state: SearchState::Idle,
        }
    }

    pub fn with_wrapper(mut self, wrapper: Option<String>) -> Self {
        self.wrapper = wrapper;
        self
    }

    pub fn with_stale_policy(mut self, stale: StalePolicy) -> Self {
        self.stale = stale;
        self
    }

    pub fn state(&self) -> &SearchState {
        &self.state
    }

    pub fn renderer(&self) -> &RowRenderer {
        &self.renderer
    }

    pub fn backend(&self) -> Arc<dyn SearchBackend> {
        Arc::clone(&self.backend)
    }

    pub fn build_query(&self, selection: &Selection) -> Query {
        self.defaults.build(&selection.text)
    }

    /// Issues a new request token. Earlier requests stay in flight.
    pub fn begin(&mut self, selection: &Selection) -> PendingSearch {
        let token = self.next_token;
        self.next_token += 1;
        self.state = SearchState::Querying { token };
        PendingSearch {
            token,
            model: selection.model.clone(),
            query: self.build_query(selection),
        }
    }

    /// Applies a response to the sink, in the order responses arrive.
    pub fn apply(&mut self, completed: Completed, sink: &mut dyn OutputSink) -> Disposition {
        if self.stale == StalePolicy::Discard
            && self
                .newest_applied
                .is_some_and(|newest| completed.token < newest)
        {
            tracing::debug!(
                token = completed.token,
                query = %completed.query.query,
                "discarding stale response"
            );
            return Disposition::Stale;
        }
        self.newest_applied = Some(
            self.newest_applied
                .map_or(completed.token, |newest| newest.max(completed.token)),
        );

        self.state = match self.interpret(&completed.model, completed.outcome) {
            Ok(Some((rows, html))) => {
                sink.show_results(&html);
                SearchState::Rendered { rows }
            }
            Ok(None) => {
                sink.clear();
                sink.hide_error();
                SearchState::Empty
            }
            Err(err) => {
                tracing::debug!(token = completed.token, code = err.code(), "search failed");
                sink.clear();
                sink.show_error(&err);
                SearchState::Error(err)
            }
        };
        Disposition::Applied
    }

    /// Back to `Idle`, ready for the next commit.
    pub fn reset(&mut self) {
        self.state = SearchState::Idle;
    }

    /// Runs a single search to completion.
    pub async fn search(
        &mut self,
        selection: &Selection,
        sink: &mut dyn OutputSink,
    ) -> &SearchState {
        let pending = self.begin(selection);
        let completed = dispatch(self.backend(), pending).await;
        self.apply(completed, sink);
        &self.state
    }

    /// Returns the row count and page for a non-empty result set.
    pub fn interpret(
        &self,
        model: &str,
        outcome: Result<SearchResponse>,
    ) -> Result<Option<(usize, String)>> {
        let response = outcome?;
        if let Some(message) = response.error {
            return Err(SearchError::Backend(message));
        }
        let Some(results) = response.results else {
            return Ok(None);
        };
        if assemble::is_empty_for(&results, model) {
            return Ok(None);
        }

        let rows = assemble::assemble(&results, model);
        let html = self.renderer.render_page(
            model,
            &rows,
            response.fields.as_deref(),
            self.wrapper.as_deref(),
        )?;
        Ok(Some((rows.len(), html)))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::backend::HttpBackend;
    use crate::backend::testing::FakeBackend;
    use crate::backend::testing::local_client;
    use crate::backend::testing::serve_once;
    use crate::model::OrderDir;
    use crate::output::Regions;
    use crate::templates::testing::loaded_store;

    fn defaults() -> QueryDefaults {
        QueryDefaults {
            limit: 1000,
            order_by: Some("id".to_string()),
            order_dir: Some(OrderDir::Desc),
        }
    }

    async fn orchestrator(backend: FakeBackend, templates: &[(&str, &str)]) -> Orchestrator {
        let renderer = RowRenderer::new(loaded_store(templates).await);
        Orchestrator::new(Arc::new(backend), renderer, defaults())
    }

    #[tokio::test]
    async fn multi_model_fields_render_one_row() {
        let backend = FakeBackend::new().reply(
            "hi",
            json!({
                "results": {
                    "message": [{"id": 1, "text": "hi"}],
                    "user": [{"id": 9, "name": "ann"}]
                },
                "fields": ["text", "user.name"]
            }),
        );
        let mut orch = orchestrator(backend, &[]).await;
        let mut regions = Regions::default();

        let state = orch
            .search(&Selection::new("message", "hi"), &mut regions)
            .await
            .clone();
        assert_eq!(state, SearchState::Rendered { rows: 1 });

        let expected = orch
            .renderer()
            .render_values(&[Some(&json!("hi")), Some(&json!("ann"))])
            .expect("values");
        assert_eq!(regions.output, expected);
        assert!(regions.error.is_none());
    }

    #[tokio::test]
    async fn request_carries_selection_and_defaults() {
        let backend = Arc::new(FakeBackend::new());
        let renderer = RowRenderer::new(loaded_store(&[]).await);
        let mut orch = Orchestrator::new(backend.clone(), renderer, defaults());
        let mut regions = Regions::default();

        orch.search(&Selection::new("guild", "name:abode"), &mut regions)
            .await;
        let calls = backend.calls.lock().clone();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "guild");
        assert_eq!(
            calls[0].1,
            Query {
                query: "name:abode".to_string(),
                limit: 1000,
                order_by: Some("id".to_string()),
                order_dir: Some(OrderDir::Desc),
            }
        );
    }

    #[tokio::test]
    async fn backend_error_clears_output_and_surfaces_message() {
        let backend = FakeBackend::new()
            .reply("ok", json!({"results": [{"name": "ann"}]}))
            .reply("bad", json!({"error": "bad query"}));
        let mut orch = orchestrator(backend, &[("user", "<i>{{ row.name }}</i>")]).await;
        let mut regions = Regions::default();

        orch.search(&Selection::new("user", "ok"), &mut regions).await;
        assert_eq!(regions.output, "<i>ann</i>");

        let state = orch
            .search(&Selection::new("user", "bad"), &mut regions)
            .await
            .clone();
        assert_eq!(
            state,
            SearchState::Error(SearchError::Backend("bad query".to_string()))
        );
        assert_eq!(regions.output, "");
        assert_eq!(
            regions.error.as_ref().map(ToString::to_string).as_deref(),
            Some("bad query")
        );
    }

    #[tokio::test]
    async fn error_wins_over_results() {
        let backend = FakeBackend::new().reply(
            "both",
            json!({"results": [{"name": "ann"}], "error": "partial failure"}),
        );
        let mut orch = orchestrator(backend, &[("user", "<i>{{ row.name }}</i>")]).await;
        let mut regions = Regions::default();
        let state = orch
            .search(&Selection::new("user", "both"), &mut regions)
            .await;
        assert_eq!(state.as_label(), "error");
    }

    #[tokio::test]
    async fn empty_results_clear_output_without_error() {
        let backend = FakeBackend::new()
            .reply("ok", json!({"results": [{"name": "ann"}]}))
            .reply("none", json!({"results": {"message": [], "user": [{"id": 1}]}}))
            .reply("missing", json!({}));
        let mut orch = orchestrator(
            backend,
            &[
                ("message", "<p>{{ row.id }}</p>"),
                ("user", "<i>{{ row.name }}</i>"),
            ],
        )
        .await;
        let mut regions = Regions::default();

        orch.search(&Selection::new("user", "ok"), &mut regions).await;
        let state = orch
            .search(&Selection::new("message", "none"), &mut regions)
            .await
            .clone();
        assert_eq!(state, SearchState::Empty);
        assert_eq!(regions.output, "");
        assert!(regions.error.is_none());

        let state = orch
            .search(&Selection::new("message", "missing"), &mut regions)
            .await;
        assert_eq!(state, &SearchState::Empty);
    }

    #[tokio::test]
    async fn empty_results_hide_previous_error() {
        let backend = FakeBackend::new()
            .reply("bad", json!({"error": "bad query"}))
            .reply("none", json!({"results": []}));
        let mut orch = orchestrator(backend, &[]).await;
        let mut regions = Regions::default();

        orch.search(&Selection::new("user", "bad"), &mut regions).await;
        assert!(regions.error.is_some());

        let state = orch
            .search(&Selection::new("user", "none"), &mut regions)
            .await;
        assert_eq!(state, &SearchState::Empty);
        assert_eq!(regions.output, "");
        assert!(regions.error.is_none());
    }

    #[tokio::test]
    async fn transport_failure_is_reported() {
        let backend = FakeBackend::new().fail(
            "down",
            SearchError::Transport("connection refused".to_string()),
        );
        let mut orch = orchestrator(backend, &[]).await;
        let mut regions = Regions::default();
        let state = orch
            .search(&Selection::new("message", "down"), &mut regions)
            .await;
        assert_eq!(state.as_label(), "error");
        assert_eq!(regions.error.as_ref().map(SearchError::code), Some("transport"));
    }

    #[tokio::test]
    async fn server_failure_without_error_body_is_not_empty() {
        let (server, _request) = serve_once(
            "500 Internal Server Error",
            r#"{"message": "internal server error"}"#,
        )
        .await;
        let backend = HttpBackend::new(local_client(), &server);
        let renderer = RowRenderer::new(loaded_store(&[]).await);
        let mut orch = Orchestrator::new(Arc::new(backend), renderer, defaults());
        let mut regions = Regions::default();
        let state = orch
            .search(&Selection::new("message", "hi"), &mut regions)
            .await;
        assert_eq!(state.as_label(), "error");
        assert_eq!(regions.error.as_ref().map(SearchError::code), Some("transport"));
    }

    #[tokio::test]
    async fn missing_template_is_distinct_from_backend_error() {
        let backend = FakeBackend::new().reply("hi", json!({"results": [{"id": 1}]}));
        let mut orch = orchestrator(backend, &[]).await;
        let mut regions = Regions::default();
        let state = orch
            .search(&Selection::new("emoji", "hi"), &mut regions)
            .await;
        match state {
            SearchState::Error(err) => assert_eq!(err.code(), "template_not_ready"),
            other => panic!("unexpected state {other:?}"),
        }
        assert_eq!(regions.output, "");
    }

    #[tokio::test]
    async fn wrapper_template_frames_rows() {
        let backend = FakeBackend::new().reply("hi", json!({"results": [{"name": "ann"}]}));
        let mut orch = orchestrator(
            backend,
            &[
                ("user", "<i>{{ row.name }}</i>"),
                ("results", "<ul>{% for row in rows %}{{ row }}{% endfor %}</ul>"),
            ],
        )
        .await
        .with_wrapper(Some("results".to_string()));
        let mut regions = Regions::default();
        orch.search(&Selection::new("user", "hi"), &mut regions).await;
        assert_eq!(regions.output, "<ul><i>ann</i></ul>");
    }

    fn completed(token: u64, reply: serde_json::Value) -> Completed {
        Completed {
            token,
            model: "user".to_string(),
            query: defaults().build("q"),
            outcome: Ok(serde_json::from_value(reply).expect("reply")),
        }
    }

    #[tokio::test]
    async fn stale_response_is_discarded_by_default() {
        let mut orch = orchestrator(FakeBackend::new(), &[("user", "<i>{{ row.name }}</i>")]).await;
        let mut regions = Regions::default();
        let first = orch.begin(&Selection::new("user", "slow"));
        let second = orch.begin(&Selection::new("user", "fast"));
        assert_eq!(orch.state(), &SearchState::Querying { token: second.token });

        let newer = orch.apply(
            completed(second.token, json!({"results": [{"name": "new"}]})),
            &mut regions,
        );
        let older = orch.apply(
            completed(first.token, json!({"results": [{"name": "old"}]})),
            &mut regions,
        );
        assert_eq!(newer, Disposition::Applied);
        assert_eq!(older, Disposition::Stale);
        assert_eq!(regions.output, "<i>new</i>");
    }

    #[tokio::test]
    async fn stale_response_overwrites_when_applying_in_arrival_order() {
        let mut orch = orchestrator(FakeBackend::new(), &[("user", "<i>{{ row.name }}</i>")])
            .await
            .with_stale_policy(StalePolicy::Apply);
        let mut regions = Regions::default();
        let first = orch.begin(&Selection::new("user", "slow"));
        let second = orch.begin(&Selection::new("user", "fast"));

        orch.apply(
            completed(second.token, json!({"results": [{"name": "new"}]})),
            &mut regions,
        );
        let older = orch.apply(
            completed(first.token, json!({"results": [{"name": "old"}]})),
            &mut regions,
        );
        assert_eq!(older, Disposition::Applied);
        assert_eq!(regions.output, "<i>old</i>");
    }

    #[tokio::test]
    async fn reset_returns_to_idle() {
        let backend = FakeBackend::new().reply("bad", json!({"error": "nope"}));
        let mut orch = orchestrator(backend, &[]).await;
        let mut regions = Regions::default();
        orch.search(&Selection::new("user", "bad"), &mut regions).await;
        orch.reset();
        assert_eq!(orch.state(), &SearchState::Idle);
    }
}
