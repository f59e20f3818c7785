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

//! Process-lifetime template cache, filled by independent background fetches.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use tokio::task::JoinHandle;

use crate::error::Result;
use crate::error::SearchError;

/// Where template bodies come from.
#[async_trait]
pub trait TemplateSource: Send + Sync {
    async fn fetch(&self, name: &str) -> Result<String>;
}

/// `GET {server}/templates/{name}.html`
pub struct HttpTemplateSource {
    client: reqwest::Client,
    server: String,
}

impl HttpTemplateSource {
    pub fn new(client: reqwest::Client, server: &str) -> Self {
        Self {
            client,
            server: server.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl TemplateSource for HttpTemplateSource {
    async fn fetch(&self, name: &str) -> Result<String> {
        let url = format!("{}/templates/{name}.html", self.server);
        let body = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        Ok(body)
    }
}

/// Reads `{dir}/{name}.html` from disk.
pub struct DirTemplateSource {
    dir: PathBuf,
}

impl DirTemplateSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl TemplateSource for DirTemplateSource {
    async fn fetch(&self, name: &str) -> Result<String> {
        let path = self.dir.join(format!("{name}.html"));
        tokio::fs::read_to_string(&path)
            .await
            .map_err(|err| SearchError::Transport(format!("read {}: {err}", path.display())))
    }
}

#[derive(Debug, Clone)]
pub struct Template {
    body: Arc<str>,
}

impl Template {
    pub fn new(body: impl Into<Arc<str>>) -> Self {
        Self { body: body.into() }
    }

    pub fn body(&self) -> &str {
        &self.body
    }
}

/// Observable load state of one template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateState {
    /// Never requested.
    Missing,
    Loading,
    Ready,
    /// The single fetch attempt failed; there is no retry.
    Failed(String),
}

impl fmt::Display for TemplateState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemplateState::Missing => f.write_str("missing"),
            TemplateState::Loading => f.write_str("loading"),
            TemplateState::Ready => f.write_str("ready"),
            TemplateState::Failed(reason) => write!(f, "failed: {reason}"),
        }
    }
}

enum Slot {
    Loading,
    Ready(Template),
    Failed(String),
}

/// Name-keyed template map. Each key is written at most once by its own loader task.
#[derive(Clone)]
pub struct TemplateStore {
    slots: Arc<RwLock<HashMap<String, Slot>>>,
    source: Arc<dyn TemplateSource>,
}

/// Join handles for the fetches started by one [`TemplateStore::load`] call.
///
/// Dropping it leaves the fetches running.
pub struct LoadHandle {
    tasks: Vec<JoinHandle<()>>,
}

impl LoadHandle {
    /// Waits until every fetch from this batch has either stored its template or failed.
    pub async fn settled(self) {
        for task in self.tasks {
            if let Err(err) = task.await {
                tracing::warn!("template loader task ended abnormally: {err}");
            }
        }
    }
}

impl TemplateStore {
    pub fn new(source: Arc<dyn TemplateSource>) -> Self {
        Self {
            slots: Arc::new(RwLock::new(HashMap::new())),
            source,
        }
    }

    /// Starts one background fetch per name not already requested. Must run inside a tokio runtime.
    pub fn load(&self, names: &[String]) -> LoadHandle {
        let mut tasks = Vec::with_capacity(names.len());
        for name in names {
            {
                let mut slots = self.slots.write();
                if slots.contains_key(name) {
                    continue;
                }
                slots.insert(name.clone(), Slot::Loading);
            }

            let slots = Arc::clone(&self.slots);
            let source = Arc::clone(&self.source);
            let name = name.clone();
            tasks.push(tokio::spawn(async move {
                let slot = match source.fetch(&name).await {
                    Ok(body) => {
                        tracing::debug!(template = %name, bytes = body.len(), "template loaded");
                        Slot::Ready(Template::new(body))
                    }
                    Err(err) => {
                        tracing::warn!(template = %name, "template load failed: {err}");
                        Slot::Failed(err.to_string())
                    }
                };
                slots.write().insert(name, slot);
            }));
        }
        LoadHandle { tasks }
    }

    /// Returns the template if its fetch has completed. Never waits.
    pub fn get(&self, name: &str) -> Result<Template> {
        match self.slots.read().get(name) {
            Some(Slot::Ready(template)) => Ok(template.clone()),
            other => Err(SearchError::TemplateNotReady {
                model: name.to_string(),
                state: slot_state(other),
            }),
        }
    }

    pub fn state(&self, name: &str) -> TemplateState {
        slot_state(self.slots.read().get(name))
    }
}

fn slot_state(slot: Option<&Slot>) -> TemplateState {
    match slot {
        None => TemplateState::Missing,
        Some(Slot::Loading) => TemplateState::Loading,
        Some(Slot::Ready(_)) => TemplateState::Ready,
        Some(Slot::Failed(reason)) => TemplateState::Failed(reason.clone()),
    }
}
