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

use std::path::Path;
use std::path::PathBuf;

use anyhow::Context;
use anyhow::Result;
use serde::Deserialize;
use serde::Serialize;

use crate::model::OrderDir;
use crate::model::QueryDefaults;
use crate::orchestrator::StalePolicy;

pub const CONFIG_ENV: &str = "ABODE_CONFIG";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: String,
    pub models: Vec<String>,
    pub default_model: String,
    /// Results wrapper template; an empty string disables wrapping.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wrapper_template: Option<String>,
    /// Read `{dir}/{model}.html` instead of fetching templates from the server.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub templates_dir: Option<PathBuf>,
    pub limit: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_dir: Option<OrderDir>,
    pub stale_responses: StalePolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: "http://127.0.0.1:9999".to_string(),
            models: ["message", "emoji", "channel", "guild", "user"]
                .iter()
                .map(|m| m.to_string())
                .collect(),
            default_model: "message".to_string(),
            wrapper_template: Some("results".to_string()),
            templates_dir: None,
            limit: 1000,
            order_by: Some("id".to_string()),
            order_dir: Some(OrderDir::Desc),
            stale_responses: StalePolicy::Discard,
        }
    }
}

impl Config {
    /// `$ABODE_CONFIG` if set, then the global config file, then defaults.
    pub fn load() -> Result<Self> {
        if let Some(path) = std::env::var_os(CONFIG_ENV) {
            return read_config(Path::new(&path));
        }
        match global_config_path() {
            Some(path) if path.exists() => read_config(&path),
            _ => Ok(Config::default()),
        }
    }

    pub fn wrapper(&self) -> Option<&str> {
        self.wrapper_template
            .as_deref()
            .filter(|name| !name.is_empty())
    }

    /// Every template fetched at startup: one per model plus the wrapper.
    pub fn template_names(&self) -> Vec<String> {
        let mut names = self.models.clone();
        if let Some(wrapper) = self.wrapper() {
            names.push(wrapper.to_string());
        }
        names
    }

    pub fn has_model(&self, model: &str) -> bool {
        self.models.iter().any(|m| m == model)
    }

    pub fn query_defaults(&self) -> QueryDefaults {
        QueryDefaults {
            limit: self.limit,
            order_by: self.order_by.clone(),
            order_dir: self.order_dir,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.models.is_empty() {
            anyhow::bail!("models must not be empty");
        }
        if !self.has_model(&self.default_model) {
            anyhow::bail!(
                "default_model {:?} is not one of the configured models",
                self.default_model
            );
        }
        if self.limit == 0 {
            anyhow::bail!("limit must be positive");
        }
        Ok(())
    }
}

fn config_dir() -> Option<PathBuf> {
    if cfg!(target_os = "windows") {
        if let Ok(appdata) = std::env::var("APPDATA") {
            return Some(PathBuf::from(appdata));
        }
        if let Ok(profile) = std::env::var("USERPROFILE") {
            return Some(PathBuf::from(profile).join("AppData").join("Roaming"));
        }
        return None;
    }

    if cfg!(target_os = "macos") {
        let home = std::env::var("HOME").ok()?;
        return Some(
            PathBuf::from(home)
                .join("Library")
                .join("Application Support"),
        );
    }

    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        return Some(PathBuf::from(xdg));
    }
    let home = std::env::var("HOME").ok()?;
    Some(PathBuf::from(home).join(".config"))
}

pub fn global_config_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("abode").join("abode.toml"))
}

pub fn read_config(path: &Path) -> Result<Config> {
    let text = std::fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let config: Config =
        toml::from_str(&text).with_context(|| format!("parse {}", path.display()))?;
    config
        .validate()
        .with_context(|| format!("invalid config {}", path.display()))?;
    Ok(config)
}

pub fn write_config(path: &Path, config: &Config) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).with_context(|| format!("create dir {parent:?}"))?;
    }
    let text = toml::to_string_pretty(config).context("serialize config")?;
    std::fs::write(path, text).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}
