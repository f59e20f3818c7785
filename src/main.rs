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

mod assemble;
mod backend;
mod cli;
mod config;
mod console;
mod error;
mod model;
mod orchestrator;
mod output;
mod path;
mod render;
mod templates;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context as _;
use anyhow::Result;
use clap::CommandFactory;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::backend::HttpBackend;
use crate::backend::SearchBackend;
use crate::cli::Cli;
use crate::cli::Commands;
use crate::cli::ConsoleArgs;
use crate::cli::SearchArgs;
use crate::config::Config;
use crate::model::Selection;
use crate::orchestrator::Orchestrator;
use crate::orchestrator::SearchState;
use crate::orchestrator::dispatch;
use crate::output::JsonResponse;
use crate::output::Regions;
use crate::output::TemplateOut;
use crate::output::TerminalSink;
use crate::output::print_json;
use crate::render::RowRenderer;
use crate::templates::DirTemplateSource;
use crate::templates::HttpTemplateSource;
use crate::templates::TemplateSource;
use crate::templates::TemplateState;
use crate::templates::TemplateStore;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    if let Err(err) = run(cli).await {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let fallback = if verbose { "abode=debug" } else { "abode=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Init { force } => cmd_init(force),
        Commands::Search(args) => {
            let json = args.json;
            handle_result(cmd_search(args).await, json)
        }
        Commands::Console(args) => cmd_console(args).await,
        Commands::Templates { json } => handle_result(cmd_templates(json).await, json),
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "abode", &mut std::io::stdout());
            Ok(())
        }
    }
}

fn handle_result(result: Result<()>, json: bool) -> Result<()> {
    match result {
        Ok(()) => Ok(()),
        Err(err) => {
            if json {
                let resp = JsonResponse::error("error", &format!("{err:#}"));
                print_json(&resp)?;
                Ok(())
            } else {
                Err(err)
            }
        }
    }
}

fn cmd_init(force: bool) -> Result<()> {
    let path = match std::env::var_os(config::CONFIG_ENV) {
        Some(path) => PathBuf::from(path),
        None => config::global_config_path()
            .ok_or_else(|| anyhow::anyhow!("no config directory available"))?,
    };
    if path.exists() && !force {
        anyhow::bail!(
            "config already exists at {}; pass --force to overwrite",
            path.display()
        );
    }
    config::write_config(&path, &Config::default())?;
    println!("Wrote config to {}", path.display());
    Ok(())
}

fn template_store(config: &Config, client: &reqwest::Client) -> TemplateStore {
    let source: Arc<dyn TemplateSource> = match &config.templates_dir {
        Some(dir) => Arc::new(DirTemplateSource::new(dir)),
        None => Arc::new(HttpTemplateSource::new(client.clone(), &config.server)),
    };
    TemplateStore::new(source)
}

fn orchestrator(config: &Config, store: TemplateStore, client: reqwest::Client) -> Orchestrator {
    let backend: Arc<dyn SearchBackend> = Arc::new(HttpBackend::new(client, &config.server));
    Orchestrator::new(backend, RowRenderer::new(store), config.query_defaults())
        .with_wrapper(config.wrapper().map(str::to_string))
        .with_stale_policy(config.stale_responses)
}

fn selected_model(config: &Config, requested: Option<String>) -> Result<String> {
    let model = requested.unwrap_or_else(|| config.default_model.clone());
    if !config.has_model(&model) {
        anyhow::bail!(
            "unknown model {model:?}; expected one of {}",
            config.models.join(", ")
        );
    }
    Ok(model)
}

async fn cmd_search(args: SearchArgs) -> Result<()> {
    let mut config = Config::load()?;
    let model = selected_model(&config, args.model)?;
    if let Some(limit) = args.limit {
        config.limit = limit;
    }
    if args.order_by.is_some() {
        config.order_by = args.order_by;
    }
    if args.order_dir.is_some() {
        config.order_dir = args.order_dir;
    }
    config.validate()?;

    let client = reqwest::Client::new();
    let store = template_store(&config, &client);
    let loads = store.load(&config.template_names());
    let mut orch = orchestrator(&config, store, client);

    let pending = orch.begin(&Selection::new(model.as_str(), args.query));
    let query = pending.query.clone();
    tracing::info!(model = %model, limit = query.limit, "searching");

    // The store never blocks; for a one-shot run the templates settle alongside the request.
    let ((), completed) = tokio::join!(loads.settled(), dispatch(orch.backend(), pending));
    let mut regions = Regions::default();
    orch.apply(completed, &mut regions);

    let resp = JsonResponse::ok()
        .with_query(&model, &query)
        .with_state(orch.state().as_label());
    match orch.state().clone() {
        SearchState::Error(err) => {
            // An error clears the output region, and the page file with it.
            write_page(args.out.as_deref(), "", true)?;
            if args.json {
                let resp = JsonResponse::from_search_error(&err)
                    .with_query(&model, &query)
                    .with_state("error");
                print_json(&resp)?;
                return Ok(());
            }
            return Err(err.into());
        }
        SearchState::Rendered { rows } => {
            write_page(args.out.as_deref(), &regions.output, args.json)?;
            if args.json {
                print_json(&resp.with_page(rows, regions.output))?;
            }
        }
        _ => {
            write_page(args.out.as_deref(), "", true)?;
            if args.json {
                print_json(&resp)?;
            } else {
                eprintln!("no matches");
            }
        }
    }
    Ok(())
}

fn write_page(out: Option<&std::path::Path>, html: &str, quiet: bool) -> Result<()> {
    match out {
        Some(path) => {
            std::fs::write(path, html).with_context(|| format!("write {}", path.display()))
        }
        None => {
            if !quiet {
                println!("{html}");
            }
            Ok(())
        }
    }
}

async fn cmd_console(args: ConsoleArgs) -> Result<()> {
    let config = Config::load()?;
    let model = selected_model(&config, args.model)?;

    let client = reqwest::Client::new();
    let store = template_store(&config, &client);
    // Fire and forget: renders racing the loads report the template as not ready.
    drop(store.load(&config.template_names()));
    let mut orch = orchestrator(&config, store, client);

    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    console::run(&mut orch, &config.models, model, stdin, &mut TerminalSink).await
}

async fn cmd_templates(json: bool) -> Result<()> {
    let config = Config::load()?;
    let client = reqwest::Client::new();
    let store = template_store(&config, &client);
    let names = config.template_names();
    store.load(&names).settled().await;

    let states: Vec<(String, TemplateState)> = names
        .into_iter()
        .map(|name| {
            let state = store.state(&name);
            (name, state)
        })
        .collect();

    if json {
        let templates = states
            .iter()
            .map(|(name, state)| TemplateOut {
                name: name.clone(),
                state: state.to_string(),
            })
            .collect();
        print_json(&JsonResponse::ok().with_templates(templates))?;
    } else {
        for (name, state) in &states {
            println!("{name:<10} {state}");
        }
    }
    Ok(())
}
