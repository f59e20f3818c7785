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

//! Line-oriented front end: a line commits a search, `:` lines are console commands.

use anyhow::Result;
use tokio::io::AsyncBufRead;
use tokio::io::AsyncBufReadExt;
use tokio::sync::mpsc;

use crate::model::Selection;
use crate::orchestrator::Completed;
use crate::orchestrator::Disposition;
use crate::orchestrator::Orchestrator;
use crate::orchestrator::dispatch;
use crate::output::OutputSink;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Command<'a> {
    Search(&'a str),
    Model(&'a str),
    Models,
    Quit,
    Unknown(&'a str),
    Blank,
}

impl<'a> Command<'a> {
    fn parse(line: &'a str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return Command::Blank;
        }
        let Some(rest) = line.strip_prefix(':') else {
            return Command::Search(line);
        };
        let mut parts = rest.splitn(2, char::is_whitespace);
        match (parts.next(), parts.next().map(str::trim)) {
            (Some("model"), Some(name)) if !name.is_empty() => Command::Model(name),
            (Some("models"), None) => Command::Models,
            (Some("quit" | "q"), None) => Command::Quit,
            _ => Command::Unknown(line),
        }
    }
}

/// Runs until input ends (after outstanding searches settle) or `:quit`.
///
/// Every commit is dispatched immediately on its own task; responses are applied as they
/// arrive.
pub async fn run<R>(
    orch: &mut Orchestrator,
    models: &[String],
    initial_model: String,
    input: R,
    sink: &mut dyn OutputSink,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let (tx, mut rx) = mpsc::unbounded_channel::<Completed>();
    let mut lines = input.lines();
    let mut selected = initial_model;
    let mut in_flight = 0usize;
    let mut input_open = true;

    sink.notice(&format!("model: {selected}"));
    while input_open || in_flight > 0 {
        tokio::select! {
            line = lines.next_line(), if input_open => {
                let Some(line) = line? else {
                    input_open = false;
                    continue;
                };
                match Command::parse(&line) {
                    Command::Blank => {}
                    Command::Quit => break,
                    Command::Models => {
                        let store = orch.renderer().templates();
                        for model in models {
                            let marker = if *model == selected { "*" } else { " " };
                            sink.notice(&format!("{marker} {model} ({})", store.state(model)));
                        }
                    }
                    Command::Model(name) => {
                        if models.iter().any(|m| m == name) {
                            selected = name.to_string();
                            sink.notice(&format!("model: {selected}"));
                        } else {
                            sink.notice(&format!("unknown model {name:?}"));
                        }
                    }
                    Command::Unknown(cmd) => sink.notice(&format!("unknown command {cmd:?}")),
                    Command::Search(text) => {
                        let pending = orch.begin(&Selection::new(selected.as_str(), text));
                        let backend = orch.backend();
                        let tx = tx.clone();
                        in_flight += 1;
                        tokio::spawn(async move {
                            let done = dispatch(backend, pending).await;
                            let _ = tx.send(done);
                        });
                    }
                }
            }
            Some(done) = rx.recv() => settle(orch, done, sink, &mut in_flight),
        }
    }
    Ok(())
}

/// Applies one completion; the orchestrator returns to `Idle` once nothing is outstanding.
fn settle(
    orch: &mut Orchestrator,
    done: Completed,
    sink: &mut dyn OutputSink,
    in_flight: &mut usize,
) {
    *in_flight = in_flight.saturating_sub(1);
    if orch.apply(done, sink) == Disposition::Stale {
        tracing::debug!("console dropped a stale response");
    }
    if *in_flight == 0 {
        orch.reset();
    }
}
