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

use std::path::PathBuf;

use clap::Args;
use clap::Parser;
use clap::Subcommand;
use clap_complete::Shell;

use crate::model::OrderDir;

#[derive(Parser, Debug)]
#[command(name = "abode", version, about = "Search console for an abode archive server")]
pub struct Cli {
    /// Enable debug logging on stderr
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write the default config file
    Init {
        /// Overwrite an existing config
        #[arg(long)]
        force: bool,
    },

    /// Run one search and print the rendered rows
    Search(SearchArgs),

    /// Interactive console: each line is a search
    Console(ConsoleArgs),

    /// Load every template and report its state
    Templates {
        /// Output JSON
        #[arg(long)]
        json: bool,
    },

    /// Print shell completions
    Completions {
        /// Target shell
        shell: Shell,
    },
}

#[derive(Args, Debug)]
pub struct SearchArgs {
    /// Query text
    pub query: String,

    /// Model to search (defaults to the configured default model)
    #[arg(long, short)]
    pub model: Option<String>,

    /// Maximum rows requested from the server
    #[arg(long)]
    pub limit: Option<usize>,

    /// Field the server orders by
    #[arg(long)]
    pub order_by: Option<String>,

    /// Order direction
    #[arg(long, value_enum)]
    pub order_dir: Option<OrderDir>,

    /// Write the rendered HTML to a file instead of stdout
    #[arg(long)]
    pub out: Option<PathBuf>,

    /// Output JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct ConsoleArgs {
    /// Initially selected model
    #[arg(long, short)]
    pub model: Option<String>,
}
