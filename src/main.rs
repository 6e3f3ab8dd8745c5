// Copyright 2023 rust-dns-sdk authors
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.

use std::path::{Path, PathBuf};
use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;
use alidns_webhook::client::{ChallengeRequest, ChallengeSolver};
use alidns_webhook::config::ProviderConfig;
use alidns_webhook::solver::AliDnsSolver;

#[derive(Parser)]
#[command(name = "alidns-webhook")]
#[command(version)]
#[command(about = "Alibaba Cloud DNS solver for ACME DNS-01 challenges")]
struct Cli {
    /// API group the solver is registered under
    #[arg(long, env = "GROUP_NAME")]
    group_name: String,

    /// Log filter (trace, debug, info, warn, error)
    #[arg(long, env = "RUST_LOG", default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Publish the challenge TXT record described by a request file
    Present {
        #[arg(short, long, value_name = "FILE")]
        request: PathBuf,
    },
    /// Remove the challenge TXT records described by a request file
    Cleanup {
        #[arg(short, long, value_name = "FILE")]
        request: PathBuf,
    },
    /// Print a solver config blob seeded from ALICLOUD_ACCESS_KEY, ALICLOUD_SECRET_KEY and REGIONID
    DefaultConfig,
}

fn read_request(path: &Path) -> anyhow::Result<ChallengeRequest> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading challenge request {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("decoding challenge request {}", path.display()))
}

async fn solver() -> anyhow::Result<AliDnsSolver> {
    let kube_config = kube::Config::infer().await.context("inferring kubernetes client config")?;
    let mut solver = AliDnsSolver::new();
    solver.initialize(kube_config).await?;
    Ok(solver)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&cli.log_level))
        .init();

    if cli.group_name.is_empty() {
        bail!("GROUP_NAME must be specified");
    }
    info!(group_name = %cli.group_name, "starting alidns solver v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Command::Present { request } => {
            let ch = read_request(&request)?;
            solver().await?.present(&ch).await?;
        }
        Command::Cleanup { request } => {
            let ch = read_request(&request)?;
            solver().await?.clean_up(&ch).await?;
        }
        Command::DefaultConfig => {
            let cfg = ProviderConfig::from_env();
            println!("{}", serde_json::to_string_pretty(&cfg)?);
        }
    }

    Ok(())
}
