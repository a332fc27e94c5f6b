// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! `colony serve` - run the host in the foreground

use anyhow::{Context, Result};
use clap::Args;

use colony_core::domain::node_config::NodeConfigManifest;

use crate::server;

#[derive(Args)]
pub struct ServeArgs {
    /// HTTP API port (overrides spec.network.port)
    #[arg(long)]
    pub port: Option<u16>,

    /// HTTP API bind address (overrides spec.network.bind_address)
    #[arg(long)]
    pub host: Option<String>,

    /// Skip the background swarm analysis task
    #[arg(long)]
    pub no_swarm_analysis: bool,
}

pub async fn handle_command(args: ServeArgs, mut config: NodeConfigManifest) -> Result<()> {
    if let Some(port) = args.port {
        config.spec.network.port = port;
    }
    if let Some(host) = args.host {
        config.spec.network.bind_address = host;
    }
    if args.no_swarm_analysis {
        config.spec.swarm.enabled = false;
    }

    config
        .validate()
        .context("Configuration validation failed")?;

    server::run(config).await
}
