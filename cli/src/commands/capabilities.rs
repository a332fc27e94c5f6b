// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! `colony capabilities` - list the built-in tool and strategy catalogs

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use colony_core::domain::capability::CapabilityRegistry;
use colony_core::infrastructure::builtin_capabilities;

#[derive(Args)]
pub struct CapabilitiesArgs {
    /// Print the JSON Schema of each configuration
    #[arg(long)]
    pub schema: bool,
}

pub fn handle_command(args: CapabilitiesArgs) -> Result<()> {
    let capabilities = builtin_capabilities().context("Failed to build capability registries")?;

    print_registry("Tools:", &capabilities.tools, args.schema)?;
    print_registry("Strategies:", &capabilities.strategies, args.schema)?;

    Ok(())
}

fn print_registry<K: ?Sized>(title: &str, registry: &CapabilityRegistry<K>, schema: bool) -> Result<()> {
    println!("{}", title.bold());
    for spec in registry.specifications() {
        let metadata = spec.metadata();
        println!("  {} - {}", metadata.name.bold(), metadata.description);
        if schema {
            let rendered = serde_json::to_string_pretty(spec.config_schema())
                .context("Failed to render configuration schema")?;
            for line in rendered.lines() {
                println!("    {}", line.dimmed());
            }
        }
    }
    println!();
    Ok(())
}
