//! Configuration command handlers.

use super::{parse_assignment, Context};
use anyhow::{bail, Result};
use clap::Subcommand;
use snapkit_snapshot::{ConfigInfo, ConfigValue};
use std::collections::BTreeMap;

/// Config subcommands.
#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show the selected configuration
    Get,
    /// Change settings of the selected configuration
    Set {
        /// Settings to change, KEY=VALUE (true/false become yes/no)
        #[arg(required = true, value_name = "KEY=VALUE")]
        settings: Vec<String>,
    },
}

/// List all configurations.
pub async fn handle_configs(ctx: &Context) -> Result<()> {
    let configs = ctx.snapper.list_configs().await?;
    ctx.emit(&configs, |configs| {
        if configs.is_empty() {
            println!("No configurations found.");
            return;
        }
        println!("{:<20} SUBVOLUME", "NAME");
        println!("{}", "-".repeat(40));
        for config in configs {
            println!("{:<20} {}", config.name, config.subvolume);
        }
    })
}

/// Handle config commands.
pub async fn handle_config(ctx: &Context, command: ConfigCommands) -> Result<()> {
    match command {
        ConfigCommands::Get => {
            let config = ctx.snapper.get_config(&ctx.config).await?;
            ctx.emit(&config, print_config)
        }
        ConfigCommands::Set { settings } => {
            let settings = parse_settings(&settings)?;
            ctx.snapper.set_config(&ctx.config, &settings).await?;
            ctx.emit(&settings, |settings| {
                println!("Updated {} setting(s) of {}", settings.len(), ctx.config);
            })
        }
    }
}

fn parse_settings(args: &[String]) -> Result<BTreeMap<String, ConfigValue>> {
    let mut settings = BTreeMap::new();
    for arg in args {
        let (key, value) = parse_assignment(arg)?;
        if settings.insert(key.clone(), ConfigValue::parse(&value)).is_some() {
            bail!("Setting '{key}' given more than once");
        }
    }
    Ok(settings)
}

fn print_config(config: &ConfigInfo) {
    println!("Config: {}", config.name);
    println!("Subvolume: {}", config.subvolume);
    for (key, value) in &config.attributes {
        println!("  {key}={value}");
    }
}
