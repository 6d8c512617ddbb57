// Copyright (c) 2024-2026 Nervosys LLC
// SPDX-License-Identifier: Apache-2.0
//! SHOTAKU site content tool (shotaku) - Main entry point
//!
//! Browse live site content and manage the navigation menu from a terminal.

use anyhow::Result;
use clap::Parser;
use shotaku::cli::{Cli, Commands, ConfigCommands, LinksCommands};
use shotaku::colors::Status;
use shotaku::commands;
use shotaku::config::ShotakuConfig;

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    // `config set` must work even when the saved file cannot be parsed
    if let Commands::Config {
        command: ConfigCommands::Set,
    } = cli.command
    {
        return commands::config_set(cli.url, cli.key);
    }

    let config = ShotakuConfig::load()?.with_overrides(cli.url.clone(), cli.key.clone());

    match cli.command {
        // ====================================================================
        // Configuration (works without a backend)
        // ====================================================================
        Commands::Config { command } => match command {
            ConfigCommands::Show => commands::config_show(&config),
            ConfigCommands::Set => commands::config_set(cli.url, cli.key),
        },

        // ====================================================================
        // Menu Administration
        // ====================================================================
        Commands::Links { command } => {
            let store = commands::connect(&config)?;
            match command {
                LinksCommands::List => commands::list_links(store).await,
                LinksCommands::Add {
                    title,
                    target,
                    inactive,
                } => commands::add_link(store, &title, &target, inactive).await,
                LinksCommands::Edit {
                    id,
                    title,
                    target,
                    active,
                } => commands::edit_link(store, &id, title, target, active).await,
                LinksCommands::Delete { id, yes } => commands::delete_link(store, &id, yes).await,
                LinksCommands::Move { id, direction } => {
                    commands::move_link(store, &id, direction).await
                }
                LinksCommands::Toggle { id } => commands::toggle_link(store, &id).await,
            }
        }

        // ====================================================================
        // Content
        // ====================================================================
        Commands::Page { page_id, watch } => {
            let store = commands::connect(&config)?;
            commands::show_page(store, &page_id, watch).await
        }
        Commands::Section { section_key, watch } => {
            let store = commands::connect(&config)?;
            commands::show_section(store, &section_key, watch).await
        }
        Commands::Nav { watch } => {
            let store = commands::connect(&config)?;
            commands::show_nav(store, &config.default_logo, watch).await
        }

        // ====================================================================
        // Site
        // ====================================================================
        Commands::Assets => {
            let store = commands::connect(&config)?;
            commands::show_assets(store, &config.default_logo).await
        }
        Commands::Tickets => {
            let store = commands::connect(&config)?;
            commands::show_tickets(store).await
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("{} {:#}", Status::error(), e);
        std::process::exit(1);
    }
}
