// Copyright (c) 2024-2026 Nervosys LLC
// SPDX-License-Identifier: AGPL-3.0-only
//! CLI argument definitions using clap derive macros

use crate::admin::Direction;
use clap::{Parser, Subcommand};

/// SHOTAKU site content tool - browse and manage live festival site content
#[derive(Parser)]
#[command(name = "shotaku")]
#[command(author = "Nervosys")]
#[command(version)]
#[command(about = "Browse and manage live SHOTAKU site content", long_about = None)]
pub struct Cli {
    /// Backend URL (overrides the config file)
    #[arg(long, global = true)]
    pub url: Option<String>,

    /// Public API key (overrides the config file)
    #[arg(long, global = true)]
    pub key: Option<String>,

    /// Log more detail (repeat for trace output)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    // ============================================================================
    // Menu Administration
    // ============================================================================
    /// Manage navigation menu links
    Links {
        #[command(subcommand)]
        command: LinksCommands,
    },

    // ============================================================================
    // Content
    // ============================================================================
    /// Show a page's structured content
    Page {
        /// Page identifier (e.g. home, about)
        page_id: String,

        /// Keep running and print every update
        #[arg(short, long)]
        watch: bool,
    },

    /// Show a general content section
    Section {
        /// Section key (e.g. hero)
        #[arg(value_name = "KEY")]
        section_key: String,

        /// Keep running and print every update
        #[arg(short, long)]
        watch: bool,
    },

    /// Show the navigation bar
    Nav {
        /// Keep running and print every update
        #[arg(short, long)]
        watch: bool,
    },

    // ============================================================================
    // Site
    // ============================================================================
    /// Show the current logo and favicon
    Assets,

    /// Show available ticket packages
    Tickets,

    // ============================================================================
    // Configuration
    // ============================================================================
    /// Show or change the saved backend settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum LinksCommands {
    /// List every menu link, active or not
    #[command(visible_alias = "ls")]
    List,

    /// Add a link at the end of the menu
    Add {
        /// Label shown in the menu
        title: String,

        /// Target URL or path
        #[arg(value_name = "URL")]
        target: String,

        /// Create the link hidden
        #[arg(long)]
        inactive: bool,
    },

    /// Edit a link's title, URL or visibility
    Edit {
        /// Link id
        id: String,

        /// New label
        #[arg(long)]
        title: Option<String>,

        /// New target URL or path
        #[arg(long, value_name = "URL")]
        target: Option<String>,

        /// New visibility
        #[arg(long)]
        active: Option<bool>,
    },

    /// Delete a link
    #[command(visible_alias = "rm")]
    Delete {
        /// Link id
        id: String,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Move a link one position up or down
    Move {
        /// Link id
        id: String,

        /// up or down
        direction: Direction,
    },

    /// Show or hide a link
    Toggle {
        /// Link id
        id: String,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the effective configuration
    Show,

    /// Save the backend settings given with --url and --key
    Set,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_move() {
        let cli = Cli::try_parse_from(["shotaku", "links", "move", "abc", "up"]).unwrap();
        match cli.command {
            Commands::Links {
                command: LinksCommands::Move { id, direction },
            } => {
                assert_eq!(id, "abc");
                assert_eq!(direction, Direction::Up);
            }
            _ => panic!("expected links move"),
        }
    }

    #[test]
    fn test_bad_direction_is_rejected() {
        assert!(Cli::try_parse_from(["shotaku", "links", "move", "abc", "left"]).is_err());
    }
}
