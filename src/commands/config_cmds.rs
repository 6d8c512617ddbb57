// Copyright (c) 2024-2026 Nervosys LLC
// SPDX-License-Identifier: AGPL-3.0-only
//! Configuration commands

use anyhow::{bail, Result};

use crate::colors::{Status, StyledText};
use crate::config::ShotakuConfig;

fn mask(key: &str) -> String {
    let visible: String = key.chars().take(6).collect();
    format!("{}...", visible)
}

/// Print the effective configuration; the key is masked
pub fn config_show(config: &ShotakuConfig) -> Result<()> {
    let path = ShotakuConfig::config_path()?;

    println!("{} {}", "File:".header(), path.display().to_string().path());
    println!(
        "{} {}",
        "URL:".header(),
        config.url.as_deref().unwrap_or("(not set)")
    );
    println!(
        "{} {}",
        "Key:".header(),
        config
            .anon_key
            .as_deref()
            .map(mask)
            .unwrap_or_else(|| "(not set)".to_string())
    );
    println!("{} {}", "Schema:".header(), config.schema);
    println!(
        "{} {}s",
        "Timeout:".header(),
        config.request_timeout_secs.to_string().count()
    );
    println!("{} {}", "Default logo:".header(), config.default_logo);

    if let Err(e) = config.validate() {
        println!("{} {}", Status::warn(), e);
    }
    Ok(())
}

/// Save the URL and key to the config file.
///
/// An unreadable file is replaced rather than blocking the repair.
pub fn config_set(url: Option<String>, key: Option<String>) -> Result<()> {
    if url.is_none() && key.is_none() {
        bail!("Nothing to set: pass --url and/or --key");
    }

    let path = ShotakuConfig::config_path()?;
    let existing = match ShotakuConfig::load_from(&path) {
        Ok(config) => config,
        Err(e) => {
            log::warn!("Replacing unreadable config {}: {}", path.display(), e);
            ShotakuConfig::default()
        }
    };
    existing.with_overrides(url, key).save()?;

    println!("{} Saved {}", Status::ok(), path.display().to_string().path());
    Ok(())
}
