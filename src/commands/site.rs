// Copyright (c) 2024-2026 Nervosys LLC
// SPDX-License-Identifier: AGPL-3.0-only
//! Brand asset and ticket commands

use anyhow::Result;
use std::sync::Arc;

use crate::colors::{Status, StyledText};
use crate::site::{available_packages, load_brand_assets};
use crate::store::ContentStore;

/// Print the current logo and favicon
pub async fn show_assets(store: Arc<dyn ContentStore>, default_logo: &str) -> Result<()> {
    let assets = load_brand_assets(store.as_ref(), default_logo).await;

    println!("{} {}", "Logo:".header(), assets.logo_url.path());
    match assets.favicon {
        Some(favicon) => println!(
            "{} {} ({})",
            "Favicon:".header(),
            favicon.url.path(),
            favicon.mime_type
        ),
        None => println!("{} {}", "Favicon:".header(), "(site default)".separator()),
    }
    Ok(())
}

/// Print every available ticket package as a card
pub async fn show_tickets(store: Arc<dyn ContentStore>) -> Result<()> {
    let packages = available_packages(store.as_ref()).await?;

    if packages.is_empty() {
        println!("{} No tickets on sale.", Status::info());
        return Ok(());
    }

    for package in &packages {
        println!("{}\n", package.render_card());
    }
    println!("Total packages: {}", packages.len().to_string().count());
    Ok(())
}
