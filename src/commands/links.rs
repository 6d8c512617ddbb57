// Copyright (c) 2024-2026 Nervosys LLC
// SPDX-License-Identifier: AGPL-3.0-only
//! Menu link administration commands

use anyhow::{anyhow, Result};
use colored::Colorize;
use std::sync::Arc;
use tabled::{settings::Style as TableStyle, Table, Tabled};

use super::{confirm, menu_admin};
use crate::admin::Direction;
use crate::colors::Status;
use crate::models::LinkForm;
use crate::store::ContentStore;

#[derive(Tabled)]
struct LinkRow {
    #[tabled(rename = "Order")]
    order: i64,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "URL")]
    url: String,
    #[tabled(rename = "Active")]
    active: String,
    #[tabled(rename = "Id")]
    id: String,
}

/// List every menu link in display order
pub async fn list_links(store: Arc<dyn ContentStore>) -> Result<()> {
    let admin = menu_admin(store).await?;

    if admin.links().is_empty() {
        println!("{} No menu links yet.", Status::info());
        return Ok(());
    }

    let rows: Vec<LinkRow> = admin
        .links()
        .iter()
        .map(|link| LinkRow {
            order: link.order_number,
            title: link.title.clone(),
            url: link.url.clone(),
            active: if link.is_active {
                "Yes".to_string()
            } else {
                "No".to_string()
            },
            id: link.id.clone(),
        })
        .collect();

    let table = Table::new(rows)
        .with(TableStyle::ascii_rounded())
        .to_string();

    println!("{}", table);
    println!("\nTotal links: {}", admin.links().len());
    Ok(())
}

/// Add a link at the end of the menu
pub async fn add_link(
    store: Arc<dyn ContentStore>,
    title: &str,
    target: &str,
    inactive: bool,
) -> Result<()> {
    let mut admin = menu_admin(store).await?;
    let form = LinkForm::new(title, target).active(!inactive);
    admin.create(&form).await?;
    Ok(())
}

/// Change the given fields of a link; others keep their current value
pub async fn edit_link(
    store: Arc<dyn ContentStore>,
    id: &str,
    title: Option<String>,
    target: Option<String>,
    active: Option<bool>,
) -> Result<()> {
    let mut admin = menu_admin(store).await?;
    let link = admin
        .link(id)
        .ok_or_else(|| anyhow!("No menu link with id {}", id))?;

    let mut form = LinkForm::from_link(link);
    if let Some(title) = title {
        form.title = title;
    }
    if let Some(target) = target {
        form.url = target;
    }
    if let Some(active) = active {
        form.is_active = active;
    }

    admin.update(id, &form).await?;
    Ok(())
}

/// Delete a link, asking first unless `yes` is set
pub async fn delete_link(store: Arc<dyn ContentStore>, id: &str, yes: bool) -> Result<()> {
    let mut admin = menu_admin(store).await?;
    let deleted = admin
        .delete(id, |message| yes || confirm(&message.yellow().to_string()))
        .await?;

    if !deleted {
        println!("Cancelled");
    }
    Ok(())
}

/// Move a link one position
pub async fn move_link(store: Arc<dyn ContentStore>, id: &str, direction: Direction) -> Result<()> {
    let mut admin = menu_admin(store).await?;
    if admin.link(id).is_none() {
        return Err(anyhow!("No menu link with id {}", id));
    }

    let before: Vec<String> = admin.links().iter().map(|l| l.id.clone()).collect();
    admin.move_link(id, direction).await?;

    let after: Vec<String> = admin.links().iter().map(|l| l.id.clone()).collect();
    if before == after {
        println!(
            "{} Link is already at the {} of the menu",
            Status::info(),
            if direction == Direction::Up {
                "top"
            } else {
                "bottom"
            }
        );
    }
    Ok(())
}

/// Show or hide a link
pub async fn toggle_link(store: Arc<dyn ContentStore>, id: &str) -> Result<()> {
    let mut admin = menu_admin(store).await?;
    admin.toggle_active(id).await?;
    Ok(())
}
