// Copyright (c) 2024-2026 Nervosys LLC
// SPDX-License-Identifier: AGPL-3.0-only
//! Live content viewing commands

use anyhow::Result;
use std::sync::Arc;

use crate::colors::{line, Status, StyledText};
use crate::models::{GeneralContent, MenuLink};
use crate::site::{load_brand_assets, NavModel};
use crate::store::ContentStore;
use crate::sync::{self, ContentCache, ContentSource, PageContent, Snapshot};

/// Activate a cache, print it, and with `watch` keep printing until Ctrl-C
async fn show<S, F>(mut cache: ContentCache<S>, watch: bool, render: F) -> Result<()>
where
    S: ContentSource,
    F: Fn(&Snapshot<S::Value>),
{
    cache.activate().await?;
    let mut updates = cache.watch();
    let current = updates.borrow_and_update().clone();
    render(&current);

    if watch {
        println!(
            "{} Watching {} for changes (Ctrl-C to stop)",
            Status::info(),
            cache.source().label()
        );
        loop {
            tokio::select! {
                changed = updates.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let snapshot = updates.borrow_and_update().clone();
                    println!("\n{} Updated", Status::update());
                    render(&snapshot);
                }
                _ = tokio::signal::ctrl_c() => break,
            }
        }
    }

    cache.dispose().await;
    Ok(())
}

fn report_error<T>(snapshot: &Snapshot<T>) {
    if let Some(error) = &snapshot.error {
        eprintln!("{} {}", Status::warn(), error);
    }
}

fn render_page(snapshot: &Snapshot<PageContent>) {
    report_error(snapshot);
    let Some(page) = &snapshot.value else {
        println!("{} No content", Status::info());
        return;
    };

    println!("{}", page.header.title.header());
    println!("{}", page.header.subtitle);
    println!("{}", line(60));
    for section in &page.sections {
        println!("\n{} {}", section.title.header(), format!("#{}", section.id).separator());
        println!("{}", section.content);
    }
    if let Some(sidebar) = &page.sidebar {
        println!("\n{}", sidebar.title.header());
        println!("{}", sidebar.content);
    }
    println!("\n{}", line(60));
    println!("{}", page.footer.text.separator());
}

fn render_section(snapshot: &Snapshot<GeneralContent>) {
    report_error(snapshot);
    let Some(content) = &snapshot.value else {
        println!("{} No content for this section", Status::info());
        return;
    };

    let fields = [
        ("Title", &content.title),
        ("Subtitle", &content.subtitle),
        ("Content", &content.content),
        ("Image", &content.image_url),
    ];
    for (label, value) in fields {
        if let Some(value) = value {
            println!("{} {}", format!("{}:", label).header(), value);
        }
    }
    if let Some(updated) = content.updated_at {
        println!("{} {}", "Updated:".header(), updated.to_rfc3339().separator());
    }
}

/// Print a page's structured content
pub async fn show_page(store: Arc<dyn ContentStore>, page_id: &str, watch: bool) -> Result<()> {
    show(sync::page_content(store, page_id), watch, render_page).await
}

/// Print a general content section
pub async fn show_section(store: Arc<dyn ContentStore>, key: &str, watch: bool) -> Result<()> {
    show(sync::general_content(store, key), watch, render_section).await
}

/// Print the navigation bar, desktop and mobile
pub async fn show_nav(store: Arc<dyn ContentStore>, default_logo: &str, watch: bool) -> Result<()> {
    let assets = load_brand_assets(store.as_ref(), default_logo).await;
    let logo_url = assets.logo_url;

    let render = move |snapshot: &Snapshot<Vec<MenuLink>>| {
        report_error(snapshot);
        let links = snapshot.value.as_deref().unwrap_or_default();
        let nav = NavModel::build(links, logo_url.clone());

        println!("{} {}", "Logo:".header(), nav.logo_url.path());
        println!("{}", "Desktop".header());
        for entry in &nav.desktop {
            println!("  {} {}", entry.label, entry.url.path());
        }
        println!("{}", "Mobile".header());
        for entry in &nav.mobile {
            println!("  {} {}", entry.label, entry.url.path());
        }
    };

    show(sync::nav_links(store), watch, render).await
}
