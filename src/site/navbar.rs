// Copyright (c) 2024-2026 Nervosys LLC
// SPDX-License-Identifier: AGPL-3.0-only
//! Navigation bar model

use crate::models::MenuLink;
use serde::Serialize;

pub const HOME_PATH: &str = "/";
pub const TICKETS_PATH: &str = "/tickets";
pub const STANDS_PATH: &str = "/stands";
pub const ADMIN_PATH: &str = "/admin";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NavEntryKind {
    /// Fixed entry to the home page
    Home,
    /// Managed menu link
    Link,
    /// Highlighted call to action
    QuickAction,
    /// Entry to the admin area
    Admin,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavEntry {
    pub label: String,
    pub url: String,
    pub kind: NavEntryKind,
}

impl NavEntry {
    fn new(label: &str, url: &str, kind: NavEntryKind) -> Self {
        Self {
            label: label.to_string(),
            url: url.to_string(),
            kind,
        }
    }
}

/// What the navigation bar renders, for both layouts
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavModel {
    pub logo_url: String,
    pub desktop: Vec<NavEntry>,
    pub mobile: Vec<NavEntry>,
}

impl NavModel {
    /// Build from menu links in display order; inactive links are skipped
    pub fn build(links: &[MenuLink], logo_url: impl Into<String>) -> Self {
        let managed: Vec<NavEntry> = links
            .iter()
            .filter(|l| l.is_active)
            .map(|l| NavEntry::new(&l.title, &l.url, NavEntryKind::Link))
            .collect();
        let admin = NavEntry::new("Admin", ADMIN_PATH, NavEntryKind::Admin);

        let mut desktop = managed.clone();
        desktop.push(admin.clone());

        let mut mobile = Vec::with_capacity(managed.len() + 4);
        mobile.push(NavEntry::new("Home", HOME_PATH, NavEntryKind::Home));
        mobile.extend(managed);
        mobile.push(NavEntry::new(
            "Buy Ticket",
            TICKETS_PATH,
            NavEntryKind::QuickAction,
        ));
        mobile.push(NavEntry::new(
            "Get a Stand",
            STANDS_PATH,
            NavEntryKind::QuickAction,
        ));
        mobile.push(admin);

        Self {
            logo_url: logo_url.into(),
            desktop,
            mobile,
        }
    }
}
