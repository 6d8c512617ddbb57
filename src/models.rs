// Copyright (c) 2024-2026 Nervosys LLC
// SPDX-License-Identifier: AGPL-3.0-only
//! Row types for the festival site tables
//!
//! One canonical schema: columns the backend allows to be NULL are `Option`,
//! everything else is required.

use crate::error::{Result, SyncError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Navigation menu table
pub const MENU_LINKS_TABLE: &str = "header_menu_links";
/// Structured per-page content table
pub const PAGE_CONTENT_TABLE: &str = "page_content";
/// Flat per-section content table
pub const GENERAL_CONTENT_TABLE: &str = "general_content";
/// Ticket offers table
pub const TICKETS_TABLE: &str = "tickets";

/// A navigation bar entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuLink {
    pub id: String,
    pub title: String,
    pub url: String,
    /// Display position; compared, never assumed contiguous or unique
    pub order_number: i64,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

/// Editable fields of a [`MenuLink`], as entered in the admin form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkForm {
    pub title: String,
    pub url: String,
    pub is_active: bool,
}

impl LinkForm {
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            is_active: true,
        }
    }

    pub fn active(mut self, is_active: bool) -> Self {
        self.is_active = is_active;
        self
    }

    /// Prefill the form from an existing link
    pub fn from_link(link: &MenuLink) -> Self {
        Self {
            title: link.title.clone(),
            url: link.url.clone(),
            is_active: link.is_active,
        }
    }

    /// Title and URL must both be non-blank
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() || self.url.trim().is_empty() {
            return Err(SyncError::Validation("Title and URL are required".into()));
        }
        Ok(())
    }
}

/// A row of `general_content`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneralContent {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub section_key: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub subtitle: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl GeneralContent {
    /// Blank text fields are treated as absent
    pub fn normalized(mut self) -> Self {
        fn blank_to_none(field: &mut Option<String>) {
            if field.as_deref().is_some_and(|s| s.is_empty()) {
                *field = None;
            }
        }
        blank_to_none(&mut self.title);
        blank_to_none(&mut self.subtitle);
        blank_to_none(&mut self.content);
        blank_to_none(&mut self.image_url);
        self
    }
}

/// A row of `page_content`; `content` is either a JSON object or a JSON-encoded string
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageContentRow {
    #[serde(default)]
    pub id: String,
    pub page_id: String,
    #[serde(default)]
    pub content: serde_json::Value,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// A row of `tickets`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: String,
    pub name: String,
    pub price: f64,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub available: bool,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub is_popular: bool,
}
