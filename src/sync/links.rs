// Copyright (c) 2024-2026 Nervosys LLC
// SPDX-License-Identifier: AGPL-3.0-only
//! Navigation links (`header_menu_links`)

use super::{decode_rows, ContentSource, Loaded};
use crate::error::Result;
use crate::models::{MenuLink, MENU_LINKS_TABLE};
use crate::store::{ChannelSpec, ContentStore, Order, Query, Row};
use async_trait::async_trait;

/// Decode menu rows, failing on the first malformed one
pub fn decode_links(rows: Vec<Row>) -> Result<Vec<MenuLink>> {
    decode_rows("menu link", rows)
}

/// Menu links ordered by `order_number`; watches the whole table
#[derive(Debug, Clone)]
pub struct NavLinksSource {
    active_only: bool,
}

impl NavLinksSource {
    /// Only links flagged active, as the public navigation bar shows them
    pub fn active() -> Self {
        Self { active_only: true }
    }

    /// Every link, as the admin screen lists them
    pub fn all() -> Self {
        Self { active_only: false }
    }

    pub fn query(&self) -> Query {
        let query = Query::from(MENU_LINKS_TABLE);
        let query = if self.active_only {
            query.eq("is_active", true)
        } else {
            query
        };
        query.order(Order::asc("order_number"))
    }
}

#[async_trait]
impl ContentSource for NavLinksSource {
    type Value = Vec<MenuLink>;

    fn label(&self) -> String {
        if self.active_only {
            "navigation links".to_string()
        } else {
            "all menu links".to_string()
        }
    }

    fn channel(&self) -> ChannelSpec {
        ChannelSpec::table("header_menu_changes", MENU_LINKS_TABLE)
    }

    async fn load(&self, store: &dyn ContentStore) -> Loaded<Vec<MenuLink>> {
        let rows = match store.read(&self.query()).await {
            Ok(rows) => rows,
            Err(e) => {
                log::error!("Error fetching navigation links: {}", e);
                return Loaded::failed(e);
            }
        };
        match decode_links(rows) {
            Ok(links) => Loaded::value(Some(links)),
            Err(e) => {
                log::error!("Error decoding navigation links: {}", e);
                Loaded::failed(e)
            }
        }
    }
}
