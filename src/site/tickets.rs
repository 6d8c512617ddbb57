// Copyright (c) 2024-2026 Nervosys LLC
// SPDX-License-Identifier: AGPL-3.0-only
//! Ticket offer cards

use crate::error::Result;
use crate::models::{Ticket, TICKETS_TABLE};
use crate::store::{ContentStore, Order, Query};
use crate::sync::decode_rows;
use std::fmt::Write;

#[derive(Debug, Clone, PartialEq)]
pub struct TicketPackage {
    pub name: String,
    /// Price in MAD
    pub price: f64,
    pub description: String,
    pub features: Vec<String>,
    pub is_popular: bool,
}

impl From<&Ticket> for TicketPackage {
    fn from(ticket: &Ticket) -> Self {
        Self {
            name: ticket.name.clone(),
            price: ticket.price,
            description: ticket.description.clone().unwrap_or_default(),
            features: ticket.features.clone(),
            is_popular: ticket.is_popular,
        }
    }
}

fn format_price(price: f64) -> String {
    if price.fract() == 0.0 {
        format!("{:.0}", price)
    } else {
        format!("{:.2}", price)
    }
}

impl TicketPackage {
    /// Render as a plain-text card
    pub fn render_card(&self) -> String {
        let mut card = String::new();
        if self.is_popular {
            let _ = writeln!(card, "*** Recommandé ***");
        }
        let _ = writeln!(card, "{}", self.name);
        let _ = writeln!(card, "{} MAD", format_price(self.price));
        if !self.description.is_empty() {
            let _ = writeln!(card, "{}", self.description);
        }
        for feature in &self.features {
            let _ = writeln!(card, "  ✓ {}", feature);
        }
        let _ = write!(card, "[ Acheter ]");
        card
    }
}

/// Available tickets, cheapest first
pub async fn available_packages(store: &dyn ContentStore) -> Result<Vec<TicketPackage>> {
    let query = Query::from(TICKETS_TABLE)
        .eq("available", true)
        .order(Order::asc("price"));
    let tickets: Vec<Ticket> = decode_rows("ticket", store.read(&query).await?)?;
    Ok(tickets.iter().map(TicketPackage::from).collect())
}
