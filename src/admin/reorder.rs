// Copyright (c) 2024-2026 Nervosys LLC
// SPDX-License-Identifier: AGPL-3.0-only
//! Reorder coordinator
//!
//! Moves one entry of an ordered list by a single position by exchanging its
//! `order_number` with its neighbour's. The new order is staged first, then
//! persisted as two independent writes; the caller commits the staged list
//! only when both writes succeed.

use crate::error::{Result, SyncError};
use crate::models::MenuLink;
use crate::store::ContentStore;
use serde_json::json;
use std::fmt;
use std::str::FromStr;

/// Something with an identity and an explicit display position
pub trait Ordered: Clone {
    fn id(&self) -> &str;
    fn order_number(&self) -> i64;
    fn set_order_number(&mut self, order_number: i64);
}

impl Ordered for MenuLink {
    fn id(&self) -> &str {
        &self.id
    }

    fn order_number(&self) -> i64 {
        self.order_number
    }

    fn set_order_number(&mut self, order_number: i64) {
        self.order_number = order_number;
    }
}

/// Which way to move an entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Towards the start of the list
    Up,
    /// Towards the end of the list
    Down,
}

impl FromStr for Direction {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "up" | "earlier" => Ok(Self::Up),
            "down" | "later" => Ok(Self::Down),
            other => Err(SyncError::Validation(format!(
                "unknown direction '{}', expected up or down",
                other
            ))),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Up => write!(f, "up"),
            Self::Down => write!(f, "down"),
        }
    }
}

/// A staged swap: the reordered list and the two writes that persist it
#[derive(Debug, Clone, PartialEq)]
pub struct SwapPlan<T> {
    pub staged: Vec<T>,
    /// `(id, new order_number)` in the order they are written
    pub writes: [(String, i64); 2],
}

/// Stage moving `id` one step in `direction`.
///
/// Returns `None` for an unknown id, the first entry moving up, or the last
/// entry moving down.
pub fn plan_move<T: Ordered>(items: &[T], id: &str, direction: Direction) -> Option<SwapPlan<T>> {
    let current = items.iter().position(|item| item.id() == id)?;
    let neighbour = match direction {
        Direction::Up => current.checked_sub(1)?,
        Direction::Down => Some(current + 1).filter(|&i| i < items.len())?,
    };

    let mut staged = items.to_vec();
    let moving_order = staged[current].order_number();
    let neighbour_order = staged[neighbour].order_number();
    staged[current].set_order_number(neighbour_order);
    staged[neighbour].set_order_number(moving_order);
    staged.swap(current, neighbour);

    // After the swap the neighbour sits at `current` and the moved entry at `neighbour`
    let writes = [
        (staged[current].id().to_string(), staged[current].order_number()),
        (
            staged[neighbour].id().to_string(),
            staged[neighbour].order_number(),
        ),
    ];

    Some(SwapPlan { staged, writes })
}

/// Persist a staged swap as two sequential updates.
///
/// A failure on the first write is a plain [`SyncError::Mutation`]; a failure
/// on the second, after the first went through, is
/// [`SyncError::PartialReorder`].
pub async fn persist<T>(store: &dyn ContentStore, table: &str, plan: &SwapPlan<T>) -> Result<()> {
    let [(first_id, first_order), (second_id, second_order)] = &plan.writes;

    store
        .update(table, first_id, json!({ "order_number": first_order }))
        .await?;

    store
        .update(table, second_id, json!({ "order_number": second_order }))
        .await
        .map_err(|e| {
            SyncError::PartialReorder(format!(
                "{} moved to {} but {} was not updated: {}",
                first_id, first_order, second_id, e
            ))
        })
}
