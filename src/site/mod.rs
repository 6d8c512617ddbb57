// Copyright (c) 2024-2026 Nervosys LLC
// SPDX-License-Identifier: AGPL-3.0-only
//! Public site view models
//!
//! Plain data built from synchronized content: the navigation bar, the brand
//! assets it shows, and the ticket offer cards.

pub mod assets;
pub mod navbar;
pub mod tickets;

pub use assets::{favicon_mime_type, load_brand_assets, BrandAssets, Favicon};
pub use navbar::{NavEntry, NavEntryKind, NavModel};
pub use tickets::{available_packages, TicketPackage};
