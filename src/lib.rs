// Copyright (c) 2024-2026 Nervosys LLC
// SPDX-License-Identifier: Apache-2.0
//! SHOTAKU site content - Library
//!
//! Live, change-driven access to the festival site's content store, plus the
//! admin operations that edit the navigation menu.
//!
//! ## Modules
//!
//! - **store** - the [`ContentStore`] seam: hosted REST/realtime backend or in-memory
//! - **sync** - [`ContentCache`]: fetch, subscribe, re-fetch on every change
//! - **admin** - [`MenuAdmin`]: create, edit, delete, toggle and reorder menu links
//! - **site** - navigation bar, brand assets and ticket cards
//!
//! ```rust,ignore
//! use shotaku::{sync, MemoryStore};
//! use std::sync::Arc;
//!
//! let store = Arc::new(MemoryStore::new());
//! let mut hero = sync::general_content(store, "hero");
//! hero.activate().await?;
//! println!("{:?}", hero.value());
//! hero.dispose().await;
//! ```

pub mod admin;
pub mod cli;
pub mod colors;
pub mod commands;
pub mod config;
pub mod error;
pub mod models;
pub mod site;
pub mod store;
pub mod sync;

// Re-export commonly used items
pub use admin::{Direction, MenuAdmin, Notice, NoticeLevel, Notifier};
pub use cli::{Cli, Commands, ConfigCommands, LinksCommands};
pub use config::ShotakuConfig;
pub use error::{ErrorKind, SyncError};
pub use models::{GeneralContent, LinkForm, MenuLink, Ticket};
pub use store::{ContentStore, MemoryStore, RestStore};
pub use sync::{ContentCache, ContentSource, Loaded, PageContent, Snapshot};
