// Copyright (c) 2024-2026 Nervosys LLC
// SPDX-License-Identifier: AGPL-3.0-only
//! Navigation menu administration
//!
//! [`MenuAdmin`] holds the admin screen's copy of every menu link and runs
//! the create/update/delete/toggle/reorder operations against the store.
//! Each operation reports a transient [`Notice`] and never retries.

pub mod reorder;

pub use reorder::{plan_move, Direction, Ordered, SwapPlan};

use crate::error::{Result, SyncError};
use crate::models::{LinkForm, MenuLink, MENU_LINKS_TABLE};
use crate::store::ContentStore;
use crate::sync::links::decode_links;
use crate::sync::NavLinksSource;
use serde_json::json;
use std::sync::{Arc, Mutex};

// =============================================================================
// Notices
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Error,
}

/// A short-lived message for the person at the admin screen
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

/// Where notices go
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Sends notices to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notice: Notice) {
        match notice.level {
            NoticeLevel::Success => log::info!("{}", notice.message),
            NoticeLevel::Error => log::warn!("{}", notice.message),
        }
    }
}

/// Keeps every notice; clones share the same list
#[derive(Debug, Default, Clone)]
pub struct NoticeLog {
    notices: Arc<Mutex<Vec<Notice>>>,
}

impl NoticeLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.notices
            .lock()
            .map(|n| n.clone())
            .unwrap_or_default()
    }

    pub fn last(&self) -> Option<Notice> {
        self.notices().pop()
    }
}

impl Notifier for NoticeLog {
    fn notify(&self, notice: Notice) {
        if let Ok(mut notices) = self.notices.lock() {
            notices.push(notice);
        }
    }
}

// =============================================================================
// Menu admin
// =============================================================================

/// The admin screen's menu list and its mutators
pub struct MenuAdmin {
    store: Arc<dyn ContentStore>,
    notifier: Box<dyn Notifier>,
    links: Vec<MenuLink>,
    loading: bool,
}

impl MenuAdmin {
    pub fn new(store: Arc<dyn ContentStore>) -> Self {
        Self::with_notifier(store, Box::new(LogNotifier))
    }

    pub fn with_notifier(store: Arc<dyn ContentStore>, notifier: Box<dyn Notifier>) -> Self {
        Self {
            store,
            notifier,
            links: Vec::new(),
            loading: false,
        }
    }

    /// Links as last fetched, in display order
    pub fn links(&self) -> &[MenuLink] {
        &self.links
    }

    pub fn link(&self, id: &str) -> Option<&MenuLink> {
        self.links.iter().find(|l| l.id == id)
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Order number a newly created link receives
    pub fn next_order_number(&self) -> i64 {
        self.links
            .iter()
            .map(|l| l.order_number)
            .max()
            .map_or(1, |max| max + 1)
    }

    fn fail(&self, notice: &str, error: SyncError) -> SyncError {
        log::error!("{}: {}", notice, error);
        self.notifier.notify(Notice::error(notice));
        error
    }

    /// Replace the local list with the store's
    pub async fn refresh(&mut self) -> Result<()> {
        self.loading = true;
        let result = self.fetch_links().await;
        self.loading = false;

        match result {
            Ok(links) => {
                self.links = links;
                Ok(())
            }
            Err(e) => Err(self.fail("Failed to load header links", e)),
        }
    }

    async fn fetch_links(&self) -> Result<Vec<MenuLink>> {
        let rows = self.store.read(&NavLinksSource::all().query()).await?;
        decode_links(rows)
    }

    /// Re-fetch after a successful write; a failure here is already reported
    async fn resync(&mut self) {
        let _ = self.refresh().await;
    }

    /// Add a link at the end of the menu
    pub async fn create(&mut self, form: &LinkForm) -> Result<()> {
        if let Err(e) = form.validate() {
            return Err(self.fail("Title and URL are required", e));
        }

        let fields = json!({
            "title": form.title,
            "url": form.url,
            "is_active": form.is_active,
            "order_number": self.next_order_number(),
        });

        self.loading = true;
        let result = self.store.insert(MENU_LINKS_TABLE, fields).await;
        self.loading = false;

        match result {
            Ok(()) => {
                self.notifier.notify(Notice::success("Link added successfully"));
                self.resync().await;
                Ok(())
            }
            Err(e) => Err(self.fail("Failed to save header link", e)),
        }
    }

    /// Change a link's title, URL and active flag
    pub async fn update(&mut self, id: &str, form: &LinkForm) -> Result<()> {
        if let Err(e) = form.validate() {
            return Err(self.fail("Title and URL are required", e));
        }

        let fields = json!({
            "title": form.title,
            "url": form.url,
            "is_active": form.is_active,
        });

        self.loading = true;
        let result = self.store.update(MENU_LINKS_TABLE, id, fields).await;
        self.loading = false;

        match result {
            Ok(()) => {
                self.notifier
                    .notify(Notice::success("Link updated successfully"));
                self.resync().await;
                Ok(())
            }
            Err(e) => Err(self.fail("Failed to save header link", e)),
        }
    }

    /// Delete a link once `confirm` agrees.
    ///
    /// Returns `Ok(false)` when the deletion was declined; nothing is sent then.
    pub async fn delete<F>(&mut self, id: &str, confirm: F) -> Result<bool>
    where
        F: FnOnce(&str) -> bool,
    {
        if !confirm("Are you sure you want to delete this link?") {
            return Ok(false);
        }

        self.loading = true;
        let result = self.store.delete(MENU_LINKS_TABLE, id).await;
        self.loading = false;

        match result {
            Ok(()) => {
                self.notifier
                    .notify(Notice::success("Link deleted successfully"));
                self.resync().await;
                Ok(true)
            }
            Err(e) => Err(self.fail("Failed to delete header link", e)),
        }
    }

    /// Flip a link's active flag and patch the local entry in place.
    ///
    /// Returns the new flag.
    pub async fn toggle_active(&mut self, id: &str) -> Result<bool> {
        let current = match self.link(id) {
            Some(link) => link.is_active,
            None => {
                return Err(self.fail(
                    "Failed to update link status",
                    SyncError::Validation(format!("unknown link {}", id)),
                ))
            }
        };
        let next = !current;

        self.loading = true;
        let result = self
            .store
            .update(MENU_LINKS_TABLE, id, json!({ "is_active": next }))
            .await;
        self.loading = false;

        match result {
            Ok(()) => {
                if let Some(link) = self.links.iter_mut().find(|l| l.id == id) {
                    link.is_active = next;
                }
                let verb = if next { "activated" } else { "deactivated" };
                self.notifier.notify(Notice::success(format!("Link {}", verb)));
                Ok(next)
            }
            Err(e) => Err(self.fail("Failed to update link status", e)),
        }
    }

    /// Move a link one position; boundaries and unknown ids are silent no-ops.
    ///
    /// On any write failure the staged order is dropped and the list is
    /// re-fetched from the store.
    pub async fn move_link(&mut self, id: &str, direction: Direction) -> Result<()> {
        let Some(plan) = plan_move(&self.links, id, direction) else {
            return Ok(());
        };

        self.loading = true;
        let result = reorder::persist(self.store.as_ref(), MENU_LINKS_TABLE, &plan).await;
        self.loading = false;

        match result {
            Ok(()) => {
                self.links = plan.staged;
                self.notifier.notify(Notice::success("Menu order updated"));
                Ok(())
            }
            Err(e) => {
                let e = self.fail("Failed to reorder menu links", e);
                self.resync().await;
                Err(e)
            }
        }
    }
}
