// Copyright (c) 2024-2026 Nervosys LLC
// SPDX-License-Identifier: AGPL-3.0-only
//! Content synchronization
//!
//! Keeps local copies of server content consistent with the store: fetch on
//! activation, subscribe to changes, re-fetch on every notification.
//!
//! - [`ContentSource`] says what to read and which changes to watch
//! - [`ContentCache`] runs the fetch/subscribe/re-fetch loop for one source
//! - [`GeneralContentSource`], [`PageContentSource`], [`NavLinksSource`] are
//!   the site's sources

pub mod cache;
pub mod general;
pub mod links;
pub mod page;

pub use cache::{ContentCache, Phase, Snapshot};
pub use general::GeneralContentSource;
pub use links::NavLinksSource;
pub use page::{PageContent, PageContentSource};

use crate::error::{Result, SyncError};
use crate::store::{ChannelSpec, ContentStore, Row};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::sync::Arc;

/// Decode rows into `T`, failing on the first malformed one
pub fn decode_rows<T: DeserializeOwned>(what: &str, rows: Vec<Row>) -> Result<Vec<T>> {
    rows.into_iter()
        .map(|row| {
            serde_json::from_value::<T>(row).map_err(|e| SyncError::Parse(format!("{}: {}", what, e)))
        })
        .collect()
}

/// Result of one fetch: the value to show and the error to report.
///
/// A fallback value can come with an error (bad payload replaced by a default).
/// An error with no value leaves the previously cached value in place.
#[derive(Debug, Clone, PartialEq)]
pub struct Loaded<T> {
    pub value: Option<T>,
    pub error: Option<SyncError>,
}

impl<T> Loaded<T> {
    pub fn value(value: Option<T>) -> Self {
        Self { value, error: None }
    }

    pub fn fallback(value: T, error: SyncError) -> Self {
        Self {
            value: Some(value),
            error: Some(error),
        }
    }

    pub fn failed(error: SyncError) -> Self {
        Self {
            value: None,
            error: Some(error),
        }
    }
}

/// Something a [`ContentCache`] can keep fresh.
///
/// Re-fetch policy lives in the cache, so a source only answers "what do I
/// read" and "what changes concern me".
#[async_trait]
pub trait ContentSource: Send + Sync + 'static {
    type Value: Clone + Send + Sync + 'static;

    /// Human-readable name used in logs
    fn label(&self) -> String;

    /// Change-feed channel to watch
    fn channel(&self) -> ChannelSpec;

    /// Fetch and decode the current value
    async fn load(&self, store: &dyn ContentStore) -> Loaded<Self::Value>;
}

/// Live cache of a `general_content` section
pub fn general_content(
    store: Arc<dyn ContentStore>,
    section_key: &str,
) -> ContentCache<GeneralContentSource> {
    ContentCache::new(store, GeneralContentSource::new(section_key))
}

/// Live cache of a page's structured content
pub fn page_content(store: Arc<dyn ContentStore>, page_id: &str) -> ContentCache<PageContentSource> {
    ContentCache::new(store, PageContentSource::new(page_id))
}

/// Live cache of the active navigation links
pub fn nav_links(store: Arc<dyn ContentStore>) -> ContentCache<NavLinksSource> {
    ContentCache::new(store, NavLinksSource::active())
}
