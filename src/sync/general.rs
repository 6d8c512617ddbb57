// Copyright (c) 2024-2026 Nervosys LLC
// SPDX-License-Identifier: AGPL-3.0-only
//! Flat section content (`general_content`)

use super::{ContentSource, Loaded};
use crate::error::SyncError;
use crate::models::{GeneralContent, GENERAL_CONTENT_TABLE};
use crate::store::{ChannelSpec, ContentStore, Filter, Query};
use async_trait::async_trait;

/// One section of `general_content`, looked up by `section_key`
#[derive(Debug, Clone)]
pub struct GeneralContentSource {
    section_key: String,
    fallback: Option<GeneralContent>,
}

impl GeneralContentSource {
    pub fn new(section_key: impl Into<String>) -> Self {
        Self {
            section_key: section_key.into(),
            fallback: None,
        }
    }

    /// Content to show when the section has no row or cannot be read
    pub fn with_fallback(mut self, fallback: GeneralContent) -> Self {
        self.fallback = Some(fallback);
        self
    }

    pub fn section_key(&self) -> &str {
        &self.section_key
    }

    fn on_error(&self, error: SyncError) -> Loaded<GeneralContent> {
        log::error!(
            "Error fetching content for section \"{}\": {}",
            self.section_key,
            error
        );
        match &self.fallback {
            Some(fallback) => Loaded::fallback(fallback.clone(), error),
            None => Loaded::failed(error),
        }
    }
}

#[async_trait]
impl ContentSource for GeneralContentSource {
    type Value = GeneralContent;

    fn label(&self) -> String {
        format!("section {}", self.section_key)
    }

    fn channel(&self) -> ChannelSpec {
        ChannelSpec::table(
            format!("general-content-{}", self.section_key),
            GENERAL_CONTENT_TABLE,
        )
        .with_filter(Filter::eq("section_key", self.section_key.clone()))
    }

    async fn load(&self, store: &dyn ContentStore) -> Loaded<GeneralContent> {
        let query = Query::from(GENERAL_CONTENT_TABLE).eq("section_key", self.section_key.clone());
        let row = match store.read_one(&query).await {
            Ok(row) => row,
            Err(e) => return self.on_error(e),
        };

        let Some(row) = row else {
            log::debug!("No content row for section \"{}\"", self.section_key);
            return Loaded::value(self.fallback.clone());
        };

        match serde_json::from_value::<GeneralContent>(row) {
            Ok(content) => Loaded::value(Some(content.normalized())),
            Err(e) => self.on_error(SyncError::Parse(format!(
                "section {}: {}",
                self.section_key, e
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use serde_json::json;

    fn fallback() -> GeneralContent {
        GeneralContent {
            id: String::new(),
            section_key: "hero".into(),
            title: Some("SHOTAKU".into()),
            subtitle: None,
            content: None,
            image_url: None,
            created_at: None,
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn test_loads_matching_row() {
        let store = MemoryStore::new();
        store.seed(
            GENERAL_CONTENT_TABLE,
            vec![
                json!({"id": "1", "section_key": "hero", "title": "Bienvenue", "image_url": ""}),
                json!({"id": "2", "section_key": "about", "title": "À propos"}),
            ],
        );

        let loaded = GeneralContentSource::new("hero").load(&store).await;
        let content = loaded.value.unwrap();
        assert_eq!(content.title.as_deref(), Some("Bienvenue"));
        assert_eq!(content.image_url, None);
        assert!(loaded.error.is_none());
    }

    #[tokio::test]
    async fn test_absent_row_is_not_an_error() {
        let store = MemoryStore::new();
        let loaded = GeneralContentSource::new("hero").load(&store).await;
        assert_eq!(loaded, Loaded::value(None));

        let loaded = GeneralContentSource::new("hero")
            .with_fallback(fallback())
            .load(&store)
            .await;
        assert_eq!(loaded.value, Some(fallback()));
        assert!(loaded.error.is_none());
    }

    #[tokio::test]
    async fn test_query_failure_uses_fallback() {
        let store = MemoryStore::new();
        store.fail_reads(true);

        let loaded = GeneralContentSource::new("hero").load(&store).await;
        assert!(loaded.value.is_none());
        assert!(matches!(loaded.error, Some(SyncError::Query(_))));

        let loaded = GeneralContentSource::new("hero")
            .with_fallback(fallback())
            .load(&store)
            .await;
        assert_eq!(loaded.value, Some(fallback()));
    }

    #[tokio::test]
    async fn test_malformed_row_is_a_parse_error() {
        let store = MemoryStore::new();
        store.seed(
            GENERAL_CONTENT_TABLE,
            vec![json!({"id": "1", "section_key": "hero", "title": 42})],
        );
        let loaded = GeneralContentSource::new("hero").load(&store).await;
        assert!(matches!(loaded.error, Some(SyncError::Parse(_))));
    }

    #[test]
    fn test_channel_is_scoped_to_section() {
        let channel = GeneralContentSource::new("hero").channel();
        assert_eq!(channel.name, "general-content-hero");
        assert_eq!(channel.filter.unwrap().to_realtime(), "section_key=eq.hero");
    }
}
