// Copyright (c) 2024-2026 Nervosys LLC
// SPDX-License-Identifier: AGPL-3.0-only
//! Structured page content (`page_content`)
//!
//! The `content` column holds a JSON document (sometimes stored as a JSON
//! string). Pages without a row, or whose document cannot be read, fall back
//! to built-in copy so the site never renders empty.

use super::{ContentSource, Loaded};
use crate::error::{Result, SyncError};
use crate::models::{PageContentRow, PAGE_CONTENT_TABLE};
use crate::store::{ChannelSpec, ContentStore, Filter, Query};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageHeader {
    pub title: String,
    pub subtitle: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageSection {
    pub id: String,
    pub title: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageSidebar {
    pub title: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageFooter {
    pub text: String,
}

/// Decoded page document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageContent {
    pub header: PageHeader,
    pub sections: Vec<PageSection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sidebar: Option<PageSidebar>,
    pub footer: PageFooter,
}

/// Built-in copy for a page; pages without their own default use `home`'s
pub fn default_page_content(page_id: &str) -> PageContent {
    builtin_default(page_id).unwrap_or_else(home_default)
}

fn builtin_default(page_id: &str) -> Option<PageContent> {
    match page_id {
        "home" => Some(home_default()),
        _ => None,
    }
}

fn home_default() -> PageContent {
    PageContent {
        header: PageHeader {
            title: "Festival Marocain d'Anime & Manga".to_string(),
            subtitle: "Le plus grand événement célébrant la culture japonaise au Maroc"
                .to_string(),
        },
        sections: vec![PageSection {
            id: "s1".to_string(),
            title: "Bienvenue au SHOTAKU".to_string(),
            content: "Le plus grand événement célébrant la culture japonaise, l'anime et le manga au Maroc.".to_string(),
        }],
        sidebar: None,
        footer: PageFooter {
            text: "SHOTAKU © 2024 | Le festival d'anime et manga du Maroc".to_string(),
        },
    }
}

fn parse_field<T: DeserializeOwned>(page_id: &str, name: &str, value: &Value) -> Result<T> {
    serde_json::from_value(value.clone())
        .map_err(|e| SyncError::Parse(format!("page {}: invalid {}: {}", page_id, name, e)))
}

/// Decode a stored document.
///
/// Missing `header`/`footer` and a non-array `sections` are filled in from the
/// page's default; anything present but malformed is a parse error.
pub fn decode_page_content(page_id: &str, stored: &Value) -> Result<PageContent> {
    let document = match stored {
        Value::String(text) => serde_json::from_str::<Value>(text)
            .map_err(|e| SyncError::Parse(format!("page {}: {}", page_id, e)))?,
        other => other.clone(),
    };

    let Value::Object(fields) = document else {
        return Err(SyncError::Parse(format!(
            "page {}: content is not an object",
            page_id
        )));
    };

    let defaults = default_page_content(page_id);
    let present = |name: &str| fields.get(name).filter(|v| !v.is_null());

    let header = match present("header") {
        Some(v) => parse_field(page_id, "header", v)?,
        None => defaults.header,
    };
    let sections = match present("sections") {
        Some(v) if v.is_array() => parse_field(page_id, "sections", v)?,
        _ => defaults.sections,
    };
    let sidebar = match present("sidebar") {
        Some(v) => Some(parse_field(page_id, "sidebar", v)?),
        None => None,
    };
    let footer = match present("footer") {
        Some(v) => parse_field(page_id, "footer", v)?,
        None => defaults.footer,
    };

    Ok(PageContent {
        header,
        sections,
        sidebar,
        footer,
    })
}

/// One page of `page_content`, looked up by `page_id`
#[derive(Debug, Clone)]
pub struct PageContentSource {
    page_id: String,
}

impl PageContentSource {
    pub fn new(page_id: impl Into<String>) -> Self {
        Self {
            page_id: page_id.into(),
        }
    }

    pub fn page_id(&self) -> &str {
        &self.page_id
    }
}

#[async_trait]
impl ContentSource for PageContentSource {
    type Value = PageContent;

    fn label(&self) -> String {
        format!("page {}", self.page_id)
    }

    fn channel(&self) -> ChannelSpec {
        ChannelSpec::table(format!("page-content-{}", self.page_id), PAGE_CONTENT_TABLE)
            .with_filter(Filter::eq("page_id", self.page_id.clone()))
    }

    async fn load(&self, store: &dyn ContentStore) -> Loaded<PageContent> {
        let query = Query::from(PAGE_CONTENT_TABLE).eq("page_id", self.page_id.clone());
        let row = match store.read_one(&query).await {
            Ok(row) => row,
            Err(e) => {
                log::error!("Error fetching page content: {}", e);
                return Loaded::fallback(default_page_content(&self.page_id), e);
            }
        };

        let Some(row) = row else {
            log::debug!("No stored content for page {}, using default", self.page_id);
            return Loaded::value(Some(default_page_content(&self.page_id)));
        };

        let decoded = serde_json::from_value::<PageContentRow>(row)
            .map_err(|e| SyncError::Parse(format!("page {}: {}", self.page_id, e)))
            .and_then(|row| decode_page_content(&self.page_id, &row.content));
        match decoded {
            Ok(content) => Loaded::value(Some(content)),
            Err(e) => {
                log::error!("Error parsing content for page {}: {}", self.page_id, e);
                Loaded::fallback(default_page_content(&self.page_id), e)
            }
        }
    }
}
