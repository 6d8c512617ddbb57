// Copyright (c) 2024-2026 Nervosys LLC
// SPDX-License-Identifier: AGPL-3.0-only
//! Logo and favicon lookup from storage buckets

use crate::store::ContentStore;
use serde::Serialize;

pub const LOGOS_BUCKET: &str = "logos";
pub const FAVICONS_BUCKET: &str = "favicons";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Favicon {
    pub url: String,
    pub mime_type: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BrandAssets {
    pub logo_url: String,
    /// `None` leaves the page's static favicon in place
    pub favicon: Option<Favicon>,
}

/// MIME type for a favicon, from the URL's extension
pub fn favicon_mime_type(url: &str) -> &'static str {
    let extension = url
        .rsplit('.')
        .next()
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "svg" => "image/svg+xml",
        _ => "image/x-icon",
    }
}

async fn newest_url(store: &dyn ContentStore, bucket: &str) -> Option<String> {
    match store.latest_object(bucket).await {
        Ok(Some(name)) => Some(store.public_url(bucket, &name)),
        Ok(None) => None,
        Err(e) => {
            log::error!("Error fetching from bucket {}: {}", bucket, e);
            None
        }
    }
}

/// Newest logo and favicon; lookup failures fall back silently
pub async fn load_brand_assets(store: &dyn ContentStore, default_logo: &str) -> BrandAssets {
    let logo_url = newest_url(store, LOGOS_BUCKET)
        .await
        .unwrap_or_else(|| default_logo.to_string());
    let favicon = newest_url(store, FAVICONS_BUCKET).await.map(|url| Favicon {
        mime_type: favicon_mime_type(&url),
        url,
    });

    BrandAssets { logo_url, favicon }
}
