// Copyright (c) 2024-2026 Nervosys LLC
// SPDX-License-Identifier: AGPL-3.0-only
//! Hosted content store
//!
//! Table access goes through the PostgREST endpoint (`/rest/v1`), binary
//! assets through the storage endpoint (`/storage/v1`), and the change feed
//! through the realtime websocket (see [`super::realtime`]).

use super::realtime::{self, RealtimeHandle};
use super::{ChannelSpec, ContentStore, Query, Row, Subscription, SubscriptionId};
use crate::config::ShotakuConfig;
use crate::error::{Result, SyncError};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::Mutex;

/// Client for the hosted backend
pub struct RestStore {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    schema: String,
    heartbeat: Duration,
    connections: Mutex<HashMap<SubscriptionId, RealtimeHandle>>,
}

#[derive(Debug, Deserialize)]
struct StorageObject {
    name: String,
}

impl RestStore {
    pub fn new(config: &ShotakuConfig) -> Result<Self> {
        config.validate()?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .user_agent(format!("shotaku/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| SyncError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url(),
            api_key: config.anon_key.clone().unwrap_or_default(),
            schema: config.schema.clone(),
            heartbeat: Duration::from_secs(config.heartbeat_interval_secs.max(1)),
            connections: Mutex::new(HashMap::new()),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn authed(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    /// Request builder for a write, targeting the configured schema
    fn write_request(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        self.authed(request)
            .header("Content-Profile", &self.schema)
            .header("Prefer", "return=minimal")
    }

    async fn check_write(response: reqwest::Response, what: &str) -> Result<()> {
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(SyncError::Mutation(format!(
            "{} returned {}: {}",
            what, status, body
        )))
    }

    /// Query-string pairs for a select
    pub fn query_params(query: &Query) -> Vec<(String, String)> {
        let mut params = vec![("select".to_string(), "*".to_string())];
        for filter in &query.filters {
            params.push((filter.column.clone(), filter.to_postgrest()));
        }
        if let Some(order) = &query.order {
            params.push(("order".to_string(), order.to_postgrest()));
        }
        if let Some(limit) = query.limit {
            params.push(("limit".to_string(), limit.to_string()));
        }
        params
    }
}

#[async_trait]
impl ContentStore for RestStore {
    async fn read(&self, query: &Query) -> Result<Vec<Row>> {
        let response = self
            .authed(self.client.get(self.table_url(&query.table)))
            .header("Accept-Profile", &self.schema)
            .query(&Self::query_params(query))
            .send()
            .await
            .map_err(|e| SyncError::Query(format!("{}: {}", query.table, e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SyncError::Query(format!(
                "{} returned {}: {}",
                query.table, status, body
            )));
        }

        response
            .json::<Vec<Row>>()
            .await
            .map_err(|e| SyncError::Query(format!("{}: undecodable response: {}", query.table, e)))
    }

    async fn insert(&self, table: &str, fields: Row) -> Result<()> {
        let response = self
            .write_request(self.client.post(self.table_url(table)))
            .json(&fields)
            .send()
            .await
            .map_err(|e| SyncError::Mutation(format!("insert into {}: {}", table, e)))?;
        Self::check_write(response, &format!("insert into {}", table)).await
    }

    async fn update(&self, table: &str, id: &str, fields: Row) -> Result<()> {
        let response = self
            .write_request(self.client.patch(self.table_url(table)))
            .query(&[("id", format!("eq.{}", id))])
            .json(&fields)
            .send()
            .await
            .map_err(|e| SyncError::Mutation(format!("update {} {}: {}", table, id, e)))?;
        Self::check_write(response, &format!("update {} {}", table, id)).await
    }

    async fn delete(&self, table: &str, id: &str) -> Result<()> {
        let response = self
            .write_request(self.client.delete(self.table_url(table)))
            .query(&[("id", format!("eq.{}", id))])
            .send()
            .await
            .map_err(|e| SyncError::Mutation(format!("delete from {} {}: {}", table, id, e)))?;
        Self::check_write(response, &format!("delete from {} {}", table, id)).await
    }

    async fn subscribe(&self, channel: ChannelSpec) -> Result<Subscription> {
        let url = realtime::socket_url(&self.base_url, &self.api_key);
        let (handle, events) = realtime::open(&url, &self.schema, &channel, self.heartbeat).await?;

        let id = SubscriptionId::new();
        self.connections.lock().await.insert(id, handle);
        log::info!("Subscribed to {} ({})", realtime::topic_for(&channel), id);
        Ok(Subscription::new(id, channel, events))
    }

    async fn unsubscribe(&self, subscription: Subscription) {
        let handle = self.connections.lock().await.remove(&subscription.id());
        match handle {
            Some(handle) => {
                handle.close().await;
                log::info!(
                    "Unsubscribed from {} ({})",
                    realtime::topic_for(subscription.channel()),
                    subscription.id()
                );
            }
            None => log::warn!("Unknown subscription {}", subscription.id()),
        }
    }

    async fn latest_object(&self, bucket: &str) -> Result<Option<String>> {
        let url = format!("{}/storage/v1/object/list/{}", self.base_url, bucket);
        let body = json!({
            "prefix": "",
            "limit": 1,
            "offset": 0,
            "sortBy": { "column": "created_at", "order": "desc" },
        });

        let response = self
            .authed(self.client.post(url))
            .json(&body)
            .send()
            .await
            .map_err(|e| SyncError::Query(format!("bucket {}: {}", bucket, e)))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(SyncError::Query(format!(
                "bucket {} returned {}: {}",
                bucket, status, text
            )));
        }

        let objects: Vec<StorageObject> = response
            .json()
            .await
            .map_err(|e| SyncError::Query(format!("bucket {}: undecodable listing: {}", bucket, e)))?;
        Ok(objects.into_iter().next().map(|o| o.name))
    }

    fn public_url(&self, bucket: &str, name: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.base_url,
            bucket,
            urlencoding::encode(name)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Order;

    fn config() -> ShotakuConfig {
        ShotakuConfig::default()
            .with_overrides(Some("https://demo.supabase.co/".into()), Some("anon".into()))
    }

    #[test]
    fn test_new_requires_valid_config() {
        assert!(matches!(
            RestStore::new(&ShotakuConfig::default()),
            Err(SyncError::Config(_))
        ));
        let store = RestStore::new(&config()).unwrap();
        assert_eq!(store.base_url(), "https://demo.supabase.co");
    }

    #[test]
    fn test_new_rejects_zero_timeout() {
        let mut config = config();
        config.request_timeout_secs = 0;
        assert!(matches!(RestStore::new(&config), Err(SyncError::Config(_))));
    }

    #[test]
    fn test_query_params() {
        let query = Query::from("header_menu_links")
            .eq("is_active", true)
            .order(Order::asc("order_number"))
            .limit(5);
        let params = RestStore::query_params(&query);
        assert_eq!(
            params,
            vec![
                ("select".to_string(), "*".to_string()),
                ("is_active".to_string(), "eq.true".to_string()),
                ("order".to_string(), "order_number.asc".to_string()),
                ("limit".to_string(), "5".to_string()),
            ]
        );
    }

    #[test]
    fn test_urls() {
        let store = RestStore::new(&config()).unwrap();
        assert_eq!(
            store.table_url("page_content"),
            "https://demo.supabase.co/rest/v1/page_content"
        );
        assert_eq!(
            store.public_url("logos", "logo v2.png"),
            "https://demo.supabase.co/storage/v1/object/public/logos/logo%20v2.png"
        );
    }
}
