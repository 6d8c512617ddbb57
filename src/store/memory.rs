// Copyright (c) 2024-2026 Nervosys LLC
// SPDX-License-Identifier: AGPL-3.0-only
//! In-process content store
//!
//! Tables are vectors of JSON rows. Every committed write is published to the
//! subscribers whose channel matches, mirroring the hosted change feed. The
//! store also records each call it receives and can be told to fail reads or
//! writes, which is how the cache and admin tests exercise error paths.

use super::{
    row_id, ChangeKind, ChangeNotification, ChannelSpec, ContentStore, Query, Row, Subscription,
    SubscriptionId,
};
use crate::error::{Result, SyncError};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;
use tokio::sync::mpsc;

/// A call received by [`MemoryStore`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    Read { table: String },
    Insert { table: String },
    Update { table: String, id: String },
    Delete { table: String, id: String },
    Subscribe { table: String },
    Unsubscribe { table: String },
}

impl StoreCall {
    pub fn is_write(&self) -> bool {
        matches!(
            self,
            Self::Insert { .. } | Self::Update { .. } | Self::Delete { .. }
        )
    }
}

struct Subscriber {
    channel: ChannelSpec,
    sender: mpsc::UnboundedSender<ChangeNotification>,
}

#[derive(Debug, Clone)]
struct StoredObject {
    name: String,
    created_at: DateTime<Utc>,
}

#[derive(Default)]
struct Inner {
    tables: HashMap<String, Vec<Row>>,
    subscribers: HashMap<SubscriptionId, Subscriber>,
    buckets: HashMap<String, Vec<StoredObject>>,
    calls: Vec<StoreCall>,
    fail_reads: bool,
    fail_subscribes: bool,
    /// Number of writes still allowed to succeed; `None` means unlimited
    writes_before_failure: Option<usize>,
}

/// Content store held entirely in memory
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        // A poisoned lock only means a test panicked mid-call; the data is still usable
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Replace a table's rows without publishing notifications
    pub fn seed(&self, table: &str, rows: Vec<Row>) {
        self.lock().tables.insert(table.to_string(), rows);
    }

    /// Current rows of a table, in insertion order
    pub fn rows(&self, table: &str) -> Vec<Row> {
        self.lock().tables.get(table).cloned().unwrap_or_default()
    }

    /// Every call received so far
    pub fn calls(&self) -> Vec<StoreCall> {
        self.lock().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    pub fn read_count(&self) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|c| matches!(c, StoreCall::Read { .. }))
            .count()
    }

    pub fn write_count(&self) -> usize {
        self.lock().calls.iter().filter(|c| c.is_write()).count()
    }

    /// Number of open subscriptions
    pub fn subscriber_count(&self) -> usize {
        self.lock().subscribers.len()
    }

    /// Make every read fail until reset
    pub fn fail_reads(&self, fail: bool) {
        self.lock().fail_reads = fail;
    }

    /// Make every subscribe fail until reset
    pub fn fail_subscribes(&self, fail: bool) {
        self.lock().fail_subscribes = fail;
    }

    /// End every open change feed, as a dropped connection would
    pub fn close_subscriptions(&self) {
        let closed = std::mem::take(&mut self.lock().subscribers);
        log::debug!("Closed {} subscription(s)", closed.len());
    }

    /// Let `n` more writes succeed, then fail every write after that
    pub fn fail_writes_after(&self, n: usize) {
        self.lock().writes_before_failure = Some(n);
    }

    pub fn clear_failures(&self) {
        let mut inner = self.lock();
        inner.fail_reads = false;
        inner.fail_subscribes = false;
        inner.writes_before_failure = None;
    }

    /// Add an object to a storage bucket; later objects are newer
    pub fn put_object(&self, bucket: &str, name: &str) {
        let mut inner = self.lock();
        let objects = inner.buckets.entry(bucket.to_string()).or_default();
        let created_at = objects
            .iter()
            .map(|o| o.created_at)
            .max()
            .map(|latest| latest + Duration::seconds(1))
            .unwrap_or_else(Utc::now);
        objects.push(StoredObject {
            name: name.to_string(),
            created_at,
        });
    }

    fn check_write(inner: &mut Inner, what: &str) -> Result<()> {
        match inner.writes_before_failure {
            Some(0) => Err(SyncError::Mutation(format!("{} rejected by store", what))),
            Some(ref mut remaining) => {
                *remaining -= 1;
                Ok(())
            }
            None => Ok(()),
        }
    }

    fn publish(inner: &mut Inner, change: ChangeNotification) {
        inner.subscribers.retain(|id, subscriber| {
            if !subscriber.channel.matches(&change) {
                return true;
            }
            let delivered = subscriber.sender.send(change.clone()).is_ok();
            if !delivered {
                log::debug!("Dropping closed subscriber {}", id);
            }
            delivered
        });
    }
}

fn timestamp() -> Value {
    Value::String(Utc::now().to_rfc3339())
}

#[async_trait]
impl ContentStore for MemoryStore {
    async fn read(&self, query: &Query) -> Result<Vec<Row>> {
        let mut inner = self.lock();
        inner.calls.push(StoreCall::Read {
            table: query.table.clone(),
        });

        if inner.fail_reads {
            return Err(SyncError::Query(format!(
                "{}: store unavailable",
                query.table
            )));
        }

        let mut rows: Vec<Row> = inner
            .tables
            .get(&query.table)
            .map(|rows| rows.iter().filter(|r| query.matches(r)).cloned().collect())
            .unwrap_or_default();

        if let Some(order) = &query.order {
            rows.sort_by(|a, b| order.compare(a, b));
        }
        if let Some(limit) = query.limit {
            rows.truncate(limit);
        }

        Ok(rows)
    }

    async fn insert(&self, table: &str, fields: Row) -> Result<()> {
        let mut inner = self.lock();
        inner.calls.push(StoreCall::Insert {
            table: table.to_string(),
        });
        Self::check_write(&mut inner, &format!("insert into {}", table))?;

        let Value::Object(mut record) = fields else {
            return Err(SyncError::Mutation(format!(
                "insert into {}: fields must be an object",
                table
            )));
        };
        record
            .entry("id")
            .or_insert_with(|| Value::String(uuid::Uuid::new_v4().to_string()));
        record.entry("created_at").or_insert_with(timestamp);
        record.entry("updated_at").or_insert_with(timestamp);
        let record = Value::Object(record);

        inner
            .tables
            .entry(table.to_string())
            .or_default()
            .push(record.clone());

        Self::publish(
            &mut inner,
            ChangeNotification {
                table: table.to_string(),
                kind: ChangeKind::Insert,
                record: Some(record),
                old_record: None,
                commit_timestamp: Utc::now(),
            },
        );
        Ok(())
    }

    async fn update(&self, table: &str, id: &str, fields: Row) -> Result<()> {
        let mut inner = self.lock();
        inner.calls.push(StoreCall::Update {
            table: table.to_string(),
            id: id.to_string(),
        });
        Self::check_write(&mut inner, &format!("update {} {}", table, id))?;

        let Value::Object(fields) = fields else {
            return Err(SyncError::Mutation(format!(
                "update {}: fields must be an object",
                table
            )));
        };

        let Some(row) = inner
            .tables
            .get_mut(table)
            .and_then(|rows| rows.iter_mut().find(|r| row_id(r).as_deref() == Some(id)))
        else {
            // Filtered update that matched nothing: succeeds, changes nothing
            return Ok(());
        };

        let old = row.clone();
        if let Value::Object(record) = row {
            for (column, value) in fields {
                record.insert(column, value);
            }
            record.insert("updated_at".to_string(), timestamp());
        }
        let record = row.clone();

        Self::publish(
            &mut inner,
            ChangeNotification {
                table: table.to_string(),
                kind: ChangeKind::Update,
                record: Some(record),
                old_record: Some(old),
                commit_timestamp: Utc::now(),
            },
        );
        Ok(())
    }

    async fn delete(&self, table: &str, id: &str) -> Result<()> {
        let mut inner = self.lock();
        inner.calls.push(StoreCall::Delete {
            table: table.to_string(),
            id: id.to_string(),
        });
        Self::check_write(&mut inner, &format!("delete from {} {}", table, id))?;

        let removed = inner.tables.get_mut(table).and_then(|rows| {
            let index = rows
                .iter()
                .position(|r| row_id(r).as_deref() == Some(id))?;
            Some(rows.remove(index))
        });

        if let Some(old) = removed {
            Self::publish(
                &mut inner,
                ChangeNotification {
                    table: table.to_string(),
                    kind: ChangeKind::Delete,
                    record: None,
                    old_record: Some(old),
                    commit_timestamp: Utc::now(),
                },
            );
        }
        Ok(())
    }

    async fn subscribe(&self, channel: ChannelSpec) -> Result<Subscription> {
        let mut inner = self.lock();
        inner.calls.push(StoreCall::Subscribe {
            table: channel.table.clone(),
        });
        if inner.fail_subscribes {
            return Err(SyncError::Subscription(format!(
                "channel {}: change feed unavailable",
                channel.name
            )));
        }

        let id = SubscriptionId::new();
        let (sender, receiver) = mpsc::unbounded_channel();
        inner.subscribers.insert(
            id,
            Subscriber {
                channel: channel.clone(),
                sender,
            },
        );
        log::debug!("Channel {} subscribed ({})", channel.name, id);
        Ok(Subscription::new(id, channel, receiver))
    }

    async fn unsubscribe(&self, subscription: Subscription) {
        let mut inner = self.lock();
        inner.calls.push(StoreCall::Unsubscribe {
            table: subscription.channel().table.clone(),
        });
        inner.subscribers.remove(&subscription.id());
        log::debug!(
            "Channel {} unsubscribed ({})",
            subscription.channel().name,
            subscription.id()
        );
    }

    async fn latest_object(&self, bucket: &str) -> Result<Option<String>> {
        let inner = self.lock();
        if inner.fail_reads {
            return Err(SyncError::Query(format!("bucket {}: store unavailable", bucket)));
        }
        Ok(inner
            .buckets
            .get(bucket)
            .and_then(|objects| objects.iter().max_by_key(|o| o.created_at))
            .map(|o| o.name.clone()))
    }

    fn public_url(&self, bucket: &str, name: &str) -> String {
        format!("memory://{}/{}", bucket, urlencoding::encode(name))
    }
}
