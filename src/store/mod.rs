// Copyright (c) 2024-2026 Nervosys LLC
// SPDX-License-Identifier: AGPL-3.0-only
//! Content store seam
//!
//! Everything the site reads or writes goes through [`ContentStore`]: single
//! round-trip queries and writes against named tables, plus a change feed
//! keyed by table name and an optional row filter.
//!
//! - [`RestStore`] talks to the hosted backend (REST + realtime websocket)
//! - [`MemoryStore`] keeps tables in process and publishes a notification for
//!   every committed write

pub mod memory;
pub mod realtime;
pub mod rest;

pub use memory::{MemoryStore, StoreCall};
pub use rest::RestStore;

use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::cmp::Ordering;
use std::fmt;
use tokio::sync::mpsc;
use uuid::Uuid;

/// A row as returned by the store: a JSON object keyed by column name
pub type Row = Value;

// =============================================================================
// Queries
// =============================================================================

/// Equality filter on one column (`column = value`)
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub column: String,
    pub value: Value,
}

impl Filter {
    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            column: column.into(),
            value: value.into(),
        }
    }

    /// Filter value as it appears in a URL (`true`, `42`, `home`)
    pub fn value_text(&self) -> String {
        match &self.value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }

    /// PostgREST operator form: `eq.<value>`
    pub fn to_postgrest(&self) -> String {
        format!("eq.{}", self.value_text())
    }

    /// Realtime filter form: `<column>=eq.<value>`
    pub fn to_realtime(&self) -> String {
        format!("{}={}", self.column, self.to_postgrest())
    }

    pub fn matches(&self, row: &Row) -> bool {
        match row.get(&self.column) {
            Some(found) => loose_eq(found, &self.value),
            None => false,
        }
    }
}

/// Compare JSON scalars the way a text-encoded filter would: `1` matches `"1"`
fn loose_eq(a: &Value, b: &Value) -> bool {
    if a == b {
        return true;
    }
    match (a, b) {
        (Value::String(s), other) | (other, Value::String(s)) if !other.is_string() => {
            *s == other.to_string()
        }
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        _ => false,
    }
}

/// Sort specification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub column: String,
    pub ascending: bool,
}

impl Order {
    pub fn asc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            ascending: true,
        }
    }

    pub fn desc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            ascending: false,
        }
    }

    pub fn to_postgrest(&self) -> String {
        format!(
            "{}.{}",
            self.column,
            if self.ascending { "asc" } else { "desc" }
        )
    }

    /// Compare two rows on this column; missing values sort last
    pub fn compare(&self, a: &Row, b: &Row) -> Ordering {
        let ordering = match (a.get(&self.column), b.get(&self.column)) {
            (Some(x), Some(y)) => compare_values(x, y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        };
        if self.ascending {
            ordering
        } else {
            ordering.reverse()
        }
    }
}

fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => a.to_string().cmp(&b.to_string()),
    }
}

/// A `select *` against one table
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub table: String,
    pub filters: Vec<Filter>,
    pub order: Option<Order>,
    pub limit: Option<usize>,
}

impl Query {
    pub fn from(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            filters: Vec::new(),
            order: None,
            limit: None,
        }
    }

    pub fn eq(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.push(Filter::eq(column, value));
        self
    }

    pub fn order(mut self, order: Order) -> Self {
        self.order = Some(order);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn matches(&self, row: &Row) -> bool {
        self.filters.iter().all(|f| f.matches(row))
    }
}

/// Extract a row's `id` as text, whether stored as a string or a number
pub fn row_id(row: &Row) -> Option<String> {
    match row.get("id")? {
        Value::String(s) => Some(s.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

// =============================================================================
// Change feed
// =============================================================================

/// Kind of committed write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

impl ChangeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Insert => "INSERT",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "INSERT" => Some(Self::Insert),
            "UPDATE" => Some(Self::Update),
            "DELETE" => Some(Self::Delete),
            _ => None,
        }
    }
}

/// What a subscriber watches
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelSpec {
    /// Channel name, unique per logical consumer
    pub name: String,
    pub table: String,
    pub filter: Option<Filter>,
}

impl ChannelSpec {
    pub fn table(name: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            table: table.into(),
            filter: None,
        }
    }

    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Whether a notification is deliverable on this channel.
    ///
    /// Every write kind is delivered. The row filter is checked against the new record, or the old record
    /// for deletes.
    pub fn matches(&self, change: &ChangeNotification) -> bool {
        if change.table != self.table {
            return false;
        }
        let Some(filter) = &self.filter else {
            return true;
        };
        let record = match change.kind {
            ChangeKind::Delete => change.old_record.as_ref(),
            _ => change.record.as_ref(),
        };
        record.is_some_and(|row| filter.matches(row))
    }
}

/// Emitted once per committed write; never persisted
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeNotification {
    pub table: String,
    pub kind: ChangeKind,
    pub record: Option<Row>,
    pub old_record: Option<Row>,
    pub commit_timestamp: DateTime<Utc>,
}

/// Identity of one open subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(Uuid);

impl SubscriptionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SubscriptionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An open change-feed subscription.
///
/// Hand it back to [`ContentStore::unsubscribe`] to release it; the handle is
/// consumed so it can only be released once.
#[derive(Debug)]
pub struct Subscription {
    id: SubscriptionId,
    channel: ChannelSpec,
    events: mpsc::UnboundedReceiver<ChangeNotification>,
}

impl Subscription {
    pub fn new(
        id: SubscriptionId,
        channel: ChannelSpec,
        events: mpsc::UnboundedReceiver<ChangeNotification>,
    ) -> Self {
        Self {
            id,
            channel,
            events,
        }
    }

    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    pub fn channel(&self) -> &ChannelSpec {
        &self.channel
    }

    /// Next notification, or `None` once the feed has closed
    pub async fn next(&mut self) -> Option<ChangeNotification> {
        self.events.recv().await
    }
}

// =============================================================================
// Store trait
// =============================================================================

/// Table-oriented store with a change feed
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Run a select; rows come back in the query's order
    async fn read(&self, query: &Query) -> Result<Vec<Row>>;

    /// Insert one row
    async fn insert(&self, table: &str, fields: Row) -> Result<()>;

    /// Update the row with the given id; only the given fields change
    async fn update(&self, table: &str, id: &str, fields: Row) -> Result<()>;

    /// Delete the row with the given id
    async fn delete(&self, table: &str, id: &str) -> Result<()>;

    /// Open a change-feed subscription
    async fn subscribe(&self, channel: ChannelSpec) -> Result<Subscription>;

    /// Release a subscription
    async fn unsubscribe(&self, subscription: Subscription);

    /// Name of the most recently created object in a storage bucket
    async fn latest_object(&self, bucket: &str) -> Result<Option<String>>;

    /// Public URL of an object in a storage bucket
    fn public_url(&self, bucket: &str, name: &str) -> String;

    /// First row matching the query, `None` when nothing matches
    async fn read_one(&self, query: &Query) -> Result<Option<Row>> {
        let query = query.clone().limit(1);
        Ok(self.read(&query).await?.into_iter().next())
    }
}
