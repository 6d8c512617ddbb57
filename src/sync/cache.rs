// Copyright (c) 2024-2026 Nervosys LLC
// SPDX-License-Identifier: AGPL-3.0-only
//! Live content cache
//!
//! A [`ContentCache`] owns one cached value and one change-feed subscription.
//! Lifecycle: `Idle` → `Active` (after [`ContentCache::activate`]) →
//! `Disposed` (after [`ContentCache::dispose`] or drop).
//!
//! Every notification starts its own re-fetch; fetches are never coalesced, so
//! overlapping fetches race and the last one to finish wins. A fetch result is
//! applied only if the cache is still active and still on the same source
//! generation it was started under.

use super::{ContentSource, Loaded};
use crate::error::{Result, SyncError};
use crate::store::{ContentStore, Subscription};
use std::sync::{Arc, Mutex};
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;

/// Lifecycle phase of a cache
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Active,
    Disposed,
}

/// What observers see
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot<T> {
    pub value: Option<T>,
    /// True only while the initial fetch is in flight
    pub is_loading: bool,
    pub error: Option<SyncError>,
}

impl<T> Default for Snapshot<T> {
    fn default() -> Self {
        Self {
            value: None,
            is_loading: false,
            error: None,
        }
    }
}

#[derive(Debug)]
struct Lifecycle {
    phase: Phase,
    generation: u64,
}

struct Shared<T> {
    lifecycle: Mutex<Lifecycle>,
    snapshot: watch::Sender<Snapshot<T>>,
}

impl<T: Clone + Send + Sync + 'static> Shared<T> {
    fn lifecycle(&self) -> std::sync::MutexGuard<'_, Lifecycle> {
        self.lifecycle.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn is_live(&self, generation: u64) -> bool {
        let lifecycle = self.lifecycle();
        lifecycle.phase == Phase::Active && lifecycle.generation == generation
    }

    /// Apply a fetch result. Returns false when the result was discarded.
    fn apply(&self, generation: u64, loaded: Loaded<T>, initial: bool) -> bool {
        // Hold the lifecycle lock so a concurrent dispose cannot interleave
        let lifecycle = self.lifecycle();
        if lifecycle.phase != Phase::Active || lifecycle.generation != generation {
            log::debug!(
                "Discarding fetch result from generation {} (now {} / {:?})",
                generation,
                lifecycle.generation,
                lifecycle.phase
            );
            return false;
        }

        self.snapshot.send_modify(|snapshot| {
            match (loaded.value, loaded.error) {
                // Failed with nothing to show: keep the stale value
                (None, Some(error)) => snapshot.error = Some(error),
                (value, error) => {
                    snapshot.value = value;
                    snapshot.error = error;
                }
            }
            if initial {
                snapshot.is_loading = false;
            }
        });
        true
    }

    /// Record that the change feed ended while this generation was live
    fn feed_closed(&self, generation: u64, error: SyncError) {
        let lifecycle = self.lifecycle();
        if lifecycle.phase == Phase::Active && lifecycle.generation == generation {
            self.snapshot.send_modify(|snapshot| snapshot.error = Some(error));
        }
    }
}

struct Listener {
    stop: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

/// Cached server value kept fresh by the change feed
pub struct ContentCache<S: ContentSource> {
    store: Arc<dyn ContentStore>,
    source: Arc<S>,
    shared: Arc<Shared<S::Value>>,
    listener: Option<Listener>,
}

impl<S: ContentSource> ContentCache<S> {
    pub fn new(store: Arc<dyn ContentStore>, source: S) -> Self {
        let (snapshot, _) = watch::channel(Snapshot::default());
        Self {
            store,
            source: Arc::new(source),
            shared: Arc::new(Shared {
                lifecycle: Mutex::new(Lifecycle {
                    phase: Phase::Idle,
                    generation: 0,
                }),
                snapshot,
            }),
            listener: None,
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn phase(&self) -> Phase {
        self.shared.lifecycle().phase
    }

    pub fn snapshot(&self) -> Snapshot<S::Value> {
        self.shared.snapshot.borrow().clone()
    }

    pub fn value(&self) -> Option<S::Value> {
        self.shared.snapshot.borrow().value.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.shared.snapshot.borrow().is_loading
    }

    pub fn error(&self) -> Option<SyncError> {
        self.shared.snapshot.borrow().error.clone()
    }

    /// Receiver that wakes on every snapshot change
    pub fn watch(&self) -> watch::Receiver<Snapshot<S::Value>> {
        self.shared.snapshot.subscribe()
    }

    /// Subscribe to changes and perform the initial fetch.
    ///
    /// A change feed that cannot be established is recorded in the snapshot
    /// and logged; the fetched value is still served. Activating an already
    /// active cache is a no-op.
    pub async fn activate(&mut self) -> Result<()> {
        let generation = {
            let mut lifecycle = self.shared.lifecycle();
            match lifecycle.phase {
                Phase::Active => return Ok(()),
                Phase::Disposed => {
                    return Err(SyncError::Subscription(format!(
                        "{} was already disposed",
                        self.source.label()
                    )))
                }
                Phase::Idle => {}
            }
            lifecycle.phase = Phase::Active;
            lifecycle.generation
        };

        self.shared
            .snapshot
            .send_modify(|snapshot| snapshot.is_loading = true);

        let feed_error = match self.store.subscribe(self.source.channel()).await {
            Ok(subscription) => {
                self.listener = Some(self.spawn_listener(subscription, generation));
                None
            }
            Err(e) => {
                log::warn!(
                    "Live updates unavailable for {}: {}",
                    self.source.label(),
                    e
                );
                Some(e)
            }
        };

        let loaded = self.source.load(self.store.as_ref()).await;
        self.shared.apply(generation, loaded, true);

        if let Some(e) = feed_error {
            self.shared.snapshot.send_modify(|snapshot| {
                if snapshot.error.is_none() {
                    snapshot.error = Some(e);
                }
            });
        }
        Ok(())
    }

    /// Re-fetch now, outside of the change feed
    pub async fn refresh(&self) -> bool {
        let generation = self.shared.lifecycle().generation;
        if !self.shared.is_live(generation) {
            return false;
        }
        let loaded = self.source.load(self.store.as_ref()).await;
        self.shared.apply(generation, loaded, false)
    }

    /// Point the cache at a new lookup key.
    ///
    /// The old subscription is released first; results still in flight for
    /// the old key are discarded.
    pub async fn switch_source(&mut self, source: S) -> Result<()> {
        let was_active = {
            let mut lifecycle = self.shared.lifecycle();
            if lifecycle.phase == Phase::Disposed {
                return Err(SyncError::Subscription(format!(
                    "{} was already disposed",
                    self.source.label()
                )));
            }
            let was_active = lifecycle.phase == Phase::Active;
            lifecycle.generation += 1;
            lifecycle.phase = Phase::Idle;
            was_active
        };
        self.stop_listener().await;

        self.source = Arc::new(source);
        self.shared.snapshot.send_replace(Snapshot::default());

        if was_active {
            self.activate().await?;
        }
        Ok(())
    }

    /// Release the subscription and stop accepting results
    pub async fn dispose(&mut self) {
        {
            let mut lifecycle = self.shared.lifecycle();
            if lifecycle.phase == Phase::Disposed {
                return;
            }
            lifecycle.phase = Phase::Disposed;
            lifecycle.generation += 1;
        }
        self.stop_listener().await;
        log::debug!("Disposed cache for {}", self.source.label());
    }

    async fn stop_listener(&mut self) {
        if let Some(mut listener) = self.listener.take() {
            if let Some(stop) = listener.stop.take() {
                let _ = stop.send(());
            }
            if let Err(e) = listener.task.await {
                log::warn!("Listener for {} ended abnormally: {}", self.source.label(), e);
            }
        }
    }

    fn spawn_listener(&self, mut subscription: Subscription, generation: u64) -> Listener {
        let (stop_tx, mut stop_rx) = oneshot::channel::<()>();
        let store = Arc::clone(&self.store);
        let source = Arc::clone(&self.source);
        let shared = Arc::clone(&self.shared);

        let task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = &mut stop_rx => break,
                    change = subscription.next() => {
                        let Some(change) = change else {
                            log::warn!("Change feed for {} closed", source.label());
                            shared.feed_closed(
                                generation,
                                SyncError::Subscription(format!(
                                    "change feed for {} closed",
                                    source.label()
                                )),
                            );
                            break;
                        };
                        if !shared.is_live(generation) {
                            break;
                        }
                        log::debug!(
                            "{} {} on {}, refreshing {}",
                            change.kind.as_str(),
                            change.table,
                            subscription.channel().name,
                            source.label()
                        );

                        let store = Arc::clone(&store);
                        let source = Arc::clone(&source);
                        let shared = Arc::clone(&shared);
                        tokio::spawn(async move {
                            let loaded = source.load(store.as_ref()).await;
                            shared.apply(generation, loaded, false);
                        });
                    }
                }
            }
            store.unsubscribe(subscription).await;
        });

        Listener {
            stop: Some(stop_tx),
            task,
        }
    }
}

impl<S: ContentSource> Drop for ContentCache<S> {
    fn drop(&mut self) {
        {
            let mut lifecycle = self.shared.lifecycle();
            lifecycle.phase = Phase::Disposed;
            lifecycle.generation += 1;
        }
        // The listener task releases the subscription once it sees the stop signal
        if let Some(mut listener) = self.listener.take() {
            if let Some(stop) = listener.stop.take() {
                let _ = stop.send(());
            }
        }
    }
}
