//! Tests for live content caches against the in-memory store
//!
//! Covers:
//! - Initial load, then re-fetch on matching change notifications
//! - Row filters on the change feed
//! - Stale values kept across failed re-fetches
//! - Subscription release on dispose
//! - Admin writes reaching a live navigation cache

use serde_json::json;
use shotaku::admin::MenuAdmin;
use shotaku::error::SyncError;
use shotaku::models::{LinkForm, GENERAL_CONTENT_TABLE, MENU_LINKS_TABLE, PAGE_CONTENT_TABLE};
use shotaku::store::{ContentStore, MemoryStore};
use shotaku::sync::{self, ContentCache, ContentSource, Phase, Snapshot};
use std::sync::Arc;
use std::time::Duration;

async fn wait_for<S, F>(cache: &ContentCache<S>, done: F)
where
    S: ContentSource,
    F: Fn(&Snapshot<S::Value>) -> bool,
{
    let mut updates = cache.watch();
    tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            if done(&updates.borrow_and_update()) {
                return;
            }
            updates.changed().await.unwrap();
        }
    })
    .await
    .expect("cache did not reach the expected state");
}

fn page_row(id: &str, page_id: &str, title: &str) -> serde_json::Value {
    json!({
        "id": id,
        "page_id": page_id,
        "content": {
            "header": {"title": title, "subtitle": "Casablanca"},
            "sections": [],
            "footer": {"text": "SHOTAKU"}
        }
    })
}

// ============================================================================
// Page Content
// ============================================================================

mod page_cache_tests {
    use super::*;

    #[tokio::test]
    async fn test_page_follows_updates() {
        let store = Arc::new(MemoryStore::new());
        store.seed(PAGE_CONTENT_TABLE, vec![page_row("p1", "home", "Édition 2024")]);

        let mut cache = sync::page_content(store.clone(), "home");
        cache.activate().await.unwrap();
        assert_eq!(cache.phase(), Phase::Active);
        assert_eq!(cache.value().unwrap().header.title, "Édition 2024");
        assert!(!cache.is_loading());

        store
            .update(
                PAGE_CONTENT_TABLE,
                "p1",
                json!({"content": page_row("p1", "home", "Édition 2025")["content"].clone()}),
            )
            .await
            .unwrap();

        wait_for(&cache, |s| {
            s.value.as_ref().map(|p| p.header.title.as_str()) == Some("Édition 2025")
        })
        .await;
        cache.dispose().await;
    }

    #[tokio::test]
    async fn test_other_pages_do_not_trigger_refetch() {
        let store = Arc::new(MemoryStore::new());
        store.seed(
            PAGE_CONTENT_TABLE,
            vec![
                page_row("p1", "home", "Accueil"),
                page_row("p2", "about", "À propos"),
            ],
        );

        let mut cache = sync::page_content(store.clone(), "home");
        cache.activate().await.unwrap();
        let reads = store.read_count();

        store
            .update(PAGE_CONTENT_TABLE, "p2", json!({"content": "{}"}))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert_eq!(store.read_count(), reads);
        cache.dispose().await;
    }

    #[tokio::test]
    async fn test_missing_page_serves_default() {
        let store = Arc::new(MemoryStore::new());
        let mut cache = sync::page_content(store.clone(), "stands");
        cache.activate().await.unwrap();

        let page = cache.value().unwrap();
        assert_eq!(page.header.title, "Festival Marocain d'Anime & Manga");
        assert!(cache.error().is_none());
        cache.dispose().await;
    }
}

// ============================================================================
// General Content
// ============================================================================

mod general_cache_tests {
    use super::*;

    #[tokio::test]
    async fn test_inserted_section_appears() {
        let store = Arc::new(MemoryStore::new());
        let mut cache = sync::general_content(store.clone(), "hero");
        cache.activate().await.unwrap();
        assert!(cache.value().is_none());
        assert!(cache.error().is_none());

        store
            .insert(
                GENERAL_CONTENT_TABLE,
                json!({"section_key": "hero", "title": "Bienvenue"}),
            )
            .await
            .unwrap();

        wait_for(&cache, |s| {
            s.value.as_ref().and_then(|c| c.title.as_deref()) == Some("Bienvenue")
        })
        .await;
        cache.dispose().await;
    }

    #[tokio::test]
    async fn test_failed_refetch_keeps_stale_value() {
        let store = Arc::new(MemoryStore::new());
        store.seed(
            GENERAL_CONTENT_TABLE,
            vec![json!({"id": "g1", "section_key": "hero", "title": "Avant"})],
        );
        let mut cache = sync::general_content(store.clone(), "hero");
        cache.activate().await.unwrap();

        store.fail_reads(true);
        store
            .update(GENERAL_CONTENT_TABLE, "g1", json!({"title": "Après"}))
            .await
            .unwrap();

        wait_for(&cache, |s| s.error.is_some()).await;
        let snapshot = cache.snapshot();
        assert!(matches!(snapshot.error, Some(SyncError::Query(_))));
        assert_eq!(
            snapshot.value.and_then(|c| c.title),
            Some("Avant".to_string())
        );

        store.clear_failures();
        store
            .update(GENERAL_CONTENT_TABLE, "g1", json!({"title": "Encore"}))
            .await
            .unwrap();
        wait_for(&cache, |s| s.error.is_none()).await;
        assert_eq!(
            cache.value().and_then(|c| c.title),
            Some("Encore".to_string())
        );
        cache.dispose().await;
    }
}

// ============================================================================
// Lifecycle
// ============================================================================

mod lifecycle_tests {
    use super::*;

    #[tokio::test]
    async fn test_dispose_stops_refetching() {
        let store = Arc::new(MemoryStore::new());
        let mut cache = sync::general_content(store.clone(), "hero");
        cache.activate().await.unwrap();
        assert_eq!(store.subscriber_count(), 1);

        cache.dispose().await;
        assert_eq!(cache.phase(), Phase::Disposed);
        assert_eq!(store.subscriber_count(), 0);

        let reads = store.read_count();
        store
            .insert(GENERAL_CONTENT_TABLE, json!({"section_key": "hero"}))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(store.read_count(), reads);

        // Second dispose is a no-op, and a disposed cache cannot come back
        cache.dispose().await;
        assert!(cache.activate().await.is_err());
    }

    #[tokio::test]
    async fn test_admin_writes_reach_live_navigation() {
        let store = Arc::new(MemoryStore::new());
        store.seed(
            MENU_LINKS_TABLE,
            vec![json!({"id": "a", "title": "Programme", "url": "/programme", "order_number": 1, "is_active": true})],
        );

        let mut nav = sync::nav_links(store.clone());
        nav.activate().await.unwrap();
        assert_eq!(nav.value().unwrap().len(), 1);

        let mut admin = MenuAdmin::new(store.clone());
        admin.refresh().await.unwrap();
        admin
            .create(&LinkForm::new("Invités", "/guests"))
            .await
            .unwrap();

        wait_for(&nav, |s| s.value.as_ref().map(Vec::len) == Some(2)).await;
        let titles: Vec<String> = nav.value().unwrap().into_iter().map(|l| l.title).collect();
        assert_eq!(titles, vec!["Programme", "Invités"]);

        let id = admin.links()[0].id.clone();
        admin.toggle_active(&id).await.unwrap();
        wait_for(&nav, |s| s.value.as_ref().map(Vec::len) == Some(1)).await;

        nav.dispose().await;
    }
}
