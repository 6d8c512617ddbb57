//! Tests for menu administration against the in-memory store
//!
//! Covers:
//! - Form validation and confirmation gates (nothing reaches the store)
//! - Order numbers for new links
//! - Active flag toggling
//! - Single-step reordering, including partial failures

use serde_json::json;
use shotaku::admin::{Direction, MenuAdmin, Notice, NoticeLevel, NoticeLog};
use shotaku::error::SyncError;
use shotaku::models::{LinkForm, MENU_LINKS_TABLE};
use shotaku::store::{MemoryStore, StoreCall};
use std::sync::Arc;

fn seeded(orders: &[(&str, i64)]) -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    store.seed(
        MENU_LINKS_TABLE,
        orders
            .iter()
            .map(|(id, order)| {
                json!({
                    "id": id,
                    "title": format!("Link {}", id),
                    "url": format!("/{}", id),
                    "order_number": order,
                    "is_active": true,
                })
            })
            .collect(),
    );
    store
}

async fn admin_for(store: &Arc<MemoryStore>) -> (MenuAdmin, NoticeLog) {
    let notices = NoticeLog::new();
    let mut admin = MenuAdmin::with_notifier(store.clone(), Box::new(notices.clone()));
    admin.refresh().await.unwrap();
    store.clear_calls();
    (admin, notices)
}

fn stored_order(store: &MemoryStore, id: &str) -> i64 {
    store
        .rows(MENU_LINKS_TABLE)
        .iter()
        .find(|r| r["id"] == id)
        .and_then(|r| r["order_number"].as_i64())
        .unwrap()
}

fn local_orders(admin: &MenuAdmin) -> Vec<(String, i64)> {
    admin
        .links()
        .iter()
        .map(|l| (l.id.clone(), l.order_number))
        .collect()
}

// ============================================================================
// Create / Update / Delete
// ============================================================================

mod mutation_tests {
    use super::*;

    #[tokio::test]
    async fn test_create_with_blank_title_sends_nothing() {
        let store = seeded(&[]);
        let (mut admin, notices) = admin_for(&store).await;

        let result = admin.create(&LinkForm::new("  ", "/programme")).await;

        assert!(matches!(result, Err(SyncError::Validation(_))));
        assert!(store.calls().is_empty());
        assert_eq!(notices.last(), Some(Notice::error("Title and URL are required")));
    }

    #[tokio::test]
    async fn test_first_link_gets_order_one() {
        let store = seeded(&[]);
        let (mut admin, notices) = admin_for(&store).await;

        admin
            .create(&LinkForm::new("Programme", "/programme"))
            .await
            .unwrap();

        assert_eq!(admin.links().len(), 1);
        assert_eq!(admin.links()[0].order_number, 1);
        assert!(notices
            .notices()
            .contains(&Notice::success("Link added successfully")));
    }

    #[tokio::test]
    async fn test_new_link_goes_after_highest_order() {
        let store = seeded(&[("a", 3), ("b", 7)]);
        let (mut admin, _) = admin_for(&store).await;

        admin
            .create(&LinkForm::new("Invités", "/guests").active(false))
            .await
            .unwrap();

        let created = admin.links().last().unwrap();
        assert_eq!(created.title, "Invités");
        assert_eq!(created.order_number, 8);
        assert!(!created.is_active);
        // Insert, then the re-fetch
        assert_eq!(
            store.calls(),
            vec![
                StoreCall::Insert {
                    table: MENU_LINKS_TABLE.into()
                },
                StoreCall::Read {
                    table: MENU_LINKS_TABLE.into()
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_update_leaves_order_untouched() {
        let store = seeded(&[("a", 1), ("b", 2)]);
        let (mut admin, _) = admin_for(&store).await;

        admin
            .update("b", &LinkForm::new("Billets", "/tickets"))
            .await
            .unwrap();

        let link = admin.link("b").unwrap();
        assert_eq!(link.title, "Billets");
        assert_eq!(link.url, "/tickets");
        assert_eq!(stored_order(&store, "b"), 2);
    }

    #[tokio::test]
    async fn test_update_failure_is_reported() {
        let store = seeded(&[("a", 1)]);
        let (mut admin, notices) = admin_for(&store).await;
        store.fail_writes_after(0);

        let result = admin.update("a", &LinkForm::new("X", "/x")).await;

        assert!(matches!(result, Err(SyncError::Mutation(_))));
        assert_eq!(notices.last(), Some(Notice::error("Failed to save header link")));
        assert_eq!(admin.link("a").unwrap().title, "Link a");
    }

    #[tokio::test]
    async fn test_declined_delete_sends_nothing() {
        let store = seeded(&[("a", 1)]);
        let (mut admin, notices) = admin_for(&store).await;

        let mut asked = None;
        let deleted = admin
            .delete("a", |message| {
                asked = Some(message.to_string());
                false
            })
            .await
            .unwrap();

        assert!(!deleted);
        assert_eq!(
            asked.as_deref(),
            Some("Are you sure you want to delete this link?")
        );
        assert!(store.calls().is_empty());
        assert!(notices.notices().is_empty());
        assert_eq!(admin.links().len(), 1);
    }

    #[tokio::test]
    async fn test_confirmed_delete_removes_link() {
        let store = seeded(&[("a", 1), ("b", 2)]);
        let (mut admin, notices) = admin_for(&store).await;

        assert!(admin.delete("a", |_| true).await.unwrap());

        assert_eq!(store.rows(MENU_LINKS_TABLE).len(), 1);
        assert!(admin.link("a").is_none());
        assert_eq!(notices.last(), Some(Notice::success("Link deleted successfully")));
    }
}

// ============================================================================
// Toggle
// ============================================================================

mod toggle_tests {
    use super::*;

    #[tokio::test]
    async fn test_toggle_twice_restores_flag() {
        let store = seeded(&[("a", 1)]);
        let (mut admin, notices) = admin_for(&store).await;

        assert!(!admin.toggle_active("a").await.unwrap());
        assert_eq!(store.rows(MENU_LINKS_TABLE)[0]["is_active"], false);
        assert!(!admin.link("a").unwrap().is_active);

        assert!(admin.toggle_active("a").await.unwrap());
        assert_eq!(store.rows(MENU_LINKS_TABLE)[0]["is_active"], true);

        let messages: Vec<_> = notices.notices().into_iter().map(|n| n.message).collect();
        assert_eq!(messages, vec!["Link deactivated", "Link activated"]);
        // Patched locally, no re-fetch
        assert_eq!(store.read_count(), 0);
        assert_eq!(store.write_count(), 2);
    }

    #[tokio::test]
    async fn test_failed_toggle_keeps_local_flag() {
        let store = seeded(&[("a", 1)]);
        let (mut admin, notices) = admin_for(&store).await;
        store.fail_writes_after(0);

        assert!(admin.toggle_active("a").await.is_err());
        assert!(admin.link("a").unwrap().is_active);
        assert_eq!(
            notices.last().map(|n| n.level),
            Some(NoticeLevel::Error)
        );
    }
}

// ============================================================================
// Reorder
// ============================================================================

mod reorder_tests {
    use super::*;

    #[tokio::test]
    async fn test_move_up_exchanges_orders() {
        let store = seeded(&[("1", 1), ("2", 2), ("3", 3)]);
        let (mut admin, notices) = admin_for(&store).await;

        admin.move_link("2", Direction::Up).await.unwrap();

        assert_eq!(
            local_orders(&admin),
            vec![("2".into(), 1), ("1".into(), 2), ("3".into(), 3)]
        );
        assert_eq!(stored_order(&store, "1"), 2);
        assert_eq!(stored_order(&store, "2"), 1);
        assert_eq!(stored_order(&store, "3"), 3);
        assert_eq!(
            store.calls(),
            vec![
                StoreCall::Update {
                    table: MENU_LINKS_TABLE.into(),
                    id: "1".into()
                },
                StoreCall::Update {
                    table: MENU_LINKS_TABLE.into(),
                    id: "2".into()
                },
            ]
        );
        assert_eq!(notices.last(), Some(Notice::success("Menu order updated")));
    }

    #[tokio::test]
    async fn test_move_down_then_up_restores_orders() {
        let store = seeded(&[("1", 10), ("2", 20), ("3", 30)]);
        let (mut admin, _notices) = admin_for(&store).await;

        admin.move_link("2", Direction::Down).await.unwrap();
        assert_eq!(stored_order(&store, "2"), 30);
        assert_eq!(stored_order(&store, "3"), 20);

        admin.move_link("2", Direction::Up).await.unwrap();

        let expected: Vec<(String, i64)> =
            vec![("1".into(), 10), ("2".into(), 20), ("3".into(), 30)];
        assert_eq!(local_orders(&admin), expected);
        for (id, order) in &expected {
            assert_eq!(stored_order(&store, id), *order);
        }
        assert_eq!(store.write_count(), 4);
    }

    #[tokio::test]
    async fn test_move_at_boundary_is_silent() {
        let store = seeded(&[("1", 1), ("2", 2)]);
        let (mut admin, notices) = admin_for(&store).await;

        admin.move_link("1", Direction::Up).await.unwrap();
        admin.move_link("2", Direction::Down).await.unwrap();
        admin.move_link("ghost", Direction::Down).await.unwrap();

        assert!(store.calls().is_empty());
        assert!(notices.notices().is_empty());
    }

    #[tokio::test]
    async fn test_first_write_failure_changes_nothing() {
        let store = seeded(&[("1", 1), ("2", 2)]);
        let (mut admin, notices) = admin_for(&store).await;
        store.fail_writes_after(0);

        let result = admin.move_link("2", Direction::Up).await;

        assert!(matches!(result, Err(SyncError::Mutation(_))));
        assert_eq!(stored_order(&store, "1"), 1);
        assert_eq!(stored_order(&store, "2"), 2);
        assert_eq!(
            local_orders(&admin),
            vec![("1".into(), 1), ("2".into(), 2)]
        );
        assert_eq!(
            notices.last(),
            Some(Notice::error("Failed to reorder menu links"))
        );
    }

    #[tokio::test]
    async fn test_partial_reorder_refetches_store_state() {
        let store = seeded(&[("1", 1), ("2", 2), ("3", 3)]);
        let (mut admin, _) = admin_for(&store).await;
        store.fail_writes_after(1);

        let result = admin.move_link("2", Direction::Up).await;

        assert!(matches!(result, Err(SyncError::PartialReorder(_))));
        // The first write landed: "1" moved to 2, "2" is still 2
        assert_eq!(stored_order(&store, "1"), 2);
        assert_eq!(stored_order(&store, "2"), 2);
        for link in admin.links() {
            assert_eq!(link.order_number, stored_order(&store, &link.id));
        }
        assert!(matches!(
            store.calls().last(),
            Some(StoreCall::Read { .. })
        ));
    }
}
