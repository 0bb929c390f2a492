//! Integration tests for the notification panel and retention.

mod helpers;

use chrono::{Duration, Utc};

use grutto_core::error::ErrorKind;
use grutto_database::traits::NotificationStore;
use grutto_entity::notification::CreateNotification;

use helpers::{PDF, TestApp};

#[tokio::test]
async fn test_listing_sweeps_expired_for_that_recipient_only() {
    let app = TestApp::new();
    let ana = app.user("ana").await;
    let ben = app.user("ben").await;

    let stale_ana = app
        .db
        .create(&CreateNotification::folder_deleted(ana.user_id, "Old"))
        .await
        .unwrap();
    let fresh_ana = app
        .db
        .create(&CreateNotification::folder_deleted(ana.user_id, "New"))
        .await
        .unwrap();
    let stale_ben = app
        .db
        .create(&CreateNotification::folder_deleted(ben.user_id, "Old"))
        .await
        .unwrap();
    let long_ago = Utc::now() - Duration::days(31);
    app.db.set_notification_created_at(stale_ana.id, long_ago);
    app.db.set_notification_created_at(stale_ben.id, long_ago);

    let listed = app.services.notifications.list_notifications(&ana).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].notification.id, fresh_ana.id);
    assert!(NotificationStore::find_by_id(app.db.as_ref(), stale_ana.id).await.unwrap().is_none());
    assert!(NotificationStore::find_by_id(app.db.as_ref(), stale_ben.id).await.unwrap().is_some());

    let removed = app.services.notifications.sweep_expired(Utc::now()).await.unwrap();
    assert_eq!(removed, 1);
    assert!(NotificationStore::find_by_id(app.db.as_ref(), stale_ben.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_notifications_newest_first_with_names() {
    let app = TestApp::new();
    let ana = app.user("ana").await;
    let ben = app.user("ben").await;
    let first = app.upload(&ben, "first.pdf", PDF, 1).await;
    let second = app.upload(&ben, "second.pdf", PDF, 1).await;
    for file in [&first, &second] {
        app.services
            .shares
            .share_file(&ben, file.id, &[ana.user_id])
            .await
            .unwrap();
    }

    let listed = app.services.notifications.list_notifications(&ana).await.unwrap();
    let names: Vec<_> = listed.iter().map(|e| e.filename.as_deref()).collect();
    assert_eq!(names, [Some("second.pdf"), Some("first.pdf")]);
    assert!(
        listed
            .iter()
            .all(|e| e.sender.as_ref().map(|s| s.username.as_str()) == Some("ben"))
    );
}

#[tokio::test]
async fn test_read_state_and_delete() {
    let app = TestApp::new();
    let ana = app.user("ana").await;
    let ben = app.user("ben").await;
    for name in ["a.pdf", "b.pdf", "c.pdf"] {
        let file = app.upload(&ben, name, PDF, 1).await;
        app.services
            .shares
            .share_file(&ben, file.id, &[ana.user_id])
            .await
            .unwrap();
    }
    let service = &app.services.notifications;
    assert_eq!(service.unread_count(&ana).await.unwrap(), 3);

    let listed = service.list_notifications(&ana).await.unwrap();
    let first = listed[0].notification.id;
    service.mark_read(&ana, first).await.unwrap();
    assert_eq!(service.unread_count(&ana).await.unwrap(), 2);

    let err = service.mark_read(&ben, first).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
    let err = service.delete(&ben, first).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);

    assert_eq!(service.mark_all_read(&ana).await.unwrap(), 2);
    assert_eq!(service.unread_count(&ana).await.unwrap(), 0);

    service.delete(&ana, first).await.unwrap();
    assert_eq!(service.list_notifications(&ana).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_unread_count_skips_expired_notices() {
    let app = TestApp::new();
    let ana = app.user("ana").await;

    let stale = app
        .db
        .create(&CreateNotification::folder_deleted(ana.user_id, "Old"))
        .await
        .unwrap();
    app.db
        .create(&CreateNotification::folder_deleted(ana.user_id, "New"))
        .await
        .unwrap();
    app.db
        .set_notification_created_at(stale.id, Utc::now() - Duration::days(40));

    assert_eq!(app.services.notifications.unread_count(&ana).await.unwrap(), 1);
    let listed = app.services.notifications.list_notifications(&ana).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(app.services.notifications.unread_count(&ana).await.unwrap(), 1);
}
