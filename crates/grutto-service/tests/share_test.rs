//! Integration tests for share grants, recipient search and share notices.

mod helpers;

use std::sync::atomic::Ordering;

use grutto_core::error::ErrorKind;
use grutto_entity::notification::NotificationType;
use grutto_service::file::{FileQuery, FileView};

use helpers::{PDF, TestApp};

#[tokio::test]
async fn test_duplicate_recipients_get_one_grant_and_one_notice() {
    let app = TestApp::new();
    let owner = app.user("ana").await;
    let friend = app.user("ben").await;
    let file = app.upload(&owner, "lab.pdf", PDF, 10).await;

    let first = app
        .services
        .shares
        .share_file(&owner, file.id, &[friend.user_id, friend.user_id, owner.user_id])
        .await
        .unwrap();
    assert_eq!(first.granted.len(), 1);
    assert_eq!(first.notified, 1);

    let second = app
        .services
        .shares
        .share_file(&owner, file.id, &[friend.user_id])
        .await
        .unwrap();
    assert!(second.granted.is_empty());
    assert_eq!(second.already_shared, [friend.user_id]);
    assert_eq!(second.notified, 0);

    assert_eq!(app.db.share_count(), 1);
    let inbox = app.services.notifications.list_notifications(&friend).await.unwrap();
    assert_eq!(inbox.len(), 1);
    assert_eq!(inbox[0].notification.kind, NotificationType::FileShared);
    assert_eq!(inbox[0].sender.as_ref().map(|s| s.id), Some(owner.user_id));
}

#[tokio::test]
async fn test_only_owner_can_share() {
    let app = TestApp::new();
    let owner = app.user("ana").await;
    let friend = app.user("ben").await;
    let third = app.user("cal").await;
    let file = app.upload(&owner, "lab.pdf", PDF, 10).await;
    app.services
        .shares
        .share_file(&owner, file.id, &[friend.user_id])
        .await
        .unwrap();

    let err = app
        .services
        .shares
        .share_file(&friend, file.id, &[third.user_id])
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Authorization);
    assert_eq!(app.db.share_count(), 1);
}

#[tokio::test]
async fn test_share_rejects_empty_and_unknown_recipients() {
    let app = TestApp::new();
    let owner = app.user("ana").await;
    let file = app.upload(&owner, "lab.pdf", PDF, 10).await;

    let err = app
        .services
        .shares
        .share_file(&owner, file.id, &[owner.user_id])
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);

    let err = app
        .services
        .shares
        .share_file(&owner, file.id, &[uuid::Uuid::new_v4()])
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);
    assert_eq!(app.db.share_count(), 0);
}

#[tokio::test]
async fn test_notification_failure_keeps_grant() {
    let app = TestApp::with_failing_notifications();
    let owner = app.user("ana").await;
    let friend = app.user("ben").await;
    let file = app.upload(&owner, "lab.pdf", PDF, 10).await;

    app.notify_fails.store(true, Ordering::SeqCst);
    let outcome = app
        .services
        .shares
        .share_file(&owner, file.id, &[friend.user_id])
        .await
        .unwrap();
    assert_eq!(outcome.granted.len(), 1);
    assert_eq!(outcome.notified, 0);

    let shared = app
        .services
        .query
        .list_files(&friend, &FileQuery::view(FileView::Shared))
        .await
        .unwrap();
    assert_eq!(shared.len(), 1);
    assert!(app.services.notifications.list_notifications(&friend).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_recipient_search_excludes_self_shared_and_selected() {
    let app = TestApp::new();
    let owner = app.user("bella").await;
    let bea = app.user("bea").await;
    let ben = app.user("Ben").await;
    let _bob = app.user("bob").await;
    let file = app.upload(&owner, "lab.pdf", PDF, 10).await;

    let too_short = app
        .services
        .shares
        .search_recipients(&owner, "b", None, &[])
        .await
        .unwrap();
    assert!(too_short.is_empty());

    let found = app
        .services
        .shares
        .search_recipients(&owner, "BE", None, &[])
        .await
        .unwrap();
    let ids: Vec<_> = found.iter().map(|p| p.id).collect();
    assert_eq!(ids.len(), 2);
    assert!(ids.contains(&bea.user_id) && ids.contains(&ben.user_id));

    let found = app
        .services
        .shares
        .search_recipients(&owner, "be", None, &[ben.user_id])
        .await
        .unwrap();
    assert_eq!(found.iter().map(|p| p.id).collect::<Vec<_>>(), [bea.user_id]);

    app.services
        .shares
        .share_file(&owner, file.id, &[bea.user_id])
        .await
        .unwrap();
    let found = app
        .services
        .shares
        .search_recipients(&owner, "be", Some(file.id), &[])
        .await
        .unwrap();
    assert_eq!(found.iter().map(|p| p.id).collect::<Vec<_>>(), [ben.user_id]);
}

#[tokio::test]
async fn test_recipient_search_is_capped() {
    let app = TestApp::new();
    let owner = app.user("owner").await;
    for i in 0..12 {
        app.user(&format!("student{i:02}")).await;
    }
    let found = app
        .services
        .shares
        .search_recipients(&owner, "stu", None, &[])
        .await
        .unwrap();
    assert_eq!(found.len(), app.config.sharing.user_search_limit as usize);
}

#[tokio::test]
async fn test_list_and_revoke_recipients() {
    let app = TestApp::new();
    let owner = app.user("ana").await;
    let friend = app.user("ben").await;
    let file = app.upload(&owner, "lab.pdf", PDF, 10).await;
    app.services
        .shares
        .share_file(&owner, file.id, &[friend.user_id])
        .await
        .unwrap();

    let recipients = app.services.shares.list_recipients(&owner, file.id).await.unwrap();
    assert_eq!(recipients.len(), 1);
    assert_eq!(
        recipients[0].recipient.as_ref().map(|p| p.username.as_str()),
        Some("ben")
    );
    let err = app
        .services
        .shares
        .list_recipients(&friend, file.id)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Authorization);

    app.services
        .shares
        .revoke(&owner, file.id, friend.user_id)
        .await
        .unwrap();
    let err = app.services.files.get_file(&friend, file.id).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Authorization);

    let err = app
        .services
        .shares
        .revoke(&owner, file.id, friend.user_id)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
}

#[tokio::test]
async fn test_trashed_file_cannot_be_shared() {
    let app = TestApp::new();
    let owner = app.user("ana").await;
    let friend = app.user("ben").await;
    let file = app.upload(&owner, "lab.pdf", PDF, 10).await;
    app.services.trash.trash(&owner, file.id).await.unwrap();

    let err = app
        .services
        .shares
        .share_file(&owner, file.id, &[friend.user_id])
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Conflict);
}
