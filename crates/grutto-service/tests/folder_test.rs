//! Integration tests for folders, the folder tree and breadcrumbs.

mod helpers;

use grutto_core::error::ErrorKind;
use grutto_entity::folder::{DEFAULT_FOLDER_COLOR, Folder};
use grutto_entity::notification::NotificationType;
use grutto_service::RequestContext;
use grutto_service::file::{FileQuery, FileView};
use grutto_service::folder::CreateFolderRequest;

use helpers::{PDF, TestApp};

async fn create(app: &TestApp, ctx: &RequestContext, name: &str, parent: Option<&Folder>) -> Folder {
    app.services
        .folders
        .create_folder(
            ctx,
            CreateFolderRequest {
                name: name.into(),
                color: None,
                parent_folder_id: parent.map(|p| p.id),
            },
        )
        .await
        .unwrap()
}

#[tokio::test]
async fn test_folders_are_private_to_their_owner() {
    let app = TestApp::new();
    let ana = app.user("ana").await;
    let ben = app.user("ben").await;
    let folder = create(&app, &ana, "Chemistry", None).await;
    assert_eq!(folder.color, DEFAULT_FOLDER_COLOR);

    let anas = app.services.query.list_folders(&ana, None).await.unwrap();
    assert_eq!(anas.len(), 1);
    assert!(anas.iter().all(|e| e.folder.owner_id == ana.user_id));
    assert!(app.services.query.list_folders(&ben, None).await.unwrap().is_empty());

    let err = app.services.folders.get_folder(&ben, folder.id).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Authorization);
    let err = app
        .services
        .folders
        .get_folder(&ben, uuid::Uuid::new_v4())
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
    assert_eq!(
        app.services.query.list_folders(&ben, Some(folder.id)).await.unwrap_err().kind,
        ErrorKind::Authorization
    );

    let err = app
        .services
        .folders
        .create_folder(
            &ben,
            CreateFolderRequest {
                name: "Sneaky".into(),
                color: None,
                parent_folder_id: Some(folder.id),
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Authorization);
}

#[tokio::test]
async fn test_create_validates_name_and_color() {
    let app = TestApp::new();
    let ana = app.user("ana").await;

    let blank = app
        .services
        .folders
        .create_folder(
            &ana,
            CreateFolderRequest {
                name: "   ".into(),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert_eq!(blank.kind, ErrorKind::Validation);

    let bad_color = app
        .services
        .folders
        .create_folder(
            &ana,
            CreateFolderRequest {
                name: "Art".into(),
                color: Some("purple".into()),
                parent_folder_id: None,
            },
        )
        .await
        .unwrap_err();
    assert_eq!(bad_color.kind, ErrorKind::Validation);

    let folder = create(&app, &ana, "  Art  ", None).await;
    assert_eq!(folder.name, "Art");
    let folder = app
        .services
        .folders
        .recolor_folder(&ana, folder.id, "#e86c6c")
        .await
        .unwrap();
    assert_eq!(folder.color, "#E86C6C");
    let folder = app
        .services
        .folders
        .rename_folder(&ana, folder.id, "Fine Art")
        .await
        .unwrap();
    assert_eq!(folder.name, "Fine Art");
}

#[tokio::test]
async fn test_move_rejects_cycles() {
    let app = TestApp::new();
    let ana = app.user("ana").await;
    let a = create(&app, &ana, "a", None).await;
    let b = create(&app, &ana, "b", Some(&a)).await;
    let c = create(&app, &ana, "c", Some(&b)).await;

    let err = app
        .services
        .folders
        .move_folder(&ana, a.id, Some(c.id))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);
    let err = app
        .services
        .folders
        .move_folder(&ana, a.id, Some(a.id))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);

    let moved = app.services.folders.move_folder(&ana, c.id, None).await.unwrap();
    assert!(moved.is_root());
    let moved = app
        .services
        .folders
        .move_folder(&ana, a.id, Some(c.id))
        .await
        .unwrap();
    assert_eq!(moved.parent_folder_id, Some(c.id));
}

#[tokio::test]
async fn test_delete_orphans_contents_to_root() {
    let app = TestApp::new();
    let ana = app.user("ana").await;
    let parent = create(&app, &ana, "Year 1", None).await;
    let doomed = create(&app, &ana, "Semester 2", Some(&parent)).await;
    let child = create(&app, &ana, "Exams", Some(&doomed)).await;
    let file = app
        .upload_into(&ana, "final.pdf", PDF, 10, Some(doomed.id))
        .await;

    app.services.folders.delete_folder(&ana, doomed.id).await.unwrap();

    let owned = app
        .services
        .query
        .list_files(&ana, &FileQuery::view(FileView::Owned))
        .await
        .unwrap();
    assert_eq!(owned.len(), 1);
    assert_eq!(owned[0].file.id, file.id);
    assert_eq!(owned[0].file.folder_id, None);

    let child = app.services.folders.get_folder(&ana, child.id).await.unwrap();
    assert_eq!(child.parent_folder_id, Some(parent.id));

    let inbox = app.services.notifications.list_notifications(&ana).await.unwrap();
    assert_eq!(inbox.len(), 1);
    assert_eq!(inbox[0].notification.kind, NotificationType::FolderDeleted);
    assert!(inbox[0].notification.message.contains("Semester 2"));
}

#[tokio::test]
async fn test_tree_counts_and_breadcrumbs() {
    let app = TestApp::new();
    let ana = app.user("ana").await;
    assert_eq!(app.services.tree.get_tree(&ana).await.unwrap().total_folders, 0);

    let maths = create(&app, &ana, "maths", None).await;
    let algebra = create(&app, &ana, "Algebra", Some(&maths)).await;
    let _art = create(&app, &ana, "art", None).await;
    app.upload_into(&ana, "rings.pdf", PDF, 10, Some(algebra.id)).await;
    let trashed = app
        .upload_into(&ana, "groups.pdf", PDF, 10, Some(algebra.id))
        .await;
    app.services.trash.trash(&ana, trashed.id).await.unwrap();

    let tree = app.services.tree.get_tree(&ana).await.unwrap();
    assert_eq!(tree.total_folders, 3);
    let roots: Vec<&str> = tree.roots.iter().map(|n| n.name.as_str()).collect();
    assert_eq!(roots, ["art", "maths"]);
    let node = tree.find(algebra.id).expect("algebra node");
    assert_eq!(node.depth, 1);
    assert_eq!(node.file_count, 1);

    let crumbs = app
        .services
        .tree
        .get_breadcrumbs(&ana, algebra.id)
        .await
        .unwrap();
    let names: Vec<&str> = crumbs.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, ["maths", "Algebra"]);

    let listed = app.services.query.list_folders(&ana, Some(maths.id)).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].file_count, 1);
}

#[tokio::test]
async fn test_opposite_concurrent_moves_cannot_form_a_cycle() {
    let app = TestApp::with_yielding_reads();
    let ana = app.user("ana").await;
    let a = create(&app, &ana, "Biology", None).await;
    let b = create(&app, &ana, "Botany", None).await;

    let (first, second) = tokio::join!(
        app.services.folders.move_folder(&ana, a.id, Some(b.id)),
        app.services.folders.move_folder(&ana, b.id, Some(a.id)),
    );
    let outcomes = [first.map(|_| ()), second.map(|_| ())];
    assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
    let err = outcomes.into_iter().find_map(Result::err).unwrap();
    assert_eq!(err.kind, ErrorKind::Validation);

    let a = app.services.folders.get_folder(&ana, a.id).await.unwrap();
    let b = app.services.folders.get_folder(&ana, b.id).await.unwrap();
    assert!(!(a.parent_folder_id == Some(b.id) && b.parent_folder_id == Some(a.id)));
    let roots = app.services.query.list_folders(&ana, None).await.unwrap();
    assert_eq!(roots.len(), 1);
}
