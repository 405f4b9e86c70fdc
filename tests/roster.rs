mod common;

use clientdesk::error::ClientDeskError;
use clientdesk::interfaces::ui::{Modal, Tone, UiEvent};
use clientdesk::widgets::roster::{NewClientForm, RosterManager};
use httpmock::Method::{DELETE, GET, POST};
use httpmock::MockServer;
use serde_json::json;

fn roster_body() -> serde_json::Value {
    json!([
        {"id": 1, "name": "Acme", "email": "ops@acme.io", "created_at": "2024-05-01T10:00:00"},
        {"id": 2, "name": "<b>Bold</b> & Co", "email": null, "created_at": null}
    ])
}

#[tokio::test]
async fn load_renders_escaped_table_and_filter_narrows_it() {
    let server = MockServer::start_async().await;
    let list = server
        .mock_async(|when, then| {
            when.method(GET).path("/admin/clients");
            then.status(200).json_body(roster_body());
        })
        .await;

    let sink = common::sink();
    let mut roster = RosterManager::new(common::api(&server), sink.clone());
    roster.load().await.expect("load");
    list.assert_calls(1);
    assert_eq!(roster.clients().len(), 2);

    let html = match sink.take().pop() {
        Some(UiEvent::TableRendered { html }) => html,
        other => panic!("expected table, got {other:?}"),
    };
    assert!(html.contains("&lt;b&gt;Bold&lt;/b&gt; &amp; Co"));
    assert!(!html.contains("<b>Bold"));

    roster.set_filter("ACME");
    assert_eq!(roster.visible().len(), 1);
    roster.set_filter("zzz");
    assert!(roster.visible().is_empty());
    assert_eq!(sink.take().last(), Some(&UiEvent::EmptyState));
}

#[tokio::test]
async fn load_accepts_backend_account_counts() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/admin/clients");
            then.status(200).json_body(json!([
                {"id": 1, "name": "Acme", "ig_accounts": 2, "public_spaces": 1}
            ]));
        })
        .await;

    let sink = common::sink();
    let mut roster = RosterManager::new(common::api(&server), sink.clone());
    roster.load().await.expect("load");

    assert_eq!(roster.clients()[0].ig_accounts, Some(2));
    assert_eq!(roster.clients()[0].public_spaces, Some(1));
    assert!(sink.toasts().is_empty());
    assert!(matches!(sink.events().last(), Some(UiEvent::TableRendered { .. })));
}

#[tokio::test]
async fn load_failure_keeps_snapshot_and_toasts() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/admin/clients");
            then.status(503);
        })
        .await;

    let sink = common::sink();
    let mut roster = RosterManager::new(common::api(&server), sink.clone());
    assert!(roster.load().await.is_err());
    assert!(roster.clients().is_empty());
    assert_eq!(
        sink.toasts(),
        vec![("Failed to load clients".to_string(), Tone::Err)]
    );
}

#[tokio::test]
async fn blank_name_never_reaches_the_backend() {
    let server = MockServer::start_async().await;
    let create = server
        .mock_async(|when, then| {
            when.method(POST).path("/admin/clients");
            then.status(200).json_body(json!({"id": 9, "name": "x"}));
        })
        .await;

    let sink = common::sink();
    let mut roster = RosterManager::new(common::api(&server), sink.clone());
    roster.open_new();
    let err = roster
        .submit_new(&NewClientForm::new("", "x"))
        .await
        .unwrap_err();

    assert!(matches!(err, ClientDeskError::Validation(_)));
    create.assert_calls(0);
    assert!(roster.is_new_open());
    assert_eq!(sink.toasts(), vec![("Name is required".to_string(), Tone::Err)]);
}

#[tokio::test]
async fn create_sends_null_email_then_closes_and_reloads() {
    let server = MockServer::start_async().await;
    let create = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/admin/clients")
                .body_includes("\"name\":\"Acme\"")
                .body_includes("\"email\":null");
            then.status(200).json_body(json!({
                "id": 3, "name": "Acme", "email": null, "created_at": "2024-06-01T08:00:00"
            }));
        })
        .await;
    let list = server
        .mock_async(|when, then| {
            when.method(GET).path("/admin/clients");
            then.status(200)
                .json_body(json!([{"id": 3, "name": "Acme", "email": null}]));
        })
        .await;

    let sink = common::sink();
    let mut roster = RosterManager::new(common::api(&server), sink.clone());
    roster.open_new();
    let created = roster
        .submit_new(&NewClientForm::new("Acme", ""))
        .await
        .expect("create");

    assert_eq!(created.id, 3);
    create.assert_calls(1);
    list.assert_calls(1);
    assert!(!roster.is_new_open());
    assert_eq!(roster.clients().len(), 1);
    assert!(sink
        .events()
        .contains(&UiEvent::ModalClosed(Modal::NewClient)));
    assert_eq!(sink.toasts(), vec![("Client created".to_string(), Tone::Ok)]);
}

#[tokio::test]
async fn create_failure_surfaces_backend_detail() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/admin/clients");
            then.status(400)
                .header("content-type", "application/json")
                .json_body(json!({"detail": "Il campo 'name' è obbligatorio"}));
        })
        .await;

    let sink = common::sink();
    let mut roster = RosterManager::new(common::api(&server), sink.clone());
    roster.open_new();
    assert!(roster.submit_new(&NewClientForm::new("Acme", "")).await.is_err());
    assert!(roster.is_new_open());
    assert_eq!(
        sink.toasts(),
        vec![("Il campo 'name' è obbligatorio".to_string(), Tone::Err)]
    );
}

#[tokio::test]
async fn failed_delete_clears_marker_without_touching_the_table() {
    let server = MockServer::start_async().await;
    let list = server
        .mock_async(|when, then| {
            when.method(GET).path("/admin/clients");
            then.status(200).json_body(roster_body());
        })
        .await;
    let delete = server
        .mock_async(|when, then| {
            when.method(DELETE).path("/admin/clients/2");
            then.status(404)
                .header("content-type", "application/json")
                .json_body(json!({"detail": "Client not found"}));
        })
        .await;

    let sink = common::sink();
    let mut roster = RosterManager::new(common::api(&server), sink.clone());
    roster.load().await.unwrap();
    let before = roster.clients().to_vec();

    roster.request_delete(2, "Bold");
    assert_eq!(roster.pending_delete().map(|p| p.id), Some(2));
    assert!(roster.confirm_delete().await.is_err());

    delete.assert_calls(1);
    list.assert_calls(1);
    assert!(roster.pending_delete().is_none());
    assert_eq!(roster.clients(), before.as_slice());
    assert!(sink
        .toasts()
        .contains(&("Client not found".to_string(), Tone::Err)));

    // marker is gone, so a second confirm is a no-op
    assert!(!roster.confirm_delete().await.unwrap());
    delete.assert_calls(1);
}

#[tokio::test]
async fn successful_delete_reloads_and_closes_dialog() {
    let server = MockServer::start_async().await;
    let list = server
        .mock_async(|when, then| {
            when.method(GET).path("/admin/clients");
            then.status(200).json_body(json!([]));
        })
        .await;
    let delete = server
        .mock_async(|when, then| {
            when.method(DELETE).path("/admin/clients/7");
            then.status(200).json_body(json!({"status": "deleted", "id": 7}));
        })
        .await;

    let sink = common::sink();
    let mut roster = RosterManager::new(common::api(&server), sink.clone());
    roster.request_delete(7, "Gone Ltd");
    assert!(roster.is_delete_open());
    assert!(roster.confirm_delete().await.unwrap());

    delete.assert_calls(1);
    list.assert_calls(1);
    assert!(!roster.is_delete_open());
    assert!(roster.pending_delete().is_none());
    assert_eq!(sink.toasts(), vec![("Client deleted".to_string(), Tone::Ok)]);
    assert_eq!(sink.events().last(), Some(&UiEvent::EmptyState));
}

#[tokio::test]
async fn admin_session_header_is_attached_when_present() {
    let server = MockServer::start_async().await;
    let list = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/admin/clients")
                .header("authorization", common::ADMIN_AUTH);
            then.status(200).json_body(json!([]));
        })
        .await;

    let mut roster = RosterManager::new(common::admin_api(&server), common::sink());
    roster.load().await.unwrap();
    list.assert_calls(1);
}

#[tokio::test]
async fn cancelled_delete_sends_nothing() {
    let server = MockServer::start_async().await;
    let delete = server
        .mock_async(|when, then| {
            when.method(DELETE).path("/admin/clients/4");
            then.status(200).json_body(json!({"status": "deleted", "id": 4}));
        })
        .await;

    let sink = common::sink();
    let mut roster = RosterManager::new(common::api(&server), sink.clone());
    roster.request_delete(4, "Keep Me");
    roster.cancel_delete();

    assert!(roster.pending_delete().is_none());
    assert!(!roster.is_delete_open());
    assert_eq!(
        sink.events().last(),
        Some(&UiEvent::ModalClosed(Modal::DeleteClient))
    );
    assert!(!roster.confirm_delete().await.unwrap());
    delete.assert_calls(0);
}
