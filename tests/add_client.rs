mod common;

use clientdesk::error::ClientDeskError;
use clientdesk::widgets::add_client::{AddClientForm, AddClientModal, CREATE_PATH, INVALID_FORM};
use httpmock::Method::POST;
use httpmock::MockServer;

fn form(api_key: &str) -> AddClientForm {
    AddClientForm {
        name: "Studio".to_string(),
        instagram_username: "studio.uno".to_string(),
        api_key: api_key.to_string(),
        active: true,
        ai_prompt: String::new(),
    }
}

#[tokio::test]
async fn seven_character_key_never_posts() {
    let server = MockServer::start_async().await;
    let create = server
        .mock_async(|when, then| {
            when.method(POST).path(CREATE_PATH);
            then.status(303).header("location", "/ui2/clients?ok=created");
        })
        .await;

    let sink = common::sink();
    let mut modal = AddClientModal::new(common::admin_api(&server), sink.clone());
    modal.open();
    assert!(matches!(
        modal.submit(&form("1234567")).await,
        Err(ClientDeskError::Validation(_))
    ));
    create.assert_calls(0);
    assert!(modal.is_open());
    assert_eq!(sink.alerts(), vec![INVALID_FORM.to_string()]);
}

#[tokio::test]
async fn valid_form_posts_fields_and_closes_on_ok_redirect() {
    let server = MockServer::start_async().await;
    let create = server
        .mock_async(|when, then| {
            when.method(POST)
                .path(CREATE_PATH)
                .header("authorization", common::ADMIN_AUTH)
                .body_includes("name=Studio")
                .body_includes("instagram_username=studio.uno")
                .body_includes("api_key=12345678")
                .body_includes("active=on");
            then.status(303).header("location", "/ui2/clients?ok=created");
        })
        .await;

    let sink = common::sink();
    let mut modal = AddClientModal::new(common::admin_api(&server), sink.clone());
    modal.open();
    let outcome = modal.submit(&form("12345678")).await.expect("submit");

    create.assert_calls(1);
    assert_eq!(outcome.status, 303);
    assert_eq!(outcome.redirect_param("ok").as_deref(), Some("created"));
    assert!(!modal.is_open());
    assert_eq!(modal.display(), "none");
    assert!(sink.alerts().is_empty());
}

#[tokio::test]
async fn error_redirect_keeps_dialog_open_with_alert() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path(CREATE_PATH);
            then.status(303)
                .header("location", "/ui2/clients?err=duplicate_username");
        })
        .await;

    let sink = common::sink();
    let mut modal = AddClientModal::new(common::admin_api(&server), sink.clone());
    modal.open();
    let err = modal.submit(&form("12345678")).await.unwrap_err();

    assert_eq!(err.detail(), Some("duplicate_username"));
    assert!(modal.is_open());
    assert_eq!(
        sink.alerts(),
        vec!["Client not created: duplicate_username".to_string()]
    );
}
