#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use clientdesk::api::ApiClient;
use clientdesk::auth::AdminSession;
use clientdesk::interfaces::ui::{RecordingSink, UiEvent};

/// `Basic base64("admin:hunter22")`
pub const ADMIN_AUTH: &str = "Basic YWRtaW46aHVudGVyMjI=";

pub fn api(server: &httpmock::MockServer) -> ApiClient {
    ApiClient::new(&server.base_url(), Duration::from_secs(5)).expect("api client")
}

pub fn admin_api(server: &httpmock::MockServer) -> ApiClient {
    let session = AdminSession::basic("admin", "hunter22").expect("admin session");
    api(server).with_session(session)
}

pub fn sink() -> Arc<RecordingSink> {
    RecordingSink::new()
}

pub fn transcript(sink: &RecordingSink) -> Vec<String> {
    sink.events()
        .into_iter()
        .filter_map(|event| match event {
            UiEvent::TranscriptAppended { line } => Some(line),
            _ => None,
        })
        .collect()
}

pub fn replaced_lists(sink: &RecordingSink) -> Vec<String> {
    sink.events()
        .into_iter()
        .filter_map(|event| match event {
            UiEvent::ListReplaced { html } => Some(html),
            _ => None,
        })
        .collect()
}
