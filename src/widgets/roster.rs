//! Client roster manager: filterable table, create dialog, two-step delete.

use reqwest::Method;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::{debug, warn};

use crate::api::ApiClient;
use crate::error::{ClientDeskError, Result};
use crate::html::{escape_html, format_timestamp};
use crate::interfaces::ui::{Modal, SharedSink, Tone, UiEvent};

pub const CLIENTS_PATH: &str = "/admin/clients";

const LOAD_FAILED: &str = "Failed to load clients";
const CREATE_FAILED: &str = "Failed to create client";
const DELETE_FAILED: &str = "Failed to delete client";
const NAME_REQUIRED: &str = "Name is required";

fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ClientRecord {
    pub id: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    /// Linked Instagram accounts, as counted by the backend.
    #[serde(default)]
    pub ig_accounts: Option<u64>,
    #[serde(default)]
    pub public_spaces: Option<u64>,
}

impl ClientRecord {
    fn matches(&self, needle: &str) -> bool {
        self.id.to_string().contains(needle)
            || self.name.to_lowercase().contains(needle)
            || self
                .email
                .as_deref()
                .map(|email| email.to_lowercase().contains(needle))
                .unwrap_or(false)
    }
}

/// Case-insensitive substring match on id, name and email. Blank queries match everything.
pub fn filter_clients<'a>(clients: &'a [ClientRecord], query: &str) -> Vec<&'a ClientRecord> {
    let needle = query.trim().to_lowercase();
    clients
        .iter()
        .filter(|client| needle.is_empty() || client.matches(&needle))
        .collect()
}

pub fn render_rows(clients: &[&ClientRecord]) -> String {
    let mut html = String::new();
    for client in clients {
        let id = client.id;
        let name = escape_html(&client.name);
        let email = escape_html(client.email.as_deref().unwrap_or(""));
        let created = escape_html(&format_timestamp(client.created_at.as_deref()));
        html.push_str(&format!(
            "<tr>\
<td>{id}</td>\
<td>{name}</td>\
<td>{email}</td>\
<td>{created}</td>\
<td style=\"text-align:right;\"><div class=\"btn-group\">\
<a class=\"btn small\" href=\"/ui2/client/{id}\">Manage</a>\
<a class=\"btn small\" href=\"/ui2/prompts/{id}\">Prompt</a>\
<button class=\"btn small danger\" data-del=\"{id}\" data-name=\"{name}\">Delete</button>\
</div></td>\
</tr>\n"
        ));
    }
    html
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewClientForm {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewClientPayload {
    pub name: String,
    pub email: Option<String>,
}

impl NewClientForm {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }

    /// Trims both fields; blank email becomes `None`, blank name is rejected.
    pub fn to_payload(&self) -> Result<NewClientPayload> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(ClientDeskError::Validation(NAME_REQUIRED.to_string()));
        }
        let email = Some(self.email.trim())
            .filter(|email| !email.is_empty())
            .map(str::to_string);
        Ok(NewClientPayload {
            name: name.to_string(),
            email,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingDelete {
    pub id: i64,
    pub name: String,
}

pub struct RosterManager {
    api: ApiClient,
    sink: SharedSink,
    clients: Vec<ClientRecord>,
    filter: String,
    pending_delete: Option<PendingDelete>,
    new_open: bool,
    delete_open: bool,
}

impl RosterManager {
    pub fn new(api: ApiClient, sink: SharedSink) -> Self {
        Self {
            api,
            sink,
            clients: Vec::new(),
            filter: String::new(),
            pending_delete: None,
            new_open: false,
            delete_open: false,
        }
    }

    pub fn clients(&self) -> &[ClientRecord] {
        &self.clients
    }

    pub fn filter(&self) -> &str {
        &self.filter
    }

    pub fn pending_delete(&self) -> Option<&PendingDelete> {
        self.pending_delete.as_ref()
    }

    pub fn is_new_open(&self) -> bool {
        self.new_open
    }

    pub fn is_delete_open(&self) -> bool {
        self.delete_open
    }

    pub fn visible(&self) -> Vec<&ClientRecord> {
        filter_clients(&self.clients, &self.filter)
    }

    pub fn render(&self) {
        let visible = self.visible();
        if visible.is_empty() {
            self.sink.emit(UiEvent::EmptyState);
        } else {
            self.sink.emit(UiEvent::TableRendered {
                html: render_rows(&visible),
            });
        }
    }

    pub fn set_filter(&mut self, query: &str) {
        self.filter = query.to_string();
        self.render();
    }

    fn toast(&self, message: impl Into<String>, tone: Tone) {
        self.sink.emit(UiEvent::Toast {
            message: message.into(),
            tone,
        });
    }

    /// Full re-fetch. On failure the previous snapshot stays in place.
    pub async fn load(&mut self) -> Result<()> {
        match self.api.get_json::<Vec<ClientRecord>>(CLIENTS_PATH).await {
            Ok(clients) => {
                debug!(count = clients.len(), "client roster loaded");
                self.clients = clients;
                self.render();
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "client roster load failed");
                self.toast(LOAD_FAILED, Tone::Err);
                Err(err)
            }
        }
    }

    pub fn open_new(&mut self) {
        for field in ["name", "email"] {
            self.sink.emit(UiEvent::FieldValue {
                field: field.to_string(),
                value: String::new(),
            });
        }
        self.new_open = true;
        self.sink.emit(UiEvent::ModalOpened {
            modal: Modal::NewClient,
            title: None,
        });
    }

    pub fn close_new(&mut self) {
        self.new_open = false;
        self.sink.emit(UiEvent::ModalClosed(Modal::NewClient));
    }

    pub async fn submit_new(&mut self, form: &NewClientForm) -> Result<ClientRecord> {
        let payload = match form.to_payload() {
            Ok(payload) => payload,
            Err(err) => {
                self.toast(err.user_message(NAME_REQUIRED), Tone::Err);
                return Err(err);
            }
        };

        let created: ClientRecord = match self
            .api
            .send_json(Method::POST, CLIENTS_PATH, &payload)
            .await
        {
            Ok(created) => created,
            Err(err) => {
                self.toast(err.user_message(CREATE_FAILED), Tone::Err);
                return Err(err);
            }
        };

        self.close_new();
        self.toast("Client created", Tone::Ok);
        if let Err(err) = self.load().await {
            debug!(error = %err, "roster refresh after create failed");
        }
        Ok(created)
    }

    pub fn request_delete(&mut self, id: i64, name: &str) {
        self.pending_delete = Some(PendingDelete {
            id,
            name: name.to_string(),
        });
        self.delete_open = true;
        self.sink.emit(UiEvent::ModalOpened {
            modal: Modal::DeleteClient,
            title: Some(name.to_string()),
        });
    }

    pub fn cancel_delete(&mut self) {
        self.pending_delete = None;
        self.delete_open = false;
        self.sink.emit(UiEvent::ModalClosed(Modal::DeleteClient));
    }

    /// Returns `Ok(false)` when no delete is pending. The marker is cleared whatever the outcome.
    pub async fn confirm_delete(&mut self) -> Result<bool> {
        let Some(target) = self.pending_delete.clone() else {
            return Ok(false);
        };

        let result = self
            .api
            .delete(&format!("{CLIENTS_PATH}/{}", target.id))
            .await;
        self.pending_delete = None;

        match result {
            Ok(_) => {
                self.delete_open = false;
                self.sink.emit(UiEvent::ModalClosed(Modal::DeleteClient));
                self.toast("Client deleted", Tone::Ok);
                if let Err(err) = self.load().await {
                    debug!(error = %err, "roster refresh after delete failed");
                }
                Ok(true)
            }
            Err(err) => {
                warn!(id = target.id, error = %err, "client delete failed");
                self.toast(err.user_message(DELETE_FAILED), Tone::Err);
                Err(err)
            }
        }
    }
}
