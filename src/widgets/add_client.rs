//! Add-client dialog: visibility, focus trap and blocking validation.

use serde::Serialize;
use tracing::{info, warn};

use crate::api::{ApiClient, FormOutcome};
use crate::error::{ClientDeskError, Result};
use crate::interfaces::ui::{Modal, SharedSink, UiEvent};

pub const CREATE_PATH: &str = "/ui2/clients/create";
pub const MIN_API_KEY_CHARS: usize = 8;
pub const INVALID_FORM: &str = "Fill in Name, IG username and API key (min 8 characters).";

/// Focus order inside the dialog.
pub const FIELDS: [&str; 5] = ["name", "instagram_username", "api_key", "active", "ai_prompt"];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddClientForm {
    pub name: String,
    pub instagram_username: String,
    pub api_key: String,
    pub active: bool,
    pub ai_prompt: String,
}

impl AddClientForm {
    pub fn validate(&self) -> Result<()> {
        let filled = |value: &str| !value.trim().is_empty();
        if !filled(&self.name)
            || !filled(&self.instagram_username)
            || self.api_key.trim().chars().count() < MIN_API_KEY_CHARS
        {
            return Err(ClientDeskError::Validation(INVALID_FORM.to_string()));
        }
        Ok(())
    }
}

#[derive(Serialize)]
struct AddClientFields<'a> {
    name: &'a str,
    instagram_username: &'a str,
    api_key: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    active: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    ai_prompt: Option<&'a str>,
}

impl<'a> From<&'a AddClientForm> for AddClientFields<'a> {
    fn from(form: &'a AddClientForm) -> Self {
        Self {
            name: form.name.trim(),
            instagram_username: form.instagram_username.trim(),
            api_key: form.api_key.trim(),
            active: form.active.then_some("on"),
            ai_prompt: Some(form.ai_prompt.trim()).filter(|p| !p.is_empty()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Escape,
    Tab,
    ShiftTab,
    Other,
}

pub struct AddClientModal {
    api: ApiClient,
    sink: SharedSink,
    open: bool,
    focus: usize,
}

impl AddClientModal {
    /// Starts closed.
    pub fn new(api: ApiClient, sink: SharedSink) -> Self {
        let modal = Self {
            api,
            sink,
            open: false,
            focus: 0,
        };
        modal.sink.emit(UiEvent::ModalClosed(Modal::AddClient));
        modal
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn aria_hidden(&self) -> &'static str {
        if self.open {
            "false"
        } else {
            "true"
        }
    }

    pub fn display(&self) -> &'static str {
        if self.open {
            "grid"
        } else {
            "none"
        }
    }

    pub fn focused_field(&self) -> Option<&'static str> {
        self.open.then(|| FIELDS[self.focus])
    }

    pub fn open(&mut self) {
        self.open = true;
        self.focus = 0;
        self.sink.emit(UiEvent::ModalOpened {
            modal: Modal::AddClient,
            title: None,
        });
        self.sink.emit(UiEvent::Focus(FIELDS[0].to_string()));
    }

    pub fn close(&mut self) {
        self.open = false;
        self.sink.emit(UiEvent::ModalClosed(Modal::AddClient));
    }

    pub fn backdrop_click(&mut self) {
        self.close();
    }

    /// Escape closes; Tab and Shift-Tab cycle focus without leaving the dialog.
    pub fn key(&mut self, key: Key) {
        match key {
            Key::Escape => self.close(),
            Key::Tab | Key::ShiftTab if self.open => {
                self.focus = if key == Key::Tab {
                    (self.focus + 1) % FIELDS.len()
                } else {
                    (self.focus + FIELDS.len() - 1) % FIELDS.len()
                };
                self.sink.emit(UiEvent::Focus(FIELDS[self.focus].to_string()));
            }
            _ => {}
        }
    }

    /// Invalid forms are blocked with an alert and never sent.
    pub async fn submit(&mut self, form: &AddClientForm) -> Result<FormOutcome> {
        if let Err(err) = form.validate() {
            self.sink.emit(UiEvent::Alert(INVALID_FORM.to_string()));
            return Err(err);
        }

        let fields = AddClientFields::from(form);
        let outcome = self.api.post_form(CREATE_PATH, &fields).await.map_err(|err| {
            warn!(error = %err, "add client request failed");
            self.sink.emit(UiEvent::Alert(err.user_message("Failed to create client")));
            err
        })?;

        if let Some(code) = outcome.redirect_param("err") {
            warn!(code = %code, "backend refused new client");
            self.sink
                .emit(UiEvent::Alert(format!("Client not created: {code}")));
            return Err(ClientDeskError::Api {
                status: outcome.status,
                detail: Some(code),
            });
        }

        info!(name = %fields.name, "client created through add-client form");
        self.close();
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interfaces::ui::RecordingSink;
    use std::time::Duration;

    fn form(api_key: &str) -> AddClientForm {
        AddClientForm {
            name: "Studio Uno".to_string(),
            instagram_username: "studio.uno".to_string(),
            api_key: api_key.to_string(),
            ..AddClientForm::default()
        }
    }

    fn modal() -> (AddClientModal, std::sync::Arc<RecordingSink>) {
        let api = ApiClient::new("http://127.0.0.1:1", Duration::from_secs(1)).unwrap();
        let sink = RecordingSink::new();
        (AddClientModal::new(api, sink.clone()), sink)
    }

    #[test]
    fn api_key_length_boundary() {
        assert!(form("1234567").validate().is_err());
        assert!(form("12345678").validate().is_ok());
        assert!(form("  1234567  ").validate().is_err());

        let mut missing_name = form("12345678");
        missing_name.name = "   ".to_string();
        assert!(missing_name.validate().is_err());

        let mut missing_user = form("12345678");
        missing_user.instagram_username.clear();
        assert!(missing_user.validate().is_err());
    }

    #[test]
    fn visibility_follows_open_close_escape_and_backdrop() {
        let (mut modal, _sink) = modal();
        assert_eq!((modal.aria_hidden(), modal.display()), ("true", "none"));

        modal.open();
        assert_eq!((modal.aria_hidden(), modal.display()), ("false", "grid"));
        assert_eq!(modal.focused_field(), Some("name"));

        modal.key(Key::Escape);
        assert!(!modal.is_open());

        modal.open();
        modal.backdrop_click();
        assert!(!modal.is_open());
        assert_eq!(modal.focused_field(), None);
    }

    #[test]
    fn focus_is_trapped_inside_the_dialog() {
        let (mut modal, _sink) = modal();
        modal.open();
        modal.key(Key::ShiftTab);
        assert_eq!(modal.focused_field(), Some("ai_prompt"));
        modal.key(Key::Tab);
        assert_eq!(modal.focused_field(), Some("name"));
        for _ in 0..FIELDS.len() {
            modal.key(Key::Tab);
        }
        assert_eq!(modal.focused_field(), Some("name"));
        modal.key(Key::Other);
        assert!(modal.is_open());
    }

    #[tokio::test]
    async fn short_api_key_is_blocked_before_network() {
        let (mut modal, sink) = modal();
        modal.open();
        let err = modal.submit(&form("1234567")).await.unwrap_err();
        assert!(matches!(err, ClientDeskError::Validation(_)));
        assert_eq!(sink.alerts(), vec![INVALID_FORM.to_string()]);
        assert!(modal.is_open());
    }
}
