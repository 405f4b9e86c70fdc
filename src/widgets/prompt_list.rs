//! Key/value prompt editor, global or scoped to a single client.

use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::api::ApiClient;
use crate::error::{ClientDeskError, Result};
use crate::html::{escape_html, inline_error};
use crate::interfaces::ui::{Modal, SharedSink, UiEvent};

pub const MAX_PROMPT_VALUE_CHARS: usize = 5000;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct PromptEntry {
    pub key: String,
    #[serde(default)]
    pub value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptScope {
    Global,
    Client(i64),
}

impl PromptScope {
    pub fn list_path(&self) -> String {
        match self {
            Self::Global => "/admin/prompts".to_string(),
            Self::Client(id) => format!("/admin/client/{id}/prompts"),
        }
    }

    pub fn entry_path(&self, key: &str) -> String {
        format!("{}/{}", self.list_path(), urlencoding::encode(key))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditSession {
    pub key: String,
    pub draft: String,
}

#[derive(Serialize)]
struct PromptValue<'a> {
    value: &'a str,
}

pub fn validate_value(value: &str) -> Result<()> {
    let length = value.chars().count();
    if length == 0 {
        return Err(ClientDeskError::Validation(
            "Prompt value cannot be empty".to_string(),
        ));
    }
    if length > MAX_PROMPT_VALUE_CHARS {
        return Err(ClientDeskError::Validation(format!(
            "Prompt value is {length} characters; the limit is {MAX_PROMPT_VALUE_CHARS}"
        )));
    }
    Ok(())
}

pub fn render_list(items: &[PromptEntry]) -> String {
    let rows: String = items
        .iter()
        .map(|item| {
            let key = escape_html(&item.key);
            format!(
                "<tr><td class=\"key\">{key}</td>\
<td><pre style=\"white-space:pre-wrap;margin:0;\">{}</pre></td>\
<td style=\"width:1%;\"><button data-key=\"{key}\" class=\"secondary\">Edit</button></td></tr>",
                escape_html(&item.value)
            )
        })
        .collect();
    format!(
        "<table role=\"grid\"><thead><tr><th>Key</th><th>Value</th><th></th></tr></thead>\
<tbody>{rows}</tbody></table>"
    )
}

pub struct PromptListEditor {
    api: ApiClient,
    sink: SharedSink,
    scope: PromptScope,
    items: Vec<PromptEntry>,
    editing: Option<EditSession>,
}

impl PromptListEditor {
    pub fn new(api: ApiClient, scope: PromptScope, sink: SharedSink) -> Result<Self> {
        if api.session().is_none() {
            return Err(ClientDeskError::Unauthorized);
        }
        Ok(Self {
            api,
            sink,
            scope,
            items: Vec::new(),
            editing: None,
        })
    }

    pub fn items(&self) -> &[PromptEntry] {
        &self.items
    }

    pub fn editing(&self) -> Option<&EditSession> {
        self.editing.as_ref()
    }

    pub async fn load(&mut self) -> Result<()> {
        match self
            .api
            .get_json::<Vec<PromptEntry>>(&self.scope.list_path())
            .await
        {
            Ok(items) => {
                self.sink.emit(UiEvent::ListReplaced {
                    html: render_list(&items),
                });
                self.items = items;
                Ok(())
            }
            Err(err) => {
                warn!(scope = ?self.scope, error = %err, "prompt list load failed");
                self.sink.emit(UiEvent::ListReplaced {
                    html: inline_error(&err.to_string()),
                });
                Err(err)
            }
        }
    }

    /// Opens the dialog pre-filled with the current value (empty for unknown keys).
    pub fn open_edit(&mut self, key: &str) {
        let draft = self
            .items
            .iter()
            .find(|item| item.key == key)
            .map(|item| item.value.clone())
            .unwrap_or_default();
        self.sink.emit(UiEvent::ModalOpened {
            modal: Modal::EditPrompt,
            title: Some(format!("Edit: {key}")),
        });
        self.sink.emit(UiEvent::FieldValue {
            field: "value".to_string(),
            value: draft.clone(),
        });
        self.sink.emit(UiEvent::Focus("value".to_string()));
        self.editing = Some(EditSession {
            key: key.to_string(),
            draft,
        });
    }

    pub fn set_draft(&mut self, value: impl Into<String>) {
        if let Some(session) = &mut self.editing {
            session.draft = value.into();
        }
    }

    pub fn cancel(&mut self) {
        if self.editing.take().is_some() {
            self.sink.emit(UiEvent::ModalClosed(Modal::EditPrompt));
        }
    }

    /// Replaces the edited key's value, then re-fetches the whole list.
    /// Failures raise an alert and keep the dialog open.
    pub async fn save(&mut self) -> Result<()> {
        let Some(session) = self.editing.clone() else {
            return Err(ClientDeskError::Validation(
                "No prompt is being edited".to_string(),
            ));
        };

        if let Err(err) = validate_value(&session.draft) {
            self.sink.emit(UiEvent::Alert(err.user_message("invalid value")));
            return Err(err);
        }

        let result: Result<Value> = self
            .api
            .send_json(
                Method::PUT,
                &self.scope.entry_path(&session.key),
                &PromptValue {
                    value: &session.draft,
                },
            )
            .await;

        match result {
            Ok(_) => {
                self.editing = None;
                self.sink.emit(UiEvent::ModalClosed(Modal::EditPrompt));
                if let Err(err) = self.load().await {
                    debug!(error = %err, "prompt list refresh after save failed");
                }
                Ok(())
            }
            Err(err) => {
                warn!(key = %session.key, error = %err, "prompt save failed");
                self.sink
                    .emit(UiEvent::Alert(format!("Save failed: {err}")));
                Err(err)
            }
        }
    }
}
