//! Single-field editor for a client's `ai_prompt`.

use std::time::{Duration, Instant};

use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::api::ApiClient;
use crate::error::{ClientDeskError, Result};
use crate::interfaces::ui::{SharedSink, UiEvent};

pub const MAX_AI_PROMPT_CHARS: usize = 8000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorStatus {
    Idle,
    Saving,
    Saved,
    Error(String),
}

impl EditorStatus {
    pub fn label(&self) -> String {
        match self {
            Self::Idle => String::new(),
            Self::Saving => "Saving…".to_string(),
            Self::Saved => "Saved".to_string(),
            Self::Error(message) => format!("Error: {message}"),
        }
    }
}

#[derive(Deserialize)]
struct ClientPrompt {
    #[serde(default)]
    ai_prompt: Option<String>,
}

#[derive(Serialize)]
struct ClientPromptPatch<'a> {
    ai_prompt: &'a str,
}

pub struct AiPromptEditor {
    api: ApiClient,
    sink: SharedSink,
    client_id: i64,
    text: String,
    status: EditorStatus,
    status_since: Instant,
    revert_after: Duration,
}

impl AiPromptEditor {
    pub fn new(api: ApiClient, sink: SharedSink, client_id: i64, revert_after: Duration) -> Self {
        Self {
            api,
            sink,
            client_id,
            text: String::new(),
            status: EditorStatus::Idle,
            status_since: Instant::now(),
            revert_after,
        }
    }

    fn path(&self) -> String {
        format!("/api/clients/{}", self.client_id)
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    /// Status as shown at `now`. `Saved` and `Error` fall back to idle once the revert delay has passed.
    pub fn status_at(&self, now: Instant) -> EditorStatus {
        match self.status {
            EditorStatus::Saved | EditorStatus::Error(_)
                if now.saturating_duration_since(self.status_since) >= self.revert_after =>
            {
                EditorStatus::Idle
            }
            _ => self.status.clone(),
        }
    }

    pub fn status(&self) -> EditorStatus {
        self.status_at(Instant::now())
    }

    fn set_status(&mut self, status: EditorStatus) {
        self.sink.emit(UiEvent::StatusText(status.label()));
        self.status = status;
        self.status_since = Instant::now();
    }

    pub async fn load(&mut self) -> Result<()> {
        let path = self.path();
        match self.api.get_json::<ClientPrompt>(&path).await {
            Ok(record) => {
                self.text = record.ai_prompt.unwrap_or_default();
                self.sink.emit(UiEvent::FieldValue {
                    field: "ai_prompt".to_string(),
                    value: self.text.clone(),
                });
                Ok(())
            }
            Err(err) => {
                warn!(client_id = self.client_id, error = %err, "ai prompt load failed");
                self.set_status(EditorStatus::Error(err.user_message("load failed")));
                Err(err)
            }
        }
    }

    /// Partial update carrying only `ai_prompt`.
    pub async fn save(&mut self) -> Result<()> {
        let length = self.text.chars().count();
        if length > MAX_AI_PROMPT_CHARS {
            let err = ClientDeskError::Validation(format!(
                "Prompt is {length} characters; the limit is {MAX_AI_PROMPT_CHARS}"
            ));
            self.set_status(EditorStatus::Error(err.user_message("invalid prompt")));
            return Err(err);
        }

        self.set_status(EditorStatus::Saving);
        let path = self.path();
        let patch = ClientPromptPatch {
            ai_prompt: &self.text,
        };
        let result: Result<Value> = self.api.send_json(Method::PATCH, &path, &patch).await;
        match result {
            Ok(_) => {
                self.set_status(EditorStatus::Saved);
                Ok(())
            }
            Err(err) => {
                warn!(client_id = self.client_id, error = %err, "ai prompt save failed");
                self.set_status(EditorStatus::Error(err.user_message("save failed")));
                Err(err)
            }
        }
    }
}
