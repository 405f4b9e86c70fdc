//! Admin session chat: optimistic echo, set-once session id, visible failures.

use std::sync::Arc;

use reqwest::Method;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::api::ApiClient;
use crate::config::Config;
use crate::error::Result;
use crate::interfaces::ui::{SharedSink, UiEvent};
use crate::storage::LocalStore;

pub const DELIVERY_ERROR_LINE: &str = "⚠️ Message not delivered. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Speaker {
    User,
    Bot,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Pending,
    Delivered,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptEntry {
    pub speaker: Speaker,
    pub text: String,
    pub delivery: Delivery,
}

impl TranscriptEntry {
    pub fn render(&self) -> String {
        match (self.speaker, self.delivery) {
            (Speaker::User, Delivery::Failed) => format!("🧑 {} (not delivered)", self.text),
            (Speaker::User, _) => format!("🧑 {}", self.text),
            (Speaker::Bot, _) => format!("🤖 {}", self.text),
            (Speaker::System, _) => self.text.clone(),
        }
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    session_id: Option<&'a str>,
    message: &'a str,
}

#[derive(Deserialize, Default)]
struct ChatResponse {
    #[serde(default)]
    session_id: Option<String>,
    #[serde(default)]
    reply: Option<String>,
}

pub struct SessionChat {
    api: ApiClient,
    store: Arc<dyn LocalStore>,
    sink: SharedSink,
    storage_key: String,
    chat_path: String,
    session_id: Option<String>,
    transcript: Vec<TranscriptEntry>,
}

impl SessionChat {
    /// Reads any stored session id once, at page load.
    pub fn new(
        api: ApiClient,
        store: Arc<dyn LocalStore>,
        sink: SharedSink,
        page: &str,
        storage_key: &str,
    ) -> Result<Self> {
        let session_id = store
            .get(storage_key)?
            .filter(|value| !value.trim().is_empty());
        Ok(Self {
            api,
            store,
            sink,
            storage_key: storage_key.to_string(),
            chat_path: format!("{}/chat", page.trim_end_matches('/')),
            session_id,
            transcript: Vec::new(),
        })
    }

    pub fn from_config(
        config: &Config,
        api: ApiClient,
        store: Arc<dyn LocalStore>,
        sink: SharedSink,
    ) -> Result<Self> {
        Self::new(
            api,
            store,
            sink,
            &config.chat_page,
            &config.session_storage_key,
        )
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    pub fn transcript(&self) -> &[TranscriptEntry] {
        &self.transcript
    }

    fn append(&mut self, speaker: Speaker, text: String, delivery: Delivery) -> usize {
        let entry = TranscriptEntry {
            speaker,
            text,
            delivery,
        };
        self.sink.emit(UiEvent::TranscriptAppended {
            line: entry.render(),
        });
        self.transcript.push(entry);
        self.transcript.len() - 1
    }

    /// Sends one message. Blank input does nothing and returns `Ok(None)`.
    pub async fn submit(&mut self, input: &str) -> Result<Option<String>> {
        let message = input.trim();
        if message.is_empty() {
            return Ok(None);
        }

        let echo = self.append(Speaker::User, message.to_string(), Delivery::Pending);
        self.sink.emit(UiEvent::FieldValue {
            field: "msg".to_string(),
            value: String::new(),
        });

        let request = ChatRequest {
            session_id: self.session_id.as_deref(),
            message,
        };
        let response: Result<Option<ChatResponse>> = self
            .api
            .send_json(Method::POST, &self.chat_path, &request)
            .await;

        let response = match response {
            Ok(response) => response.unwrap_or_default(),
            Err(err) => {
                warn!(error = %err, "session chat message failed");
                self.transcript[echo].delivery = Delivery::Failed;
                self.sink.emit(UiEvent::DeliveryFailed {
                    line: self.transcript[echo].render(),
                });
                self.append(
                    Speaker::System,
                    DELIVERY_ERROR_LINE.to_string(),
                    Delivery::Delivered,
                );
                return Err(err);
            }
        };
        self.transcript[echo].delivery = Delivery::Delivered;

        if self.session_id.is_none() {
            if let Some(issued) = response.session_id.filter(|id| !id.trim().is_empty()) {
                if let Err(err) = self.store.set(&self.storage_key, &issued) {
                    warn!(error = %err, "unable to persist chat session id");
                }
                debug!(session_id = %issued, "chat session started");
                self.session_id = Some(issued);
            }
        }

        let reply = response.reply.unwrap_or_default();
        self.append(Speaker::Bot, reply.clone(), Delivery::Delivered);
        Ok(Some(reply))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_user_lines_are_annotated() {
        let entry = TranscriptEntry {
            speaker: Speaker::User,
            text: "hello".to_string(),
            delivery: Delivery::Failed,
        };
        assert_eq!(entry.render(), "🧑 hello (not delivered)");

        let bot = TranscriptEntry {
            speaker: Speaker::Bot,
            text: String::new(),
            delivery: Delivery::Delivered,
        };
        assert_eq!(bot.render(), "🤖 ");
    }
}
