//! Public chat bound to a tenant slug.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use reqwest::Method;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::api::ApiClient;
use crate::error::Result;
use crate::interfaces::ui::{SharedSink, UiEvent};

pub const NO_REPLY: &str = "No reply.";
pub const REPLY_ERROR_LINE: &str = "Error in the reply. Please try again.";

const SLUG_MARKER: &str = "c";

/// Data attribute first, then the path segment following `/c/`.
pub fn resolve_slug(data_slug: Option<&str>, path: &str) -> Option<String> {
    if let Some(slug) = data_slug.map(str::trim).filter(|s| !s.is_empty()) {
        return Some(slug.to_string());
    }
    let parts: Vec<&str> = path.split('/').filter(|part| !part.is_empty()).collect();
    let index = parts.iter().position(|part| *part == SLUG_MARKER)?;
    let raw = parts.get(index + 1)?;
    let decoded = urlencoding::decode(raw)
        .map(|value| value.into_owned())
        .unwrap_or_else(|_| raw.to_string());
    Some(decoded).filter(|slug| !slug.is_empty())
}

/// Path component of a page location, which may be a full URL or already a path.
pub fn location_path(location: &str) -> String {
    match url::Url::parse(location) {
        Ok(parsed) => parsed.path().to_string(),
        Err(_) => location
            .split(|c: char| c == '?' || c == '#')
            .next()
            .unwrap_or("")
            .to_string(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Who {
    You,
    Bot,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatLine {
    pub who: Who,
    pub text: String,
}

impl ChatLine {
    pub fn label(&self) -> &'static str {
        match self.who {
            Who::You => "You",
            Who::Bot => "Assistant",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Blank input.
    Ignored,
    /// Another message is still in flight.
    Busy,
    Replied(String),
    Failed,
}

#[derive(Serialize)]
struct PublicChatRequest<'a> {
    user: &'a str,
}

#[derive(Deserialize, Default)]
struct PublicChatResponse {
    #[serde(default)]
    reply: Option<String>,
}

pub struct PublicChat {
    api: ApiClient,
    sink: SharedSink,
    slug: String,
    in_flight: AtomicBool,
    lines: Mutex<Vec<ChatLine>>,
}

impl PublicChat {
    /// `None` when no slug can be resolved: the widget stays inert.
    pub fn bind(
        api: ApiClient,
        sink: SharedSink,
        data_slug: Option<&str>,
        location: &str,
    ) -> Option<Self> {
        let slug = resolve_slug(data_slug, &location_path(location))?;
        Some(Self {
            api,
            sink,
            slug,
            in_flight: AtomicBool::new(false),
            lines: Mutex::new(Vec::new()),
        })
    }

    pub fn slug(&self) -> &str {
        &self.slug
    }

    pub fn lines(&self) -> Vec<ChatLine> {
        match self.lines.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn is_send_enabled(&self) -> bool {
        !self.in_flight.load(Ordering::SeqCst)
    }

    fn append(&self, who: Who, text: &str) {
        let line = ChatLine {
            who,
            text: text.to_string(),
        };
        self.sink.emit(UiEvent::TranscriptAppended {
            line: format!("{}: {}", line.label(), line.text),
        });
        match self.lines.lock() {
            Ok(mut guard) => guard.push(line),
            Err(poisoned) => poisoned.into_inner().push(line),
        }
    }

    async fn send(&self, text: &str) -> Result<String> {
        let path = format!("/c/{}/chat", urlencoding::encode(&self.slug));
        let response: Option<PublicChatResponse> = self
            .api
            .send_json(Method::POST, &path, &PublicChatRequest { user: text })
            .await?;
        Ok(response
            .and_then(|r| r.reply)
            .filter(|reply| !reply.is_empty())
            .unwrap_or_else(|| NO_REPLY.to_string()))
    }

    /// Errors never escape: they become a fixed line in the log.
    pub async fn submit(&self, text: &str) -> SubmitOutcome {
        let text = text.trim();
        if text.is_empty() {
            return SubmitOutcome::Ignored;
        }
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return SubmitOutcome::Busy;
        }

        self.sink.emit(UiEvent::FieldValue {
            field: "chat-input".to_string(),
            value: String::new(),
        });
        self.sink.emit(UiEvent::Blur("chat-input".to_string()));
        self.sink.emit(UiEvent::SendEnabled(false));
        self.append(Who::You, text);

        let outcome = match self.send(text).await {
            Ok(reply) => {
                self.append(Who::Bot, &reply);
                SubmitOutcome::Replied(reply)
            }
            Err(err) => {
                warn!(slug = %self.slug, error = %err, "public chat reply failed");
                self.append(Who::Bot, REPLY_ERROR_LINE);
                SubmitOutcome::Failed
            }
        };

        self.in_flight.store(false, Ordering::SeqCst);
        self.sink.emit(UiEvent::SendEnabled(true));
        self.sink.emit(UiEvent::Focus("chat-input".to_string()));
        outcome
    }
}
