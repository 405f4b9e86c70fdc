//! Read-only roster table behind the admin credential.

use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use crate::api::ApiClient;
use crate::config::{RosterEnvelope, RosterSourceConfig};
use crate::error::{ClientDeskError, Result};
use crate::html::{escape_html, inline_error};
use crate::interfaces::ui::{SharedSink, UiEvent};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterSource {
    pub path: String,
    pub envelope: RosterEnvelope,
}

impl From<&RosterSourceConfig> for RosterSource {
    fn from(config: &RosterSourceConfig) -> Self {
        Self {
            path: config.path.clone(),
            envelope: config.envelope,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RosterRow {
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub ig_accounts: Option<u64>,
    #[serde(default)]
    pub public_spaces: Option<u64>,
}

#[derive(Deserialize)]
struct ItemsEnvelope {
    #[serde(default)]
    items: Vec<RosterRow>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewerState {
    Idle,
    Loaded(Vec<RosterRow>),
    Failed(String),
}

pub fn render_table(rows: &[RosterRow]) -> String {
    let cell = |value: Option<&str>| escape_html(value.unwrap_or(""));
    let count = |value: Option<u64>| value.unwrap_or(0);
    let body: String = rows
        .iter()
        .map(|row| {
            format!(
                "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
                row.id,
                cell(row.name.as_deref()),
                cell(row.email.as_deref()),
                count(row.ig_accounts),
                count(row.public_spaces),
            )
        })
        .collect();
    format!(
        "<table role=\"grid\"><thead><tr><th>ID</th><th>Name</th><th>Email</th>\
<th>IG accounts</th><th>Public spaces</th></tr></thead><tbody>{body}</tbody></table>"
    )
}

pub struct RosterViewer {
    api: ApiClient,
    source: RosterSource,
    sink: SharedSink,
    state: ViewerState,
}

impl RosterViewer {
    /// `api` must carry an admin session; it is reused for the viewer's whole lifetime.
    pub fn new(api: ApiClient, source: RosterSource, sink: SharedSink) -> Result<Self> {
        if api.session().is_none() {
            return Err(ClientDeskError::Unauthorized);
        }
        Ok(Self {
            api,
            source,
            sink,
            state: ViewerState::Idle,
        })
    }

    pub fn state(&self) -> &ViewerState {
        &self.state
    }

    async fn fetch(&self) -> Result<Vec<RosterRow>> {
        match self.source.envelope {
            RosterEnvelope::Items => Ok(self
                .api
                .get_json::<ItemsEnvelope>(&self.source.path)
                .await?
                .items),
            RosterEnvelope::Bare => {
                let value: Value = self.api.get_json(&self.source.path).await?;
                Ok(serde_json::from_value(value)?)
            }
        }
    }

    /// Never fails: errors end up as an inline marker in the list area.
    pub async fn load(&mut self) -> &ViewerState {
        match self.fetch().await {
            Ok(rows) => {
                self.sink.emit(UiEvent::ListReplaced {
                    html: render_table(&rows),
                });
                self.state = ViewerState::Loaded(rows);
            }
            Err(err) => {
                warn!(path = %self.source.path, error = %err, "roster list unavailable");
                let message = err.to_string();
                self.sink.emit(UiEvent::ListReplaced {
                    html: inline_error(&message),
                });
                self.state = ViewerState::Failed(message);
            }
        }
        &self.state
    }
}
