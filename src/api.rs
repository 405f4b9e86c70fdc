use std::collections::HashMap;
use std::time::Duration;

use reqwest::header::{HeaderMap, AUTHORIZATION, LOCATION};
use reqwest::{Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::auth::AdminSession;
use crate::config::Config;
use crate::error::{ClientDeskError, Result};

/// Result of a classic HTML form post, which the backend answers with a redirect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormOutcome {
    pub status: u16,
    pub location: Option<String>,
}

impl FormOutcome {
    /// Value of `key` in the redirect target's query string.
    pub fn redirect_param(&self, key: &str) -> Option<String> {
        let location = self.location.as_deref()?;
        let parsed = url::Url::parse(location)
            .or_else(|_| url::Url::parse("http://localhost").and_then(|base| base.join(location)))
            .ok()?;
        parsed
            .query_pairs()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.into_owned())
    }
}

/// HTTP access to the dashboard backend. Cheap to clone; each widget owns its own copy.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    session: Option<AdminSession>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("session", &self.session)
            .finish()
    }
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = base_url.trim().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(ClientDeskError::Config("Missing base_url".to_string()));
        }
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| ClientDeskError::Config(e.to_string()))?;
        Ok(Self {
            http,
            base_url,
            session: None,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(&config.base_url, Duration::from_secs(config.timeout_seconds))
    }

    /// Copy of this client that attaches `session`'s credential to every request.
    pub fn with_session(&self, session: AdminSession) -> Self {
        Self {
            http: self.http.clone(),
            base_url: self.base_url.clone(),
            session: Some(session),
        }
    }

    pub fn session(&self) -> Option<&AdminSession> {
        self.session.as_ref()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        let path = path.trim_start_matches('/');
        format!("{}/{path}", self.base_url)
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let mut builder = self.http.request(method, self.url(path));
        if let Some(session) = &self.session {
            builder = builder.header(AUTHORIZATION, session.authorization().clone());
        }
        builder
    }

    fn redact_headers(headers: &HeaderMap) -> HashMap<String, String> {
        headers
            .iter()
            .map(|(k, v)| {
                let key = k.to_string();
                let lower = key.to_ascii_lowercase();
                let value = if lower.contains("authorization")
                    || lower.contains("api-key")
                    || lower.contains("token")
                {
                    "[REDACTED]".to_string()
                } else {
                    v.to_str().unwrap_or("").to_string()
                };
                (key, value)
            })
            .collect()
    }

    async fn execute(&self, builder: reqwest::RequestBuilder) -> Result<Response> {
        let request = builder.build()?;
        let method = request.method().clone();
        let url = request.url().to_string();
        info!(
            method = %method,
            url = %url,
            headers = ?Self::redact_headers(request.headers()),
            "backend request"
        );
        let response = self.http.execute(request).await.map_err(|e| {
            warn!(method = %method, url = %url, error = %e, "backend request failed");
            ClientDeskError::Http(e.to_string())
        })?;
        info!(
            method = %method,
            url = %url,
            status = %response.status().as_u16(),
            "backend response"
        );
        Ok(response)
    }

    async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T> {
        let status = response.status();
        let text = response.text().await?;
        if status == StatusCode::UNAUTHORIZED {
            return Err(ClientDeskError::Unauthorized);
        }
        if !status.is_success() {
            let detail = extract_detail(&text);
            warn!(status = %status.as_u16(), detail = ?detail, "backend rejected request");
            return Err(ClientDeskError::Api {
                status: status.as_u16(),
                detail,
            });
        }
        if text.trim().is_empty() {
            return Ok(serde_json::from_value(Value::Null)?);
        }
        Ok(serde_json::from_str(&text)?)
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self.execute(self.request(Method::GET, path)).await?;
        Self::read_json(response).await
    }

    pub async fn send_json<B, T>(&self, method: Method, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self
            .execute(self.request(method, path).json(body))
            .await?;
        Self::read_json(response).await
    }

    pub async fn delete(&self, path: &str) -> Result<Value> {
        let response = self.execute(self.request(Method::DELETE, path)).await?;
        Self::read_json(response).await
    }

    /// URL-encoded form post. Redirects are reported, not followed.
    pub async fn post_form<F>(&self, path: &str, form: &F) -> Result<FormOutcome>
    where
        F: Serialize + ?Sized,
    {
        let response = self
            .execute(self.request(Method::POST, path).form(form))
            .await?;
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(ClientDeskError::Unauthorized);
        }
        if status.is_success() || status.is_redirection() {
            let location = response
                .headers()
                .get(LOCATION)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            return Ok(FormOutcome {
                status: status.as_u16(),
                location,
            });
        }
        let text = response.text().await.unwrap_or_default();
        Err(ClientDeskError::Api {
            status: status.as_u16(),
            detail: extract_detail(&text),
        })
    }
}

/// Pulls a human-readable `detail` out of an error body.
/// Validation failures carry a list of `{msg}` objects instead of a string.
pub fn extract_detail(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    match value.get("detail")? {
        Value::String(detail) if !detail.trim().is_empty() => Some(detail.clone()),
        Value::Array(items) => {
            let messages: Vec<&str> = items
                .iter()
                .filter_map(|item| item.get("msg").and_then(|m| m.as_str()))
                .collect();
            if messages.is_empty() {
                None
            } else {
                Some(messages.join("; "))
            }
        }
        _ => None,
    }
}
