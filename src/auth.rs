//! Admin login. The password is exchanged once for an [`AdminSession`], which
//! [`ApiClient::with_session`] attaches to each request.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::header::HeaderValue;
use serde_json::Value;
use tracing::info;

use crate::api::ApiClient;
use crate::error::{ClientDeskError, Result};

pub const HEALTH_PATH: &str = "/admin/health";

#[derive(Clone)]
pub struct AdminSession {
    user: String,
    authorization: HeaderValue,
}

impl std::fmt::Debug for AdminSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminSession")
            .field("user", &self.user)
            .field("authorization", &"[REDACTED]")
            .finish()
    }
}

impl AdminSession {
    /// HTTP Basic credential for `user:password`. Does not contact the backend.
    pub fn basic(user: &str, password: &str) -> Result<Self> {
        let user = user.trim();
        if user.is_empty() {
            return Err(ClientDeskError::Validation(
                "Admin user is required".to_string(),
            ));
        }
        if user.contains(':') {
            return Err(ClientDeskError::Validation(
                "Admin user cannot contain ':'".to_string(),
            ));
        }
        if password.is_empty() {
            return Err(ClientDeskError::Validation(
                "Admin password is required".to_string(),
            ));
        }
        let encoded = STANDARD.encode(format!("{user}:{password}"));
        let mut authorization = HeaderValue::from_str(&format!("Basic {encoded}"))
            .map_err(|e| ClientDeskError::Validation(e.to_string()))?;
        authorization.set_sensitive(true);
        Ok(Self {
            user: user.to_string(),
            authorization,
        })
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub(crate) fn authorization(&self) -> &HeaderValue {
        &self.authorization
    }
}

pub struct AdminLogin;

impl AdminLogin {
    /// Builds the credential and checks it against the health endpoint.
    /// A rejected credential yields [`ClientDeskError::Unauthorized`].
    pub async fn login(client: &ApiClient, user: &str, password: &str) -> Result<AdminSession> {
        let session = AdminSession::basic(user, password)?;
        let _: Value = client
            .with_session(session.clone())
            .get_json(HEALTH_PATH)
            .await?;
        info!(user = %session.user(), "admin session established");
        Ok(session)
    }
}
