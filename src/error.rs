use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientDeskError {
    #[error("configuration error: {0}")]
    Config(String),
    #[error("http error: {0}")]
    Http(String),
    #[error("{}", api_message(.status, .detail))]
    Api { status: u16, detail: Option<String> },
    #[error("unauthorized: admin credential rejected")]
    Unauthorized,
    #[error("validation error: {0}")]
    Validation(String),
    #[error("serialization error: {0}")]
    Serialization(String),
    #[error("storage error: {0}")]
    Storage(String),
    #[error("runtime error: {0}")]
    Runtime(String),
}

fn api_message(status: &u16, detail: &Option<String>) -> String {
    match detail {
        Some(detail) => detail.clone(),
        None => format!("HTTP {status}"),
    }
}

impl ClientDeskError {
    /// The backend-provided `detail`, if the failure carried one.
    pub fn detail(&self) -> Option<&str> {
        match self {
            Self::Api { detail, .. } => detail.as_deref(),
            _ => None,
        }
    }

    /// Message to show the user: backend detail first, otherwise `fallback`.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            Self::Validation(message) => message.clone(),
            _ => self
                .detail()
                .map(str::to_string)
                .unwrap_or_else(|| fallback.to_string()),
        }
    }
}

impl From<reqwest::Error> for ClientDeskError {
    fn from(err: reqwest::Error) -> Self {
        Self::Http(err.to_string())
    }
}

impl From<serde_json::Error> for ClientDeskError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

pub use crate::Result;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_prefers_detail() {
        let err = ClientDeskError::Api {
            status: 400,
            detail: Some("name is required".to_string()),
        };
        assert_eq!(format!("{err}"), "name is required");
        assert_eq!(err.user_message("fallback"), "name is required");

        let bare = ClientDeskError::Api {
            status: 502,
            detail: None,
        };
        assert_eq!(format!("{bare}"), "HTTP 502");
        assert_eq!(bare.user_message("fallback"), "fallback");
    }

    #[test]
    fn transport_errors_use_fallback() {
        let err = ClientDeskError::Http("connection refused".to_string());
        assert!(format!("{err}").contains("http error"));
        assert_eq!(err.user_message("Failed to load"), "Failed to load");
    }
}
