use serde::Deserialize;
use thiserror::Error;

/// Errors fetching languages or translations from the backend.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Request to {url} failed: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Request to {url} timed out")]
    Timeout { url: String },

    #[error("Request to {url} returned HTTP {status}")]
    HttpStatus { url: String, status: u16 },

    #[error("Backend rejected the request with code {code}: {message}")]
    Backend { code: i64, message: String },

    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Failed to build HTTP client: {0}")]
    Client(String),

    #[error("No translations available for '{0}'")]
    UnknownLanguage(String),
}

/// Response body shared by the backend endpoints: `{ "code": 200, "data": ... }`.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiEnvelope<T> {
    pub code: i64,
    #[serde(default)]
    pub msg: Option<String>,
    #[serde(default)]
    pub data: Option<T>,
}

impl<T: Default> ApiEnvelope<T> {
    /// Payload when `code` equals `success_code`. A missing payload on success
    /// counts as empty.
    pub fn into_result(self, success_code: i64) -> Result<T, LoadError> {
        if self.code != success_code {
            return Err(LoadError::Backend {
                code: self.code,
                message: self.msg.unwrap_or_default(),
            });
        }
        Ok(self.data.unwrap_or_default())
    }
}
