use std::path::PathBuf;

use serde::{
    Deserialize,
    Serialize,
};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Configuration error in '{field_path}': {message}")]
pub struct ValidationError {
    /// JSON path to the field (e.g., "skip.tags[0]")
    pub field_path: String,
    pub message: String,
}

impl ValidationError {
    #[must_use]
    pub fn new(field_path: impl Into<String>, message: impl Into<String>) -> Self {
        Self { field_path: field_path.into(), message: message.into() }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration validation failed:\n{}", format_validation_errors(.0))]
    ValidationErrors(Vec<ValidationError>),

    #[error("Failed to load configuration file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("Failed to parse configuration: {0}")]
    SyntaxError(#[from] jsonc_parser::errors::ParseError),
}

fn format_validation_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .enumerate()
        .map(|(i, err)| format!("  {}. {} - {}", i + 1, err.field_path, err.message))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Placeholder replaced by the language code in `translationsPath`.
pub const LANGUAGE_CODE_PLACEHOLDER: &str = "{code}";

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OverlaySettings {
    pub backend: BackendConfig,
    pub storage: StorageConfig,

    /// Used when neither a saved choice nor the locale names a language.
    pub fallback_language: String,

    pub skip: SkipConfig,
    pub watcher: WatcherConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BackendConfig {
    pub base_url: String,
    pub languages_path: String,
    /// Must contain `{code}`.
    pub translations_path: String,
    /// Envelope `code` value meaning success.
    pub success_code: i64,
    pub request_timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:1880".to_string(),
            languages_path: "/api/i18n/languages".to_string(),
            translations_path: "/api/i18n/translations/{code}".to_string(),
            success_code: 200,
            request_timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StorageConfig {
    /// Preference file. In-memory only when unset.
    pub path: Option<PathBuf>,
    pub key: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self { path: None, key: "openidcs_language".to_string() }
    }
}

/// Elements the walker never enters.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SkipConfig {
    pub tags: Vec<String>,
    pub classes: Vec<String>,
    /// Presence of this attribute excludes an element.
    pub attribute: String,
}

impl Default for SkipConfig {
    fn default() -> Self {
        Self {
            tags: ["script", "style", "noscript", "iframe", "object", "embed", "template", "svg"]
                .into_iter()
                .map(String::from)
                .collect(),
            classes: vec!["no-translate".to_string(), "notranslate".to_string()],
            attribute: "data-no-translate".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WatcherConfig {
    /// Upper bound on record batches drained per pump, including batches
    /// caused by the watcher's own substitutions.
    pub max_rounds: usize,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self { max_rounds: 8 }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingConfig {
    /// `tracing_subscriber::EnvFilter` directive. `RUST_LOG` takes precedence.
    pub level: String,
    /// Log file in addition to stderr.
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), file: None }
    }
}

impl Default for OverlaySettings {
    fn default() -> Self {
        Self {
            backend: BackendConfig::default(),
            storage: StorageConfig::default(),
            fallback_language: "zh-cn".to_string(),
            skip: SkipConfig::default(),
            watcher: WatcherConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl OverlaySettings {
    /// # Errors
    /// - Required field is empty
    /// - Backend URL is not http(s)
    /// - Translations path without `{code}`
    /// - Invalid log filter
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        let base_url = self.backend.base_url.trim();
        if base_url.is_empty() {
            errors.push(ValidationError::new(
                "backend.baseUrl",
                "The URL cannot be empty. Example: \"http://127.0.0.1:1880\"",
            ));
        } else if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            errors.push(ValidationError::new(
                "backend.baseUrl",
                format!("Unsupported URL '{base_url}': only http:// and https:// are allowed"),
            ));
        }

        if !self.backend.languages_path.starts_with('/') {
            errors.push(ValidationError::new(
                "backend.languagesPath",
                "The path must start with '/'. Example: \"/api/i18n/languages\"",
            ));
        }

        if !self.backend.translations_path.starts_with('/') {
            errors.push(ValidationError::new(
                "backend.translationsPath",
                "The path must start with '/'. Example: \"/api/i18n/translations/{code}\"",
            ));
        } else if !self.backend.translations_path.contains(LANGUAGE_CODE_PLACEHOLDER) {
            errors.push(ValidationError::new(
                "backend.translationsPath",
                "The path must contain the '{code}' placeholder",
            ));
        }

        if self.backend.request_timeout_secs == 0 {
            errors.push(ValidationError::new(
                "backend.requestTimeoutSecs",
                "The timeout must be at least 1 second",
            ));
        }

        if self.storage.key.trim().is_empty() {
            errors.push(ValidationError::new("storage.key", "The key cannot be empty"));
        }

        if self.fallback_language.trim().is_empty() {
            errors.push(ValidationError::new(
                "fallbackLanguage",
                "The language cannot be empty. Example: \"zh-cn\"",
            ));
        }

        for (index, tag) in self.skip.tags.iter().enumerate() {
            if tag.trim().is_empty() || tag.contains(char::is_whitespace) {
                errors.push(ValidationError::new(
                    format!("skip.tags[{index}]"),
                    format!("Invalid tag name '{tag}'"),
                ));
            }
        }

        if self.skip.attribute.trim().is_empty() {
            errors.push(ValidationError::new(
                "skip.attribute",
                "The attribute cannot be empty. Example: \"data-no-translate\"",
            ));
        }

        if self.watcher.max_rounds == 0 {
            errors.push(ValidationError::new(
                "watcher.maxRounds",
                "At least one round is required",
            ));
        }

        if let Err(e) = tracing_subscriber::EnvFilter::try_new(&self.logging.level) {
            errors.push(ValidationError::new(
                "logging.level",
                format!("Invalid log filter '{}': {e}", self.logging.level),
            ));
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}
