//! Overlay configuration: `.openidcs-i18n.json` loading and validation.
mod loader;
mod manager;
mod types;

pub use loader::CONFIG_FILE_NAME;
pub use manager::ConfigManager;
pub use types::{
    BackendConfig,
    ConfigError,
    LANGUAGE_CODE_PLACEHOLDER,
    LoggingConfig,
    OverlaySettings,
    SkipConfig,
    StorageConfig,
    ValidationError,
    WatcherConfig,
};
