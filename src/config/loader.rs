//! 設定ファイルの読み込み関数

use std::path::Path;

use jsonc_parser::ParseOptions;

use super::{
    ConfigError,
    OverlaySettings,
};

/// 設定ファイル名
pub const CONFIG_FILE_NAME: &str = ".openidcs-i18n.json";

/// ワークスペースから設定を読み込む
///
/// `.openidcs-i18n.json` ファイルを探して読み込む（コメントと末尾カンマを許可）
///
/// # Arguments
/// * `workspace_root` - ワークスペースのルートパス
///
/// # Returns
/// - `Ok(Some(settings))`: 設定ファイルが見つかり、読み込みに成功
/// - `Ok(None)`: 設定ファイルが見つからない
/// - `Err(ConfigError)`: ファイル読み込みまたはパースエラー
///
/// # Errors
/// - ファイル読み込みエラー
/// - JSON パースエラー
pub(super) fn load_from_workspace(
    workspace_root: &Path,
) -> Result<Option<OverlaySettings>, ConfigError> {
    let config_path = workspace_root.join(CONFIG_FILE_NAME);

    if !config_path.exists() {
        tracing::debug!("Configuration file not found: {:?}", config_path);
        return Ok(None);
    }

    tracing::debug!("Loading configuration from: {:?}", config_path);

    let content = std::fs::read_to_string(&config_path)?;
    let value = jsonc_parser::parse_to_serde_value(&content, &ParseOptions::default())?
        .unwrap_or_else(|| serde_json::Value::Object(serde_json::Map::new()));
    let settings: OverlaySettings = serde_json::from_value(value)?;

    Ok(Some(settings))
}
