//! 設定管理を行うモジュール

use std::path::PathBuf;

use super::{
    ConfigError,
    OverlaySettings,
    loader,
};

/// 設定管理を行う
#[derive(Default, Debug, Clone)]
pub struct ConfigManager {
    /// 現在の設定
    current_settings: OverlaySettings,

    /// ワークスペースのルートパス
    workspace_root: Option<PathBuf>,
}

impl ConfigManager {
    /// 新しい設定マネージャーを作成
    #[must_use]
    pub fn new() -> Self {
        Self { current_settings: OverlaySettings::default(), workspace_root: None }
    }

    /// 設定を読み込む
    ///
    /// # Arguments
    /// * `workspace_root` - ワークスペースのルートパス
    ///
    /// # Returns
    /// - `Ok(())`: 設定の読み込みとバリデーション成功
    /// - `Err(ConfigError)`: エラー
    ///
    /// # Errors
    /// - ファイル読み込みエラー
    /// - JSON パースエラー
    /// - バリデーションエラー
    pub fn load_settings(&mut self, workspace_root: Option<PathBuf>) -> Result<(), ConfigError> {
        tracing::debug!("Loading settings for workspace: {:?}", workspace_root);

        // ワークスペースの設定を読み込み
        let mut settings = if let Some(root) = &workspace_root {
            loader::load_from_workspace(root)?.map_or_else(OverlaySettings::default, |ws| {
                tracing::debug!("Loaded workspace settings: {:?}", ws);
                ws
            })
        } else {
            OverlaySettings::default()
        };

        // 相対パスはワークスペース基準で解決
        if let Some(root) = &workspace_root {
            if let Some(path) = settings.storage.path.as_mut()
                && path.is_relative()
            {
                *path = root.join(&*path);
            }
            if let Some(path) = settings.logging.file.as_mut()
                && path.is_relative()
            {
                *path = root.join(&*path);
            }
        }

        // バリデーション
        settings.validate().map_err(ConfigError::ValidationErrors)?;

        // 設定を保存
        self.current_settings = settings;
        self.workspace_root = workspace_root;
        tracing::debug!("Settings loaded successfully: {:?}", self.current_settings);

        Ok(())
    }

    /// 設定を更新する
    pub fn update_settings(&mut self, new_settings: OverlaySettings) -> Result<(), ConfigError> {
        tracing::debug!("Updating settings...");

        // バリデーション
        new_settings.validate().map_err(ConfigError::ValidationErrors)?;

        // 設定を更新
        self.current_settings = new_settings;
        tracing::debug!("Settings updated successfully");

        Ok(())
    }

    /// 現在の設定を取得
    #[must_use]
    pub const fn get_settings(&self) -> &OverlaySettings {
        &self.current_settings
    }

    /// ワークスペースルートを取得
    #[must_use]
    pub const fn workspace_root(&self) -> Option<&PathBuf> {
        self.workspace_root.as_ref()
    }
}
