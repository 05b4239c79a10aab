//! 設定管理を行うモジュール

use std::path::{
    Path,
    PathBuf,
};

use super::{
    ConfigError,
    SyncSettings,
    loader,
};

/// 設定管理を行う
#[derive(Debug, Clone)]
pub struct ConfigManager {
    /// 現在の設定
    current_settings: SyncSettings,

    /// ワークスペースのルートパス
    workspace_root: PathBuf,
}

impl ConfigManager {
    /// 新しい設定マネージャーを作成
    #[must_use]
    pub fn new(workspace_root: impl Into<PathBuf>) -> Self {
        Self { current_settings: SyncSettings::default(), workspace_root: workspace_root.into() }
    }

    /// 設定を読み込む
    ///
    /// `config_path` が指定された場合はそのファイルを、指定されない場合は
    /// ワークスペースの `.i18n-sync.json` を読み込む。
    ///
    /// # Errors
    /// - ファイル読み込みエラー
    /// - JSON パースエラー
    /// - バリデーションエラー
    pub fn load_settings(&mut self, config_path: Option<&Path>) -> Result<(), ConfigError> {
        tracing::debug!("Loading settings for workspace: {:?}", self.workspace_root);

        let settings = match config_path {
            Some(path) => loader::load_from_file(path)?,
            None => loader::load_from_workspace(&self.workspace_root)?.map_or_else(
                SyncSettings::default,
                |ws| {
                    tracing::debug!("Loaded workspace settings: {:?}", ws);
                    ws
                },
            ),
        };

        self.update_settings(settings)
    }

    /// 設定を更新する
    ///
    /// # Errors
    /// - バリデーションエラー
    pub fn update_settings(&mut self, new_settings: SyncSettings) -> Result<(), ConfigError> {
        // バリデーション
        new_settings.validate().map_err(ConfigError::ValidationErrors)?;

        self.current_settings = new_settings;
        tracing::debug!("Settings updated successfully");

        Ok(())
    }

    /// 現在の設定を取得
    #[must_use]
    pub const fn get_settings(&self) -> &SyncSettings {
        &self.current_settings
    }

    /// ワークスペースルートを取得
    #[must_use]
    pub fn workspace_root(&self) -> &Path {
        &self.workspace_root
    }

    /// カタログディレクトリの絶対パス（`messagesDir` はワークスペースルートからの相対パス）
    #[must_use]
    pub fn messages_dir(&self) -> PathBuf {
        self.workspace_root.join(&self.current_settings.messages_dir)
    }
}
