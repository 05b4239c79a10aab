//! 統合テスト用の共通ヘルパー

#![allow(dead_code)]
#![allow(clippy::unwrap_used)]

use std::fs;
use std::path::{
    Path,
    PathBuf,
};
use std::sync::{
    Arc,
    Mutex,
};

use async_trait::async_trait;
use i18n_catalog_sync::config::{
    ConfigManager,
    SyncSettings,
};
use i18n_catalog_sync::driver::Driver;
use i18n_catalog_sync::translator::{
    TranslationError,
    TranslationProvider,
};
use serde_json::Value;
use tempfile::TempDir;

type Responder = Box<dyn Fn(&str) -> Result<String, TranslationError> + Send + Sync>;

/// 応答をクロージャで定義できる翻訳プロバイダー
pub struct ScriptedProvider {
    respond: Responder,
    calls: Mutex<Vec<String>>,
}

impl ScriptedProvider {
    pub fn new(respond: impl Fn(&str) -> Result<String, TranslationError> + Send + Sync + 'static) -> Self {
        Self { respond: Box::new(respond), calls: Mutex::new(Vec::new()) }
    }

    /// `[tr] text` の形で翻訳したことにする
    pub fn tagging() -> Self {
        Self::new(|text| Ok(format!("[tr] {text}")))
    }

    /// 常に HTTP 500 で失敗する
    pub fn failing() -> Self {
        Self::new(|_| Err(TranslationError::Status { status: 500, body: "boom".to_string() }))
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl TranslationProvider for ScriptedProvider {
    async fn translate(
        &self,
        text: &str,
        _source_tag: &str,
        _target_tag: &str,
    ) -> Result<String, TranslationError> {
        self.calls.lock().unwrap().push(text.to_string());
        (self.respond)(text)
    }
}

/// 一時ワークスペース
pub struct Workspace {
    pub dir: TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        Self { dir: TempDir::new().unwrap() }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn write(&self, relative: &str, content: &str) -> &Self {
        let path = self.root().join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
        self
    }

    pub fn catalog_path(&self, locale: &str) -> PathBuf {
        self.root().join("messages").join(format!("{locale}.json"))
    }

    pub fn backup_path(&self, locale: &str) -> PathBuf {
        self.root().join("messages").join(format!("{locale}.json.backup"))
    }

    pub fn write_catalog(&self, locale: &str, content: &str) -> &Self {
        self.write(&format!("messages/{locale}.json"), content)
    }

    pub fn read_catalog(&self, locale: &str) -> String {
        fs::read_to_string(self.catalog_path(locale)).unwrap()
    }

    pub fn catalog_json(&self, locale: &str) -> Value {
        serde_json::from_str(&self.read_catalog(locale)).unwrap()
    }

    pub fn driver(&self, settings: SyncSettings, provider: Arc<dyn TranslationProvider>) -> Driver {
        let mut config = ConfigManager::new(self.root());
        config.update_settings(settings).unwrap();
        Driver::new(config, provider)
    }
}

/// 使用箇所スキャンを無効にした設定
pub fn settings(locales: &[&str]) -> SyncSettings {
    let mut settings = SyncSettings {
        locales: locales.iter().map(ToString::to_string).collect(),
        ..SyncSettings::default()
    };
    settings.usage.enabled = false;
    settings
}
