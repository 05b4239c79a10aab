//! テスト用ユーティリティ
//!
//! 複数のテストモジュールで使用される共通のヘルパーを提供します。
#![cfg(test)]
#![allow(clippy::unwrap_used)]

use std::sync::Mutex;

use async_trait::async_trait;

use crate::catalog::MessageTree;
use crate::translator::{
    TranslationError,
    TranslationProvider,
};

/// 入力テキストと呼び出し回数から応答を返すクロージャ
type Responder = Box<dyn Fn(&str, u32) -> Result<String, TranslationError> + Send + Sync>;

/// 応答をクロージャで定義できる翻訳プロバイダー
///
/// クロージャには入力テキストと、そのテキストに対する呼び出し回数（1 始まり）が渡される。
pub(crate) struct ScriptedProvider {
    /// 応答を決めるクロージャ
    respond: Responder,
    /// 呼び出し履歴（入力テキストと対象言語タグ）
    calls: Mutex<Vec<(String, String)>>,
}

impl ScriptedProvider {
    /// クロージャからプロバイダーを作成する
    pub(crate) fn new(
        respond: impl Fn(&str, u32) -> Result<String, TranslationError> + Send + Sync + 'static,
    ) -> Self {
        Self { respond: Box::new(respond), calls: Mutex::new(Vec::new()) }
    }

    /// 入力の前にプレフィックスを付けて返す
    pub(crate) fn prefixing(prefix: &'static str) -> Self {
        Self::new(move |text, _| Ok(format!("{prefix}{text}")))
    }

    /// 常に指定のステータスで失敗する
    pub(crate) fn failing(status: u16) -> Self {
        Self::new(move |_, _| Err(TranslationError::Status { status, body: String::new() }))
    }

    /// 呼び出された入力テキストの一覧
    pub(crate) fn texts(&self) -> Vec<String> {
        self.calls.lock().unwrap().iter().map(|(text, _)| text.clone()).collect()
    }

    /// 呼び出された対象言語タグの一覧
    pub(crate) fn target_tags(&self) -> Vec<String> {
        self.calls.lock().unwrap().iter().map(|(_, tag)| tag.clone()).collect()
    }

    /// 呼び出し回数
    pub(crate) fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl TranslationProvider for ScriptedProvider {
    async fn translate(
        &self,
        text: &str,
        _source_tag: &str,
        target_tag: &str,
    ) -> Result<String, TranslationError> {
        let nth = {
            let mut calls = self.calls.lock().unwrap();
            calls.push((text.to_string(), target_tag.to_string()));
            calls.iter().filter(|(t, _)| t == text).count()
        };
        (self.respond)(text, u32::try_from(nth).unwrap())
    }
}

/// JSON 値から `MessageTree` を作成する
pub(crate) fn tree(value: &serde_json::Value) -> MessageTree {
    MessageTree::from_json(value).unwrap()
}
