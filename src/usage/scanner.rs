//! ワークスペースのソースファイルから翻訳キーの使用箇所を収集する

use std::collections::HashSet;
use std::path::{
    Path,
    PathBuf,
};

use ignore::WalkBuilder;

use super::extractor::extract_string_calls;
use super::{
    SourceLanguage,
    UsageError,
};
use crate::config::{
    SourceMatcher,
    UsageConfig,
};

/// 1 ファイル分のキー使用情報
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileUsage {
    /// ワークスペースルートからの相対パス
    pub file: PathBuf,
    /// `useTranslations("nav")` などで宣言された名前空間
    pub namespaces: Vec<String>,
    /// 使用されているキーと行番号（1 始まり）
    pub keys: Vec<(String, usize)>,
}

/// ソースファイルを走査するスキャナー
#[derive(Debug, Clone)]
pub struct UsageScanner {
    /// 対象ファイルの判定
    matcher: SourceMatcher,
    /// キーを受け取る関数名
    key_functions: HashSet<String>,
    /// 名前空間を宣言する関数名
    namespace_functions: HashSet<String>,
}

impl UsageScanner {
    /// 使用箇所スキャン設定からスキャナーを作成する
    ///
    /// # Errors
    /// glob パターンが不正な場合
    pub fn new(workspace_root: PathBuf, usage: &UsageConfig) -> Result<Self, UsageError> {
        Ok(Self {
            matcher: SourceMatcher::new(workspace_root, usage)?,
            key_functions: usage.key_functions.iter().cloned().collect(),
            namespace_functions: usage.namespace_functions.iter().cloned().collect(),
        })
    }

    /// ワークスペース全体を走査する
    ///
    /// 読み込みや解析に失敗したファイルは警告を出してスキップする。
    pub async fn scan(&self) -> Vec<FileUsage> {
        let files = self.find_source_files();
        tracing::debug!(
            workspace_path = %self.matcher.workspace_root().display(),
            files = files.len(),
            "Scanning source files"
        );

        // 並列処理でファイルを読み込む
        let futures: Vec<_> = files.iter().map(|file| self.scan_file(file)).collect();
        let mut usages: Vec<FileUsage> =
            futures::future::join_all(futures).await.into_iter().flatten().collect();

        usages.sort_by(|a, b| a.file.cmp(&b.file));
        usages
    }

    /// 単一ファイルを解析する
    async fn scan_file(&self, file_path: &Path) -> Option<FileUsage> {
        let content = match tokio::fs::read_to_string(file_path).await {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!("Failed to read file {:?}: {}", file_path, e);
                return None;
            }
        };

        let relative = file_path
            .strip_prefix(self.matcher.workspace_root())
            .unwrap_or(file_path)
            .to_path_buf();
        self.analyze(relative, &content)
    }

    /// ソースコードを解析して `FileUsage` を作成する
    ///
    /// 対応していない拡張子や解析エラーの場合は `None`
    #[must_use]
    pub fn analyze(&self, file: PathBuf, content: &str) -> Option<FileUsage> {
        let language = SourceLanguage::from_path(&file)?;
        let calls = match extract_string_calls(content, language) {
            Ok(calls) => calls,
            Err(e) => {
                tracing::warn!("Failed to analyze file {:?}: {}", file, e);
                return None;
            }
        };

        let mut usage = FileUsage { file, ..FileUsage::default() };
        for call in calls {
            if self.namespace_functions.contains(&call.function) {
                usage.namespaces.push(call.argument);
            } else if self.key_functions.contains(&call.function) {
                usage.keys.push((call.argument, call.line));
            }
        }
        Some(usage)
    }

    /// 対象のソースファイルを検索
    ///
    /// `.gitignore` を尊重し、除外パターンにマッチするディレクトリには降りない。
    #[must_use]
    pub fn find_source_files(&self) -> Vec<PathBuf> {
        let root = self.matcher.workspace_root();
        let matcher = self.matcher.clone();
        let mut found_files = Vec::new();

        for result in WalkBuilder::new(root)
            .hidden(false)
            .git_ignore(true)
            .git_global(true)
            .git_exclude(true)
            .follow_links(false)
            .filter_entry(move |entry| {
                !(entry.file_type().is_some_and(|ft| ft.is_dir())
                    && matcher.is_excluded_dir(entry.path()))
            })
            .build()
        {
            let entry = match result {
                Ok(entry) => entry,
                Err(err) => {
                    tracing::debug!(?err, "Failed to read directory entry");
                    continue;
                }
            };

            // ファイルのみを対象
            if !entry.file_type().is_some_and(|ft| ft.is_file()) {
                continue;
            }

            if self.matcher.is_source_file(entry.path()) {
                found_files.push(entry.path().to_path_buf());
            }
        }

        found_files.sort();
        found_files
    }
}
