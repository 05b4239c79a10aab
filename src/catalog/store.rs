//! Catalog files on disk: loading, backups and atomic replacement.

use std::fs::{
    self,
    OpenOptions,
    Permissions,
};
use std::io::Write as _;
use std::path::{
    Path,
    PathBuf,
};

use serde_json::Value;
use tempfile::NamedTempFile;
use thiserror::Error;

use super::edit::apply_writes_to_json_text;
use super::{
    DotPath,
    MessageTree,
    ShapeError,
};

/// Why a catalog could not be loaded or written. Aborts the affected locale only.
#[derive(Error, Debug)]
pub enum CatalogError {
    /// The file exists but could not be read.
    #[error("Failed to read catalog '{}': {source}", path.display())]
    Io {
        /// Catalog file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid JSON.
    #[error("Failed to parse catalog '{}': {source}", path.display())]
    Parse {
        /// Catalog file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: serde_json::Error,
    },

    /// Valid JSON that is not nested objects of strings.
    #[error("Catalog '{}' is not a message tree: {source}", path.display())]
    Shape {
        /// Catalog file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: ShapeError,
    },

    /// The previous content could not be saved; the catalog was not replaced.
    #[error("Failed to back up '{}' to '{}': {source}", path.display(), backup.display())]
    Backup {
        /// Catalog file.
        path: PathBuf,
        /// Backup file.
        backup: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The new content could not be written.
    #[error("Failed to write catalog '{}': {source}", path.display())]
    Write {
        /// Catalog file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
}

/// A catalog loaded from disk together with the exact bytes it was read from.
#[derive(Debug, Clone)]
pub struct CatalogFile {
    /// Locale code the file belongs to.
    pub locale: String,
    /// `<dir>/<locale>.json`, whether or not it exists.
    pub path: PathBuf,
    /// Parsed content, mutated by merges until persisted.
    pub tree: MessageTree,
    /// Pre-run file content; `None` when the file did not exist.
    original: Option<String>,
}

impl CatalogFile {
    /// Whether the file was on disk when loaded.
    #[must_use]
    pub const fn existed(&self) -> bool {
        self.original.is_some()
    }

    /// Exact pre-run content.
    #[must_use]
    pub fn original_text(&self) -> Option<&str> {
        self.original.as_deref()
    }
}

/// Where a persist went.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistOutcome {
    /// The rewritten catalog.
    pub path: PathBuf,
    /// Copy of the previous content, if there was a previous file.
    pub backup: Option<PathBuf>,
    /// `false` when the CST rendering could not be used and the whole file was re-serialized.
    pub format_preserved: bool,
}

/// Locates, loads and safely rewrites `<dir>/<locale>.json` catalogs.
#[derive(Debug, Clone)]
pub struct CatalogStore {
    /// Directory holding `<locale>.json` files.
    dir: PathBuf,
    /// Appended to the catalog file name to form the backup name.
    backup_suffix: String,
}

impl CatalogStore {
    /// Store over `dir`; backups are written next to each catalog with `backup_suffix` appended.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>, backup_suffix: impl Into<String>) -> Self {
        Self { dir: dir.into(), backup_suffix: backup_suffix.into() }
    }

    /// Path of the catalog for `locale`.
    #[must_use]
    pub fn catalog_path(&self, locale: &str) -> PathBuf {
        self.dir.join(format!("{locale}.json"))
    }

    /// Path of the backup for `locale`.
    #[must_use]
    pub fn backup_path(&self, locale: &str) -> PathBuf {
        self.dir.join(format!("{locale}.json{}", self.backup_suffix))
    }

    /// Loads the catalog for `locale`. A missing file yields an empty tree.
    pub fn load(&self, locale: &str) -> Result<CatalogFile, CatalogError> {
        let path = self.catalog_path(locale);
        let original = match std::fs::read_to_string(&path) {
            Ok(text) => Some(text),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(locale, path = %path.display(), "Catalog not found, starting empty");
                None
            }
            Err(source) => return Err(CatalogError::Io { path, source }),
        };

        let tree = match &original {
            Some(text) => parse_tree(&path, text)?,
            None => MessageTree::empty(),
        };

        Ok(CatalogFile { locale: locale.to_string(), path, tree, original })
    }

    /// Loads a catalog that must exist (the reference).
    pub fn load_existing(&self, locale: &str) -> Result<MessageTree, CatalogError> {
        let path = self.catalog_path(locale);
        let text = std::fs::read_to_string(&path)
            .map_err(|source| CatalogError::Io { path: path.clone(), source })?;
        parse_tree(&path, &text)
    }

    /// Lists locale codes of every `*.json` catalog in the directory, sorted.
    pub fn discover_locales(&self) -> Result<Vec<String>, CatalogError> {
        let entries = std::fs::read_dir(&self.dir)
            .map_err(|source| CatalogError::Io { path: self.dir.clone(), source })?;

        let mut locales: Vec<String> = entries
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "json"))
            .filter_map(|path| path.file_stem().map(|stem| stem.to_string_lossy().to_string()))
            .collect();
        locales.sort();
        Ok(locales)
    }

    /// Writes the merged tree back, keeping a copy of the previous content.
    ///
    /// The previous file (if any) is copied to the backup path first; nothing is replaced
    /// if that fails. The new content goes to a temporary file in the same directory which
    /// is then renamed over the catalog, so readers see either the old or the new file.
    /// Both the backup and the rewritten catalog keep the previous file's permissions.
    pub fn persist(
        &self,
        catalog: &CatalogFile,
        writes: &[(DotPath, String)],
    ) -> Result<PersistOutcome, CatalogError> {
        let (rendered, format_preserved) = render(catalog, writes);

        let Some(original) = catalog.original_text() else {
            write_new(&catalog.path, &rendered)
                .map_err(|source| CatalogError::Write { path: catalog.path.clone(), source })?;
            return Ok(PersistOutcome { path: catalog.path.clone(), backup: None, format_preserved });
        };

        let backup = self.backup_path(&catalog.locale);
        let permissions = fs::metadata(&catalog.path)
            .map(|metadata| metadata.permissions())
            .map_err(|source| CatalogError::Io { path: catalog.path.clone(), source })?;

        write_atomically(&backup, original, &permissions).map_err(|source| CatalogError::Backup {
            path: catalog.path.clone(),
            backup: backup.clone(),
            source,
        })?;
        tracing::debug!(backup = %backup.display(), "Created backup");

        write_atomically(&catalog.path, &rendered, &permissions)
            .map_err(|source| CatalogError::Write { path: catalog.path.clone(), source })?;

        Ok(PersistOutcome { path: catalog.path.clone(), backup: Some(backup), format_preserved })
    }
}

/// Parses catalog text into a tree.
fn parse_tree(path: &Path, text: &str) -> Result<MessageTree, CatalogError> {
    let value: Value = serde_json::from_str(text)
        .map_err(|source| CatalogError::Parse { path: path.to_path_buf(), source })?;
    MessageTree::from_json(&value)
        .map_err(|source| CatalogError::Shape { path: path.to_path_buf(), source })
}

/// Renders the file content for `catalog` after `writes`.
///
/// Uses a CST edit of the original text when it reproduces `catalog.tree` exactly,
/// otherwise pretty-prints the tree.
fn render(catalog: &CatalogFile, writes: &[(DotPath, String)]) -> (String, bool) {
    if let Some(original) = catalog.original_text()
        && let Some(edited) = apply_writes_to_json_text(original, writes)
    {
        let reparsed = serde_json::from_str::<Value>(&edited)
            .ok()
            .and_then(|value| MessageTree::from_json(&value).ok());
        if reparsed.as_ref() == Some(&catalog.tree) {
            return (edited, true);
        }
        tracing::warn!(
            path = %catalog.path.display(),
            "Format-preserving edit diverged from merged catalog, rewriting whole file"
        );
    }
    (to_pretty_json(&catalog.tree), false)
}

/// Two-space indented JSON with a trailing newline; non-ASCII text is written as-is.
#[must_use]
pub fn to_pretty_json(tree: &MessageTree) -> String {
    let mut text = serde_json::to_string_pretty(tree).unwrap_or_else(|_| "{}".to_string());
    text.push('\n');
    text
}

/// Replaces `path` with `content` through a renamed temporary file carrying `permissions`.
fn write_atomically(path: &Path, content: &str, permissions: &Permissions) -> std::io::Result<()> {
    let dir = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or_else(|| Path::new("."));
    let mut file = NamedTempFile::new_in(dir)?;
    file.write_all(content.as_bytes())?;
    file.as_file().sync_all()?;
    file.as_file().set_permissions(permissions.clone())?;
    file.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Creates a catalog that did not exist, with the process's default permissions.
///
/// A partially written file is removed again.
fn write_new(path: &Path, content: &str) -> std::io::Result<()> {
    let mut file = OpenOptions::new().write(true).create_new(true).open(path)?;
    if let Err(e) = file.write_all(content.as_bytes()).and_then(|()| file.sync_all()) {
        let _ = fs::remove_file(path);
        return Err(e);
    }
    Ok(())
}
