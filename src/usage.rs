//! Translation keys used by source code, and which of them the reference lacks.

/// Tree-sitter call extraction
mod extractor;
/// Source languages
mod language;
/// Workspace scan
mod scanner;

use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

pub use extractor::{
    StringCall,
    extract_string_calls,
};
pub use language::SourceLanguage;
pub use scanner::{
    FileUsage,
    UsageScanner,
};

use crate::catalog::{
    MessageTree,
    flatten,
};
use crate::config::MatcherError;

/// Why the usage scan could not run.
#[derive(Error, Debug)]
pub enum UsageError {
    /// Include or exclude patterns are invalid.
    #[error(transparent)]
    Matcher(#[from] MatcherError),

    /// The grammar does not match the tree-sitter version.
    #[error("Failed to set parser language: {0}")]
    LanguageSetup(#[from] tree_sitter::LanguageError),

    /// The parser returned no tree.
    #[error("Failed to parse source code")]
    ParseFailed,
}

/// A key used in code with no matching entry in the reference catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UndefinedKey {
    /// Key as written in code.
    pub key: String,
    /// Relative to the workspace root.
    pub file: PathBuf,
    /// 1-based line of the first use.
    pub line: usize,
}

impl fmt::Display for UndefinedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}:{})", self.key, self.file.display(), self.line)
    }
}

/// Distinct keys used, and the undefined ones sorted and de-duplicated by key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UsageReport {
    /// Distinct keys found in code.
    pub used_keys: usize,
    /// First use of every undefined key.
    pub undefined: Vec<UndefinedKey>,
}

/// Leaf paths and their proper prefixes, joined with the key separator.
struct DefinedKeys {
    /// Full leaf paths.
    leaves: HashSet<String>,
    /// Namespace prefixes of the leaves.
    prefixes: HashSet<String>,
}

impl DefinedKeys {
    /// Collects leaves and prefixes of `reference`.
    fn new(reference: &MessageTree, separator: &str) -> Self {
        let mut leaves = HashSet::new();
        let mut prefixes = HashSet::new();
        for path in flatten(reference) {
            let segments = path.segments();
            for end in 1..segments.len() {
                if let Some(prefix) = segments.get(..end) {
                    prefixes.insert(prefix.join(separator));
                }
            }
            leaves.insert(path.join(separator));
        }
        Self { leaves, prefixes }
    }

    /// `key` is a leaf or a namespace.
    fn contains(&self, key: &str) -> bool {
        self.leaves.contains(key) || self.prefixes.contains(key)
    }
}

/// Resolves every used key against the reference.
///
/// A key is defined when it is a leaf path, a namespace prefix, or
/// `<namespace><separator><key>` is defined for a namespace declared in the same file.
#[must_use]
pub fn find_undefined(files: &[FileUsage], reference: &MessageTree, separator: &str) -> UsageReport {
    let defined = DefinedKeys::new(reference, separator);
    let mut used = HashSet::new();
    let mut undefined = Vec::new();

    for file in files {
        for (key, line) in &file.keys {
            used.insert(key.as_str());
            let is_defined = defined.contains(key)
                || file
                    .namespaces
                    .iter()
                    .any(|ns| defined.contains(&format!("{ns}{separator}{key}")));
            if !is_defined {
                tracing::debug!(key, file = %file.file.display(), line, "Undefined key");
                undefined.push(UndefinedKey { key: key.clone(), file: file.file.clone(), line: *line });
            }
        }
    }

    undefined.sort_by(|a, b| {
        a.key.cmp(&b.key).then_with(|| a.file.cmp(&b.file)).then(a.line.cmp(&b.line))
    });
    undefined.dedup_by(|a, b| a.key == b.key);

    UsageReport { used_keys: used.len(), undefined }
}
