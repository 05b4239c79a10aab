//! Source file pattern matcher for the usage scan.

use std::path::{
    Path,
    PathBuf,
};

use globset::{
    Glob,
    GlobSet,
    GlobSetBuilder,
};

use super::UsageConfig;

/// A usage glob pattern could not be compiled.
#[derive(Debug, thiserror::Error)]
pub enum MatcherError {
    /// Bad entry in `includePatterns`.
    #[error("Invalid include pattern '{pattern}': {source}")]
    InvalidIncludePattern {
        /// Pattern as configured.
        pattern: String,
        /// Compile error.
        #[source]
        source: globset::Error,
    },

    /// Bad entry in `excludePatterns`.
    #[error("Invalid exclude pattern '{pattern}': {source}")]
    InvalidExcludePattern {
        /// Pattern as configured.
        pattern: String,
        /// Compile error.
        #[source]
        source: globset::Error,
    },

    /// The combined set could not be built.
    #[error("Failed to build glob set: {0}")]
    GlobSetBuild(#[from] globset::Error),
}

/// Matches workspace files against the usage include/exclude globs.
#[derive(Debug, Clone)]
pub struct SourceMatcher {
    /// Root the patterns are relative to.
    workspace_root: PathBuf,
    /// Files to scan.
    include_set: GlobSet,
    /// Files and directories to skip.
    exclude_set: GlobSet,
}

impl SourceMatcher {
    /// Compiles the include and exclude patterns of `usage`.
    ///
    /// # Errors
    /// Returns `MatcherError` for the first pattern that is not a valid glob.
    pub fn new(workspace_root: PathBuf, usage: &UsageConfig) -> Result<Self, MatcherError> {
        let include_set = Self::build_glob_set(&usage.include_patterns, |pattern, source| {
            MatcherError::InvalidIncludePattern { pattern, source }
        })?;

        let exclude_set = Self::build_glob_set(&usage.exclude_patterns, |pattern, source| {
            MatcherError::InvalidExcludePattern { pattern, source }
        })?;

        Ok(Self { workspace_root, include_set, exclude_set })
    }

    /// Compiles `patterns` into one set, mapping a bad pattern through `make_error`.
    fn build_glob_set<F>(patterns: &[String], make_error: F) -> Result<GlobSet, MatcherError>
    where
        F: Fn(String, globset::Error) -> MatcherError,
    {
        let mut builder = GlobSetBuilder::new();
        for pattern in patterns {
            let glob = Glob::new(pattern).map_err(|e| make_error(pattern.clone(), e))?;
            builder.add(glob);
        }
        Ok(builder.build()?)
    }

    /// Root the patterns are relative to.
    #[must_use]
    pub fn workspace_root(&self) -> &Path {
        &self.workspace_root
    }

    /// The path must be absolute and under the workspace root.
    #[must_use]
    pub fn is_source_file(&self, absolute_path: &Path) -> bool {
        let Some(relative_path) = absolute_path.strip_prefix(&self.workspace_root).ok() else {
            return false;
        };

        self.is_source_file_relative(relative_path)
    }

    /// The path must be relative to the workspace root.
    #[must_use]
    pub fn is_source_file_relative(&self, relative_path: &Path) -> bool {
        self.include_set.is_match(relative_path) && !self.exclude_set.is_match(relative_path)
    }

    /// Directories under an exclude pattern are not descended into.
    #[must_use]
    pub fn is_excluded_dir(&self, absolute_path: &Path) -> bool {
        absolute_path.strip_prefix(&self.workspace_root).is_ok_and(|relative| {
            self.exclude_set.is_match(relative) || self.exclude_set.is_match(relative.join("_"))
        })
    }
}
