//! Dot-path addressing for message trees.

use std::fmt;

use serde::{
    Serialize,
    Serializer,
};

/// Address of a node inside a [`MessageTree`](super::MessageTree).
///
/// A path is a sequence of key segments. Segments are kept separate internally, so a
/// key that itself contains the separator (e.g. `"foo.bar"`) is still a single segment.
/// The joined form is only used for display and for matching keys found in source code.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DotPath {
    /// Key segments from the root.
    segments: Vec<String>,
}

impl DotPath {
    /// Path from already split segments.
    #[must_use]
    pub const fn new(segments: Vec<String>) -> Self {
        Self { segments }
    }

    /// Splits `text` on `separator`.
    ///
    /// ```
    /// use i18n_catalog_sync::catalog::DotPath;
    ///
    /// let path = DotPath::parse("Layout.Footer.contact_us", ".");
    /// assert_eq!(path.segments().len(), 3);
    /// assert_eq!(path.join("/"), "Layout/Footer/contact_us");
    /// ```
    #[must_use]
    pub fn parse(text: &str, separator: &str) -> Self {
        if text.is_empty() {
            return Self::default();
        }
        Self { segments: text.split(separator).map(ToString::to_string).collect() }
    }

    /// Key segments from the root.
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// `true` for the empty path addressing the whole tree.
    #[must_use]
    pub const fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Returns a new path with `segment` appended.
    #[must_use]
    pub fn child(&self, segment: &str) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment.to_string());
        Self { segments }
    }

    /// Returns the parent segments and the terminal segment.
    #[must_use]
    pub fn split_last(&self) -> Option<(&String, &[String])> {
        self.segments.split_last()
    }

    /// Segments joined with `separator`.
    #[must_use]
    pub fn join(&self, separator: &str) -> String {
        self.segments.join(separator)
    }
}

impl fmt::Display for DotPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.join("."))
    }
}

impl Serialize for DotPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<S: Into<String>> FromIterator<S> for DotPath {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self { segments: iter.into_iter().map(Into::into).collect() }
    }
}
