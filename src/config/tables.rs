//! Immutable lookup tables built once from validated settings.

use std::collections::BTreeMap;

use super::SyncSettings;

/// Locale code → backend language tag.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LanguageTagTable {
    /// Locale code to tag.
    tags: BTreeMap<String, String>,
}

impl LanguageTagTable {
    /// Table over an explicit mapping.
    #[must_use]
    pub const fn new(tags: BTreeMap<String, String>) -> Self {
        Self { tags }
    }

    /// Table from `languageTags`.
    #[must_use]
    pub fn from_settings(settings: &SyncSettings) -> Self {
        Self::new(settings.language_tags.clone())
    }

    /// `None` means the locale is unsupported by the backend.
    #[must_use]
    pub fn tag_for(&self, locale: &str) -> Option<&str> {
        self.tags.get(locale).map(String::as_str)
    }
}

impl<L: Into<String>, T: Into<String>> FromIterator<(L, T)> for LanguageTagTable {
    fn from_iter<I: IntoIterator<Item = (L, T)>>(iter: I) -> Self {
        Self::new(iter.into_iter().map(|(l, t)| (l.into(), t.into())).collect())
    }
}

/// Locale code → "needs translation" markers, with a fallback list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MarkerTable {
    /// Markers of locales with their own entry.
    per_locale: BTreeMap<String, Vec<String>>,
    /// Markers of every other locale.
    default: Vec<String>,
}

impl MarkerTable {
    /// Table over explicit per-locale and fallback markers.
    #[must_use]
    pub const fn new(per_locale: BTreeMap<String, Vec<String>>, default: Vec<String>) -> Self {
        Self { per_locale, default }
    }

    /// Table from `placeholderMarkers` and `defaultMarkers`.
    #[must_use]
    pub fn from_settings(settings: &SyncSettings) -> Self {
        Self::new(settings.placeholder_markers.clone(), settings.default_markers.clone())
    }

    /// Markers that apply to `locale`.
    #[must_use]
    pub fn markers_for(&self, locale: &str) -> &[String] {
        self.per_locale.get(locale).map_or(self.default.as_slice(), Vec::as_slice)
    }

    /// Returns the first marker of `locale` contained in `text`.
    #[must_use]
    pub fn find_marker<'a>(&'a self, locale: &str, text: &str) -> Option<&'a str> {
        self.markers_for(locale)
            .iter()
            .find(|marker| text.contains(marker.as_str()))
            .map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case::chinese("zh", "待翻译", Some("待翻译"))]
    #[case::embedded("zh", "你好 (待翻译)", Some("待翻译"))]
    #[case::arabic("ar", "يحتاج ترجمة", Some("يحتاج ترجمة"))]
    #[case::creole("ht", "Gen pou tradwi: Hello", Some("Gen pou tradwi"))]
    #[case::translated("zh", "你好", None)]
    #[case::fallback_default("fr", "待翻译", Some("待翻译"))]
    #[case::other_locale_marker("ar", "待翻译", None)]
    fn find_marker_with_defaults(
        #[case] locale: &str,
        #[case] text: &str,
        #[case] expected: Option<&str>,
    ) {
        let table = MarkerTable::from_settings(&SyncSettings::default());

        assert_eq!(table.find_marker(locale, text), expected);
    }

    #[rstest]
    fn tag_lookup() {
        let table = LanguageTagTable::from_settings(&SyncSettings::default());

        assert_eq!(table.tag_for("zh"), Some("zho_Hans"));
        assert_eq!(table.tag_for("mg"), Some("plt_Latn"));
        assert_eq!(table.tag_for("xx"), None);
    }

    #[rstest]
    fn tag_table_from_iter() {
        let table: LanguageTagTable = [("en", "eng_Latn")].into_iter().collect();

        assert_eq!(table.tag_for("en"), Some("eng_Latn"));
        assert_eq!(table.tag_for("zh"), None);
    }
}
