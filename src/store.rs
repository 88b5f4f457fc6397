//! Language state shared by the overlay: active language, translation map and
//! the languages offered by the backend.

use std::collections::HashMap;

use serde::{
    Deserialize,
    Serialize,
};

use crate::storage::PreferenceStorage;

/// Keys with at most this many characters never take part in partial
/// matching.
pub const PARTIAL_KEY_MIN_CHARS: usize = 2;

/// A language offered by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageDescriptor {
    /// Language code, e.g. `zh-cn`.
    pub code: String,
    /// Name of the language in the language itself.
    pub native: String,
}

impl LanguageDescriptor {
    #[must_use]
    pub fn new(code: impl Into<String>, native: impl Into<String>) -> Self {
        Self { code: code.into(), native: native.into() }
    }
}

/// Source phrase to translated phrase.
///
/// Entries with an empty translation are dropped, so such phrases read as
/// untranslated. The partial-match candidates (keys longer than
/// [`PARTIAL_KEY_MIN_CHARS`], longest first) are computed once when the map
/// is built.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "HashMap<String, String>", into = "HashMap<String, String>")]
pub struct TranslationMap {
    /// Phrase table.
    entries: HashMap<String, String>,
    /// Partial-match keys, longest first, ties in lexical order.
    candidates: Vec<String>,
}

impl TranslationMap {
    #[must_use]
    pub fn new(mut entries: HashMap<String, String>) -> Self {
        entries.retain(|_, translation| !translation.is_empty());
        let mut candidates: Vec<String> = entries
            .keys()
            .filter(|key| key.chars().count() > PARTIAL_KEY_MIN_CHARS)
            .cloned()
            .collect();
        candidates.sort_by(|a, b| b.chars().count().cmp(&a.chars().count()).then_with(|| a.cmp(b)));
        Self { entries, candidates }
    }

    #[must_use]
    pub fn get(&self, phrase: &str) -> Option<&str> {
        self.entries.get(phrase).map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keys eligible for partial matching, longest first.
    #[must_use]
    pub fn partial_candidates(&self) -> &[String] {
        &self.candidates
    }
}

impl From<HashMap<String, String>> for TranslationMap {
    fn from(entries: HashMap<String, String>) -> Self {
        Self::new(entries)
    }
}

impl From<TranslationMap> for HashMap<String, String> {
    fn from(map: TranslationMap) -> Self {
        map.entries
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for TranslationMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::new(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Single writer of the language state.
#[derive(Debug)]
pub struct LanguageStore {
    /// Active language code.
    current: String,
    /// Phrases of the active language.
    translations: TranslationMap,
    /// Languages offered by the backend.
    available: Vec<LanguageDescriptor>,
    /// Where the active language is persisted.
    storage: Box<dyn PreferenceStorage>,
    /// Key the active language is persisted under.
    storage_key: String,
    /// Set when the language list or the active language changed since the
    /// picker was last drawn.
    picker_stale: bool,
}

impl LanguageStore {
    /// Creates a store that reports `initial_language` until the first
    /// commit.
    #[must_use]
    pub fn new(
        storage: Box<dyn PreferenceStorage>,
        storage_key: impl Into<String>,
        initial_language: impl Into<String>,
    ) -> Self {
        Self {
            current: initial_language.into(),
            translations: TranslationMap::default(),
            available: Vec::new(),
            storage,
            storage_key: storage_key.into(),
            picker_stale: false,
        }
    }

    #[must_use]
    pub fn current_language(&self) -> &str {
        &self.current
    }

    #[must_use]
    pub const fn translations(&self) -> &TranslationMap {
        &self.translations
    }

    #[must_use]
    pub fn available_languages(&self) -> &[LanguageDescriptor] {
        &self.available
    }

    /// Descriptor of `code` among the available languages.
    #[must_use]
    pub fn language(&self, code: &str) -> Option<&LanguageDescriptor> {
        self.available.iter().find(|language| language.code == code)
    }

    /// Language code persisted by an earlier session.
    #[must_use]
    pub fn persisted_language(&self) -> Option<String> {
        self.storage.get(&self.storage_key).filter(|code| !code.trim().is_empty())
    }

    /// Replaces the language list, flagging the picker if the list changed.
    pub fn set_available_languages(&mut self, languages: Vec<LanguageDescriptor>) {
        tracing::debug!(count = languages.len(), "Available languages updated");
        if self.available != languages {
            self.available = languages;
            self.picker_stale = true;
        }
    }

    /// Returns whether the picker needs a redraw and clears the flag.
    pub fn take_picker_refresh(&mut self) -> bool {
        std::mem::replace(&mut self.picker_stale, false)
    }

    /// Makes `code` the active language with `translations`, and persists
    /// the code. A persistence failure is logged; the in-memory commit stands.
    pub fn commit_translations(&mut self, code: &str, translations: TranslationMap) {
        tracing::info!(language = code, phrases = translations.len(), "Translations committed");
        if self.current != code {
            self.current = code.to_string();
            self.picker_stale = true;
        }
        self.translations = translations;
        if let Err(error) = self.storage.set(&self.storage_key, code) {
            tracing::warn!(%error, "Failed to persist selected language");
        }
    }
}
