//! Bridge between the backend and the [`LanguageStore`].
/// Startup language selection
pub mod locale;
/// Backend implementations
pub mod source;
/// Response and error types
pub mod types;

use std::sync::atomic::{
    AtomicU64,
    Ordering,
};

pub use locale::determine_startup_language;
pub use source::{
    HttpTranslationSource,
    StaticSource,
    TranslationSource,
};
pub use types::{
    ApiEnvelope,
    LoadError,
};

use crate::store::{
    LanguageStore,
    TranslationMap,
};

/// Translations fetched for one request, not yet committed.
#[derive(Debug)]
pub struct FetchedTranslations {
    /// Request sequence number.
    ticket: u64,
    /// Requested language.
    code: String,
    /// Fetched phrases.
    translations: TranslationMap,
}

impl FetchedTranslations {
    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }

    #[must_use]
    pub const fn translations(&self) -> &TranslationMap {
        &self.translations
    }
}

/// Fetches from a [`TranslationSource`] and commits into a [`LanguageStore`].
///
/// Every translation request takes a ticket. Only the most recently
/// requested language may commit, so a slow response for an earlier switch
/// cannot overwrite a later one.
#[derive(Debug)]
pub struct TranslationLoader {
    /// Backend.
    source: Box<dyn TranslationSource>,
    /// Ticket of the most recent translation request.
    latest_ticket: AtomicU64,
}

impl TranslationLoader {
    #[must_use]
    pub fn new(source: Box<dyn TranslationSource>) -> Self {
        Self { source, latest_ticket: AtomicU64::new(0) }
    }

    /// Replaces the store's language list from the backend. On failure the
    /// list is left empty and the error is logged.
    pub async fn load_available_languages(&self, store: &mut LanguageStore) {
        match self.source.fetch_languages().await {
            Ok(languages) => store.set_available_languages(languages),
            Err(error) => {
                tracing::warn!(%error, "Failed to load available languages");
                store.set_available_languages(Vec::new());
            }
        }
    }

    /// Fetches the map for `code` under a fresh ticket.
    pub async fn fetch_translations(&self, code: &str) -> Result<FetchedTranslations, LoadError> {
        let ticket = self.latest_ticket.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::debug!(language = code, ticket, "Fetching translations");
        let translations = self.source.fetch_translations(code).await?;
        Ok(FetchedTranslations { ticket, code: code.to_string(), translations })
    }

    /// Whether `fetched` belongs to the most recent request.
    #[must_use]
    pub fn is_current(&self, fetched: &FetchedTranslations) -> bool {
        fetched.ticket == self.latest_ticket.load(Ordering::SeqCst)
    }

    /// Commits `fetched` unless a later request superseded it. Returns
    /// whether the store changed.
    pub fn commit(&self, store: &mut LanguageStore, fetched: FetchedTranslations) -> bool {
        if !self.is_current(&fetched) {
            tracing::debug!(
                language = fetched.code,
                ticket = fetched.ticket,
                "Discarding superseded translations"
            );
            return false;
        }
        store.commit_translations(&fetched.code, fetched.translations);
        true
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use googletest::prelude::*;

    use super::*;
    use crate::storage::MemoryStorage;
    use crate::store::LanguageDescriptor;

    fn source() -> StaticSource {
        StaticSource::new()
            .with_language(
                LanguageDescriptor::new("zh-cn", "简体中文"),
                [("Hosts", "主机")].into_iter().collect(),
            )
            .with_language(
                LanguageDescriptor::new("en-us", "English"),
                [("主机", "Hosts")].into_iter().collect(),
            )
    }

    fn store() -> LanguageStore {
        LanguageStore::new(Box::new(MemoryStorage::new()), "lang", "zh-cn")
    }

    #[tokio::test]
    async fn languages_are_loaded_into_store() {
        let loader = TranslationLoader::new(Box::new(source()));
        let mut store = store();

        loader.load_available_languages(&mut store).await;

        assert_that!(store.available_languages().len(), eq(2));
        assert_that!(store.take_picker_refresh(), eq(true));
    }

    #[tokio::test]
    async fn failed_language_list_leaves_list_empty() {
        let loader = TranslationLoader::new(Box::new(StaticSource::new().offline()));
        let mut store = store();

        loader.load_available_languages(&mut store).await;

        assert_that!(store.available_languages().is_empty(), eq(true));
    }

    #[tokio::test]
    async fn fetch_then_commit() {
        let loader = TranslationLoader::new(Box::new(source()));
        let mut store = store();

        let fetched = loader.fetch_translations("en-us").await.unwrap();
        assert_that!(fetched.code(), eq("en-us"));

        assert_that!(loader.commit(&mut store, fetched), eq(true));
        assert_that!(store.current_language(), eq("en-us"));
        assert_eq!(store.translations().get("主机"), Some("Hosts"));
    }

    #[tokio::test]
    async fn failed_fetch_leaves_store_untouched() {
        let loader = TranslationLoader::new(Box::new(source()));
        let mut store = store();
        let fetched = loader.fetch_translations("zh-cn").await.unwrap();
        loader.commit(&mut store, fetched);

        let result = loader.fetch_translations("fr-fr").await;

        assert!(result.is_err());
        assert_that!(store.current_language(), eq("zh-cn"));
        assert_eq!(store.translations().get("Hosts"), Some("主机"));
    }

    #[tokio::test]
    async fn superseded_response_is_discarded() {
        let shared = Arc::new(source());
        let loader = TranslationLoader::new(Box::new(Arc::clone(&shared)));
        let mut store = store();

        // Both requests are in flight; the first one resolves last.
        let (first, second) = futures::join!(
            loader.fetch_translations("en-us"),
            loader.fetch_translations("zh-cn")
        );
        let (first, second) = (first.unwrap(), second.unwrap());

        assert_that!(loader.commit(&mut store, second), eq(true));
        assert_that!(loader.commit(&mut store, first), eq(false));
        assert_that!(store.current_language(), eq("zh-cn"));
        assert_eq!(shared.requested(), vec!["en-us".to_string(), "zh-cn".to_string()]);
    }
}
