//! Where languages and translation maps come from.

use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;

use super::types::{
    ApiEnvelope,
    LoadError,
};
use crate::config::{
    BackendConfig,
    LANGUAGE_CODE_PLACEHOLDER,
};
use crate::store::{
    LanguageDescriptor,
    TranslationMap,
};

/// Backend serving the language list and per-language translation maps.
#[async_trait]
pub trait TranslationSource: Debug + Send + Sync {
    async fn fetch_languages(&self) -> Result<Vec<LanguageDescriptor>, LoadError>;

    async fn fetch_translations(&self, code: &str) -> Result<TranslationMap, LoadError>;
}

/// The OpenIDCS REST backend.
#[derive(Debug, Clone)]
pub struct HttpTranslationSource {
    /// Shared connection pool.
    client: reqwest::Client,
    /// Backend settings.
    config: BackendConfig,
}

impl HttpTranslationSource {
    /// # Errors
    /// The HTTP client cannot be built (e.g. TLS backend unavailable).
    pub fn new(config: &BackendConfig) -> Result<Self, LoadError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| LoadError::Client(e.to_string()))?;
        Ok(Self { client, config: config.clone() })
    }

    /// Absolute URL of `path` on the backend.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.base_url.trim_end_matches('/'))
    }

    /// URL of the translations of `code`.
    #[must_use]
    pub fn translations_url(&self, code: &str) -> String {
        self.url(&self.config.translations_path.replace(LANGUAGE_CODE_PLACEHOLDER, code))
    }

    async fn get<T: DeserializeOwned + Default>(&self, url: &str) -> Result<T, LoadError> {
        tracing::debug!("GET {url}");

        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                LoadError::Timeout { url: url.to_string() }
            } else {
                LoadError::Network { url: url.to_string(), source: e }
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(LoadError::HttpStatus { url: url.to_string(), status: status.as_u16() });
        }

        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                LoadError::Timeout { url: url.to_string() }
            } else {
                LoadError::Network { url: url.to_string(), source: e }
            }
        })?;
        tracing::trace!(bytes = body.len(), "Response received from {url}");

        let envelope: ApiEnvelope<T> = serde_json::from_str(&body)?;
        envelope.into_result(self.config.success_code)
    }
}

#[async_trait]
impl TranslationSource for HttpTranslationSource {
    async fn fetch_languages(&self) -> Result<Vec<LanguageDescriptor>, LoadError> {
        self.get(&self.url(&self.config.languages_path)).await
    }

    async fn fetch_translations(&self, code: &str) -> Result<TranslationMap, LoadError> {
        self.get(&self.translations_url(code)).await
    }
}

/// Languages and translations held in memory.
///
/// Serves embedded deployments without a backend and records every requested
/// language code.
#[derive(Debug, Default)]
pub struct StaticSource {
    /// Served language list.
    languages: Vec<LanguageDescriptor>,
    /// Served maps by language code.
    translations: HashMap<String, TranslationMap>,
    /// When set, every request fails.
    offline: bool,
    /// Language codes requested so far, in order.
    requests: Mutex<Vec<String>>,
}

impl StaticSource {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a language served with `translations`.
    #[must_use]
    pub fn with_language(
        mut self,
        language: LanguageDescriptor,
        translations: TranslationMap,
    ) -> Self {
        self.translations.insert(language.code.clone(), translations);
        self.languages.push(language);
        self
    }

    /// Makes every request fail as if the backend were unreachable.
    #[must_use]
    pub const fn offline(mut self) -> Self {
        self.offline = true;
        self
    }

    /// Language codes requested so far.
    #[must_use]
    pub fn requested(&self) -> Vec<String> {
        self.requests.lock().map(|requests| requests.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl TranslationSource for StaticSource {
    async fn fetch_languages(&self) -> Result<Vec<LanguageDescriptor>, LoadError> {
        if self.offline {
            return Err(LoadError::Timeout { url: "static:languages".to_string() });
        }
        Ok(self.languages.clone())
    }

    async fn fetch_translations(&self, code: &str) -> Result<TranslationMap, LoadError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(code.to_string());
        }
        if self.offline {
            return Err(LoadError::Timeout { url: format!("static:translations/{code}") });
        }
        self.translations
            .get(code)
            .cloned()
            .ok_or_else(|| LoadError::UnknownLanguage(code.to_string()))
    }
}

#[async_trait]
impl<S: TranslationSource + ?Sized> TranslationSource for std::sync::Arc<S> {
    async fn fetch_languages(&self) -> Result<Vec<LanguageDescriptor>, LoadError> {
        (**self).fetch_languages().await
    }

    async fn fetch_translations(&self, code: &str) -> Result<TranslationMap, LoadError> {
        (**self).fetch_translations(code).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use googletest::prelude::*;
    use rstest::*;

    use super::*;

    fn http_source(base_url: &str) -> HttpTranslationSource {
        let config = BackendConfig { base_url: base_url.to_string(), ..BackendConfig::default() };
        HttpTranslationSource::new(&config).unwrap()
    }

    #[rstest]
    #[case("http://idc.local", "/api/i18n/languages", "http://idc.local/api/i18n/languages")]
    #[case("http://idc.local/", "/api/i18n/languages", "http://idc.local/api/i18n/languages")]
    fn url_joins_base_and_path(#[case] base: &str, #[case] path: &str, #[case] expected: &str) {
        assert_that!(http_source(base).url(path), eq(expected));
    }

    #[rstest]
    fn translations_url_embeds_language_code() {
        let source = http_source("http://idc.local");

        assert_that!(
            source.translations_url("en-us"),
            eq("http://idc.local/api/i18n/translations/en-us")
        );
    }

    #[tokio::test]
    async fn unreachable_backend_is_a_load_error() {
        // Port 9 (discard) on localhost is closed in test environments.
        let source = http_source("http://127.0.0.1:9");

        let result = source.fetch_translations("en-us").await;

        assert!(matches!(
            result,
            Err(LoadError::Network { .. } | LoadError::Timeout { .. })
        ));
    }

    #[tokio::test]
    async fn static_source_serves_and_records() {
        let source = StaticSource::new().with_language(
            LanguageDescriptor::new("zh-cn", "简体中文"),
            [("Hosts", "主机")].into_iter().collect(),
        );

        let map = source.fetch_translations("zh-cn").await.unwrap();
        let missing = source.fetch_translations("fr-fr").await;

        assert_eq!(map.get("Hosts"), Some("主机"));
        assert!(matches!(missing, Err(LoadError::UnknownLanguage(_))));
        assert_eq!(source.requested(), vec!["zh-cn".to_string(), "fr-fr".to_string()]);
        assert_that!(source.fetch_languages().await.unwrap(), len(eq(1)));
    }

    #[tokio::test]
    async fn offline_static_source_fails() {
        let source = StaticSource::new().offline();

        assert!(source.fetch_languages().await.is_err());
        assert!(source.fetch_translations("zh-cn").await.is_err());
    }
}
