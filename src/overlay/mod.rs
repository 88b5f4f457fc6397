//! Page bootstrap and the functions offered to the host page.
/// Language picker and display
pub mod picker;

use crate::config::OverlaySettings;
use crate::dom::{
    Document,
    NodeId,
};
use crate::loader::{
    FetchedTranslations,
    LoadError,
    TranslationLoader,
    TranslationSource,
    determine_startup_language,
};
use crate::phrase::translate_phrase;
use crate::storage::PreferenceStorage;
use crate::store::LanguageStore;
use crate::walker::{
    SkipPolicy,
    WalkStats,
    Walker,
};
use crate::watcher::{
    MutationWatcher,
    WatchStats,
};

/// Result of loading a language.
#[derive(Debug)]
pub enum LoadOutcome {
    /// The language is active and the page was translated.
    Committed { code: String, stats: WalkStats },
    /// A later request superseded this one; nothing changed.
    Stale { code: String },
    /// The fetch failed; nothing changed.
    Failed { code: String, error: LoadError },
}

impl LoadOutcome {
    #[must_use]
    pub const fn is_committed(&self) -> bool {
        matches!(self, Self::Committed { .. })
    }

    /// Requested language code.
    #[must_use]
    pub fn code(&self) -> &str {
        match self {
            Self::Committed { code, .. } | Self::Stale { code } | Self::Failed { code, .. } => code,
        }
    }
}

/// Translation state of one page.
///
/// Owns the language store, loader, walker and mutation watcher. The
/// document is borrowed per call, so the host keeps ownership of the page.
/// Nothing here returns an error to the host: failures are logged and the
/// page stays in whatever language it last showed.
#[derive(Debug)]
pub struct TranslationOverlay {
    /// Active language and map.
    store: LanguageStore,
    /// Backend access.
    loader: TranslationLoader,
    /// Text substitution and shadow map.
    walker: Walker,
    /// Attached by [`Self::bootstrap`].
    watcher: Option<MutationWatcher>,
    /// Round limit handed to the watcher.
    max_rounds: usize,
    /// Used when neither a saved choice nor the locale names a language.
    fallback_language: String,
    /// Locale consulted at startup, e.g. `en-US`.
    locale: Option<String>,
    /// Language forced at startup, bypassing the saved choice.
    startup_language: Option<String>,
}

impl TranslationOverlay {
    #[must_use]
    pub fn new(
        settings: &OverlaySettings,
        source: Box<dyn TranslationSource>,
        storage: Box<dyn PreferenceStorage>,
    ) -> Self {
        Self {
            store: LanguageStore::new(
                storage,
                settings.storage.key.as_str(),
                settings.fallback_language.as_str(),
            ),
            loader: TranslationLoader::new(source),
            walker: Walker::new(SkipPolicy::from_config(&settings.skip)),
            watcher: None,
            max_rounds: settings.watcher.max_rounds,
            fallback_language: settings.fallback_language.clone(),
            locale: None,
            startup_language: None,
        }
    }

    /// Sets the locale used when no language was saved.
    #[must_use]
    pub fn with_locale(mut self, locale: Option<String>) -> Self {
        self.locale = locale;
        self
    }

    /// Forces the startup language.
    #[must_use]
    pub fn with_startup_language(mut self, code: impl Into<String>) -> Self {
        self.startup_language = Some(code.into());
        self
    }

    #[must_use]
    pub const fn store(&self) -> &LanguageStore {
        &self.store
    }

    #[must_use]
    pub const fn walker(&self) -> &Walker {
        &self.walker
    }

    #[must_use]
    pub fn current_language(&self) -> &str {
        self.store.current_language()
    }

    /// Whether the mutation watcher is attached to `doc`.
    #[must_use]
    pub fn is_watching(&self, doc: &Document) -> bool {
        self.watcher.as_ref().is_some_and(|watcher| watcher.is_connected(doc))
    }

    /// Language to load at startup.
    #[must_use]
    pub fn startup_language(&self) -> String {
        if let Some(code) = &self.startup_language {
            return code.clone();
        }
        determine_startup_language(
            self.store.persisted_language().as_deref(),
            self.locale.as_deref(),
            &self.fallback_language,
        )
    }

    /// Loads the language list and the startup language, translates the
    /// page, then starts watching it.
    ///
    /// Content inserted before this returns is covered by the full pass;
    /// content inserted afterwards is picked up by [`Self::pump`].
    pub async fn bootstrap(&mut self, doc: &mut Document) -> LoadOutcome {
        self.loader.load_available_languages(&mut self.store).await;
        self.refresh_picker(doc);

        let code = self.startup_language();
        tracing::info!(language = code, "Starting translation overlay");
        let outcome = self.load_translations(doc, &code).await;

        if let Some(previous) = self.watcher.take() {
            previous.disconnect(doc);
        }
        self.watcher = Some(MutationWatcher::attach(doc, self.max_rounds));
        outcome
    }

    /// Fetches `code` and, unless superseded or failed, applies it.
    pub async fn load_translations(&mut self, doc: &mut Document, code: &str) -> LoadOutcome {
        match self.fetch(code).await {
            Ok(fetched) => self.apply(doc, fetched),
            Err(error) => {
                tracing::warn!(language = code, %error, "Failed to load translations");
                LoadOutcome::Failed { code: code.to_string(), error }
            }
        }
    }

    /// Language switch requested by the host page.
    pub async fn switch_language(&mut self, doc: &mut Document, code: &str) -> LoadOutcome {
        if !self.store.available_languages().is_empty() && self.store.language(code).is_none() {
            tracing::warn!(language = code, "Switching to a language the backend did not list");
        }
        self.load_translations(doc, code).await
    }

    /// First half of a switch: fetches `code` without touching any state.
    ///
    /// Several fetches may be in flight at once; only the most recently
    /// started one can be applied.
    pub async fn fetch(&self, code: &str) -> Result<FetchedTranslations, LoadError> {
        self.loader.fetch_translations(code).await
    }

    /// Second half of a switch: commits `fetched`, puts the page back to its
    /// source text, translates it with the new map and refreshes the picker.
    pub fn apply(&mut self, doc: &mut Document, fetched: FetchedTranslations) -> LoadOutcome {
        let code = fetched.code().to_string();
        if !self.loader.commit(&mut self.store, fetched) {
            return LoadOutcome::Stale { code };
        }

        self.walker.restore_originals(doc);
        let stats = self.retranslate_page(doc);
        self.refresh_display(doc);
        self.refresh_picker(doc);
        self.pump(doc);
        tracing::info!(
            language = code,
            substituted = stats.substituted,
            attributes = stats.attributes,
            "Page translated"
        );
        LoadOutcome::Committed { code, stats }
    }

    /// Runs a full pass over the page body with the current map.
    pub fn retranslate_page(&mut self, doc: &mut Document) -> WalkStats {
        let body = doc.body();
        self.walker.translate_element(doc, body, self.store.translations())
    }

    /// Translates content inserted or rewritten since the last call and
    /// frees removed content.
    pub fn pump(&mut self, doc: &mut Document) -> WatchStats {
        match &self.watcher {
            Some(watcher) => watcher.process(doc, &mut self.walker, self.store.translations()),
            None => WatchStats { reclaimed: doc.reclaim(), ..WatchStats::default() },
        }
    }

    /// Best translation of `key` under the active map, else `default`, else
    /// `key`.
    #[must_use]
    pub fn translate(&self, key: &str, default: Option<&str>, partial: bool) -> String {
        translate_phrase(key, default, partial, self.store.translations())
    }

    /// Handles a click on `node`. A language entry switches language and
    /// closes the dropdown; the switcher toggles the dropdown.
    pub async fn activate(&mut self, doc: &mut Document, node: NodeId) -> Option<LoadOutcome> {
        if let Some(code) = picker::option_language(doc, node) {
            self.set_dropdown(doc, false);
            return Some(self.switch_language(doc, &code).await);
        }
        if picker::is_switcher(doc, node) {
            let open = !picker::is_dropdown_open(doc);
            self.set_dropdown(doc, open);
        }
        None
    }

    /// Opens or closes the dropdown, logging failures.
    fn set_dropdown(&self, doc: &mut Document, open: bool) {
        if let Err(error) = picker::set_dropdown_open(doc, open) {
            tracing::warn!(%error, "Failed to toggle language dropdown");
        }
    }

    /// Redraws the picker if the store flagged it.
    fn refresh_picker(&mut self, doc: &mut Document) {
        if !self.store.take_picker_refresh() {
            return;
        }
        let marker = self.walker.policy().marker_attribute();
        if let Err(error) = picker::render_picker(
            doc,
            self.store.available_languages(),
            self.store.current_language(),
            marker,
        ) {
            tracing::warn!(%error, "Failed to render language picker");
        }
    }

    /// Shows the native name of the active language.
    fn refresh_display(&self, doc: &mut Document) {
        let code = self.store.current_language();
        let label = self.store.language(code).map_or(code, |language| language.native.as_str());
        let marker = self.walker.policy().marker_attribute();
        if let Err(error) = picker::render_display(doc, label, marker) {
            tracing::warn!(%error, "Failed to render current language");
        }
    }
}
