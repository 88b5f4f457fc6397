//! Startup language selection.

/// Language chosen for Chinese locales.
pub const CHINESE: &str = "zh-cn";
/// Language chosen for English locales.
pub const ENGLISH: &str = "en-us";

/// Maps a locale such as `en-US` or `zh_TW.UTF-8` to a supported language.
#[must_use]
pub fn language_for_locale(locale: &str) -> Option<&'static str> {
    let locale = locale.trim().to_ascii_lowercase();
    if locale.starts_with("zh") {
        Some(CHINESE)
    } else if locale.starts_with("en") {
        Some(ENGLISH)
    } else {
        None
    }
}

/// Language to load at startup: the saved choice, else the locale heuristic,
/// else `fallback`.
#[must_use]
pub fn determine_startup_language(
    persisted: Option<&str>,
    locale: Option<&str>,
    fallback: &str,
) -> String {
    if let Some(code) = persisted.map(str::trim).filter(|code| !code.is_empty()) {
        tracing::debug!(language = code, "Using saved language");
        return code.to_string();
    }
    if let Some(code) = locale.and_then(language_for_locale) {
        tracing::debug!(language = code, locale, "Using locale language");
        return code.to_string();
    }
    tracing::debug!(language = fallback, "Using fallback language");
    fallback.to_string()
}

/// Locale of the current process from `LC_ALL`, `LC_MESSAGES`, `LANGUAGE`
/// or `LANG`, normalized to `ll-CC` (`en_US.UTF-8` becomes `en-US`).
#[must_use]
pub fn system_locale() -> Option<String> {
    ["LC_ALL", "LC_MESSAGES", "LANGUAGE", "LANG"]
        .into_iter()
        .filter_map(|key| std::env::var(key).ok())
        .find_map(|value| normalize_locale(&value))
}

/// Normalizes a POSIX locale value. `C` and `POSIX` carry no language.
#[must_use]
pub fn normalize_locale(value: &str) -> Option<String> {
    // LANGUAGE may hold a priority list such as "zh_CN:en_US".
    let first = value.split(':').next().unwrap_or_default();
    let tag = first.split(['.', '@']).next().unwrap_or_default().trim();
    if tag.is_empty() || tag.eq_ignore_ascii_case("c") || tag.eq_ignore_ascii_case("posix") {
        return None;
    }
    Some(tag.replace('_', "-"))
}
