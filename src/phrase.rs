//! Phrase lookup: exact match, longest-first partial substitution and the
//! helpers shared by the walker.

use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;

use crate::store::TranslationMap;

/// Text made only of numerals, punctuation, symbols and whitespace.
#[allow(clippy::expect_used)]
static UNTRANSLATABLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[\p{N}\p{P}\p{S}\s]+$").expect("literal pattern compiles")
});

/// Whether trimmed text should never be looked up.
#[must_use]
pub fn is_untranslatable(trimmed: &str) -> bool {
    trimmed.is_empty() || UNTRANSLATABLE.is_match(trimmed)
}

/// Splits `value` into leading whitespace, core text and trailing whitespace.
///
/// ```
/// use openidcs_i18n::phrase::split_whitespace_edges;
///
/// assert_eq!(split_whitespace_edges("  Hello \n"), ("  ", "Hello", " \n"));
/// assert_eq!(split_whitespace_edges("   "), ("   ", "", ""));
/// ```
#[must_use]
pub fn split_whitespace_edges(value: &str) -> (&str, &str, &str) {
    let without_leading = value.trim_start();
    let leading = value.len() - without_leading.len();
    let core = without_leading.trim_end();
    let (head, rest) = value.split_at(leading);
    let (core, tail) = rest.split_at(core.len());
    (head, core, tail)
}

/// Substitutes every known phrase occurring inside `text`.
///
/// Candidates are tried longest first. An occurrence intersecting text that
/// was already substituted in this call is left alone, so a shorter key never
/// splits a longer phrase or re-translates a translation. Returns `None` when
/// nothing changed.
///
/// ```
/// use openidcs_i18n::phrase::find_partial_translation;
/// use openidcs_i18n::store::TranslationMap;
///
/// let map: TranslationMap = [("log in", "登录"), ("log", "日志")].into_iter().collect();
/// assert_eq!(find_partial_translation("Please log in now", &map).as_deref(), Some("Please 登录 now"));
/// assert_eq!(find_partial_translation("nothing here", &map), None);
/// ```
#[must_use]
pub fn find_partial_translation(text: &str, map: &TranslationMap) -> Option<String> {
    let mut working = text.to_string();
    // Byte ranges of substituted text within `working`.
    let mut substituted: Vec<Range<usize>> = Vec::new();

    for key in map.partial_candidates() {
        let Some(translation) = map.get(key) else {
            continue;
        };
        let step = key.chars().next().map_or(1, char::len_utf8);
        let mut from = 0;

        while let Some(offset) = working.get(from..).and_then(|rest| rest.find(key.as_str())) {
            let start = from + offset;
            let end = start + key.len();

            if substituted.iter().any(|range| start < range.end && range.start < end) {
                from = start + step;
                continue;
            }

            working.replace_range(start..end, translation);
            let new_end = start + translation.len();
            for range in &mut substituted {
                if range.start >= end {
                    range.start = range.start - end + new_end;
                    range.end = range.end - end + new_end;
                }
            }
            substituted.push(start..new_end);
            from = new_end;
        }
    }

    (working != text).then_some(working)
}

/// Best translation for `key`: the exact entry, a partial substitution when
/// `partial` is set, then `default`, then the key itself.
#[must_use]
pub fn translate_phrase(
    key: &str,
    default: Option<&str>,
    partial: bool,
    map: &TranslationMap,
) -> String {
    if let Some(translation) = map.get(key) {
        return translation.to_string();
    }
    if partial && let Some(translation) = find_partial_translation(key, map) {
        return translation;
    }
    default.unwrap_or(key).to_string()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use googletest::prelude::*;
    use rstest::*;

    use super::*;

    fn login_map() -> TranslationMap {
        [("log in", "登录"), ("log", "日志")].into_iter().collect()
    }

    #[rstest]
    #[case("123")]
    #[case("---")]
    #[case("12:30")]
    #[case("$ 1,024.00")]
    #[case("（）")]
    #[case("")]
    fn untranslatable_text(#[case] text: &str) {
        assert_that!(is_untranslatable(text), eq(true));
    }

    #[rstest]
    #[case("Hosts")]
    #[case("主机")]
    #[case("VM 1")]
    fn translatable_text(#[case] text: &str) {
        assert_that!(is_untranslatable(text), eq(false));
    }

    #[rstest]
    #[case("  Hello  ", ("  ", "Hello", "  "))]
    #[case("Hello", ("", "Hello", ""))]
    #[case("\n\tTwo words ", ("\n\t", "Two words", " "))]
    #[case("", ("", "", ""))]
    fn split_edges(#[case] value: &str, #[case] expected: (&str, &str, &str)) {
        assert_eq!(split_whitespace_edges(value), expected);
    }

    #[rstest]
    fn longest_match_wins() {
        let result = find_partial_translation("Please log in now", &login_map());

        assert_eq!(result.as_deref(), Some("Please 登录 now"));
    }

    #[rstest]
    fn non_overlapping_occurrences_are_each_substituted() {
        let result = find_partial_translation("log in to view logs", &login_map());

        assert_eq!(result.as_deref(), Some("登录 to view 日志s"));
    }

    #[rstest]
    fn repeated_phrase_is_substituted_everywhere() {
        let map: TranslationMap = [("Start", "启动")].into_iter().collect();

        let result = find_partial_translation("Start, then Start again", &map);

        assert_eq!(result.as_deref(), Some("启动, then 启动 again"));
    }

    #[rstest]
    fn translation_is_not_resplit_by_shorter_key() {
        // "Delete VM" becomes "删除 VM"; "VM host" must not reach into it.
        let map: TranslationMap =
            [("Delete VM", "删除 VM"), ("VM host", "宿主机")].into_iter().collect();

        let result = find_partial_translation("Delete VM host", &map);

        assert_eq!(result.as_deref(), Some("删除 VM host"));
    }

    #[rstest]
    fn ranges_shift_after_earlier_substitution() {
        let map: TranslationMap =
            [("virtual machine", "VM"), ("machine", "机器")].into_iter().collect();

        let result = find_partial_translation("machine, virtual machine, machine", &map);

        assert_eq!(result.as_deref(), Some("机器, VM, 机器"));
    }

    #[rstest]
    fn short_keys_are_ignored() {
        let map: TranslationMap = [("OK", "确定")].into_iter().collect();

        assert_eq!(find_partial_translation("Click OK", &map), None);
    }

    #[rstest]
    fn identity_translation_reports_no_change() {
        let map: TranslationMap = [("Admin", "Admin")].into_iter().collect();

        assert_eq!(find_partial_translation("Admin panel", &map), None);
    }

    #[rstest]
    fn partial_is_idempotent_on_its_output() {
        let map = login_map();
        let once = find_partial_translation("log in to view logs", &map).unwrap();

        assert_eq!(find_partial_translation(&once, &map), None);
    }

    #[rstest]
    #[case("log in", None, false, "登录")]
    #[case("Please log in", None, false, "Please log in")]
    #[case("Please log in", None, true, "Please 登录")]
    #[case("missing", Some("fallback"), true, "fallback")]
    #[case("missing", None, true, "missing")]
    fn translate_phrase_fallbacks(
        #[case] key: &str,
        #[case] default: Option<&str>,
        #[case] partial: bool,
        #[case] expected: &str,
    ) {
        assert_that!(translate_phrase(key, default, partial, &login_map()), eq(expected));
    }
}
