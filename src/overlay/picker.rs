//! Optional language picker and language display.
//!
//! Both are drawn only when the page provides the hosting elements.

use crate::dom::{
    DomError,
    Document,
    NodeId,
};
use crate::store::LanguageDescriptor;

/// Element toggling the dropdown.
pub const SWITCHER_ID: &str = "language-switcher";
/// Container filled with one entry per language.
pub const DROPDOWN_ID: &str = "language-dropdown";
/// Element showing the active language.
pub const DISPLAY_ID: &str = "current-language";
/// Class of every dropdown entry.
pub const OPTION_CLASS: &str = "language-option";
/// Attribute holding an entry's language code.
pub const LANGUAGE_ATTRIBUTE: &str = "data-lang";

/// Class of the entry for the active language.
const ACTIVE_CLASS: &str = "active";
/// Class of the dropdown while it is shown.
const OPEN_CLASS: &str = "open";

/// Fills the dropdown with `languages`. Returns `false` when the page has no
/// dropdown.
pub(super) fn render_picker(
    doc: &mut Document,
    languages: &[LanguageDescriptor],
    current: &str,
    marker: &str,
) -> Result<bool, DomError> {
    let Some(dropdown) = doc.element_by_id(DROPDOWN_ID) else {
        return Ok(false);
    };
    doc.set_attribute(dropdown, marker, "")?;
    doc.clear_children(dropdown)?;

    for language in languages {
        let option = doc.create_element("a");
        let class = if language.code == current {
            format!("{OPTION_CLASS} {ACTIVE_CLASS}")
        } else {
            OPTION_CLASS.to_string()
        };
        doc.set_attribute(option, "class", class)?;
        doc.set_attribute(option, "href", "#")?;
        doc.set_attribute(option, LANGUAGE_ATTRIBUTE, language.code.as_str())?;
        doc.append_text(option, language.native.as_str())?;
        doc.append_child(dropdown, option)?;
    }
    tracing::debug!(languages = languages.len(), "Language picker rendered");
    Ok(true)
}

/// Shows `label` in the language display. Returns `false` when the page has
/// none.
pub(super) fn render_display(
    doc: &mut Document,
    label: &str,
    marker: &str,
) -> Result<bool, DomError> {
    let Some(display) = doc.element_by_id(DISPLAY_ID) else {
        return Ok(false);
    };
    doc.set_attribute(display, marker, "")?;
    if doc.text_content(display) == label {
        return Ok(true);
    }
    doc.clear_children(display)?;
    doc.append_text(display, label)?;
    Ok(true)
}

/// Language code of the dropdown entry containing `node`.
pub(super) fn option_language(doc: &Document, node: NodeId) -> Option<String> {
    std::iter::once(node)
        .chain(doc.ancestors(node))
        .find(|id| doc.has_class(*id, OPTION_CLASS))
        .and_then(|option| doc.attribute(option, LANGUAGE_ATTRIBUTE))
        .map(str::to_string)
}

/// Whether `node` is the switcher or inside it.
pub(super) fn is_switcher(doc: &Document, node: NodeId) -> bool {
    std::iter::once(node)
        .chain(doc.ancestors(node))
        .any(|id| doc.attribute(id, "id") == Some(SWITCHER_ID))
}

/// Shows or hides the dropdown. Returns whether it is now open.
pub(super) fn set_dropdown_open(doc: &mut Document, open: bool) -> Result<bool, DomError> {
    let Some(dropdown) = doc.element_by_id(DROPDOWN_ID) else {
        return Ok(false);
    };
    let classes: Vec<String> = doc
        .element(dropdown)
        .map(|element| {
            element.classes().filter(|class| *class != OPEN_CLASS).map(str::to_string).collect()
        })
        .unwrap_or_default();
    let mut classes = classes.join(" ");
    if open {
        if !classes.is_empty() {
            classes.push(' ');
        }
        classes.push_str(OPEN_CLASS);
    }
    doc.set_attribute(dropdown, "class", classes)?;
    if let Some(switcher) = doc.element_by_id(SWITCHER_ID) {
        doc.set_attribute(switcher, "aria-expanded", if open { "true" } else { "false" })?;
    }
    Ok(open)
}

/// Whether the dropdown is currently shown.
pub(super) fn is_dropdown_open(doc: &Document) -> bool {
    doc.element_by_id(DROPDOWN_ID).is_some_and(|dropdown| doc.has_class(dropdown, OPEN_CLASS))
}
