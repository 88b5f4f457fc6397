//! Keeps content inserted after the initial pass translated.

use crate::dom::{
    Document,
    MutationRecord,
    NodeId,
    ObserverId,
};
use crate::store::TranslationMap;
use crate::walker::{
    WalkStats,
    Walker,
};

/// Result of one [`MutationWatcher::process`] call.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct WatchStats {
    /// Record batches drained.
    pub rounds: usize,
    /// Records handled.
    pub records: usize,
    /// Records discarded after the round limit was hit.
    pub dropped: usize,
    /// Changes made by the walker.
    pub walk: WalkStats,
    /// Removed nodes freed after the records were handled.
    pub reclaimed: usize,
}

/// The single mutation observer of a document.
///
/// Every record produced while processing (including the watcher's own
/// substitutions) is drained in the same call, up to `max_rounds` batches.
/// Idempotent maps settle after one extra round.
#[derive(Debug)]
pub struct MutationWatcher {
    /// Identity on the document.
    observer: ObserverId,
    /// Batches drained per call at most.
    max_rounds: usize,
}

impl MutationWatcher {
    /// Starts observing `doc`, disconnecting any watcher attached before.
    pub fn attach(doc: &mut Document, max_rounds: usize) -> Self {
        let observer = doc.observe();
        tracing::debug!(max_rounds, "Mutation watcher attached");
        Self { observer, max_rounds: max_rounds.max(1) }
    }

    /// Whether this watcher is still the document's observer.
    #[must_use]
    pub fn is_connected(&self, doc: &Document) -> bool {
        doc.observer() == Some(self.observer)
    }

    pub fn disconnect(&self, doc: &mut Document) {
        doc.disconnect(self.observer);
    }

    /// Translates what was inserted or rewritten since the last call, then
    /// frees the subtrees the page removed.
    pub fn process(
        &self,
        doc: &mut Document,
        walker: &mut Walker,
        map: &TranslationMap,
    ) -> WatchStats {
        let mut stats = WatchStats::default();
        loop {
            let records = doc.take_records(self.observer);
            if records.is_empty() {
                break;
            }
            if stats.rounds == self.max_rounds {
                stats.dropped = records.len();
                tracing::warn!(
                    rounds = stats.rounds,
                    dropped = stats.dropped,
                    "Mutations keep coming back; translation map is not idempotent"
                );
                break;
            }
            stats.rounds += 1;
            stats.records += records.len();
            for record in records {
                handle_record(doc, walker, map, record, &mut stats.walk);
            }
        }
        stats.reclaimed = doc.reclaim();
        stats
    }
}

/// Dispatches one record to the walker.
fn handle_record(
    doc: &mut Document,
    walker: &mut Walker,
    map: &TranslationMap,
    record: MutationRecord,
    stats: &mut WalkStats,
) {
    match record {
        MutationRecord::ChildList { added, removed, .. } => {
            for node in removed {
                // Moved nodes show up as removed and added again.
                if !doc.is_connected(node) {
                    walker.forget(doc, node);
                }
            }
            for node in added {
                translate_inserted(doc, walker, map, node, stats);
            }
        }
        MutationRecord::CharacterData { target, .. } => {
            if doc.is_connected(target) && walker.translate_text_node(doc, target, map) {
                stats.substituted += 1;
            }
        }
    }
}

/// Translates a node inserted by the page, if it is still attached.
fn translate_inserted(
    doc: &mut Document,
    walker: &mut Walker,
    map: &TranslationMap,
    node: NodeId,
    stats: &mut WalkStats,
) {
    if !doc.is_connected(node) {
        return;
    }
    if doc.is_element(node) {
        *stats += walker.translate_element(doc, node, map);
    } else if walker.translate_text_node(doc, node, map) {
        stats.text_nodes += 1;
        stats.substituted += 1;
    }
}
