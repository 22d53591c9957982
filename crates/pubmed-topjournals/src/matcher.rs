//! Resolve PubMed journal names against the metrics table.
//!
//! Matching is exact on the normalized key: canonical name first, then
//! declared aliases. There is no fuzzy or edit-distance step, so a badge is
//! only attached when the name is an identity or declared-alias match.

use serde::Serialize;

use crate::metrics::{MetricsIndex, normalize_journal_name};
use crate::models::JournalMetricEntry;

/// Which map produced a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum MatchKind {
    Canonical,
    Alias,
}

/// A matched entry, borrowed from the index it came from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct JournalMatch<'a> {
    pub entry: &'a JournalMetricEntry,
    pub kind: MatchKind,
}

/// Stateless journal name resolver.
#[derive(Debug, Clone, Copy, Default)]
pub struct JournalMatcher;

impl JournalMatcher {
    /// Resolve `raw_name` against `index`. First hit wins:
    /// 1. canonical name
    /// 2. alias
    #[must_use]
    pub fn resolve<'a>(raw_name: &str, index: &'a MetricsIndex) -> Option<JournalMatch<'a>> {
        let key = normalize_journal_name(raw_name);
        if key.is_empty() {
            return None;
        }

        if let Some(entry) = index.by_canonical_key(&key) {
            return Some(JournalMatch { entry, kind: MatchKind::Canonical });
        }

        index.by_alias_key(&key).map(|entry| JournalMatch { entry, kind: MatchKind::Alias })
    }
}
