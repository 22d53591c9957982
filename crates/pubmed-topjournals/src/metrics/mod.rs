//! Journal metrics reference table.
//!
//! Loaded once at startup into an immutable [`MetricsIndex`] that is shared
//! read-only (behind an `Arc`) by every pipeline run. Lookups go through two
//! hash maps keyed by [`normalize_journal_name`]:
//! - canonical name → entry
//! - alias → entry (first claim wins under the default policy)

mod normalize;

pub use normalize::normalize_journal_name;

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::config::metrics::DEFAULT_PATHS;
use crate::error::DataLoadError;
use crate::models::{JournalMetricEntry, RawJournalEntry};

/// What to do when two entries claim the same alias.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AliasCollisionPolicy {
    /// Keep the earliest claim and record the conflict.
    #[default]
    FirstWins,
    /// Fail the load.
    Reject,
}

/// A conflicting alias claim that was ignored at load time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AliasCollision {
    /// Normalized alias key.
    pub alias: String,
    /// Canonical name of the entry that keeps the alias.
    pub kept: String,
    /// Canonical name of the entry whose claim was ignored.
    pub ignored: String,
}

/// Immutable lookup table of journal metrics.
#[derive(Debug, Clone, Default)]
pub struct MetricsIndex {
    entries: Vec<JournalMetricEntry>,
    by_name: HashMap<String, usize>,
    by_alias: HashMap<String, usize>,
    collisions: Vec<AliasCollision>,
}

impl MetricsIndex {
    /// An index with no journals (degraded mode).
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Resolve the reference file location.
    ///
    /// An explicit path must exist; otherwise the first existing default
    /// candidate is used.
    pub fn locate(explicit: Option<&Path>) -> Result<PathBuf, DataLoadError> {
        let candidates: Vec<PathBuf> = match explicit {
            Some(path) => vec![path.to_path_buf()],
            None => DEFAULT_PATHS.iter().map(PathBuf::from).collect(),
        };

        candidates.iter().find(|p| p.is_file()).cloned().ok_or_else(|| DataLoadError::NotFound {
            candidates: candidates.iter().map(|p| p.display().to_string()).collect(),
        })
    }

    /// Load and index the reference table at `path`.
    pub fn load(
        path: impl AsRef<Path>,
        policy: AliasCollisionPolicy,
    ) -> Result<Self, DataLoadError> {
        let path = path.as_ref();
        let label = path.display().to_string();

        let json = std::fs::read_to_string(path)
            .map_err(|source| DataLoadError::Io { path: label.clone(), source })?;

        let index = Self::parse(&json, &label, policy)?;
        tracing::info!(
            path = %label,
            journals = index.len(),
            aliases = index.by_alias.len(),
            collisions = index.collisions.len(),
            "Loaded journal metrics"
        );
        Ok(index)
    }

    /// Build an index from an in-memory JSON array.
    pub fn from_json_str(json: &str, policy: AliasCollisionPolicy) -> Result<Self, DataLoadError> {
        Self::parse(json, "<inline>", policy)
    }

    fn parse(json: &str, label: &str, policy: AliasCollisionPolicy) -> Result<Self, DataLoadError> {
        let raw: Vec<RawJournalEntry> = serde_json::from_str(json)
            .map_err(|source| DataLoadError::Parse { path: label.to_string(), source })?;

        let entries = raw
            .into_iter()
            .enumerate()
            .map(|(index, entry)| {
                entry.into_entry().map_err(|message| DataLoadError::InvalidEntry { index, message })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Self::from_entries(entries, policy)
    }

    /// Index already-validated entries.
    pub fn from_entries(
        entries: Vec<JournalMetricEntry>,
        policy: AliasCollisionPolicy,
    ) -> Result<Self, DataLoadError> {
        let mut by_name = HashMap::with_capacity(entries.len());

        for (i, entry) in entries.iter().enumerate() {
            let key = normalize_journal_name(&entry.name);
            if key.is_empty() {
                return Err(DataLoadError::InvalidEntry {
                    index: i,
                    message: format!("journal name '{}' has no letters or digits", entry.name),
                });
            }
            match by_name.entry(key) {
                Entry::Occupied(existing) => {
                    return Err(DataLoadError::DuplicateName {
                        name: entry.name.clone(),
                        first: *existing.get(),
                        second: i,
                    });
                }
                Entry::Vacant(slot) => {
                    slot.insert(i);
                }
            }
        }

        let mut by_alias: HashMap<String, usize> = HashMap::new();
        let mut collisions = Vec::new();

        for (i, entry) in entries.iter().enumerate() {
            for alias in &entry.aliases {
                let key = normalize_journal_name(alias);
                if key.is_empty() {
                    continue;
                }

                // Canonical names always win over aliases.
                let owner = by_name.get(&key).or_else(|| by_alias.get(&key)).copied();
                match owner {
                    Some(owner) if owner == i => {}
                    Some(owner) => {
                        let collision = AliasCollision {
                            alias: key,
                            kept: entries[owner].name.clone(),
                            ignored: entry.name.clone(),
                        };
                        if policy == AliasCollisionPolicy::Reject {
                            return Err(DataLoadError::AliasCollision {
                                alias: collision.alias,
                                kept: collision.kept,
                                rejected: collision.ignored,
                            });
                        }
                        tracing::debug!(
                            alias = %collision.alias,
                            kept = %collision.kept,
                            ignored = %collision.ignored,
                            "Alias collision, keeping first claim"
                        );
                        collisions.push(collision);
                    }
                    None => {
                        by_alias.insert(key, i);
                    }
                }
            }
        }

        if !collisions.is_empty() {
            tracing::warn!(count = collisions.len(), "Journal aliases claimed by more than one entry");
        }

        Ok(Self { entries, by_name, by_alias, collisions })
    }

    /// Look up a journal by canonical name or alias.
    ///
    /// Case-, punctuation- and whitespace-insensitive.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<&JournalMetricEntry> {
        let key = normalize_journal_name(name);
        self.by_canonical_key(&key).or_else(|| self.by_alias_key(&key))
    }

    /// Entry whose normalized canonical name equals `key`.
    #[must_use]
    pub fn by_canonical_key(&self, key: &str) -> Option<&JournalMetricEntry> {
        self.by_name.get(key).map(|&i| &self.entries[i])
    }

    /// Entry that owns the normalized alias `key`.
    #[must_use]
    pub fn by_alias_key(&self, key: &str) -> Option<&JournalMetricEntry> {
        self.by_alias.get(key).map(|&i| &self.entries[i])
    }

    /// All entries in load order.
    #[must_use]
    pub fn entries(&self) -> &[JournalMetricEntry] {
        &self.entries
    }

    /// Alias conflicts ignored at load time.
    #[must_use]
    pub fn collisions(&self) -> &[AliasCollision] {
        &self.collisions
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Quartile;

    const SAMPLE: &str = r#"[
        {"name": "Nature", "aliases": ["Nature (Lond)"], "category": "Multidisciplinary", "quartile": "Q1", "jif": 50.1},
        {"name": "The Lancet", "aliases": ["Lancet"], "category": "General Medicine", "quartile": "Q1", "jif": 98.4},
        {"name": "Lancet Oncology", "aliases": ["Lancet Oncol", "Lancet"], "category": "Oncology", "quartile": "Q1", "jif": 35.9}
    ]"#;

    fn sample() -> MetricsIndex {
        MetricsIndex::from_json_str(SAMPLE, AliasCollisionPolicy::FirstWins).unwrap()
    }

    #[test]
    fn test_lookup_by_canonical_name() {
        let index = sample();
        let entry = index.lookup("Nature").unwrap();
        assert_eq!(entry.name, "Nature");
        assert_eq!(entry.quartile, Some(Quartile::Q1));
        assert_eq!(entry.jif, Some(50.1));
    }

    #[test]
    fn test_lookup_is_case_and_whitespace_insensitive() {
        let index = sample();
        let a = index.lookup("Nature").unwrap();
        assert_eq!(index.lookup(" nature "), Some(a));
        assert_eq!(index.lookup("NATURE"), Some(a));
    }

    #[test]
    fn test_lookup_by_alias() {
        let index = sample();
        assert_eq!(index.lookup("lancet oncol.").unwrap().name, "Lancet Oncology");
        assert_eq!(index.lookup("Nature (Lond)").unwrap().name, "Nature");
    }

    #[test]
    fn test_alias_collision_first_wins() {
        let index = sample();
        assert_eq!(index.lookup("Lancet").unwrap().name, "The Lancet");
        assert_eq!(index.collisions().len(), 1);
        assert_eq!(index.collisions()[0].alias, "lancet");
        assert_eq!(index.collisions()[0].kept, "The Lancet");
        assert_eq!(index.collisions()[0].ignored, "Lancet Oncology");
    }

    #[test]
    fn test_alias_collision_reject_policy() {
        let err = MetricsIndex::from_json_str(SAMPLE, AliasCollisionPolicy::Reject).unwrap_err();
        assert!(matches!(err, DataLoadError::AliasCollision { .. }));
    }

    #[test]
    fn test_alias_shadowing_canonical_name_is_recorded() {
        let json = r#"[
            {"name": "Cell", "aliases": []},
            {"name": "Cell Reports", "aliases": ["Cell"]}
        ]"#;
        let index = MetricsIndex::from_json_str(json, AliasCollisionPolicy::FirstWins).unwrap();
        assert_eq!(index.lookup("cell").unwrap().name, "Cell");
        assert_eq!(index.collisions().len(), 1);
    }

    #[test]
    fn test_own_canonical_alias_is_not_a_collision() {
        let json = r#"[{"name": "JAMA", "aliases": ["jama", "J Am Med Assoc"]}]"#;
        let index = MetricsIndex::from_json_str(json, AliasCollisionPolicy::Reject).unwrap();
        assert!(index.collisions().is_empty());
        assert_eq!(index.lookup("J. Am. Med. Assoc.").unwrap().name, "JAMA");
    }

    #[test]
    fn test_duplicate_canonical_names_fail() {
        let json = r#"[{"name": "Nature"}, {"name": "NATURE."}]"#;
        let err = MetricsIndex::from_json_str(json, AliasCollisionPolicy::FirstWins).unwrap_err();
        assert!(matches!(err, DataLoadError::DuplicateName { first: 0, second: 1, .. }));
    }

    #[test]
    fn test_malformed_json_fails() {
        let err = MetricsIndex::from_json_str("{not json", AliasCollisionPolicy::FirstWins)
            .unwrap_err();
        assert!(matches!(err, DataLoadError::Parse { .. }));
    }

    #[test]
    fn test_invalid_entry_reports_index() {
        let json = r#"[{"name": "Fine"}, {"name": "Broken", "jif": -3}]"#;
        let err = MetricsIndex::from_json_str(json, AliasCollisionPolicy::FirstWins).unwrap_err();
        assert!(matches!(err, DataLoadError::InvalidEntry { index: 1, .. }));
    }

    #[test]
    fn test_symbol_only_name_fails() {
        let json = r#"[{"name": "..."}]"#;
        let err = MetricsIndex::from_json_str(json, AliasCollisionPolicy::FirstWins).unwrap_err();
        assert!(matches!(err, DataLoadError::InvalidEntry { index: 0, .. }));
    }

    #[test]
    fn test_unknown_name_is_absent() {
        let index = sample();
        assert!(index.lookup("Unknown Journal X").is_none());
        assert!(index.lookup("").is_none());
        assert!(MetricsIndex::empty().lookup("Nature").is_none());
    }

    #[test]
    fn test_locate_explicit_missing_path() {
        let err = MetricsIndex::locate(Some(Path::new("/definitely/not/here.json"))).unwrap_err();
        assert!(matches!(err, DataLoadError::NotFound { ref candidates } if candidates.len() == 1));
    }
}
