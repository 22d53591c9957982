//! Journal metric entries from the reference table.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// JIF quartile within a subject category (Q1 best).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Quartile {
    Q1,
    Q2,
    Q3,
    Q4,
}

impl Quartile {
    /// Numeric rank, 1 for Q1 through 4 for Q4.
    #[must_use]
    pub const fn rank(self) -> u8 {
        match self {
            Self::Q1 => 1,
            Self::Q2 => 2,
            Self::Q3 => 3,
            Self::Q4 => 4,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Q1 => "Q1",
            Self::Q2 => "Q2",
            Self::Q3 => "Q3",
            Self::Q4 => "Q4",
        }
    }
}

impl fmt::Display for Quartile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Quartile {
    type Err = String;

    /// Accepts `Q1`..`Q4` in any case, or a bare `1`..`4`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed
            .strip_prefix('Q')
            .or_else(|| trimmed.strip_prefix('q'))
            .unwrap_or(trimmed);

        match digits {
            "1" => Ok(Self::Q1),
            "2" => Ok(Self::Q2),
            "3" => Ok(Self::Q3),
            "4" => Ok(Self::Q4),
            _ => Err(format!("unknown quartile '{s}'")),
        }
    }
}

/// One journal in the metrics table. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JournalMetricEntry {
    /// Canonical journal name (unique within the table).
    pub name: String,

    /// Alternate names, typically ISO abbreviations.
    pub aliases: Vec<String>,

    /// Subject category.
    pub category: String,

    /// JIF quartile, when known.
    pub quartile: Option<Quartile>,

    /// Journal Impact Factor, when known.
    pub jif: Option<f64>,
}

impl JournalMetricEntry {
    /// Compare impact factors with absent treated as lowest.
    #[must_use]
    pub fn cmp_jif(a: Option<f64>, b: Option<f64>) -> Ordering {
        match (a, b) {
            (Some(x), Some(y)) => x.total_cmp(&y),
            (Some(_), None) => Ordering::Greater,
            (None, Some(_)) => Ordering::Less,
            (None, None) => Ordering::Equal,
        }
    }
}

/// Entry as it appears in the JSON reference file, before validation.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawJournalEntry {
    pub name: String,

    #[serde(default)]
    pub aliases: Vec<String>,

    #[serde(default)]
    pub category: Option<String>,

    #[serde(default)]
    pub quartile: Option<String>,

    #[serde(default)]
    pub jif: Option<f64>,
}

impl RawJournalEntry {
    /// Validate field values and build the immutable entry.
    pub(crate) fn into_entry(self) -> Result<JournalMetricEntry, String> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err("journal name is empty".to_string());
        }

        let quartile = self.quartile.as_deref().map(str::parse::<Quartile>).transpose()?;

        if let Some(jif) = self.jif {
            if !jif.is_finite() || jif < 0.0 {
                return Err(format!("JIF must be a non-negative number, got {jif}"));
            }
        }

        let aliases = self
            .aliases
            .into_iter()
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty())
            .collect();

        Ok(JournalMetricEntry {
            name,
            aliases,
            category: self.category.unwrap_or_else(|| "Unknown".to_string()),
            quartile,
            jif: self.jif,
        })
    }
}
