//! Enumeration types for search criteria and output.

use serde::{Deserialize, Serialize};

/// Output format for rendered results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ResponseFormat {
    /// Human-readable Markdown format.
    #[default]
    Markdown,
    /// Machine-readable JSON format.
    Json,
}

impl ResponseFormat {
    /// Check if this is markdown format.
    #[must_use]
    pub const fn is_markdown(self) -> bool {
        matches!(self, Self::Markdown)
    }

    /// Check if this is JSON format.
    #[must_use]
    pub const fn is_json(self) -> bool {
        matches!(self, Self::Json)
    }
}

/// Publication type restriction applied at discovery time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ArticleType {
    /// No restriction.
    #[default]
    Any,
    /// Regular journal articles.
    ResearchArticle,
    /// Randomized controlled trials.
    #[serde(alias = "rct")]
    #[value(alias = "rct")]
    RandomizedControlledTrial,
    /// Meta-analyses.
    MetaAnalysis,
    /// Systematic reviews.
    SystematicReview,
    /// Clinical trials of any phase.
    ClinicalTrial,
    /// Narrative reviews.
    Review,
}

impl ArticleType {
    /// PubMed publication type name, or `None` for [`ArticleType::Any`].
    #[must_use]
    pub const fn publication_type(self) -> Option<&'static str> {
        match self {
            Self::Any => None,
            Self::ResearchArticle => Some("Journal Article"),
            Self::RandomizedControlledTrial => Some("Randomized Controlled Trial"),
            Self::MetaAnalysis => Some("Meta-Analysis"),
            Self::SystematicReview => Some("Systematic Review"),
            Self::ClinicalTrial => Some("Clinical Trial"),
            Self::Review => Some("Review"),
        }
    }
}

/// Which journals survive the journal filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum JournalMode {
    /// Only articles whose journal is in the metrics table.
    #[default]
    #[serde(alias = "top-only")]
    TopJournals,
    /// Every article; unmatched ones simply carry no badges.
    AllJournals,
}

impl JournalMode {
    /// Label used in the summary line.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::TopJournals => "Top journals",
            Self::AllJournals => "All journals",
        }
    }

    /// Check if unmatched articles are dropped.
    #[must_use]
    pub const fn requires_match(self) -> bool {
        matches!(self, Self::TopJournals)
    }
}

impl std::fmt::Display for JournalMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Result ordering policy.
///
/// Every mode breaks ties by the remote relevance order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum SortMode {
    /// Keep the order returned by PubMed.
    #[default]
    Relevance,
    /// Highest impact factor first, unmatched last.
    JifDesc,
    /// Lowest impact factor first, unmatched first.
    JifAsc,
    /// Q1 first, unmatched last.
    QuartileAsc,
    /// Q4 first, unmatched last.
    QuartileDesc,
}
