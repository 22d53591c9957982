//! Search criteria collected from the caller.

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use super::{ArticleType, JournalMode, SortMode};
use crate::error::PipelineError;

/// Allowed publication window in years.
pub const YEARS_BACK_RANGE: RangeInclusive<u32> = 1..=15;

/// Allowed number of identifiers requested from discovery.
pub const MAX_RESULTS_RANGE: RangeInclusive<u32> = 10..=100;

/// One search request. Constructed per request and never mutated by the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchCriteria {
    /// Free-text PubMed query (e.g., "GLP-1 obesity meta-analysis").
    pub query: String,

    /// Publication type restriction.
    #[serde(default)]
    pub article_type: ArticleType,

    /// Restrict to human studies.
    #[serde(default = "default_humans_only")]
    pub humans_only: bool,

    /// Restrict to articles with free full text.
    #[serde(default)]
    pub open_access_only: bool,

    /// Publication window, counted back from today.
    #[serde(default = "default_years_back")]
    pub years_back: u32,

    /// Maximum identifiers requested from discovery.
    #[serde(default = "default_max_results")]
    pub max_results: u32,

    /// Whether unmatched journals are dropped.
    #[serde(default)]
    pub journal_mode: JournalMode,

    /// Result ordering.
    #[serde(default, alias = "sortMode")]
    pub sort: SortMode,
}

fn default_humans_only() -> bool {
    true
}

fn default_years_back() -> u32 {
    5
}

fn default_max_results() -> u32 {
    50
}

impl SearchCriteria {
    /// Criteria for `query` with the form defaults.
    #[must_use]
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            article_type: ArticleType::default(),
            humans_only: default_humans_only(),
            open_access_only: false,
            years_back: default_years_back(),
            max_results: default_max_results(),
            journal_mode: JournalMode::default(),
            sort: SortMode::default(),
        }
    }

    #[must_use]
    pub fn with_article_type(mut self, article_type: ArticleType) -> Self {
        self.article_type = article_type;
        self
    }

    #[must_use]
    pub fn with_humans_only(mut self, humans_only: bool) -> Self {
        self.humans_only = humans_only;
        self
    }

    #[must_use]
    pub fn with_open_access_only(mut self, open_access_only: bool) -> Self {
        self.open_access_only = open_access_only;
        self
    }

    #[must_use]
    pub fn with_years_back(mut self, years_back: u32) -> Self {
        self.years_back = years_back;
        self
    }

    #[must_use]
    pub fn with_max_results(mut self, max_results: u32) -> Self {
        self.max_results = max_results;
        self
    }

    #[must_use]
    pub fn with_journal_mode(mut self, journal_mode: JournalMode) -> Self {
        self.journal_mode = journal_mode;
        self
    }

    #[must_use]
    pub fn with_sort(mut self, sort: SortMode) -> Self {
        self.sort = sort;
        self
    }

    /// Check field ranges before any network call.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.query.trim().is_empty() {
            return Err(PipelineError::invalid_criteria("query", "cannot be empty"));
        }

        if !YEARS_BACK_RANGE.contains(&self.years_back) {
            return Err(PipelineError::invalid_criteria(
                "yearsBack",
                format!(
                    "must be between {} and {}, got {}",
                    YEARS_BACK_RANGE.start(),
                    YEARS_BACK_RANGE.end(),
                    self.years_back
                ),
            ));
        }

        if !MAX_RESULTS_RANGE.contains(&self.max_results) {
            return Err(PipelineError::invalid_criteria(
                "maxResults",
                format!(
                    "must be between {} and {}, got {}",
                    MAX_RESULTS_RANGE.start(),
                    MAX_RESULTS_RANGE.end(),
                    self.max_results
                ),
            ));
        }

        Ok(())
    }
}
