//! Journal filtering and result ordering.
//!
//! Each stage is a pure transformation over the record sequence:
//! annotate (attach metrics) → journal filter → stable sort. Running
//! [`RankingEngine::process`] twice on the same input yields the same output.

use std::collections::HashSet;
use std::fmt;

use serde::Serialize;

use crate::matcher::{JournalMatch, JournalMatcher};
use crate::metrics::MetricsIndex;
use crate::models::{ArticleRecord, JournalMetricEntry, JournalMode, Quartile, SearchCriteria, SortMode};

/// An article with its (optional) matched journal metrics.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotatedArticle<'a> {
    #[serde(flatten)]
    pub article: ArticleRecord,

    /// Matched metrics entry; `None` when the journal is not in the table.
    pub journal_metrics: Option<JournalMatch<'a>>,
}

impl<'a> AnnotatedArticle<'a> {
    /// The matched metrics entry, if any.
    #[must_use]
    pub fn metrics(&self) -> Option<&'a JournalMetricEntry> {
        self.journal_metrics.map(|m| m.entry)
    }

    #[must_use]
    pub fn jif(&self) -> Option<f64> {
        self.metrics().and_then(|e| e.jif)
    }

    #[must_use]
    pub fn quartile(&self) -> Option<Quartile> {
        self.metrics().and_then(|e| e.quartile)
    }

    #[must_use]
    pub fn is_matched(&self) -> bool {
        self.journal_metrics.is_some()
    }
}

/// Counters for one pipeline run. Always `kept <= after_filter <= total_found`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultSummary {
    /// Records handed to the engine.
    pub total_found: usize,
    /// Records surviving the journal filter.
    pub after_filter: usize,
    /// Records in the final ordered output.
    pub kept: usize,
    /// Journal filter in effect.
    pub mode: JournalMode,
}

impl fmt::Display for ResultSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} found → {} after filters → {} kept ({})",
            self.total_found, self.after_filter, self.kept, self.mode
        )
    }
}

/// Ordered articles plus their summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedResults<'a> {
    pub articles: Vec<AnnotatedArticle<'a>>,
    pub summary: ResultSummary,
}

/// Applies the journal filter and sort policy.
#[derive(Debug, Clone, Copy, Default)]
pub struct RankingEngine;

impl RankingEngine {
    /// Filter and order `records` per `criteria`.
    #[must_use]
    pub fn process<'a>(
        records: Vec<ArticleRecord>,
        criteria: &SearchCriteria,
        index: &'a MetricsIndex,
    ) -> RankedResults<'a> {
        let total_found = records.len();
        let mode = criteria.journal_mode;

        let mut articles: Vec<_> = Self::annotate(records, index)
            .filter(|a| !mode.requires_match() || a.is_matched())
            .collect();
        let after_filter = articles.len();

        Self::sort(&mut articles, criteria.sort);

        let summary = ResultSummary { total_found, after_filter, kept: articles.len(), mode };
        tracing::debug!(%summary, sort = ?criteria.sort, "Ranked results");

        RankedResults { articles, summary }
    }

    /// Attach metrics to each record, dropping repeated PMIDs (first wins).
    pub fn annotate(
        records: Vec<ArticleRecord>,
        index: &MetricsIndex,
    ) -> impl Iterator<Item = AnnotatedArticle<'_>> {
        let mut seen = HashSet::new();
        records.into_iter().filter(move |r| seen.insert(r.pmid.clone())).map(move |article| {
            let journal_metrics = JournalMatcher::resolve(&article.journal, index);
            AnnotatedArticle { article, journal_metrics }
        })
    }

    /// Stable sort; ties keep their incoming (relevance) order.
    pub fn sort(articles: &mut [AnnotatedArticle<'_>], mode: SortMode) {
        match mode {
            SortMode::Relevance => {}
            SortMode::JifDesc => {
                articles.sort_by(|a, b| JournalMetricEntry::cmp_jif(b.jif(), a.jif()));
            }
            SortMode::JifAsc => {
                articles.sort_by(|a, b| JournalMetricEntry::cmp_jif(a.jif(), b.jif()));
            }
            SortMode::QuartileAsc => {
                articles.sort_by_key(|a| a.quartile().map_or(u8::MAX, Quartile::rank));
            }
            SortMode::QuartileDesc => {
                articles.sort_by_key(|a| a.quartile().map_or(u8::MAX, |q| 5 - q.rank()));
            }
        }
    }
}
