//! Search-to-results orchestration.
//!
//! A [`Pipeline`] owns an [`ArticleSource`] and a read-only [`MetricsIndex`]
//! shared across runs. Each [`Pipeline::run`] validates the criteria, runs
//! the remote search, ranks the records and reports counters.

use std::sync::Arc;

use serde::Serialize;

use crate::client::{ArticleSource, PubMedClient};
use crate::config::Config;
use crate::error::{DataLoadError, PartialResultWarning, PipelineError};
use crate::metrics::MetricsIndex;
use crate::models::SearchCriteria;
use crate::ranking::{AnnotatedArticle, RankedResults, RankingEngine, ResultSummary};

/// Outcome of one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineResult<'a> {
    /// Ranked articles, metrics borrowed from the pipeline's index.
    pub articles: Vec<AnnotatedArticle<'a>>,

    /// Found / after-filter / kept counters.
    pub summary: ResultSummary,

    /// Total matches PubMed reports for the query.
    pub total_available: u64,

    /// Set when some detail batches were dropped.
    pub warning: Option<PartialResultWarning>,
}

impl PipelineResult<'_> {
    /// The `"<total> found → <after> after filters → <kept> kept (<mode>)"` line.
    #[must_use]
    pub fn summary_line(&self) -> String {
        self.summary.to_string()
    }

    #[must_use]
    pub const fn is_partial(&self) -> bool {
        self.warning.is_some()
    }
}

/// The query-and-rank pipeline.
#[derive(Clone)]
pub struct Pipeline {
    source: Arc<dyn ArticleSource>,
    index: Arc<MetricsIndex>,
    degraded: bool,
}

impl Pipeline {
    /// Create a pipeline over `source` and a loaded `index`.
    #[must_use]
    pub fn new(source: Arc<dyn ArticleSource>, index: Arc<MetricsIndex>) -> Self {
        Self { source, index, degraded: false }
    }

    /// Create a pipeline without journal metrics.
    ///
    /// Only all-journals searches are served; no badges are attached.
    #[must_use]
    pub fn degraded(source: Arc<dyn ArticleSource>) -> Self {
        Self { source, index: Arc::new(MetricsIndex::empty()), degraded: true }
    }

    /// Build the production pipeline: PubMed client plus the metrics table.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built, or if the metrics
    /// table fails to load and `config.allow_degraded` is off.
    pub fn bootstrap(config: &Config) -> anyhow::Result<Self> {
        let client = PubMedClient::new(config.clone())?;
        Ok(Self::with_source(Arc::new(client), config)?)
    }

    /// Load the metrics table named by `config` and pair it with `source`.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::DataLoad`] unless `config.allow_degraded` is set.
    pub fn with_source(source: Arc<dyn ArticleSource>, config: &Config) -> Result<Self, PipelineError> {
        match load_index(config) {
            Ok(index) => Ok(Self::new(source, Arc::new(index))),
            Err(err) if config.allow_degraded => {
                tracing::warn!(error = %err, "Journal metrics unavailable, running in degraded mode");
                Ok(Self::degraded(source))
            }
            Err(err) => {
                tracing::error!(error = %err, "Journal metrics failed to load");
                Err(PipelineError::DataLoad(err))
            }
        }
    }

    /// Whether the pipeline runs without journal metrics.
    #[must_use]
    pub const fn is_degraded(&self) -> bool {
        self.degraded
    }

    /// The shared metrics index.
    #[must_use]
    pub fn index(&self) -> &MetricsIndex {
        &self.index
    }

    /// Run one search.
    ///
    /// # Errors
    ///
    /// Returns error if the criteria are invalid, if top-journal filtering is
    /// requested without metrics, or if the remote search fails permanently.
    #[tracing::instrument(skip(self, criteria), fields(query = %criteria.query, mode = %criteria.journal_mode))]
    pub async fn run(&self, criteria: &SearchCriteria) -> Result<PipelineResult<'_>, PipelineError> {
        criteria.validate()?;

        if self.degraded && criteria.journal_mode.requires_match() {
            return Err(PipelineError::MetricsUnavailable);
        }

        let outcome = self.source.search(criteria).await.map_err(PipelineError::from_remote)?;

        let RankedResults { articles, summary } =
            RankingEngine::process(outcome.records, criteria, &self.index);

        tracing::info!(
            total_found = summary.total_found,
            after_filter = summary.after_filter,
            kept = summary.kept,
            total_available = outcome.total_available,
            partial = outcome.warning.is_some(),
            "Search complete"
        );

        Ok(PipelineResult {
            articles,
            summary,
            total_available: outcome.total_available,
            warning: outcome.warning,
        })
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("journals", &self.index.len())
            .field("degraded", &self.degraded)
            .finish_non_exhaustive()
    }
}

/// Load the metrics index named by `config` without building a pipeline.
///
/// # Errors
///
/// Returns error if the table cannot be located, read or validated.
pub fn load_index(config: &Config) -> Result<MetricsIndex, DataLoadError> {
    let path = MetricsIndex::locate(config.metrics_path.as_deref())?;
    MetricsIndex::load(path, config.alias_policy)
}
