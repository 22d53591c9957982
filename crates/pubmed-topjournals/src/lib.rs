//! PubMed Top Journals
//!
//! Searches PubMed through the NCBI E-utilities and keeps, annotates and
//! ranks the results by journal impact metrics (JIF and quartile) from a
//! static reference table.
//!
//! # Features
//!
//! - **Two-phase search**: esearch discovery, then batched esummary/efetch detail
//! - **Polite**: fixed request interval, bounded retry with backoff and jitter
//! - **Partial results**: dropped batches surface as a warning, not a failure
//! - **Conservative matching**: exact canonical or declared-alias matches only
//! - **Stable ranking**: every sort breaks ties by PubMed relevance
//!
//! # Example
//!
//! ```no_run
//! use pubmed_topjournals::{Config, Pipeline, SearchCriteria, SortMode};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let pipeline = Pipeline::bootstrap(&config)?;
//!
//!     let criteria = SearchCriteria::new("diabetes prevention").with_sort(SortMode::JifDesc);
//!     let result = pipeline.run(&criteria).await?;
//!     println!("{}", result.summary_line());
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod formatters;
pub mod matcher;
pub mod metrics;
pub mod models;
pub mod pipeline;
pub mod ranking;
pub mod server;

pub use client::{ArticleSource, PubMedClient, SearchOutcome};
pub use config::Config;
pub use error::{DataLoadError, PartialResultWarning, PipelineError, RemoteError};
pub use matcher::{JournalMatch, JournalMatcher, MatchKind};
pub use metrics::{AliasCollisionPolicy, MetricsIndex};
pub use models::{ArticleRecord, ArticleType, JournalMetricEntry, JournalMode, Quartile, SearchCriteria, SortMode};
pub use pipeline::{Pipeline, PipelineResult};
pub use ranking::{AnnotatedArticle, RankingEngine, ResultSummary};
