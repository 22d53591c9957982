//! Data models for journals, articles, and search criteria.
//!
//! Wire-facing models use `#[serde(rename_all = "camelCase")]` so the HTTP
//! surface matches the JSON the form layer sends.

mod article;
mod criteria;
mod enums;
mod journal;

pub use article::{ArticleRecord, PUBMED_ARTICLE_URL, article_url};
pub use criteria::{MAX_RESULTS_RANGE, SearchCriteria, YEARS_BACK_RANGE};
pub use enums::{ArticleType, JournalMode, ResponseFormat, SortMode};
pub use journal::{JournalMetricEntry, Quartile};

pub(crate) use journal::RawJournalEntry;
