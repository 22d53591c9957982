//! JSON output formatting.

use serde_json::{Value, json};

use crate::pipeline::PipelineResult;
use crate::ranking::AnnotatedArticle;

/// Create a compact article representation for JSON output.
///
/// Optional fields are only present when known.
#[must_use]
pub fn compact_article(article: &AnnotatedArticle<'_>) -> Value {
    let record = &article.article;
    let mut obj = json!({
        "pmid": record.pmid,
        "title": record.title,
        "journal": record.journal,
        "url": record.url,
    });

    if let Some(year) = record.year {
        obj["year"] = json!(year);
    }

    if let Some(article_type) = &record.article_type {
        obj["type"] = json!(article_type);
    }

    if let Some(doi) = &record.doi {
        obj["doi"] = json!(doi);
    }

    if let Some(abs) = &record.abstract_text {
        obj["abstract"] = json!(abs);
    }

    if let Some(m) = article.journal_metrics {
        obj["metrics"] = json!({
            "journal": m.entry.name,
            "category": m.entry.category,
            "quartile": m.entry.quartile,
            "jif": m.entry.jif,
            "match": m.kind,
        });
    }

    obj
}

/// Wrap a pipeline result: summary line, counters, warning, articles.
#[must_use]
pub fn results_envelope(result: &PipelineResult<'_>) -> Value {
    let mut obj = json!({
        "summary": result.summary_line(),
        "totalFound": result.summary.total_found,
        "afterFilter": result.summary.after_filter,
        "kept": result.summary.kept,
        "mode": result.summary.mode,
        "totalAvailable": result.total_available,
        "articles": result.articles.iter().map(compact_article).collect::<Vec<_>>(),
    });

    if let Some(warning) = &result.warning {
        obj["warning"] = json!({
            "message": warning.to_string(),
            "droppedBatches": warning.dropped_batches,
            "missingRecords": warning.missing_records,
        });
    }

    obj
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PartialResultWarning;
    use crate::matcher::{JournalMatch, MatchKind};
    use crate::models::{ArticleRecord, JournalMetricEntry, JournalMode, Quartile};
    use crate::ranking::ResultSummary;

    #[test]
    fn test_compact_article() {
        let entry = JournalMetricEntry {
            name: "The New England Journal of Medicine".to_string(),
            aliases: vec!["N Engl J Med".to_string()],
            category: "Medicine".to_string(),
            quartile: Some(Quartile::Q1),
            jif: Some(96.2),
        };
        let article = AnnotatedArticle {
            article: ArticleRecord::new("1", "Trial", "N Engl J Med").with_year(2023),
            journal_metrics: Some(JournalMatch { entry: &entry, kind: MatchKind::Alias }),
        };

        let compact = compact_article(&article);

        assert_eq!(compact["pmid"], "1");
        assert_eq!(compact["year"], 2023);
        assert!(compact.get("doi").is_none());
        assert_eq!(compact["metrics"]["quartile"], "Q1");
        assert_eq!(compact["metrics"]["jif"], 96.2);
        assert_eq!(compact["metrics"]["match"], "alias");
    }

    #[test]
    fn test_envelope_with_warning() {
        let mut warning = PartialResultWarning::default();
        warning.record_dropped_batch(50);
        let result = PipelineResult {
            articles: vec![AnnotatedArticle {
                article: ArticleRecord::new("9", "Unmatched", "Obscure"),
                journal_metrics: None,
            }],
            summary: ResultSummary { total_found: 1, after_filter: 1, kept: 1, mode: JournalMode::AllJournals },
            total_available: 120,
            warning: Some(warning),
        };

        let envelope = results_envelope(&result);

        assert_eq!(envelope["summary"], "1 found → 1 after filters → 1 kept (All journals)");
        assert_eq!(envelope["totalAvailable"], 120);
        assert_eq!(envelope["warning"]["missingRecords"], 50);
        assert!(envelope["articles"][0].get("metrics").is_none());
    }
}
