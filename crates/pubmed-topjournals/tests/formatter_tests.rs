//! Formatter tests for markdown and JSON output.
//!
//! Tests output correctness, edge cases, and special character handling.

use pubmed_topjournals::formatters;
use pubmed_topjournals::{
    AliasCollisionPolicy, ArticleRecord, JournalMode, MetricsIndex, PartialResultWarning,
    PipelineResult, RankingEngine, ResultSummary, SearchCriteria, SortMode,
};

// =============================================================================
// Helper Functions
// =============================================================================

fn index() -> MetricsIndex {
    MetricsIndex::from_json_str(
        r#"[
            {"name": "Lancet", "aliases": ["The Lancet"], "category": "Medicine, General & Internal", "quartile": "Q1", "jif": 98.4},
            {"name": "Cureus", "category": "Medicine", "quartile": null, "jif": null}
        ]"#,
        AliasCollisionPolicy::FirstWins,
    )
    .unwrap()
}

fn ranked<'a>(records: Vec<ArticleRecord>, mode: JournalMode, index: &'a MetricsIndex) -> PipelineResult<'a> {
    let criteria = SearchCriteria::new("q").with_journal_mode(mode).with_sort(SortMode::JifDesc);
    let ranked = RankingEngine::process(records, &criteria, index);
    PipelineResult { articles: ranked.articles, summary: ranked.summary, total_available: 0, warning: None }
}

// =============================================================================
// Markdown Result Tests
// =============================================================================

#[test]
fn test_results_markdown_cards_in_order() {
    let index = index();
    let result = ranked(
        vec![
            ArticleRecord::new("1", "Case report", "Cureus").with_year(2022),
            ArticleRecord::new("2", "Big trial", "The Lancet").with_year(2024).with_article_type("Randomized Controlled Trial"),
        ],
        JournalMode::TopJournals,
        &index,
    );

    let output = formatters::format_results_markdown("q", &result);

    assert!(output.starts_with("**2 found → 2 after filters → 2 kept (Top journals)**"));
    let lancet = output.find("## 1. [Big trial](https://pubmed.ncbi.nlm.nih.gov/2/)").unwrap();
    let cureus = output.find("## 2. [Case report](https://pubmed.ncbi.nlm.nih.gov/1/)").unwrap();
    assert!(lancet < cureus);
    assert!(output.contains("The Lancet • 2024 • Randomized Controlled Trial"));
    assert!(output.contains("`JIF 98.4` `Q1` `Medicine, General & Internal`"));
    assert_eq!(output.matches("\n---\n").count(), 2);
}

#[test]
fn test_results_markdown_matched_without_jif_has_category_only() {
    let index = index();
    let result = ranked(vec![ArticleRecord::new("1", "Case report", "Cureus")], JournalMode::TopJournals, &index);

    let output = formatters::format_results_markdown("q", &result);

    assert!(output.contains("`Medicine`"));
    assert!(!output.contains("JIF"));
}

#[test]
fn test_results_markdown_unmatched_has_no_badges() {
    let index = index();
    let result = ranked(
        vec![ArticleRecord::new("1", "Letter", "Obscure Letters")],
        JournalMode::AllJournals,
        &index,
    );

    let output = formatters::format_results_markdown("q", &result);

    assert!(output.contains("Obscure Letters"));
    assert!(!output.contains('`'));
}

#[test]
fn test_results_markdown_warning_before_cards() {
    let index = index();
    let mut result = ranked(vec![ArticleRecord::new("1", "Trial", "Lancet")], JournalMode::TopJournals, &index);
    result.warning = Some(PartialResultWarning { dropped_batches: 2, missing_records: 250 });

    let output = formatters::format_results_markdown("q", &result);

    let warning = output.find("> ⚠️ Some results may be missing: 250").unwrap();
    assert!(warning < output.find("## 1.").unwrap());
    assert!(output.contains("(2 batches failed)"));
}

#[test]
fn test_results_markdown_empty() {
    let result = PipelineResult {
        articles: vec![],
        summary: ResultSummary { total_found: 0, after_filter: 0, kept: 0, mode: JournalMode::TopJournals },
        total_available: 0,
        warning: None,
    };

    let output = formatters::format_results_markdown("  rare disease  ", &result);

    assert!(output.contains("No articles found for 'rare disease'"));
    assert!(output.contains("Including all journals"));
}

// =============================================================================
// Truncation Tests
// =============================================================================

#[test]
fn test_truncate_chars_multibyte() {
    let text = "β-cell ".repeat(100);
    let cut = formatters::truncate_chars(&text, 10);
    assert!(cut.ends_with("..."));
    assert!(cut.chars().count() <= 13);
}

#[test]
fn test_truncate_chars_short_is_borrowed() {
    let cut = formatters::truncate_chars("short", 300);
    assert!(matches!(cut, std::borrow::Cow::Borrowed("short")));
}

// =============================================================================
// JSON Tests
// =============================================================================

#[test]
fn test_results_envelope_fields() {
    let index = index();
    let mut record = ArticleRecord::new("2", "Big trial", "The Lancet").with_year(2024);
    record.doi = Some("10.1016/S0140-6736(24)00001-1".to_string());
    let result = ranked(vec![record], JournalMode::TopJournals, &index);

    let envelope = formatters::results_envelope(&result);

    assert_eq!(envelope["kept"], 1);
    assert_eq!(envelope["mode"], "top-journals");
    let article = &envelope["articles"][0];
    assert_eq!(article["doi"], "10.1016/S0140-6736(24)00001-1");
    assert_eq!(article["metrics"]["journal"], "Lancet");
    assert_eq!(article["metrics"]["quartile"], "Q1");
    assert_eq!(article["metrics"]["match"], "alias");
    assert!(article.get("abstract").is_none());
    assert!(envelope.get("warning").is_none());
}
