//! Markdown output formatting.

use std::borrow::Cow;

use crate::pipeline::PipelineResult;
use crate::ranking::AnnotatedArticle;

/// Characters of abstract shown on a result card.
pub const ABSTRACT_PREVIEW_CHARS: usize = 300;

/// Format a pipeline result as Markdown: status line, warning, cards.
#[must_use]
pub fn format_results_markdown(query: &str, result: &PipelineResult<'_>) -> String {
    let mut output = format!("**{}**\n\n", result.summary_line());

    if let Some(warning) = &result.warning {
        output.push_str(&format!("> ⚠️ {warning}\n\n"));
    }

    if result.articles.is_empty() {
        output.push_str(&no_results_message(query));
        return output;
    }

    for (i, article) in result.articles.iter().enumerate() {
        output.push_str(&format_article_markdown(article, i + 1));
        output.push_str("\n---\n\n");
    }

    output
}

/// Format a single article card as Markdown.
#[must_use]
pub fn format_article_markdown(article: &AnnotatedArticle<'_>, index: usize) -> String {
    let record = &article.article;
    let mut output = String::new();

    // Title
    output.push_str(&format!("## {index}. [{}]({})\n\n", record.title, record.url));

    // Journal, year, type
    output.push_str(&format!(
        "{} • {} • {}\n\n",
        record.journal,
        record.year_label(),
        record.type_label()
    ));

    // Badges
    if let Some(entry) = article.metrics() {
        let mut badges = Vec::new();
        if let Some(jif) = entry.jif {
            badges.push(format!("`JIF {jif:.1}`"));
        }
        if let Some(quartile) = entry.quartile {
            badges.push(format!("`{quartile}`"));
        }
        badges.push(format!("`{}`", entry.category));
        output.push_str(&format!("{}\n\n", badges.join(" ")));
    }

    // Links
    let mut links = vec![format!("[PubMed]({})", record.url)];
    if let Some(doi) = &record.doi {
        links.push(format!("[DOI](https://doi.org/{doi})"));
    }
    output.push_str(&format!("**Links**: {}\n\n", links.join(" | ")));

    // Abstract (truncated)
    if let Some(abs) = &record.abstract_text {
        output.push_str(&format!("**Abstract**: {}\n", truncate_chars(abs, ABSTRACT_PREVIEW_CHARS)));
    }

    output
}

/// Message shown when a search keeps no articles.
#[must_use]
pub fn no_results_message(query: &str) -> String {
    format!(
        "No articles found for '{}'. Try:\n\
         - Broader search terms\n\
         - A larger years-back window\n\
         - Including all journals\n",
        query.trim()
    )
}

/// Truncate to at most `max_chars` characters, appending "..." when cut.
#[must_use]
pub fn truncate_chars(text: &str, max_chars: usize) -> Cow<'_, str> {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => Cow::Owned(format!("{}...", text[..cut].trim_end())),
        None => Cow::Borrowed(text),
    }
}
