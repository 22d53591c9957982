//! Article records returned by the detail phase.

use serde::Serialize;

/// Base URL for article landing pages.
pub const PUBMED_ARTICLE_URL: &str = "https://pubmed.ncbi.nlm.nih.gov";

/// An article from PubMed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleRecord {
    /// PubMed identifier.
    pub pmid: String,

    /// Article title.
    pub title: String,

    /// Journal name exactly as PubMed reports it.
    pub journal: String,

    /// Publication year.
    pub year: Option<i32>,

    /// First listed publication type (e.g., "Journal Article").
    pub article_type: Option<String>,

    /// Abstract text, paragraphs separated by a blank line.
    #[serde(rename = "abstract")]
    pub abstract_text: Option<String>,

    /// Digital Object Identifier.
    pub doi: Option<String>,

    /// PubMed landing page.
    pub url: String,
}

impl ArticleRecord {
    /// Create a record with the required fields; the URL is derived from the PMID.
    #[must_use]
    pub fn new(pmid: impl Into<String>, title: impl Into<String>, journal: impl Into<String>) -> Self {
        let pmid = pmid.into();
        let url = article_url(&pmid);
        Self { pmid, title: title.into(), journal: journal.into(), url, ..Default::default() }
    }

    #[must_use]
    pub fn with_year(mut self, year: i32) -> Self {
        self.year = Some(year);
        self
    }

    #[must_use]
    pub fn with_article_type(mut self, article_type: impl Into<String>) -> Self {
        self.article_type = Some(article_type.into());
        self
    }

    #[must_use]
    pub fn with_abstract(mut self, text: impl Into<String>) -> Self {
        self.abstract_text = Some(text.into());
        self
    }

    /// Year as display text, "Unknown" when absent.
    #[must_use]
    pub fn year_label(&self) -> String {
        self.year.map_or_else(|| "Unknown".to_string(), |y| y.to_string())
    }

    /// Publication type as display text, "Unknown" when absent.
    #[must_use]
    pub fn type_label(&self) -> &str {
        self.article_type.as_deref().unwrap_or("Unknown")
    }
}

/// Landing page URL for a PMID.
#[must_use]
pub fn article_url(pmid: &str) -> String {
    format!("{PUBMED_ARTICLE_URL}/{pmid}/")
}
