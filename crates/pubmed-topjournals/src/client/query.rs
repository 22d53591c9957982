//! Translate search criteria into the PubMed query language.

use chrono::{Days, NaiveDate};

use crate::models::SearchCriteria;

/// Date format expected by `mindate` / `maxdate`.
pub const DATE_FORMAT: &str = "%Y/%m/%d";

/// Compose the `term` parameter for esearch.
///
/// The user query is parenthesised when filter clauses follow so that an
/// `OR` in the query cannot escape the filters.
#[must_use]
pub fn build_search_term(criteria: &SearchCriteria) -> String {
    let query = criteria.query.trim();

    let mut clauses = Vec::new();
    if let Some(pub_type) = criteria.article_type.publication_type() {
        clauses.push(format!("{pub_type}[Publication Type]"));
    }
    if criteria.humans_only {
        clauses.push("humans[MeSH Terms]".to_string());
    }
    if criteria.open_access_only {
        clauses.push("free full text[sb]".to_string());
    }

    if clauses.is_empty() {
        return query.to_string();
    }

    format!("({query}) AND {}", clauses.join(" AND "))
}

/// Publication date window ending at `today`, `years_back` × 365 days long.
#[must_use]
pub fn date_window(years_back: u32, today: NaiveDate) -> (NaiveDate, NaiveDate) {
    let start = today
        .checked_sub_days(Days::new(u64::from(years_back) * 365))
        .unwrap_or(NaiveDate::MIN);
    (start, today)
}

/// esearch parameters (without identification) for `criteria` as of `today`.
#[must_use]
pub fn discovery_params(criteria: &SearchCriteria, today: NaiveDate) -> Vec<(String, String)> {
    let (min_date, max_date) = date_window(criteria.years_back, today);

    vec![
        ("term".to_string(), build_search_term(criteria)),
        ("retmode".to_string(), "json".to_string()),
        ("retmax".to_string(), criteria.max_results.to_string()),
        ("retstart".to_string(), "0".to_string()),
        ("sort".to_string(), "relevance".to_string()),
        ("datetype".to_string(), "pdat".to_string()),
        ("mindate".to_string(), min_date.format(DATE_FORMAT).to_string()),
        ("maxdate".to_string(), max_date.format(DATE_FORMAT).to_string()),
    ]
}
