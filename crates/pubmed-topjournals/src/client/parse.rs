//! Parsers for E-utilities responses.
//!
//! esearch and esummary answer in JSON; efetch abstracts come back as
//! PubMed XML and are read with a streaming `quick-xml` reader.

use std::collections::HashMap;
use std::sync::LazyLock;

use quick_xml::Reader;
use quick_xml::events::Event;
use regex::Regex;
use serde_json::Value;

use crate::error::{RemoteError, RemoteResult};
use crate::models::ArticleRecord;

static YEAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(?:19|20)\d{2}\b").expect("valid year regex"));

/// Identifiers returned by the discovery phase.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Discovery {
    /// PMIDs in relevance order, de-duplicated.
    pub ids: Vec<String>,
    /// Total matches PubMed reports for the query.
    pub total_available: u64,
}

/// Parse an esearch JSON body, keeping at most `max_ids` identifiers.
pub fn parse_esearch(body: &str, max_ids: usize) -> RemoteResult<Discovery> {
    let value: Value = serde_json::from_str(body)?;

    let Some(result) = value.get("esearchresult") else {
        let message = value
            .get("error")
            .and_then(Value::as_str)
            .unwrap_or("missing esearchresult")
            .to_string();
        return Err(RemoteError::invalid_response(message));
    };

    if let Some(message) = result.get("ERROR").and_then(Value::as_str) {
        return Err(RemoteError::malformed_query(message));
    }

    let error_messages: Vec<&str> = result
        .pointer("/errorlist/errormessage")
        .and_then(Value::as_array)
        .map(|msgs| msgs.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();
    if !error_messages.is_empty() {
        return Err(RemoteError::malformed_query(error_messages.join("; ")));
    }

    let mut ids: Vec<String> = Vec::new();
    for id in result.get("idlist").and_then(Value::as_array).into_iter().flatten() {
        let Some(id) = id.as_str().map(str::trim).filter(|s| !s.is_empty()) else {
            continue;
        };
        if ids.len() >= max_ids {
            break;
        }
        if !ids.iter().any(|seen| seen == id) {
            ids.push(id.to_string());
        }
    }

    let total_available = match result.get("count") {
        Some(Value::String(s)) => s.trim().parse().unwrap_or(ids.len() as u64),
        Some(Value::Number(n)) => n.as_u64().unwrap_or(ids.len() as u64),
        _ => ids.len() as u64,
    };

    Ok(Discovery { ids, total_available })
}

/// Parse an esummary JSON body into records, in `requested` order.
///
/// Records that are missing a required field are skipped.
pub fn parse_esummary(body: &str, requested: &[String]) -> RemoteResult<Vec<ArticleRecord>> {
    let value: Value = serde_json::from_str(body)?;

    let Some(result) = value.get("result").filter(|r| r.is_object()) else {
        return Err(RemoteError::invalid_response("missing esummary result"));
    };

    let records = requested
        .iter()
        .filter_map(|id| {
            let Some(doc) = result.get(id.as_str()) else {
                tracing::debug!(pmid = %id, "No summary returned");
                return None;
            };
            let record = parse_summary_record(id, doc);
            if record.is_none() {
                tracing::debug!(pmid = %id, "Skipping summary without title or journal");
            }
            record
        })
        .collect();

    Ok(records)
}

fn parse_summary_record(id: &str, doc: &Value) -> Option<ArticleRecord> {
    if doc.get("error").is_some() {
        return None;
    }

    let pmid = non_empty(doc.get("uid")).unwrap_or(id);
    let title = non_empty(doc.get("title"))?;
    let journal = non_empty(doc.get("fulljournalname")).or_else(|| non_empty(doc.get("source")))?;

    let mut record = ArticleRecord::new(pmid, title, journal);

    record.year = ["pubdate", "epubdate", "sortpubdate"]
        .iter()
        .find_map(|key| doc.get(*key).and_then(Value::as_str).and_then(extract_year));

    record.article_type = doc
        .get("pubtype")
        .and_then(Value::as_array)
        .and_then(|types| types.first())
        .and_then(Value::as_str)
        .map(String::from);

    record.doi = doc
        .get("articleids")
        .and_then(Value::as_array)
        .and_then(|ids| ids.iter().find(|i| i.get("idtype").and_then(Value::as_str) == Some("doi")))
        .and_then(|i| non_empty(i.get("value")))
        .map(String::from);

    Some(record)
}

fn non_empty(value: Option<&Value>) -> Option<&str> {
    value.and_then(Value::as_str).map(str::trim).filter(|s| !s.is_empty())
}

/// First plausible four-digit year (1900-2099) in a PubMed date string.
#[must_use]
pub fn extract_year(date: &str) -> Option<i32> {
    YEAR_RE.find(date).and_then(|m| m.as_str().parse().ok())
}

/// Parse efetch PubMed XML into PMID → abstract text.
///
/// Labelled sections become `"LABEL: text"` paragraphs joined by a blank
/// line. Inline markup inside abstract text is flattened.
pub fn parse_efetch_abstracts(xml: &str) -> RemoteResult<HashMap<String, String>> {
    let mut abstracts = HashMap::new();
    let mut reader = Reader::from_str(xml);

    let mut in_article = false;
    let mut pmid: Option<String> = None;
    let mut in_pmid = false;
    let mut pmid_buf = String::new();

    let mut paragraphs: Vec<String> = Vec::new();
    let mut in_abstract = false;
    let mut label: Option<String> = None;
    let mut text = String::new();

    loop {
        let event = reader.read_event().map_err(|e| xml_error(&reader, &e))?;
        match event {
            Event::Start(ref e) => match e.name().as_ref() {
                b"PubmedArticle" => {
                    in_article = true;
                    pmid = None;
                    paragraphs.clear();
                }
                b"PMID" if in_article && pmid.is_none() => {
                    in_pmid = true;
                    pmid_buf.clear();
                }
                b"AbstractText" if in_article => {
                    in_abstract = true;
                    text.clear();
                    label = e
                        .try_get_attribute("Label")
                        .ok()
                        .flatten()
                        .and_then(|a| a.unescape_value().ok().map(|v| v.trim().to_string()))
                        .filter(|l| !l.is_empty());
                }
                _ => {}
            },
            Event::Text(ref e) => {
                if in_pmid || in_abstract {
                    let chunk = e.unescape().map_err(|err| xml_error(&reader, &err))?;
                    if in_pmid {
                        pmid_buf.push_str(&chunk);
                    }
                    if in_abstract {
                        text.push_str(&chunk);
                    }
                }
            }
            Event::End(ref e) => match e.name().as_ref() {
                b"PMID" if in_pmid => {
                    in_pmid = false;
                    let id = pmid_buf.trim();
                    if !id.is_empty() {
                        pmid = Some(id.to_string());
                    }
                }
                b"AbstractText" if in_abstract => {
                    in_abstract = false;
                    let body = text.split_whitespace().collect::<Vec<_>>().join(" ");
                    if !body.is_empty() {
                        paragraphs.push(match label.take() {
                            Some(l) => format!("{l}: {body}"),
                            None => body,
                        });
                    }
                }
                b"PubmedArticle" => {
                    in_article = false;
                    if let Some(id) = pmid.take() {
                        if !paragraphs.is_empty() {
                            abstracts.insert(id, paragraphs.join("\n\n"));
                        }
                    }
                    paragraphs.clear();
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(abstracts)
}

fn xml_error(reader: &Reader<&[u8]>, err: &quick_xml::Error) -> RemoteError {
    RemoteError::invalid_response(format!(
        "abstract XML error at byte {}: {err}",
        reader.buffer_position()
    ))
}
