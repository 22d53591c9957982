//! PubMed E-utilities client.
//!
//! Provides an async HTTP client with:
//! - A politeness interval between requests, shared by every clone (3 req/s, 10 req/s with a key)
//! - Bounded retry with exponential backoff and jitter ([`retry`])
//! - Batched detail retrieval that degrades to a partial-result warning
//! - Response caching with a 5-minute TTL

pub mod parse;
pub mod query;
pub mod retry;

use std::sync::Arc;

use async_trait::async_trait;
use moka::future::Cache;
use reqwest::Client;

use crate::config::{Config, Identity};
use crate::error::{PartialResultWarning, RemoteError, RemoteResult};
use crate::models::{ArticleRecord, SearchCriteria};

pub use parse::Discovery;
use retry::{Pacer, RetryPolicy, Sleeper, TokioSleeper, with_retry};

/// Records retrieved for one search.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchOutcome {
    /// Article records in relevance order.
    pub records: Vec<ArticleRecord>,
    /// Total matches PubMed reports, beyond the requested page.
    pub total_available: u64,
    /// Set when some detail batches were dropped.
    pub warning: Option<PartialResultWarning>,
}

/// A source of article records for a search.
#[async_trait]
pub trait ArticleSource: Send + Sync {
    /// Run the discovery and detail phases for `criteria`.
    async fn search(&self, criteria: &SearchCriteria) -> RemoteResult<SearchOutcome>;
}

/// PubMed E-utilities client.
#[derive(Clone)]
pub struct PubMedClient {
    /// HTTP client.
    client: Client,

    /// Response body cache (disabled when capacity is 0).
    cache: Option<Cache<String, String>>,

    /// `tool` / `email` / `api_key` parameters.
    identity: Identity,

    /// E-utilities base URL.
    base_url: String,

    /// Request spacing, shared across clones and concurrent searches.
    pacer: Arc<Pacer>,

    /// Retry policy.
    retry: RetryPolicy,

    summary_batch_size: usize,
    abstract_batch_size: usize,
    fetch_abstracts: bool,

    sleeper: Arc<dyn Sleeper>,
}

impl PubMedClient {
    /// Create a new client with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns error if HTTP client initialization fails.
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let client = Client::builder()
            .user_agent(format!("{}/{}", config.identity.tool, env!("CARGO_PKG_VERSION")))
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .gzip(true)
            .build()?;

        let cache = (config.cache_max_size > 0).then(|| {
            Cache::builder()
                .max_capacity(config.cache_max_size)
                .time_to_live(config.cache_ttl)
                .build()
        });

        Ok(Self {
            client,
            cache,
            identity: config.identity,
            base_url: config.base_url,
            pacer: Arc::new(Pacer::new(config.politeness_interval)),
            retry: config.retry,
            summary_batch_size: config.summary_batch_size.max(1),
            abstract_batch_size: config.abstract_batch_size.max(1),
            fetch_abstracts: config.fetch_abstracts,
            sleeper: Arc::new(TokioSleeper),
        })
    }

    /// Replace the sleeper used for politeness and retry delays.
    #[must_use]
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// Check if an API key is configured.
    #[must_use]
    pub fn has_api_key(&self) -> bool {
        self.identity.api_key.is_some()
    }

    /// Discovery phase: ordered PMIDs for `criteria`, dated as of today.
    ///
    /// # Errors
    ///
    /// Returns error on API failure or when PubMed rejects the query.
    #[tracing::instrument(skip(self, criteria), fields(query = %criteria.query))]
    pub async fn discover(&self, criteria: &SearchCriteria) -> RemoteResult<Discovery> {
        let today = chrono::Utc::now().date_naive();
        let params = query::discovery_params(criteria, today);
        let max_ids = criteria.max_results as usize;

        let discovery =
            self.request("esearch.fcgi", params, |body| parse::parse_esearch(body, max_ids)).await?;

        tracing::debug!(
            ids = discovery.ids.len(),
            total_available = discovery.total_available,
            "Discovery complete"
        );
        Ok(discovery)
    }

    /// Detail phase: records for `ids`, in order, batched.
    ///
    /// A batch whose transient failure outlasts the retry policy is dropped
    /// and counted in the returned warning. A permanent failure aborts.
    ///
    /// # Errors
    ///
    /// Returns error on a permanent API failure.
    #[tracing::instrument(skip(self, ids), fields(count = ids.len()))]
    pub async fn fetch_details(
        &self,
        ids: &[String],
    ) -> RemoteResult<(Vec<ArticleRecord>, PartialResultWarning)> {
        let mut records = Vec::with_capacity(ids.len());
        let mut warning = PartialResultWarning::default();

        for (batch, chunk) in ids.chunks(self.summary_batch_size).enumerate() {
            let params = vec![
                ("id".to_string(), chunk.join(",")),
                ("retmode".to_string(), "json".to_string()),
            ];

            match self.request("esummary.fcgi", params, |body| parse::parse_esummary(body, chunk)).await {
                Ok(mut batch_records) => {
                    if self.fetch_abstracts {
                        self.attach_abstracts(&mut batch_records).await;
                    }
                    records.extend(batch_records);
                }
                Err(err) if err.is_retryable() => {
                    tracing::warn!(batch, size = chunk.len(), error = %err, "Dropping detail batch");
                    warning.record_dropped_batch(chunk.len());
                }
                Err(err) => return Err(err),
            }
        }

        Ok((records, warning))
    }

    /// Fill in abstracts for `records`. Failures leave abstracts empty.
    async fn attach_abstracts(&self, records: &mut [ArticleRecord]) {
        for chunk in records.chunks_mut(self.abstract_batch_size) {
            let id_list = chunk.iter().map(|r| r.pmid.as_str()).collect::<Vec<_>>().join(",");
            let params = vec![
                ("id".to_string(), id_list),
                ("retmode".to_string(), "xml".to_string()),
                ("rettype".to_string(), "abstract".to_string()),
            ];

            match self.request("efetch.fcgi", params, parse::parse_efetch_abstracts).await {
                Ok(mut abstracts) => {
                    for record in chunk.iter_mut() {
                        record.abstract_text = abstracts.remove(&record.pmid);
                    }
                }
                Err(err) => {
                    tracing::warn!(size = chunk.len(), error = %err, "Abstracts unavailable for batch");
                }
            }
        }
    }

    /// GET `endpoint` and parse the body, under the retry policy.
    ///
    /// Parsing happens inside the retry loop so a garbled body is retried
    /// like any other transient failure. Only parseable bodies are cached.
    async fn request<T, P>(
        &self,
        endpoint: &str,
        params: Vec<(String, String)>,
        parse: P,
    ) -> RemoteResult<T>
    where
        T: Send,
        P: Fn(&str) -> RemoteResult<T> + Sync,
    {
        let url = format!("{}/{endpoint}", self.base_url);
        let params = self.with_identity(params);
        let cache_key = Self::cache_key(&url, &params);

        if let Some(cache) = &self.cache {
            if let Some(body) = cache.get(&cache_key).await {
                if let Ok(value) = parse(&body) {
                    tracing::trace!(endpoint, "Cache hit");
                    return Ok(value);
                }
            }
        }

        let (url, params, parse) = (&url, &params, &parse);
        let (body, value) = with_retry(&self.retry, self.sleeper.as_ref(), endpoint, move || async move {
            self.pacer.wait(self.sleeper.as_ref()).await;
            let body = self.send_once(url, params).await?;
            let value = parse(&body)?;
            Ok((body, value))
        })
        .await?;

        if let Some(cache) = &self.cache {
            cache.insert(cache_key, body).await;
        }

        Ok(value)
    }

    /// One HTTP attempt.
    async fn send_once(&self, url: &str, params: &[(String, String)]) -> RemoteResult<String> {
        tracing::debug!(url, "GET");
        let response = self.client.get(url).query(params).send().await?;
        let response = Self::handle_response(response).await?;
        Ok(response.text().await?)
    }

    /// Handle API response status codes.
    async fn handle_response(response: reqwest::Response) -> RemoteResult<reqwest::Response> {
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        match status.as_u16() {
            429 => {
                let retry_after = response
                    .headers()
                    .get(reqwest::header::RETRY_AFTER)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.trim().parse().ok());

                Err(RemoteError::rate_limited(retry_after))
            }
            401 | 403 => {
                let text = response.text().await.unwrap_or_default();
                Err(RemoteError::Unauthorized { status: status.as_u16(), message: text })
            }
            400 | 404 => {
                let text = response.text().await.unwrap_or_default();
                Err(RemoteError::bad_request(text))
            }
            500..=599 => {
                let text = response.text().await.unwrap_or_default();
                Err(RemoteError::server(status.as_u16(), text))
            }
            _ => {
                let text = response.text().await.unwrap_or_default();
                Err(RemoteError::UnexpectedStatus { status: status.as_u16(), message: text })
            }
        }
    }

    /// Prefix `params` with the database and identification parameters.
    fn with_identity(&self, params: Vec<(String, String)>) -> Vec<(String, String)> {
        let mut all = vec![
            ("db".to_string(), "pubmed".to_string()),
            ("tool".to_string(), self.identity.tool.clone()),
            ("email".to_string(), self.identity.email.clone()),
        ];
        if let Some(key) = &self.identity.api_key {
            all.push(("api_key".to_string(), key.clone()));
        }
        all.extend(params);
        all
    }

    /// Generate cache key.
    fn cache_key(url: &str, params: &[(String, String)]) -> String {
        use md5::{Digest, Md5};

        let mut hasher = Md5::new();
        hasher.update(url.as_bytes());
        hasher.update(b"|");

        for (k, v) in params {
            hasher.update(k.as_bytes());
            hasher.update(b"=");
            hasher.update(v.as_bytes());
            hasher.update(b"&");
        }

        format!("{:x}", hasher.finalize())
    }
}

#[async_trait]
impl ArticleSource for PubMedClient {
    #[tracing::instrument(skip(self, criteria), fields(query = %criteria.query))]
    async fn search(&self, criteria: &SearchCriteria) -> RemoteResult<SearchOutcome> {
        let discovery = self.discover(criteria).await?;
        if discovery.ids.is_empty() {
            return Ok(SearchOutcome {
                records: Vec::new(),
                total_available: discovery.total_available,
                warning: None,
            });
        }

        let (records, warning) = self.fetch_details(&discovery.ids).await?;

        Ok(SearchOutcome {
            records,
            total_available: discovery.total_available,
            warning: (!warning.is_empty()).then_some(warning),
        })
    }
}

impl std::fmt::Debug for PubMedClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PubMedClient")
            .field("base_url", &self.base_url)
            .field("has_api_key", &self.has_api_key())
            .field("politeness_interval", &self.pacer.interval())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_key_depends_on_params() {
        let params_a = vec![("id".to_string(), "1".to_string())];
        let params_b = vec![("id".to_string(), "2".to_string())];
        let a = PubMedClient::cache_key("http://x/esummary.fcgi", &params_a);
        let b = PubMedClient::cache_key("http://x/esummary.fcgi", &params_b);
        assert_ne!(a, b);
        assert_eq!(a, PubMedClient::cache_key("http://x/esummary.fcgi", &params_a));
        assert_eq!(a.len(), 32);
    }

    #[test]
    fn test_identity_params() {
        let mut config = Config::for_testing("http://localhost");
        config.identity = Identity::new("tool-x", "me@example.org", Some("k".to_string()));
        let client = PubMedClient::new(config).unwrap();
        let params = client.with_identity(vec![("term".to_string(), "q".to_string())]);
        let keys: Vec<&str> = params.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["db", "tool", "email", "api_key", "term"]);
    }

    #[test]
    fn test_debug_hides_api_key() {
        let mut config = Config::for_testing("http://localhost");
        config.identity = Identity::new("t", "e@x.org", Some("very-secret".to_string()));
        let client = PubMedClient::new(config).unwrap();
        let debug = format!("{client:?}");
        assert!(!debug.contains("very-secret"));
        assert!(debug.contains("has_api_key: true"));
    }
}
