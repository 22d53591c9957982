//! Configuration for the PubMed top-journals pipeline.

use std::path::PathBuf;
use std::time::Duration;

use crate::client::retry::RetryPolicy;
use crate::metrics::AliasCollisionPolicy;

/// E-utilities constants.
pub mod api {
    use std::time::Duration;

    /// Base URL for NCBI E-utilities.
    pub const BASE_URL: &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils";

    /// Request timeout.
    pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

    /// Connection timeout.
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

    /// Interval between requests without an API key (~3 req/s).
    pub const POLITENESS_INTERVAL: Duration = Duration::from_millis(340);

    /// Interval between requests with an API key (10 req/s).
    pub const POLITENESS_INTERVAL_WITH_KEY: Duration = Duration::from_millis(100);

    /// Identifiers per esummary request.
    pub const SUMMARY_BATCH_SIZE: usize = 200;

    /// Identifiers per efetch request.
    pub const ABSTRACT_BATCH_SIZE: usize = 50;

    /// Attempts per request, including the first.
    pub const MAX_ATTEMPTS: u32 = 3;

    /// Delay after the first failed attempt.
    pub const BACKOFF_BASE: Duration = Duration::from_millis(500);

    /// Cap on any retry delay.
    pub const BACKOFF_MAX: Duration = Duration::from_secs(8);

    /// Random fraction of the backoff added to each delay.
    pub const BACKOFF_JITTER: f64 = 0.25;

    /// Cache TTL (5 minutes).
    pub const CACHE_TTL: Duration = Duration::from_secs(300);

    /// Maximum cache size.
    pub const CACHE_MAX_SIZE: u64 = 500;

    /// `tool` parameter when none is configured.
    pub const DEFAULT_TOOL_NAME: &str = "pubmed-topjournals";

    /// `email` parameter when none is configured.
    pub const DEFAULT_EMAIL: &str = "student@example.com";
}

/// Reference table locations.
pub mod metrics {
    /// Candidate paths tried in order when no explicit path is configured.
    pub const DEFAULT_PATHS: &[&str] = &[
        "journal_impact_factors/top_journals.json",
        ".private_data/top_journals.json",
        "top_journals.json",
    ];
}

/// How the client identifies itself to NCBI.
#[derive(Clone, PartialEq, Eq)]
pub struct Identity {
    /// `tool` parameter.
    pub tool: String,
    /// `email` parameter.
    pub email: String,
    /// NCBI API key (optional).
    pub api_key: Option<String>,
}

impl Identity {
    #[must_use]
    pub fn new(tool: impl Into<String>, email: impl Into<String>, api_key: Option<String>) -> Self {
        Self { tool: tool.into(), email: email.into(), api_key: api_key.filter(|k| !k.trim().is_empty()) }
    }
}

impl Default for Identity {
    fn default() -> Self {
        Self::new(api::DEFAULT_TOOL_NAME, api::DEFAULT_EMAIL, None)
    }
}

impl std::fmt::Debug for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Identity")
            .field("tool", &self.tool)
            .field("email", &self.email)
            .field("has_api_key", &self.api_key.is_some())
            .finish()
    }
}

/// Pipeline configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// NCBI identification.
    pub identity: Identity,

    /// E-utilities base URL (overridable for mock servers).
    pub base_url: String,

    /// Request timeout.
    pub request_timeout: Duration,

    /// Connection timeout.
    pub connect_timeout: Duration,

    /// Minimum gap between outbound requests, shared by all callers of a client.
    pub politeness_interval: Duration,

    /// Identifiers per esummary request.
    pub summary_batch_size: usize,

    /// Identifiers per efetch request.
    pub abstract_batch_size: usize,

    /// Whether to fetch abstracts after the summaries.
    pub fetch_abstracts: bool,

    /// Retry policy for every request.
    pub retry: RetryPolicy,

    /// Cache TTL.
    pub cache_ttl: Duration,

    /// Maximum cache size; 0 disables caching.
    pub cache_max_size: u64,

    /// Explicit metrics table path; otherwise the defaults are searched.
    pub metrics_path: Option<PathBuf>,

    /// What to do when two entries claim the same alias.
    pub alias_policy: AliasCollisionPolicy,

    /// Start with an empty index if the metrics table cannot be loaded.
    pub allow_degraded: bool,
}

impl Config {
    /// Create a configuration for `identity`.
    ///
    /// The politeness interval drops from 340 ms to 100 ms when an API key
    /// is present.
    #[must_use]
    pub fn new(identity: Identity) -> Self {
        Self {
            politeness_interval: politeness_for(&identity),
            identity,
            base_url: api::BASE_URL.to_string(),
            request_timeout: api::REQUEST_TIMEOUT,
            connect_timeout: api::CONNECT_TIMEOUT,
            summary_batch_size: api::SUMMARY_BATCH_SIZE,
            abstract_batch_size: api::ABSTRACT_BATCH_SIZE,
            fetch_abstracts: true,
            retry: RetryPolicy::default(),
            cache_ttl: api::CACHE_TTL,
            cache_max_size: api::CACHE_MAX_SIZE,
            metrics_path: None,
            alias_policy: AliasCollisionPolicy::default(),
            allow_degraded: false,
        }
    }

    /// Create a test configuration pointed at a mock server.
    #[must_use]
    pub fn for_testing(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            request_timeout: Duration::from_secs(5),
            connect_timeout: Duration::from_secs(2),
            politeness_interval: Duration::ZERO,
            fetch_abstracts: false,
            retry: RetryPolicy {
                max_attempts: api::MAX_ATTEMPTS,
                base_delay: Duration::from_millis(1),
                max_delay: Duration::from_millis(10),
                jitter: 0.0,
            },
            cache_ttl: Duration::ZERO,
            cache_max_size: 0,
            ..Self::new(Identity::new("pubmed-topjournals-tests", "tests@example.com", None))
        }
    }

    /// Create configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns error if environment variables are invalid.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Create configuration from a variable lookup. Blank values count as unset.
    ///
    /// # Errors
    ///
    /// Returns error if `PUBMED_BASE_URL` is not an http(s) URL.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let identity = Identity::new(
            var("NCBI_TOOL_NAME").unwrap_or_else(|| api::DEFAULT_TOOL_NAME.to_string()),
            var("NCBI_CONTACT_EMAIL").unwrap_or_else(|| api::DEFAULT_EMAIL.to_string()),
            var("NCBI_API_KEY"),
        );

        let mut config = Self::new(identity);
        if let Some(base_url) = var("PUBMED_BASE_URL") {
            config = config.with_base_url(&base_url)?;
        }
        config.metrics_path = var("JOURNAL_METRICS_PATH").map(PathBuf::from);

        Ok(config)
    }

    /// Replace the identity; the politeness interval follows the API key.
    #[must_use]
    pub fn with_identity(mut self, identity: Identity) -> Self {
        self.politeness_interval = politeness_for(&identity);
        self.identity = identity;
        self
    }

    /// Point the client at another E-utilities endpoint.
    ///
    /// # Errors
    ///
    /// Returns error if `base_url` is not an http(s) URL.
    pub fn with_base_url(mut self, base_url: &str) -> anyhow::Result<Self> {
        let base_url = base_url.trim();
        anyhow::ensure!(
            base_url.starts_with("http://") || base_url.starts_with("https://"),
            "PUBMED_BASE_URL must be an http(s) URL, got '{base_url}'"
        );
        self.base_url = base_url.trim_end_matches('/').to_string();
        Ok(self)
    }

    /// Check if an API key is configured.
    #[must_use]
    pub const fn has_api_key(&self) -> bool {
        self.identity.api_key.is_some()
    }
}

const fn politeness_for(identity: &Identity) -> Duration {
    if identity.api_key.is_some() { api::POLITENESS_INTERVAL_WITH_KEY } else { api::POLITENESS_INTERVAL }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(Identity::default())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert!(!config.has_api_key());
        assert_eq!(config.base_url, api::BASE_URL);
        assert_eq!(config.politeness_interval, api::POLITENESS_INTERVAL);
        assert_eq!(config.summary_batch_size, 200);
        assert!(config.fetch_abstracts);
    }

    #[test]
    fn test_config_with_api_key() {
        let config = Config::new(Identity::new("tool", "a@b.c", Some("key".to_string())));
        assert!(config.has_api_key());
        assert_eq!(config.politeness_interval, api::POLITENESS_INTERVAL_WITH_KEY);
    }

    #[test]
    fn test_blank_api_key_is_ignored() {
        let identity = Identity::new("tool", "a@b.c", Some("  ".to_string()));
        assert!(identity.api_key.is_none());
    }

    #[test]
    fn test_for_testing() {
        let config = Config::for_testing("http://127.0.0.1:9999/");
        assert_eq!(config.base_url, "http://127.0.0.1:9999");
        assert_eq!(config.politeness_interval, Duration::ZERO);
        assert_eq!(config.cache_max_size, 0);
        assert!(!config.fetch_abstracts);
        assert_eq!(config.retry.jitter, 0.0);
    }

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> =
            vars.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())).collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_from_lookup_defaults() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.identity.tool, api::DEFAULT_TOOL_NAME);
        assert_eq!(config.identity.email, api::DEFAULT_EMAIL);
        assert_eq!(config.base_url, api::BASE_URL);
        assert!(config.metrics_path.is_none());
    }

    #[test]
    fn test_from_lookup_reads_settings() {
        let config = Config::from_lookup(lookup(&[
            ("NCBI_TOOL_NAME", "my-tool"),
            ("NCBI_CONTACT_EMAIL", "me@example.org"),
            ("NCBI_API_KEY", "abc"),
            ("PUBMED_BASE_URL", "http://localhost:8080/eutils/"),
            ("JOURNAL_METRICS_PATH", "/data/top_journals.json"),
        ]))
        .unwrap();

        assert_eq!(config.identity.tool, "my-tool");
        assert_eq!(config.identity.email, "me@example.org");
        assert_eq!(config.politeness_interval, api::POLITENESS_INTERVAL_WITH_KEY);
        assert_eq!(config.base_url, "http://localhost:8080/eutils");
        assert_eq!(config.metrics_path, Some(PathBuf::from("/data/top_journals.json")));
    }

    #[test]
    fn test_from_lookup_blank_values_are_unset() {
        let config =
            Config::from_lookup(lookup(&[("NCBI_API_KEY", " "), ("PUBMED_BASE_URL", "")])).unwrap();
        assert!(!config.has_api_key());
        assert_eq!(config.base_url, api::BASE_URL);
    }

    #[test]
    fn test_from_lookup_rejects_non_http_base_url() {
        let err = Config::from_lookup(lookup(&[("PUBMED_BASE_URL", "ftp://example.org")])).unwrap_err();
        assert!(err.to_string().contains("http(s)"));
    }

    #[test]
    fn test_with_identity_updates_politeness() {
        let config = Config::default()
            .with_identity(Identity::new("t", "e@x.org", Some("key".to_string())));
        assert_eq!(config.politeness_interval, api::POLITENESS_INTERVAL_WITH_KEY);

        let config = config.with_identity(Identity::default());
        assert_eq!(config.politeness_interval, api::POLITENESS_INTERVAL);
    }

    #[test]
    fn test_identity_debug_hides_key() {
        let identity = Identity::new("tool", "a@b.c", Some("secret".to_string()));
        let debug = format!("{identity:?}");
        assert!(!debug.contains("secret"));
        assert!(debug.contains("has_api_key: true"));
    }
}
