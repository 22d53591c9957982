//! PubMed Top Journals - Entry Point
//!
//! `search` runs one query and prints the ranked results; `serve` exposes
//! the pipeline over HTTP.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use pubmed_topjournals::config::{Config, Identity};
use pubmed_topjournals::formatters::{format_results_markdown, results_envelope};
use pubmed_topjournals::models::ResponseFormat;
use pubmed_topjournals::{AliasCollisionPolicy, ArticleType, JournalMode, Pipeline, SearchCriteria, SortMode, server};

#[derive(Parser, Debug)]
#[command(name = "pubmed-topjournals")]
#[command(about = "PubMed search filtered and ranked by journal impact metrics")]
#[command(version)]
struct Cli {
    /// NCBI API key (optional, raises the rate ceiling from 3 to 10 req/s)
    #[arg(long, env = "NCBI_API_KEY", hide_env_values = true, global = true)]
    api_key: Option<String>,

    /// Tool name reported to NCBI [default: pubmed-topjournals]
    #[arg(long, env = "NCBI_TOOL_NAME", global = true)]
    tool: Option<String>,

    /// Contact email reported to NCBI
    #[arg(long, env = "NCBI_CONTACT_EMAIL", global = true)]
    email: Option<String>,

    /// Journal metrics JSON file (defaults to the first existing standard location)
    #[arg(long, env = "JOURNAL_METRICS_PATH", global = true)]
    metrics_path: Option<PathBuf>,

    /// E-utilities base URL
    #[arg(long, env = "PUBMED_BASE_URL", global = true)]
    base_url: Option<String>,

    /// Start without journal metrics if the table cannot be loaded
    #[arg(long, global = true)]
    allow_degraded: bool,

    /// Reject the metrics table when two journals claim the same alias
    #[arg(long, global = true)]
    strict_aliases: bool,

    /// Skip abstract retrieval
    #[arg(long, global = true)]
    no_abstracts: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "RUST_LOG", global = true)]
    log_level: String,

    /// Output logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run one search and print the results
    Search(SearchArgs),

    /// Serve the search API over HTTP
    Serve {
        /// HTTP server port
        #[arg(long, default_value = "8000", env = "PORT")]
        port: u16,
    },
}

#[derive(Args, Debug)]
struct SearchArgs {
    /// PubMed query
    query: String,

    /// Publication type filter
    #[arg(long, value_enum, default_value_t = ArticleType::Any)]
    article_type: ArticleType,

    /// Restrict to human studies
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    humans_only: bool,

    /// Restrict to free full text
    #[arg(long)]
    open_access: bool,

    /// Publication window in years (1-15)
    #[arg(long, default_value_t = 5)]
    years_back: u32,

    /// Identifiers requested from PubMed (10-100)
    #[arg(long, default_value_t = 50)]
    max_results: u32,

    /// Journal filter
    #[arg(long, value_enum, default_value_t = JournalMode::TopJournals)]
    journal_mode: JournalMode,

    /// Result ordering
    #[arg(long, value_enum, default_value_t = SortMode::Relevance)]
    sort: SortMode,

    /// Output format
    #[arg(long, value_enum, default_value_t = ResponseFormat::Markdown)]
    format: ResponseFormat,
}

impl SearchArgs {
    fn criteria(&self) -> SearchCriteria {
        SearchCriteria::new(self.query.clone())
            .with_article_type(self.article_type)
            .with_humans_only(self.humans_only)
            .with_open_access_only(self.open_access)
            .with_years_back(self.years_back)
            .with_max_results(self.max_results)
            .with_journal_mode(self.journal_mode)
            .with_sort(self.sort)
    }
}

impl Cli {
    /// Environment settings, overridden by explicit flags.
    fn config(&self) -> anyhow::Result<Config> {
        let mut config = Config::from_env()?;

        let identity = Identity::new(
            self.tool.clone().unwrap_or_else(|| config.identity.tool.clone()),
            self.email.clone().unwrap_or_else(|| config.identity.email.clone()),
            self.api_key.clone().or_else(|| config.identity.api_key.clone()),
        );
        config = config.with_identity(identity);

        if let Some(base_url) = &self.base_url {
            config = config.with_base_url(base_url)?;
        }
        if self.metrics_path.is_some() {
            config.metrics_path.clone_from(&self.metrics_path);
        }
        config.allow_degraded = self.allow_degraded;
        config.fetch_abstracts = !self.no_abstracts;
        if self.strict_aliases {
            config.alias_policy = AliasCollisionPolicy::Reject;
        }

        Ok(config)
    }
}

fn init_tracing(log_level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let subscriber = tracing_subscriber::registry().with(filter);

    if json {
        subscriber.with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr)).init();
    } else {
        subscriber.with(tracing_subscriber::fmt::layer().compact().with_writer(std::io::stderr)).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    init_tracing(&cli.log_level, cli.json_logs);

    let config = cli.config()?;
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        has_api_key = config.has_api_key(),
        base_url = %config.base_url,
        "Starting PubMed top-journals pipeline"
    );

    let pipeline = Pipeline::bootstrap(&config)?;

    match cli.command {
        Command::Search(args) => {
            let criteria = args.criteria();
            let result = match pipeline.run(&criteria).await {
                Ok(result) => result,
                Err(err) => {
                    tracing::error!(error = %err, "Search failed");
                    anyhow::bail!(err.to_user_message());
                }
            };

            if args.format.is_json() {
                println!("{}", serde_json::to_string_pretty(&results_envelope(&result))?);
            } else {
                println!("{}", format_results_markdown(&criteria.query, &result));
            }
        }
        Command::Serve { port } => {
            server::serve(pipeline, port).await?;
        }
    }

    Ok(())
}
