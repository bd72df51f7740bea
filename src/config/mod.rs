pub mod cli;
pub mod run_config;
pub mod toml_config;

pub use run_config::{ConfigOverrides, RunConfig};

#[cfg(feature = "cli")]
use clap::Parser;

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "lead-enrich")]
#[command(about = "Enrich a CSV of companies with outreach contact details")]
pub struct CliConfig {
    /// Input CSV with location, company_name, website, phone, email, description
    #[arg(short, long)]
    pub input: Option<String>,

    /// Output CSV path
    #[arg(short, long)]
    pub output: Option<String>,

    /// Optional TOML config file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Maximum number of lookups in flight
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Per-request timeout in seconds
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Retries per row on timeouts, rate limits and 5xx responses
    #[arg(long)]
    pub max_retries: Option<u32>,

    /// Base retry delay in milliseconds, doubled on each attempt
    #[arg(long)]
    pub retry_backoff_ms: Option<u64>,

    /// Only process the first N companies
    #[arg(long)]
    pub limit: Option<usize>,

    /// Responses API endpoint
    #[arg(long)]
    pub endpoint: Option<String>,

    #[arg(long)]
    pub model: Option<String>,

    /// Do not enable the web search tool
    #[arg(long)]
    pub no_web_search: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub json_logs: bool,
}

#[cfg(feature = "cli")]
impl CliConfig {
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            input_path: self.input.clone(),
            output_path: self.output.clone(),
            concurrency: self.concurrency,
            timeout_secs: self.timeout_secs,
            max_retries: self.max_retries,
            retry_backoff_ms: self.retry_backoff_ms,
            max_records: self.limit,
            endpoint: self.endpoint.clone(),
            model: self.model.clone(),
            disable_web_search: self.no_web_search,
        }
    }
}
