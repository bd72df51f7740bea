use crate::adapters::openai::{ClientConfig, DEFAULT_ENDPOINT, DEFAULT_MODEL};
use crate::adapters::prompt::PromptTemplate;
use crate::config::toml_config::TomlConfig;
use crate::core::executor::ExecutorConfig;
use crate::core::ConfigProvider;
use crate::utils::error::{EnrichError, Result};
use crate::utils::validation::{
    validate_non_empty_string, validate_path, validate_positive_number, validate_range,
    validate_required_field, validate_url, Validate,
};
use std::time::Duration;

pub const DEFAULT_INPUT_PATH: &str = "companies.csv";
pub const DEFAULT_OUTPUT_PATH: &str = "leads_output/leads_all.csv";
pub const DEFAULT_CONCURRENCY: usize = 5;
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_RETRY_BACKOFF_MS: u64 = 1000;
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Values given explicitly on the command line. `None` falls through to the
/// config file and then to the built-in default.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub input_path: Option<String>,
    pub output_path: Option<String>,
    pub concurrency: Option<usize>,
    pub timeout_secs: Option<u64>,
    pub max_retries: Option<u32>,
    pub retry_backoff_ms: Option<u64>,
    pub max_records: Option<usize>,
    pub endpoint: Option<String>,
    pub model: Option<String>,
    pub disable_web_search: bool,
}

/// Fully resolved settings for one run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub input_path: String,
    pub output_path: String,
    pub max_records: Option<usize>,
    pub executor: ExecutorConfig,
    pub client: ClientConfig,
}

impl RunConfig {
    /// Merges flags, the optional config file and the environment key.
    /// Fails when no API key can be found.
    pub fn resolve(
        overrides: &ConfigOverrides,
        file: Option<&TomlConfig>,
        env_api_key: Option<String>,
    ) -> Result<Self> {
        let default_file = TomlConfig::default();
        let file = file.unwrap_or(&default_file);
        let source = &file.source;

        let api_key = file
            .api_key()
            .map(str::to_string)
            .or(env_api_key.filter(|k| !k.trim().is_empty()));
        let api_key = validate_required_field("api_key", &api_key)?.clone();

        let timeout_secs = overrides
            .timeout_secs
            .or(source.timeout_seconds)
            .unwrap_or(DEFAULT_TIMEOUT_SECS);
        validate_range("timeout_seconds", timeout_secs, 1, 3600)?;
        let request_timeout = Some(Duration::from_secs(timeout_secs));

        let executor = ExecutorConfig {
            concurrency: overrides
                .concurrency
                .or(file.extract.concurrent_requests)
                .unwrap_or(DEFAULT_CONCURRENCY),
            request_timeout,
            max_retries: overrides
                .max_retries
                .or(source.retry_attempts)
                .unwrap_or(0),
            retry_backoff: Duration::from_millis(
                overrides
                    .retry_backoff_ms
                    .or(source.retry_delay_ms)
                    .unwrap_or(DEFAULT_RETRY_BACKOFF_MS),
            ),
        };

        let client = ClientConfig {
            endpoint: overrides
                .endpoint
                .clone()
                .or_else(|| source.endpoint.clone())
                .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
            model: overrides
                .model
                .clone()
                .or_else(|| source.model.clone())
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            api_key,
            web_search: !overrides.disable_web_search && source.web_search.unwrap_or(true),
            request_timeout,
            prompt: file
                .prompt_template()
                .map(PromptTemplate::new)
                .unwrap_or_default(),
        };

        Ok(Self {
            input_path: overrides
                .input_path
                .clone()
                .or_else(|| file.io.input_path.clone())
                .unwrap_or_else(|| DEFAULT_INPUT_PATH.to_string()),
            output_path: overrides
                .output_path
                .clone()
                .or_else(|| file.io.output_path.clone())
                .unwrap_or_else(|| DEFAULT_OUTPUT_PATH.to_string()),
            max_records: overrides.max_records.or(file.extract.max_records),
            executor,
            client,
        })
    }
}

impl Validate for RunConfig {
    fn validate(&self) -> Result<()> {
        validate_path("input_path", &self.input_path)?;
        validate_path("output_path", &self.output_path)?;
        if self.input_path == self.output_path {
            return Err(EnrichError::ConfigValidationError {
                field: "output_path".to_string(),
                message: "output would overwrite the input table".to_string(),
            });
        }

        validate_positive_number("concurrency", self.executor.concurrency, 1)?;
        if let Some(limit) = self.max_records {
            validate_positive_number("max_records", limit, 1)?;
        }

        validate_url("endpoint", &self.client.endpoint)?;
        validate_non_empty_string("model", &self.client.model)?;
        validate_non_empty_string("api_key", &self.client.api_key)?;

        if !self.client.prompt.references_company() {
            return Err(EnrichError::ConfigValidationError {
                field: "prompt.template".to_string(),
                message: "template must contain {company_name}".to_string(),
            });
        }

        Ok(())
    }
}

impl ConfigProvider for RunConfig {
    fn input_path(&self) -> &str {
        &self.input_path
    }

    fn output_path(&self) -> &str {
        &self.output_path
    }

    fn max_records(&self) -> Option<usize> {
        self.max_records
    }
}
