use crate::utils::error::{EnrichError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::LazyLock;

static ENV_VAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").expect("env var pattern"));

/// Optional config file. Every value may be omitted; command-line flags win
/// over anything set here.
///
/// ```toml
/// [source]
/// endpoint = "https://api.openai.com/v1/responses"
/// model = "gpt-5"
/// api_key = "${OPENAI_API_KEY}"
/// timeout_seconds = 120
/// retry_attempts = 2
///
/// [extract]
/// concurrent_requests = 5
///
/// [io]
/// input_path = "companies.csv"
/// output_path = "leads_output/leads_all.csv"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub extract: ExtractConfig,
    #[serde(default)]
    pub io: IoConfig,
    pub prompt: Option<PromptConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceConfig {
    pub endpoint: Option<String>,
    pub model: Option<String>,
    pub api_key: Option<String>,
    pub timeout_seconds: Option<u64>,
    pub retry_attempts: Option<u32>,
    pub retry_delay_ms: Option<u64>,
    pub web_search: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractConfig {
    pub concurrent_requests: Option<usize>,
    pub max_records: Option<usize>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IoConfig {
    pub input_path: Option<String>,
    pub output_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptConfig {
    pub template: String,
}

impl TomlConfig {
    /// Loads a config file, substituting `${VAR}` references first.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(EnrichError::IoError)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| EnrichError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` with the variable's value; unset variables are left as written.
    fn substitute_env_vars(content: &str) -> String {
        ENV_VAR_RE
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .to_string()
    }

    /// API key from the file, ignoring a `${VAR}` reference that did not resolve.
    pub fn api_key(&self) -> Option<&str> {
        self.source
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty() && !ENV_VAR_RE.is_match(key))
    }

    pub fn prompt_template(&self) -> Option<&str> {
        self.prompt.as_ref().map(|p| p.template.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_full_config() {
        let toml_content = r#"
[source]
endpoint = "https://api.example.com/v1/responses"
model = "gpt-test"
api_key = "sk-file"
timeout_seconds = 30
retry_attempts = 2
retry_delay_ms = 250
web_search = false

[extract]
concurrent_requests = 8
max_records = 100

[io]
input_path = "in.csv"
output_path = "out/leads.csv"

[prompt]
template = "Who runs {company_name}?"
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(
            config.source.endpoint.as_deref(),
            Some("https://api.example.com/v1/responses")
        );
        assert_eq!(config.source.retry_attempts, Some(2));
        assert_eq!(config.source.web_search, Some(false));
        assert_eq!(config.extract.concurrent_requests, Some(8));
        assert_eq!(config.io.output_path.as_deref(), Some("out/leads.csv"));
        assert_eq!(config.api_key(), Some("sk-file"));
        assert_eq!(config.prompt_template(), Some("Who runs {company_name}?"));
    }

    #[test]
    fn test_empty_file_is_all_defaults() {
        let config = TomlConfig::from_toml_str("").unwrap();
        assert!(config.source.endpoint.is_none());
        assert!(config.prompt.is_none());
        assert!(config.api_key().is_none());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("LEAD_ENRICH_TEST_KEY", "sk-from-env");

        let config = TomlConfig::from_toml_str(
            r#"
[source]
api_key = "${LEAD_ENRICH_TEST_KEY}"
"#,
        )
        .unwrap();
        assert_eq!(config.api_key(), Some("sk-from-env"));

        std::env::remove_var("LEAD_ENRICH_TEST_KEY");
    }

    #[test]
    fn test_unresolved_env_var_is_not_a_key() {
        let config = TomlConfig::from_toml_str(
            r#"
[source]
api_key = "${LEAD_ENRICH_SURELY_UNSET_VAR}"
"#,
        )
        .unwrap();
        assert!(config.api_key().is_none());
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let result = TomlConfig::from_toml_str("[source\nendpoint = ");
        assert!(matches!(
            result,
            Err(EnrichError::ConfigValidationError { .. })
        ));
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[extract]\nconcurrent_requests = 3\n")
            .unwrap();

        let config = TomlConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.extract.concurrent_requests, Some(3));
    }
}
