use crate::adapters::prompt::PromptTemplate;
use crate::core::extraction::extract_contact;
use crate::domain::model::{InputRecord, Outcome, ServiceError};
use crate::domain::ports::Enricher;
use crate::utils::error::Result;
use async_trait::async_trait;
use reqwest::header::RETRY_AFTER;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1/responses";
pub const DEFAULT_MODEL: &str = "gpt-5";

/// Settings for the knowledge-retrieval service.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub endpoint: String,
    pub model: String,
    pub api_key: String,
    /// Let the model search the web before answering.
    pub web_search: bool,
    /// Transport-level timeout, normally the same value the executor uses.
    pub request_timeout: Option<Duration>,
    pub prompt: PromptTemplate,
}

#[derive(Serialize)]
struct ResponsesRequest<'a> {
    model: &'a str,
    input: &'a str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<Tool>,
}

#[derive(Serialize)]
struct Tool {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Deserialize)]
struct ResponsesPayload {
    #[serde(default)]
    output_text: Option<String>,
    #[serde(default)]
    output: Vec<OutputItem>,
}

#[derive(Deserialize)]
struct OutputItem {
    #[serde(default)]
    content: Vec<ContentPart>,
}

#[derive(Deserialize)]
struct ContentPart {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

impl ResponsesPayload {
    fn into_text(self) -> String {
        if let Some(text) = self.output_text.filter(|t| !t.trim().is_empty()) {
            return text;
        }
        self.output
            .into_iter()
            .flat_map(|item| item.content)
            .filter(|part| part.kind == "output_text" || part.kind == "text")
            .filter_map(|part| part.text)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Enricher backed by an OpenAI Responses-style HTTP endpoint.
///
/// Sends one request per row and never retries; retry policy lives in
/// [`crate::core::executor::BoundedExecutor`].
pub struct OpenAiEnricher {
    client: Client,
    config: ClientConfig,
}

impl OpenAiEnricher {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    async fn query(&self, prompt: &str) -> std::result::Result<String, ServiceError> {
        let tools = if self.config.web_search {
            vec![Tool { kind: "web_search" }]
        } else {
            Vec::new()
        };
        let body = ResponsesRequest {
            model: &self.config.model,
            input: prompt,
            tools,
        };

        let response = self
            .client
            .post(&self.config.endpoint)
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(classify_transport)?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok())
                .map(Duration::from_secs);
            let message = response.text().await.unwrap_or_default();
            return Err(classify_status(status, retry_after, &message));
        }

        let payload: ResponsesPayload = response.json().await.map_err(|e| {
            if e.is_timeout() {
                ServiceError::Timeout
            } else {
                ServiceError::MalformedResponse(e.to_string())
            }
        })?;

        let text = payload.into_text();
        if text.trim().is_empty() {
            return Err(ServiceError::EmptyResponse);
        }
        Ok(text)
    }
}

#[async_trait]
impl Enricher for OpenAiEnricher {
    async fn enrich(&self, record: &InputRecord) -> Outcome {
        if record.company_name.trim().is_empty() {
            return Outcome::Failure(ServiceError::InvalidInput(
                "company_name is empty".to_string(),
            ));
        }

        debug!("🔍 Searching for contact at: {}", record.company_name);
        let prompt = self.config.prompt.render(record);

        match self.query(&prompt).await {
            Ok(text) => {
                let result = extract_contact(&text);
                if result.is_empty() {
                    debug!(
                        company = %record.company_name,
                        "No contact fields found in answer: {}",
                        text.chars().take(300).collect::<String>()
                    );
                }
                Outcome::Success(result)
            }
            Err(error) => Outcome::Failure(error),
        }
    }
}

fn classify_transport(error: reqwest::Error) -> ServiceError {
    if error.is_timeout() {
        ServiceError::Timeout
    } else if error.is_builder() {
        ServiceError::Internal(error.to_string())
    } else {
        ServiceError::Transport(error.to_string())
    }
}

fn classify_status(status: StatusCode, retry_after: Option<Duration>, body: &str) -> ServiceError {
    match status {
        StatusCode::TOO_MANY_REQUESTS => ServiceError::RateLimited { retry_after },
        StatusCode::REQUEST_TIMEOUT => ServiceError::Unavailable {
            status: status.as_u16(),
        },
        s if s.is_server_error() => ServiceError::Unavailable { status: s.as_u16() },
        s => ServiceError::Rejected {
            status: s.as_u16(),
            message: body.chars().take(200).collect(),
        },
    }
}
