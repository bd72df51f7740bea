use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Input CSV columns, in the order they are written back out.
pub const INPUT_COLUMNS: [&str; 6] = [
    "location",
    "company_name",
    "website",
    "phone",
    "email",
    "description",
];

/// Columns appended to every output row.
pub const ENRICHMENT_COLUMNS: [&str; 5] = [
    "contact_email",
    "contact_first_name",
    "contact_last_name",
    "contact_title",
    "num_properties",
];

/// One company row read from the input table.
///
/// Rows are identified by their position in the input, `company_name` is not unique.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputRecord {
    pub location: String,
    pub company_name: String,
    pub website: String,
    pub phone: String,
    pub email: String,
    pub description: String,
}

/// Contact details inferred for one company. `None` means "not found".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichmentResult {
    pub contact_email: Option<String>,
    pub contact_first_name: Option<String>,
    pub contact_last_name: Option<String>,
    pub contact_title: Option<String>,
    /// Free-form, may carry a qualifier such as "over 100".
    pub num_properties: Option<String>,
}

impl EnrichmentResult {
    pub fn is_empty(&self) -> bool {
        self.contact_email.is_none()
            && self.contact_first_name.is_none()
            && self.contact_last_name.is_none()
            && self.contact_title.is_none()
            && self.num_properties.is_none()
    }
}

/// Why a single row could not be enriched.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ServiceError {
    #[error("request timed out")]
    Timeout,

    #[error("rate limited by service")]
    RateLimited { retry_after: Option<Duration> },

    #[error("service unavailable (HTTP {status})")]
    Unavailable { status: u16 },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("request rejected (HTTP {status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("empty response")]
    EmptyResponse,

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    /// Transient failures may succeed on a later attempt.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ServiceError::Timeout
                | ServiceError::RateLimited { .. }
                | ServiceError::Unavailable { .. }
                | ServiceError::Transport(_)
        )
    }

    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            ServiceError::RateLimited { retry_after } => *retry_after,
            _ => None,
        }
    }
}

/// Terminal state of one row, produced exactly once per input record.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Success(EnrichmentResult),
    Failure(ServiceError),
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }
}

/// Input columns followed by the enrichment columns. `None` renders as an empty field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputRecord {
    pub location: String,
    pub company_name: String,
    pub website: String,
    pub phone: String,
    pub email: String,
    pub description: String,
    pub contact_email: Option<String>,
    pub contact_first_name: Option<String>,
    pub contact_last_name: Option<String>,
    pub contact_title: Option<String>,
    pub num_properties: Option<String>,
}

impl OutputRecord {
    pub fn new(record: &InputRecord, enrichment: EnrichmentResult) -> Self {
        Self {
            location: record.location.clone(),
            company_name: record.company_name.clone(),
            website: record.website.clone(),
            phone: record.phone.clone(),
            email: record.email.clone(),
            description: record.description.clone(),
            contact_email: enrichment.contact_email,
            contact_first_name: enrichment.contact_first_name,
            contact_last_name: enrichment.contact_last_name,
            contact_title: enrichment.contact_title,
            num_properties: enrichment.num_properties,
        }
    }

    pub fn blank(record: &InputRecord) -> Self {
        Self::new(record, EnrichmentResult::default())
    }
}

/// Row counts and timing for one run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub started_at: DateTime<Local>,
    pub finished_at: DateTime<Local>,
}

impl RunSummary {
    pub fn from_outcomes(
        outcomes: &[Outcome],
        started_at: DateTime<Local>,
        finished_at: DateTime<Local>,
    ) -> Self {
        let succeeded = outcomes.iter().filter(|o| o.is_success()).count();
        Self {
            total: outcomes.len(),
            succeeded,
            failed: outcomes.len() - succeeded,
            started_at,
            finished_at,
        }
    }

    pub fn duration(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }
}

/// Output of the transform phase, ready to be written.
#[derive(Debug, Clone)]
pub struct EnrichedBatch {
    pub rows: Vec<OutputRecord>,
    pub summary: RunSummary,
}
