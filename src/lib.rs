pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::{cli::LocalStorage, ConfigOverrides, RunConfig};

pub use adapters::{ClientConfig, OpenAiEnricher, PromptTemplate};
pub use self::core::{
    etl::{EtlEngine, RunReport},
    executor::{BoundedExecutor, ExecutorConfig},
    pipeline::EnrichmentPipeline,
};
pub use domain::model::{EnrichmentResult, InputRecord, Outcome, OutputRecord, ServiceError};
pub use utils::error::{EnrichError, Result};
