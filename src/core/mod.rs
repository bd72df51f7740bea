pub mod assembler;
pub mod etl;
pub mod executor;
pub mod extraction;
pub mod pipeline;

pub use crate::domain::model::{EnrichedBatch, InputRecord, Outcome, OutputRecord};
pub use crate::domain::ports::{ConfigProvider, Enricher, Pipeline, Storage};
pub use crate::utils::error::Result;
