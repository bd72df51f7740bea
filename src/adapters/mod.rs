// Adapters layer: concrete implementations for external systems.

pub mod openai;
pub mod prompt;

pub use openai::{ClientConfig, OpenAiEnricher};
pub use prompt::PromptTemplate;
