use crate::domain::model::{EnrichedBatch, InputRecord, Outcome};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
    /// Fails if `path` cannot be written. Must not truncate an existing file.
    fn ensure_writable(&self, path: &str) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn input_path(&self) -> &str;
    fn output_path(&self) -> &str;
    fn max_records(&self) -> Option<usize>;
}

/// One lookup against the external knowledge service for one row.
///
/// Implementations never fail out of `enrich`: every error ends up in
/// `Outcome::Failure`.
#[async_trait]
pub trait Enricher: Send + Sync {
    async fn enrich(&self, record: &InputRecord) -> Outcome;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<Vec<InputRecord>>;
    async fn transform(&self, records: Vec<InputRecord>) -> Result<EnrichedBatch>;
    async fn load(&self, batch: EnrichedBatch) -> Result<String>;
}
