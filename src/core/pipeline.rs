use crate::core::assembler::{assemble, read_csv, write_csv};
use crate::core::executor::{BoundedExecutor, ExecutorConfig};
use crate::core::{ConfigProvider, EnrichedBatch, Enricher, InputRecord, Pipeline, Storage};
use crate::domain::model::RunSummary;
use crate::utils::error::Result;
use chrono::Local;
use std::sync::Arc;

/// Reads the company table, enriches every row and writes the result table.
pub struct EnrichmentPipeline<S: Storage, C: ConfigProvider, E: Enricher + 'static> {
    storage: S,
    config: C,
    executor: BoundedExecutor<E>,
}

impl<S: Storage, C: ConfigProvider, E: Enricher + 'static> EnrichmentPipeline<S, C, E> {
    pub fn new(storage: S, config: C, enricher: E, executor_config: ExecutorConfig) -> Self {
        Self {
            storage,
            config,
            executor: BoundedExecutor::new(Arc::new(enricher), executor_config),
        }
    }

    pub fn executor(&self) -> &BoundedExecutor<E> {
        &self.executor
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider, E: Enricher + 'static> Pipeline for EnrichmentPipeline<S, C, E> {
    async fn extract(&self) -> Result<Vec<InputRecord>> {
        tracing::debug!("Reading input table: {}", self.config.input_path());
        let data = self.storage.read_file(self.config.input_path()).await?;
        let mut records = read_csv(&data)?;
        tracing::info!(
            "✓ Loaded {} companies from {}",
            records.len(),
            self.config.input_path()
        );

        if let Some(limit) = self.config.max_records() {
            if records.len() > limit {
                records.truncate(limit);
                tracing::info!("✓ Limiting to first {} companies", limit);
            }
        }

        // Fail on an unwritable destination before spending any requests.
        self.storage
            .ensure_writable(self.config.output_path())
            .await?;

        Ok(records)
    }

    async fn transform(&self, records: Vec<InputRecord>) -> Result<EnrichedBatch> {
        let started_at = Local::now();
        let outcomes = self.executor.run_all(&records).await;
        let finished_at = Local::now();

        let summary = RunSummary::from_outcomes(&outcomes, started_at, finished_at);
        let rows = assemble(&records, outcomes);

        Ok(EnrichedBatch { rows, summary })
    }

    async fn load(&self, batch: EnrichedBatch) -> Result<String> {
        let output_path = self.config.output_path().to_string();
        let data = write_csv(&batch.rows)?;

        tracing::debug!(
            "Writing {} rows ({} bytes) to {}",
            batch.rows.len(),
            data.len(),
            output_path
        );
        self.storage.write_file(&output_path, &data).await?;

        Ok(output_path)
    }
}
