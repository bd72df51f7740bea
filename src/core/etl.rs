use crate::core::Pipeline;
use crate::domain::model::RunSummary;
use crate::utils::error::Result;

/// What a finished run produced.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub output_path: String,
    pub summary: RunSummary,
}

pub struct EtlEngine<P: Pipeline> {
    pipeline: P,
}

impl<P: Pipeline> EtlEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self { pipeline }
    }

    pub fn pipeline(&self) -> &P {
        &self.pipeline
    }

    pub async fn run(&self) -> Result<RunReport> {
        tracing::info!("Starting enrichment run...");

        tracing::info!("Extracting companies...");
        let records = self.pipeline.extract().await?;

        tracing::info!("Enriching {} companies...", records.len());
        let batch = self.pipeline.transform(records).await?;
        let summary = batch.summary.clone();

        tracing::info!("Writing {} rows...", batch.rows.len());
        let output_path = self.pipeline.load(batch).await?;

        log_summary(&summary, &output_path);
        Ok(RunReport {
            output_path,
            summary,
        })
    }
}

fn log_summary(summary: &RunSummary, output_path: &str) {
    tracing::info!(
        total = summary.total,
        succeeded = summary.succeeded,
        failed = summary.failed,
        "✅ Enriched {}/{} companies ({} failed)",
        summary.succeeded,
        summary.total,
        summary.failed
    );
    tracing::info!(
        "Started: {}, finished: {}, duration: {}s",
        summary.started_at.format("%Y-%m-%d %H:%M:%S"),
        summary.finished_at.format("%Y-%m-%d %H:%M:%S"),
        summary.duration().num_seconds()
    );
    tracing::info!("📁 Output saved to: {}", output_path);
}
