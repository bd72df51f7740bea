use clap::Parser;
use lead_enrich::config::run_config::API_KEY_ENV;
use lead_enrich::config::toml_config::TomlConfig;
use lead_enrich::utils::error::{EnrichError, ErrorSeverity};
use lead_enrich::utils::{logger, validation::Validate};
use lead_enrich::{
    CliConfig, EnrichmentPipeline, EtlEngine, LocalStorage, OpenAiEnricher, RunConfig,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = CliConfig::parse();

    // Logging first so config errors are reported
    if cli.json_logs {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting lead-enrich");
    if cli.verbose {
        tracing::debug!("CLI flags: {:?}", cli);
    }

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => fail(&e),
    };

    tracing::info!(
        "Input: {}, output: {}, model: {}, concurrency: {}, retries: {}",
        config.input_path,
        config.output_path,
        config.client.model,
        config.executor.concurrency,
        config.executor.max_retries
    );

    let enricher = match OpenAiEnricher::new(config.client.clone()) {
        Ok(enricher) => enricher,
        Err(e) => fail(&e),
    };

    let storage = LocalStorage::new(".");
    let executor_config = config.executor.clone();
    let pipeline = EnrichmentPipeline::new(storage, config, enricher, executor_config);
    let engine = EtlEngine::new(pipeline);

    match engine.run().await {
        Ok(report) => {
            println!("✅ Enrichment complete!");
            println!(
                "📊 Total: {}, succeeded: {}, failed: {}",
                report.summary.total, report.summary.succeeded, report.summary.failed
            );
            println!("📁 Output saved to: {}", report.output_path);
        }
        Err(e) => fail(&e),
    }

    Ok(())
}

fn load_config(cli: &CliConfig) -> Result<RunConfig, EnrichError> {
    let file = match &cli.config {
        Some(path) => {
            tracing::info!("📁 Loading configuration from: {}", path);
            Some(TomlConfig::from_file(path)?)
        }
        None => None,
    };

    let config = RunConfig::resolve(
        &cli.overrides(),
        file.as_ref(),
        std::env::var(API_KEY_ENV).ok(),
    )?;
    config.validate()?;
    Ok(config)
}

fn fail(e: &EnrichError) -> ! {
    tracing::error!(
        "❌ Run failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());

    let exit_code = match e.severity() {
        ErrorSeverity::High => 1,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::Critical => 3,
    };
    std::process::exit(exit_code);
}
