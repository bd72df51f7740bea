use anyhow::Result;
use httpmock::prelude::*;
use lead_enrich::utils::validation::Validate;
use lead_enrich::{
    ConfigOverrides, EnrichError, EnrichmentPipeline, EtlEngine, LocalStorage, OpenAiEnricher,
    RunConfig, RunReport,
};
use tempfile::TempDir;

const HEADER: &str = "location,company_name,website,phone,email,description";
const OUTPUT_HEADER: &str = "location,company_name,website,phone,email,description,contact_email,contact_first_name,contact_last_name,contact_title,num_properties";

fn answer(text: &str) -> serde_json::Value {
    serde_json::json!({
        "output": [
            {"type": "web_search_call", "status": "completed"},
            {"type": "message", "content": [{"type": "output_text", "text": text}]}
        ]
    })
}

fn write_input(dir: &TempDir, rows: &[&str]) -> Result<()> {
    let mut content = format!("{}\n", HEADER);
    for row in rows {
        content.push_str(row);
        content.push('\n');
    }
    std::fs::write(dir.path().join("companies.csv"), content)?;
    Ok(())
}

async fn run_batch(
    server: &MockServer,
    dir: &TempDir,
    overrides: ConfigOverrides,
) -> lead_enrich::Result<RunReport> {
    let overrides = ConfigOverrides {
        input_path: Some("companies.csv".to_string()),
        output_path: Some("out/leads.csv".to_string()),
        endpoint: Some(server.url("/v1/responses")),
        retry_backoff_ms: Some(10),
        ..overrides
    };
    let config = RunConfig::resolve(&overrides, None, Some("sk-test".to_string()))?;
    config.validate()?;

    let enricher = OpenAiEnricher::new(config.client.clone())?;
    let executor_config = config.executor.clone();
    let pipeline = EnrichmentPipeline::new(
        LocalStorage::new(dir.path()),
        config,
        enricher,
        executor_config,
    );

    EtlEngine::new(pipeline).run().await
}

fn read_output(dir: &TempDir) -> Result<String> {
    Ok(std::fs::read_to_string(dir.path().join("out/leads.csv"))?)
}

#[tokio::test]
async fn test_acme_scenario_end_to_end() -> Result<()> {
    let dir = TempDir::new()?;
    write_input(
        &dir,
        &["\"Austin, TX\",Acme Rentals,acme.example,,,property manager"],
    )?;

    let server = MockServer::start_async().await;
    let api_mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v1/responses")
                .header("authorization", "Bearer sk-test")
                .body_contains("Acme Rentals");
            then.status(200).json_body(answer(
                "Jane Doe, Owner, jane@acme.example, manages over 50 properties",
            ));
        })
        .await;

    let report = run_batch(&server, &dir, ConfigOverrides::default()).await?;

    api_mock.assert_async().await;
    assert_eq!(report.summary.total, 1);
    assert_eq!(report.summary.succeeded, 1);
    assert_eq!(report.output_path, "out/leads.csv");

    let output = read_output(&dir)?;
    let lines: Vec<&str> = output.lines().collect();
    assert_eq!(lines[0], OUTPUT_HEADER);
    assert_eq!(
        lines[1],
        "\"Austin, TX\",Acme Rentals,acme.example,,,property manager,jane@acme.example,Jane,Doe,Owner,over 50"
    );
    Ok(())
}

#[tokio::test]
async fn test_timed_out_row_is_blank_and_run_completes() -> Result<()> {
    let dir = TempDir::new()?;
    write_input(
        &dir,
        &[
            "Austin,Quick Stays,quick.example,,,",
            "Denver,Sleepy Lodges,sleepy.example,,,",
            "Miami,Harbor Homes,harbor.example,,,",
        ],
    )?;

    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).body_contains("Sleepy Lodges");
            then.status(200)
                .delay(std::time::Duration::from_secs(3))
                .json_body(answer("Title: Night Manager"));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(POST).body_contains("Quick Stays");
            then.status(200).json_body(answer("Title: Owner"));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(POST).body_contains("Harbor Homes");
            then.status(200).json_body(answer("Title: Operations Director"));
        })
        .await;

    let report = run_batch(
        &server,
        &dir,
        ConfigOverrides {
            timeout_secs: Some(1),
            ..Default::default()
        },
    )
    .await?;

    assert_eq!(report.summary.total, 3);
    assert_eq!(report.summary.succeeded, 2);
    assert_eq!(report.summary.failed, 1);

    let output = read_output(&dir)?;
    let lines: Vec<&str> = output.lines().collect();
    assert_eq!(lines.len(), 4);
    assert_eq!(lines[1], "Austin,Quick Stays,quick.example,,,,,,,Owner,");
    assert_eq!(lines[2], "Denver,Sleepy Lodges,sleepy.example,,,,,,,,");
    assert_eq!(lines[3], "Miami,Harbor Homes,harbor.example,,,,,,,Operations Director,");
    Ok(())
}

#[tokio::test]
async fn test_server_errors_only_blank_their_own_rows() -> Result<()> {
    let dir = TempDir::new()?;
    write_input(
        &dir,
        &[
            "Austin,Alpha Rentals,alpha.example,,,",
            "Boise,Bravo Rentals,bravo.example,,,",
            "Chicago,Charlie Rentals,charlie.example,,,",
            "Dallas,Delta Rentals,delta.example,,,",
        ],
    )?;

    let server = MockServer::start_async().await;
    let failing = server
        .mock_async(|when, then| {
            when.method(POST).body_contains("Bravo Rentals");
            then.status(503);
        })
        .await;
    for name in ["Alpha", "Charlie", "Delta"] {
        let text = format!(
            r#"[{{"first_name": "{0}", "last_name": "Lee", "email": "{1}@{1}.example", "title": "Owner", "num_properties": "around 20", "contact_priority": 1}}]"#,
            name,
            name.to_lowercase()
        );
        server
            .mock_async(|when, then| {
                when.method(POST).body_contains(format!("{} Rentals", name));
                then.status(200).json_body(answer(&text));
            })
            .await;
    }

    let report = run_batch(
        &server,
        &dir,
        ConfigOverrides {
            concurrency: Some(4),
            max_retries: Some(2),
            ..Default::default()
        },
    )
    .await?;

    // 503 is transient: first attempt plus two retries.
    assert_eq!(failing.hits_async().await, 3);
    assert_eq!(report.summary.failed, 1);

    let output = read_output(&dir)?;
    let lines: Vec<&str> = output.lines().collect();
    assert_eq!(
        lines[1],
        "Austin,Alpha Rentals,alpha.example,,,,alpha@alpha.example,Alpha,Lee,Owner,around 20"
    );
    assert_eq!(lines[2], "Boise,Bravo Rentals,bravo.example,,,,,,,,");
    assert_eq!(
        lines[3],
        "Chicago,Charlie Rentals,charlie.example,,,,charlie@charlie.example,Charlie,Lee,Owner,around 20"
    );
    assert_eq!(
        lines[4],
        "Dallas,Delta Rentals,delta.example,,,,delta@delta.example,Delta,Lee,Owner,around 20"
    );
    Ok(())
}

#[tokio::test]
async fn test_output_is_identical_across_concurrency_and_reruns() -> Result<()> {
    let rows: Vec<String> = (0..12)
        .map(|i| format!("City {0},Company Number {0:02},c{0}.example,,,", i))
        .collect();
    let row_refs: Vec<&str> = rows.iter().map(String::as_str).collect();

    let server = MockServer::start_async().await;
    for i in 0..12 {
        let delay = std::time::Duration::from_millis(((12 - i) * 20) as u64);
        let text = format!("Name: Person {:02}\nTitle: Manager\nProperties: over {}", i, i * 10);
        server
            .mock_async(|when, then| {
                when.method(POST)
                    .body_contains(format!("Company Number {:02}", i));
                then.status(200).delay(delay).json_body(answer(&text));
            })
            .await;
    }

    let mut outputs = Vec::new();
    for concurrency in [1, 6, 12, 12] {
        let dir = TempDir::new()?;
        write_input(&dir, &row_refs)?;
        run_batch(
            &server,
            &dir,
            ConfigOverrides {
                concurrency: Some(concurrency),
                ..Default::default()
            },
        )
        .await?;
        outputs.push(std::fs::read(dir.path().join("out/leads.csv"))?);
    }

    assert!(outputs.windows(2).all(|pair| pair[0] == pair[1]));

    let text = String::from_utf8(outputs.remove(0))?;
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 13);
    for (i, line) in lines.iter().skip(1).enumerate() {
        assert!(line.starts_with(&format!("City {0},Company Number {0:02},", i)));
        assert!(line.ends_with(&format!(",Person,{:02},Manager,over {}", i, i * 10)));
    }
    Ok(())
}

#[tokio::test]
async fn test_limit_only_processes_first_rows() -> Result<()> {
    let dir = TempDir::new()?;
    write_input(
        &dir,
        &[
            "Austin,First Co,first.example,,,",
            "Boise,Second Co,second.example,,,",
            "Chicago,Third Co,third.example,,,",
        ],
    )?;

    let server = MockServer::start_async().await;
    let api_mock = server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/responses");
            then.status(200).json_body(answer("[]"));
        })
        .await;

    let report = run_batch(
        &server,
        &dir,
        ConfigOverrides {
            max_records: Some(2),
            ..Default::default()
        },
    )
    .await?;

    assert_eq!(api_mock.hits_async().await, 2);
    assert_eq!(report.summary.total, 2);
    assert_eq!(report.summary.succeeded, 2);
    assert_eq!(read_output(&dir)?.lines().count(), 3);
    Ok(())
}

#[tokio::test]
async fn test_missing_columns_abort_before_any_request() -> Result<()> {
    let dir = TempDir::new()?;
    std::fs::write(
        dir.path().join("companies.csv"),
        "company_name,website\nAcme Rentals,acme.example\n",
    )?;

    let server = MockServer::start_async().await;
    let api_mock = server
        .mock_async(|when, then| {
            when.method(POST);
            then.status(200).json_body(answer("[]"));
        })
        .await;

    let result = run_batch(&server, &dir, ConfigOverrides::default()).await;

    assert!(matches!(result, Err(EnrichError::InputError { .. })));
    assert_eq!(api_mock.hits_async().await, 0);
    assert!(!dir.path().join("out/leads.csv").exists());
    Ok(())
}

#[tokio::test]
async fn test_empty_input_writes_header_only() -> Result<()> {
    let dir = TempDir::new()?;
    write_input(&dir, &[])?;
    let server = MockServer::start_async().await;

    let report = run_batch(&server, &dir, ConfigOverrides::default()).await?;

    assert_eq!(report.summary.total, 0);
    assert_eq!(read_output(&dir)?.trim_end(), OUTPUT_HEADER);
    Ok(())
}
