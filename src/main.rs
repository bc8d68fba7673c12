use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use gqlprobe::config::Config;
use gqlprobe::graphql::{GraphqlClient, GraphqlTransport};
use gqlprobe::suite::{SuiteDriver, SuiteFile};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(
    name = "gqlprobe",
    version,
    about = "Run GraphQL conformance oracles against a live endpoint"
)]
struct Cli {
    /// YAML suite file listing connections and mutations to probe
    #[arg(long, env = "GQLPROBE_SUITE")]
    suite: PathBuf,

    /// Print the suite report as JSON on stdout
    #[arg(long)]
    json: bool,
}

fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("gqlprobe={}", config.app.log_level).into());

    if config.app.log_format == "json" {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    config.validate().context("Configuration validation failed")?;
    init_tracing(&config);

    let suite = SuiteFile::load(&cli.suite)
        .with_context(|| format!("Failed to load suite {}", cli.suite.display()))?;
    if suite.is_empty() {
        anyhow::bail!("suite {} has no cases", cli.suite.display());
    }

    tracing::info!(
        endpoint = %config.client.endpoint,
        suite = %cli.suite.display(),
        "Starting gqlprobe"
    );

    let client = GraphqlClient::new(&config.client).context("Failed to build GraphQL client")?;
    let transport: Arc<dyn GraphqlTransport> = Arc::new(client);
    let report = SuiteDriver::new(transport, config.oracle.clone()).run(&suite).await;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for case in &report.cases {
            let status = if case.passed { "PASS" } else { "FAIL" };
            println!("{} {}", status, case.name);
        }
        println!("{} passed, {} failed", report.passed(), report.failed());
    }

    if !report.is_success() {
        std::process::exit(1);
    }
    Ok(())
}
