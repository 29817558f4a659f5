use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use company_screener::config::Config;
use company_screener::filter::FilterCriteria;
use company_screener::names::NameSource;
use company_screener::pipeline::Pipeline;
use company_screener::rate_limit::RateLimiter;
use company_screener::registry_client::RegistryClient;
use company_screener::sink::CsvSink;
use company_screener::turnover::build_turnover_source;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "company_screener=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;
    tracing::info!("Configuration loaded successfully");

    let limiter = Arc::new(RateLimiter::new(Duration::from_millis(
        config.rate_limit_interval_ms,
    )));
    let registry = RegistryClient::new(&config, Arc::clone(&limiter))?;
    let turnover = build_turnover_source(&config, Arc::clone(&limiter))?;
    let criteria = FilterCriteria::from_config(&config)?;

    let names = match &config.names_file {
        Some(path) => {
            tracing::info!("Loading search terms from {}", path.display());
            NameSource::from_lines(path)?
        }
        None => NameSource::default_plan(),
    };

    let as_of = chrono::Utc::now().date_naive();
    let mut sink = CsvSink::create(&config.output_path)?;

    let pipeline = Pipeline::new(registry, turnover, criteria, names, as_of);
    let summary = pipeline.run(&mut sink).await?;

    tracing::info!(
        "Screening finished: {} companies processed, {} accepted, {} unresolved",
        summary.processed,
        summary.accepted,
        summary.skipped_unresolved
    );
    Ok(())
}
