use std::path::PathBuf;

use crate::names;

/// Which secondary turnover source the pipeline talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnoverSourceKind {
    /// Live HMRC-backed source (requires OAuth credentials).
    Live,
    /// Deterministic stub for degraded deployments and tests.
    Stub,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: String,
    pub registry_base_url: String,
    pub hmrc_base_url: String,
    pub hmrc_client_id: Option<String>,
    pub hmrc_client_secret: Option<String>,
    pub turnover_source: TurnoverSourceKind,
    /// Turnover band, inclusive, in whole pounds.
    pub turnover_min: u64,
    pub turnover_max: u64,
    pub min_director_age: u32,
    pub eligible_sic_codes: Vec<String>,
    /// Minimum delay between outbound API calls, in milliseconds.
    pub rate_limit_interval_ms: u64,
    pub max_retry_attempts: u32,
    /// Cap on search results consumed per term, to bound API usage.
    pub max_search_results: u32,
    pub output_path: PathBuf,
    /// Optional line file of search terms; the built-in SIC search plan is
    /// used when absent.
    pub names_file: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let turnover_source = match std::env::var("TURNOVER_SOURCE")
            .unwrap_or_else(|_| "stub".to_string())
            .to_lowercase()
            .as_str()
        {
            "live" => TurnoverSourceKind::Live,
            "stub" => TurnoverSourceKind::Stub,
            other => anyhow::bail!("TURNOVER_SOURCE must be 'live' or 'stub', got '{}'", other),
        };

        let hmrc_client_id = std::env::var("HMRC_API_KEY")
            .ok()
            .filter(|s| !s.trim().is_empty());
        let hmrc_client_secret = std::env::var("HMRC_SERVER_TOKEN")
            .ok()
            .filter(|s| !s.trim().is_empty());

        let config = Self {
            api_key: std::env::var("COMPANIES_API_KEY")
                .map_err(|_| anyhow::anyhow!("COMPANIES_API_KEY environment variable required"))
                .and_then(|key| {
                    if key.trim().is_empty() {
                        anyhow::bail!("COMPANIES_API_KEY cannot be empty");
                    }
                    Ok(key)
                })?,
            registry_base_url: std::env::var("REGISTRY_BASE_URL")
                .unwrap_or_else(|_| {
                    "https://api.company-information.service.gov.uk".to_string()
                })
                .trim_end_matches('/')
                .to_string(),
            hmrc_base_url: std::env::var("HMRC_BASE_URL")
                .unwrap_or_else(|_| "https://test-api.service.hmrc.gov.uk".to_string())
                .trim_end_matches('/')
                .to_string(),
            hmrc_client_id,
            hmrc_client_secret,
            turnover_source,
            turnover_min: std::env::var("TURNOVER_MIN")
                .unwrap_or_else(|_| "1000000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("TURNOVER_MIN must be a whole number of pounds"))?,
            turnover_max: std::env::var("TURNOVER_MAX")
                .unwrap_or_else(|_| "1000000000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("TURNOVER_MAX must be a whole number of pounds"))?,
            min_director_age: std::env::var("MIN_DIRECTOR_AGE")
                .unwrap_or_else(|_| "50".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("MIN_DIRECTOR_AGE must be a whole number"))?,
            eligible_sic_codes: match std::env::var("SIC_CODES") {
                Ok(raw) => raw
                    .split(',')
                    .map(|code| code.trim().to_string())
                    .filter(|code| !code.is_empty())
                    .collect(),
                Err(_) => names::default_sic_codes(),
            },
            rate_limit_interval_ms: std::env::var("RATE_LIMIT_INTERVAL_MS")
                .unwrap_or_else(|_| "600".to_string())
                .parse()
                .map_err(|_| {
                    anyhow::anyhow!("RATE_LIMIT_INTERVAL_MS must be a whole number of milliseconds")
                })?,
            max_retry_attempts: std::env::var("MAX_RETRY_ATTEMPTS")
                .unwrap_or_else(|_| "3".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("MAX_RETRY_ATTEMPTS must be a whole number"))?,
            max_search_results: std::env::var("MAX_SEARCH_RESULTS")
                .unwrap_or_else(|_| "500".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("MAX_SEARCH_RESULTS must be a whole number"))?,
            output_path: std::env::var("OUTPUT_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| {
                    let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
                    PathBuf::from(format!("filtered_companies_{}.csv", timestamp))
                }),
            names_file: std::env::var("NAMES_FILE")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .map(PathBuf::from),
        };

        if config.turnover_min > config.turnover_max {
            anyhow::bail!(
                "TURNOVER_MIN ({}) must not exceed TURNOVER_MAX ({})",
                config.turnover_min,
                config.turnover_max
            );
        }
        if config.eligible_sic_codes.is_empty() {
            anyhow::bail!("SIC_CODES must list at least one classification code");
        }
        if config.max_retry_attempts == 0 {
            anyhow::bail!("MAX_RETRY_ATTEMPTS must be at least 1");
        }
        if config.turnover_source == TurnoverSourceKind::Live
            && (config.hmrc_client_id.is_none() || config.hmrc_client_secret.is_none())
        {
            anyhow::bail!(
                "HMRC_API_KEY and HMRC_SERVER_TOKEN are required when TURNOVER_SOURCE=live"
            );
        }

        tracing::info!("Configuration loaded successfully");
        tracing::debug!("Registry base URL: {}", config.registry_base_url);
        tracing::debug!(
            "Turnover band: {}..={}, minimum director age: {}",
            config.turnover_min,
            config.turnover_max,
            config.min_director_age
        );
        tracing::debug!("Eligible SIC codes: {:?}", config.eligible_sic_codes);
        tracing::debug!("Output path: {}", config.output_path.display());

        Ok(config)
    }
}
