use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;

use crate::config::Config;
use crate::errors::AppError;
use crate::models::{CompanyProfile, FilingHistoryPage, OfficerPage, OfficerItem, SearchPage, SearchHit};
use crate::normalize::turnover_from_filings;
use crate::rate_limit::RateLimiter;
use crate::retry::retry_with_backoff;

const ITEMS_PER_PAGE: u32 = 100;

/// Rate-limited client for the company registry search/detail endpoints.
///
/// Every call waits on the shared [`RateLimiter`] first, then runs inside a
/// bounded exponential-backoff retry loop. Company profiles are cached so
/// search expansion over overlapping terms does not re-fetch the same
/// company.
#[derive(Clone)]
pub struct RegistryClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    limiter: Arc<RateLimiter>,
    max_retries: u32,
    max_search_results: u32,
    profile_cache: Cache<String, CompanyProfile>,
}

impl RegistryClient {
    pub fn new(config: &Config, limiter: Arc<RateLimiter>) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| {
                AppError::ExternalApi(format!("failed to create registry client: {}", e))
            })?;

        let profile_cache = Cache::builder()
            .time_to_live(Duration::from_secs(3600))
            .max_capacity(10_000)
            .build();

        Ok(Self {
            client,
            base_url: config.registry_base_url.clone(),
            api_key: config.api_key.clone(),
            limiter,
            max_retries: config.max_retry_attempts,
            max_search_results: config.max_search_results,
            profile_cache,
        })
    }

    /// Searches active companies for a free-text term, paging until the
    /// results run out or the per-term cap is reached.
    pub async fn search(&self, term: &str) -> Result<Vec<SearchHit>, AppError> {
        let mut hits = Vec::new();
        let mut start_index = 0u32;

        while start_index < self.max_search_results {
            let url = reqwest::Url::parse_with_params(
                &format!("{}/search/companies", self.base_url),
                &[
                    ("q", term),
                    ("items_per_page", &ITEMS_PER_PAGE.to_string()),
                    ("start_index", &start_index.to_string()),
                    ("restrictions", "active"),
                ],
            )
            .map_err(|e| AppError::BadRequest(format!("failed to build search URL: {}", e)))?;

            let page: SearchPage = self.get_with_retry(url, "registry search").await?;
            if page.items.is_empty() {
                break;
            }
            let page_len = page.items.len();
            tracing::info!(
                "Search '{}': {} results at index {} (total available: {})",
                term,
                page_len,
                start_index,
                page.total_results.unwrap_or(0)
            );
            hits.extend(page.items);

            if page_len < ITEMS_PER_PAGE as usize {
                break;
            }
            start_index += ITEMS_PER_PAGE;
        }

        Ok(hits)
    }

    /// Fetches the full company payload, with caching.
    pub async fn company_profile(&self, company_number: &str) -> Result<CompanyProfile, AppError> {
        if let Some(cached) = self.profile_cache.get(company_number).await {
            tracing::debug!("Profile cache hit for {}", company_number);
            return Ok(cached);
        }

        let url = self.company_url(company_number, "")?;
        let profile: CompanyProfile = self.get_with_retry(url, "company profile").await?;
        self.profile_cache
            .insert(company_number.to_string(), profile.clone())
            .await;
        Ok(profile)
    }

    /// Fetches the officer list for a company.
    pub async fn officers(&self, company_number: &str) -> Result<Vec<OfficerItem>, AppError> {
        let url = self.company_url(company_number, "/officers")?;
        let page: OfficerPage = self.get_with_retry(url, "company officers").await?;
        Ok(page.items)
    }

    /// Scans the filing history for the most recent accounts filing with a
    /// parsable turnover figure. Unknown is a normal outcome here, not an
    /// error.
    pub async fn accounts_turnover(&self, company_number: &str) -> Result<Option<u64>, AppError> {
        let url = self.company_url(company_number, "/filing-history")?;
        let page: FilingHistoryPage = self.get_with_retry(url, "filing history").await?;
        let turnover = turnover_from_filings(&page.items);
        if turnover.is_none() {
            tracing::debug!("No turnover found in filing history for {}", company_number);
        }
        Ok(turnover)
    }

    fn company_url(&self, company_number: &str, suffix: &str) -> Result<reqwest::Url, AppError> {
        reqwest::Url::parse(&format!(
            "{}/company/{}{}",
            self.base_url, company_number, suffix
        ))
        .map_err(|e| AppError::BadRequest(format!("failed to build company URL: {}", e)))
    }

    async fn get_with_retry<T: DeserializeOwned>(
        &self,
        url: reqwest::Url,
        label: &str,
    ) -> Result<T, AppError> {
        retry_with_backoff(self.max_retries, label, || self.get_json(url.clone())).await
    }

    /// One paced, authenticated GET. The registry takes the API key as the
    /// basic-auth username with an empty password.
    async fn get_json<T: DeserializeOwned>(&self, url: reqwest::Url) -> Result<T, AppError> {
        self.limiter.wait().await;
        tracing::debug!("GET {}", url.path());

        let response = self
            .client
            .get(url)
            .basic_auth(&self.api_key, Some(""))
            .send()
            .await
            .map_err(AppError::from)?;

        let status = response.status();
        match status {
            StatusCode::TOO_MANY_REQUESTS => {
                return Err(AppError::RateLimited(
                    "registry rate limit exceeded".to_string(),
                ))
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Err(AppError::Unauthorized(format!(
                    "registry rejected credentials ({})",
                    status
                )))
            }
            StatusCode::NOT_FOUND => {
                return Err(AppError::NotFound("no such resource".to_string()))
            }
            _ if status.is_server_error() => {
                return Err(AppError::ExternalApi(format!(
                    "registry returned {}",
                    status
                )))
            }
            _ if !status.is_success() => {
                let text = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "Unknown error".to_string());
                return Err(AppError::BadRequest(format!(
                    "registry returned {}: {}",
                    status, text
                )));
            }
            _ => {}
        }

        response.json::<T>().await.map_err(|e| {
            AppError::MalformedPayload(format!("failed to decode registry response: {}", e))
        })
    }
}
