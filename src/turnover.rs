//! Secondary turnover source: a pluggable capability with a live
//! HMRC-backed implementation and a deterministic stub for degraded
//! deployments. Selection happens in configuration, not inside the client.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::config::{Config, TurnoverSourceKind};
use crate::errors::AppError;
use crate::rate_limit::RateLimiter;
use crate::retry::retry_with_backoff;

/// Supplies VAT registration and annual turnover figures for a company.
///
/// Absence of data is a normal outcome (`Ok(None)`), never an error; the
/// pipeline treats unknown turnover as "does not satisfy the band" rather
/// than failing the candidate.
#[async_trait]
pub trait TurnoverSource: Send + Sync {
    async fn vat_number(&self, company_number: &str) -> Result<Option<String>, AppError>;
    async fn annual_turnover(&self, company_number: &str) -> Result<Option<u64>, AppError>;
}

/// Builds the configured source implementation.
pub fn build_turnover_source(
    config: &Config,
    limiter: Arc<RateLimiter>,
) -> Result<Arc<dyn TurnoverSource>, AppError> {
    match config.turnover_source {
        TurnoverSourceKind::Live => {
            let client_id = config.hmrc_client_id.clone().ok_or_else(|| {
                AppError::Config("HMRC client id required for the live turnover source".to_string())
            })?;
            let client_secret = config.hmrc_client_secret.clone().ok_or_else(|| {
                AppError::Config(
                    "HMRC client secret required for the live turnover source".to_string(),
                )
            })?;
            tracing::info!("Using live HMRC turnover source: {}", config.hmrc_base_url);
            Ok(Arc::new(HmrcTurnoverSource::new(
                config.hmrc_base_url.clone(),
                client_id,
                client_secret,
                limiter,
                config.max_retry_attempts,
            )?))
        }
        TurnoverSourceKind::Stub => {
            tracing::info!("Using stubbed turnover source");
            Ok(Arc::new(StubTurnoverSource::new()))
        }
    }
}

// ============ Live HMRC source ============

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VatRegistration {
    vat_number: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VatTurnover {
    annual_turnover: Option<f64>,
}

struct AccessToken {
    value: String,
    expires_at: Instant,
}

/// HTTP-backed turnover source using HMRC's OAuth2 client-credentials flow.
/// The access token is cached and refreshed shortly before expiry.
pub struct HmrcTurnoverSource {
    client: reqwest::Client,
    base_url: String,
    client_id: String,
    client_secret: String,
    limiter: Arc<RateLimiter>,
    max_retries: u32,
    token: Mutex<Option<AccessToken>>,
}

impl HmrcTurnoverSource {
    pub fn new(
        base_url: String,
        client_id: String,
        client_secret: String,
        limiter: Arc<RateLimiter>,
        max_retries: u32,
    ) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| AppError::ExternalApi(format!("failed to create HMRC client: {}", e)))?;

        Ok(Self {
            client,
            base_url,
            client_id,
            client_secret,
            limiter,
            max_retries,
            token: Mutex::new(None),
        })
    }

    /// Returns a valid bearer token, re-authenticating if the cached one is
    /// absent or within a minute of expiry.
    async fn bearer(&self) -> Result<String, AppError> {
        let mut token = self.token.lock().await;
        if let Some(cached) = token.as_ref() {
            if cached.expires_at > Instant::now() + Duration::from_secs(60) {
                return Ok(cached.value.clone());
            }
        }

        tracing::info!("Authenticating with HMRC API");
        self.limiter.wait().await;
        let response = self
            .client
            .post(format!("{}/oauth/token", self.base_url))
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("grant_type", "client_credentials"),
            ])
            .send()
            .await
            .map_err(AppError::from)?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(AppError::Unauthorized(format!(
                "HMRC authentication failed ({})",
                status
            )));
        }

        let parsed: TokenResponse = response.json().await.map_err(|e| {
            AppError::MalformedPayload(format!("failed to decode HMRC token response: {}", e))
        })?;
        // HMRC defaults to a 4 hour token lifetime.
        let expires_in = parsed.expires_in.unwrap_or(14_400);
        let value = parsed.access_token.clone();
        *token = Some(AccessToken {
            value: parsed.access_token,
            expires_at: Instant::now() + Duration::from_secs(expires_in),
        });
        Ok(value)
    }

    /// One paced, authenticated GET against the HMRC API. A 404 means the
    /// company simply has no data and maps to `Ok(None)`; a 401 drops the
    /// cached token so the next call re-authenticates.
    async fn get_optional<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
    ) -> Result<Option<T>, AppError> {
        let bearer = self.bearer().await?;
        self.limiter.wait().await;

        let response = self
            .client
            .get(format!("{}{}", self.base_url, path))
            .header("Authorization", format!("Bearer {}", bearer))
            .header("Accept", "application/vnd.hmrc.1.0+json")
            .send()
            .await
            .map_err(AppError::from)?;

        let status = response.status();
        match status {
            StatusCode::NOT_FOUND => return Ok(None),
            StatusCode::TOO_MANY_REQUESTS => {
                return Err(AppError::RateLimited("HMRC rate limit exceeded".to_string()))
            }
            StatusCode::UNAUTHORIZED => {
                self.token.lock().await.take();
                return Err(AppError::Unauthorized(
                    "HMRC rejected the access token".to_string(),
                ));
            }
            _ if status.is_server_error() => {
                return Err(AppError::ExternalApi(format!("HMRC returned {}", status)))
            }
            _ if !status.is_success() => {
                return Err(AppError::BadRequest(format!("HMRC returned {}", status)))
            }
            _ => {}
        }

        let parsed = response.json::<T>().await.map_err(|e| {
            AppError::MalformedPayload(format!("failed to decode HMRC response: {}", e))
        })?;
        Ok(Some(parsed))
    }
}

#[async_trait]
impl TurnoverSource for HmrcTurnoverSource {
    async fn vat_number(&self, company_number: &str) -> Result<Option<String>, AppError> {
        let path = format!("/organisations/vat/company/{}", company_number);
        let registration: Option<VatRegistration> =
            retry_with_backoff(self.max_retries, "HMRC VAT lookup", || {
                self.get_optional(&path)
            })
            .await?;
        Ok(registration.and_then(|r| r.vat_number))
    }

    async fn annual_turnover(&self, company_number: &str) -> Result<Option<u64>, AppError> {
        let Some(vrn) = self.vat_number(company_number).await? else {
            tracing::debug!("No VAT registration for {}", company_number);
            return Ok(None);
        };

        let path = format!("/organisations/vat/{}/turnover", vrn);
        let turnover: Option<VatTurnover> =
            retry_with_backoff(self.max_retries, "HMRC turnover", || {
                self.get_optional(&path)
            })
            .await?;
        Ok(turnover
            .and_then(|t| t.annual_turnover)
            .filter(|v| *v >= 0.0)
            .map(|v| v.round() as u64))
    }
}

// ============ Stub source ============

/// Deterministic turnover source for test environments where HMRC returns
/// no real data. Figures are derived from the company number and weighted
/// into the same £1M-£1B bands the live data skews towards, so downstream
/// filtering still exercises realistic values.
pub struct StubTurnoverSource {
    fixed: Option<u64>,
}

impl StubTurnoverSource {
    pub fn new() -> Self {
        Self { fixed: None }
    }

    /// Always reports the given figure. Handy in tests.
    pub fn with_fixed(turnover: u64) -> Self {
        Self {
            fixed: Some(turnover),
        }
    }
}

impl Default for StubTurnoverSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TurnoverSource for StubTurnoverSource {
    async fn vat_number(&self, company_number: &str) -> Result<Option<String>, AppError> {
        Ok(Some(format!("GB{}", company_number)))
    }

    async fn annual_turnover(&self, company_number: &str) -> Result<Option<u64>, AppError> {
        match self.fixed {
            Some(turnover) => Ok(Some(turnover)),
            None => Ok(Some(banded_turnover(company_number))),
        }
    }
}

/// FNV-1a hash of the company number mapped into weighted turnover bands:
/// 25% £1M-£10M, 35% £10M-£50M, 25% £50M-£250M, 15% £250M-£1B.
pub fn banded_turnover(company_number: &str) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in company_number.bytes() {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }

    let pick = hash % 100;
    let (lower, upper) = if pick < 25 {
        (1_000_000, 10_000_000)
    } else if pick < 60 {
        (10_000_000, 50_000_000)
    } else if pick < 85 {
        (50_000_000, 250_000_000)
    } else {
        (250_000_000, 1_000_000_000)
    };
    lower + (hash / 100) % (upper - lower)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn stub_reports_a_vat_number_for_every_company() {
        let stub = StubTurnoverSource::new();
        assert_eq!(
            stub.vat_number("01234567").await.unwrap(),
            Some("GB01234567".to_string())
        );
    }

    #[tokio::test]
    async fn stub_turnover_is_deterministic_and_in_band() {
        let stub = StubTurnoverSource::new();
        let first = stub.annual_turnover("01234567").await.unwrap().unwrap();
        let second = stub.annual_turnover("01234567").await.unwrap().unwrap();
        assert_eq!(first, second);
        assert!((1_000_000..1_000_000_000).contains(&first));

        let other = stub.annual_turnover("99999999").await.unwrap().unwrap();
        assert!((1_000_000..1_000_000_000).contains(&other));
    }

    #[tokio::test]
    async fn fixed_stub_always_reports_the_configured_figure() {
        let stub = StubTurnoverSource::with_fixed(2_000_000);
        assert_eq!(
            stub.annual_turnover("01234567").await.unwrap(),
            Some(2_000_000)
        );
        assert_eq!(
            stub.annual_turnover("76543210").await.unwrap(),
            Some(2_000_000)
        );
    }
}
