//! Pipeline orchestration: name source -> registry search -> dedup ->
//! detail + turnover enrichment -> normalize -> filter -> CSV sink.

use std::sync::Arc;

use chrono::NaiveDate;

use crate::dedup::SeenSet;
use crate::errors::AppError;
use crate::filter::{self, FilterCriteria};
use crate::models::{CompanyStatus, OutputRow};
use crate::names::NameSource;
use crate::normalize::normalize;
use crate::registry_client::RegistryClient;
use crate::sink::CsvSink;
use crate::turnover::TurnoverSource;

/// Counters reported at the end of a run.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Candidates dispatched to detail retrieval (after dedup).
    pub processed: usize,
    /// Rows written to the sink.
    pub accepted: usize,
    /// Candidates abandoned after exhausting retries or on malformed
    /// payloads.
    pub skipped_unresolved: usize,
}

/// Single-pass batch pipeline. One candidate at a time; the rate limiter
/// inside the clients is the only shared mutable state.
pub struct Pipeline {
    registry: RegistryClient,
    turnover: Arc<dyn TurnoverSource>,
    criteria: FilterCriteria,
    names: NameSource,
    /// Fixed reference date for all age computations in this run.
    as_of: NaiveDate,
}

impl Pipeline {
    pub fn new(
        registry: RegistryClient,
        turnover: Arc<dyn TurnoverSource>,
        criteria: FilterCriteria,
        names: NameSource,
        as_of: NaiveDate,
    ) -> Self {
        Self {
            registry,
            turnover,
            criteria,
            names,
            as_of,
        }
    }

    /// Runs the pipeline to completion. Per-candidate failures are logged
    /// and skipped; only sink I/O failure aborts the run.
    pub async fn run(&self, sink: &mut CsvSink) -> Result<RunSummary, AppError> {
        let mut seen = SeenSet::new();
        let mut summary = RunSummary::default();

        for term in self.names.terms() {
            tracing::info!("Searching registry for '{}'", term.term);
            let hits = match self.registry.search(&term.term).await {
                Ok(hits) => hits,
                Err(err) => {
                    tracing::warn!("Search for '{}' failed, skipping term: {}", term.term, err);
                    continue;
                }
            };

            for hit in hits {
                let Some(company_number) = hit.company_number else {
                    tracing::warn!("Skipping search hit without a company number");
                    continue;
                };
                if !seen.check_and_mark(&company_number) {
                    tracing::debug!("Already processed {}, skipping", company_number);
                    continue;
                }

                summary.processed += 1;
                match self.process_candidate(&company_number, &term.category).await {
                    Ok(Some(row)) => {
                        sink.append(&row)?;
                        summary.accepted += 1;
                        tracing::info!("Accepted {} ({})", row.company_name, company_number);
                    }
                    Ok(None) => {}
                    Err(err) => {
                        summary.skipped_unresolved += 1;
                        tracing::warn!("Could not resolve {}: {}", company_number, err);
                    }
                }
            }
        }

        sink.flush()?;
        tracing::info!(
            "Run complete: {} processed, {} accepted, {} unresolved",
            summary.processed,
            summary.accepted,
            summary.skipped_unresolved
        );
        Ok(summary)
    }

    /// Fetches, normalizes and filters one candidate. `Ok(None)` means the
    /// company was retrieved but did not meet the criteria.
    async fn process_candidate(
        &self,
        company_number: &str,
        term_category: &str,
    ) -> Result<Option<OutputRow>, AppError> {
        let profile = self.registry.company_profile(company_number).await?;

        // Cheap gates before paying for officer and turnover calls.
        let status = profile
            .company_status
            .as_deref()
            .map(CompanyStatus::parse)
            .unwrap_or(CompanyStatus::Other);
        if status != CompanyStatus::Active {
            tracing::debug!("Skipping non-active company {}", company_number);
            return Ok(None);
        }
        if !self.criteria.matches_sic(&profile.sic_codes) {
            tracing::debug!(
                "Skipping {} with ineligible SIC codes {:?}",
                company_number,
                profile.sic_codes
            );
            return Ok(None);
        }

        let officers = self.registry.officers(company_number).await?;

        // Both turnover sources degrade to unknown rather than failing the
        // candidate.
        let registry_turnover = match self.registry.accounts_turnover(company_number).await {
            Ok(turnover) => turnover,
            Err(err) => {
                tracing::warn!("Registry turnover unavailable for {}: {}", company_number, err);
                None
            }
        };
        let vat_number = match self.turnover.vat_number(company_number).await {
            Ok(vat) => vat,
            Err(err) => {
                tracing::warn!("VAT lookup failed for {}: {}", company_number, err);
                None
            }
        };
        let hmrc_turnover = match self.turnover.annual_turnover(company_number).await {
            Ok(turnover) => turnover,
            Err(err) => {
                tracing::warn!(
                    "Secondary turnover unavailable for {}: {}",
                    company_number,
                    err
                );
                None
            }
        };

        let category = if term_category.is_empty() {
            self.names
                .category_for(&profile.sic_codes)
                .unwrap_or_default()
                .to_string()
        } else {
            term_category.to_string()
        };

        let record = normalize(
            &profile,
            &officers,
            registry_turnover,
            hmrc_turnover,
            vat_number,
            &category,
        )?;

        if !filter::accepts(&record, &self.criteria, self.as_of) {
            tracing::debug!("{} does not meet the filter criteria", company_number);
            return Ok(None);
        }

        let qualifying =
            filter::qualifying_directors(&record, self.criteria.min_director_age, self.as_of);
        Ok(Some(OutputRow::from_record(&record, &qualifying)))
    }
}
