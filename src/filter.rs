//! Filter engine: pure acceptance decisions over normalized records.

use std::collections::HashSet;

use chrono::NaiveDate;

use crate::config::Config;
use crate::errors::AppError;
use crate::models::CompanyRecord;
use crate::normalize::age_on;

/// Immutable filter configuration, supplied once per run.
#[derive(Debug, Clone)]
pub struct FilterCriteria {
    /// Inclusive turnover band in whole pounds.
    pub turnover_min: u64,
    pub turnover_max: u64,
    pub min_director_age: u32,
    pub eligible_sic_codes: HashSet<String>,
}

impl FilterCriteria {
    pub fn new(
        turnover_min: u64,
        turnover_max: u64,
        min_director_age: u32,
        eligible_sic_codes: impl IntoIterator<Item = String>,
    ) -> Result<Self, AppError> {
        if turnover_min > turnover_max {
            return Err(AppError::Config(format!(
                "turnover lower bound {} exceeds upper bound {}",
                turnover_min, turnover_max
            )));
        }
        let eligible_sic_codes: HashSet<String> = eligible_sic_codes
            .into_iter()
            .map(|code| code.trim().to_string())
            .filter(|code| !code.is_empty())
            .collect();
        if eligible_sic_codes.is_empty() {
            return Err(AppError::Config(
                "at least one eligible SIC code is required".to_string(),
            ));
        }
        Ok(Self {
            turnover_min,
            turnover_max,
            min_director_age,
            eligible_sic_codes,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        Self::new(
            config.turnover_min,
            config.turnover_max,
            config.min_director_age,
            config.eligible_sic_codes.iter().cloned(),
        )
    }

    /// Whether any of the record's SIC codes is in the eligible set. Also
    /// used as a cheap gate before paying for officer and turnover calls.
    pub fn matches_sic(&self, sic_codes: &[String]) -> bool {
        sic_codes
            .iter()
            .any(|code| self.eligible_sic_codes.contains(code.trim()))
    }

    fn turnover_in_band(&self, turnover: Option<u64>) -> bool {
        matches!(turnover, Some(t) if t >= self.turnover_min && t <= self.turnover_max)
    }
}

/// Decides whether a record is included in the output.
///
/// Acceptance requires all of:
/// - at least one SIC code intersects the eligible set;
/// - at least one active director is at or above the minimum age;
/// - at least one turnover source falls inside the band, inclusive. Either
///   source is authoritative evidence, so when both are known only one needs
///   to qualify. Both unknown means reject.
///
/// Pure function: same record, criteria and as-of date always produce the
/// same decision.
pub fn accepts(record: &CompanyRecord, criteria: &FilterCriteria, as_of: NaiveDate) -> bool {
    if !criteria.matches_sic(&record.sic_codes) {
        return false;
    }
    if qualifying_directors(record, criteria.min_director_age, as_of).is_empty() {
        return false;
    }
    criteria.turnover_in_band(record.registry_turnover)
        || criteria.turnover_in_band(record.hmrc_turnover)
}

/// Active officers whose role matches "director" (case-insensitive
/// substring) with a computed age at or above `min_age`, in officer-list
/// order. Officers without a usable birth date never qualify.
pub fn qualifying_directors(
    record: &CompanyRecord,
    min_age: u32,
    as_of: NaiveDate,
) -> Vec<(String, u32)> {
    record
        .officers
        .iter()
        .filter(|officer| !officer.resigned && officer.role.to_lowercase().contains("director"))
        .filter_map(|officer| {
            let age = officer.date_of_birth.as_ref().and_then(|d| age_on(d, as_of))?;
            (age >= min_age).then(|| (officer.name.clone(), age))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CompanyStatus, DateOfBirth, Officer};

    fn director(name: &str, month: u32, year: i32) -> Officer {
        Officer {
            name: name.to_string(),
            role: "director".to_string(),
            resigned: false,
            date_of_birth: Some(DateOfBirth {
                day: None,
                month: Some(month),
                year: Some(year),
            }),
        }
    }

    fn record(sic: &str, registry: Option<u64>, hmrc: Option<u64>) -> CompanyRecord {
        CompanyRecord {
            company_number: "01234567".to_string(),
            company_name: "Sparkle Cleaning Ltd".to_string(),
            status: CompanyStatus::Active,
            company_type: Some("ltd".to_string()),
            incorporation_date: None,
            sic_codes: vec![sic.to_string()],
            registered_address: String::new(),
            officers: vec![director("SMITH, Janet", 4, 1970)],
            registry_turnover: registry,
            hmrc_turnover: hmrc,
            last_accounts_date: None,
            vat_number: None,
            category: "Cleaning".to_string(),
        }
    }

    fn criteria() -> FilterCriteria {
        FilterCriteria::new(1_000_000, 1_000_000_000, 50, vec!["81210".to_string()]).unwrap()
    }

    fn as_of() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
    }

    #[test]
    fn spec_scenario_is_accepted_with_qualifying_age_54() {
        let record = record("81210", Some(2_000_000), None);
        assert!(accepts(&record, &criteria(), as_of()));
        let qualifying = qualifying_directors(&record, 50, as_of());
        assert_eq!(qualifying, vec![("SMITH, Janet".to_string(), 54)]);
    }

    #[test]
    fn unknown_turnover_on_both_sources_rejects() {
        let record = record("81210", None, None);
        assert!(!accepts(&record, &criteria(), as_of()));
    }

    #[test]
    fn either_turnover_source_in_band_suffices() {
        // Registry out of band, secondary in band.
        let rec = record("81210", Some(500), Some(5_000_000));
        assert!(accepts(&rec, &criteria(), as_of()));
        // Secondary out of band, registry in band.
        let rec = record("81210", Some(5_000_000), Some(500));
        assert!(accepts(&rec, &criteria(), as_of()));
        // Both known, both out of band.
        let rec = record("81210", Some(500), Some(999));
        assert!(!accepts(&rec, &criteria(), as_of()));
    }

    #[test]
    fn band_bounds_are_inclusive() {
        assert!(accepts(&record("81210", Some(1_000_000), None), &criteria(), as_of()));
        assert!(accepts(
            &record("81210", Some(1_000_000_000), None),
            &criteria(),
            as_of()
        ));
        assert!(!accepts(&record("81210", Some(999_999), None), &criteria(), as_of()));
        assert!(!accepts(
            &record("81210", Some(1_000_000_001), None),
            &criteria(),
            as_of()
        ));
    }

    #[test]
    fn sic_code_outside_eligible_set_rejects() {
        let record = record("38110", Some(2_000_000), None);
        assert!(!accepts(&record, &criteria(), as_of()));
    }

    #[test]
    fn no_eligible_director_rejects() {
        let mut record = record("81210", Some(2_000_000), None);
        // Too young.
        record.officers = vec![director("YOUNG, Alice", 4, 1995)];
        assert!(!accepts(&record, &criteria(), as_of()));
        // Right age, wrong role.
        record.officers = vec![Officer {
            role: "secretary".to_string(),
            ..director("GREY, Bob", 4, 1960)
        }];
        assert!(!accepts(&record, &criteria(), as_of()));
        // Resigned.
        record.officers = vec![Officer {
            resigned: true,
            ..director("GONE, Carol", 4, 1960)
        }];
        assert!(!accepts(&record, &criteria(), as_of()));
        // No officers at all fails the filter rather than erroring.
        record.officers = vec![];
        assert!(!accepts(&record, &criteria(), as_of()));
    }

    #[test]
    fn role_match_is_case_insensitive_substring() {
        let mut record = record("81210", Some(2_000_000), None);
        record.officers = vec![Officer {
            role: "Managing Director".to_string(),
            ..director("BOSS, Dan", 4, 1960)
        }];
        assert!(accepts(&record, &criteria(), as_of()));
    }

    #[test]
    fn decision_is_idempotent() {
        let record = record("81210", Some(2_000_000), None);
        let criteria = criteria();
        let first = accepts(&record, &criteria, as_of());
        let second = accepts(&record, &criteria, as_of());
        assert_eq!(first, second);
        assert!(first);
    }

    #[test]
    fn invalid_bound_ordering_is_a_config_error() {
        let result = FilterCriteria::new(10, 5, 50, vec!["81210".to_string()]);
        assert!(matches!(result, Err(AppError::Config(_))));
    }
}
