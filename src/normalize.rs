//! Record normalization: raw registry payloads into canonical
//! [`CompanyRecord`]s, heterogeneous turnover text into whole pounds, and
//! partial birth dates into ages.

use chrono::{Datelike, NaiveDate};
use regex::Regex;

use crate::errors::AppError;
use crate::models::{
    CompanyProfile, CompanyRecord, CompanyStatus, DateOfBirth, Filing, Officer, OfficerItem,
};

/// Filing categories that can carry turnover figures.
const ACCOUNTS_CATEGORIES: [&str; 3] = [
    "accounts",
    "accounts-with-accounts-type-full",
    "accounts-with-accounts-type-small",
];

/// Field names turnover figures have been observed under.
const TURNOVER_FIELDS: [&str; 4] = ["turnover", "revenue", "total_turnover", "uk_turnover"];

/// Builds the canonical record from a company profile, its officers and the
/// already-resolved turnover figures. Absent optional fields stay `None`
/// rather than defaulting to zero.
pub fn normalize(
    profile: &CompanyProfile,
    officers: &[OfficerItem],
    registry_turnover: Option<u64>,
    hmrc_turnover: Option<u64>,
    vat_number: Option<String>,
    category: &str,
) -> Result<CompanyRecord, AppError> {
    let company_number = profile
        .company_number
        .clone()
        .filter(|n| !n.trim().is_empty())
        .ok_or_else(|| {
            AppError::MalformedPayload("company profile missing company_number".to_string())
        })?;

    let status = profile
        .company_status
        .as_deref()
        .map(CompanyStatus::parse)
        .unwrap_or(CompanyStatus::Other);

    let officers = officers
        .iter()
        .map(|item| Officer {
            name: item.name.clone().unwrap_or_default(),
            role: item.officer_role.clone().unwrap_or_default(),
            resigned: item.resigned_on.is_some(),
            date_of_birth: item.date_of_birth.clone(),
        })
        .collect();

    Ok(CompanyRecord {
        company_number,
        company_name: profile.company_name.clone().unwrap_or_default(),
        status,
        company_type: profile.company_type.clone(),
        incorporation_date: profile.date_of_creation,
        sic_codes: profile
            .sic_codes
            .iter()
            .map(|code| code.trim().to_string())
            .collect(),
        registered_address: profile
            .registered_office_address
            .as_ref()
            .map(|a| a.formatted())
            .unwrap_or_default(),
        officers,
        registry_turnover,
        hmrc_turnover,
        last_accounts_date: profile.last_accounts.as_ref().and_then(|a| a.made_up_to),
        vat_number,
        category: category.to_string(),
    })
}

/// Extracts the first parsable turnover figure from accounts filings.
///
/// Unparsable values are logged and skipped rather than aborting the record.
pub fn turnover_from_filings(filings: &[Filing]) -> Option<u64> {
    for filing in filings {
        let category = filing.category.as_deref().unwrap_or("");
        if !ACCOUNTS_CATEGORIES.contains(&category) {
            continue;
        }
        for field in TURNOVER_FIELDS {
            let Some(value) = filing.data.get(field) else {
                continue;
            };
            if let Some(number) = value.as_u64() {
                return Some(number);
            }
            if let Some(number) = value.as_f64() {
                if number >= 0.0 {
                    return Some(number.round() as u64);
                }
            }
            if let Some(text) = value.as_str() {
                match parse_turnover(text) {
                    Some(parsed) => return Some(parsed),
                    None => {
                        tracing::warn!("Could not parse turnover value '{}'", text);
                    }
                }
            }
        }
    }
    None
}

/// Parses heterogeneous turnover text into whole pounds.
///
/// Supported formats: currency symbols, thousands separators, decimals,
/// `K`/`M`/`bn` suffixes, and ranges (the conservative lower bound is
/// taken). Anything else is unknown, and unknown never satisfies a range
/// filter.
pub fn parse_turnover(raw: &str) -> Option<u64> {
    let text = raw.trim();
    if text.is_empty() {
        return None;
    }

    // Ranges: "£1,000,000 - £5,000,000", "1m to 5m". Keep the lower bound.
    let to_separator = Regex::new(r"(?i)\s+to\s+").unwrap();
    if let Some(separator) = to_separator.find(text) {
        return parse_single(&text[..separator.start()]);
    }
    if let Some((lower, _)) = text.split_once('-') {
        return parse_single(lower);
    }

    parse_single(text)
}

fn parse_single(text: &str) -> Option<u64> {
    let cleaned: String = text
        .trim()
        .chars()
        .filter(|c| !matches!(c, '£' | '$' | '€' | ',' | ' '))
        .collect();
    if cleaned.is_empty() {
        return None;
    }

    let lowered = cleaned.to_ascii_lowercase();
    let (digits, multiplier) = if let Some(stripped) = lowered.strip_suffix("bn") {
        (stripped, 1_000_000_000.0)
    } else if let Some(stripped) = lowered.strip_suffix('b') {
        (stripped, 1_000_000_000.0)
    } else if let Some(stripped) = lowered.strip_suffix('m') {
        (stripped, 1_000_000.0)
    } else if let Some(stripped) = lowered.strip_suffix('k') {
        (stripped, 1_000.0)
    } else {
        (lowered.as_str(), 1.0)
    };

    let value: f64 = digits.parse().ok()?;
    if !value.is_finite() || value < 0.0 {
        return None;
    }
    Some((value * multiplier).round() as u64)
}

/// Renders a turnover figure the way the output artifact expects it, or
/// "Not available" for unknown. Round-trips through [`parse_turnover`].
pub fn format_turnover(value: Option<u64>) -> String {
    match value {
        Some(v) => format!("£{}", group_thousands(v)),
        None => "Not available".to_string(),
    }
}

fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

/// Whole years between a (possibly partial) birth date and the fixed as-of
/// reference date.
///
/// Month/year-only birth dates assume the first day of the month; missing
/// month likewise defaults to January. Standard comparison: an officer who
/// has not yet had their birthday this year is one year younger.
pub fn age_on(dob: &DateOfBirth, as_of: NaiveDate) -> Option<u32> {
    let year = dob.year?;
    let month = dob.month.unwrap_or(1);
    let day = dob.day.unwrap_or(1);
    let birth = NaiveDate::from_ymd_opt(year, month, day)?;
    if birth > as_of {
        return None;
    }

    let mut age = as_of.year() - birth.year();
    if (as_of.month(), as_of.day()) < (birth.month(), birth.day()) {
        age -= 1;
    }
    u32::try_from(age).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn dob(day: Option<u32>, month: Option<u32>, year: Option<i32>) -> DateOfBirth {
        DateOfBirth { day, month, year }
    }

    #[test]
    fn parses_plain_and_currency_amounts() {
        assert_eq!(parse_turnover("1234567"), Some(1_234_567));
        assert_eq!(parse_turnover("£1,234,567"), Some(1_234_567));
        assert_eq!(parse_turnover("£ 2,000,000"), Some(2_000_000));
        assert_eq!(parse_turnover("£1,234,567.89"), Some(1_234_568));
    }

    #[test]
    fn parses_suffixed_amounts() {
        assert_eq!(parse_turnover("500K"), Some(500_000));
        assert_eq!(parse_turnover("£1.5M"), Some(1_500_000));
        assert_eq!(parse_turnover("2m"), Some(2_000_000));
        assert_eq!(parse_turnover("£1bn"), Some(1_000_000_000));
    }

    #[test]
    fn ranges_resolve_to_the_lower_bound() {
        assert_eq!(parse_turnover("1000000-5000000"), Some(1_000_000));
        assert_eq!(parse_turnover("£1,000,000 - £5,000,000"), Some(1_000_000));
        assert_eq!(parse_turnover("£1m to £5m"), Some(1_000_000));
    }

    #[test]
    fn unparsable_text_is_unknown() {
        assert_eq!(parse_turnover(""), None);
        assert_eq!(parse_turnover("Not available"), None);
        assert_eq!(parse_turnover("£"), None);
        assert_eq!(parse_turnover("-500"), None);
        assert_eq!(parse_turnover("n/a"), None);
    }

    #[test]
    fn format_round_trips() {
        for value in [0u64, 999, 1_000, 1_234_567, 2_000_000, 999_999_999_999] {
            let formatted = format_turnover(Some(value));
            assert_eq!(parse_turnover(&formatted), Some(value), "{}", formatted);
        }
        assert_eq!(format_turnover(None), "Not available");
    }

    #[test]
    fn month_year_birth_date_uses_first_of_month() {
        // Born March 2000, as-of 2024-06-15 => 24.
        let as_of = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
        assert_eq!(age_on(&dob(None, Some(3), Some(2000)), as_of), Some(24));
        // Same answer as explicitly assuming day 1.
        assert_eq!(age_on(&dob(Some(1), Some(3), Some(2000)), as_of), Some(24));
    }

    #[test]
    fn birthday_not_yet_reached_subtracts_one() {
        let as_of = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
        assert_eq!(age_on(&dob(None, Some(7), Some(2000)), as_of), Some(23));
        assert_eq!(age_on(&dob(Some(16), Some(6), Some(2000)), as_of), Some(23));
        assert_eq!(age_on(&dob(Some(15), Some(6), Some(2000)), as_of), Some(24));
    }

    #[test]
    fn missing_year_or_future_birth_is_unknown() {
        let as_of = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
        assert_eq!(age_on(&dob(None, Some(4), None), as_of), None);
        assert_eq!(age_on(&dob(None, Some(1), Some(2030)), as_of), None);
        // Invalid month rejected rather than panicking.
        assert_eq!(age_on(&dob(None, Some(13), Some(1970)), as_of), None);
    }

    #[test]
    fn turnover_extracted_from_accounts_filings_only() {
        let filings = vec![
            Filing {
                category: Some("confirmation-statement".to_string()),
                data: json!({"turnover": "£9,999,999"}),
            },
            Filing {
                category: Some("accounts".to_string()),
                data: json!({"turnover": "£2,500,000"}),
            },
        ];
        assert_eq!(turnover_from_filings(&filings), Some(2_500_000));
    }

    #[test]
    fn turnover_falls_through_unparsable_values() {
        let filings = vec![
            Filing {
                category: Some("accounts".to_string()),
                data: json!({"turnover": "see notes"}),
            },
            Filing {
                category: Some("accounts-with-accounts-type-full".to_string()),
                data: json!({"revenue": 1_750_000}),
            },
        ];
        assert_eq!(turnover_from_filings(&filings), Some(1_750_000));
    }

    #[test]
    fn no_accounts_filings_means_unknown() {
        assert_eq!(turnover_from_filings(&[]), None);
        let filings = vec![Filing {
            category: Some("accounts".to_string()),
            data: json!({}),
        }];
        assert_eq!(turnover_from_filings(&filings), None);
    }

    #[test]
    fn normalize_requires_a_company_number() {
        let profile = CompanyProfile {
            company_number: None,
            company_name: Some("No Number Ltd".to_string()),
            company_status: Some("active".to_string()),
            company_type: None,
            date_of_creation: None,
            sic_codes: vec![],
            registered_office_address: None,
            last_accounts: None,
        };
        assert!(normalize(&profile, &[], None, None, None, "Cleaning").is_err());
    }
}
