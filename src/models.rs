use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ============ Raw registry payloads ============

/// One page of `/search/companies` results.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchPage {
    #[serde(default)]
    pub items: Vec<SearchHit>,
    pub total_results: Option<u32>,
}

/// A single search result: identifier, display name and snippet.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchHit {
    pub company_number: Option<String>,
    pub title: Option<String>,
    pub snippet: Option<String>,
}

/// Full company payload from `/company/{number}`.
///
/// All optional fields stay `Option` so absence is explicit, never a
/// defaulted zero or empty date.
#[derive(Debug, Clone, Deserialize)]
pub struct CompanyProfile {
    pub company_number: Option<String>,
    pub company_name: Option<String>,
    pub company_status: Option<String>,
    #[serde(rename = "type")]
    pub company_type: Option<String>,
    pub date_of_creation: Option<NaiveDate>,
    #[serde(default)]
    pub sic_codes: Vec<String>,
    pub registered_office_address: Option<RegisteredAddress>,
    pub last_accounts: Option<LastAccounts>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisteredAddress {
    pub address_line_1: Option<String>,
    pub address_line_2: Option<String>,
    pub locality: Option<String>,
    pub region: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
}

impl RegisteredAddress {
    /// Joins the populated address parts into a single display string.
    pub fn formatted(&self) -> String {
        [
            &self.address_line_1,
            &self.address_line_2,
            &self.locality,
            &self.region,
            &self.postal_code,
            &self.country,
        ]
        .into_iter()
        .filter_map(|part| part.as_deref())
        .filter(|part| !part.trim().is_empty())
        .collect::<Vec<_>>()
        .join(", ")
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LastAccounts {
    pub made_up_to: Option<NaiveDate>,
}

/// One page of `/company/{number}/officers`.
#[derive(Debug, Clone, Deserialize)]
pub struct OfficerPage {
    #[serde(default)]
    pub items: Vec<OfficerItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OfficerItem {
    pub name: Option<String>,
    pub officer_role: Option<String>,
    pub resigned_on: Option<NaiveDate>,
    pub date_of_birth: Option<DateOfBirth>,
}

/// Partial birth date as the registry reports it: usually month + year,
/// occasionally a full date. Missing day (and month) default to 1 when an
/// age is computed.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct DateOfBirth {
    pub day: Option<u32>,
    pub month: Option<u32>,
    pub year: Option<i32>,
}

/// One page of `/company/{number}/filing-history`.
#[derive(Debug, Clone, Deserialize)]
pub struct FilingHistoryPage {
    #[serde(default)]
    pub items: Vec<Filing>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Filing {
    pub category: Option<String>,
    #[serde(default)]
    pub data: serde_json::Value,
}

// ============ Canonical records ============

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompanyStatus {
    Active,
    Dissolved,
    Other,
}

impl CompanyStatus {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "active" => CompanyStatus::Active,
            "dissolved" => CompanyStatus::Dissolved,
            _ => CompanyStatus::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CompanyStatus::Active => "active",
            CompanyStatus::Dissolved => "dissolved",
            CompanyStatus::Other => "other",
        }
    }
}

/// Canonical, normalized company record. Immutable once accepted into the
/// output sink; `company_number` is the deduplication key.
#[derive(Debug, Clone)]
pub struct CompanyRecord {
    pub company_number: String,
    pub company_name: String,
    pub status: CompanyStatus,
    pub company_type: Option<String>,
    pub incorporation_date: Option<NaiveDate>,
    pub sic_codes: Vec<String>,
    pub registered_address: String,
    pub officers: Vec<Officer>,
    /// Turnover parsed from registry accounts filings, whole pounds.
    pub registry_turnover: Option<u64>,
    /// Turnover reported by the secondary (HMRC) source, whole pounds.
    pub hmrc_turnover: Option<u64>,
    pub last_accounts_date: Option<NaiveDate>,
    pub vat_number: Option<String>,
    pub category: String,
}

#[derive(Debug, Clone)]
pub struct Officer {
    pub name: String,
    pub role: String,
    pub resigned: bool,
    pub date_of_birth: Option<DateOfBirth>,
}

/// Flattened projection of an accepted record, written once per company.
/// Field order is the output column order.
#[derive(Debug, Clone, Serialize)]
pub struct OutputRow {
    pub company_number: String,
    pub company_name: String,
    pub company_status: String,
    pub company_type: String,
    pub incorporation_date: String,
    pub sic_codes: String,
    pub registered_office_address: String,
    pub qualifying_directors: String,
    pub companies_house_turnover: String,
    pub hmrc_turnover: String,
    pub last_accounts_date: String,
    pub category: String,
    pub vat_number: String,
}

impl OutputRow {
    pub const HEADERS: [&'static str; 13] = [
        "company_number",
        "company_name",
        "company_status",
        "company_type",
        "incorporation_date",
        "sic_codes",
        "registered_office_address",
        "qualifying_directors",
        "companies_house_turnover",
        "hmrc_turnover",
        "last_accounts_date",
        "category",
        "vat_number",
    ];

    /// Builds the row from an accepted record and its qualifying directors
    /// (name, age) in officer-list order.
    pub fn from_record(record: &CompanyRecord, qualifying: &[(String, u32)]) -> Self {
        let directors = qualifying
            .iter()
            .map(|(name, age)| format!("{} ({})", name, age))
            .collect::<Vec<_>>()
            .join("; ");

        Self {
            company_number: record.company_number.clone(),
            company_name: record.company_name.clone(),
            company_status: record.status.as_str().to_string(),
            company_type: record.company_type.clone().unwrap_or_default(),
            incorporation_date: record
                .incorporation_date
                .map(|d| d.to_string())
                .unwrap_or_default(),
            sic_codes: record.sic_codes.join(", "),
            registered_office_address: record.registered_address.clone(),
            qualifying_directors: directors,
            companies_house_turnover: crate::normalize::format_turnover(record.registry_turnover),
            hmrc_turnover: crate::normalize::format_turnover(record.hmrc_turnover),
            last_accounts_date: record
                .last_accounts_date
                .map(|d| d.to_string())
                .unwrap_or_else(|| "Not available".to_string()),
            category: record.category.clone(),
            vat_number: record
                .vat_number
                .clone()
                .unwrap_or_else(|| "Not available".to_string()),
        }
    }
}
