//! Name source: the ordered sequence of search terms fed into the
//! pipeline, either a static line file or the built-in search-term
//! expansion over SIC categories.

use std::path::Path;

use crate::errors::AppError;

/// A search term with the business category it expands from.
#[derive(Debug, Clone)]
pub struct SearchTerm {
    pub term: String,
    pub category: String,
}

/// A business category: its SIC codes and the free-text terms that surface
/// its companies in registry search.
#[derive(Debug, Clone)]
pub struct SicCategory {
    pub name: String,
    pub sic_codes: Vec<String>,
    pub search_terms: Vec<String>,
}

pub struct NameSource {
    terms: Vec<SearchTerm>,
    categories: Vec<SicCategory>,
}

/// SIC codes covered by the built-in search plan. Used as the default
/// eligible set when none is configured.
pub fn default_sic_codes() -> Vec<String> {
    default_categories()
        .into_iter()
        .flat_map(|category| category.sic_codes)
        .collect()
}

fn default_categories() -> Vec<SicCategory> {
    vec![
        SicCategory {
            name: "Cleaning".to_string(),
            sic_codes: vec![
                "81210".to_string(), // General cleaning of buildings
                "81220".to_string(), // Other building and industrial cleaning
                "81290".to_string(), // Other cleaning activities
            ],
            search_terms: vec![
                "cleaning services".to_string(),
                "facilities management".to_string(),
            ],
        },
        SicCategory {
            name: "Waste Management".to_string(),
            sic_codes: vec![
                "38110".to_string(), // Collection of non-hazardous waste
                "38120".to_string(), // Collection of hazardous waste
                "38210".to_string(), // Treatment of non-hazardous waste
                "38220".to_string(), // Treatment of hazardous waste
                "38230".to_string(), // Recovery of sorted materials
            ],
            search_terms: vec![
                "waste management".to_string(),
                "recycling".to_string(),
            ],
        },
    ]
}

impl NameSource {
    /// The built-in search-term expansion over SIC categories.
    pub fn default_plan() -> Self {
        let categories = default_categories();
        let terms = categories
            .iter()
            .flat_map(|category| {
                category.search_terms.iter().map(|term| SearchTerm {
                    term: term.clone(),
                    category: category.name.clone(),
                })
            })
            .collect();
        Self { terms, categories }
    }

    /// Reads one search term per non-empty line. Terms from a file carry no
    /// category information.
    pub fn from_lines(path: &Path) -> Result<Self, AppError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| AppError::Io(format!("failed to read {}: {}", path.display(), e)))?;
        let terms: Vec<SearchTerm> = contents
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(|line| SearchTerm {
                term: line.trim_matches(['"', ',']).trim().to_string(),
                category: String::new(),
            })
            .collect();
        if terms.is_empty() {
            return Err(AppError::Config(format!(
                "names file {} contains no search terms",
                path.display()
            )));
        }
        tracing::info!("Loaded {} search terms from {}", terms.len(), path.display());
        Ok(Self {
            terms,
            categories: default_categories(),
        })
    }

    pub fn terms(&self) -> &[SearchTerm] {
        &self.terms
    }

    /// Resolves the business category for a company from its SIC codes,
    /// matching by code prefix so sub-codes map to their parent category.
    pub fn category_for(&self, sic_codes: &[String]) -> Option<&str> {
        self.categories
            .iter()
            .find(|category| {
                sic_codes.iter().any(|code| {
                    category
                        .sic_codes
                        .iter()
                        .any(|eligible| code.trim().starts_with(eligible.as_str()))
                })
            })
            .map(|category| category.name.as_str())
    }
}
