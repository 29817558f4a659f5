//! Company Screener Library
//!
//! This library provides the core functionality for the company screening
//! pipeline: searching a company registry by sector-specific terms, enriching
//! candidates with officer and turnover data, filtering them against
//! configurable criteria, and writing accepted companies to a CSV report.
//!
//! # Modules
//!
//! - `config`: Configuration management.
//! - `dedup`: Cross-term company deduplication.
//! - `errors`: Error handling types.
//! - `filter`: Screening criteria and the acceptance predicate.
//! - `models`: Raw API payloads and canonical records.
//! - `names`: Search terms and SIC category plans.
//! - `normalize`: Payload normalization, turnover parsing and age math.
//! - `pipeline`: End-to-end batch orchestration.
//! - `rate_limit`: Shared request pacing.
//! - `registry_client`: Company registry API client.
//! - `retry`: Backoff helper for transient failures.
//! - `sink`: CSV report writer.
//! - `turnover`: Pluggable secondary turnover sources.

pub mod config;
pub mod dedup;
pub mod errors;
pub mod filter;
pub mod models;
pub mod names;
pub mod normalize;
pub mod pipeline;
pub mod rate_limit;
pub mod registry_client;
pub mod retry;
pub mod sink;
pub mod turnover;
