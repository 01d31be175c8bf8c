//! Surfe Auto Enrich Library
//!
//! Reconciles a CRM contact export against Surfe's people enrichment:
//! submits the contacts as one batch, waits for the enrichment job, and
//! reports per-contact differences between the CRM and Surfe.
//!
//! # Modules
//!
//! - `config`: Configuration management.
//! - `diff`: Join and field-level comparison of CRM and Surfe records.
//! - `enrichment`: Enrichment job submission and polling.
//! - `errors`: Error handling types.
//! - `loader`: CRM CSV loading.
//! - `models`: Core data models and Surfe wire types.
//! - `projector`: Output row/column selection and CSV writing.
//! - `surfe_client`: Surfe HTTP client.

pub mod config;
pub mod diff;
pub mod enrichment;
pub mod errors;
pub mod loader;
pub mod models;
pub mod projector;
pub mod surfe_client;
