//! Occupational stress self-check: section-gated intake, scorer integration,
//! and print-ready report composition.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
