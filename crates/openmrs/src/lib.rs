//! OpenMRS wire/boundary support for the run-report form.
//!
//! This crate provides **domain-level types** and **wire models** for the JSON bodies exchanged
//! with the OpenMRS reporting REST resources:
//! - report definitions and their declared parameters
//! - render designs (output formats) and locations
//! - the optional NMRS report category extension
//! - the run-report request body and the OpenMRS error body
//!
//! This crate focuses on:
//! - serialisation/deserialisation
//! - translation between domain types and wire structs
//!
//! It does not perform HTTP, hold form state, or know about timers.

pub mod category;
pub mod report_definition;
pub mod run_report;

mod wire;

// Re-export facades
pub use category::Categories;
pub use report_definition::{Locations, RenderDesigns, ReportDefinitions};
pub use run_report::RunReport;

// Re-export public domain-level types
pub use category::{CategoryKey, CategoryReport, CategorySet, NmrsMetadata, ReportsByCategory};
pub use report_definition::{
    Location, ParameterKind, ParameterSpec, ParameterType, RenderDesign, ReportDefinition,
};
pub use run_report::{ParameterValue, ParametersMap, RunReportRequest, INVALID_DATE};

/// Errors returned by the `openmrs` boundary crate.
#[derive(Debug, thiserror::Error)]
pub enum OpenmrsError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("translation error: {0}")]
    Translation(String),
}

/// Type alias for Results that can fail with an [`OpenmrsError`].
pub type OpenmrsResult<T> = Result<T, OpenmrsError>;
