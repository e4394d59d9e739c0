//! Constants used throughout the reports core crate.
//!
//! This module contains the REST paths and default configuration values to ensure
//! consistency across the codebase and make maintenance easier.

use openmrs::report_definition::{
    CONCEPT_TYPE, DATE_TYPE, ENCOUNTER_TYPE_TYPE, INTEGER_TYPE, LOCATION_TYPE, STRING_TYPE,
};

/// Parameter types the form can render and submit unless configured otherwise.
pub const DEFAULT_SUPPORTED_PARAMETER_TYPES: &[&str] = &[
    DATE_TYPE,
    STRING_TYPE,
    INTEGER_TYPE,
    LOCATION_TYPE,
    CONCEPT_TYPE,
    ENCOUNTER_TYPE_TYPE,
];

/// Default category options, in display order, as `(key, label)`.
pub const DEFAULT_CATEGORY_OPTIONS: &[(&str, &str)] = &[
    (openmrs::category::MONITORING, "Monitoring"),
    (openmrs::category::DATA_QUALITY, "Data Quality"),
    (openmrs::category::BIOMETRIC, "Biometric"),
    (openmrs::category::OTHER, "Other"),
];

/// Wait after the server accepts a run request before treating the run as listed.
pub const DEFAULT_SETTLE_DELAY_MS: u64 = 500;

/// Default HTTP request timeout for the REST client.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Default success notification title.
pub const DEFAULT_SUCCESS_TITLE: &str = "Report ran successfully";

/// Default failure notification title.
pub const DEFAULT_ERROR_TITLE: &str = "Error running report";

/// Report definition list resource.
pub const REPORT_DEFINITIONS_PATH: &str = "/ws/rest/v1/reportingrest/reportDefinition?v=full";

/// Render design list resource; takes a `reportDefinitionUuid` query parameter.
pub const REPORT_DESIGNS_PATH: &str = "/ws/rest/v1/reportingrest/designs";

/// Location list resource.
pub const LOCATIONS_PATH: &str = "/ws/rest/v1/location?v=default";

/// Run-report resource.
pub const RUN_REPORT_PATH: &str = "/ws/rest/v1/reportingrest/runReport";

/// Category extension: all categories.
pub const NMRS_CATEGORIES_PATH: &str = "/ws/rest/v1/nmrsreports/categories";

/// Category extension: reports for one category; takes a `type` query parameter.
pub const NMRS_CATEGORY_PATH: &str = "/ws/rest/v1/nmrsreports/category";

/// Category extension: module metadata.
pub const NMRS_METADATA_PATH: &str = "/ws/rest/v1/nmrsreports/metadata";
