//! NMRS report category extension models.
//!
//! The category extension is an optional server module. When it is installed it groups report
//! definitions under a small set of category keys (`monitoring`, `dataQuality`, `biometric`,
//! `other`). When it is not installed its resources are missing entirely, and the form falls back
//! to an unfiltered report list.
//!
//! Responsibilities:
//! - Define the domain-level category set and per-report info
//! - Parse the `categories`, `category?type=` and `metadata` bodies
//!
//! Notes:
//! - Category keys are kept as open strings so a server can add a category without a client
//!   release; the known keys are provided as constants.

use crate::wire::{parse_json, require_identifier};
use crate::OpenmrsResult;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ============================================================================
// Public domain-level types
// ============================================================================

pub const MONITORING: &str = "monitoring";
pub const DATA_QUALITY: &str = "dataQuality";
pub const BIOMETRIC: &str = "biometric";
pub const OTHER: &str = "other";

/// A category key such as `monitoring` or `dataQuality`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryKey(String);

impl CategoryKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn monitoring() -> Self {
        Self::new(MONITORING)
    }

    pub fn data_quality() -> Self {
        Self::new(DATA_QUALITY)
    }

    pub fn biometric() -> Self {
        Self::new(BIOMETRIC)
    }

    pub fn other() -> Self {
        Self::new(OTHER)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CategoryKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for CategoryKey {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

/// Summary of one report as listed by the category extension.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CategoryReport {
    /// References a [`crate::ReportDefinition`] by uuid.
    pub uuid: String,
    pub name: String,
    pub description: String,
    pub category: String,
    pub parameter_count: u32,
}

impl CategoryReport {
    pub fn new(uuid: impl Into<String>) -> Self {
        Self {
            uuid: uuid.into(),
            name: String::new(),
            description: String::new(),
            category: String::new(),
            parameter_count: 0,
        }
    }
}

/// Mapping from category key to the reports listed under it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CategorySet {
    entries: BTreeMap<CategoryKey, Vec<CategoryReport>>,
}

impl CategorySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, mainly for tests and fixtures.
    pub fn with(mut self, key: CategoryKey, reports: Vec<CategoryReport>) -> Self {
        self.entries.insert(key, reports);
        self
    }

    pub fn get(&self, key: &CategoryKey) -> Option<&[CategoryReport]> {
        self.entries.get(key).map(Vec::as_slice)
    }

    pub fn keys(&self) -> impl Iterator<Item = &CategoryKey> {
        self.entries.keys()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Reports listed for a single category.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReportsByCategory {
    pub reports: Vec<CategoryReport>,
    pub count: u32,
    pub category: Option<CategoryKey>,
}

/// Module metadata published by the category extension.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NmrsMetadata {
    pub module_name: String,
    pub module_version: String,
    pub total_reports: u32,
    pub category_counts: BTreeMap<CategoryKey, u32>,
}

// ============================================================================
// Public parse operations
// ============================================================================

/// Category extension operations.
pub struct Categories;

impl Categories {
    /// Parse the `{ "categories": { ... } }` body.
    ///
    /// Returns `Ok(None)` when the body carries no `categories` member, which the extension
    /// uses to signal that it has nothing to offer.
    pub fn parse(json_text: &str) -> OpenmrsResult<Option<CategorySet>> {
        let wire: CategoriesWire = parse_json(json_text, "report categories")?;

        let Some(categories) = wire.categories else {
            return Ok(None);
        };

        let mut entries = BTreeMap::new();
        for (key, reports) in categories {
            let reports = reports
                .into_iter()
                .map(report_to_domain)
                .collect::<OpenmrsResult<Vec<_>>>()?;
            entries.insert(CategoryKey::new(key), reports);
        }

        Ok(Some(CategorySet { entries }))
    }

    /// Parse the `{ "reports": [...], "count": n, "category": key }` body.
    pub fn parse_reports_by_category(json_text: &str) -> OpenmrsResult<ReportsByCategory> {
        let wire: ReportsByCategoryWire = parse_json(json_text, "category reports")?;
        let reports = wire
            .reports
            .into_iter()
            .map(report_to_domain)
            .collect::<OpenmrsResult<Vec<_>>>()?;

        Ok(ReportsByCategory {
            count: wire.count.unwrap_or(reports.len() as u32),
            reports,
            category: wire.category.map(CategoryKey::new),
        })
    }

    /// Parse the extension metadata body.
    pub fn parse_metadata(json_text: &str) -> OpenmrsResult<NmrsMetadata> {
        let wire: MetadataWire = parse_json(json_text, "category metadata")?;

        Ok(NmrsMetadata {
            module_name: wire.module_name,
            module_version: wire.module_version,
            total_reports: wire.total_reports,
            category_counts: wire
                .category_counts
                .into_iter()
                .map(|(k, v)| (CategoryKey::new(k), v))
                .collect(),
        })
    }
}

// ============================================================================
// Wire types (internal)
// ============================================================================

#[derive(Debug, Deserialize)]
struct CategoriesWire {
    #[serde(default)]
    categories: Option<BTreeMap<String, Vec<CategoryReportWire>>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CategoryReportWire {
    uuid: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    category: String,
    #[serde(default)]
    parameter_count: u32,
}

#[derive(Debug, Deserialize)]
struct ReportsByCategoryWire {
    #[serde(default)]
    reports: Vec<CategoryReportWire>,
    #[serde(default)]
    count: Option<u32>,
    #[serde(default)]
    category: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MetadataWire {
    module_name: String,
    #[serde(default)]
    module_version: String,
    #[serde(default)]
    total_reports: u32,
    #[serde(default)]
    category_counts: BTreeMap<String, u32>,
}

fn report_to_domain(wire: CategoryReportWire) -> OpenmrsResult<CategoryReport> {
    Ok(CategoryReport {
        uuid: require_identifier(wire.uuid, "category report uuid")?,
        name: wire.name,
        description: wire.description,
        category: wire.category,
        parameter_count: wire.parameter_count,
    })
}
