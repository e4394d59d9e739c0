//! Category filtering of the report list.
//!
//! Filtering is a pure derivation: the visible list is recomputed from the full report list,
//! the (possibly absent) category set and the selected key. Filtering never reorders.

use crate::config::CategoryOption;
use openmrs::{CategoryKey, CategorySet, ReportDefinition};
use std::collections::HashSet;
use std::sync::Arc;

/// A configured category together with how many reports the server lists under it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CategoryOptionCount {
    pub key: CategoryKey,
    pub label: String,
    pub count: usize,
}

#[derive(Clone, Debug)]
pub struct CategoryIndex {
    options: Vec<CategoryOption>,
}

impl CategoryIndex {
    pub fn new(options: Vec<CategoryOption>) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &[CategoryOption] {
        &self.options
    }

    /// Uuids listed under `key`, or `None` when the set has no entry for it.
    pub fn report_uuids<'a>(
        categories: &'a CategorySet,
        key: &CategoryKey,
    ) -> Option<HashSet<&'a str>> {
        categories
            .get(key)
            .map(|reports| reports.iter().map(|r| r.uuid.as_str()).collect())
    }

    /// Visible report list for the current category selection.
    ///
    /// The full list is returned unchanged when no category is selected, the category set is
    /// absent, or the set has no entry for the selected key.
    pub fn filter(
        &self,
        reports: &[Arc<ReportDefinition>],
        categories: Option<&CategorySet>,
        selected: Option<&CategoryKey>,
    ) -> Vec<Arc<ReportDefinition>> {
        let uuids = match (categories, selected) {
            (Some(categories), Some(key)) => Self::report_uuids(categories, key),
            _ => None,
        };

        match uuids {
            Some(uuids) => reports
                .iter()
                .filter(|r| uuids.contains(r.uuid.as_str()))
                .cloned()
                .collect(),
            None => reports.to_vec(),
        }
    }

    /// Options for the category filter control, with report counts.
    ///
    /// Returns nothing when the category set is absent: the control is hidden rather than
    /// shown empty.
    pub fn option_counts(&self, categories: Option<&CategorySet>) -> Vec<CategoryOptionCount> {
        let Some(categories) = categories else {
            return Vec::new();
        };

        self.options
            .iter()
            .map(|o| CategoryOptionCount {
                key: o.key.clone(),
                label: o.label.clone(),
                count: categories.get(&o.key).map_or(0, <[_]>::len),
            })
            .collect()
    }
}

impl Default for CategoryIndex {
    fn default() -> Self {
        crate::config::FormConfig::default().category_index()
    }
}
