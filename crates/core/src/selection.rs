//! Selection state and its reset cascade.
//!
//! All edits go through [`FormSelection::apply`], keyed by which field changed:
//!
//! | change      | clears                                   |
//! |-------------|------------------------------------------|
//! | category    | report, current report, render mode, parameters |
//! | report      | render mode, parameters                  |
//! | render mode | nothing                                  |
//! | parameter   | nothing (merges one key)                 |
//!
//! Parameter keys are always a subset of the current report's declared parameter names.

use crate::{ReportError, ReportResult};
use openmrs::{CategoryKey, ParameterValue, ParametersMap, ReportDefinition, RunReportRequest};
use std::sync::Arc;

/// A single edit to the form selection.
#[derive(Clone, Debug)]
pub enum SelectionChange {
    Category(Option<CategoryKey>),
    Report {
        uuid: Option<String>,
        /// Definition resolved from the visible list; `None` if the uuid did not resolve.
        definition: Option<Arc<ReportDefinition>>,
    },
    RenderMode(Option<String>),
    Parameter {
        name: String,
        value: ParameterValue,
    },
}

#[derive(Clone, Debug, Default)]
pub struct FormSelection {
    selected_category: Option<CategoryKey>,
    report_uuid: Option<String>,
    current_report: Option<Arc<ReportDefinition>>,
    render_mode_uuid: Option<String>,
    report_parameters: ParametersMap,
}

impl FormSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one change and its reset cascade.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::NoReportSelected`] or [`ReportError::UnknownParameter`] for a
    /// parameter edit that the current report does not declare; the selection is unchanged.
    pub fn apply(&mut self, change: SelectionChange) -> ReportResult<()> {
        match change {
            SelectionChange::Category(category) => {
                tracing::debug!(category = ?category, "category changed; clearing report");
                self.selected_category = category;
                self.clear_report();
            }
            SelectionChange::Report { uuid, definition } => {
                let uuid = uuid.filter(|u| !u.is_empty());
                tracing::debug!(report = ?uuid, "report changed; clearing render mode and parameters");
                self.current_report = definition.filter(|d| Some(&d.uuid) == uuid.as_ref());
                self.report_uuid = uuid;
                self.render_mode_uuid = None;
                self.report_parameters.clear();
            }
            SelectionChange::RenderMode(uuid) => {
                self.render_mode_uuid = uuid.filter(|u| !u.is_empty());
            }
            SelectionChange::Parameter { name, value } => {
                let report = self
                    .current_report
                    .as_ref()
                    .ok_or(ReportError::NoReportSelected)?;
                if !report.declares(&name) {
                    return Err(ReportError::UnknownParameter {
                        report_uuid: report.uuid.clone(),
                        name,
                    });
                }
                self.report_parameters.insert(name, value);
            }
        }

        Ok(())
    }

    fn clear_report(&mut self) {
        self.report_uuid = None;
        self.current_report = None;
        self.render_mode_uuid = None;
        self.report_parameters.clear();
    }

    pub fn selected_category(&self) -> Option<&CategoryKey> {
        self.selected_category.as_ref()
    }

    pub fn report_uuid(&self) -> Option<&str> {
        self.report_uuid.as_deref()
    }

    pub fn current_report(&self) -> Option<&Arc<ReportDefinition>> {
        self.current_report.as_ref()
    }

    pub fn render_mode_uuid(&self) -> Option<&str> {
        self.render_mode_uuid.as_deref()
    }

    pub fn report_parameters(&self) -> &ParametersMap {
        &self.report_parameters
    }

    pub fn parameter(&self, name: &str) -> Option<&ParameterValue> {
        self.report_parameters.get(name)
    }

    /// Build the run-report request from the current selection.
    pub fn to_request(&self) -> ReportResult<RunReportRequest> {
        let report_uuid = self
            .report_uuid
            .clone()
            .ok_or(ReportError::NoReportSelected)?;
        let render_mode_uuid = self
            .render_mode_uuid
            .clone()
            .ok_or_else(|| ReportError::InvalidInput("no render mode is selected".into()))?;

        Ok(RunReportRequest {
            report_uuid,
            parameter_mappings: self.report_parameters.clone(),
            render_mode_uuid,
        })
    }
}
