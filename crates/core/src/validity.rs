//! Form validity evaluation.
//!
//! A form is valid when all of the following hold:
//! 1. a report is selected
//! 2. every declared parameter type is on the whitelist, whether or not the parameter is required
//! 3. every required parameter has a present value
//!    (see [`openmrs::ParameterValue::is_present`])
//! 4. the report uuid and render mode uuid are both non-empty
//!
//! Evaluation is synchronous and pure; callers recompute it after every state change.

use crate::parameter_gate::ParameterTypeGate;
use openmrs::{ParameterType, ParametersMap, ReportDefinition};
use std::collections::BTreeSet;

/// Inputs to a validity evaluation.
#[derive(Clone, Copy, Debug)]
pub struct ValidityInput<'a> {
    pub current_report: Option<&'a ReportDefinition>,
    pub report_parameters: &'a ParametersMap,
    pub report_uuid: Option<&'a str>,
    pub render_mode_uuid: Option<&'a str>,
}

/// Breakdown of why a form is or is not valid.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ValidityReport {
    pub report_selected: bool,
    pub unsupported_types: BTreeSet<ParameterType>,
    /// Required parameters without a present value, in declaration order.
    pub missing_required: Vec<String>,
    pub report_uuid_present: bool,
    pub render_mode_present: bool,
}

impl ValidityReport {
    pub fn is_valid(&self) -> bool {
        self.report_selected
            && self.unsupported_types.is_empty()
            && self.missing_required.is_empty()
            && self.report_uuid_present
            && self.render_mode_present
    }
}

#[derive(Clone, Debug, Default)]
pub struct ValidityEvaluator {
    gate: ParameterTypeGate,
}

impl ValidityEvaluator {
    pub fn new(gate: ParameterTypeGate) -> Self {
        Self { gate }
    }

    pub fn gate(&self) -> &ParameterTypeGate {
        &self.gate
    }

    pub fn assess(&self, input: ValidityInput<'_>) -> ValidityReport {
        let report_uuid_present = input.report_uuid.is_some_and(|u| !u.is_empty());
        let render_mode_present = input.render_mode_uuid.is_some_and(|u| !u.is_empty());

        let Some(report) = input.current_report else {
            return ValidityReport {
                report_selected: false,
                report_uuid_present,
                render_mode_present,
                ..ValidityReport::default()
            };
        };

        let missing_required = report
            .parameters
            .iter()
            .filter(|p| p.required)
            .filter(|p| {
                !input
                    .report_parameters
                    .get(&p.name)
                    .is_some_and(|v| v.is_present())
            })
            .map(|p| p.name.clone())
            .collect();

        ValidityReport {
            report_selected: true,
            unsupported_types: self.gate.classify(&report.parameters).unsupported,
            missing_required,
            report_uuid_present,
            render_mode_present,
        }
    }

    pub fn is_valid(&self, input: ValidityInput<'_>) -> bool {
        self.assess(input).is_valid()
    }
}
