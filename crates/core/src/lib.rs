//! # Reports Core
//!
//! Core logic for the OpenMRS run-report form.
//!
//! This crate contains the form's state and rules, independent of any UI:
//! - selection state with its reset cascade (category → report → render mode/parameters)
//! - category filtering of the report list
//! - the parameter type gate and form validity
//! - the submission lifecycle with its settle delay and teardown
//! - REST-backed collaborators for the OpenMRS reporting resources
//!
//! **No rendering concerns**: wire formats live in the `openmrs` crate and presentation belongs
//! to whoever drives [`RunReportForm`].

pub mod category_index;
pub mod config;
pub mod constants;
pub mod error;
pub mod form;
pub mod parameter_gate;
pub mod providers;
pub mod rest;
pub mod selection;
pub mod submission;
pub mod validity;

#[cfg(test)]
mod testing;

pub use category_index::{CategoryIndex, CategoryOptionCount};
pub use config::{ClientConfig, FormConfig};
pub use error::{ReportError, ReportResult};
pub use form::{Collaborators, InputCallback, ParameterBinding, RunReportForm};
pub use parameter_gate::ParameterTypeGate;
pub use providers::{
    CategoryProvider, Notification, NotificationKind, NotificationSink, ReportCatalogue,
    RunReportTransport, SettleClock, TokioClock, TracingNotifier,
};
pub use rest::RestClient;
pub use selection::{FormSelection, SelectionChange};
pub use submission::{CompletionCallback, SubmissionOrchestrator, SubmissionPhase};
pub use validity::{ValidityEvaluator, ValidityReport};
