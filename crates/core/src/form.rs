//! The run-report form view model.
//!
//! `RunReportForm` owns the selection state and the submission orchestrator, holds the read-only
//! inputs fetched from the collaborators, and recomputes validity after every edit. It renders
//! nothing; a UI (or the CLI) reads its accessors and forwards user input to its methods.
//!
//! Lifetime: dropping the form, or calling [`RunReportForm::teardown`], cancels any pending
//! submission so nothing fires against a form that no longer exists.

use crate::category_index::{CategoryIndex, CategoryOptionCount};
use crate::config::FormConfig;
use crate::providers::{
    CategoryProvider, NotificationSink, ReportCatalogue, RunReportTransport, SettleClock,
};
use crate::selection::{FormSelection, SelectionChange};
use crate::submission::{CompletionCallback, SubmissionOrchestrator, SubmissionPhase};
use crate::validity::{ValidityEvaluator, ValidityInput, ValidityReport};
use crate::{ReportError, ReportResult};
use chrono::NaiveDate;
use openmrs::{
    CategoryKey, CategorySet, Location, ParameterKind, ParameterSpec, ParameterValue,
    RenderDesign, ReportDefinition,
};
use std::sync::Arc;
use tokio::sync::watch;

/// The collaborators a form talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub catalogue: Arc<dyn ReportCatalogue>,
    pub categories: Arc<dyn CategoryProvider>,
    pub transport: Arc<dyn RunReportTransport>,
    pub notifier: Arc<dyn NotificationSink>,
    pub clock: Arc<dyn SettleClock>,
}

/// Which callback a parameter input must report changes through.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputCallback {
    /// [`RunReportForm::on_date_change`]
    DateChange,
    /// [`RunReportForm::on_change`] or [`RunReportForm::on_checkbox_change`]
    Change,
}

/// What a parameter input renderer needs for one declared parameter.
#[derive(Clone, Debug)]
pub struct ParameterBinding<'a> {
    pub spec: &'a ParameterSpec,
    pub value: Option<&'a ParameterValue>,
    pub callback: InputCallback,
}

pub struct RunReportForm {
    config: FormConfig,
    category_index: CategoryIndex,
    evaluator: ValidityEvaluator,
    catalogue: Arc<dyn ReportCatalogue>,
    report_definitions: Vec<Arc<ReportDefinition>>,
    categories: Option<CategorySet>,
    locations: Vec<Location>,
    report_designs: Vec<RenderDesign>,
    selection: FormSelection,
    is_form_valid: bool,
    orchestrator: SubmissionOrchestrator,
}

impl RunReportForm {
    /// Fetch the catalogue, categories and locations and build an empty form.
    ///
    /// A failing category provider is treated as the extension being absent, and failing
    /// locations leave the location list empty; neither is an error.
    ///
    /// # Errors
    ///
    /// Returns the catalogue's error if the report definitions cannot be fetched.
    pub async fn load(config: FormConfig, collaborators: Collaborators) -> ReportResult<Self> {
        let report_definitions = collaborators
            .catalogue
            .fetch_report_definitions()
            .await?
            .into_iter()
            .map(Arc::new)
            .collect::<Vec<_>>();

        let categories = match collaborators.categories.fetch_categories().await {
            Ok(categories) => categories,
            Err(err) => {
                tracing::warn!(error = %err, "report categories unavailable; filtering disabled");
                None
            }
        };

        let locations = match collaborators.catalogue.fetch_locations().await {
            Ok(locations) => locations,
            Err(err) => {
                tracing::warn!(error = %err, "locations unavailable");
                Vec::new()
            }
        };

        tracing::debug!(
            reports = report_definitions.len(),
            categories = categories.is_some(),
            locations = locations.len(),
            "run-report form loaded"
        );

        let orchestrator = SubmissionOrchestrator::new(
            collaborators.transport,
            collaborators.notifier,
            collaborators.clock,
            config.settle_delay(),
            config.notifications().clone(),
        );

        Ok(Self {
            category_index: config.category_index(),
            evaluator: ValidityEvaluator::new(config.parameter_gate()),
            config,
            catalogue: collaborators.catalogue,
            report_definitions,
            categories,
            locations,
            report_designs: Vec::new(),
            selection: FormSelection::new(),
            is_form_valid: false,
            orchestrator,
        })
    }

    pub fn config(&self) -> &FormConfig {
        &self.config
    }

    /// Every fetched report definition, unfiltered.
    pub fn report_definitions(&self) -> &[Arc<ReportDefinition>] {
        &self.report_definitions
    }

    /// Report definitions selectable under the current category.
    pub fn visible_reports(&self) -> Vec<Arc<ReportDefinition>> {
        self.category_index.filter(
            &self.report_definitions,
            self.categories.as_ref(),
            self.selection.selected_category(),
        )
    }

    pub fn categories(&self) -> Option<&CategorySet> {
        self.categories.as_ref()
    }

    /// Options for the category filter; empty when the extension is absent.
    pub fn category_options(&self) -> Vec<CategoryOptionCount> {
        self.category_index.option_counts(self.categories.as_ref())
    }

    pub fn locations(&self) -> &[Location] {
        &self.locations
    }

    /// Render designs for the selected report.
    pub fn report_designs(&self) -> &[RenderDesign] {
        &self.report_designs
    }

    pub fn selection(&self) -> &FormSelection {
        &self.selection
    }

    pub fn select_category(&mut self, category: Option<CategoryKey>) {
        self.apply(SelectionChange::Category(category))
            .unwrap_or_else(|err| tracing::warn!(error = %err, "category change refused"));
        self.report_designs.clear();
    }

    /// Select a report from the visible list and refetch its render designs.
    ///
    /// An empty uuid clears the report. A uuid that is not in the visible list is kept but
    /// leaves no current report, so the form stays invalid.
    pub async fn select_report(&mut self, report_uuid: &str) {
        let definition = self
            .visible_reports()
            .into_iter()
            .find(|r| r.uuid == report_uuid);
        if definition.is_none() && !report_uuid.is_empty() {
            tracing::warn!(report = report_uuid, "selected report is not in the visible list");
        }

        self.apply(SelectionChange::Report {
            uuid: Some(report_uuid.to_string()),
            definition,
        })
        .unwrap_or_else(|err| tracing::warn!(error = %err, "report change refused"));

        self.refresh_designs().await;
    }

    /// Refetch render designs for the selected report.
    pub async fn refresh_designs(&mut self) {
        let Some(report_uuid) = self.selection.report_uuid().map(str::to_string) else {
            self.report_designs.clear();
            return;
        };

        self.report_designs = match self.catalogue.fetch_report_designs(&report_uuid).await {
            Ok(designs) => designs,
            Err(err) => {
                tracing::warn!(report = %report_uuid, error = %err, "failed to fetch render designs");
                Vec::new()
            }
        };
    }

    pub fn select_render_mode(&mut self, render_mode_uuid: &str) {
        self.apply(SelectionChange::RenderMode(Some(render_mode_uuid.to_string())))
            .unwrap_or_else(|err| tracing::warn!(error = %err, "render mode change refused"));
    }

    /// Text-input callback: types `raw` by the parameter's declared kind and merges it.
    pub fn on_change(&mut self, name: &str, raw: &str) -> ReportResult<()> {
        let kind = self
            .selection
            .current_report()
            .and_then(|r| r.parameter(name))
            .map_or(ParameterKind::Unknown, |p| p.parameter_type.kind());

        self.set_parameter(name, ParameterValue::from_input(kind, raw))
    }

    /// Checkbox-input callback.
    pub fn on_checkbox_change(&mut self, name: &str, checked: bool) -> ReportResult<()> {
        self.set_parameter(name, ParameterValue::Flag(checked))
    }

    /// Date-picker callback. `None` records the invalid-date sentinel.
    pub fn on_date_change(&mut self, name: &str, date: Option<NaiveDate>) -> ReportResult<()> {
        self.set_parameter(name, ParameterValue::from_date(date))
    }

    /// Route raw text to the callback the parameter's binding names.
    pub fn set_parameter_from_input(&mut self, name: &str, raw: &str) -> ReportResult<()> {
        let is_date = self
            .selection
            .current_report()
            .and_then(|r| r.parameter(name))
            .is_some_and(|p| p.parameter_type.is_date());

        if is_date && !raw.trim().is_empty() {
            let date = NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok();
            self.on_date_change(name, date)
        } else {
            self.on_change(name, raw)
        }
    }

    fn set_parameter(&mut self, name: &str, value: ParameterValue) -> ReportResult<()> {
        self.apply(SelectionChange::Parameter {
            name: name.to_string(),
            value,
        })
    }

    /// Inputs to render for the current report, in declaration order.
    pub fn parameter_bindings(&self) -> Vec<ParameterBinding<'_>> {
        let Some(report) = self.selection.current_report() else {
            return Vec::new();
        };

        report
            .parameters
            .iter()
            .map(|spec| ParameterBinding {
                spec,
                value: self.selection.parameter(&spec.name),
                callback: if spec.parameter_type.is_date() {
                    InputCallback::DateChange
                } else {
                    InputCallback::Change
                },
            })
            .collect()
    }

    fn apply(&mut self, change: SelectionChange) -> ReportResult<()> {
        let result = self.selection.apply(change);
        self.revalidate();
        result
    }

    fn validity_input(&self) -> ValidityInput<'_> {
        ValidityInput {
            current_report: self.selection.current_report().map(Arc::as_ref),
            report_parameters: self.selection.report_parameters(),
            report_uuid: self.selection.report_uuid(),
            render_mode_uuid: self.selection.render_mode_uuid(),
        }
    }

    fn revalidate(&mut self) {
        self.is_form_valid = self.evaluator.is_valid(self.validity_input());
    }

    pub fn is_form_valid(&self) -> bool {
        self.is_form_valid
    }

    /// Why the form is or is not valid.
    pub fn validity(&self) -> ValidityReport {
        self.evaluator.assess(self.validity_input())
    }

    pub fn is_submitting(&self) -> bool {
        self.orchestrator.is_submitting()
    }

    /// Whether the run control is enabled.
    pub fn can_submit(&self) -> bool {
        self.is_form_valid && !self.is_submitting()
    }

    /// Submit the current selection. `on_complete` runs once, after the run has settled.
    ///
    /// The form is not reset afterwards; the caller decides what to do on completion.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::FormInvalid`] when the form is not valid, and
    /// [`ReportError::SubmissionInFlight`] while a previous submission is still running.
    pub fn submit(&self, on_complete: CompletionCallback) -> ReportResult<()> {
        if !self.is_form_valid {
            return Err(ReportError::FormInvalid);
        }
        if self.is_submitting() {
            return Err(ReportError::SubmissionInFlight);
        }

        let request = self.selection.to_request()?;
        self.orchestrator.submit(request, on_complete)
    }

    pub fn submission_phase(&self) -> SubmissionPhase {
        self.orchestrator.phase()
    }

    pub fn subscribe(&self) -> watch::Receiver<SubmissionPhase> {
        self.orchestrator.subscribe()
    }

    /// Cancel any pending submission. Also happens on drop.
    pub fn teardown(&self) {
        self.orchestrator.teardown();
    }
}
