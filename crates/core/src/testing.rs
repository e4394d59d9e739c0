//! In-memory collaborator fakes shared by the unit tests.

use crate::providers::{
    CategoryProvider, Notification, NotificationSink, ReportCatalogue, RunReportTransport,
    SettleClock,
};
use crate::submission::CompletionCallback;
use crate::{ReportError, ReportResult};
use async_trait::async_trait;
use openmrs::{
    CategoryKey, CategoryReport, CategorySet, Location, NmrsMetadata, ParameterSpec,
    ParameterType, RenderDesign, ReportDefinition, ReportsByCategory, RunReportRequest,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

#[derive(Default)]
pub(crate) struct RecordingNotifier {
    seen: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub(crate) fn notifications(&self) -> Vec<Notification> {
        self.seen.lock().expect("notifier lock").clone()
    }
}

impl NotificationSink for RecordingNotifier {
    fn notify(&self, notification: Notification) {
        self.seen.lock().expect("notifier lock").push(notification);
    }
}

/// Transport that records requests and answers with a fixed outcome.
pub(crate) struct ScriptedTransport {
    rejection: Option<Option<String>>,
    gate: Option<Notify>,
    requests: Mutex<Vec<RunReportRequest>>,
}

impl ScriptedTransport {
    pub(crate) fn accepting() -> Self {
        Self {
            rejection: None,
            gate: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn rejecting(message: Option<&str>) -> Self {
        Self {
            rejection: Some(message.map(str::to_string)),
            gate: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Accepts, but only once [`ScriptedTransport::release`] is called.
    pub(crate) fn gated() -> Self {
        Self {
            rejection: None,
            gate: Some(Notify::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn release(&self) {
        if let Some(gate) = &self.gate {
            gate.notify_one();
        }
    }

    pub(crate) fn requests(&self) -> Vec<RunReportRequest> {
        self.requests.lock().expect("transport lock").clone()
    }
}

#[async_trait]
impl RunReportTransport for ScriptedTransport {
    async fn submit_run_report(&self, request: &RunReportRequest) -> ReportResult<()> {
        self.requests
            .lock()
            .expect("transport lock")
            .push(request.clone());

        if let Some(gate) = &self.gate {
            gate.notified().await;
        }

        match &self.rejection {
            None => Ok(()),
            Some(message) => Err(ReportError::Rejected {
                status: 400,
                message: message.clone(),
            }),
        }
    }
}

/// Settle clock that only fires when released.
#[derive(Default)]
pub(crate) struct GatedClock {
    gate: Notify,
    sleeping: Notify,
    requested: Mutex<Vec<Duration>>,
}

impl GatedClock {
    pub(crate) fn release(&self) {
        self.gate.notify_one();
    }

    pub(crate) async fn wait_until_sleeping(&self) {
        self.sleeping.notified().await;
    }

    pub(crate) fn requested(&self) -> Vec<Duration> {
        self.requested.lock().expect("clock lock").clone()
    }
}

#[async_trait]
impl SettleClock for GatedClock {
    async fn sleep(&self, duration: Duration) {
        self.requested.lock().expect("clock lock").push(duration);
        self.sleeping.notify_one();
        self.gate.notified().await;
    }
}

pub(crate) fn callback_counter() -> (Arc<AtomicUsize>, CompletionCallback) {
    let calls = Arc::new(AtomicUsize::new(0));
    let counted = calls.clone();
    (
        calls,
        Box::new(move || {
            counted.fetch_add(1, Ordering::SeqCst);
        }),
    )
}

/// Catalogue and category fixture:
/// - `R1`: required date `startDate`, optional string `facility` (monitoring)
/// - `R2`: required location `location` (dataQuality)
/// - `R3`: optional `java.lang.Boolean` flag (other)
pub(crate) struct FakeCatalogue {
    pub(crate) definitions: Vec<ReportDefinition>,
    pub(crate) designs: HashMap<String, Vec<RenderDesign>>,
    pub(crate) categories: Option<CategorySet>,
    pub(crate) fail_categories: bool,
    pub(crate) fail_designs: bool,
    pub(crate) design_fetches: Mutex<Vec<String>>,
}

impl FakeCatalogue {
    pub(crate) fn standard() -> Self {
        let definitions = vec![
            ReportDefinition {
                uuid: "R1".into(),
                name: "Active on ART".into(),
                parameters: vec![
                    ParameterSpec::new("startDate", ParameterType::date(), true),
                    ParameterSpec::new("facility", ParameterType::string(), false),
                ],
            },
            ReportDefinition {
                uuid: "R2".into(),
                name: "Missing biometrics".into(),
                parameters: vec![ParameterSpec::new(
                    "location",
                    ParameterType::location(),
                    true,
                )],
            },
            ReportDefinition {
                uuid: "R3".into(),
                name: "Voided encounters".into(),
                parameters: vec![ParameterSpec::new(
                    "includeVoided",
                    ParameterType::new("java.lang.Boolean"),
                    false,
                )],
            },
        ];

        let mut designs = HashMap::new();
        designs.insert(
            "R1".to_string(),
            vec![
                RenderDesign {
                    uuid: "design-csv".into(),
                    name: "CSV".into(),
                },
                RenderDesign {
                    uuid: "design-pdf".into(),
                    name: "PDF".into(),
                },
            ],
        );
        designs.insert(
            "R2".to_string(),
            vec![RenderDesign {
                uuid: "design-xls".into(),
                name: "Excel".into(),
            }],
        );

        let categories = CategorySet::new()
            .with(CategoryKey::monitoring(), vec![CategoryReport::new("R1")])
            .with(CategoryKey::data_quality(), vec![CategoryReport::new("R2")])
            .with(CategoryKey::other(), vec![CategoryReport::new("R3")]);

        Self {
            definitions,
            designs,
            categories: Some(categories),
            fail_categories: false,
            fail_designs: false,
            design_fetches: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn design_fetches(&self) -> Vec<String> {
        self.design_fetches.lock().expect("catalogue lock").clone()
    }
}

#[async_trait]
impl ReportCatalogue for FakeCatalogue {
    async fn fetch_report_definitions(&self) -> ReportResult<Vec<ReportDefinition>> {
        Ok(self.definitions.clone())
    }

    async fn fetch_report_designs(&self, report_uuid: &str) -> ReportResult<Vec<RenderDesign>> {
        self.design_fetches
            .lock()
            .expect("catalogue lock")
            .push(report_uuid.to_string());
        if self.fail_designs {
            return Err(ReportError::Rejected {
                status: 503,
                message: None,
            });
        }
        Ok(self.designs.get(report_uuid).cloned().unwrap_or_default())
    }

    async fn fetch_locations(&self) -> ReportResult<Vec<Location>> {
        Ok(vec![Location {
            uuid: "L1".into(),
            display: "Ward A".into(),
        }])
    }
}

#[async_trait]
impl CategoryProvider for FakeCatalogue {
    async fn fetch_categories(&self) -> ReportResult<Option<CategorySet>> {
        if self.fail_categories {
            return Err(ReportError::Rejected {
                status: 500,
                message: Some("categories unavailable".into()),
            });
        }
        Ok(self.categories.clone())
    }

    async fn fetch_reports_by_category(
        &self,
        key: &CategoryKey,
    ) -> ReportResult<ReportsByCategory> {
        let reports = self
            .categories
            .as_ref()
            .and_then(|c| c.get(key))
            .map(<[_]>::to_vec)
            .unwrap_or_default();
        Ok(ReportsByCategory {
            count: reports.len() as u32,
            reports,
            category: Some(key.clone()),
        })
    }

    async fn fetch_metadata(&self) -> ReportResult<Option<NmrsMetadata>> {
        Ok(None)
    }
}
