//! Collaborator interfaces consumed by the form.
//!
//! The form reads its catalogue and categories, submits runs, reports outcomes and waits out
//! the settle delay through these traits. [`crate::rest::RestClient`] implements the REST-backed
//! ones; tests substitute in-memory fakes.

use crate::ReportResult;
use async_trait::async_trait;
use openmrs::{
    CategoryKey, CategorySet, Location, NmrsMetadata, RenderDesign, ReportDefinition,
    ReportsByCategory, RunReportRequest,
};
use std::time::Duration;

/// Source of report definitions, render designs and locations.
#[async_trait]
pub trait ReportCatalogue: Send + Sync {
    async fn fetch_report_definitions(&self) -> ReportResult<Vec<ReportDefinition>>;

    async fn fetch_report_designs(&self, report_uuid: &str) -> ReportResult<Vec<RenderDesign>>;

    async fn fetch_locations(&self) -> ReportResult<Vec<Location>>;
}

/// Source of the optional report category extension.
///
/// `Ok(None)` means the extension is not installed.
#[async_trait]
pub trait CategoryProvider: Send + Sync {
    async fn fetch_categories(&self) -> ReportResult<Option<CategorySet>>;

    async fn fetch_reports_by_category(&self, key: &CategoryKey)
        -> ReportResult<ReportsByCategory>;

    async fn fetch_metadata(&self) -> ReportResult<Option<NmrsMetadata>>;
}

/// Single-shot run-report submission. `Ok` means the server queued the run, not that its
/// output is readable yet.
#[async_trait]
pub trait RunReportTransport: Send + Sync {
    async fn submit_run_report(&self, request: &RunReportRequest) -> ReportResult<()>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Error,
}

/// A user-visible toast.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub title: String,
    pub subtitle: Option<String>,
}

impl Notification {
    pub fn success(title: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Success,
            title: title.into(),
            subtitle: None,
        }
    }

    pub fn error(title: impl Into<String>, subtitle: Option<String>) -> Self {
        Self {
            kind: NotificationKind::Error,
            title: title.into(),
            subtitle,
        }
    }
}

/// Fire-and-forget notification sink.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Routes notifications to the `tracing` subscriber.
#[derive(Clone, Debug, Default)]
pub struct TracingNotifier;

impl NotificationSink for TracingNotifier {
    fn notify(&self, notification: Notification) {
        let subtitle = notification.subtitle.as_deref().unwrap_or("");
        match notification.kind {
            NotificationKind::Success => {
                tracing::info!(title = %notification.title, subtitle, "notification")
            }
            NotificationKind::Error => {
                tracing::error!(title = %notification.title, subtitle, "notification")
            }
        }
    }
}

/// Timer used for the settle delay.
#[async_trait]
pub trait SettleClock: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Production clock backed by `tokio::time`.
#[derive(Clone, Debug, Default)]
pub struct TokioClock;

#[async_trait]
impl SettleClock for TokioClock {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
