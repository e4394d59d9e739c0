//! Fire-and-confirm submission of run-report requests.
//!
//! ```text
//!  Idle ──submit──▶ Submitting ──accepted──▶ Settling ──delay──▶ Succeeded
//!                        │
//!                        └──rejected──▶ Failed
//! ```
//!
//! The server acknowledges a run as soon as it is queued, but its report list only shows the
//! run a little later. `Settling` waits out that gap before the success notification and the
//! completion callback, so a caller that re-queries on completion sees the new report.
//!
//! At most one request is in flight per orchestrator: `submit` is refused while `Submitting`
//! or `Settling`. `Succeeded` and `Failed` are resting phases that accept a new submit.
//!
//! [`SubmissionOrchestrator::teardown`] (also run on drop) cancels an in-flight request or
//! settle wait. Once torn down, no notification, callback or phase change happens. Outcomes are
//! emitted under a lock that teardown also takes, so an outcome already being emitted on another
//! thread finishes before teardown returns. The completion callback runs under that lock and
//! must not tear down its own orchestrator.

use crate::config::NotificationTitles;
use crate::providers::{Notification, NotificationSink, RunReportTransport, SettleClock};
use crate::{ReportError, ReportResult};
use openmrs::RunReportRequest;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Invoked once after a run has settled.
pub type CompletionCallback = Box<dyn FnOnce() + Send + 'static>;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum SubmissionPhase {
    #[default]
    Idle,
    Submitting,
    Settling,
    Succeeded,
    Failed {
        message: Option<String>,
    },
}

impl SubmissionPhase {
    /// `Submitting` or `Settling`.
    pub fn is_in_flight(&self) -> bool {
        matches!(self, SubmissionPhase::Submitting | SubmissionPhase::Settling)
    }
}

pub struct SubmissionOrchestrator {
    transport: Arc<dyn RunReportTransport>,
    notifier: Arc<dyn NotificationSink>,
    clock: Arc<dyn SettleClock>,
    settle_delay: Duration,
    titles: NotificationTitles,
    phase: Arc<watch::Sender<SubmissionPhase>>,
    torn_down: Arc<AtomicBool>,
    emit_lock: Arc<Mutex<()>>,
    in_flight: Mutex<Option<JoinHandle<()>>>,
}

impl SubmissionOrchestrator {
    pub fn new(
        transport: Arc<dyn RunReportTransport>,
        notifier: Arc<dyn NotificationSink>,
        clock: Arc<dyn SettleClock>,
        settle_delay: Duration,
        titles: NotificationTitles,
    ) -> Self {
        let (phase, _) = watch::channel(SubmissionPhase::Idle);

        Self {
            transport,
            notifier,
            clock,
            settle_delay,
            titles,
            phase: Arc::new(phase),
            torn_down: Arc::new(AtomicBool::new(false)),
            emit_lock: Arc::new(Mutex::new(())),
            in_flight: Mutex::new(None),
        }
    }

    pub fn phase(&self) -> SubmissionPhase {
        self.phase.borrow().clone()
    }

    pub fn is_submitting(&self) -> bool {
        self.phase.borrow().is_in_flight()
    }

    /// Watch phase transitions.
    pub fn subscribe(&self) -> watch::Receiver<SubmissionPhase> {
        self.phase.subscribe()
    }

    pub fn settle_delay(&self) -> Duration {
        self.settle_delay
    }

    /// Start a run. Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::SubmissionInFlight`] while a previous request is still
    /// submitting or settling, and [`ReportError::TornDown`] after teardown. Neither changes
    /// any state.
    pub fn submit(
        &self,
        request: RunReportRequest,
        on_complete: CompletionCallback,
    ) -> ReportResult<()> {
        if self.torn_down.load(Ordering::Acquire) {
            return Err(ReportError::TornDown);
        }

        let accepted = self.phase.send_if_modified(|phase| {
            if phase.is_in_flight() {
                return false;
            }
            *phase = SubmissionPhase::Submitting;
            true
        });
        if !accepted {
            return Err(ReportError::SubmissionInFlight);
        }

        tracing::info!(report = %request.report_uuid, "submitting run-report request");

        let run = SubmissionRun {
            transport: self.transport.clone(),
            notifier: self.notifier.clone(),
            clock: self.clock.clone(),
            settle_delay: self.settle_delay,
            titles: self.titles.clone(),
            phase: self.phase.clone(),
            torn_down: self.torn_down.clone(),
            emit_lock: self.emit_lock.clone(),
        };
        let handle = tokio::spawn(run.execute(request, on_complete));

        *lock_ignoring_poison(&self.in_flight) = Some(handle);

        Ok(())
    }

    /// Cancel any in-flight request or settle wait and refuse further submits.
    pub fn teardown(&self) {
        if self.torn_down.swap(true, Ordering::AcqRel) {
            return;
        }

        // Wait out an outcome that is mid-emission on another thread.
        drop(lock_ignoring_poison(&self.emit_lock));

        let handle = lock_ignoring_poison(&self.in_flight).take();
        if let Some(handle) = handle {
            if !handle.is_finished() {
                tracing::debug!("tearing down with a submission in flight");
            }
            handle.abort();
        }
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down.load(Ordering::Acquire)
    }
}

impl Drop for SubmissionOrchestrator {
    fn drop(&mut self) {
        self.teardown();
    }
}

fn lock_ignoring_poison<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Everything a spawned run needs, detached from the orchestrator's lifetime.
struct SubmissionRun {
    transport: Arc<dyn RunReportTransport>,
    notifier: Arc<dyn NotificationSink>,
    clock: Arc<dyn SettleClock>,
    settle_delay: Duration,
    titles: NotificationTitles,
    phase: Arc<watch::Sender<SubmissionPhase>>,
    torn_down: Arc<AtomicBool>,
    emit_lock: Arc<Mutex<()>>,
}

impl SubmissionRun {
    /// Run `emit` unless torn down. Returns whether it ran.
    fn emit_unless_torn_down(&self, emit: impl FnOnce()) -> bool {
        let _guard = lock_ignoring_poison(&self.emit_lock);
        if self.torn_down.load(Ordering::Acquire) {
            return false;
        }
        emit();
        true
    }

    async fn execute(self, request: RunReportRequest, on_complete: CompletionCallback) {
        let report = request.report_uuid.as_str();

        match self.transport.submit_run_report(&request).await {
            Ok(()) => {
                let settling = self.emit_unless_torn_down(|| {
                    self.phase.send_replace(SubmissionPhase::Settling);
                });
                if !settling {
                    return;
                }
                tracing::debug!(
                    report,
                    delay_ms = self.settle_delay.as_millis() as u64,
                    "run accepted; settling"
                );

                self.clock.sleep(self.settle_delay).await;

                self.emit_unless_torn_down(|| {
                    tracing::info!(report, "report run succeeded");
                    self.notifier
                        .notify(Notification::success(self.titles.success.clone()));
                    on_complete();
                    self.phase.send_replace(SubmissionPhase::Succeeded);
                });
            }
            Err(err) => {
                self.emit_unless_torn_down(|| {
                    tracing::warn!(report, error = %err, "report run rejected");
                    let message = err.user_message();
                    self.notifier.notify(Notification::error(
                        self.titles.error.clone(),
                        message.clone(),
                    ));
                    self.phase.send_replace(SubmissionPhase::Failed { message });
                });
            }
        }
    }
}
