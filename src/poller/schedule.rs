use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tokio::sync::{mpsc, watch};
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{info, warn};

use crate::config::Cadences;
use crate::error::AppError;
use crate::fetcher::StatusSource;
use crate::poller::checks::StatusPoller;
use crate::render::DisplaySurface;
use crate::types::{CheckFailure, CheckKind, DisplayTarget};

// ---------------------------------------------------------------------------
// Failure reporting
// ---------------------------------------------------------------------------

/// Logs every check failure and forwards it to the optional sink.
#[derive(Clone)]
pub struct FailureReporter {
    sink: Option<mpsc::Sender<CheckFailure>>,
}

impl FailureReporter {
    pub fn new(sink: Option<mpsc::Sender<CheckFailure>>) -> Self {
        Self { sink }
    }

    pub fn report(&self, check: CheckKind, target: Option<&DisplayTarget>, error: &AppError) {
        let target = target.map(|t| t.to_string());
        warn!(
            check = %check,
            display_target = target.as_deref().unwrap_or("-"),
            "check failed, keeping last rendered value: {error}",
        );

        let Some(sink) = &self.sink else { return };
        let failure = CheckFailure { check, target, error: error.to_string(), at_ns: now_ns() };
        if let Err(e) = sink.try_send(failure) {
            warn!("Failure channel full or closed: {e}");
        }
    }
}

// ---------------------------------------------------------------------------
// Handles
// ---------------------------------------------------------------------------

/// Controls one check's continuous cadence.
pub struct CadenceHandle {
    check: CheckKind,
    period: Duration,
    task: JoinHandle<()>,
}

impl CadenceHandle {
    pub fn check(&self) -> CheckKind {
        self.check
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Stops the timer and aborts any of this check's invocations still in flight.
    pub fn stop(&self) {
        self.task.abort();
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }
}

/// Returned by [`StatusPoller::start`]. Dropping it does not stop polling;
/// call [`MonitorHandle::shutdown`] or stop cadences individually.
pub struct MonitorHandle {
    startup: JoinHandle<()>,
    cadences: Vec<CadenceHandle>,
}

impl MonitorHandle {
    pub fn cadence(&self, check: CheckKind) -> Option<&CadenceHandle> {
        self.cadences.iter().find(|c| c.check == check)
    }

    pub fn cadences(&self) -> &[CadenceHandle] {
        &self.cadences
    }

    /// Returns false if the check has no cadence.
    pub fn stop(&self, check: CheckKind) -> bool {
        match self.cadence(check) {
            Some(cadence) => {
                cadence.stop();
                info!(check = %check, "cadence stopped");
                true
            }
            None => false,
        }
    }

    pub fn is_running(&self, check: CheckKind) -> bool {
        self.cadence(check).is_some_and(CadenceHandle::is_running)
    }

    pub fn startup_finished(&self) -> bool {
        self.startup.is_finished()
    }

    pub fn shutdown(&self) {
        self.startup.abort();
        for cadence in &self.cadences {
            cadence.stop();
        }
        info!("status poller shut down");
    }
}

// ---------------------------------------------------------------------------
// Scheduling
// ---------------------------------------------------------------------------

impl<S: StatusSource, D: DisplaySurface> StatusPoller<S, D> {
    /// Runs the staggered startup sequence, then each check on its own period.
    ///
    /// Every tick spawns the check as a separate task, so a slow fetch never
    /// delays the next invocation of the same check.
    pub fn start(
        self: Arc<Self>,
        cadences: Cadences,
        failures: Option<mpsc::Sender<CheckFailure>>,
    ) -> MonitorHandle {
        let reporter = FailureReporter::new(failures);
        let (ready_tx, ready_rx) = watch::channel(false);

        let startup = {
            let poller = Arc::clone(&self);
            let reporter = reporter.clone();
            tokio::spawn(async move {
                poller.run_startup(cadences.startup_stagger, &reporter).await;
                let _ = ready_tx.send(true);
            })
        };

        let cadences = CheckKind::ALL
            .into_iter()
            .map(|check| {
                let period = cadences.period(check);
                let task = tokio::spawn(run_cadence(
                    Arc::clone(&self),
                    check,
                    period,
                    ready_rx.clone(),
                    reporter.clone(),
                ));
                CadenceHandle { check, period, task }
            })
            .collect();

        MonitorHandle { startup, cadences }
    }

    /// App health, pause, user count, pause, interfaces. A failed step is
    /// reported and the sequence carries on.
    pub async fn run_startup(&self, stagger: Duration, reporter: &FailureReporter) {
        info!(app_id = self.app_id(), "starting status poller");

        self.run_check(CheckKind::AppHealth, reporter).await;
        tokio::time::sleep(stagger).await;
        self.run_check(CheckKind::UserCount, reporter).await;
        tokio::time::sleep(stagger).await;
        self.run_check(CheckKind::Interfaces, reporter).await;

        info!(app_id = self.app_id(), "startup sequence complete, continuous polling begins");
    }

    /// Runs one check and reports its failures instead of returning them.
    pub async fn run_check(&self, check: CheckKind, reporter: &FailureReporter) {
        match check {
            CheckKind::AppHealth => {
                if let Err(e) = self.check_app().await {
                    reporter.report(check, Some(&DisplayTarget::AppStatus), &e);
                }
            }
            CheckKind::UserCount => {
                if let Err(e) = self.check_users().await {
                    reporter.report(check, Some(&DisplayTarget::UserCount), &e);
                }
            }
            CheckKind::Interfaces => {
                let sweep = self.check_interfaces().await;
                for (target, e) in &sweep.failures {
                    reporter.report(check, Some(target), e);
                }
            }
        }
    }
}

async fn run_cadence<S: StatusSource, D: DisplaySurface>(
    poller: Arc<StatusPoller<S, D>>,
    check: CheckKind,
    period: Duration,
    mut ready: watch::Receiver<bool>,
    reporter: FailureReporter,
) {
    // Sender dropped without signalling: startup was aborted.
    if ready.wait_for(|done| *done).await.is_err() {
        return;
    }

    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    // Dropped with this task on abort, which aborts every in-flight invocation.
    let mut in_flight = JoinSet::new();

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let poller = Arc::clone(&poller);
                let reporter = reporter.clone();
                in_flight.spawn(async move { poller.run_check(check, &reporter).await });
            }
            Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => {
                if let Err(e) = joined {
                    if e.is_panic() {
                        warn!(check = %check, "check task panicked: {e}");
                    }
                }
            }
        }
    }
}

fn now_ns() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos() as u64
}
