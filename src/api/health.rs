//! Poller liveness for the /health endpoint.

use serde::Serialize;

use crate::poller::MonitorHandle;
use crate::render::DisplaySurface;
use crate::state::DisplayBoard;
use crate::types::CheckKind;

#[derive(Debug, Serialize)]
pub struct CadenceStatus {
    pub check: CheckKind,
    pub period_secs: f64,
    pub running: bool,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub app_id: u64,
    /// True once the staggered startup sequence has finished or was aborted.
    pub startup_finished: bool,
    pub cadences: Vec<CadenceStatus>,
    pub interface_rows: usize,
    pub failure_count: u64,
}

pub fn health_report(app_id: u64, monitor: &MonitorHandle, board: &DisplayBoard) -> HealthResponse {
    HealthResponse {
        app_id,
        startup_finished: monitor.startup_finished(),
        cadences: monitor
            .cadences()
            .iter()
            .map(|c| CadenceStatus {
                check: c.check(),
                period_secs: c.period().as_secs_f64(),
                running: c.is_running(),
            })
            .collect(),
        interface_rows: board.interface_rows().len(),
        failure_count: board.failure_count(),
    }
}
