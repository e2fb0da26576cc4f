//! In-memory status source for poller tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use tokio::time::Instant;

use crate::error::{AppError, Result};
use crate::fetcher::StatusSource;
use crate::types::{AppHealth, CheckKind, Direction, InterfaceStatus, UserCount};

/// `None` replies fail with a 500. Health replies may be scripted with a delay
/// per call; once the script runs dry `health` answers immediately.
#[derive(Default)]
pub struct FakeSource {
    pub health: Mutex<Option<AppHealth>>,
    pub health_script: Mutex<VecDeque<(Duration, Option<AppHealth>)>>,
    pub users: Mutex<Option<UserCount>>,
    pub interfaces: Mutex<HashMap<(String, Direction), InterfaceStatus>>,
    pub calls: Mutex<Vec<(CheckKind, String, Instant)>>,
}

impl FakeSource {
    pub fn healthy(users: i64) -> Self {
        let source = Self::default();
        source.set_health(Some(true));
        source.set_users(Some(users));
        source
    }

    pub fn set_health(&self, ok: Option<bool>) {
        *self.health.lock().unwrap() = ok.map(|ok| AppHealth { ok });
    }

    pub fn set_users(&self, users: Option<i64>) {
        *self.users.lock().unwrap() = users.map(|users| UserCount { users });
    }

    pub fn script_health(&self, delay: Duration, ok: bool) {
        self.health_script.lock().unwrap().push_back((delay, Some(AppHealth { ok })));
    }

    pub fn set_interface(&self, id: &str, direction: Direction, reachable: bool, total: i64) {
        self.interfaces.lock().unwrap().insert(
            (id.to_string(), direction),
            InterfaceStatus { reachable, total, failed: None },
        );
    }

    /// Offsets in ms from `start` of each call of one kind.
    pub fn call_offsets(&self, check: CheckKind, start: Instant) -> Vec<u64> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(kind, _, _)| *kind == check)
            .map(|(_, _, at)| at.duration_since(start).as_millis() as u64)
            .collect()
    }

    pub fn call_count(&self, check: CheckKind) -> usize {
        self.calls.lock().unwrap().iter().filter(|(kind, _, _)| *kind == check).count()
    }

    pub fn called_paths(&self, check: CheckKind) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(kind, _, _)| *kind == check)
            .map(|(_, path, _)| path.clone())
            .collect()
    }

    fn current_health(&self) -> Option<AppHealth> {
        *self.health.lock().unwrap()
    }

    fn record(&self, check: CheckKind, path: String) {
        self.calls.lock().unwrap().push((check, path, Instant::now()));
    }
}

fn unavailable(path: &str) -> AppError {
    AppError::Status { url: path.to_string(), status: 500 }
}

impl StatusSource for FakeSource {
    async fn app_health(&self, app_id: u64) -> Result<AppHealth> {
        let path = format!("/api/app/health/{app_id}");
        self.record(CheckKind::AppHealth, path.clone());

        let scripted = self.health_script.lock().unwrap().pop_front();
        let reply = match scripted {
            Some((delay, reply)) => {
                tokio::time::sleep(delay).await;
                reply
            }
            None => self.current_health(),
        };
        reply.ok_or_else(|| unavailable(&path))
    }

    async fn user_count(&self, app_id: u64) -> Result<UserCount> {
        let path = format!("/api/app/users/{app_id}");
        self.record(CheckKind::UserCount, path.clone());
        let reply = *self.users.lock().unwrap();
        reply.ok_or_else(|| unavailable(&path))
    }

    async fn interface_status(&self, interface_id: &str, direction: Direction) -> Result<InterfaceStatus> {
        let path = format!("/api/interface/{interface_id}/{direction}");
        self.record(CheckKind::Interfaces, path.clone());
        let reply = self
            .interfaces
            .lock()
            .unwrap()
            .get(&(interface_id.to_string(), direction))
            .copied();
        reply.ok_or_else(|| unavailable(&path))
    }
}
