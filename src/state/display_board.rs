use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{SystemTime, UNIX_EPOCH};

use dashmap::DashMap;
use serde::Serialize;
use tracing::debug;

use crate::render::DisplaySurface;
use crate::types::{CheckFailure, CheckKind, Direction, DisplayTarget};

// ---------------------------------------------------------------------------
// Rendered values
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedValue {
    pub text: String,
    /// Nanosecond UTC epoch of the last accepted write.
    pub updated_at_ns: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct InterfaceRowView {
    pub id: String,
    pub outbound: Option<RenderedValue>,
    pub inbound: Option<RenderedValue>,
}

/// Everything currently shown, as served by `GET /status`.
#[derive(Debug, Clone, Serialize)]
pub struct BoardSnapshot {
    pub app_status: Option<RenderedValue>,
    pub user_count: Option<RenderedValue>,
    pub interfaces: Vec<InterfaceRowView>,
    /// Most recent failure per check, oldest first.
    pub failures: Vec<CheckFailure>,
    pub failure_count: u64,
}

// ---------------------------------------------------------------------------
// DisplayBoard
// ---------------------------------------------------------------------------

/// In-process display surface: one label per app-level target plus a set of
/// interface rows, each with an outbound and an inbound cell.
pub struct DisplayBoard {
    /// target → last rendered text
    cells: DashMap<DisplayTarget, RenderedValue>,
    /// interface ids in display order
    rows: RwLock<Vec<String>>,
    /// check → most recent failure
    failures: DashMap<CheckKind, CheckFailure>,
    failure_count: AtomicU64,
}

impl DisplayBoard {
    pub fn new() -> Arc<Self> {
        Self::with_rows(Vec::<String>::new())
    }

    pub fn with_rows<I, S>(ids: I) -> Arc<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let board = Arc::new(Self {
            cells: DashMap::new(),
            rows: RwLock::new(Vec::new()),
            failures: DashMap::new(),
            failure_count: AtomicU64::new(0),
        });
        for id in ids {
            board.add_row(id);
        }
        board
    }

    /// Add an interface row. Returns false if it was already present.
    pub fn add_row(&self, id: impl Into<String>) -> bool {
        let id = id.into();
        let Ok(mut rows) = self.rows.write() else {
            return false;
        };
        if rows.contains(&id) {
            return false;
        }
        rows.push(id);
        true
    }

    /// Remove an interface row and both of its cells. Returns false if absent.
    pub fn remove_row(&self, id: &str) -> bool {
        let removed = match self.rows.write() {
            Ok(mut rows) => {
                let before = rows.len();
                rows.retain(|r| r != id);
                rows.len() != before
            }
            Err(_) => false,
        };
        if removed {
            for direction in Direction::ALL {
                self.cells.remove(&DisplayTarget::interface(id, direction));
            }
        }
        removed
    }

    pub fn has_row(&self, id: &str) -> bool {
        self.rows.read().map(|rows| rows.iter().any(|r| r == id)).unwrap_or(false)
    }

    pub fn get(&self, target: &DisplayTarget) -> Option<RenderedValue> {
        self.cells.get(target).map(|v| v.value().clone())
    }

    pub fn text(&self, target: &DisplayTarget) -> Option<String> {
        self.cells.get(target).map(|v| v.text.clone())
    }

    pub fn record_failure(&self, failure: CheckFailure) {
        self.failure_count.fetch_add(1, Ordering::Relaxed);
        self.failures.insert(failure.check, failure);
    }

    pub fn last_failure(&self, check: CheckKind) -> Option<CheckFailure> {
        self.failures.get(&check).map(|f| f.value().clone())
    }

    pub fn failure_count(&self) -> u64 {
        self.failure_count.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> BoardSnapshot {
        let interfaces = self
            .interface_rows()
            .into_iter()
            .map(|id| InterfaceRowView {
                outbound: self.get(&DisplayTarget::interface(id.as_str(), Direction::Outbound)),
                inbound: self.get(&DisplayTarget::interface(id.as_str(), Direction::Inbound)),
                id,
            })
            .collect();

        let mut failures: Vec<CheckFailure> = self.failures.iter().map(|f| f.value().clone()).collect();
        failures.sort_by_key(|f| f.at_ns);

        BoardSnapshot {
            app_status: self.get(&DisplayTarget::AppStatus),
            user_count: self.get(&DisplayTarget::UserCount),
            interfaces,
            failures,
            failure_count: self.failure_count(),
        }
    }
}

impl DisplaySurface for DisplayBoard {
    fn interface_rows(&self) -> Vec<String> {
        self.rows.read().map(|rows| rows.clone()).unwrap_or_default()
    }

    fn render(&self, target: &DisplayTarget, text: &str) {
        // A row removed while its fetch was in flight has nowhere to render to.
        if let DisplayTarget::Interface { id, .. } = target {
            if !self.has_row(id) {
                debug!(display_target = %target, "dropping write for removed row");
                return;
            }
        }
        self.cells.insert(
            target.clone(),
            RenderedValue { text: text.to_string(), updated_at_ns: now_ns() },
        );
    }
}

fn now_ns() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos() as u64
}
