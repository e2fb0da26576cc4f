use serde::Deserialize;

// ---------------------------------------------------------------------------
// API response types (mirror the monitor's GET /status shape)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct RenderedValue {
    pub text: String,
    pub updated_at_ns: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InterfaceRowView {
    pub id: String,
    pub outbound: Option<RenderedValue>,
    pub inbound: Option<RenderedValue>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CheckFailure {
    pub check: String,
    pub target: Option<String>,
    pub error: String,
    pub at_ns: u64,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct StatusResponse {
    pub app_status: Option<RenderedValue>,
    pub user_count: Option<RenderedValue>,
    pub interfaces: Vec<InterfaceRowView>,
    pub failures: Vec<CheckFailure>,
    pub failure_count: u64,
}

// ---------------------------------------------------------------------------
// App state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionStatus {
    Connected,
    Error(String),
    Connecting,
}

/// How a rendered cell should be coloured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellState {
    Up,
    Down,
    Pending,
    Empty,
}

#[derive(Debug, Clone)]
pub struct AppState {
    pub status: ConnectionStatus,
    pub board: StatusResponse,
    pub base_url: String,
}

impl AppState {
    pub fn new(base_url: String) -> Self {
        Self {
            status: ConnectionStatus::Connecting,
            board: StatusResponse::default(),
            base_url,
        }
    }

    /// On any error the previous board stays on screen.
    pub async fn refresh(&mut self, client: &reqwest::Client) {
        let url = format!("{}/status", self.base_url);
        let resp = match client.get(&url).send().await {
            Ok(r) if r.status().is_success() => r,
            Ok(r) => {
                self.status = ConnectionStatus::Error(format!("HTTP {}", r.status()));
                return;
            }
            Err(e) => {
                self.status = ConnectionStatus::Error(format!("{e}"));
                return;
            }
        };

        match resp.json::<StatusResponse>().await {
            Ok(board) => {
                self.board = board;
                self.status = ConnectionStatus::Connected;
            }
            Err(e) => {
                self.status = ConnectionStatus::Error(format!("parse error: {e}"));
            }
        }
    }

    pub fn latest_failure(&self) -> Option<&CheckFailure> {
        self.board.failures.iter().max_by_key(|f| f.at_ns)
    }
}

// ---------------------------------------------------------------------------
// Formatting helpers
// ---------------------------------------------------------------------------

pub fn cell_text(value: Option<&RenderedValue>) -> String {
    value.map_or("—".to_string(), |v| v.text.clone())
}

pub fn cell_state(value: Option<&RenderedValue>) -> CellState {
    match value.map(|v| v.text.as_str()) {
        None => CellState::Empty,
        Some(t) if t.starts_with('✔') || t == "Up" => CellState::Up,
        Some(t) if t.starts_with('✖') || t == "Down" => CellState::Down,
        Some(_) => CellState::Pending,
    }
}

/// Age of a value as "12s" / "3m" / "2h"; "—" when missing or from the future.
pub fn format_age(updated_at_ns: Option<u64>, now_ns: u64) -> String {
    let Some(at) = updated_at_ns.filter(|at| *at <= now_ns) else {
        return "—".to_string();
    };
    let secs = (now_ns - at) / 1_000_000_000;
    if secs < 60 {
        format!("{secs}s")
    } else if secs < 3600 {
        format!("{}m", secs / 60)
    } else {
        format!("{}h", secs / 3600)
    }
}

/// Convert nanosecond epoch timestamp to HH:MM:SS string.
pub fn format_time_ns(ns: u64) -> String {
    let secs = ns / 1_000_000_000;
    let h = (secs / 3600) % 24;
    let m = (secs / 60) % 60;
    let s = secs % 60;
    format!("{h:02}:{m:02}:{s:02}")
}

pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let head: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{head}…")
    }
}
