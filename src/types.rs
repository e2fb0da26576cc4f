use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Endpoint responses
// ---------------------------------------------------------------------------

/// `GET /api/app/health/{appId}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppHealth {
    pub ok: bool,
}

/// `GET /api/app/users/{appId}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserCount {
    pub users: i64,
}

/// `GET /api/interface/{interfaceId}/{direction}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceStatus {
    pub reachable: bool,
    pub total: i64,
    /// Error count, reported by newer upstream monitors only.
    #[serde(default)]
    pub failed: Option<i64>,
}

// ---------------------------------------------------------------------------
// Interface direction
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Outbound,
    Inbound,
}

impl Direction {
    pub const ALL: [Direction; 2] = [Direction::Outbound, Direction::Inbound];

    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Outbound => "OUTBOUND",
            Direction::Inbound => "INBOUND",
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Checks and display targets
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckKind {
    AppHealth,
    UserCount,
    Interfaces,
}

impl CheckKind {
    pub const ALL: [CheckKind; 3] = [CheckKind::AppHealth, CheckKind::UserCount, CheckKind::Interfaces];
}

impl std::fmt::Display for CheckKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            CheckKind::AppHealth => "app_health",
            CheckKind::UserCount => "user_count",
            CheckKind::Interfaces => "interfaces",
        };
        write!(f, "{s}")
    }
}

/// An addressable location a check result is written into.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DisplayTarget {
    AppStatus,
    UserCount,
    Interface { id: String, direction: Direction },
}

impl DisplayTarget {
    pub fn interface(id: impl Into<String>, direction: Direction) -> Self {
        DisplayTarget::Interface { id: id.into(), direction }
    }
}

impl std::fmt::Display for DisplayTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DisplayTarget::AppStatus => write!(f, "app-status"),
            DisplayTarget::UserCount => write!(f, "user-count"),
            DisplayTarget::Interface { id, direction } => write!(f, "interface/{id}/{direction}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Failure reports sent over the failure channel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckFailure {
    pub check: CheckKind,
    /// Target whose value was left stale, when the failure is tied to one.
    pub target: Option<String>,
    pub error: String,
    /// Nanosecond UTC epoch of when the failure was observed.
    pub at_ns: u64,
}
