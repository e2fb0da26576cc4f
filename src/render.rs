//! Text rendered into each display target, and the surface it is written to.

use crate::types::{AppHealth, DisplayTarget, InterfaceStatus, UserCount};

pub const APP_UP_TEXT: &str = "Up";
pub const APP_DOWN_TEXT: &str = "Down";
/// Shown on the app label while a health fetch is in flight.
pub const CHECKING_TEXT: &str = "Checking...";

pub const UP_INDICATOR: &str = "✔";
pub const DOWN_INDICATOR: &str = "✖";

/// Where check results end up. The poller only ever enumerates rows and writes
/// text; it never reads rendered values back.
pub trait DisplaySurface: Send + Sync + 'static {
    /// Interface ids of the rows currently present, in display order.
    fn interface_rows(&self) -> Vec<String>;

    fn render(&self, target: &DisplayTarget, text: &str);
}

pub fn app_label(health: &AppHealth) -> String {
    let text = if health.ok { APP_UP_TEXT } else { APP_DOWN_TEXT };
    text.to_string()
}

pub fn user_label(count: &UserCount) -> String {
    format!("Active Users: {}", count.users)
}

/// An unreachable direction always renders the bare down indicator, whatever `total` says.
pub fn interface_cell(status: &InterfaceStatus) -> String {
    if !status.reachable {
        return DOWN_INDICATOR.to_string();
    }
    match status.failed {
        Some(failed) if failed > 0 => format!("{UP_INDICATOR} {} ({failed} failed)", status.total),
        _ => format!("{UP_INDICATOR} {}", status.total),
    }
}
