use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use futures_util::future::join_all;
use tracing::debug;

use crate::api::latency::LatencyStats;
use crate::error::{AppError, Result};
use crate::fetcher::StatusSource;
use crate::poller::sequencer::SequencedDisplay;
use crate::render::{app_label, interface_cell, user_label, DisplaySurface, CHECKING_TEXT};
use crate::types::{AppHealth, CheckKind, Direction, DisplayTarget, InterfaceStatus, UserCount};

/// Outcome of one interface sweep: every row/direction either rendered or failed.
#[derive(Debug, Default)]
pub struct InterfaceSweep {
    pub rendered: Vec<(String, Direction, InterfaceStatus)>,
    pub failures: Vec<(DisplayTarget, AppError)>,
}

impl InterfaceSweep {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Fetches the three status kinds for one application and renders them.
pub struct StatusPoller<S, D> {
    app_id: u64,
    source: Arc<S>,
    display: SequencedDisplay<D>,
    latency: Arc<LatencyStats>,
}

impl<S: StatusSource, D: DisplaySurface> StatusPoller<S, D> {
    pub fn new(app_id: u64, source: Arc<S>, display: Arc<D>, latency: Arc<LatencyStats>) -> Self {
        Self {
            app_id,
            source,
            display: SequencedDisplay::new(display),
            latency,
        }
    }

    pub fn app_id(&self) -> u64 {
        self.app_id
    }

    /// Shows the pending label while the fetch runs. On failure the pending
    /// label stays until a later invocation succeeds.
    pub async fn check_app(&self) -> Result<AppHealth> {
        let seq = self.display.next_seq();
        self.display.render(&DisplayTarget::AppStatus, CHECKING_TEXT, seq);
        let health = self
            .timed(CheckKind::AppHealth, self.source.app_health(self.app_id))
            .await?;
        let applied = self.display.render(&DisplayTarget::AppStatus, &app_label(&health), seq);
        debug!(check = %CheckKind::AppHealth, seq, ok = health.ok, applied, "app health rendered");
        Ok(health)
    }

    pub async fn check_users(&self) -> Result<UserCount> {
        let seq = self.display.next_seq();
        let count = self
            .timed(CheckKind::UserCount, self.source.user_count(self.app_id))
            .await?;
        let applied = self.display.render(&DisplayTarget::UserCount, &user_label(&count), seq);
        debug!(check = %CheckKind::UserCount, seq, users = count.users, applied, "user count rendered");
        Ok(count)
    }

    /// Re-enumerates the rows and fetches both directions of every row at once.
    /// Each cell is rendered as soon as its own response arrives.
    pub async fn check_interfaces(&self) -> InterfaceSweep {
        let seq = self.display.next_seq();
        let rows = self.display.interface_rows();
        self.display.forget_removed_rows(&rows);

        let mut fetches = Vec::with_capacity(rows.len() * Direction::ALL.len());
        for id in &rows {
            for direction in Direction::ALL {
                fetches.push(self.fetch_cell(id.clone(), direction, seq));
            }
        }

        let mut sweep = InterfaceSweep::default();
        for result in join_all(fetches).await {
            match result {
                Ok(cell) => sweep.rendered.push(cell),
                Err(failure) => sweep.failures.push(failure),
            }
        }
        sweep
    }

    async fn fetch_cell(
        &self,
        id: String,
        direction: Direction,
        seq: u64,
    ) -> std::result::Result<(String, Direction, InterfaceStatus), (DisplayTarget, AppError)> {
        let target = DisplayTarget::interface(id.as_str(), direction);
        let status = match self
            .timed(CheckKind::Interfaces, self.source.interface_status(&id, direction))
            .await
        {
            Ok(status) => status,
            Err(e) => return Err((target, e)),
        };

        let applied = self.display.render(&target, &interface_cell(&status), seq);
        debug!(
            check = %CheckKind::Interfaces,
            interface_id = %id,
            direction = %direction,
            seq,
            reachable = status.reachable,
            total = status.total,
            applied,
            "interface cell rendered",
        );
        Ok((id, direction, status))
    }

    async fn timed<T, F>(&self, check: CheckKind, fetch: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        let started = Instant::now();
        let result = fetch.await;
        self.latency.record(check, started.elapsed());
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::poller::fake::FakeSource;
    use crate::state::DisplayBoard;
    use std::time::Duration;

    fn poller(
        source: FakeSource,
        rows: &[&str],
    ) -> (StatusPoller<FakeSource, DisplayBoard>, Arc<FakeSource>, Arc<DisplayBoard>) {
        let source = Arc::new(source);
        let board = DisplayBoard::with_rows(rows.iter().copied());
        let poller = StatusPoller::new(
            42,
            Arc::clone(&source),
            Arc::clone(&board),
            Arc::new(LatencyStats::new()),
        );
        (poller, source, board)
    }

    #[tokio::test]
    async fn app_up_renders_up_text() {
        let (poller, source, board) = poller(FakeSource::healthy(0), &[]);

        let health = poller.check_app().await.expect("health");
        assert!(health.ok);
        assert_eq!(board.text(&DisplayTarget::AppStatus).as_deref(), Some("Up"));
        assert_eq!(source.called_paths(CheckKind::AppHealth), vec!["/api/app/health/42"]);
    }

    #[tokio::test]
    async fn app_down_replaces_previous_text() {
        let (poller, source, board) = poller(FakeSource::healthy(0), &[]);
        poller.check_app().await.expect("up");

        source.set_health(Some(false));
        poller.check_app().await.expect("down");
        assert_eq!(board.text(&DisplayTarget::AppStatus).as_deref(), Some("Down"));
    }

    #[tokio::test]
    async fn user_count_contains_value() {
        let (poller, source, board) = poller(FakeSource::healthy(17), &[]);

        poller.check_users().await.expect("users");
        let text = board.text(&DisplayTarget::UserCount).expect("rendered");
        assert!(text.contains("17"), "got {text}");
        assert_eq!(source.called_paths(CheckKind::UserCount), vec!["/api/app/users/42"]);
    }

    #[tokio::test]
    async fn interface_row_renders_each_direction_independently() {
        let (poller, source, board) = poller(FakeSource::healthy(0), &["5"]);
        source.set_interface("5", Direction::Outbound, true, 3);
        source.set_interface("5", Direction::Inbound, false, 0);

        let sweep = poller.check_interfaces().await;
        assert!(sweep.is_complete());
        assert_eq!(sweep.rendered.len(), 2);

        assert_eq!(
            board.text(&DisplayTarget::interface("5", Direction::Outbound)).as_deref(),
            Some("✔ 3")
        );
        assert_eq!(
            board.text(&DisplayTarget::interface("5", Direction::Inbound)).as_deref(),
            Some("✖")
        );

        let mut paths = source.called_paths(CheckKind::Interfaces);
        paths.sort();
        assert_eq!(paths, vec!["/api/interface/5/INBOUND", "/api/interface/5/OUTBOUND"]);
    }

    #[tokio::test]
    async fn unreachable_with_nonzero_total_is_down() {
        let (poller, source, board) = poller(FakeSource::healthy(0), &["8"]);
        source.set_interface("8", Direction::Outbound, false, 250);
        source.set_interface("8", Direction::Inbound, true, 0);

        poller.check_interfaces().await;
        assert_eq!(
            board.text(&DisplayTarget::interface("8", Direction::Outbound)).as_deref(),
            Some("✖")
        );
        assert_eq!(
            board.text(&DisplayTarget::interface("8", Direction::Inbound)).as_deref(),
            Some("✔ 0")
        );
    }

    #[tokio::test]
    async fn one_failed_direction_does_not_block_the_other() {
        let (poller, source, board) = poller(FakeSource::healthy(0), &["5"]);
        source.set_interface("5", Direction::Outbound, true, 3);

        let sweep = poller.check_interfaces().await;
        assert!(!sweep.is_complete());
        assert_eq!(sweep.failures.len(), 1);
        assert_eq!(sweep.failures[0].0, DisplayTarget::interface("5", Direction::Inbound));
        assert_eq!(
            board.text(&DisplayTarget::interface("5", Direction::Outbound)).as_deref(),
            Some("✔ 3")
        );
        assert!(board.text(&DisplayTarget::interface("5", Direction::Inbound)).is_none());
    }

    #[tokio::test]
    async fn rows_are_re_enumerated_each_sweep() {
        let (poller, source, board) = poller(FakeSource::healthy(0), &["5"]);
        for id in ["5", "6"] {
            source.set_interface(id, Direction::Outbound, true, 1);
            source.set_interface(id, Direction::Inbound, true, 2);
        }

        poller.check_interfaces().await;
        board.add_row("6");
        board.remove_row("5");
        let sweep = poller.check_interfaces().await;

        let ids: Vec<&str> = sweep.rendered.iter().map(|(id, _, _)| id.as_str()).collect();
        assert_eq!(ids, vec!["6", "6"]);
        assert_eq!(
            board.text(&DisplayTarget::interface("6", Direction::Inbound)).as_deref(),
            Some("✔ 2")
        );
        assert!(board.text(&DisplayTarget::interface("5", Direction::Inbound)).is_none());
    }

    #[tokio::test]
    async fn no_rows_means_no_fetches() {
        let (poller, source, _board) = poller(FakeSource::healthy(0), &[]);
        let sweep = poller.check_interfaces().await;
        assert!(sweep.rendered.is_empty() && sweep.is_complete());
        assert_eq!(source.call_count(CheckKind::Interfaces), 0);
    }

    #[tokio::test]
    async fn failure_leaves_previous_value() {
        let (poller, source, board) = poller(FakeSource::healthy(4), &[]);
        poller.check_app().await.expect("up");
        poller.check_users().await.expect("users");

        source.set_health(None);
        source.set_users(None);
        assert!(poller.check_app().await.is_err());
        assert!(poller.check_users().await.is_err());

        assert_eq!(board.text(&DisplayTarget::AppStatus).as_deref(), Some("Checking..."));
        assert_eq!(board.text(&DisplayTarget::UserCount).as_deref(), Some("Active Users: 4"));
    }

    #[tokio::test]
    async fn repeated_checks_are_idempotent() {
        let (poller, source, board) = poller(FakeSource::healthy(9), &["5"]);
        source.set_interface("5", Direction::Outbound, true, 3);
        source.set_interface("5", Direction::Inbound, true, 1);

        poller.check_app().await.expect("app");
        poller.check_users().await.expect("users");
        poller.check_interfaces().await;
        let first = board.snapshot();

        poller.check_app().await.expect("app");
        poller.check_users().await.expect("users");
        poller.check_interfaces().await;
        let second = board.snapshot();

        let texts = |s: &crate::state::BoardSnapshot| {
            let mut out = vec![
                s.app_status.as_ref().map(|v| v.text.clone()),
                s.user_count.as_ref().map(|v| v.text.clone()),
            ];
            for row in &s.interfaces {
                out.push(row.outbound.as_ref().map(|v| v.text.clone()));
                out.push(row.inbound.as_ref().map(|v| v.text.clone()));
            }
            out
        };
        assert_eq!(texts(&first), texts(&second));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_stale_response_does_not_overwrite_newer_one() {
        let (poller, source, board) = poller(FakeSource::default(), &[]);
        source.script_health(Duration::from_secs(5), false);
        source.script_health(Duration::from_secs(1), true);

        let (older, newer) = tokio::join!(poller.check_app(), async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            poller.check_app().await
        });

        assert!(!older.expect("older").ok);
        assert!(newer.expect("newer").ok);
        assert_eq!(board.text(&DisplayTarget::AppStatus).as_deref(), Some("Up"));
    }

    #[tokio::test(start_paused = true)]
    async fn app_label_shows_checking_while_fetch_in_flight() {
        let (poller, source, board) = poller(FakeSource::healthy(0), &[]);
        poller.check_app().await.expect("first");
        assert_eq!(board.text(&DisplayTarget::AppStatus).as_deref(), Some("Up"));

        source.script_health(Duration::from_secs(5), false);
        let (result, in_flight) = tokio::join!(poller.check_app(), async {
            tokio::time::sleep(Duration::from_secs(1)).await;
            board.text(&DisplayTarget::AppStatus)
        });

        assert_eq!(in_flight.as_deref(), Some("Checking..."));
        assert!(!result.expect("second").ok);
        assert_eq!(board.text(&DisplayTarget::AppStatus).as_deref(), Some("Down"));
    }

    #[tokio::test]
    async fn removed_rows_are_forgotten_by_the_sequencer() {
        let (poller, source, board) = poller(FakeSource::healthy(0), &["5", "6"]);
        source.set_interface("5", Direction::Outbound, true, 1);
        source.set_interface("5", Direction::Inbound, true, 1);
        source.set_interface("6", Direction::Outbound, true, 2);
        source.set_interface("6", Direction::Inbound, true, 2);

        poller.check_interfaces().await;
        assert_eq!(poller.display.tracked_targets(), 4);

        board.remove_row("6");
        poller.check_interfaces().await;
        assert_eq!(poller.display.tracked_targets(), 2);
    }

    #[tokio::test]
    async fn fetch_latency_is_recorded() {
        let latency = Arc::new(LatencyStats::new());
        let source = Arc::new(FakeSource::healthy(1));
        let poller = StatusPoller::new(1, source, DisplayBoard::new(), Arc::clone(&latency));

        poller.check_users().await.expect("users");
        poller.check_users().await.expect("users");
        assert_eq!(latency.len(CheckKind::UserCount), 2);
        assert_eq!(latency.len(CheckKind::AppHealth), 0);
    }
}
