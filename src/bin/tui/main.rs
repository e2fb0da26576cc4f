mod state;

use std::io;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame, Terminal,
};
use state::{
    cell_state, cell_text, format_age, format_time_ns, truncate, AppState, CellState, ConnectionStatus,
    RenderedValue,
};

const REFRESH_EVERY: Duration = Duration::from_secs(2);

#[tokio::main]
async fn main() -> io::Result<()> {
    let base_url = std::env::var("API_URL").unwrap_or_else(|_| "http://localhost:3000".to_string());
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(5))
        .build()
        .map_err(io::Error::other)?;

    let mut app = AppState::new(base_url);
    app.refresh(&client).await;

    enable_raw_mode()?;
    execute!(io::stdout(), EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(io::stdout()))?;

    let result = run_loop(&mut terminal, &mut app, &client).await;

    // Restored even when the loop failed.
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    result
}

async fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut AppState,
    client: &reqwest::Client,
) -> io::Result<()> {
    let mut rows = TableState::default();
    let mut last_fetch = std::time::Instant::now();

    loop {
        terminal.draw(|f| render(f, app, &mut rows))?;

        let timeout = REFRESH_EVERY.saturating_sub(last_fetch.elapsed());

        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match key.code {
                        KeyCode::Char('q') | KeyCode::Char('Q') => return Ok(()),
                        KeyCode::Char('r') | KeyCode::Char('R') => {
                            app.refresh(client).await;
                            last_fetch = std::time::Instant::now();
                        }
                        KeyCode::Down | KeyCode::Char('j') => {
                            let last = app.board.interfaces.len().saturating_sub(1);
                            rows.select(Some(rows.selected().map_or(0, |i| (i + 1).min(last))));
                        }
                        KeyCode::Up | KeyCode::Char('k') => {
                            rows.select(Some(rows.selected().map_or(0, |i| i.saturating_sub(1))));
                        }
                        _ => {}
                    }
                }
            }
        }

        if last_fetch.elapsed() >= REFRESH_EVERY {
            app.refresh(client).await;
            last_fetch = std::time::Instant::now();
        }
    }
}

fn render(f: &mut Frame, app: &AppState, rows: &mut TableState) {
    let area = f.area();

    // header | interfaces | last failure | keys
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(3),
            Constraint::Length(1),
        ])
        .split(area);

    render_header(f, app, chunks[0]);
    render_interfaces_table(f, app, rows, chunks[1]);
    render_failures(f, app, chunks[2]);
    render_footer(f, chunks[3]);
}

fn state_color(state: CellState) -> Color {
    match state {
        CellState::Up => Color::Green,
        CellState::Down => Color::Red,
        CellState::Pending => Color::Yellow,
        CellState::Empty => Color::DarkGray,
    }
}

fn render_header(f: &mut Frame, app: &AppState, area: Rect) {
    let (conn_text, conn_color) = match &app.status {
        ConnectionStatus::Connected => ("● connected".to_string(), Color::Green),
        ConnectionStatus::Connecting => ("◌ connecting".to_string(), Color::Yellow),
        ConnectionStatus::Error(e) => (format!("✗ {}", truncate(e, 40)), Color::Red),
    };

    let app_status = app.board.app_status.as_ref();
    let title_spans = vec![
        Span::styled(
            " App Monitor  ",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(conn_text, Style::default().fg(conn_color)),
        Span::raw("  │  app: "),
        Span::styled(
            cell_text(app_status),
            Style::default()
                .fg(state_color(cell_state(app_status)))
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("  │  "),
        Span::styled(
            cell_text(app.board.user_count.as_ref()),
            Style::default().fg(Color::White),
        ),
        Span::raw("  │  "),
        Span::styled(
            format!("{} interfaces", app.board.interfaces.len()),
            Style::default().fg(Color::White),
        ),
    ];

    let paragraph = Paragraph::new(Line::from(title_spans))
        .block(Block::default().borders(Borders::ALL).border_style(
            Style::default().fg(Color::DarkGray),
        ));

    f.render_widget(paragraph, area);
}

fn render_interfaces_table(f: &mut Frame, app: &AppState, state: &mut TableState, area: Rect) {
    let header_cells = ["Interface", "Outbound", "Inbound", "Age"]
        .iter()
        .map(|h| Cell::from(*h).style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)));
    let header = Row::new(header_cells).height(1);

    let now = now_ns();
    let rows: Vec<Row> = app
        .board
        .interfaces
        .iter()
        .map(|r| {
            let newest = [r.outbound.as_ref(), r.inbound.as_ref()]
                .into_iter()
                .flatten()
                .map(|v: &RenderedValue| v.updated_at_ns)
                .max();

            Row::new(vec![
                Cell::from(truncate(&r.id, 24)),
                Cell::from(cell_text(r.outbound.as_ref()))
                    .style(Style::default().fg(state_color(cell_state(r.outbound.as_ref())))),
                Cell::from(cell_text(r.inbound.as_ref()))
                    .style(Style::default().fg(state_color(cell_state(r.inbound.as_ref())))),
                Cell::from(format_age(newest, now)).style(Style::default().fg(Color::DarkGray)),
            ])
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Min(10),
            Constraint::Length(18),
            Constraint::Length(18),
            Constraint::Length(6),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray))
            .title(Span::styled(
                " INTERFACES ",
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            )),
    )
    .row_highlight_style(
        Style::default()
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD),
    );

    f.render_stateful_widget(table, area, state);
}

fn render_failures(f: &mut Frame, app: &AppState, area: Rect) {
    let line = match app.latest_failure() {
        Some(fail) => Line::from(vec![
            Span::styled(format_time_ns(fail.at_ns), Style::default().fg(Color::DarkGray)),
            Span::raw("  "),
            Span::styled(fail.check.clone(), Style::default().fg(Color::Red)),
            Span::raw("  "),
            Span::raw(truncate(&fail.error, 80)),
        ]),
        None => Line::from(Span::styled("no failures", Style::default().fg(Color::DarkGray))),
    };

    let paragraph = Paragraph::new(line).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray))
            .title(format!(" FAILURES ({}) ", app.board.failure_count)),
    );
    f.render_widget(paragraph, area);
}

fn render_footer(f: &mut Frame, area: Rect) {
    let line = Line::from(vec![
        Span::styled(" [q] ", Style::default().fg(Color::Yellow)),
        Span::raw("quit  "),
        Span::styled("[r] ", Style::default().fg(Color::Yellow)),
        Span::raw("refresh  "),
        Span::styled("[↑↓ / j k] ", Style::default().fg(Color::Yellow)),
        Span::raw("scroll interfaces  "),
        Span::styled("auto-refresh: 2s", Style::default().fg(Color::DarkGray)),
    ]);
    let paragraph = Paragraph::new(line).style(Style::default().fg(Color::White));
    f.render_widget(paragraph, area);
}

fn now_ns() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos() as u64
}
