use anyhow::Result;
use bike_rental_reports::output::format_cell;
use bike_rental_reports::{Report, Snapshot};
use crossterm::{
    event::{self, Event, KeyCode, KeyModifiers},
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
use std::io;

const PAGE_JUMP: usize = 20;

/// One tab per report, plus a trailing data-quality tab.
pub struct App {
    pub reports: Vec<Report>,
    pub findings: Vec<String>,
    pub current_page: usize,
    pub state: TableState,
    pub total_rows: usize,
}

impl App {
    pub fn new(reports: Vec<Report>, snapshot: &Snapshot) -> Self {
        let findings = snapshot
            .validate()
            .iter()
            .map(|issue| issue.to_string())
            .chain(snapshot.referential_gaps().iter().map(|gap| gap.to_string()))
            .collect();
        let total_rows = snapshot.row_counts().iter().map(|(_, n)| n).sum();

        let mut app = Self {
            reports,
            findings,
            current_page: 0,
            state: TableState::default(),
            total_rows,
        };
        app.reset_selection();
        app
    }

    pub fn page_count(&self) -> usize {
        self.reports.len() + 1
    }

    pub fn current_report(&self) -> Option<&Report> {
        self.reports.get(self.current_page)
    }

    fn current_len(&self) -> usize {
        match self.current_report() {
            Some(report) => report.len(),
            None => self.findings.len(),
        }
    }

    fn reset_selection(&mut self) {
        let selected = if self.current_len() == 0 { None } else { Some(0) };
        self.state.select(selected);
    }

    pub fn next_page(&mut self) {
        self.current_page = (self.current_page + 1) % self.page_count();
        self.reset_selection();
    }

    pub fn previous_page(&mut self) {
        self.current_page = (self.current_page + self.page_count() - 1) % self.page_count();
        self.reset_selection();
    }

    pub fn goto_page(&mut self, page: usize) {
        if page < self.page_count() {
            self.current_page = page;
            self.reset_selection();
        }
    }

    pub fn next(&mut self) {
        let len = self.current_len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(i) if i >= len - 1 => 0,
            Some(i) => i + 1,
            None => 0,
        };
        self.state.select(Some(i));
    }

    pub fn previous(&mut self) {
        let len = self.current_len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        self.state.select(Some(i));
    }

    pub fn page_down(&mut self) {
        let len = self.current_len();
        if len == 0 {
            return;
        }
        let i = self.state.selected().map_or(0, |i| (i + PAGE_JUMP).min(len - 1));
        self.state.select(Some(i));
    }

    pub fn page_up(&mut self) {
        let i = self.state.selected().map_or(0, |i| i.saturating_sub(PAGE_JUMP));
        self.state.select(Some(i));
    }
}

pub fn run_ui(app: &mut App) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("Error: {:?}", err);
    }

    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(terminal: &mut Terminal<B>, app: &mut App) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            match key.code {
                KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                KeyCode::Tab => app.next_page(),
                KeyCode::BackTab => app.previous_page(),
                KeyCode::Right if key.modifiers.contains(KeyModifiers::SHIFT) => app.next_page(),
                KeyCode::Left if key.modifiers.contains(KeyModifiers::SHIFT) => app.previous_page(),
                KeyCode::Char(c @ '1'..='9') => app.goto_page(c as usize - '1' as usize),
                KeyCode::Down | KeyCode::Char('j') => app.next(),
                KeyCode::Up | KeyCode::Char('k') => app.previous(),
                KeyCode::PageDown => app.page_down(),
                KeyCode::PageUp => app.page_up(),
                KeyCode::Home => app.reset_selection(),
                KeyCode::End => {
                    let len = app.current_len();
                    if len > 0 {
                        app.state.select(Some(len - 1));
                    }
                }
                _ => {}
            }
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header with navigation
            Constraint::Min(0),    // Content area
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], app);

    if app.current_page < app.reports.len() {
        render_report(f, chunks[1], app);
    } else {
        render_findings(f, chunks[1], app);
    }

    render_status_bar(f, chunks[2], app);
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let mut tab_spans = vec![];
    let labels = (1..=app.page_count()).map(|n| n.to_string());

    for (page, label) in labels.enumerate() {
        if page > 0 {
            tab_spans.push(Span::raw(" │ "));
        }

        let style = if page == app.current_page {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        tab_spans.push(Span::styled(label, style));
    }

    let title = match app.current_report() {
        Some(report) => report.title().to_string(),
        None => "Data quality".to_string(),
    };
    tab_spans.push(Span::raw("  |  "));
    tab_spans.push(Span::styled(title, Style::default().fg(Color::White).add_modifier(Modifier::BOLD)));
    tab_spans.push(Span::raw("  |  "));
    tab_spans.push(Span::styled(
        format!("Rows in snapshot: {}", app.total_rows),
        Style::default().fg(Color::Cyan),
    ));

    let header = Paragraph::new(vec![Line::from(tab_spans)])
        .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::Cyan)));

    f.render_widget(header, area);
}

fn render_report(f: &mut Frame, area: Rect, app: &mut App) {
    let Some(report) = app.reports.get(app.current_page) else {
        return;
    };

    let header_cells = report.columns.iter().map(|c| {
        Cell::from(c.name.clone()).style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
    });
    let header = Row::new(header_cells)
        .style(Style::default().bg(Color::DarkGray))
        .height(1);

    let text: Vec<Vec<String>> = report
        .rows
        .iter()
        .map(|row| {
            row.iter()
                .zip(&report.columns)
                .map(|(value, column)| format_cell(value, column.currency, "NULL"))
                .collect()
        })
        .collect();

    let widths: Vec<Constraint> = report
        .columns
        .iter()
        .enumerate()
        .map(|(i, column)| {
            let widest = text.iter().map(|r| r[i].chars().count()).max().unwrap_or(0);
            Constraint::Length(widest.max(column.name.len()) as u16 + 2)
        })
        .collect();

    // Rollup rows (a NULL key) stand out from detail rows
    let rows = report.rows.iter().zip(&text).map(|(values, cells)| {
        let style = if values.iter().any(|v| v.is_null()) {
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::White)
        };
        Row::new(cells.iter().cloned().map(Cell::from)).style(style).height(1)
    });

    let table = Table::new(rows, widths)
        .header(header)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::White))
                .title(format!(" {} ", report.kind.name())),
        )
        .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
        .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.state);
}

fn render_findings(f: &mut Frame, area: Rect, app: &mut App) {
    let rows: Vec<Row> = if app.findings.is_empty() {
        vec![Row::new(vec![Cell::from("✅ No data-quality issues or referential gaps")])
            .style(Style::default().fg(Color::Green))]
    } else {
        app.findings
            .iter()
            .map(|finding| Row::new(vec![Cell::from(finding.clone())]).style(Style::default().fg(Color::Red)))
            .collect()
    };

    let table = Table::new(rows, [Constraint::Percentage(100)])
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::White))
                .title(format!(" Data quality ({} findings) ", app.findings.len())),
        )
        .highlight_style(Style::default().bg(Color::DarkGray))
        .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.state);
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let selected = app.state.selected().map(|i| i + 1).unwrap_or(0);

    let status_spans = vec![
        Span::styled(
            format!(" Row: {}/{} ", selected, app.current_len()),
            Style::default().fg(Color::Cyan),
        ),
        Span::raw(" | "),
        Span::styled("Tab", Style::default().fg(Color::Yellow)),
        Span::raw(" Page | "),
        Span::styled("1-9", Style::default().fg(Color::Yellow)),
        Span::raw(" Jump | "),
        Span::styled("↑/↓", Style::default().fg(Color::Yellow)),
        Span::raw(" Nav | "),
        Span::styled("PgUp/PgDn", Style::default().fg(Color::Yellow)),
        Span::raw(" Fast | "),
        Span::styled("q", Style::default().fg(Color::Red)),
        Span::raw(" Quit"),
    ];

    let status_bar = Paragraph::new(vec![Line::from(status_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );

    f.render_widget(status_bar, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use bike_rental_reports::seed::sample_snapshot;
    use bike_rental_reports::ReportCatalog;

    fn app() -> App {
        let snapshot = sample_snapshot();
        let reports = ReportCatalog::default().run_all(&snapshot).unwrap();
        App::new(reports, &snapshot)
    }

    #[test]
    fn test_pages_wrap_around() {
        let mut app = app();
        assert_eq!(app.page_count(), 9);

        app.previous_page();
        assert_eq!(app.current_page, 8);
        assert!(app.current_report().is_none());

        app.next_page();
        assert_eq!(app.current_page, 0);
        assert_eq!(app.state.selected(), Some(0));
    }

    #[test]
    fn test_row_navigation_wraps() {
        let mut app = app();
        // bikes-per-category has two rows
        app.next();
        assert_eq!(app.state.selected(), Some(1));
        app.next();
        assert_eq!(app.state.selected(), Some(0));
        app.previous();
        assert_eq!(app.state.selected(), Some(1));
    }

    #[test]
    fn test_clean_seed_has_no_findings() {
        let mut app = app();
        app.goto_page(8);
        assert!(app.findings.is_empty());
        assert_eq!(app.state.selected(), None);
    }
}
