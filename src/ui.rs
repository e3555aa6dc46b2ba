// 🖥️ Terminal dashboard for a finished cleaning run
use crate::export::LoanRow;
use crate::report::{DatasetSummary, ReportMetrics, ERROR_MARKER, WARNING_MARKER};
use anyhow::Result;
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

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Summary,
    OverdueLoans,
    CleaningLog,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFilter {
    All,
    Warnings,
    Errors,
}

impl Page {
    pub fn next(&self) -> Self {
        match self {
            Page::Summary => Page::OverdueLoans,
            Page::OverdueLoans => Page::CleaningLog,
            Page::CleaningLog => Page::Summary,
        }
    }

    pub fn previous(&self) -> Self {
        match self {
            Page::Summary => Page::CleaningLog,
            Page::OverdueLoans => Page::Summary,
            Page::CleaningLog => Page::OverdueLoans,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Page::Summary => "Summary",
            Page::OverdueLoans => "Overdue Loans",
            Page::CleaningLog => "Cleaning Log",
        }
    }
}

impl LogFilter {
    pub fn marker(&self) -> Option<&'static str> {
        match self {
            LogFilter::All => None,
            LogFilter::Warnings => Some(WARNING_MARKER),
            LogFilter::Errors => Some(ERROR_MARKER),
        }
    }
}

pub struct App {
    pub metrics: ReportMetrics,
    pub dataset: DatasetSummary,
    pub log_lines: Vec<String>,
    pub visible_log: Vec<String>,
    pub log_filter: LogFilter,
    pub current_page: Page,
    pub overdue_state: TableState,
    pub log_state: TableState,
}

impl App {
    pub fn new(metrics: ReportMetrics, dataset: DatasetSummary, log_lines: Vec<String>) -> Self {
        let mut overdue_state = TableState::default();
        if !dataset.overdue.is_empty() {
            overdue_state.select(Some(0));
        }

        let mut app = Self {
            metrics,
            dataset,
            visible_log: Vec::new(),
            log_lines,
            log_filter: LogFilter::All,
            current_page: Page::Summary,
            overdue_state,
            log_state: TableState::default(),
        };
        app.apply_filter(LogFilter::All);
        app
    }

    pub fn apply_filter(&mut self, filter: LogFilter) {
        self.log_filter = filter;
        self.visible_log = match filter.marker() {
            None => self.log_lines.clone(),
            Some(marker) => self
                .log_lines
                .iter()
                .filter(|line| line.contains(marker))
                .cloned()
                .collect(),
        };
        self.log_state
            .select(if self.visible_log.is_empty() { None } else { Some(0) });
    }

    pub fn next_page(&mut self) {
        self.current_page = self.current_page.next();
    }

    pub fn previous_page(&mut self) {
        self.current_page = self.current_page.previous();
    }

    fn active_list(&mut self) -> (usize, &mut TableState) {
        match self.current_page {
            Page::CleaningLog => (self.visible_log.len(), &mut self.log_state),
            _ => (self.dataset.overdue.len(), &mut self.overdue_state),
        }
    }

    pub fn next(&mut self) {
        self.step(|i, len| if i >= len - 1 { 0 } else { i + 1 });
    }

    pub fn previous(&mut self) {
        self.step(|i, len| if i == 0 { len - 1 } else { i - 1 });
    }

    pub fn page_down(&mut self) {
        self.step(|i, len| (i + 20).min(len - 1));
    }

    pub fn page_up(&mut self) {
        self.step(|i, _| i.saturating_sub(20));
    }

    fn step(&mut self, f: impl Fn(usize, usize) -> usize) {
        let (len, state) = self.active_list();
        if len == 0 {
            return;
        }
        let i = match state.selected() {
            Some(i) => f(i, len),
            None => 0,
        };
        state.select(Some(i));
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

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            match key.code {
                KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                KeyCode::Tab => {
                    if key.modifiers.contains(KeyModifiers::SHIFT) {
                        app.previous_page();
                    } else {
                        app.next_page();
                    }
                }
                KeyCode::BackTab => app.previous_page(),
                KeyCode::Char('a') if app.current_page == Page::CleaningLog => {
                    app.apply_filter(LogFilter::All)
                }
                KeyCode::Char('w') if app.current_page == Page::CleaningLog => {
                    app.apply_filter(LogFilter::Warnings)
                }
                KeyCode::Char('e') if app.current_page == Page::CleaningLog => {
                    app.apply_filter(LogFilter::Errors)
                }
                KeyCode::Down | KeyCode::Char('j') => app.next(),
                KeyCode::Up | KeyCode::Char('k') => app.previous(),
                KeyCode::PageDown => app.page_down(),
                KeyCode::PageUp => app.page_up(),
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

    match app.current_page {
        Page::Summary => render_summary(f, chunks[1], app),
        Page::OverdueLoans => render_overdue(f, chunks[1], app),
        Page::CleaningLog => render_log(f, chunks[1], app),
    }

    render_status_bar(f, chunks[2], app);
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let pages = [Page::Summary, Page::OverdueLoans, Page::CleaningLog];

    let mut tab_spans = vec![];
    for (i, page) in pages.iter().enumerate() {
        if i > 0 {
            tab_spans.push(Span::raw(" │ "));
        }

        let style = if *page == app.current_page {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            Style::default().fg(Color::DarkGray)
        };

        tab_spans.push(Span::styled(page.title().to_string(), style));
    }

    tab_spans.push(Span::raw("  |  "));
    tab_spans.push(Span::styled(
        format!("Books: {}", app.metrics.final_books),
        Style::default().fg(Color::White),
    ));
    tab_spans.push(Span::raw("  "));
    tab_spans.push(Span::styled(
        format!("Customers: {}", app.metrics.final_customers),
        Style::default().fg(Color::White),
    ));
    tab_spans.push(Span::raw("  "));
    tab_spans.push(Span::styled(
        format!("⏰ {}", app.metrics.overdue_loans),
        Style::default().fg(Color::Red),
    ));

    let header = Paragraph::new(vec![Line::from(tab_spans)])
        .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::Cyan)));

    f.render_widget(header, area);
}

fn metric_line(label: &str, value: String, color: Color) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("  {:<26}", label), Style::default().fg(Color::Gray)),
        Span::styled(value, Style::default().fg(color).add_modifier(Modifier::BOLD)),
    ])
}

fn render_summary(f: &mut Frame, area: Rect, app: &App) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    let m = &app.metrics;
    let cleaning = vec![
        Line::from(""),
        metric_line("Final Books", m.final_books.to_string(), Color::Green),
        metric_line("Final Customers", m.final_customers.to_string(), Color::Green),
        metric_line("Rows Removed", m.rows_removed().to_string(), Color::Yellow),
        metric_line("Missing Customers Added", m.missing_customers_added.to_string(), Color::Yellow),
        metric_line("Invalid Dates Fixed", m.invalid_dates_fixed.to_string(), Color::Cyan),
        metric_line("Overdue Loans Detected", m.overdue_loans.to_string(), Color::Red),
    ];
    f.render_widget(
        Paragraph::new(cleaning).block(Block::default().borders(Borders::ALL).title(" Cleaning Results ")),
        columns[0],
    );

    let d = &app.dataset;
    let avg = d
        .avg_days_borrowed
        .map(|v| format!("{:.1}", v))
        .unwrap_or_else(|| "n/a".to_string());
    let quality = vec![
        Line::from(""),
        metric_line("Loans", d.loans.to_string(), Color::White),
        metric_line("Members", d.members.to_string(), Color::White),
        metric_line("Avg Days Borrowed", avg, Color::Cyan),
        metric_line("Max Days Overdue", d.max_days_overdue.to_string(), Color::Red),
        metric_line("Unknown Customers", d.unknown_customers.to_string(), Color::Yellow),
        metric_line("Missing Return Dates", d.missing_return_dates.to_string(), Color::Yellow),
    ];
    f.render_widget(
        Paragraph::new(quality).block(Block::default().borders(Borders::ALL).title(" Cleaned Data ")),
        columns[1],
    );
}

fn render_overdue(f: &mut Frame, area: Rect, app: &mut App) {
    if app.dataset.overdue.is_empty() {
        let empty = Paragraph::new("✅ No overdue loans found!")
            .block(Block::default().borders(Borders::ALL).title(" Overdue Loans "));
        f.render_widget(empty, area);
        return;
    }

    let header_cells = ["Id", "Books", "Customer ID", "days_borrowed", "days_overdue"]
        .iter()
        .map(|h| Cell::from(*h).style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)));
    let header = Row::new(header_cells)
        .style(Style::default().bg(Color::DarkGray))
        .height(1);

    let rows = app.dataset.overdue.iter().map(overdue_row);

    let table = Table::new(
        rows,
        [
            Constraint::Length(8),
            Constraint::Min(30),
            Constraint::Length(13),
            Constraint::Length(15),
            Constraint::Length(14),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(" Overdue Loans "),
    )
    .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.overdue_state);
}

fn overdue_row(loan: &LoanRow) -> Row<'static> {
    Row::new(vec![
        Cell::from(loan.id.to_string()),
        Cell::from(truncate(&loan.item_title, 40)),
        Cell::from(loan.member_id.to_string()),
        Cell::from(loan.days_borrowed.map(|d| d.to_string()).unwrap_or_default()),
        Cell::from(loan.days_overdue.to_string()).style(Style::default().fg(Color::Red)),
    ])
    .height(1)
}

fn render_log(f: &mut Frame, area: Rect, app: &mut App) {
    let rows = app.visible_log.iter().map(|line| {
        let color = if line.contains(ERROR_MARKER) {
            Color::Red
        } else if line.contains(WARNING_MARKER) {
            Color::Yellow
        } else {
            Color::White
        };
        Row::new(vec![Cell::from(line.clone()).style(Style::default().fg(color))])
    });

    let title = match app.log_filter {
        LogFilter::All => " Cleaning Log ".to_string(),
        LogFilter::Warnings => " Cleaning Log (warnings) ".to_string(),
        LogFilter::Errors => " Cleaning Log (errors) ".to_string(),
    };

    let table = Table::new(rows, [Constraint::Percentage(100)])
        .block(Block::default().borders(Borders::ALL).title(title))
        .highlight_style(Style::default().bg(Color::DarkGray))
        .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.log_state);
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let (selected, total) = match app.current_page {
        Page::Summary => (0, 0),
        Page::OverdueLoans => (
            app.overdue_state.selected().map(|i| i + 1).unwrap_or(0),
            app.dataset.overdue.len(),
        ),
        Page::CleaningLog => (
            app.log_state.selected().map(|i| i + 1).unwrap_or(0),
            app.visible_log.len(),
        ),
    };

    let mut status_spans = vec![Span::styled(
        format!(" Row: {}/{} ", selected, total),
        Style::default().fg(Color::Cyan),
    )];

    if app.current_page == Page::CleaningLog {
        status_spans.push(Span::raw(" | "));
        status_spans.push(Span::styled("a/w/e", Style::default().fg(Color::Yellow)));
        status_spans.push(Span::raw(" All/Warnings/Errors"));
    }

    status_spans.push(Span::raw(" | "));
    status_spans.push(Span::styled("Tab", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" Page | "));
    status_spans.push(Span::styled("↑/↓", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" Nav | "));
    status_spans.push(Span::styled("PgUp/PgDn", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" Fast | "));
    status_spans.push(Span::styled("q", Style::default().fg(Color::Red)));
    status_spans.push(Span::raw(" Quit"));

    let status_bar = Paragraph::new(vec![Line::from(status_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );

    f.render_widget(status_bar, area);
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}
