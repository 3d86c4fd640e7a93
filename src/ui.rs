use crate::db::{self, EmployeeEvent, RosterStats, SeedRecord};
use crate::employee::{format_currency, Employee};
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
use rusqlite::Connection;
use std::io;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Overview,
    Roster,
    Views,
}

impl Page {
    pub fn next(&self) -> Self {
        match self {
            Page::Overview => Page::Roster,
            Page::Roster => Page::Views,
            Page::Views => Page::Overview,
        }
    }

    pub fn previous(&self) -> Self {
        match self {
            Page::Overview => Page::Views,
            Page::Roster => Page::Overview,
            Page::Views => Page::Roster,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Page::Overview => "Overview",
            Page::Roster => "Roster",
            Page::Views => "Views",
        }
    }
}

/// Salary bands the Views page can narrow the roster to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterType {
    None,
    AllEmployees,
    Under500,
    From500To1000,
    Over1000,
}

impl FilterType {
    pub fn matches(&self, employee: &Employee) -> bool {
        match self {
            FilterType::None | FilterType::AllEmployees => true,
            FilterType::Under500 => employee.weekly_salary < 500.0,
            FilterType::From500To1000 => {
                (500.0..=1000.0).contains(&employee.weekly_salary)
            }
            FilterType::Over1000 => employee.weekly_salary > 1000.0,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            FilterType::None => "None",
            FilterType::AllEmployees => "All employees",
            FilterType::Under500 => "Under $500",
            FilterType::From500To1000 => "$500 - $1,000",
            FilterType::Over1000 => "Over $1,000",
        }
    }
}

#[derive(Debug, Clone)]
pub struct FilterState {
    pub active_filter: FilterType,
}

/// Employee counts per salary band, for the Views page.
#[derive(Default)]
pub struct BandCounts {
    pub under_500: usize,
    pub from_500_to_1000: usize,
    pub over_1000: usize,
}

pub struct App {
    pub employees: Vec<Employee>,
    pub filtered_employees: Vec<Employee>,
    pub state: TableState,
    pub stats: RosterStats,
    pub seed: Option<SeedRecord>,
    pub recent: Vec<EmployeeEvent>,
    pub current_page: Page,
    pub show_detail: bool,
    pub filter_state: FilterState,
}

impl App {
    pub fn new(
        employees: Vec<Employee>,
        stats: RosterStats,
        seed: Option<SeedRecord>,
        recent: Vec<EmployeeEvent>,
    ) -> Self {
        let mut state = TableState::default();
        if !employees.is_empty() {
            state.select(Some(0));
        }

        let filtered_employees = employees.clone();

        Self {
            employees,
            filtered_employees,
            state,
            stats,
            seed,
            recent,
            current_page: Page::Roster,
            show_detail: false,
            filter_state: FilterState {
                active_filter: FilterType::None,
            },
        }
    }

    pub fn toggle_detail(&mut self) {
        self.show_detail = !self.show_detail;
    }

    pub fn selected_employee(&self) -> Option<&Employee> {
        self.state
            .selected()
            .and_then(|i| self.filtered_employees.get(i))
    }

    pub fn apply_filter(&mut self, filter: FilterType) {
        self.filter_state.active_filter = filter;

        self.filtered_employees = self
            .employees
            .iter()
            .filter(|employee| filter.matches(employee))
            .cloned()
            .collect();

        // Reset selection to first item
        if !self.filtered_employees.is_empty() {
            self.state.select(Some(0));
        } else {
            self.state.select(None);
        }
    }

    pub fn clear_filter(&mut self) {
        self.apply_filter(FilterType::None);
    }

    pub fn next_page(&mut self) {
        self.current_page = self.current_page.next();
    }

    pub fn previous_page(&mut self) {
        self.current_page = self.current_page.previous();
    }

    pub fn band_counts(&self) -> BandCounts {
        let mut counts = BandCounts::default();

        for employee in &self.employees {
            if FilterType::Under500.matches(employee) {
                counts.under_500 += 1;
            } else if FilterType::From500To1000.matches(employee) {
                counts.from_500_to_1000 += 1;
            } else {
                counts.over_1000 += 1;
            }
        }

        counts
    }

    pub fn next(&mut self) {
        let len = self.filtered_employees.len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(i) => {
                if i >= len - 1 {
                    0
                } else {
                    i + 1
                }
            }
            None => 0,
        };
        self.state.select(Some(i));
    }

    pub fn previous(&mut self) {
        let len = self.filtered_employees.len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(i) => {
                if i == 0 {
                    len - 1
                } else {
                    i - 1
                }
            }
            None => 0,
        };
        self.state.select(Some(i));
    }

    pub fn page_down(&mut self) {
        let len = self.filtered_employees.len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(i) => {
                let next = i + 20;
                if next >= len {
                    len - 1
                } else {
                    next
                }
            }
            None => 0,
        };
        self.state.select(Some(i));
    }

    pub fn page_up(&mut self) {
        let i = match self.state.selected() {
            Some(i) => {
                if i < 20 {
                    0
                } else {
                    i - 20
                }
            }
            None => 0,
        };
        self.state.select(Some(i));
    }
}

/// Load the roster and run the full-screen browser until the user quits.
pub fn browse_roster(conn: &Connection) -> Result<()> {
    let employees = db::all_employees(conn)?;
    let stats = db::roster_stats(conn)?;
    let seed = db::last_seed(conn)?;
    let recent = db::recent_events(conn, 8)?;

    let mut app = App::new(employees, stats, seed, recent);
    run_ui(&mut app)
}

pub fn run_ui(app: &mut App) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run the app
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
                KeyCode::Enter => app.toggle_detail(),
                KeyCode::Tab => {
                    if key.modifiers.contains(KeyModifiers::SHIFT) {
                        app.previous_page();
                    } else {
                        app.next_page();
                    }
                }
                KeyCode::BackTab => app.previous_page(),
                KeyCode::Char('c') => {
                    app.clear_filter();
                    app.current_page = Page::Roster;
                }
                KeyCode::Char('1') if app.current_page == Page::Views => {
                    app.apply_filter(FilterType::AllEmployees);
                    app.current_page = Page::Roster;
                }
                KeyCode::Char('2') if app.current_page == Page::Views => {
                    app.apply_filter(FilterType::Under500);
                    app.current_page = Page::Roster;
                }
                KeyCode::Char('3') if app.current_page == Page::Views => {
                    app.apply_filter(FilterType::From500To1000);
                    app.current_page = Page::Roster;
                }
                KeyCode::Char('4') if app.current_page == Page::Views => {
                    app.apply_filter(FilterType::Over1000);
                    app.current_page = Page::Roster;
                }
                KeyCode::Down | KeyCode::Char('j') => app.next(),
                KeyCode::Up | KeyCode::Char('k') => app.previous(),
                KeyCode::PageDown => app.page_down(),
                KeyCode::PageUp => app.page_up(),
                KeyCode::Home => app.state.select(Some(0)),
                KeyCode::End => {
                    if !app.filtered_employees.is_empty() {
                        app.state.select(Some(app.filtered_employees.len() - 1));
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

    // Content area with optional split for detail panel
    if app.show_detail && app.current_page == Page::Roster {
        let content_chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Percentage(60), // Roster table
                Constraint::Percentage(40), // Detail panel
            ])
            .split(chunks[1]);

        render_roster_table(f, content_chunks[0], app);
        render_detail_panel(f, content_chunks[1], app);
    } else {
        match app.current_page {
            Page::Overview => render_overview(f, chunks[1], app),
            Page::Roster => render_roster_table(f, chunks[1], app),
            Page::Views => render_views(f, chunks[1], app),
        }
    }

    render_status_bar(f, chunks[2], app);
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let pages = [Page::Overview, Page::Roster, Page::Views];

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

        tab_spans.push(Span::styled(page.title(), style));
    }

    tab_spans.push(Span::raw("  |  "));
    tab_spans.push(Span::styled(
        format!("Employees: {}", app.stats.employee_count),
        Style::default().fg(Color::White),
    ));
    tab_spans.push(Span::raw("  |  "));
    tab_spans.push(Span::styled(
        format!("Payroll: {}/wk", format_currency(app.stats.total_weekly)),
        Style::default().fg(Color::Green),
    ));

    let header_text = vec![Line::from(tab_spans)];

    let header = Paragraph::new(header_text).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)),
    );

    f.render_widget(header, area);
}

fn band_color(weekly_salary: f64) -> Color {
    if weekly_salary < 500.0 {
        Color::Red
    } else if weekly_salary <= 1000.0 {
        Color::White
    } else {
        Color::Green
    }
}

fn band_name(weekly_salary: f64) -> &'static str {
    if weekly_salary < 500.0 {
        "Under $500"
    } else if weekly_salary <= 1000.0 {
        "$500 - $1,000"
    } else {
        "Over $1,000"
    }
}

fn render_roster_table(f: &mut Frame, area: Rect, app: &mut App) {
    let header_cells = ["#", "First Name", "Last Name", "Weekly", "Yearly"]
        .iter()
        .map(|h| {
            Cell::from(*h).style(
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            )
        });

    let header = Row::new(header_cells)
        .style(Style::default().bg(Color::DarkGray))
        .height(1);

    let rows = app.filtered_employees.iter().map(|employee| {
        let color = band_color(employee.weekly_salary);

        let cells = vec![
            Cell::from(format!("{}", employee.id.unwrap_or_default())),
            Cell::from(truncate(&employee.first_name, 16)),
            Cell::from(truncate(&employee.last_name, 22)),
            Cell::from(employee.formatted_weekly_salary()).style(Style::default().fg(color)),
            Cell::from(employee.formatted_yearly_salary()),
        ];

        Row::new(cells).height(1)
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(6),
            Constraint::Length(18),
            Constraint::Length(24),
            Constraint::Length(12),
            Constraint::Length(14),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(" Employees "),
    )
    .highlight_style(
        Style::default()
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.state);
}

fn render_overview(f: &mut Frame, area: Rect, app: &App) {
    let stats = &app.stats;

    let mut content = vec![
        Line::from(""),
        Line::from(vec![Span::styled(
            "  Roster Overview",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )]),
        Line::from(""),
        stat_line("Employees:", format!("{}", stats.employee_count)),
        stat_line("Weekly payroll:", format_currency(stats.total_weekly)),
        stat_line(
            "Yearly payroll:",
            format_currency(stats.total_weekly * Employee::WEEKS_PER_YEAR),
        ),
        stat_line("Average weekly:", format_currency(stats.average_weekly)),
        stat_line("Lowest weekly:", format_currency(stats.min_weekly)),
        stat_line("Highest weekly:", format_currency(stats.max_weekly)),
    ];

    if let Some(seed) = &app.seed {
        content.push(stat_line(
            "Seeded from:",
            format!("{} ({} rows)", seed.source_file, seed.row_count),
        ));
    }

    content.extend([
        Line::from(""),
        Line::from("  ─────────────────────────────────────"),
        Line::from(""),
        Line::from(vec![Span::styled(
            "  RECENT ACTIVITY",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
        )]),
        Line::from(""),
    ]);

    if app.recent.is_empty() {
        content.push(Line::from(vec![Span::styled(
            "  No activity recorded yet.",
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
        )]));
    } else {
        for event in &app.recent {
            content.push(Line::from(vec![
                Span::styled(
                    format!("  {}  ", event.timestamp.format("%Y-%m-%d %H:%M")),
                    Style::default().fg(Color::DarkGray),
                ),
                Span::styled(
                    format!("{:<16}", event.event_type),
                    Style::default().fg(Color::White),
                ),
                Span::raw(format!(" employee {}", event.employee_id)),
            ]));
        }
    }

    let paragraph = Paragraph::new(content).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(" Overview "),
    );

    f.render_widget(paragraph, area);
}

fn stat_line(label: &str, value: String) -> Line<'static> {
    Line::from(vec![
        Span::styled(
            format!("  {:<18}", label),
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(value),
    ])
}

fn render_views(f: &mut Frame, area: Rect, app: &App) {
    let counts = app.band_counts();

    let content = vec![
        Line::from(""),
        Line::from(vec![Span::styled(
            "  Quick Views & Filters",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )]),
        Line::from(""),
        Line::from("  ╔══════════════════════════════════╗"),
        view_row(
            app,
            FilterType::AllEmployees,
            '1',
            "All employees",
            app.employees.len(),
            Color::White,
        ),
        Line::from("  ╠══════════════════════════════════╣"),
        view_row(
            app,
            FilterType::Under500,
            '2',
            "Under $500",
            counts.under_500,
            Color::Red,
        ),
        view_row(
            app,
            FilterType::From500To1000,
            '3',
            "$500 - $1,000",
            counts.from_500_to_1000,
            Color::White,
        ),
        view_row(
            app,
            FilterType::Over1000,
            '4',
            "Over $1,000",
            counts.over_1000,
            Color::Green,
        ),
        Line::from("  ╚══════════════════════════════════╝"),
        Line::from(""),
        Line::from(vec![
            Span::styled(
                "  Hint: ",
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::ITALIC),
            ),
            Span::styled(
                "Press ",
                Style::default()
                    .fg(Color::DarkGray)
                    .add_modifier(Modifier::ITALIC),
            ),
            Span::styled(
                "1-4",
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::ITALIC),
            ),
            Span::styled(
                " to filter, ",
                Style::default()
                    .fg(Color::DarkGray)
                    .add_modifier(Modifier::ITALIC),
            ),
            Span::styled(
                "c",
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::ITALIC),
            ),
            Span::styled(
                " to clear",
                Style::default()
                    .fg(Color::DarkGray)
                    .add_modifier(Modifier::ITALIC),
            ),
        ]),
    ];

    let paragraph = Paragraph::new(content).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(" Views - Salary Bands "),
    );

    f.render_widget(paragraph, area);
}

fn view_row(
    app: &App,
    filter: FilterType,
    key: char,
    label: &str,
    count: usize,
    count_color: Color,
) -> Line<'static> {
    let marker = if app.filter_state.active_filter == filter {
        Span::styled(
            "→",
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
        )
    } else {
        Span::raw(" ")
    };

    Line::from(vec![
        Span::raw("  ║ "),
        marker,
        Span::styled(key.to_string(), Style::default().fg(Color::Yellow)),
        Span::raw(format!(". {:<22}", label)),
        Span::styled(format!("{:>5}", count), Style::default().fg(count_color)),
        Span::raw("  ║"),
    ])
}

fn render_detail_panel(f: &mut Frame, area: Rect, app: &App) {
    let employee = match app.selected_employee() {
        Some(e) => e,
        None => {
            let no_selection = Paragraph::new("No employee selected").block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Yellow))
                    .title(" Employee Details "),
            );
            f.render_widget(no_selection, area);
            return;
        }
    };

    let content = vec![
        Line::from(""),
        Line::from(vec![
            Span::styled(
                "  Number: ",
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw(format!("{}", employee.id.unwrap_or_default())),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled(
                "  First Name: ",
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw(employee.first_name.clone()),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled(
                "  Last Name: ",
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw(employee.last_name.clone()),
        ]),
        Line::from(""),
        Line::from("  ─────────────────────────────────────"),
        Line::from(""),
        Line::from(vec![Span::styled(
            "  PAY",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
        )]),
        Line::from(""),
        Line::from(vec![
            Span::styled(
                "  Weekly: ",
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                employee.formatted_weekly_salary(),
                Style::default().fg(band_color(employee.weekly_salary)),
            ),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled(
                "  Yearly: ",
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw(employee.formatted_yearly_salary()),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled(
                "  Band: ",
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw(band_name(employee.weekly_salary)),
        ]),
        Line::from(""),
        Line::from(vec![Span::styled(
            "  Press Enter to close",
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
        )]),
    ];

    let detail_panel = Paragraph::new(content).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow))
            .title(" Employee Details "),
    );

    f.render_widget(detail_panel, area);
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let selected = app.state.selected().map(|i| i + 1).unwrap_or(0);
    let total = app.filtered_employees.len();

    let mut status_spans = vec![Span::styled(
        format!(" Employee: {}/{} ", selected, total),
        Style::default().fg(Color::Cyan),
    )];

    // Show filter status if active
    if app.filter_state.active_filter != FilterType::None
        && app.filter_state.active_filter != FilterType::AllEmployees
    {
        status_spans.push(Span::raw(" | "));
        status_spans.push(Span::styled(
            format!("Filter: {}", app.filter_state.active_filter.label()),
            Style::default().fg(Color::Green),
        ));
        status_spans.push(Span::raw(" ("));
        status_spans.push(Span::styled("c", Style::default().fg(Color::Yellow)));
        status_spans.push(Span::raw(" clear)"));
    }

    status_spans.push(Span::raw(" | "));
    status_spans.push(Span::styled("Enter", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" Details | "));
    status_spans.push(Span::styled("Tab", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" Page | "));
    status_spans.push(Span::styled("↑/↓", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" Nav | "));
    status_spans.push(Span::styled("PgUp/PgDn", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" Fast | "));
    status_spans.push(Span::styled("q", Style::default().fg(Color::Red)));
    status_spans.push(Span::raw(" Quit"));

    let status_text = vec![Line::from(status_spans)];

    let status_bar = Paragraph::new(status_text).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );

    f.render_widget(status_bar, area);
}

/// Shorten to at most `max_len` characters, marking the cut with `...`.
/// Counts chars, not bytes, so accented and non-Latin names never split
/// mid-character.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max_len - 3).collect();
        format!("{}...", cut)
    }
}
