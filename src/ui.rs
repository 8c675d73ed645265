use crate::model::DisplayBalance;
use crate::sources::{BalanceSource, PriceSource};
use crate::view_model::ViewModelCache;
use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode},
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
use std::sync::Arc;

pub struct App {
    balance_source: Box<dyn BalanceSource>,
    price_source: Box<dyn PriceSource>,
    cache: ViewModelCache,
    pub rows: Arc<Vec<DisplayBalance>>,
    pub state: TableState,
    /// Row identity is the currency, never the table index: a refresh
    /// that reorders or drops rows must not move the selection onto a
    /// different holding.
    pub selected_currency: Option<String>,
    pub show_detail: bool,
    pub status_message: Option<String>,
}

impl App {
    pub fn new(balance_source: Box<dyn BalanceSource>, price_source: Box<dyn PriceSource>) -> Self {
        let mut app = Self {
            balance_source,
            price_source,
            cache: ViewModelCache::new(),
            rows: Arc::new(Vec::new()),
            state: TableState::default(),
            selected_currency: None,
            show_detail: false,
            status_message: None,
        };
        app.refresh();
        app
    }

    /// Pull the current snapshots through the memoized builder.
    /// Cheap when neither snapshot changed; on change the new row set
    /// replaces the old one and the selection re-attaches by currency.
    pub fn refresh(&mut self) {
        let balances = self.balance_source.get();
        let prices = self.price_source.get();
        let rows = self.cache.rows(&balances, &prices);

        if !Arc::ptr_eq(&rows, &self.rows) {
            self.rows = rows;
            self.sync_selection();
        }
    }

    /// Re-read the backing stores and rebuild.
    pub fn reload_sources(&mut self) {
        let result = self
            .balance_source
            .reload()
            .and_then(|_| self.price_source.reload());

        self.status_message = match result {
            Ok(()) => None,
            Err(err) => Some(format!("reload failed: {}", err)),
        };

        self.refresh();
    }

    /// Point the table state at the row carrying the selected currency,
    /// falling back to the first row when that holding is gone.
    fn sync_selection(&mut self) {
        let position = self
            .selected_currency
            .as_deref()
            .and_then(|currency| self.rows.iter().position(|row| row.currency == currency));

        match position {
            Some(i) => self.state.select(Some(i)),
            None if self.rows.is_empty() => {
                self.state.select(None);
                self.selected_currency = None;
            }
            None => {
                self.state.select(Some(0));
                self.selected_currency = Some(self.rows[0].currency.clone());
            }
        }
    }

    fn select_index(&mut self, i: usize) {
        self.state.select(Some(i));
        self.selected_currency = self.rows.get(i).map(|row| row.currency.clone());
    }

    pub fn toggle_detail(&mut self) {
        self.show_detail = !self.show_detail;
    }

    pub fn selected_row(&self) -> Option<&DisplayBalance> {
        self.state.selected().and_then(|i| self.rows.get(i))
    }

    pub fn next(&mut self) {
        let len = self.rows.len();
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
        self.select_index(i);
    }

    pub fn previous(&mut self) {
        let len = self.rows.len();
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
        self.select_index(i);
    }

    pub fn page_down(&mut self) {
        let len = self.rows.len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(i) => {
                let next = i + 10;
                if next >= len {
                    len - 1
                } else {
                    next
                }
            }
            None => 0,
        };
        self.select_index(i);
    }

    pub fn page_up(&mut self) {
        if self.rows.is_empty() {
            return;
        }
        let i = match self.state.selected() {
            Some(i) => {
                if i < 10 {
                    0
                } else {
                    i - 10
                }
            }
            None => 0,
        };
        self.select_index(i);
    }

    pub fn home(&mut self) {
        if !self.rows.is_empty() {
            self.select_index(0);
        }
    }

    pub fn end(&mut self) {
        if !self.rows.is_empty() {
            self.select_index(self.rows.len() - 1);
        }
    }

    /// Sum of pre-computed USD values across all displayed rows.
    pub fn total_usd(&self) -> f64 {
        self.rows.iter().map(|row| row.usd_value).sum()
    }

    pub fn rebuild_count(&self) -> u64 {
        self.cache.rebuild_count()
    }
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
        // Every cycle consumes the sources once; the memoized builder
        // makes this a no-op unless a snapshot actually changed.
        app.refresh();

        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            match key.code {
                KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                KeyCode::Enter => app.toggle_detail(),
                KeyCode::Char('r') => app.reload_sources(),
                KeyCode::Down | KeyCode::Char('j') => app.next(),
                KeyCode::Up | KeyCode::Char('k') => app.previous(),
                KeyCode::PageDown => app.page_down(),
                KeyCode::PageUp => app.page_up(),
                KeyCode::Home => app.home(),
                KeyCode::End => app.end(),
                _ => {}
            }
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header with totals
            Constraint::Min(0),    // Balance table
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], app);

    if app.show_detail {
        let content_chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Percentage(60), // Balance list
                Constraint::Percentage(40), // Detail panel
            ])
            .split(chunks[1]);

        render_table(f, content_chunks[0], app);
        render_detail_panel(f, content_chunks[1], app);
    } else {
        render_table(f, chunks[1], app);
    }

    render_status_bar(f, chunks[2], app);
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let mut spans = vec![
        Span::styled(
            "Wallet Balances",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("  |  "),
        Span::styled(
            format!("Holdings: {}", app.rows.len()),
            Style::default().fg(Color::White),
        ),
        Span::raw("  |  "),
        Span::styled(
            format!("Total: ${:.2}", app.total_usd()),
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        ),
    ];

    if let Some(top) = app.rows.first() {
        spans.push(Span::raw("  |  "));
        spans.push(Span::styled(
            format!("Top: {}", top.currency),
            Style::default().fg(Color::Cyan),
        ));
    }

    let header = Paragraph::new(vec![Line::from(spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)),
    );

    f.render_widget(header, area);
}

fn priority_color(priority: i32) -> Color {
    match priority {
        100 => Color::Magenta,
        50..=99 => Color::Cyan,
        30..=49 => Color::Blue,
        _ => Color::White,
    }
}

fn render_table(f: &mut Frame, area: Rect, app: &mut App) {
    let header_cells = ["Currency", "Amount", "USD Value", "Priority"].iter().map(|h| {
        Cell::from(*h).style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
    });

    let header = Row::new(header_cells)
        .style(Style::default().bg(Color::DarkGray))
        .height(1);

    // Every cell below is a pre-computed field; nothing is derived here
    let rows = app.rows.iter().map(|row| {
        let color = priority_color(row.priority);

        let cells = vec![
            Cell::from(row.currency.clone()).style(Style::default().fg(color)),
            Cell::from(row.formatted.clone()),
            Cell::from(format!("${:.2}", row.usd_value)).style(Style::default().fg(Color::Green)),
            Cell::from(format!("{}", row.priority)).style(Style::default().fg(Color::DarkGray)),
        ];

        Row::new(cells).height(1)
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(16),
            Constraint::Length(14),
            Constraint::Length(16),
            Constraint::Length(10),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(" Balances "),
    )
    .highlight_style(
        Style::default()
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.state);
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let selected = app.state.selected().map(|i| i + 1).unwrap_or(0);
    let total = app.rows.len();

    let mut status_spans = vec![Span::styled(
        format!(" Row: {}/{} ", selected, total),
        Style::default().fg(Color::Cyan),
    )];

    if let Some(message) = &app.status_message {
        status_spans.push(Span::raw(" | "));
        status_spans.push(Span::styled(
            message.clone(),
            Style::default().fg(Color::Red),
        ));
    }

    status_spans.push(Span::raw(" | "));
    status_spans.push(Span::styled(
        format!("Rebuilds: {}", app.rebuild_count()),
        Style::default().fg(Color::DarkGray),
    ));

    status_spans.push(Span::raw(" | "));
    status_spans.push(Span::styled("Enter", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" Details | "));
    status_spans.push(Span::styled("r", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" Reload | "));
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

fn render_detail_panel(f: &mut Frame, area: Rect, app: &App) {
    let row = match app.selected_row() {
        Some(r) => r,
        None => {
            let no_selection = Paragraph::new("No holding selected").block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Yellow))
                    .title(" Holding Details "),
            );
            f.render_widget(no_selection, area);
            return;
        }
    };

    let content = vec![
        Line::from(""),
        Line::from(vec![
            Span::styled(
                "  Currency: ",
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                &row.currency,
                Style::default().fg(priority_color(row.priority)),
            ),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled(
                "  Amount: ",
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            ),
            Span::raw(format!("{}", row.amount)),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled(
                "  Formatted: ",
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            ),
            Span::raw(&row.formatted),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled(
                "  USD Value: ",
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!("${:.2}", row.usd_value),
                Style::default().fg(Color::Green),
            ),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled(
                "  Priority: ",
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            ),
            Span::raw(format!("{}", row.priority)),
        ]),
        Line::from(""),
        Line::from("  ─────────────────────────────────────"),
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
            .title(" Holding Details "),
    );

    f.render_widget(detail_panel, area);
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{PriceTable, WalletBalance};
    use crate::sources::{StaticBalances, StaticPrices};

    fn balance(currency: &str, amount: f64) -> WalletBalance {
        WalletBalance {
            currency: currency.to_string(),
            amount,
        }
    }

    fn demo_app() -> App {
        let balances = StaticBalances::new(vec![
            balance("Ethereum", 2.0),
            balance("Osmosis", 1.0),
            balance("Arbitrum", 4.0),
        ]);
        let mut prices = PriceTable::new();
        prices.insert("Ethereum".to_string(), 3000.0);
        App::new(Box::new(balances), Box::new(StaticPrices::new(prices)))
    }

    #[test]
    fn test_initial_selection_is_first_row() {
        let app = demo_app();
        assert_eq!(app.state.selected(), Some(0));
        assert_eq!(app.selected_currency.as_deref(), Some("Osmosis"));
    }

    #[test]
    fn test_navigation_wraps_and_tracks_currency() {
        let mut app = demo_app();
        app.next();
        assert_eq!(app.selected_currency.as_deref(), Some("Ethereum"));
        app.next();
        assert_eq!(app.selected_currency.as_deref(), Some("Arbitrum"));
        app.next(); // wrap
        assert_eq!(app.selected_currency.as_deref(), Some("Osmosis"));
        app.previous(); // wrap back
        assert_eq!(app.selected_currency.as_deref(), Some("Arbitrum"));
    }

    #[test]
    fn test_selection_follows_currency_across_reorder() {
        let balances = StaticBalances::new(vec![
            balance("Ethereum", 2.0),
            balance("Arbitrum", 4.0),
        ]);
        let mut app = App::new(
            Box::new(balances),
            Box::new(StaticPrices::new(PriceTable::new())),
        );
        app.next(); // select Arbitrum
        assert_eq!(app.selected_currency.as_deref(), Some("Arbitrum"));

        // A new balance snapshot puts Osmosis on top and keeps Arbitrum last;
        // the selection must stay on Arbitrum, not on table index 1.
        let new_balances = StaticBalances::new(vec![
            balance("Osmosis", 1.0),
            balance("Ethereum", 2.0),
            balance("Arbitrum", 4.0),
        ]);
        app.balance_source = Box::new(new_balances);
        app.refresh();

        assert_eq!(app.selected_currency.as_deref(), Some("Arbitrum"));
        assert_eq!(app.state.selected(), Some(2));
    }

    #[test]
    fn test_selection_falls_back_when_holding_disappears() {
        let mut app = demo_app();
        app.end();
        assert_eq!(app.selected_currency.as_deref(), Some("Arbitrum"));

        app.balance_source = Box::new(StaticBalances::new(vec![balance("Ethereum", 2.0)]));
        app.refresh();

        assert_eq!(app.selected_currency.as_deref(), Some("Ethereum"));
        assert_eq!(app.state.selected(), Some(0));
    }

    #[test]
    fn test_refresh_without_change_keeps_row_set() {
        let mut app = demo_app();
        let before = Arc::clone(&app.rows);
        let rebuilds = app.rebuild_count();

        app.refresh();
        app.refresh();

        assert!(Arc::ptr_eq(&before, &app.rows));
        assert_eq!(app.rebuild_count(), rebuilds);
    }

    #[test]
    fn test_total_usd_sums_precomputed_values() {
        let app = demo_app();
        // Ethereum 2 * 3000; Osmosis and Arbitrum are unpriced
        assert_eq!(app.total_usd(), 6000.0);
    }

    #[test]
    fn test_empty_snapshot_has_no_selection() {
        let app = App::new(
            Box::new(StaticBalances::new(Vec::new())),
            Box::new(StaticPrices::new(PriceTable::new())),
        );
        assert_eq!(app.state.selected(), None);
        assert!(app.selected_currency.is_none());
        assert!(app.selected_row().is_none());
    }
}
