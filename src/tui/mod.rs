//! Ratatui-based terminal UI.
//!
//! Five tabs, one per view. The selected tab shows the question it answers,
//! its chart, and a collapsible explanation.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Paragraph, Tabs, Wrap},
};
use tracing::{info, warn};

use crate::app::pipeline::{Panel, PanelBody, build_panel};
use crate::chart::ChartArtifact;
use crate::domain::{Dataset, ViewId};
use crate::error::AppError;

mod plotters_chart;

use plotters_chart::DashboardChart;

pub const TITLE: &str = "Dashboard Bike Sharing";

const PANELS: usize = ViewId::ALL.len();

/// SVG size used by the `s` key.
const SAVE_SIZE: (u32, u32) = (1000, 600);

/// Start the TUI on an already loaded dataset.
pub fn run(dataset: Dataset) -> Result<(), AppError> {
    let _guard = TerminalGuard::new()?;

    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal =
        Terminal::new(backend).map_err(|e| AppError::terminal(format!("Failed to initialize terminal: {e}")))?;

    let mut app = App::new(dataset)?;
    app.event_loop(&mut terminal)
}

/// Ensures the terminal is restored (raw mode, alternate screen) on exit.
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> Result<Self, AppError> {
        enable_raw_mode().map_err(|e| AppError::terminal(format!("Failed to enable raw mode: {e}")))?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(AppError::terminal(format!("Failed to enter alternate screen: {e}")));
        }
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

/// Which panel is selected and which explanations are open.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Navigator {
    selected: usize,
    expanded: [bool; PANELS],
}

impl Navigator {
    pub fn current(&self) -> ViewId {
        ViewId::from_index(self.selected).unwrap_or(ViewId::Season)
    }

    pub fn next(&mut self) {
        self.selected = (self.selected + 1) % PANELS;
    }

    pub fn prev(&mut self) {
        self.selected = (self.selected + PANELS - 1) % PANELS;
    }

    /// Select by position; out-of-range positions are ignored.
    pub fn select(&mut self, idx: usize) -> bool {
        if idx < PANELS && idx != self.selected {
            self.selected = idx;
            return true;
        }
        false
    }

    /// Open or close the current panel's explanation.
    pub fn toggle(&mut self) {
        self.expanded[self.selected] = !self.expanded[self.selected];
    }

    pub fn is_expanded(&self) -> bool {
        self.expanded[self.selected]
    }
}

struct App {
    dataset: Dataset,
    nav: Navigator,
    panel: Panel,
    status: String,
}

impl App {
    fn new(dataset: Dataset) -> Result<Self, AppError> {
        let nav = Navigator::default();
        let panel = build_panel(&dataset, nav.current())?;
        let stats = dataset.stats();
        let status = match (stats.date_min, stats.date_max) {
            (Some(lo), Some(hi)) => format!("{} rows, {lo} to {hi}", stats.n_rows),
            _ => format!("{} rows", stats.n_rows),
        };
        Ok(Self {
            dataset,
            nav,
            panel,
            status,
        })
    }

    fn event_loop<B: ratatui::backend::Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<(), AppError> {
        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                terminal
                    .draw(|f| self.draw(f))
                    .map_err(|e| AppError::terminal(format!("Terminal draw error: {e}")))?;
                needs_redraw = false;
            }

            if !event::poll(Duration::from_millis(100))
                .map_err(|e| AppError::terminal(format!("Event poll error: {e}")))?
            {
                continue;
            }

            match event::read().map_err(|e| AppError::terminal(format!("Event read error: {e}")))? {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if self.handle_key(key.code)? {
                        break;
                    }
                    needs_redraw = true;
                }
                Event::Resize(_, _) => {
                    needs_redraw = true;
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn handle_key(&mut self, code: KeyCode) -> Result<bool, AppError> {
        let before = self.nav.current();
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return Ok(true),
            KeyCode::Right | KeyCode::Tab => self.nav.next(),
            KeyCode::Left | KeyCode::BackTab => self.nav.prev(),
            KeyCode::Char(c @ '1'..='5') => {
                self.nav.select(c as usize - '1' as usize);
            }
            KeyCode::Char('e') => self.nav.toggle(),
            KeyCode::Char('s') => self.save_current(),
            _ => {}
        }

        if self.nav.current() != before {
            self.activate()?;
        }
        Ok(false)
    }

    /// Rebuild the selected panel from the dataset.
    fn activate(&mut self) -> Result<(), AppError> {
        self.panel = build_panel(&self.dataset, self.nav.current())?;
        self.status = format!("view: {}", self.panel.tab);
        Ok(())
    }

    fn save_current(&mut self) {
        let PanelBody::Chart(chart) = &self.panel.body else {
            self.status = "Nothing to save for this panel.".to_string();
            return;
        };
        let path = PathBuf::from(format!("{}.svg", self.panel.view.as_str()));
        match crate::io::export::write_chart_svg(&path, chart, SAVE_SIZE) {
            Ok(()) => {
                info!(path = %path.display(), "saved chart");
                self.status = format!("Saved {}", path.display());
            }
            Err(err) => {
                warn!("{err}");
                self.status = format!("Save failed: {err}");
            }
        }
    }

    fn draw(&mut self, frame: &mut ratatui::Frame<'_>) {
        let size = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(0), Constraint::Length(3)])
            .split(size);

        self.draw_header(frame, chunks[0]);
        self.draw_body(frame, chunks[1]);
        self.draw_footer(frame, chunks[2]);
    }

    fn draw_header(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let titles: Vec<Line> = ViewId::ALL
            .iter()
            .enumerate()
            .map(|(i, id)| Line::from(format!("{} {}", i + 1, id.def().tab)))
            .collect();
        let tabs = Tabs::new(titles)
            .select(self.nav.current().index())
            .block(
                Block::default()
                    .title(Span::styled(TITLE, Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)))
                    .borders(Borders::ALL),
            )
            .style(Style::default().fg(Color::Gray))
            .highlight_style(Style::default().fg(Color::Black).bg(Color::White));
        frame.render_widget(tabs, area);
    }

    fn draw_body(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let explanation_height = if self.nav.is_expanded() {
            explanation_lines(self.panel.caption, area.width.saturating_sub(2)) + 2
        } else {
            1
        };
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(2),
                Constraint::Min(0),
                Constraint::Length(explanation_height),
            ])
            .split(area);

        let heading = Paragraph::new(Line::from(Span::styled(
            self.panel.heading,
            Style::default().add_modifier(Modifier::BOLD),
        )))
        .wrap(Wrap { trim: true });
        frame.render_widget(heading, chunks[0]);

        match &self.panel.body {
            PanelBody::Chart(chart) => self.draw_chart(frame, chunks[1], chart),
            PanelBody::Empty(message) => {
                let block = Block::default().borders(Borders::ALL);
                let msg = Paragraph::new(message.as_str())
                    .style(Style::default().fg(Color::Yellow))
                    .block(block);
                frame.render_widget(msg, chunks[1]);
            }
        }

        self.draw_explanation(frame, chunks[2]);
    }

    fn draw_chart(&self, frame: &mut ratatui::Frame<'_>, area: Rect, chart: &ChartArtifact) {
        let block = Block::default().title(chart.title.as_str()).borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        frame.render_widget(Clear, inner);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(1)])
            .split(inner);

        frame.render_widget(DashboardChart { chart }, chunks[0]);
        frame.render_widget(Paragraph::new(legend_line(chart)), chunks[1]);
    }

    fn draw_explanation(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let style = Style::default().fg(Color::Cyan);
        if !self.nav.is_expanded() {
            frame.render_widget(Paragraph::new(Span::styled("▸ See explanation (e)", style)), area);
            return;
        }
        let p = Paragraph::new(Text::from(self.panel.caption))
            .wrap(Wrap { trim: true })
            .block(
                Block::default()
                    .title(Span::styled("▾ See explanation", style))
                    .borders(Borders::TOP | Borders::BOTTOM),
            );
        frame.render_widget(p, area);
    }

    fn draw_footer(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let help = "←/→ Tab 1-5 select  e explanation  s save svg  q quit";
        let line = Line::from(vec![
            Span::styled(help, Style::default().fg(Color::Gray)),
            Span::raw(" | "),
            Span::styled(&self.status, Style::default().fg(Color::Yellow)),
        ]);
        let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }
}

/// Colored legend entries; the terminal theme leaves the legend out of the plot.
fn legend_line(chart: &ChartArtifact) -> Line<'static> {
    let mut spans = Vec::new();
    if let Some(title) = &chart.legend_title {
        spans.push(Span::styled(format!("{title}: "), Style::default().fg(Color::Gray)));
    }
    for s in &chart.series {
        let (r, g, b) = s.color;
        spans.push(Span::styled("■ ", Style::default().fg(Color::Rgb(r, g, b))));
        spans.push(Span::raw(format!("{}  ", s.name)));
    }
    Line::from(spans)
}

/// Rough wrapped height of the explanation text.
fn explanation_lines(text: &str, width: u16) -> u16 {
    let width = usize::from(width.max(1));
    let chars = text.chars().count();
    chars.div_ceil(width).max(1) as u16
}
