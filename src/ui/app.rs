use std::cmp::min;
use std::mem;

use anyhow::Result;
use crossterm::event::KeyCode;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::prelude::*;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Tabs, Wrap};
use ratatui::Frame;
use rusqlite::Connection;
use tracing::{info, warn};

use crate::dataset::Dataset;
use crate::db::{clear_saved, remove_saved, store_setting, toggle_saved};
use crate::models::{Medicine, MISSING};
use crate::search::{compare_candidates, lookup, SearchIndex, SearchOptions};

use super::forms::{ConfirmClearSaved, InfoDialog, QueryForm, QueryTarget};
use super::helpers::{centered_rect, medicine_card_lines, price_label, surface_error};
use super::screens::{
    CompareScreen, ComparePane, DetailsScreen, SavedScreen, SearchScreen, SettingsRow,
    SettingsScreen, Side, Tab,
};

/// Footer space reserved for status messages and instructions.
const FOOTER_HEIGHT: u16 = 3;
/// Height of the tab bar at the top of the screen.
const TAB_BAR_HEIGHT: u16 = 3;
/// Height allocation per medicine card in list-style views.
const CARD_HEIGHT: u16 = 6;
/// Rows moved by PageUp / PageDown.
const PAGE_STEP: isize = 5;

const DISCLAIMER: &str = "This app is for informational purposes only and should not replace \
professional medical advice. Always consult a qualified healthcare provider before changing \
medication. Prices are approximate and may vary by location and pharmacy.";

/// Fine-grained modes layered over the current tab.
enum Mode {
    Normal,
    Typing(QueryForm),
    ConfirmClearSaved(ConfirmClearSaved),
    Info(InfoDialog),
}

/// Holds the footer message text plus its severity.
struct StatusMessage {
    text: String,
    kind: StatusKind,
}

/// Severity levels shown in the footer.
enum StatusKind {
    Info,
    Error,
}

impl StatusKind {
    fn style(&self) -> Style {
        match self {
            StatusKind::Info => Style::default().fg(Color::Green),
            StatusKind::Error => Style::default().fg(Color::Red),
        }
    }
}

/// Central application state shared across the TUI.
pub struct App {
    conn: Connection,
    dataset: Dataset,
    lookup_index: SearchIndex,
    compare_index: SearchIndex,
    tab: Tab,
    search: SearchScreen,
    compare: CompareScreen,
    saved: SavedScreen,
    settings: SettingsScreen,
    details: Option<DetailsScreen>,
    mode: Mode,
    status: Option<StatusMessage>,
}

impl App {
    pub fn new(conn: Connection, dataset: Dataset) -> Self {
        let lookup_index = SearchIndex::new(dataset.medicines(), SearchOptions::lookup());
        let compare_index = SearchIndex::new(dataset.medicines(), SearchOptions::compare());
        let settings = SettingsScreen::load(&conn);
        Self {
            conn,
            dataset,
            lookup_index,
            compare_index,
            tab: Tab::Search,
            search: SearchScreen::default(),
            compare: CompareScreen::default(),
            saved: SavedScreen::default(),
            settings,
            details: None,
            mode: Mode::Normal,
            status: None,
        }
    }

    /// Process one key press. Returns `true` when the user asked to quit.
    pub fn handle_key(&mut self, code: KeyCode) -> Result<bool> {
        let mut exit = false;
        let mode = mem::replace(&mut self.mode, Mode::Normal);

        self.mode = match mode {
            Mode::Normal => self.handle_normal_key(code, &mut exit)?,
            Mode::Typing(form) => self.handle_typing(code, form)?,
            Mode::ConfirmClearSaved(confirm) => self.handle_confirm_clear(code, confirm)?,
            Mode::Info(dialog) => match code {
                KeyCode::Esc | KeyCode::Enter | KeyCode::Char(' ') | KeyCode::Char('q') => {
                    Mode::Normal
                }
                _ => Mode::Info(dialog),
            },
        };

        Ok(exit)
    }

    fn handle_normal_key(&mut self, code: KeyCode, exit: &mut bool) -> Result<Mode> {
        if self.details_visible() {
            return self.handle_details_key(code, exit);
        }

        match code {
            KeyCode::Char('q') => {
                *exit = true;
                return Ok(Mode::Normal);
            }
            KeyCode::Tab => {
                self.switch_tab(self.tab.cycle(1))?;
                return Ok(Mode::Normal);
            }
            KeyCode::BackTab => {
                self.switch_tab(self.tab.cycle(-1))?;
                return Ok(Mode::Normal);
            }
            KeyCode::Char(digit @ '1'..='4') => {
                let idx = digit as usize - '1' as usize;
                self.switch_tab(Tab::ALL[idx])?;
                return Ok(Mode::Normal);
            }
            _ => {}
        }

        match self.tab {
            Tab::Search => self.handle_search_key(code),
            Tab::Compare => self.handle_compare_key(code),
            Tab::Saved => self.handle_saved_key(code),
            Tab::Settings => self.handle_settings_key(code),
        }
    }

    fn handle_search_key(&mut self, code: KeyCode) -> Result<Mode> {
        let len = self.search.results.len();
        match code {
            KeyCode::Char('/') | KeyCode::Char('f') => {
                self.clear_status();
                return Ok(Mode::Typing(QueryForm::new(
                    QueryTarget::Medicines,
                    &self.search.input,
                )));
            }
            KeyCode::Up => self.search.cursor.move_by(-1, len),
            KeyCode::Down => self.search.cursor.move_by(1, len),
            KeyCode::PageUp => self.search.cursor.move_by(-PAGE_STEP, len),
            KeyCode::PageDown => self.search.cursor.move_by(PAGE_STEP, len),
            KeyCode::Home => self.search.cursor.first(),
            KeyCode::End => self.search.cursor.last(len),
            KeyCode::Enter => {
                if let Some(medicine) = self.search.current().cloned() {
                    self.open_details(medicine, Tab::Search);
                } else {
                    self.set_status("No medicine selected.", StatusKind::Error);
                }
            }
            _ => {}
        }
        Ok(Mode::Normal)
    }

    fn handle_compare_key(&mut self, code: KeyCode) -> Result<Mode> {
        let side = self.compare.active;
        match code {
            KeyCode::Left => self.compare.active = Side::Left,
            KeyCode::Right => self.compare.active = Side::Right,
            KeyCode::Char('/') | KeyCode::Char('f') => {
                self.clear_status();
                let query = self.compare.pane(side).query.clone();
                return Ok(Mode::Typing(QueryForm::new(QueryTarget::Compare(side), &query)));
            }
            KeyCode::Up => {
                let pane = self.compare.pane_mut(side);
                let len = pane.candidates.len();
                pane.cursor.move_by(-1, len);
            }
            KeyCode::Down => {
                let pane = self.compare.pane_mut(side);
                let len = pane.candidates.len();
                pane.cursor.move_by(1, len);
            }
            KeyCode::Enter => {
                let picked = self
                    .compare
                    .pane_mut(side)
                    .pick_current()
                    .map(|medicine| medicine.name.clone());
                match picked {
                    Some(name) => {
                        self.set_status(format!("{}: {name}", side.label()), StatusKind::Info)
                    }
                    None => self.set_status("Nothing to pick yet.", StatusKind::Error),
                }
            }
            KeyCode::Backspace | KeyCode::Char('x') => {
                self.compare.pane_mut(side).picked = None;
                self.clear_status();
            }
            _ => {}
        }
        Ok(Mode::Normal)
    }

    fn handle_saved_key(&mut self, code: KeyCode) -> Result<Mode> {
        let len = self.saved.items.len();
        match code {
            KeyCode::Up => self.saved.cursor.move_by(-1, len),
            KeyCode::Down => self.saved.cursor.move_by(1, len),
            KeyCode::PageUp => self.saved.cursor.move_by(-PAGE_STEP, len),
            KeyCode::PageDown => self.saved.cursor.move_by(PAGE_STEP, len),
            KeyCode::Home => self.saved.cursor.first(),
            KeyCode::End => self.saved.cursor.last(len),
            KeyCode::Enter => {
                if let Some(medicine) = self.saved.current().cloned() {
                    self.open_details(medicine, Tab::Saved);
                }
            }
            KeyCode::Char('-') | KeyCode::Delete => {
                if let Some(medicine) = self.saved.current().cloned() {
                    match remove_saved(&self.conn, &medicine.id) {
                        Ok(()) => {
                            self.refresh_saved();
                            self.set_status(
                                format!("Removed {}.", medicine.name),
                                StatusKind::Info,
                            );
                        }
                        Err(err) => self.set_status(surface_error(&err), StatusKind::Error),
                    }
                } else {
                    self.set_status("No saved drug selected.", StatusKind::Error);
                }
            }
            KeyCode::Char('c') | KeyCode::Char('C') => {
                if !self.saved.items.is_empty() {
                    return Ok(Mode::ConfirmClearSaved(ConfirmClearSaved {
                        count: self.saved.items.len(),
                    }));
                }
            }
            KeyCode::Char('r') => self.refresh_saved(),
            _ => {}
        }
        Ok(Mode::Normal)
    }

    fn handle_settings_key(&mut self, code: KeyCode) -> Result<Mode> {
        let len = SettingsRow::ALL.len();
        match code {
            KeyCode::Up => self.settings.cursor.move_by(-1, len),
            KeyCode::Down => self.settings.cursor.move_by(1, len),
            KeyCode::Enter | KeyCode::Char(' ') => match self.settings.current() {
                SettingsRow::Toggle(setting) => {
                    let value = !self.settings.settings.get(setting);
                    self.settings.settings.set(setting, value);
                    if let Err(err) = store_setting(&self.conn, setting, value) {
                        warn!(setting = setting.label(), error = %err, "could not persist setting");
                    }
                }
                SettingsRow::Help => return Ok(Mode::Info(InfoDialog::help())),
                SettingsRow::About => return Ok(Mode::Info(InfoDialog::about())),
            },
            _ => {}
        }
        Ok(Mode::Normal)
    }

    fn handle_details_key(&mut self, code: KeyCode, exit: &mut bool) -> Result<Mode> {
        let Some(details) = self.details.as_mut() else {
            return Ok(Mode::Normal);
        };
        let line_count = details_lines(details).len();
        match code {
            KeyCode::Char('q') => *exit = true,
            KeyCode::Esc | KeyCode::Backspace => {
                self.details = None;
                self.clear_status();
                if self.tab == Tab::Saved {
                    self.refresh_saved();
                }
            }
            KeyCode::Up => details.scroll_by(-1, line_count),
            KeyCode::Down => details.scroll_by(1, line_count),
            KeyCode::PageUp => details.scroll_by(-(PAGE_STEP as i32), line_count),
            KeyCode::PageDown => details.scroll_by(PAGE_STEP as i32, line_count),
            KeyCode::Home => details.scroll = 0,
            KeyCode::Char('s') | KeyCode::Char('S') => self.toggle_details_saved(),
            KeyCode::Tab => {
                self.switch_tab(self.tab.cycle(1))?;
            }
            KeyCode::BackTab => {
                self.switch_tab(self.tab.cycle(-1))?;
            }
            KeyCode::Char(digit @ '1'..='4') => {
                let idx = digit as usize - '1' as usize;
                self.switch_tab(Tab::ALL[idx])?;
            }
            _ => {}
        }
        Ok(Mode::Normal)
    }

    fn handle_typing(&mut self, code: KeyCode, mut form: QueryForm) -> Result<Mode> {
        match code {
            KeyCode::Esc => {
                self.store_typed_query(&form);
                return Ok(Mode::Normal);
            }
            KeyCode::Enter => {
                self.store_typed_query(&form);
                if form.target == QueryTarget::Medicines {
                    self.run_search();
                }
                return Ok(Mode::Normal);
            }
            KeyCode::Backspace => {
                if form.backspace() {
                    self.refresh_live_candidates(&form);
                }
            }
            KeyCode::Up | KeyCode::Down => {
                if let QueryTarget::Compare(side) = form.target {
                    let offset = if code == KeyCode::Up { -1 } else { 1 };
                    let pane = self.compare.pane_mut(side);
                    let len = pane.candidates.len();
                    pane.cursor.move_by(offset, len);
                }
            }
            KeyCode::Char(ch) => {
                if form.push_char(ch) {
                    self.refresh_live_candidates(&form);
                }
            }
            _ => {}
        }
        Ok(Mode::Typing(form))
    }

    fn handle_confirm_clear(&mut self, code: KeyCode, confirm: ConfirmClearSaved) -> Result<Mode> {
        match code {
            KeyCode::Char('y') | KeyCode::Char('Y') => {
                match clear_saved(&self.conn) {
                    Ok(()) => {
                        self.saved.items.clear();
                        self.saved.cursor.first();
                        self.set_status("Saved list cleared.", StatusKind::Info);
                    }
                    Err(err) => self.set_status(surface_error(&err), StatusKind::Error),
                }
                Ok(Mode::Normal)
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => Ok(Mode::Normal),
            _ => Ok(Mode::ConfirmClearSaved(confirm)),
        }
    }

    /// The compare panes list candidates while the user types.
    fn refresh_live_candidates(&mut self, form: &QueryForm) {
        if let QueryTarget::Compare(side) = form.target {
            let candidates = self.resolve_positions(&compare_candidates(
                &self.compare_index,
                &form.query,
            ));
            self.compare
                .pane_mut(side)
                .set_query(form.query.clone(), candidates);
        }
    }

    fn store_typed_query(&mut self, form: &QueryForm) {
        match form.target {
            QueryTarget::Medicines => self.search.input = form.query.clone(),
            QueryTarget::Compare(side) => self.compare.pane_mut(side).query = form.query.clone(),
        }
    }

    /// Commit the typed text as the search term and refresh the results.
    fn run_search(&mut self) {
        let term = self.search.input.trim().to_string();
        if term.is_empty() {
            self.search.set_results(term, Vec::new());
            return;
        }
        let positions = lookup(self.dataset.medicines(), &self.lookup_index, &term);
        let results = self.resolve_positions(&positions);
        info!(term = %term, results = results.len(), "search committed");
        self.search.set_results(term, results);
    }

    fn resolve_positions(&self, positions: &[usize]) -> Vec<Medicine> {
        let medicines = self.dataset.medicines();
        positions.iter().map(|&idx| medicines[idx].clone()).collect()
    }

    fn open_details(&mut self, medicine: Medicine, origin: Tab) {
        self.clear_status();
        self.details = Some(DetailsScreen::open(
            &self.conn,
            &self.dataset,
            medicine,
            origin,
        ));
    }

    fn toggle_details_saved(&mut self) {
        let Some(details) = self.details.as_mut() else {
            return;
        };
        match toggle_saved(&self.conn, &details.medicine.id) {
            Ok(now_saved) => {
                details.is_saved = now_saved;
                let text = if now_saved {
                    format!("Saved {}.", details.medicine.name)
                } else {
                    format!("Removed {} from saved.", details.medicine.name)
                };
                self.set_status(text, StatusKind::Info);
            }
            Err(err) => {
                warn!(error = %err, "toggle saved failed");
                self.set_status(
                    "Could not update saved list. Please try again.",
                    StatusKind::Error,
                );
            }
        }
    }

    fn switch_tab(&mut self, tab: Tab) -> Result<()> {
        self.clear_status();
        self.tab = tab;
        if tab == Tab::Saved {
            self.refresh_saved();
        }
        Ok(())
    }

    fn refresh_saved(&mut self) {
        if let Err(err) = self.saved.reload(&self.conn, &self.dataset) {
            warn!(error = %err, "could not load saved list");
            self.set_status(surface_error(&err), StatusKind::Error);
        }
    }

    fn details_visible(&self) -> bool {
        self.details
            .as_ref()
            .is_some_and(|details| details.origin == self.tab)
    }

    pub(crate) fn draw(&self, frame: &mut Frame) {
        let area = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(TAB_BAR_HEIGHT.min(area.height)),
                Constraint::Min(0),
                Constraint::Length(FOOTER_HEIGHT),
            ])
            .split(area);
        let (tab_area, content_area, footer_area) = (chunks[0], chunks[1], chunks[2]);

        self.draw_tab_bar(frame, tab_area);

        match (&self.details, self.tab) {
            (Some(details), tab) if details.origin == tab => {
                self.draw_details(frame, content_area, details)
            }
            (_, Tab::Search) => self.draw_search(frame, content_area),
            (_, Tab::Compare) => self.draw_compare(frame, content_area),
            (_, Tab::Saved) => self.draw_saved(frame, content_area),
            (_, Tab::Settings) => self.draw_settings(frame, content_area),
        }

        self.draw_footer(frame, footer_area);

        match &self.mode {
            Mode::Typing(form) => self.draw_query_bar(frame, content_area, form),
            Mode::ConfirmClearSaved(confirm) => self.draw_confirm_clear(frame, area, confirm),
            Mode::Info(dialog) => self.draw_info(frame, area, dialog),
            Mode::Normal => {}
        }
    }

    fn draw_tab_bar(&self, frame: &mut Frame, area: Rect) {
        let titles: Vec<String> = Tab::ALL
            .iter()
            .enumerate()
            .map(|(idx, tab)| format!("{} {}", idx + 1, tab.title()))
            .collect();
        let tabs = Tabs::new(titles)
            .block(Block::default().borders(Borders::ALL).title("Medwise"))
            .select(self.tab.position())
            .style(Style::default().fg(Color::Gray))
            .highlight_style(
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            );
        frame.render_widget(tabs, area);
    }

    fn draw_search(&self, frame: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(0)])
            .split(area);

        let input = if self.search.input.is_empty() {
            Span::styled(
                QueryTarget::Medicines.title(),
                Style::default().fg(Color::DarkGray),
            )
        } else {
            Span::raw(self.search.input.clone())
        };
        let bar = Paragraph::new(Line::from(input))
            .block(Block::default().borders(Borders::ALL).title("Search"));
        frame.render_widget(bar, chunks[0]);

        let body = chunks[1];
        if self.search.term.is_empty() {
            self.draw_hint(frame, body, &["Enter a query and press Enter to search"]);
        } else if self.search.results.is_empty() {
            self.draw_hint(
                frame,
                body,
                &[
                    "No medicines found",
                    "Try another brand name or ingredient spelling",
                ],
            );
        } else {
            self.render_medicine_cards(
                frame,
                body,
                &self.search.results,
                self.search.cursor.selected,
            );
        }
    }

    fn draw_details(&self, frame: &mut Frame, area: Rect, details: &DetailsScreen) {
        let paragraph = Paragraph::new(details_lines(details))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("Alternatives & Details"),
            )
            .wrap(Wrap { trim: false })
            .scroll((details.scroll, 0));
        frame.render_widget(paragraph, area);
    }

    fn draw_compare(&self, frame: &mut Frame, area: Rect) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(7)])
            .split(area);
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(rows[0]);

        for (side, column) in [Side::Left, Side::Right].into_iter().zip(columns.iter()) {
            self.draw_compare_pane(frame, *column, side, self.compare.pane(side));
        }

        let block = Block::default().borders(Borders::ALL).title("Summary");
        let lines = match self.compare.comparison() {
            Some(comparison) => {
                let (ingredients_a, ingredients_b) = comparison.ingredients();
                let (pack_a, pack_b) = comparison.packs();
                let (price_a, price_b) = comparison.prices();
                let mut lines = vec![
                    Line::from(format!("Ingredients A: {ingredients_a}")),
                    Line::from(format!("Ingredients B: {ingredients_b}")),
                    Line::from(format!("Pack: {pack_a} vs {pack_b}")),
                    Line::from(format!(
                        "Price: {}  vs  {}",
                        price_label(price_a, "n/a"),
                        price_label(price_b, "n/a")
                    )),
                ];
                if comparison.same_active_ingredients() {
                    lines.push(Line::from(Span::styled(
                        "Same active ingredient(s)",
                        Style::default().fg(Color::Green),
                    )));
                }
                lines
            }
            None => vec![Line::from(Span::styled(
                "Pick Drug A and Drug B to see a summary.",
                Style::default().fg(Color::Gray),
            ))],
        };
        frame.render_widget(
            Paragraph::new(lines).block(block).wrap(Wrap { trim: true }),
            rows[1],
        );
    }

    fn draw_compare_pane(&self, frame: &mut Frame, area: Rect, side: Side, pane: &ComparePane) {
        let active = self.compare.active == side;
        let border_style = if active {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default()
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .title(side.label())
            .border_style(border_style);
        frame.render_widget(block.clone(), area);
        let inner = block.inner(area);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(1), Constraint::Min(0)])
            .split(inner);
        let query = if pane.query.is_empty() {
            Span::styled("Search brand or ingredient", Style::default().fg(Color::DarkGray))
        } else {
            Span::raw(format!("Query: {}", pane.query))
        };
        frame.render_widget(Paragraph::new(Line::from(query)), chunks[0]);

        if let Some(picked) = &pane.picked {
            let lines = vec![
                Line::from(Span::styled(
                    picked.name.clone(),
                    Style::default().add_modifier(Modifier::BOLD),
                )),
                Line::from(picked.ingredients_label()),
                Line::from(picked.manufacturer().unwrap_or(MISSING).to_string()),
                Line::from(picked.pack_label().to_string()),
                Line::from(price_label(picked.parsed_price(), "price n/a")),
            ];
            frame.render_widget(
                Paragraph::new(lines).wrap(Wrap { trim: true }),
                chunks[1],
            );
            return;
        }

        let items: Vec<ListItem> = pane
            .candidates
            .iter()
            .map(|medicine| {
                ListItem::new(format!(
                    "{}  {}",
                    medicine.name,
                    price_label(medicine.parsed_price(), "price n/a")
                ))
            })
            .collect();
        let list = List::new(items)
            .highlight_style(Style::default().fg(Color::Yellow))
            .highlight_symbol("▶ ");
        let mut list_state = ListState::default();
        if active && !pane.candidates.is_empty() {
            list_state.select(Some(pane.cursor.selected));
        }
        frame.render_stateful_widget(list, chunks[1], &mut list_state);
    }

    fn draw_saved(&self, frame: &mut Frame, area: Rect) {
        if self.saved.items.is_empty() {
            self.draw_hint(
                frame,
                area,
                &[
                    "No saved drugs yet",
                    "Save drugs from your search results to access them quickly here.",
                ],
            );
            return;
        }
        self.render_medicine_cards(frame, area, &self.saved.items, self.saved.cursor.selected);
    }

    fn draw_settings(&self, frame: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(8), Constraint::Min(0)])
            .split(area);

        let items: Vec<ListItem> = SettingsRow::ALL
            .iter()
            .map(|row| match row {
                SettingsRow::Toggle(setting) => {
                    let checkbox = if self.settings.settings.get(*setting) {
                        "[x]"
                    } else {
                        "[ ]"
                    };
                    ListItem::new(format!("{checkbox} {}", setting.label()))
                }
                SettingsRow::Help => ListItem::new("    Help & FAQ"),
                SettingsRow::About => ListItem::new("    About"),
            })
            .collect();
        let list = List::new(items)
            .block(Block::default().borders(Borders::ALL).title("Settings"))
            .highlight_style(Style::default().fg(Color::Yellow))
            .highlight_symbol("▶ ");
        let mut list_state = ListState::default();
        list_state.select(Some(self.settings.cursor.selected));
        frame.render_stateful_widget(list, chunks[0], &mut list_state);

        let disclaimer = Paragraph::new(vec![
            Line::from(Span::styled(
                "Medical Disclaimer",
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(DISCLAIMER, Style::default().fg(Color::Gray))),
        ])
        .block(Block::default().borders(Borders::ALL))
        .wrap(Wrap { trim: true });
        frame.render_widget(disclaimer, chunks[1]);
    }

    fn draw_hint(&self, frame: &mut Frame, area: Rect, lines: &[&str]) {
        let lines: Vec<Line> = lines
            .iter()
            .enumerate()
            .map(|(idx, text)| {
                let style = if idx == 0 {
                    Style::default().fg(Color::Gray).add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(Color::DarkGray)
                };
                Line::from(Span::styled(text.to_string(), style))
            })
            .collect();
        let paragraph = Paragraph::new(lines)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }

    fn draw_footer(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::TOP);
        frame.render_widget(block.clone(), area);
        let inner = block.inner(area);

        let status_line = if let Some(status) = &self.status {
            Line::from(vec![Span::styled(status.text.clone(), status.kind.style())])
        } else {
            Line::from("")
        };

        let instructions = self.footer_instructions();

        let paragraph = Paragraph::new(vec![status_line, instructions]).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn draw_query_bar(&self, frame: &mut Frame, area: Rect, form: &QueryForm) {
        let height = 3u16.min(area.height);
        let popup_area = Rect {
            x: area.x,
            y: area.y,
            width: area.width,
            height,
        };
        frame.render_widget(Clear, popup_area);

        let block = Block::default()
            .borders(Borders::ALL)
            .title(form.target.title());
        let paragraph = Paragraph::new(Span::raw(format!("Search: {}", form.query)))
            .block(block.clone())
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, popup_area);

        let inner = block.inner(popup_area);
        let cursor_x = inner.x + "Search: ".len() as u16 + form.value_len() as u16;
        frame.set_cursor_position((min(cursor_x, inner.right()), inner.y));
    }

    fn draw_confirm_clear(&self, frame: &mut Frame, area: Rect, confirm: &ConfirmClearSaved) {
        let popup_area = centered_rect(60, 30, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title("Clear Saved").borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let noun = if confirm.count == 1 { "drug" } else { "drugs" };
        let lines = vec![
            Line::from(format!("Remove all {} saved {noun}?", confirm.count)),
            Line::from(""),
            Line::from(Span::styled(
                "Press Y to confirm or N / Esc to cancel.",
                Style::default().fg(Color::Gray),
            )),
        ];
        let paragraph = Paragraph::new(lines)
            .alignment(Alignment::Left)
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn draw_info(&self, frame: &mut Frame, area: Rect, dialog: &InfoDialog) {
        let popup_area = centered_rect(70, 40, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title(dialog.title).borders(Borders::ALL);
        let mut lines: Vec<Line> = dialog.lines.iter().cloned().map(Line::from).collect();
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "Press Enter or Esc to close.",
            Style::default().fg(Color::Gray),
        )));
        let paragraph = Paragraph::new(lines)
            .block(block)
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, popup_area);
    }

    fn footer_instructions(&self) -> Line<'static> {
        let key_style = Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD);
        let keys: &[(&str, &str)] = match (&self.mode, self.tab) {
            (Mode::Typing(_), _) => &[("[Enter]", "Search"), ("[Esc]", "Done")],
            (Mode::ConfirmClearSaved(_), _) => &[("[Y]", "Confirm"), ("[N]", "Cancel")],
            (Mode::Info(_), _) => &[("[Enter]", "Close")],
            (Mode::Normal, _) if self.details_visible() => &[
                ("[↑↓]", "Scroll"),
                ("[S]", "Save/Unsave"),
                ("[Esc]", "Back"),
                ("[Q]", "Quit"),
            ],
            (Mode::Normal, Tab::Search) => &[
                ("[/]", "Search"),
                ("[↑↓]", "Navigate"),
                ("[Enter]", "Details"),
                ("[Tab]", "Next Tab"),
                ("[Q]", "Quit"),
            ],
            (Mode::Normal, Tab::Compare) => &[
                ("[←→]", "Switch Side"),
                ("[/]", "Search"),
                ("[Enter]", "Pick"),
                ("[X]", "Unpick"),
                ("[Tab]", "Next Tab"),
            ],
            (Mode::Normal, Tab::Saved) => &[
                ("[Enter]", "Details"),
                ("[-]", "Remove"),
                ("[C]", "Clear All"),
                ("[Tab]", "Next Tab"),
                ("[Q]", "Quit"),
            ],
            (Mode::Normal, Tab::Settings) => &[
                ("[↑↓]", "Navigate"),
                ("[Space]", "Toggle/Open"),
                ("[Tab]", "Next Tab"),
                ("[Q]", "Quit"),
            ],
        };

        let mut spans = Vec::with_capacity(keys.len() * 2);
        for (key, action) in keys {
            spans.push(Span::styled(key.to_string(), key_style));
            spans.push(Span::raw(format!(" {action}   ")));
        }
        Line::from(spans)
    }

    fn render_medicine_cards(
        &self,
        frame: &mut Frame,
        area: Rect,
        medicines: &[Medicine],
        selected: usize,
    ) {
        if medicines.is_empty() || area.height == 0 {
            return;
        }

        let card_height = CARD_HEIGHT as usize;
        let capacity = ((area.height as usize) / card_height).max(1);
        let len = medicines.len();
        let mut start = if selected >= capacity {
            selected + 1 - capacity
        } else {
            0
        };
        if start + capacity > len {
            start = len.saturating_sub(capacity);
        }
        let end = min(start + capacity, len);
        let visible_len = end.saturating_sub(start);
        if visible_len == 0 {
            return;
        }

        let constraints: Vec<Constraint> = (0..visible_len)
            .map(|_| Constraint::Length(CARD_HEIGHT))
            .collect();
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints(constraints)
            .split(area);

        for (idx, chunk) in rows.iter().enumerate() {
            if chunk.height == 0 {
                continue;
            }
            let medicine_index = start + idx;
            if medicine_index >= len {
                break;
            }

            let is_selected = medicine_index == selected;
            let mut block = Block::default().borders(Borders::ALL);
            if is_selected {
                block = block.border_style(Style::default().fg(Color::Yellow));
            }
            let paragraph = Paragraph::new(medicine_card_lines(&medicines[medicine_index], is_selected))
                .block(block)
                .wrap(Wrap { trim: true });
            frame.render_widget(paragraph, *chunk);
        }
    }

    fn set_status<S: Into<String>>(&mut self, text: S, kind: StatusKind) {
        self.status = Some(StatusMessage {
            text: text.into(),
            kind,
        });
    }

    fn clear_status(&mut self) {
        self.status = None;
    }
}

/// Logical lines of the details view, before wrapping.
fn details_lines(details: &DetailsScreen) -> Vec<Line<'static>> {
    let medicine = &details.medicine;
    let report = &details.report;
    let heading = Style::default().add_modifier(Modifier::BOLD);
    let muted = Style::default().fg(Color::Gray);
    let warning = Style::default().fg(Color::Red);

    let mut lines = vec![
        Line::from(Span::styled(
            medicine.name.clone(),
            heading.fg(Color::Yellow),
        )),
        Line::from(format!("Ingredients: {}", medicine.ingredients_label())),
        Line::from(Span::styled(
            format!(
                "Grouped by ingredient set: {}",
                if report.active_key.is_empty() {
                    MISSING
                } else {
                    report.active_key.as_str()
                }
            ),
            muted,
        )),
        Line::from(medicine.pack_label().to_string()),
    ];
    if let Some(price) = medicine.parsed_price() {
        lines.push(Line::from(format!(
            "Listed price: {}",
            price_label(Some(price), "")
        )));
    }
    if medicine.is_discontinued() {
        lines.push(Line::from(Span::styled(
            "This item is discontinued.",
            warning,
        )));
    }
    lines.push(Line::from(if details.is_saved {
        Span::styled("Saved ✓", Style::default().fg(Color::Green))
    } else {
        Span::styled("Not saved (press s to save)", muted)
    }));

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "Other brands/generics with the same active ingredient(s)",
        heading,
    )));
    let manufacturers = if report.manufacturers.is_empty() {
        MISSING.to_string()
    } else {
        report.manufacturers.join(", ")
    };
    lines.push(Line::from(format!("Manufacturers: {manufacturers}")));
    lines.push(Line::from(format!(
        "Price range (approx): {} – {}",
        price_label(report.price_range.min, "n/a"),
        price_label(report.price_range.max, "n/a")
    )));
    if let Some(cheapest) = &report.cheapest {
        lines.push(Line::from(vec![
            Span::styled("Lowest-cost option: ", heading.fg(Color::Green)),
            Span::raw(format!(
                "{} • {} • {}",
                cheapest.medicine.name,
                price_label(Some(cheapest.price), ""),
                cheapest.medicine.manufacturer().unwrap_or(MISSING)
            )),
        ]));
    }
    if report.any_discontinued {
        lines.push(Line::from(Span::styled(
            "Note: Some versions in this group are discontinued (availability may vary).",
            Style::default().fg(Color::LightRed),
        )));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "Composition & packaging differences",
        heading,
    )));
    for row in &report.rows {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(row.name.clone(), heading)));
        lines.push(Line::from(Span::styled(
            row.manufacturer.clone().unwrap_or_default(),
            muted,
        )));
        let comp1 = if row.comp1.is_empty() {
            MISSING
        } else {
            row.comp1.as_str()
        };
        lines.push(Line::from(format!("Comp-1: {comp1}")));
        if !row.comp2.is_empty() {
            lines.push(Line::from(format!("Comp-2: {}", row.comp2)));
        }
        lines.push(Line::from(format!("Pack: {}", row.pack_size_label)));
        lines.push(Line::from(format!("Type: {}", row.kind)));
        lines.push(Line::from(format!("Price: {}", price_label(row.price, "n/a"))));
        if row.discontinued {
            lines.push(Line::from(Span::styled("Discontinued", warning)));
        }
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled("Medical disclaimer", warning.add_modifier(Modifier::BOLD))));
    lines.push(Line::from(Span::styled(DISCLAIMER, muted)));

    lines
}

#[cfg(test)]
mod tests {
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    use super::*;
    use crate::db::{load_saved_ids, load_settings, open_in_memory, toggle_saved as save_id};

    fn app() -> App {
        App::new(open_in_memory().unwrap(), Dataset::bundled().unwrap())
    }

    fn press(app: &mut App, keys: &[KeyCode]) {
        for key in keys {
            app.handle_key(*key).unwrap();
        }
    }

    fn type_text(app: &mut App, text: &str) {
        for ch in text.chars() {
            app.handle_key(KeyCode::Char(ch)).unwrap();
        }
    }

    fn render(app: &App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 40)).unwrap();
        terminal.draw(|frame| app.draw(frame)).unwrap();
        let buffer = terminal.backend().buffer().clone();
        buffer
            .content()
            .chunks(buffer.area.width as usize)
            .map(|row| row.iter().map(|cell| cell.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn query_is_only_applied_on_enter() {
        let mut app = app();
        press(&mut app, &[KeyCode::Char('/')]);
        type_text(&mut app, "azithromycin");
        assert!(app.search.results.is_empty());
        assert!(app.search.term.is_empty());

        press(&mut app, &[KeyCode::Enter]);
        assert_eq!(app.search.term, "azithromycin");
        let ids: Vec<_> = app.search.results.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["6", "5", "4", "7"]);
    }

    #[test]
    fn quit_key_only_exits_outside_typing() {
        let mut app = app();
        press(&mut app, &[KeyCode::Char('/')]);
        assert!(!app.handle_key(KeyCode::Char('q')).unwrap());
        press(&mut app, &[KeyCode::Esc]);
        assert_eq!(app.search.input, "q");
        assert!(app.handle_key(KeyCode::Char('q')).unwrap());
    }

    #[test]
    fn details_toggle_saves_and_saved_tab_lists_it() {
        let mut app = app();
        press(&mut app, &[KeyCode::Char('/')]);
        type_text(&mut app, "Dolo");
        press(&mut app, &[KeyCode::Enter, KeyCode::Enter]);

        let details = app.details.as_ref().expect("details open");
        assert_eq!(details.medicine.id, "13");
        assert_eq!(details.report.active_key, "paracetamol");
        assert!(!details.is_saved);

        press(&mut app, &[KeyCode::Char('s')]);
        assert!(app.details.as_ref().unwrap().is_saved);
        assert_eq!(load_saved_ids(&app.conn).unwrap(), vec!["13"]);

        press(&mut app, &[KeyCode::Esc, KeyCode::Char('3')]);
        assert_eq!(app.tab, Tab::Saved);
        assert_eq!(app.saved.items.len(), 1);
        assert_eq!(app.saved.items[0].name, "Dolo 650 Tablet");
    }

    #[test]
    fn failed_save_toggle_reports_and_keeps_state() {
        let mut app = app();
        press(&mut app, &[KeyCode::Char('/')]);
        type_text(&mut app, "Dolo");
        press(&mut app, &[KeyCode::Enter, KeyCode::Enter]);
        assert!(app.details.is_some());

        app.conn.execute("DROP TABLE kv_store", []).unwrap();
        press(&mut app, &[KeyCode::Char('s')]);

        assert!(!app.details.as_ref().unwrap().is_saved);
        let status = app.status.as_ref().expect("status shown");
        assert_eq!(status.text, "Could not update saved list. Please try again.");
        assert!(matches!(status.kind, StatusKind::Error));
    }

    #[test]
    fn failed_setting_write_keeps_toggled_value() {
        let mut app = app();
        app.conn.execute("DROP TABLE kv_store", []).unwrap();
        press(&mut app, &[KeyCode::Char('4'), KeyCode::Enter]);

        assert!(!app.settings.settings.notifications);
        assert!(app.settings.settings.price_alerts);
        assert!(app.status.is_none());
    }

    #[test]
    fn details_scroll_is_bounded_by_content() {
        let mut app = app();
        press(&mut app, &[KeyCode::Char('/')]);
        type_text(&mut app, "Dolo");
        press(&mut app, &[KeyCode::Enter, KeyCode::Enter]);

        let line_count = details_lines(app.details.as_ref().unwrap()).len();
        for _ in 0..line_count + 10 {
            press(&mut app, &[KeyCode::PageDown]);
        }
        assert_eq!(app.details.as_ref().unwrap().scroll as usize, line_count - 1);
        assert!(render(&app).contains("This app is for informational purposes"));

        press(&mut app, &[KeyCode::Home]);
        assert_eq!(app.details.as_ref().unwrap().scroll, 0);
    }

    #[test]
    fn saved_tab_remove_and_clear() {
        let mut app = app();
        for id in ["4", "1", "13"] {
            save_id(&app.conn, id).unwrap();
        }
        press(&mut app, &[KeyCode::Char('3')]);
        let names: Vec<_> = app.saved.items.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(names, vec!["4", "1", "13"]);

        press(&mut app, &[KeyCode::Down, KeyCode::Char('-')]);
        assert_eq!(load_saved_ids(&app.conn).unwrap(), vec!["4", "13"]);

        press(&mut app, &[KeyCode::Char('c'), KeyCode::Char('n')]);
        assert_eq!(app.saved.items.len(), 2);

        press(&mut app, &[KeyCode::Char('c'), KeyCode::Char('y')]);
        assert!(app.saved.items.is_empty());
        assert!(load_saved_ids(&app.conn).unwrap().is_empty());
    }

    #[test]
    fn compare_picks_both_sides() {
        let mut app = app();
        press(&mut app, &[KeyCode::Char('2'), KeyCode::Char('/')]);
        type_text(&mut app, "Dolo");
        assert!(!app.compare.left.candidates.is_empty());
        press(&mut app, &[KeyCode::Enter, KeyCode::Enter]);
        assert_eq!(app.compare.left.picked.as_ref().map(|m| m.id.as_str()), Some("13"));

        press(&mut app, &[KeyCode::Right, KeyCode::Char('/')]);
        type_text(&mut app, "Calpol");
        press(&mut app, &[KeyCode::Enter, KeyCode::Enter]);

        let comparison = app.compare.comparison().expect("both sides picked");
        assert!(comparison.same_active_ingredients());
        assert_eq!(comparison.prices(), (Some(30.91), Some(30.4)));

        press(&mut app, &[KeyCode::Char('/'), KeyCode::Backspace]);
        assert!(app.compare.right.picked.is_none());
    }

    #[test]
    fn settings_toggle_persists() {
        let mut app = app();
        press(&mut app, &[KeyCode::Char('4'), KeyCode::Down, KeyCode::Char(' ')]);
        assert!(!app.settings.settings.price_alerts);
        assert!(!load_settings(&app.conn).price_alerts);
        assert!(load_settings(&app.conn).notifications);

        press(&mut app, &[KeyCode::Down, KeyCode::Enter]);
        assert!(matches!(app.mode, Mode::Info(_)));
        press(&mut app, &[KeyCode::Esc]);
        assert!(matches!(app.mode, Mode::Normal));
    }

    #[test]
    fn every_tab_renders() {
        let mut app = app();
        assert!(render(&app).contains("Enter a query and press Enter to search"));

        press(&mut app, &[KeyCode::Char('/')]);
        type_text(&mut app, "avil");
        press(&mut app, &[KeyCode::Enter]);
        assert!(render(&app).contains("Avil Injection"));

        press(&mut app, &[KeyCode::Enter]);
        let details = render(&app);
        assert!(details.contains("Alternatives & Details"));
        assert!(details.contains("Lowest-cost option"));

        press(&mut app, &[KeyCode::Char('2')]);
        assert!(render(&app).contains("Pick Drug A and Drug B"));
        press(&mut app, &[KeyCode::Char('3')]);
        assert!(render(&app).contains("No saved drugs yet"));
        press(&mut app, &[KeyCode::Char('4')]);
        assert!(render(&app).contains("Price Alerts"));
    }

    #[test]
    fn unmatched_query_shows_empty_state() {
        let mut app = app();
        press(&mut app, &[KeyCode::Char('/')]);
        type_text(&mut app, "qqqq");
        press(&mut app, &[KeyCode::Enter]);
        assert!(app.search.results.is_empty());
        assert!(render(&app).contains("No medicines found"));
    }
}
