use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    layout::{Constraint, Layout},
    text::{Line, Span},
    widgets::{Cell, Paragraph, Row, Table, TableState, Wrap},
    DefaultTerminal, Frame,
};

use crate::error::Result;
use crate::fmt::{date_time, or_dash, short_date};
use crate::models::Report;
use crate::store::DocumentStore;
use crate::table::command::{execute, ReportCommand, SetLabel, SetNote, ToggleRead};
use crate::table::paginate::format_buttons;
use crate::table::ReportTable;
use crate::tui::{self, ERROR_STYLE, FOOTER_STYLE, HEADER_STYLE, SELECTED_STYLE};

enum BrowseMode {
    Normal,
    Search(String),
    GotoPage(String),
    EditLabel(String),
    EditNote(String),
}

#[derive(Debug, PartialEq)]
pub enum BrowseAction {
    Continue,
    Close,
    ToggleRead(String),
    SaveLabel(String, String),
    SaveNote(String, String),
}

pub struct ReportsBrowser {
    table: ReportTable,
    page_window: usize,
    selected: usize,
    mode: BrowseMode,
    show_detail: bool,
    status_message: Option<String>,
    table_state: TableState,
}

impl ReportsBrowser {
    pub fn new(table: ReportTable, page_window: usize) -> Self {
        Self {
            table,
            page_window,
            selected: 0,
            mode: BrowseMode::Normal,
            show_detail: false,
            status_message: None,
            table_state: TableState::default(),
        }
    }

    pub fn table(&self) -> &ReportTable {
        &self.table
    }

    pub fn run(&mut self, store: &dyn DocumentStore) -> Result<()> {
        if self.table.reports().is_empty() {
            println!("No reports yet.");
            return Ok(());
        }
        tui::with_terminal(|terminal| self.event_loop(terminal, store))
    }

    fn selected_report(&self) -> Option<&Report> {
        self.table.loaded().get(self.selected).copied()
    }

    fn clamp_selection(&mut self) {
        let len = self.table.loaded().len();
        self.selected = self.selected.min(len.saturating_sub(1));
    }

    /// Draw the browser into the given frame.
    pub fn draw_frame(&mut self, frame: &mut Frame) {
        let area = frame.area();
        let detail_height: u16 = if self.show_detail { 8 } else { 0 };

        let areas = Layout::vertical([
            Constraint::Length(1),             // title
            Constraint::Length(1),             // filters
            Constraint::Fill(1),               // table
            Constraint::Length(detail_height), // detail panel
            Constraint::Length(1),             // page buttons
            Constraint::Length(1),             // status
            Constraint::Length(1),             // keys
        ])
        .split(area);

        frame.render_widget(Paragraph::new("Reports").style(HEADER_STYLE), areas[0]);

        let search = if self.table.search().is_empty() {
            String::new()
        } else {
            format!(" | search: {:?}", self.table.search())
        };
        let filters = format!(
            "Showing {} | {}{}",
            self.table.week().label(),
            self.table.read_filter().label(),
            search
        );
        frame.render_widget(Paragraph::new(filters).style(FOOTER_STYLE), areas[1]);

        // Title column takes whatever the fixed columns leave.
        let table_area = areas[2];
        let fixed_cols: u16 = 1 + 10 + 24 + 16 + 12;
        let title_width = table_area.width.saturating_sub(fixed_cols + 5).max(10) as usize;

        let rows: Vec<Row> = self
            .table
            .loaded()
            .into_iter()
            .map(|report| {
                let (title, lines) = tui::wrap_text(or_dash(&report.title), title_width);
                Row::new(vec![
                    Cell::from(tui::read_span(report.read)),
                    Cell::from(short_date(report.created_date)),
                    Cell::from(or_dash(&report.agency).to_string()),
                    Cell::from(or_dash(&report.topic).to_string()),
                    Cell::from(title),
                    Cell::from(report.label.clone()),
                ])
                .height(lines)
            })
            .collect();

        let widths = [
            Constraint::Length(1),
            Constraint::Length(10),
            Constraint::Length(24),
            Constraint::Length(16),
            Constraint::Fill(1),
            Constraint::Length(12),
        ];
        let header = Row::new(["", "Date", "Agency", "Topic", "Title", "Label"])
            .style(HEADER_STYLE)
            .bottom_margin(1);

        self.table_state.select(Some(self.selected));
        let table = Table::new(rows, widths)
            .header(header)
            .column_spacing(1)
            .row_highlight_style(SELECTED_STYLE);
        frame.render_stateful_widget(table, table_area, &mut self.table_state);

        if self.show_detail {
            let lines: Vec<Line> = match self.selected_report() {
                Some(r) => vec![
                    Line::from(format!("{}  {}", date_time(r.created_date), r.title)),
                    Line::from(format!(
                        "{} | {} {} | source: {}",
                        or_dash(&r.agency),
                        r.city,
                        r.state,
                        or_dash(&r.source)
                    )),
                    Line::from(format!("link: {}  {}", or_dash(&r.link), r.second_link)),
                    Line::from(format!("note: {}", or_dash(&r.note))),
                    Line::from(r.detail.clone()),
                ],
                None => vec![Line::from("No report selected")],
            };
            frame.render_widget(
                Paragraph::new(lines).wrap(Wrap { trim: true }),
                areas[3],
            );
        }

        let pages = format_buttons(&self.table.page_buttons(self.page_window));
        frame.render_widget(Paragraph::new(format!("Page {pages}")), areas[4]);

        let total = self.table.filtered().len();
        let status = match &self.status_message {
            Some(msg) => Line::from(vec![
                Span::raw(format!("{total} reports | ")),
                Span::styled(msg.clone(), ERROR_STYLE),
            ]),
            None => Line::from(format!("{total} reports")),
        };
        frame.render_widget(Paragraph::new(status).style(FOOTER_STYLE), areas[5]);

        let keys = match &self.mode {
            BrowseMode::Normal => Paragraph::new(
                "\u{2191}/\u{2193}:select  n/\u{2192}:next  p/\u{2190}:prev  w:weeks  r:read  /:search  g:page  m:mark read  l:label  o:note  Enter:detail  q:quit",
            )
            .style(FOOTER_STYLE),
            BrowseMode::Search(input) => Paragraph::new(format!("Search: {input}\u{2588}")),
            BrowseMode::GotoPage(input) => Paragraph::new(format!("Go to page: {input}\u{2588}")),
            BrowseMode::EditLabel(input) => Paragraph::new(format!("Label: {input}\u{2588}")),
            BrowseMode::EditNote(input) => Paragraph::new(format!("Note: {input}\u{2588}")),
        };
        frame.render_widget(keys, areas[6]);
    }

    /// Handle a key event. Returns a BrowseAction indicating what the caller should do.
    pub fn handle_key_event(&mut self, code: KeyCode) -> BrowseAction {
        self.status_message = None;

        match &mut self.mode {
            BrowseMode::Normal => match code {
                KeyCode::Char('q') | KeyCode::Esc => return BrowseAction::Close,
                KeyCode::Down => {
                    if self.selected + 1 < self.table.loaded().len() {
                        self.selected += 1;
                    }
                }
                KeyCode::Up => self.selected = self.selected.saturating_sub(1),
                KeyCode::Char('n') | KeyCode::Right | KeyCode::PageDown => {
                    self.table.next_page();
                    self.selected = 0;
                }
                KeyCode::Char('p') | KeyCode::Left | KeyCode::PageUp => {
                    self.table.prev_page();
                    self.selected = 0;
                }
                KeyCode::Char('w') => {
                    self.table.set_week(self.table.week().cycle());
                    self.selected = 0;
                }
                KeyCode::Char('r') => {
                    self.table.set_read_filter(self.table.read_filter().cycle());
                    self.selected = 0;
                }
                KeyCode::Char('/') => {
                    self.mode = BrowseMode::Search(self.table.search().to_string());
                }
                KeyCode::Char('g') => self.mode = BrowseMode::GotoPage(String::new()),
                KeyCode::Enter => self.show_detail = !self.show_detail,
                KeyCode::Char('m') => {
                    if let Some(r) = self.selected_report() {
                        return BrowseAction::ToggleRead(r.id.clone());
                    }
                }
                KeyCode::Char('l') => {
                    if let Some(label) = self.selected_report().map(|r| r.label.clone()) {
                        self.mode = BrowseMode::EditLabel(label);
                    }
                }
                KeyCode::Char('o') => {
                    if let Some(note) = self.selected_report().map(|r| r.note.clone()) {
                        self.mode = BrowseMode::EditNote(note);
                    }
                }
                _ => {}
            },
            BrowseMode::Search(input) => match code {
                KeyCode::Enter | KeyCode::Esc => self.mode = BrowseMode::Normal,
                KeyCode::Backspace => {
                    input.pop();
                    let query = input.clone();
                    self.table.set_search(&query);
                    self.selected = 0;
                }
                KeyCode::Char(c) => {
                    input.push(c);
                    let query = input.clone();
                    self.table.set_search(&query);
                    self.selected = 0;
                }
                _ => {}
            },
            BrowseMode::GotoPage(input) => match code {
                KeyCode::Esc => self.mode = BrowseMode::Normal,
                KeyCode::Backspace => {
                    input.pop();
                }
                KeyCode::Char(c) if c.is_ascii_digit() => input.push(c),
                KeyCode::Enter => {
                    if let Ok(page) = input.trim().parse::<usize>() {
                        self.table.set_page(page);
                        self.selected = 0;
                    }
                    self.mode = BrowseMode::Normal;
                }
                _ => {}
            },
            BrowseMode::EditLabel(input) | BrowseMode::EditNote(input) => match code {
                KeyCode::Esc => self.mode = BrowseMode::Normal,
                KeyCode::Backspace => {
                    input.pop();
                }
                KeyCode::Char(c) => input.push(c),
                KeyCode::Enter => {
                    let value = std::mem::take(input);
                    let is_label = matches!(self.mode, BrowseMode::EditLabel(_));
                    self.mode = BrowseMode::Normal;
                    if let Some(id) = self.selected_report().map(|r| r.id.clone()) {
                        return if is_label {
                            BrowseAction::SaveLabel(id, value)
                        } else {
                            BrowseAction::SaveNote(id, value)
                        };
                    }
                }
                _ => {}
            },
        }
        BrowseAction::Continue
    }

    /// Carry out a mutating action against the store.
    pub fn apply_action(&mut self, store: &dyn DocumentStore, action: BrowseAction) -> BrowseAction {
        let mut command: Box<dyn ReportCommand> = match &action {
            BrowseAction::ToggleRead(id) => Box::new(ToggleRead::new(id)),
            BrowseAction::SaveLabel(id, label) => Box::new(SetLabel::new(id, label)),
            BrowseAction::SaveNote(id, note) => Box::new(SetNote::new(id, note)),
            BrowseAction::Continue | BrowseAction::Close => return action,
        };
        if let Err(e) = execute(&mut self.table, store, command.as_mut()) {
            self.status_message = Some(format!("{} failed: {e}", command.describe()));
        }
        self.clamp_selection();
        BrowseAction::Continue
    }

    fn event_loop(&mut self, terminal: &mut DefaultTerminal, store: &dyn DocumentStore) -> Result<()> {
        loop {
            terminal.draw(|frame| self.draw_frame(frame))?;

            if let Event::Key(KeyEvent {
                code,
                modifiers,
                kind,
                ..
            }) = event::read()?
            {
                if kind != KeyEventKind::Press {
                    continue;
                }
                if modifiers.contains(KeyModifiers::CONTROL) && code == KeyCode::Char('c') {
                    break;
                }
                let action = self.handle_key_event(code);
                if self.apply_action(store, action) == BrowseAction::Close {
                    break;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_store;
    use crate::models::{Timestamp, REPORTS};
    use crate::store::load_reports;
    use crate::table::{ReadFilter, ReportWeek};
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use ratatui::{backend::TestBackend, Terminal};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
    }

    fn browser_with(store: &dyn DocumentStore, n: usize) -> ReportsBrowser {
        for i in 0..n {
            let report = Report {
                title: format!("Rumor {i}"),
                agency: "County Health".into(),
                created_date: Timestamp::from_datetime(now() - Duration::days(i as i64)),
                ..Report::default()
            };
            store
                .create_document(REPORTS, serde_json::to_value(&report).unwrap())
                .unwrap();
        }
        let table = ReportTable::new(load_reports(store).unwrap(), 5, now());
        ReportsBrowser::new(table, 5)
    }

    #[test]
    fn test_filter_keys_cycle_and_reset_page() {
        let (_dir, store) = test_store();
        let mut browser = browser_with(&store, 12);
        browser.handle_key_event(KeyCode::Char('n'));
        assert_eq!(browser.table().current_page(), 2);

        browser.handle_key_event(KeyCode::Char('w'));
        assert_eq!(browser.table().week(), ReportWeek::One);
        assert_eq!(browser.table().current_page(), 1);
        assert_eq!(browser.table().filtered().len(), 8);

        browser.handle_key_event(KeyCode::Char('r'));
        assert_eq!(browser.table().read_filter(), ReadFilter::Unread);
    }

    #[test]
    fn test_search_mode_filters_live() {
        let (_dir, store) = test_store();
        let mut browser = browser_with(&store, 12);
        browser.handle_key_event(KeyCode::Char('/'));
        for c in "rumor 1".chars() {
            browser.handle_key_event(KeyCode::Char(c));
        }
        // "Rumor 1", "Rumor 10", "Rumor 11"
        assert_eq!(browser.table().filtered().len(), 3);
        browser.handle_key_event(KeyCode::Enter);
        browser.handle_key_event(KeyCode::Char('q'));
        assert_eq!(browser.table().search(), "rumor 1");
    }

    #[test]
    fn test_mark_read_persists_through_command() {
        let (_dir, store) = test_store();
        let mut browser = browser_with(&store, 3);
        browser.handle_key_event(KeyCode::Down);
        let action = browser.handle_key_event(KeyCode::Char('m'));
        let BrowseAction::ToggleRead(id) = &action else {
            panic!("expected toggle, got {action:?}");
        };
        let id = id.clone();
        assert_eq!(browser.apply_action(&store, action), BrowseAction::Continue);
        assert!(browser.table().find(&id).unwrap().read);
        let stored = load_reports(&store).unwrap();
        assert!(stored.iter().find(|r| r.id == id).unwrap().read);
    }

    #[test]
    fn test_label_entry_saves_on_enter() {
        let (_dir, store) = test_store();
        let mut browser = browser_with(&store, 1);
        browser.handle_key_event(KeyCode::Char('l'));
        for c in "true".chars() {
            browser.handle_key_event(KeyCode::Char(c));
        }
        let action = browser.handle_key_event(KeyCode::Enter);
        assert!(matches!(&action, BrowseAction::SaveLabel(_, label) if label == "true"));
        browser.apply_action(&store, action);
        assert_eq!(load_reports(&store).unwrap()[0].label, "true");
    }

    #[test]
    fn test_goto_page_clamps() {
        let (_dir, store) = test_store();
        let mut browser = browser_with(&store, 12);
        browser.handle_key_event(KeyCode::Char('g'));
        browser.handle_key_event(KeyCode::Char('9'));
        browser.handle_key_event(KeyCode::Enter);
        assert_eq!(browser.table().current_page(), 3);
    }

    #[test]
    fn test_draw_renders_rows() {
        let (_dir, store) = test_store();
        let mut browser = browser_with(&store, 2);
        browser.handle_key_event(KeyCode::Enter);
        let mut terminal = Terminal::new(TestBackend::new(120, 30)).unwrap();
        terminal.draw(|frame| browser.draw_frame(frame)).unwrap();
        let text: String = terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect();
        assert!(text.contains("Reports"));
        assert!(text.contains("Rumor 0"));
        assert!(text.contains("Page [1]"));
    }
}
