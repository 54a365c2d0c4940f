use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseEvent, MouseEventKind};
use tui::layout::{Constraint, Direction, Layout};
use tui::text::{Span, Spans};
use tui::widgets::{Block, Paragraph};
use tui::{backend::Backend, Terminal};

use crate::grid_view::{GridView, SelectMode};
use crate::navigator::{FileList, FinderForm};
use crate::palette::STYLE;
use rime::projector::{Completion, Outcome};
use rime::session::{CatalogPath, Session};

const STATUS_TTL: Duration = Duration::from_secs(5);

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Focus {
    Form,
    Files,
    Data,
    Schema,
    Stats,
}

impl Focus {
    const ORDER: [Focus; 5] = [Focus::Form, Focus::Files, Focus::Data, Focus::Schema, Focus::Stats];

    fn cycle(self, forward: bool) -> Self {
        let i = Self::ORDER.iter().position(|f| *f == self).unwrap_or(0);
        let n = Self::ORDER.len();
        Self::ORDER[if forward { (i + 1) % n } else { (i + n - 1) % n }]
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Status {
    Info(String),
    Error(String),
}

pub struct Workspace {
    pub session: Session,
    pub form: FinderForm,
    pub files: FileList,
    pub data: GridView,
    pub schema: GridView,
    pub stats: GridView,
    pub focus: Focus,
    pub status: Option<Status>,
    pub status_time: Option<Instant>,
    pending: Vec<Completion>,
}

impl Workspace {
    pub fn new(session: Session) -> Self {
        let grids = session.grids().clone();
        let form = FinderForm::new(session.catalog());
        let mut ws = Self {
            form,
            files: FileList::new(),
            data: GridView::new(grids.data, SelectMode::Columns, "Select a file to load its data"),
            schema: GridView::new(grids.schema, SelectMode::Rows, "No schema loaded"),
            stats: GridView::new(grids.stats, SelectMode::Rows, "No statistics loaded"),
            focus: Focus::Form,
            status: None,
            status_time: None,
            pending: Vec::new(),
            session,
        };
        ws.data.grid.set_title("Data");
        ws.schema.grid.set_title("Schema");
        ws.stats.grid.set_title("Stats");
        ws.apply_focus();
        ws
    }

    pub fn set_status(&mut self, status: Status) {
        self.status = Some(status);
        self.status_time = Some(Instant::now());
    }

    fn apply_focus(&mut self) {
        self.form.focused = self.focus == Focus::Form;
        self.files.focused = self.focus == Focus::Files;
        self.data.focused = self.focus == Focus::Data;
        self.schema.focused = self.focus == Focus::Schema;
        self.stats.focused = self.focus == Focus::Stats;
    }

    fn set_focus(&mut self, focus: Focus) {
        self.focus = focus;
        self.apply_focus();
    }

    /// Preselect a table, as given after `#` on the command line.
    pub fn preselect(&mut self, path: CatalogPath) {
        self.form.jump_to(self.session.catalog(), path);
        self.open_table(path);
    }

    pub fn open_table(&mut self, path: CatalogPath) {
        let Some(table) = self.session.catalog().table(path).cloned() else {
            return;
        };
        match self.session.select_table(&table) {
            Ok(_) => {
                let title = self.session.files_title();
                self.files.set_files(title, self.session.files());
                self.set_status(Status::Info(format!(
                    "{}: {} files",
                    table.coordinate(),
                    self.files.items.len()
                )));
                self.set_focus(Focus::Files);
            }
            Err(e) => {
                tracing::warn!(table = %table.coordinate(), error = %e, "listing files failed");
                self.files.clear();
                self.set_status(Status::Error(e.to_string()));
            }
        }
    }

    pub fn open_file(&mut self, id: &str) {
        if let Some(projections) = self.session.select_file(id) {
            self.pending = projections.into_vec();
            self.set_status(Status::Info(format!("Loading {id}…")));
        }
    }

    /// Drain finished projections; returns whether anything changed.
    pub fn poll_projections(&mut self) -> bool {
        let mut changed = false;
        let mut failures = Vec::new();
        self.pending.retain_mut(|completion| match completion.poll() {
            Some(outcome) => {
                changed = true;
                if let Outcome::Failed(message) = outcome {
                    failures.push(format!("{}: {}", completion.kind(), message));
                }
                false
            }
            None => true,
        });
        if let Some(message) = failures.pop() {
            self.set_status(Status::Error(message));
        } else if changed && self.pending.is_empty() {
            self.status = None;
            self.status_time = None;
        }
        changed
    }

    pub fn update(&mut self) {
        if let Some(t) = self.status_time {
            if t.elapsed() > STATUS_TTL {
                self.status = None;
                self.status_time = None;
            }
        }
    }

    /// Returns `true` when the user asked to quit.
    pub fn handle_key(&mut self, key: KeyEvent) -> Result<bool> {
        if key.kind != KeyEventKind::Press {
            return Ok(false);
        }
        if matches!(key.code, KeyCode::Char('q') | KeyCode::Char('Q'))
            && key.modifiers.contains(KeyModifiers::CONTROL)
        {
            return Ok(true);
        }
        match key.code {
            KeyCode::Tab => {
                self.set_focus(self.focus.cycle(true));
                return Ok(false);
            }
            KeyCode::BackTab => {
                self.set_focus(self.focus.cycle(false));
                return Ok(false);
            }
            KeyCode::Char('q') if self.focus != Focus::Form => return Ok(true),
            _ => {}
        }

        match self.focus {
            Focus::Form => {
                if let Some(path) = self.form.handle_key(self.session.catalog(), key) {
                    self.open_table(path);
                }
            }
            Focus::Files => {
                if let Some(id) = self.files.handle_key(key) {
                    self.open_file(&id);
                }
            }
            Focus::Data => {
                self.data.handle_key(key);
            }
            Focus::Schema => {
                self.schema.handle_key(key);
            }
            Focus::Stats => {
                self.stats.handle_key(key);
            }
        }
        Ok(false)
    }

    pub fn handle_mouse(&mut self, event: MouseEvent) {
        if matches!(event.kind, MouseEventKind::Moved | MouseEventKind::Up(_)) {
            return;
        }
        let clicked = matches!(event.kind, MouseEventKind::Down(_));

        if self.form.handle_mouse(event) {
            if clicked {
                self.set_focus(Focus::Form);
            }
        } else if let Some(opened) = self.files.handle_mouse(event) {
            if clicked {
                self.set_focus(Focus::Files);
            }
            if let Some(id) = opened {
                self.open_file(&id);
            }
        } else if self.data.handle_mouse(event) {
            if clicked {
                self.set_focus(Focus::Data);
            }
        } else if self.schema.handle_mouse(event) {
            if clicked {
                self.set_focus(Focus::Schema);
            }
        } else if self.stats.handle_mouse(event) && clicked {
            self.set_focus(Focus::Stats);
        }
    }

    pub fn render<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<()> {
        terminal.draw(|f| {
            let size = f.size();
            if size.height <= 6 || size.width <= 20 {
                return;
            }
            f.render_widget(Block::default().style(STYLE::default_bg()), size);

            let rows = Layout::default()
                .direction(Direction::Vertical)
                .constraints([
                    Constraint::Percentage(50),
                    Constraint::Min(3),
                    Constraint::Length(1),
                ])
                .split(size);
            let top = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
                .split(rows[0]);
            let left = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Length(5), Constraint::Min(3)])
                .split(top[0]);
            let right = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
                .split(top[1]);

            self.form.render(f, left[0]);
            self.files.render(f, left[1]);
            self.schema.render(f, right[0]);
            self.stats.render(f, right[1]);
            self.data.render(f, rows[1]);

            let line = match &self.status {
                Some(Status::Error(e)) => Spans::from(Span::styled(format!("Error: {e}"), STYLE::error_fg())),
                Some(Status::Info(m)) => Spans::from(Span::styled(m.clone(), STYLE::info_fg())),
                None => Spans::from(Span::styled(
                    "Tab: next pane | ←/→ ↑/↓: navigate | Enter: open | q / Ctrl-Q: quit",
                    STYLE::status_fg(),
                )),
            };
            f.render_widget(Paragraph::new(line), rows[2]);
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn focus_cycles_both_ways() {
        assert_eq!(Focus::Form.cycle(true), Focus::Files);
        assert_eq!(Focus::Stats.cycle(true), Focus::Form);
        assert_eq!(Focus::Form.cycle(false), Focus::Stats);
    }
}
