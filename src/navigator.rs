//! Finder form (share / schema / table dropdowns) and the file list.

use crossterm::event::{KeyCode, KeyEvent, MouseButton, MouseEvent, MouseEventKind};
use tui::{
    backend::Backend,
    layout::Rect,
    text::{Span, Spans},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::grid_view::{fit, hit};
use crate::palette::{KANAGAWA as k, STYLE};
use rime::session::{Catalog, CatalogPath};
use rime::sharing::File;

#[derive(Clone, Debug, Default)]
pub struct Dropdown {
    pub label: &'static str,
    pub options: Vec<String>,
    pub selected: usize,
}

impl Dropdown {
    fn new(label: &'static str) -> Self {
        Self { label, ..Self::default() }
    }

    fn set_options(&mut self, options: Vec<String>) {
        self.options = options;
        self.selected = 0;
    }

    fn step(&mut self, forward: bool) -> bool {
        if self.options.is_empty() {
            return false;
        }
        let before = self.selected;
        self.selected = if forward {
            (self.selected + 1).min(self.options.len() - 1)
        } else {
            self.selected.saturating_sub(1)
        };
        before != self.selected
    }

    fn current(&self) -> &str {
        self.options.get(self.selected).map(String::as_str).unwrap_or("")
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Field {
    Share,
    Schema,
    Table,
}

pub struct FinderForm {
    pub share: Dropdown,
    pub schema: Dropdown,
    pub table: Dropdown,
    pub field: Field,
    pub focused: bool,
    area: Option<Rect>,
}

impl FinderForm {
    pub fn new(catalog: &Catalog) -> Self {
        let mut form = Self {
            share: Dropdown::new("Share"),
            schema: Dropdown::new("Schema"),
            table: Dropdown::new("Table"),
            field: Field::Share,
            focused: true,
            area: None,
        };
        form.share.set_options(owned(catalog.share_names()));
        form.refresh_schemas(catalog);
        form
    }

    fn refresh_schemas(&mut self, catalog: &Catalog) {
        self.schema.set_options(owned(catalog.schema_names(self.share.selected)));
        self.refresh_tables(catalog);
    }

    fn refresh_tables(&mut self, catalog: &Catalog) {
        self.table.set_options(owned(
            catalog.table_names(self.share.selected, self.schema.selected),
        ));
    }

    pub fn path(&self) -> CatalogPath {
        (self.share.selected, self.schema.selected, self.table.selected)
    }

    /// Point the dropdowns at `path` (used for the `#share.schema.table` preset).
    pub fn jump_to(&mut self, catalog: &Catalog, (share, schema, table): CatalogPath) {
        self.share.selected = share;
        self.schema.set_options(owned(catalog.schema_names(share)));
        self.schema.selected = schema;
        self.refresh_tables(catalog);
        self.table.selected = table;
        self.field = Field::Table;
    }

    fn dropdown_mut(&mut self) -> &mut Dropdown {
        match self.field {
            Field::Share => &mut self.share,
            Field::Schema => &mut self.schema,
            Field::Table => &mut self.table,
        }
    }

    /// Returns the confirmed table on `Enter`.
    pub fn handle_key(&mut self, catalog: &Catalog, key: KeyEvent) -> Option<CatalogPath> {
        match key.code {
            KeyCode::Up => {
                self.field = match self.field {
                    Field::Share | Field::Schema => Field::Share,
                    Field::Table => Field::Schema,
                }
            }
            KeyCode::Down => {
                self.field = match self.field {
                    Field::Share => Field::Schema,
                    Field::Schema | Field::Table => Field::Table,
                }
            }
            KeyCode::Left | KeyCode::Right => {
                let field = self.field;
                if self.dropdown_mut().step(key.code == KeyCode::Right) {
                    match field {
                        Field::Share => self.refresh_schemas(catalog),
                        Field::Schema => self.refresh_tables(catalog),
                        Field::Table => {}
                    }
                }
            }
            KeyCode::Enter => {
                if self.field != Field::Table {
                    self.field = Field::Table;
                } else if !self.table.options.is_empty() {
                    return Some(self.path());
                }
            }
            _ => {}
        }
        None
    }

    /// Click picks a field; returns whether the event landed here.
    pub fn handle_mouse(&mut self, event: MouseEvent) -> bool {
        let Some(area) = self.area else { return false };
        if !hit(area, event.column, event.row) {
            return false;
        }
        if let MouseEventKind::Down(MouseButton::Left) = event.kind {
            self.field = match event.row.saturating_sub(area.y + 1) {
                0 => Field::Share,
                1 => Field::Schema,
                _ => Field::Table,
            };
        }
        true
    }

    pub fn render<B: Backend>(&mut self, f: &mut Frame<B>, area: Rect) {
        self.area = Some(area);
        let block = Block::default()
            .title(Span::styled(" Delta Sharing ", STYLE::title()))
            .borders(Borders::ALL)
            .border_style(if self.focused { STYLE::border_focus() } else { STYLE::border() });
        let inner = block.inner(area);
        f.render_widget(block, area);

        let width = inner.width.saturating_sub(12) as usize;
        let lines: Vec<Spans> = [
            (Field::Share, &self.share),
            (Field::Schema, &self.schema),
            (Field::Table, &self.table),
        ]
        .into_iter()
        .map(|(field, dropdown)| {
            let active = self.focused && field == self.field;
            let value = match dropdown.options.len() {
                0 => "(none)".to_string(),
                n => format!("◂ {} ▸ {}/{}", fit(dropdown.current(), width), dropdown.selected + 1, n),
            };
            Spans::from(vec![
                Span::styled(format!("{:>7} ", dropdown.label), STYLE::header_row()),
                Span::styled(value, if active { STYLE::selection() } else { STYLE::cell() }),
            ])
        })
        .collect();
        f.render_widget(Paragraph::new(lines), inner);
    }
}

fn owned(names: Vec<&str>) -> Vec<String> {
    names.into_iter().map(str::to_string).collect()
}

/// Two-line entries: file id over its size caption.
pub struct FileList {
    pub title: String,
    pub items: Vec<(String, String)>,
    pub selected: usize,
    pub focused: bool,
    offset: usize,
    area: Option<Rect>,
}

impl FileList {
    pub fn new() -> Self {
        Self {
            title: "Files".to_string(),
            items: Vec::new(),
            selected: 0,
            focused: false,
            offset: 0,
            area: None,
        }
    }

    pub fn set_files(&mut self, title: String, files: &[File]) {
        self.title = title;
        self.items = files
            .iter()
            .map(|f| (f.id.clone(), f.size_caption()))
            .collect();
        self.selected = 0;
        self.offset = 0;
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.selected = 0;
        self.offset = 0;
    }

    fn current(&self) -> Option<String> {
        self.items.get(self.selected).map(|(id, _)| id.clone())
    }

    fn visible_items(&self) -> usize {
        self.area
            .map(|a| (a.height.saturating_sub(2) / 2) as usize)
            .unwrap_or(1)
            .max(1)
    }

    fn keep_visible(&mut self) {
        let page = self.visible_items();
        if self.selected < self.offset {
            self.offset = self.selected;
        } else if self.selected >= self.offset + page {
            self.offset = self.selected + 1 - page;
        }
    }

    /// Returns the chosen file id on `Enter`.
    pub fn handle_key(&mut self, key: KeyEvent) -> Option<String> {
        if self.items.is_empty() {
            return None;
        }
        match key.code {
            KeyCode::Up => self.selected = self.selected.saturating_sub(1),
            KeyCode::Down => self.selected = (self.selected + 1).min(self.items.len() - 1),
            KeyCode::Home => self.selected = 0,
            KeyCode::End => self.selected = self.items.len() - 1,
            KeyCode::Enter => return self.current(),
            _ => {}
        }
        self.keep_visible();
        None
    }

    /// A click selects and opens the entry under the cursor.
    pub fn handle_mouse(&mut self, event: MouseEvent) -> Option<Option<String>> {
        let area = self.area?;
        if !hit(area, event.column, event.row) {
            return None;
        }
        match event.kind {
            MouseEventKind::ScrollDown => {
                self.selected = (self.selected + 1).min(self.items.len().saturating_sub(1));
                self.keep_visible();
            }
            MouseEventKind::ScrollUp => {
                self.selected = self.selected.saturating_sub(1);
                self.keep_visible();
            }
            MouseEventKind::Down(MouseButton::Left) => {
                let line = event.row.saturating_sub(area.y + 1) as usize;
                let index = self.offset + line / 2;
                if index < self.items.len() {
                    self.selected = index;
                    return Some(self.current());
                }
            }
            _ => {}
        }
        Some(None)
    }

    pub fn render<B: Backend>(&mut self, f: &mut Frame<B>, area: Rect) {
        self.area = Some(area);
        self.keep_visible();
        let block = Block::default()
            .title(Span::styled(format!(" {} ", self.title), STYLE::title()))
            .borders(Borders::ALL)
            .border_style(if self.focused { STYLE::border_focus() } else { STYLE::border() });
        let inner = block.inner(area);
        f.render_widget(block, area);

        if self.items.is_empty() {
            let p = Paragraph::new("Pick a table and press Enter").style(STYLE::caption());
            f.render_widget(p, inner);
            return;
        }

        let width = inner.width as usize;
        let mut lines = Vec::new();
        for (i, (id, caption)) in self
            .items
            .iter()
            .enumerate()
            .skip(self.offset)
            .take(self.visible_items())
        {
            let style = if i == self.selected {
                STYLE::selection()
            } else {
                STYLE::cell().fg(k::SKY_GLAZE)
            };
            lines.push(Spans::from(Span::styled(fit(id, width), style)));
            lines.push(Spans::from(Span::styled(format!("  {}", fit(caption, width.saturating_sub(2))), STYLE::caption())));
        }
        f.render_widget(Paragraph::new(lines), inner);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;
    use rime::session::{SchemaNode, ShareNode};
    use rime::sharing::{Schema, Share, Table};

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn catalog() -> Catalog {
        let share = |name: &str, schemas: &[(&str, &[&str])]| ShareNode {
            share: Share { name: name.into(), id: None },
            schemas: schemas
                .iter()
                .map(|(schema, tables)| SchemaNode {
                    schema: Schema { name: schema.to_string(), share: name.into() },
                    tables: tables
                        .iter()
                        .map(|t| Table {
                            name: t.to_string(),
                            schema: schema.to_string(),
                            share: name.into(),
                            share_id: None,
                            id: None,
                        })
                        .collect(),
                })
                .collect(),
        };
        Catalog {
            shares: vec![
                share("a", &[("s1", &["t1", "t2"])]),
                share("b", &[("s2", &["u1"]), ("s3", &["v1", "v2", "v3"])]),
            ],
        }
    }

    #[test]
    fn changing_share_reloads_dependent_dropdowns() {
        let catalog = catalog();
        let mut form = FinderForm::new(&catalog);
        assert_eq!(form.table.options, ["t1", "t2"]);

        form.handle_key(&catalog, key(KeyCode::Right));
        assert_eq!(form.schema.options, ["s2", "s3"]);
        assert_eq!(form.table.options, ["u1"]);

        form.handle_key(&catalog, key(KeyCode::Down));
        form.handle_key(&catalog, key(KeyCode::Right));
        assert_eq!(form.table.options, ["v1", "v2", "v3"]);

        form.handle_key(&catalog, key(KeyCode::Down));
        form.handle_key(&catalog, key(KeyCode::Right));
        assert_eq!(form.handle_key(&catalog, key(KeyCode::Enter)), Some((1, 1, 1)));
    }

    #[test]
    fn enter_on_other_fields_moves_to_table() {
        let catalog = catalog();
        let mut form = FinderForm::new(&catalog);
        assert_eq!(form.handle_key(&catalog, key(KeyCode::Enter)), None);
        assert_eq!(form.field, Field::Table);
        assert_eq!(form.handle_key(&catalog, key(KeyCode::Enter)), Some((0, 0, 0)));
    }

    #[test]
    fn file_list_enter_returns_selected_id() {
        let files: Vec<File> = ["f1", "f2"]
            .iter()
            .map(|id| File { id: id.to_string(), size: 1024, ..File::default() })
            .collect();
        let mut list = FileList::new();
        list.set_files("Files in table: t".into(), &files);
        assert_eq!(list.items[0].1, "Size: 0.00 mb (1.00 kb, 1024 bytes)");

        list.handle_key(key(KeyCode::Down));
        list.handle_key(key(KeyCode::Down));
        assert_eq!(list.handle_key(key(KeyCode::Enter)).as_deref(), Some("f2"));
    }
}
