//! Draws a `DisplayGrid` and turns keys/mouse into selection and scrolling.

use crossterm::event::{KeyCode, KeyEvent, MouseButton, MouseEvent, MouseEventKind};
use tui::{
    backend::Backend,
    layout::Rect,
    style::Style,
    text::{Span, Spans},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use unicode_segmentation::UnicodeSegmentation;

use crate::palette::{KANAGAWA as k, STYLE};
use rime::format::NULL_TEXT;
use rime::grid::{Align, CellAttrs, DisplayGrid, GridCell};

const COLUMN_GAP: u16 = 1;
const ELLIPSIS: &str = "…";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SelectMode {
    /// Whole rows are selected (schema, stats).
    Rows,
    /// Whole columns are selected (data).
    Columns,
}

#[derive(Clone, Copy, Debug)]
struct ColumnSlot {
    col: usize,
    x: u16,
    width: u16,
}

pub struct GridView {
    pub grid: DisplayGrid,
    pub mode: SelectMode,
    pub placeholder: &'static str,
    pub focused: bool,
    area: Option<Rect>,
    body: Option<Rect>,
    slots: Vec<ColumnSlot>,
}

impl GridView {
    pub fn new(grid: DisplayGrid, mode: SelectMode, placeholder: &'static str) -> Self {
        Self {
            grid,
            mode,
            placeholder,
            focused: false,
            area: None,
            body: None,
            slots: Vec::new(),
        }
    }

    fn page_rows(&self) -> usize {
        self.body.map(|b| b.height as usize).unwrap_or(1).max(1)
    }

    pub fn render<B: Backend>(&mut self, f: &mut Frame<B>, area: Rect) {
        self.area = Some(area);
        let (title, offset, selection, column_count, header, rows) = self.grid.with_state(|s| {
            let visible = area.height.saturating_sub(3) as usize;
            let header: Vec<Option<GridCell>> = s.cells.first().cloned().unwrap_or_default();
            let rows: Vec<Vec<Option<GridCell>>> = s
                .cells
                .iter()
                .skip(1 + s.offset.0)
                .take(visible)
                .cloned()
                .collect();
            (s.title.clone(), s.offset, s.selection, s.column_count(), header, rows)
        });

        let border = if self.focused { STYLE::border_focus() } else { STYLE::border() };
        let block = Block::default()
            .title(Span::styled(format!(" {} ", title), STYLE::title()))
            .borders(Borders::ALL)
            .border_style(border);
        let inner = block.inner(area);
        f.render_widget(block, area);

        if header.is_empty() || inner.height == 0 || inner.width == 0 {
            self.body = None;
            self.slots.clear();
            let p = Paragraph::new(self.placeholder).style(STYLE::caption());
            f.render_widget(p, inner);
            return;
        }

        self.slots = layout_columns(&header, &rows, offset.1, column_count, inner);
        let body = Rect {
            x: inner.x,
            y: inner.y + 1,
            width: inner.width,
            height: inner.height.saturating_sub(1),
        };
        self.body = Some(body);

        let header_line = self.line(&header, 0, selection.map(|s| (s.row, s.col)), true);
        f.render_widget(
            Paragraph::new(header_line).style(STYLE::header_row()),
            Rect { height: 1, ..inner },
        );

        for (i, cells) in rows.iter().enumerate() {
            let row = 1 + offset.0 + i;
            let line = self.line(cells, row, selection.map(|s| (s.row, s.col)), false);
            f.render_widget(
                Paragraph::new(line),
                Rect { y: body.y + i as u16, height: 1, ..body },
            );
        }
    }

    fn line(
        &self,
        cells: &[Option<GridCell>],
        row: usize,
        selection: Option<(usize, usize)>,
        header: bool,
    ) -> Spans<'static> {
        let mut spans = Vec::with_capacity(self.slots.len() * 2);
        for (i, slot) in self.slots.iter().enumerate() {
            if i > 0 {
                spans.push(Span::raw(" ".repeat(COLUMN_GAP as usize)));
            }
            let cell = cells.get(slot.col).and_then(Option::as_ref);
            let (text, attrs) = match cell {
                Some(c) => (c.text.as_str(), c.attrs),
                None => ("", CellAttrs::default()),
            };
            let shown = pad(&fit(text, slot.width as usize), slot.width as usize, attrs.align);

            let selected = match (self.mode, selection) {
                (SelectMode::Rows, Some((r, _))) => !header && r == row,
                (SelectMode::Columns, Some((_, c))) => c == slot.col,
                _ => false,
            };
            let style = if selected {
                STYLE::selection()
            } else if header {
                Style::default()
            } else if text == NULL_TEXT {
                STYLE::cell().fg(k::PUMICE)
            } else if attrs.bold {
                STYLE::bold_cell()
            } else {
                STYLE::cell()
            };
            spans.push(Span::styled(shown, style));
        }
        Spans::from(spans)
    }

    /// Returns whether the key was consumed.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        let rows = self.grid.row_count();
        let cols = self.grid.column_count();
        if rows == 0 {
            return false;
        }
        let (off_row, off_col) = self.grid.offset();
        let page = self.page_rows();
        let current = self.grid.selection();

        match (self.mode, key.code) {
            (SelectMode::Columns, KeyCode::Left | KeyCode::Right) => {
                let col = current.map(|s| s.col).unwrap_or(0);
                let col = match key.code {
                    KeyCode::Left => col.saturating_sub(1),
                    _ => (col + 1).min(cols.saturating_sub(1)),
                };
                self.select_column(col);
            }
            (SelectMode::Columns, KeyCode::Up) => self.grid.set_offset(off_row.saturating_sub(1), off_col),
            (SelectMode::Columns, KeyCode::Down) => self.grid.set_offset(off_row + 1, off_col),
            (_, KeyCode::PageUp) => self.grid.set_offset(off_row.saturating_sub(page), off_col),
            (_, KeyCode::PageDown) => self.grid.set_offset(off_row + page, off_col),
            (_, KeyCode::Home) => self.grid.scroll_to_beginning(),
            (SelectMode::Rows, KeyCode::Up | KeyCode::Down) => {
                let row = current.map(|s| s.row).unwrap_or(0);
                let row = match key.code {
                    KeyCode::Up => row.saturating_sub(1).max(1),
                    _ => (row + 1).min(rows - 1),
                };
                self.select_row(row);
            }
            (SelectMode::Rows, KeyCode::Left) => self.grid.set_offset(off_row, off_col.saturating_sub(1)),
            (SelectMode::Rows, KeyCode::Right) => self.grid.set_offset(off_row, off_col + 1),
            _ => return false,
        }
        true
    }

    fn select_column(&mut self, col: usize) {
        let (off_row, off_col) = self.grid.offset();
        let last_shown = self.slots.last().map(|s| s.col).unwrap_or(off_col);
        if col < off_col {
            self.grid.set_offset(off_row, col);
        } else if col > last_shown {
            self.grid.set_offset(off_row, off_col + (col - last_shown));
        }
        let row = self.grid.selection().map(|s| s.row).unwrap_or(1);
        self.grid.select(row, col);
    }

    fn select_row(&mut self, row: usize) {
        if row == 0 {
            return;
        }
        let (off_row, off_col) = self.grid.offset();
        let page = self.page_rows();
        if row - 1 < off_row {
            self.grid.set_offset(row - 1, off_col);
        } else if row - 1 >= off_row + page {
            self.grid.set_offset(row - page, off_col);
        }
        self.grid.select(row, 0);
    }

    /// Returns whether the event landed inside this view.
    pub fn handle_mouse(&mut self, event: MouseEvent) -> bool {
        let Some(area) = self.area else { return false };
        if !hit(area, event.column, event.row) {
            return false;
        }
        let (off_row, off_col) = self.grid.offset();
        match event.kind {
            MouseEventKind::ScrollDown => self.grid.set_offset(off_row + 3, off_col),
            MouseEventKind::ScrollUp => self.grid.set_offset(off_row.saturating_sub(3), off_col),
            MouseEventKind::Down(MouseButton::Left) => {
                if let Some((row, col)) = self.cell_at(event.column, event.row) {
                    match self.mode {
                        SelectMode::Columns => self.select_column(col),
                        SelectMode::Rows => self.select_row(row),
                    }
                }
            }
            _ => {}
        }
        true
    }

    /// Grid coordinates of a screen position inside the body.
    fn cell_at(&self, x: u16, y: u16) -> Option<(usize, usize)> {
        let body = self.body?;
        if !hit(body, x, y) {
            return None;
        }
        let row = 1 + self.grid.offset().0 + (y - body.y) as usize;
        if row >= self.grid.row_count() {
            return None;
        }
        let slot = self
            .slots
            .iter()
            .find(|s| x >= s.x && x < s.x + s.width)?;
        Some((row, slot.col))
    }
}

pub fn hit(r: Rect, x: u16, y: u16) -> bool {
    x >= r.x && x < r.x + r.width && y >= r.y && y < r.y + r.height
}

fn grapheme_len(text: &str) -> usize {
    text.graphemes(true).count()
}

/// Cut `text` to at most `width` graphemes, marking the cut with an ellipsis.
pub fn fit(text: &str, width: usize) -> String {
    let text = text.replace('\n', " ");
    if grapheme_len(&text) <= width {
        return text;
    }
    if width == 0 {
        return String::new();
    }
    let mut out: String = text.graphemes(true).take(width - 1).collect();
    out.push_str(ELLIPSIS);
    out
}

pub fn pad(text: &str, width: usize, align: Align) -> String {
    let spare = width.saturating_sub(grapheme_len(text));
    match align {
        Align::Left => format!("{}{}", text, " ".repeat(spare)),
        Align::Right => format!("{}{}", " ".repeat(spare), text),
        Align::Center => {
            let left = spare / 2;
            format!("{}{}{}", " ".repeat(left), text, " ".repeat(spare - left))
        }
    }
}

/// Natural width of a cell: its text, capped by the cell's `max_width`.
fn natural_width(cell: &GridCell) -> usize {
    let len = grapheme_len(&cell.text);
    match cell.attrs.max_width {
        0 => len,
        max => len.min(max),
    }
}

/// Place columns from `first_col` on, left to right, until `area` is full.
/// Spare width goes to the placed columns in proportion to their expansion.
fn layout_columns(
    header: &[Option<GridCell>],
    rows: &[Vec<Option<GridCell>>],
    first_col: usize,
    column_count: usize,
    area: Rect,
) -> Vec<ColumnSlot> {
    let mut placed: Vec<(usize, u16, u16)> = Vec::new();
    let mut used: u16 = 0;
    for col in first_col..column_count {
        let cells = std::iter::once(header.get(col))
            .chain(rows.iter().map(|r| r.get(col)))
            .flatten()
            .flatten();
        let mut width = 1;
        let mut expansion = 0;
        for cell in cells {
            width = width.max(natural_width(cell));
            expansion = expansion.max(cell.attrs.expansion);
        }
        let gap = if placed.is_empty() { 0 } else { COLUMN_GAP };
        let remaining = area.width.saturating_sub(used + gap);
        if remaining == 0 {
            break;
        }
        let width = (width as u16).min(remaining);
        placed.push((col, width, expansion));
        used += gap + width;
    }

    let spare = area.width.saturating_sub(used);
    let weights: u32 = placed.iter().map(|p| p.2 as u32).sum();
    let mut x = area.x;
    let mut handed_out = 0u16;
    placed
        .iter()
        .enumerate()
        .map(|(i, &(col, width, expansion))| {
            let extra = if weights == 0 {
                0
            } else if i + 1 == placed.len() {
                spare - handed_out
            } else {
                (spare as u32 * expansion as u32 / weights) as u16
            };
            handed_out += extra;
            if i > 0 {
                x += COLUMN_GAP;
            }
            let slot = ColumnSlot { col, x, width: width + extra };
            x += width + extra;
            slot
        })
        .collect()
}
