//! Display grids shared between the UI thread and the projector threads.
//!
//! A [`DisplayGrid`] is a cheap cloneable handle; every clone sees the same
//! cells. All mutation goes through the grid's mutex, so a cell write is
//! never torn and [`DisplayGrid::publish`] replaces a whole frame under one
//! lock acquisition.

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
}

/// Per-cell presentation attributes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CellAttrs {
    pub selectable: bool,
    pub bold: bool,
    pub align: Align,
    /// Maximum rendered width in graphemes, 0 for unlimited.
    pub max_width: usize,
    /// Relative share of spare horizontal space.
    pub expansion: u16,
}

impl Default for CellAttrs {
    fn default() -> Self {
        Self {
            selectable: true,
            bold: false,
            align: Align::Left,
            max_width: 0,
            expansion: 0,
        }
    }
}

impl CellAttrs {
    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    pub fn not_selectable(mut self) -> Self {
        self.selectable = false;
        self
    }

    pub fn align(mut self, align: Align) -> Self {
        self.align = align;
        self
    }

    pub fn max_width(mut self, width: usize) -> Self {
        self.max_width = width;
        self
    }

    pub fn expansion(mut self, expansion: u16) -> Self {
        self.expansion = expansion;
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GridCell {
    pub text: String,
    pub attrs: CellAttrs,
}

impl GridCell {
    pub fn new(text: impl Into<String>, attrs: CellAttrs) -> Self {
        Self {
            text: text.into(),
            attrs,
        }
    }

    /// Bold, non-selectable header cell.
    pub fn header(text: impl Into<String>) -> Self {
        Self::new(text, CellAttrs::default().not_selectable().bold().expansion(2))
    }
}

/// A complete grid image built off-thread and published in one step.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GridFrame {
    pub title: Option<String>,
    pub header: Vec<GridCell>,
    pub rows: Vec<Vec<Option<GridCell>>>,
}

impl GridFrame {
    /// Frame that leaves the grid empty.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Column texts of data row `row` (0-based, header excluded).
    pub fn row_texts(&self, row: usize) -> Vec<String> {
        self.rows
            .get(row)
            .map(|cells| {
                cells
                    .iter()
                    .map(|c| c.as_ref().map(|c| c.text.clone()).unwrap_or_default())
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Highlighted position of a grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SelectionCursor {
    pub row: usize,
    pub col: usize,
}

impl SelectionCursor {
    /// Column name under the cursor, read from the header row.
    pub fn key(&self, grid: &DisplayGrid) -> String {
        grid.cell_text(0, self.col)
    }
}

#[derive(Clone, Debug, Default)]
pub struct GridState {
    pub title: String,
    pub cells: Vec<Vec<Option<GridCell>>>,
    /// (first visible row below the header, first visible column)
    pub offset: (usize, usize),
    pub selection: Option<SelectionCursor>,
}

impl GridState {
    pub fn cell(&self, row: usize, col: usize) -> Option<&GridCell> {
        self.cells.get(row)?.get(col)?.as_ref()
    }

    pub fn row_count(&self) -> usize {
        self.cells.len()
    }

    pub fn column_count(&self) -> usize {
        self.cells.iter().map(Vec::len).max().unwrap_or(0)
    }
}

type Listener = Arc<dyn Fn(usize, usize) + Send + Sync>;

#[derive(Clone)]
pub struct DisplayGrid {
    name: Arc<str>,
    state: Arc<Mutex<GridState>>,
    listener: Arc<Mutex<Option<Listener>>>,
}

impl std::fmt::Debug for DisplayGrid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DisplayGrid")
            .field("name", &self.name)
            .field("rows", &self.row_count())
            .finish()
    }
}

impl DisplayGrid {
    pub fn new(name: &str) -> Self {
        Self {
            name: Arc::from(name),
            state: Arc::new(Mutex::new(GridState::default())),
            listener: Arc::new(Mutex::new(None)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn lock(&self) -> MutexGuard<'_, GridState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Run `f` against the current state while holding the grid lock.
    pub fn with_state<R>(&self, f: impl FnOnce(&GridState) -> R) -> R {
        f(&self.lock())
    }

    /// Remove every cell. Title, offset and selection survive.
    pub fn clear(&self) {
        self.lock().cells.clear();
    }

    pub fn set_cell(&self, row: usize, col: usize, cell: GridCell) {
        let mut state = self.lock();
        if state.cells.len() <= row {
            state.cells.resize_with(row + 1, Vec::new);
        }
        let line = &mut state.cells[row];
        if line.len() <= col {
            line.resize_with(col + 1, || None);
        }
        line[col] = Some(cell);
    }

    pub fn set_title(&self, title: impl Into<String>) {
        self.lock().title = title.into();
    }

    pub fn title(&self) -> String {
        self.lock().title.clone()
    }

    pub fn scroll_to_beginning(&self) {
        self.lock().offset = (0, 0);
    }

    pub fn offset(&self) -> (usize, usize) {
        self.lock().offset
    }

    pub fn set_offset(&self, row: usize, col: usize) {
        let mut state = self.lock();
        let max_row = state.row_count().saturating_sub(2);
        let max_col = state.column_count().saturating_sub(1);
        state.offset = (row.min(max_row), col.min(max_col));
    }

    /// Move the selection and notify the selection listener, if any.
    pub fn select(&self, row: usize, col: usize) {
        self.lock().selection = Some(SelectionCursor { row, col });
        // clone out so the listener may touch this grid again
        let listener = self
            .listener
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone();
        if let Some(listener) = listener {
            listener(row, col);
        }
    }

    pub fn selection(&self) -> Option<SelectionCursor> {
        self.lock().selection
    }

    pub fn on_selection_changed(&self, f: impl Fn(usize, usize) + Send + Sync + 'static) {
        *self.listener.lock().unwrap_or_else(|e| e.into_inner()) = Some(Arc::new(f));
    }

    /// Text at `(row, col)`, empty for unset cells.
    pub fn cell_text(&self, row: usize, col: usize) -> String {
        self.lock()
            .cell(row, col)
            .map(|c| c.text.clone())
            .unwrap_or_default()
    }

    pub fn row_count(&self) -> usize {
        self.lock().row_count()
    }

    pub fn column_count(&self) -> usize {
        self.lock().column_count()
    }

    /// Replace the grid's contents with `frame` unless `ticket` went stale.
    ///
    /// Returns whether the frame was written. The header lands in row 0,
    /// data rows from row 1, and the view scrolls back to the origin.
    pub fn publish(&self, ticket: &Ticket, frame: GridFrame) -> bool {
        let mut state = self.lock();
        if !ticket.is_current() {
            return false;
        }
        let GridFrame {
            title,
            header,
            rows,
        } = frame;
        state.cells.clear();
        if !header.is_empty() {
            state.cells.push(header.into_iter().map(Some).collect());
            state.cells.extend(rows);
        }
        if let Some(title) = title {
            state.title = title;
        }
        state.offset = (0, 0);
        true
    }
}

/// The three grids a file selection projects into.
#[derive(Clone, Debug)]
pub struct Grids {
    pub data: DisplayGrid,
    pub stats: DisplayGrid,
    pub schema: DisplayGrid,
}

impl Grids {
    pub fn new() -> Self {
        Self {
            data: DisplayGrid::new("data"),
            stats: DisplayGrid::new("stats"),
            schema: DisplayGrid::new("schema"),
        }
    }
}

impl Default for Grids {
    fn default() -> Self {
        Self::new()
    }
}

/// Monotonic selection counter shared by a session and its projector tasks.
#[derive(Clone, Debug, Default)]
pub struct Generation(Arc<AtomicU64>);

impl Generation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new epoch; tickets of older epochs become stale.
    pub fn advance(&self) -> Ticket {
        let epoch = self.0.fetch_add(1, Ordering::SeqCst) + 1;
        Ticket {
            epoch,
            generation: self.clone(),
        }
    }

    /// Ticket for the current epoch.
    pub fn ticket(&self) -> Ticket {
        Ticket {
            epoch: self.current(),
            generation: self.clone(),
        }
    }

    pub fn current(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Clone, Debug)]
pub struct Ticket {
    epoch: u64,
    generation: Generation,
}

impl Ticket {
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn is_current(&self) -> bool {
        self.generation.current() == self.epoch
    }
}

/// Redraw trampoline: background tasks request, the UI loop takes.
#[derive(Clone, Debug, Default)]
pub struct RedrawSignal {
    pending: Arc<AtomicBool>,
    requests: Arc<AtomicUsize>,
}

impl RedrawSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&self) {
        self.requests.fetch_add(1, Ordering::SeqCst);
        self.pending.store(true, Ordering::SeqCst);
    }

    /// Whether a redraw was requested since the last call.
    pub fn take(&self) -> bool {
        self.pending.swap(false, Ordering::SeqCst)
    }

    /// Total number of requests so far.
    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn frame(header: &[&str], rows: &[&[&str]]) -> GridFrame {
        GridFrame {
            title: Some("t".into()),
            header: header.iter().map(|h| GridCell::header(*h)).collect(),
            rows: rows
                .iter()
                .map(|r| {
                    r.iter()
                        .map(|c| Some(GridCell::new(*c, CellAttrs::default())))
                        .collect()
                })
                .collect(),
        }
    }

    #[test]
    fn set_cell_grows_the_grid() {
        let grid = DisplayGrid::new("g");
        grid.set_cell(2, 3, GridCell::new("x", CellAttrs::default()));
        assert_eq!(grid.row_count(), 3);
        assert_eq!(grid.column_count(), 4);
        assert_eq!(grid.cell_text(2, 3), "x");
        assert_eq!(grid.cell_text(1, 1), "");
        assert_eq!(grid.cell_text(9, 9), "");
    }

    #[test]
    fn clear_keeps_title() {
        let grid = DisplayGrid::new("g");
        grid.set_title("Files");
        grid.set_cell(0, 0, GridCell::header("a"));
        grid.clear();
        assert_eq!(grid.row_count(), 0);
        assert_eq!(grid.title(), "Files");
    }

    #[test]
    fn publish_writes_header_then_rows() {
        let gen = Generation::new();
        let ticket = gen.advance();
        let grid = DisplayGrid::new("g");
        grid.set_offset(5, 5);
        assert!(grid.publish(&ticket, frame(&["id", "name"], &[&["1", "x"]])));
        assert_eq!(grid.row_count(), 2);
        assert_eq!(grid.cell_text(0, 1), "name");
        assert_eq!(grid.cell_text(1, 0), "1");
        assert_eq!(grid.offset(), (0, 0));
        assert_eq!(grid.title(), "t");
        let header_bold = grid.with_state(|s| s.cell(0, 0).map(|c| c.attrs.bold));
        assert_eq!(header_bold, Some(true));
    }

    #[test]
    fn stale_ticket_is_discarded() {
        let gen = Generation::new();
        let old = gen.advance();
        let new = gen.advance();
        let grid = DisplayGrid::new("g");
        assert!(grid.publish(&new, frame(&["new"], &[])));
        assert!(!old.is_current());
        assert!(!grid.publish(&old, frame(&["old"], &[])));
        assert_eq!(grid.cell_text(0, 0), "new");
    }

    #[test]
    fn empty_frame_empties_the_grid() {
        let gen = Generation::new();
        let ticket = gen.advance();
        let grid = DisplayGrid::new("g");
        grid.set_cell(0, 0, GridCell::header("a"));
        assert!(grid.publish(&ticket, GridFrame::empty()));
        assert_eq!(grid.row_count(), 0);
    }

    #[test]
    fn select_notifies_listener() {
        let grid = DisplayGrid::new("g");
        let seen = Arc::new(AtomicUsize::new(0));
        let seen2 = Arc::clone(&seen);
        let handle = grid.clone();
        grid.on_selection_changed(move |_row, col| {
            // re-entering the grid from the listener must not deadlock
            let _ = handle.cell_text(0, col);
            seen2.store(col + 1, Ordering::SeqCst);
        });
        grid.select(0, 4);
        assert_eq!(seen.load(Ordering::SeqCst), 5);
        assert_eq!(grid.selection(), Some(SelectionCursor { row: 0, col: 4 }));
    }

    #[test]
    fn cursor_key_reads_header() {
        let grid = DisplayGrid::new("g");
        grid.set_cell(0, 1, GridCell::header("amount"));
        let cursor = SelectionCursor { row: 3, col: 1 };
        assert_eq!(cursor.key(&grid), "amount");
    }

    #[test]
    fn redraw_signal_take_resets() {
        let signal = RedrawSignal::new();
        assert!(!signal.take());
        signal.request();
        signal.request();
        assert!(signal.take());
        assert!(!signal.take());
        assert_eq!(signal.requests(), 2);
    }

    #[test]
    fn set_offset_is_clamped() {
        let grid = DisplayGrid::new("g");
        for r in 0..5 {
            grid.set_cell(r, 0, GridCell::new("v", CellAttrs::default()));
        }
        grid.set_offset(100, 100);
        assert_eq!(grid.offset(), (3, 0));
    }
}
