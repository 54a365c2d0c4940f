//! Keeps the stats and schema row selection on the data grid's column.

use crate::grid::{DisplayGrid, GridState};

/// Listener wiring between the data grid and its two side grids.
#[derive(Clone, Debug)]
pub struct SelectionSync {
    data: DisplayGrid,
    stats: DisplayGrid,
    schema: DisplayGrid,
}

impl SelectionSync {
    /// Register on `data`; stays active for the lifetime of the grids.
    pub fn wire(data: &DisplayGrid, stats: &DisplayGrid, schema: &DisplayGrid) -> Self {
        let sync = Self {
            data: data.clone(),
            stats: stats.clone(),
            schema: schema.clone(),
        };
        let handler = sync.clone();
        data.on_selection_changed(move |row, col| handler.column_selected(row, col));
        sync
    }

    /// React to the data grid selecting `(row, col)`.
    pub fn column_selected(&self, _row: usize, col: usize) {
        let key = self.data.cell_text(0, col);
        tracing::trace!(%key, col, "syncing selection");

        if let Some(row) = self.stats.with_state(|s| find_key(s, &key)).found() {
            self.stats.select(row, 0);
        }

        // unlike stats, a miss on a non-empty schema grid resets it to the header
        match self.schema.with_state(|s| find_key(s, &key)) {
            Lookup::Found(row) => self.schema.select(row, 0),
            Lookup::Missed => self.schema.select(0, 0),
            Lookup::Empty => {}
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Lookup {
    Found(usize),
    Missed,
    Empty,
}

impl Lookup {
    fn found(self) -> Option<usize> {
        match self {
            Self::Found(row) => Some(row),
            _ => None,
        }
    }
}

fn find_key(state: &GridState, key: &str) -> Lookup {
    if state.row_count() <= 1 {
        return Lookup::Empty;
    }
    (1..state.row_count())
        .find(|&row| state.cell(row, 0).is_some_and(|c| c.text == key))
        .map_or(Lookup::Missed, Lookup::Found)
}
