//! Paired-Row Layout
//!
//! Suffix-encoded aircraft publish the CDU as eight logical lines. Line 0 is
//! the title row and line 7 the scratchpad row; lines 1 to 6 each carry a
//! label dataref and a content dataref that land on two adjacent grid rows:
//!
//! ```text
//! grid row   0      1      2      3      4     ...   11     12      13
//! line       0      1      1      2      2     ...    6      6       7
//! role     single label content label content ...  label content single
//! ```

use std::collections::BTreeMap;

use crate::grid::{CellGrid, Glyph, COLUMNS, ROWS};
use crate::snapshot::Snapshot;

/// Last logical line (scratchpad)
pub(crate) const SCRATCHPAD_LINE: u8 = 7;

/// Which datarefs of a logical line a grid row takes
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum RowRole {
    /// Every dataref of the line (title and scratchpad rows)
    Single,
    /// Only label datarefs
    Label,
    /// Only content datarefs
    Content,
}

/// Logical line and role feeding a grid row
pub(crate) fn row_source(row: usize) -> (u8, RowRole) {
    match row {
        0 => (0, RowRole::Single),
        r if r == ROWS - 1 => (SCRATCHPAD_LINE, RowRole::Single),
        r if r % 2 == 1 => (((r + 1) / 2) as u8, RowRole::Label),
        r => ((r / 2) as u8, RowRole::Content),
    }
}

/// Naming rules of one suffix-encoded aircraft
pub(crate) trait LineScheme {
    /// Logical line of a dataref, `None` if it belongs to no line
    fn line_of(&self, name: &str) -> Option<u8>;

    /// Whether a dataref feeds rows of the given role
    fn fills(&self, name: &str, role: RowRole) -> bool;

    /// Display glyph for one character of a dataref
    fn glyph(&self, name: &str, ch: char) -> Glyph;
}

/// Render a snapshot through a line scheme
///
/// Spaces never overwrite a cell and blank values are skipped, so later
/// datarefs only add to what earlier ones wrote.
pub(crate) fn render_lines<S: LineScheme + ?Sized>(scheme: &S, snapshot: &Snapshot) -> CellGrid {
    let mut lines: BTreeMap<u8, Vec<(&str, &str)>> = BTreeMap::new();
    for (name, text) in snapshot.texts() {
        match scheme.line_of(name) {
            Some(line) if line <= SCRATCHPAD_LINE => lines.entry(line).or_default().push((name, text)),
            _ => tracing::trace!(dataref = name, "Dataref outside the line layout"),
        }
    }

    let mut grid = CellGrid::new();
    for row in 0..ROWS {
        let (line, role) = row_source(row);
        let Some(datarefs) = lines.get(&line) else {
            continue;
        };

        for &(name, text) in datarefs {
            if text.trim().is_empty() {
                continue;
            }
            if role != RowRole::Single && !scheme.fills(name, role) {
                continue;
            }
            for (col, ch) in text.chars().take(COLUMNS).enumerate() {
                if ch == ' ' {
                    continue;
                }
                grid.set(row, col, scheme.glyph(name, ch));
            }
        }
    }
    grid
}
